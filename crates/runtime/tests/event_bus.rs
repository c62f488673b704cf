//! Messages published by core components reach bus subscribers.

mod common;

use game_core::{EntityId, EventSink, GameMessage, GameplayTag, ResourceKind, tags};
use runtime::EventBus;
use tokio::sync::broadcast::error::TryRecvError;

use common::{builder, item};

const HERO: EntityId = EntityId(1);
const GOBLIN: EntityId = EntityId(2);

#[tokio::test]
async fn topic_subscribers_receive_only_their_topic() {
    let bus = EventBus::with_capacity(8);
    let mut damage = bus.subscribe(&tags::MESSAGE_DAMAGE);
    let mut stacks = bus.subscribe(&tags::INVENTORY_STACK_CHANGED);

    let mut session = builder().event_bus(bus.clone()).build().unwrap();
    session.spawn(HERO).unwrap();
    session
        .damage(HERO, ResourceKind::Health, 12.0, Some(GOBLIN))
        .unwrap();

    let event = damage.recv().await.unwrap();
    assert_eq!(event.topic, tags::MESSAGE_DAMAGE);
    let GameMessage::Verb(verb) = event.message else {
        panic!("expected verb message");
    };
    assert_eq!(verb.target, HERO);
    assert_eq!(verb.instigator, Some(GOBLIN));
    assert_eq!(verb.magnitude, 12.0);

    assert!(matches!(stacks.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn stack_changes_arrive_in_publish_order() {
    let mut session = builder().build().unwrap();
    let mut all = session.bus().subscribe_all();
    session.spawn(HERO).unwrap();

    session.give(HERO, &item("arrow"), 25).unwrap();
    session.remove(HERO, &item("arrow"), 21).unwrap();

    let mut seen = Vec::new();
    while let Ok(event) = all.try_recv() {
        if let GameMessage::StackChanged(change) = event.message {
            seen.push((change.new_count, change.delta));
        }
    }
    assert_eq!(seen, vec![(20, 20), (5, 5), (0, -20), (4, -1)]);
}

#[tokio::test]
async fn replica_messages_go_to_replica_bus() {
    let mut session = builder().build().unwrap();
    session.spawn(HERO).unwrap();
    let mut authority = session.bus().subscribe(&tags::INVENTORY_STACK_CHANGED);
    let mut replica = session
        .replica_bus()
        .subscribe(&tags::INVENTORY_STACK_CHANGED);

    session.give(HERO, &item("mana_potion"), 2).unwrap();
    assert!(authority.recv().await.is_ok());
    assert!(matches!(replica.try_recv(), Err(TryRecvError::Empty)));

    session.sync(HERO).unwrap();
    let event = replica.recv().await.unwrap();
    let GameMessage::StackChanged(change) = event.message else {
        panic!("expected stack-changed message");
    };
    assert_eq!(change.owner, HERO);
    assert_eq!(change.new_count, 2);
}

#[test]
fn publishing_without_subscribers_is_harmless() {
    let bus = EventBus::new();
    bus.publish(
        &GameplayTag::new("Test.Unheard"),
        GameMessage::Verb(game_core::VerbMessage {
            verb: GameplayTag::new("Test.Unheard"),
            instigator: None,
            instigator_tags: Default::default(),
            target: HERO,
            target_tags: Default::default(),
            magnitude: 0.0,
        }),
    );
    assert_eq!(bus.topic_count(), 1);
}
