//! Session-level flows: routing, quick bar, death, item costs, replication.

mod common;

use game_core::{
    DeathState, EntityId, InventoryItemCost, ResourceKind, tags,
};
use runtime::{RuntimeError, Session};

use common::{builder, item};

const HERO: EntityId = EntityId(1);
const GOBLIN: EntityId = EntityId(2);

fn session() -> Session {
    let mut session = builder().build().expect("session should build");
    session.spawn(HERO).expect("hero spawns");
    session
}

#[test]
fn build_requires_catalog() {
    let err = Session::builder().build().err().expect("missing catalog");
    assert!(matches!(err, RuntimeError::MissingCatalog));
}

#[test]
fn calls_are_routed_by_entity() {
    let mut session = session();
    session.spawn(GOBLIN).unwrap();

    assert!(matches!(
        session.spawn(HERO),
        Err(RuntimeError::DuplicateEntity(HERO))
    ));
    assert!(matches!(
        session.damage(EntityId(99), ResourceKind::Health, 1.0, None),
        Err(RuntimeError::UnknownEntity(_))
    ));

    session
        .damage(GOBLIN, ResourceKind::Health, 30.0, Some(HERO))
        .unwrap();

    assert_eq!(session.snapshot(HERO).unwrap().health.current, 100.0);
    assert_eq!(session.snapshot(GOBLIN).unwrap().health.current, 70.0);
    assert_eq!(session.entity_ids().collect::<Vec<_>>(), vec![HERO, GOBLIN]);

    session.despawn(GOBLIN).unwrap();
    assert!(!session.contains(GOBLIN));
}

#[test]
fn weapon_pickup_takes_first_free_slot() {
    let mut session = session();

    let first = session.give(HERO, &item("iron_sword"), 1).unwrap();
    let second = session.give(HERO, &item("iron_sword"), 1).unwrap();
    session.give(HERO, &item("arrow"), 5).unwrap();

    let bar = session.quick_bar(HERO).unwrap();
    assert_eq!(bar.slots()[0], first);
    assert_eq!(bar.slots()[1], second);
    assert_eq!(bar.active(), Some(1));
    assert_eq!(bar.slots()[2], None);

    // Removing drains the first stack, which frees its slot.
    session.remove(HERO, &item("iron_sword"), 1).unwrap();
    let bar = session.quick_bar(HERO).unwrap();
    assert_eq!(bar.slots()[0], None);
    assert_eq!(bar.slots()[1], second);
}

#[test]
fn using_potions_heals_and_consumes() {
    let mut session = session();
    session.give(HERO, &item("health_potion"), 4).unwrap();
    session
        .damage(HERO, ResourceKind::Health, 60.0, Some(GOBLIN))
        .unwrap();

    let outcome = session.use_item(HERO, &item("health_potion")).unwrap();
    assert_eq!(outcome.applied_delta(ResourceKind::Health), 25.0);

    let snapshot = session.snapshot(HERO).unwrap();
    assert_eq!(snapshot.health.current, 65.0);
    assert_eq!(snapshot.total_count(&item("health_potion")), 3);
    assert_eq!(
        snapshot
            .items
            .iter()
            .map(|stack| stack.count)
            .collect::<Vec<_>>(),
        vec![2, 1]
    );
}

#[test]
fn lethal_damage_drives_death_sequence() {
    let mut session = session();

    session
        .damage(HERO, ResourceKind::Health, 150.0, Some(GOBLIN))
        .unwrap();
    let snapshot = session.snapshot(HERO).unwrap();
    assert_eq!(snapshot.death, DeathState::DeathStarted);
    assert!(snapshot.health.depleted);
    assert!(snapshot
        .tags
        .iter()
        .any(|(tag, count)| *tag == tags::STATUS_DEATH_DYING && *count == 1));

    assert!(session.finish_death(HERO).unwrap().advanced());
    assert_eq!(
        session.snapshot(HERO).unwrap().death,
        DeathState::DeathFinished
    );

    // Self-destruct is ignored once the sequence has started.
    assert!(session
        .self_destruct(HERO, ResourceKind::Health, false)
        .unwrap()
        .is_none());
}

#[test]
fn immunity_tag_blocks_damage_but_not_self_destruct() {
    let mut session = session();
    session
        .set_tag(HERO, tags::DAMAGE_IMMUNITY_HEALTH, 1)
        .unwrap();

    let outcome = session
        .damage(HERO, ResourceKind::Health, 40.0, Some(GOBLIN))
        .unwrap();
    assert!(outcome.is_rejected());
    assert_eq!(session.snapshot(HERO).unwrap().health.current, 100.0);

    let outcome = session
        .self_destruct(HERO, ResourceKind::Health, true)
        .unwrap()
        .expect("alive entity self-destructs");
    assert!(outcome.depleted(ResourceKind::Health));
    assert_eq!(
        session.snapshot(HERO).unwrap().death,
        DeathState::DeathStarted
    );
}

#[test]
fn item_cost_is_all_or_nothing() {
    let mut session = session();
    session.give(HERO, &item("arrow"), 5).unwrap();
    let cost = InventoryItemCost::new("arrow", 1.5);

    assert!(session.pay_item_cost(HERO, &cost, 2).unwrap());
    assert_eq!(
        session.snapshot(HERO).unwrap().total_count(&item("arrow")),
        2
    );

    assert!(!session.pay_item_cost(HERO, &cost, 2).unwrap());
    assert_eq!(
        session.snapshot(HERO).unwrap().total_count(&item("arrow")),
        2
    );
}

#[test]
fn sync_mirrors_authority_state_to_replica() {
    let mut session = session();
    assert!(session.replica_snapshot(HERO).unwrap().is_none());

    session.give(HERO, &item("health_potion"), 4).unwrap();
    session
        .damage(HERO, ResourceKind::Health, 30.0, Some(GOBLIN))
        .unwrap();
    session.set_max(HERO, ResourceKind::Mana, 40.0).unwrap();

    let report = session.sync(HERO).unwrap();
    assert_eq!(report.inventory_changes, 2);
    assert_eq!(report.messages, 2);
    assert_eq!(report.attributes, 3);
    assert_eq!(report.death, DeathState::NotDead);

    let replica = session.replica_snapshot(HERO).unwrap().unwrap();
    let authority = session.snapshot(HERO).unwrap();
    assert_eq!(replica.health, authority.health);
    assert_eq!(replica.mana, authority.mana);
    assert_eq!(replica.items, authority.items);
    assert!(replica.quick_bar.is_empty());

    // Nothing pending means nothing forwarded.
    let report = session.sync(HERO).unwrap();
    assert_eq!(report.inventory_changes, 0);
    assert_eq!(report.attributes, 0);
}

#[test]
fn sync_replays_death_on_replica() {
    let mut session = session();
    session
        .damage(HERO, ResourceKind::Health, 500.0, Some(GOBLIN))
        .unwrap();
    session.finish_death(HERO).unwrap();

    let report = session.sync(HERO).unwrap();
    assert!(report.death_advanced);
    assert_eq!(report.death, DeathState::DeathFinished);

    let replica = session.replica_snapshot(HERO).unwrap().unwrap();
    assert!(replica.health.depleted);
    assert!(replica
        .tags
        .iter()
        .any(|(tag, _)| *tag == tags::STATUS_DEATH_DEAD));
}
