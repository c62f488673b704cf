//! Saves written by one session are restored by the next.

mod common;

use std::sync::Arc;

use game_core::{EntityId, InventorySaveData, PersistenceHooks, ResourceKind, SavedStack};
use runtime::{FilePersistence, InMemoryPersistence, RepositoryError};

use common::{builder, item};

const HERO: EntityId = EntityId(1);

#[test]
fn in_memory_saves_survive_a_new_session() {
    let store = Arc::new(InMemoryPersistence::new());

    {
        let mut session = builder().persistence(store.clone()).build().unwrap();
        session.spawn(HERO).unwrap();
        session.give(HERO, &item("iron_sword"), 1).unwrap();
        session.give(HERO, &item("arrow"), 7).unwrap();
        session
            .damage(HERO, ResourceKind::Health, 45.0, None)
            .unwrap();
    }

    let saved = store.ledger(HERO).expect("ledger saved");
    assert_eq!(saved.health, 55.0);
    assert_eq!(store.inventory(HERO).unwrap().stacks.len(), 2);

    let mut session = builder().persistence(store).build().unwrap();
    session.spawn(HERO).unwrap();
    let snapshot = session.snapshot(HERO).unwrap();
    assert_eq!(snapshot.health.current, 55.0);
    assert_eq!(snapshot.total_count(&item("arrow")), 7);

    let sword = snapshot
        .items
        .iter()
        .find(|stack| stack.item == item("iron_sword"))
        .unwrap();
    assert_eq!(sword.stats.len(), 1);
    assert_eq!(sword.stats[0].1, 40);
}

#[test]
fn file_saves_round_trip_through_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FilePersistence::new(dir.path().join("saves")).unwrap());

    {
        let mut session = builder().persistence(store.clone()).build().unwrap();
        session.spawn(HERO).unwrap();
        session.give(HERO, &item("health_potion"), 5).unwrap();
        session.set_max(HERO, ResourceKind::Mana, 60.0).unwrap();
    }

    assert!(store.base_dir().join("inventory_1.json").exists());
    assert!(store.base_dir().join("ledger_1.json").exists());

    let mut session = builder().persistence(store).build().unwrap();
    session.spawn(HERO).unwrap();
    let snapshot = session.snapshot(HERO).unwrap();
    assert_eq!(snapshot.mana.max, 60.0);
    assert_eq!(snapshot.mana.current, 60.0);
    assert_eq!(
        snapshot
            .items
            .iter()
            .map(|stack| stack.count)
            .collect::<Vec<_>>(),
        vec![3, 2]
    );
}

#[test]
fn mismatched_owner_is_rejected_and_ignored_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = FilePersistence::new(dir.path()).unwrap();
    let data = InventorySaveData {
        owner: EntityId(7),
        stacks: vec![SavedStack {
            item: item("arrow"),
            count: 3,
            stats: Vec::new(),
        }],
    };
    store.write_inventory(HERO, &data).unwrap();

    assert!(matches!(
        store.read_inventory(HERO),
        Err(RepositoryError::OwnerMismatch { .. })
    ));
    assert!(store.load_inventory(HERO).is_none());
}

#[test]
fn corrupt_save_is_ignored() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("ledger_1.json"), "{ not json").unwrap();
    let store = FilePersistence::new(dir.path()).unwrap();

    assert!(matches!(
        store.read_ledger(HERO),
        Err(RepositoryError::Json(_))
    ));
    assert!(store.load_ledger(HERO).is_none());
}
