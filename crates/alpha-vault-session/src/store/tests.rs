use tempfile::tempdir;

use super::*;

fn exercise_store(store: &dyn SessionStore) {
    for key in StoreKey::ALL {
        assert_eq!(store.get(key).unwrap(), None);
    }

    store
        .apply(&[
            StoreOp::Set(StoreKey::Token, "abc.def.ghi".into()),
            StoreOp::Set(StoreKey::UserId, "42".into()),
        ])
        .unwrap();
    assert_eq!(
        store.get(StoreKey::Token).unwrap().as_deref(),
        Some("abc.def.ghi")
    );
    assert_eq!(store.get(StoreKey::UserId).unwrap().as_deref(), Some("42"));

    // Later ops in a batch win
    store
        .apply(&[
            StoreOp::Set(StoreKey::UserId, "1".into()),
            StoreOp::Remove(StoreKey::UserId),
            StoreOp::Remove(StoreKey::AuthMode),
        ])
        .unwrap();
    assert_eq!(store.get(StoreKey::UserId).unwrap(), None);
    assert_eq!(store.get(StoreKey::AuthMode).unwrap(), None);
    assert!(store.get(StoreKey::Token).unwrap().is_some());
}

#[test_log::test]
fn memory_store_basics() {
    exercise_store(&MemorySessionStore::new());
}

#[test_log::test]
fn redb_store_basics() {
    let dir = tempdir().unwrap();
    let store = RedbSessionStore::open(dir.path().join("session.redb")).unwrap();
    exercise_store(&store);
}

#[test_log::test]
fn redb_store_survives_reopen() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("session.redb");

    {
        let store = RedbSessionStore::open(&path).unwrap();
        store
            .apply(&[StoreOp::Set(StoreKey::Profile, r#"{"id":7}"#.into())])
            .unwrap();
    }

    let store = RedbSessionStore::open(&path).unwrap();
    assert_eq!(
        store.get(StoreKey::Profile).unwrap().as_deref(),
        Some(r#"{"id":7}"#)
    );
}
