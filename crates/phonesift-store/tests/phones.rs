use phonesift_core::domain::CanonicalPhone;
use phonesift_store::error::StoreErrorKind;
use phonesift_store::Store;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

fn phone(value: &str) -> CanonicalPhone {
    value.parse().expect("canonical phone")
}

#[test]
fn get_or_create_returns_same_record() {
    let store = Store::open_in_memory().expect("open store");
    store.migrate().expect("migrate");
    let now = 1_700_000_000;
    let value = phone("+79161234567");

    let first = store.phones().get_or_create(now, &value).expect("create");
    let second = store
        .phones()
        .get_or_create(now + 60, &value)
        .expect("get existing");

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.phone, second.phone);
    assert_eq!(second.phone.created_at, now);
    assert_eq!(store.phones().count().expect("count"), 1);
}

#[test]
fn get_or_create_is_safe_across_connections() {
    let temp = TempDir::new().expect("temp dir");
    let db_path = temp.path().join("phonesift.sqlite3");
    {
        let store = Store::open(&db_path).expect("open store");
        store.migrate().expect("migrate");
    }

    let workers = 8;
    let barrier = Arc::new(Barrier::new(workers));
    let handles: Vec<_> = (0..workers)
        .map(|index| {
            let db_path = db_path.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let store = Store::open(&db_path).expect("open worker store");
                barrier.wait();
                store
                    .phones()
                    .get_or_create(1_700_000_000 + index as i64, &phone("+380501234567"))
                    .expect("get or create")
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|handle| handle.join().expect("join"))
        .collect();

    assert_eq!(results.iter().filter(|result| result.created).count(), 1);
    let first = &results[0].phone;
    assert!(results.iter().all(|result| &result.phone == first));

    let store = Store::open(&db_path).expect("reopen");
    assert_eq!(store.phones().count().expect("count"), 1);
}

#[test]
fn refresh_offer_count_requires_existing_phone() {
    let store = Store::open_in_memory().expect("open store");
    store.migrate().expect("migrate");

    let err = store
        .phones()
        .refresh_offer_count(&phone("+79990000000"))
        .expect_err("missing phone");
    assert_eq!(err.kind(), StoreErrorKind::NotFound);
}

#[test]
fn list_orders_by_phone() {
    let store = Store::open_in_memory().expect("open store");
    store.migrate().expect("migrate");
    let now = 1_700_000_000;

    store
        .phones()
        .get_or_create(now, &phone("+79161234567"))
        .expect("create");
    store
        .phones()
        .get_or_create(now, &phone("+380501234567"))
        .expect("create");

    let listed: Vec<String> = store
        .phones()
        .list()
        .expect("list")
        .into_iter()
        .map(|record| record.phone.into_string())
        .collect();
    assert_eq!(listed, vec!["+380501234567", "+79161234567"]);
}
