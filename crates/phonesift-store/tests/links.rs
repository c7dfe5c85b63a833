use phonesift_core::domain::CanonicalPhone;
use phonesift_store::error::{StoreError, StoreErrorKind};
use phonesift_store::repo::OfferNew;
use phonesift_store::Store;

fn setup() -> (Store, phonesift_core::domain::Offer, CanonicalPhone) {
    let store = Store::open_in_memory().expect("open store");
    store.migrate().expect("migrate");
    let offer = store
        .offers()
        .create(
            1_700_000_000,
            OfferNew {
                olx_id: "42".to_string(),
                phones: vec!["+79161234567".to_string()],
                location_id: None,
            },
        )
        .expect("create offer");
    let phone: CanonicalPhone = "+79161234567".parse().expect("phone");
    store
        .phones()
        .get_or_create(1_700_000_000, &phone)
        .expect("create phone");
    (store, offer, phone)
}

#[test]
fn attach_twice_reports_duplicate_link() {
    let (store, offer, phone) = setup();
    let now = 1_700_000_100;

    store
        .offer_phones()
        .attach(now, offer.id, &phone)
        .expect("first attach");
    let err = store
        .offer_phones()
        .attach(now, offer.id, &phone)
        .expect_err("second attach");

    assert_eq!(err.kind(), StoreErrorKind::DuplicateLink);
    match err {
        StoreError::DuplicateLink {
            offer_id,
            phone: linked,
        } => {
            assert_eq!(offer_id, offer.id);
            assert_eq!(linked, phone);
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(store.offer_phones().count_for_phone(&phone).expect("count"), 1);
    assert!(store.offer_phones().is_linked(offer.id, &phone).expect("linked"));
}

#[test]
fn attach_unknown_phone_is_not_a_duplicate() {
    let (store, offer, _) = setup();
    let unknown: CanonicalPhone = "+380501234567".parse().expect("phone");

    let err = store
        .offer_phones()
        .attach(1_700_000_100, offer.id, &unknown)
        .expect_err("foreign key violation");
    assert_eq!(err.kind(), StoreErrorKind::Sql);
}

#[test]
fn list_for_offer_returns_linked_phones() {
    let (store, offer, phone) = setup();
    store
        .offer_phones()
        .attach(1_700_000_100, offer.id, &phone)
        .expect("attach");

    let linked = store
        .offer_phones()
        .list_for_offer(offer.id)
        .expect("list");
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].phone, phone);

    let refreshed = store
        .phones()
        .refresh_offer_count(&phone)
        .expect("refresh");
    assert_eq!(refreshed.offer_count, 1);
}

#[test]
fn invalid_phones_are_recorded_once() {
    let (store, offer, _) = setup();
    let now = 1_700_000_100;

    assert!(store
        .invalid_phones()
        .record(now, offer.id, "12345")
        .expect("record"));
    assert!(!store
        .invalid_phones()
        .record(now + 5, offer.id, "12345")
        .expect("record again"));
    assert!(store
        .invalid_phones()
        .record(now, offer.id, "")
        .expect("record empty"));

    let recorded = store
        .invalid_phones()
        .list_for_offer(offer.id)
        .expect("list");
    let values: Vec<&str> = recorded.iter().map(|item| item.phone.as_str()).collect();
    assert_eq!(values, vec!["", "12345"]);
    assert!(recorded.iter().all(|item| item.created_at == now));
}
