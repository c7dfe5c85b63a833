use phonesift_core::rules::queues::UPDATE_PHONE_OFFER_COUNT_QUEUE;
use phonesift_core::{CanonicalPhone, Offer};
use phonesift_jobs::detect::DetectPhones;
use phonesift_jobs::{JobContext, JobError, Result, StoreQueue, Task, TaskQueue};
use phonesift_store::error::StoreError;
use phonesift_store::repo::OfferNew;
use phonesift_store::Store;
use std::cell::{Cell, RefCell};
use std::io;

const NOW: i64 = 1_700_000_000;

#[derive(Default)]
struct RecordingQueue {
    dispatched: RefCell<Vec<(String, Task)>>,
}

impl TaskQueue for RecordingQueue {
    fn dispatch(&self, _now_utc: i64, queue: &str, task: &Task) -> Result<()> {
        self.dispatched
            .borrow_mut()
            .push((queue.to_string(), task.clone()));
        Ok(())
    }
}

/// Writes through to the store but rejects its first dispatch.
struct FailFirstQueue<'a> {
    inner: StoreQueue<'a>,
    failed: Cell<bool>,
}

impl TaskQueue for FailFirstQueue<'_> {
    fn dispatch(&self, now_utc: i64, queue: &str, task: &Task) -> Result<()> {
        if !self.failed.replace(true) {
            return Err(StoreError::Io(io::Error::other("disk full")).into());
        }
        self.inner.dispatch(now_utc, queue, task)
    }
}

fn setup(phones: &[&str]) -> (Store, Offer) {
    let store = Store::open_in_memory().expect("open store");
    store.migrate().expect("migrate");
    let offer = store
        .offers()
        .create(
            NOW,
            OfferNew {
                olx_id: "olx-1".to_string(),
                phones: phones.iter().map(|phone| phone.to_string()).collect(),
                location_id: None,
            },
        )
        .expect("create offer");
    (store, offer)
}

fn phone(value: &str) -> CanonicalPhone {
    value.parse().expect("canonical phone")
}

#[test]
fn valid_and_invalid_phones_in_one_offer() {
    let (store, offer) = setup(&["+7 (916) 123-45-67", "not-a-phone"]);
    let queue = RecordingQueue::default();
    let ctx = JobContext {
        store: &store,
        queue: &queue,
        now_utc: NOW,
    };

    let report = DetectPhones::new(offer.id).handle(&ctx).expect("detect");

    assert_eq!(report.linked, vec![phone("+79161234567")]);
    assert!(report.already_linked.is_empty());
    assert_eq!(report.invalid, vec![String::new()]);
    assert!(report.release);

    assert_eq!(store.phones().count().expect("count"), 1);
    let linked = store
        .offer_phones()
        .list_for_offer(offer.id)
        .expect("linked phones");
    assert_eq!(linked.len(), 1);
    assert_eq!(linked[0].phone, phone("+79161234567"));

    let invalid = store
        .invalid_phones()
        .list_for_offer(offer.id)
        .expect("invalid phones");
    assert_eq!(invalid.len(), 1);
    assert_eq!(invalid[0].phone, "");

    assert_eq!(
        *queue.dispatched.borrow(),
        vec![(
            UPDATE_PHONE_OFFER_COUNT_QUEUE.to_string(),
            Task::UpdatePhoneOfferCount {
                phone: phone("+79161234567")
            }
        )]
    );
}

#[test]
fn invalid_phone_early_in_list_does_not_stop_later_phones() {
    let (store, offer) = setup(&["12345", "0501234567"]);
    let queue = RecordingQueue::default();
    let ctx = JobContext {
        store: &store,
        queue: &queue,
        now_utc: NOW,
    };

    let report = DetectPhones::new(offer.id).handle(&ctx).expect("detect");

    assert!(report.release);
    assert_eq!(report.invalid, vec!["12345".to_string()]);
    assert_eq!(report.linked, vec![phone("+380501234567")]);
}

#[test]
fn rerun_after_correction_does_not_relink() {
    let (store, offer) = setup(&["+7 (916) 123-45-67", "not-a-phone"]);
    let queue = RecordingQueue::default();
    let ctx = JobContext {
        store: &store,
        queue: &queue,
        now_utc: NOW,
    };
    DetectPhones::new(offer.id).handle(&ctx).expect("first pass");

    store
        .offers()
        .replace_phones(
            NOW + 60,
            offer.id,
            &["+7 (916) 123-45-67".to_string(), "050 123 45 67".to_string()],
        )
        .expect("correct phones");
    let ctx = JobContext {
        store: &store,
        queue: &queue,
        now_utc: NOW + 60,
    };
    let report = DetectPhones::new(offer.id).handle(&ctx).expect("second pass");

    assert!(!report.release);
    assert_eq!(report.already_linked, vec![phone("+79161234567")]);
    assert_eq!(report.linked, vec![phone("+380501234567")]);
    assert_eq!(
        store
            .offer_phones()
            .count_for_phone(&phone("+79161234567"))
            .expect("count"),
        1
    );

    let count_tasks: Vec<Task> = queue
        .dispatched
        .borrow()
        .iter()
        .map(|(_, task)| task.clone())
        .collect();
    assert_eq!(
        count_tasks,
        vec![
            Task::UpdatePhoneOfferCount {
                phone: phone("+79161234567")
            },
            Task::UpdatePhoneOfferCount {
                phone: phone("+380501234567")
            },
        ]
    );
}

#[test]
fn retry_without_correction_keeps_releasing() {
    let (store, offer) = setup(&["89161234567", "12345"]);
    let queue = RecordingQueue::default();
    let ctx = JobContext {
        store: &store,
        queue: &queue,
        now_utc: NOW,
    };

    let first = DetectPhones::new(offer.id).handle(&ctx).expect("first pass");
    let second = DetectPhones::new(offer.id).handle(&ctx).expect("second pass");

    assert!(first.release);
    assert!(second.release);
    assert_eq!(second.already_linked, vec![phone("+79161234567")]);
    assert_eq!(
        store
            .invalid_phones()
            .list_for_offer(offer.id)
            .expect("invalid")
            .len(),
        1
    );
    assert_eq!(queue.dispatched.borrow().len(), 1);
}

#[test]
fn duplicate_numbers_in_one_offer_link_once() {
    let (store, offer) = setup(&["89161234567", "+7 916 123 45 67", "9161234567"]);
    let queue = RecordingQueue::default();
    let ctx = JobContext {
        store: &store,
        queue: &queue,
        now_utc: NOW,
    };

    let report = DetectPhones::new(offer.id).handle(&ctx).expect("detect");

    assert_eq!(report.linked.len(), 1);
    assert_eq!(report.already_linked.len(), 2);
    assert!(!report.release);
    assert_eq!(queue.dispatched.borrow().len(), 1);
}

#[test]
fn offers_share_phone_records() {
    let (store, first) = setup(&["0501234567"]);
    let second = store
        .offers()
        .create(
            NOW,
            OfferNew {
                olx_id: "olx-2".to_string(),
                phones: vec!["380501234567".to_string()],
                location_id: None,
            },
        )
        .expect("second offer");
    let queue = StoreQueue::new(&store);
    let ctx = JobContext {
        store: &store,
        queue: &queue,
        now_utc: NOW,
    };

    DetectPhones::new(first.id).handle(&ctx).expect("first offer");
    DetectPhones::new(second.id).handle(&ctx).expect("second offer");

    assert_eq!(store.phones().count().expect("count"), 1);
    assert_eq!(
        store
            .offer_phones()
            .count_for_phone(&phone("+380501234567"))
            .expect("links"),
        2
    );
    assert_eq!(
        store
            .jobs()
            .pending_count(UPDATE_PHONE_OFFER_COUNT_QUEUE)
            .expect("pending"),
        2
    );
}

#[test]
fn missing_offer_is_reported() {
    let store = Store::open_in_memory().expect("open store");
    store.migrate().expect("migrate");
    let queue = RecordingQueue::default();
    let ctx = JobContext {
        store: &store,
        queue: &queue,
        now_utc: NOW,
    };

    let err = DetectPhones::new(Default::default())
        .handle(&ctx)
        .expect_err("missing offer");
    assert!(matches!(err, JobError::MissingOffer(_)));
    assert!(!err.is_retryable());
}

#[test]
fn failed_count_dispatch_rolls_back_link() {
    let (store, offer) = setup(&["050 123 45 67"]);
    let queue = FailFirstQueue {
        inner: StoreQueue::new(&store),
        failed: Cell::new(false),
    };
    let ctx = JobContext {
        store: &store,
        queue: &queue,
        now_utc: NOW,
    };
    let phone = phone("+380501234567");

    let err = DetectPhones::new(offer.id)
        .handle(&ctx)
        .expect_err("dispatch fails");
    assert!(err.is_retryable());
    assert!(!store
        .offer_phones()
        .is_linked(offer.id, &phone)
        .expect("linked"));

    let report = DetectPhones::new(offer.id).handle(&ctx).expect("retry");
    assert_eq!(report.linked, vec![phone.clone()]);
    assert!(report.already_linked.is_empty());
    assert_eq!(
        store
            .jobs()
            .pending_count(UPDATE_PHONE_OFFER_COUNT_QUEUE)
            .expect("pending"),
        1
    );
}
