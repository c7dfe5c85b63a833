use crate::error::Result;
use phonesift_core::{OfferId, PhoneRecord};
use phonesift_store::error::StoreError;
use phonesift_store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Linked,
    AlreadyLinked,
}

/// Attaches phone records to offers, treating an existing link as success.
pub struct OfferPhoneLinker<'a> {
    store: &'a Store,
}

impl<'a> OfferPhoneLinker<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn link(&self, now_utc: i64, offer_id: OfferId, phone: &PhoneRecord) -> Result<LinkOutcome> {
        match self.store.offer_phones().attach(now_utc, offer_id, &phone.phone) {
            Ok(()) => Ok(LinkOutcome::Linked),
            Err(StoreError::DuplicateLink { .. }) => Ok(LinkOutcome::AlreadyLinked),
            Err(err) => Err(err.into()),
        }
    }
}
