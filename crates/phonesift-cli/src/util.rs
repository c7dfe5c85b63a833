use crate::error::{invalid_input, not_found};
use anyhow::Result;
use phonesift_core::{Offer, OfferId};
use phonesift_store::Store;
use std::str::FromStr;

/// Resolves an offer by internal id, falling back to its OLX id.
pub fn resolve_offer(store: &Store, raw: &str) -> Result<Offer> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(invalid_input("offer id cannot be empty"));
    }

    let found = match OfferId::from_str(trimmed) {
        Ok(id) => store.offers().get(id)?,
        Err(_) => None,
    };
    let found = match found {
        Some(offer) => Some(offer),
        None => store.offers().get_by_olx_id(trimmed)?,
    };
    found.ok_or_else(|| not_found(format!("offer {trimmed}")))
}

#[cfg(test)]
mod tests {
    use super::resolve_offer;
    use crate::error::CliError;
    use phonesift_store::repo::OfferNew;
    use phonesift_store::Store;

    fn store_with_offer() -> (Store, phonesift_core::Offer) {
        let store = Store::open_in_memory().expect("open store");
        store.migrate().expect("migrate");
        let offer = store
            .offers()
            .create(
                1_700_000_000,
                OfferNew {
                    olx_id: "IDkq3Zx".to_string(),
                    phones: Vec::new(),
                    location_id: None,
                },
            )
            .expect("offer");
        (store, offer)
    }

    #[test]
    fn resolves_by_internal_or_olx_id() {
        let (store, offer) = store_with_offer();
        let by_id = resolve_offer(&store, &offer.id.to_string()).expect("by id");
        let by_olx = resolve_offer(&store, " IDkq3Zx ").expect("by olx id");
        assert_eq!(by_id.id, offer.id);
        assert_eq!(by_olx.id, offer.id);
    }

    #[test]
    fn unknown_offer_is_not_found() {
        let (store, _) = store_with_offer();
        let err = resolve_offer(&store, "missing").expect_err("missing");
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::NotFound(_))
        ));
    }

    #[test]
    fn blank_offer_is_invalid() {
        let (store, _) = store_with_offer();
        let err = resolve_offer(&store, "  ").expect_err("blank");
        assert!(matches!(
            err.downcast_ref::<CliError>(),
            Some(CliError::InvalidInput(_))
        ));
    }
}
