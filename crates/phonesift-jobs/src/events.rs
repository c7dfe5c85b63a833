use crate::error::Result;
use crate::export::{ExportDecision, OfferExportListener};
use crate::queue::TaskQueue;
use crate::task::Task;
use phonesift_core::rules::queues::DETECT_PHONES_QUEUE;
use phonesift_core::Offer;
use phonesift_store::Store;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OfferParsedReport {
    pub export: ExportDecision,
    pub detect_dispatched: bool,
}

/// Runs the follow-ups for a freshly stored or re-scraped offer.
///
/// Export is queued only for offers in a known region; phone detection is
/// queued whenever the listing carries at least one phone string.
pub fn offer_parsed(
    store: &Store,
    queue: &dyn TaskQueue,
    now_utc: i64,
    offer: &Offer,
) -> Result<OfferParsedReport> {
    let export = OfferExportListener::new(store, queue).on_offer_parsed(now_utc, offer)?;
    let detect_dispatched = !offer.phones.is_empty();
    if detect_dispatched {
        queue.dispatch(
            now_utc,
            DETECT_PHONES_QUEUE,
            &Task::DetectPhones { offer_id: offer.id },
        )?;
    }
    Ok(OfferParsedReport {
        export,
        detect_dispatched,
    })
}
