use crate::error::Result;
use crate::queue::TaskQueue;
use crate::task::Task;
use phonesift_core::rules::is_exportable_region;
use phonesift_core::rules::queues::EXPORT_OFFERS_QUEUE;
use phonesift_core::Offer;
use phonesift_store::Store;
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportDecision {
    Dispatched,
    Skipped,
}

/// Queues offers with a known region for export.
pub struct OfferExportListener<'a> {
    store: &'a Store,
    queue: &'a dyn TaskQueue,
}

impl<'a> OfferExportListener<'a> {
    pub fn new(store: &'a Store, queue: &'a dyn TaskQueue) -> Self {
        Self { store, queue }
    }

    pub fn on_offer_parsed(&self, now_utc: i64, offer: &Offer) -> Result<ExportDecision> {
        let region = self.store.offers().region(offer.id)?;
        if !is_exportable_region(region.as_deref()) {
            info!(olx_id = %offer.olx_id, "offer not exported, has no region");
            return Ok(ExportDecision::Skipped);
        }

        self.queue.dispatch(
            now_utc,
            EXPORT_OFFERS_QUEUE,
            &Task::ExportOffer { offer_id: offer.id },
        )?;
        info!(olx_id = %offer.olx_id, "created export job for offer");
        Ok(ExportDecision::Dispatched)
    }
}
