use crate::error::{JobError, Result};
use crate::linker::{LinkOutcome, OfferPhoneLinker};
use crate::queue::JobContext;
use crate::task::Task;
use phonesift_core::rules::queues::UPDATE_PHONE_OFFER_COUNT_QUEUE;
use phonesift_core::{normalize_phone, CanonicalPhone, CoreError, OfferId};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Finds the phones of one offer, stores them and links them to the offer.
#[derive(Debug, Clone, Copy)]
pub struct DetectPhones {
    offer_id: OfferId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DetectReport {
    /// Phones linked by this pass; each got a count update.
    pub linked: Vec<CanonicalPhone>,
    pub already_linked: Vec<CanonicalPhone>,
    /// Cleaned values that matched no known layout.
    pub invalid: Vec<String>,
    /// Set when any phone was invalid; the whole job goes back on the queue.
    pub release: bool,
}

impl DetectPhones {
    pub fn new(offer_id: OfferId) -> Self {
        Self { offer_id }
    }

    pub fn offer_id(&self) -> OfferId {
        self.offer_id
    }

    pub fn handle(&self, ctx: &JobContext<'_>) -> Result<DetectReport> {
        let offer = ctx
            .store
            .offers()
            .get(self.offer_id)?
            .ok_or(JobError::MissingOffer(self.offer_id))?;
        let linker = OfferPhoneLinker::new(ctx.store);
        let mut report = DetectReport::default();

        for raw in &offer.phones {
            let canonical = match normalize_phone(raw) {
                Ok(canonical) => canonical,
                Err(CoreError::InvalidPhoneFormat { phone }) => {
                    ctx.store
                        .invalid_phones()
                        .record(ctx.now_utc, offer.id, &phone)?;
                    warn!(olx_id = %offer.olx_id, phone = %phone, "invalid phone format");
                    report.invalid.push(phone);
                    // Keep going: the rest of the list is still processed in this pass.
                    report.release = true;
                    continue;
                }
                Err(err) => return Err(err.into()),
            };

            let record = ctx
                .store
                .phones()
                .get_or_create(ctx.now_utc, &canonical)?
                .phone;
            // The link and its count update commit together, so a failed
            // dispatch leaves the phone unlinked for the retry.
            let outcome = ctx.store.in_transaction(|| -> Result<LinkOutcome> {
                let outcome = linker.link(ctx.now_utc, offer.id, &record)?;
                if outcome == LinkOutcome::Linked {
                    ctx.queue.dispatch(
                        ctx.now_utc,
                        UPDATE_PHONE_OFFER_COUNT_QUEUE,
                        &Task::UpdatePhoneOfferCount {
                            phone: canonical.clone(),
                        },
                    )?;
                }
                Ok(outcome)
            })?;
            match outcome {
                LinkOutcome::Linked => {
                    debug!(olx_id = %offer.olx_id, phone = %canonical, "phone linked");
                    report.linked.push(canonical);
                }
                LinkOutcome::AlreadyLinked => {
                    debug!(olx_id = %offer.olx_id, phone = %canonical, "phone already linked");
                    report.already_linked.push(canonical);
                }
            }
        }

        info!(
            olx_id = %offer.olx_id,
            linked = report.linked.len(),
            already_linked = report.already_linked.len(),
            invalid = report.invalid.len(),
            "phones detected"
        );
        Ok(report)
    }
}
