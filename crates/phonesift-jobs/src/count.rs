use crate::error::Result;
use crate::queue::JobContext;
use phonesift_core::{CanonicalPhone, PhoneRecord};
use tracing::debug;

/// Recomputes how many offers carry a phone.
#[derive(Debug, Clone)]
pub struct UpdatePhoneOfferCount {
    phone: CanonicalPhone,
}

impl UpdatePhoneOfferCount {
    pub fn new(phone: CanonicalPhone) -> Self {
        Self { phone }
    }

    pub fn handle(&self, ctx: &JobContext<'_>) -> Result<PhoneRecord> {
        let record = ctx.store.phones().refresh_offer_count(&self.phone)?;
        debug!(phone = %record.phone, offer_count = record.offer_count, "offer count updated");
        Ok(record)
    }
}
