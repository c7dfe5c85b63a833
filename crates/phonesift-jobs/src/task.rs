use crate::count::UpdatePhoneOfferCount;
use crate::detect::DetectPhones;
use crate::error::{JobError, Result};
use crate::queue::JobContext;
use phonesift_core::{CanonicalPhone, OfferId};
use serde::{Deserialize, Serialize};

/// Payload stored in the `jobs` table, encoded as tagged JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "snake_case")]
pub enum Task {
    DetectPhones { offer_id: OfferId },
    UpdatePhoneOfferCount { phone: CanonicalPhone },
    ExportOffer { offer_id: OfferId },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Complete,
    /// Put the job back on its queue for a later attempt.
    Release,
}

impl Task {
    pub fn name(&self) -> &'static str {
        match self {
            Task::DetectPhones { .. } => "detect_phones",
            Task::UpdatePhoneOfferCount { .. } => "update_phone_offer_count",
            Task::ExportOffer { .. } => "export_offer",
        }
    }

    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn decode(payload: &str) -> Result<Self> {
        Ok(serde_json::from_str(payload)?)
    }

    pub fn run(&self, ctx: &JobContext<'_>) -> Result<JobOutcome> {
        match self {
            Task::DetectPhones { offer_id } => {
                let report = DetectPhones::new(*offer_id).handle(ctx)?;
                Ok(if report.release {
                    JobOutcome::Release
                } else {
                    JobOutcome::Complete
                })
            }
            Task::UpdatePhoneOfferCount { phone } => {
                UpdatePhoneOfferCount::new(phone.clone()).handle(ctx)?;
                Ok(JobOutcome::Complete)
            }
            // Export content is produced by a separate consumer of `export_offers`.
            Task::ExportOffer { .. } => Err(JobError::UnsupportedTask(self.name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Task;
    use phonesift_core::OfferId;

    #[test]
    fn tasks_use_tagged_json() {
        let phone = "+79161234567".parse().expect("phone");
        let encoded = Task::UpdatePhoneOfferCount { phone }.encode().expect("encode");
        assert_eq!(
            encoded,
            r#"{"task":"update_phone_offer_count","phone":"+79161234567"}"#
        );
    }

    #[test]
    fn decode_restores_task() {
        let offer_id = OfferId::new();
        let encoded = Task::DetectPhones { offer_id }.encode().expect("encode");
        assert_eq!(
            Task::decode(&encoded).expect("decode"),
            Task::DetectPhones { offer_id }
        );
    }

    #[test]
    fn decode_rejects_non_canonical_phone() {
        let payload = r#"{"task":"update_phone_offer_count","phone":"89161234567"}"#;
        assert!(Task::decode(payload).is_err());
    }

    #[test]
    fn decode_rejects_unknown_task() {
        assert!(Task::decode(r#"{"task":"scrape"}"#).is_err());
    }
}
