use phonesift_core::{CoreError, OfferId};
use phonesift_store::error::{StoreError, StoreErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("invalid task payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("offer not found: {0}")]
    MissingOffer(OfferId),
    #[error("task {0} is not handled by this worker")]
    UnsupportedTask(&'static str),
}

pub type Result<T> = std::result::Result<T, JobError>;

impl JobError {
    /// Whether running the same job again could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            JobError::Store(err) => !matches!(
                err.kind(),
                StoreErrorKind::NotFound | StoreErrorKind::InvalidId | StoreErrorKind::Core
            ),
            JobError::Core(_)
            | JobError::Payload(_)
            | JobError::MissingOffer(_)
            | JobError::UnsupportedTask(_) => false,
        }
    }
}
