use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("invalid phone format: {phone:?}")]
    InvalidPhoneFormat { phone: String },
    #[error("olx id is required")]
    EmptyOlxId,
    #[error("location name is required")]
    EmptyLocationName,
}
