use crate::domain::ids::{LocationId, OfferId};
use crate::error::CoreError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub olx_id: String,
    /// Raw phone strings as scraped, in listing order.
    pub phones: Vec<String>,
    pub location_id: Option<LocationId>,
    pub created_at: i64,
    pub updated_at: i64,
}

pub fn normalize_olx_id(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::EmptyOlxId);
    }
    Ok(trimmed.to_string())
}
