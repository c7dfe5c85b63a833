pub mod export;
pub mod queues;

pub use export::{is_exportable_region, UNKNOWN_REGION};
