pub mod ids;
pub mod location;
pub mod offer;
pub mod phone;

pub use ids::{JobId, LocationId, OfferId};
pub use location::{normalize_location_name, normalize_region, Location};
pub use offer::{normalize_olx_id, Offer};
pub use phone::{clean_phone, normalize_phone, CanonicalPhone, InvalidPhone, PhoneRecord};
