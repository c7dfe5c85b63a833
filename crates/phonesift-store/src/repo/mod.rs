pub mod invalid_phones;
pub mod jobs;
pub mod locations;
pub mod offer_phones;
pub mod offers;
pub mod phones;

pub use invalid_phones::InvalidPhonesRepo;
pub use jobs::{JobNew, JobsRepo, QueuedJob};
pub use locations::LocationsRepo;
pub use offer_phones::OfferPhonesRepo;
pub use offers::{OfferNew, OffersRepo};
pub use phones::{PhoneCreateResult, PhonesRepo};
