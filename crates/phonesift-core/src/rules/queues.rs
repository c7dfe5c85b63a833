pub const DETECT_PHONES_QUEUE: &str = "detect_phones";
pub const UPDATE_PHONE_OFFER_COUNT_QUEUE: &str = "update_phone_offer_count";
pub const EXPORT_OFFERS_QUEUE: &str = "export_offers";
