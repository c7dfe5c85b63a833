/// Region placeholder written by the scraper when it could not resolve one.
pub const UNKNOWN_REGION: &str = "---";

pub fn is_exportable_region(region: Option<&str>) -> bool {
    match region {
        Some(region) => !region.is_empty() && region != UNKNOWN_REGION,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::is_exportable_region;

    #[test]
    fn known_region_is_exportable() {
        assert!(is_exportable_region(Some("Kyivska")));
    }

    #[test]
    fn missing_or_placeholder_region_is_not_exportable() {
        assert!(!is_exportable_region(None));
        assert!(!is_exportable_region(Some("")));
        assert!(!is_exportable_region(Some("---")));
    }
}
