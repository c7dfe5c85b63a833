use crate::domain::ids::OfferId;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A phone number in one of the accepted canonical layouts:
/// `+7` followed by 10 digits, or `+380` followed by 9 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CanonicalPhone(String);

impl CanonicalPhone {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for CanonicalPhone {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if is_canonical(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(CoreError::InvalidPhoneFormat {
                phone: s.to_string(),
            })
        }
    }
}

impl TryFrom<String> for CanonicalPhone {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if is_canonical(&value) {
            Ok(Self(value))
        } else {
            Err(CoreError::InvalidPhoneFormat { phone: value })
        }
    }
}

impl From<CanonicalPhone> for String {
    fn from(value: CanonicalPhone) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhoneRecord {
    pub phone: CanonicalPhone,
    pub offer_count: i64,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidPhone {
    pub offer_id: OfferId,
    pub phone: String,
    pub created_at: i64,
}

/// Keeps only ASCII digits and `+`.
pub fn clean_phone(raw: &str) -> String {
    raw.chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '+')
        .collect()
}

/// Cleans `raw` and maps it onto a canonical phone.
///
/// Rules are checked in a fixed order and the first match wins:
///
/// 1. `+7XXXXXXXXXX` / `+380XXXXXXXXX` are returned unchanged.
/// 2. `0XXXXXXXXX` (Ukrainian local) gets a `+38` prefix.
/// 3. `[+]7XXXXXXXXXX` / `[+]8XXXXXXXXXX` get their prefix replaced by `+7`.
/// 4. `9XXXXXXXXX` (Russian mobile without trunk) gets a `+7` prefix.
/// 5. `380XXXXXXXXX` gets a `+` prefix.
///
/// Anything else is rejected with the cleaned value attached.
pub fn normalize_phone(raw: &str) -> Result<CanonicalPhone, CoreError> {
    let cleaned = clean_phone(raw);

    if is_canonical(&cleaned) {
        return Ok(CanonicalPhone(cleaned));
    }

    if digits_after(&cleaned, "0", 9) {
        return Ok(CanonicalPhone(format!("+38{cleaned}")));
    }

    let unsigned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
    if let Some(rest) = unsigned
        .strip_prefix('7')
        .or_else(|| unsigned.strip_prefix('8'))
    {
        if is_digits(rest, 10) {
            return Ok(CanonicalPhone(format!("+7{rest}")));
        }
    }

    if digits_after(&cleaned, "9", 9) {
        return Ok(CanonicalPhone(format!("+7{cleaned}")));
    }

    if digits_after(&cleaned, "380", 9) {
        return Ok(CanonicalPhone(format!("+{cleaned}")));
    }

    Err(CoreError::InvalidPhoneFormat { phone: cleaned })
}

fn is_canonical(value: &str) -> bool {
    digits_after(value, "+7", 10) || digits_after(value, "+380", 9)
}

fn digits_after(value: &str, prefix: &str, count: usize) -> bool {
    value
        .strip_prefix(prefix)
        .is_some_and(|rest| is_digits(rest, count))
}

fn is_digits(value: &str, count: usize) -> bool {
    value.len() == count && value.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::{clean_phone, normalize_phone, CanonicalPhone};
    use crate::error::CoreError;

    fn normalized(raw: &str) -> String {
        normalize_phone(raw).expect("valid phone").into_string()
    }

    #[test]
    fn clean_phone_keeps_digits_and_plus() {
        assert_eq!(clean_phone("+7 (916) 123-45-67"), "+79161234567");
        assert_eq!(clean_phone("tel: 050/123 45 67"), "0501234567");
        assert_eq!(clean_phone("not-a-phone"), "");
    }

    #[test]
    fn canonical_values_are_returned_unchanged() {
        assert_eq!(normalized("+79161234567"), "+79161234567");
        assert_eq!(normalized("+380501234567"), "+380501234567");
    }

    #[test]
    fn ukrainian_local_numbers_get_country_code() {
        assert_eq!(normalized("0501234567"), "+380501234567");
        assert_eq!(normalized("(050) 123-45-67"), "+380501234567");
    }

    #[test]
    fn russian_trunk_prefixes_become_plus_seven() {
        assert_eq!(normalized("89161234567"), "+79161234567");
        assert_eq!(normalized("79161234567"), "+79161234567");
        assert_eq!(normalized("+89161234567"), "+79161234567");
    }

    #[test]
    fn ten_digit_russian_mobile_gets_plus_seven() {
        assert_eq!(normalized("9161234567"), "+79161234567");
    }

    #[test]
    fn ukrainian_international_without_plus() {
        assert_eq!(normalized("380501234567"), "+380501234567");
    }

    #[test]
    fn eleven_digits_starting_with_seven_use_trunk_rule() {
        assert_eq!(normalized("73801234567"), "+73801234567");
    }

    #[test]
    fn rejects_unknown_layouts_with_cleaned_value() {
        assert_eq!(
            normalize_phone("12345"),
            Err(CoreError::InvalidPhoneFormat {
                phone: "12345".to_string()
            })
        );
        assert_eq!(
            normalize_phone("call me: 12-34"),
            Err(CoreError::InvalidPhoneFormat {
                phone: "1234".to_string()
            })
        );
        assert_eq!(
            normalize_phone("not-a-phone"),
            Err(CoreError::InvalidPhoneFormat {
                phone: String::new()
            })
        );
    }

    #[test]
    fn rejects_plus_in_the_middle() {
        assert!(normalize_phone("916+1234567").is_err());
        assert!(normalize_phone("++79161234567").is_err());
    }

    #[test]
    fn rejects_wrong_lengths() {
        assert!(normalize_phone("+7916123456").is_err());
        assert!(normalize_phone("+3805012345678").is_err());
        assert!(normalize_phone("050123456").is_err());
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["0501234567", "89161234567", "9161234567", "380501234567"] {
            let first = normalized(raw);
            assert_eq!(normalized(&first), first);
        }
    }

    #[test]
    fn from_str_only_accepts_canonical_values() {
        assert!("+79161234567".parse::<CanonicalPhone>().is_ok());
        assert!("89161234567".parse::<CanonicalPhone>().is_err());
    }
}
