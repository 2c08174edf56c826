use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Width of a customer code ("SabreCode") in both source formats.
pub const CUSTOMER_CODE_WIDTH: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustomerCodeError {
    #[error("Customer code is empty")]
    Empty,
    #[error("Customer code '{code}' is longer than {max} characters")]
    TooLong { code: String, max: usize },
}

/// A 7-character, left-zero-padded customer identifier.
///
/// This is the join key between bill-run rows and EFT records.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomerCode(String);

impl CustomerCode {
    /// Trims and zero-pads a raw identifier. Identifiers that are already
    /// wider than seven characters are rejected rather than truncated.
    pub fn normalize(raw: &str) -> Result<Self, CustomerCodeError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(CustomerCodeError::Empty);
        }
        let len = raw.chars().count();
        if len > CUSTOMER_CODE_WIDTH {
            return Err(CustomerCodeError::TooLong {
                code: raw.to_string(),
                max: CUSTOMER_CODE_WIDTH,
            });
        }
        let mut code = "0".repeat(CUSTOMER_CODE_WIDTH - len);
        code.push_str(raw);
        Ok(CustomerCode(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_codes_are_left_padded() {
        assert_eq!(CustomerCode::normalize("12").unwrap().as_str(), "0000012");
        assert_eq!(CustomerCode::normalize(" 42 ").unwrap().as_str(), "0000042");
    }

    #[test]
    fn full_width_codes_are_kept() {
        assert_eq!(CustomerCode::normalize("1234567").unwrap().as_str(), "1234567");
        assert_eq!(CustomerCode::normalize("0000012").unwrap().as_str(), "0000012");
    }

    #[test]
    fn padding_is_idempotent() {
        let once = CustomerCode::normalize("7").unwrap();
        let twice = CustomerCode::normalize(once.as_str()).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn over_width_codes_are_rejected_not_truncated() {
        let err = CustomerCode::normalize("12345678").unwrap_err();
        assert_eq!(
            err,
            CustomerCodeError::TooLong { code: "12345678".into(), max: 7 }
        );
    }

    #[test]
    fn empty_code_is_rejected() {
        assert_eq!(CustomerCode::normalize("   "), Err(CustomerCodeError::Empty));
    }

    #[test]
    fn serializes_as_plain_string() {
        let code = CustomerCode::normalize("12").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"0000012\"");
    }
}
