//! Waybill number format check.

use once_cell::sync::Lazy;
use regex_lite::Regex;

use super::error::LookupError;

/// `GFRT-` + 6 digits + `-` + 3 uppercase letters.
static WAYBILL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^GFRT-[0-9]{6}-[A-Z]{3}$").expect("waybill pattern is valid"));

/// Example shown in validation messages.
pub const WAYBILL_EXAMPLE: &str = "GFRT-123456-ABC";

/// Trim user input the way the submit handler does.
pub fn normalize_identifier(raw: &str) -> &str {
    raw.trim()
}

/// Check an already trimmed identifier against the waybill format.
pub fn validate_identifier(identifier: &str) -> Result<(), LookupError> {
    if WAYBILL_PATTERN.is_match(identifier) {
        Ok(())
    } else {
        Err(LookupError::InvalidFormat(identifier.to_string()))
    }
}

pub fn is_valid_identifier(identifier: &str) -> bool {
    validate_identifier(identifier).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_well_formed() {
        assert!(is_valid_identifier("GFRT-123456-ABC"));
        assert!(is_valid_identifier("GFRT-000000-ZZZ"));
        assert!(is_valid_identifier(WAYBILL_EXAMPLE));
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in [
            "",
            "BAD-1",
            "GFRT-12345-ABC",
            "GFRT-1234567-ABC",
            "GFRT-123456-AB",
            "GFRT-123456-abc",
            "gfrt-123456-ABC",
            "XGFRT-123456-ABC",
            "GFRT-123456-ABCD",
            " GFRT-123456-ABC",
        ] {
            assert!(!is_valid_identifier(bad), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn test_error_carries_input() {
        let err = validate_identifier("BAD-1").unwrap_err();
        assert!(matches!(err, LookupError::InvalidFormat(ref s) if s == "BAD-1"));
        assert!(err.is_validation());
    }

    #[test]
    fn test_normalize_trims() {
        assert_eq!(normalize_identifier("  GFRT-123456-ABC \n"), "GFRT-123456-ABC");
        assert!(is_valid_identifier(normalize_identifier(" GFRT-123456-ABC ")));
    }
}
