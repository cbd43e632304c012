//! # Validation Module
//!
//! Input validation and normalization for NutriScan.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Scan gate                                                    │
//! │  ├── Empty / short payloads dropped silently                           │
//! │  └── Runs for every camera event, so it stays trivial                  │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Resolver (THIS MODULE)                                       │
//! │  ├── validate_barcode before any request is built                      │
//! │  └── normalize_* on every field copied from the response               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Config                                                       │
//! │  └── validate_cooldown_ms / GatePolicy::validate                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use nutriscan_core::validation::{normalize_grade, validate_barcode};
//!
//! assert_eq!(validate_barcode(" 3017620422003 ").unwrap(), "3017620422003");
//! assert_eq!(normalize_grade(Some("e")), Some('E'));
//! assert_eq!(normalize_grade(Some("unknown")), None);
//! ```

use crate::error::ValidationError;
use crate::MAX_SCAN_COOLDOWN_MS;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest barcode payload sent to the product database.
pub const MAX_BARCODE_LEN: usize = 64;

// =============================================================================
// Barcode
// =============================================================================

/// Validates a barcode before lookup and returns it trimmed.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 64 characters
/// - No whitespace or control characters inside the code
pub fn validate_barcode(barcode: &str) -> ValidationResult<String> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if barcode.chars().count() > MAX_BARCODE_LEN {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: MAX_BARCODE_LEN,
        });
    }

    if barcode
        .chars()
        .any(|c| c.is_whitespace() || c.is_control())
    {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must not contain whitespace or control characters".to_string(),
        });
    }

    Ok(barcode.to_string())
}

/// Checks if a payload looks like a retail product code (EAN-8, UPC-A, EAN-13).
pub fn is_retail_barcode(payload: &str) -> bool {
    let len = payload.len();
    (8..=13).contains(&len) && payload.chars().all(|c| c.is_ascii_digit())
}

/// Best-effort symbology name for a payload typed or piped in without one.
pub fn infer_symbology(payload: &str) -> &'static str {
    if !is_retail_barcode(payload) {
        return "unknown";
    }
    match payload.len() {
        8 => "ean8",
        12 => "upc_a",
        13 => "ean13",
        _ => "unknown",
    }
}

// =============================================================================
// Normalizers
// =============================================================================

/// Trims a text field; blank values become `None`.
pub fn normalize_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Keeps a Nutri-Score grade only if it is a single letter `a`..=`e`.
pub fn normalize_grade(value: Option<&str>) -> Option<char> {
    let mut chars = value?.trim().chars();
    let grade = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() {
        return None;
    }
    ('A'..='E').contains(&grade).then_some(grade)
}

// =============================================================================
// Policy
// =============================================================================

/// Validates a configured cooldown in milliseconds.
pub fn validate_cooldown_ms(ms: u64) -> ValidationResult<()> {
    if ms > MAX_SCAN_COOLDOWN_MS {
        return Err(ValidationError::OutOfRange {
            field: "cooldown_ms".to_string(),
            min: 0,
            max: MAX_SCAN_COOLDOWN_MS,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_barcode() {
        assert_eq!(validate_barcode("3017620422003").unwrap(), "3017620422003");
        assert_eq!(validate_barcode("  737628064502\n").unwrap(), "737628064502");

        assert!(validate_barcode("").is_err());
        assert!(validate_barcode("   ").is_err());
        assert!(validate_barcode("301 762").is_err());
        assert!(validate_barcode("30176\u{0}20").is_err());
        assert!(validate_barcode(&"1".repeat(65)).is_err());
        assert!(validate_barcode(&"1".repeat(64)).is_ok());
    }

    #[test]
    fn test_is_retail_barcode() {
        assert!(is_retail_barcode("96385074"));
        assert!(is_retail_barcode("036000291452"));
        assert!(is_retail_barcode("3017620422003"));
        assert!(!is_retail_barcode("1234567"));
        assert!(!is_retail_barcode("https://example.com"));
    }

    #[test]
    fn test_infer_symbology() {
        assert_eq!(infer_symbology("96385074"), "ean8");
        assert_eq!(infer_symbology("036000291452"), "upc_a");
        assert_eq!(infer_symbology("3017620422003"), "ean13");
        assert_eq!(infer_symbology("1234567890"), "unknown");
        assert_eq!(infer_symbology("hello-world"), "unknown");
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text(Some(" Ferrero ".to_string())), Some("Ferrero".to_string()));
        assert_eq!(normalize_text(Some("   ".to_string())), None);
        assert_eq!(normalize_text(None), None);
    }

    #[test]
    fn test_normalize_grade() {
        assert_eq!(normalize_grade(Some("a")), Some('A'));
        assert_eq!(normalize_grade(Some("E")), Some('E'));
        assert_eq!(normalize_grade(Some("f")), None);
        assert_eq!(normalize_grade(Some("unknown")), None);
        assert_eq!(normalize_grade(Some("not-applicable")), None);
        assert_eq!(normalize_grade(Some("")), None);
        assert_eq!(normalize_grade(None), None);
    }

    #[test]
    fn test_validate_cooldown_ms() {
        assert!(validate_cooldown_ms(0).is_ok());
        assert!(validate_cooldown_ms(1_200).is_ok());
        assert!(validate_cooldown_ms(1_200_000).is_err());
    }
}
