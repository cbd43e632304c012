//! # Domain Types
//!
//! Core domain types used throughout NutriScan.
//!
//! ## Type Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌─────────────────┐   ┌──────────────────┐     │
//! │  │RawDetectionEvent │──►│  AcceptedScan   │──►│  LookupOutcome   │     │
//! │  │  ─────────────   │   │  ─────────────  │   │  ─────────────   │     │
//! │  │  symbology       │   │  symbology      │   │  Found(record)   │     │
//! │  │  payload         │   │  payload        │   │  NotFound        │     │
//! │  │  timestamp       │   │                 │   │  TransportError  │     │
//! │  └──────────────────┘   └─────────────────┘   └────────┬─────────┘     │
//! │     (ephemeral)          (consumed once)               │               │
//! │                                                        ▼               │
//! │                         ┌─────────────────────────────────────────┐    │
//! │                         │  ScanReport                             │    │
//! │                         │  product + HealthScore + Summary        │    │
//! │                         └─────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::BTreeMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::nutrition::NutritionSummary;
use crate::score::{HealthScore, ScoringModel};

/// Per-100g nutrient values keyed by the product database's nutrient keys.
///
/// A `BTreeMap` keeps iteration (and serialized output) stable.
pub type NutrientMap = BTreeMap<String, f64>;

/// Nutrient keys used by the scorer and the nutrition summary.
pub mod nutrient_keys {
    pub const ENERGY_KCAL_100G: &str = "energy-kcal_100g";
    pub const ENERGY_KCAL: &str = "energy-kcal";
    /// Energy in kJ per 100g.
    pub const ENERGY_100G: &str = "energy_100g";
    pub const PROTEINS_100G: &str = "proteins_100g";
    pub const SUGARS_100G: &str = "sugars_100g";
    pub const FAT_100G: &str = "fat_100g";
}

// =============================================================================
// Raw Detection Event
// =============================================================================

/// One decode reported by the capture surface.
///
/// Produced continuously while the camera points at a code; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDetectionEvent {
    /// Barcode symbology as reported by the decoder (e.g. "ean13", "qr").
    pub symbology: String,

    /// Decoded payload text.
    pub payload: String,

    /// Monotonic time the decode was observed.
    pub timestamp: Instant,
}

impl RawDetectionEvent {
    pub fn new(symbology: impl Into<String>, payload: impl Into<String>, timestamp: Instant) -> Self {
        RawDetectionEvent {
            symbology: symbology.into(),
            payload: payload.into(),
            timestamp,
        }
    }
}

// =============================================================================
// Accepted Scan
// =============================================================================

/// A read that passed every gate check and will be looked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AcceptedScan {
    pub symbology: String,
    pub payload: String,
}

// =============================================================================
// Product Record
// =============================================================================

/// A product normalized from the remote database.
///
/// Every descriptive field is optional: partial records are common and the
/// pipeline must not fail because of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProductRecord {
    /// Barcode the record belongs to.
    pub barcode: String,

    /// Display name.
    pub name: Option<String>,

    /// Brand line as returned by the database (may list several brands).
    pub brand: Option<String>,

    /// Front-of-pack image URL.
    pub image_url: Option<String>,

    /// Nutri-Score grade, upper-case `A`..=`E`.
    pub nutri_score_grade: Option<char>,

    /// Net quantity text (e.g. "400 g").
    pub quantity: Option<String>,

    /// Comma separated category list.
    pub categories: Option<String>,

    /// Per-100g nutrient values.
    pub nutrients_per_100g: NutrientMap,
}

impl ProductRecord {
    /// Creates a record with only the barcode set.
    pub fn bare(barcode: impl Into<String>) -> Self {
        ProductRecord {
            barcode: barcode.into(),
            name: None,
            brand: None,
            image_url: None,
            nutri_score_grade: None,
            quantity: None,
            categories: None,
            nutrients_per_100g: NutrientMap::new(),
        }
    }

    /// Returns true if none of the descriptive fields were present.
    pub fn is_bare(&self) -> bool {
        self.name.is_none()
            && self.brand.is_none()
            && self.image_url.is_none()
            && self.nutri_score_grade.is_none()
            && self.quantity.is_none()
            && self.categories.is_none()
            && self.nutrients_per_100g.is_empty()
    }

    /// Returns a per-100g nutrient value by key.
    #[inline]
    pub fn nutrient(&self, key: &str) -> Option<f64> {
        self.nutrients_per_100g.get(key).copied()
    }
}

// =============================================================================
// Lookup Outcome
// =============================================================================

/// Result of resolving a barcode against the product database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LookupOutcome {
    /// The database knows the product.
    Found { product: ProductRecord },

    /// The database answered but does not know the barcode.
    NotFound { barcode: String },

    /// The lookup could not be completed.
    TransportError { reason: String },
}

impl LookupOutcome {
    #[inline]
    pub fn is_found(&self) -> bool {
        matches!(self, LookupOutcome::Found { .. })
    }

    /// Returns the product if one was found.
    pub fn product(&self) -> Option<&ProductRecord> {
        match self {
            LookupOutcome::Found { product } => Some(product),
            _ => None,
        }
    }
}

// =============================================================================
// Scan Report
// =============================================================================

/// Everything the result view shows for one completed scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScanReport {
    pub scan: AcceptedScan,
    pub product: ProductRecord,
    pub score: HealthScore,
    pub summary: NutritionSummary,
    #[ts(as = "String")]
    pub resolved_at: DateTime<Utc>,
}

impl ScanReport {
    /// Scores `product` with `model` and assembles the report.
    pub fn build(
        scan: AcceptedScan,
        product: ProductRecord,
        model: &dyn ScoringModel,
        resolved_at: DateTime<Utc>,
    ) -> Self {
        let score = model.score(&product.nutrients_per_100g);
        let summary = NutritionSummary::from_record(&product);
        ScanReport {
            scan,
            product,
            score,
            summary,
            resolved_at,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::PlaceholderModel;

    #[test]
    fn test_bare_record() {
        let record = ProductRecord::bare("3017620422003");
        assert!(record.is_bare());
        assert_eq!(record.nutrient(nutrient_keys::PROTEINS_100G), None);
    }

    #[test]
    fn test_lookup_outcome_json_shape() {
        let outcome = LookupOutcome::NotFound {
            barcode: "0000000000000".to_string(),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["kind"], "not_found");
        assert_eq!(json["barcode"], "0000000000000");
        assert!(outcome.product().is_none());
    }

    #[test]
    fn test_scan_report_build() {
        let mut product = ProductRecord::bare("3017620422003");
        product.name = Some("Hazelnut spread".to_string());
        product
            .nutrients_per_100g
            .insert(nutrient_keys::SUGARS_100G.to_string(), 56.3);
        product
            .nutrients_per_100g
            .insert(nutrient_keys::FAT_100G.to_string(), 30.9);

        let scan = AcceptedScan {
            symbology: "ean13".to_string(),
            payload: "3017620422003".to_string(),
        };
        let report = ScanReport::build(scan, product, &PlaceholderModel, Utc::now());

        // 50 - 24 (sugar capped at 20g) - 16.72 (20.9g fat above 10g) = 9.28
        assert_eq!(report.score.value, 9);
        assert_eq!(report.summary.sugar_g, Some(56.3));
        assert_eq!(report.summary.protein_g, None);
    }
}
