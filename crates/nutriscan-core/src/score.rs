//! # Health Score
//!
//! Deterministic, bounded score computed from per-100g nutrient values.
//!
//! ## Placeholder Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Placeholder Health Score                             │
//! │                                                                         │
//! │  base                 = 50                                              │
//! │  proteinContribution  = min(proteins_100g, 20) × 1.5     (+ up to 30)   │
//! │  sugarPenalty         = min(sugars_100g, 20)   × 1.2     (− up to 24)   │
//! │  fatPenalty           = max(0, fat_100g − 10)  × 0.8     (unbounded)    │
//! │                                                                         │
//! │  value = clamp(round(base + protein − sugar − fat), 0, 100)             │
//! │                                                                         │
//! │  Absent nutrients contribute 0. Calories are displayed, never scored.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The coefficients are a placeholder, not a nutritional claim, but results
//! must match the mobile app exactly. They live behind [`ScoringModel`] so a
//! real model can replace them without touching the gate or the resolver.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{nutrient_keys, NutrientMap};

const BASE_SCORE: f64 = 50.0;
const PROTEIN_CAP_G: f64 = 20.0;
const PROTEIN_WEIGHT: f64 = 1.5;
const SUGAR_CAP_G: f64 = 20.0;
const SUGAR_WEIGHT: f64 = 1.2;
const FAT_ALLOWANCE_G: f64 = 10.0;
const FAT_WEIGHT: f64 = 0.8;

// =============================================================================
// Health Score
// =============================================================================

/// The weighted adjustments that produced a [`HealthScore`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScoreBreakdown {
    pub protein_contribution: f64,
    pub sugar_penalty: f64,
    pub fat_penalty: f64,
}

/// A product's health score, always within `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HealthScore {
    pub value: u8,
    pub breakdown: ScoreBreakdown,
}

// =============================================================================
// Scoring Model
// =============================================================================

/// A scoring policy. Implementations must be pure: equal maps, equal scores.
pub trait ScoringModel: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &'static str;

    /// Scores a per-100g nutrient map. Never fails.
    fn score(&self, nutrients: &NutrientMap) -> HealthScore;
}

/// The placeholder formula shipped with the first mobile release.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceholderModel;

impl ScoringModel for PlaceholderModel {
    fn name(&self) -> &'static str {
        "placeholder-v1"
    }

    fn score(&self, nutrients: &NutrientMap) -> HealthScore {
        let protein = grams(nutrients, nutrient_keys::PROTEINS_100G);
        let sugar = grams(nutrients, nutrient_keys::SUGARS_100G);
        let fat = grams(nutrients, nutrient_keys::FAT_100G);

        let breakdown = ScoreBreakdown {
            protein_contribution: protein.min(PROTEIN_CAP_G) * PROTEIN_WEIGHT,
            sugar_penalty: sugar.min(SUGAR_CAP_G) * SUGAR_WEIGHT,
            fat_penalty: (fat - FAT_ALLOWANCE_G).max(0.0) * FAT_WEIGHT,
        };

        let raw = BASE_SCORE + breakdown.protein_contribution
            - breakdown.sugar_penalty
            - breakdown.fat_penalty;

        HealthScore {
            value: round_half_up(raw).clamp(0.0, 100.0) as u8,
            breakdown,
        }
    }
}

/// Scores `nutrients` with the default model.
///
/// ## Example
/// ```rust
/// use nutriscan_core::score::score;
/// use nutriscan_core::types::NutrientMap;
///
/// let mut nutrients = NutrientMap::new();
/// nutrients.insert("proteins_100g".to_string(), 10.0);
/// nutrients.insert("sugars_100g".to_string(), 5.0);
/// nutrients.insert("fat_100g".to_string(), 8.0);
///
/// assert_eq!(score(&nutrients).value, 59);
/// ```
pub fn score(nutrients: &NutrientMap) -> HealthScore {
    PlaceholderModel.score(nutrients)
}

/// Missing and non-finite values count as zero.
fn grams(nutrients: &NutrientMap, key: &str) -> f64 {
    nutrients
        .get(key)
        .copied()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Rounds .5 toward positive infinity, like the mobile app did.
fn round_half_up(x: f64) -> f64 {
    (x + 0.5).floor()
}

// =============================================================================
// Unit Tests
// =============================================================================
