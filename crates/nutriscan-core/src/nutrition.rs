//! # Nutrition Summary
//!
//! The four per-100g metrics shown next to the health score, with the
//! display rules of the result view: each absent value renders as `-`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::{nutrient_keys, NutrientMap, ProductRecord};

const KJ_PER_KCAL: f64 = 4.184;

/// Placeholder shown for any value the database did not provide.
pub const MISSING: &str = "-";

/// Per-100g display values.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NutritionSummary {
    pub calories_kcal: Option<f64>,
    pub protein_g: Option<f64>,
    pub sugar_g: Option<f64>,
    pub fat_g: Option<f64>,
    pub nutri_score_grade: Option<char>,
}

impl NutritionSummary {
    /// Builds the summary for a product record.
    pub fn from_record(record: &ProductRecord) -> Self {
        NutritionSummary {
            nutri_score_grade: record.nutri_score_grade,
            ..Self::from_nutrients(&record.nutrients_per_100g)
        }
    }

    /// Builds the summary from a bare nutrient map.
    ///
    /// Calories prefer the explicit kcal fields and fall back to the kJ
    /// energy value converted to kcal.
    pub fn from_nutrients(nutrients: &NutrientMap) -> Self {
        let finite = |key: &str| nutrients.get(key).copied().filter(|v| v.is_finite());

        let calories_kcal = finite(nutrient_keys::ENERGY_KCAL_100G)
            .or_else(|| finite(nutrient_keys::ENERGY_KCAL))
            .or_else(|| finite(nutrient_keys::ENERGY_100G).map(|kj| kj / KJ_PER_KCAL));

        NutritionSummary {
            calories_kcal,
            protein_g: finite(nutrient_keys::PROTEINS_100G),
            sugar_g: finite(nutrient_keys::SUGARS_100G),
            fat_g: finite(nutrient_keys::FAT_100G),
            nutri_score_grade: None,
        }
    }

    /// "250 kcal" (rounded) or "-".
    pub fn calories_display(&self) -> String {
        match self.calories_kcal {
            Some(kcal) => format!("{} kcal", (kcal + 0.5).floor() as i64),
            None => MISSING.to_string(),
        }
    }

    pub fn protein_display(&self) -> String {
        grams_display(self.protein_g)
    }

    pub fn sugar_display(&self) -> String {
        grams_display(self.sugar_g)
    }

    pub fn fat_display(&self) -> String {
        grams_display(self.fat_g)
    }

    /// Upper-case grade letter or "-".
    pub fn nutri_score_display(&self) -> String {
        self.nutri_score_grade
            .map(|g| g.to_ascii_uppercase().to_string())
            .unwrap_or_else(|| MISSING.to_string())
    }

    /// The per-100g table rows, in display order.
    pub fn rows(&self) -> [(&'static str, String); 4] {
        [
            ("Calories", self.calories_display()),
            ("Protein", self.protein_display()),
            ("Sugar", self.sugar_display()),
            ("Fat", self.fat_display()),
        ]
    }
}

fn grams_display(value: Option<f64>) -> String {
    match value {
        Some(g) => format!("{} g", g),
        None => MISSING.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: &[(&str, f64)]) -> NutrientMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn test_absent_values_render_as_dash() {
        let summary = NutritionSummary::from_nutrients(&NutrientMap::new());
        for (_, value) in summary.rows() {
            assert_eq!(value, "-");
        }
        assert_eq!(summary.nutri_score_display(), "-");
    }

    #[test]
    fn test_present_values_render_with_units() {
        let summary = NutritionSummary::from_nutrients(&map(&[
            ("energy-kcal_100g", 539.4),
            ("proteins_100g", 6.3),
            ("sugars_100g", 56.3),
            ("fat_100g", 0.0),
        ]));
        assert_eq!(
            summary.rows(),
            [
                ("Calories", "539 kcal".to_string()),
                ("Protein", "6.3 g".to_string()),
                ("Sugar", "56.3 g".to_string()),
                ("Fat", "0 g".to_string()),
            ]
        );
    }

    #[test]
    fn test_calorie_fallbacks() {
        let kcal = NutritionSummary::from_nutrients(&map(&[
            ("energy-kcal", 120.0),
            ("energy_100g", 2000.0),
        ]));
        assert_eq!(kcal.calories_kcal, Some(120.0));

        let kj = NutritionSummary::from_nutrients(&map(&[("energy_100g", 418.4)]));
        assert_eq!(kj.calories_display(), "100 kcal");
    }

    #[test]
    fn test_grade_comes_from_record() {
        let mut record = ProductRecord::bare("3017620422003");
        record.nutri_score_grade = Some('E');
        let summary = NutritionSummary::from_record(&record);
        assert_eq!(summary.nutri_score_display(), "E");
    }
}
