//! # Terminal Rendering
//!
//! Text screens for the scanner, mirroring the mobile result view:
//!
//! ```text
//! Nutella
//! Brand: Ferrero   •   400 g
//! No image
//!
//! Health score: 9
//! Nutri-Score:  E
//!
//! Per 100g
//!   Calories  539 kcal
//!   Protein   6.3 g
//!   Sugar     56.3 g
//!   Fat       30.9 g
//!
//! Categories
//!   Spreads, Sweet spreads
//!
//! ← Scan another
//! ```

use nutriscan_core::nutrition::MISSING;
use nutriscan_core::{AcceptedScan, HealthScore, NutritionSummary, ScanReport};
use nutriscan_lookup::{ScanOutcome, ScanPresenter};
use tracing::warn;

const SCAN_ANOTHER: &str = "← Scan another";
const GO_BACK: &str = "Go back";

// =============================================================================
// Screens
// =============================================================================

pub fn lookup_started(scan: &AcceptedScan) -> String {
    format!("Fetching product {}…", scan.payload)
}

pub fn report(report: &ScanReport) -> String {
    let product = &report.product;
    let mut lines = Vec::new();

    lines.push(
        product
            .name
            .clone()
            .unwrap_or_else(|| "Unknown product".to_string()),
    );

    let mut brand = format!("Brand: {}", product.brand.as_deref().unwrap_or(MISSING));
    if let Some(quantity) = &product.quantity {
        brand.push_str(&format!("   •   {}", quantity));
    }
    lines.push(brand);

    lines.push(match &product.image_url {
        Some(url) => format!("Image: {}", url),
        None => "No image".to_string(),
    });

    lines.push(String::new());
    lines.push(format!("Health score: {}", report.score.value));
    lines.push(format!("Nutri-Score:  {}", report.summary.nutri_score_display()));
    lines.push(String::new());
    lines.extend(per_100g(&report.summary));

    if let Some(categories) = &product.categories {
        lines.push(String::new());
        lines.push("Categories".to_string());
        lines.push(format!("  {}", categories));
    }

    lines.push(String::new());
    lines.push(SCAN_ANOTHER.to_string());
    lines.join("\n")
}

pub fn not_found(barcode: &str) -> String {
    [
        "Product not found".to_string(),
        format!("No product matches barcode {}.", barcode),
        GO_BACK.to_string(),
    ]
    .join("\n")
}

pub fn error(reason: &str) -> String {
    [
        "Couldn't load product".to_string(),
        reason.to_string(),
        GO_BACK.to_string(),
    ]
    .join("\n")
}

/// Offline score with its breakdown.
pub fn score(score: &HealthScore, summary: &NutritionSummary) -> String {
    let breakdown = &score.breakdown;
    let mut lines = vec![
        format!("Health score: {}", score.value),
        format!("  Protein contribution  +{:.1}", breakdown.protein_contribution),
        format!("  Sugar penalty         -{:.1}", breakdown.sugar_penalty),
        format!("  Fat penalty           -{:.1}", breakdown.fat_penalty),
        String::new(),
    ];
    lines.extend(per_100g(summary));
    lines.join("\n")
}

fn per_100g(summary: &NutritionSummary) -> Vec<String> {
    let mut lines = vec!["Per 100g".to_string()];
    lines.extend(
        summary
            .rows()
            .iter()
            .map(|(label, value)| format!("  {:<10}{}", label, value)),
    );
    lines
}

// =============================================================================
// Presenter
// =============================================================================

/// Prints session results to stdout, as text screens or JSON lines.
pub struct TerminalPresenter {
    json: bool,
}

impl TerminalPresenter {
    pub fn new(json: bool) -> Self {
        TerminalPresenter { json }
    }

    fn emit_json(&self, outcome: &ScanOutcome) {
        match serde_json::to_string(outcome) {
            Ok(line) => println!("{}", line),
            Err(e) => warn!(error = %e, "Failed to encode scan outcome"),
        }
    }
}

impl ScanPresenter for TerminalPresenter {
    fn lookup_started(&self, scan: &AcceptedScan) {
        if !self.json {
            println!("{}", lookup_started(scan));
        }
    }

    fn show_report(&self, scan_report: &ScanReport) {
        if self.json {
            self.emit_json(&ScanOutcome::Report(scan_report.clone()));
        } else {
            println!("{}\n", report(scan_report));
        }
    }

    fn show_not_found(&self, barcode: &str) {
        if self.json {
            self.emit_json(&ScanOutcome::NotFound {
                barcode: barcode.to_string(),
            });
        } else {
            println!("{}\n", not_found(barcode));
        }
    }

    fn show_error(&self, reason: &str) {
        if self.json {
            self.emit_json(&ScanOutcome::Failed {
                reason: reason.to_string(),
            });
        } else {
            println!("{}\n", error(reason));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use nutriscan_core::{PlaceholderModel, ProductRecord};

    fn scan() -> AcceptedScan {
        AcceptedScan {
            symbology: "ean13".to_string(),
            payload: "3017620422003".to_string(),
        }
    }

    fn build(product: ProductRecord) -> ScanReport {
        ScanReport::build(scan(), product, &PlaceholderModel, Utc::now())
    }

    #[test]
    fn test_bare_product_renders_dashes() {
        let text = report(&build(ProductRecord::bare("3017620422003")));
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "Unknown product");
        assert_eq!(lines[1], "Brand: -");
        assert_eq!(lines[2], "No image");
        assert!(text.contains("Health score: 50"));
        assert!(text.contains("Nutri-Score:  -"));
        assert!(text.contains("  Calories  -"));
        assert!(text.contains("  Fat       -"));
        assert!(!text.contains("Categories"));
        assert_eq!(*lines.last().unwrap(), "← Scan another");
    }

    #[test]
    fn test_full_product() {
        let mut product = ProductRecord::bare("3017620422003");
        product.name = Some("Nutella".to_string());
        product.brand = Some("Ferrero".to_string());
        product.quantity = Some("400 g".to_string());
        product.nutri_score_grade = Some('E');
        product.categories = Some("Spreads".to_string());
        product
            .nutrients_per_100g
            .insert("energy-kcal_100g".to_string(), 539.4);
        product.nutrients_per_100g.insert("sugars_100g".to_string(), 56.3);

        let text = report(&build(product));
        assert!(text.starts_with("Nutella\nBrand: Ferrero   •   400 g\n"));
        assert!(text.contains("Nutri-Score:  E"));
        assert!(text.contains("  Calories  539 kcal"));
        assert!(text.contains("  Sugar     56.3 g"));
        assert!(text.contains("Categories\n  Spreads"));
    }

    #[test]
    fn test_not_found_and_error_offer_go_back() {
        let text = not_found("0000000000000");
        assert!(text.contains("0000000000000"));
        assert!(text.ends_with("Go back"));

        let text = error("Connection failed: refused");
        assert!(text.starts_with("Couldn't load product\nConnection failed: refused"));
        assert!(text.ends_with("Go back"));
    }

    #[test]
    fn test_score_screen() {
        let s = nutriscan_core::score(&Default::default());
        let text = score(&s, &NutritionSummary::default());
        assert!(text.starts_with("Health score: 50"));
        assert!(text.contains("Protein contribution  +0.0"));
    }
}
