//! # Product Database Protocol
//!
//! Wire types for the Open Food Facts v2 product endpoint and their mapping
//! onto [`LookupOutcome`].
//!
//! ## Response Shape
//! ```text
//! GET /api/v2/product/{barcode}.json?fields=code,product_name,...
//!
//! {
//!   "code": "3017620422003",
//!   "status": 1,                      ← 1 found, 0 not found
//!   "status_verbose": "product found",
//!   "product": {
//!     "product_name": "...",
//!     "brands": "...",
//!     "image_url": "...",
//!     "nutriscore_grade": "e",
//!     "nutriments": { "sugars_100g": 56.3, ... },
//!     "quantity": "400 g",
//!     "categories": "..."
//!   }
//! }
//! ```
//!
//! The database is user-edited. Any field may be missing, `null`, a number
//! where a string was expected, or an empty string. Decoding is lenient for
//! all of them; only a body that is not a JSON object fails.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use nutriscan_core::validation::{normalize_grade, normalize_text};
use nutriscan_core::{LookupOutcome, NutrientMap, ProductRecord};

/// Fields requested from the product endpoint.
pub const PRODUCT_FIELDS: &[&str] = &[
    "code",
    "product_name",
    "brands",
    "image_url",
    "nutriscore_grade",
    "nutriments",
    "quantity",
    "categories",
];

/// Status marker for a known product.
pub const STATUS_FOUND: i64 = 1;

/// Status marker for an unknown barcode.
pub const STATUS_NOT_FOUND: i64 = 0;

// =============================================================================
// Wire Types
// =============================================================================

/// Top-level body of the product endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductResponse {
    #[serde(default, deserialize_with = "lenient_text")]
    pub code: Option<String>,

    /// Usually `0` or `1`; kept raw because some mirrors send it as a string.
    #[serde(default)]
    pub status: Option<Value>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub status_verbose: Option<String>,

    #[serde(default)]
    pub product: Option<ProductPayload>,
}

/// The `product` object, restricted to [`PRODUCT_FIELDS`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPayload {
    #[serde(default, deserialize_with = "lenient_text")]
    pub product_name: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub brands: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub image_url: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub nutriscore_grade: Option<String>,

    #[serde(default)]
    pub nutriments: Option<Value>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub quantity: Option<String>,

    #[serde(default, deserialize_with = "lenient_text")]
    pub categories: Option<String>,
}

// =============================================================================
// Mapping
// =============================================================================

impl ProductResponse {
    /// Decodes a response body.
    pub fn from_slice(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    /// Numeric status marker, if the body carried a usable one.
    pub fn status_code(&self) -> Option<i64> {
        match self.status.as_ref()? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Returns true if the body says the barcode is unknown.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(STATUS_NOT_FOUND)
    }

    /// Maps the body onto a lookup outcome for `barcode`.
    ///
    /// ```text
    /// status 0                      → NotFound
    /// product present               → Found(record)
    /// status 1, no product          → Found(bare record)
    /// anything else, no product     → NotFound
    /// ```
    pub fn into_outcome(self, barcode: &str) -> LookupOutcome {
        if self.is_not_found() {
            return LookupOutcome::NotFound {
                barcode: barcode.to_string(),
            };
        }

        let status = self.status_code();
        let code = normalize_text(self.code).unwrap_or_else(|| barcode.to_string());

        match self.product {
            Some(product) => LookupOutcome::Found {
                product: product.into_record(code),
            },
            None if status == Some(STATUS_FOUND) => LookupOutcome::Found {
                product: ProductRecord::bare(code),
            },
            None => LookupOutcome::NotFound {
                barcode: barcode.to_string(),
            },
        }
    }
}

impl ProductPayload {
    /// Normalizes the payload into a [`ProductRecord`].
    pub fn into_record(self, barcode: String) -> ProductRecord {
        ProductRecord {
            barcode,
            name: normalize_text(self.product_name),
            brand: normalize_text(self.brands),
            image_url: normalize_text(self.image_url),
            nutri_score_grade: normalize_grade(self.nutriscore_grade.as_deref()),
            quantity: normalize_text(self.quantity),
            categories: normalize_text(self.categories),
            nutrients_per_100g: self
                .nutriments
                .as_ref()
                .map(numeric_nutrients)
                .unwrap_or_default(),
        }
    }
}

/// Keeps the finite numeric entries of a `nutriments` object.
///
/// Numeric strings ("12.5") are accepted; units, labels and anything
/// non-finite are dropped.
fn numeric_nutrients(nutriments: &Value) -> NutrientMap {
    let Some(object) = nutriments.as_object() else {
        return NutrientMap::new();
    };

    object
        .iter()
        .filter_map(|(key, value)| {
            let number = match value {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            }?;
            number.is_finite().then(|| (key.clone(), number))
        })
        .collect()
}

/// Accepts a string or a number; everything else becomes `None`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
