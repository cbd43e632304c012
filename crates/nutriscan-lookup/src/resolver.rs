//! # Product Resolver
//!
//! Resolves a barcode to a [`LookupOutcome`] against the product database.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         resolve(barcode)                                │
//! │                                                                         │
//! │   validate_barcode ──✗──► TransportError("Invalid barcode: ...")        │
//! │         │ ✓                     (no request sent)                       │
//! │         ▼                                                               │
//! │   GET {base}/api/v2/product/{barcode}.json?fields=...                   │
//! │         │                                                               │
//! │         ├── network error / timeout ─────────► TransportError           │
//! │         ├── 404 + {"status": 0} ─────────────► NotFound                 │
//! │         ├── other non-2xx ───────────────────► TransportError(HTTP n)   │
//! │         ├── 2xx, undecodable body ───────────► TransportError           │
//! │         └── 2xx ──► ProductResponse::into_outcome                       │
//! │                        ├── status 0 ─────────► NotFound                 │
//! │                        └── product ──────────► Found(record)            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One attempt per call. No cache, no shared mutable state: the resolver is
//! safe to call concurrently.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use tracing::{debug, info, warn};
use url::Url;

use nutriscan_core::validation::validate_barcode;
use nutriscan_core::LookupOutcome;

use crate::config::{DEFAULT_BASE_URL, DEFAULT_USER_AGENT};
use crate::error::{LookupError, LookupResult};
use crate::protocol::{ProductResponse, PRODUCT_FIELDS};

// =============================================================================
// Resolver Trait
// =============================================================================

/// Looks up a barcode. Every failure is folded into the outcome.
#[async_trait]
pub trait ProductResolver: Send + Sync {
    async fn resolve(&self, barcode: &str) -> LookupOutcome;
}

// =============================================================================
// Open Food Facts Resolver
// =============================================================================

/// HTTP settings for [`OpenFoodFactsResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        ResolverConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Resolver backed by the Open Food Facts v2 product endpoint.
#[derive(Debug, Clone)]
pub struct OpenFoodFactsResolver {
    client: reqwest::Client,
    base_url: Url,
}

impl OpenFoodFactsResolver {
    /// Creates a resolver with its own HTTP client.
    pub fn new(config: ResolverConfig) -> LookupResult<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(LookupError::InvalidUrl(format!(
                "{} cannot be used as a base URL",
                config.base_url
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .build()?;

        Ok(OpenFoodFactsResolver { client, base_url })
    }

    /// Builds the product URL for an already validated barcode.
    ///
    /// The barcode is percent-encoded as a single path segment.
    pub fn product_url(&self, barcode: &str) -> LookupResult<Url> {
        let file = format!("{}.json", barcode);
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LookupError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(["api", "v2", "product", file.as_str()]);
        url.set_query(Some(&format!("fields={}", PRODUCT_FIELDS.join(","))));
        Ok(url)
    }

    /// Performs one lookup, surfacing failures as [`LookupError`].
    pub async fn fetch(&self, barcode: &str) -> LookupResult<LookupOutcome> {
        let barcode = validate_barcode(barcode)?;
        let url = self.product_url(&barcode)?;

        debug!(%url, "Requesting product");

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            // The service answers unknown barcodes with 404 and a normal body
            if status == StatusCode::NOT_FOUND {
                if let Ok(decoded) = ProductResponse::from_slice(&body) {
                    if decoded.is_not_found() {
                        return Ok(LookupOutcome::NotFound { barcode });
                    }
                }
            }
            return Err(LookupError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let decoded = ProductResponse::from_slice(&body)?;
        Ok(decoded.into_outcome(&barcode))
    }
}

#[async_trait]
impl ProductResolver for OpenFoodFactsResolver {
    async fn resolve(&self, barcode: &str) -> LookupOutcome {
        let started = Instant::now();

        match self.fetch(barcode).await {
            Ok(outcome) => {
                info!(
                    barcode,
                    found = outcome.is_found(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Product lookup finished"
                );
                outcome
            }
            Err(e) => {
                warn!(barcode, error = %e, "Product lookup failed");
                LookupOutcome::TransportError {
                    reason: e.to_string(),
                }
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
