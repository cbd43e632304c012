//! # nutriscan-core: Pure Scan-to-Result Logic for NutriScan
//!
//! This crate is the **heart** of NutriScan. It decides which camera reads
//! become a scan and how a product is scored, as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        NutriScan Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Capture surface (camera, stdin in the CLI)         │   │
//! │  │        { symbology, payload } at a high, variable rate          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ nutriscan-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   gate    │  │   score   │  │ nutrition │  │ validation│  │   │
//! │  │   │ ScanGate  │  │HealthScore│  │  Summary  │  │  barcode  │  │   │
//! │  │   │ Idle/Lock │  │ 0..=100   │  │  "-" rows │  │  policy   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO CLOCK READS • PURE FUNCTIONS        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              nutriscan-lookup (I/O Layer)                       │   │
//! │  │        Open Food Facts resolver, config, scan session           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (RawDetectionEvent, ProductRecord, LookupOutcome, ...)
//! - [`gate`] - The scan gate state machine
//! - [`score`] - Health score model
//! - [`nutrition`] - Display-ready per-100g summary
//! - [`error`] - Domain error types
//! - [`validation`] - Barcode and policy validation
//!
//! ## Example Usage
//!
//! ```rust
//! use std::time::{Duration, Instant};
//! use nutriscan_core::gate::ScanGate;
//! use nutriscan_core::types::RawDetectionEvent;
//!
//! let mut gate = ScanGate::new();
//! let t0 = Instant::now();
//!
//! let first = gate.offer(&RawDetectionEvent::new("ean13", "3017620422003", t0));
//! assert!(first.is_accepted());
//!
//! // Same barcode still in view: the gate is locked.
//! let again = RawDetectionEvent::new("ean13", "3017620422003", t0 + Duration::from_millis(30));
//! assert!(!gate.offer(&again).is_accepted());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod gate;
pub mod nutrition;
pub mod score;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use gate::{GateDecision, GatePolicy, GateRejection, GateState, ScanGate};
pub use nutrition::NutritionSummary;
pub use score::{score, HealthScore, PlaceholderModel, ScoreBreakdown, ScoringModel};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Minimum payload length (in characters) for a read to count as a scan.
///
/// Shorter reads are partial decodes or glare artifacts.
pub const MIN_PAYLOAD_LEN: usize = 6;

/// Minimum interval between two accepted scans, in milliseconds.
///
/// Guards against two distinct codes being picked up as the camera sweeps
/// across a shelf.
pub const SCAN_COOLDOWN_MS: u64 = 1200;

/// Upper bound accepted for a configured cooldown, in milliseconds.
///
/// A cooldown measured in minutes would make the scanner look frozen.
pub const MAX_SCAN_COOLDOWN_MS: u64 = 60_000;
