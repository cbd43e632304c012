//! # nutriscan-lookup: Product Lookup & Scan Session for NutriScan
//!
//! Everything in NutriScan that touches the network, the clock or a device.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        nutriscan-lookup                                 │
//! │                                                                         │
//! │   capture events                                                        │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ┌───────────────┐   AcceptedScan   ┌────────────────────────────────┐  │
//! │  │  ScanSession  │─────────────────►│  ProductResolver               │  │
//! │  │  ───────────  │                  │  ──────────────                │  │
//! │  │  ScanGate     │                  │  OpenFoodFactsResolver         │  │
//! │  │  listening    │◄─────────────────│  GET /api/v2/product/{code}    │  │
//! │  │  liveness     │   LookupOutcome  └────────────────────────────────┘  │
//! │  └──────┬────────┘                                                      │
//! │         │ ScanReport / not found / error                                │
//! │         ▼                                                               │
//! │  ┌───────────────┐    ┌───────────────┐                                 │
//! │  │ ScanPresenter │    │ HapticFeedback│                                 │
//! │  └───────────────┘    └───────────────┘                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Scanner configuration (TOML + env)
//! - [`error`] - Lookup error types
//! - [`protocol`] - Product database wire types
//! - [`resolver`] - HTTP product resolver
//! - [`session`] - Scan session orchestration

pub mod config;
pub mod error;
pub mod protocol;
pub mod resolver;
pub mod session;

pub use config::{FeedbackSettings, GateSettings, LookupSettings, ScannerConfig};
pub use error::{HapticError, LookupError, LookupResult};
pub use protocol::{ProductResponse, PRODUCT_FIELDS};
pub use resolver::{OpenFoodFactsResolver, ProductResolver, ResolverConfig};
pub use session::{
    resolve_scan, HapticFeedback, InFlightLookup, NoHaptics, NoOpPresenter, ScanOutcome,
    ScanPresenter, ScanSession, ScanSessionBuilder,
};
