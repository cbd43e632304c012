//! # Scan Session
//!
//! Orchestrates one scanner screen: capture events in, one lookup at a time,
//! results out to a presenter.
//!
//! ## Session Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Scan Session Flow                              │
//! │                                                                         │
//! │  on_detection(event)                                                    │
//! │     │                                                                   │
//! │     │  ┌──────────── state mutex (one synchronous step) ────────────┐   │
//! │     ├─►│ listening? ──no──► drop                                    │   │
//! │     │  │ gate.offer ──rejected──► drop (trace)                      │   │
//! │     │  │ accepted: listening = false, new ticket {request_id, live} │   │
//! │     │  └────────────────────────────────────────────────────────────┘   │
//! │     │                                                                   │
//! │     ├─► haptics.pulse()            (failure logged, ignored)            │
//! │     ├─► presenter.lookup_started()                                      │
//! │     └─► tokio::spawn ─► resolver.resolve ─► score                       │
//! │                              │                                          │
//! │                              ▼                                          │
//! │        ┌──────────── presentation mutex ───────────────┐                │
//! │        │ ticket still live? ──no──► Discarded          │                │
//! │        │       │ yes                                   │                │
//! │        │       ▼                                       │                │
//! │        │ show_report / show_not_found / show_error     │                │
//! │        │ clear in-flight ticket                        │                │
//! │        └───────────────────────────────────────────────┘                │
//! │                                                                         │
//! │  release()   ─► kill ticket, gate Idle, listening = true                │
//! │  teardown()  ─► kill ticket, listening = false                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `release()` and `teardown()` take the presentation mutex before killing
//! the ticket, so a result is either fully presented before they return or
//! never presented at all. Lock order is presentation, then state.
//!
//! The presenter is never called with the state mutex held, so `show_*`
//! may query the session. It must not call `release()` or `teardown()`
//! synchronously: both wait for the presentation in progress.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use nutriscan_core::{
    AcceptedScan, GateDecision, GatePolicy, GateState, LookupOutcome, PlaceholderModel,
    RawDetectionEvent, ScanGate, ScanReport, ScoringModel,
};

use crate::config::ScannerConfig;
use crate::error::{HapticError, LookupError, LookupResult};
use crate::resolver::{OpenFoodFactsResolver, ProductResolver};

// =============================================================================
// Collaborator Traits
// =============================================================================

/// Physical feedback when a scan is accepted.
pub trait HapticFeedback: Send + Sync {
    fn pulse(&self) -> Result<(), HapticError>;
}

/// Haptics for devices without a vibration motor.
pub struct NoHaptics;

impl HapticFeedback for NoHaptics {
    fn pulse(&self) -> Result<(), HapticError> {
        Ok(())
    }
}

/// Receives everything the user should see.
pub trait ScanPresenter: Send + Sync {
    /// A scan was accepted and its lookup started.
    fn lookup_started(&self, scan: &AcceptedScan);

    /// The product was found and scored.
    fn show_report(&self, report: &ScanReport);

    /// The database does not know the barcode.
    fn show_not_found(&self, barcode: &str);

    /// The lookup failed. The view offers a way back to the scanner.
    fn show_error(&self, reason: &str);
}

/// No-op presenter for testing.
pub struct NoOpPresenter;

impl ScanPresenter for NoOpPresenter {
    fn lookup_started(&self, _scan: &AcceptedScan) {}
    fn show_report(&self, _report: &ScanReport) {}
    fn show_not_found(&self, _barcode: &str) {}
    fn show_error(&self, _reason: &str) {}
}

// =============================================================================
// Scan Outcome
// =============================================================================

/// How a lookup ended.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Product found, scored and presented.
    Report(ScanReport),

    /// Barcode unknown to the database.
    NotFound { barcode: String },

    /// Lookup failed.
    Failed { reason: String },

    /// The session moved on before the lookup finished; nothing was shown.
    Discarded,
}

impl ScanOutcome {
    pub fn report(&self) -> Option<&ScanReport> {
        match self {
            ScanOutcome::Report(report) => Some(report),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ScanOutcome::Report(_) => "report",
            ScanOutcome::NotFound { .. } => "not_found",
            ScanOutcome::Failed { .. } => "failed",
            ScanOutcome::Discarded => "discarded",
        }
    }
}

/// Resolves and scores one accepted scan. Never returns `Discarded`.
pub async fn resolve_scan(
    resolver: &dyn ProductResolver,
    model: &dyn ScoringModel,
    scan: AcceptedScan,
) -> ScanOutcome {
    match resolver.resolve(&scan.payload).await {
        LookupOutcome::Found { product } => {
            ScanOutcome::Report(ScanReport::build(scan, product, model, Utc::now()))
        }
        LookupOutcome::NotFound { barcode } => ScanOutcome::NotFound { barcode },
        LookupOutcome::TransportError { reason } => ScanOutcome::Failed { reason },
    }
}

// =============================================================================
// Lookup Ticket
// =============================================================================

/// Identity and liveness of one in-flight lookup.
#[derive(Debug, Clone)]
struct LookupTicket {
    request_id: Uuid,
    live: Arc<AtomicBool>,
}

impl LookupTicket {
    fn new() -> Self {
        LookupTicket {
            request_id: Uuid::new_v4(),
            live: Arc::new(AtomicBool::new(true)),
        }
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Returns true if the ticket was live.
    fn invalidate(&self) -> bool {
        self.live.swap(false, Ordering::AcqRel)
    }
}

/// Handle to a lookup spawned by [`ScanSession::on_detection`].
#[derive(Debug)]
pub struct InFlightLookup {
    pub request_id: Uuid,
    pub scan: AcceptedScan,
    handle: JoinHandle<ScanOutcome>,
}

impl InFlightLookup {
    /// Waits for the lookup task. Presentation has already happened when
    /// this returns.
    pub async fn outcome(self) -> LookupResult<ScanOutcome> {
        Ok(self.handle.await?)
    }
}

// =============================================================================
// Scan Session
// =============================================================================

struct SessionState {
    gate: ScanGate,
    listening: bool,
    in_flight: Option<LookupTicket>,
}

struct SessionShared {
    state: Mutex<SessionState>,
    presenting: Mutex<()>,
    resolver: Arc<dyn ProductResolver>,
    model: Arc<dyn ScoringModel>,
    haptics: Arc<dyn HapticFeedback>,
    haptics_enabled: bool,
    presenter: Arc<dyn ScanPresenter>,
}

impl SessionShared {
    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn presentation(&self) -> MutexGuard<'_, ()> {
        self.presenting.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_lookup(&self, scan: AcceptedScan, ticket: LookupTicket) -> ScanOutcome {
        let outcome = resolve_scan(self.resolver.as_ref(), self.model.as_ref(), scan).await;

        // Liveness check and presentation are one step against release/teardown
        let _presenting = self.presentation();

        if !ticket.is_live() {
            debug!(
                request_id = %ticket.request_id,
                outcome = outcome.kind(),
                "Discarding stale lookup result"
            );
            return ScanOutcome::Discarded;
        }

        info!(
            request_id = %ticket.request_id,
            outcome = outcome.kind(),
            "Lookup finished"
        );

        match &outcome {
            ScanOutcome::Report(report) => self.presenter.show_report(report),
            ScanOutcome::NotFound { barcode } => self.presenter.show_not_found(barcode),
            ScanOutcome::Failed { reason } => self.presenter.show_error(reason),
            ScanOutcome::Discarded => {}
        }

        let mut state = self.state();
        if state
            .in_flight
            .as_ref()
            .is_some_and(|current| current.request_id == ticket.request_id)
        {
            state.in_flight = None;
        }

        outcome
    }
}

/// One scanner screen. Cheap to clone; clones share the same gate.
#[derive(Clone)]
pub struct ScanSession {
    inner: Arc<SessionShared>,
}

impl ScanSession {
    /// Creates a session with default policy, scoring and feedback.
    pub fn new(resolver: Arc<dyn ProductResolver>) -> Self {
        Self::assemble(SessionParts {
            resolver,
            policy: GatePolicy::default(),
            model: Arc::new(PlaceholderModel),
            haptics: Arc::new(NoHaptics),
            haptics_enabled: true,
            presenter: Arc::new(NoOpPresenter),
        })
    }

    pub fn builder() -> ScanSessionBuilder {
        ScanSessionBuilder::new()
    }

    /// Feeds one capture event to the session.
    ///
    /// Returns the spawned lookup when the event was accepted. Must be
    /// called from within a Tokio runtime.
    pub fn on_detection(&self, event: &RawDetectionEvent) -> Option<InFlightLookup> {
        let (scan, ticket) = {
            let mut state = self.inner.state();

            if !state.listening {
                trace!(payload = %event.payload, "Not listening, detection dropped");
                return None;
            }

            let scan = match state.gate.offer(event) {
                GateDecision::Accepted(scan) => scan,
                GateDecision::Rejected(reason) => {
                    trace!(payload = %event.payload, %reason, "Detection rejected");
                    return None;
                }
            };

            state.listening = false;
            let ticket = LookupTicket::new();
            if let Some(previous) = state.in_flight.replace(ticket.clone()) {
                previous.invalidate();
            }
            (scan, ticket)
        };

        info!(
            request_id = %ticket.request_id,
            symbology = %scan.symbology,
            barcode = %scan.payload,
            "Scan accepted"
        );

        if self.inner.haptics_enabled {
            if let Err(e) = self.inner.haptics.pulse() {
                warn!(error = %e, "Haptic feedback failed");
            }
        }

        self.inner.presenter.lookup_started(&scan);

        let shared = Arc::clone(&self.inner);
        let task_scan = scan.clone();
        let task_ticket = ticket.clone();
        let handle =
            tokio::spawn(async move { shared.run_lookup(task_scan, task_ticket).await });

        Some(InFlightLookup {
            request_id: ticket.request_id,
            scan,
            handle,
        })
    }

    /// Re-arms the scanner ("Scan another" / "Go back").
    ///
    /// Any lookup still in flight is discarded. Returns true if the gate
    /// was locked.
    pub fn release(&self) -> bool {
        let _presenting = self.inner.presentation();
        let mut state = self.inner.state();

        if let Some(ticket) = state.in_flight.take() {
            if ticket.invalidate() {
                debug!(request_id = %ticket.request_id, "Released with lookup in flight");
            }
        }

        state.listening = true;
        let was_locked = state.gate.release();
        debug!(was_locked, "Scan gate released");
        was_locked
    }

    /// The screen went away: stop listening and drop any pending result.
    pub fn teardown(&self) {
        let _presenting = self.inner.presentation();
        let mut state = self.inner.state();

        if let Some(ticket) = state.in_flight.take() {
            if ticket.invalidate() {
                debug!(request_id = %ticket.request_id, "Torn down with lookup in flight");
            }
        }

        state.listening = false;
    }

    /// Whether the capture surface should keep delivering events.
    pub fn is_listening(&self) -> bool {
        self.inner.state().listening
    }

    pub fn gate_state(&self) -> GateState {
        self.inner.state().gate.state()
    }

    /// Request id of the lookup still waiting to be presented.
    pub fn in_flight_request(&self) -> Option<Uuid> {
        self.inner
            .state()
            .in_flight
            .as_ref()
            .filter(|t| t.is_live())
            .map(|t| t.request_id)
    }
}

// =============================================================================
// Builder Pattern
// =============================================================================

/// Builder for creating a [`ScanSession`] with options.
pub struct ScanSessionBuilder {
    resolver: Option<Arc<dyn ProductResolver>>,
    policy: GatePolicy,
    model: Option<Arc<dyn ScoringModel>>,
    haptics: Option<Arc<dyn HapticFeedback>>,
    haptics_enabled: bool,
    presenter: Option<Arc<dyn ScanPresenter>>,
}

impl Default for ScanSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanSessionBuilder {
    pub fn new() -> Self {
        ScanSessionBuilder {
            resolver: None,
            policy: GatePolicy::default(),
            model: None,
            haptics: None,
            haptics_enabled: true,
            presenter: None,
        }
    }

    /// Starts from a loaded config: gate policy, haptics flag and an
    /// Open Food Facts resolver.
    pub fn from_config(config: &ScannerConfig) -> LookupResult<Self> {
        let resolver = OpenFoodFactsResolver::new(config.resolver_config())?;
        Ok(Self::new()
            .with_policy(config.gate_policy()?)
            .with_haptics_enabled(config.haptics_enabled())
            .with_resolver(Arc::new(resolver)))
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn ProductResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_policy(mut self, policy: GatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_model(mut self, model: Arc<dyn ScoringModel>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_haptics(mut self, haptics: Arc<dyn HapticFeedback>) -> Self {
        self.haptics = Some(haptics);
        self
    }

    pub fn with_haptics_enabled(mut self, enabled: bool) -> Self {
        self.haptics_enabled = enabled;
        self
    }

    pub fn with_presenter(mut self, presenter: Arc<dyn ScanPresenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    /// Builds the session. A resolver is required.
    pub fn build(self) -> LookupResult<ScanSession> {
        let resolver = self
            .resolver
            .ok_or_else(|| LookupError::InvalidConfig("Product resolver required".into()))?;
        self.policy.validate()?;

        Ok(ScanSession::assemble(SessionParts {
            resolver,
            policy: self.policy,
            model: self.model.unwrap_or_else(|| Arc::new(PlaceholderModel)),
            haptics: self.haptics.unwrap_or_else(|| Arc::new(NoHaptics)),
            haptics_enabled: self.haptics_enabled,
            presenter: self.presenter.unwrap_or_else(|| Arc::new(NoOpPresenter)),
        }))
    }
}

struct SessionParts {
    resolver: Arc<dyn ProductResolver>,
    policy: GatePolicy,
    model: Arc<dyn ScoringModel>,
    haptics: Arc<dyn HapticFeedback>,
    haptics_enabled: bool,
    presenter: Arc<dyn ScanPresenter>,
}

impl ScanSession {
    fn assemble(parts: SessionParts) -> Self {
        info!(
            model = parts.model.name(),
            min_payload_len = parts.policy.min_payload_len,
            cooldown_ms = parts.policy.cooldown.as_millis() as u64,
            "Scan session ready"
        );

        ScanSession {
            inner: Arc::new(SessionShared {
                state: Mutex::new(SessionState {
                    gate: ScanGate::with_policy(parts.policy),
                    listening: true,
                    in_flight: None,
                }),
                presenting: Mutex::new(()),
                resolver: parts.resolver,
                model: parts.model,
                haptics: parts.haptics,
                haptics_enabled: parts.haptics_enabled,
                presenter: parts.presenter,
            }),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
