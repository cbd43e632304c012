//! # Scan Gate
//!
//! Turns the decoder's noisy event stream into one accepted scan per
//! physical barcode presentation.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Scan Gate States                                 │
//! │                                                                         │
//! │              offer(e)                                                   │
//! │   ┌──────┐  payload ok && cooldown elapsed   ┌────────┐                 │
//! │   │ Idle │ ────────────────────────────────► │ Locked │                 │
//! │   └──────┘       emit AcceptedScan           └───┬────┘                 │
//! │     ▲  │                                         │                      │
//! │     │  │ empty / < 6 chars / < 1200ms            │ every event          │
//! │     │  └──► Rejected (no state change)           └──► Rejected(Locked)  │
//! │     │                                                │                  │
//! │     └──────────────────── release() ─────────────────┘                  │
//! │                                                                         │
//! │  lastAcceptedAt / lastAcceptedPayload survive release() so the          │
//! │  cooldown still applies to the next presentation.                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## One Step, One Flag
//! [`ScanGate::offer`] takes `&mut self`: the check and the transition to
//! `Locked` happen in the same call, before the caller can start any async
//! work (haptics, navigation, network). Two events arriving back-to-back can
//! therefore never both be accepted. Callers sharing a gate across tasks must
//! keep it behind a single lock and never split the check from the set.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{AcceptedScan, RawDetectionEvent};
use crate::{MAX_SCAN_COOLDOWN_MS, MIN_PAYLOAD_LEN, SCAN_COOLDOWN_MS};

// =============================================================================
// Gate Policy
// =============================================================================

/// Validity and throttle rules applied by a [`ScanGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatePolicy {
    /// Minimum payload length in characters.
    pub min_payload_len: usize,

    /// Minimum interval between two accepted scans.
    pub cooldown: Duration,
}

impl Default for GatePolicy {
    fn default() -> Self {
        GatePolicy {
            min_payload_len: MIN_PAYLOAD_LEN,
            cooldown: Duration::from_millis(SCAN_COOLDOWN_MS),
        }
    }
}

impl GatePolicy {
    /// Creates a validated policy.
    pub fn new(min_payload_len: usize, cooldown: Duration) -> CoreResult<Self> {
        let policy = GatePolicy {
            min_payload_len,
            cooldown,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Checks that the policy still lets real barcodes through.
    pub fn validate(&self) -> CoreResult<()> {
        if self.min_payload_len == 0 {
            return Err(CoreError::InvalidGatePolicy {
                reason: "min_payload_len must be at least 1".to_string(),
            });
        }

        if self.cooldown > Duration::from_millis(MAX_SCAN_COOLDOWN_MS) {
            return Err(CoreError::InvalidGatePolicy {
                reason: format!(
                    "cooldown of {}ms exceeds the {}ms maximum",
                    self.cooldown.as_millis(),
                    MAX_SCAN_COOLDOWN_MS
                ),
            });
        }

        Ok(())
    }
}

// =============================================================================
// Decisions
// =============================================================================

/// Gate state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// Accepting events.
    #[default]
    Idle,
    /// A scan is in flight; everything is rejected until release.
    Locked,
}

impl std::fmt::Display for GateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateState::Idle => write!(f, "idle"),
            GateState::Locked => write!(f, "locked"),
        }
    }
}

/// Why an event did not become a scan.
///
/// Rejections are the normal case (the camera reports the same code dozens
/// of times per second) and are never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateRejection {
    /// Decoder produced an empty payload.
    EmptyPayload,

    /// Payload is shorter than the policy allows.
    PayloadTooShort { len: usize, min: usize },

    /// A scan was accepted too recently.
    CoolingDown { remaining: Duration },

    /// A scan is already in flight.
    Locked,
}

impl std::fmt::Display for GateRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateRejection::EmptyPayload => write!(f, "empty payload"),
            GateRejection::PayloadTooShort { len, min } => {
                write!(f, "payload too short ({} < {})", len, min)
            }
            GateRejection::CoolingDown { remaining } => {
                write!(f, "cooling down ({}ms left)", remaining.as_millis())
            }
            GateRejection::Locked => write!(f, "locked"),
        }
    }
}

/// Outcome of offering one event to the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    Accepted(AcceptedScan),
    Rejected(GateRejection),
}

impl GateDecision {
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, GateDecision::Accepted(_))
    }

    /// Consumes the decision, returning the scan if one was accepted.
    pub fn into_accepted(self) -> Option<AcceptedScan> {
        match self {
            GateDecision::Accepted(scan) => Some(scan),
            GateDecision::Rejected(_) => None,
        }
    }
}

// =============================================================================
// Scan Gate
// =============================================================================

/// The gating state machine. One instance per scanner screen.
#[derive(Debug, Clone, Default)]
pub struct ScanGate {
    policy: GatePolicy,
    state: GateState,
    last_accepted_at: Option<Instant>,
    last_accepted_payload: Option<String>,
}

impl ScanGate {
    /// Creates an idle gate with the default policy (6 chars, 1200ms).
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an idle gate with a custom policy.
    pub fn with_policy(policy: GatePolicy) -> Self {
        ScanGate {
            policy,
            ..Default::default()
        }
    }

    /// Offers one raw event to the gate.
    ///
    /// On acceptance the gate is already `Locked` when this returns.
    pub fn offer(&mut self, event: &RawDetectionEvent) -> GateDecision {
        if self.state == GateState::Locked {
            return GateDecision::Rejected(GateRejection::Locked);
        }

        if event.payload.is_empty() {
            return GateDecision::Rejected(GateRejection::EmptyPayload);
        }

        let len = event.payload.chars().count();
        if len < self.policy.min_payload_len {
            return GateDecision::Rejected(GateRejection::PayloadTooShort {
                len,
                min: self.policy.min_payload_len,
            });
        }

        if let Some(last) = self.last_accepted_at {
            // Out-of-order timestamps count as zero elapsed.
            let elapsed = event.timestamp.saturating_duration_since(last);
            if elapsed < self.policy.cooldown {
                return GateDecision::Rejected(GateRejection::CoolingDown {
                    remaining: self.policy.cooldown - elapsed,
                });
            }
        }

        self.state = GateState::Locked;
        self.last_accepted_at = Some(event.timestamp);
        self.last_accepted_payload = Some(event.payload.clone());

        GateDecision::Accepted(AcceptedScan {
            symbology: event.symbology.clone(),
            payload: event.payload.clone(),
        })
    }

    /// Re-arms the gate after the consumer is done with the current scan.
    ///
    /// Returns true if the gate was locked.
    pub fn release(&mut self) -> bool {
        let was_locked = self.state == GateState::Locked;
        self.state = GateState::Idle;
        was_locked
    }

    #[inline]
    pub fn state(&self) -> GateState {
        self.state
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.state == GateState::Locked
    }

    #[inline]
    pub fn policy(&self) -> &GatePolicy {
        &self.policy
    }

    pub fn last_accepted_at(&self) -> Option<Instant> {
        self.last_accepted_at
    }

    pub fn last_accepted_payload(&self) -> Option<&str> {
        self.last_accepted_payload.as_deref()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const EAN: &str = "3017620422003";

    fn event(payload: &str, at: Instant) -> RawDetectionEvent {
        RawDetectionEvent::new("ean13", payload, at)
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_accepts_first_valid_event_and_locks() {
        let mut gate = ScanGate::new();
        let t0 = Instant::now();

        let decision = gate.offer(&event(EAN, t0));
        assert_eq!(
            decision,
            GateDecision::Accepted(AcceptedScan {
                symbology: "ean13".to_string(),
                payload: EAN.to_string(),
            })
        );
        assert!(gate.is_locked());
        assert_eq!(gate.last_accepted_at(), Some(t0));
        assert_eq!(gate.last_accepted_payload(), Some(EAN));
    }

    #[test]
    fn test_short_payloads_never_emit() {
        let mut gate = ScanGate::new();
        let t0 = Instant::now();

        let short = ["", "1", "12", "123", "1234", "12345", "ÄÖÜäö"];
        for (i, payload) in short.iter().cycle().take(500).enumerate() {
            let decision = gate.offer(&event(payload, t0 + ms(i as u64 * 10_000)));
            assert!(!decision.is_accepted(), "payload {:?} was accepted", payload);
        }
        assert_eq!(gate.state(), GateState::Idle);
        assert!(gate.last_accepted_at().is_none());
    }

    #[test]
    fn test_rejection_reasons() {
        let mut gate = ScanGate::new();
        let t0 = Instant::now();

        assert_eq!(
            gate.offer(&event("", t0)),
            GateDecision::Rejected(GateRejection::EmptyPayload)
        );
        assert_eq!(
            gate.offer(&event("12345", t0)),
            GateDecision::Rejected(GateRejection::PayloadTooShort { len: 5, min: 6 })
        );
        // Length is counted in characters, not bytes.
        assert!(gate.offer(&event("éééééé", t0)).is_accepted());
    }

    #[test]
    fn test_locked_rejects_everything_until_release() {
        let mut gate = ScanGate::new();
        let t0 = Instant::now();
        assert!(gate.offer(&event(EAN, t0)).is_accepted());

        for i in 1..=1_000u64 {
            let payload = format!("{:013}", i);
            let decision = gate.offer(&event(&payload, t0 + ms(i * 100)));
            assert_eq!(decision, GateDecision::Rejected(GateRejection::Locked));
        }

        assert!(gate.release());
        assert!(!gate.release());
        assert!(gate.offer(&event("5449000000996", t0 + ms(200_000))).is_accepted());
    }

    #[test]
    fn test_cooldown_survives_release() {
        let mut gate = ScanGate::new();
        let t0 = Instant::now();
        assert!(gate.offer(&event(EAN, t0)).is_accepted());
        gate.release();

        // A different code swept past 300ms later is still throttled.
        assert_eq!(
            gate.offer(&event("5449000000996", t0 + ms(300))),
            GateDecision::Rejected(GateRejection::CoolingDown { remaining: ms(900) })
        );
        assert_eq!(gate.state(), GateState::Idle);
        assert_eq!(gate.last_accepted_payload(), Some(EAN));

        assert!(gate.offer(&event("5449000000996", t0 + ms(1_200))).is_accepted());
    }

    #[test]
    fn test_pairs_within_cooldown_emit_at_most_first() {
        let t0 = Instant::now();
        for gap in [0u64, 1, 50, 600, 1_199] {
            let mut gate = ScanGate::new();
            assert!(gate.offer(&event(EAN, t0)).is_accepted());
            gate.release();
            assert!(
                !gate.offer(&event("4006381333931", t0 + ms(gap))).is_accepted(),
                "second event {}ms later was accepted",
                gap
            );
        }
    }

    #[test]
    fn test_out_of_order_timestamp_is_throttled() {
        let mut gate = ScanGate::new();
        let t0 = Instant::now() + ms(5_000);
        assert!(gate.offer(&event(EAN, t0)).is_accepted());
        gate.release();

        let earlier = t0 - ms(2_000);
        assert!(matches!(
            gate.offer(&event(EAN, earlier)),
            GateDecision::Rejected(GateRejection::CoolingDown { .. })
        ));
    }

    #[test]
    fn test_instances_do_not_share_throttle_state() {
        let t0 = Instant::now();
        let mut a = ScanGate::new();
        let mut b = ScanGate::new();

        assert!(a.offer(&event(EAN, t0)).is_accepted());
        assert!(b.offer(&event(EAN, t0 + ms(10))).is_accepted());
    }

    #[test]
    fn test_custom_policy() {
        let policy = GatePolicy::new(8, ms(0)).unwrap();
        let mut gate = ScanGate::with_policy(policy);
        let t0 = Instant::now();

        assert!(!gate.offer(&event("1234567", t0)).is_accepted());
        assert!(gate.offer(&event("12345678", t0)).is_accepted());
        gate.release();
        assert!(gate.offer(&event("12345678", t0)).is_accepted());
    }

    #[test]
    fn test_policy_validation() {
        assert!(GatePolicy::default().validate().is_ok());
        assert!(GatePolicy::new(0, ms(1_200)).is_err());
        assert!(GatePolicy::new(6, ms(MAX_SCAN_COOLDOWN_MS)).is_ok());
        // Twenty minutes is a defect, not a setting.
        assert!(GatePolicy::new(6, ms(1_200_000)).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(GateState::Locked.to_string(), "locked");
        assert_eq!(
            GateRejection::PayloadTooShort { len: 3, min: 6 }.to_string(),
            "payload too short (3 < 6)"
        );
    }
}
