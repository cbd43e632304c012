//! # Stdin Capture Surface
//!
//! Turns input lines into detection events for a [`ScanSession`]. A wedge
//! scanner, a pipe or a person typing all look the same here:
//!
//! ```text
//! ean13 3017620422003     ← symbology + payload
//! 96385074                ← payload only, symbology inferred
//! ```
//!
//! Lines are read as they arrive, stamped on arrival and offered to the
//! session straight away, so a barcode held under the scanner keeps being
//! dropped while a lookup is in flight instead of queueing up behind it.
//! A separate driver task waits for each lookup and then releases the gate,
//! standing in for the "Scan another" / "Go back" action.
//!
//! ```text
//! stdin ──► reader ──on_detection──► ScanSession
//!              │                         │
//!              └── InFlightLookup ──► driver ──outcome──► tally, release()
//! ```

use std::time::Instant;

use nutriscan_core::validation::infer_symbology;
use nutriscan_core::RawDetectionEvent;
use nutriscan_lookup::{InFlightLookup, LookupError, ScanOutcome, ScanSession};
use serde::Serialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::CliResult;

/// Per-run tallies printed when input ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanTally {
    pub lines: usize,
    pub accepted: usize,
    pub found: usize,
    pub not_found: usize,
    pub failed: usize,
}

/// Parses one input line. Blank lines and `#` comments yield nothing.
pub fn parse_line(line: &str, at: Instant) -> Option<RawDetectionEvent> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    match line.split_once(char::is_whitespace) {
        Some((symbology, payload)) => {
            Some(RawDetectionEvent::new(symbology, payload.trim(), at))
        }
        None => Some(RawDetectionEvent::new(infer_symbology(line), line, at)),
    }
}

/// Feeds `input` to `session` until end of input, waits for the last
/// lookup, then tears the session down.
pub async fn run<R>(session: &ScanSession, input: R) -> CliResult<ScanTally>
where
    R: AsyncBufRead + Unpin,
{
    let (lookups, pending) = mpsc::unbounded_channel();
    let driver = tokio::spawn(drive(session.clone(), pending));

    let mut tally = ScanTally::default();
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        tally.lines += 1;

        let Some(event) = parse_line(&line, Instant::now()) else {
            continue;
        };

        if let Some(lookup) = session.on_detection(&event) {
            tally.accepted += 1;
            // Fails only if the driver already stopped on an error, reported below
            let _ = lookups.send(lookup);
        }
    }

    drop(lookups);
    let results = driver.await.map_err(LookupError::from)??;
    tally.found = results.found;
    tally.not_found = results.not_found;
    tally.failed = results.failed;

    session.teardown();
    info!(?tally, "Input closed");
    Ok(tally)
}

/// Waits for each accepted lookup in turn and re-arms the gate after it.
async fn drive(
    session: ScanSession,
    mut pending: mpsc::UnboundedReceiver<InFlightLookup>,
) -> CliResult<ScanTally> {
    let mut tally = ScanTally::default();

    while let Some(lookup) = pending.recv().await {
        match lookup.outcome().await? {
            ScanOutcome::Report(_) => tally.found += 1,
            ScanOutcome::NotFound { .. } => tally.not_found += 1,
            ScanOutcome::Failed { .. } => tally.failed += 1,
            ScanOutcome::Discarded => debug!("Lookup discarded"),
        }

        session.release();
    }

    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use std::time::Duration;

    use async_trait::async_trait;
    use nutriscan_core::{GatePolicy, LookupOutcome, ProductRecord};
    use nutriscan_lookup::ProductResolver;
    use tokio::io::{AsyncWriteExt, BufReader};

    struct KnownProducts;

    #[async_trait]
    impl ProductResolver for KnownProducts {
        async fn resolve(&self, barcode: &str) -> LookupOutcome {
            match barcode {
                "3017620422003" => LookupOutcome::Found {
                    product: ProductRecord::bare(barcode),
                },
                "offline-1" => LookupOutcome::TransportError {
                    reason: "Connection failed".to_string(),
                },
                _ => LookupOutcome::NotFound {
                    barcode: barcode.to_string(),
                },
            }
        }
    }

    /// Takes longer than the cooldown of [`short_cooldown_session`].
    struct SlowResolver;

    #[async_trait]
    impl ProductResolver for SlowResolver {
        async fn resolve(&self, barcode: &str) -> LookupOutcome {
            tokio::time::sleep(Duration::from_millis(200)).await;
            LookupOutcome::Found {
                product: ProductRecord::bare(barcode),
            }
        }
    }

    fn short_cooldown_session() -> ScanSession {
        ScanSession::builder()
            .with_resolver(Arc::new(SlowResolver))
            .with_policy(GatePolicy {
                min_payload_len: 6,
                cooldown: Duration::from_millis(50),
            })
            .build()
            .unwrap()
    }

    async fn wait_until(session: &ScanSession, listening: bool) {
        while session.is_listening() != listening {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    #[test]
    fn test_parse_line() {
        let at = Instant::now();

        let event = parse_line("ean13 3017620422003", at).unwrap();
        assert_eq!(event.symbology, "ean13");
        assert_eq!(event.payload, "3017620422003");

        let event = parse_line("  96385074 \n", at).unwrap();
        assert_eq!(event.symbology, "ean8");
        assert_eq!(event.payload, "96385074");

        let event = parse_line("qr   https://example.org/p/1", at).unwrap();
        assert_eq!(event.symbology, "qr");
        assert_eq!(event.payload, "https://example.org/p/1");

        assert!(parse_line("", at).is_none());
        assert!(parse_line("   ", at).is_none());
        assert!(parse_line("# comment", at).is_none());
    }

    #[tokio::test]
    async fn test_single_scan_then_cooldown() {
        let session = ScanSession::new(Arc::new(KnownProducts));

        // The second read arrives well inside the cooldown window
        let input: &[u8] = b"ean13 3017620422003\n3017620422003\n123\n\n";
        let tally = run(&session, input).await.unwrap();

        assert_eq!(
            tally,
            ScanTally {
                lines: 4,
                accepted: 1,
                found: 1,
                not_found: 0,
                failed: 0,
            }
        );
        assert!(!session.is_listening());
    }

    #[tokio::test]
    async fn test_failed_lookup_counts() {
        let session = ScanSession::new(Arc::new(KnownProducts));
        let tally = run(&session, &b"qr offline-1\n"[..]).await.unwrap();
        assert_eq!(tally.accepted, 1);
        assert_eq!(tally.failed, 1);
    }

    #[tokio::test]
    async fn test_reads_during_slow_lookup_are_dropped() {
        let session = short_cooldown_session();

        // One presentation: the same code read three times in a row
        let input: &[u8] = b"ean13 3017620422003\nean13 3017620422003\nean13 3017620422003\n";
        let tally = run(&session, input).await.unwrap();

        assert_eq!(tally.lines, 3);
        assert_eq!(tally.accepted, 1);
        assert_eq!(tally.found, 1);
    }

    #[tokio::test]
    async fn test_scan_after_release_is_accepted() {
        let session = short_cooldown_session();
        let (mut writer, reader) = tokio::io::duplex(256);

        let feed = async {
            writer.write_all(b"ean13 3017620422003\n").await.unwrap();
            wait_until(&session, false).await;
            wait_until(&session, true).await;
            tokio::time::sleep(Duration::from_millis(60)).await;

            writer.write_all(b"96385074\n").await.unwrap();
            wait_until(&session, false).await;
            drop(writer);
        };

        let (tally, ()) = tokio::join!(run(&session, BufReader::new(reader)), feed);
        let tally = tally.unwrap();

        assert_eq!(tally.accepted, 2);
        assert_eq!(tally.found, 2);
        assert!(!session.is_listening());
    }
}
