//! # NutriScan CLI
//!
//! Library half of the `nutriscan` binary, kept separate for testability.
//!
//! ## Startup Sequence
//! 1. Initialize tracing (logging to stderr)
//! 2. Parse arguments
//! 3. Load `scanner.toml` (skipped by `score`)
//! 4. Run the command on a Tokio runtime
//! 5. Print failures as text or `{ code, message }` JSON, exit non-zero

pub mod cli;
pub mod error;
pub mod render;
pub mod scan;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use tracing::{debug, info, Subscriber};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use nutriscan_core::validation::{infer_symbology, validate_barcode};
use nutriscan_core::{
    nutrient_keys, AcceptedScan, NutrientMap, NutritionSummary, PlaceholderModel, ScoringModel,
};
use nutriscan_lookup::{
    resolve_scan, OpenFoodFactsResolver, ProductResolver, ScanOutcome, ScanPresenter,
    ScanSessionBuilder, ScannerConfig,
};

use crate::cli::{Cli, Commands};
use crate::error::{CliError, CliResult};
use crate::render::TerminalPresenter;

/// Runs the CLI and returns the process exit code.
pub fn run() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();
    let json = cli.json;

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => return report_failure(CliError::internal(e.to_string()), json),
    };

    match runtime.block_on(dispatch(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_failure(e, json),
    }
}

/// Initializes the tracing subscriber.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=nutriscan=trace` - Include every rejected camera read
/// - Default: INFO, DEBUG for nutriscan crates
///
/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    log_subscriber(filter).init();
}

const DEFAULT_LOG_FILTER: &str = "info,nutriscan=debug";

fn log_subscriber(filter: EnvFilter) -> impl Subscriber + Send + Sync {
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish()
}

fn report_failure(err: CliError, json: bool) -> ExitCode {
    if json {
        match serde_json::to_string(&err) {
            Ok(line) => eprintln!("{}", line),
            Err(_) => eprintln!("{}", err),
        }
    } else {
        eprintln!("error: {}", err);
    }
    ExitCode::FAILURE
}

async fn dispatch(cli: Cli) -> CliResult<()> {
    match cli.command {
        Commands::Scan => {
            let config = ScannerConfig::load(cli.config)?;
            scan_stdin(&config, cli.json).await
        }
        Commands::Lookup { barcode } => {
            let config = ScannerConfig::load(cli.config)?;
            lookup(&config, &barcode, cli.json).await
        }
        Commands::Score {
            protein,
            sugar,
            fat,
            kcal,
        } => score(nutrients_from_flags(protein, sugar, fat, kcal), cli.json),
    }
}

// =============================================================================
// Commands
// =============================================================================

async fn scan_stdin(config: &ScannerConfig, json: bool) -> CliResult<()> {
    let session = ScanSessionBuilder::from_config(config)?
        .with_presenter(Arc::new(TerminalPresenter::new(json)))
        .build()?;

    info!(base_url = %config.lookup.base_url, "Listening for barcodes on stdin");
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let tally = scan::run(&session, stdin).await?;

    if json {
        println!("{}", serde_json::to_string(&Summary { tally })?);
    } else {
        println!(
            "{} scanned, {} found, {} not found, {} failed",
            tally.accepted, tally.found, tally.not_found, tally.failed
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct Summary {
    tally: scan::ScanTally,
}

async fn lookup(config: &ScannerConfig, barcode: &str, json: bool) -> CliResult<()> {
    let resolver = OpenFoodFactsResolver::new(config.resolver_config())?;
    lookup_with(&resolver, &TerminalPresenter::new(json), barcode).await?;
    Ok(())
}

/// One-shot lookup: validate, resolve, score, present.
///
/// A failed lookup is presented like in a scan session and then returned
/// as an error, so the process exits non-zero.
pub async fn lookup_with(
    resolver: &dyn ProductResolver,
    presenter: &dyn ScanPresenter,
    barcode: &str,
) -> CliResult<ScanOutcome> {
    let barcode = validate_barcode(barcode)?;
    let scan = AcceptedScan {
        symbology: infer_symbology(&barcode).to_string(),
        payload: barcode,
    };

    presenter.lookup_started(&scan);

    let outcome = resolve_scan(resolver, &PlaceholderModel, scan).await;
    match &outcome {
        ScanOutcome::Report(report) => presenter.show_report(report),
        ScanOutcome::NotFound { barcode } => presenter.show_not_found(barcode),
        ScanOutcome::Failed { reason } => {
            presenter.show_error(reason);
            return Err(CliError::lookup_failed(reason.clone()));
        }
        ScanOutcome::Discarded => {}
    }
    Ok(outcome)
}

fn score(nutrients: NutrientMap, json: bool) -> CliResult<()> {
    let model = PlaceholderModel;
    let result = model.score(&nutrients);
    let summary = NutritionSummary::from_nutrients(&nutrients);
    debug!(model = model.name(), value = result.value, "Scored nutrients");

    if json {
        #[derive(Serialize)]
        struct ScoreOutput<'a> {
            model: &'a str,
            score: nutriscan_core::HealthScore,
            summary: NutritionSummary,
        }
        let output = ScoreOutput {
            model: model.name(),
            score: result,
            summary,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", render::score(&result, &summary));
    }
    Ok(())
}

/// Builds a per-100g map from the `score` flags.
pub fn nutrients_from_flags(
    protein: Option<f64>,
    sugar: Option<f64>,
    fat: Option<f64>,
    kcal: Option<f64>,
) -> NutrientMap {
    [
        (nutrient_keys::PROTEINS_100G, protein),
        (nutrient_keys::SUGARS_100G, sugar),
        (nutrient_keys::FAT_100G, fat),
        (nutrient_keys::ENERGY_KCAL_100G, kcal),
    ]
    .into_iter()
    .filter_map(|(key, value)| value.map(|v| (key.to_string(), v)))
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use nutriscan_core::{LookupOutcome, ScanReport};
    use tracing::Level;

    use crate::error::ErrorCode;

    struct Offline {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ProductResolver for Offline {
        async fn resolve(&self, _barcode: &str) -> LookupOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            LookupOutcome::TransportError {
                reason: "Connection failed: refused".to_string(),
            }
        }
    }

    #[derive(Default)]
    struct Screens(Mutex<Vec<String>>);

    impl Screens {
        fn shown(&self) -> Vec<String> {
            self.0.lock().unwrap().clone()
        }
    }

    impl ScanPresenter for Screens {
        fn lookup_started(&self, scan: &AcceptedScan) {
            self.0.lock().unwrap().push(format!("started:{}", scan.payload));
        }

        fn show_report(&self, _report: &ScanReport) {
            self.0.lock().unwrap().push("report".to_string());
        }

        fn show_not_found(&self, barcode: &str) {
            self.0.lock().unwrap().push(format!("not_found:{}", barcode));
        }

        fn show_error(&self, reason: &str) {
            self.0.lock().unwrap().push(render::error(reason));
        }
    }

    #[test]
    fn test_log_filter_applies() {
        let subscriber = log_subscriber(EnvFilter::new(DEFAULT_LOG_FILTER));
        tracing::subscriber::with_default(subscriber, || {
            assert!(tracing::enabled!(target: "nutriscan_lookup::session", Level::DEBUG));
            assert!(!tracing::enabled!(target: "nutriscan_lookup::session", Level::TRACE));
            assert!(!tracing::enabled!(target: "hyper::proto", Level::TRACE));
            assert!(!tracing::enabled!(target: "reqwest::connect", Level::DEBUG));
        });

        let subscriber = log_subscriber(EnvFilter::new("warn"));
        tracing::subscriber::with_default(subscriber, || {
            assert!(!tracing::enabled!(target: "nutriscan_cli", Level::INFO));
            assert!(tracing::enabled!(target: "nutriscan_cli", Level::WARN));
        });
    }

    #[tokio::test]
    async fn test_failed_lookup_shows_error_screen() {
        let resolver = Offline {
            calls: AtomicUsize::new(0),
        };
        let screens = Screens::default();

        let err = lookup_with(&resolver, &screens, " 3017620422003 ")
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::LookupFailed);
        assert_eq!(err.message, "Connection failed: refused");

        let shown = screens.shown();
        assert_eq!(shown[0], "started:3017620422003");
        assert!(shown[1].starts_with("Couldn't load product\n"));
        assert!(shown[1].ends_with("Go back"));
    }

    #[tokio::test]
    async fn test_blank_barcode_is_invalid_input() {
        let resolver = Offline {
            calls: AtomicUsize::new(0),
        };
        let screens = Screens::default();

        let err = lookup_with(&resolver, &screens, "   ").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidInput);
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
        assert!(screens.shown().is_empty());
    }

    #[test]
    fn test_nutrients_from_flags() {
        let map = nutrients_from_flags(Some(10.0), Some(5.0), Some(8.0), None);
        assert_eq!(map.len(), 3);
        assert_eq!(PlaceholderModel.score(&map).value, 59);

        let map = nutrients_from_flags(None, Some(30.0), Some(25.0), Some(400.0));
        assert_eq!(map.get("energy-kcal_100g"), Some(&400.0));
        assert_eq!(PlaceholderModel.score(&map).value, 14);

        assert!(nutrients_from_flags(None, None, None, None).is_empty());
    }
}
