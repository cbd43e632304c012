//! # NutriScan CLI Entry Point
//!
//! ```text
//! $ nutriscan lookup 3017620422003
//! $ printf 'ean13 3017620422003\n' | nutriscan scan --json
//! $ nutriscan score --protein 10 --sugar 5 --fat 8
//! ```
//!
//! The actual setup is in lib.rs for better testability.

use std::process::ExitCode;

fn main() -> ExitCode {
    nutriscan_cli::run()
}
