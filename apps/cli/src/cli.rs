//! Command-line arguments.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "nutriscan", version, about = "Scan a barcode, get a health score")]
pub struct Cli {
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    pub json: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Config file (defaults to the platform config dir's scanner.toml)"
    )]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read detections from stdin, one per line: `[symbology] <payload>`
    Scan,

    /// Look up a single barcode
    Lookup { barcode: String },

    /// Score per-100g nutrient values without a lookup
    Score {
        #[arg(long, value_name = "GRAMS")]
        protein: Option<f64>,
        #[arg(long, value_name = "GRAMS")]
        sugar: Option<f64>,
        #[arg(long, value_name = "GRAMS")]
        fat: Option<f64>,
        #[arg(long, value_name = "KCAL")]
        kcal: Option<f64>,
    },
}
