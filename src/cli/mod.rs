//! agency-dataset CLI - inspect, split and label data sets
//!
//! Command-line interface for agency-dataset operations.

use std::{path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};

use crate::split::DatasetSplitter;

mod basic;

/// agency-dataset - Data handling for the agency vacancy classifier
#[derive(Parser)]
#[command(name = "agency-dataset")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report the storage format of a path
    Detect {
        /// Path to a CSV/TSV file or a TRXML directory
        path: PathBuf,
    },
    /// Show the field mapping that applies to a path
    Fields {
        /// JSON config file
        #[arg(short, long)]
        config: PathBuf,
        /// Path to a CSV/TSV file or a TRXML directory
        path: PathBuf,
    },
    /// Display the first N records
    Head {
        /// JSON config file
        #[arg(short, long)]
        config: PathBuf,
        /// Path to a CSV/TSV file or a TRXML directory
        path: PathBuf,
        /// Number of records to display
        #[arg(short = 'n', long, default_value = "10")]
        rows: usize,
        /// Include doc id and passthrough fields
        #[arg(long)]
        detail: bool,
        /// Skip records that fail field resolution
        #[arg(long)]
        lenient: bool,
    },
    /// Display record count and class distribution
    Info {
        /// JSON config file
        #[arg(short, long)]
        config: PathBuf,
        /// Path to a CSV/TSV file or a TRXML directory
        path: PathBuf,
    },
    /// Split a data set into train and eval artifacts
    Split {
        /// Path to a CSV/TSV file or a TRXML directory
        path: PathBuf,
        /// Fraction of records assigned to train
        #[arg(short, long, default_value_t = DatasetSplitter::DEFAULT_RATIO)]
        ratio: f64,
        /// Destination directory
        #[arg(short, long, default_value = "models")]
        output: PathBuf,
        /// Shuffle seed
        #[arg(short, long, default_value_t = DatasetSplitter::DEFAULT_SEED)]
        seed: u64,
    },
    /// Build and persist the label mapping from training data
    Labels {
        /// JSON config file
        #[arg(short, long)]
        config: PathBuf,
        /// Path to the training data
        path: PathBuf,
        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Run the agency-dataset CLI.
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Detect { path } => basic::cmd_detect(&path),
        Commands::Fields { config, path } => basic::cmd_fields(&config, &path),
        Commands::Head {
            config,
            path,
            rows,
            detail,
            lenient,
        } => basic::cmd_head(&config, &path, rows, detail, lenient),
        Commands::Info { config, path } => basic::cmd_info(&config, &path),
        Commands::Split {
            path,
            ratio,
            output,
            seed,
        } => basic::cmd_split(&path, ratio, &output, seed),
        Commands::Labels {
            config,
            path,
            output,
        } => basic::cmd_labels(&config, &path, &output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
