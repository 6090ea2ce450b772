//! agency-dataset CLI - inspect, split and label data sets
//!
//! Command-line interface for agency-dataset operations.

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // RUST_LOG overrides the default; logs go to stderr so stdout stays
    // clean for command output.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("agency_dataset=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    agency_dataset::cli::run()
}
