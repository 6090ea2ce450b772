//! agency-dataset - Data handling for the agency vacancy classifier
//!
//! Loads labelled job-posting data from delimited files (CSV/TSV) or from
//! bundles of per-document TRXML files, and prepares it for training: a
//! deterministic train/eval split, a persisted label ↔ id table, and the
//! column layout of the prediction audit file.
//!
//! # Design Principles
//!
//! 1. **Config-driven** - Which columns or XML locators hold the text and
//!    the class comes from a JSON config, never from code
//! 2. **Streaming** - Records are produced lazily; splitting copies raw
//!    rows without holding them in memory
//! 3. **Reproducible** - The same seed always yields the same split
//!
//! # Quick Start
//!
//! ```no_run
//! use agency_dataset::{load_data_set, DataConfig, LabelMapper, LoadMode};
//!
//! let config = DataConfig::from_path("config.json").unwrap();
//! let records = load_data_set(&config, "models/train.csv", LoadMode::Train).unwrap();
//!
//! let mapper = LabelMapper::from_records(records).unwrap();
//! mapper.persist("models/label_mapper.json").unwrap();
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
// Allow common test patterns
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::redundant_clone,
        clippy::needless_collect,
        clippy::too_many_lines,
        clippy::float_cmp
    )
)]
// Allow some pedantic lints for cleaner code
#![allow(clippy::doc_markdown)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]
#![allow(clippy::map_unwrap_or)]

pub mod bundle;
/// CLI module for command-line interface
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod fields;
pub mod format;
pub mod label;
pub mod loader;
pub mod record;
pub mod split;

// Re-exports for convenience
pub use arrow::array::RecordBatch;
pub use bundle::{BundleDocument, Locator};
pub use config::DataConfig;
pub use error::{Error, Result};
pub use fields::FieldMapping;
pub use format::{Delimiter, StorageFormat};
pub use label::LabelMapper;
pub use loader::{analysis_field_names, load_data_set, loader_for, RecordLoader};
pub use record::{records_to_batch, LoadMode, Record, RecordPolicy, RecordStream};
pub use split::{split_data_set, DatasetSplitter, SplitPaths};
