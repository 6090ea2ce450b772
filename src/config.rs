//! Dataset configuration.
//!
//! The configuration is a JSON document shared with the classifier
//! backends. Only the keys this crate understands are read; everything else
//! (model type, learning rate, ...) is ignored.
//!
//! # Example JSON
//!
//! ```json
//! {
//!   "csv_fields": {
//!     "features": "full_text",
//!     "class": "advertiser_type",
//!     "doc_id": "posting_id",
//!     "extra": ["organization_name", "source_type"]
//!   },
//!   "trxml_fields": {
//!     "features": "sec_vacancy.0.sec_vacancy",
//!     "class": "derived_vac_intermediary.0.derived_vac_intermediary"
//!   },
//!   "record_policy": "lenient"
//! }
//! ```

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    error::{Error, Result},
    format::StorageFormat,
    record::RecordPolicy,
};

/// Per-format field sections plus loader settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Field mapping section for delimited files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub csv_fields: Option<Value>,
    /// Field mapping section for TRXML bundles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trxml_fields: Option<Value>,
    /// What to do with records that fail field resolution.
    #[serde(default)]
    pub record_policy: RecordPolicy,
}

impl DataConfig {
    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| Error::io(e, path))?;
        let config = Self::from_json_str(&content)?;
        tracing::debug!(path = %path.display(), "loaded data config");
        Ok(config)
    }

    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not valid JSON of the expected shape.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns the field section for `format`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the section is absent.
    pub fn section(&self, format: StorageFormat) -> Result<&Value> {
        let section = match format {
            StorageFormat::Delimited(_) => self.csv_fields.as_ref(),
            StorageFormat::StructuredBundle => self.trxml_fields.as_ref(),
        };
        section.ok_or_else(|| {
            Error::config(
                format.section_name(),
                "fields section not set, cannot load data",
            )
        })
    }

    /// Returns a copy with a different record policy.
    #[must_use]
    pub fn with_record_policy(mut self, policy: RecordPolicy) -> Self {
        self.record_policy = policy;
        self
    }
}
