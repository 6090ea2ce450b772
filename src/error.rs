//! Error types for agency-dataset.

use std::path::PathBuf;

/// Result type alias for agency-dataset operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading, splitting or labelling datasets.
///
/// Configuration and format errors are always fatal for the caller. Only
/// [`Error::Record`] is subject to a [`RecordPolicy`](crate::RecordPolicy).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error during file operations.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        /// The path where the error occurred, if known.
        path: Option<PathBuf>,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A field mapping or config section is missing or invalid.
    #[error("Configuration error in '{section}': {message}")]
    Config {
        /// The config section the problem was found in.
        section: String,
        /// Description of the problem, naming the offending key.
        message: String,
    },

    /// The input path is a file with an extension no loader understands.
    #[error("Unsupported file type '{extension}' for {path:?}")]
    UnsupportedFormat {
        /// The offending extension (empty when the file has none).
        extension: String,
        /// The input path.
        path: PathBuf,
    },

    /// The input path does not exist.
    #[error("Not found: {path:?}")]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// A single record or document could not be resolved.
    #[error("Record {source_id} failed: {reason}")]
    Record {
        /// Row number or document file name of the failing record.
        source_id: String,
        /// Why the record failed.
        reason: String,
    },

    /// A label (or id) absent from a loaded label mapping.
    #[error("Unknown label '{label}': not present in the label mapping")]
    UnknownLabel {
        /// The unknown label, or the unknown id rendered as text.
        label: String,
    },

    /// Invalid split request.
    #[error("Invalid split: {message}")]
    SplitValidation {
        /// Description of the problem.
        message: String,
    },

    /// A persisted label mapping could not be interpreted.
    #[error("Malformed label mapping at {path:?}: {message}")]
    MalformedMapping {
        /// Path of the mapping file.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },

    /// CSV error raised while opening or scanning a delimited file.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error while reading a config or mapping.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Arrow error while materializing records.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl Error {
    /// Create an I/O error with a path context.
    pub fn io(source: std::io::Error, path: impl Into<PathBuf>) -> Self {
        Self::Io {
            path: Some(path.into()),
            source,
        }
    }

    /// Create an I/O error without path context.
    pub fn io_no_path(source: std::io::Error) -> Self {
        Self::Io { path: None, source }
    }

    /// Create a configuration error for the given section.
    pub fn config(section: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            section: section.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error for a required key that is absent.
    pub fn missing_key(section: impl Into<String>, key: &str) -> Self {
        Self::config(section, format!("required key '{key}' is not set"))
    }

    /// Create an unsupported format error.
    pub fn unsupported_format(extension: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::UnsupportedFormat {
            extension: extension.into(),
            path: path.into(),
        }
    }

    /// Create a not found error.
    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    /// Create a per-record error.
    pub fn record(source_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Record {
            source_id: source_id.into(),
            reason: reason.into(),
        }
    }

    /// Create an unknown label error.
    pub fn unknown_label(label: impl Into<String>) -> Self {
        Self::UnknownLabel {
            label: label.into(),
        }
    }

    /// Create a split validation error.
    pub fn split(message: impl Into<String>) -> Self {
        Self::SplitValidation {
            message: message.into(),
        }
    }

    /// Create a malformed mapping error.
    pub fn malformed_mapping(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::MalformedMapping {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Returns true for errors the record policy may skip.
    pub fn is_record_error(&self) -> bool {
        matches!(self, Self::Record { .. })
    }
}
