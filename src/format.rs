//! Storage format detection.
//!
//! [`StorageFormat::detect`] is the single gate that decides which
//! [`RecordLoader`](crate::loader::RecordLoader) handles an input path.

use std::{fmt, path::Path};

use crate::error::{Error, Result};

/// Field separator of a delimited file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Delimiter {
    /// Comma-separated (`.csv`).
    Comma,
    /// Tab-separated (`.tsv`).
    Tab,
}

impl Delimiter {
    /// The separator byte handed to the CSV reader.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Comma => b',',
            Self::Tab => b'\t',
        }
    }

    /// The canonical file extension, without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Comma => "csv",
            Self::Tab => "tsv",
        }
    }

    /// Maps a file extension to a delimiter, ignoring ASCII case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        if ext.eq_ignore_ascii_case("csv") {
            Some(Self::Comma)
        } else if ext.eq_ignore_ascii_case("tsv") {
            Some(Self::Tab)
        } else {
            None
        }
    }
}

/// The on-disk layout of a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageFormat {
    /// A single delimited file with a header row.
    Delimited(Delimiter),
    /// A directory of per-document TRXML files.
    StructuredBundle,
}

impl StorageFormat {
    /// Classifies `path`.
    ///
    /// - a directory is a [`StorageFormat::StructuredBundle`]
    /// - a `.csv` / `.tsv` file is [`StorageFormat::Delimited`]
    ///
    /// # Errors
    ///
    /// [`Error::UnsupportedFormat`] for any other file and
    /// [`Error::NotFound`] when the path does not exist.
    pub fn detect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if path.is_dir() {
            return Ok(Self::StructuredBundle);
        }

        if path.is_file() {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_string())
                .unwrap_or_default();
            return Delimiter::from_extension(&ext)
                .map(Self::Delimited)
                .ok_or_else(|| Error::unsupported_format(ext, path));
        }

        Err(Error::not_found(path))
    }

    /// Name of the config section holding this format's field mapping.
    pub fn section_name(self) -> &'static str {
        match self {
            Self::Delimited(_) => "csv_fields",
            Self::StructuredBundle => "trxml_fields",
        }
    }

    /// Returns true for [`StorageFormat::StructuredBundle`].
    pub fn is_bundle(self) -> bool {
        matches!(self, Self::StructuredBundle)
    }
}

impl fmt::Display for StorageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delimited(Delimiter::Comma) => write!(f, "CSV"),
            Self::Delimited(Delimiter::Tab) => write!(f, "TSV"),
            Self::StructuredBundle => write!(f, "TRXML bundle"),
        }
    }
}
