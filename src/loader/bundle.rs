//! Loader for directories of per-document TRXML files.

use std::{
    fs,
    path::{Path, PathBuf},
};

use walkdir::WalkDir;

use super::RecordLoader;
use crate::{
    bundle::{BundleDocument, Locator},
    error::{Error, Result},
    fields::FieldMapping,
    format::StorageFormat,
    record::{LoadMode, Record, RecordPolicy, RecordStream},
};

/// Parsed locators of a TRXML field mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleLocators {
    features: Vec<Locator>,
    class: Locator,
    doc_id: Option<Locator>,
    extra: Vec<Locator>,
}

impl BundleLocators {
    /// Parses every locator of `mapping`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for the first locator that is not of the
    /// form `section.index.field`.
    pub fn from_mapping(mapping: &FieldMapping) -> Result<Self> {
        let parse = |raw: &str| -> Result<Locator> {
            raw.parse()
                .map_err(|msg: String| Error::config(mapping.section(), msg))
        };

        Ok(Self {
            features: mapping
                .features()
                .iter()
                .map(|f| parse(f))
                .collect::<Result<_>>()?,
            class: parse(mapping.class_field())?,
            doc_id: mapping.doc_id_field().map(parse).transpose()?,
            extra: mapping
                .extra_fields()
                .iter()
                .map(|f| parse(f))
                .collect::<Result<_>>()?,
        })
    }

    /// Projects one document into a record.
    ///
    /// Missing features or class are a per-record error; a missing doc id
    /// or extra field resolves to an empty value.
    fn record(&self, source: &str, doc: &BundleDocument, mode: LoadMode) -> Result<Record> {
        let required = |locator: &Locator| -> Result<String> {
            doc.resolve(locator).map(str::to_string).ok_or_else(|| {
                Error::record(source, format!("required field '{locator}' not found"))
            })
        };
        let optional = |locator: &Locator| doc.resolve(locator).unwrap_or_default().to_string();

        let features = self
            .features
            .iter()
            .map(required)
            .collect::<Result<Vec<_>>>()?
            .join("\n");
        let label = required(&self.class)?;

        let record = Record::train(source, features, label);
        Ok(match mode {
            LoadMode::Train => record,
            LoadMode::Detail => record.with_detail(
                self.doc_id.as_ref().map(optional),
                self.extra.iter().map(optional).collect(),
            ),
        })
    }
}

/// Reads one record per document from a TRXML directory.
#[derive(Debug, Clone)]
pub struct BundleLoader {
    mapping: FieldMapping,
    locators: BundleLocators,
    policy: RecordPolicy,
}

impl BundleLoader {
    /// Creates a loader, parsing the mapping's locators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a locator is malformed.
    pub fn new(mapping: FieldMapping, policy: RecordPolicy) -> Result<Self> {
        let locators = BundleLocators::from_mapping(&mapping)?;
        Ok(Self {
            mapping,
            locators,
            policy,
        })
    }
}

impl RecordLoader for BundleLoader {
    fn format(&self) -> StorageFormat {
        StorageFormat::StructuredBundle
    }

    fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    fn load(&self, path: &Path, mode: LoadMode) -> Result<RecordStream> {
        let documents = list_documents(path)?;
        tracing::debug!(
            path = %path.display(),
            documents = documents.len(),
            ?mode,
            "opened TRXML bundle"
        );

        let locators = self.locators.clone();
        let records = documents
            .into_iter()
            .map(move |doc_path| load_document(&locators, &doc_path, mode));

        Ok(RecordStream::new(records, self.policy))
    }
}

fn load_document(locators: &BundleLocators, path: &Path, mode: LoadMode) -> Result<Record> {
    let source = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let bytes = fs::read(path).map_err(|e| Error::io(e, path))?;
    let xml = String::from_utf8(bytes)
        .map_err(|e| Error::record(source.as_str(), format!("document is not UTF-8: {e}")))?;
    let doc = BundleDocument::parse(&source, &xml)?;

    locators.record(&source, &doc, mode)
}

/// Lists the documents of a bundle in ascending file-name order.
///
/// Only regular files directly inside `dir` count; hidden files (leading
/// `.`) are ignored.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be read.
pub fn list_documents(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut documents = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(dir).to_path_buf();
            Error::io(e.into(), path)
        })?;

        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if entry.file_type().is_file() && !hidden {
            documents.push(entry.into_path());
        }
    }

    Ok(documents)
}
