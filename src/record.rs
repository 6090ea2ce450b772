//! Normalized records and the lazy streams that yield them.

use std::sync::Arc;

use arrow::{
    array::{ArrayRef, RecordBatch, StringArray},
    datatypes::{DataType, Field, Schema},
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Which projection of a record a loader produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoadMode {
    /// Features and class label only.
    Train,
    /// Features, class label, document id and extra fields.
    Detail,
}

/// How a stream reacts to a record that fails field resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordPolicy {
    /// Yield the error and end the stream.
    #[default]
    Strict,
    /// Log a warning, count the record as skipped and continue.
    Lenient,
}

/// One normalized record, independent of the storage format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Row number or document file name the record came from.
    pub source: String,
    /// Feature text. Multiple feature locators are joined with `\n`.
    pub features: String,
    /// Ground-truth class label.
    pub label: String,
    /// Document id (detail mode, when configured).
    pub doc_id: Option<String>,
    /// Extra passthrough values (detail mode), in configured order.
    pub extra: Vec<String>,
}

impl Record {
    /// Creates a train-mode record.
    pub fn train(
        source: impl Into<String>,
        features: impl Into<String>,
        label: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            features: features.into(),
            label: label.into(),
            doc_id: None,
            extra: Vec::new(),
        }
    }

    /// Adds detail-mode fields.
    #[must_use]
    pub fn with_detail(mut self, doc_id: Option<String>, extra: Vec<String>) -> Self {
        self.doc_id = doc_id;
        self.extra = extra;
        self
    }

    /// Values in the fixed order features, class, doc id, extras.
    ///
    /// Positionally matches
    /// [`FieldMapping::record_columns`](crate::FieldMapping::record_columns).
    pub fn values(&self) -> Vec<&str> {
        let mut values = vec![self.features.as_str(), self.label.as_str()];
        if let Some(doc_id) = &self.doc_id {
            values.push(doc_id);
        }
        values.extend(self.extra.iter().map(String::as_str));
        values
    }
}

/// A finite, forward-only stream of records.
///
/// The stream cannot be rewound; ask the loader for a new one to start
/// over. Per-record failures are handled according to the
/// [`RecordPolicy`]; any other error always ends the stream.
pub struct RecordStream {
    inner: Box<dyn Iterator<Item = Result<Record>> + Send>,
    policy: RecordPolicy,
    yielded: usize,
    skipped: usize,
    finished: bool,
}

impl RecordStream {
    /// Wraps a raw record iterator.
    pub fn new(
        inner: impl Iterator<Item = Result<Record>> + Send + 'static,
        policy: RecordPolicy,
    ) -> Self {
        Self {
            inner: Box::new(inner),
            policy,
            yielded: 0,
            skipped: 0,
            finished: false,
        }
    }

    /// The policy applied to per-record failures.
    pub fn policy(&self) -> RecordPolicy {
        self.policy
    }

    /// Records yielded so far.
    pub fn yielded(&self) -> usize {
        self.yielded
    }

    /// Records skipped so far under [`RecordPolicy::Lenient`].
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Drains the stream into an Arrow batch of UTF-8 columns.
    ///
    /// # Errors
    ///
    /// Returns the first error the stream yields, or an Arrow error.
    pub fn collect_batch(self, column_names: &[String]) -> Result<RecordBatch> {
        let records = self.collect::<Result<Vec<_>>>()?;
        records_to_batch(column_names, &records)
    }
}

impl Iterator for RecordStream {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            match self.inner.next() {
                None => {
                    self.finished = true;
                    tracing::debug!(
                        yielded = self.yielded,
                        skipped = self.skipped,
                        "record stream exhausted"
                    );
                    return None;
                }
                Some(Ok(record)) => {
                    self.yielded += 1;
                    return Some(Ok(record));
                }
                Some(Err(e)) if e.is_record_error() && self.policy == RecordPolicy::Lenient => {
                    self.skipped += 1;
                    tracing::warn!("skipping record: {e}");
                }
                Some(Err(e)) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl std::fmt::Debug for RecordStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStream")
            .field("policy", &self.policy)
            .field("yielded", &self.yielded)
            .field("skipped", &self.skipped)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// Builds an Arrow batch with one nullable UTF-8 column per name.
///
/// Column `i` holds `record.values()[i]`; a record with fewer values gets a
/// null there.
///
/// # Errors
///
/// Returns an error if `column_names` is empty or Arrow rejects the batch.
pub fn records_to_batch(column_names: &[String], records: &[Record]) -> Result<RecordBatch> {
    if column_names.is_empty() {
        return Err(Error::config("records", "no columns to materialize"));
    }

    let rows: Vec<Vec<&str>> = records.iter().map(Record::values).collect();

    let fields: Vec<Field> = column_names
        .iter()
        .map(|name| Field::new(name, DataType::Utf8, true))
        .collect();

    let columns: Vec<ArrayRef> = (0..column_names.len())
        .map(|i| {
            let values: Vec<Option<&str>> = rows.iter().map(|row| row.get(i).copied()).collect();
            Arc::new(StringArray::from(values)) as ArrayRef
        })
        .collect();

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}
