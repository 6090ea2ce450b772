//! Persisted mapping between class labels and dense integer ids.
//!
//! The mapping is built once from training data, persisted once, and then
//! loaded read-only by eval, test and inference passes. A label that was not
//! seen at build time is an error rather than a new id.
//!
//! # Example JSON
//!
//! ```json
//! {"0": "no", "1": "yes"}
//! ```

use std::{
    collections::{BTreeMap, HashMap},
    fs::OpenOptions,
    io::Write,
    path::Path,
};

use crate::{
    error::{Error, Result},
    record::Record,
};

/// Bidirectional label ↔ id table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelMapper {
    id_to_label: Vec<String>,
    label_to_id: HashMap<String, usize>,
}

impl LabelMapper {
    /// Assigns ids in first-occurrence order; duplicates share one id.
    pub fn build<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut mapper = Self::default();
        for label in labels {
            let label = label.as_ref();
            if !mapper.label_to_id.contains_key(label) {
                mapper.label_to_id.insert(label.to_string(), mapper.id_to_label.len());
                mapper.id_to_label.push(label.to_string());
            }
        }
        mapper
    }

    /// Builds the mapping from the labels of training records.
    ///
    /// # Errors
    ///
    /// Returns the first error yielded by `records`.
    pub fn from_records<I>(records: I) -> Result<Self>
    where
        I: IntoIterator<Item = Result<Record>>,
    {
        let labels = records
            .into_iter()
            .map(|r| r.map(|record| record.label))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::build(labels))
    }

    /// Writes the mapping as a flat JSON object of id → label.
    ///
    /// The file must not exist yet: a persisted mapping is never rewritten.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file exists or cannot be written.
    pub fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let table: BTreeMap<usize, &str> = self
            .id_to_label
            .iter()
            .enumerate()
            .map(|(id, label)| (id, label.as_str()))
            .collect();
        let json = serde_json::to_string_pretty(&table)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(e, parent))?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| Error::io(e, path))?;
        file.write_all(json.as_bytes())
            .map_err(|e| Error::io(e, path))?;

        tracing::info!(path = %path.display(), labels = self.len(), "persisted label mapping");
        Ok(())
    }

    /// Loads a persisted mapping.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file is absent, or
    /// [`Error::MalformedMapping`] if it is not a flat object whose keys are
    /// the ids `0..n` and whose values are distinct labels.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| Error::io(e, path))?;

        let raw: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&content)
            .map_err(|e| Error::malformed_mapping(path, e.to_string()))?;

        let mut by_id = BTreeMap::new();
        for (key, value) in raw {
            let id = key
                .parse::<usize>()
                .ok()
                .filter(|id| id.to_string() == key)
                .ok_or_else(|| {
                    let message = format!("id '{key}' is not a canonical integer");
                    Error::malformed_mapping(path, message)
                })?;
            let label = value.as_str().ok_or_else(|| {
                Error::malformed_mapping(path, format!("label for id {id} is not a string"))
            })?;
            if by_id.insert(id, label.to_string()).is_some() {
                return Err(Error::malformed_mapping(
                    path,
                    format!("id {id} appears more than once"),
                ));
            }
        }

        let mut mapper = Self::default();
        for (expected, (id, label)) in by_id.into_iter().enumerate() {
            if id != expected {
                return Err(Error::malformed_mapping(
                    path,
                    format!("ids are not dense: expected {expected}, found {id}"),
                ));
            }
            if mapper.label_to_id.insert(label.clone(), id).is_some() {
                return Err(Error::malformed_mapping(
                    path,
                    format!("label '{label}' appears more than once"),
                ));
            }
            mapper.id_to_label.push(label);
        }

        tracing::debug!(path = %path.display(), labels = mapper.len(), "loaded label mapping");
        Ok(mapper)
    }

    /// Id of `label`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLabel`] if the label was not seen at build time.
    pub fn encode(&self, label: &str) -> Result<usize> {
        self.label_to_id
            .get(label)
            .copied()
            .ok_or_else(|| Error::unknown_label(label))
    }

    /// Label of `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownLabel`] if the id is out of range.
    pub fn decode(&self, id: usize) -> Result<&str> {
        self.id_to_label
            .get(id)
            .map(String::as_str)
            .ok_or_else(|| Error::unknown_label(id.to_string()))
    }

    /// Labels ordered by id.
    pub fn labels(&self) -> &[String] {
        &self.id_to_label
    }

    /// Number of distinct labels.
    pub fn len(&self) -> usize {
        self.id_to_label.len()
    }

    /// Returns true if no labels are mapped.
    pub fn is_empty(&self) -> bool {
        self.id_to_label.is_empty()
    }
}
