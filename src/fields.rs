//! Field mappings: which physical columns or locators hold which logical
//! fields.
//!
//! A mapping is built from one config section (`csv_fields` or
//! `trxml_fields`) and validated eagerly, before any file is opened.

use serde_json::Value;

use crate::{
    config::DataConfig,
    error::{Error, Result},
    format::StorageFormat,
    loader::bundle::BundleLocators,
    record::LoadMode,
};

/// Validated binding of logical roles to physical locators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMapping {
    section: String,
    features: Vec<String>,
    class_field: String,
    doc_id_field: Option<String>,
    extra_fields: Vec<String>,
}

impl FieldMapping {
    /// Creates a mapping from explicit locators.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `features` is empty or a locator is blank.
    pub fn new(
        section: impl Into<String>,
        features: Vec<String>,
        class_field: impl Into<String>,
    ) -> Result<Self> {
        let section = section.into();
        let class_field = class_field.into();

        if features.is_empty() {
            return Err(Error::missing_key(section, "features"));
        }
        if features.iter().any(|f| f.trim().is_empty()) {
            return Err(Error::config(section, "'features' contains an empty locator"));
        }
        if class_field.trim().is_empty() {
            return Err(Error::missing_key(section, "class"));
        }

        Ok(Self {
            section,
            features,
            class_field,
            doc_id_field: None,
            extra_fields: Vec::new(),
        })
    }

    /// Sets the document id locator.
    #[must_use]
    pub fn with_doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.doc_id_field = Some(doc_id.into());
        self
    }

    /// Sets the extra passthrough locators.
    #[must_use]
    pub fn with_extra(mut self, extra: Vec<String>) -> Self {
        self.extra_fields = extra;
        self
    }

    /// Parses and validates one config section.
    ///
    /// Recognized keys: `features` (string, list of strings, or object whose
    /// keys are the locators), `class`, `doc_id` and `extra`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the section and the missing or
    /// malformed key.
    pub fn from_section(section: &str, value: &Value) -> Result<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| Error::config(section, "section must be a JSON object"))?;

        let features = match obj.get("features") {
            None | Some(Value::Null) => return Err(Error::missing_key(section, "features")),
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(items)) => string_list(section, "features", items)?,
            Some(Value::Object(map)) => map.keys().cloned().collect(),
            Some(_) => {
                return Err(Error::config(
                    section,
                    "'features' must be a string, a list or an object",
                ))
            }
        };

        let class_field = match obj.get("class") {
            None | Some(Value::Null) => return Err(Error::missing_key(section, "class")),
            Some(Value::String(s)) => s.clone(),
            Some(_) => return Err(Error::config(section, "'class' must be a string")),
        };

        let mut mapping = Self::new(section, features, class_field)?;

        match obj.get("doc_id") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => mapping = mapping.with_doc_id(s.clone()),
            Some(_) => return Err(Error::config(section, "'doc_id' must be a string")),
        }

        match obj.get("extra") {
            None | Some(Value::Null) => {}
            Some(Value::String(s)) => mapping = mapping.with_extra(vec![s.clone()]),
            Some(Value::Array(items)) => {
                mapping = mapping.with_extra(string_list(section, "extra", items)?);
            }
            Some(_) => return Err(Error::config(section, "'extra' must be a list of strings")),
        }

        Ok(mapping)
    }

    /// Looks up and validates the mapping for `format`.
    ///
    /// For TRXML bundles every locator must also parse as
    /// `section.index.field`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the section is absent or invalid.
    pub fn for_format(config: &DataConfig, format: StorageFormat) -> Result<Self> {
        let mapping = Self::from_section(format.section_name(), config.section(format)?)?;
        if format.is_bundle() {
            BundleLocators::from_mapping(&mapping)?;
        }
        Ok(mapping)
    }

    /// Name of the config section this mapping came from.
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Feature locators, in configured order.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Class label locator.
    pub fn class_field(&self) -> &str {
        &self.class_field
    }

    /// Document id locator, if configured.
    pub fn doc_id_field(&self) -> Option<&str> {
        self.doc_id_field.as_deref()
    }

    /// Extra passthrough locators, in configured order.
    pub fn extra_fields(&self) -> &[String] {
        &self.extra_fields
    }

    /// Locators loaded in train mode: features then class.
    pub fn train_fields(&self) -> Vec<String> {
        let mut fields = self.features.clone();
        fields.push(self.class_field.clone());
        fields
    }

    /// Locators loaded in detail mode: train fields, doc id, extras.
    pub fn detail_fields(&self) -> Vec<String> {
        let mut fields = self.train_fields();
        if let Some(doc_id) = &self.doc_id_field {
            fields.push(doc_id.clone());
        }
        fields.extend(self.extra_fields.iter().cloned());
        fields
    }

    /// Column names matching [`Record::values`](crate::Record::values) for
    /// `mode`. Multiple feature locators share one column, named by joining
    /// them with `+`.
    pub fn record_columns(&self, mode: LoadMode) -> Vec<String> {
        let mut columns = vec![self.features.join("+"), self.class_field.clone()];
        if mode == LoadMode::Detail {
            columns.extend(self.doc_id_field.iter().cloned());
            columns.extend(self.extra_fields.iter().cloned());
        }
        columns
    }

    /// Column names of the prediction audit CSV:
    /// `[doc_id, prediction, class, ...extra, likelihood]`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no `doc_id` is configured.
    pub fn analysis_field_names(&self) -> Result<Vec<String>> {
        let doc_id = self
            .doc_id_field
            .clone()
            .ok_or_else(|| Error::missing_key(self.section.clone(), "doc_id"))?;

        let mut names = vec![doc_id, "prediction".to_string(), self.class_field.clone()];
        names.extend(self.extra_fields.iter().cloned());
        names.push("likelihood".to_string());
        Ok(names)
    }
}

fn string_list(section: &str, key: &str, items: &[Value]) -> Result<Vec<String>> {
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| Error::config(section, format!("'{key}' must contain only strings")))
        })
        .collect()
}
