//! TRXML document model and locator resolution.
//!
//! A TRXML document is a root element whose children are *sections*. Each
//! section holds *items* and each item holds named *fields*:
//!
//! ```xml
//! <trxml>
//!   <sec_vacancy>
//!     <item index="0"><sec_vacancy>We are hiring ...</sec_vacancy></item>
//!   </sec_vacancy>
//!   <Document>
//!     <item index="0"><correlationid>4711</correlationid></item>
//!   </Document>
//! </trxml>
//! ```
//!
//! A [`Locator`] such as `sec_vacancy.0.sec_vacancy` addresses section
//! `sec_vacancy`, item `0`, field `sec_vacancy`. Items are numbered by their
//! `index` attribute, or by position within the section when it is absent.

use std::{collections::HashMap, fmt, str::FromStr};

use quick_xml::{
    events::{BytesStart, Event},
    Reader,
};

use crate::error::{Error, Result};

/// A parsed `section.index.field` address.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    section: String,
    index: usize,
    field: String,
}

impl Locator {
    /// Section (top-level element) name.
    pub fn section(&self) -> &str {
        &self.section
    }

    /// Item index within the section.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Field element name within the item.
    pub fn field(&self) -> &str {
        &self.field
    }
}

impl FromStr for Locator {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut parts = s.splitn(3, '.');
        let section = parts.next().unwrap_or_default();
        let index = parts.next().unwrap_or_default();
        let field = parts.next().unwrap_or_default();

        if section.is_empty() || field.is_empty() {
            return Err(format!(
                "invalid locator '{s}': expected section.index.field"
            ));
        }
        let index = index
            .parse::<usize>()
            .map_err(|_| format!("invalid locator '{s}': index '{index}' is not a number"))?;

        Ok(Self {
            section: section.to_string(),
            index,
            field: field.to_string(),
        })
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.section, self.index, self.field)
    }
}

type FieldKey = (String, usize, String);

/// Scalar values of one TRXML document, addressable by [`Locator`].
#[derive(Debug, Clone, Default)]
pub struct BundleDocument {
    values: HashMap<FieldKey, String>,
}

impl BundleDocument {
    /// Parses one document. `source_id` names the document in errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Record`] if the XML is malformed or has no root.
    pub fn parse(source_id: &str, xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut values = HashMap::new();

        let mut depth = 0usize;
        let mut seen_root = false;
        let mut section = String::new();
        let mut item_ordinal = 0usize;
        let mut item_index = 0usize;
        let mut field = String::new();
        let mut text = String::new();

        let xml_err = |e: quick_xml::Error| Error::record(source_id, format!("invalid XML: {e}"));

        loop {
            match reader.read_event().map_err(xml_err)? {
                Event::Start(e) => {
                    match depth {
                        0 => seen_root = true,
                        1 => {
                            section = element_name(&e);
                            item_ordinal = 0;
                        }
                        2 => {
                            item_index = index_attribute(&e).unwrap_or(item_ordinal);
                            item_ordinal += 1;
                        }
                        3 => {
                            field = element_name(&e);
                            text.clear();
                        }
                        // nested markup inside a field is flattened into its text
                        _ => {}
                    }
                    depth += 1;
                }
                Event::Empty(e) => match depth {
                    0 => seen_root = true,
                    2 => item_ordinal += 1,
                    3 => {
                        values
                            .entry((section.clone(), item_index, element_name(&e)))
                            .or_insert_with(String::new);
                    }
                    _ => {}
                },
                Event::Text(e) if depth >= 4 => {
                    let unescaped = e.unescape().map_err(xml_err)?;
                    text.push_str(&unescaped);
                }
                Event::CData(e) if depth >= 4 => {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    if depth == 3 {
                        values
                            .entry((section.clone(), item_index, std::mem::take(&mut field)))
                            .or_insert_with(|| text.trim().to_string());
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !seen_root {
            return Err(Error::record(source_id, "document has no root element"));
        }
        if depth > 0 {
            return Err(Error::record(source_id, "document ends inside an open element"));
        }

        Ok(Self { values })
    }

    /// Resolves a locator to its value, if the document contains it.
    pub fn resolve(&self, locator: &Locator) -> Option<&str> {
        self.values
            .get(&(
                locator.section.clone(),
                locator.index,
                locator.field.clone(),
            ))
            .map(String::as_str)
    }

    /// Number of addressable fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the document holds no fields.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

fn index_attribute(e: &BytesStart) -> Option<usize> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == b"index")
        .and_then(|attr| std::str::from_utf8(&attr.value).ok()?.trim().parse().ok())
}
