//! Loader for comma- and tab-separated files with a header row.

use std::{fs::File, path::Path};

use csv::{ReaderBuilder, StringRecord};

use super::RecordLoader;
use crate::{
    error::{Error, Result},
    fields::FieldMapping,
    format::{Delimiter, StorageFormat},
    record::{LoadMode, Record, RecordPolicy, RecordStream},
};

/// Reads records from a delimited file by configured column name.
#[derive(Debug, Clone)]
pub struct DelimitedLoader {
    mapping: FieldMapping,
    delimiter: Delimiter,
    policy: RecordPolicy,
}

impl DelimitedLoader {
    /// Creates a loader for the given mapping and separator.
    pub fn new(mapping: FieldMapping, delimiter: Delimiter, policy: RecordPolicy) -> Self {
        Self {
            mapping,
            delimiter,
            policy,
        }
    }
}

impl RecordLoader for DelimitedLoader {
    fn format(&self) -> StorageFormat {
        StorageFormat::Delimited(self.delimiter)
    }

    fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    fn load(&self, path: &Path, mode: LoadMode) -> Result<RecordStream> {
        let file = File::open(path).map_err(|e| Error::io(e, path))?;
        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter.as_byte())
            .has_headers(true)
            .flexible(true)
            .from_reader(file);

        let headers = reader.headers()?.clone();
        let columns = ColumnIndex::resolve(&self.mapping, &headers, mode, path)?;
        tracing::debug!(path = %path.display(), ?mode, "opened delimited file");

        let path = path.to_path_buf();
        let rows = reader
            .into_records()
            .enumerate()
            .map(move |(i, row)| columns.record(&path, i + 1, row));

        Ok(RecordStream::new(rows, self.policy))
    }
}

/// Header positions of the configured columns.
#[derive(Debug, Clone)]
struct ColumnIndex {
    mode: LoadMode,
    features: Vec<(String, usize)>,
    class: (String, usize),
    doc_id: Option<(String, usize)>,
    extra: Vec<(String, usize)>,
}

impl ColumnIndex {
    /// Looks up every column the mode needs; a missing one is fatal.
    fn resolve(
        mapping: &FieldMapping,
        headers: &StringRecord,
        mode: LoadMode,
        path: &Path,
    ) -> Result<Self> {
        let find = |name: &str| -> Result<(String, usize)> {
            headers
                .iter()
                .position(|h| h == name)
                .map(|idx| (name.to_string(), idx))
                .ok_or_else(|| {
                    Error::config(
                        mapping.section(),
                        format!("column '{name}' not found in header of {}", path.display()),
                    )
                })
        };

        let features = mapping
            .features()
            .iter()
            .map(|f| find(f))
            .collect::<Result<Vec<_>>>()?;
        let class = find(mapping.class_field())?;

        let (doc_id, extra) = match mode {
            LoadMode::Train => (None, Vec::new()),
            LoadMode::Detail => (
                mapping.doc_id_field().map(find).transpose()?,
                mapping
                    .extra_fields()
                    .iter()
                    .map(|f| find(f))
                    .collect::<Result<Vec<_>>>()?,
            ),
        };

        Ok(Self {
            mode,
            features,
            class,
            doc_id,
            extra,
        })
    }

    fn record(
        &self,
        path: &Path,
        row_no: usize,
        row: std::result::Result<StringRecord, csv::Error>,
    ) -> Result<Record> {
        let source = format!("row {row_no} of {}", path.display());

        let row = match row {
            Ok(row) => row,
            Err(e) if e.is_io_error() => return Err(Error::Csv(e)),
            Err(e) => return Err(Error::record(source, e.to_string())),
        };

        let required = |(name, idx): &(String, usize)| -> Result<String> {
            row.get(*idx).map(str::to_string).ok_or_else(|| {
                Error::record(
                    source.clone(),
                    format!("row has {} fields, column '{name}' is missing", row.len()),
                )
            })
        };
        let optional = |(_, idx): &(String, usize)| row.get(*idx).unwrap_or_default().to_string();

        let features = self
            .features
            .iter()
            .map(required)
            .collect::<Result<Vec<_>>>()?
            .join("\n");
        let label = required(&self.class)?;

        let record = Record::train(source.clone(), features, label);
        Ok(match self.mode {
            LoadMode::Train => record,
            LoadMode::Detail => record.with_detail(
                self.doc_id.as_ref().map(optional),
                self.extra.iter().map(optional).collect(),
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, path::PathBuf};

    use serde_json::json;

    use super::*;

    fn mapping() -> FieldMapping {
        FieldMapping::from_section(
            "csv_fields",
            &json!({
                "features": "full_text",
                "class": "advertiser_type",
                "doc_id": "posting_id",
                "extra": ["source_type"]
            }),
        )
        .ok()
        .unwrap_or_else(|| panic!("Should build mapping"))
    }

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content)
            .ok()
            .unwrap_or_else(|| panic!("Should write fixture"));
        path
    }

    fn loader(policy: RecordPolicy) -> DelimitedLoader {
        DelimitedLoader::new(mapping(), Delimiter::Comma, policy)
    }

    #[test]
    fn test_train_records_in_file_order() {
        let dir = tempfile::tempdir()
            .ok()
            .unwrap_or_else(|| panic!("Should create temp dir"));
        let path = write(
            &dir,
            "data.csv",
            "full_text,advertiser_type,posting_id\n\"hello world\",yes,1\nfoo bar,no,2\n",
        );

        let records: Vec<Record> = loader(RecordPolicy::Strict)
            .load_train(&path)
            .ok()
            .unwrap_or_else(|| panic!("Should open"))
            .collect::<Result<_>>()
            .ok()
            .unwrap_or_else(|| panic!("Should load"));

        let values: Vec<Vec<&str>> = records.iter().map(Record::values).collect();
        assert_eq!(values, vec![vec!["hello world", "yes"], vec!["foo bar", "no"]]);
    }

    #[test]
    fn test_detail_header_missing_extra_column_is_config_error() {
        let dir = tempfile::tempdir()
            .ok()
            .unwrap_or_else(|| panic!("Should create temp dir"));
        let path = write(
            &dir,
            "data.csv",
            "full_text,advertiser_type,posting_id\nhello,yes,1\n",
        );

        // train mode only needs features and class
        assert!(loader(RecordPolicy::Strict).load_train(&path).is_ok());

        match loader(RecordPolicy::Strict).load_detail(&path) {
            Err(Error::Config { message, .. }) => assert!(message.contains("'source_type'")),
            other => panic!("Expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn test_tab_separated_detail() {
        let dir = tempfile::tempdir()
            .ok()
            .unwrap_or_else(|| panic!("Should create temp dir"));
        let path = write(
            &dir,
            "data.tsv",
            "posting_id\tsource_type\tfull_text\tadvertiser_type\n9\tweb\ta, b\tno\n",
        );

        let loader = DelimitedLoader::new(mapping(), Delimiter::Tab, RecordPolicy::Strict);
        let records: Vec<Record> = loader
            .load_detail(&path)
            .ok()
            .unwrap_or_else(|| panic!("Should open"))
            .collect::<Result<_>>()
            .ok()
            .unwrap_or_else(|| panic!("Should load"));

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].values(), vec!["a, b", "no", "9", "web"]);
    }

    #[test]
    fn test_short_row_strict_vs_lenient() {
        let dir = tempfile::tempdir()
            .ok()
            .unwrap_or_else(|| panic!("Should create temp dir"));
        let path = write(
            &dir,
            "data.csv",
            "full_text,advertiser_type\nfirst,yes\nbroken\nthird,no\n",
        );

        let strict: Vec<Result<Record>> = loader(RecordPolicy::Strict)
            .load_train(&path)
            .ok()
            .unwrap_or_else(|| panic!("Should open"))
            .collect();
        assert_eq!(strict.len(), 2);
        match &strict[1] {
            Err(Error::Record { source_id, reason }) => {
                assert!(source_id.starts_with("row 2"));
                assert!(reason.contains("advertiser_type"));
            }
            other => panic!("Expected record error, got {other:?}"),
        }

        let mut lenient = loader(RecordPolicy::Lenient)
            .load_train(&path)
            .ok()
            .unwrap_or_else(|| panic!("Should open"));
        let labels: Vec<String> = lenient
            .by_ref()
            .filter_map(|r| r.ok().map(|rec| rec.label))
            .collect();
        assert_eq!(labels, vec!["yes", "no"]);
        assert_eq!(lenient.skipped(), 1);
    }

    #[test]
    fn test_multiple_feature_columns_joined() {
        let dir = tempfile::tempdir()
            .ok()
            .unwrap_or_else(|| panic!("Should create temp dir"));
        let path = write(&dir, "data.csv", "title,body,label\nSales,Join us,yes\n");
        let mapping = FieldMapping::from_section(
            "csv_fields",
            &json!({"features": ["title", "body"], "class": "label"}),
        )
        .ok()
        .unwrap_or_else(|| panic!("Should build mapping"));

        let loader = DelimitedLoader::new(mapping, Delimiter::Comma, RecordPolicy::Strict);
        let record = loader
            .load_train(&path)
            .ok()
            .and_then(|mut s| s.next())
            .and_then(|r| r.ok())
            .unwrap_or_else(|| panic!("Should yield a record"));
        assert_eq!(record.features, "Sales\nJoin us");
    }

    #[test]
    fn test_stream_is_restartable_by_reloading() {
        let dir = tempfile::tempdir()
            .ok()
            .unwrap_or_else(|| panic!("Should create temp dir"));
        let path = write(&dir, "data.csv", "full_text,advertiser_type\na,yes\nb,no\n");
        let loader = loader(RecordPolicy::Strict);

        let first = loader.load_train(&path).map(Iterator::count).ok();
        let second = loader.load_train(&path).map(Iterator::count).ok();
        assert_eq!(first, Some(2));
        assert_eq!(second, Some(2));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = loader(RecordPolicy::Strict).load_train(Path::new("/nonexistent/data.csv"));
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
