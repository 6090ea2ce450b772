//! Record loaders, one per storage format.
//!
//! The [`RecordLoader`] trait is the format-agnostic contract. Which
//! implementation handles a path is decided by [`StorageFormat::detect`]
//! and the fixed table in [`loader_for`].

pub mod bundle;
pub mod delimited;

use std::path::Path;

pub use bundle::{BundleLoader, BundleLocators};
pub use delimited::DelimitedLoader;

use crate::{
    config::DataConfig,
    error::Result,
    fields::FieldMapping,
    format::StorageFormat,
    record::{LoadMode, RecordPolicy, RecordStream},
};

/// Produces normalized records from one storage format.
///
/// Both load operations return a fresh [`RecordStream`] on every call.
/// Errors that concern the whole input (unreadable path, CSV header missing
/// a configured column) are returned before the stream exists; errors that
/// concern a single record are yielded by the stream.
///
/// Record order follows the storage: file row order for delimited files and
/// ascending file-name order for bundles.
pub trait RecordLoader {
    /// The format this loader reads.
    fn format(&self) -> StorageFormat;

    /// The field mapping this loader was built with.
    fn mapping(&self) -> &FieldMapping;

    /// Opens `path` and streams records in the given mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be opened or does not match the
    /// field mapping.
    fn load(&self, path: &Path, mode: LoadMode) -> Result<RecordStream>;

    /// Streams train-mode records (features and class).
    ///
    /// # Errors
    ///
    /// See [`RecordLoader::load`].
    fn load_train(&self, path: &Path) -> Result<RecordStream> {
        self.load(path, LoadMode::Train)
    }

    /// Streams detail-mode records (features, class, doc id, extras).
    ///
    /// # Errors
    ///
    /// See [`RecordLoader::load`].
    fn load_detail(&self, path: &Path) -> Result<RecordStream> {
        self.load(path, LoadMode::Detail)
    }
}

/// Builds the loader for `format`.
///
/// # Errors
///
/// Returns [`Error::Config`](crate::Error::Config) if the mapping is not
/// valid for the format.
pub fn loader_for(
    format: StorageFormat,
    mapping: FieldMapping,
    policy: RecordPolicy,
) -> Result<Box<dyn RecordLoader>> {
    Ok(match format {
        StorageFormat::Delimited(delimiter) => {
            Box::new(DelimitedLoader::new(mapping, delimiter, policy))
        }
        StorageFormat::StructuredBundle => Box::new(BundleLoader::new(mapping, policy)?),
    })
}

/// Detects the format of `path`, validates its field section and streams
/// its records.
///
/// # Errors
///
/// Returns detection, configuration or open errors; see
/// [`StorageFormat::detect`] and [`RecordLoader::load`].
pub fn load_data_set(
    config: &DataConfig,
    path: impl AsRef<Path>,
    mode: LoadMode,
) -> Result<RecordStream> {
    let path = path.as_ref();
    let format = StorageFormat::detect(path)?;
    let mapping = FieldMapping::for_format(config, format)?;
    tracing::debug!(path = %path.display(), %format, ?mode, "loading data set");
    loader_for(format, mapping, config.record_policy)?.load(path, mode)
}

/// Column names of the prediction audit CSV for the data at `path`.
///
/// # Errors
///
/// Returns detection or configuration errors.
pub fn analysis_field_names(config: &DataConfig, path: impl AsRef<Path>) -> Result<Vec<String>> {
    let format = StorageFormat::detect(path)?;
    FieldMapping::for_format(config, format)?.analysis_field_names()
}
