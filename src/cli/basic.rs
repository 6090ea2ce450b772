//! Basic CLI commands for data inspection, splitting and labelling.

use std::{collections::BTreeMap, path::Path};

use arrow::util::pretty::print_batches;

use crate::{
    config::DataConfig,
    fields::FieldMapping,
    format::StorageFormat,
    label::LabelMapper,
    loader::{load_data_set, loader_for},
    record::{records_to_batch, LoadMode, Record, RecordPolicy},
    split::split_data_set,
};

/// Report the storage format of a path.
pub(crate) fn cmd_detect(path: &Path) -> crate::Result<()> {
    let format = StorageFormat::detect(path)?;
    println!("{}: {}", path.display(), format);
    Ok(())
}

/// Show the field mapping that applies to a path.
pub(crate) fn cmd_fields(config: &Path, path: &Path) -> crate::Result<()> {
    let config = DataConfig::from_path(config)?;
    let format = StorageFormat::detect(path)?;
    let mapping = FieldMapping::for_format(&config, format)?;

    println!("Format: {}", format);
    println!("Section: {}", mapping.section());
    println!("Features: {}", mapping.features().join(", "));
    println!("Class: {}", mapping.class_field());
    println!("Doc id: {}", mapping.doc_id_field().unwrap_or("-"));
    if !mapping.extra_fields().is_empty() {
        println!("Extra: {}", mapping.extra_fields().join(", "));
    }
    if let Ok(names) = mapping.analysis_field_names() {
        println!("Analysis columns: {}", names.join(", "));
    }

    Ok(())
}

/// Display the first N records as a table.
pub(crate) fn cmd_head(
    config: &Path,
    path: &Path,
    rows: usize,
    detail: bool,
    lenient: bool,
) -> crate::Result<()> {
    let mut config = DataConfig::from_path(config)?;
    if lenient {
        config = config.with_record_policy(RecordPolicy::Lenient);
    }
    let mode = if detail { LoadMode::Detail } else { LoadMode::Train };

    let format = StorageFormat::detect(path)?;
    let mapping = FieldMapping::for_format(&config, format)?;
    let columns = mapping.record_columns(mode);

    let mut stream = loader_for(format, mapping, config.record_policy)?.load(path, mode)?;
    let records = stream
        .by_ref()
        .take(rows)
        .collect::<crate::Result<Vec<Record>>>()?;

    if records.is_empty() {
        println!("No records to display");
        return Ok(());
    }

    let batch = records_to_batch(&columns, &records)?;
    print_batches(&[batch]).map_err(crate::Error::Arrow)?;

    if stream.skipped() > 0 {
        println!("... skipped {} unreadable records", stream.skipped());
    }

    Ok(())
}

/// Display record count and class distribution.
pub(crate) fn cmd_info(config: &Path, path: &Path) -> crate::Result<()> {
    let config = DataConfig::from_path(config)?;
    let format = StorageFormat::detect(path)?;

    let mut stream = load_data_set(&config, path, LoadMode::Train)?;
    let mut classes: BTreeMap<String, usize> = BTreeMap::new();
    for record in stream.by_ref() {
        *classes.entry(record?.label).or_default() += 1;
    }

    println!("Path: {}", path.display());
    println!("Format: {}", format);
    println!("Records: {}", stream.yielded());
    if stream.skipped() > 0 {
        println!("Skipped: {}", stream.skipped());
    }
    println!("Classes: {}", classes.len());
    for (label, count) in &classes {
        println!("  {}: {}", label, count);
    }

    Ok(())
}

/// Split a data set into train and eval artifacts.
pub(crate) fn cmd_split(path: &Path, ratio: f64, output: &Path, seed: u64) -> crate::Result<()> {
    let paths = split_data_set(path, ratio, output, seed)?;

    println!(
        "Split {} -> {} ({} records), {} ({} records)",
        path.display(),
        paths.train.display(),
        paths.train_units,
        paths.eval.display(),
        paths.eval_units
    );

    Ok(())
}

/// Build and persist the label mapping from training data.
pub(crate) fn cmd_labels(config: &Path, path: &Path, output: &Path) -> crate::Result<()> {
    let config = DataConfig::from_path(config)?;
    let records = load_data_set(&config, path, LoadMode::Train)?;
    let mapper = LabelMapper::from_records(records)?;
    mapper.persist(output)?;

    println!("Wrote {} labels to {}", mapper.len(), output.display());
    for (id, label) in mapper.labels().iter().enumerate() {
        println!("  {}: {}", id, label);
    }

    Ok(())
}
