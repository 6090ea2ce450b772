//! Integration tests for agency-dataset.

#![allow(clippy::uninlined_format_args)]

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use agency_dataset::{
    analysis_field_names, load_data_set, split_data_set, DataConfig, Error, LabelMapper, LoadMode,
    Record, RecordPolicy,
};

fn config() -> DataConfig {
    DataConfig::from_json_str(
        r#"{
            "model": "ignored",
            "csv_fields": {
                "features": "full_text",
                "class": "advertiser_type",
                "doc_id": "posting_id"
            },
            "trxml_fields": {
                "features": "sec_vacancy.0.sec_vacancy",
                "class": "derived_vac_intermediary.0.derived_vac_intermediary",
                "doc_id": "Document.0.correlationid",
                "extra": ["derived_org_name.0.derived_org_name"]
            }
        }"#,
    )
    .ok()
    .unwrap_or_else(|| panic!("Should parse config"))
}

fn write(path: &Path, content: &str) {
    fs::write(path, content)
        .ok()
        .unwrap_or_else(|| panic!("Should write {}", path.display()));
}

fn load(config: &DataConfig, path: &Path, mode: LoadMode) -> Vec<Record> {
    load_data_set(config, path, mode)
        .ok()
        .unwrap_or_else(|| panic!("Should open {}", path.display()))
        .collect::<agency_dataset::Result<_>>()
        .ok()
        .unwrap_or_else(|| panic!("Should load {}", path.display()))
}

/// `<name><item index="0"><field>value</field></item></name>`
fn section(name: &str, field: &str, value: &str) -> String {
    format!("<{name}><item index=\"0\"><{field}>{value}</{field}></item></{name}>")
}

fn trxml(id: usize, text: &str, label: &str) -> String {
    let document = section("Document", "correlationid", &id.to_string());
    let vacancy = section("sec_vacancy", "sec_vacancy", &format!("<![CDATA[{text}]]>"));
    let class = section("derived_vac_intermediary", "derived_vac_intermediary", label);
    format!("<trxml>{document}{vacancy}{class}</trxml>")
}

fn make_bundle(dir: &Path, n: usize) -> PathBuf {
    let bundle = dir.join("bundle");
    fs::create_dir_all(&bundle).ok();
    for i in 0..n {
        let label = if i % 4 == 0 { "yes" } else { "no" };
        write(
            &bundle.join(format!("vacancy_{i:02}.xml")),
            &trxml(i, &format!("Vacancy <b>{i}</b>"), label),
        );
    }
    bundle
}

#[test]
fn test_delimited_train_and_detail_records() {
    let dir = tempfile::tempdir()
        .ok()
        .unwrap_or_else(|| panic!("Should create temp dir"));
    let path = dir.path().join("postings.csv");
    write(
        &path,
        "full_text,advertiser_type,posting_id\n\"hello world\",yes,1\nfoo bar,no,2\n",
    );

    let train = load(&config(), &path, LoadMode::Train);
    let values: Vec<Vec<&str>> = train.iter().map(Record::values).collect();
    assert_eq!(values, vec![vec!["hello world", "yes"], vec!["foo bar", "no"]]);

    let detail = load(&config(), &path, LoadMode::Detail);
    let ids: Vec<Option<&str>> = detail.iter().map(|r| r.doc_id.as_deref()).collect();
    assert_eq!(ids, vec![Some("1"), Some("2")]);
    assert_eq!(detail[0].features, "hello world");
}

#[test]
fn test_split_then_label_workflow() {
    let dir = tempfile::tempdir()
        .ok()
        .unwrap_or_else(|| panic!("Should create temp dir"));
    let path = dir.path().join("postings.csv");
    let mut content = String::from("full_text,advertiser_type,posting_id\n");
    for i in 0..10 {
        let label = ["yes", "no", "unknown"][i % 3];
        content.push_str(&format!("\"posting, {i}\",{label},{i}\n"));
    }
    write(&path, &content);

    // 1. Split
    let models = dir.path().join("models");
    let paths = split_data_set(&path, 0.8, &models, 111)
        .ok()
        .unwrap_or_else(|| panic!("Should split"));
    assert_eq!((paths.train_units, paths.eval_units), (8, 2));

    // 2. Both halves load with the same config
    let train = load(&config(), &paths.train, LoadMode::Train);
    let eval = load(&config(), &paths.eval, LoadMode::Detail);
    assert_eq!(train.len(), 8);
    assert_eq!(eval.len(), 2);

    let original: HashSet<String> = load(&config(), &path, LoadMode::Train)
        .into_iter()
        .map(|r| r.features)
        .collect();
    let rejoined: HashSet<String> = train
        .iter()
        .chain(eval.iter())
        .map(|r| r.features.clone())
        .collect();
    assert_eq!(rejoined, original);

    // 3. Label mapping from train, reused for eval
    let mapper = LabelMapper::from_records(train.into_iter().map(Ok))
        .ok()
        .unwrap_or_else(|| panic!("Should build mapping"));
    let mapping_path = models.join("label_mapper.json");
    assert!(mapper.persist(&mapping_path).is_ok());

    let reloaded = LabelMapper::load(&mapping_path)
        .ok()
        .unwrap_or_else(|| panic!("Should load mapping"));
    assert_eq!(reloaded, mapper);
    for record in &eval {
        if let Ok(id) = reloaded.encode(&record.label) {
            assert_eq!(reloaded.decode(id).ok(), Some(record.label.as_str()));
        }
    }
}

#[test]
fn test_bundle_load_split_and_reload() {
    let dir = tempfile::tempdir()
        .ok()
        .unwrap_or_else(|| panic!("Should create temp dir"));
    let bundle = make_bundle(dir.path(), 12);

    let records = load(&config(), &bundle, LoadMode::Detail);
    assert_eq!(records.len(), 12);
    assert_eq!(records[0].features, "Vacancy <b>0</b>");
    assert_eq!(records[0].doc_id.as_deref(), Some("0"));
    // optional org name absent from every document
    assert_eq!(records[0].extra, vec![String::new()]);

    let paths = split_data_set(&bundle, 0.75, dir.path().join("out"), 111)
        .ok()
        .unwrap_or_else(|| panic!("Should split bundle"));
    assert_eq!((paths.train_units, paths.eval_units), (9, 3));

    let train = load(&config(), &paths.train, LoadMode::Train);
    let eval = load(&config(), &paths.eval, LoadMode::Train);
    assert_eq!(train.len() + eval.len(), 12);
}

#[test]
fn test_lenient_policy_skips_bad_documents() {
    let dir = tempfile::tempdir()
        .ok()
        .unwrap_or_else(|| panic!("Should create temp dir"));
    let bundle = make_bundle(dir.path(), 3);
    write(&bundle.join("vacancy_99.xml"), "<trxml><Document>");

    let strict = load_data_set(&config(), &bundle, LoadMode::Train)
        .ok()
        .unwrap_or_else(|| panic!("Should open"))
        .collect::<agency_dataset::Result<Vec<_>>>();
    assert!(matches!(strict, Err(Error::Record { .. })));

    let lenient = config().with_record_policy(RecordPolicy::Lenient);
    assert_eq!(load(&lenient, &bundle, LoadMode::Train).len(), 3);
}

#[test]
fn test_analysis_field_names_for_csv() {
    let dir = tempfile::tempdir()
        .ok()
        .unwrap_or_else(|| panic!("Should create temp dir"));
    let path = dir.path().join("data.tsv");
    write(&path, "full_text\tadvertiser_type\tposting_id\n");

    let names = analysis_field_names(&config(), &path)
        .ok()
        .unwrap_or_else(|| panic!("Should resolve"));
    assert_eq!(
        names,
        vec!["posting_id", "prediction", "advertiser_type", "likelihood"]
    );
}

#[test]
fn test_unsupported_and_missing_paths() {
    let dir = tempfile::tempdir()
        .ok()
        .unwrap_or_else(|| panic!("Should create temp dir"));
    let json = dir.path().join("data.json");
    write(&json, "{}");

    assert!(matches!(
        load_data_set(&config(), &json, LoadMode::Train),
        Err(Error::UnsupportedFormat { .. })
    ));
    assert!(matches!(
        load_data_set(&config(), dir.path().join("nope.csv"), LoadMode::Train),
        Err(Error::NotFound { .. })
    ));
}
