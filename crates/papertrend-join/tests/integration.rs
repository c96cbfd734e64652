//! End-to-end merge tests: staged parquet → DuckDB → dataset.parquet

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use papertrend_bib::{DateDefaults, RecordBuffer, parse_bibliography, reconcile};
use papertrend_core::ProgressContext;
use papertrend_join::{CategoryRule, JoinConfig, MergedRow, StudyRecord, merge};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tempfile::TempDir;

const EXPORT: &str = "\
Reference Type:  Journal Article
Record Number: 1
Year: 2020
Title: Blood methylation and BMI
Short Title: Methylation and BMI
URL: https://example.org/1
Reference Type:  Journal Article
Record Number: 2
Year: 1999
Date: March 3
Abstract: Coffin-Siris cohort
Reference Type:  Journal Article
Record Number: 3
Year: 2018
Date: Jul
Reference Type:  Journal Article
Record Number: 9
Title: Not in the sheet
Year: 2001
";

fn bibliography() -> RecordBuffer {
    let mut buffer = parse_bibliography(EXPORT.lines());
    let defaults = DateDefaults::with_reference(NaiveDate::from_ymd_opt(2024, 7, 13).unwrap());
    reconcile(&mut buffer, &defaults);
    buffer
}

fn study(row: i64, id: Option<i64>, phenotype: &str, size: &str, array: &str) -> StudyRecord {
    StudyRecord {
        sheet_row: row,
        identifier: id,
        include: Some("Yes".into()),
        title: Some(format!("Study {row}")),
        phenotype: Some(phenotype.into()),
        category: Some("Other".into()),
        sample_size: Some(size.into()),
        array: Some(array.into()),
        multiple_array: Some("450K, EPIC".into()),
    }
}

fn studies() -> Vec<StudyRecord> {
    vec![
        study(1, Some(1), "Body mass index", "1200", "EPIC"),
        study(2, Some(2), "BAFopathy syndrome: Coffin-Siris", "n/a", "Multiple"),
        study(4, Some(3), "Intellectual developmental disorder, X-linked 1", " 85 ", "450K"),
        study(5, Some(42), "Asthma", "300", "EPIC"),
        study(6, None, "Asthma", "", "EPIC"),
    ]
}

fn config(dir: &Path) -> JoinConfig {
    JoinConfig {
        output_dir: dir.to_path_buf(),
        ..Default::default()
    }
}

fn by_row(rows: &[MergedRow]) -> HashMap<i64, &MergedRow> {
    rows.iter().map(|r| (r.sheet_row, r)).collect()
}

#[test]
fn test_merge_pipeline() {
    let _ = env_logger::builder().is_test(true).try_init();
    let tmp = TempDir::new().unwrap();

    let output = merge(&studies(), &bibliography(), &config(tmp.path())).unwrap();
    let rows = output.dataset.rows();

    // every study row kept, in sheet order; bib record 9 dropped
    let order: Vec<i64> = rows.iter().map(|r| r.sheet_row).collect();
    assert_eq!(order, vec![1, 2, 4, 5, 6]);

    let rows = by_row(rows);
    let first = rows[&1];
    assert_eq!(first.date2.as_deref(), Some("2020-01-01"));
    assert_eq!(first.date, NaiveDate::from_ymd_opt(2020, 1, 1));
    assert_eq!(first.short_title.as_deref(), Some("Methylation and BMI"));
    assert_eq!(first.url.as_deref(), Some("https://example.org/1"));
    assert_eq!(first.sample_size, Some(1200.0));
    assert_eq!(first.category.as_deref(), Some("Other"));

    let second = rows[&2];
    assert_eq!(second.date, NaiveDate::from_ymd_opt(1999, 3, 3));
    assert_eq!(second.category.as_deref(), Some("Syndrome"));
    assert_eq!(second.sample_size, None);
    assert_eq!(second.array.as_deref(), Some("450K, EPIC"));
    assert_eq!(second.abstract_text.as_deref(), Some("Coffin-Siris cohort"));

    let fourth = rows[&4];
    assert_eq!(fourth.date, NaiveDate::from_ymd_opt(2018, 7, 14));
    assert_eq!(fourth.category.as_deref(), Some("Psychiatric"));
    assert_eq!(fourth.sample_size, Some(85.0));
    assert_eq!(fourth.array.as_deref(), Some("450K"));

    assert_eq!(output.summary.studies, 5);
    assert_eq!(output.summary.matched, 3);
    assert_eq!(output.summary.dated, 3);
    assert_eq!(output.summary.sized, 3);
}

#[test]
fn unmatched_studies_get_null_bibliography_columns() {
    let tmp = TempDir::new().unwrap();
    let output = merge(&studies(), &bibliography(), &config(tmp.path())).unwrap();
    let rows = by_row(output.dataset.rows());

    for row in [rows[&5], rows[&6]] {
        assert_eq!(row.date2, None);
        assert_eq!(row.date, None);
        assert_eq!(row.short_title, None);
        assert_eq!(row.abstract_text, None);
        assert_eq!(row.url, None);
    }
    assert_eq!(rows[&5].identifier, Some(42));
    assert_eq!(rows[&6].identifier, None);
    assert_eq!(rows[&6].sample_size, None);
}

#[test]
fn custom_rules_apply_in_order() {
    let tmp = TempDir::new().unwrap();
    let config = JoinConfig {
        category_rules: vec![
            CategoryRule::new("Asthma", "Respiratory"),
            CategoryRule::new("Asth", "Allergy"),
        ],
        multiple_sentinel: "EPIC".into(),
        ..config(tmp.path())
    };
    let output = merge(&studies(), &bibliography(), &config).unwrap();
    let rows = by_row(output.dataset.rows());

    assert_eq!(rows[&5].category.as_deref(), Some("Allergy"));
    // defaults replaced, so no Syndrome correction
    assert_eq!(rows[&2].category.as_deref(), Some("Other"));
    assert_eq!(rows[&1].array.as_deref(), Some("450K, EPIC"));
    assert_eq!(rows[&2].array.as_deref(), Some("Multiple"));
}

#[test]
fn dataset_parquet_matches_schema() {
    let tmp = TempDir::new().unwrap();
    let output = merge(&studies(), &bibliography(), &config(tmp.path())).unwrap();

    assert!(tmp.path().join("studies.parquet").exists());
    assert!(tmp.path().join("bibliography.parquet").exists());
    assert_eq!(output.path, tmp.path().join("dataset.parquet"));

    let builder = ParquetRecordBatchReaderBuilder::try_new(File::open(&output.path).unwrap()).unwrap();
    let schema = builder.schema().clone();
    let expected = papertrend_join::schema::dataset();
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    let expected_names: Vec<&str> = expected.fields().iter().map(|f| f.name().as_str()).collect();
    assert_eq!(names, expected_names);
    for field in expected.fields() {
        assert_eq!(
            schema.field_with_name(field.name()).unwrap().data_type(),
            field.data_type(),
            "{}",
            field.name()
        );
    }

    let rows: usize = builder.build().unwrap().map(|b| b.unwrap().num_rows()).sum();
    assert_eq!(rows, 5);
}

#[test]
fn empty_inputs_merge_to_empty_dataset() {
    let tmp = TempDir::new().unwrap();
    let output = merge(&[], &RecordBuffer::new(), &config(tmp.path())).unwrap();
    assert!(output.dataset.is_empty());
    assert_eq!(output.summary.matched, 0);
}

#[test]
fn run_reads_csv_sheet_and_export() {
    let tmp = TempDir::new().unwrap();
    let sheet = tmp.path().join("studies.csv");
    std::fs::write(
        &sheet,
        "Identifier,Include,Title,Phenotype,Category,Sample size,Array,Multiple_array\n\
         1.0,Yes,First,Body mass index,Metabolic,120,EPIC,\n\
         2,No,Second,Asthma,Respiratory,80,EPIC,\n\
         3,Yes,Third,Smoking,Exposure,45,Multiple,\"450K, EPIC\"\n",
    )
    .unwrap();
    let export = tmp.path().join("refs.txt");
    std::fs::write(&export, EXPORT).unwrap();

    let config = JoinConfig {
        studies: sheet,
        output_dir: tmp.path().join("out"),
        ..Default::default()
    };
    let bib_config = papertrend_bib::Config {
        input: export,
        dates: DateDefaults::with_reference(NaiveDate::from_ymd_opt(2024, 7, 13).unwrap()),
        ..Default::default()
    };

    let output = papertrend_join::run(&config, &bib_config, &ProgressContext::hidden()).unwrap();
    let rows = output.dataset.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].identifier, Some(1));
    assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2020, 1, 1));
    assert_eq!(rows[1].identifier, Some(3));
    assert_eq!(rows[1].array.as_deref(), Some("450K, EPIC"));
    assert_eq!(rows[1].date, NaiveDate::from_ymd_opt(2018, 7, 14));
}

#[test]
fn missing_sheet_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let config = JoinConfig {
        studies: tmp.path().join("absent.csv"),
        output_dir: tmp.path().to_path_buf(),
        ..Default::default()
    };
    let bib_config = papertrend_bib::Config::default();
    let err = papertrend_join::run(&config, &bib_config, &ProgressContext::hidden()).unwrap_err();
    assert!(format!("{err:#}").contains("absent.csv"));
}
