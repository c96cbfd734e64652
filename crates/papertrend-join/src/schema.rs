//! Arrow schemas of the staged study table and the merged dataset

use std::sync::{Arc, LazyLock};

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

use crate::studies::StudyRecord;

/// Included study rows, raw text apart from the identifier.
pub static STUDIES: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("sheet_row", DataType::Int64, false),
        Field::new("identifier", DataType::Int64, true),
        Field::new("include", DataType::Utf8, true),
        Field::new("title", DataType::Utf8, true),
        Field::new("phenotype", DataType::Utf8, true),
        Field::new("category", DataType::Utf8, true),
        Field::new("sample_size", DataType::Utf8, true),
        Field::new("array", DataType::Utf8, true),
        Field::new("multiple_array", DataType::Utf8, true),
    ]))
});

/// `dataset.parquet` as written by the merge.
pub static DATASET: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("sheet_row", DataType::Int64, true),
        Field::new("identifier", DataType::Int64, true),
        Field::new("include", DataType::Utf8, true),
        Field::new("title", DataType::Utf8, true),
        Field::new("phenotype", DataType::Utf8, true),
        Field::new("category", DataType::Utf8, true),
        Field::new("sample_size", DataType::Float64, true),
        Field::new("array", DataType::Utf8, true),
        Field::new("multiple_array", DataType::Utf8, true),
        Field::new("date2", DataType::Utf8, true),
        Field::new("date", DataType::Date32, true),
        Field::new("short_title", DataType::Utf8, true),
        Field::new("abstract", DataType::Utf8, true),
        Field::new("url", DataType::Utf8, true),
    ]))
});

pub fn studies() -> &'static Schema {
    &STUDIES
}

pub fn dataset() -> &'static Schema {
    &DATASET
}

fn text_column(rows: &[StudyRecord], f: impl Fn(&StudyRecord) -> Option<String>) -> ArrayRef {
    Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
}

/// Study rows as one batch.
pub fn studies_batch(rows: &[StudyRecord]) -> Result<RecordBatch, ArrowError> {
    let arrays: Vec<ArrayRef> = vec![
        Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.sheet_row))),
        Arc::new(Int64Array::from_iter(rows.iter().map(|r| r.identifier))),
        text_column(rows, |r| r.include.clone()),
        text_column(rows, |r| r.title.clone()),
        text_column(rows, |r| r.phenotype.clone()),
        text_column(rows, |r| r.category.clone()),
        text_column(rows, |r| r.sample_size.clone()),
        text_column(rows, |r| r.array.clone()),
        text_column(rows, |r| r.multiple_array.clone()),
    ];
    RecordBatch::try_new(STUDIES.clone(), arrays)
}
