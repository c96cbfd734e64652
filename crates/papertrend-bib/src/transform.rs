//! RecordBuffer → Arrow RecordBatch

use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;

use crate::record::{BibRecord, RecordBuffer};
use crate::schema;

/// Column builder for [`schema::BIBLIOGRAPHY`].
#[derive(Debug, Default)]
pub struct BibAccumulator {
    identifier: Vec<Option<i64>>,
    author: Vec<Option<String>>,
    year: Vec<Option<String>>,
    title: Vec<Option<String>>,
    journal: Vec<Option<String>>,
    abstract_text: Vec<Option<String>>,
    date: Vec<Option<String>>,
    short_title: Vec<Option<String>>,
    doi: Vec<Option<String>>,
    url: Vec<Option<String>>,
    date2: Vec<Option<String>>,
}

impl BibAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: &BibRecord) {
        self.identifier.push(record.identifier);
        self.author.push(record.author.clone());
        self.year.push(record.year.clone());
        self.title.push(record.title.clone());
        self.journal.push(record.journal.clone());
        self.abstract_text.push(record.abstract_text.clone());
        self.date.push(record.date.clone());
        self.short_title.push(record.short_title.clone());
        self.doi.push(record.doi.clone());
        self.url.push(record.url.clone());
        self.date2.push(record.date2.clone());
    }

    pub fn len(&self) -> usize {
        self.identifier.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identifier.is_empty()
    }

    /// Drain accumulated rows into a batch.
    pub fn take_batch(&mut self) -> Result<RecordBatch, ArrowError> {
        let arrays: Vec<ArrayRef> = vec![
            Arc::new(Int64Array::from(std::mem::take(&mut self.identifier))),
            Arc::new(StringArray::from(std::mem::take(&mut self.author))),
            Arc::new(StringArray::from(std::mem::take(&mut self.year))),
            Arc::new(StringArray::from(std::mem::take(&mut self.title))),
            Arc::new(StringArray::from(std::mem::take(&mut self.journal))),
            Arc::new(StringArray::from(std::mem::take(&mut self.abstract_text))),
            Arc::new(StringArray::from(std::mem::take(&mut self.date))),
            Arc::new(StringArray::from(std::mem::take(&mut self.short_title))),
            Arc::new(StringArray::from(std::mem::take(&mut self.doi))),
            Arc::new(StringArray::from(std::mem::take(&mut self.url))),
            Arc::new(StringArray::from(std::mem::take(&mut self.date2))),
        ];
        RecordBatch::try_new(schema::BIBLIOGRAPHY.clone(), arrays)
    }
}

/// Whole buffer as one batch, rows in index order.
pub fn to_record_batch(buffer: &RecordBuffer) -> Result<RecordBatch, ArrowError> {
    let mut acc = BibAccumulator::new();
    for (_, record) in buffer.iter() {
        acc.push(record);
    }
    acc.take_batch()
}

#[cfg(test)]
mod tests {
    use arrow::array::Array;

    use super::*;
    use crate::parser::parse_bibliography;

    #[test]
    fn batch_follows_schema_and_order() {
        let mut buffer = parse_bibliography([
            "Record Number: 3",
            "Title: Third",
            "Record Number: 1",
            "Title: First",
            "URL: https://example.org",
        ]);
        buffer.records_mut().for_each(|r| r.date2 = Some("2020-01-01".into()));

        let batch = to_record_batch(&buffer).unwrap();
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.schema().as_ref(), schema::bibliography());

        let ids = batch
            .column_by_name("identifier")
            .unwrap()
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(ids.value(0), 1);
        assert_eq!(ids.value(1), 3);

        let urls = batch
            .column_by_name("url")
            .unwrap()
            .as_any()
            .downcast_ref::<StringArray>()
            .unwrap();
        assert_eq!(urls.value(0), "https://example.org");
        assert!(urls.is_null(1));
    }

    #[test]
    fn take_batch_drains() {
        let mut acc = BibAccumulator::new();
        acc.push(&BibRecord::default());
        assert_eq!(acc.len(), 1);
        let batch = acc.take_batch().unwrap();
        assert_eq!(batch.num_rows(), 1);
        assert!(acc.is_empty());
    }

    #[test]
    fn empty_buffer_gives_empty_batch() {
        let batch = to_record_batch(&RecordBuffer::new()).unwrap();
        assert_eq!(batch.num_rows(), 0);
        assert_eq!(batch.num_columns(), 11);
    }
}
