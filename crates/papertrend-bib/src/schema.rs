//! Arrow schema of the parsed bibliography

use std::sync::{Arc, LazyLock};

use arrow::datatypes::{DataType, Field, Schema};

/// One row per record that received at least one write, in index order.
pub static BIBLIOGRAPHY: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("identifier", DataType::Int64, true),
        Field::new("author", DataType::Utf8, true),
        Field::new("year", DataType::Utf8, true),
        Field::new("title", DataType::Utf8, true),
        Field::new("journal", DataType::Utf8, true),
        Field::new("abstract", DataType::Utf8, true),
        Field::new("date", DataType::Utf8, true),
        Field::new("short_title", DataType::Utf8, true),
        Field::new("doi", DataType::Utf8, true),
        Field::new("url", DataType::Utf8, true),
        // reconciled YYYY-MM-DD
        Field::new("date2", DataType::Utf8, true),
    ]))
});

pub fn bibliography() -> &'static Schema {
    &BIBLIOGRAPHY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_has_join_columns() {
        let schema = bibliography();
        assert_eq!(
            schema.field_with_name("identifier").unwrap().data_type(),
            &DataType::Int64
        );
        for name in ["date2", "short_title", "abstract", "url"] {
            assert!(schema.field_with_name(name).is_ok(), "{name}");
        }
        assert_eq!(schema.fields().len(), 11);
    }
}
