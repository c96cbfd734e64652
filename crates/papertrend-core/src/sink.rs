//! Parquet output: zstd-compressed tables written via tmp file + rename

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::RecordBatch;
use arrow::datatypes::Schema;
use parquet::arrow::ArrowWriter;
use parquet::basic::{Compression, ZstdLevel};
use parquet::file::properties::WriterProperties;

/// Parquet writer for one named table (`<dir>/<table>.parquet`).
///
/// Rows go to `<table>.parquet.tmp` until [`ParquetSink::finalize`] renames
/// it, so a crashed run never leaves a truncated file under the final name.
pub struct ParquetSink {
    writer: ArrowWriter<File>,
    tmp_path: PathBuf,
    final_path: PathBuf,
    row_count: usize,
}

impl std::fmt::Debug for ParquetSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParquetSink")
            .field("final_path", &self.final_path)
            .field("row_count", &self.row_count)
            .finish_non_exhaustive()
    }
}

impl ParquetSink {
    pub fn new(
        table: &str,
        output_dir: &Path,
        schema: &Schema,
        zstd_level: i32,
    ) -> Result<Self, std::io::Error> {
        let final_path = output_dir.join(format!("{table}.parquet"));
        let tmp_path = output_dir.join(format!("{table}.parquet.tmp"));

        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }

        let file = File::create(&tmp_path)?;
        let level = ZstdLevel::try_new(zstd_level)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
        let props = WriterProperties::builder()
            .set_compression(Compression::ZSTD(level))
            .build();

        let writer = ArrowWriter::try_new(file, Arc::new(schema.clone()), Some(props))
            .map_err(std::io::Error::other)?;

        Ok(Self {
            writer,
            tmp_path,
            final_path,
            row_count: 0,
        })
    }

    pub fn write_batch(&mut self, batch: &RecordBatch) -> Result<(), std::io::Error> {
        self.row_count += batch.num_rows();
        self.writer.write(batch).map_err(std::io::Error::other)
    }

    /// Flush the footer and move the file into place. Returns rows written.
    pub fn finalize(self) -> Result<usize, std::io::Error> {
        let row_count = self.row_count;
        self.writer.close().map_err(std::io::Error::other)?;
        fs::rename(&self.tmp_path, &self.final_path)?;
        Ok(row_count)
    }

    pub fn path(&self) -> &Path {
        &self.final_path
    }
}

/// Write a single batch as `<dir>/<table>.parquet` and return its path.
pub fn write_table(
    table: &str,
    output_dir: &Path,
    batch: &RecordBatch,
    zstd_level: i32,
) -> Result<PathBuf, std::io::Error> {
    let mut sink = ParquetSink::new(table, output_dir, &batch.schema(), zstd_level)?;
    let path = sink.path().to_path_buf();
    sink.write_batch(batch)?;
    let rows = sink.finalize()?;
    log::debug!("Wrote {rows} rows to {}", path.display());
    Ok(path)
}

/// Check if a completed parquet file exists and has a valid footer
pub fn is_valid_parquet(path: &Path) -> bool {
    File::open(path)
        .ok()
        .is_some_and(|f| parquet::file::reader::SerializedFileReader::new(f).is_ok())
}

/// Remove stale .tmp files left by an interrupted run
pub fn cleanup_tmp_files(output_dir: &Path) -> std::io::Result<()> {
    for entry in fs::read_dir(output_dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "tmp") {
            log::warn!("Removing stale tmp file: {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}
