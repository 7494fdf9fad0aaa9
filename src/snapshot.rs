//! Parquet snapshot files, one per harvest run, named by capture date.

use crate::error::SnapshotError;
use crate::models::ListingRecord;
use arrow_array::{Array, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema, SchemaRef};
use chrono::NaiveDate;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

pub const SNAPSHOT_PREFIX: &str = "books_";
pub const SNAPSHOT_EXTENSION: &str = "parquet";

pub fn snapshot_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("title", DataType::Utf8, false),
        Field::new("product_page", DataType::Utf8, false),
        Field::new("price_gbp", DataType::Float64, true),
        Field::new("availability", DataType::Int64, true),
        Field::new("rating", DataType::Int64, true),
        Field::new("date_scraped", DataType::Utf8, false),
        Field::new("category", DataType::Utf8, false),
    ]))
}

/// `books_2025-08-14.parquet`
pub fn snapshot_file_name(date: NaiveDate) -> String {
    format!("{SNAPSHOT_PREFIX}{}.{SNAPSHOT_EXTENSION}", date.format("%Y-%m-%d"))
}

/// Write one run's batch into `out_dir`, replacing any snapshot of the same date.
///
/// The file is written next to its final name and renamed into place, so a
/// crash mid-write leaves a stray `.partial` file instead of a truncated
/// snapshot.
pub fn write_snapshot(
    out_dir: &Path,
    date: NaiveDate,
    records: &[ListingRecord],
) -> Result<PathBuf, SnapshotError> {
    fs::create_dir_all(out_dir).map_err(|source| SnapshotError::Io {
        path: out_dir.to_path_buf(),
        source,
    })?;

    let path = out_dir.join(snapshot_file_name(date));
    let partial = path.with_extension(format!("{SNAPSHOT_EXTENSION}.partial"));

    let batch = to_record_batch(records)?;
    write_parquet(&partial, &batch)?;
    fs::rename(&partial, &path).map_err(|source| SnapshotError::Io {
        path: path.clone(),
        source,
    })?;

    info!(path = %path.display(), rows = records.len(), "wrote snapshot");
    Ok(path)
}

fn to_record_batch(records: &[ListingRecord]) -> Result<RecordBatch, SnapshotError> {
    let titles = StringArray::from_iter_values(records.iter().map(|r| r.title.as_str()));
    let pages = StringArray::from_iter_values(records.iter().map(|r| r.product_page.as_str()));
    let prices = Float64Array::from(records.iter().map(|r| r.price_gbp).collect::<Vec<_>>());
    let availability = Int64Array::from(records.iter().map(|r| r.availability).collect::<Vec<_>>());
    let ratings = Int64Array::from(records.iter().map(|r| r.rating).collect::<Vec<_>>());
    let dates = StringArray::from_iter_values(
        records
            .iter()
            .map(|r| r.date_scraped.format("%Y-%m-%d").to_string()),
    );
    let categories = StringArray::from_iter_values(records.iter().map(|r| r.category.as_str()));

    let batch = RecordBatch::try_new(
        snapshot_schema(),
        vec![
            Arc::new(titles),
            Arc::new(pages),
            Arc::new(prices),
            Arc::new(availability),
            Arc::new(ratings),
            Arc::new(dates),
            Arc::new(categories),
        ],
    )?;
    Ok(batch)
}

fn write_parquet(path: &Path, batch: &RecordBatch) -> Result<(), SnapshotError> {
    let file = File::create(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

/// Read a snapshot file back into records.
pub fn read_snapshot(path: &Path) -> Result<Vec<ListingRecord>, SnapshotError> {
    let file = File::open(path).map_err(|source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;

    let mut records = Vec::new();
    for batch in reader {
        let batch = batch?;
        let columns = SnapshotColumns::from_batch(path, &batch)?;
        for row in 0..batch.num_rows() {
            records.push(columns.record(path, row)?);
        }
    }

    debug!(path = %path.display(), rows = records.len(), "read snapshot");
    Ok(records)
}

/// Snapshot files in `dir`, sorted by name (and therefore by capture date).
pub fn list_snapshots(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_snapshot = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(SNAPSHOT_PREFIX))
            && path.extension().and_then(|e| e.to_str()) == Some(SNAPSHOT_EXTENSION);
        if is_snapshot && path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

struct SnapshotColumns<'a> {
    title: &'a StringArray,
    product_page: &'a StringArray,
    price_gbp: &'a Float64Array,
    availability: &'a Int64Array,
    rating: &'a Int64Array,
    date_scraped: &'a StringArray,
    category: &'a StringArray,
}

impl<'a> SnapshotColumns<'a> {
    fn from_batch(path: &Path, batch: &'a RecordBatch) -> Result<Self, SnapshotError> {
        Ok(Self {
            title: column(path, batch, "title")?,
            product_page: column(path, batch, "product_page")?,
            price_gbp: column(path, batch, "price_gbp")?,
            availability: column(path, batch, "availability")?,
            rating: column(path, batch, "rating")?,
            date_scraped: column(path, batch, "date_scraped")?,
            category: column(path, batch, "category")?,
        })
    }

    fn record(&self, path: &Path, row: usize) -> Result<ListingRecord, SnapshotError> {
        let raw_date = self.date_scraped.value(row);
        let date_scraped = NaiveDate::parse_from_str(raw_date, "%Y-%m-%d").map_err(|e| {
            SnapshotError::Schema {
                path: path.to_path_buf(),
                column: "date_scraped",
                message: format!("{raw_date:?}: {e}"),
            }
        })?;

        Ok(ListingRecord {
            title: self.title.value(row).to_string(),
            product_page: self.product_page.value(row).to_string(),
            price_gbp: nullable(self.price_gbp, row),
            availability: nullable(self.availability, row),
            rating: nullable(self.rating, row),
            date_scraped,
            category: self.category.value(row).to_string(),
        })
    }
}

fn column<'a, T: Array + 'static>(
    path: &Path,
    batch: &'a RecordBatch,
    name: &'static str,
) -> Result<&'a T, SnapshotError> {
    let schema_err = |message: String| SnapshotError::Schema {
        path: path.to_path_buf(),
        column: name,
        message,
    };
    batch
        .column_by_name(name)
        .ok_or_else(|| schema_err("column is missing".to_string()))?
        .as_any()
        .downcast_ref::<T>()
        .ok_or_else(|| schema_err("unexpected column type".to_string()))
}

fn nullable<T>(array: &arrow_array::PrimitiveArray<T>, row: usize) -> Option<T::Native>
where
    T: arrow_array::ArrowPrimitiveType,
{
    array.is_valid(row).then(|| array.value(row))
}
