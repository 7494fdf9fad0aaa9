//! Embedded analytical store holding the raw and aggregated listing tables.
//!
//! `stg_books` is the union of every snapshot row; `fct_prices_by_rating`
//! has one row per observed (rating, date_scraped) pair. Both are rebuilt
//! from scratch on every build.

use crate::error::WarehouseError;
use crate::models::ListingRecord;
use crate::snapshot::{list_snapshots, read_snapshot};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OpenFlags};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const RAW_TABLE: &str = "stg_books";
pub const FACT_TABLE: &str = "fct_prices_by_rating";

/// Row of `stg_books`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StagedBook {
    pub title: String,
    pub product_page: String,
    pub price_gbp: Option<f64>,
    pub availability: Option<i64>,
    pub rating: Option<i64>,
    pub date_scraped: String,
    pub category: String,
}

/// Row of `fct_prices_by_rating`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatingPrice {
    pub rating: i64,
    pub n_books: i64,
    pub avg_price_gbp: Option<f64>,
    pub date_scraped: String,
}

/// Every row read from a snapshot directory, oldest file first
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotRows {
    pub snapshots: usize,
    pub records: Vec<ListingRecord>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BuildReport {
    pub snapshots: usize,
    pub rows: usize,
    pub aggregates: usize,
}

pub struct Warehouse {
    conn: Connection,
    path: PathBuf,
}

impl Warehouse {
    /// Open for writing, creating the file if needed.
    pub fn open(path: &Path) -> Result<Self, WarehouseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| WarehouseError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Open an existing store without write access. Fails if the file is absent.
    pub fn open_read_only(path: &Path) -> Result<Self, WarehouseError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self {
            conn,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rebuild both tables from every snapshot in `snapshot_dir`.
    pub fn rebuild(&mut self, snapshot_dir: &Path) -> Result<BuildReport, WarehouseError> {
        let rows = collect_snapshots(snapshot_dir)?;
        self.rebuild_from(rows)
    }

    /// Rebuild both tables from rows already read off disk.
    pub fn rebuild_from(&mut self, rows: SnapshotRows) -> Result<BuildReport, WarehouseError> {
        let aggregates = self.load(&rows.records)?;
        let report = BuildReport {
            snapshots: rows.snapshots,
            rows: rows.records.len(),
            aggregates,
        };
        info!(
            warehouse = %self.path.display(),
            snapshots = report.snapshots,
            rows = report.rows,
            aggregates = report.aggregates,
            "warehouse rebuilt"
        );
        Ok(report)
    }

    /// True once both the raw and the aggregate table exist.
    pub fn is_populated(&self) -> Result<bool, WarehouseError> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN (?1, ?2)",
            params![RAW_TABLE, FACT_TABLE],
            |row| row.get(0),
        )?;
        Ok(tables == 2)
    }

    /// Replace table contents with `records` and recompute the aggregate.
    /// Returns the number of aggregate rows.
    pub fn load(&mut self, records: &[ListingRecord]) -> Result<usize, WarehouseError> {
        let tx = self.conn.transaction()?;
        tx.execute_batch(&format!(
            r#"
            DROP TABLE IF EXISTS {FACT_TABLE};
            DROP TABLE IF EXISTS {RAW_TABLE};

            CREATE TABLE {RAW_TABLE} (
                title TEXT NOT NULL,
                product_page TEXT NOT NULL,
                price_gbp REAL,
                availability INTEGER,
                rating INTEGER,
                date_scraped TEXT NOT NULL,
                category TEXT NOT NULL
            );
            "#
        ))?;

        {
            let mut insert = tx.prepare(&format!(
                "INSERT INTO {RAW_TABLE}
                    (title, product_page, price_gbp, availability, rating, date_scraped, category)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"
            ))?;
            for r in records {
                insert.execute(params![
                    r.title,
                    r.product_page,
                    r.price_gbp,
                    r.availability,
                    r.rating,
                    date_text(r.date_scraped),
                    r.category,
                ])?;
            }
        }

        tx.execute_batch(&format!(
            r#"
            CREATE TABLE {FACT_TABLE} AS
            SELECT
                rating,
                COUNT(*) AS n_books,
                AVG(price_gbp) AS avg_price_gbp,
                date_scraped
            FROM {RAW_TABLE}
            WHERE rating IS NOT NULL
            GROUP BY rating, date_scraped
            ORDER BY date_scraped, rating;
            "#
        ))?;
        let aggregates: i64 =
            tx.query_row(&format!("SELECT COUNT(*) FROM {FACT_TABLE}"), [], |row| row.get(0))?;
        tx.commit()?;

        Ok(aggregates as usize)
    }

    /// `stg_books` ordered by price, most expensive first
    pub fn staged_books(&self) -> Result<Vec<StagedBook>, WarehouseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT title, product_page, price_gbp, availability, rating, date_scraped, category
             FROM {RAW_TABLE}
             ORDER BY price_gbp DESC NULLS LAST"
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(StagedBook {
                title: row.get(0)?,
                product_page: row.get(1)?,
                price_gbp: row.get(2)?,
                availability: row.get(3)?,
                rating: row.get(4)?,
                date_scraped: row.get(5)?,
                category: row.get(6)?,
            })
        })?;
        let books = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(books)
    }

    pub fn prices_by_rating(&self) -> Result<Vec<RatingPrice>, WarehouseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT rating, n_books, avg_price_gbp, date_scraped
             FROM {FACT_TABLE}
             ORDER BY date_scraped, rating"
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(RatingPrice {
                rating: row.get(0)?,
                n_books: row.get(1)?,
                avg_price_gbp: row.get(2)?,
                date_scraped: row.get(3)?,
            })
        })?;
        let facts = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(facts)
    }
}

/// Read every `books_*.parquet` file in `snapshot_dir`.
pub fn collect_snapshots(snapshot_dir: &Path) -> Result<SnapshotRows, WarehouseError> {
    let snapshots = list_snapshots(snapshot_dir).map_err(|source| WarehouseError::Io {
        path: snapshot_dir.to_path_buf(),
        source,
    })?;

    let mut records = Vec::new();
    for path in &snapshots {
        let batch = read_snapshot(path)?;
        debug!(path = %path.display(), rows = batch.len(), "loading snapshot");
        records.extend(batch);
    }

    Ok(SnapshotRows {
        snapshots: snapshots.len(),
        records,
    })
}

fn date_text(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
