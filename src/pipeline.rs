use crate::error::HarvestError;
use crate::scrapers::crawler::{stamp, Crawler};
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::CrawlParams;
use crate::snapshot::write_snapshot;
use crate::warehouse::{collect_snapshots, BuildReport, Warehouse};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Outcome of one successful harvest run
#[derive(Debug, Clone, Serialize)]
pub struct HarvestReport {
    pub snapshot: PathBuf,
    pub date_scraped: NaiveDate,
    pub rows: usize,
    pub pages: usize,
}

/// Crawl the catalogue and persist the run as one dated snapshot.
///
/// Nothing is written unless every page was fetched and parsed.
pub async fn harvest<F: PageFetcher>(
    fetcher: &F,
    params: &CrawlParams,
    out_dir: &Path,
) -> Result<HarvestReport, HarvestError> {
    info!(start_url = %params.start_url, category = %params.category, "starting harvest");

    let outcome = Crawler::new(fetcher, params).crawl(&params.start_url).await?;
    let date_scraped = Local::now().date_naive();
    let records = stamp(outcome.listings, date_scraped, &params.category);
    let snapshot = write_snapshot(out_dir, date_scraped, &records)?;

    info!(
        snapshot = %snapshot.display(),
        rows = records.len(),
        pages = outcome.pages,
        "harvest complete"
    );
    Ok(HarvestReport {
        snapshot,
        date_scraped,
        rows: records.len(),
        pages: outcome.pages,
    })
}

/// Rebuild the warehouse from every snapshot in `snapshot_dir`.
///
/// Snapshots are read before the store is opened, so an unreadable snapshot
/// directory leaves no store file behind.
pub fn build(snapshot_dir: &Path, warehouse: &Path) -> Result<BuildReport> {
    let rows = collect_snapshots(snapshot_dir)
        .with_context(|| format!("Failed to read snapshots from {}", snapshot_dir.display()))?;
    let mut store = Warehouse::open(warehouse)
        .with_context(|| format!("Failed to open warehouse {}", warehouse.display()))?;
    let report = store
        .rebuild_from(rows)
        .with_context(|| format!("Failed to build warehouse from {}", snapshot_dir.display()))?;
    Ok(report)
}

/// Harvest, retrying once on failure, then build the warehouse once.
pub async fn run_pipeline<F: PageFetcher>(
    fetcher: &F,
    params: &CrawlParams,
    out_dir: &Path,
    warehouse: &Path,
) -> Result<(HarvestReport, BuildReport)> {
    let harvested = match harvest(fetcher, params, out_dir).await {
        Ok(report) => report,
        Err(e) => {
            warn!(error = %e, "harvest failed, retrying once");
            harvest(fetcher, params, out_dir)
                .await
                .context("Harvest failed twice")?
        }
    };

    let built = build(out_dir, warehouse)?;
    Ok((harvested, built))
}
