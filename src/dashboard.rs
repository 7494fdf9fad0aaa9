//! Read-only terminal views over the warehouse.

use crate::warehouse::{RatingPrice, StagedBook, Warehouse};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tracing::info;

const BAR_WIDTH: usize = 40;
const TITLE_WIDTH: usize = 48;
const TOP_N: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardStatus {
    /// Store file or its tables absent; only the notice was printed
    NotPopulated,
    Rendered { listings: usize, aggregates: usize },
}

pub fn render_dashboard<W: Write>(store: &Path, out: &mut W) -> Result<DashboardStatus> {
    if !store.is_file() {
        return not_populated(store, out);
    }

    let warehouse = Warehouse::open_read_only(store)
        .with_context(|| format!("Failed to open warehouse {}", store.display()))?;
    if !warehouse
        .is_populated()
        .context("Failed to inspect warehouse tables")?
    {
        return not_populated(store, out);
    }
    let books = warehouse.staged_books().context("Failed to query staged books")?;
    let facts = warehouse
        .prices_by_rating()
        .context("Failed to query price aggregates")?;
    info!(warehouse = %warehouse.path().display(), listings = books.len(), aggregates = facts.len(), "rendering dashboard");

    writeln!(out, "📚 Catalogue listings")?;
    writeln!(out, "=====================")?;
    writeln!(out)?;

    writeln!(out, "Raw ({} rows, most expensive first)", books.len())?;
    write_books(out, &books)?;
    writeln!(out)?;

    writeln!(out, "Listings per rating")?;
    write_rating_bars(out, &facts)?;
    writeln!(out)?;

    writeln!(out, "Average price (GBP) per rating over time")?;
    write_price_history(out, &facts)?;
    writeln!(out)?;

    writeln!(out, "Top {TOP_N} most expensive")?;
    write_books(out, &books[..books.len().min(TOP_N)])?;

    Ok(DashboardStatus::Rendered {
        listings: books.len(),
        aggregates: facts.len(),
    })
}

fn not_populated<W: Write>(store: &Path, out: &mut W) -> Result<DashboardStatus> {
    writeln!(
        out,
        "⚠️  Warehouse not found yet at {}. Run `books-harvester pipeline` (or `harvest` then `build`) to populate it.",
        store.display()
    )?;
    Ok(DashboardStatus::NotPopulated)
}

fn write_books<W: Write>(out: &mut W, books: &[StagedBook]) -> Result<()> {
    let rows: Vec<Vec<String>> = books
        .iter()
        .map(|b| {
            vec![
                truncate(&b.title, TITLE_WIDTH),
                b.price_gbp.map(|p| format!("{p:.2}")).unwrap_or_default(),
                opt(b.rating),
                opt(b.availability),
                b.date_scraped.clone(),
                b.product_page.clone(),
            ]
        })
        .collect();
    write_table(
        out,
        &["title", "price_gbp", "rating", "availability", "date_scraped", "product_page"],
        &rows,
    )
}

fn write_rating_bars<W: Write>(out: &mut W, facts: &[RatingPrice]) -> Result<()> {
    let mut counts: BTreeMap<i64, i64> = BTreeMap::new();
    for f in facts {
        *counts.entry(f.rating).or_default() += f.n_books;
    }
    let max = counts.values().copied().max().unwrap_or(0);
    if max == 0 {
        writeln!(out, "  (no rated listings)")?;
        return Ok(());
    }
    for (rating, count) in &counts {
        let len = (*count as usize * BAR_WIDTH).div_ceil(max as usize);
        writeln!(out, "  {rating} ★ | {} {count}", "█".repeat(len))?;
    }
    Ok(())
}

fn write_price_history<W: Write>(out: &mut W, facts: &[RatingPrice]) -> Result<()> {
    let ratings: Vec<i64> = facts
        .iter()
        .map(|f| f.rating)
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    let mut by_date: BTreeMap<&str, BTreeMap<i64, Option<f64>>> = BTreeMap::new();
    for f in facts {
        by_date
            .entry(f.date_scraped.as_str())
            .or_default()
            .insert(f.rating, f.avg_price_gbp);
    }

    let mut headers = vec!["date_scraped".to_string()];
    headers.extend(ratings.iter().map(|r| format!("{r} ★")));
    let rows: Vec<Vec<String>> = by_date
        .iter()
        .map(|(date, avgs)| {
            let mut row = vec![date.to_string()];
            row.extend(ratings.iter().map(|r| {
                avgs.get(r)
                    .copied()
                    .flatten()
                    .map(|p| format!("{p:.2}"))
                    .unwrap_or_else(|| "-".to_string())
            }));
            row
        })
        .collect();

    let headers: Vec<&str> = headers.iter().map(String::as_str).collect();
    write_table(out, &headers, &rows)
}

fn write_table<W: Write>(out: &mut W, headers: &[&str], rows: &[Vec<String>]) -> Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join(" | ")
            .trim_end()
            .to_string()
    };

    writeln!(out, "  {}", line(headers.to_vec()))?;
    writeln!(
        out,
        "  {}",
        widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("-+-")
    )?;
    for row in rows {
        writeln!(out, "  {}", line(row.iter().map(String::as_str).collect()))?;
    }
    if rows.is_empty() {
        writeln!(out, "  (empty)")?;
    }
    Ok(())
}

fn opt(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let mut short: String = text.chars().take(max.saturating_sub(1)).collect();
        short.push('…');
        short
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ListingRecord;
    use chrono::NaiveDate;

    fn populated_store(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("books.db");
        let day = NaiveDate::from_ymd_opt(2025, 8, 14).unwrap();
        let records: Vec<ListingRecord> = (1..=12)
            .map(|i| ListingRecord {
                title: format!("Book {i:02}"),
                product_page: format!("https://books.example/{i}"),
                price_gbp: Some(i as f64),
                availability: Some(i),
                rating: Some((i % 5) + 1),
                date_scraped: day,
                category: "Science".into(),
            })
            .collect();
        Warehouse::open(&path).unwrap().load(&records).unwrap();
        path
    }

    #[test]
    fn missing_store_prints_notice_without_touching_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let store = tmp.path().join("warehouse").join("books.db");
        let mut out = Vec::new();

        let status = render_dashboard(&store, &mut out).unwrap();

        assert_eq!(status, DashboardStatus::NotPopulated);
        assert!(String::from_utf8(out).unwrap().contains("Warehouse not found"));
        assert!(!store.exists());
        assert!(!store.parent().unwrap().exists());
    }

    #[test]
    fn store_without_tables_prints_notice() {
        let tmp = tempfile::tempdir().unwrap();
        let store = tmp.path().join("books.db");
        Warehouse::open(&store).unwrap();
        let mut out = Vec::new();

        let status = render_dashboard(&store, &mut out).unwrap();

        assert_eq!(status, DashboardStatus::NotPopulated);
        assert!(String::from_utf8(out).unwrap().contains("Warehouse not found"));
    }

    #[test]
    fn renders_all_views() {
        let tmp = tempfile::tempdir().unwrap();
        let store = populated_store(tmp.path());
        let mut out = Vec::new();

        let status = render_dashboard(&store, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            status,
            DashboardStatus::Rendered {
                listings: 12,
                aggregates: 5
            }
        );
        assert!(text.contains("Listings per rating"));
        assert!(text.contains("Average price (GBP) per rating over time"));
        assert!(text.contains("2025-08-14"));
        let top = text.split("Top 10 most expensive").nth(1).unwrap();
        assert!(top.contains("Book 12"));
        assert!(top.contains("Book 03"));
        assert!(!top.contains("Book 02"));
    }

    #[test]
    fn truncates_long_titles() {
        assert_eq!(truncate("abcdef", 4), "abc…");
        assert_eq!(truncate("abc", 4), "abc");
    }
}
