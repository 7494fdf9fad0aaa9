use crate::error::HarvestError;
use crate::models::{ListingRecord, ScrapedListing};
use crate::scrapers::parser::{parse_availability, parse_page, parse_price};
use crate::scrapers::traits::PageFetcher;
use crate::scrapers::types::CrawlParams;
use chrono::NaiveDate;
use tracing::{debug, info};
use url::Url;

/// Everything gathered by following the pagination chain once
#[derive(Debug, Clone)]
pub struct CrawlOutcome {
    pub listings: Vec<ScrapedListing>,
    pub pages: usize,
}

/// Fetch → parse → follow "next" until the catalogue runs out of pages
pub struct Crawler<'a, F: PageFetcher> {
    fetcher: &'a F,
    max_pages: Option<usize>,
}

impl<'a, F: PageFetcher> Crawler<'a, F> {
    pub fn new(fetcher: &'a F, params: &CrawlParams) -> Self {
        Self {
            fetcher,
            max_pages: params.max_pages,
        }
    }

    pub async fn crawl(&self, start_url: &str) -> Result<CrawlOutcome, HarvestError> {
        let start = Url::parse(start_url).map_err(|source| HarvestError::InvalidStartUrl {
            url: start_url.to_string(),
            source,
        })?;
        let mut current = Some(start);
        let mut listings = Vec::new();
        let mut pages = 0;

        while let Some(url) = current {
            if let Some(limit) = self.max_pages {
                if pages >= limit {
                    return Err(HarvestError::PageLimit {
                        limit,
                        next: url.to_string(),
                    });
                }
            }

            let html = self.fetcher.fetch(url.as_str()).await?;
            let page = parse_page(&html, &url)?;
            pages += 1;

            debug!(page = pages, %url, found = page.listings.len(), "page done");
            listings.extend(page.listings);
            current = page.next_page;
        }

        info!(pages, listings = listings.len(), "crawl finished");
        Ok(CrawlOutcome { listings, pages })
    }
}

/// Coerce raw fields and stamp every row with the same capture date and category.
pub fn stamp(listings: Vec<ScrapedListing>, date: NaiveDate, category: &str) -> Vec<ListingRecord> {
    listings
        .into_iter()
        .map(|listing| ListingRecord {
            price_gbp: parse_price(&listing.price_text),
            availability: parse_availability(&listing.availability_text),
            rating: listing.rating.map(|r| r.ordinal()),
            title: listing.title,
            product_page: listing.product_page,
            date_scraped: date,
            category: category.to_string(),
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::models::Rating;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned pages and records every URL it was asked for
    #[derive(Default)]
    pub(crate) struct StaticFetcher {
        pages: HashMap<String, String>,
        pub(crate) visited: Mutex<Vec<String>>,
    }

    impl StaticFetcher {
        pub(crate) fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
            self.pages.insert(url.to_string(), html.into());
            self
        }
    }

    #[async_trait]
    impl PageFetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.visited.lock().unwrap().push(url.to_string());
            self.pages.get(url).cloned().ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: reqwest::StatusCode::NOT_FOUND,
            })
        }
    }

    pub(crate) fn catalogue_page(titles: &[&str], next: Option<&str>) -> String {
        let products: String = titles
            .iter()
            .map(|t| {
                format!(
                    r#"<article class="product_pod">
                         <p class="star-rating Four"></p>
                         <h3><a href="{t}.html" title="{t}">{t}</a></h3>
                         <p class="price_color">£1.00</p>
                         <p class="instock availability">In stock (1 available)</p>
                       </article>"#
                )
            })
            .collect();
        let pager = next
            .map(|n| format!(r#"<li class="next"><a href="{n}">next</a></li>"#))
            .unwrap_or_default();
        format!("<html><body>{products}<ul class=\"pager\">{pager}</ul></body></html>")
    }

    const BASE: &str = "https://books.example/catalogue/science/";

    fn three_page_chain() -> StaticFetcher {
        StaticFetcher::default()
            .with_page(&format!("{BASE}index.html"), catalogue_page(&["a1", "a2"], Some("page-2.html")))
            .with_page(&format!("{BASE}page-2.html"), catalogue_page(&["b1"], Some("page-3.html")))
            .with_page(&format!("{BASE}page-3.html"), catalogue_page(&["c1", "c2"], None))
    }

    #[tokio::test]
    async fn follows_chain_until_no_next_link() {
        let fetcher = three_page_chain();
        let crawler = Crawler::new(&fetcher, &CrawlParams::default());

        let outcome = crawler.crawl(&format!("{BASE}index.html")).await.unwrap();

        assert_eq!(outcome.pages, 3);
        assert_eq!(fetcher.visited.lock().unwrap().len(), 3);
        let titles: Vec<_> = outcome.listings.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["a1", "a2", "b1", "c1", "c2"]);
        assert_eq!(outcome.listings[2].product_page, format!("{BASE}b1.html"));
    }

    #[tokio::test]
    async fn fetch_failure_aborts_crawl() {
        let fetcher = StaticFetcher::default()
            .with_page(&format!("{BASE}index.html"), catalogue_page(&["a1"], Some("missing.html")));
        let crawler = Crawler::new(&fetcher, &CrawlParams::default());

        let err = crawler.crawl(&format!("{BASE}index.html")).await.unwrap_err();

        assert!(matches!(err, HarvestError::Fetch(FetchError::Status { .. })));
    }

    #[tokio::test]
    async fn page_limit_stops_cyclic_pagination() {
        let fetcher = StaticFetcher::default()
            .with_page(&format!("{BASE}index.html"), catalogue_page(&["a1"], Some("page-2.html")))
            .with_page(&format!("{BASE}page-2.html"), catalogue_page(&["b1"], Some("index.html")));
        let params = CrawlParams {
            max_pages: Some(5),
            ..CrawlParams::default()
        };
        let crawler = Crawler::new(&fetcher, &params);

        let err = crawler.crawl(&format!("{BASE}index.html")).await.unwrap_err();

        assert!(matches!(err, HarvestError::PageLimit { limit: 5, .. }));
        assert_eq!(fetcher.visited.lock().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn rejects_relative_start_url() {
        let fetcher = StaticFetcher::default();
        let crawler = Crawler::new(&fetcher, &CrawlParams::default());

        let err = crawler.crawl("index.html").await.unwrap_err();

        assert!(matches!(err, HarvestError::InvalidStartUrl { .. }));
        assert!(fetcher.visited.lock().unwrap().is_empty());
    }

    #[test]
    fn stamp_coerces_and_labels_every_row() {
        let date = NaiveDate::from_ymd_opt(2025, 8, 14).unwrap();
        let listings = vec![
            ScrapedListing {
                title: "A".into(),
                product_page: "https://books.example/a".into(),
                price_text: "£12.30".into(),
                availability_text: "In stock (3 available)".into(),
                rating: Some(Rating::One),
            },
            ScrapedListing {
                title: "B".into(),
                product_page: "https://books.example/b".into(),
                price_text: "£".into(),
                availability_text: "In stock".into(),
                rating: None,
            },
        ];

        let records = stamp(listings, date, "Science");

        assert_eq!(records[0].price_gbp, Some(12.30));
        assert_eq!(records[0].availability, Some(3));
        assert_eq!(records[0].rating, Some(1));
        assert_eq!(records[1].price_gbp, None);
        assert_eq!(records[1].availability, None);
        assert_eq!(records[1].rating, None);
        assert!(records.iter().all(|r| r.date_scraped == date && r.category == "Science"));
    }
}
