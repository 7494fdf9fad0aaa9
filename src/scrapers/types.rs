use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_START_URL: &str =
    "https://books.toscrape.com/catalogue/category/books/science_22/index.html";
pub const DEFAULT_CATEGORY: &str = "Science";
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (compatible; BooksHarvester/0.1; +https://books.toscrape.com)";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Parameters for one catalogue crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlParams {
    /// First catalogue page of the category
    pub start_url: String,
    /// Label stamped on every record of the run
    pub category: String,
    /// User-Agent sent with every request
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Abort when the crawl would visit more pages than this
    pub max_pages: Option<usize>,
}

impl Default for CrawlParams {
    fn default() -> Self {
        Self {
            start_url: DEFAULT_START_URL.to_string(),
            category: DEFAULT_CATEGORY.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_pages: None,
        }
    }
}
