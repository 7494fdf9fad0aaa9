pub mod crawler;
pub mod fetcher;
pub mod parser;
pub mod traits;
pub mod types;

pub use crawler::{stamp, CrawlOutcome, Crawler};
pub use fetcher::HttpFetcher;
pub use parser::{parse_availability, parse_page, parse_price, ParsedPage};
pub use traits::PageFetcher;
pub use types::CrawlParams;
