//! Extraction of listings and the pagination link from a catalogue page.
//!
//! Every `article.product_pod` must carry a title link, a price, an
//! availability line and a `star-rating` paragraph. A container missing any of
//! them aborts the page with [`ParseError::MissingField`].

use crate::error::ParseError;
use crate::models::{Rating, ScrapedListing};
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

lazy_static! {
    static ref PRODUCT: Selector = selector("article.product_pod");
    static ref TITLE_LINK: Selector = selector("h3 a");
    static ref PRICE: Selector = selector("p.price_color");
    static ref AVAILABILITY: Selector = selector("p.instock.availability");
    static ref STAR_RATING: Selector = selector("p.star-rating");
    static ref NEXT_LINK: Selector = selector("li.next a");
    static ref DIGITS: Regex = Regex::new(r"[0-9]+").expect("digit pattern is valid");
}

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("catalogue selectors are valid CSS")
}

/// Listings found on one page plus the absolute URL of the following page
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedPage {
    pub listings: Vec<ScrapedListing>,
    pub next_page: Option<Url>,
}

pub fn parse_page(html: &str, page_url: &Url) -> Result<ParsedPage, ParseError> {
    let document = Html::parse_document(html);

    let listings = document
        .select(&PRODUCT)
        .enumerate()
        .map(|(index, article)| parse_listing(article, index, page_url))
        .collect::<Result<Vec<_>, _>>()?;

    let next_page = match document.select(&NEXT_LINK).next() {
        Some(link) => {
            let href = link.value().attr("href").ok_or_else(|| ParseError::MissingField {
                page: page_url.to_string(),
                index: listings.len(),
                field: "next link",
            })?;
            Some(resolve(page_url, href)?)
        }
        None => None,
    };

    debug!(page = %page_url, listings = listings.len(), has_next = next_page.is_some(), "parsed page");

    Ok(ParsedPage { listings, next_page })
}

fn parse_listing(
    article: ElementRef<'_>,
    index: usize,
    page_url: &Url,
) -> Result<ScrapedListing, ParseError> {
    let missing = |field| ParseError::MissingField {
        page: page_url.to_string(),
        index,
        field,
    };

    let link = article.select(&TITLE_LINK).next().ok_or_else(|| missing("title link"))?;
    let title = link.value().attr("title").ok_or_else(|| missing("title"))?;
    let href = link.value().attr("href").ok_or_else(|| missing("product link"))?;

    let price_text = article
        .select(&PRICE)
        .next()
        .ok_or_else(|| missing("price"))?
        .text()
        .collect::<String>();

    let availability_text = article
        .select(&AVAILABILITY)
        .next()
        .ok_or_else(|| missing("availability"))?
        .text()
        .collect::<String>()
        .trim()
        .to_string();

    let rating = article
        .select(&STAR_RATING)
        .next()
        .ok_or_else(|| missing("star rating"))?
        .value()
        .classes();

    Ok(ScrapedListing {
        title: title.to_string(),
        product_page: resolve(page_url, href)?.to_string(),
        price_text,
        availability_text,
        rating: Rating::from_classes(rating),
    })
}

/// Resolve `href` relative to the page it appeared on.
fn resolve(page_url: &Url, href: &str) -> Result<Url, ParseError> {
    page_url.join(href).map_err(|source| ParseError::InvalidLink {
        page: page_url.to_string(),
        href: href.to_string(),
        source,
    })
}

/// Keep digits and decimal points, then parse. Empty leftovers are missing.
pub fn parse_price(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    match cleaned.parse::<f64>() {
        Ok(price) => Some(price),
        Err(e) => {
            warn!(field = "price_gbp", raw = %text, error = %e, "coercion failed, storing missing");
            None
        }
    }
}

/// First run of digits anywhere in the text, e.g. `In stock (22 available)`.
pub fn parse_availability(text: &str) -> Option<i64> {
    let digits = DIGITS.find(text)?;
    match digits.as_str().parse::<i64>() {
        Ok(count) => Some(count),
        Err(e) => {
            warn!(field = "availability", raw = %text, error = %e, "coercion failed, storing missing");
            None
        }
    }
}
