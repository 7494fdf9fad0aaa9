use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Star rating vocabulary used by the catalogue's `star-rating` class
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rating {
    One,
    Two,
    Three,
    Four,
    Five,
}

impl Rating {
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "One" => Some(Self::One),
            "Two" => Some(Self::Two),
            "Three" => Some(Self::Three),
            "Four" => Some(Self::Four),
            "Five" => Some(Self::Five),
            _ => None,
        }
    }

    /// First vocabulary label found in class order; other labels are ignored.
    pub fn from_classes<'a, I>(classes: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        classes.into_iter().find_map(Self::from_label)
    }

    pub fn ordinal(self) -> i64 {
        match self {
            Self::One => 1,
            Self::Two => 2,
            Self::Three => 3,
            Self::Four => 4,
            Self::Five => 5,
        }
    }
}

/// A listing as it appears on a catalogue page, before coercion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScrapedListing {
    pub title: String,
    pub product_page: String,
    pub price_text: String,
    pub availability_text: String,
    pub rating: Option<Rating>,
}

/// One row of a snapshot
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingRecord {
    pub title: String,
    pub product_page: String,
    pub price_gbp: Option<f64>,
    pub availability: Option<i64>,
    pub rating: Option<i64>,
    pub date_scraped: NaiveDate,
    pub category: String,
}
