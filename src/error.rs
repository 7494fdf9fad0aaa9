use std::path::PathBuf;

/// Network or HTTP failure while downloading a catalogue page.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
}

/// The page does not have the structure the parser relies on.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("{page}: listing #{index} has no {field}")]
    MissingField {
        page: String,
        index: usize,
        field: &'static str,
    },

    #[error("{page}: cannot resolve link {href:?}: {source}")]
    InvalidLink {
        page: String,
        href: String,
        #[source]
        source: url::ParseError,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Arrow(#[from] arrow_schema::ArrowError),

    #[error(transparent)]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("snapshot {path} has unexpected column {column}: {message}")]
    Schema {
        path: PathBuf,
        column: &'static str,
        message: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("invalid start url {url:?}: {source}")]
    InvalidStartUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("crawl exceeded the limit of {limit} pages (next: {next})")]
    PageLimit { limit: usize, next: String },
}

#[derive(Debug, thiserror::Error)]
pub enum WarehouseError {
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error("cannot read snapshot directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
