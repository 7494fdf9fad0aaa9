pub mod config;
pub mod dashboard;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod scrapers;
pub mod snapshot;
pub mod warehouse;
