use crate::scrapers::types::{
    CrawlParams, DEFAULT_CATEGORY, DEFAULT_START_URL, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_OUT_DIR: &str = "data/raw";
pub const DEFAULT_WAREHOUSE: &str = "data/warehouse/books.db";

/// Catalogue harvester: dated Parquet snapshots, warehouse build and dashboard
#[derive(Debug, Parser)]
#[command(name = "books-harvester", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Crawl the catalogue and write one snapshot for today
    Harvest(HarvestArgs),
    /// Rebuild the warehouse tables from every snapshot
    Build(BuildArgs),
    /// Harvest (retried once) and then build
    Pipeline(PipelineArgs),
    /// Print the warehouse views
    Dashboard(DashboardArgs),
}

#[derive(Debug, Clone, Args)]
pub struct CrawlArgs {
    /// First page of the catalogue category
    #[arg(long, env = "BOOKS_START_URL", default_value = DEFAULT_START_URL)]
    pub start_url: String,
    /// Category label stamped on every record
    #[arg(long, env = "BOOKS_CATEGORY", default_value = DEFAULT_CATEGORY)]
    pub category: String,
    #[arg(long, env = "BOOKS_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,
    /// Per-request timeout in seconds
    #[arg(long, env = "BOOKS_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,
    /// Abort if pagination runs past this many pages
    #[arg(long, env = "BOOKS_MAX_PAGES")]
    pub max_pages: Option<usize>,
}

impl From<&CrawlArgs> for CrawlParams {
    fn from(args: &CrawlArgs) -> Self {
        Self {
            start_url: args.start_url.clone(),
            category: args.category.clone(),
            user_agent: args.user_agent.clone(),
            timeout: Duration::from_secs(args.timeout_secs),
            max_pages: args.max_pages,
        }
    }
}

#[derive(Debug, Args)]
pub struct HarvestArgs {
    #[command(flatten)]
    pub crawl: CrawlArgs,
    /// Directory receiving the snapshot files
    #[arg(long, env = "BOOKS_OUT_DIR", default_value = DEFAULT_OUT_DIR)]
    pub out_dir: PathBuf,
    /// Print the run report as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct BuildArgs {
    /// Directory holding the snapshot files
    #[arg(long, env = "BOOKS_OUT_DIR", default_value = DEFAULT_OUT_DIR)]
    pub out_dir: PathBuf,
    #[arg(long, env = "BOOKS_WAREHOUSE", default_value = DEFAULT_WAREHOUSE)]
    pub warehouse: PathBuf,
}

#[derive(Debug, Args)]
pub struct PipelineArgs {
    #[command(flatten)]
    pub crawl: CrawlArgs,
    #[arg(long, env = "BOOKS_OUT_DIR", default_value = DEFAULT_OUT_DIR)]
    pub out_dir: PathBuf,
    #[arg(long, env = "BOOKS_WAREHOUSE", default_value = DEFAULT_WAREHOUSE)]
    pub warehouse: PathBuf,
}

#[derive(Debug, Args)]
pub struct DashboardArgs {
    #[arg(long, env = "BOOKS_WAREHOUSE", default_value = DEFAULT_WAREHOUSE)]
    pub warehouse: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn harvest_defaults() {
        let cli = Cli::try_parse_from(["books-harvester", "harvest"]).unwrap();
        let Command::Harvest(args) = cli.command else {
            panic!("expected harvest");
        };
        let params = CrawlParams::from(&args.crawl);

        assert_eq!(args.out_dir, PathBuf::from(DEFAULT_OUT_DIR));
        assert_eq!(params.timeout, Duration::from_secs(30));
        assert_eq!(params.max_pages, None);
    }

    #[test]
    fn scheduler_style_invocation() {
        let cli = Cli::try_parse_from([
            "books-harvester",
            "harvest",
            "--start-url",
            "https://books.example/index.html",
            "--out-dir",
            "/opt/data/raw",
            "--max-pages",
            "50",
        ])
        .unwrap();
        let Command::Harvest(args) = cli.command else {
            panic!("expected harvest");
        };

        assert_eq!(args.crawl.start_url, "https://books.example/index.html");
        assert_eq!(args.out_dir, PathBuf::from("/opt/data/raw"));
        assert_eq!(args.crawl.max_pages, Some(50));
    }
}
