use anyhow::Context;
use books_harvester::config::{Cli, Command};
use books_harvester::dashboard::{render_dashboard, DashboardStatus};
use books_harvester::pipeline::{build, harvest, run_pipeline};
use books_harvester::scrapers::{CrawlParams, HttpFetcher};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Harvest(args) => {
            let params = CrawlParams::from(&args.crawl);
            let fetcher = HttpFetcher::new(&params)?;
            let report = harvest(&fetcher, &params, &args.out_dir)
                .await
                .context("Harvest failed")?;
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        Command::Build(args) => {
            build(&args.out_dir, &args.warehouse)?;
        }
        Command::Pipeline(args) => {
            let params = CrawlParams::from(&args.crawl);
            let fetcher = HttpFetcher::new(&params)?;
            let (harvested, built) =
                run_pipeline(&fetcher, &params, &args.out_dir, &args.warehouse).await?;
            info!(
                snapshot = %harvested.snapshot.display(),
                rows = harvested.rows,
                warehouse_rows = built.rows,
                "pipeline complete"
            );
        }
        Command::Dashboard(args) => {
            let mut stdout = std::io::stdout().lock();
            if render_dashboard(&args.warehouse, &mut stdout)? == DashboardStatus::NotPopulated {
                info!(warehouse = %args.warehouse.display(), "warehouse not populated yet");
            }
        }
    }

    Ok(())
}
