use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use leaderboard_scraping::{
    api::ForumClient,
    config::ConfigArgs,
    cookie_store::Credentials,
    data_collector::Updater,
    logger::init_logger,
    parser::PatternExtractor,
};
use log::{error, info};

/// Fetches the leaderboard once and updates the tracking file.
#[derive(Parser)]
struct Opts {
    #[command(flatten)]
    config: ConfigArgs,
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let opts = Opts::parse();
    init_logger(opts.verbose);
    let config = opts.config.resolve()?;

    if let Err(e) = Credentials::load(&config.credentials_path) {
        error!("{e}");
        error!("{}", e.guidance());
        return Ok(ExitCode::FAILURE);
    }

    let client = ForumClient::new(&config).context("Failed to build the HTTP client")?;
    let updater = Updater::new(
        &config,
        client,
        PatternExtractor::new(config.site_origin.clone()),
    )?;
    match updater.run_cycle().await {
        Ok(report) => {
            info!("Tracked {} users.", report.users);
            Ok(if report.saved {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Err(e) => {
            error!("[{}] {e}", e.stage());
            Ok(ExitCode::FAILURE)
        }
    }
}
