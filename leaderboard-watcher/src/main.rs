use std::process::ExitCode;

use clap::Parser;
use leaderboard_scraping::{config::ConfigArgs, cookie_store::Credentials, logger::init_logger};
use leaderboard_watcher::watch::{self, TimeoutConfig};
use log::{error, info};
use tokio::sync::mpsc;

/// Keeps the leaderboard tracking file up to date until interrupted.
#[derive(Parser)]
struct Opts {
    #[command(flatten)]
    config: ConfigArgs,
    /// Stop after this many cycles instead of running forever.
    #[arg(long)]
    max_cycles: Option<usize>,
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

    info!(
        "Watching {} every {:?}; tracking data goes to {:?}.",
        config.leaderboard_url()?,
        config.interval,
        config.tracking_path
    );
    let mut handle = watch::watch(watch::Config {
        app: config,
        timeout_config: opts
            .max_cycles
            .map_or_else(TimeoutConfig::indefinite, TimeoutConfig::cycles),
    })?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        if let Err(e) = tx.send(()) {
            println!("{e}");
        }
    })?;

    tokio::select! {
        Some(()) = rx.recv() => {
            info!("Interrupted; exiting without waiting for the running cycle.");
            std::process::exit(0);
        }
        _ = handle.wait() => {}
    }
    Ok(ExitCode::SUCCESS)
}
