use std::time::Duration;

use anyhow::Context;
use leaderboard_scraping::{
    api::{ForumClient, PageSource},
    config::Config as AppConfig,
    data_collector::Updater,
    parser::{LeaderboardExtractor, PatternExtractor},
};
use log::{error, info};
use tokio::{
    spawn,
    sync::mpsc,
    task::JoinHandle,
    time::{interval, MissedTickBehavior},
};

#[derive(Debug)]
pub struct Config {
    pub app: AppConfig,
    pub timeout_config: TimeoutConfig,
}

#[derive(Clone, Copy, Debug)]
pub struct TimeoutConfig {
    max_count: usize,
}
impl TimeoutConfig {
    pub fn cycles(max_count: usize) -> Self {
        Self { max_count }
    }
    pub fn indefinite() -> Self {
        Self {
            max_count: usize::MAX,
        }
    }
}

/// Starts the periodic update loop on the current runtime.
pub fn watch(config: Config) -> anyhow::Result<WatchHandler> {
    let client = ForumClient::new(&config.app).context("Failed to build the HTTP client")?;
    let extractor = PatternExtractor::new(config.app.site_origin.clone());
    watch_with(config, client, extractor)
}

/// Like [`watch`], with the page source and the extractor supplied by the caller.
///
/// The first cycle starts immediately, the following ones on every `interval` tick.
/// Cycles run one at a time on a single task; ticks that pass while a cycle is still
/// running are skipped rather than queued.
pub fn watch_with<S, E>(config: Config, source: S, extractor: E) -> anyhow::Result<WatchHandler>
where
    S: PageSource + Send + Sync + 'static,
    E: LeaderboardExtractor + Send + Sync + 'static,
{
    config.app.validate()?;
    let (tx, mut rx) = mpsc::channel(1);

    let task = spawn(async move {
        let updater = match Updater::new(&config.app, source, extractor) {
            Ok(updater) => updater,
            Err(e) => {
                error!("{e:#}");
                return;
            }
        };
        let mut ticker = interval(config.app.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut count = 0;
        loop {
            tokio::select! {
                biased;
                Some(()) = rx.recv() => break,
                _ = ticker.tick() => {}
            }
            count += 1;
            info!("Cycle #{count} started.");
            match updater.run_cycle().await {
                Ok(report) => info!("Cycle #{count} finished: {} users tracked.", report.users),
                Err(e) => error!("Cycle #{count} aborted: [{}] {e}", e.stage()),
            }
            if count >= config.timeout_config.max_count {
                break;
            }
            info!("Next update in {}.", describe_duration(config.app.interval));
        }
        info!("Stopped watching after {count} cycle(s).");
    });
    Ok(WatchHandler { stop: tx, task })
}

fn describe_duration(d: Duration) -> String {
    let secs = d.as_secs();
    match (secs / 60, secs % 60) {
        (0, s) => format!("{s}s"),
        (m, 0) => format!("{m}m"),
        (m, s) => format!("{m}m{s}s"),
    }
}

pub struct WatchHandler {
    stop: mpsc::Sender<()>,
    task: JoinHandle<()>,
}
impl WatchHandler {
    /// Asks the loop to stop before its next cycle; a running cycle is not interrupted.
    pub async fn stop(&self) -> Result<(), mpsc::error::SendError<()>> {
        self.stop.send(()).await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Resolves once the loop has ended.
    pub async fn wait(&mut self) {
        if let Err(e) = (&mut self.task).await {
            error!("The watcher task ended abnormally: {e}");
        }
    }
}
