use anyhow::Context;
use log::{error, info, warn};
use url::Url;

use crate::{
    api::{FetchError, PageSource},
    chrono_util::{local_today, utc_now},
    config::Config,
    cookie_store::{Credentials, CredentialsLoadError},
    describe::make_message,
    parser::{looks_like_login_page, LeaderboardExtractor},
    schema::UserRecord,
    tracking::{BaselineUpdate, TrackingStore},
};

#[derive(Clone, Copy, PartialEq, Eq, Debug, strum::Display)]
pub enum CycleStage {
    Fetching,
    Validating,
    Parsing,
    Merging,
    Persisting,
    Reporting,
}

/// Reasons for abandoning a cycle.  None of them touches the tracking file.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("{0}")]
    Credentials(#[from] CredentialsLoadError),
    #[error(transparent)]
    Network(#[from] FetchError),
    #[error("The server answered with a login form; the session cookies have probably expired.  Refresh the cookie file.")]
    ExpiredCredentials,
    #[error("No user could be extracted from the leaderboard; the page layout may have changed.")]
    NoData,
}

impl CycleError {
    pub fn stage(&self) -> CycleStage {
        match self {
            Self::Credentials(_) | Self::Network(_) => CycleStage::Fetching,
            Self::ExpiredCredentials => CycleStage::Validating,
            Self::NoData => CycleStage::Parsing,
        }
    }
}

#[derive(Debug)]
pub struct CycleReport {
    pub users: usize,
    pub baseline: BaselineUpdate,
    /// `false` if the tracking file could not be written.
    pub saved: bool,
    pub top: Vec<UserRecord>,
}

/// Runs update cycles against one leaderboard and one tracking file.
pub struct Updater<'c, S, E> {
    config: &'c Config,
    source: S,
    extractor: E,
    store: TrackingStore,
    leaderboard_url: Url,
}

impl<'c, S, E> Updater<'c, S, E>
where
    S: PageSource,
    E: LeaderboardExtractor,
{
    pub fn new(config: &'c Config, source: S, extractor: E) -> anyhow::Result<Self> {
        let leaderboard_url = config.leaderboard_url()?;
        Ok(Self {
            config,
            source,
            extractor,
            store: TrackingStore::new(&config.tracking_path),
            leaderboard_url,
        })
    }

    /// Fetch, validate, parse, merge, persist and report once.
    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        // Re-read every time so that refreshed cookies are picked up without a restart.
        let credentials = Credentials::load(&self.config.credentials_path)?;
        let html = self
            .source
            .fetch_page(&self.leaderboard_url, &credentials)
            .await?;

        if looks_like_login_page(&html) {
            return Err(CycleError::ExpiredCredentials);
        }

        let fetched_at = utc_now();
        let snapshot = self.extractor.extract(&html, fetched_at);
        if snapshot.is_empty() {
            return Err(CycleError::NoData);
        }
        let users = snapshot.len();
        info!("Parsed {users} users.");

        let mut doc = self.store.load();
        let baseline = doc.merge_snapshot(snapshot, local_today(), fetched_at);
        match baseline {
            BaselineUpdate::Reset => info!("New day: daily baselines have been reset."),
            BaselineUpdate::Seeded => info!("Daily baselines have been recorded."),
            BaselineUpdate::Kept => {}
        }

        let saved = match self.store.save(&doc).with_context(|| {
            format!("[{}] Failed to save tracking data", CycleStage::Persisting)
        }) {
            Ok(()) => {
                info!("Saved tracking data to {:?}.", self.store.path());
                true
            }
            Err(e) => {
                error!("{e:#}");
                warn!("The previous tracking data on disk is kept as is.");
                false
            }
        };

        let top = doc
            .current_data
            .iter()
            .take(self.config.report_top)
            .cloned()
            .collect::<Vec<_>>();
        info!("Top {} users:", top.len());
        for record in &top {
            info!("  {}", make_message(record));
        }

        Ok(CycleReport {
            users,
            baseline,
            saved,
            top,
        })
    }
}
