use std::{path::PathBuf, time::Duration};

use anyhow::{bail, Context};
use leaderboard_scraping_utils::fs_json_util::read_toml;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Settings shared by every component, built once at startup.
#[serde_as]
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Scheme and host of the forum; relative avatar paths are resolved against it.
    pub site_origin: Url,
    pub leaderboard_path: String,
    pub credentials_path: PathBuf,
    pub tracking_path: PathBuf,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub interval: Duration,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub request_timeout: Duration,
    pub user_agent: String,
    /// Number of users printed after each cycle.
    pub report_top: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site_origin: Url::parse("https://forum.example.com")
                .expect("the default origin is a valid url"),
            leaderboard_path: "/members/?key=most_posts".to_owned(),
            credentials_path: "cookies.txt".into(),
            tracking_path: "tracking_data.json".into(),
            interval: Duration::from_secs(5 * 60),
            request_timeout: Duration::from_secs(30),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            report_top: 5,
        }
    }
}

impl Config {
    pub fn leaderboard_url(&self) -> anyhow::Result<Url> {
        self.site_origin
            .join(&self.leaderboard_path)
            .with_context(|| format!("Invalid leaderboard path: {:?}", self.leaderboard_path))
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.interval.is_zero() {
            bail!("`interval` must be positive");
        }
        if self.request_timeout.is_zero() {
            bail!("`request_timeout` must be positive");
        }
        if !matches!(self.site_origin.scheme(), "http" | "https") {
            bail!("`site_origin` must be an http(s) url: {}", self.site_origin);
        }
        self.leaderboard_url()?;
        Ok(())
    }
}

/// Command-line overrides; anything left out falls back to the config file, then to the defaults.
#[derive(Clone, Debug, Default, clap::Args)]
pub struct ConfigArgs {
    /// TOML file with any subset of the settings.
    #[arg(long)]
    pub config_path: Option<PathBuf>,
    #[arg(long)]
    pub site_origin: Option<Url>,
    #[arg(long)]
    pub credentials_path: Option<PathBuf>,
    #[arg(long)]
    pub tracking_path: Option<PathBuf>,
    #[arg(long, value_name = "SECONDS")]
    pub interval: Option<u64>,
    #[arg(long, value_name = "SECONDS")]
    pub request_timeout: Option<u64>,
}

impl ConfigArgs {
    pub fn resolve(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config_path {
            Some(path) => read_toml(path)?,
            None => Config::default(),
        };
        if let Some(site_origin) = &self.site_origin {
            config.site_origin = site_origin.clone();
        }
        if let Some(path) = &self.credentials_path {
            config.credentials_path = path.clone();
        }
        if let Some(path) = &self.tracking_path {
            config.tracking_path = path.clone();
        }
        if let Some(secs) = self.interval {
            config.interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.request_timeout {
            config.request_timeout = Duration::from_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }
}
