use std::{
    io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDate, Utc};
use leaderboard_scraping_utils::fs_json_util::{read_json, write_json};
use log::{error, info};

use crate::schema::{HistoryEntry, TrackingDocument, UserRecord, MAX_ENTRIES};

/// The JSON file holding the [`TrackingDocument`] between cycles.
pub struct TrackingStore {
    path: PathBuf,
}

impl TrackingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing or broken file yields an empty document.
    pub fn load(&self) -> TrackingDocument {
        match fs_err::metadata(&self.path) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!("{:?} was not found; starting with empty tracking data.", self.path);
                return TrackingDocument::default();
            }
            _ => {}
        }
        match read_json(&self.path) {
            Ok(doc) => {
                info!("Successfully loaded tracking data from {:?}.", self.path);
                doc
            }
            Err(e) => {
                error!("Could not read tracking data, starting over: {e:#}");
                TrackingDocument::default()
            }
        }
    }

    /// Replaces the file; on failure the previous version stays intact.
    pub fn save(&self, doc: &TrackingDocument) -> anyhow::Result<()> {
        write_json(&self.path, doc)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BaselineUpdate {
    /// The calendar date changed, so yesterday's baselines were dropped.
    Reset,
    /// Same date, but no baselines had been recorded yet.
    Seeded,
    Kept,
}

impl TrackingDocument {
    /// Folds a freshly parsed snapshot into the document.
    ///
    /// `snapshot` must be ranked `1..=N` and non-empty; `daily_increase` of every
    /// record is overwritten here.
    pub fn merge_snapshot(
        &mut self,
        mut snapshot: Vec<UserRecord>,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> BaselineUpdate {
        let update = if self.tracking_date != Some(today) {
            self.tracking_date = Some(today);
            self.reseed_baselines(&snapshot);
            BaselineUpdate::Reset
        } else if self.daily_start_counts.is_empty() {
            self.reseed_baselines(&snapshot);
            BaselineUpdate::Seeded
        } else {
            BaselineUpdate::Kept
        };

        for record in &mut snapshot {
            let baseline = self
                .daily_start_counts
                .get(&record.username)
                .copied()
                .unwrap_or(record.post_count);
            record.daily_increase = daily_increase(record.post_count, baseline);
        }

        self.last_update = Some(now);
        if let Some(top) = snapshot.first() {
            self.push_history(HistoryEntry {
                timestamp: now,
                top_user: top.username.clone(),
                top_user_posts: top.post_count,
            });
        }
        self.current_data = snapshot;
        update
    }

    fn reseed_baselines(&mut self, snapshot: &[UserRecord]) {
        self.daily_start_counts = snapshot
            .iter()
            .map(|record| (record.username.clone(), record.post_count))
            .collect();
    }

    /// Appends and drops the oldest entries beyond [`MAX_ENTRIES`].
    pub fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
        let excess = self.history.len().saturating_sub(MAX_ENTRIES);
        self.history.drain(..excess);
    }
}

/// Saturates at the bounds of `i64` for counts too far apart to be represented.
fn daily_increase(current: u64, baseline: u64) -> i64 {
    let diff = i128::from(current) - i128::from(baseline);
    i64::try_from(diff).unwrap_or(if diff > 0 { i64::MAX } else { i64::MIN })
}
