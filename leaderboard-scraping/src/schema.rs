use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

/// Upper bound of both `current_data` and `history`.
pub const MAX_ENTRIES: usize = 100;

/// One row of the leaderboard as captured by a single fetch.
#[derive(Clone, PartialEq, Eq, Debug, TypedBuilder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub rank: u32,
    #[builder(setter(into))]
    pub username: String,
    #[builder(default, setter(into))]
    pub user_title: String,
    pub post_count: u64,
    #[builder(default)]
    pub media_count: u64,
    #[builder(default, setter(into))]
    pub avatar_url: String,
    #[builder(default)]
    pub daily_increase: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub top_user: String,
    pub top_user_posts: u64,
}

/// Everything persisted between cycles.
#[derive(Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingDocument {
    pub last_update: Option<DateTime<Utc>>,
    /// `None` only before the first successful cycle.
    pub tracking_date: Option<NaiveDate>,
    /// Post count of each user at the start of `tracking_date`.
    #[serde(default)]
    pub daily_start_counts: BTreeMap<String, u64>,
    #[serde(default)]
    pub current_data: Vec<UserRecord>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::{TrackingDocument, UserRecord};

    #[test]
    fn serializes_with_camel_case_keys() {
        let record = UserRecord::builder()
            .rank(1)
            .username("Alice")
            .post_count(1234)
            .timestamp(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap())
            .build();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["userTitle"], "");
        assert_eq!(json["postCount"], 1234);
        assert_eq!(json["mediaCount"], 0);
        assert_eq!(json["avatarUrl"], "");
        assert_eq!(json["dailyIncrease"], 0);
        assert_eq!(json["timestamp"], "2024-05-01T12:00:00Z");
    }

    #[test]
    fn default_document_shape() {
        let json = serde_json::to_value(TrackingDocument::default()).unwrap();
        assert!(json["lastUpdate"].is_null());
        assert!(json["trackingDate"].is_null());
        assert_eq!(json["dailyStartCounts"], serde_json::json!({}));
        assert_eq!(json["currentData"], serde_json::json!([]));
        assert_eq!(json["history"], serde_json::json!([]));
    }

    #[test]
    fn tracking_date_is_a_plain_calendar_date() {
        let doc = TrackingDocument {
            tracking_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            ..Default::default()
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["trackingDate"], "2024-05-01");
    }
}
