use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    AddedWatched,
    RemovedWatched,
    StatusChanged,
    RatingChanged,
    ThoughtsChanged,
    ThoughtsRemoved,
    ImportedWatched,
    /// Imported rating; with a custom date it marks when the entry was rated on the source
    ImportedRating,
    SeasonAdded,
    SeasonRemoved,
    SeasonStatusChanged,
    SeasonRatingChanged,
    /// Entry added by the user by hand
    Custom,
}

impl ActivityType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddedWatched => "ADDED_WATCHED",
            Self::RemovedWatched => "REMOVED_WATCHED",
            Self::StatusChanged => "STATUS_CHANGED",
            Self::RatingChanged => "RATING_CHANGED",
            Self::ThoughtsChanged => "THOUGHTS_CHANGED",
            Self::ThoughtsRemoved => "THOUGHTS_REMOVED",
            Self::ImportedWatched => "IMPORTED_WATCHED",
            Self::ImportedRating => "IMPORTED_RATING",
            Self::SeasonAdded => "SEASON_ADDED",
            Self::SeasonRemoved => "SEASON_REMOVED",
            Self::SeasonStatusChanged => "SEASON_STATUS_CHANGED",
            Self::SeasonRatingChanged => "SEASON_RATING_CHANGED",
            Self::Custom => "CUSTOM",
        }
    }

    pub fn is_season_change(&self) -> bool {
        matches!(
            self,
            Self::SeasonAdded
                | Self::SeasonRemoved
                | Self::SeasonStatusChanged
                | Self::SeasonRatingChanged
        )
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit-log entry.
///
/// `created_at` is the insertion time and the ordering key; `custom_date` is
/// a user-supplied display date (e.g. the original watch date of an import)
/// and never affects ordering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: u64,
    pub watch_record_id: u64,
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    pub data: String,
    #[serde(default)]
    pub custom_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Activity {
    /// Date to show the user: the custom date when set, otherwise insertion time
    pub fn display_date(&self) -> DateTime<Utc> {
        self.custom_date.unwrap_or(self.created_at)
    }

    /// Parsed payload, `Value::Null` when the data is not JSON
    pub fn payload(&self) -> Value {
        serde_json::from_str(&self.data).unwrap_or(Value::Null)
    }

    /// Payload for a single field change
    pub fn change_data<T: Serialize>(old: &T, new: &T) -> String {
        json!({ "old": old, "new": new }).to_string()
    }

    /// Payload for a season change, scoped by season number
    pub fn season_change_data<T: Serialize>(season_number: u32, old: &T, new: &T) -> String {
        json!({ "season": season_number, "old": old, "new": new }).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WatchedStatus;

    #[test]
    fn test_change_data_encodes_old_and_new() {
        let data = Activity::change_data(&Some(WatchedStatus::Planned), &Some(WatchedStatus::Finished));
        let value: Value = serde_json::from_str(&data).unwrap();
        assert_eq!(value["old"], "PLANNED");
        assert_eq!(value["new"], "FINISHED");
    }

    #[test]
    fn test_season_change_data_references_season() {
        let data = Activity::season_change_data(2, &None::<u8>, &Some(8u8));
        let value: Value = serde_json::from_str(&data).unwrap();
        assert_eq!(value["season"], 2);
        assert!(value["old"].is_null());
        assert_eq!(value["new"], 8);
    }

    #[test]
    fn test_display_date_prefers_custom_date() {
        let created = Utc::now();
        let custom = created - chrono::Duration::days(400);
        let mut activity = Activity {
            id: 1,
            watch_record_id: 1,
            activity_type: ActivityType::ImportedRating,
            data: String::new(),
            custom_date: Some(custom),
            created_at: created,
        };
        assert_eq!(activity.display_date(), custom);
        activity.custom_date = None;
        assert_eq!(activity.display_date(), created);
    }
}
