use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use crate::activity::Activity;
use crate::content::{Content, ContentType};
use crate::status::WatchedStatus;

/// Upper bound for ratings (inclusive, lower bound is 0)
pub const MAX_RATING: u8 = 10;

pub fn rating_in_bounds(rating: Option<u8>) -> bool {
    rating.map_or(true, |r| r <= MAX_RATING)
}

/// One user's relationship to one piece of content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WatchRecord {
    pub id: u64,
    pub user_id: u64,
    pub watched: bool,
    #[serde(default)]
    pub rating: Option<u8>,
    pub content: Content,
    pub status: WatchedStatus,
    #[serde(default)]
    pub thoughts: Option<String>,
    /// Populated on reads that ask for it; the log itself lives in the store
    #[serde(default)]
    pub activity: Vec<Activity>,
    #[serde(default)]
    pub seasons: Vec<SeasonRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SeasonRecord {
    pub id: u64,
    pub watch_record_id: u64,
    pub season_number: u32,
    pub status: WatchedStatus,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl WatchRecord {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn catalog_id(&self) -> u64 {
        self.content.catalog_id
    }

    pub fn content_type(&self) -> ContentType {
        self.content.content_type
    }

    /// Seasons that have not been soft-deleted, ordered by season number
    pub fn active_seasons(&self) -> Vec<&SeasonRecord> {
        let mut seasons: Vec<&SeasonRecord> = self
            .seasons
            .iter()
            .filter(|s| s.deleted_at.is_none())
            .collect();
        seasons.sort_by_key(|s| s.season_number);
        seasons
    }

    pub fn season(&self, season_number: u32) -> Option<&SeasonRecord> {
        self.seasons
            .iter()
            .find(|s| s.season_number == season_number && s.deleted_at.is_none())
    }

    pub fn season_mut(&mut self, season_number: u32) -> Option<&mut SeasonRecord> {
        self.seasons
            .iter_mut()
            .find(|s| s.season_number == season_number && s.deleted_at.is_none())
    }

    /// Season numbers the record knows about: every recorded season plus
    /// 1..=season_count when the catalog reported a count.
    pub fn known_season_numbers(&self) -> BTreeSet<u32> {
        let mut known: BTreeSet<u32> = self
            .active_seasons()
            .iter()
            .map(|s| s.season_number)
            .collect();
        if let Some(count) = self.content.season_count {
            known.extend(1..=count);
        }
        known
    }

    /// Recompute the derived `watched` flag and store it.
    ///
    /// Shows with season records derive it from their seasons; everything
    /// else follows `status == FINISHED`.
    pub fn recompute_watched(&mut self) -> bool {
        self.watched = if self.content.content_type == ContentType::Tv
            && !self.active_seasons().is_empty()
        {
            let known = self.known_season_numbers();
            !known.is_empty()
                && known.iter().all(|n| {
                    self.season(*n)
                        .map(|s| s.status.is_finished())
                        .unwrap_or(false)
                })
        } else {
            self.status.is_finished()
        };
        self.watched
    }
}
