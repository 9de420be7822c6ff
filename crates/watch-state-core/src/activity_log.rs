use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;
use watch_state_models::{Activity, ActivityType};
use crate::error::WatchError;
use crate::store::WatchStore;

/// Append-only audit trail over a `WatchStore`.
#[derive(Clone)]
pub struct ActivityLog {
    store: Arc<dyn WatchStore>,
}

impl ActivityLog {
    pub fn new(store: Arc<dyn WatchStore>) -> Self {
        Self { store }
    }

    /// Append an entry; `NotFound` when the record is missing or deleted
    pub async fn append(
        &self,
        watch_record_id: u64,
        activity_type: ActivityType,
        data: impl Into<String>,
        custom_date: Option<DateTime<Utc>>,
    ) -> Result<Activity, WatchError> {
        let activity = self
            .store
            .append_activity(watch_record_id, activity_type, data.into(), custom_date)
            .await?;
        debug!(
            "Activity {} appended to watch record {}: {}",
            activity.id, watch_record_id, activity.activity_type
        );
        Ok(activity)
    }

    pub async fn history(&self, watch_record_id: u64) -> Result<ActivityHistory, WatchError> {
        let entries = self.store.list_activity(watch_record_id).await?;
        Ok(ActivityHistory::new(entries))
    }
}

/// Point-in-time view of a record's activity, in insertion order.
///
/// Iterating does not consume it, so the same history can be walked again.
#[derive(Debug, Clone)]
pub struct ActivityHistory {
    entries: Arc<[Activity]>,
}

impl ActivityHistory {
    pub fn new(mut entries: Vec<Activity>) -> Self {
        entries.sort_by_key(|a| a.id);
        Self {
            entries: entries.into(),
        }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Activity> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&Activity> {
        self.entries.last()
    }

    pub fn to_vec(&self) -> Vec<Activity> {
        self.entries.to_vec()
    }
}

impl<'a> IntoIterator for &'a ActivityHistory {
    type Item = &'a Activity;
    type IntoIter = std::slice::Iter<'a, Activity>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
