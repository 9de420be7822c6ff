use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;
use watch_state_models::{Activity, ActivityType, Content, ContentType, WatchRecord, WatchedStatus};
use crate::error::WatchError;

/// Uniqueness key for live watch records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub user_id: u64,
    pub catalog_id: u64,
    pub content_type: ContentType,
}

impl RecordKey {
    pub fn new(user_id: u64, catalog_id: u64, content_type: ContentType) -> Self {
        Self { user_id, catalog_id, content_type }
    }

    pub fn of(record: &WatchRecord) -> Self {
        Self::new(record.user_id, record.catalog_id(), record.content_type())
    }
}

#[derive(Debug, Clone)]
pub struct NewWatchRecord {
    pub user_id: u64,
    pub content: Content,
    pub status: WatchedStatus,
    pub rating: Option<u8>,
    pub watched: bool,
}

/// Persistence seam for watch records and their activity.
///
/// `insert_record` is the compare-and-create point: the uniqueness check and
/// the insert happen atomically, so concurrent inserts for the same
/// `RecordKey` produce exactly one record and `WatchError::Conflict` for the rest.
#[async_trait]
pub trait WatchStore: Send + Sync {
    async fn insert_record(&self, new: NewWatchRecord) -> Result<WatchRecord, WatchError>;

    /// Any record by id, soft-deleted ones included
    async fn get_record(&self, record_id: u64) -> Result<Option<WatchRecord>, WatchError>;

    /// Live record for the key
    async fn find_record(&self, key: RecordKey) -> Result<Option<WatchRecord>, WatchError>;

    /// Live records of a user
    async fn list_records(&self, user_id: u64) -> Result<Vec<WatchRecord>, WatchError>;

    /// Replace a stored record (matched by id)
    async fn save_record(&self, record: &WatchRecord) -> Result<(), WatchError>;

    async fn allocate_season_id(&self) -> Result<u64, WatchError>;

    /// Append to the activity log of a live record; `NotFound` otherwise
    async fn append_activity(
        &self,
        watch_record_id: u64,
        activity_type: ActivityType,
        data: String,
        custom_date: Option<DateTime<Utc>>,
    ) -> Result<Activity, WatchError>;

    /// Activity of a record in insertion order, whatever its deletion state
    async fn list_activity(&self, watch_record_id: u64) -> Result<Vec<Activity>, WatchError>;
}

/// Serializable image of a `MemoryStore`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub next_record_id: u64,
    pub next_season_id: u64,
    pub next_activity_id: u64,
    pub records: Vec<WatchRecord>,
    pub activity: Vec<Activity>,
}

#[derive(Default)]
struct StoreState {
    next_record_id: u64,
    next_season_id: u64,
    next_activity_id: u64,
    records: BTreeMap<u64, WatchRecord>,
    /// Live records only
    by_key: HashMap<RecordKey, u64>,
    activity: BTreeMap<u64, Vec<Activity>>,
}

impl StoreState {
    fn live(&self, record_id: u64) -> Option<&WatchRecord> {
        self.records.get(&record_id).filter(|r| !r.is_deleted())
    }
}

/// In-process store guarded by a single `RwLock`.
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(StoreState::default()),
        }
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let mut state = StoreState {
            next_record_id: snapshot.next_record_id,
            next_season_id: snapshot.next_season_id,
            next_activity_id: snapshot.next_activity_id,
            ..StoreState::default()
        };
        for record in snapshot.records {
            if !record.is_deleted() {
                state.by_key.insert(RecordKey::of(&record), record.id);
            }
            state.next_record_id = state.next_record_id.max(record.id);
            for season in &record.seasons {
                state.next_season_id = state.next_season_id.max(season.id);
            }
            state.records.insert(record.id, record);
        }
        for activity in snapshot.activity {
            state.next_activity_id = state.next_activity_id.max(activity.id);
            state
                .activity
                .entry(activity.watch_record_id)
                .or_default()
                .push(activity);
        }
        for entries in state.activity.values_mut() {
            entries.sort_by_key(|a| a.id);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    pub async fn snapshot(&self) -> StoreSnapshot {
        let state = self.state.read().await;
        StoreSnapshot {
            next_record_id: state.next_record_id,
            next_season_id: state.next_season_id,
            next_activity_id: state.next_activity_id,
            records: state.records.values().cloned().collect(),
            activity: state.activity.values().flatten().cloned().collect(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WatchStore for MemoryStore {
    async fn insert_record(&self, new: NewWatchRecord) -> Result<WatchRecord, WatchError> {
        let mut state = self.state.write().await;
        let key = RecordKey::new(new.user_id, new.content.catalog_id, new.content.content_type);
        if let Some(existing_id) = state.by_key.get(&key) {
            return Err(WatchError::Conflict {
                catalog_id: key.catalog_id,
                content_type: key.content_type,
                existing_id: *existing_id,
            });
        }

        state.next_record_id += 1;
        let now = Utc::now();
        let record = WatchRecord {
            id: state.next_record_id,
            user_id: new.user_id,
            watched: new.watched,
            rating: new.rating,
            content: new.content,
            status: new.status,
            thoughts: None,
            activity: Vec::new(),
            seasons: Vec::new(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        state.by_key.insert(key, record.id);
        state.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn get_record(&self, record_id: u64) -> Result<Option<WatchRecord>, WatchError> {
        Ok(self.state.read().await.records.get(&record_id).cloned())
    }

    async fn find_record(&self, key: RecordKey) -> Result<Option<WatchRecord>, WatchError> {
        let state = self.state.read().await;
        Ok(state
            .by_key
            .get(&key)
            .and_then(|id| state.records.get(id))
            .cloned())
    }

    async fn list_records(&self, user_id: u64) -> Result<Vec<WatchRecord>, WatchError> {
        let state = self.state.read().await;
        Ok(state
            .records
            .values()
            .filter(|r| r.user_id == user_id && !r.is_deleted())
            .cloned()
            .collect())
    }

    async fn save_record(&self, record: &WatchRecord) -> Result<(), WatchError> {
        let mut state = self.state.write().await;
        if !state.records.contains_key(&record.id) {
            return Err(WatchError::record_not_found(record.id));
        }
        let key = RecordKey::of(record);
        if record.is_deleted() && state.by_key.get(&key) == Some(&record.id) {
            state.by_key.remove(&key);
        }
        let mut stored = record.clone();
        stored.activity.clear();
        state.records.insert(record.id, stored);
        Ok(())
    }

    async fn allocate_season_id(&self) -> Result<u64, WatchError> {
        let mut state = self.state.write().await;
        state.next_season_id += 1;
        Ok(state.next_season_id)
    }

    async fn append_activity(
        &self,
        watch_record_id: u64,
        activity_type: ActivityType,
        data: String,
        custom_date: Option<DateTime<Utc>>,
    ) -> Result<Activity, WatchError> {
        let mut state = self.state.write().await;
        if state.live(watch_record_id).is_none() {
            return Err(WatchError::record_not_found(watch_record_id));
        }
        state.next_activity_id += 1;
        let activity = Activity {
            id: state.next_activity_id,
            watch_record_id,
            activity_type,
            data,
            custom_date,
            created_at: Utc::now(),
        };
        state
            .activity
            .entry(watch_record_id)
            .or_default()
            .push(activity.clone());
        Ok(activity)
    }

    async fn list_activity(&self, watch_record_id: u64) -> Result<Vec<Activity>, WatchError> {
        let state = self.state.read().await;
        Ok(state
            .activity
            .get(&watch_record_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::movie;
    use std::sync::Arc;

    fn new_record(user_id: u64, catalog_id: u64) -> NewWatchRecord {
        NewWatchRecord {
            user_id,
            content: movie(catalog_id, "Arrival", 2016),
            status: WatchedStatus::Planned,
            rating: None,
            watched: false,
        }
    }

    #[tokio::test]
    async fn test_insert_enforces_unique_key() {
        let store = MemoryStore::new();
        let first = store.insert_record(new_record(1, 329865)).await.unwrap();
        let err = store.insert_record(new_record(1, 329865)).await.unwrap_err();
        match err {
            WatchError::Conflict { existing_id, .. } => assert_eq!(existing_id, first.id),
            other => panic!("expected conflict, got {:?}", other),
        }

        // Same content for another user is fine
        store.insert_record(new_record(2, 329865)).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_inserts_create_one_record() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move { store.insert_record(new_record(1, 42)).await }));
        }
        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(store.list_records(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_deleted_record_frees_key_and_rejects_activity() {
        let store = MemoryStore::new();
        let mut record = store.insert_record(new_record(1, 7)).await.unwrap();
        store
            .append_activity(record.id, ActivityType::AddedWatched, "{}".to_string(), None)
            .await
            .unwrap();

        record.deleted_at = Some(Utc::now());
        store.save_record(&record).await.unwrap();

        assert!(store.find_record(RecordKey::of(&record)).await.unwrap().is_none());
        let err = store
            .append_activity(record.id, ActivityType::Custom, "{}".to_string(), None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        // History survives the delete
        assert_eq!(store.list_activity(record.id).await.unwrap().len(), 1);

        store.insert_record(new_record(1, 7)).await.unwrap();
    }

    #[tokio::test]
    async fn test_snapshot_round_trip_keeps_counters_and_index() {
        let store = MemoryStore::new();
        let record = store.insert_record(new_record(1, 7)).await.unwrap();
        store
            .append_activity(record.id, ActivityType::AddedWatched, "{}".to_string(), None)
            .await
            .unwrap();

        let restored = MemoryStore::from_snapshot(store.snapshot().await);
        assert!(restored.insert_record(new_record(1, 7)).await.unwrap_err().is_conflict());
        let next = restored.insert_record(new_record(1, 8)).await.unwrap();
        assert_eq!(next.id, record.id + 1);
        let activity = restored
            .append_activity(record.id, ActivityType::Custom, "{}".to_string(), None)
            .await
            .unwrap();
        assert_eq!(activity.id, 2);
    }
}
