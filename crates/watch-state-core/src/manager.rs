use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use watch_state_catalog::{CatalogError, CatalogGateway};
use watch_state_models::{
    Activity, ActivityType, Content, ContentType, Profile, SeasonRecord, WatchRecord,
    WatchedStatus, rating_in_bounds,
};
use crate::activity_log::{ActivityHistory, ActivityLog};
use crate::error::WatchError;
use crate::locks::KeyedLocks;
use crate::store::{NewWatchRecord, RecordKey, WatchStore};

pub const DEFAULT_CATALOG_TIMEOUT: Duration = Duration::from_secs(10);

/// Hook for automation that reacts to status transitions.
///
/// Called after the change is committed, with `previous = None` on creation.
pub trait StatusObserver: Send + Sync {
    fn on_status_changed(
        &self,
        record: &WatchRecord,
        previous: Option<WatchedStatus>,
        current: WatchedStatus,
    );
}

/// Partial update; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct RecordPatch {
    pub status: Option<WatchedStatus>,
    pub rating: Option<u8>,
    pub thoughts: Option<String>,
    /// Clears thoughts, takes precedence over `thoughts`
    pub remove_thoughts: bool,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.rating.is_none() && self.thoughts.is_none() && !self.remove_thoughts
    }
}

#[derive(Debug, Clone)]
pub struct UpdateResult {
    pub record: WatchRecord,
    /// One entry per field that changed, in status, rating, thoughts order
    pub activities: Vec<Activity>,
}

impl UpdateResult {
    pub fn new_activity(&self) -> Option<&Activity> {
        self.activities.last()
    }
}

#[derive(Debug, Clone)]
pub struct SeasonUpdate {
    /// Live seasons of the record after the write, by season number
    pub seasons: Vec<SeasonRecord>,
    pub added_activity: Option<Activity>,
    pub watched: bool,
}

/// Lifecycle operations over watch records.
///
/// Writes to one record are serialized through a per-record lock so that the
/// activity entries of concurrent updates never interleave.
pub struct WatchRecordManager {
    store: Arc<dyn WatchStore>,
    catalog: Arc<dyn CatalogGateway>,
    activity_log: ActivityLog,
    record_locks: KeyedLocks<u64>,
    create_locks: KeyedLocks<RecordKey>,
    catalog_timeout: Duration,
    observer: Option<Arc<dyn StatusObserver>>,
}

fn check_rating(rating: Option<u8>) -> Result<(), WatchError> {
    match rating {
        Some(r) if !rating_in_bounds(rating) => Err(WatchError::InvalidRating(r)),
        _ => Ok(()),
    }
}

fn season_state(season: &SeasonRecord) -> Value {
    json!({ "status": season.status, "rating": season.rating })
}

impl WatchRecordManager {
    pub fn new(store: Arc<dyn WatchStore>, catalog: Arc<dyn CatalogGateway>) -> Self {
        Self {
            activity_log: ActivityLog::new(store.clone()),
            store,
            catalog,
            record_locks: KeyedLocks::new(),
            create_locks: KeyedLocks::new(),
            catalog_timeout: DEFAULT_CATALOG_TIMEOUT,
            observer: None,
        }
    }

    pub fn with_catalog_timeout(mut self, timeout: Duration) -> Self {
        self.catalog_timeout = timeout;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn StatusObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn catalog_timeout(&self) -> Duration {
        self.catalog_timeout
    }

    pub fn activity_log(&self) -> &ActivityLog {
        &self.activity_log
    }

    /// Start tracking a piece of content for a user.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        user_id: u64,
        catalog_id: u64,
        content_type: ContentType,
        status: WatchedStatus,
        rating: Option<u8>,
    ) -> Result<WatchRecord, WatchError> {
        self.create_with(user_id, catalog_id, content_type, status, rating, ActivityType::AddedWatched)
            .await
    }

    /// Same as `create`, audited as an import
    #[instrument(skip(self))]
    pub async fn create_imported(
        &self,
        user_id: u64,
        catalog_id: u64,
        content_type: ContentType,
        status: WatchedStatus,
        rating: Option<u8>,
    ) -> Result<WatchRecord, WatchError> {
        self.create_with(user_id, catalog_id, content_type, status, rating, ActivityType::ImportedWatched)
            .await
    }

    async fn create_with(
        &self,
        user_id: u64,
        catalog_id: u64,
        content_type: ContentType,
        status: WatchedStatus,
        rating: Option<u8>,
        activity_type: ActivityType,
    ) -> Result<WatchRecord, WatchError> {
        check_rating(rating)?;
        let key = RecordKey::new(user_id, catalog_id, content_type);
        let _guard = self.create_locks.lock(&key).await;

        if let Some(existing) = self.store.find_record(key).await? {
            debug!("Watch record {} already tracks {} {}", existing.id, content_type, catalog_id);
            return Err(WatchError::Conflict {
                catalog_id,
                content_type,
                existing_id: existing.id,
            });
        }

        let content = self.fetch_content(catalog_id, content_type).await?;
        let mut record = self
            .store
            .insert_record(NewWatchRecord {
                user_id,
                content,
                status,
                rating,
                watched: status.is_finished(),
            })
            .await?;

        let activity = self
            .activity_log
            .append(
                record.id,
                activity_type,
                json!({ "status": status, "rating": rating }).to_string(),
                None,
            )
            .await?;
        record.activity.push(activity);

        info!(
            "Created watch record {} for user {}: {} ({}) as {}",
            record.id, user_id, record.content.title, content_type, status
        );
        self.notify(&record, None);
        Ok(record)
    }

    async fn fetch_content(
        &self,
        catalog_id: u64,
        content_type: ContentType,
    ) -> Result<Content, WatchError> {
        match tokio::time::timeout(
            self.catalog_timeout,
            self.catalog.fetch_details(catalog_id, content_type),
        )
        .await
        {
            Ok(result) => result.map_err(|e| {
                warn!("Catalog lookup for {} {} failed: {}", content_type, catalog_id, e);
                WatchError::from(e)
            }),
            Err(_) => {
                warn!(
                    "Catalog lookup for {} {} timed out after {:?}",
                    content_type, catalog_id, self.catalog_timeout
                );
                Err(CatalogError::Timeout.into())
            }
        }
    }

    async fn load_live(&self, record_id: u64) -> Result<WatchRecord, WatchError> {
        match self.store.get_record(record_id).await? {
            Some(record) if !record.is_deleted() => Ok(record),
            _ => Err(WatchError::record_not_found(record_id)),
        }
    }

    /// Apply a partial update, auditing every field whose value changes.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, record_id: u64, patch: RecordPatch) -> Result<UpdateResult, WatchError> {
        check_rating(patch.rating)?;
        let _guard = self.record_locks.lock(&record_id).await;
        let mut record = self.load_live(record_id).await?;

        let mut changes: Vec<(ActivityType, String)> = Vec::new();
        let previous_status = record.status;

        if let Some(status) = patch.status.filter(|s| *s != record.status) {
            changes.push((ActivityType::StatusChanged, Activity::change_data(&record.status, &status)));
            record.status = status;
        }
        if let Some(rating) = patch.rating.filter(|r| record.rating != Some(*r)) {
            changes.push((ActivityType::RatingChanged, Activity::change_data(&record.rating, &Some(rating))));
            record.rating = Some(rating);
        }
        if patch.remove_thoughts {
            if record.thoughts.is_some() {
                changes.push((
                    ActivityType::ThoughtsRemoved,
                    Activity::change_data(&record.thoughts, &None::<String>),
                ));
                record.thoughts = None;
            }
        } else if let Some(thoughts) = patch.thoughts.filter(|t| record.thoughts.as_ref() != Some(t)) {
            let new = Some(thoughts);
            changes.push((ActivityType::ThoughtsChanged, Activity::change_data(&record.thoughts, &new)));
            record.thoughts = new;
        }

        if changes.is_empty() {
            debug!("Update of watch record {} changed nothing", record_id);
            return Ok(UpdateResult {
                record,
                activities: Vec::new(),
            });
        }

        record.recompute_watched();
        record.updated_at = Utc::now();
        self.store.save_record(&record).await?;

        let mut activities = Vec::with_capacity(changes.len());
        for (activity_type, data) in changes {
            activities.push(self.activity_log.append(record_id, activity_type, data, None).await?);
        }
        info!("Updated watch record {}: {} change(s)", record_id, activities.len());

        if record.status != previous_status {
            self.notify(&record, Some(previous_status));
        }
        Ok(UpdateResult { record, activities })
    }

    /// Create or update one season of a show.
    ///
    /// `rating = None` keeps the rating of an existing season.
    #[instrument(skip(self))]
    pub async fn set_season_status(
        &self,
        record_id: u64,
        season_number: u32,
        status: WatchedStatus,
        rating: Option<u8>,
    ) -> Result<SeasonUpdate, WatchError> {
        check_rating(rating)?;
        let _guard = self.record_locks.lock(&record_id).await;
        let mut record = self.load_live(record_id).await?;
        if record.content_type() != ContentType::Tv {
            return Err(WatchError::NotATvShow(record_id));
        }

        let change = match record.season_mut(season_number) {
            Some(season) => {
                let old = season_state(season);
                let status_changed = season.status != status;
                let rating_changed = rating.is_some() && season.rating != rating;
                season.status = status;
                if rating.is_some() {
                    season.rating = rating;
                }
                let new = season_state(season);
                if status_changed {
                    Some((ActivityType::SeasonStatusChanged, Activity::season_change_data(season_number, &old, &new)))
                } else if rating_changed {
                    Some((ActivityType::SeasonRatingChanged, Activity::season_change_data(season_number, &old, &new)))
                } else {
                    None
                }
            }
            None => {
                let season = SeasonRecord {
                    id: self.store.allocate_season_id().await?,
                    watch_record_id: record_id,
                    season_number,
                    status,
                    rating,
                    deleted_at: None,
                };
                let data = Activity::season_change_data(season_number, &Value::Null, &season_state(&season));
                record.seasons.push(season);
                Some((ActivityType::SeasonAdded, data))
            }
        };

        let watched = record.recompute_watched();
        let mut added_activity = None;
        if let Some((activity_type, data)) = change {
            record.updated_at = Utc::now();
            self.store.save_record(&record).await?;
            added_activity = Some(self.activity_log.append(record_id, activity_type, data, None).await?);
            info!(
                "Season {} of watch record {} set to {} (watched: {})",
                season_number, record_id, status, watched
            );
        }

        Ok(SeasonUpdate {
            seasons: record.active_seasons().into_iter().cloned().collect(),
            added_activity,
            watched,
        })
    }

    /// Soft-delete one season and re-derive `watched`
    #[instrument(skip(self))]
    pub async fn remove_season(&self, record_id: u64, season_number: u32) -> Result<SeasonUpdate, WatchError> {
        let _guard = self.record_locks.lock(&record_id).await;
        let mut record = self.load_live(record_id).await?;
        let now = Utc::now();

        let season = record
            .season_mut(season_number)
            .ok_or_else(|| WatchError::NotFound(format!("season {} of watch record {}", season_number, record_id)))?;
        let old = season_state(season);
        season.deleted_at = Some(now);

        let watched = record.recompute_watched();
        record.updated_at = now;
        self.store.save_record(&record).await?;
        let activity = self
            .activity_log
            .append(
                record_id,
                ActivityType::SeasonRemoved,
                Activity::season_change_data(season_number, &old, &Value::Null),
                None,
            )
            .await?;
        info!("Removed season {} from watch record {}", season_number, record_id);

        Ok(SeasonUpdate {
            seasons: record.active_seasons().into_iter().cloned().collect(),
            added_activity: Some(activity),
            watched,
        })
    }

    /// Soft-delete a record and its seasons. History is kept.
    #[instrument(skip(self))]
    pub async fn delete(&self, record_id: u64) -> Result<(), WatchError> {
        let _guard = self.record_locks.lock(&record_id).await;
        let mut record = self.load_live(record_id).await?;

        self.activity_log
            .append(
                record_id,
                ActivityType::RemovedWatched,
                Activity::change_data(&Some(record.status), &None::<WatchedStatus>),
                None,
            )
            .await?;

        let now = Utc::now();
        record.deleted_at = Some(now);
        record.updated_at = now;
        for season in record.seasons.iter_mut().filter(|s| s.deleted_at.is_none()) {
            season.deleted_at = Some(now);
        }
        self.store.save_record(&record).await?;
        info!("Deleted watch record {} ({})", record_id, record.content.title);
        Ok(())
    }

    /// Append a user-supplied entry to a record's history
    pub async fn add_activity(
        &self,
        record_id: u64,
        activity_type: ActivityType,
        data: impl Into<String>,
        custom_date: Option<DateTime<Utc>>,
    ) -> Result<Activity, WatchError> {
        let _guard = self.record_locks.lock(&record_id).await;
        self.activity_log.append(record_id, activity_type, data, custom_date).await
    }

    /// Live record with its activity attached
    pub async fn get(&self, record_id: u64) -> Result<WatchRecord, WatchError> {
        let mut record = self.load_live(record_id).await?;
        record.activity = self.activity_log.history(record_id).await?.to_vec();
        Ok(record)
    }

    /// Live records of a user, most recently updated first
    pub async fn list(&self, user_id: u64) -> Result<Vec<WatchRecord>, WatchError> {
        let mut records = self.store.list_records(user_id).await?;
        records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| b.id.cmp(&a.id)));
        Ok(records)
    }

    pub async fn find(
        &self,
        user_id: u64,
        catalog_id: u64,
        content_type: ContentType,
    ) -> Result<Option<WatchRecord>, WatchError> {
        self.store
            .find_record(RecordKey::new(user_id, catalog_id, content_type))
            .await
    }

    /// History of a record. Deleted records only answer with `include_deleted`.
    pub async fn list_activity(
        &self,
        record_id: u64,
        include_deleted: bool,
    ) -> Result<ActivityHistory, WatchError> {
        match self.store.get_record(record_id).await? {
            Some(record) if include_deleted || !record.is_deleted() => {
                self.activity_log.history(record_id).await
            }
            _ => Err(WatchError::record_not_found(record_id)),
        }
    }

    pub async fn profile(&self, user_id: u64) -> Result<Profile, WatchError> {
        let mut profile = Profile::default();
        for record in self.store.list_records(user_id).await?.iter().filter(|r| r.watched) {
            match record.content_type() {
                ContentType::Movie => profile.movies_watched += 1,
                ContentType::Tv => profile.shows_watched += 1,
            }
        }
        Ok(profile)
    }

    fn notify(&self, record: &WatchRecord, previous: Option<WatchedStatus>) {
        if let Some(observer) = &self.observer {
            observer.on_status_changed(record, previous, record.status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::test_support::{movie, show, FakeCatalog};
    use std::sync::Mutex;

    fn manager_with(catalog: FakeCatalog) -> Arc<WatchRecordManager> {
        Arc::new(WatchRecordManager::new(Arc::new(MemoryStore::new()), Arc::new(catalog)))
    }

    fn catalog() -> FakeCatalog {
        FakeCatalog::new()
            .with(movie(438631, "Dune", 2021))
            .with(show(1399, "Game of Thrones", Some(8)))
            .with(show(100, "Two Seasons", Some(2)))
            .with(show(200, "Unknown Length", None))
    }

    #[derive(Default)]
    struct RecordingObserver {
        calls: Mutex<Vec<(Option<WatchedStatus>, WatchedStatus)>>,
    }

    impl StatusObserver for RecordingObserver {
        fn on_status_changed(&self, _record: &WatchRecord, previous: Option<WatchedStatus>, current: WatchedStatus) {
            self.calls.lock().unwrap().push((previous, current));
        }
    }

    #[tokio::test]
    async fn test_create_snapshots_content_and_audits() {
        let manager = manager_with(catalog());
        let record = manager
            .create(1, 438631, ContentType::Movie, WatchedStatus::Finished, Some(9))
            .await
            .unwrap();

        assert_eq!(record.content.title, "Dune");
        assert!(record.watched);
        assert_eq!(record.rating, Some(9));
        assert_eq!(record.activity.len(), 1);
        assert_eq!(record.activity[0].activity_type, ActivityType::AddedWatched);
    }

    #[tokio::test]
    async fn test_create_rejects_out_of_bounds_rating() {
        let manager = manager_with(catalog());
        let err = manager
            .create(1, 438631, ContentType::Movie, WatchedStatus::Finished, Some(11))
            .await
            .unwrap_err();
        assert!(matches!(err, WatchError::InvalidRating(11)));
        assert!(manager.list(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_creates_leave_one_record() {
        let catalog = catalog().with_details_delay(Duration::from_millis(20));
        let manager = manager_with(catalog);
        let mut handles = Vec::new();
        for _ in 0..8 {
            let manager = manager.clone();
            handles.push(tokio::spawn(async move {
                manager
                    .create(1, 438631, ContentType::Movie, WatchedStatus::Planned, None)
                    .await
            }));
        }

        let mut created = 0;
        let mut conflicts = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(e) if e.is_conflict() => conflicts += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(created, 1);
        assert_eq!(conflicts, 7);
        assert_eq!(manager.list(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_catalog_failures_surface_as_lookup_failed() {
        let manager = manager_with(catalog());
        let err = manager
            .create(1, 999, ContentType::Movie, WatchedStatus::Planned, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WatchError::CatalogLookupFailed(ref e) if e.is_not_found()));

        let slow = Arc::new(
            WatchRecordManager::new(
                Arc::new(MemoryStore::new()),
                Arc::new(catalog().with_details_delay(Duration::from_millis(200))),
            )
            .with_catalog_timeout(Duration::from_millis(10)),
        );
        let err = slow
            .create(1, 438631, ContentType::Movie, WatchedStatus::Planned, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WatchError::CatalogLookupFailed(CatalogError::Timeout)));
        assert!(slow.list(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_emits_one_activity_per_changed_field() {
        let manager = manager_with(catalog());
        let record = manager
            .create(1, 438631, ContentType::Movie, WatchedStatus::Planned, None)
            .await
            .unwrap();

        let result = manager
            .update(
                record.id,
                RecordPatch {
                    status: Some(WatchedStatus::Finished),
                    rating: Some(8),
                    thoughts: Some("Loud and beautiful".to_string()),
                    remove_thoughts: false,
                },
            )
            .await
            .unwrap();

        let types: Vec<ActivityType> = result.activities.iter().map(|a| a.activity_type).collect();
        assert_eq!(
            types,
            vec![ActivityType::StatusChanged, ActivityType::RatingChanged, ActivityType::ThoughtsChanged]
        );
        assert!(result.record.watched);
        assert_eq!(result.new_activity().unwrap().activity_type, ActivityType::ThoughtsChanged);

        let payload = result.activities[0].payload();
        assert_eq!(payload["old"], "PLANNED");
        assert_eq!(payload["new"], "FINISHED");

        let history = manager.list_activity(record.id, false).await.unwrap();
        assert_eq!(history.len(), 4);
    }

    #[tokio::test]
    async fn test_noop_update_emits_nothing() {
        let manager = manager_with(catalog());
        let record = manager
            .create(1, 438631, ContentType::Movie, WatchedStatus::Watching, Some(7))
            .await
            .unwrap();

        let result = manager
            .update(
                record.id,
                RecordPatch {
                    status: Some(WatchedStatus::Watching),
                    rating: Some(7),
                    ..RecordPatch::default()
                },
            )
            .await
            .unwrap();
        assert!(result.activities.is_empty());
        assert!(result.new_activity().is_none());

        // Removing thoughts that were never set is a no-op too
        let result = manager
            .update(record.id, RecordPatch { remove_thoughts: true, ..RecordPatch::default() })
            .await
            .unwrap();
        assert!(result.activities.is_empty());
        assert_eq!(manager.list_activity(record.id, false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_thoughts_wins_over_new_thoughts() {
        let manager = manager_with(catalog());
        let record = manager
            .create(1, 438631, ContentType::Movie, WatchedStatus::Watching, None)
            .await
            .unwrap();
        manager
            .update(record.id, RecordPatch { thoughts: Some("meh".to_string()), ..RecordPatch::default() })
            .await
            .unwrap();

        let result = manager
            .update(
                record.id,
                RecordPatch {
                    thoughts: Some("ignored".to_string()),
                    remove_thoughts: true,
                    ..RecordPatch::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(result.activities.len(), 1);
        assert_eq!(result.activities[0].activity_type, ActivityType::ThoughtsRemoved);
        assert!(result.record.thoughts.is_none());
    }

    #[tokio::test]
    async fn test_two_season_show_is_watched_after_last_season() {
        let manager = manager_with(catalog());
        let record = manager
            .create(1, 100, ContentType::Tv, WatchedStatus::Watching, None)
            .await
            .unwrap();

        let first = manager
            .set_season_status(record.id, 1, WatchedStatus::Finished, None)
            .await
            .unwrap();
        assert!(!first.watched);
        assert_eq!(first.added_activity.unwrap().activity_type, ActivityType::SeasonAdded);

        let second = manager
            .set_season_status(record.id, 2, WatchedStatus::Finished, Some(9))
            .await
            .unwrap();
        assert!(second.watched);
        assert_eq!(second.seasons.len(), 2);
        assert!(manager.get(record.id).await.unwrap().watched);

        let payload = second.added_activity.unwrap().payload();
        assert_eq!(payload["season"], 2);
    }

    #[tokio::test]
    async fn test_show_status_does_not_finish_seasons() {
        let manager = manager_with(catalog());
        let record = manager
            .create(1, 1399, ContentType::Tv, WatchedStatus::Watching, None)
            .await
            .unwrap();
        manager
            .set_season_status(record.id, 1, WatchedStatus::Finished, None)
            .await
            .unwrap();

        let result = manager
            .update(record.id, RecordPatch { status: Some(WatchedStatus::Finished), ..RecordPatch::default() })
            .await
            .unwrap();
        assert_eq!(result.record.status, WatchedStatus::Finished);
        // 7 of 8 seasons are still unfinished
        assert!(!result.record.watched);
        assert!(result.record.season(2).is_none());
    }

    #[tokio::test]
    async fn test_season_updates_pick_the_right_activity() {
        let manager = manager_with(catalog());
        let record = manager
            .create(1, 200, ContentType::Tv, WatchedStatus::Watching, None)
            .await
            .unwrap();
        manager
            .set_season_status(record.id, 1, WatchedStatus::Watching, None)
            .await
            .unwrap();

        let rated = manager
            .set_season_status(record.id, 1, WatchedStatus::Watching, Some(6))
            .await
            .unwrap();
        assert_eq!(rated.added_activity.unwrap().activity_type, ActivityType::SeasonRatingChanged);

        let finished = manager
            .set_season_status(record.id, 1, WatchedStatus::Finished, None)
            .await
            .unwrap();
        assert_eq!(finished.added_activity.unwrap().activity_type, ActivityType::SeasonStatusChanged);
        assert_eq!(finished.seasons[0].rating, Some(6));
        // Unknown season count: every recorded season finished is enough
        assert!(finished.watched);

        let unchanged = manager
            .set_season_status(record.id, 1, WatchedStatus::Finished, None)
            .await
            .unwrap();
        assert!(unchanged.added_activity.is_none());

        let removed = manager.remove_season(record.id, 1).await.unwrap();
        assert!(removed.seasons.is_empty());
        assert_eq!(removed.added_activity.unwrap().activity_type, ActivityType::SeasonRemoved);
    }

    #[tokio::test]
    async fn test_seasons_on_movies_are_rejected() {
        let manager = manager_with(catalog());
        let record = manager
            .create(1, 438631, ContentType::Movie, WatchedStatus::Watching, None)
            .await
            .unwrap();
        let err = manager
            .set_season_status(record.id, 1, WatchedStatus::Finished, None)
            .await
            .unwrap_err();
        assert!(matches!(err, WatchError::NotATvShow(id) if id == record.id));
    }

    #[tokio::test]
    async fn test_delete_keeps_history_out_of_default_listing() {
        let manager = manager_with(catalog());
        let record = manager
            .create(1, 100, ContentType::Tv, WatchedStatus::Watching, None)
            .await
            .unwrap();
        manager
            .set_season_status(record.id, 1, WatchedStatus::Finished, None)
            .await
            .unwrap();
        manager.delete(record.id).await.unwrap();

        assert!(manager.get(record.id).await.unwrap_err().is_not_found());
        assert!(manager.list_activity(record.id, false).await.unwrap_err().is_not_found());
        let history = manager.list_activity(record.id, true).await.unwrap();
        assert_eq!(history.last().unwrap().activity_type, ActivityType::RemovedWatched);

        let err = manager
            .add_activity(record.id, ActivityType::Custom, "{}", None)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        // The key is free again
        manager
            .create(1, 100, ContentType::Tv, WatchedStatus::Planned, None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_observer_sees_creation_and_transitions() {
        let observer = Arc::new(RecordingObserver::default());
        let manager = WatchRecordManager::new(Arc::new(MemoryStore::new()), Arc::new(catalog()))
            .with_observer(observer.clone());
        let record = manager
            .create(1, 438631, ContentType::Movie, WatchedStatus::Planned, None)
            .await
            .unwrap();
        manager
            .update(record.id, RecordPatch { rating: Some(5), ..RecordPatch::default() })
            .await
            .unwrap();
        manager
            .update(record.id, RecordPatch { status: Some(WatchedStatus::Dropped), ..RecordPatch::default() })
            .await
            .unwrap();

        let calls = observer.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                (None, WatchedStatus::Planned),
                (Some(WatchedStatus::Planned), WatchedStatus::Dropped),
            ]
        );
    }

    #[tokio::test]
    async fn test_profile_counts_watched_records() {
        let manager = manager_with(catalog());
        manager
            .create(1, 438631, ContentType::Movie, WatchedStatus::Finished, None)
            .await
            .unwrap();
        manager
            .create(1, 1399, ContentType::Tv, WatchedStatus::Finished, None)
            .await
            .unwrap();
        manager
            .create(1, 100, ContentType::Tv, WatchedStatus::Watching, None)
            .await
            .unwrap();

        let profile = manager.profile(1).await.unwrap();
        assert_eq!(profile, Profile { movies_watched: 1, shows_watched: 1 });
        assert_eq!(manager.profile(2).await.unwrap(), Profile::default());
    }
}
