use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use watch_state_catalog::{CatalogError, CatalogGateway};
use watch_state_models::{
    Activity, ActivityType, CatalogSearchResult, Content, ContentType, WatchRecord,
};
use crate::error::WatchError;
use crate::store::{MemoryStore, NewWatchRecord, RecordKey, WatchStore};

pub fn movie(catalog_id: u64, title: &str, year: i32) -> Content {
    Content {
        catalog_id,
        title: title.to_string(),
        poster_path: None,
        overview: None,
        content_type: ContentType::Movie,
        release_date: NaiveDate::from_ymd_opt(year, 1, 1),
        season_count: None,
    }
}

pub fn show(catalog_id: u64, title: &str, season_count: Option<u32>) -> Content {
    Content {
        catalog_id,
        title: title.to_string(),
        poster_path: None,
        overview: None,
        content_type: ContentType::Tv,
        release_date: NaiveDate::from_ymd_opt(2011, 4, 17),
        season_count,
    }
}

pub fn hit(content: &Content) -> CatalogSearchResult {
    CatalogSearchResult {
        catalog_id: content.catalog_id,
        title: content.title.clone(),
        content_type: content.content_type,
        release_date: content.release_date,
        poster_path: None,
        overview: None,
        popularity: None,
    }
}

/// In-memory catalog: searches match titles case-insensitively, in insertion order.
#[derive(Default)]
pub struct FakeCatalog {
    items: Vec<Content>,
    /// Per-title search latency
    delays: HashMap<String, Duration>,
    details_delay: Option<Duration>,
    fail_search: bool,
    fail_details: bool,
    search_calls: AtomicUsize,
    details_calls: AtomicUsize,
    searches_in_flight: AtomicUsize,
    peak_searches: AtomicUsize,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, content: Content) -> Self {
        self.items.push(content);
        self
    }

    pub fn with_search_delay(mut self, title: &str, delay: Duration) -> Self {
        self.delays.insert(title.to_lowercase(), delay);
        self
    }

    pub fn with_details_delay(mut self, delay: Duration) -> Self {
        self.details_delay = Some(delay);
        self
    }

    pub fn failing_search(mut self) -> Self {
        self.fail_search = true;
        self
    }

    /// Searches still succeed, detail lookups answer 502
    pub fn failing_details(mut self) -> Self {
        self.fail_details = true;
        self
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn details_calls(&self) -> usize {
        self.details_calls.load(Ordering::SeqCst)
    }

    /// Highest number of searches seen running at the same time
    pub fn peak_searches(&self) -> usize {
        self.peak_searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogGateway for FakeCatalog {
    fn provider_name(&self) -> &str {
        "fake"
    }

    async fn search(
        &self,
        query: &str,
        content_type: Option<ContentType>,
        _year: Option<i32>,
    ) -> Result<Vec<CatalogSearchResult>, CatalogError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        let running = self.searches_in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_searches.fetch_max(running, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&query.to_lowercase()) {
            tokio::time::sleep(*delay).await;
        }
        self.searches_in_flight.fetch_sub(1, Ordering::SeqCst);
        if self.fail_search {
            return Err(CatalogError::Status {
                status: 503,
                message: "service unavailable".to_string(),
            });
        }
        // Year is only a hint to the real endpoints, so it is ignored here
        Ok(self
            .items
            .iter()
            .filter(|c| c.title.eq_ignore_ascii_case(query))
            .filter(|c| content_type.map_or(true, |t| t == c.content_type))
            .map(hit)
            .collect())
    }

    async fn fetch_details(
        &self,
        catalog_id: u64,
        content_type: ContentType,
    ) -> Result<Content, CatalogError> {
        self.details_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.details_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_details {
            return Err(CatalogError::Status {
                status: 502,
                message: "bad gateway".to_string(),
            });
        }
        self.items
            .iter()
            .find(|c| c.catalog_id == catalog_id && c.content_type == content_type)
            .cloned()
            .ok_or(CatalogError::NotFound {
                catalog_id,
                content_type,
            })
    }
}

/// `MemoryStore` that refuses to append one kind of activity
pub struct RejectingActivityStore {
    inner: MemoryStore,
    rejected: ActivityType,
}

impl RejectingActivityStore {
    pub fn new(rejected: ActivityType) -> Self {
        Self {
            inner: MemoryStore::new(),
            rejected,
        }
    }
}

#[async_trait]
impl WatchStore for RejectingActivityStore {
    async fn insert_record(&self, new: NewWatchRecord) -> Result<WatchRecord, WatchError> {
        self.inner.insert_record(new).await
    }

    async fn get_record(&self, record_id: u64) -> Result<Option<WatchRecord>, WatchError> {
        self.inner.get_record(record_id).await
    }

    async fn find_record(&self, key: RecordKey) -> Result<Option<WatchRecord>, WatchError> {
        self.inner.find_record(key).await
    }

    async fn list_records(&self, user_id: u64) -> Result<Vec<WatchRecord>, WatchError> {
        self.inner.list_records(user_id).await
    }

    async fn save_record(&self, record: &WatchRecord) -> Result<(), WatchError> {
        self.inner.save_record(record).await
    }

    async fn allocate_season_id(&self) -> Result<u64, WatchError> {
        self.inner.allocate_season_id().await
    }

    async fn append_activity(
        &self,
        watch_record_id: u64,
        activity_type: ActivityType,
        data: String,
        custom_date: Option<DateTime<Utc>>,
    ) -> Result<Activity, WatchError> {
        if activity_type == self.rejected {
            return Err(WatchError::NotFound(format!(
                "activity log of watch record {}",
                watch_record_id
            )));
        }
        self.inner
            .append_activity(watch_record_id, activity_type, data, custom_date)
            .await
    }

    async fn list_activity(&self, watch_record_id: u64) -> Result<Vec<Activity>, WatchError> {
        self.inner.list_activity(watch_record_id).await
    }
}
