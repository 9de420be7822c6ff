use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use watch_state_catalog::{CatalogError, CatalogGateway};
use watch_state_config::{default_status_vocabulary, StatusVocabulary};
use watch_state_models::{
    Activity, ActivityType, CatalogSearchResult, ContentType, ImportEntry, ImportOutcome,
};
use crate::error::WatchError;
use crate::manager::WatchRecordManager;
use crate::progress::ProgressTracker;

/// Result of narrowing search results down for one entry
#[derive(Debug, Clone, PartialEq)]
pub enum CandidateMatch {
    Empty,
    Single(CatalogSearchResult),
    Ambiguous(Vec<CatalogSearchResult>),
}

/// Narrow catalog hits by type and year, keeping catalog relevance order.
///
/// With a year, only hits released that year are kept. When none is, the year
/// stops filtering and the type-filtered list is narrowed as is.
pub fn classify_candidates(
    results: Vec<CatalogSearchResult>,
    content_type: Option<ContentType>,
    year: Option<i32>,
) -> CandidateMatch {
    let typed: Vec<CatalogSearchResult> = results
        .into_iter()
        .filter(|r| content_type.map_or(true, |t| r.content_type == t))
        .collect();

    let exact: Vec<CatalogSearchResult> = match year {
        Some(year) => typed
            .iter()
            .filter(|r| r.release_year() == Some(year))
            .cloned()
            .collect(),
        None => Vec::new(),
    };
    if exact.is_empty() {
        narrow(typed)
    } else {
        narrow(exact)
    }
}

fn narrow(mut results: Vec<CatalogSearchResult>) -> CandidateMatch {
    match results.len() {
        0 => CandidateMatch::Empty,
        1 => CandidateMatch::Single(results.remove(0)),
        _ => CandidateMatch::Ambiguous(results),
    }
}

/// Resolves imported list entries against the catalog and materializes the
/// unambiguous ones as watch records.
pub struct ImportReconciler {
    manager: Arc<WatchRecordManager>,
    catalog: Arc<dyn CatalogGateway>,
    vocabulary: StatusVocabulary,
}

impl ImportReconciler {
    pub fn new(manager: Arc<WatchRecordManager>, catalog: Arc<dyn CatalogGateway>) -> Self {
        Self {
            manager,
            catalog,
            vocabulary: default_status_vocabulary(),
        }
    }

    pub fn with_vocabulary(mut self, vocabulary: StatusVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    /// Reconcile a single entry. Never fails: problems become `FAILED` outcomes.
    pub async fn reconcile(&self, user_id: u64, entry: &ImportEntry) -> ImportOutcome {
        self.reconcile_entry(user_id, entry).await.0
    }

    /// Outcome plus the error category when it failed
    #[instrument(skip(self, entry), fields(name = %entry.name))]
    async fn reconcile_entry(
        &self,
        user_id: u64,
        entry: &ImportEntry,
    ) -> (ImportOutcome, Option<&'static str>) {
        if let Some(catalog_id) = entry.catalog_id {
            let content_type = entry.content_type.unwrap_or(ContentType::Movie);
            debug!("Entry is pre-resolved to {} {}", content_type, catalog_id);
            return self.materialize(user_id, entry, catalog_id, content_type, None).await;
        }

        let query = entry.name.trim();
        if query.is_empty() {
            return (
                ImportOutcome::Failed {
                    error: "entry has neither a name nor a catalog id".to_string(),
                    candidates: Vec::new(),
                },
                Some("invalid_entry"),
            );
        }

        let timeout = self.manager.catalog_timeout();
        let searched = tokio::time::timeout(
            timeout,
            self.catalog.search(query, entry.content_type, entry.year),
        )
        .await
        .unwrap_or(Err(CatalogError::Timeout));
        let results = match searched {
            Ok(results) => results,
            Err(e) => {
                warn!("Catalog search for '{}' failed: {}", query, e);
                return (
                    ImportOutcome::Failed {
                        error: WatchError::from(e).to_string(),
                        candidates: Vec::new(),
                    },
                    Some("catalog"),
                );
            }
        };

        match classify_candidates(results, entry.content_type, entry.year) {
            CandidateMatch::Empty => {
                debug!("No catalog match for '{}'", query);
                (ImportOutcome::NotFound, None)
            }
            CandidateMatch::Ambiguous(candidates) => {
                debug!("'{}' matched {} candidates", query, candidates.len());
                (ImportOutcome::MultiCandidate { candidates }, None)
            }
            CandidateMatch::Single(matched) => {
                let (catalog_id, content_type) = (matched.catalog_id, matched.content_type);
                self.materialize(user_id, entry, catalog_id, content_type, Some(matched)).await
            }
        }
    }

    async fn materialize(
        &self,
        user_id: u64,
        entry: &ImportEntry,
        catalog_id: u64,
        content_type: ContentType,
        matched: Option<CatalogSearchResult>,
    ) -> (ImportOutcome, Option<&'static str>) {
        match self.manager.find(user_id, catalog_id, content_type).await {
            Ok(Some(existing)) => return self.already_exists(existing.id, matched).await,
            Ok(None) => {}
            Err(e) => return failed(e, matched),
        }

        let status = self.vocabulary.map_state(entry.state.as_deref());
        let record = match self
            .manager
            .create_imported(user_id, catalog_id, content_type, status, entry.rating)
            .await
        {
            Ok(record) => record,
            Err(WatchError::Conflict { existing_id, .. }) => {
                return self.already_exists(existing_id, matched).await;
            }
            Err(e) => return failed(e, matched),
        };

        if let Some(custom_date) = entry.rating_custom_date {
            let data = Activity::change_data(&None::<u8>, &entry.rating);
            if let Err(e) = self
                .manager
                .add_activity(record.id, ActivityType::ImportedRating, data, Some(custom_date))
                .await
            {
                warn!("Could not record imported rating date for watch record {}: {}", record.id, e);
                let category = e.category();
                return (
                    ImportOutcome::Failed {
                        error: format!(
                            "watch record {} was created but its rating date could not be recorded: {}",
                            record.id, e
                        ),
                        candidates: matched.into_iter().collect(),
                    },
                    Some(category),
                );
            }
        }

        let watched_entry = match self.manager.get(record.id).await {
            Ok(fresh) => fresh,
            Err(_) => record,
        };
        (
            ImportOutcome::Success {
                matched,
                watched_entry: Box::new(watched_entry),
            },
            None,
        )
    }

    /// The live record with its history, as `ALREADY_EXISTS`
    async fn already_exists(
        &self,
        record_id: u64,
        matched: Option<CatalogSearchResult>,
    ) -> (ImportOutcome, Option<&'static str>) {
        match self.manager.get(record_id).await {
            Ok(existing) => (
                ImportOutcome::AlreadyExists {
                    matched,
                    watched_entry: Box::new(existing),
                },
                None,
            ),
            Err(e) => failed(e, matched),
        }
    }

    pub async fn reconcile_batch(
        &self,
        user_id: u64,
        entries: &[ImportEntry],
        concurrency: usize,
    ) -> Vec<ImportOutcome> {
        self.reconcile_batch_with(user_id, entries, concurrency, |_, _| {}).await
    }

    /// Reconcile a batch with at most `concurrency` entries in flight.
    ///
    /// Outcome `i` always belongs to entry `i`; `on_outcome` is called in
    /// that same order as results become available.
    #[instrument(skip(self, entries, on_outcome), fields(entries = entries.len()))]
    pub async fn reconcile_batch_with<F>(
        &self,
        user_id: u64,
        entries: &[ImportEntry],
        concurrency: usize,
        mut on_outcome: F,
    ) -> Vec<ImportOutcome>
    where
        F: FnMut(usize, &ImportOutcome),
    {
        let mut tracker = ProgressTracker::new(entries.len(), 25);
        let mut outcomes = Vec::with_capacity(entries.len());

        let mut results = Box::pin(
            stream::iter(entries.iter())
                .map(|entry| self.reconcile_entry(user_id, entry))
                .buffered(concurrency.max(1)),
        );
        while let Some((outcome, error_category)) = results.next().await {
            match error_category {
                Some(category) => tracker.record_failed_with_error(category),
                None => tracker.record(outcome.classification()),
            }
            on_outcome(outcomes.len(), &outcome);
            outcomes.push(outcome);
            tracker.log_progress(outcomes.len());
        }

        tracker.log_summary("Import");
        info!("Reconciled {} import entries for user {}", outcomes.len(), user_id);
        outcomes
    }
}

fn failed(
    error: WatchError,
    matched: Option<CatalogSearchResult>,
) -> (ImportOutcome, Option<&'static str>) {
    warn!("Import entry failed: {}", error);
    let category = error.category();
    (
        ImportOutcome::Failed {
            error: error.to_string(),
            candidates: matched.into_iter().collect(),
        },
        Some(category),
    )
}
