use thiserror::Error;
use watch_state_catalog::CatalogError;
use watch_state_models::{ContentType, MAX_RATING};

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("a watch record for {content_type} {catalog_id} already exists (id {existing_id})")]
    Conflict {
        catalog_id: u64,
        content_type: ContentType,
        existing_id: u64,
    },
    #[error("{0} not found")]
    NotFound(String),
    #[error("rating {0} is out of bounds (0-{})", MAX_RATING)]
    InvalidRating(u8),
    #[error("catalog lookup failed: {0}")]
    CatalogLookupFailed(#[from] CatalogError),
    #[error("watch record {0} is not a tv show, seasons cannot be tracked")]
    NotATvShow(u64),
}

impl WatchError {
    pub fn record_not_found(record_id: u64) -> Self {
        WatchError::NotFound(format!("watch record {}", record_id))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, WatchError::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WatchError::NotFound(_))
    }

    /// Short category used to group failures in import summaries
    pub fn category(&self) -> &'static str {
        match self {
            WatchError::Conflict { .. } => "conflict",
            WatchError::NotFound(_) => "not_found",
            WatchError::InvalidRating(_) => "invalid_rating",
            WatchError::CatalogLookupFailed(_) => "catalog",
            WatchError::NotATvShow(_) => "not_a_show",
        }
    }
}
