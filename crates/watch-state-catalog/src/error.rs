use thiserror::Error;
use watch_state_models::ContentType;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{content_type} {catalog_id} not found in catalog")]
    NotFound { catalog_id: u64, content_type: ContentType },
    #[error("catalog request timed out")]
    Timeout,
    #[error("catalog request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("catalog returned HTTP {status}: {message}")]
    Status { status: u16, message: String },
    #[error("could not decode catalog response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("catalog is not configured: {0}")]
    NotConfigured(String),
}

impl CatalogError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogError::NotFound { .. })
    }
}
