use async_trait::async_trait;
use watch_state_models::{CatalogSearchResult, Content, ContentType};
use crate::error::CatalogError;

/// Read-only view of the remote metadata catalog.
///
/// Both calls block on network I/O. Implementations do not retry; callers
/// decide whether a failure is worth another attempt.
#[async_trait]
pub trait CatalogGateway: Send + Sync {
    fn provider_name(&self) -> &str;

    /// Text search, first page only, in the catalog's relevance order.
    ///
    /// `content_type` narrows the search to one type; `year` is passed to the
    /// catalog as a hint and may or may not be honoured by it.
    async fn search(
        &self,
        query: &str,
        content_type: Option<ContentType>,
        year: Option<i32>,
    ) -> Result<Vec<CatalogSearchResult>, CatalogError>;

    /// Full content snapshot. `CatalogError::NotFound` when the id no longer resolves.
    async fn fetch_details(
        &self,
        catalog_id: u64,
        content_type: ContentType,
    ) -> Result<Content, CatalogError>;
}
