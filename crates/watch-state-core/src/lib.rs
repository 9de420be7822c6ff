pub mod activity_log;
pub mod error;
pub mod locks;
pub mod manager;
pub mod progress;
pub mod reconciler;
pub mod snapshot;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use activity_log::{ActivityHistory, ActivityLog};
pub use error::WatchError;
pub use manager::{RecordPatch, SeasonUpdate, StatusObserver, UpdateResult, WatchRecordManager};
pub use reconciler::{classify_candidates, CandidateMatch, ImportReconciler};
pub use snapshot::SnapshotStorage;
pub use store::{MemoryStore, NewWatchRecord, RecordKey, StoreSnapshot, WatchStore};
