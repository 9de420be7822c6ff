pub mod activity;
pub mod content;
pub mod import;
pub mod profile;
pub mod status;
pub mod watch_record;

pub use activity::{Activity, ActivityType};
pub use content::{CatalogSearchResult, Content, ContentType};
pub use import::{ImportClassification, ImportEntry, ImportOutcome};
pub use profile::Profile;
pub use status::WatchedStatus;
pub use watch_record::{SeasonRecord, WatchRecord, MAX_RATING, rating_in_bounds};
