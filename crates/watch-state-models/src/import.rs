use chrono::{DateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use crate::content::{CatalogSearchResult, ContentType};
use crate::watch_record::WatchRecord;

/// One externally-sourced list item waiting to be reconciled.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportEntry {
    /// Pre-resolved catalog id (skips the title search)
    #[serde(default, alias = "tmdbId")]
    pub catalog_id: Option<u64>,
    pub name: String,
    /// Lists exported by other tools carry the year as a string
    #[serde(default, deserialize_with = "number_or_numeric_string")]
    pub year: Option<i32>,
    #[serde(default, rename = "type", alias = "contentType")]
    pub content_type: Option<ContentType>,
    /// Status in the source's own vocabulary
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub rating_custom_date: Option<DateTime<Utc>>,
}

impl ImportEntry {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Year {
        Number(i32),
        Text(String),
    }

    match Option::<Year>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Year::Number(year)) => Ok(Some(year)),
        Some(Year::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Ok(None);
            }
            text.parse()
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid year '{}'", text)))
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportClassification {
    Success,
    Failed,
    MultiCandidate,
    NotFound,
    AlreadyExists,
}

impl ImportClassification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
            Self::MultiCandidate => "MULTI_CANDIDATE",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
        }
    }
}

impl fmt::Display for ImportClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal result of reconciling one import entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportOutcome {
    #[serde(rename_all = "camelCase")]
    Success {
        matched: Option<CatalogSearchResult>,
        watched_entry: Box<WatchRecord>,
    },
    #[serde(rename_all = "camelCase")]
    Failed {
        error: String,
        candidates: Vec<CatalogSearchResult>,
    },
    #[serde(rename_all = "camelCase")]
    MultiCandidate {
        candidates: Vec<CatalogSearchResult>,
    },
    NotFound,
    #[serde(rename_all = "camelCase")]
    AlreadyExists {
        matched: Option<CatalogSearchResult>,
        watched_entry: Box<WatchRecord>,
    },
}

impl ImportOutcome {
    pub fn classification(&self) -> ImportClassification {
        match self {
            Self::Success { .. } => ImportClassification::Success,
            Self::Failed { .. } => ImportClassification::Failed,
            Self::MultiCandidate { .. } => ImportClassification::MultiCandidate,
            Self::NotFound => ImportClassification::NotFound,
            Self::AlreadyExists { .. } => ImportClassification::AlreadyExists,
        }
    }

    pub fn candidates(&self) -> &[CatalogSearchResult] {
        match self {
            Self::Failed { candidates, .. } | Self::MultiCandidate { candidates } => candidates,
            _ => &[],
        }
    }

    pub fn watched_entry(&self) -> Option<&WatchRecord> {
        match self {
            Self::Success { watched_entry, .. } | Self::AlreadyExists { watched_entry, .. } => {
                Some(watched_entry)
            }
            _ => None,
        }
    }
}
