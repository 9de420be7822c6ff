use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Movie,
    Tv,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Movie => "movie",
            ContentType::Tv => "tv",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "movie" | "film" => Ok(ContentType::Movie),
            "tv" | "show" | "series" => Ok(ContentType::Tv),
            other => Err(format!("Invalid content type: {}. Use 'movie' or 'tv'", other)),
        }
    }
}

/// Snapshot of catalog metadata, denormalized onto each watch record.
///
/// Owned by the catalog; never mutated once copied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Content {
    pub catalog_id: u64,
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    pub content_type: ContentType,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    /// Number of seasons reported by the catalog (tv only)
    #[serde(default)]
    pub season_count: Option<u32>,
}

/// One hit from a catalog text search, in the catalog's relevance order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogSearchResult {
    pub catalog_id: u64,
    pub title: String,
    pub content_type: ContentType,
    #[serde(default)]
    pub release_date: Option<NaiveDate>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    #[serde(default)]
    pub popularity: Option<f64>,
}

impl CatalogSearchResult {
    pub fn release_year(&self) -> Option<i32> {
        self.release_date.map(|d| d.year())
    }
}
