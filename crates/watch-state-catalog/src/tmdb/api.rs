use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use watch_state_models::{CatalogSearchResult, Content, ContentType};
use crate::error::CatalogError;

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Connection settings shared by every TMDB call
#[derive(Debug, Clone)]
pub struct TmdbAuth {
    pub base_url: String,
    pub api_key: String,
    pub language: Option<String>,
}

impl TmdbAuth {
    /// v4 read access tokens are JWTs and go in the Authorization header;
    /// v3 keys go in the query string.
    fn is_bearer_token(&self) -> bool {
        self.api_key.starts_with("eyJ") && self.api_key.contains('.')
    }

    fn request(&self, client: &Client, path: &str, params: &[(&str, String)]) -> RequestBuilder {
        let mut url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let mut query: Vec<String> = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect();
        if let Some(ref language) = self.language {
            query.push(format!("language={}", urlencoding::encode(language)));
        }
        if !self.is_bearer_token() {
            query.push(format!("api_key={}", urlencoding::encode(&self.api_key)));
        }
        if !query.is_empty() {
            url.push('?');
            url.push_str(&query.join("&"));
        }

        let builder = client.get(&url).header("Accept", "application/json");
        if self.is_bearer_token() {
            builder.header("Authorization", format!("Bearer {}", self.api_key))
        } else {
            builder
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Union of the movie, tv and multi search result shapes
#[derive(Debug, Deserialize)]
struct SearchHit {
    id: u64,
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    first_air_date: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    popularity: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    first_air_date: Option<String>,
    #[serde(default)]
    number_of_seasons: Option<u32>,
}

/// TMDB sends "" for unknown dates
fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    raw.filter(|s| !s.is_empty())
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
}

fn empty_to_none(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl SearchHit {
    /// People and unknown media types are dropped
    fn into_result(self, fallback: Option<ContentType>) -> Option<CatalogSearchResult> {
        let content_type = match self.media_type.as_deref() {
            Some("movie") => ContentType::Movie,
            Some("tv") => ContentType::Tv,
            Some(_) => return None,
            None => fallback?,
        };
        let (title, date) = match content_type {
            ContentType::Movie => (self.title.or(self.name), self.release_date),
            ContentType::Tv => (self.name.or(self.title), self.first_air_date),
        };
        Some(CatalogSearchResult {
            catalog_id: self.id,
            title: title.unwrap_or_default(),
            content_type,
            release_date: parse_date(date.as_deref()),
            poster_path: empty_to_none(self.poster_path),
            overview: empty_to_none(self.overview),
            popularity: self.popularity,
        })
    }
}

pub(crate) fn parse_search_page(
    body: &str,
    content_type: Option<ContentType>,
) -> Result<Vec<CatalogSearchResult>, CatalogError> {
    let page: SearchPage = serde_json::from_str(body)?;
    Ok(page
        .results
        .into_iter()
        .filter_map(|hit| hit.into_result(content_type))
        .collect())
}

pub(crate) fn parse_details(body: &str, content_type: ContentType) -> Result<Content, CatalogError> {
    let details: DetailsResponse = serde_json::from_str(body)?;
    let (title, date) = match content_type {
        ContentType::Movie => (details.title.or(details.name), details.release_date),
        ContentType::Tv => (details.name.or(details.title), details.first_air_date),
    };
    Ok(Content {
        catalog_id: details.id,
        title: title.unwrap_or_default(),
        poster_path: empty_to_none(details.poster_path),
        overview: empty_to_none(details.overview),
        content_type,
        release_date: parse_date(date.as_deref()),
        season_count: match content_type {
            ContentType::Tv => details.number_of_seasons,
            ContentType::Movie => None,
        },
    })
}

fn map_send_error(e: reqwest::Error) -> CatalogError {
    if e.is_timeout() {
        CatalogError::Timeout
    } else {
        CatalogError::Http(e)
    }
}

/// Uses the TMDB search endpoints:
/// - GET /search/movie?query={q}&primary_release_year={y}
/// - GET /search/tv?query={q}&first_air_date_year={y}
/// - GET /search/multi?query={q} when no type is known
pub async fn search(
    client: &Client,
    auth: &TmdbAuth,
    query: &str,
    content_type: Option<ContentType>,
    year: Option<i32>,
) -> Result<Vec<CatalogSearchResult>, CatalogError> {
    let mut params = vec![
        ("query", query.trim().to_string()),
        ("include_adult", "false".to_string()),
    ];
    let path = match content_type {
        Some(ContentType::Movie) => {
            if let Some(y) = year {
                params.push(("primary_release_year", y.to_string()));
            }
            "/search/movie"
        }
        Some(ContentType::Tv) => {
            if let Some(y) = year {
                params.push(("first_air_date_year", y.to_string()));
            }
            "/search/tv"
        }
        None => "/search/multi",
    };

    let response = auth
        .request(client, path, &params)
        .send()
        .await
        .map_err(map_send_error)?;

    let status = response.status();
    let body = response.text().await.map_err(map_send_error)?;
    if !status.is_success() {
        warn!("TMDB search failed for '{}': HTTP {} - {}", query, status, body);
        return Err(CatalogError::Status {
            status: status.as_u16(),
            message: body,
        });
    }

    let results = parse_search_page(&body, content_type)?;
    debug!("TMDB search '{}' ({:?}, year {:?}) returned {} result(s)", query, content_type, year, results.len());
    Ok(results)
}

/// GET /movie/{id} or /tv/{id}
pub async fn fetch_details(
    client: &Client,
    auth: &TmdbAuth,
    catalog_id: u64,
    content_type: ContentType,
) -> Result<Content, CatalogError> {
    let path = format!("/{}/{}", content_type.as_str(), catalog_id);
    let response = auth
        .request(client, &path, &[])
        .send()
        .await
        .map_err(map_send_error)?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Err(CatalogError::NotFound { catalog_id, content_type });
    }
    let body = response.text().await.map_err(map_send_error)?;
    if !status.is_success() {
        warn!("TMDB details failed for {} {}: HTTP {} - {}", content_type, catalog_id, status, body);
        return Err(CatalogError::Status {
            status: status.as_u16(),
            message: body,
        });
    }

    parse_details(&body, content_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multi_search_drops_people() {
        let body = r#"{"page":1,"results":[
            {"id":438631,"media_type":"movie","title":"Dune","release_date":"2021-09-15","popularity":90.5},
            {"id":1,"media_type":"person","name":"Frank Herbert"},
            {"id":90228,"media_type":"tv","name":"Dune: Prophecy","first_air_date":"2024-11-17"}
        ]}"#;
        let results = parse_search_page(body, None).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Dune");
        assert_eq!(results[0].release_year(), Some(2021));
        assert_eq!(results[1].content_type, ContentType::Tv);
        assert_eq!(results[1].title, "Dune: Prophecy");
    }

    #[test]
    fn test_parse_typed_search_uses_requested_type() {
        let body = r#"{"results":[{"id":841,"title":"Dune","release_date":"1984-12-14","poster_path":""}]}"#;
        let results = parse_search_page(body, Some(ContentType::Movie)).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content_type, ContentType::Movie);
        assert_eq!(results[0].release_year(), Some(1984));
        assert!(results[0].poster_path.is_none());
    }

    #[test]
    fn test_parse_details_handles_empty_dates() {
        let body = r#"{"id":1399,"name":"Game of Thrones","first_air_date":"","number_of_seasons":8,"overview":"Seven noble families..."}"#;
        let content = parse_details(body, ContentType::Tv).unwrap();
        assert_eq!(content.title, "Game of Thrones");
        assert!(content.release_date.is_none());
        assert_eq!(content.season_count, Some(8));
    }

    #[test]
    fn test_bearer_detection() {
        let v3 = TmdbAuth {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: "0123456789abcdef".to_string(),
            language: None,
        };
        assert!(!v3.is_bearer_token());
        let v4 = TmdbAuth {
            api_key: "eyJhbGciOiJIUzI1NiJ9.eyJhdWQiOiIxMjMifQ.sig".to_string(),
            ..v3
        };
        assert!(v4.is_bearer_token());
    }
}
