//! OMDb API provider
//!
//! Supplies title search (`s=`), full records by IMDb ID (`i=`) and, through
//! them, poster URLs and details records.

use crate::{
    error::{AppError, AppResult},
    models::{OmdbMovie, OmdbSearchHit, OmdbSearchResponse},
    services::providers::MetadataProvider,
};
use reqwest::Client as HttpClient;

#[derive(Clone)]
pub struct OmdbProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
}

impl OmdbProvider {
    pub fn new(api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    /// Issues a GET against the API root with the key and `params` attached
    async fn get_json(&self, params: &[(&str, &str)]) -> AppResult<serde_json::Value> {
        let url = format!("{}/", self.api_url);
        let mut query = vec![("apikey", self.api_key.as_str())];
        query.extend_from_slice(params);

        let response = self.http_client.get(&url).query(&query).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OMDb API returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

/// Maps OMDb's in-band `"Response": "False"` to an error
fn check_response(response: &str, error: Option<&str>) -> AppResult<()> {
    if response.eq_ignore_ascii_case("false") {
        return Err(AppError::NotFound(
            error.unwrap_or("No results").to_string(),
        ));
    }
    Ok(())
}

pub(crate) fn parse_search(value: serde_json::Value) -> AppResult<Vec<OmdbSearchHit>> {
    let parsed: OmdbSearchResponse = serde_json::from_value(value)
        .map_err(|e| AppError::ExternalApi(format!("Invalid OMDb search response: {}", e)))?;
    check_response(&parsed.response, parsed.error.as_deref())?;
    Ok(parsed.search)
}

pub(crate) fn parse_movie(value: serde_json::Value) -> AppResult<OmdbMovie> {
    let movie: OmdbMovie = serde_json::from_value(value)
        .map_err(|e| AppError::ExternalApi(format!("Invalid OMDb movie response: {}", e)))?;
    check_response(&movie.response, movie.error.as_deref())?;
    Ok(movie)
}

#[async_trait::async_trait]
impl MetadataProvider for OmdbProvider {
    async fn search(&self, query: &str) -> AppResult<Vec<OmdbSearchHit>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Search query cannot be empty".to_string(),
            ));
        }

        let value = self.get_json(&[("s", query)]).await?;
        let hits = parse_search(value)?;

        tracing::info!(
            query = %query,
            results = hits.len(),
            provider = "omdb",
            "Title search completed"
        );

        Ok(hits)
    }

    async fn movie(&self, imdb_id: &str) -> AppResult<OmdbMovie> {
        if imdb_id.trim().is_empty() {
            return Err(AppError::InvalidInput("IMDb ID cannot be empty".to_string()));
        }

        let value = self.get_json(&[("i", imdb_id)]).await?;
        let movie = parse_movie(value)?;

        tracing::debug!(imdb_id = %imdb_id, title = %movie.title, "Movie fetched");

        Ok(movie)
    }

    fn name(&self) -> &'static str {
        "omdb"
    }
}
