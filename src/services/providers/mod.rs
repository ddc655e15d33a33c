//! External data providers
//!
//! Movie metadata (search, details, posters) and the generative analysis are
//! both reached over HTTP. Each sits behind a trait so orchestration can be
//! tested against mocks.

use crate::{
    error::AppResult,
    models::{AnalysisResult, MovieDetails, OmdbMovie, OmdbSearchHit},
};

pub mod gemini;
pub mod omdb;

pub use gemini::GeminiProvider;
pub use omdb::OmdbProvider;

/// Trait for movie metadata providers
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Search for movies by title
    async fn search(&self, query: &str) -> AppResult<Vec<OmdbSearchHit>>;

    /// Fetch the full record for an IMDb identifier
    async fn movie(&self, imdb_id: &str) -> AppResult<OmdbMovie>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Trait for the generative analysis of a movie selection
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Analyze `movies` and suggest recommendations
    async fn analyze(&self, movies: &[String]) -> AppResult<AnalysisResult>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}

/// Poster URL of the best match for `title`
///
/// Never fails: lookup errors and missing posters both yield `None`.
pub async fn poster_for_title(provider: &dyn MetadataProvider, title: &str) -> Option<String> {
    match provider.search(title).await {
        Ok(hits) => hits
            .into_iter()
            .next()
            .map(|hit| hit.poster)
            .filter(|poster| is_usable_poster(poster)),
        Err(e) => {
            tracing::warn!(error = %e, title = %title, "Poster lookup failed");
            None
        }
    }
}

/// Details for the best match of `title`, for filing into a list
pub async fn details_for_title(
    provider: &dyn MetadataProvider,
    title: &str,
) -> Option<MovieDetails> {
    let hit = match provider.search(title).await {
        Ok(hits) => hits.into_iter().next()?,
        Err(e) => {
            tracing::warn!(error = %e, title = %title, "Details search failed");
            return None;
        }
    };

    match provider.movie(&hit.imdb_id).await {
        Ok(movie) => Some(movie.into()),
        Err(e) => {
            tracing::warn!(error = %e, imdb_id = %hit.imdb_id, "Details lookup failed");
            None
        }
    }
}

/// A poster URL worth rendering
pub fn is_usable_poster(poster: &str) -> bool {
    !poster.is_empty() && poster != crate::models::OMDB_NOT_AVAILABLE
}
