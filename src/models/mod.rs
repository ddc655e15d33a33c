use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

mod details;
mod selection;

pub use details::MovieDetails;
pub use selection::{MovieSelection, MIN_SELECTED_MOVIES, SELECTED_MOVIES_KEY};

/// A movie title, used as the sole key across all lists
///
/// Titles are compared exactly: no case folding or whitespace trimming.
pub type MovieTitle = String;

/// The four classification buckets a title can be filed into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    Watchlist,
    Favorites,
    Watched,
    Disliked,
}

impl ListType {
    pub const ALL: [ListType; 4] = [
        ListType::Watchlist,
        ListType::Favorites,
        ListType::Watched,
        ListType::Disliked,
    ];

    /// Persisted key name for this list
    pub fn key(self) -> &'static str {
        match self {
            ListType::Watchlist => "watchlist",
            ListType::Favorites => "favorites",
            ListType::Watched => "watched",
            ListType::Disliked => "disliked",
        }
    }

    /// Lists a title must leave when it is added to `self`
    ///
    /// Watchlist, favorites and disliked are mutually exclusive; watched
    /// stands on its own.
    pub fn excludes(self) -> &'static [ListType] {
        match self {
            ListType::Watchlist => &[ListType::Favorites, ListType::Disliked],
            ListType::Favorites => &[ListType::Watchlist, ListType::Disliked],
            ListType::Disliked => &[ListType::Watchlist, ListType::Favorites],
            ListType::Watched => &[],
        }
    }
}

impl Display for ListType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for ListType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "watchlist" => Ok(ListType::Watchlist),
            "favorites" | "favourites" => Ok(ListType::Favorites),
            "watched" => Ok(ListType::Watched),
            "disliked" => Ok(ListType::Disliked),
            other => Err(format!(
                "unknown list '{}', expected one of: watchlist, favorites, watched, disliked",
                other
            )),
        }
    }
}

/// Which lists a title currently belongs to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Membership {
    pub watchlist: bool,
    pub favorites: bool,
    pub watched: bool,
    pub disliked: bool,
}

impl Membership {
    pub fn contains(&self, list: ListType) -> bool {
        match list {
            ListType::Watchlist => self.watchlist,
            ListType::Favorites => self.favorites,
            ListType::Watched => self.watched,
            ListType::Disliked => self.disliked,
        }
    }

    pub fn set(&mut self, list: ListType, member: bool) {
        match list {
            ListType::Watchlist => self.watchlist = member,
            ListType::Favorites => self.favorites = member,
            ListType::Watched => self.watched = member,
            ListType::Disliked => self.disliked = member,
        }
    }

    /// Lists the title is in, in canonical order
    pub fn lists(&self) -> Vec<ListType> {
        ListType::ALL
            .into_iter()
            .filter(|list| self.contains(*list))
            .collect()
    }
}

// ============================================================================
// Analysis Types
// ============================================================================

/// A weighted keyword for the word cloud
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Keyword {
    pub name: String,
    pub value: f64,
    pub category: String,
}

/// A recommended title with the model's rationale
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub title: String,
    #[serde(default)]
    pub reason: String,
}

/// Structured analysis of a movie selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub keywords: Vec<Keyword>,
    pub common_points: Option<String>,
    pub recommendations: Vec<Recommendation>,
}

impl AnalysisResult {
    pub fn common_points_or_default(&self) -> &str {
        self.common_points
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .unwrap_or("No analysis available")
    }
}

// ============================================================================
// OMDb API Types
// ============================================================================

/// One hit from OMDb's `s=` search
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OmdbSearchHit {
    #[serde(rename = "Title")]
    pub title: String,
    #[serde(rename = "Year", default)]
    pub year: String,
    #[serde(rename = "imdbID", default)]
    pub imdb_id: String,
    #[serde(rename = "Poster", default)]
    pub poster: String,
}

/// OMDb search envelope
#[derive(Debug, Clone, Deserialize)]
pub struct OmdbSearchResponse {
    #[serde(rename = "Search", default)]
    pub search: Vec<OmdbSearchHit>,
    #[serde(rename = "Response", default)]
    pub response: String,
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
}

/// Full OMDb record from an `i=` lookup
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OmdbMovie {
    #[serde(rename = "Title", default)]
    pub title: String,
    #[serde(rename = "Year", default)]
    pub year: String,
    #[serde(rename = "Genre", default)]
    pub genre: String,
    #[serde(rename = "Plot", default)]
    pub plot: String,
    #[serde(rename = "Poster", default)]
    pub poster: String,
    #[serde(rename = "imdbRating", default)]
    pub imdb_rating: String,
    #[serde(rename = "imdbID", default)]
    pub imdb_id: String,
    #[serde(rename = "Response", default)]
    pub response: String,
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
}

/// OMDb's placeholder for a missing field
pub const OMDB_NOT_AVAILABLE: &str = "N/A";

impl From<OmdbMovie> for MovieDetails {
    fn from(movie: OmdbMovie) -> Self {
        let clean = |value: String| {
            if value == OMDB_NOT_AVAILABLE {
                String::new()
            } else {
                value
            }
        };

        MovieDetails {
            poster: clean(movie.poster),
            year: clean(movie.year),
            rating: clean(movie.imdb_rating),
            genre: clean(movie.genre),
            plot: clean(movie.plot),
            imdb_id: clean(movie.imdb_id),
        }
    }
}
