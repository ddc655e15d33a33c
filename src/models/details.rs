use serde::{Deserialize, Serialize};

/// Cached metadata for a title, shared across all lists
///
/// Every field defaults to an empty string when the source did not supply it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MovieDetails {
    pub poster: String,
    pub year: String,
    pub rating: String,
    pub genre: String,
    pub plot: String,
    pub imdb_id: String,
}

impl MovieDetails {
    pub fn has_poster(&self) -> bool {
        !self.poster.is_empty()
    }

    /// One-line summary for terminal cards, e.g. `2010 · Sci-Fi · 8.8`
    pub fn summary(&self) -> String {
        [&self.year, &self.genre, &self.rating]
            .into_iter()
            .filter(|part| !part.is_empty())
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" · ")
    }
}
