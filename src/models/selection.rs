use serde::{Deserialize, Serialize};

use crate::db::KeyValueStore;
use crate::error::{AppError, AppResult};

/// Session key holding the user's chosen titles
pub const SELECTED_MOVIES_KEY: &str = "selectedMovies";

/// Fewest titles an analysis can run on
pub const MIN_SELECTED_MOVIES: usize = 3;

/// The titles a user picked as the basis for an analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieSelection {
    titles: Vec<String>,
}

impl MovieSelection {
    /// Builds a selection from raw input fields
    ///
    /// Inputs are trimmed and blank ones dropped; at least
    /// [`MIN_SELECTED_MOVIES`] must remain.
    pub fn from_inputs<I, S>(inputs: I) -> AppResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let titles: Vec<String> = inputs
            .into_iter()
            .map(|input| input.as_ref().trim().to_string())
            .filter(|input| !input.is_empty())
            .collect();

        if titles.len() < MIN_SELECTED_MOVIES {
            return Err(AppError::InvalidInput(
                "Please search for at least 3 movies before continuing.".to_string(),
            ));
        }

        Ok(Self { titles })
    }

    pub fn titles(&self) -> &[String] {
        &self.titles
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Persists the selection under [`SELECTED_MOVIES_KEY`]
    pub fn save(&self, store: &dyn KeyValueStore) -> AppResult<()> {
        let json = serde_json::to_string(self)?;
        store.set(SELECTED_MOVIES_KEY, &json)?;
        tracing::info!(count = self.titles.len(), "Movies stored in session");
        Ok(())
    }

    /// Reads the stored selection; missing or unreadable data yields an empty one
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let raw = match store.get(SELECTED_MOVIES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::default(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read session selection");
                return Self::default();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Discarding malformed session selection");
            Self::default()
        })
    }
}
