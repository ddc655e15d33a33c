use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    db::KeyValueStore,
    error::{AppError, AppResult},
    models::{AnalysisResult, MovieDetails, MovieSelection},
    services::{
        posters::{lay_out_posters, PlacedPoster},
        providers::{details_for_title, AnalysisProvider, MetadataProvider},
        wordcloud::chart_option,
    },
};

/// Session key for the most recent analysis
pub const LAST_ANALYSIS_KEY: &str = "lastAnalysis";

/// Everything the analysis view renders
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub movies: Vec<String>,
    pub result: AnalysisResult,
    /// Word-cloud chart option; `None` when there were no keywords to draw
    pub chart: Option<Value>,
    #[serde(skip)]
    pub posters: Vec<PlacedPoster>,
    /// Details resolved for each recommendation, keyed by title
    pub details: BTreeMap<String, MovieDetails>,
}

impl Analysis {
    /// Stores the analysis so later commands can file its recommendations
    pub fn save(&self, store: &dyn KeyValueStore) -> AppResult<()> {
        store.set(LAST_ANALYSIS_KEY, &serde_json::to_string(self)?)
    }

    /// The stored analysis, if one is present and readable
    pub fn load(store: &dyn KeyValueStore) -> Option<Self> {
        let raw = store.get(LAST_ANALYSIS_KEY).ok().flatten()?;
        serde_json::from_str(&raw)
            .map_err(|e| tracing::warn!(error = %e, "Discarding unreadable stored analysis"))
            .ok()
    }
}

/// Runs the analysis flow: model call, word cloud, posters, details
pub struct Analyzer {
    analysis_provider: Arc<dyn AnalysisProvider>,
    metadata_provider: Arc<dyn MetadataProvider>,
}

impl Analyzer {
    pub fn new(
        analysis_provider: Arc<dyn AnalysisProvider>,
        metadata_provider: Arc<dyn MetadataProvider>,
    ) -> Self {
        Self {
            analysis_provider,
            metadata_provider,
        }
    }

    /// Analyzes the selection
    ///
    /// Only the model call can fail the analysis. Word-cloud, poster and
    /// details problems degrade to missing pieces.
    pub async fn run(&self, selection: &MovieSelection) -> AppResult<Analysis> {
        if selection.is_empty() {
            return Err(AppError::InvalidInput(
                "No movies selected. Please go back and select at least three movies.".to_string(),
            ));
        }

        let movies = selection.titles().to_vec();
        tracing::info!(
            movies = ?movies,
            provider = self.analysis_provider.name(),
            "Starting analysis"
        );

        let result = self.analysis_provider.analyze(&movies).await?;

        let chart = match chart_option(&result.keywords) {
            Ok(chart) => Some(chart),
            Err(e) => {
                tracing::warn!(error = %e, "Skipping word cloud");
                None
            }
        };

        let recommended: Vec<String> = result
            .recommendations
            .iter()
            .map(|rec| rec.title.clone())
            .collect();

        let (posters, details) = tokio::join!(
            lay_out_posters(self.metadata_provider.clone(), &recommended, &movies),
            self.resolve_details(&recommended),
        );

        tracing::info!(
            posters = posters.len(),
            details = details.len(),
            "Analysis assembled"
        );

        Ok(Analysis {
            movies,
            result,
            chart,
            posters,
            details,
        })
    }

    async fn resolve_details(&self, titles: &[String]) -> BTreeMap<String, MovieDetails> {
        let mut tasks = Vec::new();

        for title in titles {
            let provider = self.metadata_provider.clone();
            let title = title.clone();
            tasks.push(tokio::spawn(async move {
                let details = details_for_title(provider.as_ref(), &title).await;
                (title, details)
            }));
        }

        let mut resolved = BTreeMap::new();
        for task in tasks {
            match task.await {
                Ok((title, Some(details))) => {
                    resolved.insert(title, details);
                }
                Ok((_, None)) => {}
                Err(e) => tracing::error!(error = %e, "Details task join error"),
            }
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{Keyword, OmdbMovie, OmdbSearchHit, Recommendation};
    use crate::services::providers::{MockAnalysisProvider, MockMetadataProvider};

    fn selection() -> MovieSelection {
        MovieSelection::from_inputs(["Inception", "Heat", "Alien"]).unwrap()
    }

    fn canned_result(keywords: Vec<Keyword>) -> AnalysisResult {
        AnalysisResult {
            keywords,
            common_points: Some("Tension".to_string()),
            recommendations: vec![Recommendation {
                title: "Memento".to_string(),
                reason: "Puzzle box".to_string(),
            }],
        }
    }

    fn metadata() -> MockMetadataProvider {
        let mut provider = MockMetadataProvider::new();
        provider.expect_search().returning(|query| {
            Ok(vec![OmdbSearchHit {
                title: query.to_string(),
                year: "2000".to_string(),
                imdb_id: format!("id-{}", query),
                poster: format!("https://img/{}.jpg", query),
            }])
        });
        provider.expect_movie().returning(|id| {
            Ok(OmdbMovie {
                title: id.trim_start_matches("id-").to_string(),
                year: "2000".to_string(),
                genre: "Mystery".to_string(),
                plot: String::new(),
                poster: String::new(),
                imdb_rating: "8.4".to_string(),
                imdb_id: id.to_string(),
                response: "True".to_string(),
                error: None,
            })
        });
        provider
    }

    #[tokio::test]
    async fn test_run_assembles_everything() {
        let mut analysis_provider = MockAnalysisProvider::new();
        analysis_provider.expect_name().return_const("mock");
        analysis_provider
            .expect_analyze()
            .withf(|movies| movies.len() == 3)
            .returning(|_| {
                Ok(canned_result(vec![Keyword {
                    name: "Memory".to_string(),
                    value: 70.0,
                    category: "Theme".to_string(),
                }]))
            });

        let analyzer = Analyzer::new(Arc::new(analysis_provider), Arc::new(metadata()));
        let analysis = analyzer.run(&selection()).await.unwrap();

        assert_eq!(analysis.movies, ["Inception", "Heat", "Alien"]);
        assert!(analysis.chart.is_some());
        assert_eq!(analysis.posters.len(), 4);
        assert_eq!(analysis.posters[0].title, "Memento");
        assert_eq!(analysis.details["Memento"].imdb_id, "id-Memento");
    }

    #[tokio::test]
    async fn test_run_without_keywords_skips_chart() {
        let mut analysis_provider = MockAnalysisProvider::new();
        analysis_provider.expect_name().return_const("mock");
        analysis_provider
            .expect_analyze()
            .returning(|_| Ok(canned_result(vec![])));

        let analyzer = Analyzer::new(Arc::new(analysis_provider), Arc::new(metadata()));
        let analysis = analyzer.run(&selection()).await.unwrap();
        assert!(analysis.chart.is_none());
        assert_eq!(analysis.result.recommendations.len(), 1);
    }

    #[tokio::test]
    async fn test_run_propagates_model_failure() {
        let mut analysis_provider = MockAnalysisProvider::new();
        analysis_provider.expect_name().return_const("mock");
        analysis_provider
            .expect_analyze()
            .returning(|_| Err(AppError::ExternalApi("HTTP error! status: 500".to_string())));

        let mut metadata = MockMetadataProvider::new();
        metadata.expect_search().never();

        let analyzer = Analyzer::new(Arc::new(analysis_provider), Arc::new(metadata));
        assert!(matches!(
            analyzer.run(&selection()).await,
            Err(AppError::ExternalApi(_))
        ));
    }

    #[tokio::test]
    async fn test_run_empty_selection() {
        let analyzer = Analyzer::new(
            Arc::new(MockAnalysisProvider::new()),
            Arc::new(MockMetadataProvider::new()),
        );
        assert!(matches!(
            analyzer.run(&MovieSelection::default()).await,
            Err(AppError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_save_and_load_analysis() {
        let store = MemoryStore::new();
        let analysis = Analysis {
            movies: vec!["Heat".to_string()],
            result: canned_result(vec![]),
            chart: None,
            posters: vec![],
            details: BTreeMap::from([("Memento".to_string(), MovieDetails::default())]),
        };

        analysis.save(&store).unwrap();
        assert_eq!(Analysis::load(&store), Some(analysis));

        store.set(LAST_ANALYSIS_KEY, "garbage").unwrap();
        assert_eq!(Analysis::load(&store), None);
    }
}
