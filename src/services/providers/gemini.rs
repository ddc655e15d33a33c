//! Gemini generative-text provider
//!
//! Sends a single prompt asking for a JSON analysis of the selected movies
//! and turns the model's reply into an [`AnalysisResult`].

use crate::{
    error::{AppError, AppResult},
    models::{AnalysisResult, Recommendation},
    services::{providers::AnalysisProvider, wordcloud::normalize_keywords},
};
use reqwest::Client as HttpClient;
use serde_json::{json, Value};

const TEMPERATURE: f64 = 0.7;
const TOP_K: u32 = 40;
const TOP_P: f64 = 0.95;
const MAX_OUTPUT_TOKENS: u32 = 2048;

#[derive(Clone)]
pub struct GeminiProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_url, self.model)
    }
}

/// Prompt asking for the analysis in a fixed JSON shape
pub fn build_prompt(movies: &[String]) -> String {
    format!(
        r#"Analyze these movies in detail: {}.
Please provide a comprehensive analysis including:
1. Common themes, narrative styles, and storytelling elements
2. Shared character archetypes and development patterns
3. Similar production elements and technical aspects
4. Genre overlaps and unique combinations

Based on this analysis, also suggest three new movie recommendations that viewers might enjoy.

Please return the analysis in JSON format with the following structure:
{{
    "keywords": [
        {{"name": "keyword", "value": weight(10-100), "category": "Theme/Genre/Style/Element"}}
    ],
    "commonPoints": "Detailed analysis of common elements and themes",
    "recommendations": [
        {{
            "title": "Movie Title",
            "reason": "Brief explanation of why this movie is recommended"
        }}
    ]
}}

Note: Please provide at least 20 keywords across different categories for a rich word cloud visualization."#,
        movies.join(", ")
    )
}

pub fn build_request_body(prompt: &str) -> Value {
    json!({
        "contents": [{
            "parts": [{ "text": prompt }]
        }],
        "safetySettings": [{
            "category": "HARM_CATEGORY_HARASSMENT",
            "threshold": "BLOCK_NONE"
        }],
        "generationConfig": {
            "temperature": TEMPERATURE,
            "topK": TOP_K,
            "topP": TOP_P,
            "maxOutputTokens": MAX_OUTPUT_TOKENS
        }
    })
}

/// The model's text from `candidates[0].content.parts[0].text`
pub fn extract_text(response: &Value) -> AppResult<&str> {
    response["candidates"][0]["content"]["parts"][0]["text"]
        .as_str()
        .ok_or_else(|| AppError::ExternalApi("Gemini response contained no text".to_string()))
}

/// Removes a Markdown code fence around the JSON, if the model added one
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(open) = trimmed.find("```") else {
        return trimmed;
    };

    let mut body = &trimmed[open + 3..];
    if let Some(rest) = body.strip_prefix("json") {
        body = rest;
    }
    let body = body.trim_start();

    match body.rfind("```") {
        Some(close) if body[close + 3..].trim().is_empty() => body[..close].trim_end(),
        _ => body.trim_end(),
    }
}

/// Parses the model's (possibly fenced) JSON into an analysis
pub fn parse_analysis(text: &str) -> AppResult<AnalysisResult> {
    let cleaned = strip_code_fence(text);
    let value: Value = serde_json::from_str(cleaned).map_err(|e| {
        tracing::error!(error = %e, text = %text, "Failed to parse analysis JSON");
        AppError::ExternalApi(format!("Failed to parse analysis: {}", e))
    })?;

    let keywords = value["keywords"].as_array().ok_or_else(|| {
        AppError::ExternalApi("Invalid keywords data received from API".to_string())
    })?;

    let recommendations = value["recommendations"].as_array().ok_or_else(|| {
        AppError::ExternalApi("Invalid analysis data received".to_string())
    })?;

    let recommendations = recommendations
        .iter()
        .filter_map(|rec| {
            let title = rec["title"].as_str()?.trim();
            if title.is_empty() {
                return None;
            }
            Some(Recommendation {
                title: title.to_string(),
                reason: rec["reason"].as_str().unwrap_or_default().to_string(),
            })
        })
        .collect();

    Ok(AnalysisResult {
        keywords: normalize_keywords(keywords),
        common_points: value["commonPoints"].as_str().map(str::to_string),
        recommendations,
    })
}

#[async_trait::async_trait]
impl AnalysisProvider for GeminiProvider {
    async fn analyze(&self, movies: &[String]) -> AppResult<AnalysisResult> {
        if movies.is_empty() {
            return Err(AppError::InvalidInput(
                "No movies selected. Please go back and select at least three movies.".to_string(),
            ));
        }

        tracing::info!(movies = ?movies, provider = "gemini", "Starting movie analysis");

        let body = build_request_body(&build_prompt(movies));
        let response = self
            .http_client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let details = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %details, "Gemini request failed");
            return Err(AppError::ExternalApi(format!(
                "HTTP error! status: {}, details: {}",
                status.as_u16(),
                details
            )));
        }

        let raw: Value = response.json().await?;
        let text = extract_text(&raw)?;
        tracing::debug!(text = %text, "Raw analysis text");

        let analysis = parse_analysis(text)?;

        tracing::info!(
            keywords = analysis.keywords.len(),
            recommendations = analysis.recommendations.len(),
            provider = "gemini",
            "Analysis completed"
        );

        Ok(analysis)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let provider = GeminiProvider::new(
            "k".to_string(),
            "https://generativelanguage.googleapis.com/v1beta/".to_string(),
            "gemini-2.0-flash".to_string(),
        );
        assert_eq!(
            provider.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn test_prompt_lists_movies() {
        let prompt = build_prompt(&["Heat".to_string(), "Alien".to_string(), "Brazil".to_string()]);
        assert!(prompt.starts_with("Analyze these movies in detail: Heat, Alien, Brazil."));
        assert!(prompt.contains("\"commonPoints\""));
        assert!(prompt.contains("at least 20 keywords"));
    }

    #[test]
    fn test_request_body_generation_config() {
        let body = build_request_body("hello");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["safetySettings"][0]["threshold"], "BLOCK_NONE");
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
    }

    #[test]
    fn test_extract_text() {
        let response = json!({
            "candidates": [{"content": {"parts": [{"text": "{}"}]}}]
        });
        assert_eq!(extract_text(&response).unwrap(), "{}");
        assert!(extract_text(&json!({"candidates": []})).is_err());
    }

    #[test]
    fn test_strip_json_fence() {
        let text = "```json\n{\"a\": 1}\n```\n";
        assert_eq!(strip_code_fence(text), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_bare_fence() {
        assert_eq!(strip_code_fence("```\n[1, 2]\n```"), "[1, 2]");
    }

    #[test]
    fn test_strip_no_fence() {
        assert_eq!(strip_code_fence("  {\"a\": 1}  "), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_unterminated_fence() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}"), "{\"a\": 1}");
    }

    #[test]
    fn test_parse_analysis_fenced() {
        let text = r#"```json
{
  "keywords": [
    {"name": "Dreams", "value": 90, "category": "Theme"},
    {"name": "Heist", "category": "Genre"}
  ],
  "commonPoints": "Layered realities and unreliable memory.",
  "recommendations": [
    {"title": "Memento", "reason": "Nonlinear memory puzzle"},
    {"title": "  ", "reason": "blank title is dropped"},
    {"title": "Paprika"}
  ]
}
```"#;

        let analysis = parse_analysis(text).unwrap();
        assert_eq!(analysis.keywords.len(), 2);
        assert_eq!(analysis.keywords[1].value, 50.0);
        assert_eq!(analysis.common_points_or_default(), "Layered realities and unreliable memory.");
        assert_eq!(analysis.recommendations.len(), 2);
        assert_eq!(analysis.recommendations[1].title, "Paprika");
        assert_eq!(analysis.recommendations[1].reason, "");
    }

    #[test]
    fn test_parse_analysis_missing_keywords() {
        let err = parse_analysis(r#"{"recommendations": []}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid keywords data"));
    }

    #[test]
    fn test_parse_analysis_missing_recommendations() {
        let err = parse_analysis(r#"{"keywords": []}"#).unwrap_err();
        assert!(err.to_string().contains("Invalid analysis data"));
    }

    #[test]
    fn test_parse_analysis_not_json() {
        assert!(matches!(
            parse_analysis("Sorry, I cannot help with that."),
            Err(AppError::ExternalApi(_))
        ));
    }

    #[tokio::test]
    async fn test_analyze_rejects_empty_selection() {
        let provider = GeminiProvider::new(
            "k".to_string(),
            "http://test.local".to_string(),
            "m".to_string(),
        );
        assert!(matches!(
            provider.analyze(&[]).await,
            Err(AppError::InvalidInput(_))
        ));
    }
}
