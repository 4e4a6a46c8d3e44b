//! Live web search through the Tavily API.
//! Tavily API: https://docs.tavily.com/documentation/api-reference/endpoint/search

use crate::tool::{Tool, ToolArgument};
use async_trait::async_trait;
use concierge_core::config::SearchSettings;
use concierge_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    api_key: &'a str,
    query: &'a str,
    max_results: usize,
    search_depth: &'static str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

/// Tavily-backed web search returning a numbered list of results.
#[derive(Debug, Clone)]
pub struct WebSearchTool {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    max_results: usize,
    timeout: Duration,
}

impl WebSearchTool {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        max_results: usize,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Tool(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            max_results,
            timeout,
        })
    }

    pub fn from_settings(settings: &SearchSettings, timeout: Duration) -> AppResult<Self> {
        let api_key = settings
            .api_key
            .as_deref()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| AppError::Config("TAVILY_API_KEY is not set".to_string()))?;
        Self::new(&settings.endpoint, api_key, settings.max_results, timeout)
    }

    async fn search(&self, query: &str) -> AppResult<Vec<SearchResult>> {
        let url = format!("{}/search", self.endpoint);
        let request = SearchRequest {
            api_key: &self.api_key,
            query,
            max_results: self.max_results,
            search_depth: "advanced",
        };

        tracing::debug!(query = %query, "Sending search request to Tavily");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Timeout(self.timeout)
                } else {
                    AppError::Tool(format!("Failed to send request to Tavily: {}", e))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Tool(format!(
                "Tavily API error ({}): {}",
                status, error_text
            )));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Tool(format!("Failed to parse Tavily response: {}", e)))?;

        Ok(body.results.into_iter().take(self.max_results).collect())
    }
}

fn render_results(query: &str, results: &[SearchResult]) -> String {
    if results.is_empty() {
        return format!("No web results found for \"{}\".", query);
    }

    results
        .iter()
        .enumerate()
        .map(|(i, result)| {
            format!(
                "{}. {}\n   {}\n   {}",
                i + 1,
                result.title,
                result.url,
                result.content.trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "tavily_search_results_json"
    }

    fn description(&self) -> &str {
        "A search engine optimized for comprehensive, accurate, and trusted results. \
         Useful for when you need to answer questions about current events. \
         Input should be a search query."
    }

    fn argument(&self) -> ToolArgument {
        ToolArgument {
            name: "query",
            description: "Search query",
        }
    }

    async fn call(&self, input: &str) -> AppResult<String> {
        let results = self.search(input).await?;
        Ok(render_results(input, &results))
    }
}
