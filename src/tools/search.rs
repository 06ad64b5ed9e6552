//! Web search tool.
//!
//! Implements the `search-web` MCP tool on top of the DuckDuckGo Instant Answer
//! API. The API returns instant answers rather than a full result page, so a
//! query without answers yields a single result pointing at the search itself.

use crate::error::{DbError, DbResult};
use crate::models::{DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};
use crate::tools::limit::resolve_limit;
use crate::tools::query::EMPTY_QUERY_MESSAGE;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, info};
use url::Url;

/// Default DuckDuckGo Instant Answer endpoint.
pub const DEFAULT_SEARCH_ENDPOINT: &str = "https://api.duckduckgo.com/";

/// Default timeout for one search request.
pub const DEFAULT_SEARCH_TIMEOUT_SECS: u64 = 30;

const USER_AGENT: &str = "local-mcp/1.0";
const TITLE_MAX_CHARS: usize = 60;
const SENTENCE_TITLE_MAX_BYTES: usize = 100;

/// Input for the search tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchInput {
    /// The search query to execute
    pub query: String,
    /// Maximum number of results to return (default: 10, max: 20)
    #[serde(default)]
    pub limit: Option<JsonValue>,
}

/// A single search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub description: String,
}

/// Results of one search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Default, Deserialize)]
struct InstantAnswer {
    #[serde(rename = "AbstractText", default)]
    abstract_text: String,
    #[serde(rename = "AbstractSource", default)]
    abstract_source: String,
    #[serde(rename = "AbstractURL", default)]
    abstract_url: String,
    #[serde(rename = "Results", default)]
    results: Vec<Topic>,
    #[serde(rename = "RelatedTopics", default)]
    related_topics: Vec<Topic>,
}

#[derive(Debug, Default, Deserialize)]
struct Topic {
    #[serde(rename = "Text", default)]
    text: String,
    #[serde(rename = "FirstURL", default)]
    first_url: String,
}

/// Handler for web search.
#[derive(Debug, Clone)]
pub struct SearchToolHandler {
    client: reqwest::Client,
    endpoint: Url,
}

impl SearchToolHandler {
    /// Create a handler that queries `endpoint` with the given request timeout.
    pub fn new(endpoint: &str, request_timeout: Duration) -> DbResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| DbError::internal(format!("invalid search endpoint '{endpoint}': {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| DbError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, endpoint })
    }

    /// Handle the search tool call. Returns one text block for the summary
    /// followed by one per result.
    pub async fn search(&self, input: SearchInput) -> DbResult<Vec<String>> {
        if input.query.trim().is_empty() {
            return Err(DbError::invalid_input(EMPTY_QUERY_MESSAGE));
        }
        let limit = resolve_limit(
            input.limit.as_ref(),
            DEFAULT_SEARCH_LIMIT,
            MAX_SEARCH_LIMIT,
        );

        let response = self.perform_search(&input.query, limit).await?;
        info!(
            query = %input.query,
            results = response.results.len(),
            "Web search completed"
        );
        Ok(format_search_results(&response))
    }

    async fn perform_search(&self, query: &str, limit: u32) -> DbResult<SearchResponse> {
        let search_url = self.search_url(query);
        debug!(url = %search_url, "Sending search request");

        let response = self
            .client
            .get(search_url.clone())
            .send()
            .await
            .map_err(|e| DbError::search(format!("failed to execute search request: {e}")))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(DbError::search(format!(
                "search API returned status {}",
                status.as_u16()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DbError::search(format!("failed to read response body: {e}")))?;
        let answer: InstantAnswer = serde_json::from_slice(&body)
            .map_err(|e| DbError::search(format!("failed to parse search response: {e}")))?;

        let results = extract_search_results(&answer, limit as usize);
        if results.is_empty() {
            return Ok(fallback(query, search_url.as_str()));
        }
        Ok(SearchResponse {
            query: query.to_string(),
            results,
        })
    }

    fn search_url(&self, query: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("format", "json")
            .append_pair("no_html", "1")
            .append_pair("skip_disambig", "1");
        url
    }
}

fn extract_search_results(answer: &InstantAnswer, limit: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();

    if !answer.abstract_text.is_empty() && !answer.abstract_url.is_empty() {
        results.push(SearchResult {
            title: answer.abstract_source.clone(),
            url: answer.abstract_url.clone(),
            description: answer.abstract_text.clone(),
        });
    }

    // Each list stops at its first incomplete entry.
    for topics in [&answer.results, &answer.related_topics] {
        for topic in topics {
            if results.len() >= limit || topic.text.is_empty() || topic.first_url.is_empty() {
                break;
            }
            results.push(SearchResult {
                title: extract_title(&topic.text),
                url: topic.first_url.clone(),
                description: topic.text.clone(),
            });
        }
    }

    results
}

fn fallback(query: &str, search_url: &str) -> SearchResponse {
    SearchResponse {
        query: query.to_string(),
        results: vec![SearchResult {
            title: "DuckDuckGo Search".to_string(),
            url: search_url.to_string(),
            description: format!(
                "No instant answers found for '{query}'. Please visit DuckDuckGo directly for web search results."
            ),
        }],
    }
}

/// Derive a short title from a result's text.
fn extract_title(text: &str) -> String {
    let text = text.trim();

    if let Some(idx) = text.find(" - ").filter(|&idx| idx > 0) {
        return text[..idx].trim().to_string();
    }
    if let Some(idx) = text
        .find(". ")
        .filter(|&idx| idx > 0 && idx < SENTENCE_TITLE_MAX_BYTES)
    {
        return text[..idx].trim().to_string();
    }
    if text.chars().count() > TITLE_MAX_CHARS {
        let head: String = text.chars().take(TITLE_MAX_CHARS).collect();
        return format!("{}...", head.trim());
    }
    text.to_string()
}

fn format_search_results(response: &SearchResponse) -> Vec<String> {
    let mut blocks = Vec::with_capacity(response.results.len() + 1);
    blocks.push(format!(
        "Search results for '{}' ({} results):\n",
        response.query,
        response.results.len()
    ));
    for (i, result) in response.results.iter().enumerate() {
        blocks.push(format!(
            "{}. **{}**\n   URL: {}\n   {}\n",
            i + 1,
            result.title,
            result.url,
            result.description
        ));
    }
    blocks
}
