use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use stepflow_core::config::SearchApiConfig;
use stepflow_core::error::ToolError;
use stepflow_core::executor::{TextTool, ToolRequest};

use super::http::{auth, build_client, endpoint, send_json};

#[derive(Debug, Serialize)]
struct SearchPayload<'a> {
    query: &'a str,
    max_results: u32,
}

#[derive(Debug, Default, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default = "untitled")]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: String,
}

fn untitled() -> String {
    "Untitled".to_string()
}

/// Web search against a Tavily-compatible `/search` endpoint.
pub struct WebSearchTool {
    http: reqwest::Client,
    api_key: String,
    url_search: String,
    max_results: u32,
}

impl WebSearchTool {
    pub fn new(cfg: &SearchApiConfig) -> anyhow::Result<Self> {
        Ok(Self {
            http: build_client(cfg.timeout_ms)?,
            api_key: cfg.api_key.clone(),
            url_search: endpoint(&cfg.base_url, "search"),
            max_results: cfg.max_results,
        })
    }
}

#[async_trait]
impl TextTool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    async fn invoke(&self, request: &ToolRequest) -> Result<String, ToolError> {
        let url = &self.url_search;
        tracing::debug!(url = %url, query_len = request.input.len(), max_results = self.max_results, "search request");

        let req = self.http.post(url).json(&SearchPayload {
            query: &request.input,
            max_results: self.max_results,
        });
        let resp: SearchResponse = send_json(auth(req, &self.api_key), url).await?;

        tracing::debug!(hits = resp.results.len(), "search response");
        Ok(format_hits(&resp.results))
    }
}

fn format_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No results found.".to_string();
    }

    hits.iter()
        .map(|h| format!("**{}**\nURL: {}\n{}", h.title, h.url, h.content))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}
