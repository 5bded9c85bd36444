use crate::{SearchResult, WebSearch};
use askweb_common::{AskwebError, Query, Result};
use askweb_http::{Auth, HttpClient, HttpError, RequestOpts};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

pub const SERPER_BASE_URL: &str = "https://google.serper.dev";
const SERPER_KEY_HEADER: &str = "x-api-key";
const LOG_QUERY_MAX: usize = 160;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    q: &'a str,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<SearchResult>,
}

/// Minimal client for the Serper web search API.
#[derive(Clone)]
pub struct SerperClient {
    http: HttpClient,
    auth: Auth,
}

impl SerperClient {
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(SERPER_BASE_URL, api_key)
    }

    /// Point the client at another host (proxies, mock servers).
    pub fn with_base_url(base_url: &str, api_key: &str) -> Result<Self> {
        let http = HttpClient::new(base_url).map_err(|e| AskwebError::Http(e.to_string()))?;
        let auth = Auth::api_key_header(SERPER_KEY_HEADER, api_key)
            .map_err(|e| AskwebError::Config(format!("serper api key: {e}")))?;
        Ok(Self { http, auth })
    }

    pub async fn search(&self, query: &Query) -> Result<Vec<SearchResult>> {
        let query_snippet = snippet(query.as_str());
        let started = Instant::now();
        tracing::info!(
            target: "web.serper",
            query = %query_snippet,
            "serper.search.start"
        );

        let opts = RequestOpts {
            auth: Some(self.auth.clone()),
        };
        let body = SearchRequest { q: query.as_str() };

        match self
            .http
            .post_json::<_, SearchResponse>("search", &body, opts)
            .await
        {
            Ok(resp) => {
                tracing::info!(
                    target: "web.serper",
                    query = %query_snippet,
                    hit_count = resp.organic.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "serper.search.success"
                );
                Ok(resp.organic)
            }
            Err(e) => {
                tracing::warn!(
                    target: "web.serper",
                    query = %query_snippet,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "serper.search.error"
                );
                Err(map_http_error(e))
            }
        }
    }
}

#[async_trait]
impl WebSearch for SerperClient {
    async fn search(&self, query: &Query) -> Result<Vec<SearchResult>> {
        SerperClient::search(self, query).await
    }

    fn provider(&self) -> &str {
        "serper"
    }
}

fn map_http_error(e: HttpError) -> AskwebError {
    match e {
        HttpError::Api { status, body, .. } => {
            AskwebError::Search(format!("HTTP {}: {}", status.as_u16(), body))
        }
        other => AskwebError::Search(other.to_string()),
    }
}

fn snippet(query: &str) -> String {
    if query.chars().count() > LOG_QUERY_MAX {
        let cut: String = query.chars().take(LOG_QUERY_MAX).collect();
        format!("{cut}…")
    } else {
        query.to_string()
    }
}
