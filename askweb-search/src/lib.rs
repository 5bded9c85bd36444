//! Web search for prompt augmentation.
//!
//! - Serper (Google results) API client (`serper`)
//! - Web-context formatting for the prompt (`context`)
//!
//! The workflow depends on the [`WebSearch`] trait rather than the concrete
//! client so tests can substitute canned or failing providers.

pub mod context;
pub mod serper;

use askweb_common::{Query, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use context::{MAX_CONTEXT_RESULTS, format_web_context};
pub use serper::SerperClient;

/// One organic search hit. Every field is optional because providers omit
/// them freely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

#[async_trait]
pub trait WebSearch: Send + Sync {
    /// Run one query and return hits in provider order.
    async fn search(&self, query: &Query) -> Result<Vec<SearchResult>>;

    /// Short provider name for logs.
    fn provider(&self) -> &str;
}
