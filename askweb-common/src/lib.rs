//! Common types and utilities shared across askweb crates.
//!
//! This crate defines the validated [`Query`] newtype, the shared
//! [`AskwebError`] type, and the observability helpers used by every
//! binary. It is intentionally lightweight so that all crates can depend
//! on it without introducing heavy transitive costs.
//!
//! # Overview
//!
//! - [`Query`]: a trimmed, non-empty user question
//! - [`PromptStyle`]: which prompt layout the composer uses
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`AskwebError`] and [`Result`]: Shared error handling
//!
//! # Examples
//!
//! ```rust
//! use askweb_common::{AskwebError, Query};
//!
//! let q = Query::parse("  What is the capital of France?  ").unwrap();
//! assert_eq!(q.as_str(), "What is the capital of France?");
//!
//! assert!(matches!(Query::parse(" \t\n"), Err(AskwebError::Validation(_))));
//! ```
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod observability;

/// Message shown when the user submits an empty question.
pub const EMPTY_QUERY_MESSAGE: &str = "Enter a question";

/// A user question, trimmed and guaranteed non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Query(String);

impl Query {
    /// Trim `raw` and reject it when nothing is left.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AskwebError::Validation(EMPTY_QUERY_MESSAGE.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Query {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Query {
    type Error = AskwebError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<Query> for String {
    fn from(q: Query) -> Self {
        q.0
    }
}

/// How the question and web context are laid out in the prompt.
///
/// `Plain` passes the formatted results and the question straight through;
/// `Cited` prepends an instruction preamble and labels each section so the
/// model cites sources as `[n]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptStyle {
    #[default]
    Plain,
    Cited,
}

impl FromStr for PromptStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" => Ok(Self::Plain),
            "cited" => Ok(Self::Cited),
            other => Err(format!("unknown prompt style: {other} (expected plain|cited)")),
        }
    }
}

/// Error types used across the askweb workspace.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AskwebError {
    /// User input was rejected before any network call.
    #[error("{0}")]
    Validation(String),

    /// The search provider could not be reached or returned garbage.
    #[error("Search error: {0}")]
    Search(String),

    /// The generation endpoint answered with a non-success status.
    #[error("Ollama error {status}: {body}")]
    GenerationStatus { status: u16, body: String },

    /// The generation request failed in transport or decoding.
    #[error("Generation error: {0}")]
    Generation(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Http(String),

    /// No clipboard mechanism accepted the text.
    #[error("Clipboard error: {0}")]
    Clipboard(String),
}

/// Convenient alias for results that use [`AskwebError`].
pub type Result<T> = std::result::Result<T, AskwebError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_trimmed() {
        let q = Query::parse("\n  hello world \t").unwrap();
        assert_eq!(q.as_str(), "hello world");
        assert_eq!(q.to_string(), "hello world");
    }

    #[test]
    fn blank_queries_are_rejected() {
        for raw in ["", " ", "\t\n", "   \r\n  "] {
            let err = Query::parse(raw).unwrap_err();
            assert_eq!(err, AskwebError::Validation(EMPTY_QUERY_MESSAGE.into()));
        }
    }

    #[test]
    fn query_deserialization_validates() {
        let ok: Query = serde_json::from_str("\" Paris? \"").unwrap();
        assert_eq!(ok.as_str(), "Paris?");
        assert!(serde_json::from_str::<Query>("\"  \"").is_err());
    }

    #[test]
    fn prompt_style_parses() {
        assert_eq!("Cited".parse::<PromptStyle>(), Ok(PromptStyle::Cited));
        assert_eq!("plain".parse::<PromptStyle>(), Ok(PromptStyle::Plain));
        assert!("fancy".parse::<PromptStyle>().is_err());
        assert_eq!(PromptStyle::default(), PromptStyle::Plain);
    }

    #[test]
    fn generation_status_renders_code_and_body() {
        let err = AskwebError::GenerationStatus {
            status: 500,
            body: "model not found".into(),
        };
        let text = err.to_string();
        assert!(text.contains("500"));
        assert!(text.contains("model not found"));
    }
}
