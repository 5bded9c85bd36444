use crate::traits::{LlmClient, LlmResponse};
use askweb_common::{AskwebError, Result};
use askweb_http::{HttpClient, HttpError, RequestOpts};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

const OLLAMA_CONNECTION_HINT: &str =
    "is the Ollama server running? Start it with `ollama serve` (https://github.com/ollama/ollama)";

/// Sampling temperature sent with every generation request.
pub const GENERATE_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<ModelTag>,
}

#[derive(Debug, Deserialize)]
struct ModelTag {
    name: String,
}

/// Ollama client for local model inference.
///
/// Construction does no I/O; the first request is the first contact with
/// the server (see https://github.com/ollama/ollama).
#[derive(Clone)]
pub struct OllamaClient {
    http: HttpClient,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        let http = HttpClient::new(&base_url)
            .map_err(|e| AskwebError::Http(format!("ollama client for {base_url}: {e}")))?;
        Ok(Self {
            http,
            base_url,
            model: model.to_string(),
        })
    }

    /// Base URL without the trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Names of the models installed on the server (`GET /api/tags`).
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let tags: TagsResponse = self
            .http
            .get_json("api/tags", RequestOpts::default())
            .await
            .map_err(http_to_generation)?;
        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<LlmResponse> {
        let started = Instant::now();
        let req = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: GENERATE_TEMPERATURE,
            },
        };

        tracing::info!(
            target: "llm.ollama",
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "ollama.generate.start"
        );

        let resp: GenerateResponse = self
            .http
            .post_json("api/generate", &req, RequestOpts::default())
            .await
            .map_err(|e| {
                tracing::warn!(
                    target: "llm.ollama",
                    model = %self.model,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    error = %e,
                    "ollama.generate.error"
                );
                http_to_generation(e)
            })?;

        let text = resp.response.as_deref().unwrap_or("").trim().to_string();
        let tokens_used = resp.eval_count.map(|c| c.min(u32::MAX as u64) as u32);

        tracing::info!(
            target: "llm.ollama",
            model = %self.model,
            answer_chars = text.chars().count(),
            tokens_used = ?tokens_used,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "ollama.generate.success"
        );

        Ok(LlmResponse {
            text,
            model: resp.model.or_else(|| Some(self.model.clone())),
            tokens_used,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match self.list_models().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::warn!(target: "llm.ollama", error = %e, "ollama health check failed");
                Ok(false)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn http_to_generation(e: HttpError) -> AskwebError {
    match e {
        HttpError::Api { status, body, .. } => AskwebError::GenerationStatus {
            status: status.as_u16(),
            body,
        },
        HttpError::Network(msg) => AskwebError::Generation(format!("{msg}; {OLLAMA_CONNECTION_HINT}")),
        other => AskwebError::Generation(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_ollama_schema() {
        let req = GenerateRequest {
            model: "llama3.2:latest",
            prompt: "hi",
            stream: false,
            options: GenerateOptions {
                temperature: GENERATE_TEMPERATURE,
            },
        };
        let v = serde_json::to_value(&req).unwrap();
        assert_eq!(v["model"], "llama3.2:latest");
        assert_eq!(v["prompt"], "hi");
        assert_eq!(v["stream"], false);
        let t = v["options"]["temperature"].as_f64().unwrap();
        assert!((t - 0.2).abs() < 1e-6);
    }

    #[test]
    fn trailing_slash_is_stripped() {
        let c = OllamaClient::new("http://localhost:11434/", "m").unwrap();
        assert_eq!(c.base_url(), "http://localhost:11434");
        assert_eq!(c.model_name(), "m");
    }

    #[test]
    fn api_errors_keep_status_and_body() {
        let err = http_to_generation(HttpError::Api {
            status: askweb_http::StatusCode::NOT_FOUND,
            message: "model not found".into(),
            body: "{\"error\":\"model not found\"}".into(),
            request_id: "r".into(),
        });
        assert_eq!(
            err.to_string(),
            "Ollama error 404: {\"error\":\"model not found\"}"
        );
    }
}
