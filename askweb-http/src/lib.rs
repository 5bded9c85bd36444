//! Minimal JSON HTTP client with safe logging and header-based auth.
//!
//! - Header-based `Auth` per request
//! - Redacts sensitive headers and never logs secret values
//! - One attempt per call: no retries and no timeout
//! - Optional *raw* request/response logging via `ASKWEB_HTTP_RAW=1`
//!
//! Example (no_run):
//! ```no_run
//! # async fn demo() -> Result<(), askweb_http::HttpError> {
//! let client = askweb_http::HttpClient::new("https://api.example.com")?;
//! let got: serde_json::Value = client
//!     .get_json("v1/items", askweb_http::RequestOpts::default())
//!     .await?;
//! # Ok(()) }
//! ```
//!
//! Security: API keys passed through [`Auth::api_key_header`] are sanitized
//! before use, and logs only ever include the auth kind (header/none), not
//! the secret.
//!
//! Observability: structured `tracing` events are emitted for request start,
//! response headers, body snippets (truncated), final errors, and
//! (optionally) raw request/response lines (target `http.raw`).

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, Url};
pub use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use uuid::Uuid;

// ==============================
// Raw logging toggles
// ==============================

const RAW_ENV: &str = "ASKWEB_HTTP_RAW";
const RAW_MAX_BODY: usize = 64 * 1024; // cap raw body logs (64 KiB)
const SNIPPET_MAX: usize = 500;

const SECRET_HEADERS: &[&str] = &["authorization", "x-api-key", "x-subscription-token"];

fn raw_enabled() -> bool {
    matches!(
        env::var(RAW_ENV).as_deref(),
        Ok("1") | Ok("true") | Ok("yes")
    )
}

fn is_secret_header(name: &str) -> bool {
    SECRET_HEADERS
        .iter()
        .any(|secret| name.eq_ignore_ascii_case(secret))
}

/// Render a best-effort curl command for repro/debug, with secrets redacted.
fn make_curl(method: &Method, url: &Url, headers: &HeaderMap, body: Option<&[u8]>) -> String {
    let mut parts = vec!["curl".to_string(), format!("-X{}", method)];
    for (name, val) in redact_headers(headers) {
        parts.push(format!("-H '{}: {}'", name, val.replace('\'', r"'\''")));
    }
    if let Some(bytes) = body {
        if let Ok(s) = std::str::from_utf8(bytes) {
            let mut s = s.to_string();
            if s.len() > RAW_MAX_BODY {
                truncate_at_char_boundary(&mut s, RAW_MAX_BODY);
                s.push('…');
            }
            parts.push(format!("-d '{}'", s.replace('\'', r"'\''")));
        } else {
            parts.push(format!("--data-binary @- # ({} bytes)", bytes.len()));
        }
    }
    parts.push(format!("'{url}'"));
    parts.join(" ")
}

/// Redact sensitive headers for logging
fn redact_headers(h: &HeaderMap) -> Vec<(String, String)> {
    h.iter()
        .map(|(k, v)| {
            let key = k.as_str().to_string();
            let val = if is_secret_header(&key) {
                "<redacted>".to_string()
            } else {
                v.to_str().unwrap_or("").to_string()
            };
            (key, val)
        })
        .collect()
}

// ==============================
// Errors
// ==============================

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("invalid URL: {0}")]
    Url(String),
    #[error("request build failed: {0}")]
    Build(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}, body_snippet: {1}")]
    Decode(String, String),
    #[error("server returned error {status}: {message}, request_id={request_id}")]
    Api {
        status: StatusCode,
        /// Best-effort human message pulled out of a JSON error envelope.
        message: String,
        /// Full response body text.
        body: String,
        request_id: String,
    },
}

// ==============================
// Auth & Request Options
// ==============================

/// Authentication strategies supported by the HTTP client helpers.
///
/// ```
/// use askweb_http::Auth;
///
/// let auth = Auth::api_key_header("x-api-key", " \"secret\"\n").unwrap();
/// match auth {
///     Auth::Header { name, value } => {
///         assert_eq!(name.as_str(), "x-api-key");
///         assert_eq!(value.to_str().unwrap(), "secret");
///     }
///     Auth::None => unreachable!(),
/// }
/// ```
#[derive(Clone, Debug)]
pub enum Auth {
    /// Custom header (e.g., Serper: X-API-KEY)
    Header {
        name: HeaderName,
        value: HeaderValue,
    },
    None,
}

impl Auth {
    /// Build a header credential from a raw API key, stripping stray quotes
    /// and whitespace picked up from env files.
    pub fn api_key_header(name: &'static str, raw_key: &str) -> Result<Self, HttpError> {
        let key = sanitize_api_key(raw_key)?;
        let mut value =
            HeaderValue::from_str(&key).map_err(|e| HttpError::Build(e.to_string()))?;
        value.set_sensitive(true);
        Ok(Auth::Header {
            name: HeaderName::from_static(name),
            value,
        })
    }

    fn kind(&self) -> &'static str {
        match self {
            Auth::Header { .. } => "header",
            Auth::None => "none",
        }
    }
}

/// Per-request options. Requests wait as long as the server takes.
#[derive(Clone, Debug, Default)]
pub struct RequestOpts {
    pub auth: Option<Auth>,
}

// ==============================
// Client
// ==============================

#[derive(Clone, Debug)]
pub struct HttpClient {
    base: Url,
    inner: Client,
}

impl HttpClient {
    /// Construct a client anchored to a base URL.
    ///
    /// The base is treated as a directory, so `http://host/prefix` and
    /// `http://host/prefix/` both resolve `api/x` to `http://host/prefix/api/x`.
    ///
    /// ```
    /// use askweb_http::{HttpClient, HttpError};
    ///
    /// let client = HttpClient::new("http://localhost:11434")?;
    /// assert_eq!(client.url_for("api/generate")?.as_str(), "http://localhost:11434/api/generate");
    /// # Ok::<(), HttpError>(())
    /// ```
    pub fn new(base: &str) -> Result<Self, HttpError> {
        let mut base = Url::parse(base).map_err(|e| HttpError::Url(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(HttpError::Url(format!("not a base URL: {base}")));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let inner = Client::builder()
            .build()
            .map_err(|e| HttpError::Build(e.to_string()))?;
        Ok(Self { base, inner })
    }

    /// Resolve `path` against the base URL.
    pub fn url_for(&self, path: &str) -> Result<Url, HttpError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|e| HttpError::Url(e.to_string()))
    }

    /// GET JSON, authenticated per `opts`.
    pub async fn get_json<T>(&self, path: &str, opts: RequestOpts) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.request_json_internal::<(), T>(Method::GET, path, None, opts)
            .await
    }

    /// POST a JSON body, authenticated per `opts`.
    pub async fn post_json<B, T>(
        &self,
        path: &str,
        body: &B,
        opts: RequestOpts,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_json_internal(Method::POST, path, Some(body), opts)
            .await
    }

    // ==============================
    // Core request implementation
    // ==============================

    async fn request_json_internal<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        opts: RequestOpts,
    ) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url_for(path)?;

        // ----- Build request -----
        let mut rb = self.inner.request(method.clone(), url.clone());

        // body (serialize up front so we can log exact bytes)
        let mut request_body_bytes: Option<Vec<u8>> = None;
        if let Some(b) = body {
            let bytes = serde_json::to_vec(b).map_err(|e| HttpError::Build(e.to_string()))?;
            request_body_bytes = Some(bytes.clone());
            rb = rb
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(bytes);
        }

        if let Some(Auth::Header { name, value }) = &opts.auth {
            rb = rb.header(name, value);
        }

        // ----- Safe request logging (pre-send) -----
        let auth_kind = opts.auth.as_ref().map(Auth::kind).unwrap_or("none");

        let req_id = Uuid::new_v4().simple().to_string();

        tracing::debug!(
            req_id=%req_id,
            method=%method,
            host_path=%format!("{}{}", url.host_str().unwrap_or("-"), url.path()),
            auth_kind,
            has_body=%body.is_some(),
            "http.request.start"
        );

        if raw_enabled() {
            let mut merged = HeaderMap::new();
            if let Some(Auth::Header { name, value }) = &opts.auth {
                merged.append(name, value.clone());
            }
            let curl = make_curl(&method, &url, &merged, request_body_bytes.as_deref());
            tracing::debug!(target: "http.raw", %req_id, %curl, "request");
        }

        // ----- Send -----
        let t0 = std::time::Instant::now();
        let resp = rb.send().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(req_id=%req_id, message=%message, "http.network_error.send");
            HttpError::Network(message)
        })?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.bytes().await.map_err(|err| {
            let message = err.to_string();
            tracing::warn!(req_id=%req_id, message=%message, "http.network_error.body");
            HttpError::Network(message)
        })?;
        let dur_ms = t0.elapsed().as_millis() as u64;

        let req_hdr_id = headers
            .get("x-request-id")
            .or_else(|| headers.get("x-correlation-id"))
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-");

        tracing::debug!(
            req_id=%req_id,
            %status,
            duration_ms=dur_ms,
            body_len=bytes.len(),
            x_request_id=%req_hdr_id,
            "http.response.headers"
        );

        if raw_enabled() {
            let hdrs = redact_headers(&headers);
            let mut body_snip = bytes.to_vec();
            let truncated = body_snip.len() > RAW_MAX_BODY;
            if truncated {
                body_snip.truncate(RAW_MAX_BODY);
            }
            let text = String::from_utf8_lossy(&body_snip);
            tracing::info!(
                target:"http.raw",
                %req_id,
                status=%status,
                duration_ms=dur_ms,
                headers=?hdrs,
                body=%text,
                truncated
            );
        }

        let snippet = snip_body(&bytes);
        tracing::trace!(
            req_id=%req_id,
            body_snippet=%snippet,
            "http.response.body_snippet"
        );

        // ----- Success path -----
        if status.is_success() {
            return serde_json::from_slice::<T>(&bytes).map_err(|e| {
                tracing::warn!(
                    req_id=%req_id,
                    serde_line=%e.line(),
                    serde_col=%e.column(),
                    serde_err=%e.to_string(),
                    body_snippet=%snippet,
                    "http.response.decode_error"
                );
                HttpError::Decode(e.to_string(), snippet)
            });
        }

        // ----- Non-success -----
        let message = extract_error_message(&bytes);
        let request_id = req_hdr_id.to_string();

        tracing::warn!(
            req_id=%req_id,
            %status,
            message=%message,
            x_request_id=%request_id,
            body_snippet=%snippet,
            "http.error"
        );
        Err(HttpError::Api {
            status,
            message,
            body: String::from_utf8_lossy(&bytes).trim().to_string(),
            request_id,
        })
    }
}

// ==============================
// Helpers
// ==============================

fn extract_error_message(body: &[u8]) -> String {
    // OpenAI style: {"error":{"message":"..."}}
    #[derive(Deserialize)]
    struct Envelope {
        error: EnvelopeDetail,
    }
    #[derive(Deserialize)]
    struct EnvelopeDetail {
        message: String,
    }

    // Generic: {"message":"..."} or {"detail":"..."} or {"error":"..."} (Ollama)
    #[derive(Deserialize)]
    struct Msg {
        #[serde(default)]
        message: String,
        #[serde(default)]
        detail: String,
        #[serde(default)]
        error: String,
    }

    if let Ok(env) = serde_json::from_slice::<Envelope>(body) {
        return env.error.message;
    }
    if let Ok(m) = serde_json::from_slice::<Msg>(body) {
        if !m.message.is_empty() {
            return m.message;
        }
        if !m.detail.is_empty() {
            return m.detail;
        }
        if !m.error.is_empty() {
            return m.error;
        }
    }
    snip_body(body)
}

fn snip_body(body: &[u8]) -> String {
    let mut snip = String::from_utf8_lossy(body).trim().to_string();
    if snip.len() > SNIPPET_MAX {
        truncate_at_char_boundary(&mut snip, SNIPPET_MAX);
        snip.push_str("...");
    }
    snip
}

fn truncate_at_char_boundary(s: &mut String, max: usize) {
    let mut cut = max.min(s.len());
    while cut > 0 && !s.is_char_boundary(cut) {
        cut -= 1;
    }
    s.truncate(cut);
}

fn sanitize_api_key(raw: &str) -> Result<String, HttpError> {
    // 1) Trim outer spaces/quotes
    let mut s = raw
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_string();

    // 2) Remove *all* ASCII whitespace (spaces, tabs, newlines, carriage returns)
    s.retain(|ch| !ch.is_ascii_whitespace());

    if s.is_empty() {
        return Err(HttpError::Build("API key is empty".into()));
    }
    if !s.is_ascii() {
        return Err(HttpError::Build("API key contains non-ASCII bytes".into()));
    }
    if s.bytes().any(|b| b < 0x20 || b == 0x7F) {
        return Err(HttpError::Build(
            "API key contains control characters".into(),
        ));
    }
    Ok(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_ollama_style_error() {
        let msg = extract_error_message(br#"{"error":"model 'nope' not found"}"#);
        assert_eq!(msg, "model 'nope' not found");
    }

    #[test]
    fn extracts_nested_error_message() {
        let msg = extract_error_message(br#"{"error":{"message":"bad key"}}"#);
        assert_eq!(msg, "bad key");
    }

    #[test]
    fn plain_text_error_falls_back_to_snippet() {
        assert_eq!(extract_error_message(b"model not found\n"), "model not found");
    }

    #[test]
    fn long_bodies_are_snipped_on_char_boundaries() {
        let body = "é".repeat(400);
        let snip = snip_body(body.as_bytes());
        assert!(snip.ends_with("..."));
        assert!(snip.len() <= SNIPPET_MAX + 3);
    }

    #[test]
    fn api_keys_are_sanitized() {
        assert_eq!(sanitize_api_key("  'abc 123'\n").unwrap(), "abc123");
        assert!(sanitize_api_key("   ").is_err());
        assert!(sanitize_api_key("ключ").is_err());
    }

    #[test]
    fn secret_headers_are_redacted() {
        let mut h = HeaderMap::new();
        h.insert("x-api-key", HeaderValue::from_static("secret"));
        h.insert("accept", HeaderValue::from_static("application/json"));
        let redacted = redact_headers(&h);
        assert!(redacted.contains(&("x-api-key".into(), "<redacted>".into())));
        assert!(redacted.contains(&("accept".into(), "application/json".into())));
    }

    #[test]
    fn curl_redacts_api_key_header() {
        let url = Url::parse("https://google.serper.dev/search").unwrap();
        let mut h = HeaderMap::new();
        h.insert("x-api-key", HeaderValue::from_static("hunter2"));
        let curl = make_curl(&Method::POST, &url, &h, Some(br#"{"q":"rust"}"#));
        assert!(curl.contains("-H 'x-api-key: <redacted>'"));
        assert!(curl.contains(r#"-d '{"q":"rust"}'"#));
        assert!(!curl.contains("hunter2"));
    }

    #[test]
    fn base_with_prefix_is_treated_as_directory() {
        let client = HttpClient::new("http://proxy.local/ollama").unwrap();
        assert_eq!(
            client.url_for("/api/generate").unwrap().as_str(),
            "http://proxy.local/ollama/api/generate"
        );
    }
}
