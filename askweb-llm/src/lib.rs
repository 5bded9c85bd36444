//! Prompt composition and local LLM generation for askweb.
//!
//! This crate exposes the provider-agnostic [`traits::LlmClient`] interface,
//! the Ollama implementation in [`ollama`], and the pure prompt builders in
//! [`prompt`].
//!
//! # Examples
//! ```no_run
//! use askweb_common::{PromptStyle, Result};
//! use askweb_llm::{ollama::OllamaClient, prompt, traits::LlmClient};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<()> {
//! let client = OllamaClient::new("http://localhost:11434/", "llama3.2:latest")?;
//! let text = prompt::compose_with_style(PromptStyle::Plain, None, "Why is the sky blue?");
//! let reply = client.generate(&text).await?;
//! println!("{}", reply.text);
//! # Ok(())
//! # }
//! ```
pub mod ollama;
pub mod prompt;
pub mod traits;

pub use ollama::OllamaClient;
pub use traits::{LlmClient, LlmResponse};
