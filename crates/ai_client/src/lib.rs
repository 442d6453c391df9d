//! Generative AI client, shared between core and CLI.
//!
//! One trait, [`GenerativeService`]: a system instruction and one user message
//! go in, the first text segment of the reply comes out. Providers are plain
//! blocking reqwest clients (no Tokio runtime required).
//!
//! No streaming. No retries. Callers decide what a failure means.

mod anthropic;
mod http;
mod ollama;
mod openai;
mod service;

pub use anthropic::AnthropicClient;
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;
pub use service::{from_config, AiError, CompletionRequest, GenerativeService, UnavailableService};
