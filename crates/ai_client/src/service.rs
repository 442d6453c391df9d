//! The service seam and its error type.

use std::sync::Arc;

use studybuddy_config::ai::{AIConfigStatus, ResolvedAIConfig};
use studybuddy_config::settings::AIProvider;

use crate::anthropic::AnthropicClient;
use crate::ollama::OllamaClient;
use crate::openai::OpenAiClient;

/// One generation request: a system instruction, one user message, output bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: 1000,
            temperature: 0.7,
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

/// A text generator behind a request/response contract.
///
/// Implementations return the first text segment of the first choice, or an
/// error for anything else. This is a blocking call.
pub trait GenerativeService: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> Result<String, AiError>;
}

impl<S: GenerativeService + ?Sized> GenerativeService for Box<S> {
    fn complete(&self, request: &CompletionRequest) -> Result<String, AiError> {
        (**self).complete(request)
    }
}

impl<S: GenerativeService + ?Sized> GenerativeService for Arc<S> {
    fn complete(&self, request: &CompletionRequest) -> Result<String, AiError> {
        (**self).complete(request)
    }
}

/// Stand-in used when no provider can be built. Every call fails with the
/// reason it was created with, so callers take their usual fallback path.
#[derive(Debug, Clone)]
pub struct UnavailableService {
    reason: String,
}

impl UnavailableService {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl GenerativeService for UnavailableService {
    fn complete(&self, _request: &CompletionRequest) -> Result<String, AiError> {
        Err(AiError::NotConfigured(self.reason.clone()))
    }
}

/// Error from a generative service
#[derive(Debug, Clone, PartialEq)]
pub enum AiError {
    /// Provider disabled or unusable
    NotConfigured(String),
    /// API key missing
    MissingKey,
    /// Network error
    Network(String),
    /// API error response
    Api { status: u16, message: String },
    /// Failed to parse response
    Parse(String),
    /// Response parsed but carried no text
    EmptyResponse,
}

impl std::fmt::Display for AiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AiError::NotConfigured(msg) => write!(f, "AI not configured: {}", msg),
            AiError::MissingKey => write!(f, "API key not configured"),
            AiError::Network(msg) => write!(f, "Network error: {}", msg),
            AiError::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            AiError::Parse(msg) => write!(f, "Failed to parse response: {}", msg),
            AiError::EmptyResponse => write!(f, "Response contained no text"),
        }
    }
}

impl std::error::Error for AiError {}

/// Build the client the resolved configuration asks for.
pub fn from_config(config: &ResolvedAIConfig) -> Result<Box<dyn GenerativeService>, AiError> {
    match config.status {
        AIConfigStatus::Disabled => {
            return Err(AiError::NotConfigured("AI is disabled".to_string()));
        }
        AIConfigStatus::MissingKey => return Err(AiError::MissingKey),
        AIConfigStatus::Ready => {}
    }

    let timeout = config.timeout_secs;
    let model = config.model.clone();

    let service: Box<dyn GenerativeService> = match config.provider {
        AIProvider::None => {
            return Err(AiError::NotConfigured("AI is disabled".to_string()));
        }
        AIProvider::Local => {
            let endpoint = config
                .endpoint
                .clone()
                .ok_or_else(|| AiError::NotConfigured("local provider has no endpoint".to_string()))?;
            Box::new(OllamaClient::with_base_url(endpoint, model, timeout)?)
        }
        AIProvider::OpenAI => {
            let key = config.api_key.clone().ok_or(AiError::MissingKey)?;
            match &config.endpoint {
                Some(base) => Box::new(OpenAiClient::with_base_url(key, model, base.clone(), timeout)?),
                None => Box::new(OpenAiClient::new(key, model, timeout)?),
            }
        }
        AIProvider::Anthropic => {
            let key = config.api_key.clone().ok_or(AiError::MissingKey)?;
            match &config.endpoint {
                Some(base) => Box::new(AnthropicClient::with_base_url(key, model, base.clone(), timeout)?),
                None => Box::new(AnthropicClient::new(key, model, timeout)?),
            }
        }
    };

    log::debug!("ai client: provider={} model={}", config.provider_name(), config.model);
    Ok(service)
}
