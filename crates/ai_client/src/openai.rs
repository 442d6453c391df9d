//! OpenAI chat completions client.

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use crate::http::{build_client, send_json};
use crate::service::{AiError, CompletionRequest, GenerativeService};

const OPENAI_API_BASE: &str = "https://api.openai.com";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiClient {
    http: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    pub fn new(api_key: String, model: String, timeout_secs: u64) -> Result<Self, AiError> {
        Self::with_base_url(api_key, model, OPENAI_API_BASE.to_string(), timeout_secs)
    }

    pub fn with_base_url(
        api_key: String,
        model: String,
        base_url: String,
        timeout_secs: u64,
    ) -> Result<Self, AiError> {
        Ok(Self {
            http: build_client(timeout_secs)?,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

impl GenerativeService for OpenAiClient {
    fn complete(&self, request: &CompletionRequest) -> Result<String, AiError> {
        log::debug!(
            "openai: model={} max_tokens={} temperature={}",
            self.model,
            request.max_tokens,
            request.temperature
        );

        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.user },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response: ChatResponse = send_json(
            self.http
                .post(format!("{}/v1/chat/completions", self.base_url))
                .bearer_auth(&self.api_key)
                .json(&body),
        )?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(AiError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn client(server: &MockServer) -> OpenAiClient {
        OpenAiClient::with_base_url("sk-test".into(), "gpt-4o".into(), server.base_url(), 5).unwrap()
    }

    #[test]
    fn test_request_shape_and_first_choice() {
        let server = MockServer::start();

        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer sk-test")
                .json_body(serde_json::json!({
                    "model": "gpt-4o",
                    "messages": [
                        { "role": "system", "content": "sys" },
                        { "role": "user", "content": "hello" }
                    ],
                    "temperature": 0.5,
                    "max_tokens": 100
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({
                    "choices": [
                        { "index": 0, "message": { "role": "assistant", "content": "hi there" }, "finish_reason": "stop" },
                        { "index": 1, "message": { "role": "assistant", "content": "second" }, "finish_reason": "stop" }
                    ]
                }));
        });

        let req = CompletionRequest::new("sys", "hello").max_tokens(100).temperature(0.5);
        let text = client(&server).complete(&req).unwrap();

        mock.assert();
        assert_eq!(text, "hi there");
    }

    #[test]
    fn test_rate_limit_maps_to_api_error() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(429)
                .json_body(serde_json::json!({
                    "error": { "message": "Rate limit reached", "type": "requests" }
                }));
        });

        let err = client(&server).complete(&CompletionRequest::new("s", "u")).unwrap_err();
        assert_eq!(err, AiError::Api { status: 429, message: "Rate limit reached".into() });
    }

    #[test]
    fn test_null_content_is_empty_response() {
        let server = MockServer::start();

        server.mock(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(serde_json::json!({
                    "choices": [{ "message": { "role": "assistant", "content": null } }]
                }));
        });

        let err = client(&server).complete(&CompletionRequest::new("s", "u")).unwrap_err();
        assert_eq!(err, AiError::EmptyResponse);
    }
}
