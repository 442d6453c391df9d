//! Study Buddy wire protocol, v1.
//!
//! Defines the JSON shapes exchanged at the question boundary: the inbound
//! `QuestionRequest`, the outbound `QuestionResponse`, and the `ResponsePayload`
//! it carries. Batch mode streams these as JSONL, one record per line.
//!
//! # Payload shapes
//!
//! A response is either a bare JSON string (general and math answers) or a
//! structured record tagged by `kind`:
//!
//! ```text
//! {"response": "The derivative of ..."}
//! {"response": {"kind": "component", "content": "const VisualizationComponent = ..."}}
//! ```
//!
//! Consumers tell the two apart by JSON type alone.
//!
//! # Usage
//!
//! ```ignore
//! use studybuddy_protocol::{QuestionRequest, QuestionResponse, ResponsePayload};
//!
//! let request = QuestionRequest::from_json_line(&line)?;
//! let response = QuestionResponse::new(ResponsePayload::text("\\(2\\)"));
//! println!("{}", serde_json::to_string(&response)?);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Current protocol version. Increment for breaking changes.
pub const PROTOCOL_VERSION: u32 = 1;

/// Reply for a request whose `question` field is missing or empty.
pub const INVALID_QUESTION_MESSAGE: &str = "Please ask a valid question.";

// =============================================================================
// Payloads
// =============================================================================

/// What the router hands back for one query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponsePayload {
    /// Prose or typeset math.
    Text(String),
    /// Typed record, currently only generated UI components.
    Structured(StructuredPayload),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StructuredPayload {
    /// Source text of a self-contained visualization component.
    Component { content: String },
}

/// Discriminant of a payload, for logging and CLI output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Text,
    Component,
}

impl ResponsePayload {
    pub fn text(s: impl Into<String>) -> Self {
        ResponsePayload::Text(s.into())
    }

    pub fn component(content: impl Into<String>) -> Self {
        ResponsePayload::Structured(StructuredPayload::Component { content: content.into() })
    }

    pub fn kind(&self) -> PayloadKind {
        match self {
            ResponsePayload::Text(_) => PayloadKind::Text,
            ResponsePayload::Structured(StructuredPayload::Component { .. }) => PayloadKind::Component,
        }
    }

    pub fn is_component(&self) -> bool {
        self.kind() == PayloadKind::Component
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ResponsePayload::Text(s) => Some(s),
            ResponsePayload::Structured(_) => None,
        }
    }

    /// The payload body regardless of kind.
    pub fn body(&self) -> &str {
        match self {
            ResponsePayload::Text(s) => s,
            ResponsePayload::Structured(StructuredPayload::Component { content }) => content,
        }
    }
}

// =============================================================================
// Envelopes
// =============================================================================

/// Inbound request body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

impl QuestionRequest {
    pub fn new(question: impl Into<String>) -> Self {
        Self { question: Some(question.into()) }
    }

    /// Parse one JSONL line.
    pub fn from_json_line(line: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(line).map_err(|e| ProtocolError::Json(e.to_string()))
    }

    /// The question if present and non-empty. Whitespace-only questions are
    /// passed through; the router answers those itself.
    pub fn question_text(&self) -> Option<&str> {
        self.question.as_deref().filter(|q| !q.is_empty())
    }
}

/// Outbound response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub response: ResponsePayload,
}

impl QuestionResponse {
    pub fn new(response: ResponsePayload) -> Self {
        Self { response }
    }

    pub fn invalid_question() -> Self {
        Self::new(ResponsePayload::text(INVALID_QUESTION_MESSAGE))
    }
}

/// One line of batch output: a response, or the reason an input line was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BatchRecord {
    Response(QuestionResponse),
    Error(BatchError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// 1-based input line number.
    pub line: usize,
    pub error: String,
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Input was not valid JSON for the expected type.
    Json(String),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json(msg) => write!(f, "invalid JSON: {msg}"),
        }
    }
}

impl std::error::Error for ProtocolError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_payload_is_bare_string() {
        let json = serde_json::to_string(&ResponsePayload::text("hello")).unwrap();
        assert_eq!(json, "\"hello\"");
    }

    #[test]
    fn test_component_payload_shape() {
        let json = serde_json::to_value(ResponsePayload::component("code")).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "component", "content": "code"}));
    }

    #[test]
    fn test_payload_roundtrip_keeps_kind() {
        let text: ResponsePayload = serde_json::from_str("\"hi\"").unwrap();
        assert_eq!(text.kind(), PayloadKind::Text);
        let comp: ResponsePayload = serde_json::from_str(r#"{"kind":"component","content":"x"}"#).unwrap();
        assert!(comp.is_component());
        assert_eq!(comp.body(), "x");
        assert_eq!(comp.as_text(), None);
    }

    #[test]
    fn test_request_missing_question() {
        let req = QuestionRequest::from_json_line("{}").unwrap();
        assert_eq!(req.question_text(), None);
        let req = QuestionRequest::from_json_line(r#"{"question": ""}"#).unwrap();
        assert_eq!(req.question_text(), None);
        let req = QuestionRequest::from_json_line(r#"{"question": "   "}"#).unwrap();
        assert_eq!(req.question_text(), Some("   "));
        let req = QuestionRequest::from_json_line(r#"{"question": "why?"}"#).unwrap();
        assert_eq!(req.question_text(), Some("why?"));
    }

    #[test]
    fn test_request_bad_json() {
        let err = QuestionRequest::from_json_line("not json").unwrap_err();
        assert!(err.to_string().starts_with("invalid JSON"));
    }

    #[test]
    fn test_invalid_question_response() {
        let json = serde_json::to_string(&QuestionResponse::invalid_question()).unwrap();
        assert_eq!(json, r#"{"response":"Please ask a valid question."}"#);
    }

    #[test]
    fn test_batch_error_record() {
        let rec = BatchRecord::Error(BatchError { line: 3, error: "invalid JSON: eof".into() });
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json, serde_json::json!({"line": 3, "error": "invalid JSON: eof"}));
    }
}
