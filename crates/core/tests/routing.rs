//! End-to-end routing through `Dispatcher` with a scripted service.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use studybuddy_ai_client::{AiError, CompletionRequest, GenerativeService};
use studybuddy_core::{Dispatcher, Persona, EMPTY_QUERY_MESSAGE};
use studybuddy_protocol::{PayloadKind, QuestionRequest, ResponsePayload};

/// Plays back queued replies in order and records every request.
#[derive(Default)]
struct RecordingService {
    replies: Mutex<VecDeque<Result<String, AiError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl RecordingService {
    fn with_replies(replies: Vec<Result<String, AiError>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl GenerativeService for RecordingService {
    fn complete(&self, request: &CompletionRequest) -> Result<String, AiError> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AiError::EmptyResponse))
    }
}

fn dispatcher(service: &Arc<RecordingService>) -> Dispatcher {
    Dispatcher::new(service.clone())
}

#[test]
fn empty_input_returns_fixed_message_without_service_calls() {
    let svc = RecordingService::with_replies(vec![]);
    let d = dispatcher(&svc);

    assert_eq!(d.handle("   "), ResponsePayload::text(EMPTY_QUERY_MESSAGE));
    assert_eq!(svc.call_count(), 0);
}

#[test]
fn integrate_x() {
    let svc = RecordingService::with_replies(vec![]);
    assert_eq!(
        dispatcher(&svc).handle("integrate(x)"),
        ResponsePayload::text("\\(\\frac{x^{2}}{2}\\)")
    );
    assert_eq!(svc.call_count(), 0);
}

#[test]
fn solve_and_roots_give_identical_payloads() {
    let svc = RecordingService::with_replies(vec![]);
    let d = dispatcher(&svc);
    for expr in ["x^2 - 4", "x^2 + 1", "x - 7", "x^3 - x"] {
        let solved = d.handle(&format!("solve({expr})"));
        let rooted = d.handle(&format!("roots({expr})"));
        assert_eq!(solved, rooted, "{expr}");
        assert_eq!(solved.kind(), PayloadKind::Text);
    }
    assert_eq!(svc.call_count(), 0);
}

#[test]
fn unparsable_math_falls_through_to_general() {
    let svc = RecordingService::with_replies(vec![Ok("An integral measures area.".into())]);
    let payload = dispatcher(&svc).handle("integrate(x+)");

    assert_eq!(payload, ResponsePayload::text("An integral measures area."));
    assert!(!payload.body().is_empty());
    assert_eq!(svc.call_count(), 1);
}

#[test]
fn unknown_or_capitalized_operation_falls_through() {
    let svc = RecordingService::with_replies(vec![Ok("one".into()), Ok("two".into())]);
    let d = dispatcher(&svc);

    assert_eq!(d.handle("Integrate(x)"), ResponsePayload::text("one"));
    assert_eq!(d.handle("solve (x)"), ResponsePayload::text("two"));
    assert_eq!(svc.call_count(), 2);
}

#[test]
fn visualization_wins_over_math_shape() {
    let svc = RecordingService::with_replies(vec![Ok("```js\nreturn function VisualizationComponent() {}\n```".into())]);
    let payload = dispatcher(&svc).handle("plot integrate(x^2)");

    assert!(payload.is_component());
    assert_eq!(
        payload.body(),
        "return function VisualizationComponent() {}\nexport default VisualizationComponent;"
    );

    let reqs = svc.requests();
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].max_tokens, 2000);
    assert_eq!(reqs[0].temperature, 0.7);
    assert!(reqs[0].user.contains("plot integrate(x^2)"));
    assert!(reqs[0].system.contains("React.createElement"));
}

#[test]
fn component_payload_serializes_as_tagged_record() {
    let svc = RecordingService::with_replies(vec![Ok("const VisualizationComponent = 1;".into())]);
    let payload = dispatcher(&svc).handle("draw a circle");

    let json = serde_json::to_value(&payload).unwrap();
    assert_eq!(json["kind"], "component");
    assert!(json["content"].as_str().unwrap().ends_with("export default VisualizationComponent;"));
}

#[test]
fn general_failure_returns_apology() {
    let svc = RecordingService::with_replies(vec![Err(AiError::Api { status: 500, message: "boom".into() })]);
    let payload = dispatcher(&svc).handle("What is a prime number?");

    assert_eq!(payload, ResponsePayload::text(Persona::Primary.apology()));
    assert_eq!(
        payload.as_text(),
        Some("I'm having trouble connecting to my knowledge base right now. Could you please try again?")
    );
}

#[test]
fn visualization_failure_then_fallback_success() {
    let svc = RecordingService::with_replies(vec![
        Err(AiError::Network("timeout".into())),
        Ok("Here is how a sine wave behaves...".into()),
    ]);
    let payload = dispatcher(&svc).handle("visualize a sine wave");

    assert_eq!(payload, ResponsePayload::text("Here is how a sine wave behaves..."));
    let reqs = svc.requests();
    assert_eq!(reqs.len(), 2);
    assert_eq!(reqs[1].system, Persona::Fallback.system_prompt());
    assert_eq!(reqs[1].user, "visualize a sine wave");
}

#[test]
fn visualization_and_fallback_both_fail() {
    let svc = RecordingService::with_replies(vec![
        Err(AiError::MissingKey),
        Err(AiError::MissingKey),
    ]);
    let payload = dispatcher(&svc).handle("show me photosynthesis");

    assert_eq!(
        payload.as_text(),
        Some("I apologize, but I'm having trouble processing your request. Could you please try again?")
    );
}

#[test]
fn process_envelope() {
    let svc = RecordingService::with_replies(vec![]);
    let d = dispatcher(&svc);

    let resp = d.process(&QuestionRequest::new("evaluate(x^2 + 1)"));
    assert_eq!(serde_json::to_string(&resp).unwrap(), r#"{"response":"\\(2\\)"}"#);

    let resp = d.process(&QuestionRequest::from_json_line("{}").unwrap());
    assert_eq!(resp.response.as_text(), Some("Please ask a valid question."));
    assert_eq!(svc.call_count(), 0);
}

#[test]
fn dispatcher_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Dispatcher>();
}
