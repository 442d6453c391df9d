//! Golden vector compatibility test for the v1 question protocol.
//!
//! Golden vectors live in: crates/protocol/golden/*.jsonl
//!
//! **Rule**: The golden vectors MUST NOT change. If a test fails, fix the types, not the vectors.

use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use studybuddy_protocol::{BatchRecord, PayloadKind, QuestionRequest, ResponsePayload, PROTOCOL_VERSION};

fn golden_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("golden")
}

fn load_golden_lines(filename: &str) -> Vec<String> {
    let path = golden_dir().join(filename);
    let contents = fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(String::from)
        .collect()
}

#[test]
fn protocol_version_is_one() {
    assert_eq!(PROTOCOL_VERSION, 1);
}

#[test]
fn golden_requests_deserialize() {
    let lines = load_golden_lines("requests.jsonl");
    assert_eq!(lines.len(), 5);

    let parsed: Vec<QuestionRequest> = lines
        .iter()
        .map(|l| QuestionRequest::from_json_line(l).unwrap_or_else(|e| panic!("{}: {}", e, l)))
        .collect();

    assert_eq!(parsed[0].question_text(), Some("integrate(x)"));
    assert_eq!(parsed[1].question_text(), Some("plot a sine wave"));
    assert_eq!(parsed[3].question_text(), None, "empty string is not a question");
    assert_eq!(parsed[4].question_text(), None, "missing field is not a question");
}

#[test]
fn golden_responses_deserialize() {
    let lines = load_golden_lines("responses.jsonl");
    let records: Vec<BatchRecord> = lines
        .iter()
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("{}: {}", e, l)))
        .collect();

    let kinds: Vec<Option<PayloadKind>> = records
        .iter()
        .map(|r| match r {
            BatchRecord::Response(resp) => Some(resp.response.kind()),
            BatchRecord::Error(_) => None,
        })
        .collect();
    assert_eq!(
        kinds,
        vec![
            Some(PayloadKind::Text),
            Some(PayloadKind::Component),
            Some(PayloadKind::Text),
            Some(PayloadKind::Text),
            None,
        ]
    );

    match &records[1] {
        BatchRecord::Response(resp) => {
            assert!(resp.response.body().ends_with("export default VisualizationComponent;"));
        }
        other => panic!("expected component response, got {:?}", other),
    }
    match &records[4] {
        BatchRecord::Error(err) => assert_eq!(err.line, 5),
        other => panic!("expected error record, got {:?}", other),
    }
}

#[test]
fn golden_responses_reserialize_identically() {
    for line in load_golden_lines("responses.jsonl") {
        let record: BatchRecord = serde_json::from_str(&line).unwrap();
        let reencoded: Value = serde_json::to_value(&record).unwrap();
        let original: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(reencoded, original, "drift on line: {}", line);
    }
}

#[test]
fn component_payload_is_distinguishable_without_content() {
    let comp = ResponsePayload::component("export default VisualizationComponent;");
    let value = serde_json::to_value(&comp).unwrap();
    assert!(value.is_object());
    assert_eq!(value["kind"], "component");

    let text = ResponsePayload::text("kind: component");
    assert!(serde_json::to_value(&text).unwrap().is_string());
}
