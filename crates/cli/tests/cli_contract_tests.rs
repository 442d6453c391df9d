// Integration tests for the sbuddy shell contract: stdout shape and exit codes.
//
// Every test here is offline. `ask` and `batch` run with --offline so no
// provider is contacted; `ai doctor` runs against a throwaway config dir.
//
// Run with: cargo test -p studybuddy-cli --test cli_contract_tests -- --nocapture

use std::io::Write;
use std::process::{Command, Output, Stdio};

fn sbuddy() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_sbuddy"));
    cmd.current_dir(env!("CARGO_MANIFEST_DIR"));
    cmd.env_remove("RUST_LOG");
    cmd
}

fn run(args: &[&str]) -> Output {
    sbuddy().args(args).output().expect("run sbuddy")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim_end().to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

/// Assert stdout is a single, parseable JSON value.
fn single_json(output: &Output) -> serde_json::Value {
    let text = stdout(output);
    assert!(!text.is_empty(), "stdout should not be empty");
    serde_json::from_str(&text)
        .unwrap_or_else(|e| panic!("stdout must be valid JSON.\nParse error: {}\nstdout:\n{}", e, text))
}

// ===========================================================================
// sbuddy math
// ===========================================================================

#[test]
fn math_prints_inline_latex() {
    let output = run(&["math", "integrate(x)"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), r"\(\frac{x^{2}}{2}\)");
}

#[test]
fn math_json_shape() {
    let output = run(&["math", "evaluate(x+1)", "--json"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let val = single_json(&output);
    assert_eq!(val["operation"], "evaluate");
    assert_eq!(val["latex"], r"\(2\)");
}

#[test]
fn math_solve_and_roots_agree() {
    let solve = run(&["math", "solve(x^2 - 5*x + 6)"]);
    let roots = run(&["math", "roots(x^2 - 5*x + 6)"]);
    assert!(solve.status.success());
    assert_eq!(stdout(&solve), stdout(&roots));
}

#[test]
fn math_parse_error_exit_61() {
    let output = run(&["math", "integrate(x+)"]);
    assert_eq!(output.status.code(), Some(61));
    assert!(output.stdout.is_empty(), "nothing on stdout for a failed call");
    assert!(stderr(&output).contains("error: integrate failed"), "stderr: {}", stderr(&output));
}

#[test]
fn math_unknown_operation_exit_60() {
    let output = run(&["math", "Integrate(x)"]);
    assert_eq!(output.status.code(), Some(60));
    let err = stderr(&output);
    assert!(err.contains("unknown operation 'Integrate'"), "stderr: {}", err);
    assert!(err.contains("hint:"), "stderr: {}", err);
}

// ===========================================================================
// sbuddy classify
// ===========================================================================

#[test]
fn classify_visualization_beats_math() {
    let output = run(&["classify", "plot integrate(x^2)"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "visualization");
}

#[test]
fn classify_json_shape() {
    let output = run(&["classify", "--json", "solve", "(x)"]);
    assert!(output.status.success());
    let val = single_json(&output);
    assert_eq!(val["classification"], "math");
    assert_eq!(val["math_shape"], true);
    assert_eq!(val["visualization_keyword"], false);
}

#[test]
fn classify_empty_is_usage_error() {
    let output = run(&["classify", "   "]);
    assert_eq!(output.status.code(), Some(2));
}

// ===========================================================================
// sbuddy ask --offline
// ===========================================================================

#[test]
fn ask_math_offline() {
    let output = run(&["ask", "--offline", "evaluate(x+1)"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), r"\(2\)");
}

#[test]
fn ask_empty_question() {
    let output = run(&["ask", "--offline", "   "]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "Please ask me a question!");
}

#[test]
fn ask_general_offline_gets_apology() {
    let output = run(&["ask", "--offline", "What", "is", "a", "cell?"]);
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "I'm having trouble connecting to my knowledge base right now. Could you please try again?"
    );
}

#[test]
fn ask_json_bad_math_falls_through() {
    let output = run(&["ask", "--offline", "--json", "integrate(x+)"]);
    assert!(output.status.success());
    let val = single_json(&output);
    let text = val["response"].as_str().expect("text response");
    assert!(!text.is_empty());
    assert!(text.contains("try again"));
}

#[test]
fn ask_visualization_offline_uses_fallback_apology() {
    let output = run(&["ask", "--offline", "--json", "draw a parabola"]);
    assert!(output.status.success());
    let val = single_json(&output);
    assert_eq!(
        val["response"],
        "I apologize, but I'm having trouble processing your request. Could you please try again?"
    );
}

// ===========================================================================
// sbuddy batch --offline
// ===========================================================================

#[test]
fn batch_jsonl_roundtrip() {
    let mut child = sbuddy()
        .args(["batch", "--offline"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn sbuddy batch");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all(b"{\"question\": \"integrate(x)\"}\n\n{}\nnot json\n{\"question\": \"   \"}\n")
            .unwrap();
    }

    let output = child.wait_with_output().expect("wait");
    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let lines: Vec<serde_json::Value> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|l| serde_json::from_str(l).unwrap_or_else(|e| panic!("{}: {}", e, l)))
        .collect();

    assert_eq!(lines.len(), 4, "blank input lines produce no output");
    assert_eq!(lines[0]["response"], r"\(\frac{x^{2}}{2}\)");
    assert_eq!(lines[1]["response"], "Please ask a valid question.");
    assert_eq!(lines[2]["line"], 4);
    assert!(lines[2]["error"].as_str().unwrap().starts_with("invalid JSON"));
    assert_eq!(lines[3]["response"], "Please ask me a question!");
}

// ===========================================================================
// sbuddy ai doctor
// ===========================================================================

#[cfg(target_os = "linux")]
fn doctor_in(config_home: &std::path::Path, settings: Option<&str>) -> Output {
    if let Some(settings) = settings {
        let dir = config_home.join("studybuddy");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("settings.json"), settings).unwrap();
    }
    sbuddy()
        .args(["ai", "doctor", "--json"])
        .env("XDG_CONFIG_HOME", config_home)
        .env("HOME", config_home)
        .env_remove("STUDYBUDDY_ANTHROPIC_KEY")
        .env_remove("STUDYBUDDY_OPENAI_KEY")
        .env_remove("APIKEY")
        .output()
        .expect("run sbuddy ai doctor")
}

#[cfg(target_os = "linux")]
#[test]
fn doctor_disabled_exit_10() {
    let tmp = tempfile::tempdir().unwrap();
    let output = doctor_in(tmp.path(), Some(r#"{ "ai": { "provider": "none" } }"#));
    assert_eq!(output.status.code(), Some(10), "stderr: {}", stderr(&output));
    let val = single_json(&output);
    assert_eq!(val["status"], "disabled");
    assert_eq!(val["schema_version"], 1);
}

#[cfg(target_os = "linux")]
#[test]
fn doctor_env_key_ready() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("studybuddy");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("settings.json"), r#"{ "ai": { "provider": "openai" } }"#).unwrap();

    let output = sbuddy()
        .args(["ai", "doctor", "--json"])
        .env("XDG_CONFIG_HOME", tmp.path())
        .env("HOME", tmp.path())
        .env("STUDYBUDDY_OPENAI_KEY", "sk-test")
        .output()
        .expect("run sbuddy ai doctor");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let val = single_json(&output);
    assert_eq!(val["status"], "ready");
    assert_eq!(val["model"], "gpt-4o");
    assert_eq!(val["key"], "present");
}

#[cfg(target_os = "linux")]
#[test]
fn doctor_creates_default_settings() {
    let tmp = tempfile::tempdir().unwrap();
    let _ = doctor_in(tmp.path(), None);
    assert!(tmp.path().join("studybuddy").join("settings.json").exists());
}

// ===========================================================================
// No subcommand
// ===========================================================================

#[test]
fn no_subcommand_prints_usage() {
    let output = run(&[]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("Usage: sbuddy"));
}
