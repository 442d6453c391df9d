// Study Buddy CLI - headless question routing

mod exit_codes;

use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{ArgAction, Parser, Subcommand};

use studybuddy_ai_client::{from_config, GenerativeService, UnavailableService};
use studybuddy_config::ai::{AIConfigStatus, AIDiagnostics, ResolvedAIConfig};
use studybuddy_core::{classifier, Dispatcher, MathEvaluator, MathOutcome};
use studybuddy_protocol::{BatchError, BatchRecord, QuestionRequest, ResponsePayload};

use exit_codes::{
    math_exit_code, EXIT_AI_DISABLED, EXIT_AI_MISSING_KEY, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "sbuddy")]
#[command(about = "Study Buddy: route questions to math, visualization or explanation")]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). Logs go to stderr.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a question through the full router
    #[command(after_help = "\
Examples:
  sbuddy ask 'integrate(x^2)'
  sbuddy ask 'plot a damped oscillator' --json
  sbuddy ask --offline 'solve(x^2 - 4)'")]
    Ask {
        /// The question (joined with spaces if given as several words)
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Print the {"response": ...} envelope as JSON
        #[arg(long)]
        json: bool,

        /// Never call an AI provider; non-math questions get the apology
        #[arg(long, env = "STUDYBUDDY_OFFLINE")]
        offline: bool,
    },

    /// Evaluate a math call offline, e.g. 'differentiate(sin(x)^2)'
    #[command(after_help = "\
Operations: integrate, differentiate, simplify, solve, expand, factor, roots, limits, evaluate

Examples:
  sbuddy math 'factor(x^2 - 1)'
  sbuddy math 'limits(sin(x)/x)' --json")]
    Math {
        /// Call of the form name(expression)
        call: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which strategy a question would be routed to
    Classify {
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Answer JSONL {"question": ...} lines from stdin, one response line each
    #[command(after_help = "\
Examples:
  printf '{\"question\":\"evaluate(x+1)\"}\\n' | sbuddy batch --offline")]
    Batch {
        /// Never call an AI provider
        #[arg(long, env = "STUDYBUDDY_OFFLINE")]
        offline: bool,
    },

    /// AI provider configuration
    Ai {
        #[command(subcommand)]
        command: AiCommands,
    },
}

#[derive(Subcommand)]
enum AiCommands {
    /// Check AI configuration
    Doctor {
        /// Output as JSON for machine parsing
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: u8) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(log::LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(log::LevelFilter::Trace);
        }
    }
    builder
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        None => {
            // No subcommand = show usage
            eprintln!("Usage: sbuddy <command> [options]");
            eprintln!("       sbuddy --help for more information");
            Ok(())
        }
        Some(Commands::Ask { question, json, offline }) => cmd_ask(question.join(" "), json, offline),
        Some(Commands::Math { call, json }) => cmd_math(&call, json),
        Some(Commands::Classify { question, json }) => cmd_classify(&question.join(" "), json),
        Some(Commands::Batch { offline }) => cmd_batch(offline),
        Some(Commands::Ai { command }) => match command {
            AiCommands::Doctor { json } => cmd_ai_doctor(json),
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, CliError> {
    serde_json::to_string(value).map_err(|e| CliError::general(format!("JSON encoding failed: {}", e)))
}

/// Build the dispatcher for `ask` and `batch`.
///
/// A provider that cannot be built is not fatal: math still answers, and
/// everything else receives the fixed apology.
fn build_dispatcher(offline: bool) -> Dispatcher {
    if offline {
        return Dispatcher::new(Arc::new(UnavailableService::new("offline mode")));
    }

    let config = ResolvedAIConfig::load();
    let service: Arc<dyn GenerativeService> = match from_config(&config) {
        Ok(service) => Arc::from(service),
        Err(e) => {
            log::warn!("AI provider unavailable ({}); only math calls will be answered", e);
            Arc::new(UnavailableService::new(e.to_string()))
        }
    };
    Dispatcher::with_routing(service, &config.routing)
}

// ============================================================================
// ask
// ============================================================================

fn cmd_ask(question: String, json: bool, offline: bool) -> Result<(), CliError> {
    let dispatcher = build_dispatcher(offline);

    if json {
        let response = dispatcher.process(&QuestionRequest::new(question));
        println!("{}", to_json(&response)?);
    } else {
        match dispatcher.handle(&question) {
            ResponsePayload::Text(text) => println!("{}", text),
            component => println!("{}", component.body()),
        }
    }
    Ok(())
}

// ============================================================================
// math
// ============================================================================

fn cmd_math(call: &str, json: bool) -> Result<(), CliError> {
    let outcome = MathEvaluator::default().evaluate(call.trim());

    if let MathOutcome::Evaluated { operation, latex } = &outcome {
        if json {
            let out = serde_json::json!({
                "operation": operation,
                "latex": latex,
            });
            println!("{}", to_json(&out)?);
        } else {
            println!("{}", latex);
        }
        return Ok(());
    }

    let err = CliError { code: math_exit_code(&outcome), message: outcome.describe(), hint: None };
    Err(match outcome {
        MathOutcome::NotACall | MathOutcome::UnknownOperation(_) => err.with_hint(
            "operations: integrate, differentiate, simplify, solve, expand, factor, roots, limits, evaluate",
        ),
        _ => err,
    })
}

// ============================================================================
// classify
// ============================================================================

fn cmd_classify(question: &str, json: bool) -> Result<(), CliError> {
    let query = question.trim();
    if query.is_empty() {
        return Err(CliError::usage("question is empty"));
    }

    let class = classifier::classify(query);
    if json {
        let out = serde_json::json!({
            "classification": class,
            "visualization_keyword": classifier::is_visualization_request(query),
            "math_shape": classifier::is_math_query(query),
        });
        println!("{}", to_json(&out)?);
    } else {
        println!("{}", class);
    }
    Ok(())
}

// ============================================================================
// batch
// ============================================================================

fn cmd_batch(offline: bool) -> Result<(), CliError> {
    let dispatcher = build_dispatcher(offline);
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (idx, line) in stdin.lock().lines().enumerate() {
        let line = line.map_err(|e| CliError::usage(format!("cannot read stdin: {}", e)))?;
        if line.trim().is_empty() {
            continue;
        }

        let record = match QuestionRequest::from_json_line(&line) {
            Ok(request) => BatchRecord::Response(dispatcher.process(&request)),
            Err(e) => {
                log::warn!("batch line {}: {}", idx + 1, e);
                BatchRecord::Error(BatchError { line: idx + 1, error: e.to_string() })
            }
        };

        writeln!(out, "{}", to_json(&record)?)
            .map_err(|e| CliError::general(format!("cannot write stdout: {}", e)))?;
    }

    out.flush().map_err(|e| CliError::general(format!("cannot write stdout: {}", e)))
}

// ============================================================================
// ai doctor
// ============================================================================

fn cmd_ai_doctor(json: bool) -> Result<(), CliError> {
    let config = ResolvedAIConfig::load();
    let diag = AIDiagnostics::from_resolved(&config);
    let validation = config.validate_config();

    if json {
        let out = serde_json::json!({
            "schema_version": 1,
            "status": diag.status.as_str(),
            "blocking_reason": diag.blocking_reason,
            "provider": diag.provider,
            "model": diag.model,
            "key": if diag.key_present { "present" } else { "missing" },
            "key_source": diag.key_source.as_str(),
            "keychain": if diag.keychain_available { "ok" } else { "unavailable" },
            "endpoint": diag.endpoint,
            "timeout_secs": diag.timeout_secs,
            "routing": diag.routing,
            "check": validation.as_str(),
        });
        println!("{}", to_json(&out)?);
    } else {
        print!("{}", diag);
        println!("Check:             {}", validation.as_str());
    }

    match config.status {
        AIConfigStatus::Ready => Ok(()),
        AIConfigStatus::Disabled => Err(CliError {
            code: EXIT_AI_DISABLED,
            message: "AI is disabled".to_string(),
            hint: Some(format!("Set ai.provider in {}", studybuddy_config::Settings::config_path_display())),
        }),
        AIConfigStatus::MissingKey => Err(CliError {
            code: EXIT_AI_MISSING_KEY,
            message: "AI misconfigured: missing API key".to_string(),
            hint: config.blocking_reason.clone(),
        }),
    }
}
