// Math evaluator: strict `name(expr)` extraction, then the engine.

use once_cell::sync::Lazy;
use regex::Regex;

use studybuddy_engine::{evaluate_call, MathOperation, SymbolTable, SymbolicError};

/// Full-string call shape. Case is preserved, so `Integrate(x)` extracts
/// the name `Integrate`, which is not an operation.
static MATH_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\w+)\((.*)\)$").expect("math call pattern is valid"));

/// Result of trying to answer a query as a math call.
#[derive(Debug, Clone, PartialEq)]
pub enum MathOutcome {
    /// Typeset result, already wrapped in `\(...\)`.
    Evaluated { operation: MathOperation, latex: String },
    /// Query is not shaped `name(expr)`.
    NotACall,
    /// Call shape matched but the name is not an operation.
    UnknownOperation(String),
    /// The engine could not parse or transform the argument.
    Failed { operation: MathOperation, error: SymbolicError },
}

impl MathOutcome {
    pub fn latex(&self) -> Option<&str> {
        match self {
            MathOutcome::Evaluated { latex, .. } => Some(latex),
            _ => None,
        }
    }

    pub fn into_latex(self) -> Option<String> {
        match self {
            MathOutcome::Evaluated { latex, .. } => Some(latex),
            _ => None,
        }
    }

    /// Short reason a call did not evaluate, for logs and CLI errors.
    pub fn describe(&self) -> String {
        match self {
            MathOutcome::Evaluated { operation, .. } => format!("{operation} evaluated"),
            MathOutcome::NotACall => "not a math call of the form name(expression)".to_string(),
            MathOutcome::UnknownOperation(name) => format!("unknown operation '{name}'"),
            MathOutcome::Failed { operation, error } => format!("{operation} failed: {error}"),
        }
    }
}

/// Split `name(expr)` into its parts.
pub fn extract_call(query: &str) -> Option<(&str, &str)> {
    let caps = MATH_CALL.captures(query)?;
    let name = caps.get(1)?.as_str();
    let expr = caps.get(2)?.as_str();
    Some((name, expr))
}

#[derive(Debug, Clone, Default)]
pub struct MathEvaluator {
    symbols: SymbolTable,
}

impl MathEvaluator {
    pub fn new(symbols: SymbolTable) -> Self {
        Self { symbols }
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Evaluate a trimmed query. Never panics on user input.
    pub fn evaluate(&self, query: &str) -> MathOutcome {
        let Some((name, expr)) = extract_call(query) else {
            return MathOutcome::NotACall;
        };
        let Some(operation) = MathOperation::from_name(name) else {
            return MathOutcome::UnknownOperation(name.to_string());
        };

        match evaluate_call(operation, expr, &self.symbols) {
            Ok(latex) => MathOutcome::Evaluated { operation, latex },
            Err(error) => {
                log::debug!("{} on {} chars: {}", operation, expr.len(), error);
                MathOutcome::Failed { operation, error }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(q: &str) -> MathOutcome {
        MathEvaluator::default().evaluate(q)
    }

    #[test]
    fn test_extract_call() {
        assert_eq!(extract_call("integrate(x^2)"), Some(("integrate", "x^2")));
        assert_eq!(extract_call("limits(sin(x)/x)"), Some(("limits", "sin(x)/x")));
        assert_eq!(extract_call("solve (x)"), None);
        assert_eq!(extract_call("integrate(x) please"), None);
        assert_eq!(extract_call("(x)"), None);
    }

    #[test]
    fn test_evaluated() {
        assert_eq!(eval("evaluate(x+1)").latex(), Some("\\(2\\)"));
        assert_eq!(eval("integrate(x)").latex(), Some("\\(\\frac{x^{2}}{2}\\)"));
        assert_eq!(eval("differentiate(x^2)").latex(), Some("\\(2 x\\)"));
    }

    #[test]
    fn test_roots_is_solve() {
        let a = eval("solve(x^2 - 5*x + 6)").into_latex();
        let b = eval("roots(x^2 - 5*x + 6)").into_latex();
        assert!(a.is_some());
        assert_eq!(a, b);
    }

    #[test]
    fn test_case_sensitive_name() {
        assert_eq!(eval("Integrate(x)"), MathOutcome::UnknownOperation("Integrate".into()));
        assert_eq!(eval("plot(x)"), MathOutcome::UnknownOperation("plot".into()));
    }

    #[test]
    fn test_parse_failure_is_absence() {
        match eval("integrate(x+)") {
            MathOutcome::Failed { operation, error } => {
                assert_eq!(operation, MathOperation::Integrate);
                assert!(matches!(error, SymbolicError::Parse(_)));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        assert_eq!(eval("integrate x").latex(), None);
        assert_eq!(eval("integrate x"), MathOutcome::NotACall);
    }

    #[test]
    fn test_describe() {
        assert!(eval("Integrate(x)").describe().contains("unknown operation 'Integrate'"));
        assert!(eval("hello").describe().starts_with("not a math call"));
    }
}
