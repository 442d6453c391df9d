// Operation table: the nine named transforms a math call can request

use serde::{Deserialize, Serialize};

use crate::algebra;
use crate::calculus;
use crate::error::{SymbolicError, SymbolicResult};
use crate::expr::Expr;
use crate::latex::{list_to_latex, to_latex};
use crate::parser::parse;
use crate::solve;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MathOperation {
    Integrate,
    Differentiate,
    Simplify,
    Solve,
    Expand,
    Factor,
    /// Same transform as `Solve`, kept as its own name for callers that ask for roots.
    Roots,
    Limits,
    Evaluate,
}

impl MathOperation {
    pub const ALL: [MathOperation; 9] = [
        MathOperation::Integrate,
        MathOperation::Differentiate,
        MathOperation::Simplify,
        MathOperation::Solve,
        MathOperation::Expand,
        MathOperation::Factor,
        MathOperation::Roots,
        MathOperation::Limits,
        MathOperation::Evaluate,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MathOperation::Integrate => "integrate",
            MathOperation::Differentiate => "differentiate",
            MathOperation::Simplify => "simplify",
            MathOperation::Solve => "solve",
            MathOperation::Expand => "expand",
            MathOperation::Factor => "factor",
            MathOperation::Roots => "roots",
            MathOperation::Limits => "limits",
            MathOperation::Evaluate => "evaluate",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.name() == name)
    }

    /// Run the transform. Input or output carrying an overflowed exact value is
    /// rejected, since its digits can no longer be trusted.
    pub fn apply(&self, expr: &Expr, symbols: &SymbolTable) -> SymbolicResult<MathResult> {
        if expr.has_overflow() {
            return Err(SymbolicError::Overflow);
        }
        let x = symbols.primary.as_str();
        let result = match self {
            MathOperation::Integrate => MathResult::Expr(calculus::integrate(expr, x)?),
            MathOperation::Differentiate => MathResult::Expr(calculus::diff(expr, x)),
            MathOperation::Simplify => MathResult::Expr(algebra::simplify(expr)),
            MathOperation::Solve | MathOperation::Roots => MathResult::Solutions(solve::solve(expr, x)?),
            MathOperation::Expand => MathResult::Expr(algebra::expand_fully(expr)?),
            MathOperation::Factor => MathResult::Expr(algebra::factor(expr)?),
            MathOperation::Limits => MathResult::Expr(calculus::limit(expr, x)?),
            MathOperation::Evaluate => MathResult::Expr(expr.subs(x, &Expr::one())),
        };
        if result.has_overflow() {
            log::debug!("{} overflowed 64-bit rationals", self.name());
            return Err(SymbolicError::Overflow);
        }
        Ok(result)
    }
}

impl std::fmt::Display for MathOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Output of a transform: one expression, or the solution list of `solve`/`roots`.
#[derive(Debug, Clone, PartialEq)]
pub enum MathResult {
    Expr(Expr),
    Solutions(Vec<Expr>),
}

impl MathResult {
    pub fn has_overflow(&self) -> bool {
        match self {
            MathResult::Expr(e) => e.has_overflow(),
            MathResult::Solutions(xs) => xs.iter().any(Expr::has_overflow),
        }
    }

    pub fn to_latex(&self) -> String {
        match self {
            MathResult::Expr(e) => to_latex(e),
            MathResult::Solutions(xs) => list_to_latex(xs),
        }
    }

    /// LaTeX wrapped in inline math delimiters `\(...\)`.
    pub fn to_inline_latex(&self) -> String {
        format!("\\({}\\)", self.to_latex())
    }
}

/// Symbols shared by every math call. Only `primary` is ever transformed against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolTable {
    pub primary: String,
    pub secondary: String,
    pub tertiary: String,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self {
            primary: "x".to_string(),
            secondary: "y".to_string(),
            tertiary: "n".to_string(),
        }
    }
}

/// Parse `text`, apply `op` and typeset the result as inline LaTeX.
pub fn evaluate_call(op: MathOperation, text: &str, symbols: &SymbolTable) -> SymbolicResult<String> {
    let expr = parse(text)?;
    Ok(op.apply(&expr, symbols)?.to_inline_latex())
}
