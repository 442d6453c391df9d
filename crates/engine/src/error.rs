use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolicError {
    /// Input text is not a well-formed expression.
    Parse(String),
    /// The transform has no closed form this engine can produce.
    Unsupported(String),
    /// Equation degree beyond what the solver handles in radicals.
    UnsolvableDegree(usize),
    /// Result is undefined (e.g. 0/0 that does not resolve).
    Undefined(String),
    /// An exact integer or rational left the 64-bit range.
    Overflow,
}

impl fmt::Display for SymbolicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::Unsupported(msg) => write!(f, "unsupported: {msg}"),
            Self::UnsolvableDegree(d) => write!(f, "cannot solve irreducible polynomial of degree {d}"),
            Self::Undefined(msg) => write!(f, "undefined: {msg}"),
            Self::Overflow => write!(f, "exact value does not fit in 64 bits"),
        }
    }
}

impl std::error::Error for SymbolicError {}

pub type SymbolicResult<T> = Result<T, SymbolicError>;
