//! Symbolic math engine.
//!
//! Parses single-variable expressions into a canonical tree over exact rationals,
//! runs the calculus and algebra transforms behind math calls, and typesets results
//! as LaTeX.

pub mod algebra;
pub mod calculus;
pub mod error;
pub mod expr;
pub mod latex;
pub mod number;
pub mod ops;
pub mod parser;
pub mod poly;
pub mod solve;

pub use algebra::{cancel, expand, factor, simplify};
pub use calculus::{diff, integrate, limit};
pub use error::{SymbolicError, SymbolicResult};
pub use expr::{Constant, Expr, Func};
pub use latex::{list_to_latex, to_latex};
pub use number::Number;
pub use ops::{evaluate_call, MathOperation, MathResult, SymbolTable};
pub use parser::parse;
pub use solve::solve;
