//! Study Buddy query routing.
//!
//! A free-text question goes to exactly one strategy: symbolic math, a generated
//! visualization component, or a general explanation. [`Dispatcher`] is the
//! single entry point and never surfaces an error to its caller; every failure
//! becomes a fallthrough or a fixed message.

pub mod classifier;
pub mod dispatcher;
pub mod general;
pub mod math;
pub mod visualization;

pub use classifier::{classify, Classification};
pub use dispatcher::{Dispatcher, EMPTY_QUERY_MESSAGE};
pub use general::{GeneralResponder, Persona};
pub use math::{MathEvaluator, MathOutcome};
pub use visualization::VisualizationSynthesizer;
