// Query classification
//
// Two independent checks, visualization first. The math check only looks at
// the prefix shape `name(`; the strict call syntax is enforced later by the
// math evaluator, so a query can classify as math and still fall through.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use studybuddy_engine::MathOperation;

/// Which strategy answers a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Math,
    Visualization,
    General,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Math => "math",
            Classification::Visualization => "visualization",
            Classification::General => "general",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Substrings that mark a visualization request. Matched case-insensitively.
pub const VISUALIZATION_KEYWORDS: [&str; 15] = [
    "visual",
    "visualize",
    "visualization",
    "graph",
    "plot",
    "simulate",
    "simulation",
    "show me",
    "display",
    "demonstrate",
    "draw",
    "create",
    "example",
    "interactive",
    "animation",
];

/// `^\s*(integrate|differentiate|...)\s*\(` built from the operation table.
static MATH_PREFIX: Lazy<Regex> = Lazy::new(|| {
    let names: Vec<&str> = MathOperation::ALL.iter().map(|op| op.name()).collect();
    let pattern = format!(r"^\s*(?:{})\s*\(", names.join("|"));
    Regex::new(&pattern).expect("operation names form a valid regex")
});

pub fn is_visualization_request(query: &str) -> bool {
    let lowered = query.to_lowercase();
    VISUALIZATION_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

pub fn is_math_query(query: &str) -> bool {
    MATH_PREFIX.is_match(&query.to_lowercase())
}

/// Classify a trimmed query. Visualization wins over math.
pub fn classify(query: &str) -> Classification {
    let class = if is_visualization_request(query) {
        Classification::Visualization
    } else if is_math_query(query) {
        Classification::Math
    } else {
        Classification::General
    };
    log::debug!("classified query ({} chars) as {}", query.len(), class);
    class
}
