// Property-based tests for query classification.
// CI: 128 cases (default). Soak: PROPTEST_CASES=5000 cargo test -p studybuddy-core

use proptest::prelude::*;
use studybuddy_core::classifier::{classify, Classification, VISUALIZATION_KEYWORDS};
use studybuddy_engine::MathOperation;

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(128),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

fn arb_operation() -> impl Strategy<Value = MathOperation> {
    prop::sample::select(MathOperation::ALL.to_vec())
}

fn arb_keyword() -> impl Strategy<Value = &'static str> {
    prop::sample::select(VISUALIZATION_KEYWORDS.to_vec())
}

/// Argument text built from characters no keyword can be assembled from.
fn arb_argument() -> impl Strategy<Value = String> {
    "[x0-9+*/^ ]{0,12}"
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn keyword_always_means_visualization(
        op in arb_operation(),
        kw in arb_keyword(),
        arg in arb_argument(),
        upper in any::<bool>(),
    ) {
        let kw = if upper { kw.to_uppercase() } else { kw.to_string() };
        let query = format!("{}({}) {}", op.name(), arg, kw);
        prop_assert_eq!(classify(&query), Classification::Visualization);
    }

    #[test]
    fn call_shape_without_keyword_is_math(
        op in arb_operation(),
        arg in arb_argument(),
        pad in "[ \t]{0,3}",
    ) {
        let query = format!("{}{}({})", pad, op.name(), arg);
        prop_assert_eq!(classify(&query), Classification::Math);
    }

    #[test]
    fn classify_never_panics(query in "\\PC{0,40}") {
        let _ = classify(&query);
    }
}
