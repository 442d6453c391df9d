//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract; scripts rely on them.
//!
//! # Exit Code Ranges
//!
//! | Range   | Domain           | Description                              |
//! |---------|------------------|------------------------------------------|
//! | 0       | Universal        | Success                                  |
//! | 1       | Universal        | General error (unspecified)              |
//! | 2       | Universal        | CLI usage error (bad args, unreadable input) |
//! | 10-19   | ai               | AI provider/keychain codes               |
//! | 60-69   | math             | Offline math call codes                  |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant in the appropriate range
//! 2. Document what triggers it
//! 3. Update the table above
//! 4. Wire it into the relevant command's error handling

use studybuddy_core::MathOutcome;
use studybuddy_engine::SymbolicError;

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, unreadable stdin.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// AI (10-19)
// =============================================================================

/// AI disabled (provider=none). Informational.
pub const EXIT_AI_DISABLED: u8 = 10;

/// AI provider configured but API key missing.
pub const EXIT_AI_MISSING_KEY: u8 = 11;

// =============================================================================
// Math (60-69)
// =============================================================================

/// Input is not a call to a known operation, or the transform has no answer.
pub const EXIT_MATH_NOT_EVALUABLE: u8 = 60;

/// The call's argument is not a valid expression.
pub const EXIT_MATH_PARSE: u8 = 61;

/// Map a math outcome that did not evaluate to its exit code.
pub fn math_exit_code(outcome: &MathOutcome) -> u8 {
    match outcome {
        MathOutcome::Evaluated { .. } => EXIT_SUCCESS,
        MathOutcome::Failed { error: SymbolicError::Parse(_), .. } => EXIT_MATH_PARSE,
        MathOutcome::Failed { .. } | MathOutcome::NotACall | MathOutcome::UnknownOperation(_) => {
            EXIT_MATH_NOT_EVALUABLE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use studybuddy_core::MathEvaluator;

    #[test]
    fn test_math_exit_codes() {
        let eval = MathEvaluator::default();
        assert_eq!(math_exit_code(&eval.evaluate("integrate(x)")), EXIT_SUCCESS);
        assert_eq!(math_exit_code(&eval.evaluate("integrate(x+)")), EXIT_MATH_PARSE);
        assert_eq!(math_exit_code(&eval.evaluate("Integrate(x)")), EXIT_MATH_NOT_EVALUABLE);
        assert_eq!(math_exit_code(&eval.evaluate("hello")), EXIT_MATH_NOT_EVALUABLE);
        assert_eq!(math_exit_code(&eval.evaluate("solve(x^3 - 2)")), EXIT_MATH_NOT_EVALUABLE);
    }

    #[test]
    fn test_codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS,
            EXIT_ERROR,
            EXIT_USAGE,
            EXIT_AI_DISABLED,
            EXIT_AI_MISSING_KEY,
            EXIT_MATH_NOT_EVALUABLE,
            EXIT_MATH_PARSE,
        ];
        let mut sorted = codes.to_vec();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), codes.len());
    }
}
