// General responder: the query goes verbatim to the service under a study-buddy persona.

use studybuddy_ai_client::{CompletionRequest, GenerativeService};
use studybuddy_config::settings::GenerationLimits;

/// Instruction set and apology for one flavor of general answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Persona {
    /// Direct general questions and math fallthrough.
    Primary,
    /// Stand-in when a visualization could not be generated.
    Fallback,
}

const PRIMARY_PROMPT: &str = r#"You are a Study Buddy AI designed to help students learn and solve problems.
Your responses should be:
1. Clear and educational
2. Include step-by-step explanations when appropriate
3. Use LaTeX notation (wrapped in \( and \)) for any mathematical expressions
4. Friendly and encouraging

For math concepts, provide both explanations and examples.
If a concept could benefit from visualization, mention that the user can ask for a visual demonstration."#;

const FALLBACK_PROMPT: &str = r#"You are a Study Buddy AI designed to help students learn and solve problems.
Your responses should be:
1. Clear and educational
2. Include step-by-step explanations when appropriate
3. Use LaTeX notation (wrapped in \( and \)) for mathematical expressions
4. Friendly and encouraging

If a concept could benefit from visualization, mention that the user can ask for a visual demonstration."#;

impl Persona {
    pub fn system_prompt(&self) -> &'static str {
        match self {
            Persona::Primary => PRIMARY_PROMPT,
            Persona::Fallback => FALLBACK_PROMPT,
        }
    }

    /// Fixed reply when the service call fails.
    pub fn apology(&self) -> &'static str {
        match self {
            Persona::Primary => {
                "I'm having trouble connecting to my knowledge base right now. Could you please try again?"
            }
            Persona::Fallback => {
                "I apologize, but I'm having trouble processing your request. Could you please try again?"
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Persona::Primary => "primary",
            Persona::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneralResponder {
    limits: GenerationLimits,
}

impl Default for GeneralResponder {
    fn default() -> Self {
        Self::new(GenerationLimits { max_tokens: 1000, temperature: 0.7 })
    }
}

impl GeneralResponder {
    pub fn new(limits: GenerationLimits) -> Self {
        Self { limits }
    }

    pub fn request(&self, persona: Persona, query: &str) -> CompletionRequest {
        CompletionRequest::new(persona.system_prompt(), query)
            .max_tokens(self.limits.max_tokens)
            .temperature(self.limits.temperature)
    }

    /// Always returns prose: the service's reply, or the persona's apology.
    pub fn respond(&self, service: &dyn GenerativeService, persona: Persona, query: &str) -> String {
        match service.complete(&self.request(persona, query)) {
            Ok(text) => text,
            Err(e) => {
                log::warn!("general ({}) answer unavailable: {}", persona.as_str(), e);
                persona.apology().to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_personas_differ() {
        assert!(Persona::Primary.system_prompt().contains("provide both explanations and examples"));
        assert!(!Persona::Fallback.system_prompt().contains("provide both explanations and examples"));
        assert_ne!(Persona::Primary.apology(), Persona::Fallback.apology());
    }

    #[test]
    fn test_prompt_asks_for_inline_latex() {
        for p in [Persona::Primary, Persona::Fallback] {
            assert!(p.system_prompt().contains(r"\( and \)"));
        }
    }

    #[test]
    fn test_request_is_verbatim() {
        let req = GeneralResponder::default().request(Persona::Primary, "  Why is the sky blue? ");
        assert_eq!(req.user, "  Why is the sky blue? ");
        assert_eq!(req.max_tokens, 1000);
        assert_eq!(req.temperature, 0.7);
    }
}
