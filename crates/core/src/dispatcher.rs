// Dispatcher: the single entry point from a question to a response payload.

use std::sync::Arc;

use studybuddy_ai_client::GenerativeService;
use studybuddy_config::settings::RoutingSettings;
use studybuddy_protocol::{QuestionRequest, QuestionResponse, ResponsePayload};

use crate::classifier::{classify, Classification};
use crate::general::{GeneralResponder, Persona};
use crate::math::{MathEvaluator, MathOutcome};
use crate::visualization::VisualizationSynthesizer;

/// Reply for an empty or whitespace-only query.
pub const EMPTY_QUERY_MESSAGE: &str = "Please ask me a question!";

pub struct Dispatcher {
    service: Arc<dyn GenerativeService>,
    math: MathEvaluator,
    visualization: VisualizationSynthesizer,
    general: GeneralResponder,
}

impl Dispatcher {
    /// Dispatcher with default generation limits.
    pub fn new(service: Arc<dyn GenerativeService>) -> Self {
        Self::with_routing(service, &RoutingSettings::default())
    }

    pub fn with_routing(service: Arc<dyn GenerativeService>, routing: &RoutingSettings) -> Self {
        Self {
            service,
            math: MathEvaluator::default(),
            visualization: VisualizationSynthesizer::new(routing.visualization),
            general: GeneralResponder::new(routing.general),
        }
    }

    /// Answer one query. Never fails; errors become fallthroughs or fixed text.
    pub fn handle(&self, query: &str) -> ResponsePayload {
        let query = query.trim();
        if query.is_empty() {
            return ResponsePayload::text(EMPTY_QUERY_MESSAGE);
        }

        match classify(query) {
            Classification::Visualization => self.visualize(query),
            Classification::Math => match self.math.evaluate(query) {
                MathOutcome::Evaluated { latex, .. } => ResponsePayload::text(latex),
                outcome => {
                    log::warn!("math call fell through to general: {}", outcome.describe());
                    self.answer(Persona::Primary, query)
                }
            },
            Classification::General => self.answer(Persona::Primary, query),
        }
    }

    /// Answer a request envelope. A missing or empty question is rejected
    /// before routing.
    pub fn process(&self, request: &QuestionRequest) -> QuestionResponse {
        match request.question_text() {
            Some(question) => QuestionResponse::new(self.handle(question)),
            None => QuestionResponse::invalid_question(),
        }
    }

    fn visualize(&self, query: &str) -> ResponsePayload {
        match self.visualization.synthesize(self.service.as_ref(), query) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("visualization unavailable, answering in prose: {}", e);
                self.answer(Persona::Fallback, query)
            }
        }
    }

    fn answer(&self, persona: Persona, query: &str) -> ResponsePayload {
        ResponsePayload::text(self.general.respond(self.service.as_ref(), persona, query))
    }
}
