// Visualization synthesizer
//
// Asks the generative service for a self-contained React component and
// packages the reply as a `component` payload.

use studybuddy_ai_client::{AiError, CompletionRequest, GenerativeService};
use studybuddy_config::settings::GenerationLimits;
use studybuddy_protocol::ResponsePayload;

/// Line appended when the reply has no `export default`.
pub const EXPORT_MARKER: &str = "\nexport default VisualizationComponent;";

pub const SYSTEM_PROMPT: &str = r#"You are a specialized coding assistant that converts visualization requests into React components.
Return ONLY the React component code that follows these rules:

1. DO NOT use JSX syntax - use React.createElement instead
2. DO NOT include any import statements
3. DO NOT include export statements
4. The following dependencies are automatically available:
   - React (and hooks)
   - Recharts components: LineChart, BarChart, AreaChart, Line, Bar, Area, XAxis, YAxis, CartesianGrid, Tooltip, Legend
   - lodash as _
   - mathjs as math

Example format:
return function VisualizationComponent() {
    const [state, setState] = React.useState(initialValue);

    return React.createElement('div', { className: 'w-full p-4' },
        React.createElement(LineChart, { width: 600, height: 300 },
            React.createElement(XAxis, { dataKey: 'name' }),
            React.createElement(YAxis),
            React.createElement(CartesianGrid, { strokeDasharray: '3 3' }),
            React.createElement(Tooltip),
            React.createElement(Legend),
            React.createElement(Line, {
                type: 'monotone',
                dataKey: 'value',
                stroke: '#8884d8'
            })
        )
    );
}
"#;

pub fn user_prompt(query: &str) -> String {
    format!(
        "Create an interactive React component that visualizes: {}. Return ONLY the component code, no explanations.",
        query
    )
}

/// Normalize a raw reply into component source.
///
/// Trims, drops the first and last lines of a fenced block, and appends
/// [`EXPORT_MARKER`] if no `export default` is present.
pub fn post_process(reply: &str) -> String {
    let mut code = reply.trim().to_string();

    if code.starts_with("```") {
        let lines: Vec<&str> = code.split('\n').collect();
        code = if lines.len() > 2 {
            lines[1..lines.len() - 1].join("\n")
        } else {
            String::new()
        };
    }

    if !code.contains("export default") {
        code.push_str(EXPORT_MARKER);
    }

    code
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualizationSynthesizer {
    limits: GenerationLimits,
}

impl Default for VisualizationSynthesizer {
    fn default() -> Self {
        Self::new(GenerationLimits { max_tokens: 2000, temperature: 0.7 })
    }
}

impl VisualizationSynthesizer {
    pub fn new(limits: GenerationLimits) -> Self {
        Self { limits }
    }

    pub fn request(&self, query: &str) -> CompletionRequest {
        CompletionRequest::new(SYSTEM_PROMPT, user_prompt(query))
            .max_tokens(self.limits.max_tokens)
            .temperature(self.limits.temperature)
    }

    /// One service round trip. Errors are returned for the caller to fall back on.
    pub fn synthesize(
        &self,
        service: &dyn GenerativeService,
        query: &str,
    ) -> Result<ResponsePayload, AiError> {
        let reply = service.complete(&self.request(query))?;
        Ok(ResponsePayload::component(post_process(&reply)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fences_stripped() {
        let reply = "```javascript\nfunction VisualizationComponent() {}\n```";
        assert_eq!(
            post_process(reply),
            "function VisualizationComponent() {}\nexport default VisualizationComponent;"
        );
    }

    #[test]
    fn test_marker_appended_once() {
        let once = post_process("const a = 1;");
        assert_eq!(once.matches("export default").count(), 1);
        assert!(once.ends_with("\nexport default VisualizationComponent;"));

        let again = post_process(&once);
        assert_eq!(again, once);
    }

    #[test]
    fn test_existing_export_kept() {
        let code = "function C() {}\nexport default C;";
        assert_eq!(post_process(code), code);
    }

    #[test]
    fn test_surrounding_whitespace_trimmed() {
        assert_eq!(
            post_process("\n\n  x();  \n"),
            "x();\nexport default VisualizationComponent;"
        );
    }

    #[test]
    fn test_bare_fence_becomes_marker_only() {
        assert_eq!(post_process("```"), "\nexport default VisualizationComponent;");
    }

    #[test]
    fn test_request_limits() {
        let req = VisualizationSynthesizer::default().request("a sine wave");
        assert_eq!(req.max_tokens, 2000);
        assert_eq!(req.temperature, 0.7);
        assert_eq!(req.system, SYSTEM_PROMPT);
        assert!(req.user.contains("visualizes: a sine wave."));
    }
}
