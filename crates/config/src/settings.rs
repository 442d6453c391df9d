// Application settings
// Loaded from ~/.config/studybuddy/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// AI provider selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AIProvider {
    /// AI features disabled; every non-math query gets the apology
    None,
    /// Local model via Ollama
    Local,
    /// OpenAI API
    #[serde(rename = "openai")]
    OpenAI,
    /// Anthropic API (default)
    #[default]
    Anthropic,
}

impl AIProvider {
    /// Returns true if AI features are enabled
    pub fn is_enabled(&self) -> bool {
        !matches!(self, AIProvider::None)
    }

    /// Cloud providers authenticate with an API key
    pub fn needs_api_key(&self) -> bool {
        matches!(self, AIProvider::OpenAI | AIProvider::Anthropic)
    }

    /// Lowercase name, as written in settings.json
    pub fn name(&self) -> &'static str {
        match self {
            AIProvider::None => "none",
            AIProvider::Local => "local",
            AIProvider::OpenAI => "openai",
            AIProvider::Anthropic => "anthropic",
        }
    }

    /// Returns the default model for this provider
    pub fn default_model(&self) -> &'static str {
        match self {
            AIProvider::None => "",
            AIProvider::Local => "llama3:8b",
            AIProvider::OpenAI => "gpt-4o",
            AIProvider::Anthropic => "claude-3-5-sonnet-20241022",
        }
    }
}

/// AI-specific settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AISettings {
    /// Selected AI provider
    pub provider: AIProvider,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Custom endpoint for Local provider (Ollama URL)
    pub endpoint: Option<String>,

    /// Per-request timeout for provider calls
    pub timeout_secs: u64,
}

impl Default for AISettings {
    fn default() -> Self {
        Self {
            provider: AIProvider::default(),
            model: String::new(), // Empty = use provider default
            endpoint: None,
            timeout_secs: 60,
        }
    }
}

impl AISettings {
    /// Get the effective model (user-specified or provider default)
    pub fn effective_model(&self) -> &str {
        if self.model.is_empty() {
            self.provider.default_model()
        } else {
            &self.model
        }
    }

    /// Get the effective endpoint for Local provider
    pub fn effective_endpoint(&self) -> &str {
        self.endpoint.as_deref().unwrap_or("http://localhost:11434")
    }
}

/// Output bounds for one kind of generative request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationLimits {
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Per-strategy generation limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingSettings {
    pub visualization: GenerationLimits,
    pub general: GenerationLimits,
}

impl Default for RoutingSettings {
    fn default() -> Self {
        Self {
            visualization: GenerationLimits { max_tokens: 2000, temperature: 0.7 },
            general: GenerationLimits { max_tokens: 1000, temperature: 0.7 },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub ai: AISettings,
    pub routing: RoutingSettings,
}

const DEFAULT_CONFIG: &str = r#"{
    // AI provider used for visualization and general answers
    // Provider options: "none", "local", "openai", "anthropic"
    // API keys are stored in system keychain or STUDYBUDDY_<PROVIDER>_KEY, not in this file
    "ai": {
        "provider": "anthropic",
        "model": "",
        "timeout_secs": 60
    },

    // Output bounds per answer strategy
    "routing": {
        "visualization": { "max_tokens": 2000, "temperature": 0.7 },
        "general": { "max_tokens": 1000, "temperature": 0.7 }
    }
}
"#;

/// Drop `//` comment lines so the file parses as plain JSON
fn strip_comments(contents: &str) -> String {
    contents
        .lines()
        .filter(|line| !line.trim().starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("studybuddy");
        config_dir.join("settings.json")
    }

    /// Load settings from disk, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();

        if !path.exists() {
            create_default_file(&path);
            return Self::default();
        }

        Self::load_from(&path)
    }

    /// Load settings from an explicit path, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match Self::parse(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("Error parsing {}: {}; using default settings", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Error reading {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Parse settings text, tolerating `//` comment lines
    pub fn parse(contents: &str) -> Result<Self, String> {
        serde_json::from_str(&strip_comments(contents)).map_err(|e| e.to_string())
    }

    /// Get the config file path for display/opening
    pub fn config_path_display() -> String {
        Self::config_path().to_string_lossy().to_string()
    }
}

/// Create default settings file with comments
fn create_default_file(path: &Path) {
    if let Some(parent) = path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            log::warn!("Error creating config directory: {}", e);
            return;
        }
    }

    if let Err(e) = fs::write(path, DEFAULT_CONFIG) {
        log::warn!("Error writing default settings.json: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let s = Settings::default();
        assert_eq!(s.ai.provider, AIProvider::Anthropic);
        assert_eq!(s.ai.effective_model(), "claude-3-5-sonnet-20241022");
        assert_eq!(s.ai.timeout_secs, 60);
        assert_eq!(s.routing.visualization.max_tokens, 2000);
        assert_eq!(s.routing.general.max_tokens, 1000);
        assert_eq!(s.routing.general.temperature, 0.7);
    }

    #[test]
    fn test_default_file_parses_to_defaults() {
        assert_eq!(Settings::parse(DEFAULT_CONFIG).unwrap(), Settings::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let s = Settings::parse(
            r#"{
            // local only
            "ai": { "provider": "local", "endpoint": "http://box:11434" }
        }"#,
        )
        .unwrap();
        assert_eq!(s.ai.provider, AIProvider::Local);
        assert_eq!(s.ai.effective_endpoint(), "http://box:11434");
        assert_eq!(s.ai.effective_model(), "llama3:8b");
        assert_eq!(s.routing, RoutingSettings::default());
    }

    #[test]
    fn test_provider_names() {
        for p in [AIProvider::None, AIProvider::Local, AIProvider::OpenAI, AIProvider::Anthropic] {
            let json = serde_json::to_string(&p).unwrap();
            assert_eq!(json, format!("\"{}\"", p.name()));
        }
        assert!(!AIProvider::Local.needs_api_key());
        assert!(AIProvider::OpenAI.needs_api_key());
    }

    #[test]
    fn test_bad_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_load_from_hand_edited_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            "// edited by hand\n{ \"ai\": { \"provider\": \"openai\" }, \"routing\": { \"general\": { \"max_tokens\": 500, \"temperature\": 0.2 } } }",
        )
        .unwrap();
        let s = Settings::load_from(&path);
        assert_eq!(s.ai.provider, AIProvider::OpenAI);
        assert_eq!(s.routing.general.max_tokens, 500);
        assert_eq!(s.routing.visualization, RoutingSettings::default().visualization);
    }
}
