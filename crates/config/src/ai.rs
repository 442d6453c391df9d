// AI configuration and secrets management
//
// API keys are resolved from:
// 1. System keychain (preferred)
// 2. STUDYBUDDY_<PROVIDER>_KEY environment variable (CI/headless)
// 3. APIKEY environment variable (older deployments)
//
// Keys are NEVER stored in settings.json

use std::env;

use crate::settings::{AIProvider, AISettings, RoutingSettings, Settings};

/// Service name for keychain storage
const KEYCHAIN_SERVICE: &str = "studybuddy";

/// Single key variable read by older deployments
pub const LEGACY_KEY_VAR: &str = "APIKEY";

/// Source of an API key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Key retrieved from system keychain
    Keychain,
    /// Key retrieved from STUDYBUDDY_<PROVIDER>_KEY
    Environment,
    /// Key retrieved from APIKEY
    LegacyEnvironment,
    /// No key found
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Keychain => "keychain",
            KeySource::Environment => "environment",
            KeySource::LegacyEnvironment => "environment (APIKEY)",
            KeySource::None => "none",
        }
    }
}

/// Result of key lookup
#[derive(Debug, Clone)]
pub struct KeyLookup {
    pub key: Option<String>,
    pub source: KeySource,
}

/// Get the environment variable name for a provider
pub fn env_var_name(provider: &str) -> String {
    format!("STUDYBUDDY_{}_KEY", provider.to_uppercase())
}

/// Get the keychain account name for a provider
fn keychain_account(provider: &str) -> String {
    format!("ai/{}", provider.to_lowercase())
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

/// Get an API key for the specified provider
///
/// Checks in order:
/// 1. System keychain
/// 2. Environment variable (STUDYBUDDY_ANTHROPIC_KEY, etc.)
/// 3. APIKEY
pub fn get_api_key(provider: &str) -> KeyLookup {
    #[cfg(feature = "keychain")]
    {
        if let Ok(entry) = keyring::Entry::new(KEYCHAIN_SERVICE, &keychain_account(provider)) {
            if let Ok(key) = entry.get_password() {
                return KeyLookup {
                    key: Some(key),
                    source: KeySource::Keychain,
                };
            }
        }
    }

    if let Some(key) = non_empty_env(&env_var_name(provider)) {
        return KeyLookup {
            key: Some(key),
            source: KeySource::Environment,
        };
    }

    if let Some(key) = non_empty_env(LEGACY_KEY_VAR) {
        return KeyLookup {
            key: Some(key),
            source: KeySource::LegacyEnvironment,
        };
    }

    KeyLookup {
        key: None,
        source: KeySource::None,
    }
}

/// Check if keychain support is available
pub fn keychain_available() -> bool {
    #[cfg(feature = "keychain")]
    {
        keyring::Entry::new(KEYCHAIN_SERVICE, "test").is_ok()
    }
    #[cfg(not(feature = "keychain"))]
    {
        false
    }
}

// ============================================================================
// Resolved AI Configuration (single source of truth)
// ============================================================================

/// The effective AI configuration, fully resolved from all sources.
#[derive(Debug, Clone)]
pub struct ResolvedAIConfig {
    pub provider: AIProvider,
    /// Effective model (resolved from settings or provider default)
    pub model: String,
    /// Endpoint for Local provider (resolved with default)
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    /// API key (if available and provider needs one)
    pub api_key: Option<String>,
    pub key_source: KeySource,
    pub routing: RoutingSettings,
    pub status: AIConfigStatus,
    /// Human-readable reason if not ready
    pub blocking_reason: Option<String>,
}

/// Status of the AI configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AIConfigStatus {
    /// AI is disabled (provider = None)
    Disabled,
    /// Provider selected and credentials present
    Ready,
    /// Provider is configured but API key is missing
    MissingKey,
}

impl AIConfigStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Ready => "ready",
            Self::MissingKey => "missing_key",
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready)
    }
}

impl ResolvedAIConfig {
    /// Resolve the effective AI configuration from settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::resolve(&settings.ai, settings.routing, get_api_key)
    }

    fn resolve(ai: &AISettings, routing: RoutingSettings, lookup_key: impl Fn(&str) -> KeyLookup) -> Self {
        let provider = ai.provider;

        if !provider.is_enabled() {
            return Self {
                provider,
                model: String::new(),
                endpoint: None,
                timeout_secs: ai.timeout_secs,
                api_key: None,
                key_source: KeySource::None,
                routing,
                status: AIConfigStatus::Disabled,
                blocking_reason: Some("AI provider is set to \"none\"".to_string()),
            };
        }

        let model = ai.effective_model().to_string();
        let endpoint = match provider {
            AIProvider::Local => Some(ai.effective_endpoint().to_string()),
            _ => ai.endpoint.clone(),
        };

        let (api_key, key_source, status, blocking_reason) = if provider.needs_api_key() {
            let lookup = lookup_key(provider.name());
            match lookup.key {
                Some(key) => (Some(key), lookup.source, AIConfigStatus::Ready, None),
                None => (
                    None,
                    KeySource::None,
                    AIConfigStatus::MissingKey,
                    Some(format!(
                        "No API key found. Set via keychain, {} or {}",
                        env_var_name(provider.name()),
                        LEGACY_KEY_VAR
                    )),
                ),
            }
        } else {
            // Local provider doesn't need a key
            (None, KeySource::None, AIConfigStatus::Ready, None)
        };

        Self {
            provider,
            model,
            endpoint,
            timeout_secs: ai.timeout_secs,
            api_key,
            key_source,
            routing,
            status,
            blocking_reason,
        }
    }

    /// Load settings and resolve in one call
    pub fn load() -> Self {
        Self::from_settings(&Settings::load())
    }

    /// Provider display name
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Check credentials without a network call.
    pub fn validate_config(&self) -> ValidationResult {
        match self.status {
            AIConfigStatus::Disabled => ValidationResult::Skipped("AI is disabled".to_string()),
            AIConfigStatus::MissingKey => {
                ValidationResult::Invalid("No API key configured".to_string())
            }
            AIConfigStatus::Ready => match self.provider {
                AIProvider::Local => ValidationResult::Valid(format!(
                    "Local endpoint {}",
                    self.endpoint.as_deref().unwrap_or_default()
                )),
                _ => ValidationResult::Valid(format!(
                    "API key present ({})",
                    self.key_source.as_str()
                )),
            },
        }
    }
}

// ============================================================================
// Configuration Validation
// ============================================================================

/// Result of configuration validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid(String),
    Invalid(String),
    /// Validation was skipped (AI disabled)
    Skipped(String),
}

impl ValidationResult {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Valid(msg) | Self::Invalid(msg) | Self::Skipped(msg) => msg,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

// ============================================================================
// Diagnostics (for CLI doctor)
// ============================================================================

/// Diagnostic information about AI configuration
#[derive(Debug)]
pub struct AIDiagnostics {
    pub provider: String,
    pub model: String,
    pub status: AIConfigStatus,
    pub key_present: bool,
    pub key_source: KeySource,
    pub keychain_available: bool,
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    pub routing: RoutingSettings,
    pub blocking_reason: Option<String>,
}

impl AIDiagnostics {
    pub fn from_resolved(config: &ResolvedAIConfig) -> Self {
        Self {
            provider: config.provider.name().to_string(),
            model: config.model.clone(),
            status: config.status,
            key_present: config.api_key.is_some(),
            key_source: config.key_source,
            keychain_available: keychain_available(),
            endpoint: config.endpoint.clone(),
            timeout_secs: config.timeout_secs,
            routing: config.routing,
            blocking_reason: config.blocking_reason.clone(),
        }
    }
}

impl std::fmt::Display for AIDiagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "AI Configuration")?;
        writeln!(f, "──────────────────────────────")?;
        writeln!(f, "Provider:          {}", self.provider)?;
        writeln!(f, "Status:            {}", self.status.as_str())?;
        writeln!(f, "Model:             {}", self.model)?;
        writeln!(f, "Key present:       {}", if self.key_present { "yes" } else { "no" })?;
        writeln!(f, "Key source:        {}", self.key_source.as_str())?;
        writeln!(f, "Keychain available:{}", if self.keychain_available { "yes" } else { "no" })?;
        if let Some(endpoint) = &self.endpoint {
            writeln!(f, "Endpoint:          {}", endpoint)?;
        }
        writeln!(f, "Timeout:           {}s", self.timeout_secs)?;
        writeln!(f, "Routing:")?;
        writeln!(
            f,
            "  Visualization:   {} tokens @ {}",
            self.routing.visualization.max_tokens, self.routing.visualization.temperature
        )?;
        writeln!(
            f,
            "  General:         {} tokens @ {}",
            self.routing.general.max_tokens, self.routing.general.temperature
        )?;
        if let Some(reason) = &self.blocking_reason {
            writeln!(f, "Blocking reason:   {}", reason)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_key(_: &str) -> KeyLookup {
        KeyLookup { key: None, source: KeySource::None }
    }

    fn env_key(_: &str) -> KeyLookup {
        KeyLookup { key: Some("sk-test".to_string()), source: KeySource::Environment }
    }

    fn ai(provider: AIProvider) -> AISettings {
        AISettings { provider, ..AISettings::default() }
    }

    #[test]
    fn test_env_var_name() {
        assert_eq!(env_var_name("openai"), "STUDYBUDDY_OPENAI_KEY");
        assert_eq!(env_var_name("anthropic"), "STUDYBUDDY_ANTHROPIC_KEY");
        assert_eq!(env_var_name("OpenAI"), "STUDYBUDDY_OPENAI_KEY");
    }

    #[test]
    fn test_keychain_account() {
        assert_eq!(keychain_account("openai"), "ai/openai");
        assert_eq!(keychain_account("Anthropic"), "ai/anthropic");
    }

    #[test]
    fn test_key_lookup_from_env() {
        env::set_var("STUDYBUDDY_TESTPROVIDER_KEY", "test-key-123");

        let lookup = get_api_key("testprovider");
        assert_eq!(lookup.source, KeySource::Environment);
        assert_eq!(lookup.key, Some("test-key-123".to_string()));

        env::remove_var("STUDYBUDDY_TESTPROVIDER_KEY");
    }

    #[test]
    fn test_resolve_disabled() {
        let cfg = ResolvedAIConfig::resolve(&ai(AIProvider::None), RoutingSettings::default(), env_key);
        assert_eq!(cfg.status, AIConfigStatus::Disabled);
        assert!(cfg.api_key.is_none());
        assert!(!cfg.validate_config().is_valid());
    }

    #[test]
    fn test_resolve_missing_key() {
        let cfg = ResolvedAIConfig::resolve(&ai(AIProvider::Anthropic), RoutingSettings::default(), no_key);
        assert_eq!(cfg.status, AIConfigStatus::MissingKey);
        let reason = cfg.blocking_reason.unwrap();
        assert!(reason.contains("STUDYBUDDY_ANTHROPIC_KEY"));
        assert!(reason.contains("APIKEY"));
    }

    #[test]
    fn test_resolve_ready_with_key() {
        let cfg = ResolvedAIConfig::resolve(&ai(AIProvider::OpenAI), RoutingSettings::default(), env_key);
        assert!(cfg.status.is_ready());
        assert_eq!(cfg.model, "gpt-4o");
        assert_eq!(cfg.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.validate_config(), ValidationResult::Valid("API key present (environment)".into()));
    }

    #[test]
    fn test_resolve_local_needs_no_key() {
        let cfg = ResolvedAIConfig::resolve(&ai(AIProvider::Local), RoutingSettings::default(), no_key);
        assert!(cfg.status.is_ready());
        assert_eq!(cfg.endpoint.as_deref(), Some("http://localhost:11434"));
    }

    #[test]
    fn test_diagnostics_display() {
        let cfg = ResolvedAIConfig::resolve(&ai(AIProvider::Anthropic), RoutingSettings::default(), no_key);
        let text = AIDiagnostics::from_resolved(&cfg).to_string();
        assert!(text.starts_with("AI Configuration"));
        assert!(text.contains("Status:            missing_key"));
        assert!(text.contains("2000 tokens @ 0.7"));
    }
}
