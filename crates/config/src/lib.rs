// Configuration loading

pub mod ai;
pub mod settings;

pub use ai::{AIConfigStatus, AIDiagnostics, KeySource, ResolvedAIConfig, ValidationResult};
pub use settings::{AIProvider, AISettings, GenerationLimits, RoutingSettings, Settings};
