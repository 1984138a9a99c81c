//! Configuration System
//!
//! Layered configuration: merge-policy defaults, then the global file, then
//! the workspace file, then `SITEGEN__SECTION__KEY` environment variables.

use crate::logging::LoggingConfig;
use crate::retry::RetryPolicy;
use crate::types::AgentKind;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

mod facade;
mod merge;
mod sources;

pub use facade::ConfigLoader;
pub use sources::global_file::global_config_path;
pub use sources::workspace_file::WORKSPACE_CONFIG_FILE;

/// Root configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SitegenConfig {
    #[serde(default)]
    pub models: ModelsConfig,

    #[serde(default)]
    pub images: ImagesConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model-serving endpoint and per-agent model names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelsConfig {
    pub ollama_base_url: String,
    /// Separate endpoint for the content model, when it runs elsewhere.
    #[serde(default)]
    pub content_base_url: Option<String>,
    pub content_model: String,
    pub design_model: String,
    pub structure_model: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            ollama_base_url: "http://localhost:11434".to_string(),
            content_base_url: None,
            content_model: "llama3.1:70b".to_string(),
            design_model: "codellama:34b".to_string(),
            structure_model: "mistral:7b-instruct".to_string(),
            connect_timeout_secs: 30,
            request_timeout_secs: 300,
        }
    }
}

impl ModelsConfig {
    pub fn model_for(&self, kind: AgentKind) -> Option<&str> {
        match kind {
            AgentKind::Content => Some(&self.content_model),
            AgentKind::Design => Some(&self.design_model),
            AgentKind::Structure => Some(&self.structure_model),
            AgentKind::Image => None,
        }
    }

    pub fn base_url_for(&self, kind: AgentKind) -> &str {
        match (kind, self.content_base_url.as_deref()) {
            (AgentKind::Content, Some(url)) if !url.trim().is_empty() => url,
            _ => &self.ollama_base_url,
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Image search service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagesConfig {
    pub unsplash_base_url: String,
    #[serde(default)]
    pub access_key: Option<String>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            unsplash_base_url: "https://api.unsplash.com".to_string(),
            access_key: None,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

/// Retry budget for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentBudget {
    pub max_attempts: u32,
    pub attempt_timeout_secs: u64,
}

impl AgentBudget {
    pub const fn new(max_attempts: u32, attempt_timeout_secs: u64) -> Self {
        Self {
            max_attempts,
            attempt_timeout_secs,
        }
    }
}

/// Retry budgets and the outer wall-clock budget of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub content: AgentBudget,
    pub design: AgentBudget,
    pub structure: AgentBudget,
    pub images: AgentBudget,
    pub backoff_base_ms: u64,
    pub run_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            content: AgentBudget::new(3, 300),
            design: AgentBudget::new(3, 300),
            structure: AgentBudget::new(3, 300),
            images: AgentBudget::new(3, 60),
            backoff_base_ms: 1000,
            run_timeout_secs: 600,
        }
    }
}

impl PipelineConfig {
    pub fn budget(&self, kind: AgentKind) -> AgentBudget {
        match kind {
            AgentKind::Content => self.content,
            AgentKind::Design => self.design,
            AgentKind::Structure => self.structure,
            AgentKind::Image => self.images,
        }
    }

    pub fn retry_policy(&self, kind: AgentKind) -> RetryPolicy {
        let budget = self.budget(kind);
        RetryPolicy::new(
            budget.max_attempts,
            Duration::from_secs(budget.attempt_timeout_secs),
        )
        .with_backoff_base(Duration::from_millis(self.backoff_base_ms))
    }

    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
}

/// Where records and rendered sites live.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database_path: PathBuf,
    pub output_dir: PathBuf,
    pub url_prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(".sitegen/db"),
            output_dir: PathBuf::from("uploads"),
            url_prefix: "/uploads/websites".to_string(),
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Models(String),
    Images(String),
    Pipeline(String),
    Storage(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::Models(msg) => write!(f, "models: {}", msg),
            ValidationError::Images(msg) => write!(f, "images: {}", msg),
            ValidationError::Pipeline(msg) => write!(f, "pipeline: {}", msg),
            ValidationError::Storage(msg) => write!(f, "storage: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

impl SitegenConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if self.models.ollama_base_url.trim().is_empty() {
            errors.push(ValidationError::Models("ollama_base_url cannot be empty".to_string()));
        }
        for kind in [AgentKind::Content, AgentKind::Design, AgentKind::Structure] {
            if self.models.model_for(kind).is_some_and(|m| m.trim().is_empty()) {
                errors.push(ValidationError::Models(format!("{} model name cannot be empty", kind.as_str())));
            }
        }
        if self.models.request_timeout_secs == 0 {
            errors.push(ValidationError::Models("request_timeout_secs must be positive".to_string()));
        }

        let key_missing = self
            .images
            .access_key
            .as_deref()
            .map(|k| k.trim().is_empty())
            .unwrap_or(true);
        if key_missing {
            errors.push(ValidationError::Images(
                "access_key is required (set SITEGEN__IMAGES__ACCESS_KEY)".to_string(),
            ));
        }

        for kind in [AgentKind::Content, AgentKind::Design, AgentKind::Structure, AgentKind::Image] {
            let budget = self.pipeline.budget(kind);
            if budget.max_attempts == 0 {
                errors.push(ValidationError::Pipeline(format!(
                    "{} max_attempts must be at least 1",
                    kind.as_str()
                )));
            }
            if budget.attempt_timeout_secs == 0 {
                errors.push(ValidationError::Pipeline(format!(
                    "{} attempt_timeout_secs must be positive",
                    kind.as_str()
                )));
            }
        }
        if self.pipeline.run_timeout_secs == 0 {
            errors.push(ValidationError::Pipeline("run_timeout_secs must be positive".to_string()));
        }

        if self.storage.database_path.as_os_str().is_empty() {
            errors.push(ValidationError::Storage("database_path cannot be empty".to_string()));
        }
        if self.storage.output_dir.as_os_str().is_empty() {
            errors.push(ValidationError::Storage("output_dir cannot be empty".to_string()));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> SitegenConfig {
        let mut config = SitegenConfig::default();
        config.images.access_key = Some("key".to_string());
        config
    }

    #[test]
    fn test_default_config() {
        let config = SitegenConfig::default();
        assert_eq!(config.models.content_model, "llama3.1:70b");
        assert_eq!(config.pipeline.images, AgentBudget::new(3, 60));
        assert_eq!(config.pipeline.run_timeout(), Duration::from_secs(600));
        assert_eq!(config.storage.url_prefix, "/uploads/websites");
    }

    #[test]
    fn test_missing_access_key_is_reported() {
        let errors = SitegenConfig::default().validate().unwrap_err();
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::Images(_))));
        assert!(valid().validate().is_ok());
    }

    #[test]
    fn test_zero_budgets_and_empty_models_are_reported() {
        let mut config = valid();
        config.models.design_model = " ".to_string();
        config.pipeline.images.max_attempts = 0;
        config.pipeline.run_timeout_secs = 0;
        let errors = config.validate().unwrap_err();
        let messages: Vec<String> = errors.iter().map(ToString::to_string).collect();
        assert_eq!(
            messages,
            vec![
                "models: design model name cannot be empty".to_string(),
                "pipeline: image max_attempts must be at least 1".to_string(),
                "pipeline: run_timeout_secs must be positive".to_string(),
            ]
        );
    }

    #[test]
    fn test_retry_policy_from_budget() {
        let mut pipeline = PipelineConfig::default();
        pipeline.backoff_base_ms = 250;
        let policy = pipeline.retry_policy(AgentKind::Image);
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.attempt_timeout, Duration::from_secs(60));
        assert_eq!(policy.backoff_base, Duration::from_millis(250));
    }

    #[test]
    fn test_content_base_url_override() {
        let mut models = ModelsConfig::default();
        assert_eq!(models.base_url_for(AgentKind::Content), "http://localhost:11434");
        models.content_base_url = Some("http://big-gpu:11434".to_string());
        assert_eq!(models.base_url_for(AgentKind::Content), "http://big-gpu:11434");
        assert_eq!(models.base_url_for(AgentKind::Design), "http://localhost:11434");
    }
}
