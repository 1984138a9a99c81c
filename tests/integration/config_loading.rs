//! Layered configuration as the CLI loads it.

use sitegen::config::{ConfigLoader, SitegenConfig, ValidationError, WORKSPACE_CONFIG_FILE};
use sitegen::types::AgentKind;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;

use crate::integration::with_xdg_env;

#[test]
fn defaults_apply_without_any_files() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    let config = with_xdg_env(&test_dir, || ConfigLoader::load(workspace.path()).unwrap());

    let defaults = SitegenConfig::default();
    assert_eq!(config.models, defaults.models);
    assert_eq!(config.pipeline, defaults.pipeline);
    assert_eq!(config.storage.output_dir, workspace.path().join("uploads"));
    assert_eq!(config.pipeline.budget(AgentKind::Image).max_attempts, 3);
    assert_eq!(config.pipeline.run_timeout(), Duration::from_secs(600));

    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 1);
    assert!(matches!(&errors[0], ValidationError::Images(msg) if msg.contains("access_key")));
}

#[test]
fn workspace_file_overrides_global_file() {
    let test_dir = TempDir::new().unwrap();
    let global_dir = test_dir.path().join("sitegen");
    std::fs::create_dir_all(&global_dir).unwrap();
    std::fs::write(
        global_dir.join("config.toml"),
        r#"
[images]
access_key = "global-key"

[pipeline]
backoff_base_ms = 250

[storage]
output_dir = "global-out"
"#,
    )
    .unwrap();

    let workspace = TempDir::new().unwrap();
    std::fs::write(
        workspace.path().join(WORKSPACE_CONFIG_FILE),
        r#"
[pipeline.content]
max_attempts = 5
attempt_timeout_secs = 120

[storage]
output_dir = "site-out"
"#,
    )
    .unwrap();

    let config = with_xdg_env(&test_dir, || ConfigLoader::load(workspace.path()).unwrap());

    assert_eq!(config.images.access_key.as_deref(), Some("global-key"));
    assert_eq!(config.pipeline.backoff_base_ms, 250);
    assert_eq!(config.pipeline.content.max_attempts, 5);
    assert_eq!(config.pipeline.design.max_attempts, 3);
    assert_eq!(config.storage.output_dir, workspace.path().join("site-out"));
    assert!(config.validate().is_ok());

    let policy = config.pipeline.retry_policy(AgentKind::Content);
    assert_eq!(policy.max_attempts, 5);
    assert_eq!(policy.attempt_timeout, Duration::from_secs(120));
    assert_eq!(policy.backoff_base, Duration::from_millis(250));
}

#[test]
fn invalid_budgets_are_all_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(
        &path,
        r#"
[images]
access_key = "k"

[pipeline.design]
max_attempts = 0
attempt_timeout_secs = 0
"#,
    )
    .unwrap();

    let config = ConfigLoader::load_from_file(&path).unwrap();
    assert_eq!(config.storage.database_path, PathBuf::from(".sitegen/db"));
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| matches!(e, ValidationError::Pipeline(_))));
}

#[test]
fn malformed_workspace_file_is_an_error() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    std::fs::write(
        workspace.path().join(WORKSPACE_CONFIG_FILE),
        "[pipeline.content\nmax_attempts = 5\n",
    )
    .unwrap();

    let result = with_xdg_env(&test_dir, || ConfigLoader::load(workspace.path()));
    assert!(result.is_err());
}
