//! Config facade: single entry point for loading layered configuration.

use super::merge::merge_policy;
use super::sources::{environment, global_file, workspace_file};
use super::SitegenConfig;
use config::{Config, ConfigError, Environment, File};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Loads [`SitegenConfig`] from defaults, files, and the environment.
#[derive(Debug, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace.
    ///
    /// Precedence (lowest to highest): defaults, global file, `sitegen.toml`
    /// in the workspace, `SITEGEN__*` environment variables. Relative storage
    /// paths are resolved against `workspace_root`.
    pub fn load(workspace_root: &Path) -> Result<SitegenConfig, ConfigError> {
        Self::load_with_env(workspace_root, environment::source())
    }

    /// Load a single file over the defaults. No environment or global layers.
    pub fn load_from_file(path: &Path) -> Result<SitegenConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        merge_policy::builder_with_defaults()?
            .add_source(File::from(path.to_path_buf()))
            .build()?
            .try_deserialize()
    }

    /// Global config file location, if one can be determined.
    pub fn global_config_path() -> Option<PathBuf> {
        global_file::global_config_path()
    }

    pub(crate) fn load_with_env(
        workspace_root: &Path,
        env: Environment,
    ) -> Result<SitegenConfig, ConfigError> {
        let builder = merge_policy::builder_with_defaults()?;
        let builder = global_file::add_to_builder(builder)?;
        let builder = workspace_file::add_to_builder(builder, workspace_root)?;
        let settings: Config = environment::add_to_builder(builder, env).build()?;

        let mut config: SitegenConfig = settings.try_deserialize()?;
        resolve_paths(&mut config, workspace_root);
        debug!(
            workspace = %workspace_root.display(),
            database = %config.storage.database_path.display(),
            "Configuration loaded"
        );
        Ok(config)
    }
}

fn resolve_paths(config: &mut SitegenConfig, workspace_root: &Path) {
    let storage = &mut config.storage;
    for path in [&mut storage.database_path, &mut storage.output_dir] {
        if path.is_relative() {
            *path = workspace_root.join(&*path);
        }
    }
    if config.logging.file.is_relative() {
        config.logging.file = workspace_root.join(&config.logging.file);
    }
}
