//! CLI route: single route table and run context. Dispatches to the generation
//! service and the output formatters.

use crate::agent::{check_models, ModelAvailability};
use crate::config::{ConfigLoader, SitegenConfig};
use crate::error::{ApiError, StorageError};
use crate::progress::{ChannelObserver, EventKind, ProgressEvent};
use crate::service::{load_result, load_status, GenerationService, StatusSummary};
use crate::store::{GenerationStatus, SledGenerationStore};
use crate::types::{BusinessInfo, GenerationId};
use serde::Serialize;
use std::future::Future;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cli::output::{format_models_text, format_quality_text, format_status_text};
use crate::cli::parse::{Commands, ConfigCommands, ModelsCommands};

/// Runtime context for CLI execution: workspace, config source, and loaded config.
pub struct RunContext {
    workspace_root: PathBuf,
    config_path: Option<PathBuf>,
    config: SitegenConfig,
}

impl RunContext {
    /// Create run context from workspace root and optional config path. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = match config_path {
            Some(ref path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        Ok(Self {
            workspace_root,
            config_path,
            config,
        })
    }

    pub fn config(&self) -> &SitegenConfig {
        &self.config
    }

    /// Execute a command and return its text output.
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Generate {
                name,
                category,
                description,
                audience,
                colors,
                requirements,
                wait,
            } => {
                let mut business = BusinessInfo::new(name, category, description);
                business.target_audience = audience.clone();
                business.preferred_colors = colors.clone();
                business.additional_requirements = requirements.clone();
                self.handle_generate(business, *wait).await
            }
            Commands::Status { id, format } => {
                let store = self.open_store()?;
                let summary = load_status(&store, &GenerationId::from(id.as_str())).await?;
                if format == "json" {
                    to_json(&summary)
                } else {
                    Ok(format_status_text(&summary))
                }
            }
            Commands::Result { id, out } => {
                let store = self.open_store()?;
                let result = load_result(&store, &GenerationId::from(id.as_str())).await?;
                match out {
                    Some(dir) => {
                        write_site(dir, &result.final_website.html_content, &result.final_website.css_content)
                            .await?;
                        let mut text = format!(
                            "Website: {}\nWrote {} and {}",
                            result.final_website.website_url,
                            dir.join("index.html").display(),
                            dir.join("styles.css").display(),
                        );
                        if let Some(report) = &result.quality_report {
                            text.push('\n');
                            text.push_str(&format_quality_text(report));
                        }
                        Ok(text)
                    }
                    None => to_json(&result),
                }
            }
            Commands::Config {
                command: ConfigCommands::Validate,
            } => self.handle_config_validate(),
            Commands::Config {
                command: ConfigCommands::Show,
            } => self.handle_config_show(),
            Commands::Models {
                command: ModelsCommands::Status { format },
            } => {
                let models = check_models(&self.config.models)
                    .await
                    .map_err(|e| ApiError::ConfigError(e.to_string()))?;
                models_status_output(&models, format)
            }
        }
    }

    async fn handle_generate(&self, business: BusinessInfo, stream: bool) -> Result<String, ApiError> {
        let service = GenerationService::from_config(&self.config)?;
        let generation_id = service.start(business).await?;
        info!(generation_id = %generation_id, stream, "Generation started from CLI");

        let summary = host_until_finished(&service, &generation_id, stream, interrupted()).await?;

        let mut text = format_status_text(&summary);
        if summary.status == GenerationStatus::Completed {
            let result = service.result(&generation_id).await?;
            text.push_str(&format!("\nWebsite: {}", result.final_website.website_url));
            if let Some(report) = &result.quality_report {
                text.push('\n');
                text.push_str(&format_quality_text(report));
            }
        }
        Ok(text)
    }

    fn handle_config_validate(&self) -> Result<String, ApiError> {
        let source = match &self.config_path {
            Some(path) => format!("file {}", path.display()),
            None => format!("workspace {}", self.workspace_root.display()),
        };
        match self.config.validate() {
            Ok(()) => Ok(format!("Configuration is valid ({})", source)),
            Err(errors) => {
                let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
                Err(ApiError::ConfigError(format!(
                    "{} problem(s) in {}:\n  - {}",
                    details.len(),
                    source,
                    details.join("\n  - ")
                )))
            }
        }
    }

    /// Effective configuration with the image access key masked.
    fn handle_config_show(&self) -> Result<String, ApiError> {
        let mut shown = self.config.clone();
        if let Some(key) = shown.images.access_key.as_mut() {
            *key = "********".to_string();
        }
        toml::to_string_pretty(&shown).map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    fn open_store(&self) -> Result<SledGenerationStore, ApiError> {
        Ok(SledGenerationStore::open(&self.config.storage.database_path)?)
    }
}

/// Render the model report; fails when any configured model is not available.
fn models_status_output(models: &[ModelAvailability], format: &str) -> Result<String, ApiError> {
    let text = if format == "json" {
        to_json(&models)?
    } else {
        format_models_text(models)
    };
    let unavailable = models
        .iter()
        .filter(|m| !m.availability.is_available())
        .count();
    if unavailable == 0 {
        Ok(text)
    } else {
        Err(ApiError::ConfigError(format!(
            "{} of {} models unavailable\n{}",
            unavailable,
            models.len(),
            text
        )))
    }
}

/// Resolves on Ctrl-C. Never resolves where the signal cannot be installed.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Keep the run alive until it is terminal. When `interrupt` fires first the
/// run is cancelled, and the cancelled record is still written before returning.
async fn host_until_finished<I>(
    service: &GenerationService,
    generation_id: &GenerationId,
    stream: bool,
    interrupt: I,
) -> Result<StatusSummary, ApiError>
where
    I: Future<Output = ()>,
{
    let finished = async {
        if stream {
            stream_until_finished(service, generation_id).await
        } else {
            service.wait(generation_id).await
        }
    };
    tokio::pin!(finished);

    tokio::select! {
        summary = &mut finished => return summary,
        _ = interrupt => {}
    }

    warn!(generation_id = %generation_id, "Interrupted, cancelling generation");
    service.cancel(generation_id);
    finished.await
}

/// Print every event for `generation_id` as a JSON line until the run finishes.
async fn stream_until_finished(
    service: &GenerationService,
    generation_id: &GenerationId,
) -> Result<StatusSummary, ApiError> {
    let (observer, mut events) = ChannelObserver::pair();
    let subscription = service.subscribe(generation_id, Arc::new(observer)).await?;

    let finished = service.wait(generation_id);
    tokio::pin!(finished);
    let finished_first = loop {
        tokio::select! {
            Some(event) = events.recv() => {
                print_event(&event)?;
                if event.kind == EventKind::GenerationComplete {
                    break None;
                }
            }
            summary = &mut finished => break Some(summary),
        }
    };
    let summary = match finished_first {
        Some(summary) => {
            while let Ok(event) = events.try_recv() {
                print_event(&event)?;
            }
            summary?
        }
        None => finished.await?,
    };

    service.unsubscribe(generation_id, subscription);
    Ok(summary)
}

fn print_event(event: &ProgressEvent) -> Result<(), ApiError> {
    let line = serde_json::to_string(event).map_err(|e| StorageError::DataError(e.to_string()))?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", line).map_err(StorageError::IoError)?;
    stdout.flush().map_err(StorageError::IoError)?;
    Ok(())
}

async fn write_site(dir: &Path, html: &str, css: &str) -> Result<(), ApiError> {
    tokio::fs::create_dir_all(dir).await.map_err(StorageError::IoError)?;
    tokio::fs::write(dir.join("index.html"), html)
        .await
        .map_err(StorageError::IoError)?;
    tokio::fs::write(dir.join("styles.css"), css)
        .await
        .map_err(StorageError::IoError)?;
    debug!(dir = %dir.display(), "Site exported");
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::StorageError(StorageError::DataError(e.to_string())))
}
