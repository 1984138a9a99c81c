//! Merge rules: defaults, override order, conflict handling.
//!
//! Every key a later layer may override gets a default here, so partial files
//! and single environment variables deserialize into a complete config.

use config::Config;
use config::ConfigBuilder;
use config::ConfigError;

/// Create a Config builder with merge policy defaults applied.
pub fn builder_with_defaults() -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError>
{
    Config::builder()
        .set_default("models.ollama_base_url", "http://localhost:11434")?
        .set_default("models.content_model", "llama3.1:70b")?
        .set_default("models.design_model", "codellama:34b")?
        .set_default("models.structure_model", "mistral:7b-instruct")?
        .set_default("models.connect_timeout_secs", 30_i64)?
        .set_default("models.request_timeout_secs", 300_i64)?
        .set_default("images.unsplash_base_url", "https://api.unsplash.com")?
        .set_default("images.connect_timeout_secs", 10_i64)?
        .set_default("images.request_timeout_secs", 30_i64)?
        .set_default("pipeline.content.max_attempts", 3_i64)?
        .set_default("pipeline.content.attempt_timeout_secs", 300_i64)?
        .set_default("pipeline.design.max_attempts", 3_i64)?
        .set_default("pipeline.design.attempt_timeout_secs", 300_i64)?
        .set_default("pipeline.structure.max_attempts", 3_i64)?
        .set_default("pipeline.structure.attempt_timeout_secs", 300_i64)?
        .set_default("pipeline.images.max_attempts", 3_i64)?
        .set_default("pipeline.images.attempt_timeout_secs", 60_i64)?
        .set_default("pipeline.backoff_base_ms", 1000_i64)?
        .set_default("pipeline.run_timeout_secs", 600_i64)?
        .set_default("storage.database_path", ".sitegen/db")?
        .set_default("storage.output_dir", "uploads")?
        .set_default("storage.url_prefix", "/uploads/websites")
}
