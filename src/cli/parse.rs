//! CLI parse: clap types for sitegen. No behavior; definitions only.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sitegen CLI - multi-agent website generation
#[derive(Parser)]
#[command(name = "sitegen")]
#[command(about = "Generate a static website for a business with content, design, structure, and image agents")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging (default: off)
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output is "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a website and print its id and final status
    Generate {
        /// Business name
        #[arg(long)]
        name: String,
        /// Business category (e.g. plumbing, bakery)
        #[arg(long)]
        category: String,
        /// What the business does
        #[arg(long)]
        description: String,
        /// Target audience
        #[arg(long)]
        audience: Option<String>,
        /// Preferred color (repeatable)
        #[arg(long = "color")]
        colors: Vec<String>,
        /// Additional requirements for the site
        #[arg(long)]
        requirements: Option<String>,
        /// Stream progress events to stdout as JSON lines
        #[arg(long)]
        wait: bool,
    },
    /// Show the status of a generation
    Status {
        /// Generation id
        id: String,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show or export the result of a completed generation
    Result {
        /// Generation id
        id: String,
        /// Directory to write index.html and styles.css into
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Model backend commands
    Models {
        #[command(subcommand)]
        command: ModelsCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Load layered configuration and report problems
    Validate,
    /// Print the effective configuration as TOML
    Show,
}

#[derive(Subcommand)]
pub enum ModelsCommands {
    /// Report whether each configured model is served by its Ollama endpoint
    Status {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}
