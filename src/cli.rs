//! CLI domain: parse, route, and output only.
//! No domain orchestration; single route table dispatches to the generation service.

mod output;
mod parse;
mod route;

pub use output::{format_models_text, format_quality_text, format_status_text, map_error};
pub use parse::{Cli, Commands, ConfigCommands, ModelsCommands};
pub use route::RunContext;
