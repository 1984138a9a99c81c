//! Integration tests for the sitegen generation pipeline

mod config_loading;
mod pipeline_failures;
mod progress_stream;
mod service_results;
mod store_roundtrip;
mod test_utils;

pub use test_utils::*;
