//! Sitegen: Multi-Agent Website Generation
//!
//! Turns a short business description into a static website by running a
//! content agent, then design, structure, and image agents concurrently, then
//! quality scoring and final assembly. Each agent call is retried with
//! backoff; progress is broadcast to subscribers and every run is persisted.

pub mod agent;
pub mod cli;
pub mod concurrency;
pub mod config;
pub mod error;
pub mod logging;
pub mod progress;
pub mod retry;
pub mod service;
pub mod store;
pub mod types;
pub mod workflow;
