//! Generation Agents
//!
//! Each agent turns a business description (plus, for downstream agents, the
//! content agent's output) into a structured [`AgentOutput`]. One `invoke` is
//! one attempt; retries and timeouts are applied by the caller.

pub mod availability;
pub mod image;
pub mod model;
pub mod ollama;
pub mod parse;
pub mod prompts;

use crate::config::SitegenConfig;
use crate::error::AgentError;
use crate::types::{AgentKind, AgentOutput, BusinessInfo};
use async_trait::async_trait;
use std::sync::Arc;

pub use availability::{check_models, Availability, ModelAvailability};
pub use image::{ImageAgent, ImageSearch, UnsplashClient};
pub use model::ModelAgent;
pub use ollama::{OllamaClient, TextGenerator};
pub use parse::ResponseParser;

/// A single generation capability.
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    fn kind(&self) -> AgentKind;

    async fn invoke(
        &self,
        business: &BusinessInfo,
        upstream: Option<&AgentOutput>,
    ) -> Result<AgentOutput, AgentError>;
}

/// The four agents one pipeline run uses.
#[derive(Clone)]
pub struct AgentSet {
    pub content: Arc<dyn AgentInvoker>,
    pub design: Arc<dyn AgentInvoker>,
    pub structure: Arc<dyn AgentInvoker>,
    pub image: Arc<dyn AgentInvoker>,
}

impl AgentSet {
    pub fn new(
        content: Arc<dyn AgentInvoker>,
        design: Arc<dyn AgentInvoker>,
        structure: Arc<dyn AgentInvoker>,
        image: Arc<dyn AgentInvoker>,
    ) -> Self {
        Self {
            content,
            design,
            structure,
            image,
        }
    }

    /// Build HTTP-backed agents from configuration.
    ///
    /// Fails with [`AgentError::NotConfigured`] when a model name or the image
    /// access key is missing.
    pub fn from_config(config: &SitegenConfig) -> Result<Self, AgentError> {
        let models = &config.models;
        let parser = Arc::new(
            ResponseParser::new()
                .map_err(|e| AgentError::NotConfigured(format!("Invalid response pattern: {e}")))?,
        );

        let model_agent = |kind: AgentKind| -> Result<Arc<dyn AgentInvoker>, AgentError> {
            let model = models.model_for(kind).unwrap_or_default();
            let client = OllamaClient::new(
                model,
                Some(models.base_url_for(kind).to_string()),
                models.connect_timeout(),
                models.request_timeout(),
            )?;
            Ok(Arc::new(ModelAgent::new(kind, Arc::new(client), parser.clone())?))
        };

        let images = &config.images;
        let unsplash = UnsplashClient::new(
            Some(images.unsplash_base_url.clone()),
            images.access_key.clone(),
            std::time::Duration::from_secs(images.connect_timeout_secs),
            std::time::Duration::from_secs(images.request_timeout_secs),
        )?;

        Ok(Self {
            content: model_agent(AgentKind::Content)?,
            design: model_agent(AgentKind::Design)?,
            structure: model_agent(AgentKind::Structure)?,
            image: Arc::new(ImageAgent::new(Arc::new(unsplash))),
        })
    }

    pub fn get(&self, kind: AgentKind) -> &Arc<dyn AgentInvoker> {
        match kind {
            AgentKind::Content => &self.content,
            AgentKind::Design => &self.design,
            AgentKind::Structure => &self.structure,
            AgentKind::Image => &self.image,
        }
    }
}
