//! Content, design, and structure agents backed by a text generator.

use crate::agent::ollama::TextGenerator;
use crate::agent::parse::ResponseParser;
use crate::agent::prompts;
use crate::agent::AgentInvoker;
use crate::error::AgentError;
use crate::types::{AgentKind, AgentOutput, BusinessInfo};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

pub struct ModelAgent {
    kind: AgentKind,
    generator: Arc<dyn TextGenerator>,
    parser: Arc<ResponseParser>,
}

impl ModelAgent {
    pub fn new(
        kind: AgentKind,
        generator: Arc<dyn TextGenerator>,
        parser: Arc<ResponseParser>,
    ) -> Result<Self, AgentError> {
        if kind == AgentKind::Image {
            return Err(AgentError::NotConfigured(
                "image generation is not model-backed".to_string(),
            ));
        }
        Ok(Self {
            kind,
            generator,
            parser,
        })
    }
}

#[async_trait]
impl AgentInvoker for ModelAgent {
    fn kind(&self) -> AgentKind {
        self.kind
    }

    async fn invoke(
        &self,
        business: &BusinessInfo,
        upstream: Option<&AgentOutput>,
    ) -> Result<AgentOutput, AgentError> {
        let prompt = prompts::build(self.kind, business, upstream);
        let raw = self.generator.generate(&prompt).await?;
        debug!(
            agent = self.kind.as_str(),
            model = self.generator.model_name(),
            response_chars = raw.len(),
            "Model response received"
        );
        self.parser.structure(self.kind, &raw)
    }
}
