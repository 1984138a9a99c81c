//! Pre-flight check that the configured models are served by their Ollama endpoints.

use crate::agent::ollama::{OllamaClient, TextGenerator};
use crate::config::ModelsConfig;
use crate::error::AgentError;
use crate::types::AgentKind;
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

const MODEL_KINDS: [AgentKind; 3] = [AgentKind::Content, AgentKind::Design, AgentKind::Structure];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum Availability {
    Available,
    Missing,
    /// The endpoint could not be listed.
    Unreachable(String),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

impl fmt::Display for Availability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Availability::Available => f.write_str("available"),
            Availability::Missing => f.write_str("missing"),
            Availability::Unreachable(reason) => write!(f, "unreachable ({})", reason),
        }
    }
}

/// One configured model and whether its endpoint serves it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelAvailability {
    pub kind: AgentKind,
    pub model: String,
    pub endpoint: String,
    pub availability: Availability,
}

/// Whether `served` contains `model`. An untagged name matches its `:latest` tag.
fn is_served(served: &[String], model: &str) -> bool {
    served.iter().any(|name| {
        name == model || (!model.contains(':') && name.strip_suffix(":latest") == Some(model))
    })
}

/// Check `wanted` models against the list one endpoint reports.
pub async fn check_endpoint(
    lister: &dyn TextGenerator,
    endpoint: &str,
    wanted: &[(AgentKind, String)],
) -> Vec<ModelAvailability> {
    let listed = lister.list_models().await;
    match &listed {
        Ok(served) => debug!(endpoint, served = served.len(), "Listed models"),
        Err(err) => warn!(endpoint, error = %err, "Could not list models"),
    }
    wanted
        .iter()
        .map(|(kind, model)| ModelAvailability {
            kind: *kind,
            model: model.clone(),
            endpoint: endpoint.to_string(),
            availability: match &listed {
                Ok(served) if is_served(served, model) => Availability::Available,
                Ok(_) => Availability::Missing,
                Err(err) => Availability::Unreachable(err.to_string()),
            },
        })
        .collect()
}

/// Check every configured model, listing each distinct endpoint once.
pub async fn check_models(models: &ModelsConfig) -> Result<Vec<ModelAvailability>, AgentError> {
    let mut endpoints: Vec<(String, Vec<(AgentKind, String)>)> = Vec::new();
    for kind in MODEL_KINDS {
        let model = models.model_for(kind).unwrap_or_default().to_string();
        let endpoint = models.base_url_for(kind).trim_end_matches('/').to_string();
        match endpoints.iter_mut().find(|(url, _)| *url == endpoint) {
            Some((_, wanted)) => wanted.push((kind, model)),
            None => endpoints.push((endpoint, vec![(kind, model)])),
        }
    }

    let mut report = Vec::new();
    for (endpoint, wanted) in endpoints {
        let first_model = wanted.first().map(|(_, m)| m.clone()).unwrap_or_default();
        // Listing is bounded by the connect timeout, not the generation timeout.
        let client = OllamaClient::new(
            first_model,
            Some(endpoint.clone()),
            models.connect_timeout(),
            models.connect_timeout(),
        )?;
        report.extend(check_endpoint(&client, client.base_url(), &wanted).await);
    }
    report.sort_by_key(|m| MODEL_KINDS.iter().position(|k| *k == m.kind));
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct ScriptedTags(Result<Vec<String>, AgentError>);

    #[async_trait]
    impl TextGenerator for ScriptedTags {
        async fn generate(&self, _prompt: &str) -> Result<String, AgentError> {
            Err(AgentError::RequestFailed("not used".to_string()))
        }

        fn model_name(&self) -> &str {
            "tags"
        }

        async fn list_models(&self) -> Result<Vec<String>, AgentError> {
            self.0.clone()
        }
    }

    fn wanted() -> Vec<(AgentKind, String)> {
        vec![
            (AgentKind::Content, "llama3.1:70b".to_string()),
            (AgentKind::Design, "codellama:34b".to_string()),
            (AgentKind::Structure, "mistral".to_string()),
        ]
    }

    #[tokio::test]
    async fn reports_available_and_missing_models() {
        let lister = ScriptedTags(Ok(vec![
            "llama3.1:70b".to_string(),
            "mistral:latest".to_string(),
            "nomic-embed-text:latest".to_string(),
        ]));
        let report = check_endpoint(&lister, "http://localhost:11434", &wanted()).await;

        let states: Vec<(AgentKind, Availability)> =
            report.iter().map(|m| (m.kind, m.availability.clone())).collect();
        assert_eq!(
            states,
            vec![
                (AgentKind::Content, Availability::Available),
                (AgentKind::Design, Availability::Missing),
                (AgentKind::Structure, Availability::Available),
            ]
        );
        assert!(report.iter().all(|m| m.endpoint == "http://localhost:11434"));
    }

    #[tokio::test]
    async fn unreachable_endpoint_marks_every_model() {
        let lister = ScriptedTags(Err(AgentError::RequestFailed("Connection error: refused".to_string())));
        let report = check_endpoint(&lister, "http://gpu-box:11434", &wanted()).await;
        assert_eq!(report.len(), 3);
        for model in &report {
            assert!(matches!(&model.availability, Availability::Unreachable(r) if r.contains("refused")));
            assert!(!model.availability.is_available());
        }
    }

    #[test]
    fn tagged_names_must_match_exactly() {
        let served = vec!["llama3.1:8b".to_string()];
        assert!(!is_served(&served, "llama3.1:70b"));
        assert!(!is_served(&served, "llama3.1"));
        assert!(is_served(&served, "llama3.1:8b"));
    }

    #[test]
    fn availability_serializes_with_state_tag() {
        let value = serde_json::to_value(Availability::Unreachable("timeout".to_string())).unwrap();
        assert_eq!(value, serde_json::json!({"state": "unreachable", "detail": "timeout"}));
        let value = serde_json::to_value(Availability::Missing).unwrap();
        assert_eq!(value, serde_json::json!({"state": "missing"}));
    }
}
