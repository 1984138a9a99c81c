//! Generation Service
//!
//! Caller-facing surface: start a generation and get its id back immediately,
//! then poll status, fetch results, cancel, or subscribe to live progress.

use crate::agent::AgentSet;
use crate::concurrency::{cancellation_pair, CancellationHandle};
use crate::config::SitegenConfig;
use crate::error::ApiError;
use crate::progress::{ProgressEvent, ProgressHub, ProgressObserver, ProgressSink, SubscriptionId};
use crate::store::{GenerationRecord, GenerationStatus, GenerationStore, SledGenerationStore};
use crate::types::{BusinessInfo, GenerationId};
use crate::workflow::{
    ArtifactWriter, FinalWebsite, GenerationState, PipelinePolicies, QualityReport,
    StandardScorer, WorkflowOrchestrator,
};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Polling view of a generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub generation_id: GenerationId,
    pub status: GenerationStatus,
    pub progress: u8,
    pub current_step: String,
    pub errors: Vec<String>,
    pub completed_at: Option<String>,
    pub failed_at: Option<String>,
}

impl From<&GenerationRecord> for StatusSummary {
    fn from(record: &GenerationRecord) -> Self {
        Self {
            generation_id: record.generation_id.clone(),
            status: record.status,
            progress: record.progress,
            current_step: record.current_step.clone(),
            errors: record.errors.clone(),
            completed_at: record.completed_at.clone(),
            failed_at: record.failed_at.clone(),
        }
    }
}

/// Final artifacts of a completed generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteResult {
    pub final_website: FinalWebsite,
    pub quality_report: Option<QualityReport>,
}

struct LiveRun {
    cancel: CancellationHandle,
    finished: watch::Receiver<bool>,
}

pub struct GenerationService {
    orchestrator: Arc<WorkflowOrchestrator>,
    hub: Arc<ProgressHub>,
    store: Arc<dyn GenerationStore>,
    live: Arc<Mutex<HashMap<GenerationId, LiveRun>>>,
}

impl GenerationService {
    pub fn new(
        agents: AgentSet,
        hub: Arc<ProgressHub>,
        store: Arc<dyn GenerationStore>,
        writer: ArtifactWriter,
        policies: PipelinePolicies,
    ) -> Self {
        let orchestrator = WorkflowOrchestrator::new(
            agents,
            hub.clone(),
            store.clone(),
            Arc::new(StandardScorer),
            writer,
            policies,
        );
        Self {
            orchestrator: Arc::new(orchestrator),
            hub,
            store,
            live: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Wire HTTP agents, the sled store, and the artifact writer from configuration.
    pub fn from_config(config: &SitegenConfig) -> Result<Self, ApiError> {
        let agents = AgentSet::from_config(config)
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let store = SledGenerationStore::open(&config.storage.database_path)?;
        Ok(Self::new(
            agents,
            ProgressHub::shared(),
            Arc::new(store),
            ArtifactWriter::new(&config.storage.output_dir, config.storage.url_prefix.clone()),
            PipelinePolicies::from_config(&config.pipeline),
        ))
    }

    pub fn hub(&self) -> &Arc<ProgressHub> {
        &self.hub
    }

    /// Accept a generation request and run it in the background.
    pub async fn start(&self, business: BusinessInfo) -> Result<GenerationId, ApiError> {
        business.validate().map_err(ApiError::InvalidRequest)?;

        let generation_id = GenerationId::new();
        let state = GenerationState::new(generation_id.clone(), business);
        self.store.create(&GenerationRecord::started(&state)).await?;

        let (cancel, signal) = cancellation_pair();
        let (finished_tx, finished) = watch::channel(false);
        self.live
            .lock()
            .insert(generation_id.clone(), LiveRun { cancel, finished });

        let orchestrator = self.orchestrator.clone();
        let hub = self.hub.clone();
        let live = self.live.clone();
        let id = generation_id.clone();
        tokio::spawn(async move {
            let state = orchestrator.run(state, signal).await;
            let quality_score = state
                .quality_report()
                .map(|report| report.overall_score)
                .unwrap_or(0.0);
            {
                let mut live = live.lock();
                live.remove(&id);
                hub.publish(
                    &id,
                    ProgressEvent::generation_complete(&id, state.status().as_str(), quality_score),
                );
                hub.close(&id);
            }
            finished_tx.send_replace(true);
        });

        info!(generation_id = %generation_id, "Generation accepted");
        Ok(generation_id)
    }

    pub async fn status(&self, generation_id: &GenerationId) -> Result<StatusSummary, ApiError> {
        load_status(self.store.as_ref(), generation_id).await
    }

    /// Final website and quality report. Only a completed generation has one.
    pub async fn result(&self, generation_id: &GenerationId) -> Result<WebsiteResult, ApiError> {
        load_result(self.store.as_ref(), generation_id).await
    }

    /// Fire the cancellation signal of a live run. Returns whether one was live.
    pub fn cancel(&self, generation_id: &GenerationId) -> bool {
        match self.live.lock().get(generation_id) {
            Some(run) => {
                run.cancel.cancel();
                info!(generation_id = %generation_id, "Cancellation requested");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, generation_id: &GenerationId) -> bool {
        self.live.lock().contains_key(generation_id)
    }

    /// Wait for a run to reach a terminal state and return its summary.
    pub async fn wait(&self, generation_id: &GenerationId) -> Result<StatusSummary, ApiError> {
        let finished = self
            .live
            .lock()
            .get(generation_id)
            .map(|run| run.finished.clone());
        if let Some(mut finished) = finished {
            if finished.wait_for(|done| *done).await.is_err() {
                warn!(generation_id = %generation_id, "Run ended without signalling completion");
            }
        }
        self.status(generation_id).await
    }

    /// Register `observer` for live events, caught up to the stored progress.
    ///
    /// A generation that is no longer running only gets the catch-up event
    /// from its terminal record; the observer is not retained.
    pub async fn subscribe(
        &self,
        generation_id: &GenerationId,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<SubscriptionId, ApiError> {
        let record = load_record(self.store.as_ref(), generation_id).await?;
        {
            // Held so the run cannot finish and close the hub between the check and the subscribe.
            let live = self.live.lock();
            if live.contains_key(generation_id) {
                return self.register(generation_id, observer, &record);
            }
        }

        // The terminal snapshot is written before a run leaves the live table.
        let record = load_record(self.store.as_ref(), generation_id).await?;
        let subscription = self.register(generation_id, observer, &record)?;
        self.hub.close(generation_id);
        Ok(subscription)
    }

    fn register(
        &self,
        generation_id: &GenerationId,
        observer: Arc<dyn ProgressObserver>,
        record: &GenerationRecord,
    ) -> Result<SubscriptionId, ApiError> {
        self.hub
            .subscribe(generation_id, observer, Some(record.snapshot()))
            .map_err(|e| ApiError::InvalidRequest(format!("Observer rejected catch-up event: {e}")))
    }

    pub fn unsubscribe(&self, generation_id: &GenerationId, subscription: SubscriptionId) -> bool {
        self.hub.unsubscribe(generation_id, subscription)
    }
}

async fn load_record(
    store: &dyn GenerationStore,
    generation_id: &GenerationId,
) -> Result<GenerationRecord, ApiError> {
    store
        .get(generation_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(generation_id.clone()))
}

/// Status of any stored generation, live or not.
pub async fn load_status(
    store: &dyn GenerationStore,
    generation_id: &GenerationId,
) -> Result<StatusSummary, ApiError> {
    let record = load_record(store, generation_id).await?;
    Ok(StatusSummary::from(&record))
}

/// Result of any stored generation; rejected unless it completed.
pub async fn load_result(
    store: &dyn GenerationStore,
    generation_id: &GenerationId,
) -> Result<WebsiteResult, ApiError> {
    website_result(load_record(store, generation_id).await?)
}

fn website_result(record: GenerationRecord) -> Result<WebsiteResult, ApiError> {
    match record.status {
        GenerationStatus::Completed => match record.final_website {
            Some(final_website) => Ok(WebsiteResult {
                final_website,
                quality_report: record.quality_report,
            }),
            None => Err(ApiError::GenerationFailed {
                errors: vec!["Completed generation has no website".to_string()],
            }),
        },
        GenerationStatus::Failed => Err(ApiError::GenerationFailed {
            errors: record.errors,
        }),
        GenerationStatus::Cancelled => Err(ApiError::Cancelled(record.generation_id)),
        GenerationStatus::Started => Err(ApiError::NotCompleted {
            id: record.generation_id,
            status: record.status.as_str().to_string(),
        }),
    }
}
