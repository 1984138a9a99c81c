//! Stage state machine for one generation run.
//!
//! Content runs first; design, structure, and images then run concurrently
//! with the content output as upstream input. Validation is advisory. Assembly
//! renders and writes the site. Every agent call goes through its own
//! [`RetryExecutor`]; the whole run is bounded by an outer budget and a
//! cancellation signal.

use crate::agent::AgentSet;
use crate::concurrency::CancellationSignal;
use crate::config::PipelineConfig;
use crate::error::{GenerationError, RetryError, ScoringError};
use crate::progress::{ProgressEvent, ProgressSink};
use crate::retry::{RetryExecutor, RetryPolicy};
use crate::store::{GenerationStore, RecordUpdate};
use crate::types::{AgentKind, AgentOutput, BusinessInfo};
use crate::workflow::assembly::{assemble, ArtifactWriter};
use crate::workflow::quality::{QualityInputs, QualityReport, QualityScorer};
use crate::workflow::state::{GenerationState, Phase};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Retry budgets per agent and the wall-clock budget of a whole run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelinePolicies {
    pub content: RetryPolicy,
    pub design: RetryPolicy,
    pub structure: RetryPolicy,
    pub images: RetryPolicy,
    pub run_budget: Duration,
}

impl PipelinePolicies {
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            content: config.retry_policy(AgentKind::Content),
            design: config.retry_policy(AgentKind::Design),
            structure: config.retry_policy(AgentKind::Structure),
            images: config.retry_policy(AgentKind::Image),
            run_budget: config.run_timeout(),
        }
    }

    pub fn policy(&self, kind: AgentKind) -> RetryPolicy {
        match kind {
            AgentKind::Content => self.content,
            AgentKind::Design => self.design,
            AgentKind::Structure => self.structure,
            AgentKind::Image => self.images,
        }
    }
}

impl Default for PipelinePolicies {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

pub struct WorkflowOrchestrator {
    agents: AgentSet,
    sink: Arc<dyn ProgressSink>,
    store: Arc<dyn GenerationStore>,
    scorer: Arc<dyn QualityScorer>,
    writer: ArtifactWriter,
    policies: PipelinePolicies,
}

impl WorkflowOrchestrator {
    pub fn new(
        agents: AgentSet,
        sink: Arc<dyn ProgressSink>,
        store: Arc<dyn GenerationStore>,
        scorer: Arc<dyn QualityScorer>,
        writer: ArtifactWriter,
        policies: PipelinePolicies,
    ) -> Self {
        Self {
            agents,
            sink,
            store,
            scorer,
            writer,
            policies,
        }
    }

    pub fn policies(&self) -> &PipelinePolicies {
        &self.policies
    }

    /// Drive `state` to a terminal phase and return it.
    ///
    /// Never fails: every failure is recorded in the state's errors and the
    /// terminal snapshot is written to the store before returning.
    pub async fn run(&self, mut state: GenerationState, cancel: CancellationSignal) -> GenerationState {
        let generation_id = state.generation_id().clone();
        let budget = self.policies.run_budget;
        info!(generation_id = %generation_id, budget_secs = budget.as_secs(), "Generation started");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(GenerationError::Cancelled),
            result = tokio::time::timeout(budget, self.drive(&mut state, &cancel)) => {
                result.unwrap_or(Err(GenerationError::TimeoutExceeded(budget)))
            }
        };

        if let Err(err) = outcome {
            self.sink.publish(
                &generation_id,
                ProgressEvent::error(&generation_id, state.current_step(), err.to_string()),
            );
            match err {
                GenerationError::Cancelled => {
                    warn!(generation_id = %generation_id, step = state.current_step(), "Generation cancelled");
                    state.cancel();
                }
                other => {
                    error!(generation_id = %generation_id, step = state.current_step(), error = %other, "Generation failed");
                    state.fail(&other);
                }
            }
        }

        if let Err(err) = self
            .store
            .update(&generation_id, RecordUpdate::snapshot(&state))
            .await
        {
            error!(generation_id = %generation_id, error = %err, "Failed to persist terminal snapshot");
        }

        info!(
            generation_id = %generation_id,
            status = %state.status(),
            errors = state.errors().len(),
            "Generation finished"
        );
        state
    }

    async fn drive(
        &self,
        state: &mut GenerationState,
        cancel: &CancellationSignal,
    ) -> Result<(), GenerationError> {
        let business = state.business_info().clone();

        self.begin(state, Phase::ContentGenerating).await?;
        let content = self.call(AgentKind::Content, &business, None, cancel).await?;
        state.store_output(AgentKind::Content, content)?;

        self.begin(state, Phase::ParallelGenerating).await?;
        let (design, structure, images) = {
            let upstream = state.content_data();
            futures::try_join!(
                self.call(AgentKind::Design, &business, upstream, cancel),
                self.call(AgentKind::Structure, &business, upstream, cancel),
                self.call(AgentKind::Image, &business, upstream, cancel),
            )?
        };
        state.store_output(AgentKind::Design, design)?;
        state.store_output(AgentKind::Structure, structure)?;
        state.store_output(AgentKind::Image, images)?;

        self.begin(state, Phase::Validating).await?;
        let report = match self.score(state) {
            Ok(report) => report,
            Err(err) => {
                let failure = GenerationError::Validation(err.to_string());
                warn!(generation_id = %state.generation_id(), error = %err, "Quality validation failed, continuing");
                self.sink.publish(
                    state.generation_id(),
                    ProgressEvent::error(state.generation_id(), state.current_step(), failure.to_string()),
                );
                state.record_error(failure.to_string());
                QualityReport::failed(&err)
            }
        };
        let quality_score = report.overall_score;
        state.set_quality_report(report);

        self.begin(state, Phase::Assembling).await?;
        let website = {
            let (content, design, images) = required_outputs(state)?;
            assemble(
                &self.writer,
                state.generation_id(),
                &business,
                content,
                design,
                images,
                quality_score,
            )
            .await?
        };
        state.complete(website)?;

        if state.phase() != Phase::Completed {
            if let Err(err) = self.writer.discard(state.generation_id()).await {
                warn!(generation_id = %state.generation_id(), error = %err, "Could not discard site artifacts");
            }
        } else {
            self.sink.publish(
                state.generation_id(),
                ProgressEvent::progress_update(state.generation_id(), state.progress(), state.current_step()),
            );
        }
        Ok(())
    }

    /// Enter `phase`, publish its starting progress, and write a best-effort checkpoint.
    async fn begin(&self, state: &mut GenerationState, phase: Phase) -> Result<(), GenerationError> {
        state.enter(phase)?;
        let generation_id = state.generation_id();
        debug!(generation_id = %generation_id, step = state.current_step(), progress = state.progress(), "Entering stage");
        self.sink.publish(
            generation_id,
            ProgressEvent::progress_update(generation_id, state.progress(), state.current_step()),
        );
        if let Err(err) = self.store.update(generation_id, RecordUpdate::snapshot(state)).await {
            warn!(generation_id = %generation_id, error = %err, "Failed to checkpoint progress");
        }
        Ok(())
    }

    async fn call(
        &self,
        kind: AgentKind,
        business: &BusinessInfo,
        upstream: Option<&AgentOutput>,
        cancel: &CancellationSignal,
    ) -> Result<AgentOutput, GenerationError> {
        let agent = self.agents.get(kind);
        let executor = RetryExecutor::new(self.policies.policy(kind));
        let label = format!("{} agent", kind.as_str());
        executor
            .execute(&label, cancel, || agent.invoke(business, upstream))
            .await
            .map_err(|err| match err {
                RetryError::Cancelled => GenerationError::Cancelled,
                RetryError::Exhausted(source) => GenerationError::AgentExhausted { stage: kind, source },
            })
    }

    fn score(&self, state: &GenerationState) -> Result<QualityReport, ScoringError> {
        match (
            state.content_data(),
            state.design_data(),
            state.structure_data(),
            state.images_data(),
        ) {
            (Some(content), Some(design), Some(structure), Some(images)) => {
                self.scorer.score(&QualityInputs {
                    content,
                    design,
                    structure,
                    images,
                })
            }
            _ => Err(ScoringError("stage output is missing".to_string())),
        }
    }
}

fn required_outputs(
    state: &GenerationState,
) -> Result<(&AgentOutput, &AgentOutput, &AgentOutput), GenerationError> {
    match (state.content_data(), state.design_data(), state.images_data()) {
        (Some(content), Some(design), Some(images)) => Ok((content, design, images)),
        _ => Err(GenerationError::Assembly(
            "content, design, and image outputs are required".to_string(),
        )),
    }
}
