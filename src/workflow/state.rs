//! The mutable aggregate threaded through one pipeline run.

use crate::error::GenerationError;
use crate::store::GenerationStatus;
use crate::types::{AgentKind, AgentOutput, BusinessInfo, GenerationId};
use crate::workflow::assembly::FinalWebsite;
use crate::workflow::quality::QualityReport;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage. Non-terminal stages advance strictly in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Started,
    ContentGenerating,
    ParallelGenerating,
    Validating,
    Assembling,
    Completed,
    Failed,
    Cancelled,
}

impl Phase {
    /// Human-readable label published as `current_step`.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Started => "Initializing",
            Phase::ContentGenerating => "Content Generation",
            Phase::ParallelGenerating => "Design & Structure Generation",
            Phase::Validating => "Quality Validation",
            Phase::Assembling => "Final Assembly",
            Phase::Completed => "Completed",
            Phase::Failed => "Failed",
            Phase::Cancelled => "Cancelled",
        }
    }

    /// Progress published when the stage starts.
    pub fn progress_target(self) -> Option<u8> {
        match self {
            Phase::Started => Some(0),
            Phase::ContentGenerating => Some(20),
            Phase::ParallelGenerating => Some(60),
            Phase::Validating => Some(80),
            Phase::Assembling => Some(95),
            Phase::Completed => Some(100),
            Phase::Failed | Phase::Cancelled => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Failed | Phase::Cancelled)
    }

    fn successor(self) -> Option<Phase> {
        match self {
            Phase::Started => Some(Phase::ContentGenerating),
            Phase::ContentGenerating => Some(Phase::ParallelGenerating),
            Phase::ParallelGenerating => Some(Phase::Validating),
            Phase::Validating => Some(Phase::Assembling),
            Phase::Assembling => Some(Phase::Completed),
            Phase::Completed | Phase::Failed | Phase::Cancelled => None,
        }
    }

    pub fn can_transition_to(self, next: Phase) -> bool {
        if self.is_terminal() {
            return false;
        }
        matches!(next, Phase::Failed | Phase::Cancelled) || self.successor() == Some(next)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// State of one generation. Owned by exactly one orchestrator run.
///
/// Agent outputs are write-once, `errors` is append-only and `progress`
/// never decreases. Terminal phases accept no further transitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationState {
    generation_id: GenerationId,
    business_info: BusinessInfo,
    phase: Phase,
    content_data: Option<AgentOutput>,
    design_data: Option<AgentOutput>,
    structure_data: Option<AgentOutput>,
    images_data: Option<AgentOutput>,
    quality_report: Option<QualityReport>,
    current_step: String,
    progress: u8,
    errors: Vec<String>,
    final_website: Option<FinalWebsite>,
}

impl GenerationState {
    pub fn new(generation_id: GenerationId, business_info: BusinessInfo) -> Self {
        Self {
            generation_id,
            business_info,
            phase: Phase::Started,
            content_data: None,
            design_data: None,
            structure_data: None,
            images_data: None,
            quality_report: None,
            current_step: Phase::Started.label().to_string(),
            progress: 0,
            errors: Vec::new(),
            final_website: None,
        }
    }

    pub fn generation_id(&self) -> &GenerationId {
        &self.generation_id
    }

    pub fn business_info(&self) -> &BusinessInfo {
        &self.business_info
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    pub fn current_step(&self) -> &str {
        &self.current_step
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn quality_report(&self) -> Option<&QualityReport> {
        self.quality_report.as_ref()
    }

    pub fn final_website(&self) -> Option<&FinalWebsite> {
        self.final_website.as_ref()
    }

    pub fn output(&self, kind: AgentKind) -> Option<&AgentOutput> {
        match kind {
            AgentKind::Content => self.content_data.as_ref(),
            AgentKind::Design => self.design_data.as_ref(),
            AgentKind::Structure => self.structure_data.as_ref(),
            AgentKind::Image => self.images_data.as_ref(),
        }
    }

    pub fn content_data(&self) -> Option<&AgentOutput> {
        self.content_data.as_ref()
    }

    pub fn design_data(&self) -> Option<&AgentOutput> {
        self.design_data.as_ref()
    }

    pub fn structure_data(&self) -> Option<&AgentOutput> {
        self.structure_data.as_ref()
    }

    pub fn images_data(&self) -> Option<&AgentOutput> {
        self.images_data.as_ref()
    }

    /// Terminal status as stored in the generation record.
    pub fn status(&self) -> GenerationStatus {
        match self.phase {
            Phase::Completed => GenerationStatus::Completed,
            Phase::Failed => GenerationStatus::Failed,
            Phase::Cancelled => GenerationStatus::Cancelled,
            _ => GenerationStatus::Started,
        }
    }

    /// Move to the next stage, updating the step label and progress target.
    pub fn enter(&mut self, next: Phase) -> Result<(), GenerationError> {
        if !self.phase.can_transition_to(next) {
            return Err(GenerationError::InvalidTransition {
                from: self.phase.label().to_string(),
                to: next.label().to_string(),
            });
        }
        self.phase = next;
        if let Some(target) = next.progress_target() {
            self.current_step = next.label().to_string();
            self.advance_progress(target);
        }
        Ok(())
    }

    /// Raise progress to `value`; lower values are ignored.
    pub fn advance_progress(&mut self, value: u8) {
        self.progress = self.progress.max(value.min(100));
    }

    pub fn store_output(&mut self, kind: AgentKind, output: AgentOutput) -> Result<(), GenerationError> {
        let slot = match kind {
            AgentKind::Content => &mut self.content_data,
            AgentKind::Design => &mut self.design_data,
            AgentKind::Structure => &mut self.structure_data,
            AgentKind::Image => &mut self.images_data,
        };
        if slot.is_some() {
            return Err(GenerationError::OutputAlreadyWritten(kind));
        }
        *slot = Some(output);
        Ok(())
    }

    pub fn set_quality_report(&mut self, report: QualityReport) {
        self.quality_report = Some(report);
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    /// Terminal success. Refused while errors are recorded.
    pub fn complete(&mut self, website: FinalWebsite) -> Result<(), GenerationError> {
        if !self.errors.is_empty() {
            return self.enter(Phase::Failed);
        }
        self.enter(Phase::Completed)?;
        self.final_website = Some(website);
        Ok(())
    }

    /// Record `error` and move to `Failed`. No-op once terminal.
    pub fn fail(&mut self, error: &GenerationError) {
        if self.is_terminal() {
            return;
        }
        self.record_error(error.to_string());
        self.phase = Phase::Failed;
    }

    /// Record the cancellation and move to `Cancelled`. No-op once terminal.
    pub fn cancel(&mut self) {
        if self.is_terminal() {
            return;
        }
        self.record_error(GenerationError::Cancelled.to_string());
        self.phase = Phase::Cancelled;
    }

    /// Rebuild a state from persisted parts. Used by stores and tests.
    pub(crate) fn restore(parts: RestoredState) -> Self {
        Self {
            generation_id: parts.generation_id,
            business_info: parts.business_info,
            phase: parts.phase,
            content_data: parts.content_data,
            design_data: parts.design_data,
            structure_data: parts.structure_data,
            images_data: parts.images_data,
            quality_report: parts.quality_report,
            current_step: parts.current_step,
            progress: parts.progress,
            errors: parts.errors,
            final_website: parts.final_website,
        }
    }
}

pub(crate) struct RestoredState {
    pub generation_id: GenerationId,
    pub business_info: BusinessInfo,
    pub phase: Phase,
    pub content_data: Option<AgentOutput>,
    pub design_data: Option<AgentOutput>,
    pub structure_data: Option<AgentOutput>,
    pub images_data: Option<AgentOutput>,
    pub quality_report: Option<QualityReport>,
    pub current_step: String,
    pub progress: u8,
    pub errors: Vec<String>,
    pub final_website: Option<FinalWebsite>,
}
