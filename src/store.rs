//! Generation records and the storage contract.
//!
//! A [`GenerationRecord`] mirrors [`GenerationState`] plus lifecycle
//! timestamps and a status string. Records are written at creation and at
//! each terminal transition; intermediate writes are best-effort.

pub mod memory;
pub mod persistence;

pub use memory::InMemoryGenerationStore;
pub use persistence::SledGenerationStore;

use crate::error::StorageError;
use crate::progress::ProgressSnapshot;
use crate::types::{now_rfc3339, AgentOutput, BusinessInfo, GenerationId};
use crate::workflow::assembly::FinalWebsite;
use crate::workflow::quality::QualityReport;
use crate::workflow::state::{GenerationState, Phase, RestoredState};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Started,
    Completed,
    Failed,
    Cancelled,
}

impl GenerationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            GenerationStatus::Started => "started",
            GenerationStatus::Completed => "completed",
            GenerationStatus::Failed => "failed",
            GenerationStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(self) -> bool {
        !matches!(self, GenerationStatus::Started)
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRecord {
    pub generation_id: GenerationId,
    pub business_info: BusinessInfo,
    pub status: GenerationStatus,
    pub phase: Phase,
    pub current_step: String,
    pub progress: u8,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_data: Option<AgentOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub design_data: Option<AgentOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure_data: Option<AgentOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images_data: Option<AgentOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_report: Option<QualityReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_website: Option<FinalWebsite>,
    pub created_at: String,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<String>,
}

impl GenerationRecord {
    /// Snapshot written when a generation is accepted.
    pub fn started(state: &GenerationState) -> Self {
        let now = now_rfc3339();
        let mut record = Self {
            generation_id: state.generation_id().clone(),
            business_info: state.business_info().clone(),
            status: GenerationStatus::Started,
            phase: state.phase(),
            current_step: String::new(),
            progress: 0,
            errors: Vec::new(),
            content_data: None,
            design_data: None,
            structure_data: None,
            images_data: None,
            quality_report: None,
            final_website: None,
            created_at: now.clone(),
            updated_at: now,
            completed_at: None,
            failed_at: None,
        };
        RecordUpdate::snapshot(state).apply(&mut record);
        record
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            progress: self.progress,
            step: self.current_step.clone(),
        }
    }

    /// Rebuild the pipeline state this record mirrors.
    pub fn to_state(&self) -> GenerationState {
        GenerationState::restore(RestoredState {
            generation_id: self.generation_id.clone(),
            business_info: self.business_info.clone(),
            phase: self.phase,
            content_data: self.content_data.clone(),
            design_data: self.design_data.clone(),
            structure_data: self.structure_data.clone(),
            images_data: self.images_data.clone(),
            quality_report: self.quality_report.clone(),
            current_step: self.current_step.clone(),
            progress: self.progress,
            errors: self.errors.clone(),
            final_website: self.final_website.clone(),
        })
    }
}

/// Partial update. `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordUpdate {
    pub status: Option<GenerationStatus>,
    pub phase: Option<Phase>,
    pub current_step: Option<String>,
    pub progress: Option<u8>,
    pub errors: Option<Vec<String>>,
    pub content_data: Option<AgentOutput>,
    pub design_data: Option<AgentOutput>,
    pub structure_data: Option<AgentOutput>,
    pub images_data: Option<AgentOutput>,
    pub quality_report: Option<QualityReport>,
    pub final_website: Option<FinalWebsite>,
}

impl RecordUpdate {
    /// Every field of `state`, including its status.
    pub fn snapshot(state: &GenerationState) -> Self {
        Self {
            status: Some(state.status()),
            phase: Some(state.phase()),
            current_step: Some(state.current_step().to_string()),
            progress: Some(state.progress()),
            errors: Some(state.errors().to_vec()),
            content_data: state.content_data().cloned(),
            design_data: state.design_data().cloned(),
            structure_data: state.structure_data().cloned(),
            images_data: state.images_data().cloned(),
            quality_report: state.quality_report().cloned(),
            final_website: state.final_website().cloned(),
        }
    }

    pub fn apply(self, record: &mut GenerationRecord) {
        let now = now_rfc3339();
        if let Some(status) = self.status {
            if status != record.status {
                match status {
                    GenerationStatus::Completed => record.completed_at = Some(now.clone()),
                    GenerationStatus::Failed | GenerationStatus::Cancelled => {
                        record.failed_at = Some(now.clone())
                    }
                    GenerationStatus::Started => {}
                }
            }
            record.status = status;
        }
        if let Some(phase) = self.phase {
            record.phase = phase;
        }
        if let Some(step) = self.current_step {
            record.current_step = step;
        }
        if let Some(progress) = self.progress {
            record.progress = progress;
        }
        if let Some(errors) = self.errors {
            record.errors = errors;
        }
        if self.content_data.is_some() {
            record.content_data = self.content_data;
        }
        if self.design_data.is_some() {
            record.design_data = self.design_data;
        }
        if self.structure_data.is_some() {
            record.structure_data = self.structure_data;
        }
        if self.images_data.is_some() {
            record.images_data = self.images_data;
        }
        if self.quality_report.is_some() {
            record.quality_report = self.quality_report;
        }
        if self.final_website.is_some() {
            record.final_website = self.final_website;
        }
        record.updated_at = now;
    }
}

/// Durable storage for generation records.
///
/// Safe to share across unrelated generations. Writes for one generation
/// come from a single run; readers may observe a pre-completion snapshot.
#[async_trait]
pub trait GenerationStore: Send + Sync {
    /// Insert a new record. Fails with `AlreadyExists` for a known id.
    async fn create(&self, record: &GenerationRecord) -> Result<(), StorageError>;

    /// Apply `update` and return the resulting record.
    async fn update(
        &self,
        generation_id: &GenerationId,
        update: RecordUpdate,
    ) -> Result<GenerationRecord, StorageError>;

    async fn get(&self, generation_id: &GenerationId) -> Result<Option<GenerationRecord>, StorageError>;
}
