//! Event schema for generation progress.

use crate::types::{now_rfc3339, GenerationId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ProgressUpdate,
    Error,
    GenerationComplete,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub generation_id: GenerationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f64>,
    pub timestamp: String,
}

impl ProgressEvent {
    fn base(kind: EventKind, generation_id: &GenerationId) -> Self {
        Self {
            kind,
            generation_id: generation_id.clone(),
            progress: None,
            step: None,
            message: None,
            status: None,
            quality_score: None,
            timestamp: now_rfc3339(),
        }
    }

    pub fn progress_update(generation_id: &GenerationId, progress: u8, step: impl Into<String>) -> Self {
        Self {
            progress: Some(progress.min(100)),
            step: Some(step.into()),
            ..Self::base(EventKind::ProgressUpdate, generation_id)
        }
    }

    pub fn error(
        generation_id: &GenerationId,
        step: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            step: Some(step.into()),
            message: Some(message.into()),
            ..Self::base(EventKind::Error, generation_id)
        }
    }

    pub fn generation_complete(
        generation_id: &GenerationId,
        status: impl Into<String>,
        quality_score: f64,
    ) -> Self {
        Self {
            status: Some(status.into()),
            quality_score: Some(quality_score),
            ..Self::base(EventKind::GenerationComplete, generation_id)
        }
    }
}

/// Point-in-time view of a generation used to catch up late subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub progress: u8,
    pub step: String,
}
