//! CLI output: error mapping and text rendering for command results.

use crate::agent::ModelAvailability;
use crate::error::ApiError;
use crate::service::StatusSummary;
use crate::workflow::QualityReport;

/// Map domain/service errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::GenerationFailed { errors } if errors.len() > 1 => {
            let mut out = String::from("Generation failed:");
            for error in errors {
                out.push_str("\n  - ");
                out.push_str(error);
            }
            out
        }
        other => other.to_string(),
    }
}

pub fn format_status_text(summary: &StatusSummary) -> String {
    let mut out = format!(
        "Generation: {}\nStatus: {}\nProgress: {}%\nStep: {}",
        summary.generation_id,
        summary.status,
        summary.progress,
        if summary.current_step.is_empty() {
            "-"
        } else {
            summary.current_step.as_str()
        }
    );
    if let Some(at) = &summary.completed_at {
        out.push_str(&format!("\nCompleted at: {}", at));
    }
    if let Some(at) = &summary.failed_at {
        out.push_str(&format!("\nEnded at: {}", at));
    }
    if !summary.errors.is_empty() {
        out.push_str("\nErrors:");
        for error in &summary.errors {
            out.push_str(&format!("\n  - {}", error));
        }
    }
    out
}

pub fn format_quality_text(report: &QualityReport) -> String {
    let mut out = format!(
        "Quality score: {:.1} (content {}, design {}, structure {}, images {})",
        report.overall_score,
        report.content_validation.score,
        report.design_validation.score,
        report.structure_validation.score,
        report.images_validation.score,
    );
    for issue in &report.issues {
        out.push_str(&format!("\n  issue: {}", issue));
    }
    for recommendation in &report.recommendations {
        out.push_str(&format!("\n  recommendation: {}", recommendation));
    }
    out
}

pub fn format_models_text(models: &[ModelAvailability]) -> String {
    let mut out = String::from("Models:");
    for m in models {
        out.push_str(&format!(
            "\n  {:<10} {:<24} {} ({})",
            m.kind.as_str(),
            m.model,
            m.availability,
            m.endpoint
        ));
    }
    out
}
