//! Deterministic quality scoring over the four agent outputs.
//!
//! Each section starts from a fixed base and loses a fixed penalty per missing
//! field, never dropping below zero. The overall score is the mean of the
//! four section scores.

use crate::error::ScoringError;
use crate::types::AgentOutput;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const CONTENT_BASE: u32 = 85;
pub const DESIGN_BASE: u32 = 90;
pub const STRUCTURE_BASE: u32 = 88;
pub const IMAGES_BASE: u32 = 92;

const CONTENT_REQUIRED: [&str; 4] = ["hero_headline", "hero_subtitle", "about_content", "services"];
const CONTENT_MISSING_PENALTY: u32 = 10;
const SEO_MISSING_PENALTY: u32 = 5;
const HEADLINE_SOFT_LIMIT: usize = 60;

const DESIGN_REQUIRED: [&str; 3] = ["global_css", "header_css", "hero_css"];
const DESIGN_MISSING_PENALTY: u32 = 15;
const COLOR_SCHEME_PENALTY: u32 = 10;

const STRUCTURE_REQUIRED: [&str; 3] = ["html_structure", "navigation", "header"];
const STRUCTURE_MISSING_PENALTY: u32 = 12;

const HERO_IMAGE_PENALTY: u32 = 20;
const ALT_TEXT_PENALTY: u32 = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionReport {
    pub score: u32,
    pub recommendations: Vec<String>,
    pub issues: Vec<String>,
}

impl SectionReport {
    fn starting_at(base: u32) -> Self {
        Self {
            score: base,
            ..Self::default()
        }
    }

    fn penalize(&mut self, penalty: u32, issue: impl Into<String>) {
        self.score = self.score.saturating_sub(penalty);
        self.issues.push(issue.into());
    }

    fn recommend(&mut self, recommendation: impl Into<String>) {
        self.recommendations.push(recommendation.into());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub overall_score: f64,
    pub content_validation: SectionReport,
    pub design_validation: SectionReport,
    pub structure_validation: SectionReport,
    pub images_validation: SectionReport,
    pub recommendations: Vec<String>,
    pub issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QualityReport {
    fn from_sections(
        content: SectionReport,
        design: SectionReport,
        structure: SectionReport,
        images: SectionReport,
    ) -> Self {
        let sections = [&content, &design, &structure, &images];
        let overall_score =
            sections.iter().map(|s| f64::from(s.score)).sum::<f64>() / sections.len() as f64;
        let recommendations = sections
            .iter()
            .flat_map(|s| s.recommendations.iter().cloned())
            .collect();
        let issues = sections
            .iter()
            .flat_map(|s| s.issues.iter().cloned())
            .collect();
        Self {
            overall_score,
            content_validation: content,
            design_validation: design,
            structure_validation: structure,
            images_validation: images,
            recommendations,
            issues,
            error: None,
        }
    }

    /// Zero-score report recorded when scoring itself fails.
    pub fn failed(error: &ScoringError) -> Self {
        Self {
            overall_score: 0.0,
            content_validation: SectionReport::default(),
            design_validation: SectionReport::default(),
            structure_validation: SectionReport::default(),
            images_validation: SectionReport::default(),
            recommendations: vec!["Manual review required".to_string()],
            issues: vec!["Validation process failed".to_string()],
            error: Some(error.to_string()),
        }
    }
}

/// Borrowed view of the four agent outputs being scored.
#[derive(Debug, Clone, Copy)]
pub struct QualityInputs<'a> {
    pub content: &'a AgentOutput,
    pub design: &'a AgentOutput,
    pub structure: &'a AgentOutput,
    pub images: &'a AgentOutput,
}

/// Scores a generation. Pure: no I/O, no randomness.
pub trait QualityScorer: Send + Sync {
    fn score(&self, inputs: &QualityInputs<'_>) -> Result<QualityReport, ScoringError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardScorer;

impl QualityScorer for StandardScorer {
    fn score(&self, inputs: &QualityInputs<'_>) -> Result<QualityReport, ScoringError> {
        Ok(QualityReport::from_sections(
            score_content(inputs.content)?,
            score_design(inputs.design),
            score_structure(inputs.structure)?,
            score_images(inputs.images),
        ))
    }
}

/// A field counts as present when it holds a non-empty, non-zero, non-false value.
fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

fn score_content(content: &AgentOutput) -> Result<SectionReport, ScoringError> {
    let mut report = SectionReport::starting_at(CONTENT_BASE);
    for key in CONTENT_REQUIRED {
        if !is_present(content.get(key)) {
            report.penalize(CONTENT_MISSING_PENALTY, format!("Missing {key}"));
        }
    }

    let headline = content.get("hero_headline");
    if is_present(headline) {
        let length = match headline {
            Some(Value::String(s)) => s.chars().count(),
            Some(Value::Array(a)) => a.len(),
            Some(Value::Object(o)) => o.len(),
            _ => {
                return Err(ScoringError(
                    "hero_headline has no measurable length".to_string(),
                ))
            }
        };
        if length > HEADLINE_SOFT_LIMIT {
            report.recommend("Consider shortening hero headline for better impact");
        }
    }

    if !is_present(content.get("meta_title")) {
        report.penalize(SEO_MISSING_PENALTY, "Missing SEO meta title");
    }
    if !is_present(content.get("meta_description")) {
        report.penalize(SEO_MISSING_PENALTY, "Missing SEO meta description");
    }
    Ok(report)
}

fn score_design(design: &AgentOutput) -> SectionReport {
    let mut report = SectionReport::starting_at(DESIGN_BASE);
    for key in DESIGN_REQUIRED {
        if !is_present(design.get(key)) {
            report.penalize(DESIGN_MISSING_PENALTY, format!("Missing {key}"));
        }
    }
    if !is_present(design.get("color_scheme")) {
        report.penalize(COLOR_SCHEME_PENALTY, "Missing color scheme definition");
    }
    report
}

fn score_structure(structure: &AgentOutput) -> Result<SectionReport, ScoringError> {
    let mut report = SectionReport::starting_at(STRUCTURE_BASE);
    for key in STRUCTURE_REQUIRED {
        if !is_present(structure.get(key)) {
            report.penalize(STRUCTURE_MISSING_PENALTY, format!("Missing {key}"));
        }
    }

    let html = match structure.get("html_structure") {
        None => "",
        Some(Value::String(s)) => s.as_str(),
        Some(_) => return Err(ScoringError("html_structure is not text".to_string())),
    };
    if !html.to_lowercase().contains("nav") {
        report.recommend("Consider adding semantic navigation elements");
    }
    Ok(report)
}

fn score_images(images: &AgentOutput) -> SectionReport {
    let mut report = SectionReport::starting_at(IMAGES_BASE);
    if !is_present(images.get("hero_image")) {
        report.penalize(HERO_IMAGE_PENALTY, "Missing hero image");
    }
    for (key, value) in images {
        if let Value::Object(image) = value {
            if !is_present(image.get("alt_description")) {
                report.penalize(ALT_TEXT_PENALTY, format!("Missing alt description for {key}"));
            }
        }
    }
    report
}
