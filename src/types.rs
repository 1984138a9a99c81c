//! Shared domain types: identifiers, business input, agent kinds, timestamps.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured output of one agent: a JSON object with agent-specific keys.
pub type AgentOutput = serde_json::Map<String, serde_json::Value>;

/// Opaque generation identifier, assigned once at creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationId(String);

impl GenerationId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for GenerationId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for GenerationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for GenerationId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for GenerationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Caller-supplied description of the business. Never mutated by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessInfo {
    pub business_name: String,
    pub business_category: String,
    pub business_description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub preferred_colors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_requirements: Option<String>,
}

impl BusinessInfo {
    pub fn new(
        business_name: impl Into<String>,
        business_category: impl Into<String>,
        business_description: impl Into<String>,
    ) -> Self {
        Self {
            business_name: business_name.into(),
            business_category: business_category.into(),
            business_description: business_description.into(),
            target_audience: None,
            preferred_colors: Vec::new(),
            additional_requirements: None,
        }
    }

    /// Check that the required fields are non-blank.
    pub fn validate(&self) -> Result<(), String> {
        if self.business_name.trim().is_empty() {
            return Err("Business name is required".to_string());
        }
        if self.business_category.trim().is_empty() {
            return Err("Business category is required".to_string());
        }
        if self.business_description.trim().is_empty() {
            return Err("Business description is required".to_string());
        }
        Ok(())
    }

    pub fn audience(&self) -> &str {
        self.target_audience
            .as_deref()
            .filter(|a| !a.trim().is_empty())
            .unwrap_or("General audience")
    }
}

/// The four external generation capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    Content,
    Design,
    Structure,
    Image,
}

impl AgentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AgentKind::Content => "content",
            AgentKind::Design => "design",
            AgentKind::Structure => "structure",
            AgentKind::Image => "image",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AgentKind::Content => "Content",
            AgentKind::Design => "Design",
            AgentKind::Structure => "Structure",
            AgentKind::Image => "Image",
        };
        f.write_str(label)
    }
}

/// Current UTC time as RFC 3339 with millisecond precision.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_ids_are_unique() {
        assert_ne!(GenerationId::new(), GenerationId::new());
    }

    #[test]
    fn blank_business_fields_are_rejected() {
        let mut info = BusinessInfo::new("Star Plumbers, NY", "plumbing", "Pipes fixed fast");
        assert!(info.validate().is_ok());
        info.business_category = "   ".to_string();
        assert_eq!(
            info.validate().unwrap_err(),
            "Business category is required"
        );
    }

    #[test]
    fn audience_defaults_when_absent() {
        let info = BusinessInfo::new("a", "b", "c");
        assert_eq!(info.audience(), "General audience");
    }

    #[test]
    fn business_info_tolerates_missing_optional_fields() {
        let raw = r#"{"business_name":"a","business_category":"b","business_description":"c"}"#;
        let info: BusinessInfo = serde_json::from_str(raw).unwrap();
        assert!(info.preferred_colors.is_empty());
        assert!(info.target_audience.is_none());
    }
}
