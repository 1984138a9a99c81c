//! Prompt templates for the model-backed agents.

use crate::types::{AgentKind, AgentOutput, BusinessInfo};
use serde_json::Value;

const DEFAULT_COLORS: [&str; 2] = ["#2563eb", "#1e40af"];

pub fn build(kind: AgentKind, business: &BusinessInfo, upstream: Option<&AgentOutput>) -> String {
    match kind {
        AgentKind::Content => content_prompt(business),
        AgentKind::Design => design_prompt(business, upstream),
        AgentKind::Structure => structure_prompt(business, upstream),
        AgentKind::Image => image_queries(business).join(", "),
    }
}

fn requirements(business: &BusinessInfo) -> String {
    business
        .additional_requirements
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .map(|r| format!("\nAdditional requirements: {r}"))
        .unwrap_or_default()
}

fn headline(upstream: Option<&AgentOutput>) -> &str {
    upstream
        .and_then(|c| c.get("hero_headline"))
        .and_then(Value::as_str)
        .unwrap_or("")
}

pub fn content_prompt(business: &BusinessInfo) -> String {
    format!(
        r#"You are an expert copywriter creating website content for a {category} business.

Business name: {name}
Description: {description}
Target audience: {audience}{requirements}

Return ONLY valid JSON in this exact format:
```json
{{
  "hero_headline": "Compelling headline under 60 characters",
  "hero_subtitle": "Supporting sentence that expands on the headline",
  "hero_cta": "Call to action text",
  "about_content": "Two short paragraphs about the business",
  "services": [
    {{"name": "Service name", "description": "One sentence", "icon_suggestion": "star"}}
  ],
  "contact_content": "Invitation to get in touch",
  "meta_title": "SEO title under 60 characters",
  "meta_description": "SEO description under 160 characters"
}}
```"#,
        category = business.business_category,
        name = business.business_name,
        description = business.business_description,
        audience = business.audience(),
        requirements = requirements(business),
    )
}

pub fn design_prompt(business: &BusinessInfo, content: Option<&AgentOutput>) -> String {
    let colors = if business.preferred_colors.is_empty() {
        DEFAULT_COLORS.join(", ")
    } else {
        business.preferred_colors.join(", ")
    };
    format!(
        r##"You are a senior UI designer. Generate modern, responsive, accessible CSS for a {category} website named "{name}".
Headline: {headline}
Use this colour palette: {colors}{requirements}

Return ONLY valid JSON with these keys, each holding production-ready CSS:
```json
{{
  "global_css": ":root variables, body and typography",
  "header_css": "header and navigation",
  "hero_css": ".hero section",
  "about_css": ".about section",
  "services_css": ".services section",
  "contact_css": ".contact section",
  "footer_css": "footer",
  "responsive_css": "@media breakpoints",
  "color_scheme": {{"primary": "#hex", "secondary": "#hex", "accent": "#hex"}}
}}
```"##,
        category = business.business_category,
        name = business.business_name,
        headline = headline(content),
        colors = colors,
        requirements = requirements(business),
    )
}

pub fn structure_prompt(business: &BusinessInfo, content: Option<&AgentOutput>) -> String {
    format!(
        r#"You are a frontend developer. Generate semantic, accessible HTML5 for a {category} website named "{name}".
Headline: {headline}
Sections: header with navigation, hero, about, services, contact, footer.{requirements}

Return ONLY valid JSON with these keys:
```json
{{
  "html_structure": "complete <!DOCTYPE html> document",
  "navigation": "<nav> element",
  "header": "<header> element",
  "main_content": "<main> element",
  "footer": "<footer> element",
  "meta_tags": "meta tags for the <head>"
}}
```"#,
        category = business.business_category,
        name = business.business_name,
        headline = headline(content),
        requirements = requirements(business),
    )
}

/// Image search queries in slot order: hero, about, three services, background.
pub fn image_queries(business: &BusinessInfo) -> Vec<String> {
    let category = business.business_category.trim();
    vec![
        format!("{category} professional"),
        format!("{category} team office"),
        format!("{category} service"),
        format!("{category} service"),
        format!("{category} service"),
        format!("{category} background"),
    ]
}
