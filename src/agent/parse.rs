//! Best-effort structuring of free-text model output.
//!
//! Every parser first looks for a JSON object (a ```json fenced block, then
//! the outermost `{...}` span) and falls back to pattern extraction. Keys the
//! output does not provide are filled from the defaults below, with one
//! exception: design output containing neither JSON nor a single CSS rule is
//! rejected as [`AgentError::Unusable`].
//!
//! | kind      | defaults filled for                                                     |
//! |-----------|-------------------------------------------------------------------------|
//! | content   | hero_cta, contact_content, meta_title, meta_description, and any key    |
//! |           | missing from regex extraction                                           |
//! | design    | every `*_css` section left empty, `color_scheme` from the palette found |
//! | structure | html_structure, navigation, header, main_content, footer, meta_tags     |

use crate::error::AgentError;
use crate::types::{AgentKind, AgentOutput};
use regex::{Regex, RegexBuilder};
use serde_json::{json, Value};

pub const CONTENT_KEYS: [&str; 8] = [
    "hero_headline",
    "hero_subtitle",
    "hero_cta",
    "about_content",
    "services",
    "contact_content",
    "meta_title",
    "meta_description",
];

pub const DESIGN_CSS_KEYS: [&str; 8] = [
    "global_css",
    "header_css",
    "hero_css",
    "about_css",
    "services_css",
    "contact_css",
    "footer_css",
    "responsive_css",
];

pub const STRUCTURE_KEYS: [&str; 6] = [
    "html_structure",
    "navigation",
    "header",
    "main_content",
    "footer",
    "meta_tags",
];

const CONTENT_REQUIRED: [&str; 4] = ["hero_headline", "hero_subtitle", "about_content", "services"];
const ICONS: [&str; 4] = ["briefcase", "star", "target", "shield"];

const DEFAULT_PRIMARY: &str = "#2563eb";
const DEFAULT_SECONDARY: &str = "#1e40af";
const DEFAULT_ACCENT: &str = "#3b82f6";

fn content_default(key: &str) -> Value {
    match key {
        "hero_headline" => json!("Professional Business Solutions"),
        "hero_subtitle" => json!("Quality service you can trust with proven results"),
        "hero_cta" => json!("Get Started"),
        "about_content" => json!(
            "We are a professional business dedicated to providing excellent services to our clients."
        ),
        "services" => json!([
            {"name": "Consultation", "description": "Expert guidance tailored to your needs.", "icon_suggestion": "briefcase"},
            {"name": "Core Service", "description": "Reliable delivery with proven results.", "icon_suggestion": "star"},
            {"name": "Ongoing Support", "description": "Long-term care after the job is done.", "icon_suggestion": "target"}
        ]),
        "contact_content" => json!("Ready to take the next step? Contact us today for a free consultation."),
        "meta_title" => json!("Professional Business Services"),
        "meta_description" => json!("Expert business services with proven results. Contact us today."),
        _ => Value::Null,
    }
}

fn structure_default(key: &str) -> Value {
    match key {
        "html_structure" => json!(
            "<!DOCTYPE html><html><head></head><body><header><nav></nav></header><main></main><footer></footer></body></html>"
        ),
        "navigation" => json!("<nav><ul><li><a href=\"#home\">Home</a></li></ul></nav>"),
        "header" => json!("<header><nav></nav></header>"),
        "main_content" => json!("<main></main>"),
        "footer" => json!("<footer></footer>"),
        "meta_tags" => json!(
            "<meta charset=\"UTF-8\"><meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">"
        ),
        _ => Value::Null,
    }
}

fn default_color_scheme() -> Value {
    json!({
        "primary": DEFAULT_PRIMARY,
        "secondary": DEFAULT_SECONDARY,
        "accent": DEFAULT_ACCENT,
    })
}

/// Compiled patterns shared by all agents. Build once and reuse.
#[derive(Debug)]
pub struct ResponseParser {
    fenced_json: Regex,
    content_fields: Vec<(&'static str, Regex)>,
    services_list: Regex,
    service_line: Regex,
    css_rules: Vec<(&'static str, Regex)>,
    palette: Vec<(&'static str, Regex)>,
    html_document: Regex,
    html_elements: Vec<(&'static str, Regex)>,
}

fn ci(pattern: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(pattern).case_insensitive(true).build()
}

impl ResponseParser {
    pub fn new() -> Result<Self, regex::Error> {
        let field = |names: &str| {
            ci(&format!(
                r#"(?:^|\n)\s*[-*]*\s*"?(?:{names})"?\s*[:=]\s*"?([^"\n]+?)"?\s*,?\s*(?:\n|$)"#
            ))
        };
        Ok(Self {
            fenced_json: ci(r"```json\s*([\s\S]*?)\s*```")?,
            content_fields: vec![
                ("hero_headline", field(r"hero[_ ]headline|headline|main[_ ]headline")?),
                ("hero_subtitle", field(r"hero[_ ]subtitle|subtitle|tagline")?),
                ("hero_cta", field(r"hero[_ ]cta|cta|call[_ ]to[_ ]action")?),
                ("about_content", field(r"about[_ ]content|about")?),
                ("contact_content", field(r"contact[_ ]content|contact")?),
                ("meta_title", field(r"meta[_ ]title|seo[_ ]title")?),
                ("meta_description", field(r"meta[_ ]description|seo[_ ]description")?),
            ],
            services_list: ci(r#""?services"?\s*[:=]\s*\[([\s\S]*?)\]"#)?,
            service_line: ci(r"(?m)^\s*(?:service|offering)\s*\d*\s*[:.-]\s*(.+?)\s*$")?,
            css_rules: vec![
                ("global_css", ci(r":root\s*\{[^}]*\}|(?:^|\n)\s*body\s*\{[^}]*\}")?),
                ("header_css", ci(r"(?:^|\n)\s*header[^{]*\{[^}]*\}")?),
                ("hero_css", ci(r"\.hero[^{]*\{[^}]*\}")?),
                ("about_css", ci(r"\.about[^{]*\{[^}]*\}")?),
                ("services_css", ci(r"\.services?[^{]*\{[^}]*\}")?),
                ("contact_css", ci(r"\.contact[^{]*\{[^}]*\}")?),
                ("footer_css", ci(r"(?:^|\n)\s*\.?footer[^{]*\{[^}]*\}")?),
                ("responsive_css", ci(r"@media[^{]+\{(?:[^{}]*\{[^}]*\})*[^{}]*\}")?),
            ],
            palette: vec![
                ("primary", ci(r"--primary(?:-color)?\s*:\s*(#[0-9a-f]{3,8})")?),
                ("secondary", ci(r"--secondary(?:-color)?\s*:\s*(#[0-9a-f]{3,8})")?),
                ("accent", ci(r"--accent(?:-color)?\s*:\s*(#[0-9a-f]{3,8})")?),
            ],
            html_document: ci(r"<!DOCTYPE html>[\s\S]*?</html>")?,
            html_elements: vec![
                ("navigation", ci(r"<nav[\s\S]*?</nav>")?),
                ("header", ci(r"<header[\s\S]*?</header>")?),
                ("main_content", ci(r"<main[\s\S]*?</main>")?),
                ("footer", ci(r"<footer[\s\S]*?</footer>")?),
            ],
        })
    }

    /// Structure `raw` for the given agent kind.
    pub fn structure(&self, kind: AgentKind, raw: &str) -> Result<AgentOutput, AgentError> {
        match kind {
            AgentKind::Content => Ok(self.content(raw)),
            AgentKind::Design => self.design(raw),
            AgentKind::Structure => Ok(self.structure_html(raw)),
            AgentKind::Image => Err(AgentError::Unusable(
                "image results are not parsed from model text".to_string(),
            )),
        }
    }

    /// First JSON object found in `raw`, if any.
    pub fn extract_json(&self, raw: &str) -> Option<AgentOutput> {
        if let Some(caps) = self.fenced_json.captures(raw) {
            if let Some(Value::Object(map)) = caps
                .get(1)
                .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
            {
                return Some(map);
            }
        }
        let start = raw.find('{')?;
        let end = raw.rfind('}')?;
        if end <= start {
            return None;
        }
        match serde_json::from_str::<Value>(&raw[start..=end]) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        }
    }

    pub fn content(&self, raw: &str) -> AgentOutput {
        if let Some(mut parsed) = self.extract_json(raw) {
            if CONTENT_REQUIRED.iter().all(|k| parsed.contains_key(*k)) {
                normalize_services(&mut parsed);
                fill_defaults(&mut parsed, &CONTENT_KEYS, content_default);
                return parsed;
            }
        }

        let mut extracted = AgentOutput::new();
        for (key, pattern) in &self.content_fields {
            if let Some(value) = pattern.captures(raw).and_then(|c| c.get(1)) {
                let value = value.as_str().trim();
                if !value.is_empty() {
                    extracted.insert((*key).to_string(), json!(value));
                }
            }
        }
        let services = self.extract_services(raw);
        if !services.is_empty() {
            extracted.insert("services".to_string(), Value::Array(services));
        }
        fill_defaults(&mut extracted, &CONTENT_KEYS, content_default);
        extracted
    }

    fn extract_services(&self, raw: &str) -> Vec<Value> {
        if let Some(list) = self.services_list.captures(raw).and_then(|c| c.get(1)) {
            let as_json = format!("[{}]", list.as_str());
            if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&as_json) {
                let mut holder = AgentOutput::new();
                holder.insert("services".to_string(), Value::Array(items));
                normalize_services(&mut holder);
                if let Some(Value::Array(items)) = holder.remove("services") {
                    if !items.is_empty() {
                        return items;
                    }
                }
            }
        }
        self.service_line
            .captures_iter(raw)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim_matches('"').trim().to_string())
            .filter(|name| !name.is_empty())
            .take(ICONS.len())
            .enumerate()
            .map(|(i, name)| service_object(&name, None, ICONS[i]))
            .collect()
    }

    pub fn design(&self, raw: &str) -> Result<AgentOutput, AgentError> {
        if let Some(mut parsed) = self.extract_json(raw) {
            let recognised = DESIGN_CSS_KEYS.iter().any(|k| parsed.contains_key(*k))
                || parsed.contains_key("color_scheme");
            if recognised {
                fill_defaults(&mut parsed, &DESIGN_CSS_KEYS, |_| json!(""));
                if !parsed.get("color_scheme").is_some_and(Value::is_object) {
                    parsed.insert("color_scheme".to_string(), self.palette_from(raw));
                }
                return Ok(parsed);
            }
        }

        let mut extracted = AgentOutput::new();
        for (key, pattern) in &self.css_rules {
            let rules: Vec<&str> = pattern
                .find_iter(raw)
                .map(|m| m.as_str().trim())
                .collect();
            if !rules.is_empty() {
                extracted.insert((*key).to_string(), json!(rules.join("\n")));
            }
        }
        if extracted.is_empty() {
            return Err(AgentError::Unusable(
                "design response contained no JSON and no CSS rules".to_string(),
            ));
        }
        fill_defaults(&mut extracted, &DESIGN_CSS_KEYS, |_| json!(""));
        extracted.insert("color_scheme".to_string(), self.palette_from(raw));
        Ok(extracted)
    }

    fn palette_from(&self, raw: &str) -> Value {
        let mut scheme = default_color_scheme();
        for (name, pattern) in &self.palette {
            if let Some(color) = pattern.captures(raw).and_then(|c| c.get(1)) {
                scheme[*name] = json!(color.as_str());
            }
        }
        scheme
    }

    pub fn structure_html(&self, raw: &str) -> AgentOutput {
        if let Some(mut parsed) = self.extract_json(raw) {
            if STRUCTURE_KEYS.iter().any(|k| parsed.contains_key(*k)) {
                fill_defaults(&mut parsed, &STRUCTURE_KEYS, structure_default);
                return parsed;
            }
        }

        let mut extracted = AgentOutput::new();
        if let Some(document) = self.html_document.find(raw) {
            extracted.insert("html_structure".to_string(), json!(document.as_str()));
        }
        for (key, pattern) in &self.html_elements {
            if let Some(element) = pattern.find(raw) {
                extracted.insert((*key).to_string(), json!(element.as_str()));
            }
        }
        fill_defaults(&mut extracted, &STRUCTURE_KEYS, structure_default);
        extracted
    }
}

fn fill_defaults(map: &mut AgentOutput, keys: &[&str], default: impl Fn(&str) -> Value) {
    for key in keys {
        if !map.contains_key(*key) {
            map.insert((*key).to_string(), default(key));
        }
    }
}

fn service_object(name: &str, description: Option<&str>, icon: &str) -> Value {
    let description = description
        .map(str::to_string)
        .unwrap_or_else(|| format!("Professional {} service with expert guidance.", name.to_lowercase()));
    json!({"name": name, "description": description, "icon_suggestion": icon})
}

/// Services become `{name, description, icon_suggestion}` objects.
fn normalize_services(map: &mut AgentOutput) {
    let Some(Value::Array(services)) = map.get_mut("services") else {
        return;
    };
    let normalized: Vec<Value> = services
        .iter()
        .enumerate()
        .filter_map(|(i, service)| {
            let icon = ICONS.get(i).copied().unwrap_or("star");
            match service {
                Value::String(name) => Some(service_object(name, None, icon)),
                Value::Object(obj) => {
                    let mut obj = obj.clone();
                    obj.entry("icon_suggestion").or_insert_with(|| json!("star"));
                    Some(Value::Object(obj))
                }
                _ => None,
            }
        })
        .collect();
    *services = normalized;
}
