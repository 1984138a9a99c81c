//! Final assembly: render the site from accumulated state and write it to disk.

use crate::error::GenerationError;
use crate::types::{now_rfc3339, AgentOutput, BusinessInfo, GenerationId};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

pub const DEFAULT_PRIMARY_COLOR: &str = "#3f51b5";
pub const DEFAULT_SECONDARY_COLOR: &str = "#f50057";

const HTML_FILE: &str = "index.html";
const CSS_FILE: &str = "styles.css";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRef {
    pub id: String,
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebsiteMetadata {
    pub generation_id: GenerationId,
    pub business_info: BusinessInfo,
    pub quality_score: f64,
    pub generated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinalWebsite {
    pub website_url: String,
    pub html_content: String,
    pub css_content: String,
    pub pages: Vec<PageRef>,
    pub images: Vec<Value>,
    pub metadata: WebsiteMetadata,
}

/// Where rendered sites are written and how they are addressed.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    output_dir: PathBuf,
    url_prefix: String,
}

impl ArtifactWriter {
    pub fn new(output_dir: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            url_prefix: url_prefix.into(),
        }
    }

    pub fn site_dir(&self, generation_id: &GenerationId) -> PathBuf {
        self.output_dir.join("websites").join(generation_id.as_str())
    }

    pub fn website_url(&self, generation_id: &GenerationId) -> String {
        format!(
            "{}/{}/{}",
            self.url_prefix.trim_end_matches('/'),
            generation_id,
            HTML_FILE
        )
    }

    /// Write `index.html` and `styles.css`, returning the public URL.
    pub async fn write(
        &self,
        generation_id: &GenerationId,
        html: &str,
        css: &str,
    ) -> Result<String, GenerationError> {
        let dir = self.site_dir(generation_id);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| GenerationError::Assembly(format!("{}: {}", dir.display(), e)))?;
        for (name, body) in [(HTML_FILE, html), (CSS_FILE, css)] {
            let path = dir.join(name);
            tokio::fs::write(&path, body)
                .await
                .map_err(|e| GenerationError::Assembly(format!("{}: {}", path.display(), e)))?;
        }
        debug!(generation_id = %generation_id, dir = %dir.display(), "Site artifacts written");
        Ok(self.website_url(generation_id))
    }

    /// Remove a site written for a run that did not complete.
    pub async fn discard(&self, generation_id: &GenerationId) -> Result<(), GenerationError> {
        let dir = self.site_dir(generation_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {
                debug!(generation_id = %generation_id, dir = %dir.display(), "Site artifacts discarded");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(GenerationError::Assembly(format!("{}: {}", dir.display(), e))),
        }
    }
}

/// Render, persist, and describe the finished site.
pub async fn assemble(
    writer: &ArtifactWriter,
    generation_id: &GenerationId,
    business: &BusinessInfo,
    content: &AgentOutput,
    design: &AgentOutput,
    images: &AgentOutput,
    quality_score: f64,
) -> Result<FinalWebsite, GenerationError> {
    let html = render_html(business, content, chrono::Utc::now().year());
    let css = render_css(design);
    let website_url = writer.write(generation_id, &html, &css).await?;

    Ok(FinalWebsite {
        website_url,
        html_content: html,
        css_content: css,
        pages: vec![PageRef {
            id: "home".to_string(),
            name: "Home".to_string(),
            path: "/".to_string(),
        }],
        images: collect_images(images),
        metadata: WebsiteMetadata {
            generation_id: generation_id.clone(),
            business_info: business.clone(),
            quality_score,
            generated_at: now_rfc3339(),
        },
    })
}

/// Flatten the image agent's output into a list of image objects.
pub fn collect_images(images: &AgentOutput) -> Vec<Value> {
    let mut out = Vec::new();
    for key in ["hero_image", "about_image", "service_images", "background_images"] {
        match images.get(key) {
            Some(image @ Value::Object(_)) => out.push(image.clone()),
            Some(Value::Array(list)) => out.extend(list.iter().filter(|v| v.is_object()).cloned()),
            _ => {}
        }
    }
    out
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

fn text_field<'a>(data: &'a AgentOutput, key: &str, default: &'a str) -> &'a str {
    data.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default)
}

fn render_services(content: &AgentOutput) -> String {
    let Some(Value::Array(services)) = content.get("services") else {
        return "<p>Our services information</p>".to_string();
    };
    let cards: Vec<String> = services
        .iter()
        .filter_map(|service| match service {
            Value::String(name) => Some((name.as_str(), "")),
            Value::Object(obj) => obj.get("name").and_then(Value::as_str).map(|name| {
                (
                    name,
                    obj.get("description").and_then(Value::as_str).unwrap_or(""),
                )
            }),
            _ => None,
        })
        .map(|(name, description)| {
            format!(
                "<div class=\"service-card\"><h3>{}</h3><p>{}</p></div>",
                escape_html(name),
                escape_html(description)
            )
        })
        .collect();
    if cards.is_empty() {
        "<p>Our services information</p>".to_string()
    } else {
        cards.join("\n                    ")
    }
}

/// Pure HTML render of the single-page site.
pub fn render_html(business: &BusinessInfo, content: &AgentOutput, year: i32) -> String {
    let name = escape_html(&business.business_name);
    let meta_title = escape_html(text_field(content, "meta_title", "Professional Website"));
    let meta_description = escape_html(text_field(content, "meta_description", ""));
    let headline = escape_html(text_field(content, "hero_headline", "Welcome to our website"));
    let subtitle = escape_html(text_field(
        content,
        "hero_subtitle",
        "Professional services for your needs",
    ));
    let cta = escape_html(text_field(content, "hero_cta", "Contact Us"));
    let about = escape_html(text_field(content, "about_content", "Information about our business"));
    let contact = escape_html(text_field(content, "contact_content", "Contact information"));
    let services = render_services(content);

    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{name} - {meta_title}</title>
    <meta name="description" content="{meta_description}">
    <link rel="stylesheet" href="styles.css">
</head>
<body>
    <header class="header">
        <div class="container">
            <h1>{name}</h1>
            <nav>
                <ul>
                    <li><a href="#">Home</a></li>
                    <li><a href="#about">About</a></li>
                    <li><a href="#services">Services</a></li>
                    <li><a href="#contact">Contact</a></li>
                </ul>
            </nav>
        </div>
    </header>

    <main>
        <section class="hero">
            <div class="container">
                <h2>{headline}</h2>
                <p>{subtitle}</p>
                <a class="cta" href="#contact">{cta}</a>
            </div>
        </section>

        <section id="about" class="about">
            <div class="container">
                <h2>About Us</h2>
                <p>{about}</p>
            </div>
        </section>

        <section id="services" class="services">
            <div class="container">
                <h2>Our Services</h2>
                <div class="services-grid">
                    {services}
                </div>
            </div>
        </section>

        <section id="contact" class="contact">
            <div class="container">
                <h2>Contact Us</h2>
                <p>{contact}</p>
                <form>
                    <input type="text" placeholder="Your Name">
                    <input type="email" placeholder="Your Email">
                    <textarea placeholder="Your Message"></textarea>
                    <button type="submit">Send Message</button>
                </form>
            </div>
        </section>
    </main>

    <footer class="footer">
        <div class="container">
            <p>&copy; {year} {name}. All rights reserved.</p>
        </div>
    </footer>
</body>
</html>
"##
    )
}

fn scheme_color<'a>(design: &'a AgentOutput, key: &str, default: &'a str) -> &'a str {
    design
        .get("color_scheme")
        .and_then(|scheme| scheme.get(key))
        .and_then(Value::as_str)
        .filter(|c| is_css_color(c))
        .unwrap_or(default)
}

fn is_css_color(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '#' | '(' | ')' | ',' | '.' | '%' | ' '))
}

/// Pure CSS render: base stylesheet in the scheme colours plus the agent's sections.
pub fn render_css(design: &AgentOutput) -> String {
    let primary = scheme_color(design, "primary", DEFAULT_PRIMARY_COLOR);
    let secondary = scheme_color(design, "secondary", DEFAULT_SECONDARY_COLOR);

    let mut css = format!(
        r#"/* Global Styles */
* {{
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}}

body {{
    font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif;
    line-height: 1.6;
    color: #333;
}}

.container {{
    width: 90%;
    max-width: 1200px;
    margin: 0 auto;
    padding: 0 20px;
}}

a {{
    text-decoration: none;
    color: {primary};
}}

/* Header */
.header {{
    background-color: #fff;
    box-shadow: 0 2px 5px rgba(0, 0, 0, 0.1);
    padding: 1rem 0;
    position: sticky;
    top: 0;
    z-index: 100;
}}

.header .container {{
    display: flex;
    justify-content: space-between;
    align-items: center;
}}

.header nav ul {{
    display: flex;
    list-style: none;
}}

.header nav ul li {{
    margin-left: 1.5rem;
}}

.header nav ul li a:hover {{
    color: {primary};
}}

/* Hero Section */
.hero {{
    background: linear-gradient(135deg, {primary}, {secondary});
    color: #fff;
    padding: 5rem 0;
    text-align: center;
}}

.hero .cta {{
    display: inline-block;
    margin-top: 1.5rem;
    padding: 0.8rem 1.5rem;
    background-color: #fff;
    color: {primary};
    border-radius: 4px;
}}

/* Sections */
.about, .contact {{
    padding: 5rem 0;
    background-color: #f9f9f9;
}}

.services {{
    padding: 5rem 0;
}}

.services-grid {{
    display: grid;
    grid-template-columns: repeat(auto-fit, minmax(300px, 1fr));
    gap: 2rem;
    margin-top: 2rem;
}}

.contact form {{
    margin-top: 2rem;
    max-width: 600px;
}}

.contact input,
.contact textarea {{
    width: 100%;
    padding: 0.8rem;
    margin-bottom: 1rem;
    border: 1px solid #ddd;
    border-radius: 4px;
}}

.contact button {{
    background-color: {primary};
    color: #fff;
    border: none;
    padding: 0.8rem 1.5rem;
    border-radius: 4px;
    cursor: pointer;
}}

.contact button:hover {{
    background-color: {secondary};
}}

/* Footer */
.footer {{
    background-color: #333;
    color: #fff;
    padding: 2rem 0;
    text-align: center;
}}

@media (max-width: 768px) {{
    .header .container {{
        flex-direction: column;
    }}

    .hero h2 {{
        font-size: 2rem;
    }}
}}
"#
    );

    for key in [
        "global_css",
        "header_css",
        "hero_css",
        "about_css",
        "services_css",
        "contact_css",
        "footer_css",
        "responsive_css",
    ] {
        if let Some(section) = design.get(key).and_then(Value::as_str) {
            let section = section.trim();
            if !section.is_empty() {
                css.push_str(&format!("\n/* {key} */\n{section}\n"));
            }
        }
    }
    css
}
