//! Image selection through the Unsplash search API.

use crate::agent::ollama::{build_http_client, map_http_error, status_error};
use crate::agent::prompts::image_queries;
use crate::agent::AgentInvoker;
use crate::error::AgentError;
use crate::types::{AgentKind, AgentOutput, BusinessInfo};
use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::Client;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_UNSPLASH_URL: &str = "https://api.unsplash.com";
const PLACEHOLDER_KEY: &str = "your_unsplash_access_key";

/// Finds one image for a query.
#[async_trait]
pub trait ImageSearch: Send + Sync {
    /// `Ok(None)` when the search succeeded but matched nothing.
    async fn search(&self, query: &str) -> Result<Option<Value>, AgentError>;
}

pub struct UnsplashClient {
    client: Client,
    base_url: String,
    access_key: String,
    request_timeout: Duration,
}

impl UnsplashClient {
    pub fn new(
        base_url: Option<String>,
        access_key: Option<String>,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, AgentError> {
        let access_key = access_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && k != PLACEHOLDER_KEY)
            .ok_or_else(|| AgentError::NotConfigured("Unsplash access key is not set".to_string()))?;
        let base_url = base_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_UNSPLASH_URL.to_string());
        Ok(Self {
            client: build_http_client(connect_timeout, request_timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key,
            request_timeout,
        })
    }
}

#[async_trait]
impl ImageSearch for UnsplashClient {
    async fn search(&self, query: &str) -> Result<Option<Value>, AgentError> {
        let url = format!("{}/search/photos", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Client-ID {}", self.access_key))
            .query(&[("query", query), ("per_page", "1"), ("orientation", "landscape")])
            .send()
            .await
            .map_err(|e| map_http_error(e, self.request_timeout))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| AgentError::MalformedResponse(format!("Failed to parse search results: {e}")))?;
        let Some(photo) = body
            .get("results")
            .and_then(Value::as_array)
            .and_then(|results| results.first())
        else {
            return Ok(None);
        };
        photo_to_image(photo, query).map(Some)
    }
}

/// Reduce an Unsplash photo object to the image fields the pipeline uses.
pub fn photo_to_image(photo: &Value, query: &str) -> Result<Value, AgentError> {
    let field = |pointer: &str| {
        photo
            .pointer(pointer)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| AgentError::MalformedResponse(format!("photo is missing {pointer}")))
    };
    let alt = photo
        .get("alt_description")
        .and_then(Value::as_str)
        .filter(|a| !a.trim().is_empty())
        .unwrap_or(query);
    Ok(json!({
        "url": field("/urls/regular")?,
        "url_small": field("/urls/small")?,
        "url_thumb": field("/urls/thumb")?,
        "alt_description": alt,
        "photographer": field("/user/name")?,
        "photographer_url": field("/user/links/html")?,
        "download_url": field("/links/download_location")?,
    }))
}

pub struct ImageAgent {
    search: Arc<dyn ImageSearch>,
}

impl ImageAgent {
    pub fn new(search: Arc<dyn ImageSearch>) -> Self {
        Self { search }
    }

    async fn find(&self, query: &str) -> Result<Value, AgentError> {
        self.search
            .search(query)
            .await?
            .ok_or_else(|| AgentError::Unusable(format!("No images found for '{query}'")))
    }
}

#[async_trait]
impl AgentInvoker for ImageAgent {
    fn kind(&self) -> AgentKind {
        AgentKind::Image
    }

    async fn invoke(
        &self,
        business: &BusinessInfo,
        _upstream: Option<&AgentOutput>,
    ) -> Result<AgentOutput, AgentError> {
        let queries = image_queries(business);
        let mut found = try_join_all(queries.iter().map(|q| self.find(q))).await?;
        debug!(images = found.len(), "Images selected");

        let background = found.pop().unwrap_or(Value::Null);
        let mut slots = found.into_iter();
        let hero = slots.next().unwrap_or(Value::Null);
        let about = slots.next().unwrap_or(Value::Null);
        let services: Vec<Value> = slots.collect();

        let mut out = AgentOutput::new();
        out.insert("hero_image".to_string(), hero);
        out.insert("about_image".to_string(), about);
        out.insert("service_images".to_string(), Value::Array(services));
        out.insert("background_images".to_string(), background);
        Ok(out)
    }
}
