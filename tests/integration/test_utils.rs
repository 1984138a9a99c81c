//! Shared test utilities for integration tests
//!
//! Scripted agents, output fixtures, a service wired to in-memory storage, and
//! XDG environment isolation for config tests.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use sitegen::agent::{AgentInvoker, AgentSet};
use sitegen::error::AgentError;
use sitegen::progress::ProgressHub;
use sitegen::retry::RetryPolicy;
use sitegen::service::GenerationService;
use sitegen::store::InMemoryGenerationStore;
use sitegen::types::{AgentKind, AgentOutput, BusinessInfo};
use sitegen::workflow::{ArtifactWriter, PipelinePolicies};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// Global mutex to serialize XDG environment variable access across all tests
static XDG_ENV_MUTEX: Mutex<()> = Mutex::new(());

/// Run `f` with HOME and XDG_CONFIG_HOME pointed into `test_dir`, restoring both afterwards.
pub fn with_xdg_env<F, R>(test_dir: &TempDir, f: F) -> R
where
    F: FnOnce() -> R,
{
    let _guard = XDG_ENV_MUTEX.lock();
    let home = std::env::var_os("HOME");
    let xdg_config_home = std::env::var_os("XDG_CONFIG_HOME");

    let test_home = test_dir.path().join("home");
    std::fs::create_dir_all(&test_home).unwrap();
    std::env::set_var("HOME", &test_home);
    std::env::set_var("XDG_CONFIG_HOME", test_dir.path());

    let result = f();

    match home {
        Some(value) => std::env::set_var("HOME", value),
        None => std::env::remove_var("HOME"),
    }
    match xdg_config_home {
        Some(value) => std::env::set_var("XDG_CONFIG_HOME", value),
        None => std::env::remove_var("XDG_CONFIG_HOME"),
    }
    result
}

/// Agent that fails a fixed number of times, optionally sleeping per attempt.
pub struct ScriptedAgent {
    kind: AgentKind,
    output: AgentOutput,
    failures: u32,
    delay: Duration,
    calls: Mutex<u32>,
    upstream_seen: Mutex<Vec<Option<AgentOutput>>>,
}

impl ScriptedAgent {
    pub fn ok(kind: AgentKind, output: AgentOutput) -> Arc<Self> {
        Self::build(kind, output, 0, Duration::ZERO)
    }

    pub fn always_failing(kind: AgentKind) -> Arc<Self> {
        Self::build(kind, AgentOutput::new(), u32::MAX, Duration::ZERO)
    }

    pub fn slow(kind: AgentKind, output: AgentOutput, delay: Duration) -> Arc<Self> {
        Self::build(kind, output, 0, delay)
    }

    fn build(kind: AgentKind, output: AgentOutput, failures: u32, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            kind,
            output,
            failures,
            delay,
            calls: Mutex::new(0),
            upstream_seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock()
    }

    pub fn upstream_seen(&self) -> Vec<Option<AgentOutput>> {
        self.upstream_seen.lock().clone()
    }
}

#[async_trait]
impl AgentInvoker for ScriptedAgent {
    fn kind(&self) -> AgentKind {
        self.kind
    }

    async fn invoke(
        &self,
        _business: &BusinessInfo,
        upstream: Option<&AgentOutput>,
    ) -> Result<AgentOutput, AgentError> {
        let call = {
            let mut calls = self.calls.lock();
            *calls += 1;
            *calls
        };
        self.upstream_seen.lock().push(upstream.cloned());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if call <= self.failures {
            return Err(AgentError::RequestFailed(format!(
                "{} backend returned status 500",
                self.kind.as_str()
            )));
        }
        Ok(self.output.clone())
    }
}

pub fn object(value: Value) -> AgentOutput {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a JSON object, got {other}"),
    }
}

pub fn business() -> BusinessInfo {
    BusinessInfo::new(
        "Star Plumbers, NY",
        "plumbing",
        "Emergency plumbing and repairs across New York",
    )
}

pub fn content_output() -> AgentOutput {
    object(json!({
        "hero_headline": "Plumbing you can trust",
        "hero_subtitle": "Serving all five boroughs",
        "about_content": "Family owned since 1982.",
        "services": [
            {"name": "Repairs", "description": "Leaks and clogs"},
            {"name": "Installs", "description": "Water heaters and fixtures"}
        ],
        "cta_primary": "Call now",
        "meta_title": "Star Plumbers",
        "meta_description": "Plumbing in New York"
    }))
}

pub fn design_output() -> AgentOutput {
    object(json!({
        "global_css": "body { margin: 0; }",
        "header_css": "header { color: navy; }",
        "hero_css": ".hero { padding: 4rem; }",
        "color_scheme": {"primary": "#0a3d62", "secondary": "#e58e26"}
    }))
}

pub fn structure_output() -> AgentOutput {
    object(json!({
        "html_structure": "<!DOCTYPE html><html><body><nav></nav></body></html>",
        "navigation": "<nav></nav>",
        "header": "<header></header>"
    }))
}

pub fn images_output() -> AgentOutput {
    object(json!({
        "hero_image": {"url": "https://images.example/hero.jpg", "alt_description": "plumber at work"},
        "about_image": {"url": "https://images.example/team.jpg", "alt_description": "team"},
        "service_images": [
            {"url": "https://images.example/s1.jpg", "alt_description": "repair"}
        ],
        "background_images": {"url": "https://images.example/bg.jpg", "alt_description": "pipes"}
    }))
}

/// Agents that all succeed on the first attempt.
pub fn healthy_agents() -> AgentSet {
    AgentSet::new(
        ScriptedAgent::ok(AgentKind::Content, content_output()),
        ScriptedAgent::ok(AgentKind::Design, design_output()),
        ScriptedAgent::ok(AgentKind::Structure, structure_output()),
        ScriptedAgent::ok(AgentKind::Image, images_output()),
    )
}

/// Three attempts each, short deterministic backoff.
pub fn fast_policies() -> PipelinePolicies {
    let policy = RetryPolicy::new(3, Duration::from_secs(300))
        .with_backoff_base(Duration::from_millis(10))
        .without_jitter();
    PipelinePolicies {
        content: policy,
        design: policy,
        structure: policy,
        images: RetryPolicy::new(3, Duration::from_secs(60))
            .with_backoff_base(Duration::from_millis(10))
            .without_jitter(),
        run_budget: Duration::from_secs(600),
    }
}

pub struct TestService {
    pub service: GenerationService,
    pub hub: Arc<ProgressHub>,
    pub store: Arc<InMemoryGenerationStore>,
    pub output: TempDir,
}

pub fn test_service(agents: AgentSet, policies: PipelinePolicies) -> TestService {
    let output = TempDir::new().unwrap();
    let hub = ProgressHub::shared();
    let store = Arc::new(InMemoryGenerationStore::new());
    let service = GenerationService::new(
        agents,
        hub.clone(),
        store.clone(),
        ArtifactWriter::new(output.path(), "/uploads/websites"),
        policies,
    );
    TestService {
        service,
        hub,
        store,
        output,
    }
}
