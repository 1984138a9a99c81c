//! Stage failure propagation through the full service.

use sitegen::agent::AgentSet;
use sitegen::error::ApiError;
use sitegen::store::{GenerationStatus, GenerationStore};
use sitegen::types::AgentKind;
use std::time::Duration;

use crate::integration::{
    business, content_output, design_output, fast_policies, images_output, structure_output,
    test_service, ScriptedAgent,
};

#[tokio::test]
async fn exhausted_structure_fails_generation_and_keeps_content() {
    let structure = ScriptedAgent::always_failing(AgentKind::Structure);
    let agents = AgentSet::new(
        ScriptedAgent::ok(AgentKind::Content, content_output()),
        ScriptedAgent::ok(AgentKind::Design, design_output()),
        structure.clone(),
        ScriptedAgent::ok(AgentKind::Image, images_output()),
    );
    let t = test_service(agents, fast_policies());

    let id = t.service.start(business()).await.unwrap();
    let summary = t.service.wait(&id).await.unwrap();

    assert_eq!(summary.status, GenerationStatus::Failed);
    assert_eq!(summary.errors.len(), 1);
    assert!(summary.errors[0].starts_with("Structure generation failed"));
    assert!(summary.errors[0].contains("3 attempts"));
    assert_eq!(structure.calls(), 3);

    let record = t.store.get(&id).await.unwrap().unwrap();
    assert_eq!(record.content_data, Some(content_output()));
    assert!(record.final_website.is_none());
    assert_eq!(record.current_step, "Design & Structure Generation");
}

#[tokio::test]
async fn exhausted_images_fail_generation() {
    let agents = AgentSet::new(
        ScriptedAgent::ok(AgentKind::Content, content_output()),
        ScriptedAgent::ok(AgentKind::Design, design_output()),
        ScriptedAgent::ok(AgentKind::Structure, structure_output()),
        ScriptedAgent::always_failing(AgentKind::Image),
    );
    let t = test_service(agents, fast_policies());

    let id = t.service.start(business()).await.unwrap();
    t.service.wait(&id).await.unwrap();

    match t.service.result(&id).await.unwrap_err() {
        ApiError::GenerationFailed { errors } => {
            assert!(errors[0].starts_with("Image generation failed"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn downstream_agents_receive_content_output() {
    let design = ScriptedAgent::ok(AgentKind::Design, design_output());
    let structure = ScriptedAgent::ok(AgentKind::Structure, structure_output());
    let content = ScriptedAgent::ok(AgentKind::Content, content_output());
    let agents = AgentSet::new(
        content.clone(),
        design.clone(),
        structure.clone(),
        ScriptedAgent::ok(AgentKind::Image, images_output()),
    );
    let t = test_service(agents, fast_policies());

    let id = t.service.start(business()).await.unwrap();
    let summary = t.service.wait(&id).await.unwrap();

    assert_eq!(summary.status, GenerationStatus::Completed);
    assert_eq!(content.upstream_seen(), vec![None]);
    assert_eq!(design.upstream_seen(), vec![Some(content_output())]);
    assert_eq!(structure.upstream_seen(), vec![Some(content_output())]);
}

#[tokio::test(start_paused = true)]
async fn parallel_agents_run_concurrently() {
    let delay = Duration::from_secs(30);
    let agents = AgentSet::new(
        ScriptedAgent::ok(AgentKind::Content, content_output()),
        ScriptedAgent::slow(AgentKind::Design, design_output(), delay),
        ScriptedAgent::slow(AgentKind::Structure, structure_output(), delay),
        ScriptedAgent::slow(AgentKind::Image, images_output(), delay),
    );
    let t = test_service(agents, fast_policies());

    let started = tokio::time::Instant::now();
    let id = t.service.start(business()).await.unwrap();
    let summary = t.service.wait(&id).await.unwrap();

    assert_eq!(summary.status, GenerationStatus::Completed);
    assert!(started.elapsed() < delay * 2, "stage took {:?}", started.elapsed());
}

#[tokio::test(start_paused = true)]
async fn slow_attempts_time_out_and_exhaust() {
    let mut policies = fast_policies();
    policies.images = sitegen::retry::RetryPolicy::new(2, Duration::from_secs(60))
        .with_backoff_base(Duration::from_millis(10))
        .without_jitter();
    let images = ScriptedAgent::slow(AgentKind::Image, images_output(), Duration::from_secs(90));
    let agents = AgentSet::new(
        ScriptedAgent::ok(AgentKind::Content, content_output()),
        ScriptedAgent::ok(AgentKind::Design, design_output()),
        ScriptedAgent::ok(AgentKind::Structure, structure_output()),
        images.clone(),
    );
    let t = test_service(agents, policies);

    let id = t.service.start(business()).await.unwrap();
    let summary = t.service.wait(&id).await.unwrap();

    assert_eq!(summary.status, GenerationStatus::Failed);
    assert_eq!(images.calls(), 2);
    assert!(summary.errors[0].contains("timed out"));
}
