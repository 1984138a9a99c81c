//! Result retrieval, validation of requests, and cancellation through the service.

use sitegen::agent::AgentSet;
use sitegen::error::ApiError;
use sitegen::store::GenerationStatus;
use sitegen::types::{AgentKind, BusinessInfo, GenerationId};
use std::time::Duration;

use crate::integration::{
    business, content_output, design_output, fast_policies, healthy_agents, images_output,
    structure_output, test_service, ScriptedAgent,
};

#[tokio::test]
async fn completed_generation_returns_website_and_report() {
    let t = test_service(healthy_agents(), fast_policies());
    let id = t.service.start(business()).await.unwrap();
    t.service.wait(&id).await.unwrap();

    let result = t.service.result(&id).await.unwrap();
    let site = &result.final_website;
    assert_eq!(site.website_url, format!("/uploads/websites/{}/index.html", id));
    assert!(site.html_content.contains("Star Plumbers, NY"));
    assert!(site.html_content.contains("Plumbing you can trust"));
    assert!(site.css_content.contains("#0a3d62"));
    assert_eq!(site.metadata.generation_id, id);
    assert_eq!(site.images.len(), 4);

    let report = result.quality_report.unwrap();
    assert_eq!(report.overall_score, site.metadata.quality_score);

    let written = t
        .output
        .path()
        .join("websites")
        .join(id.as_str())
        .join("index.html");
    assert_eq!(std::fs::read_to_string(written).unwrap(), site.html_content);
}

#[tokio::test]
async fn blank_business_fields_are_rejected_before_any_work() {
    let t = test_service(healthy_agents(), fast_policies());
    let err = t
        .service
        .start(BusinessInfo::new("Star Plumbers, NY", " ", "Pipes"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidRequest(msg) if msg.contains("category")));
    assert!(t.store.is_empty());
}

#[tokio::test(start_paused = true)]
async fn running_generation_is_not_completed_and_can_be_cancelled() {
    let agents = AgentSet::new(
        ScriptedAgent::slow(AgentKind::Content, content_output(), Duration::from_secs(120)),
        ScriptedAgent::ok(AgentKind::Design, design_output()),
        ScriptedAgent::ok(AgentKind::Structure, structure_output()),
        ScriptedAgent::ok(AgentKind::Image, images_output()),
    );
    let t = test_service(agents, fast_policies());
    let id = t.service.start(business()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    assert!(t.service.is_running(&id));
    assert!(matches!(
        t.service.result(&id).await.unwrap_err(),
        ApiError::NotCompleted { status, .. } if status == "started"
    ));

    assert!(t.service.cancel(&id));
    let summary = t.service.wait(&id).await.unwrap();
    assert_eq!(summary.status, GenerationStatus::Cancelled);
    assert_eq!(summary.errors, vec!["Generation was cancelled".to_string()]);
    assert!(summary.failed_at.is_some());
    assert!(matches!(
        t.service.result(&id).await.unwrap_err(),
        ApiError::Cancelled(_)
    ));
    assert!(!t.service.cancel(&id));
}

#[tokio::test]
async fn unknown_generation_is_not_found() {
    let t = test_service(healthy_agents(), fast_policies());
    let id = GenerationId::from("does-not-exist");
    assert!(matches!(t.service.status(&id).await, Err(ApiError::NotFound(_))));
    assert!(!t.service.cancel(&id));
}
