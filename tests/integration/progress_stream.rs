//! Live progress delivery, catch-up on late subscribe, and observer cleanup.

use sitegen::progress::{
    ChannelObserver, DeliveryError, EventKind, ProgressEvent, ProgressHub, ProgressObserver,
    ProgressSink, ProgressSnapshot,
};
use sitegen::store::GenerationStatus;
use sitegen::types::GenerationId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::integration::{business, fast_policies, healthy_agents, test_service};

async fn collect_until_complete(events: &mut UnboundedReceiver<ProgressEvent>) -> Vec<ProgressEvent> {
    let mut seen = Vec::new();
    loop {
        let event = tokio::time::timeout(Duration::from_secs(30), events.recv())
            .await
            .expect("event stream stalled")
            .expect("observer dropped");
        let done = event.kind == EventKind::GenerationComplete;
        seen.push(event);
        if done {
            return seen;
        }
    }
}

#[tokio::test]
async fn subscriber_sees_monotonic_progress_and_completion() {
    let t = test_service(healthy_agents(), fast_policies());
    let id = t.service.start(business()).await.unwrap();
    let (observer, mut events) = ChannelObserver::pair();
    t.service.subscribe(&id, Arc::new(observer)).await.unwrap();

    let seen = collect_until_complete(&mut events).await;

    let progress: Vec<u8> = seen.iter().filter_map(|e| e.progress).collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]), "progress went backwards: {progress:?}");
    assert_eq!(progress.last(), Some(&100));

    let complete = seen.last().unwrap();
    assert_eq!(complete.status.as_deref(), Some("completed"));
    assert!(complete.quality_score.unwrap() > 0.0);
    assert!(seen.iter().all(|e| e.generation_id == id));
}

#[tokio::test]
async fn late_subscriber_is_caught_up_from_store() {
    let t = test_service(healthy_agents(), fast_policies());
    let id = t.service.start(business()).await.unwrap();
    let summary = t.service.wait(&id).await.unwrap();
    assert_eq!(summary.status, GenerationStatus::Completed);

    let (observer, mut events) = ChannelObserver::pair();
    t.service.subscribe(&id, Arc::new(observer)).await.unwrap();

    let catch_up = events.try_recv().unwrap();
    assert_eq!(catch_up.kind, EventKind::ProgressUpdate);
    assert_eq!(catch_up.progress, Some(100));
    assert_eq!(catch_up.step.as_deref(), Some("Completed"));
}

#[tokio::test]
async fn subscribe_to_unknown_generation_is_rejected() {
    let t = test_service(healthy_agents(), fast_policies());
    let (observer, _events) = ChannelObserver::pair();
    let err = t
        .service
        .subscribe(&GenerationId::from("unknown"), Arc::new(observer))
        .await
        .unwrap_err();
    assert!(matches!(err, sitegen::error::ApiError::NotFound(_)));
}

struct BrokenObserver;

impl ProgressObserver for BrokenObserver {
    fn deliver(&self, _event: &ProgressEvent) -> Result<(), DeliveryError> {
        Err(DeliveryError::Failed("socket closed".to_string()))
    }
}

#[test]
fn failing_observer_is_dropped_without_blocking_others() {
    let hub = ProgressHub::new();
    let id = GenerationId::from("g-1");
    let (healthy, mut events) = ChannelObserver::pair();
    hub.subscribe(&id, Arc::new(BrokenObserver), None).unwrap();
    hub.subscribe(&id, Arc::new(healthy), None).unwrap();
    assert_eq!(hub.subscriber_count(&id), 2);

    hub.publish(&id, ProgressEvent::progress_update(&id, 20, "Content Generation"));

    assert_eq!(hub.subscriber_count(&id), 1);
    assert_eq!(events.try_recv().unwrap().progress, Some(20));
}

#[test]
fn publish_without_subscribers_retains_nothing() {
    let hub = ProgressHub::new();
    let id = GenerationId::from("nobody-listening");
    hub.publish(&id, ProgressEvent::error(&id, "Content Generation", "boom"));
    assert_eq!(hub.tracked_generations(), 0);

    // A later subscriber only sees the catch-up, never the earlier event.
    let (observer, mut events) = ChannelObserver::pair();
    hub.subscribe(
        &id,
        Arc::new(observer),
        Some(ProgressSnapshot {
            progress: 20,
            step: "Content Generation".to_string(),
        }),
    )
    .unwrap();
    assert_eq!(events.try_recv().unwrap().kind, EventKind::ProgressUpdate);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn finished_generations_release_their_observers() {
    let t = test_service(healthy_agents(), fast_policies());
    let mut receivers = Vec::new();
    let mut ids = Vec::new();
    for _ in 0..5 {
        let id = t.service.start(business()).await.unwrap();
        let (observer, events) = ChannelObserver::pair();
        t.service.subscribe(&id, Arc::new(observer)).await.unwrap();
        receivers.push(events);
        ids.push(id);
    }
    for id in &ids {
        t.service.wait(id).await.unwrap();
    }

    assert_eq!(t.hub.tracked_generations(), 0);
    for events in &mut receivers {
        let seen = collect_until_complete(events).await;
        assert_eq!(seen.last().unwrap().kind, EventKind::GenerationComplete);
    }

    // Subscribing after the run ended delivers the catch-up and keeps nothing.
    let (observer, mut late) = ChannelObserver::pair();
    t.service.subscribe(&ids[0], Arc::new(observer)).await.unwrap();
    assert_eq!(late.try_recv().unwrap().progress, Some(100));
    assert_eq!(t.hub.tracked_generations(), 0);
}
