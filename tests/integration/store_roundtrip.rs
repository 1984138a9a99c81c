//! Durable generation records: create, update, reopen.

use sitegen::error::{GenerationError, StorageError};
use sitegen::store::{
    GenerationRecord, GenerationStatus, GenerationStore, InMemoryGenerationStore, RecordUpdate,
    SledGenerationStore,
};
use sitegen::types::{AgentKind, GenerationId};
use sitegen::workflow::{GenerationState, Phase};
use tempfile::TempDir;

use crate::integration::{business, content_output};

fn state(id: &str) -> GenerationState {
    GenerationState::new(GenerationId::from(id), business())
}

#[tokio::test]
async fn sled_keeps_error_order_and_stage_outputs() {
    let dir = TempDir::new().unwrap();
    let store = SledGenerationStore::open(dir.path().join("db")).unwrap();

    let mut s = state("gen-order");
    store.create(&GenerationRecord::started(&s)).await.unwrap();

    s.enter(Phase::ContentGenerating).unwrap();
    s.store_output(AgentKind::Content, content_output()).unwrap();
    s.enter(Phase::ParallelGenerating).unwrap();
    s.record_error("Quality validation error: scorer offline");
    s.fail(&GenerationError::Assembly("disk full".to_string()));
    let record = store
        .update(s.generation_id(), RecordUpdate::snapshot(&s))
        .await
        .unwrap();

    assert_eq!(record.status, GenerationStatus::Failed);
    assert_eq!(
        record.errors,
        vec![
            "Quality validation error: scorer offline".to_string(),
            "Final assembly error: disk full".to_string(),
        ]
    );
    assert_eq!(record.content_data, Some(content_output()));
    assert!(record.failed_at.is_some());
    assert!(record.completed_at.is_none());
}

#[tokio::test]
async fn records_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("db");
    let s = state("gen-durable");
    {
        let store = SledGenerationStore::open(&path).unwrap();
        store.create(&GenerationRecord::started(&s)).await.unwrap();
    }

    let store = SledGenerationStore::open(&path).unwrap();
    let record = store.get(s.generation_id()).await.unwrap().unwrap();
    assert_eq!(record.status, GenerationStatus::Started);
    assert_eq!(record.business_info, business());
    assert_eq!(record.to_state().generation_id(), s.generation_id());
}

async fn rejects_unknown_and_duplicate(store: &dyn GenerationStore) {
    let s = state("gen-dup");
    store.create(&GenerationRecord::started(&s)).await.unwrap();
    assert!(matches!(
        store.create(&GenerationRecord::started(&s)).await,
        Err(StorageError::AlreadyExists(_))
    ));

    let missing = GenerationId::from("gen-missing");
    assert!(matches!(
        store.update(&missing, RecordUpdate::default()).await,
        Err(StorageError::NotFound(_))
    ));
    assert!(store.get(&missing).await.unwrap().is_none());
}

#[tokio::test]
async fn both_stores_reject_unknown_and_duplicate_ids() {
    let dir = TempDir::new().unwrap();
    rejects_unknown_and_duplicate(&SledGenerationStore::open(dir.path().join("db")).unwrap()).await;
    rejects_unknown_and_duplicate(&InMemoryGenerationStore::new()).await;
}
