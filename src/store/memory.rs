//! Process-local generation store for tests and ephemeral runs.

use crate::error::StorageError;
use crate::store::{GenerationRecord, GenerationStore, RecordUpdate};
use crate::types::GenerationId;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Default)]
pub struct InMemoryGenerationStore {
    records: Mutex<HashMap<GenerationId, GenerationRecord>>,
}

impl InMemoryGenerationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

#[async_trait]
impl GenerationStore for InMemoryGenerationStore {
    async fn create(&self, record: &GenerationRecord) -> Result<(), StorageError> {
        let mut records = self.records.lock();
        if records.contains_key(&record.generation_id) {
            return Err(StorageError::AlreadyExists(record.generation_id.clone()));
        }
        records.insert(record.generation_id.clone(), record.clone());
        Ok(())
    }

    async fn update(
        &self,
        generation_id: &GenerationId,
        update: RecordUpdate,
    ) -> Result<GenerationRecord, StorageError> {
        let mut records = self.records.lock();
        let record = records
            .get_mut(generation_id)
            .ok_or_else(|| StorageError::NotFound(generation_id.clone()))?;
        update.apply(record);
        Ok(record.clone())
    }

    async fn get(&self, generation_id: &GenerationId) -> Result<Option<GenerationRecord>, StorageError> {
        Ok(self.records.lock().get(generation_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BusinessInfo;
    use crate::workflow::state::{GenerationState, Phase};

    #[tokio::test]
    async fn update_returns_latest_record() {
        let store = InMemoryGenerationStore::new();
        let mut state = GenerationState::new(
            GenerationId::from("m"),
            BusinessInfo::new("a", "b", "c"),
        );
        store.create(&GenerationRecord::started(&state)).await.unwrap();
        assert_eq!(store.len(), 1);

        state.enter(Phase::ContentGenerating).unwrap();
        let updated = store
            .update(state.generation_id(), RecordUpdate::snapshot(&state))
            .await
            .unwrap();
        assert_eq!(updated.progress, 20);
        assert_eq!(
            store.get(state.generation_id()).await.unwrap().unwrap(),
            updated
        );
    }
}
