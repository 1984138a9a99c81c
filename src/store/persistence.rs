//! Sled-backed generation store.

use crate::error::StorageError;
use crate::store::{GenerationRecord, GenerationStore, RecordUpdate};
use crate::types::GenerationId;
use async_trait::async_trait;
use sled::{Db, Tree};
use std::io;
use std::path::Path;

const TREE_GENERATIONS: &str = "generations";

/// One JSON document per generation, keyed by id.
#[derive(Clone)]
pub struct SledGenerationStore {
    db: Db,
    generations: Tree,
}

impl SledGenerationStore {
    /// Open or create the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path)
            .map_err(|e| StorageError::IoError(io::Error::other(format!("Failed to open sled database: {e}"))))?;
        Self::new(db)
    }

    pub fn new(db: Db) -> Result<Self, StorageError> {
        let generations = db.open_tree(TREE_GENERATIONS).map_err(to_storage_io)?;
        Ok(Self { db, generations })
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    fn read(&self, generation_id: &GenerationId) -> Result<Option<GenerationRecord>, StorageError> {
        let Some(raw) = self
            .generations
            .get(generation_id.as_str().as_bytes())
            .map_err(to_storage_io)?
        else {
            return Ok(None);
        };
        let record = serde_json::from_slice(&raw).map_err(to_storage_data)?;
        Ok(Some(record))
    }

    fn write(&self, record: &GenerationRecord) -> Result<(), StorageError> {
        let value = serde_json::to_vec(record).map_err(to_storage_data)?;
        self.generations
            .insert(record.generation_id.as_str().as_bytes(), value)
            .map_err(to_storage_io)?;
        Ok(())
    }

    async fn flush(&self) -> Result<(), StorageError> {
        self.generations.flush_async().await.map_err(to_storage_io)?;
        Ok(())
    }
}

#[async_trait]
impl GenerationStore for SledGenerationStore {
    async fn create(&self, record: &GenerationRecord) -> Result<(), StorageError> {
        let value = serde_json::to_vec(record).map_err(to_storage_data)?;
        let inserted = self
            .generations
            .compare_and_swap(
                record.generation_id.as_str().as_bytes(),
                None as Option<&[u8]>,
                Some(value),
            )
            .map_err(to_storage_io)?;
        if inserted.is_err() {
            return Err(StorageError::AlreadyExists(record.generation_id.clone()));
        }
        self.flush().await
    }

    async fn update(
        &self,
        generation_id: &GenerationId,
        update: RecordUpdate,
    ) -> Result<GenerationRecord, StorageError> {
        let mut record = self
            .read(generation_id)?
            .ok_or_else(|| StorageError::NotFound(generation_id.clone()))?;
        update.apply(&mut record);
        self.write(&record)?;
        self.flush().await?;
        Ok(record)
    }

    async fn get(&self, generation_id: &GenerationId) -> Result<Option<GenerationRecord>, StorageError> {
        self.read(generation_id)
    }
}

fn to_storage_io(err: sled::Error) -> StorageError {
    StorageError::IoError(io::Error::other(err.to_string()))
}

fn to_storage_data(err: serde_json::Error) -> StorageError {
    StorageError::DataError(err.to_string())
}
