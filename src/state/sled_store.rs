use crate::error::{AppError, Result};
use crate::models::{RecordUpdate, VulnerabilityRecord, WeaknessEntry};
use crate::state::RecordStore;
use async_trait::async_trait;
use sled::Db;
use std::path::Path;
use std::sync::Arc;

/// Persistent record store using the Sled embedded database
#[derive(Clone)]
pub struct SledStore {
    db: Arc<Db>,
    records_tree: sled::Tree,
    weaknesses_tree: sled::Tree,
}

impl SledStore {
    /// Open (or create) a Sled store at the specified path
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref();
        let db = sled::open(&path)
            .map_err(|e| AppError::Database(format!("Failed to open Sled database: {}", e)))?;

        let records_tree = db
            .open_tree("records")
            .map_err(|e| AppError::Database(format!("Failed to open records tree: {}", e)))?;

        let weaknesses_tree = db
            .open_tree("weaknesses")
            .map_err(|e| AppError::Database(format!("Failed to open weaknesses tree: {}", e)))?;

        tracing::info!("Initialized Sled store at {:?}", path_str);

        Ok(Self {
            db: Arc::new(db),
            records_tree,
            weaknesses_tree,
        })
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        bincode::serialize(value)
            .map_err(|e| AppError::Serialization(format!("Failed to serialize: {}", e)))
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        bincode::deserialize(bytes)
            .map_err(|e| AppError::Serialization(format!("Failed to deserialize: {}", e)))
    }

    /// Flush pending writes to disk
    pub async fn flush(&self) -> Result<()> {
        self.db
            .flush_async()
            .await
            .map_err(|e| AppError::Database(format!("Failed to flush database: {}", e)))?;
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SledStore {
    async fn save_record(&self, record: &VulnerabilityRecord) -> Result<()> {
        let value = Self::serialize(record)?;
        self.records_tree
            .insert(record.identifier.as_bytes(), value)
            .map_err(|e| AppError::Database(format!("Failed to save record: {}", e)))?;

        self.records_tree
            .flush()
            .map_err(|e| AppError::Database(format!("Failed to flush records tree: {}", e)))?;

        tracing::debug!(identifier = %record.identifier, "Record saved to Sled");
        Ok(())
    }

    async fn get_record(&self, identifier: &str) -> Result<Option<VulnerabilityRecord>> {
        match self.records_tree.get(identifier.as_bytes()) {
            Ok(Some(bytes)) => Ok(Some(Self::deserialize(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(AppError::Database(format!("Failed to get record: {}", e))),
        }
    }

    async fn update_record(&self, identifier: &str, update: RecordUpdate) -> Result<()> {
        let mut record = self
            .get_record(identifier)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Record {} not found", identifier)))?;

        record.apply_update(update);
        self.save_record(&record).await
    }

    async fn delete_record(&self, identifier: &str) -> Result<()> {
        let removed = self
            .records_tree
            .remove(identifier.as_bytes())
            .map_err(|e| AppError::Database(format!("Failed to delete record: {}", e)))?;

        if removed.is_some() {
            tracing::debug!(identifier = %identifier, "Record deleted from Sled");
            Ok(())
        } else {
            Err(AppError::NotFound(format!(
                "Record {} not found",
                identifier
            )))
        }
    }

    async fn list_records(&self) -> Result<Vec<VulnerabilityRecord>> {
        let mut records = Vec::new();
        for item in self.records_tree.iter() {
            let (_, bytes) =
                item.map_err(|e| AppError::Database(format!("Failed to scan records: {}", e)))?;
            records.push(Self::deserialize(&bytes)?);
        }
        Ok(records)
    }

    async fn get_records(&self, identifiers: &[String]) -> Result<Vec<VulnerabilityRecord>> {
        let mut records = Vec::new();
        for identifier in identifiers {
            if let Some(record) = self.get_record(identifier).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn count_records(&self) -> Result<u64> {
        Ok(self.records_tree.len() as u64)
    }

    async fn save_weakness(&self, entry: &WeaknessEntry) -> Result<()> {
        let value = Self::serialize(entry)?;
        self.weaknesses_tree
            .insert(entry.weakness_id.as_bytes(), value)
            .map_err(|e| AppError::Database(format!("Failed to save weakness: {}", e)))?;

        tracing::debug!(weakness_id = %entry.weakness_id, "Weakness saved to Sled");
        Ok(())
    }

    async fn get_weakness(&self, weakness_id: &str) -> Result<Option<WeaknessEntry>> {
        match self.weaknesses_tree.get(weakness_id.as_bytes()) {
            Ok(Some(bytes)) => Ok(Some(Self::deserialize(&bytes)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(AppError::Database(format!("Failed to get weakness: {}", e))),
        }
    }

    async fn count_weaknesses(&self) -> Result<u64> {
        Ok(self.weaknesses_tree.len() as u64)
    }
}
