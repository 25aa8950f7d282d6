use crate::error::{AppError, Result};
use crate::models::{RecordUpdate, VulnerabilityRecord, WeaknessEntry};
use crate::state::RecordStore;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;

/// In-memory record store (for tests and ephemeral runs)
#[derive(Clone)]
pub struct InMemoryStore {
    records: Arc<DashMap<String, VulnerabilityRecord>>,
    weaknesses: Arc<DashMap<String, WeaknessEntry>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(DashMap::new()),
            weaknesses: Arc::new(DashMap::new()),
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryStore {
    async fn save_record(&self, record: &VulnerabilityRecord) -> Result<()> {
        self.records
            .insert(record.identifier.clone(), record.clone());
        tracing::debug!(identifier = %record.identifier, "Record saved");
        Ok(())
    }

    async fn get_record(&self, identifier: &str) -> Result<Option<VulnerabilityRecord>> {
        Ok(self.records.get(identifier).map(|entry| entry.clone()))
    }

    async fn update_record(&self, identifier: &str, update: RecordUpdate) -> Result<()> {
        match self.records.get_mut(identifier) {
            Some(mut entry) => {
                entry.apply_update(update);
                tracing::debug!(identifier = %identifier, "Record updated");
                Ok(())
            }
            None => Err(AppError::NotFound(format!(
                "Record {} not found",
                identifier
            ))),
        }
    }

    async fn delete_record(&self, identifier: &str) -> Result<()> {
        if self.records.remove(identifier).is_some() {
            tracing::debug!(identifier = %identifier, "Record deleted");
            Ok(())
        } else {
            Err(AppError::NotFound(format!(
                "Record {} not found",
                identifier
            )))
        }
    }

    async fn list_records(&self) -> Result<Vec<VulnerabilityRecord>> {
        let mut records: Vec<VulnerabilityRecord> = self
            .records
            .iter()
            .map(|entry| entry.value().clone())
            .collect();
        records.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        Ok(records)
    }

    async fn get_records(&self, identifiers: &[String]) -> Result<Vec<VulnerabilityRecord>> {
        Ok(identifiers
            .iter()
            .filter_map(|id| self.records.get(id).map(|entry| entry.clone()))
            .collect())
    }

    async fn count_records(&self) -> Result<u64> {
        Ok(self.records.len() as u64)
    }

    async fn save_weakness(&self, entry: &WeaknessEntry) -> Result<()> {
        self.weaknesses
            .insert(entry.weakness_id.clone(), entry.clone());
        tracing::debug!(weakness_id = %entry.weakness_id, "Weakness saved");
        Ok(())
    }

    async fn get_weakness(&self, weakness_id: &str) -> Result<Option<WeaknessEntry>> {
        Ok(self.weaknesses.get(weakness_id).map(|entry| entry.clone()))
    }

    async fn count_weaknesses(&self) -> Result<u64> {
        Ok(self.weaknesses.len() as u64)
    }
}
