use crate::config::{StoreBackend, StoreConfig};
use crate::error::Result;
use crate::state::{InMemoryStore, RecordStore, SledStore};
use std::sync::Arc;

/// Create a record store based on configuration
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn RecordStore>> {
    match config.backend {
        StoreBackend::Sled => {
            tracing::info!(path = ?config.path, "Initializing Sled storage backend");
            let store = SledStore::new(&config.path)?;
            Ok(Arc::new(store))
        }

        StoreBackend::Memory => {
            tracing::info!("Initializing in-memory storage backend");
            Ok(Arc::new(InMemoryStore::new()))
        }
    }
}
