pub mod factory;
pub mod sled_store;
pub mod store;

pub use factory::create_store;
pub use sled_store::SledStore;
pub use store::InMemoryStore;

use crate::error::Result;
use crate::models::{RecordUpdate, VulnerabilityRecord, WeaknessEntry};
use async_trait::async_trait;

/// Trait for vulnerability record storage operations
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Save a record (upsert; last write wins)
    async fn save_record(&self, record: &VulnerabilityRecord) -> Result<()>;

    /// Get a record by identifier
    async fn get_record(&self, identifier: &str) -> Result<Option<VulnerabilityRecord>>;

    /// Apply a partial update to an existing record
    async fn update_record(&self, identifier: &str, update: RecordUpdate) -> Result<()>;

    /// Delete a record
    async fn delete_record(&self, identifier: &str) -> Result<()>;

    /// Load the full record table
    async fn list_records(&self) -> Result<Vec<VulnerabilityRecord>>;

    /// Load the subset matching the given identifiers.
    ///
    /// Identifiers with no matching record are silently omitted.
    async fn get_records(&self, identifiers: &[String]) -> Result<Vec<VulnerabilityRecord>>;

    /// Count stored records
    async fn count_records(&self) -> Result<u64>;

    /// Save a weakness-taxonomy entry (upsert)
    async fn save_weakness(&self, entry: &WeaknessEntry) -> Result<()>;

    /// Get a weakness entry by normalized identifier
    async fn get_weakness(&self, weakness_id: &str) -> Result<Option<WeaknessEntry>>;

    /// Count weakness entries
    async fn count_weaknesses(&self) -> Result<u64>;
}
