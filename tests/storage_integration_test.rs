use std::sync::Arc;
use tempfile::TempDir;
use vulnscope::models::{RecordUpdate, VulnerabilityRecord, WeaknessEntry};
use vulnscope::state::{InMemoryStore, RecordStore, SledStore};

/// Helper to create a test record
fn create_test_record(identifier: &str, severity: &str) -> VulnerabilityRecord {
    VulnerabilityRecord::new(identifier, format!("Description of {}", identifier))
        .with_severity(severity)
        .with_cvss_score(7.5)
}

/// Test suite that runs against any RecordStore implementation
async fn test_store_operations<S: RecordStore + 'static>(store: Arc<S>) {
    // Save and retrieve
    let record = create_test_record("CVE-2023-1111", "HIGH");
    store.save_record(&record).await.unwrap();

    let retrieved = store.get_record("CVE-2023-1111").await.unwrap();
    assert!(retrieved.is_some());
    assert_eq!(retrieved.as_ref().unwrap().severity.as_deref(), Some("HIGH"));

    // Upsert: last write wins
    let replacement = create_test_record("CVE-2023-1111", "LOW");
    store.save_record(&replacement).await.unwrap();
    let retrieved = store.get_record("CVE-2023-1111").await.unwrap().unwrap();
    assert_eq!(retrieved.severity.as_deref(), Some("LOW"));
    assert_eq!(store.count_records().await.unwrap(), 1);

    // Partial update leaves other fields alone
    let update = RecordUpdate {
        severity: Some("CRITICAL".to_string()),
        ..Default::default()
    };
    store.update_record("CVE-2023-1111", update).await.unwrap();
    let updated = store.get_record("CVE-2023-1111").await.unwrap().unwrap();
    assert_eq!(updated.severity.as_deref(), Some("CRITICAL"));
    assert_eq!(updated.cvss_score, Some(7.5));

    // Updating a missing record fails
    let err = store
        .update_record("CVE-0000-0000", RecordUpdate::default())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "NOT_FOUND");

    // Delete
    store.delete_record("CVE-2023-1111").await.unwrap();
    assert!(store.get_record("CVE-2023-1111").await.unwrap().is_none());
}

async fn test_bulk_reads<S: RecordStore + 'static>(store: Arc<S>) {
    for i in 0..10 {
        let severity = if i % 2 == 0 { "HIGH" } else { "LOW" };
        let record = create_test_record(&format!("CVE-2023-{:04}", i), severity);
        store.save_record(&record).await.unwrap();
    }

    // Full table load
    let all = store.list_records().await.unwrap();
    assert_eq!(all.len(), 10);

    // Subset load keeps request order and omits misses silently
    let ids = vec![
        "CVE-2023-0003".to_string(),
        "CVE-9999-9999".to_string(),
        "CVE-2023-0001".to_string(),
    ];
    let subset = store.get_records(&ids).await.unwrap();
    assert_eq!(subset.len(), 2);
    assert_eq!(subset[0].identifier, "CVE-2023-0003");
    assert_eq!(subset[1].identifier, "CVE-2023-0001");

    assert_eq!(store.count_records().await.unwrap(), 10);
}

async fn test_weakness_operations<S: RecordStore + 'static>(store: Arc<S>) {
    let entry = WeaknessEntry {
        weakness_id: "CWE-79".to_string(),
        name: Some("Cross-site Scripting".to_string()),
        description: Some("Improper neutralization of input".to_string()),
        extended_description: None,
        likelihood_of_exploit: Some("High".to_string()),
        common_consequences: None,
        potential_mitigations: None,
        related_weaknesses: None,
        applicable_platforms: None,
    };

    store.save_weakness(&entry).await.unwrap();
    assert_eq!(store.count_weaknesses().await.unwrap(), 1);

    let loaded = store.get_weakness("CWE-79").await.unwrap().unwrap();
    assert_eq!(loaded.name.as_deref(), Some("Cross-site Scripting"));

    assert!(store.get_weakness("CWE-404").await.unwrap().is_none());
}

#[tokio::test]
async fn test_memory_store_operations() {
    test_store_operations(Arc::new(InMemoryStore::new())).await;
}

#[tokio::test]
async fn test_memory_store_bulk_reads() {
    test_bulk_reads(Arc::new(InMemoryStore::new())).await;
}

#[tokio::test]
async fn test_memory_store_weaknesses() {
    test_weakness_operations(Arc::new(InMemoryStore::new())).await;
}

#[tokio::test]
async fn test_sled_store_operations() {
    let dir = TempDir::new().unwrap();
    test_store_operations(Arc::new(SledStore::new(dir.path()).unwrap())).await;
}

#[tokio::test]
async fn test_sled_store_bulk_reads() {
    let dir = TempDir::new().unwrap();
    test_bulk_reads(Arc::new(SledStore::new(dir.path()).unwrap())).await;
}

#[tokio::test]
async fn test_sled_store_weaknesses() {
    let dir = TempDir::new().unwrap();
    test_weakness_operations(Arc::new(SledStore::new(dir.path()).unwrap())).await;
}

#[tokio::test]
async fn test_sled_store_persists_across_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let store = SledStore::new(dir.path()).unwrap();
        store
            .save_record(&create_test_record("CVE-2023-7777", "HIGH"))
            .await
            .unwrap();
        store.flush().await.unwrap();
    }

    let store = SledStore::new(dir.path()).unwrap();
    let record = store.get_record("CVE-2023-7777").await.unwrap();
    assert!(record.is_some());
}
