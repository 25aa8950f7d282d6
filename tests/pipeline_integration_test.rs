use std::sync::Arc;
use tempfile::TempDir;
use vulnscope::config::TrainingConfig;
use vulnscope::error::AppError;
use vulnscope::ml::artifacts::ArtifactStore;
use vulnscope::ml::pipeline::TrainingPipeline;
use vulnscope::models::VulnerabilityRecord;
use vulnscope::query::{QueryEngine, ReportOutcome};
use vulnscope::state::{InMemoryStore, RecordStore};

fn training_corpus() -> Vec<VulnerabilityRecord> {
    vec![
        VulnerabilityRecord::new(
            "CVE-2023-0001",
            "heap buffer overflow allows remote code execution in kernel driver",
        )
        .with_severity("HIGH"),
        VulnerabilityRecord::new(
            "CVE-2023-0002",
            "stack buffer overflow in kernel module enables code execution",
        )
        .with_severity("HIGH"),
        VulnerabilityRecord::new(
            "CVE-2023-0003",
            "buffer overflow in network driver leads to remote execution",
        )
        .with_severity("HIGH"),
        VulnerabilityRecord::new(
            "CVE-2023-0004",
            "verbose error page discloses internal stack trace to visitors",
        )
        .with_severity("LOW"),
        VulnerabilityRecord::new(
            "CVE-2023-0005",
            "debug endpoint discloses version banner information",
        )
        .with_severity("LOW"),
        VulnerabilityRecord::new(
            "CVE-2023-0006",
            "status page discloses internal hostname information to visitors",
        )
        .with_severity("LOW"),
    ]
}

async fn seeded_store() -> Arc<dyn RecordStore> {
    let store: Arc<dyn RecordStore> = Arc::new(InMemoryStore::new());
    for record in training_corpus() {
        store.save_record(&record).await.unwrap();
    }
    store
}

#[tokio::test]
async fn test_train_then_query_round_trip() {
    let store = seeded_store().await;
    let dir = TempDir::new().unwrap();
    let artifacts = Arc::new(ArtifactStore::new(dir.path()).unwrap());

    let report = TrainingPipeline::new(store.clone(), artifacts.clone(), TrainingConfig::default())
        .run()
        .await
        .unwrap();

    assert_eq!(report.n_records, 6);
    assert_eq!(report.n_trained, 6);
    assert_eq!(report.n_classes, 2);
    assert!(report.metrics.accuracy > 0.5);
    assert!(artifacts.last_trained().is_some());

    let engine = QueryEngine::new(store, artifacts);
    let outcome = engine
        .report(&["CVE-2023-0001".to_string(), "CVE-2023-0004".to_string()])
        .await
        .unwrap();

    match outcome {
        ReportOutcome::Report(entries) => {
            assert_eq!(entries.len(), 2);
            assert_eq!(entries[0].identifier, "CVE-2023-0001");
            assert_eq!(entries[1].identifier, "CVE-2023-0004");
            for entry in &entries {
                assert!(["HIGH", "LOW"].contains(&entry.predicted_severity.as_str()));
            }
        }
        ReportOutcome::NoData => panic!("expected a report"),
    }
}

#[tokio::test]
async fn test_dominant_label_is_reproduced() {
    let store: Arc<dyn RecordStore> = Arc::new(InMemoryStore::new());
    store
        .save_record(
            &VulnerabilityRecord::new("CVE-2023-0001", "Buffer overflow in X")
                .with_severity("HIGH"),
        )
        .await
        .unwrap();
    for (i, text) in [
        "Buffer overflow in Y",
        "Buffer overflow in the Z parser",
        "Buffer overflow when handling long names",
    ]
    .iter()
    .enumerate()
    {
        store
            .save_record(
                &VulnerabilityRecord::new(format!("CVE-2023-010{}", i), *text)
                    .with_severity("HIGH"),
            )
            .await
            .unwrap();
    }
    // Second class so the fit is non-degenerate
    store
        .save_record(
            &VulnerabilityRecord::new("CVE-2023-0200", "verbose banner disclosure")
                .with_severity("LOW"),
        )
        .await
        .unwrap();

    let dir = TempDir::new().unwrap();
    let artifacts = Arc::new(ArtifactStore::new(dir.path()).unwrap());
    TrainingPipeline::new(store.clone(), artifacts.clone(), TrainingConfig::default())
        .run()
        .await
        .unwrap();

    let engine = QueryEngine::new(store, artifacts);
    match engine
        .report(&["CVE-2023-0001".to_string()])
        .await
        .unwrap()
    {
        ReportOutcome::Report(entries) => {
            assert_eq!(entries[0].predicted_severity, "HIGH");
            assert_eq!(entries[0].description, "Buffer overflow in X");
        }
        ReportOutcome::NoData => panic!("expected a report"),
    }
}

#[tokio::test]
async fn test_training_twice_gives_identical_predictions() {
    let query_ids: Vec<String> = (1..=6).map(|i| format!("CVE-2023-{:04}", i)).collect();

    let mut runs = Vec::new();
    for _ in 0..2 {
        let store = seeded_store().await;
        let dir = TempDir::new().unwrap();
        let artifacts = Arc::new(ArtifactStore::new(dir.path()).unwrap());

        TrainingPipeline::new(store.clone(), artifacts.clone(), TrainingConfig::default())
            .run()
            .await
            .unwrap();

        let engine = QueryEngine::new(store, artifacts);
        match engine.report(&query_ids).await.unwrap() {
            ReportOutcome::Report(entries) => {
                let severities: Vec<String> = entries
                    .into_iter()
                    .map(|entry| entry.predicted_severity)
                    .collect();
                runs.push(severities);
            }
            ReportOutcome::NoData => panic!("expected a report"),
        }
    }

    assert_eq!(runs[0], runs[1]);
}

#[tokio::test]
async fn test_unmatched_query_reports_no_data() {
    let store = seeded_store().await;
    let dir = TempDir::new().unwrap();
    let artifacts = Arc::new(ArtifactStore::new(dir.path()).unwrap());

    TrainingPipeline::new(store.clone(), artifacts.clone(), TrainingConfig::default())
        .run()
        .await
        .unwrap();

    let engine = QueryEngine::new(store, artifacts);
    let outcome = engine
        .report(&["CVE-9999-9999".to_string()])
        .await
        .unwrap();
    assert!(matches!(outcome, ReportOutcome::NoData));
}

#[tokio::test]
async fn test_query_before_training_names_missing_artifact() {
    let store = seeded_store().await;
    let dir = TempDir::new().unwrap();
    let artifacts = Arc::new(ArtifactStore::new(dir.path()).unwrap());

    let engine = QueryEngine::new(store, artifacts);
    let err = engine
        .report(&["CVE-2023-0001".to_string()])
        .await
        .unwrap_err();

    match err {
        AppError::MissingArtifact { artifact, .. } => assert!(!artifact.is_empty()),
        other => panic!("expected MissingArtifact, got {}", other),
    }
}

#[tokio::test]
async fn test_retraining_replaces_the_served_bundle() {
    let store = seeded_store().await;
    let dir = TempDir::new().unwrap();
    let artifacts = Arc::new(ArtifactStore::new(dir.path()).unwrap());

    let pipeline =
        TrainingPipeline::new(store.clone(), artifacts.clone(), TrainingConfig::default());
    pipeline.run().await.unwrap();
    let first_trained = artifacts.last_trained().unwrap();

    // Grow the corpus and retrain
    store
        .save_record(
            &VulnerabilityRecord::new(
                "CVE-2023-0007",
                "use after free in renderer allows code execution",
            )
            .with_severity("HIGH"),
        )
        .await
        .unwrap();

    let report = pipeline.run().await.unwrap();
    assert_eq!(report.n_trained, 7);
    assert!(artifacts.last_trained().unwrap() >= first_trained);

    // The new bundle still serves queries
    let engine = QueryEngine::new(store, artifacts);
    let outcome = engine
        .report(&["CVE-2023-0007".to_string()])
        .await
        .unwrap();
    assert!(matches!(outcome, ReportOutcome::Report(_)));
}

#[tokio::test]
async fn test_training_single_class_corpus_fails() {
    let store: Arc<dyn RecordStore> = Arc::new(InMemoryStore::new());
    for i in 0..3 {
        store
            .save_record(
                &VulnerabilityRecord::new(format!("CVE-2023-{:04}", i), "buffer overflow")
                    .with_severity("HIGH"),
            )
            .await
            .unwrap();
    }

    let dir = TempDir::new().unwrap();
    let artifacts = Arc::new(ArtifactStore::new(dir.path()).unwrap());
    let err = TrainingPipeline::new(store, artifacts.clone(), TrainingConfig::default())
        .run()
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "TRAINING_ERROR");
    assert!(!artifacts.is_available());
}

#[tokio::test]
async fn test_unlabeled_records_train_under_the_sentinel() {
    let store: Arc<dyn RecordStore> = Arc::new(InMemoryStore::new());
    for record in training_corpus() {
        store.save_record(&record).await.unwrap();
    }
    store
        .save_record(&VulnerabilityRecord::new(
            "CVE-2023-0008",
            "unlabeled report of memory corruption",
        ))
        .await
        .unwrap();

    let dir = TempDir::new().unwrap();
    let artifacts = Arc::new(ArtifactStore::new(dir.path()).unwrap());
    let report = TrainingPipeline::new(store, artifacts, TrainingConfig::default())
        .run()
        .await
        .unwrap();

    // HIGH, LOW, and the UNKNOWN sentinel
    assert_eq!(report.n_classes, 3);
    assert_eq!(report.n_trained, 7);
}
