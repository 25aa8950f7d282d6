use crate::error::{AppError, Result};
use crate::ml::artifacts::ArtifactStore;
use crate::ml::classifier::to_dense_matrix;
use crate::ml::preprocess::prepare;
use crate::state::RecordStore;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// One line of a severity report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub identifier: String,
    pub description: String,
    pub predicted_severity: String,
}

/// Result of a report query.
///
/// `NoData` means none of the requested identifiers exist in the store;
/// an empty `Report` means records matched but none had a usable
/// description to classify.
#[derive(Debug, Clone, Serialize)]
pub enum ReportOutcome {
    NoData,
    Report(Vec<ReportEntry>),
}

/// Answers severity queries using the current model bundle.
pub struct QueryEngine {
    store: Arc<dyn RecordStore>,
    artifacts: Arc<ArtifactStore>,
}

impl QueryEngine {
    pub fn new(store: Arc<dyn RecordStore>, artifacts: Arc<ArtifactStore>) -> Self {
        Self { store, artifacts }
    }

    /// Predict severities for the requested identifiers.
    ///
    /// Output entries follow the request order; identifiers with no
    /// stored record are dropped silently. Requires a trained bundle.
    pub async fn report(&self, identifiers: &[String]) -> Result<ReportOutcome> {
        if identifiers.is_empty() {
            return Err(AppError::Validation(
                "at least one identifier is required".to_string(),
            ));
        }

        let records = self.store.get_records(identifiers).await?;
        if records.is_empty() {
            debug!(requested = identifiers.len(), "No matching records");
            return Ok(ReportOutcome::NoData);
        }

        let descriptions: HashMap<String, String> = records
            .iter()
            .map(|record| {
                (
                    record.identifier.clone(),
                    record.description.clone().unwrap_or_default(),
                )
            })
            .collect();

        let processed = prepare(&records);
        if processed.is_empty() {
            return Ok(ReportOutcome::Report(Vec::new()));
        }

        let bundle = self.artifacts.load()?;

        let documents: Vec<String> = processed
            .iter()
            .map(|record| record.combined_text.clone())
            .collect();
        let features = to_dense_matrix(&bundle.vectorizer.transform_batch(&documents)?)?;
        let codes = bundle.classifier.predict(&features)?;
        let severities = bundle.label_codec.decode(&codes)?;

        let entries = processed
            .into_iter()
            .zip(severities)
            .map(|(record, predicted_severity)| {
                let description = descriptions
                    .get(&record.identifier)
                    .cloned()
                    .unwrap_or_default();
                ReportEntry {
                    identifier: record.identifier,
                    description,
                    predicted_severity,
                }
            })
            .collect();

        Ok(ReportOutcome::Report(entries))
    }
}
