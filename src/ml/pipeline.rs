use crate::config::TrainingConfig;
use crate::error::{AppError, Result};
use crate::ml::artifacts::{ArtifactStore, ModelArtifactBundle};
use crate::ml::classifier::{to_dense_matrix, MlpClassifier, ModelMetrics};
use crate::ml::labels::LabelCodec;
use crate::ml::preprocess::prepare;
use crate::ml::vectorizer::TfidfVectorizer;
use crate::state::RecordStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Summary of a completed training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingReport {
    /// Records in the store when training started
    pub n_records: usize,

    /// Records surviving the description filter
    pub n_trained: usize,

    /// Fitted vocabulary size
    pub vocabulary_size: usize,

    /// Distinct severity classes (sentinel included)
    pub n_classes: usize,

    /// Training-set metrics of the persisted model
    pub metrics: ModelMetrics,
}

/// End-to-end training: pull records from the store, fit the three model
/// pieces, persist them as one bundle, then evaluate what was persisted.
pub struct TrainingPipeline {
    store: Arc<dyn RecordStore>,
    artifacts: Arc<ArtifactStore>,
    config: TrainingConfig,
}

impl TrainingPipeline {
    pub fn new(
        store: Arc<dyn RecordStore>,
        artifacts: Arc<ArtifactStore>,
        config: TrainingConfig,
    ) -> Self {
        Self {
            store,
            artifacts,
            config,
        }
    }

    pub async fn run(&self) -> Result<TrainingReport> {
        let records = self.store.list_records().await?;
        let n_records = records.len();

        let processed = prepare(&records);
        if processed.is_empty() {
            return Err(AppError::Data(
                "no records with usable descriptions to train on".to_string(),
            ));
        }
        info!(
            total = n_records,
            usable = processed.len(),
            "Prepared training records"
        );

        let documents: Vec<String> = processed
            .iter()
            .map(|record| record.combined_text.clone())
            .collect();
        let severities: Vec<Option<String>> = processed
            .iter()
            .map(|record| record.severity.clone())
            .collect();

        let mut vectorizer = TfidfVectorizer::new(self.config.max_vocab_size);
        vectorizer.fit(&documents)?;

        let label_codec = LabelCodec::fit(&severities)?;
        let labels = label_codec.encode(&severities)?;

        let features = to_dense_matrix(&vectorizer.transform_batch(&documents)?)?;

        let mut classifier = MlpClassifier::new(
            self.config.hidden_size,
            self.config.max_epochs,
            self.config.learning_rate,
            self.config.seed,
        );
        classifier.fit(&features, &labels)?;

        // Persist before evaluating so the reported metrics describe
        // exactly the bundle now in service.
        let bundle = ModelArtifactBundle {
            vectorizer,
            label_codec,
            classifier,
        };
        self.artifacts.save(&bundle)?;

        let metrics = bundle.classifier.evaluate(&features, &labels)?;
        info!(
            accuracy = metrics.accuracy,
            f1 = metrics.f1_score,
            "Training completed"
        );

        Ok(TrainingReport {
            n_records,
            n_trained: processed.len(),
            vocabulary_size: bundle.vectorizer.vocabulary_size(),
            n_classes: bundle.label_codec.n_classes(),
            metrics,
        })
    }
}
