pub mod artifacts;
pub mod classifier;
pub mod labels;
pub mod pipeline;
pub mod preprocess;
pub mod vectorizer;

pub use artifacts::{ArtifactStore, ModelArtifactBundle};
pub use classifier::{ClassMetrics, MlpClassifier, ModelMetrics};
pub use labels::{LabelCodec, UNKNOWN_SEVERITY};
pub use pipeline::{TrainingPipeline, TrainingReport};
pub use preprocess::{prepare, PlatformTriple, ProcessedRecord};
pub use vectorizer::{SparseVector, TfidfVectorizer};
