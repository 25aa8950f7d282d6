use crate::error::{AppError, Result};
use crate::ml::classifier::MlpClassifier;
use crate::ml::labels::LabelCodec;
use crate::ml::vectorizer::TfidfVectorizer;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

const VECTORIZER_FILE: &str = "vectorizer.bin";
const LABEL_CODEC_FILE: &str = "label_codec.bin";
const CLASSIFIER_FILE: &str = "classifier.bin";

/// Pointer file naming the bundle directory currently in service.
const CURRENT_POINTER: &str = "CURRENT";

/// Unix timestamp of the last completed training run.
const LAST_TRAINED_FILE: &str = "last_trained";

/// The three fitted pieces a query needs, persisted and loaded as a unit.
#[derive(Debug, Clone)]
pub struct ModelArtifactBundle {
    pub vectorizer: TfidfVectorizer,
    pub label_codec: LabelCodec,
    pub classifier: MlpClassifier,
}

/// Filesystem store for trained model bundles.
///
/// Each save writes a fresh `bundle-<uuid>/` directory and then swaps the
/// `CURRENT` pointer file onto it with an atomic rename, so a concurrent
/// load sees either the old complete bundle or the new one, never a mix.
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Persist a complete bundle and make it current.
    pub fn save(&self, bundle: &ModelArtifactBundle) -> Result<()> {
        let bundle_name = format!("bundle-{}", Uuid::new_v4());
        let bundle_dir = self.root.join(&bundle_name);
        fs::create_dir_all(&bundle_dir)?;

        Self::write_piece(&bundle_dir.join(VECTORIZER_FILE), &bundle.vectorizer)?;
        Self::write_piece(&bundle_dir.join(LABEL_CODEC_FILE), &bundle.label_codec)?;
        Self::write_piece(&bundle_dir.join(CLASSIFIER_FILE), &bundle.classifier)?;

        self.swap_pointer(&bundle_name)?;
        self.record_trained_now()?;
        self.remove_stale_bundles(&bundle_name);

        info!(bundle = %bundle_name, "Model bundle saved");
        Ok(())
    }

    /// Load the current bundle.
    ///
    /// A missing pointer or a missing piece is reported as a missing
    /// artifact naming the specific file, so callers can distinguish
    /// "never trained" from corruption.
    pub fn load(&self) -> Result<ModelArtifactBundle> {
        let pointer = self.root.join(CURRENT_POINTER);
        let bundle_name = fs::read_to_string(&pointer).map_err(|_| {
            AppError::missing_artifact(CURRENT_POINTER, "no trained model is available")
        })?;
        let bundle_dir = self.root.join(bundle_name.trim());

        Ok(ModelArtifactBundle {
            vectorizer: Self::read_piece(&bundle_dir, VECTORIZER_FILE)?,
            label_codec: Self::read_piece(&bundle_dir, LABEL_CODEC_FILE)?,
            classifier: Self::read_piece(&bundle_dir, CLASSIFIER_FILE)?,
        })
    }

    /// Whether a complete current bundle exists.
    pub fn is_available(&self) -> bool {
        self.load().is_ok()
    }

    /// Unix timestamp of the last completed training run, if any.
    pub fn last_trained(&self) -> Option<i64> {
        fs::read_to_string(self.root.join(LAST_TRAINED_FILE))
            .ok()
            .and_then(|raw| raw.trim().parse().ok())
    }

    fn write_piece<T: serde::Serialize>(path: &Path, piece: &T) -> Result<()> {
        let encoded = bincode::serialize(piece)?;
        fs::write(path, encoded)?;
        Ok(())
    }

    fn read_piece<T: serde::de::DeserializeOwned>(bundle_dir: &Path, name: &str) -> Result<T> {
        let raw = fs::read(bundle_dir.join(name))
            .map_err(|_| AppError::missing_artifact(name, "model bundle is incomplete"))?;
        Ok(bincode::deserialize(&raw)?)
    }

    /// Point `CURRENT` at the named bundle via write-to-temp plus rename.
    fn swap_pointer(&self, bundle_name: &str) -> Result<()> {
        let tmp = self.root.join(format!("{}.tmp", CURRENT_POINTER));
        fs::write(&tmp, bundle_name)?;
        fs::rename(&tmp, self.root.join(CURRENT_POINTER))?;
        Ok(())
    }

    fn record_trained_now(&self) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        fs::write(self.root.join(LAST_TRAINED_FILE), now.to_string())?;
        Ok(())
    }

    /// Delete bundle directories the pointer no longer references.
    /// Best-effort; a failed cleanup only leaves garbage behind.
    fn remove_stale_bundles(&self, current: &str) {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not scan model directory for stale bundles: {}", e);
                return;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if name.starts_with("bundle-") && name != current {
                debug!(bundle = %name, "Removing stale model bundle");
                if let Err(e) = fs::remove_dir_all(entry.path()) {
                    warn!(bundle = %name, "Failed to remove stale bundle: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use tempfile::TempDir;

    fn trained_bundle() -> ModelArtifactBundle {
        let mut vectorizer = TfidfVectorizer::new(100);
        vectorizer
            .fit(&[
                "heap overflow in parser".to_string(),
                "credential leak in api".to_string(),
            ])
            .unwrap();

        let label_codec = LabelCodec::fit(&[
            Some("HIGH".to_string()),
            Some("LOW".to_string()),
        ])
        .unwrap();

        let features = Array2::from_shape_vec(
            (4, 2),
            vec![1.0, 0.0, 1.0, 0.1, 0.0, 1.0, 0.1, 1.0],
        )
        .unwrap();
        let mut classifier = MlpClassifier::new(4, 50, 0.5, 42);
        classifier.fit(&features, &[0, 0, 1, 1]).unwrap();

        ModelArtifactBundle {
            vectorizer,
            label_codec,
            classifier,
        }
    }

    #[test]
    fn test_save_then_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();

        assert!(!store.is_available());
        store.save(&trained_bundle()).unwrap();

        let loaded = store.load().unwrap();
        assert!(loaded.classifier.is_trained());
        assert_eq!(loaded.label_codec.n_classes(), 2);
        assert!(loaded.vectorizer.is_fitted());
        assert!(store.last_trained().is_some());
    }

    #[test]
    fn test_load_before_training_names_pointer() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();

        match store.load() {
            Err(AppError::MissingArtifact { artifact, .. }) => {
                assert_eq!(artifact, "CURRENT");
            }
            other => panic!("expected MissingArtifact, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_missing_piece_is_named() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();
        store.save(&trained_bundle()).unwrap();

        // Delete one piece of the current bundle
        let pointer = std::fs::read_to_string(dir.path().join("CURRENT")).unwrap();
        std::fs::remove_file(dir.path().join(pointer.trim()).join("classifier.bin")).unwrap();

        match store.load() {
            Err(AppError::MissingArtifact { artifact, .. }) => {
                assert_eq!(artifact, "classifier.bin");
            }
            other => panic!("expected MissingArtifact, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_resave_replaces_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path()).unwrap();

        store.save(&trained_bundle()).unwrap();
        let first = std::fs::read_to_string(dir.path().join("CURRENT")).unwrap();

        store.save(&trained_bundle()).unwrap();
        let second = std::fs::read_to_string(dir.path().join("CURRENT")).unwrap();

        assert_ne!(first, second);
        assert!(!dir.path().join(first.trim()).exists());
        assert!(store.load().is_ok());
    }
}
