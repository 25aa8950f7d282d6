use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

/// Sentinel substituted for absent severity values.
pub const UNKNOWN_SEVERITY: &str = "UNKNOWN";

/// Bidirectional mapping between severity strings and dense integer codes.
///
/// Codes are assigned by lexicographic label order starting at 0, so
/// round-trips are reproducible across processes and refits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabelCodec {
    /// Distinct labels, lexicographically sorted; index is the code
    classes: Vec<String>,
}

impl LabelCodec {
    /// Fit the codec on the label column; missing values become the sentinel.
    pub fn fit(labels: &[Option<String>]) -> Result<Self> {
        if labels.is_empty() {
            return Err(AppError::Data(
                "cannot fit label codec on an empty label set".to_string(),
            ));
        }

        let mut classes: Vec<String> = labels
            .iter()
            .map(|label| Self::sentinel_or(label.as_deref()))
            .collect();
        classes.sort();
        classes.dedup();

        Ok(Self { classes })
    }

    fn sentinel_or(label: Option<&str>) -> String {
        match label {
            Some(label) if !label.trim().is_empty() => label.to_string(),
            _ => UNKNOWN_SEVERITY.to_string(),
        }
    }

    /// Encode one label (missing values become the sentinel).
    pub fn encode_one(&self, label: Option<&str>) -> Result<usize> {
        let label = Self::sentinel_or(label);
        self.classes
            .binary_search(&label)
            .map_err(|_| AppError::Data(format!("label '{}' was not fitted", label)))
    }

    /// Encode a label column into dense codes.
    pub fn encode(&self, labels: &[Option<String>]) -> Result<Vec<usize>> {
        labels
            .iter()
            .map(|label| self.encode_one(label.as_deref()))
            .collect()
    }

    /// Decode one code back to its label.
    pub fn decode_one(&self, code: usize) -> Result<&str> {
        self.classes
            .get(code)
            .map(String::as_str)
            .ok_or(AppError::UnknownCode(code))
    }

    /// Decode a code column back to labels.
    pub fn decode(&self, codes: &[usize]) -> Result<Vec<String>> {
        codes
            .iter()
            .map(|&code| self.decode_one(code).map(str::to_string))
            .collect()
    }

    /// Number of distinct fitted classes
    pub fn n_classes(&self) -> usize {
        self.classes.len()
    }

    /// Fitted classes in code order
    pub fn classes(&self) -> &[String] {
        &self.classes
    }
}
