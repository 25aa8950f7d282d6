use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sparse TF-IDF feature vector.
///
/// Dimensionality is fixed by the vocabulary that produced it; the vector
/// is meaningless without that vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SparseVector {
    /// Vocabulary indices with non-zero weight, ascending
    pub indices: Vec<usize>,

    /// Weights aligned with `indices`
    pub values: Vec<f64>,

    /// Vocabulary size
    pub dim: usize,
}

impl SparseVector {
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }
}

/// TF-IDF vectorizer with a bounded vocabulary.
///
/// `fit` selects at most `max_features` terms ranked by global TF-IDF
/// importance (ties broken by first-seen order). `transform` silently
/// ignores terms outside the fitted vocabulary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// Vocabulary cap
    max_features: usize,

    /// Vocabulary: term -> index mapping
    vocabulary: HashMap<String, usize>,

    /// Inverse document frequency per vocabulary index
    idf: Vec<f64>,

    /// Total number of documents seen during fitting
    n_documents: usize,
}

impl TfidfVectorizer {
    pub fn new(max_features: usize) -> Self {
        Self {
            max_features,
            vocabulary: HashMap::new(),
            idf: Vec::new(),
            n_documents: 0,
        }
    }

    /// Fit the vectorizer on the training corpus.
    pub fn fit(&mut self, documents: &[String]) -> Result<()> {
        if documents.is_empty() {
            return Err(AppError::Data(
                "cannot fit vectorizer on an empty corpus".to_string(),
            ));
        }

        self.n_documents = documents.len();

        // order preserves first-seen corpus position for deterministic tie-breaks
        let mut order: HashMap<String, usize> = HashMap::new();
        let mut document_frequency: HashMap<String, usize> = HashMap::new();
        let mut total_frequency: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let tokens = Self::tokenize(doc);
            let mut seen_in_doc: std::collections::HashSet<&str> = std::collections::HashSet::new();

            for token in &tokens {
                *total_frequency.entry(token.clone()).or_insert(0) += 1;
                if seen_in_doc.insert(token) {
                    *document_frequency.entry(token.clone()).or_insert(0) += 1;
                }
                let next = order.len();
                order.entry(token.clone()).or_insert(next);
            }
        }

        let n_docs = self.n_documents as f64;
        let smoothed_idf = |df: usize| ((n_docs + 1.0) / (df as f64 + 1.0)).ln() + 1.0;

        // Rank by global importance (total term frequency x IDF), ties by
        // first-seen order, then cap the vocabulary.
        let mut ranked: Vec<(&String, f64)> = total_frequency
            .iter()
            .map(|(term, &tf)| {
                let df = document_frequency[term];
                (term, tf as f64 * smoothed_idf(df))
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| order[a.0.as_str()].cmp(&order[b.0.as_str()]))
        });
        ranked.truncate(self.max_features);

        // Assign indices in first-seen order among the selected terms so
        // refits over the same corpus produce identical vector layouts.
        let mut selected: Vec<String> = ranked.into_iter().map(|(term, _)| term.clone()).collect();
        selected.sort_by_key(|term| order[term.as_str()]);

        self.vocabulary = selected
            .iter()
            .enumerate()
            .map(|(idx, term)| (term.clone(), idx))
            .collect();

        self.idf = vec![0.0; self.vocabulary.len()];
        for (term, &idx) in &self.vocabulary {
            self.idf[idx] = smoothed_idf(document_frequency[term]);
        }

        Ok(())
    }

    /// Transform one document into a sparse TF-IDF vector.
    ///
    /// Out-of-vocabulary terms contribute nothing; this is deliberate
    /// lossy behavior, not an error.
    pub fn transform(&self, document: &str) -> Result<SparseVector> {
        if self.vocabulary.is_empty() {
            return Err(AppError::Data(
                "vectorizer must be fitted before transform".to_string(),
            ));
        }

        let tokens = Self::tokenize(document);
        let mut counts: HashMap<usize, f64> = HashMap::new();

        for token in &tokens {
            if let Some(&idx) = self.vocabulary.get(token) {
                *counts.entry(idx).or_insert(0.0) += 1.0;
            }
        }

        let doc_length = tokens.len() as f64;
        let mut entries: Vec<(usize, f64)> = counts
            .into_iter()
            .map(|(idx, count)| (idx, count / doc_length.max(1.0) * self.idf[idx]))
            .collect();
        entries.sort_by_key(|(idx, _)| *idx);

        let (indices, values) = entries.into_iter().unzip();

        Ok(SparseVector {
            indices,
            values,
            dim: self.vocabulary.len(),
        })
    }

    /// Transform a batch of documents.
    pub fn transform_batch(&self, documents: &[String]) -> Result<Vec<SparseVector>> {
        documents.iter().map(|doc| self.transform(doc)).collect()
    }

    /// Lowercase and split on whitespace and punctuation.
    fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Size of the fitted vocabulary
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Whether `fit` has been called
    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }
}
