use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One vulnerability record, keyed by its stable public identifier.
///
/// The identifier uniquely keys exactly one record; updates are last write
/// wins. Numeric sub-scores that failed to parse upstream are stored as
/// `None` rather than rejecting the record.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct VulnerabilityRecord {
    /// Stable public identifier (e.g. "CVE-2023-0001")
    #[validate(length(min = 1, max = 64))]
    pub identifier: String,

    /// Free-text description
    pub description: Option<String>,

    /// Assigning organization
    pub assigner: Option<String>,

    /// Cross-reference into the weakness taxonomy ("CWE-<n>")
    pub weakness_id: Option<String>,

    /// CVSS vector string
    pub vector_string: Option<String>,

    /// CVSS base score
    pub cvss_score: Option<f64>,

    /// Severity label (may be absent; training substitutes a sentinel)
    pub severity: Option<String>,

    /// Exploitability sub-score
    pub exploitability_score: Option<f64>,

    /// Impact sub-score
    pub impact_score: Option<f64>,

    /// Whether user interaction is required
    pub user_interaction: Option<String>,

    /// Privilege escalation indicator
    pub privilege_escalation: Option<String>,

    /// Structured platform string (colon-delimited CPE)
    pub platform: Option<String>,

    /// Reference URLs as their stored list-like textual encoding
    pub references_json: Option<String>,

    /// Publication timestamp
    pub published_at: Option<DateTime<Utc>>,

    /// Last modification timestamp
    pub modified_at: Option<DateTime<Utc>>,
}

impl VulnerabilityRecord {
    /// Create a minimal record with just an identifier and description.
    pub fn new(identifier: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            description: Some(description.into()),
            assigner: None,
            weakness_id: None,
            vector_string: None,
            cvss_score: None,
            severity: None,
            exploitability_score: None,
            impact_score: None,
            user_interaction: None,
            privilege_escalation: None,
            platform: None,
            references_json: None,
            published_at: None,
            modified_at: None,
        }
    }

    pub fn with_severity(mut self, severity: impl Into<String>) -> Self {
        self.severity = Some(severity.into());
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_references_json(mut self, references_json: impl Into<String>) -> Self {
        self.references_json = Some(references_json.into());
        self
    }

    pub fn with_cvss_score(mut self, score: f64) -> Self {
        self.cvss_score = Some(score);
        self
    }

    /// Apply a typed partial update; `None` fields are left unchanged.
    pub fn apply_update(&mut self, update: RecordUpdate) {
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(assigner) = update.assigner {
            self.assigner = Some(assigner);
        }
        if let Some(weakness_id) = update.weakness_id {
            self.weakness_id = Some(weakness_id);
        }
        if let Some(vector_string) = update.vector_string {
            self.vector_string = Some(vector_string);
        }
        if let Some(cvss_score) = update.cvss_score {
            self.cvss_score = Some(cvss_score);
        }
        if let Some(severity) = update.severity {
            self.severity = Some(severity);
        }
        if let Some(exploitability_score) = update.exploitability_score {
            self.exploitability_score = Some(exploitability_score);
        }
        if let Some(impact_score) = update.impact_score {
            self.impact_score = Some(impact_score);
        }
        if let Some(platform) = update.platform {
            self.platform = Some(platform);
        }
        if let Some(references_json) = update.references_json {
            self.references_json = Some(references_json);
        }
        self.modified_at = Some(Utc::now());
    }
}

/// Explicit schema for record updates: field name -> optional typed value.
///
/// Replaces free-form string-keyed field maps; validation happens at the
/// boundary, and an absent field means "leave unchanged".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordUpdate {
    pub description: Option<String>,
    pub assigner: Option<String>,
    pub weakness_id: Option<String>,
    pub vector_string: Option<String>,
    pub cvss_score: Option<f64>,
    pub severity: Option<String>,
    pub exploitability_score: Option<f64>,
    pub impact_score: Option<f64>,
    pub platform: Option<String>,
    pub references_json: Option<String>,
}

impl RecordUpdate {
    /// True when no field is set (nothing to apply).
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.assigner.is_none()
            && self.weakness_id.is_none()
            && self.vector_string.is_none()
            && self.cvss_score.is_none()
            && self.severity.is_none()
            && self.exploitability_score.is_none()
            && self.impact_score.is_none()
            && self.platform.is_none()
            && self.references_json.is_none()
    }
}
