use serde::{Deserialize, Serialize};

/// One weakness-taxonomy entry, keyed by its normalized "CWE-<n>" identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaknessEntry {
    /// Normalized identifier ("CWE-<n>")
    pub weakness_id: String,

    /// Short name
    pub name: Option<String>,

    /// Description
    pub description: Option<String>,

    /// Extended description
    pub extended_description: Option<String>,

    /// Likelihood of exploit
    pub likelihood_of_exploit: Option<String>,

    /// Common consequences
    pub common_consequences: Option<String>,

    /// Potential mitigations
    pub potential_mitigations: Option<String>,

    /// Related weaknesses
    pub related_weaknesses: Option<String>,

    /// Applicable platforms
    pub applicable_platforms: Option<String>,
}

impl WeaknessEntry {
    /// Normalize a raw identifier to the "CWE-<n>" form.
    ///
    /// Values already carrying the prefix pass through unchanged.
    pub fn normalize_id(raw: &str) -> String {
        let raw = raw.trim();
        if raw.to_ascii_uppercase().starts_with("CWE-") {
            format!("CWE-{}", &raw[4..])
        } else {
            format!("CWE-{}", raw)
        }
    }
}
