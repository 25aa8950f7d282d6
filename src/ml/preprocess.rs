use crate::models::VulnerabilityRecord;
use serde::{Deserialize, Serialize};

/// Sentinel for platform fields that cannot be derived.
const UNKNOWN: &str = "unknown";

/// Literal replacing wildcard markers in platform strings.
const ANY: &str = "any";

/// (software, version, os) derived from the colon-delimited platform string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformTriple {
    pub software: String,
    pub version: String,
    pub os: String,
}

impl PlatformTriple {
    pub fn unknown() -> Self {
        Self {
            software: UNKNOWN.to_string(),
            version: UNKNOWN.to_string(),
            os: UNKNOWN.to_string(),
        }
    }
}

/// One record surviving the training filter, with its derived features.
#[derive(Debug, Clone)]
pub struct ProcessedRecord {
    pub identifier: String,
    pub combined_text: String,
    pub platform: PlatformTriple,
    pub severity: Option<String>,
}

/// Filter records and derive the composite text feature and platform triple.
///
/// Records whose description is absent, the literal "None" marker, or empty
/// after trimming are dropped. Pure transformation; input order is kept.
pub fn prepare(records: &[VulnerabilityRecord]) -> Vec<ProcessedRecord> {
    records
        .iter()
        .filter_map(|record| {
            let description = usable_description(record)?;
            Some(ProcessedRecord {
                identifier: record.identifier.clone(),
                combined_text: combine_text(description, record.references_json.as_deref()),
                platform: parse_platform(record.platform.as_deref()),
                severity: record.severity.clone(),
            })
        })
        .collect()
}

fn usable_description(record: &VulnerabilityRecord) -> Option<&str> {
    let description = record.description.as_deref()?.trim();
    if description.is_empty() || description == "None" {
        None
    } else {
        Some(description)
    }
}

/// Concatenate the description with the space-joined reference list.
fn combine_text(description: &str, references_json: Option<&str>) -> String {
    let references = parse_references(references_json);
    if references.is_empty() {
        description.to_string()
    } else {
        format!("{} {}", description, references)
    }
}

/// Decode the stored list-like reference encoding into a space-joined string.
///
/// Only a JSON list of strings is accepted; anything else is treated as an
/// empty reference list. The stored text is never evaluated as code.
pub fn parse_references(raw: Option<&str>) -> String {
    raw.and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
        .map(|urls| urls.join(" "))
        .unwrap_or_default()
}

/// Split the platform string on ":" and take segments 2, 3, 4 as
/// (software, version, os). Fewer than five segments, or no platform at
/// all, yields the all-"unknown" triple. Wildcard markers are replaced
/// with the uniform "any" token before splitting.
pub fn parse_platform(raw: Option<&str>) -> PlatformTriple {
    let raw = match raw {
        Some(raw) if !raw.trim().is_empty() && raw != "None" => raw.replace('*', ANY),
        _ => return PlatformTriple::unknown(),
    };

    let segments: Vec<&str> = raw.split(':').collect();
    if segments.len() < 5 {
        return PlatformTriple::unknown();
    }

    PlatformTriple {
        software: segments[2].to_string(),
        version: segments[3].to_string(),
        os: segments[4].to_string(),
    }
}
