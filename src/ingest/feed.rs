use crate::error::{AppError, Result};
use crate::ingest::ImportSummary;
use crate::models::VulnerabilityRecord;
use crate::state::RecordStore;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::Value;
use std::path::Path;
use tracing::warn;

/// Import a legacy vulnerability feed (NVD-style JSON) into the record store.
///
/// An unreadable or structurally invalid feed file aborts the import;
/// individually malformed items are skipped with a warning and do not
/// abort the batch. Records are upserted by identifier (last write wins).
pub async fn import_feed(store: &dyn RecordStore, path: &Path) -> Result<ImportSummary> {
    let raw = std::fs::read_to_string(path)?;
    let feed: Value = serde_json::from_str(&raw)?;

    let items = feed
        .get("CVE_Items")
        .and_then(Value::as_array)
        .ok_or_else(|| AppError::Data("feed has no CVE_Items array".to_string()))?;

    let mut summary = ImportSummary::default();

    for item in items {
        match parse_item(item) {
            Some(record) => {
                store.save_record(&record).await?;
                summary.imported += 1;
            }
            None => {
                warn!("Skipping feed item without a CVE identifier");
                summary.skipped += 1;
            }
        }
    }

    tracing::info!(
        imported = summary.imported,
        skipped = summary.skipped,
        "Feed import completed"
    );

    Ok(summary)
}

/// Parse one feed item. Returns `None` when the item carries no identifier.
fn parse_item(item: &Value) -> Option<VulnerabilityRecord> {
    let cve = item.get("cve")?;
    let identifier = cve
        .pointer("/CVE_data_meta/ID")
        .and_then(Value::as_str)?
        .to_string();

    let mut record = VulnerabilityRecord::new(identifier, english_description(cve));

    record.assigner = cve
        .pointer("/CVE_data_meta/ASSIGNER")
        .and_then(Value::as_str)
        .map(str::to_string);

    record.weakness_id = cve
        .pointer("/problemtype/problemtype_data/0/description/0/value")
        .and_then(Value::as_str)
        .map(str::to_string);

    // References are stored in their list-like textual encoding.
    let references: Vec<String> = cve
        .pointer("/references/reference_data")
        .and_then(Value::as_array)
        .map(|refs| {
            refs.iter()
                .filter_map(|r| r.get("url").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    record.references_json = serde_json::to_string(&references).ok();

    let metrics = item.pointer("/impact/baseMetricV3");
    record.cvss_score = metrics.and_then(|m| coerce_number(m.pointer("/cvssV3/baseScore")));
    record.severity = metrics
        .and_then(|m| m.pointer("/cvssV3/baseSeverity"))
        .and_then(Value::as_str)
        .map(str::to_string);
    record.vector_string = metrics
        .and_then(|m| m.pointer("/cvssV3/vectorString"))
        .and_then(Value::as_str)
        .map(str::to_string);
    record.user_interaction = metrics
        .and_then(|m| m.pointer("/cvssV3/userInteraction"))
        .and_then(Value::as_str)
        .map(str::to_string);
    record.exploitability_score =
        metrics.and_then(|m| coerce_number(m.get("exploitabilityScore")));
    record.impact_score = metrics.and_then(|m| coerce_number(m.get("impactScore")));

    record.platform = item
        .pointer("/configurations/nodes/0/cpe_match/0/cpe23Uri")
        .and_then(Value::as_str)
        .map(str::to_string);

    record.published_at = item
        .get("publishedDate")
        .and_then(Value::as_str)
        .and_then(parse_feed_timestamp);
    record.modified_at = item
        .get("lastModifiedDate")
        .and_then(Value::as_str)
        .and_then(parse_feed_timestamp);

    Some(record)
}

/// Select the English-language description; empty string if none matches.
fn english_description(cve: &Value) -> String {
    cve.pointer("/description/description_data")
        .and_then(Value::as_array)
        .and_then(|descs| {
            descs
                .iter()
                .find(|d| d.get("lang").and_then(Value::as_str) == Some("en"))
        })
        .and_then(|d| d.get("value").and_then(Value::as_str))
        .unwrap_or("")
        .to_string()
}

/// Numeric fields that fail to parse coerce to None, never reject the record.
fn coerce_number(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Feed timestamps come as "2023-01-15T12:30Z"; RFC 3339 is accepted too.
fn parse_feed_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ") {
        return Some(naive.and_utc());
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
