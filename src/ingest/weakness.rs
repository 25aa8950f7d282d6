use crate::error::Result;
use crate::ingest::ImportSummary;
use crate::models::WeaknessEntry;
use crate::state::RecordStore;
use serde::Deserialize;
use std::path::Path;
use tracing::warn;

/// One row of the weakness-taxonomy CSV export.
///
/// Only the relevant named columns are mapped; everything else is ignored.
#[derive(Debug, Deserialize)]
struct WeaknessRow {
    #[serde(rename = "CWE-ID")]
    cwe_id: Option<String>,

    #[serde(rename = "Name")]
    name: Option<String>,

    #[serde(rename = "Description")]
    description: Option<String>,

    #[serde(rename = "Extended Description")]
    extended_description: Option<String>,

    #[serde(rename = "Likelihood of Exploit")]
    likelihood_of_exploit: Option<String>,

    #[serde(rename = "Common Consequences")]
    common_consequences: Option<String>,

    #[serde(rename = "Potential Mitigations")]
    potential_mitigations: Option<String>,

    #[serde(rename = "Related Weaknesses")]
    related_weaknesses: Option<String>,

    #[serde(rename = "Applicable Platforms")]
    applicable_platforms: Option<String>,
}

/// Import a weakness-taxonomy CSV into the store.
///
/// An unreadable file aborts the import; rows missing the identifier
/// column are skipped with a warning and leave the insertion count
/// unchanged. Identifiers are normalized to the "CWE-<n>" form.
pub async fn import_weaknesses(store: &dyn RecordStore, path: &Path) -> Result<ImportSummary> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| crate::error::AppError::Data(format!("Failed to read CSV: {}", e)))?;

    let mut summary = ImportSummary::default();

    for row in reader.deserialize::<WeaknessRow>() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                warn!("Skipping malformed weakness row: {}", e);
                summary.skipped += 1;
                continue;
            }
        };

        let raw_id = match row.cwe_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                warn!("Skipping weakness row without an identifier");
                summary.skipped += 1;
                continue;
            }
        };

        let entry = WeaknessEntry {
            weakness_id: WeaknessEntry::normalize_id(&raw_id),
            name: row.name,
            description: row.description,
            extended_description: row.extended_description,
            likelihood_of_exploit: row.likelihood_of_exploit,
            common_consequences: row.common_consequences,
            potential_mitigations: row.potential_mitigations,
            related_weaknesses: row.related_weaknesses,
            applicable_platforms: row.applicable_platforms,
        };

        store.save_weakness(&entry).await?;
        summary.imported += 1;
    }

    tracing::info!(
        imported = summary.imported,
        skipped = summary.skipped,
        "Weakness import completed"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{InMemoryStore, RecordStore};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_import_normalizes_identifier() {
        let csv = write_csv("CWE-ID,Name,Description\n79,XSS,Improper neutralization\n");
        let store = InMemoryStore::new();

        let summary = import_weaknesses(&store, csv.path()).await.unwrap();
        assert_eq!(summary.imported, 1);

        let entry = store.get_weakness("CWE-79").await.unwrap().unwrap();
        assert_eq!(entry.name.as_deref(), Some("XSS"));
    }

    #[tokio::test]
    async fn test_row_without_identifier_skipped() {
        let csv = write_csv("CWE-ID,Name,Description\n,Nameless,desc\n89,SQLi,desc\n");
        let store = InMemoryStore::new();

        let summary = import_weaknesses(&store, csv.path()).await.unwrap();
        assert_eq!(summary.imported, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(store.count_weaknesses().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_aborts() {
        let store = InMemoryStore::new();
        let result = import_weaknesses(&store, Path::new("/nonexistent/cwe.csv")).await;
        assert!(result.is_err());
    }
}
