use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use comfy_table::Table;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::summary::{ConfidenceThreshold, RepositorySummary};

pub const REPORT_SCHEMA_VERSION: &str = "1";

/// Column headers of the summary table.
pub const TABLE_HEADER: [&str; 5] = [
    "Repo",
    "Positive Commits",
    "Negative Commits",
    "Commits Below Confidence",
    "Pos-to-Neg Ratio",
];

/// Outcome of a multi-repository run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SentimentReport {
    pub schema_version: String,
    pub generated_at: DateTime<Utc>,
    pub min_confidence: ConfidenceThreshold,
    pub repositories: Vec<RepositorySummary>,
    /// Identifiers ignored because they were not `owner/name`
    pub skipped: Vec<String>,
}

impl SentimentReport {
    pub fn new(
        min_confidence: ConfidenceThreshold,
        repositories: Vec<RepositorySummary>,
        skipped: Vec<String>,
    ) -> Self {
        SentimentReport {
            schema_version: REPORT_SCHEMA_VERSION.to_string(),
            generated_at: Utc::now(),
            min_confidence,
            repositories,
            skipped,
        }
    }
}

/// Render the per-repository table printed by the CLI.
pub fn render_table(summaries: &[RepositorySummary]) -> String {
    let mut table = Table::new();
    table.set_header(TABLE_HEADER.to_vec());

    for summary in summaries {
        table.add_row(vec![
            summary.repo.full_name(),
            summary.positive.to_string(),
            summary.negative.to_string(),
            summary.below_threshold.to_string(),
            summary.ratio.to_string(),
        ]);
    }
    table.to_string()
}

/// Write the report as pretty JSON.
pub fn write_report_json(path: &Path, report: &SentimentReport) -> Result<()> {
    let content = serde_json::to_string_pretty(report).context("serialize sentiment report")?;
    std::fs::write(path, content).with_context(|| format!("write {:?}", path))?;
    Ok(())
}

/// Read a report written by [`write_report_json`].
pub fn read_report_json(path: &Path) -> Result<SentimentReport> {
    let content = std::fs::read_to_string(path).with_context(|| format!("read {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("parse report {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::RepoId;
    use crate::summary::PosNegRatio;

    fn summary(name: &str, positive: usize, negative: usize, below: usize) -> RepositorySummary {
        RepositorySummary {
            repo: RepoId::new("octo", name),
            positive,
            negative,
            below_threshold: below,
            total: positive + negative + below,
            mean_confidence: Some(80.0),
            ratio: PosNegRatio::new(positive, negative),
        }
    }

    #[test]
    fn test_render_table_has_header_and_rows() {
        let table = render_table(&[summary("cat", 4, 2, 1), summary("dog", 3, 0, 0)]);

        for header in TABLE_HEADER {
            assert!(table.contains(header), "missing header {header}");
        }
        assert!(table.contains("octo/cat"));
        assert!(table.contains("2.000000"));
        assert!(table.contains("octo/dog"));
        assert!(table.contains("inf"));
    }

    #[test]
    fn test_render_table_empty() {
        let table = render_table(&[]);
        assert!(table.contains("Repo"));
        assert!(!table.contains("octo/"));
    }

    #[test]
    fn test_write_and_read_report_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = SentimentReport::new(
            ConfidenceThreshold::default(),
            vec![summary("cat", 1, 1, 0)],
            vec!["ownername".to_string()],
        );

        write_report_json(&path, &report).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["schema_version"], "1");
        assert_eq!(raw["min_confidence"], 75.0);
        assert_eq!(raw["repositories"][0]["repo"]["name"], "cat");
        assert_eq!(raw["skipped"][0], "ownername");

        let loaded = read_report_json(&path).unwrap();
        assert_eq!(loaded, report);
    }

    #[test]
    fn test_write_report_to_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.json");
        let report = SentimentReport::new(ConfidenceThreshold::default(), vec![], vec![]);
        assert!(write_report_json(&path, &report).is_err());
    }
}
