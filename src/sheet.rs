// src/sheet.rs
//! Results sheet: append-only CSV of qualifying matches.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::types::MatchResult;

const HEADERS: [&str; 9] = [
    "Title",
    "Company",
    "Location",
    "Link",
    "Score",
    "Rationale",
    "Description",
    "Cover Letter",
    "Matched At",
];

pub struct ResultSheet {
    path: PathBuf,
}

impl ResultSheet {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the sheet with a header row if it does not exist yet.
    pub fn ensure_headers(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let mut writer = csv::Writer::from_path(&self.path)
            .with_context(|| format!("Failed to create sheet: {}", self.path.display()))?;
        writer
            .write_record(HEADERS)
            .context("Failed to write sheet headers")?;
        writer.flush().context("Failed to flush sheet")?;

        info!("Created results sheet: {}", self.path.display());
        Ok(())
    }

    /// Append results to the sheet. A row that fails to serialize is logged
    /// and skipped; returns the number of rows written.
    pub fn append_results(&self, results: &[MatchResult]) -> Result<usize> {
        self.ensure_headers()?;

        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open sheet: {}", self.path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        let mut written = 0;
        for result in results {
            let score = result.score.to_string();
            let matched_at = result.generated_at.to_rfc3339();
            let row = [
                result.posting.title.as_str(),
                result.posting.company.as_str(),
                result.posting.location.as_str(),
                result.posting.link.as_str(),
                score.as_str(),
                result.rationale.as_str(),
                result.posting.description.as_str(),
                result.cover_letter.as_str(),
                matched_at.as_str(),
            ];
            match writer.write_record(row) {
                Ok(()) => written += 1,
                Err(e) => warn!(
                    "Failed to append {} at {} to sheet: {e}",
                    result.posting.title, result.posting.company
                ),
            }
        }
        writer.flush().context("Failed to flush sheet")?;

        info!("Appended {written} result(s) to {}", self.path.display());
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JobPosting;
    use chrono::Utc;

    fn result(title: &str, score: u8) -> MatchResult {
        MatchResult {
            key: format!("https://x/{title}"),
            posting: JobPosting {
                title: title.to_string(),
                company: "Acme".to_string(),
                location: "Berlin".to_string(),
                link: format!("https://x/{title}"),
                description: "desc".to_string(),
                posted_at: None,
                easy_apply: false,
            },
            score,
            rationale: "fits".to_string(),
            cover_letter: "Dear team,".to_string(),
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_ensure_headers_creates_file_once() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = ResultSheet::new(dir.path().join("jobs.csv"));

        sheet.ensure_headers().unwrap();
        sheet.ensure_headers().unwrap();

        let content = std::fs::read_to_string(sheet.path()).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.starts_with("Title,Company,Location,Link,Score"));
    }

    #[test]
    fn test_append_results_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let sheet = ResultSheet::new(dir.path().join("nested/jobs.csv"));

        let written = sheet
            .append_results(&[result("A", 85), result("B", 60)])
            .unwrap();
        assert_eq!(written, 2);

        let mut reader = csv::Reader::from_path(sheet.path()).unwrap();
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][0], "A");
        assert_eq!(&rows[0][4], "85");
        assert_eq!(&rows[1][0], "B");

        // Appending again grows the sheet without re-writing headers
        sheet.append_results(&[result("C", 90)]).unwrap();
        let mut reader = csv::Reader::from_path(sheet.path()).unwrap();
        assert_eq!(reader.records().count(), 3);
    }
}
