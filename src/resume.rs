// src/resume.rs
//! Resume source: extracts text from the candidate's PDF resume.
//! Failure here is fatal for the run, there is nothing to score without it.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::info;

use crate::types::ResumeProfile;

/// Extracted text below this length means extraction effectively failed.
const MIN_RESUME_CHARS: usize = 100;

pub fn extract_profile(path: &Path) -> Result<ResumeProfile> {
    if !path.exists() {
        anyhow::bail!("Resume file not found: {}", path.display());
    }

    let text = pdf_extract::extract_text(path)
        .with_context(|| format!("Failed to extract text from resume: {}", path.display()))?;

    let profile = profile_from_text(text)?;
    info!(
        "Resume extracted: {} characters, {} skills detected",
        profile.raw_text.len(),
        profile.skills.len()
    );
    Ok(profile)
}

fn profile_from_text(text: String) -> Result<ResumeProfile> {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_RESUME_CHARS {
        anyhow::bail!(
            "Resume text too short ({} chars) - extraction likely failed",
            trimmed.chars().count()
        );
    }
    Ok(ResumeProfile::from_raw_text(trimmed.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_fatal() {
        let err = extract_profile(Path::new("/nonexistent/resume.pdf")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_short_text_rejected() {
        assert!(profile_from_text("too short".to_string()).is_err());
    }

    #[test]
    fn test_plausible_text_accepted() {
        let text = format!(
            "John Doe\nSenior Software Engineer\n\nSkills:\nPython, Rust\n\n{}",
            "Experience line. ".repeat(20)
        );
        let profile = profile_from_text(text).unwrap();
        assert_eq!(profile.skills, vec!["Python", "Rust"]);
        assert!(!profile.experience_summary.is_empty());
    }
}
