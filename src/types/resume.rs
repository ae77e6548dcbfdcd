// src/types/resume.rs
use serde::{Deserialize, Serialize};

use crate::utils::truncate_text;

const SUMMARY_MAX_CHARS: usize = 200;

/// Structured text extracted from the candidate's resume.
/// Immutable once constructed; built fresh each run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumeProfile {
    pub raw_text: String,
    pub skills: Vec<String>,
    pub experience_summary: String,
}

impl ResumeProfile {
    /// Build a profile from extracted resume text. The derived fields are
    /// best-effort and may be empty; `raw_text` is what the matcher uses.
    pub fn from_raw_text(raw_text: String) -> Self {
        let skills = extract_skills(&raw_text);
        let experience_summary = truncate_text(raw_text.trim(), SUMMARY_MAX_CHARS, "...");

        Self {
            raw_text,
            skills,
            experience_summary,
        }
    }
}

/// Harvest a comma-separated skills list from a "Skills" section, if the
/// resume has one. Returns empty when no such section is found.
fn extract_skills(text: &str) -> Vec<String> {
    let mut lines = text.lines();

    while let Some(line) = lines.next() {
        let heading = line.trim().trim_end_matches(':');
        if !heading.eq_ignore_ascii_case("skills") {
            continue;
        }

        // Collect the section body until a blank line or the text ends
        let mut body = String::new();
        for line in lines.by_ref() {
            let line = line.trim();
            if line.is_empty() {
                break;
            }
            if !body.is_empty() {
                body.push(' ');
            }
            body.push_str(line);
        }

        return body
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    Vec::new()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_skills_from_section() {
        let text = "John Doe\n\nSkills:\nPython, Rust,\nDocker\n\nExperience\n...";
        let skills = extract_skills(text);
        assert_eq!(skills, vec!["Python", "Rust", "Docker"]);
    }

    #[test]
    fn test_extract_skills_missing_section() {
        assert!(extract_skills("John Doe\nExperience\n...").is_empty());
    }

    #[test]
    fn test_profile_summary_truncated() {
        let text = "x".repeat(500);
        let profile = ResumeProfile::from_raw_text(text);
        assert_eq!(profile.experience_summary.chars().count(), 200);
        assert!(profile.experience_summary.ends_with("..."));
        assert_eq!(profile.raw_text.len(), 500);
    }
}
