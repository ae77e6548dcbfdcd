// src/utils.rs
use anyhow::Result;

/// Collapse scraped HTML text into single-spaced plain text
pub fn clean_html_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Truncate text to a maximum length, appending a suffix when cut
pub fn truncate_text(text: &str, max_length: usize, suffix: &str) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    let keep = max_length.saturating_sub(suffix.chars().count());
    let truncated: String = text.chars().take(keep).collect();
    format!("{}{}", truncated, suffix)
}

/// Parse a schedule time in HH:MM format
pub fn parse_time_string(time_str: &str) -> Result<(u32, u32)> {
    let mut parts = time_str.splitn(2, ':');
    let hour: u32 = parts
        .next()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| anyhow::anyhow!("Invalid time format: {}. Expected HH:MM", time_str))?;
    let minute: u32 = parts
        .next()
        .and_then(|s| s.trim().parse().ok())
        .ok_or_else(|| anyhow::anyhow!("Invalid time format: {}. Expected HH:MM", time_str))?;

    if hour > 23 || minute > 59 {
        anyhow::bail!("Time out of range: {}. Expected HH:MM", time_str);
    }

    Ok((hour, minute))
}

/// Extract the numeric job id from a LinkedIn job URL
pub fn extract_job_id_from_url(url: &str) -> Option<&str> {
    let rest = url.split("/jobs/view/").nth(1)?;
    rest.split(|c: char| !c.is_ascii_digit())
        .next()
        .filter(|s| !s.is_empty())
}

/// Canonical LinkedIn job URL for a job id
pub fn format_job_url(job_id: &str) -> String {
    format!("https://www.linkedin.com/jobs/view/{}", job_id)
}

/// Strip the query string from a scraped link
pub fn strip_query(url: &str) -> &str {
    url.split('?').next().unwrap_or(url)
}
