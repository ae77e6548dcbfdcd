// src/listing.rs
//! LinkedIn listing source: search URL building, results-page fetch, and
//! per-job detail scraping.

use anyhow::{Context, Result};
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{info, warn};

use crate::config::SearchFilters;
use crate::types::JobPosting;
use crate::utils::{clean_html_text, strip_query};

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Jobs posted in the last 24 hours (r86400 = recent 86400 seconds).
const SEARCH_BASE_URL: &str = "https://www.linkedin.com/jobs/search/?f_TPR=r86400";

pub struct LinkedInListing {
    client: Client,
    delay: std::time::Duration,
}

impl LinkedInListing {
    pub fn new(delay_seconds: u64, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            delay: std::time::Duration::from_secs(delay_seconds),
        })
    }

    /// Search for jobs and fetch details for up to `max_jobs` of them.
    /// A failed search-page fetch is fatal; zero extracted links is a
    /// valid empty result.
    pub async fn search_jobs(
        &self,
        filters: &SearchFilters,
        max_jobs: usize,
    ) -> Result<Vec<JobPosting>> {
        let search_url = build_search_url(filters);
        info!("Searching LinkedIn: {search_url}");

        let html = self.fetch_page(&search_url).await?;
        let mut links = extract_job_links(&html);

        if links.is_empty() {
            warn!("No job links found in search results");
            return Ok(Vec::new());
        }

        links.truncate(max_jobs);
        info!("Fetching details for {} jobs", links.len());

        let mut jobs = Vec::with_capacity(links.len());
        for (i, link) in links.iter().enumerate() {
            // Politeness delay between detail fetches
            tokio::time::sleep(self.delay).await;

            info!("Fetching job {}/{}: {link}", i + 1, links.len());
            match self.fetch_job_details(link, filters.easy_apply).await {
                Ok(Some(job)) => jobs.push(job),
                Ok(None) => warn!("Skipping {link}: page had no usable title/company"),
                Err(e) => warn!("Skipping {link}: {e:#}"),
            }
        }

        info!("Fetched details for {}/{} jobs", jobs.len(), links.len());
        Ok(jobs)
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {url}"))?;

        if !response.status().is_success() {
            anyhow::bail!("HTTP error {} fetching {url}", response.status());
        }

        response.text().await.context("Failed to read response body")
    }

    async fn fetch_job_details(&self, url: &str, easy_apply: bool) -> Result<Option<JobPosting>> {
        let html = self.fetch_page(url).await?;
        Ok(parse_job_page(&html, url, easy_apply))
    }
}

/// Build the search URL from filters using LinkedIn's query parameters.
pub fn build_search_url(filters: &SearchFilters) -> String {
    let mut url = String::from(SEARCH_BASE_URL);

    if !filters.keyword.is_empty() {
        url.push_str("&keywords=");
        url.push_str(&urlencode(&filters.keyword));
    }

    if !filters.location.is_empty() {
        url.push_str("&location=");
        url.push_str(&urlencode(&filters.location));
    }

    // Experience level (f_E): 1=Internship .. 6=Executive
    let experience_codes = map_codes(
        &filters.experience_level,
        &[
            ("Internship", "1"),
            ("Entry level", "2"),
            ("Associate", "3"),
            ("Mid-Senior level", "4"),
            ("Director", "5"),
            ("Executive", "6"),
        ],
    );
    if !experience_codes.is_empty() {
        url.push_str("&f_E=");
        url.push_str(&experience_codes.join(","));
    }

    // Work type (f_WT): 1=On-Site, 2=Remote, 3=Hybrid
    let remote_codes = map_codes(
        &filters.remote,
        &[("On-Site", "1"), ("Remote", "2"), ("Hybrid", "3")],
    );
    if !remote_codes.is_empty() {
        url.push_str("&f_WT=");
        url.push_str(&remote_codes.join(","));
    }

    // Job type (f_JT): letter codes
    let job_type_codes = map_codes(
        &filters.job_type,
        &[
            ("Full-time", "F"),
            ("Part-time", "P"),
            ("Contract", "C"),
            ("Temporary", "T"),
            ("Other", "O"),
            ("Internship", "I"),
        ],
    );
    if !job_type_codes.is_empty() {
        url.push_str("&f_JT=");
        url.push_str(&job_type_codes.join(","));
    }

    if filters.easy_apply {
        url.push_str("&f_EA=true");
    }

    url
}

/// Translate a comma-separated filter value through a code table,
/// dropping entries the table does not know.
fn map_codes(raw: &str, table: &[(&str, &str)]) -> Vec<String> {
    raw.split(',')
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .filter_map(|v| {
            table
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(v))
                .map(|(_, code)| code.to_string())
        })
        .collect()
}

fn urlencode(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            ' ' => "%20".to_string(),
            '&' => "%26".to_string(),
            '#' => "%23".to_string(),
            '+' => "%2B".to_string(),
            '?' => "%3F".to_string(),
            c => c.to_string(),
        })
        .collect()
}

/// Extract job links from the search results page, query strings stripped.
pub fn extract_job_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);

    let card_selectors = [
        "ul.jobs-search__results-list li div a[class*='base-card']",
        "a.base-card__full-link",
    ];

    let mut links = Vec::new();
    for selector_str in card_selectors {
        let Ok(selector) = Selector::parse(selector_str) else {
            continue;
        };
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                let href = strip_query(href).to_string();
                if !links.contains(&href) {
                    links.push(href);
                }
            }
        }
        if !links.is_empty() {
            break;
        }
    }

    links
}

/// Parse one job detail page. Returns None when no usable title or company
/// could be found, postings like that are rejected downstream anyway.
pub fn parse_job_page(html: &str, url: &str, easy_apply: bool) -> Option<JobPosting> {
    let document = Html::parse_document(html);

    let title_selectors = [
        "h1.top-card-layout__title",
        "h1.topcard__title",
        "div h1",
    ];
    let company_selectors = [
        "a.topcard__org-name-link",
        "span.topcard__flavor a",
        "div span a",
    ];
    let location_selectors = [
        "span.topcard__flavor--bullet",
        "div span[class*='topcard__flavor--bullet']",
    ];
    let description_selectors = [
        "div.description__text.description__text--rich",
        "div.show-more-less-html__markup",
        "div.description__text",
    ];
    let posted_selectors = ["span.posted-time-ago__text"];

    let title = find_text_by_selectors(&document, &title_selectors)?;
    let company = find_text_by_selectors(&document, &company_selectors)?;
    let location = find_text_by_selectors(&document, &location_selectors).unwrap_or_default();
    let description = find_text_by_selectors(&document, &description_selectors).unwrap_or_default();
    let posted_at = find_text_by_selectors(&document, &posted_selectors);

    Some(JobPosting {
        title,
        company,
        location,
        link: strip_query(url).to_string(),
        description,
        posted_at,
        easy_apply,
    })
}

fn find_text_by_selectors(document: &Html, selectors: &[&str]) -> Option<String> {
    for selector_str in selectors {
        if let Ok(selector) = Selector::parse(selector_str) {
            if let Some(element) = document.select(&selector).next() {
                let text = clean_html_text(&element.text().collect::<Vec<_>>().join(" "));
                if !text.is_empty() {
                    return Some(text);
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filters() -> SearchFilters {
        SearchFilters {
            keyword: "rust engineer".to_string(),
            location: "Berlin".to_string(),
            experience_level: "Entry level, Associate".to_string(),
            remote: "Remote".to_string(),
            job_type: "Full-time, Contract".to_string(),
            easy_apply: true,
        }
    }

    #[test]
    fn test_build_search_url_full() {
        let url = build_search_url(&filters());
        assert!(url.starts_with("https://www.linkedin.com/jobs/search/?f_TPR=r86400"));
        assert!(url.contains("&keywords=rust%20engineer"));
        assert!(url.contains("&location=Berlin"));
        assert!(url.contains("&f_E=2,3"));
        assert!(url.contains("&f_WT=2"));
        assert!(url.contains("&f_JT=F,C"));
        assert!(url.contains("&f_EA=true"));
    }

    #[test]
    fn test_build_search_url_empty_filters() {
        let url = build_search_url(&SearchFilters::default());
        assert_eq!(url, SEARCH_BASE_URL);
    }

    #[test]
    fn test_map_codes_drops_unknown_values() {
        let codes = map_codes(
            "Remote, Submarine",
            &[("On-Site", "1"), ("Remote", "2"), ("Hybrid", "3")],
        );
        assert_eq!(codes, vec!["2"]);
    }

    #[test]
    fn test_extract_job_links() {
        let html = r#"
            <ul class="jobs-search__results-list">
              <li><div>
                <a class="base-card__full-link base-card" href="https://www.linkedin.com/jobs/view/111?refId=abc">Job 1</a>
              </div></li>
              <li><div>
                <a class="base-card" href="https://www.linkedin.com/jobs/view/222">Job 2</a>
              </div></li>
            </ul>
        "#;
        let links = extract_job_links(html);
        assert_eq!(
            links,
            vec![
                "https://www.linkedin.com/jobs/view/111",
                "https://www.linkedin.com/jobs/view/222"
            ]
        );
    }

    #[test]
    fn test_extract_job_links_empty_page() {
        assert!(extract_job_links("<html><body></body></html>").is_empty());
    }

    #[test]
    fn test_parse_job_page() {
        let html = r#"
            <html><body>
              <h1 class="top-card-layout__title">Backend  Engineer</h1>
              <a class="topcard__org-name-link">Acme Corp</a>
              <span class="topcard__flavor--bullet">Berlin, Germany</span>
              <span class="posted-time-ago__text">2 days ago</span>
              <div class="description__text description__text--rich">
                Python backend role
                with plenty of whitespace
              </div>
            </body></html>
        "#;
        let job = parse_job_page(html, "https://www.linkedin.com/jobs/view/111?x=1", false).unwrap();
        assert_eq!(job.title, "Backend Engineer");
        assert_eq!(job.company, "Acme Corp");
        assert_eq!(job.location, "Berlin, Germany");
        assert_eq!(job.link, "https://www.linkedin.com/jobs/view/111");
        assert_eq!(job.posted_at.as_deref(), Some("2 days ago"));
        assert_eq!(job.description, "Python backend role with plenty of whitespace");
    }

    #[test]
    fn test_parse_job_page_without_title_is_none() {
        let html = "<html><body><a class='topcard__org-name-link'>Acme</a></body></html>";
        assert!(parse_job_page(html, "https://x/1", false).is_none());
    }
}
