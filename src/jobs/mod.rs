// src/jobs/mod.rs
//! Multi-source job search with session-scoped caching

pub mod aggregator;
pub mod cache;
pub mod html;
pub mod locations;
pub mod service;

pub use aggregator::{HttpJobAggregator, JobSource, SourcePage};
pub use cache::SearchCache;
pub use service::JobSearchService;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::cv_data::ValidationIssue;
use locations::{country_for_city, resolve_country, MOROCCO_JOB_BOARDS};

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    FullTime,
    PartTime,
    Contract,
    Internship,
    Apprenticeship,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    #[default]
    Standard,
    /// German vocational apprenticeships
    Ausbildung,
    /// Moroccan job boards only
    Morocco,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    DEFAULT_PER_PAGE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobFilters {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub remote: Option<bool>,
    #[serde(default)]
    pub job_type: Option<JobType>,
    #[serde(default)]
    pub salary_min: Option<u32>,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    #[serde(default)]
    pub mode: SearchMode,
}

impl Default for JobFilters {
    fn default() -> Self {
        Self {
            query: String::new(),
            country: None,
            city: None,
            remote: None,
            job_type: None,
            salary_min: None,
            sources: Vec::new(),
            page: 1,
            per_page: DEFAULT_PER_PAGE,
            mode: SearchMode::Standard,
        }
    }
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(collapse_whitespace)
        .filter(|v| !v.is_empty())
}

impl JobFilters {
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if let Some(country) = non_empty(&self.country) {
            if resolve_country(&country).is_none() {
                issues.push(ValidationIssue::new(
                    "country",
                    &format!("Unknown country: {}", country),
                ));
            }
        }
        if self.page == 0 {
            issues.push(ValidationIssue::new("page", "Pages start at 1"));
        }
        if self.per_page == 0 || self.per_page > MAX_PER_PAGE {
            issues.push(ValidationIssue::new(
                "per_page",
                &format!("per_page must be between 1 and {}", MAX_PER_PAGE),
            ));
        }
        issues
    }

    /// Filters as sent to the aggregator and used as cache key: search
    /// mode applied, text normalized, location resolved.
    pub fn effective(&self) -> JobFilters {
        let mut query = collapse_whitespace(&self.query).to_lowercase();
        let mut country = non_empty(&self.country)
            .map(|c| resolve_country(&c).map(|c| c.code.to_string()).unwrap_or(c.to_uppercase()));
        let city = non_empty(&self.city).map(|c| c.to_lowercase());
        let mut job_type = self.job_type;

        let mut sources: Vec<String> = self
            .sources
            .iter()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();
        sources.sort();
        sources.dedup();

        if country.is_none() {
            if let Some(city) = city.as_deref() {
                country = country_for_city(city).map(|c| c.code.to_string());
            }
        }

        match self.mode {
            SearchMode::Standard => {}
            SearchMode::Ausbildung => {
                country = Some("DE".to_string());
                job_type = Some(JobType::Apprenticeship);
                if !query.split(' ').any(|w| w == "ausbildung") {
                    query = if query.is_empty() {
                        "ausbildung".to_string()
                    } else {
                        format!("ausbildung {}", query)
                    };
                }
            }
            SearchMode::Morocco => {
                country = Some("MA".to_string());
                let boards: Vec<String> = sources
                    .iter()
                    .filter(|s| MOROCCO_JOB_BOARDS.contains(&s.as_str()))
                    .cloned()
                    .collect();
                // Sources outside the allowlist never reach the aggregator
                sources = if boards.is_empty() {
                    MOROCCO_JOB_BOARDS.iter().map(|s| s.to_string()).collect()
                } else {
                    boards
                };
                sources.sort();
            }
        }

        JobFilters {
            query,
            country,
            city,
            remote: self.remote,
            job_type,
            salary_min: self.salary_min.filter(|s| *s > 0),
            sources,
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, MAX_PER_PAGE),
            mode: self.mode,
        }
    }

    /// Cache key of already-effective filters
    pub fn cache_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self))
    }

    /// Local check of a posting against filters the aggregator may ignore.
    /// Unknown posting attributes never exclude a posting.
    pub fn matches(&self, posting: &JobPosting) -> bool {
        if self.remote == Some(true) && !posting.remote {
            return false;
        }
        if let (Some(wanted), Some(actual)) = (self.job_type, posting.job_type) {
            if wanted != actual {
                return false;
            }
        }
        if let Some(floor) = self.salary_min {
            if let Some(best) = posting.salary_max.or(posting.salary_min) {
                if best < f64::from(floor) {
                    return false;
                }
            }
        }
        if !self.sources.is_empty() && !posting.source.is_empty() {
            let source = posting.source.to_lowercase();
            if !self.sources.iter().any(|s| *s == source) {
                return false;
            }
        }
        if let (Some(wanted), Some(actual)) = (self.country.as_deref(), posting.country.as_deref()) {
            if !posting.remote && !wanted.eq_ignore_ascii_case(actual) {
                return false;
            }
        }
        if let Some(city) = self.city.as_deref() {
            let in_city = match posting.city.as_deref() {
                Some(actual) => actual.eq_ignore_ascii_case(city),
                None => {
                    posting.location.is_empty() || posting.location.to_lowercase().contains(city)
                }
            };
            if !in_city && !posting.remote {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPosting {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub remote: bool,
    #[serde(default)]
    pub job_type: Option<JobType>,
    #[serde(default)]
    pub salary_min: Option<f64>,
    #[serde(default)]
    pub salary_max: Option<f64>,
    #[serde(default)]
    pub salary_currency: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub posted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobPage {
    pub jobs: Vec<JobPosting>,
    pub total: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
    pub has_more: bool,
    pub from_cache: bool,
    /// Served from an expired cache entry because the aggregator failed
    pub stale: bool,
}

impl JobPage {
    pub fn new(jobs: Vec<JobPosting>, total: u64, page: u32, per_page: u32) -> Self {
        let per_page = per_page.max(1);
        let total_pages = total.div_ceil(u64::from(per_page)).min(u64::from(u32::MAX)) as u32;
        Self {
            jobs,
            total,
            page,
            per_page,
            total_pages,
            has_more: page < total_pages,
            from_cache: false,
            stale: false,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn posting(id: &str) -> JobPosting {
        JobPosting {
            id: id.to_string(),
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Berlin, Germany".to_string(),
            country: Some("DE".to_string()),
            city: Some("Berlin".to_string()),
            remote: false,
            job_type: Some(JobType::FullTime),
            salary_min: Some(50_000.0),
            salary_max: Some(70_000.0),
            salary_currency: Some("EUR".to_string()),
            description: "Build services".to_string(),
            tags: vec!["rust".to_string()],
            posted_at: None,
            source: "indeed".to_string(),
            url: None,
        }
    }

    #[test]
    fn test_equivalent_filters_share_a_key() {
        let a = JobFilters {
            query: "  Rust   Developer ".to_string(),
            country: Some("germany".to_string()),
            sources: vec!["Indeed".to_string(), "linkedin".to_string()],
            ..Default::default()
        };
        let b = JobFilters {
            query: "rust developer".to_string(),
            country: Some("DE".to_string()),
            sources: vec!["linkedin".to_string(), "indeed".to_string(), "indeed".to_string()],
            ..Default::default()
        };
        assert_eq!(a.effective().cache_key(), b.effective().cache_key());

        let c = JobFilters {
            page: 2,
            ..b.clone()
        };
        assert_ne!(b.effective().cache_key(), c.effective().cache_key());
    }

    #[test]
    fn test_ausbildung_mode_forces_germany_and_apprenticeship() {
        let filters = JobFilters {
            query: "Mechatroniker".to_string(),
            country: Some("FR".to_string()),
            mode: SearchMode::Ausbildung,
            ..Default::default()
        }
        .effective();
        assert_eq!(filters.country.as_deref(), Some("DE"));
        assert_eq!(filters.job_type, Some(JobType::Apprenticeship));
        assert_eq!(filters.query, "ausbildung mechatroniker");

        let again = JobFilters {
            query: filters.query.clone(),
            mode: SearchMode::Ausbildung,
            ..Default::default()
        }
        .effective();
        assert_eq!(again.query, "ausbildung mechatroniker");
    }

    #[test]
    fn test_morocco_mode_restricts_sources() {
        let all = JobFilters {
            mode: SearchMode::Morocco,
            sources: vec!["linkedin".to_string()],
            ..Default::default()
        }
        .effective();
        assert_eq!(all.country.as_deref(), Some("MA"));
        assert!(all
            .sources
            .iter()
            .all(|s| MOROCCO_JOB_BOARDS.contains(&s.as_str())));
        assert_eq!(all.sources.len(), MOROCCO_JOB_BOARDS.len());

        let some = JobFilters {
            mode: SearchMode::Morocco,
            sources: vec!["ReKrute".to_string(), "linkedin".to_string()],
            ..Default::default()
        }
        .effective();
        assert_eq!(some.sources, vec!["rekrute"]);
    }

    #[test]
    fn test_city_infers_country() {
        let filters = JobFilters {
            city: Some("Casablanca".to_string()),
            ..Default::default()
        }
        .effective();
        assert_eq!(filters.country.as_deref(), Some("MA"));
        assert_eq!(filters.city.as_deref(), Some("casablanca"));
    }

    #[test]
    fn test_validate_rejects_unknown_country_and_bad_paging() {
        let filters = JobFilters {
            country: Some("Atlantis".to_string()),
            page: 0,
            per_page: 500,
            ..Default::default()
        };
        let fields: Vec<String> = filters.validate().into_iter().map(|i| i.field).collect();
        assert_eq!(fields, vec!["country", "page", "per_page"]);
    }

    #[test]
    fn test_post_filter() {
        let filters = JobFilters {
            remote: Some(true),
            ..Default::default()
        }
        .effective();
        assert!(!filters.matches(&posting("1")));

        let filters = JobFilters {
            salary_min: Some(80_000),
            ..Default::default()
        }
        .effective();
        assert!(!filters.matches(&posting("1")));

        let mut unknown_salary = posting("2");
        unknown_salary.salary_min = None;
        unknown_salary.salary_max = None;
        assert!(filters.matches(&unknown_salary));

        let filters = JobFilters {
            city: Some("munich".to_string()),
            ..Default::default()
        }
        .effective();
        assert!(!filters.matches(&posting("3")));
    }

    #[test]
    fn test_page_metadata() {
        let page = JobPage::new(vec![], 45, 2, 20);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_more);
        let last = JobPage::new(vec![], 45, 3, 20);
        assert!(!last.has_more);
        assert_eq!(JobPage::new(vec![], 0, 1, 20).total_pages, 0);
    }
}
