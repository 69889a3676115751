// src/ats/metrics.rs
use regex::Regex;
use std::sync::LazyLock;

use super::policy::MetricPolicy;
use super::text::statements;
use super::vocabulary::{is_achievement_word, is_strong_verb};
use crate::types::cv_data::CvDocument;

// Alternatives are ordered so currency and percentages win over bare counts
static METRIC_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)
        [$€£¥]\s?\d[\d,.]*(?:\s?(?:k|m|bn|million|billion))?\b
        | \d[\d,.]*\s?(?:k|m|bn|million|billion)?\s?(?:usd|eur|gbp|mad|dollars|euros|dirhams)\b
        | \d+(?:[.,]\d+)?\s?%
        | \b\d+(?:\.\d+)?x\b
        | \b\d[\d,.]*\+?
        ",
    )
    .expect("metric pattern is valid")
});

static YEAR_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:19|20)\d{2}$").expect("year pattern is valid"));

#[derive(Debug, Clone, PartialEq)]
pub struct MetricReport {
    pub score: u8,
    /// Distinct quantified substrings, first-seen order
    pub metrics: Vec<String>,
    /// Achievement-style statements without a number
    pub opportunities: Vec<String>,
}

fn extract_metrics(text: &str) -> Vec<String> {
    METRIC_PATTERN
        .find_iter(text)
        .map(|m| m.as_str().trim().trim_end_matches([',', '.']).to_string())
        .filter(|m| !m.is_empty() && !YEAR_PATTERN.is_match(m))
        .collect()
}

fn reads_like_achievement(statement: &str) -> bool {
    statement
        .split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .any(|w| is_achievement_word(&w) || is_strong_verb(&w))
}

fn points(count: usize, policy: &MetricPolicy) -> u8 {
    let first = count.min(policy.metric_threshold) as u64 * u64::from(policy.metric_points);
    let rest = count.saturating_sub(policy.metric_threshold) as u64
        * u64::from(policy.metric_points_after);
    (first + rest).min(100) as u8
}

pub fn score_metrics(cv: &CvDocument, policy: &MetricPolicy) -> MetricReport {
    let mut metrics: Vec<String> = Vec::new();
    let mut opportunities: Vec<String> = Vec::new();

    let mut sources: Vec<&str> = vec![cv.summary.as_str()];
    sources.extend(cv.statement_sources());

    for source in sources {
        for statement in statements(source) {
            let found = extract_metrics(&statement);
            let has_digit = statement.chars().any(|c| c.is_ascii_digit());

            for metric in found {
                if !metrics.contains(&metric) {
                    metrics.push(metric);
                }
            }

            if !has_digit
                && opportunities.len() < policy.max_opportunities
                && reads_like_achievement(&statement)
                && !opportunities.contains(&statement)
            {
                opportunities.push(statement);
            }
        }
    }

    MetricReport {
        score: points(metrics.len(), policy),
        metrics,
        opportunities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::cv_data::Experience;

    fn cv_with_achievements(items: &[&str]) -> CvDocument {
        CvDocument {
            experience: vec![Experience {
                company: "Acme".to_string(),
                title: "Engineer".to_string(),
                achievements: items.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_example_bullet_registers_metrics() {
        let cv = cv_with_achievements(&["Led a team of 5 engineers to reduce latency by 30%"]);
        let report = score_metrics(&cv, &MetricPolicy::default());
        assert!(report.metrics.contains(&"5".to_string()));
        assert!(report.metrics.contains(&"30%".to_string()));
        assert_eq!(report.score, 30);
    }

    #[test]
    fn test_currency_multipliers_and_years() {
        let metrics = extract_metrics("Saved $1.2M in 2021, grew revenue 3x and cut 40 hours");
        assert_eq!(metrics, vec!["$1.2M", "3x", "40"]);
        assert_eq!(extract_metrics("Closed deals worth 250k EUR"), vec!["250k EUR"]);
    }

    #[test]
    fn test_diminishing_returns() {
        let policy = MetricPolicy::default();
        assert_eq!(points(0, &policy), 0);
        assert_eq!(points(5, &policy), 75);
        assert_eq!(points(6, &policy), 80);
        assert_eq!(points(50, &policy), 100);
    }

    #[test]
    fn test_opportunities_lack_numbers() {
        let cv = cv_with_achievements(&[
            "Improved onboarding for new hires",
            "Reduced build times by 40%",
            "Attended weekly meetings",
        ]);
        let report = score_metrics(&cv, &MetricPolicy::default());
        assert_eq!(report.opportunities, vec!["Improved onboarding for new hires"]);
    }
}
