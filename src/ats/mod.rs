// src/ats/mod.rs
//! Heuristic ATS compatibility scoring

pub mod action_verbs;
pub mod analyzer;
pub mod formatting;
pub mod keywords;
pub mod merge;
pub mod metrics;
pub mod policy;
pub mod structure;
pub mod text;
pub mod vocabulary;

pub use analyzer::{AnalysisMode, AnalysisOutcome, AnalysisPhase, AnalysisService};
pub use keywords::KeywordReference;
pub use merge::ModelAssessment;
pub use policy::AtsPolicy;

use serde::{Deserialize, Serialize};

use crate::types::cv_data::CvDocument;
use formatting::FormattingIssue;
use structure::CvSection;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub structure: u8,
    pub keywords: u8,
    pub action_verbs: u8,
    pub metrics: u8,
    pub formatting: u8,
}

impl ScoreBreakdown {
    pub fn values(&self) -> [u8; 5] {
        [
            self.structure,
            self.keywords,
            self.action_verbs,
            self.metrics,
            self.formatting,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    Local,
    Hybrid,
    /// Hybrid was requested but only the local heuristic is in the result
    LocalFallback,
}

/// Per-heuristic findings for display next to the scores
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDetails {
    pub missing_sections: Vec<CvSection>,
    pub strong_verbs: Vec<String>,
    pub weak_phrases: Vec<String>,
    pub metrics_found: Vec<String>,
    pub metric_opportunities: Vec<String>,
    pub formatting_issues: Vec<FormattingIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub score: u8,
    pub breakdown: ScoreBreakdown,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub suggestions: Vec<String>,
    pub strengths: Vec<String>,
    pub details: AnalysisDetails,
    pub keyword_reference: KeywordReference,
    pub source: AnalysisSource,
}

const STRENGTH_THRESHOLD: u8 = 80;

/// Run every heuristic over the document. Deterministic for a given input.
pub fn analyze_local(
    cv: &CvDocument,
    job_description: Option<&str>,
    policy: &AtsPolicy,
) -> AnalysisResult {
    let structure = structure::score_structure(cv, &policy.structure);
    let keywords = keywords::score_keywords(cv, job_description, &policy.keywords);
    let verbs = action_verbs::score_action_verbs(cv, &policy.verbs);
    let metrics = metrics::score_metrics(cv, &policy.metrics);
    let formatting = formatting::score_formatting(cv, &policy.formatting);

    let breakdown = ScoreBreakdown {
        structure: structure.score,
        keywords: keywords.score,
        action_verbs: verbs.score,
        metrics: metrics.score,
        formatting: formatting.score,
    };

    let mut suggestions = Vec::new();
    let mut strengths = Vec::new();

    for section in &structure.missing_sections {
        suggestions.push(format!("Add a {} section", section.label()));
    }
    for section in &structure.incomplete_sections {
        suggestions.push(format!("Complete the {} section", section.label()));
    }

    if !keywords.missing.is_empty() {
        let preview: Vec<&str> = keywords.missing.iter().take(5).map(String::as_str).collect();
        let target = match keywords.reference {
            KeywordReference::JobDescription => "from the job description",
            KeywordReference::Generic => "recruiters commonly search for",
        };
        suggestions.push(format!(
            "Work in keywords {}: {}",
            target,
            preview.join(", ")
        ));
    }
    if keywords.reference == KeywordReference::Generic {
        suggestions.push("Paste a job description for a tailored keyword match".to_string());
    }

    if verbs.statement_count == 0 {
        suggestions.push("Describe your experience with achievement bullets".to_string());
    } else if verbs.strong_statement_count * 2 < verbs.statement_count {
        suggestions.push("Start more bullets with strong action verbs (led, built, reduced)".to_string());
    }
    for phrase in &verbs.weak_phrases {
        suggestions.push(format!("Replace \"{}\" with a specific action verb", phrase));
    }

    if metrics.metrics.is_empty() {
        suggestions.push("Quantify results with numbers, percentages or amounts".to_string());
    }
    for statement in &metrics.opportunities {
        suggestions.push(format!("Add a measurable result to: \"{}\"", statement));
    }

    for issue in &formatting.issues {
        suggestions.push(format!("Fix formatting in {}: {}", issue.field, issue.detail));
    }

    if breakdown.structure >= STRENGTH_THRESHOLD {
        strengths.push("All key sections are present and filled in".to_string());
    }
    if breakdown.keywords >= STRENGTH_THRESHOLD {
        strengths.push("Strong keyword coverage".to_string());
    }
    if !verbs.strong_verbs.is_empty() && breakdown.action_verbs >= STRENGTH_THRESHOLD {
        strengths.push(format!(
            "Bullets open with strong verbs such as {}",
            verbs
                .strong_verbs
                .iter()
                .take(3)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    if metrics.metrics.len() >= policy.metrics.metric_threshold.max(1) {
        strengths.push(format!(
            "{} quantified achievements",
            metrics.metrics.len()
        ));
    }
    if breakdown.formatting == 100 {
        strengths.push("Clean, ATS-safe formatting".to_string());
    }

    AnalysisResult {
        score: policy.weights.aggregate(breakdown.values()),
        breakdown,
        matched_keywords: keywords.matched,
        missing_keywords: keywords.missing,
        suggestions,
        strengths,
        details: AnalysisDetails {
            missing_sections: structure.missing_sections,
            strong_verbs: verbs.strong_verbs,
            weak_phrases: verbs.weak_phrases,
            metrics_found: metrics.metrics,
            metric_opportunities: metrics.opportunities,
            formatting_issues: formatting.issues,
        },
        keyword_reference: keywords.reference,
        source: AnalysisSource::Local,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::cv_data::{Education, Experience};

    fn sample_cv() -> CvDocument {
        let mut cv = CvDocument::default();
        cv.personal_info.full_name = "Grace Hopper".to_string();
        cv.personal_info.email = Some("grace@example.com".to_string());
        cv.summary = "Engineering leader focused on compilers and developer tooling".to_string();
        cv.experience.push(Experience {
            company: "Navy".to_string(),
            title: "Engineering Lead".to_string(),
            start_date: Some("1943".to_string()),
            achievements: vec![
                "Led a team of 5 engineers to reduce latency by 30%".to_string(),
                "Responsible for compiler maintenance".to_string(),
            ],
            ..Default::default()
        });
        cv.education.push(Education {
            institution: "Yale".to_string(),
            degree: "PhD Mathematics".to_string(),
            end_date: Some("1934".to_string()),
            ..Default::default()
        });
        cv.skills.technical = vec!["COBOL".to_string(), "Compilers".to_string()];
        cv
    }

    #[test]
    fn test_empty_cv_analysis_is_valid() {
        let result = analyze_local(&CvDocument::default(), None, &AtsPolicy::default());
        assert!(result.score <= 100);
        assert!(result.breakdown.structure < 20);
        assert_eq!(result.details.missing_sections.len(), 5);
        assert!(!result.suggestions.is_empty());
    }

    #[test]
    fn test_local_analysis_is_deterministic() {
        let cv = sample_cv();
        let job = "Compiler engineer with COBOL and Rust, leading teams";
        let policy = AtsPolicy::default();
        let first = analyze_local(&cv, Some(job), &policy);
        let second = analyze_local(&cv, Some(job), &policy);
        assert_eq!(first, second);
    }

    #[test]
    fn test_example_bullet_details() {
        let result = analyze_local(&sample_cv(), None, &AtsPolicy::default());
        assert!(result.details.strong_verbs.contains(&"Led".to_string()));
        assert!(result.details.metrics_found.contains(&"5".to_string()));
        assert!(result.details.metrics_found.contains(&"30%".to_string()));
        assert_eq!(result.details.weak_phrases, vec!["responsible for"]);
        assert_eq!(result.keyword_reference, KeywordReference::Generic);
    }

    #[test]
    fn test_score_bounds_and_disjoint_keywords() {
        let cv = sample_cv();
        for job in [None, Some(""), Some("cobol cobol compilers rust go")] {
            let result = analyze_local(&cv, job, &AtsPolicy::default());
            assert!(result.score <= 100);
            for keyword in &result.matched_keywords {
                assert!(!result.missing_keywords.contains(keyword));
            }
        }
    }
}
