// src/ats/merge.rs
//! Blends a model-generated assessment into a local analysis

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::policy::MergePolicy;
use super::{AnalysisResult, AnalysisSource, ScoreBreakdown};

/// Breakdown as reported by the model; any field may be absent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialBreakdown {
    pub structure: Option<f64>,
    pub keywords: Option<f64>,
    pub action_verbs: Option<f64>,
    pub metrics: Option<f64>,
    pub formatting: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAssessment {
    pub score: f64,
    #[serde(default)]
    pub breakdown: PartialBreakdown,
    #[serde(default)]
    pub matched_keywords: Vec<String>,
    #[serde(default)]
    pub missing_keywords: Vec<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
    #[serde(default)]
    pub strengths: Vec<String>,
}

impl ModelAssessment {
    /// Parse the model's text output. A fenced ```json block is accepted.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let body = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .and_then(|rest| rest.trim_end().strip_suffix("```"))
            .unwrap_or(trimmed)
            .trim();

        let assessment: ModelAssessment =
            serde_json::from_str(body).context("Model assessment is not valid JSON")?;
        assessment.validate()?;
        Ok(assessment)
    }

    fn validate(&self) -> Result<()> {
        if !self.score.is_finite() {
            anyhow::bail!("Model assessment score is not a finite number");
        }
        let b = &self.breakdown;
        for value in [b.structure, b.keywords, b.action_verbs, b.metrics, b.formatting]
            .into_iter()
            .flatten()
        {
            if !value.is_finite() {
                anyhow::bail!("Model assessment breakdown contains a non-finite value");
            }
        }
        Ok(())
    }
}

fn clamp_score(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn blend_field(local: u8, model: Option<f64>) -> u8 {
    match model.filter(|v| v.is_finite()) {
        Some(m) => clamp_score((f64::from(local) + m.clamp(0.0, 100.0)) / 2.0),
        None => local,
    }
}

/// Case-insensitive union preserving first-seen order, truncated to `limit`
fn union_capped(first: &[String], second: &[String], limit: usize) -> Vec<String> {
    let mut seen = HashSet::new();
    first
        .iter()
        .chain(second)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_lowercase()))
        .take(limit)
        .map(str::to_string)
        .collect()
}

pub fn merge_results(
    local: &AnalysisResult,
    model: &ModelAssessment,
    policy: &MergePolicy,
) -> AnalysisResult {
    let (local_weight, model_weight) = policy.normalized_weights();
    let model_score = model.score.clamp(0.0, 100.0);
    let score = clamp_score(f64::from(local.score) * local_weight + model_score * model_weight);

    let lb = &local.breakdown;
    let mb = &model.breakdown;
    let breakdown = ScoreBreakdown {
        structure: blend_field(lb.structure, mb.structure),
        keywords: blend_field(lb.keywords, mb.keywords),
        action_verbs: blend_field(lb.action_verbs, mb.action_verbs),
        metrics: blend_field(lb.metrics, mb.metrics),
        formatting: blend_field(lb.formatting, mb.formatting),
    };

    let matched_keywords = union_capped(
        &local.matched_keywords,
        &model.matched_keywords,
        policy.max_display_keywords,
    );
    // Filter against every matched term, not just the displayed ones
    let matched_lower: HashSet<String> = local
        .matched_keywords
        .iter()
        .chain(&model.matched_keywords)
        .map(|k| k.trim().to_lowercase())
        .collect();
    let missing_candidates: Vec<String> = local
        .missing_keywords
        .iter()
        .chain(&model.missing_keywords)
        .filter(|k| !matched_lower.contains(&k.trim().to_lowercase()))
        .cloned()
        .collect();
    let missing_keywords = union_capped(&missing_candidates, &[], policy.max_display_keywords);

    AnalysisResult {
        score,
        breakdown,
        matched_keywords,
        missing_keywords,
        suggestions: union_capped(
            &model.suggestions,
            &local.suggestions,
            policy.max_display_items,
        ),
        strengths: union_capped(&model.strengths, &local.strengths, policy.max_display_items),
        details: local.details.clone(),
        keyword_reference: local.keyword_reference,
        source: AnalysisSource::Hybrid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ats::{analyze_local, policy::AtsPolicy};
    use crate::types::cv_data::CvDocument;

    fn local_result() -> AnalysisResult {
        let mut cv = CvDocument::default();
        cv.summary = "Rust engineer building data platforms".to_string();
        analyze_local(&cv, Some("rust kafka kubernetes"), &AtsPolicy::default())
    }

    #[test]
    fn test_weighted_score_and_field_means() {
        let local = local_result();
        let model = ModelAssessment {
            score: 90.0,
            breakdown: PartialBreakdown {
                keywords: Some(80.0),
                ..Default::default()
            },
            matched_keywords: vec![],
            missing_keywords: vec![],
            suggestions: vec![],
            strengths: vec![],
        };
        let merged = merge_results(&local, &model, &MergePolicy::default());

        let expected = (f64::from(local.score) * 0.4 + 54.0).round() as u8;
        assert_eq!(merged.score, expected);
        assert_eq!(
            merged.breakdown.keywords,
            ((f64::from(local.breakdown.keywords) + 80.0) / 2.0).round() as u8
        );
        assert_eq!(merged.breakdown.structure, local.breakdown.structure);
        assert_eq!(merged.source, AnalysisSource::Hybrid);
    }

    #[test]
    fn test_lists_are_deduplicated_capped_and_disjoint() {
        let local = local_result();
        let model = ModelAssessment {
            score: 150.0,
            breakdown: PartialBreakdown::default(),
            matched_keywords: vec!["Kafka".to_string(), "RUST".to_string()],
            missing_keywords: vec!["terraform".to_string(), "kafka".to_string()],
            suggestions: (0..20).map(|i| format!("Suggestion {}", i)).collect(),
            strengths: vec![],
        };
        let merged = merge_results(&local, &model, &MergePolicy::default());

        assert!(merged.score <= 100);
        assert_eq!(merged.matched_keywords, vec!["rust", "Kafka"]);
        assert!(!merged
            .missing_keywords
            .iter()
            .any(|k| k.eq_ignore_ascii_case("kafka")));
        assert!(merged.missing_keywords.contains(&"terraform".to_string()));
        assert_eq!(merged.suggestions.len(), 8);
    }

    #[test]
    fn test_keyword_matched_past_display_cap_is_never_missing() {
        let terms: Vec<String> = (0..20).map(|i| format!("term{}", i)).collect();
        let mut cv = CvDocument::default();
        cv.summary = terms.join(" ");
        let local = analyze_local(&cv, Some(&terms.join(" ")), &AtsPolicy::default());
        assert_eq!(local.matched_keywords.len(), 20);

        let model = ModelAssessment {
            score: 70.0,
            breakdown: PartialBreakdown::default(),
            matched_keywords: vec![],
            missing_keywords: vec!["term19".to_string(), "terraform".to_string()],
            suggestions: vec![],
            strengths: vec![],
        };
        let merged = merge_results(&local, &model, &MergePolicy::default());

        assert_eq!(merged.matched_keywords.len(), 15);
        assert_eq!(merged.missing_keywords, vec!["terraform"]);
    }

    #[test]
    fn test_parse_accepts_fenced_json() {
        let raw = "```json\n{\"score\": 72, \"breakdown\": {\"metrics\": 40}}\n```";
        let assessment = ModelAssessment::parse(raw).unwrap();
        assert_eq!(assessment.score, 72.0);
        assert_eq!(assessment.breakdown.metrics, Some(40.0));
    }

    #[test]
    fn test_parse_rejects_malformed_payloads() {
        assert!(ModelAssessment::parse("Your CV looks great!").is_err());
        assert!(ModelAssessment::parse(r#"{"breakdown": {}}"#).is_err());
    }
}
