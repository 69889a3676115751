// src/ats/keywords.rs
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use super::policy::KeywordPolicy;
use super::text::{is_significant, tokenize};
use super::vocabulary::GENERIC_VOCABULARY;
use crate::types::cv_data::CvDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordReference {
    JobDescription,
    /// No job text was supplied. The generic vocabulary is smaller and the
    /// score is looser on purpose.
    Generic,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeywordReport {
    pub score: u8,
    pub reference: KeywordReference,
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

/// Significant job-description terms ranked by frequency, ties alphabetical
fn job_reference_terms(job_description: &str, limit: usize) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for token in tokenize(job_description) {
        if is_significant(&token) {
            *counts.entry(token).or_insert(0) += 1;
        }
    }

    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(term, _)| term).collect()
}

pub fn score_keywords(
    cv: &CvDocument,
    job_description: Option<&str>,
    policy: &KeywordPolicy,
) -> KeywordReport {
    let cv_terms: BTreeSet<String> = tokenize(&cv.keyword_corpus()).into_iter().collect();

    let job_text = job_description.map(str::trim).filter(|j| !j.is_empty());
    let (reference, terms) = match job_text {
        Some(text) => {
            let terms = job_reference_terms(text, policy.max_reference_terms.max(1));
            if terms.is_empty() {
                (KeywordReference::Generic, generic_terms())
            } else {
                (KeywordReference::JobDescription, terms)
            }
        }
        None => (KeywordReference::Generic, generic_terms()),
    };

    // `terms` is in relevance order, so `missing` keeps that order
    let matched: BTreeSet<String> = terms
        .iter()
        .filter(|t| cv_terms.contains(*t))
        .cloned()
        .collect();
    let missing: Vec<String> = terms
        .iter()
        .filter(|t| !matched.contains(*t))
        .take(policy.max_missing_keywords)
        .cloned()
        .collect();

    let denominator = match reference {
        KeywordReference::JobDescription => terms.len(),
        KeywordReference::Generic => policy.generic_keyword_target.clamp(1, terms.len()),
    };
    let score = ((matched.len() as f64 / denominator as f64) * 100.0)
        .round()
        .clamp(0.0, 100.0) as u8;

    KeywordReport {
        score,
        reference,
        matched: matched.into_iter().collect(),
        missing,
    }
}

fn generic_terms() -> Vec<String> {
    GENERIC_VOCABULARY.iter().map(|t| t.to_string()).collect()
}
