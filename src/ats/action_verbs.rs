// src/ats/action_verbs.rs
use super::policy::VerbPolicy;
use super::text::{first_word, statements};
use super::vocabulary::{is_strong_verb, WEAK_PHRASES};
use crate::types::cv_data::CvDocument;

#[derive(Debug, Clone, PartialEq)]
pub struct VerbReport {
    pub score: u8,
    pub statement_count: usize,
    pub strong_statement_count: usize,
    /// Strong verbs as written in the CV, first-seen order
    pub strong_verbs: Vec<String>,
    pub weak_phrases: Vec<String>,
}

pub fn score_action_verbs(cv: &CvDocument, policy: &VerbPolicy) -> VerbReport {
    let mut statement_count = 0;
    let mut strong_statement_count = 0;
    let mut strong_verbs: Vec<String> = Vec::new();
    let mut weak_hits = 0u32;
    let mut weak_phrases: Vec<String> = Vec::new();

    for source in cv.statement_sources() {
        for statement in statements(source) {
            statement_count += 1;

            if let Some(word) = first_word(&statement) {
                if is_strong_verb(&word.to_lowercase()) {
                    strong_statement_count += 1;
                    if !strong_verbs.iter().any(|v| v.eq_ignore_ascii_case(word)) {
                        strong_verbs.push(word.to_string());
                    }
                }
            }

            let lowered = statement.to_lowercase();
            for phrase in WEAK_PHRASES {
                let hits = lowered.matches(phrase).count() as u32;
                if hits > 0 {
                    weak_hits += hits;
                    if !weak_phrases.iter().any(|p| p == phrase) {
                        weak_phrases.push(phrase.to_string());
                    }
                }
            }
        }
    }

    let score = if statement_count == 0 {
        0
    } else {
        let density = strong_statement_count as f64 / statement_count as f64 * 100.0;
        let penalty = f64::from(weak_hits.saturating_mul(policy.weak_phrase_penalty));
        (density - penalty).round().clamp(0.0, 100.0) as u8
    };

    VerbReport {
        score,
        statement_count,
        strong_statement_count,
        strong_verbs,
        weak_phrases,
    }
}
