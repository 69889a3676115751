// src/ats/vocabulary.rs
//! Word lists used by the heuristic scorer

pub const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "etc",
    "every", "few", "for", "from", "further", "had", "has", "have", "having", "he", "her",
    "here", "hers", "him", "his", "how", "i", "if", "in", "into", "is", "it", "its", "itself",
    "just", "like", "looking", "may", "me", "more", "most", "must", "my", "no", "nor", "not",
    "of", "off", "on", "once", "only", "or", "other", "our", "ours", "out", "over", "own",
    "per", "plus", "role", "same", "she", "should", "so", "some", "such", "than", "that",
    "the", "their", "theirs", "them", "then", "there", "these", "they", "this", "those",
    "through", "to", "too", "under", "until", "up", "us", "very", "via", "was", "we", "well",
    "were", "what", "when", "where", "which", "while", "who", "whom", "why", "will", "with",
    "within", "would", "year", "years", "you", "your", "yours", "join", "ideal", "candidate",
    "job", "position", "company", "team", "work", "working", "strong", "good", "great",
    "ability", "able", "including", "new", "using", "use", "based", "across",
    "responsibilities", "requirements", "required", "preferred", "experience", "skills",
    "knowledge", "opportunity", "offer", "apply", "please",
];

/// Short tokens that are still meaningful keywords
pub const SHORT_TERMS: &[&str] = &[
    "ai", "ml", "ui", "ux", "qa", "go", "r", "c", "c#", "c++", "f#", "js", "ts", "db", "bi",
    "hr", "pm", "seo", "sql", "aws", "gcp", "api", "css", "php", "erp", "crm", "sap",
    "git", "k8s", "ios", "mba", "b2b", "b2c", "kpi", "etl", "cad",
];

/// Reference vocabulary when no job description is supplied
pub const GENERIC_VOCABULARY: &[&str] = &[
    "analysis", "budget", "collaboration", "communication", "customer", "data", "delivered",
    "design", "development", "improved", "leadership", "management", "mentoring",
    "negotiation", "operations", "optimization", "planning", "problem-solving", "process",
    "project", "quality", "reporting", "research", "sales", "stakeholders", "strategy",
    "teamwork", "training",
];

pub const STRONG_VERBS: &[&str] = &[
    "accelerated", "achieved", "administered", "analyzed", "architected", "automated",
    "boosted", "built", "championed", "coached", "collaborated", "completed", "conceived",
    "consolidated", "coordinated", "created", "cut", "decreased", "delivered", "deployed",
    "designed", "developed", "directed", "doubled", "drove", "eliminated", "enabled",
    "engineered", "established", "exceeded", "executed", "expanded", "facilitated",
    "founded", "generated", "grew", "headed", "identified", "implemented", "improved",
    "increased", "initiated", "installed", "instituted", "integrated", "introduced",
    "launched", "led", "managed", "maximized", "mentored", "migrated", "minimized",
    "modernized", "negotiated", "optimized", "orchestrated", "organized", "outperformed",
    "oversaw", "pioneered", "planned", "produced", "programmed", "published", "rebuilt",
    "redesigned", "reduced", "refactored", "reorganized", "resolved", "restructured",
    "revamped", "saved", "scaled", "secured", "shipped", "simplified", "spearheaded",
    "standardized", "streamlined", "strengthened", "supervised", "tripled", "trained",
    "transformed", "upgraded", "won",
];

pub const WEAK_PHRASES: &[&str] = &[
    "responsible for",
    "helped with",
    "helped to",
    "assisted with",
    "assisted in",
    "worked on",
    "involved in",
    "participated in",
    "duties included",
    "tasked with",
    "in charge of",
    "familiar with",
];

/// Words that make a statement read like an achievement
pub const ACHIEVEMENT_WORDS: &[&str] = &[
    "improved", "increased", "reduced", "decreased", "saved", "grew", "boosted", "cut",
    "accelerated", "raised", "lowered", "generated", "exceeded", "doubled", "tripled",
    "expanded", "maximized", "minimized", "optimized", "revenue", "growth", "efficiency",
    "cost", "costs", "faster", "savings",
];

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(&word)
}

pub fn is_short_term(word: &str) -> bool {
    SHORT_TERMS.contains(&word)
}

pub fn is_strong_verb(word: &str) -> bool {
    STRONG_VERBS.contains(&word)
}

pub fn is_achievement_word(word: &str) -> bool {
    ACHIEVEMENT_WORDS.contains(&word)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_word_lists_have_no_unreachable_entries() {
        let mut seen = HashSet::new();
        for word in STOP_WORDS {
            assert!(seen.insert(*word), "duplicate stop-word {}", word);
            assert!(!word.ends_with('.'), "{} can never match a trimmed token", word);
        }
        for term in SHORT_TERMS {
            assert!(!is_stop_word(term), "{} is shadowed by the stop-words", term);
        }
    }
}
