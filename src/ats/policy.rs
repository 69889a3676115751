// src/ats/policy.rs
//! Tunable constants for the ATS scorer and the hybrid merge

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtsPolicy {
    pub weights: BreakdownWeights,
    pub structure: StructurePolicy,
    pub keywords: KeywordPolicy,
    pub verbs: VerbPolicy,
    pub metrics: MetricPolicy,
    pub formatting: FormattingPolicy,
    pub merge: MergePolicy,
}

/// Weights of each sub-score in the local overall score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakdownWeights {
    pub structure: f64,
    pub keywords: f64,
    pub action_verbs: f64,
    pub metrics: f64,
    pub formatting: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StructurePolicy {
    pub contact_share: f64,
    pub summary_share: f64,
    pub experience_share: f64,
    pub education_share: f64,
    pub skills_share: f64,
    /// Fraction of a section's share earned as soon as the section exists
    pub present_floor: f64,
    pub summary_min_words: usize,
    pub min_skills: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordPolicy {
    pub max_reference_terms: usize,
    pub max_missing_keywords: usize,
    pub generic_keyword_target: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerbPolicy {
    pub weak_phrase_penalty: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricPolicy {
    pub metric_threshold: usize,
    pub metric_points: u32,
    pub metric_points_after: u32,
    pub max_opportunities: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormattingPolicy {
    pub graphics_penalty: u32,
    pub columns_penalty: u32,
    pub bullet_penalty: u32,
    pub overlong_penalty: u32,
    pub contact_penalty: u32,
    pub max_line_chars: usize,
    pub max_bullet_chars: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergePolicy {
    pub local_weight: f64,
    pub model_weight: f64,
    pub max_display_keywords: usize,
    pub max_display_items: usize,
}

impl Default for AtsPolicy {
    fn default() -> Self {
        Self {
            weights: BreakdownWeights::default(),
            structure: StructurePolicy::default(),
            keywords: KeywordPolicy::default(),
            verbs: VerbPolicy::default(),
            metrics: MetricPolicy::default(),
            formatting: FormattingPolicy::default(),
            merge: MergePolicy::default(),
        }
    }
}

impl Default for BreakdownWeights {
    fn default() -> Self {
        Self {
            structure: 0.25,
            keywords: 0.30,
            action_verbs: 0.15,
            metrics: 0.15,
            formatting: 0.15,
        }
    }
}

impl Default for StructurePolicy {
    fn default() -> Self {
        Self {
            contact_share: 10.0,
            summary_share: 20.0,
            experience_share: 30.0,
            education_share: 20.0,
            skills_share: 20.0,
            present_floor: 0.5,
            summary_min_words: 20,
            min_skills: 5,
        }
    }
}

impl Default for KeywordPolicy {
    fn default() -> Self {
        Self {
            max_reference_terms: 40,
            max_missing_keywords: 10,
            generic_keyword_target: 10,
        }
    }
}

impl Default for VerbPolicy {
    fn default() -> Self {
        Self {
            weak_phrase_penalty: 10,
        }
    }
}

impl Default for MetricPolicy {
    fn default() -> Self {
        Self {
            metric_threshold: 5,
            metric_points: 15,
            metric_points_after: 5,
            max_opportunities: 5,
        }
    }
}

impl Default for FormattingPolicy {
    fn default() -> Self {
        Self {
            graphics_penalty: 20,
            columns_penalty: 15,
            bullet_penalty: 10,
            overlong_penalty: 5,
            contact_penalty: 10,
            max_line_chars: 120,
            max_bullet_chars: 300,
        }
    }
}

impl Default for MergePolicy {
    fn default() -> Self {
        Self {
            local_weight: 0.4,
            model_weight: 0.6,
            max_display_keywords: 15,
            max_display_items: 8,
        }
    }
}

impl BreakdownWeights {
    fn sanitized(value: f64) -> f64 {
        if value.is_finite() && value > 0.0 {
            value
        } else {
            0.0
        }
    }

    /// Weighted mean of the five sub-scores, rounded to an integer in 0..=100.
    /// Negative or non-finite weights count as zero, and all-zero weights
    /// fall back to a plain mean.
    pub fn aggregate(&self, values: [u8; 5]) -> u8 {
        let mut weights = [
            Self::sanitized(self.structure),
            Self::sanitized(self.keywords),
            Self::sanitized(self.action_verbs),
            Self::sanitized(self.metrics),
            Self::sanitized(self.formatting),
        ];
        let mut total: f64 = weights.iter().sum();
        if total == 0.0 {
            weights = [1.0; 5];
            total = 5.0;
        }

        let weighted: f64 = weights
            .iter()
            .zip(values.iter())
            .map(|(w, v)| w * f64::from(*v))
            .sum();

        (weighted / total).round().clamp(0.0, 100.0) as u8
    }
}

impl MergePolicy {
    /// Normalized (local, model) weights
    pub fn normalized_weights(&self) -> (f64, f64) {
        let local = BreakdownWeights::sanitized(self.local_weight);
        let model = BreakdownWeights::sanitized(self.model_weight);
        let total = local + model;
        if total == 0.0 {
            (0.5, 0.5)
        } else {
            (local / total, model / total)
        }
    }
}
