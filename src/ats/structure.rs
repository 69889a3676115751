// src/ats/structure.rs
use serde::{Deserialize, Serialize};

use super::policy::StructurePolicy;
use crate::types::cv_data::{filled, filled_opt, CvDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CvSection {
    Contact,
    Summary,
    Experience,
    Education,
    Skills,
}

impl CvSection {
    pub fn label(&self) -> &'static str {
        match self {
            CvSection::Contact => "contact details",
            CvSection::Summary => "professional summary",
            CvSection::Experience => "work experience",
            CvSection::Education => "education",
            CvSection::Skills => "skills",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructureReport {
    pub score: u8,
    pub missing_sections: Vec<CvSection>,
    pub incomplete_sections: Vec<CvSection>,
}

fn fraction(present: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        present as f64 / total as f64
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    (count > 0).then(|| sum / count as f64)
}

/// Completeness in 0.0..=1.0 of each section, None when the section is absent
fn section_completeness(cv: &CvDocument, policy: &StructurePolicy) -> [(CvSection, Option<f64>); 5] {
    let info = &cv.personal_info;
    let contact_fields = [
        filled(&info.full_name),
        filled_opt(&info.email),
        filled_opt(&info.phone),
    ];
    let contact_present = contact_fields.iter().filter(|f| **f).count();
    let contact = (contact_present > 0).then(|| fraction(contact_present, contact_fields.len()));

    let summary_words = cv.summary.split_whitespace().count();
    let summary = (summary_words > 0)
        .then(|| (summary_words as f64 / policy.summary_min_words.max(1) as f64).min(1.0));

    let experience = mean(
        cv.experience
            .iter()
            .map(|exp| {
                [
                    filled(&exp.title),
                    filled(&exp.company),
                    filled_opt(&exp.start_date),
                    filled_opt(&exp.description) || exp.achievements.iter().any(|a| filled(a)),
                ]
            })
            .filter(|fields| fields.iter().any(|f| *f))
            .map(|fields| fraction(fields.iter().filter(|f| **f).count(), fields.len())),
    );

    let education = mean(
        cv.education
            .iter()
            .map(|edu| {
                [
                    filled(&edu.institution),
                    filled(&edu.degree),
                    filled_opt(&edu.start_date) || filled_opt(&edu.end_date),
                ]
            })
            .filter(|fields| fields.iter().any(|f| *f))
            .map(|fields| fraction(fields.iter().filter(|f| **f).count(), fields.len())),
    );

    let skill_count = cv.skills.count();
    let skills = (skill_count > 0)
        .then(|| (skill_count as f64 / policy.min_skills.max(1) as f64).min(1.0));

    [
        (CvSection::Contact, contact),
        (CvSection::Summary, summary),
        (CvSection::Experience, experience),
        (CvSection::Education, education),
        (CvSection::Skills, skills),
    ]
}

fn share(section: CvSection, policy: &StructurePolicy) -> f64 {
    let value = match section {
        CvSection::Contact => policy.contact_share,
        CvSection::Summary => policy.summary_share,
        CvSection::Experience => policy.experience_share,
        CvSection::Education => policy.education_share,
        CvSection::Skills => policy.skills_share,
    };
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

pub fn score_structure(cv: &CvDocument, policy: &StructurePolicy) -> StructureReport {
    let floor = policy.present_floor.clamp(0.0, 1.0);
    let sections = section_completeness(cv, policy);
    let total_share: f64 = sections.iter().map(|(s, _)| share(*s, policy)).sum();

    let mut earned = 0.0;
    let mut missing_sections = Vec::new();
    let mut incomplete_sections = Vec::new();

    for (section, completeness) in sections {
        match completeness {
            Some(c) => {
                earned += share(section, policy) * (floor + (1.0 - floor) * c);
                if c < 1.0 {
                    incomplete_sections.push(section);
                }
            }
            None => missing_sections.push(section),
        }
    }

    let score = if total_share > 0.0 {
        (earned / total_share * 100.0).round().clamp(0.0, 100.0) as u8
    } else {
        0
    };

    StructureReport {
        score,
        missing_sections,
        incomplete_sections,
    }
}
