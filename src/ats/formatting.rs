// src/ats/formatting.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::policy::FormattingPolicy;
use super::text::{leading_bullet, PLAIN_BULLETS};
use crate::types::cv_data::{looks_like_email, CvDocument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormattingIssueKind {
    EmbeddedGraphics,
    MultiColumn,
    UnusualBullets,
    MixedBullets,
    OverlongField,
    UnparseableContact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattingIssue {
    pub kind: FormattingIssueKind,
    pub field: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FormattingReport {
    pub score: u8,
    pub issues: Vec<FormattingIssue>,
}

/// A text field of the document with a path for reporting
struct Field<'a> {
    path: String,
    text: &'a str,
    single_line: bool,
}

fn line<'a>(fields: &mut Vec<Field<'a>>, path: String, text: &'a str) {
    fields.push(Field {
        path,
        text,
        single_line: true,
    });
}

fn collect_fields(cv: &CvDocument) -> Vec<Field<'_>> {
    let mut fields = Vec::new();

    let info = &cv.personal_info;
    line(&mut fields, "personal_info.full_name".into(), info.full_name.as_str());
    for (name, value) in [
        ("headline", &info.headline),
        ("email", &info.email),
        ("phone", &info.phone),
        ("location", &info.location),
        ("linkedin", &info.linkedin),
        ("website", &info.website),
    ] {
        if let Some(v) = value.as_deref() {
            line(&mut fields, format!("personal_info.{}", name), v);
        }
    }

    fields.push(Field {
        path: "summary".into(),
        text: &cv.summary,
        single_line: false,
    });

    for (i, exp) in cv.experience.iter().enumerate() {
        line(&mut fields, format!("experience[{}].company", i), exp.company.as_str());
        line(&mut fields, format!("experience[{}].title", i), exp.title.as_str());
        if let Some(desc) = exp.description.as_deref() {
            fields.push(Field {
                path: format!("experience[{}].description", i),
                text: desc,
                single_line: false,
            });
        }
        for (j, item) in exp.achievements.iter().enumerate() {
            fields.push(Field {
                path: format!("experience[{}].achievements[{}]", i, j),
                text: item,
                single_line: false,
            });
        }
    }

    for (i, edu) in cv.education.iter().enumerate() {
        line(&mut fields, format!("education[{}].institution", i), edu.institution.as_str());
        line(&mut fields, format!("education[{}].degree", i), edu.degree.as_str());
        if let Some(desc) = edu.description.as_deref() {
            fields.push(Field {
                path: format!("education[{}].description", i),
                text: desc,
                single_line: false,
            });
        }
    }

    for (category, items) in [
        ("technical", &cv.skills.technical),
        ("soft", &cv.skills.soft),
        ("languages", &cv.skills.languages),
        ("certifications", &cv.skills.certifications),
    ] {
        for (j, item) in items.iter().enumerate() {
            line(&mut fields, format!("skills.{}[{}]", category, j), item.as_str());
        }
    }

    for (i, project) in cv.projects.iter().enumerate() {
        line(&mut fields, format!("projects[{}].name", i), project.name.as_str());
        fields.push(Field {
            path: format!("projects[{}].description", i),
            text: &project.description,
            single_line: false,
        });
    }

    fields.retain(|f| !f.text.trim().is_empty());
    fields
}

fn is_pictographic(c: char) -> bool {
    matches!(
        c as u32,
        0x1F300..=0x1FAFF | 0x2600..=0x26FF | 0x2700..=0x27BF | 0x1F000..=0x1F2FF | 0xFE0F
    ) && !super::text::BULLET_GLYPHS.contains(&c)
}

fn has_embedded_graphics(text: &str) -> bool {
    let lowered = text.to_lowercase();
    lowered.contains("<img")
        || lowered.contains("data:image")
        || lowered.contains("<svg")
        || text.contains("![")
        || text.chars().any(is_pictographic)
}

fn has_column_markers(text: &str) -> bool {
    text.lines().any(|line| {
        let inner = line.trim();
        inner.contains('\t') || inner.matches('|').count() >= 2 || inner.contains("   ")
    })
}

pub fn score_formatting(cv: &CvDocument, policy: &FormattingPolicy) -> FormattingReport {
    let mut issues = Vec::new();
    let mut bullet_styles: BTreeSet<char> = BTreeSet::new();

    for field in collect_fields(cv) {
        if has_embedded_graphics(field.text) {
            issues.push(FormattingIssue {
                kind: FormattingIssueKind::EmbeddedGraphics,
                field: field.path.clone(),
                detail: "Images, icons or emoji are not read by ATS parsers".to_string(),
            });
        }

        if has_column_markers(field.text) {
            issues.push(FormattingIssue {
                kind: FormattingIssueKind::MultiColumn,
                field: field.path.clone(),
                detail: "Tabs, table pipes or aligned spacing suggest a column layout".to_string(),
            });
        }

        for line in field.text.lines() {
            if let Some(glyph) = leading_bullet(line) {
                bullet_styles.insert(glyph);
            }
        }

        let limit = if field.single_line {
            policy.max_line_chars
        } else {
            policy.max_bullet_chars
        };
        let longest = field
            .text
            .lines()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);
        let line_count = field.text.lines().count();
        let detail = if longest > limit {
            Some(format!("Line of {} characters exceeds {}", longest, limit))
        } else if field.single_line && line_count > 1 {
            Some(format!("Single-line field spans {} lines", line_count))
        } else {
            None
        };
        if let Some(detail) = detail {
            issues.push(FormattingIssue {
                kind: FormattingIssueKind::OverlongField,
                field: field.path.clone(),
                detail,
            });
        }
    }

    let unusual: Vec<char> = bullet_styles
        .iter()
        .copied()
        .filter(|c| !PLAIN_BULLETS.contains(c))
        .collect();
    if !unusual.is_empty() {
        issues.push(FormattingIssue {
            kind: FormattingIssueKind::UnusualBullets,
            field: "document".to_string(),
            detail: format!(
                "Unusual bullet characters: {}",
                unusual.iter().collect::<String>()
            ),
        });
    }
    if bullet_styles.len() > 1 {
        issues.push(FormattingIssue {
            kind: FormattingIssueKind::MixedBullets,
            field: "document".to_string(),
            detail: format!(
                "{} different bullet styles are used",
                bullet_styles.len()
            ),
        });
    }

    if let Some(email) = cv.personal_info.email.as_deref() {
        if !email.trim().is_empty() && !looks_like_email(email) {
            issues.push(FormattingIssue {
                kind: FormattingIssueKind::UnparseableContact,
                field: "personal_info.email".to_string(),
                detail: "Email address cannot be parsed".to_string(),
            });
        }
    }

    let deduction: u32 = issues
        .iter()
        .map(|issue| match issue.kind {
            FormattingIssueKind::EmbeddedGraphics => policy.graphics_penalty,
            FormattingIssueKind::MultiColumn => policy.columns_penalty,
            FormattingIssueKind::UnusualBullets | FormattingIssueKind::MixedBullets => {
                policy.bullet_penalty
            }
            FormattingIssueKind::OverlongField => policy.overlong_penalty,
            FormattingIssueKind::UnparseableContact => policy.contact_penalty,
        })
        .fold(0u32, |acc, p| acc.saturating_add(p));

    FormattingReport {
        score: 100u32.saturating_sub(deduction) as u8,
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::cv_data::Experience;

    fn kinds(report: &FormattingReport) -> Vec<FormattingIssueKind> {
        report.issues.iter().map(|i| i.kind).collect()
    }

    #[test]
    fn test_clean_cv_scores_full() {
        let mut cv = CvDocument::default();
        cv.personal_info.full_name = "Ada Lovelace".to_string();
        cv.personal_info.email = Some("ada@example.com".to_string());
        cv.summary = "Engineer.\n• First\n• Second".to_string();
        let report = score_formatting(&cv, &FormattingPolicy::default());
        assert_eq!(report.score, 100);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_graphics_columns_and_bullets() {
        let mut cv = CvDocument::default();
        cv.personal_info.full_name = "Ada 🚀".to_string();
        cv.summary = "Skills | Tools | Years\n➢ one\n• two".to_string();
        let report = score_formatting(&cv, &FormattingPolicy::default());
        assert_eq!(
            kinds(&report),
            vec![
                FormattingIssueKind::EmbeddedGraphics,
                FormattingIssueKind::MultiColumn,
                FormattingIssueKind::UnusualBullets,
                FormattingIssueKind::MixedBullets,
            ]
        );
        assert_eq!(report.score, 100 - 20 - 15 - 10 - 10);
    }

    #[test]
    fn test_line_break_in_single_line_field() {
        let mut cv = CvDocument::default();
        cv.personal_info.full_name = "Ada\nLovelace".to_string();
        let report = score_formatting(&cv, &FormattingPolicy::default());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].field, "personal_info.full_name");
        assert_eq!(report.issues[0].detail, "Single-line field spans 2 lines");
    }

    #[test]
    fn test_overlong_fields_and_floor() {
        let mut cv = CvDocument::default();
        cv.personal_info.email = Some("not-an-email".to_string());
        for _ in 0..30 {
            cv.experience.push(Experience {
                company: "x".repeat(200),
                title: "Dev".to_string(),
                ..Default::default()
            });
        }
        let report = score_formatting(&cv, &FormattingPolicy::default());
        assert!(kinds(&report).contains(&FormattingIssueKind::OverlongField));
        assert!(kinds(&report).contains(&FormattingIssueKind::UnparseableContact));
        assert_eq!(report.score, 0);
    }
}
