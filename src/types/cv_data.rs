// src/types/cv_data.rs
//! Structured CV document shared by the builder, the ATS scorer and export

use serde::{Deserialize, Serialize};

// ===== CV Document =====

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CvDocument {
    pub personal_info: PersonalInfo,
    pub summary: String,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Skills,
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalInfo {
    pub full_name: String,
    pub headline: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub company: String,
    pub title: String,
    pub location: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>, // None with `current` means ongoing
    pub current: bool,
    pub description: Option<String>,
    pub achievements: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub field: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Skills {
    pub technical: Vec<String>,
    pub soft: Vec<String>,
    pub languages: Vec<String>,
    pub certifications: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Project {
    pub name: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub url: Option<String>,
}

// ===== Helpers =====

pub(crate) fn filled(value: &str) -> bool {
    !value.trim().is_empty()
}

pub(crate) fn filled_opt(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(filled)
}

impl Skills {
    pub fn all(&self) -> impl Iterator<Item = &String> {
        self.technical
            .iter()
            .chain(&self.soft)
            .chain(&self.languages)
            .chain(&self.certifications)
            .filter(|s| filled(s))
    }

    pub fn count(&self) -> usize {
        self.all().count()
    }
}

impl Experience {
    /// Date range as shown on the rendered CV. `present` labels an
    /// ongoing position.
    pub fn date_range(&self, present: &str) -> Option<String> {
        let start = self.start_date.as_deref().filter(|s| filled(s));
        let end = match self.end_date.as_deref().filter(|s| filled(s)) {
            Some(end) => Some(end),
            None if self.current => Some(present),
            None => None,
        };
        match (start, end) {
            (Some(s), Some(e)) => Some(format!("{} - {}", s, e)),
            (Some(s), None) => Some(s.to_string()),
            (None, Some(e)) => Some(e.to_string()),
            (None, None) => None,
        }
    }
}

impl Education {
    pub fn date_range(&self) -> Option<String> {
        let start = self.start_date.as_deref().filter(|s| filled(s));
        let end = self.end_date.as_deref().filter(|s| filled(s));
        match (start, end) {
            (Some(s), Some(e)) => Some(format!("{} - {}", s, e)),
            (Some(s), None) => Some(s.to_string()),
            (None, Some(e)) => Some(e.to_string()),
            (None, None) => None,
        }
    }
}

impl CvDocument {
    /// Free-text statements that describe work: descriptions, achievements
    /// and project descriptions, in document order.
    pub fn statement_sources(&self) -> Vec<&str> {
        let mut sources = Vec::new();
        for exp in &self.experience {
            if let Some(desc) = exp.description.as_deref() {
                sources.push(desc);
            }
            sources.extend(exp.achievements.iter().map(String::as_str));
        }
        sources.extend(self.projects.iter().map(|p| p.description.as_str()));
        sources.retain(|s| filled(s));
        sources
    }

    /// All free text that carries vocabulary, for keyword matching
    pub fn keyword_corpus(&self) -> String {
        let mut parts: Vec<&str> = vec![self.summary.as_str()];
        if let Some(headline) = self.personal_info.headline.as_deref() {
            parts.push(headline);
        }
        for exp in &self.experience {
            parts.push(&exp.title);
            if let Some(desc) = exp.description.as_deref() {
                parts.push(desc);
            }
            parts.extend(exp.achievements.iter().map(String::as_str));
        }
        for edu in &self.education {
            parts.push(&edu.degree);
            if let Some(field) = edu.field.as_deref() {
                parts.push(field);
            }
        }
        parts.extend(self.skills.all().map(String::as_str));
        for project in &self.projects {
            parts.push(&project.name);
            parts.push(&project.description);
            parts.extend(project.technologies.iter().map(String::as_str));
        }
        parts.join("\n")
    }

    /// Check the fields a CV record needs before it can be saved
    pub fn validate_for_save(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();

        if !filled(&self.personal_info.full_name) {
            issues.push(ValidationIssue::new(
                "personal_info.full_name",
                "Full name is required",
            ));
        }

        if let Some(email) = self.personal_info.email.as_deref().filter(|e| filled(e)) {
            if !looks_like_email(email) {
                issues.push(ValidationIssue::new(
                    "personal_info.email",
                    "Email address is not valid",
                ));
            }
        }

        for (idx, exp) in self.experience.iter().enumerate() {
            if !filled(&exp.company) && !filled(&exp.title) {
                issues.push(ValidationIssue::new(
                    &format!("experience[{}]", idx),
                    "Experience entries need a company or a title",
                ));
            }
        }

        for (idx, edu) in self.education.iter().enumerate() {
            if !filled(&edu.institution) && !filled(&edu.degree) {
                issues.push(ValidationIssue::new(
                    &format!("education[{}]", idx),
                    "Education entries need an institution or a degree",
                ));
            }
        }

        issues
    }
}

pub fn looks_like_email(email: &str) -> bool {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl ValidationIssue {
    pub fn new(field: &str, message: &str) -> Self {
        Self {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_deserializes() {
        let cv: CvDocument =
            serde_json::from_str(r#"{"personal_info": {"full_name": "Ada"}}"#).unwrap();
        assert_eq!(cv.personal_info.full_name, "Ada");
        assert!(cv.experience.is_empty());
        assert!(cv.summary.is_empty());
    }

    #[test]
    fn test_validate_for_save() {
        let mut cv = CvDocument::default();
        let issues = cv.validate_for_save();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].field, "personal_info.full_name");

        cv.personal_info.full_name = "Ada Lovelace".to_string();
        cv.personal_info.email = Some("ada.example.com".to_string());
        cv.experience.push(Experience::default());
        let fields: Vec<String> = cv
            .validate_for_save()
            .into_iter()
            .map(|i| i.field)
            .collect();
        assert_eq!(fields, vec!["personal_info.email", "experience[0]"]);
    }

    #[test]
    fn test_looks_like_email() {
        assert!(looks_like_email("ada@example.com"));
        assert!(!looks_like_email("ada@example"));
        assert!(!looks_like_email("ada example@x.com"));
        assert!(!looks_like_email("@example.com"));
    }

    #[test]
    fn test_experience_date_range() {
        let exp = Experience {
            start_date: Some("2020".to_string()),
            current: true,
            ..Default::default()
        };
        assert_eq!(exp.date_range("Present").as_deref(), Some("2020 - Present"));
        assert_eq!(Experience::default().date_range("Present"), None);
    }
}
