// src/export/typst.rs
//! CvDocument to Typst source. User text only ever appears inside Typst
//! string literals.

use regex::Regex;
use std::sync::LazyLock;

use super::PaperSize;
use crate::core::template_engine::TemplateManifest;
use crate::types::cv_data::{filled, filled_opt, CvDocument};

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[0-9a-fA-F]{6}$").expect("valid regex"));

const FALLBACK_ACCENT: &str = "#14A4E6";

struct Labels {
    summary: &'static str,
    experience: &'static str,
    education: &'static str,
    skills: &'static str,
    projects: &'static str,
    present: &'static str,
    technical: &'static str,
    soft: &'static str,
    languages: &'static str,
    certifications: &'static str,
}

fn labels(language: &str) -> Labels {
    match language {
        "fr" => Labels {
            summary: "Profil",
            experience: "Expérience Professionnelle",
            education: "Formation",
            skills: "Compétences",
            projects: "Projets",
            present: "Présent",
            technical: "Techniques",
            soft: "Relationnelles",
            languages: "Langues",
            certifications: "Certifications",
        },
        "de" => Labels {
            summary: "Profil",
            experience: "Berufserfahrung",
            education: "Ausbildung",
            skills: "Kenntnisse",
            projects: "Projekte",
            present: "Heute",
            technical: "Fachlich",
            soft: "Persönlich",
            languages: "Sprachen",
            certifications: "Zertifikate",
        },
        _ => Labels {
            summary: "Summary",
            experience: "Work Experience",
            education: "Education",
            skills: "Skills",
            projects: "Projects",
            present: "Present",
            technical: "Technical",
            soft: "Soft skills",
            languages: "Languages",
            certifications: "Certifications",
        },
    }
}

/// Typst string literal
fn quote(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            '\t' => out.push(' '),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn bullet_list(items: &[&str]) -> String {
    let items: Vec<String> = items
        .iter()
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .map(quote)
        .collect();
    if items.is_empty() {
        String::new()
    } else {
        format!("#list({})\n", items.join(", "))
    }
}

const PREAMBLE_FUNCTIONS: &str = r#"#let section(title) = {
  v(0.7em)
  text(weight: "bold", size: 12pt, fill: accent, upper(title))
  v(-0.5em)
  line(length: 100%, stroke: 0.5pt + accent)
  v(0.2em)
}
#let entry(heading, subheading, dates) = {
  grid(columns: (1fr, auto), text(weight: "bold", heading), text(style: "italic", dates))
  if subheading != "" { text(fill: luma(80), subheading) }
}
"#;

pub fn render_typst(
    cv: &CvDocument,
    style: &TemplateManifest,
    paper: PaperSize,
    language: &str,
) -> String {
    let labels = labels(language);
    let info = &cv.personal_info;
    let accent = if HEX_COLOR.is_match(&style.accent_color) {
        style.accent_color.as_str()
    } else {
        FALLBACK_ACCENT
    };
    let name = if filled(&info.full_name) {
        info.full_name.trim()
    } else {
        "Curriculum Vitae"
    };

    let mut doc = String::new();
    doc.push_str(&format!(
        "#set document(title: {}, author: {})\n",
        quote(name),
        quote(name)
    ));
    doc.push_str(&format!(
        "#set page(paper: \"{}\", margin: (x: 1.6cm, y: 1.5cm))\n",
        paper.typst_name()
    ));
    doc.push_str(&format!(
        "#set text(font: {}, size: 10.5pt, lang: {})\n",
        quote(&style.font),
        quote(language)
    ));
    doc.push_str(&format!("#let accent = rgb(\"{}\")\n", accent));
    doc.push_str(PREAMBLE_FUNCTIONS);
    doc.push('\n');

    // Header
    doc.push_str(&format!(
        "#align(center, text(size: 20pt, weight: \"bold\", {}))\n",
        quote(name)
    ));
    if let Some(headline) = info.headline.as_deref().filter(|h| filled(h)) {
        doc.push_str(&format!("#align(center, text(size: 12pt, {}))\n", quote(headline.trim())));
    }
    let contact: Vec<&str> = [
        &info.email,
        &info.phone,
        &info.location,
        &info.linkedin,
        &info.website,
    ]
    .into_iter()
    .filter(|f| filled_opt(f))
    .filter_map(|f| f.as_deref().map(str::trim))
    .collect();
    if !contact.is_empty() {
        doc.push_str(&format!(
            "#align(center, text(size: 9pt, {}))\n",
            quote(&contact.join("  |  "))
        ));
    }

    if filled(&cv.summary) {
        doc.push_str(&format!("\n#section({})\n", quote(labels.summary)));
        doc.push_str(&format!("#par({})\n", quote(cv.summary.trim())));
    }

    if !cv.experience.is_empty() {
        doc.push_str(&format!("\n#section({})\n", quote(labels.experience)));
        for exp in &cv.experience {
            let dates = exp.date_range(labels.present).unwrap_or_default();
            let subheading = [Some(exp.company.trim()), exp.location.as_deref().map(str::trim)]
                .into_iter()
                .flatten()
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", ");
            doc.push_str(&format!(
                "#entry({}, {}, {})\n",
                quote(exp.title.trim()),
                quote(&subheading),
                quote(&dates)
            ));
            if let Some(description) = exp.description.as_deref().filter(|d| filled(d)) {
                doc.push_str(&format!("#par({})\n", quote(description.trim())));
            }
            let achievements: Vec<&str> = exp.achievements.iter().map(String::as_str).collect();
            doc.push_str(&bullet_list(&achievements));
        }
    }

    if !cv.education.is_empty() {
        doc.push_str(&format!("\n#section({})\n", quote(labels.education)));
        for edu in &cv.education {
            let degree = match edu.field.as_deref().filter(|f| filled(f)) {
                Some(field) => format!("{}, {}", edu.degree.trim(), field.trim()),
                None => edu.degree.trim().to_string(),
            };
            doc.push_str(&format!(
                "#entry({}, {}, {})\n",
                quote(&degree),
                quote(edu.institution.trim()),
                quote(&edu.date_range().unwrap_or_default())
            ));
            if let Some(description) = edu.description.as_deref().filter(|d| filled(d)) {
                doc.push_str(&format!("#par({})\n", quote(description.trim())));
            }
        }
    }

    if cv.skills.count() > 0 {
        doc.push_str(&format!("\n#section({})\n", quote(labels.skills)));
        for (label, values) in [
            (labels.technical, &cv.skills.technical),
            (labels.soft, &cv.skills.soft),
            (labels.languages, &cv.skills.languages),
            (labels.certifications, &cv.skills.certifications),
        ] {
            let values: Vec<&str> = values
                .iter()
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .collect();
            if values.is_empty() {
                continue;
            }
            doc.push_str(&format!(
                "#text(weight: \"bold\", {}) #text({})\n\n",
                quote(&format!("{}:", label)),
                quote(&values.join(", "))
            ));
        }
    }

    if !cv.projects.is_empty() {
        doc.push_str(&format!("\n#section({})\n", quote(labels.projects)));
        for project in &cv.projects {
            doc.push_str(&format!(
                "#entry({}, {}, {})\n",
                quote(project.name.trim()),
                quote(&project.technologies.join(", ")),
                quote(project.url.as_deref().unwrap_or("").trim())
            ));
            if filled(&project.description) {
                doc.push_str(&format!("#par({})\n", quote(project.description.trim())));
            }
        }
    }

    doc
}
