// src/export/mod.rs
//! PDF export through Typst

pub mod pdf;
pub mod typst;

pub use pdf::{ExportedPdf, PdfExporter};
pub use typst::render_typst;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    #[default]
    A4,
    Letter,
}

impl PaperSize {
    /// Name of the paper in Typst's `page(paper: ..)`
    pub fn typst_name(&self) -> &'static str {
        match self {
            PaperSize::A4 => "a4",
            PaperSize::Letter => "us-letter",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paper_names() {
        let letter: PaperSize = serde_json::from_str("\"letter\"").unwrap();
        assert_eq!(letter.typst_name(), "us-letter");
        assert_eq!(PaperSize::default().typst_name(), "a4");
    }
}
