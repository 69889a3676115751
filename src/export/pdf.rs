// src/export/pdf.rs
use anyhow::{Context, Result};
use chrono::Utc;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::process::Command;

use super::{render_typst, PaperSize};
use crate::app_log;
use crate::core::{FsOps, TemplateEngine};
use crate::types::cv_data::CvDocument;

const SOURCE_FILE: &str = "cv.typ";
const OUTPUT_FILE: &str = "cv.pdf";

pub struct ExportedPdf {
    pub bytes: Vec<u8>,
    pub filename: String,
}

pub struct PdfExporter {
    templates: Arc<TemplateEngine>,
    typst_binary: String,
    timeout: Duration,
}

impl PdfExporter {
    pub fn new(templates: Arc<TemplateEngine>) -> Self {
        Self {
            templates,
            typst_binary: "typst".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_binary(mut self, binary: &str) -> Self {
        self.typst_binary = binary.to_string();
        self
    }

    pub fn templates(&self) -> &TemplateEngine {
        &self.templates
    }

    /// Render and compile in a throwaway workspace that is removed afterwards
    pub async fn export(
        &self,
        cv: &CvDocument,
        template_id: &str,
        language: &str,
        paper: PaperSize,
    ) -> Result<ExportedPdf> {
        let workspace = FsOps::create_scratch_dir("careerkit-export").await?;
        let result = self
            .compile_in(&workspace, cv, template_id, language, paper)
            .await;

        if let Err(e) = FsOps::remove_dir_all(&workspace).await {
            app_log!(warn, "Failed to clean up export workspace: {:#}", e);
        }

        let bytes = result?;
        let stem = match FsOps::normalize_file_stem(&cv.personal_info.full_name) {
            stem if stem.is_empty() => "resume".to_string(),
            stem => stem,
        };
        let filename = format!("{}_CV_{}.pdf", stem, Utc::now().format("%Y"));

        app_log!(info, "Exported {} ({} bytes)", filename, bytes.len());
        Ok(ExportedPdf { bytes, filename })
    }

    async fn compile_in(
        &self,
        workspace: &Path,
        cv: &CvDocument,
        template_id: &str,
        language: &str,
        paper: PaperSize,
    ) -> Result<Vec<u8>> {
        let template = self.templates.resolve(template_id);
        self.templates
            .prepare_template_workspace(template, workspace)
            .await
            .context("Failed to prepare template workspace")?;

        let source = render_typst(cv, &template.manifest, paper, language);
        FsOps::write_file_safe(&workspace.join(SOURCE_FILE), &source).await?;

        let mut cmd = Command::new(&self.typst_binary);
        cmd.arg("compile")
            .arg(SOURCE_FILE)
            .arg(OUTPUT_FILE)
            .current_dir(workspace)
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "Typst compilation timed out after {} seconds",
                    self.timeout.as_secs()
                )
            })?
            .with_context(|| format!("Failed to execute {}", self.typst_binary))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            anyhow::bail!(
                "Typst compilation failed: stderr={}, stdout={}",
                stderr,
                stdout
            );
        }

        let pdf_path = workspace.join(OUTPUT_FILE);
        tokio::fs::read(&pdf_path)
            .await
            .with_context(|| format!("Typst did not produce {}", pdf_path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn exporter(binary: &str) -> PdfExporter {
        let templates = TemplateEngine::new(PathBuf::from("/nonexistent/templates")).unwrap();
        PdfExporter::new(Arc::new(templates)).with_binary(binary)
    }

    #[tokio::test]
    async fn test_missing_binary_is_an_error() {
        let result = exporter("careerkit-no-such-typst")
            .export(&CvDocument::default(), "default", "en", PaperSize::A4)
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_compiler_without_output_is_an_error() {
        let result = exporter("true")
            .export(&CvDocument::default(), "default", "en", PaperSize::Letter)
            .await;
        let message = format!("{:#}", result.err().unwrap());
        assert!(message.contains("did not produce"));
    }
}
