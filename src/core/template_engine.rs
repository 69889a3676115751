// src/core/template_engine.rs
//! CV template discovery. A template is a directory under the templates
//! path holding a `manifest.toml` and optional assets (fonts, images).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::app_log;
use crate::core::FsOps;

pub const DEFAULT_TEMPLATE: &str = "default";
pub const MANIFEST_FILE: &str = "manifest.toml";

fn default_accent_color() -> String {
    "#14A4E6".to_string()
}

fn default_font() -> String {
    "Libertinus Serif".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateManifest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_accent_color")]
    pub accent_color: String,
    #[serde(default = "default_font")]
    pub font: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl TemplateManifest {
    fn builtin() -> Self {
        Self {
            name: "Default".to_string(),
            description: Some("Single-column layout that ATS parsers read reliably".to_string()),
            accent_color: default_accent_color(),
            font: default_font(),
            version: Some("1.0".to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateInfo {
    pub id: String,
    /// `None` for the built-in default
    #[serde(skip)]
    pub path: Option<PathBuf>,
    #[serde(flatten)]
    pub manifest: TemplateManifest,
}

pub struct TemplateEngine {
    templates_dir: PathBuf,
    templates: Vec<TemplateInfo>,
}

impl TemplateEngine {
    pub fn new(templates_dir: PathBuf) -> Result<Self> {
        let mut engine = Self {
            templates_dir,
            templates: Vec::new(),
        };
        engine.discover_templates()?;
        Ok(engine)
    }

    fn discover_templates(&mut self) -> Result<()> {
        self.templates.clear();

        if self.templates_dir.exists() {
            let entries = std::fs::read_dir(&self.templates_dir).with_context(|| {
                format!(
                    "Failed to read templates directory: {}",
                    self.templates_dir.display()
                )
            })?;

            for entry in entries {
                let path = entry?.path();
                if !path.is_dir() || !path.join(MANIFEST_FILE).exists() {
                    continue;
                }
                let Some(template_id) = path.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                match Self::load_template_info(template_id, &path) {
                    Ok(template) => {
                        app_log!(trace, "Loaded template: {}", template.id);
                        self.templates.push(template);
                    }
                    Err(e) => app_log!(warn, "Failed to load template {}: {:#}", template_id, e),
                }
            }
        } else {
            app_log!(
                warn,
                "Templates directory does not exist: {}",
                self.templates_dir.display()
            );
        }

        if !self.templates.iter().any(|t| t.id == DEFAULT_TEMPLATE) {
            self.templates.push(TemplateInfo {
                id: DEFAULT_TEMPLATE.to_string(),
                path: None,
                manifest: TemplateManifest::builtin(),
            });
        }
        self.templates.sort_by(|a, b| a.id.cmp(&b.id));

        app_log!(info, "Discovered {} templates", self.templates.len());
        Ok(())
    }

    fn load_template_info(template_id: &str, template_path: &Path) -> Result<TemplateInfo> {
        let manifest_path = template_path.join(MANIFEST_FILE);
        let content = std::fs::read_to_string(&manifest_path)
            .with_context(|| format!("Failed to read manifest: {}", manifest_path.display()))?;
        let manifest: TemplateManifest = toml::from_str(&content)
            .with_context(|| format!("Failed to parse manifest: {}", manifest_path.display()))?;

        Ok(TemplateInfo {
            id: template_id.to_lowercase(),
            path: Some(template_path.to_path_buf()),
            manifest,
        })
    }

    pub fn list_templates(&self) -> &[TemplateInfo] {
        &self.templates
    }

    pub fn get_template(&self, template_id: &str) -> Option<&TemplateInfo> {
        let wanted = template_id.trim().to_lowercase();
        self.templates.iter().find(|t| t.id == wanted)
    }

    /// The requested template, or the default one when it is unknown
    pub fn resolve(&self, template_id: &str) -> &TemplateInfo {
        if let Some(template) = self.get_template(template_id) {
            return template;
        }
        app_log!(
            warn,
            "Template '{}' not found, using '{}'",
            template_id,
            DEFAULT_TEMPLATE
        );
        self.templates
            .iter()
            .find(|t| t.id == DEFAULT_TEMPLATE)
            .unwrap_or(&self.templates[0])
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    /// Copy the template's asset files next to the document being compiled
    pub async fn prepare_template_workspace(
        &self,
        template: &TemplateInfo,
        workspace_dir: &Path,
    ) -> Result<()> {
        FsOps::ensure_dir_exists(workspace_dir).await?;

        let Some(template_path) = &template.path else {
            return Ok(());
        };

        let mut entries = tokio::fs::read_dir(template_path).await.with_context(|| {
            format!(
                "Failed to read template directory: {}",
                template_path.display()
            )
        })?;

        while let Some(entry) = entries.next_entry().await? {
            let src_path = entry.path();
            if !src_path.is_file() {
                continue;
            }
            let Some(file_name) = src_path.file_name() else {
                continue;
            };
            if file_name == MANIFEST_FILE {
                continue;
            }
            FsOps::copy_file(&src_path, &workspace_dir.join(file_name)).await?;
        }

        app_log!(
            trace,
            "Prepared template workspace: {} -> {}",
            template.id,
            workspace_dir.display()
        );
        Ok(())
    }
}
