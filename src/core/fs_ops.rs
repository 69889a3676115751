// src/core/fs_ops.rs
//! File system helpers for templates and export workspaces

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::app_log;

pub struct FsOps;

impl FsOps {
    pub async fn ensure_dir_exists(path: &Path) -> Result<()> {
        if !path.exists() {
            fs::create_dir_all(path)
                .await
                .with_context(|| format!("Failed to create directory: {}", path.display()))?;
            app_log!(info, "Created directory: {}", path.display());
        }
        Ok(())
    }

    pub async fn read_file_safe(path: &Path) -> Result<String> {
        fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read file: {}", path.display()))
    }

    pub async fn write_file_safe(path: &Path, content: &str) -> Result<()> {
        if let Some(parent) = path.parent() {
            Self::ensure_dir_exists(parent).await?;
        }

        fs::write(path, content)
            .await
            .with_context(|| format!("Failed to write file: {}", path.display()))?;

        app_log!(trace, "Written file: {}", path.display());
        Ok(())
    }

    pub async fn copy_file(src: &Path, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            Self::ensure_dir_exists(parent).await?;
        }

        fs::copy(src, dest)
            .await
            .with_context(|| format!("Failed to copy {} to {}", src.display(), dest.display()))?;

        app_log!(trace, "Copied {} to {}", src.display(), dest.display());
        Ok(())
    }

    pub async fn remove_dir_all(path: &Path) -> Result<()> {
        if path.exists() {
            fs::remove_dir_all(path)
                .await
                .with_context(|| format!("Failed to remove directory: {}", path.display()))?;
            app_log!(trace, "Removed directory: {}", path.display());
        }
        Ok(())
    }

    /// Fresh uniquely named directory under the system temp dir
    pub async fn create_scratch_dir(prefix: &str) -> Result<PathBuf> {
        let dir = std::env::temp_dir().join(format!("{}-{}", prefix, uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("Failed to create scratch directory: {}", dir.display()))?;
        Ok(dir)
    }

    /// Lowercase dash-separated name safe for file names
    pub fn normalize_file_stem(name: &str) -> String {
        name.trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }
}
