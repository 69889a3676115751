// src/core/config_manager.rs
//! config.yaml loading with per-environment sections and env overrides

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app_log;
use crate::ats::AtsPolicy;
use crate::core::FsOps;

pub const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub templates_path: PathBuf,
    pub database_path: PathBuf,
    pub log_path: PathBuf,
    pub port: u16,
    pub job_search_url: String,
    pub job_search_api_key: Option<String>,
    pub job_search_timeout_seconds: u64,
    pub ai_url: Option<String>,
    pub ai_api_key: Option<String>,
    pub ai_timeout_seconds: u64,
    pub search_cache_ttl_seconds: u64,
    pub search_cache_max_entries: usize,
    pub session_idle_seconds: u64,
    pub max_sessions: usize,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            templates_path: PathBuf::from("templates"),
            database_path: PathBuf::from("data/careerkit.db"),
            log_path: PathBuf::from("logs/careerkit.log"),
            port: 4002,
            job_search_url: "http://127.0.0.1:5555".to_string(),
            job_search_api_key: None,
            job_search_timeout_seconds: 15,
            ai_url: None,
            ai_api_key: None,
            ai_timeout_seconds: 20,
            search_cache_ttl_seconds: 600,
            search_cache_max_entries: 50,
            session_idle_seconds: 3600,
            max_sessions: 1000,
        }
    }
}

impl EnvironmentConfig {
    pub fn job_search_timeout(&self) -> Duration {
        Duration::from_secs(self.job_search_timeout_seconds.max(1))
    }

    pub fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_seconds.max(1))
    }

    pub fn search_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.search_cache_ttl_seconds)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_seconds)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    local: EnvironmentConfig,
    production: EnvironmentConfig,
    ats_policy: AtsPolicy,
}

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub environment_name: String,
    pub environment: EnvironmentConfig,
    pub ats_policy: AtsPolicy,
}

impl ConfigManager {
    /// Load `config.yaml` from the working directory, falling back to
    /// defaults when it is absent, then apply environment overrides
    pub fn load() -> Result<Self> {
        let environment_name = Self::environment_name();
        app_log!(info, "Loading configuration for environment: {}", environment_name);

        let mut config = Self::load_from(Path::new(CONFIG_FILE), &environment_name)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.resolve_paths()?;
        Ok(config)
    }

    fn environment_name() -> String {
        std::env::var("CAREERKIT_ENV")
            .or_else(|_| std::env::var("ENVIRONMENT"))
            .unwrap_or_else(|_| "local".to_string())
    }

    pub fn load_from(path: &Path, environment_name: &str) -> Result<Self> {
        if !path.exists() {
            app_log!(
                warn,
                "{} not found, using built-in defaults",
                path.display()
            );
            return Ok(Self::from_file(ConfigFile::default(), environment_name));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_yaml(&content, environment_name)
            .with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn from_yaml(content: &str, environment_name: &str) -> Result<Self> {
        let file: ConfigFile = if content.trim().is_empty() {
            ConfigFile::default()
        } else {
            serde_yaml::from_str(content).context("Invalid configuration YAML")?
        };
        Ok(Self::from_file(file, environment_name))
    }

    fn from_file(file: ConfigFile, environment_name: &str) -> Self {
        let environment = match environment_name {
            "production" => file.production,
            _ => file.local,
        };
        Self {
            environment_name: environment_name.to_string(),
            environment,
            ats_policy: file.ats_policy,
        }
    }

    /// Environment variables win over the file
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let set = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(port) = set("ROCKET_PORT") {
            match port.parse::<u16>() {
                Ok(port) => self.environment.port = port,
                Err(_) => app_log!(warn, "Ignoring invalid ROCKET_PORT: {}", port),
            }
        }
        if let Some(url) = set("JOB_SEARCH_API_URL") {
            self.environment.job_search_url = url;
        }
        if let Some(key) = set("JOB_SEARCH_API_KEY") {
            self.environment.job_search_api_key = Some(key);
        }
        if let Some(url) = set("AI_API_URL") {
            self.environment.ai_url = Some(url);
        }
        if let Some(key) = set("AI_API_KEY") {
            self.environment.ai_api_key = Some(key);
        }
    }

    fn resolve_paths(&mut self) -> Result<()> {
        let current_dir = std::env::current_dir().context("Failed to get current directory")?;
        for path in [
            &mut self.environment.templates_path,
            &mut self.environment.database_path,
            &mut self.environment.log_path,
        ] {
            if path.is_relative() {
                *path = current_dir.join(&*path);
            }
        }
        Ok(())
    }

    pub async fn ensure_directories(&self) -> Result<()> {
        FsOps::ensure_dir_exists(&self.environment.templates_path).await?;
        for file in [&self.environment.database_path, &self.environment.log_path] {
            if let Some(parent) = file.parent() {
                FsOps::ensure_dir_exists(parent).await?;
            }
        }
        Ok(())
    }
}
