// src/web/state.rs
use anyhow::{Context, Result};
use std::sync::Arc;

use crate::ai::{AiGenerator, HttpAiClient};
use crate::app_log;
use crate::ats::AnalysisService;
use crate::core::{ConfigManager, Database, TemplateEngine};
use crate::export::PdfExporter;
use crate::jobs::{HttpJobAggregator, JobSearchService, JobSource};

/// Everything the routes share, managed by rocket
pub struct AppState {
    pub db: Database,
    pub analysis: AnalysisService,
    pub jobs: JobSearchService,
    pub ai: Option<Arc<dyn AiGenerator>>,
    pub exporter: PdfExporter,
}

impl AppState {
    pub async fn from_config(config: &ConfigManager) -> Result<Self> {
        let env = &config.environment;

        let db = Database::new(&env.database_path).await?;

        let ai: Option<Arc<dyn AiGenerator>> = match env.ai_url.as_deref() {
            Some(url) => {
                let client = HttpAiClient::new(
                    url.to_string(),
                    env.ai_api_key.clone(),
                    env.ai_timeout_seconds,
                )?;
                app_log!(info, "AI service: {}", url);
                Some(Arc::new(client))
            }
            None => {
                app_log!(warn, "No AI service configured, hybrid analysis will fall back to local");
                None
            }
        };

        let source: Arc<dyn JobSource> = Arc::new(
            HttpJobAggregator::new(
                env.job_search_url.clone(),
                env.job_search_api_key.clone(),
                env.job_search_timeout_seconds,
            )
            .context("Failed to create job aggregator client")?,
        );
        app_log!(info, "Job aggregator: {}", env.job_search_url);

        let jobs = JobSearchService::new(source, env.job_search_timeout())
            .with_cache(env.search_cache_ttl(), env.search_cache_max_entries)
            .with_session_limits(env.session_idle(), env.max_sessions);

        let templates = TemplateEngine::new(env.templates_path.clone())?;

        let mut state = Self::assemble(
            db,
            config.ats_policy.clone(),
            ai,
            env.ai_timeout(),
            jobs,
            PdfExporter::new(Arc::new(templates)),
        );
        state.analysis = state
            .analysis
            .with_session_limits(env.session_idle(), env.max_sessions);
        Ok(state)
    }

    pub fn assemble(
        db: Database,
        policy: crate::ats::AtsPolicy,
        ai: Option<Arc<dyn AiGenerator>>,
        ai_timeout: std::time::Duration,
        jobs: JobSearchService,
        exporter: PdfExporter,
    ) -> Self {
        let mut analysis = AnalysisService::new(policy).with_model_timeout(ai_timeout);
        if let Some(model) = &ai {
            analysis = analysis.with_model(model.clone());
        }
        Self {
            db,
            analysis,
            jobs,
            ai,
            exporter,
        }
    }
}
