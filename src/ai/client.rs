// src/ai/client.rs
use anyhow::{Context, Result};

use super::{AiAction, AiGenerator};
use crate::app_log;
use crate::core::ServiceClient;
use crate::types::cv_data::CvDocument;
use crate::types::response::{GenerateRequestPayload, GenerateResponsePayload};

const GENERATE_ENDPOINT: &str = "/generate";

pub struct HttpAiClient {
    service: ServiceClient,
}

impl HttpAiClient {
    pub fn new(base_url: String, api_key: Option<String>, timeout_seconds: u64) -> Result<Self> {
        let service = ServiceClient::new(base_url, api_key, timeout_seconds)
            .context("Failed to create AI service client")?;
        Ok(Self { service })
    }
}

#[rocket::async_trait]
impl AiGenerator for HttpAiClient {
    async fn generate(
        &self,
        action: AiAction,
        cv: &CvDocument,
        job_description: Option<&str>,
        context: Option<&str>,
    ) -> Result<String> {
        let payload = GenerateRequestPayload {
            action: action.as_str(),
            cv,
            job_description: job_description.map(str::trim).filter(|j| !j.is_empty()),
            context,
        };

        app_log!(info, "Requesting AI generation: {}", action);

        let response: GenerateResponsePayload = self
            .service
            .post_json(GENERATE_ENDPOINT, &payload)
            .await
            .with_context(|| format!("AI generation request failed for {}", action))?;

        if let Some(error) = response.error {
            anyhow::bail!("AI service reported an error: {}", error);
        }
        if response.status.as_deref().is_some_and(|s| s != "success") {
            anyhow::bail!(
                "AI generation failed with status: {}",
                response.status.unwrap_or_default()
            );
        }
        if response.text.trim().is_empty() {
            anyhow::bail!("AI service returned empty text for {}", action);
        }

        app_log!(trace, "AI generation for {} returned {} chars", action, response.text.len());
        Ok(response.text)
    }
}
