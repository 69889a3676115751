// src/core/service_client.rs
//! JSON HTTP client shared by the job aggregator and the AI collaborator

use anyhow::{Context, Result};
use reqwest::StatusCode;

use crate::app_log;

pub struct ServiceClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

/// Failure with the HTTP status the remote service answered with
#[derive(Debug)]
pub struct ServiceStatusError {
    pub status: StatusCode,
    pub body: String,
}

impl std::fmt::Display for ServiceStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "HTTP {} error: {}", self.status, self.body)
    }
}

impl std::error::Error for ServiceStatusError {}

impl ServiceClient {
    pub fn new(base_url: String, api_key: Option<String>, timeout_seconds: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds.max(1)))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {}", key)),
            None => request,
        }
    }

    async fn read_json<R>(response: reqwest::Response, url: &str) -> Result<R>
    where
        R: serde::de::DeserializeOwned,
    {
        let status = response.status();
        app_log!(trace, "Response status from {}: {}", url, status);

        if status.is_success() {
            response
                .json::<R>()
                .await
                .with_context(|| format!("Failed to parse JSON response from {}", url))
        } else {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            app_log!(error, "Service error from {}: {} {}", url, status, body);
            Err(ServiceStatusError { status, body }.into())
        }
    }

    /// POST a JSON payload and decode the JSON answer
    pub async fn post_json<T, R>(&self, endpoint: &str, payload: &T) -> Result<R>
    where
        T: serde::Serialize + ?Sized,
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        app_log!(trace, "POST {}", url);

        let response = self
            .authorize(self.client.post(&url))
            .json(payload)
            .send()
            .await
            .with_context(|| format!("Failed to POST to {}", url))?;

        Self::read_json(response, &url).await
    }

    /// GET and decode the JSON answer
    pub async fn get<R>(&self, endpoint: &str) -> Result<R>
    where
        R: serde::de::DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, endpoint);
        app_log!(trace, "GET {}", url);

        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .with_context(|| format!("Failed to GET from {}", url))?;

        Self::read_json(response, &url).await
    }
}

/// True when the error chain carries a 404 from the remote service
pub fn is_not_found(error: &anyhow::Error) -> bool {
    error
        .chain()
        .filter_map(|e| e.downcast_ref::<ServiceStatusError>())
        .any(|e| e.status == StatusCode::NOT_FOUND)
}
