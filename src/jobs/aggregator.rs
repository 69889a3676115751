// src/jobs/aggregator.rs
use anyhow::{Context, Result};

use super::{JobFilters, JobPosting};
use crate::app_log;
use crate::core::service_client::{is_not_found, ServiceClient};
use crate::types::response::{AggregatorJobResponse, AggregatorSearchResponse};

/// One page of results as the source reports it
#[derive(Debug, Clone, Default)]
pub struct SourcePage {
    pub jobs: Vec<JobPosting>,
    pub total: u64,
}

#[rocket::async_trait]
pub trait JobSource: Send + Sync {
    async fn search(&self, filters: &JobFilters) -> Result<SourcePage>;

    /// `Ok(None)` when the source does not know the job
    async fn fetch_job(&self, id: &str) -> Result<Option<JobPosting>>;
}

/// Remote multi-source aggregator
pub struct HttpJobAggregator {
    service: ServiceClient,
}

impl HttpJobAggregator {
    pub fn new(base_url: String, api_key: Option<String>, timeout_seconds: u64) -> Result<Self> {
        let service = ServiceClient::new(base_url, api_key, timeout_seconds)
            .context("Failed to create job aggregator client")?;
        Ok(Self { service })
    }
}

fn encode_path_segment(segment: &str) -> String {
    let mut encoded = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}

#[rocket::async_trait]
impl JobSource for HttpJobAggregator {
    async fn search(&self, filters: &JobFilters) -> Result<SourcePage> {
        app_log!(
            info,
            "Searching jobs: query='{}' country={:?} page={}",
            filters.query,
            filters.country,
            filters.page
        );

        let response: AggregatorSearchResponse = self
            .service
            .post_json("/search", filters)
            .await
            .context("Job search request failed")?;

        app_log!(
            trace,
            "Aggregator returned {} jobs of {}",
            response.jobs.len(),
            response.total
        );

        Ok(SourcePage {
            jobs: response.jobs,
            total: response.total,
        })
    }

    async fn fetch_job(&self, id: &str) -> Result<Option<JobPosting>> {
        let endpoint = format!("/jobs/{}", encode_path_segment(id));
        match self.service.get::<AggregatorJobResponse>(&endpoint).await {
            Ok(response) => Ok(response.job),
            Err(e) if is_not_found(&e) => {
                app_log!(info, "Job {} not found at aggregator", id);
                Ok(None)
            }
            Err(e) => Err(e).with_context(|| format!("Failed to fetch job {}", id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_segment_encoding() {
        assert_eq!(encode_path_segment("abc-123_x.y"), "abc-123_x.y");
        assert_eq!(encode_path_segment("indeed/42 a"), "indeed%2F42%20a");
    }
}
