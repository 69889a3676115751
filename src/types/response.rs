use serde::{Deserialize, Serialize};

use crate::types::cv_data::CvDocument;

// ===== AI Service Payloads =====

#[derive(Debug, Serialize)]
pub struct GenerateRequestPayload<'a> {
    pub action: &'a str,
    pub cv: &'a CvDocument,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponsePayload {
    #[serde(default)]
    pub text: String,
    pub status: Option<String>,
    pub error: Option<String>,
}

// ===== Job Aggregator Payloads =====

#[derive(Debug, Deserialize)]
pub struct AggregatorSearchResponse {
    #[serde(default)]
    pub jobs: Vec<crate::jobs::JobPosting>,
    #[serde(default)]
    pub total: u64,
}

#[derive(Debug, Deserialize)]
pub struct AggregatorJobResponse {
    pub job: Option<crate::jobs::JobPosting>,
}
