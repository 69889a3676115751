// src/ai/mod.rs
//! Text-generation collaborator. Nothing in the builder or the scorer
//! depends on it being reachable.

pub mod client;

pub use client::HttpAiClient;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::cv_data::CvDocument;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AiAction {
    Summary,
    Bullets,
    Skills,
    CoverLetter,
    AtsAnalyze,
}

impl AiAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AiAction::Summary => "summary",
            AiAction::Bullets => "bullets",
            AiAction::Skills => "skills",
            AiAction::CoverLetter => "cover-letter",
            AiAction::AtsAnalyze => "ats-analyze",
        }
    }

    /// Actions that make no sense without a target job
    pub fn requires_job_description(&self) -> bool {
        matches!(self, AiAction::CoverLetter)
    }
}

impl fmt::Display for AiAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[rocket::async_trait]
pub trait AiGenerator: Send + Sync {
    /// Generate text for `action`. For `AtsAnalyze` the text is a JSON
    /// assessment payload.
    async fn generate(
        &self,
        action: AiAction,
        cv: &CvDocument,
        job_description: Option<&str>,
        context: Option<&str>,
    ) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_names() {
        let parsed: AiAction = serde_json::from_str("\"ats-analyze\"").unwrap();
        assert_eq!(parsed, AiAction::AtsAnalyze);
        assert_eq!(
            serde_json::to_string(&AiAction::CoverLetter).unwrap(),
            "\"cover-letter\""
        );
        assert_eq!(AiAction::Bullets.to_string(), "bullets");
    }
}
