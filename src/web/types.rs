// src/web/types.rs
use rocket::http::{ContentType, Status};
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::{Request, Response};

use crate::ai::AiAction;
use crate::ats::AnalysisMode;
use crate::export::PaperSize;
use crate::jobs::JobPosting;
use crate::types::cv_data::{CvDocument, ValidationIssue};

// ===== File responses =====

pub struct PdfResponse {
    pub data: Vec<u8>,
    pub filename: String,
}

impl<'r> Responder<'r, 'static> for PdfResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        Response::build()
            .header(ContentType::PDF)
            .raw_header(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", self.filename),
            )
            .sized_body(self.data.len(), std::io::Cursor::new(self.data))
            .ok()
    }
}

pub struct CsvResponse {
    pub content: String,
    pub filename: String,
}

impl<'r> Responder<'r, 'static> for CsvResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        Response::build()
            .header(ContentType::CSV)
            .raw_header(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", self.filename),
            )
            .sized_body(self.content.len(), std::io::Cursor::new(self.content))
            .ok()
    }
}

// ===== Standard envelopes =====

#[derive(Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Data,
    Action,
    Error,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub action: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// JSON body with the payload's fields at top level plus an optional
/// `conversation_id`
#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardRequest<T> {
    #[serde(flatten)]
    pub data: T,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

pub trait WithConversationId {
    fn conversation_id(&self) -> Option<String>;
}

impl<T> WithConversationId for StandardRequest<T> {
    fn conversation_id(&self) -> Option<String> {
        self.conversation_id.clone()
    }
}

impl<T> DataResponse<T> {
    pub fn success(message: String, data: T, conversation_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: true,
            message,
            data,
            conversation_id,
        }
    }
}

impl ActionResponse {
    pub fn success(message: String, action: String, conversation_id: Option<String>) -> Self {
        Self {
            response_type: ResponseType::Action,
            success: true,
            message,
            action,
            conversation_id,
        }
    }
}

impl StandardErrorResponse {
    pub fn new(
        error: String,
        error_code: String,
        suggestions: Vec<String>,
        conversation_id: Option<String>,
    ) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
            conversation_id,
        }
    }
}

// ===== Error taxonomy =====

pub type ApiError = (Status, Json<StandardErrorResponse>);
pub type ApiResult<T> = Result<T, ApiError>;

pub fn validation_error(issues: &[ValidationIssue], conversation_id: Option<String>) -> ApiError {
    (
        Status::UnprocessableEntity,
        Json(StandardErrorResponse::new(
            "Validation failed".to_string(),
            "VALIDATION_ERROR".to_string(),
            issues
                .iter()
                .map(|i| format!("{}: {}", i.field, i.message))
                .collect(),
            conversation_id,
        )),
    )
}

pub fn not_found(what: &str, conversation_id: Option<String>) -> ApiError {
    (
        Status::NotFound,
        Json(StandardErrorResponse::new(
            format!("{} not found", what),
            "NOT_FOUND".to_string(),
            vec!["Refresh the list and try again".to_string()],
            conversation_id,
        )),
    )
}

pub fn service_unavailable(
    service: &str,
    error: &anyhow::Error,
    conversation_id: Option<String>,
) -> ApiError {
    crate::app_log!(error, "{} unavailable: {:#}", service, error);
    (
        Status::ServiceUnavailable,
        Json(StandardErrorResponse::new(
            format!("{} is currently unavailable", service),
            "SERVICE_UNAVAILABLE".to_string(),
            vec!["Try again in a few moments".to_string()],
            conversation_id,
        )),
    )
}

pub fn database_error(error: &anyhow::Error, conversation_id: Option<String>) -> ApiError {
    crate::app_log!(error, "Database operation failed: {:#}", error);
    (
        Status::InternalServerError,
        Json(StandardErrorResponse::new(
            "Database operation failed".to_string(),
            "DATABASE_ERROR".to_string(),
            vec!["Try again in a few moments".to_string()],
            conversation_id,
        )),
    )
}

// ===== Request payloads =====

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct ExportRequest {
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub paper: PaperSize,
}

/// CV inline or by stored id
#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub cv: Option<CvDocument>,
    #[serde(default)]
    pub cv_id: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub mode: AnalysisMode,
}

#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct GenerateTextRequest {
    pub action: AiAction,
    #[serde(default)]
    pub cv: Option<CvDocument>,
    #[serde(default)]
    pub cv_id: Option<String>,
    #[serde(default)]
    pub job_description: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct GeneratedText {
    pub action: AiAction,
    pub text: String,
}

/// A full posting, or a job id to look up through the search service
#[derive(Deserialize)]
#[serde(crate = "rocket::serde")]
pub struct SaveJobRequest {
    #[serde(default)]
    pub job: Option<JobPosting>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct HealthData {
    pub status: &'static str,
    pub database: bool,
    pub ai_configured: bool,
    pub version: &'static str,
}
