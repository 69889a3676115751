// src/web/handlers/ats_handlers.rs
use rocket::serde::json::Json;
use rocket::State;

use crate::app_log;
use crate::ats::AnalysisOutcome;
use crate::records::CvRepository;
use crate::types::cv_data::{CvDocument, ValidationIssue};
use crate::web::guards::Caller;
use crate::web::state::AppState;
use crate::web::types::*;

/// Inline CV wins over a stored one
async fn resolve_cv(
    request: &mut AnalyzeRequest,
    caller: &Caller,
    state: &AppState,
    conversation_id: &Option<String>,
) -> ApiResult<CvDocument> {
    if let Some(cv) = request.cv.take() {
        return Ok(cv);
    }
    let Some(cv_id) = request.cv_id.as_deref() else {
        return Err(validation_error(
            &[ValidationIssue::new("cv", "Provide a CV or a cv_id")],
            conversation_id.clone(),
        ));
    };

    CvRepository::new(state.db.pool())
        .get(&caller.user_id, cv_id)
        .await
        .map_err(|e| database_error(&e, conversation_id.clone()))?
        .map(|record| record.document)
        .ok_or_else(|| not_found("CV", conversation_id.clone()))
}

pub async fn analyze_handler(
    request: Json<StandardRequest<AnalyzeRequest>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<AnalysisOutcome>>> {
    let conversation_id = request.conversation_id();
    let mut analyze = request.into_inner().data;

    let cv = resolve_cv(&mut analyze, &caller, state, &conversation_id).await?;
    let job_description = analyze
        .job_description
        .as_deref()
        .map(str::trim)
        .filter(|jd| !jd.is_empty());

    let outcome = state
        .analysis
        .analyze(&caller.session_id, &cv, job_description, analyze.mode)
        .await;

    // A superseded result must not overwrite the score of a newer run
    if let (Some(cv_id), false) = (analyze.cv_id.as_deref(), outcome.superseded) {
        if let Err(e) = CvRepository::new(state.db.pool())
            .record_ats_score(&caller.user_id, cv_id, outcome.result.score)
            .await
        {
            app_log!(warn, "Could not store ATS score for CV {}: {:#}", cv_id, e);
        }
    }

    Ok(Json(DataResponse::success(
        format!("ATS score: {}/100", outcome.result.score),
        outcome,
        conversation_id,
    )))
}

pub async fn latest_analysis_handler(
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<AnalysisOutcome>>> {
    match state.analysis.latest(&caller.session_id) {
        Some(outcome) => Ok(Json(DataResponse::success(
            format!("Latest ATS score: {}/100", outcome.result.score),
            outcome,
            None,
        ))),
        None => Err(not_found("Analysis", None)),
    }
}
