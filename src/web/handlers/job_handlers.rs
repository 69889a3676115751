// src/web/handlers/job_handlers.rs
use rocket::serde::json::Json;
use rocket::State;

use crate::jobs::{JobFilters, JobPage, JobPosting};
use crate::web::guards::Caller;
use crate::web::state::AppState;
use crate::web::types::*;

pub async fn search_jobs_handler(
    request: Json<StandardRequest<JobFilters>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<JobPage>>> {
    let conversation_id = request.conversation_id();
    let filters = request.into_inner().data;

    let issues = filters.validate();
    if !issues.is_empty() {
        return Err(validation_error(&issues, conversation_id));
    }

    let page = state
        .jobs
        .search(&caller.session_id, &filters)
        .await
        .map_err(|e| service_unavailable("Job search", &e, conversation_id.clone()))?;

    let message = if page.stale {
        format!("{} jobs found (cached results, search is unavailable)", page.total)
    } else {
        format!("{} jobs found", page.total)
    };
    Ok(Json(DataResponse::success(message, page, conversation_id)))
}

pub async fn get_job_handler(
    id: &str,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<JobPosting>>> {
    match state
        .jobs
        .get_job(&caller.session_id, id)
        .await
        .map_err(|e| service_unavailable("Job search", &e, None))?
    {
        Some(job) => Ok(Json(DataResponse::success(job.title.clone(), job, None))),
        None => Err(not_found("Job", None)),
    }
}

pub async fn clear_search_cache_handler(
    caller: Caller,
    state: &State<AppState>,
) -> Json<ActionResponse> {
    let removed = state.jobs.clear_cache(&caller.session_id);
    Json(ActionResponse::success(
        format!("Cleared {} cached searches", removed),
        "cache_cleared".to_string(),
        None,
    ))
}
