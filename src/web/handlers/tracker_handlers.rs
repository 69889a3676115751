// src/web/handlers/tracker_handlers.rs
//! Saved jobs and the application tracker
use rocket::serde::json::Json;
use rocket::State;

use crate::records::{
    Application, ApplicationRepository, ApplicationStatus, ApplicationUpdate, NewApplication,
    SavedJob, SavedJobRepository,
};
use crate::types::cv_data::ValidationIssue;
use crate::web::guards::Caller;
use crate::web::state::AppState;
use crate::web::types::*;

// ===== Saved jobs =====

pub async fn list_saved_jobs_handler(
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<Vec<SavedJob>>>> {
    let saved = SavedJobRepository::new(state.db.pool())
        .list(&caller.user_id)
        .await
        .map_err(|e| database_error(&e, None))?;

    Ok(Json(DataResponse::success(
        format!("{} saved jobs", saved.len()),
        saved,
        None,
    )))
}

pub async fn save_job_handler(
    request: Json<StandardRequest<SaveJobRequest>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<SavedJob>>> {
    let conversation_id = request.conversation_id();
    let save = request.into_inner().data;

    let posting = match (save.job, save.job_id.as_deref()) {
        (Some(job), _) => job,
        (None, Some(job_id)) => state
            .jobs
            .get_job(&caller.session_id, job_id)
            .await
            .map_err(|e| service_unavailable("Job search", &e, conversation_id.clone()))?
            .ok_or_else(|| not_found("Job", conversation_id.clone()))?,
        (None, None) => {
            return Err(validation_error(
                &[ValidationIssue::new("job", "Provide a job or a job_id")],
                conversation_id,
            ))
        }
    };

    let saved = SavedJobRepository::new(state.db.pool())
        .save(&caller.user_id, &posting, save.notes.as_deref())
        .await
        .map_err(|e| database_error(&e, conversation_id.clone()))?;

    Ok(Json(DataResponse::success(
        format!("Saved '{}'", saved.title),
        saved,
        conversation_id,
    )))
}

pub async fn delete_saved_job_handler(
    id: &str,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<ActionResponse>> {
    let deleted = SavedJobRepository::new(state.db.pool())
        .delete(&caller.user_id, id)
        .await
        .map_err(|e| database_error(&e, None))?;

    if !deleted {
        return Err(not_found("Saved job", None));
    }
    Ok(Json(ActionResponse::success(
        "Saved job removed".to_string(),
        "saved_job_deleted".to_string(),
        None,
    )))
}

// ===== Applications =====

pub async fn list_applications_handler(
    status: Option<&str>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<Vec<Application>>>> {
    let status = match status.map(str::parse::<ApplicationStatus>).transpose() {
        Ok(status) => status,
        Err(e) => {
            return Err(validation_error(
                &[ValidationIssue::new("status", &e.to_string())],
                None,
            ))
        }
    };

    let applications = ApplicationRepository::new(state.db.pool())
        .list(&caller.user_id, status)
        .await
        .map_err(|e| database_error(&e, None))?;

    Ok(Json(DataResponse::success(
        format!("{} applications", applications.len()),
        applications,
        None,
    )))
}

pub async fn create_application_handler(
    request: Json<StandardRequest<NewApplication>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<Application>>> {
    let conversation_id = request.conversation_id();
    let new_application = request.into_inner().data;

    let issues = new_application.validate();
    if !issues.is_empty() {
        return Err(validation_error(&issues, conversation_id));
    }

    let application = ApplicationRepository::new(state.db.pool())
        .create(&caller.user_id, new_application)
        .await
        .map_err(|e| database_error(&e, conversation_id.clone()))?;

    Ok(Json(DataResponse::success(
        format!(
            "Tracking {} at {}",
            application.position, application.company
        ),
        application,
        conversation_id,
    )))
}

pub async fn update_application_handler(
    id: &str,
    request: Json<StandardRequest<ApplicationUpdate>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<Application>>> {
    let conversation_id = request.conversation_id();
    let update = request.into_inner().data;

    match ApplicationRepository::new(state.db.pool())
        .update(&caller.user_id, id, update)
        .await
        .map_err(|e| database_error(&e, conversation_id.clone()))?
    {
        Some(application) => Ok(Json(DataResponse::success(
            format!("Application is now {}", application.status),
            application,
            conversation_id,
        ))),
        None => Err(not_found("Application", conversation_id)),
    }
}

pub async fn delete_application_handler(
    id: &str,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<ActionResponse>> {
    let deleted = ApplicationRepository::new(state.db.pool())
        .delete(&caller.user_id, id)
        .await
        .map_err(|e| database_error(&e, None))?;

    if !deleted {
        return Err(not_found("Application", None));
    }
    Ok(Json(ActionResponse::success(
        "Application deleted".to_string(),
        "application_deleted".to_string(),
        None,
    )))
}

pub async fn export_applications_handler(
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<CsvResponse> {
    let content = ApplicationRepository::new(state.db.pool())
        .export_csv(&caller.user_id)
        .await
        .map_err(|e| database_error(&e, None))?;

    Ok(CsvResponse {
        content,
        filename: "applications.csv".to_string(),
    })
}
