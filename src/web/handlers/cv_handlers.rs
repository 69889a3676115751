// src/web/handlers/cv_handlers.rs
use rocket::serde::json::Json;
use rocket::State;

use crate::app_log;
use crate::records::{CvRecord, CvRepository, CvUpdate, NewCv};
use crate::types::cv_data::{filled, ValidationIssue};
use crate::web::guards::Caller;
use crate::web::state::AppState;
use crate::web::types::*;

fn validate_new_cv(cv: &NewCv) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if !filled(&cv.title) {
        issues.push(ValidationIssue::new("title", "Title is required"));
    }
    issues.extend(cv.document.validate_for_save());
    issues
}

fn validate_update(update: &CvUpdate) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();
    if update.title.as_deref().is_some_and(|t| !filled(t)) {
        issues.push(ValidationIssue::new("title", "Title cannot be empty"));
    }
    if let Some(document) = &update.document {
        issues.extend(document.validate_for_save());
    }
    issues
}

pub async fn create_cv_handler(
    request: Json<StandardRequest<NewCv>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<CvRecord>>> {
    let conversation_id = request.conversation_id();
    let new_cv = request.into_inner().data;

    let issues = validate_new_cv(&new_cv);
    if !issues.is_empty() {
        app_log!(info, "Rejected CV for user {}: {} issues", caller.user_id, issues.len());
        return Err(validation_error(&issues, conversation_id));
    }

    let record = CvRepository::new(state.db.pool())
        .create(&caller.user_id, new_cv)
        .await
        .map_err(|e| database_error(&e, conversation_id.clone()))?;

    Ok(Json(DataResponse::success(
        format!("CV '{}' created", record.title),
        record,
        conversation_id,
    )))
}

pub async fn list_cvs_handler(
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<Vec<CvRecord>>>> {
    let records = CvRepository::new(state.db.pool())
        .list_by_user(&caller.user_id)
        .await
        .map_err(|e| database_error(&e, None))?;

    Ok(Json(DataResponse::success(
        format!("{} CVs", records.len()),
        records,
        None,
    )))
}

pub async fn get_cv_handler(
    id: &str,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<CvRecord>>> {
    match CvRepository::new(state.db.pool())
        .get(&caller.user_id, id)
        .await
        .map_err(|e| database_error(&e, None))?
    {
        Some(record) => Ok(Json(DataResponse::success(
            record.title.clone(),
            record,
            None,
        ))),
        None => Err(not_found("CV", None)),
    }
}

pub async fn update_cv_handler(
    id: &str,
    request: Json<StandardRequest<CvUpdate>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<CvRecord>>> {
    let conversation_id = request.conversation_id();
    let update = request.into_inner().data;

    let issues = validate_update(&update);
    if !issues.is_empty() {
        return Err(validation_error(&issues, conversation_id));
    }

    match CvRepository::new(state.db.pool())
        .update(&caller.user_id, id, update)
        .await
        .map_err(|e| database_error(&e, conversation_id.clone()))?
    {
        Some(record) => Ok(Json(DataResponse::success(
            format!("CV '{}' updated", record.title),
            record,
            conversation_id,
        ))),
        None => Err(not_found("CV", conversation_id)),
    }
}

pub async fn delete_cv_handler(
    id: &str,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<ActionResponse>> {
    let deleted = CvRepository::new(state.db.pool())
        .delete(&caller.user_id, id)
        .await
        .map_err(|e| database_error(&e, None))?;

    if !deleted {
        return Err(not_found("CV", None));
    }
    Ok(Json(ActionResponse::success(
        "CV deleted".to_string(),
        "cv_deleted".to_string(),
        None,
    )))
}

pub async fn set_primary_cv_handler(
    id: &str,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<ActionResponse>> {
    let updated = CvRepository::new(state.db.pool())
        .set_primary(&caller.user_id, id)
        .await
        .map_err(|e| database_error(&e, None))?;

    if !updated {
        return Err(not_found("CV", None));
    }
    Ok(Json(ActionResponse::success(
        "Primary CV updated".to_string(),
        "cv_primary_set".to_string(),
        None,
    )))
}

pub async fn duplicate_cv_handler(
    id: &str,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<CvRecord>>> {
    match CvRepository::new(state.db.pool())
        .duplicate(&caller.user_id, id)
        .await
        .map_err(|e| database_error(&e, None))?
    {
        Some(copy) => Ok(Json(DataResponse::success(
            format!("Created '{}'", copy.title),
            copy,
            None,
        ))),
        None => Err(not_found("CV", None)),
    }
}

pub async fn export_cv_handler(
    id: &str,
    request: Json<StandardRequest<ExportRequest>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<PdfResponse> {
    let conversation_id = request.conversation_id();
    let options = request.into_inner().data;

    let record = CvRepository::new(state.db.pool())
        .get(&caller.user_id, id)
        .await
        .map_err(|e| database_error(&e, conversation_id.clone()))?
        .ok_or_else(|| not_found("CV", conversation_id.clone()))?;

    let template = options.template.as_deref().unwrap_or(&record.template);
    let language = options.language.as_deref().unwrap_or(&record.language);

    let pdf = state
        .exporter
        .export(&record.document, template, language, options.paper)
        .await
        .map_err(|e| service_unavailable("PDF export", &e, conversation_id))?;

    Ok(PdfResponse {
        data: pdf.bytes,
        filename: pdf.filename,
    })
}
