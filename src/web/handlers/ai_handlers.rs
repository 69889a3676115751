// src/web/handlers/ai_handlers.rs
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;

use crate::app_log;
use crate::records::CvRepository;
use crate::types::cv_data::ValidationIssue;
use crate::web::guards::Caller;
use crate::web::state::AppState;
use crate::web::types::*;

pub async fn generate_text_handler(
    request: Json<StandardRequest<GenerateTextRequest>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<GeneratedText>>> {
    let conversation_id = request.conversation_id();
    let generate = request.into_inner().data;

    let Some(ai) = state.ai.as_ref() else {
        return Err((
            Status::ServiceUnavailable,
            Json(StandardErrorResponse::new(
                "AI generation is not configured".to_string(),
                "SERVICE_UNAVAILABLE".to_string(),
                vec!["Set AI_API_URL to enable generation".to_string()],
                conversation_id,
            )),
        ));
    };

    let job_description = generate
        .job_description
        .as_deref()
        .map(str::trim)
        .filter(|jd| !jd.is_empty());
    if generate.action.requires_job_description() && job_description.is_none() {
        return Err(validation_error(
            &[ValidationIssue::new(
                "job_description",
                "This action needs a job description",
            )],
            conversation_id,
        ));
    }

    let cv = match (generate.cv, generate.cv_id.as_deref()) {
        (Some(cv), _) => cv,
        (None, Some(cv_id)) => CvRepository::new(state.db.pool())
            .get(&caller.user_id, cv_id)
            .await
            .map_err(|e| database_error(&e, conversation_id.clone()))?
            .map(|record| record.document)
            .ok_or_else(|| not_found("CV", conversation_id.clone()))?,
        (None, None) => {
            return Err(validation_error(
                &[ValidationIssue::new("cv", "Provide a CV or a cv_id")],
                conversation_id,
            ))
        }
    };

    app_log!(info, "Generating {} for user {}", generate.action, caller.user_id);

    let text = ai
        .generate(
            generate.action,
            &cv,
            job_description,
            generate.context.as_deref(),
        )
        .await
        .map_err(|e| service_unavailable("AI service", &e, conversation_id.clone()))?;

    Ok(Json(DataResponse::success(
        format!("Generated {}", generate.action),
        GeneratedText {
            action: generate.action,
            text,
        },
        conversation_id,
    )))
}
