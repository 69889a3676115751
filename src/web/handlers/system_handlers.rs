// src/web/handlers/system_handlers.rs
use rocket::serde::json::Json;
use rocket::State;

use crate::app_log;
use crate::core::template_engine::TemplateInfo;
use crate::jobs::locations::{self, Country, COUNTRIES};
use crate::web::state::AppState;
use crate::web::types::*;

pub async fn health_handler(state: &State<AppState>) -> Json<DataResponse<HealthData>> {
    let database = match state.db.health_check().await {
        Ok(()) => true,
        Err(e) => {
            app_log!(error, "Health check failed: {:#}", e);
            false
        }
    };

    Json(DataResponse::success(
        "OK".to_string(),
        HealthData {
            status: if database { "ok" } else { "degraded" },
            database,
            ai_configured: state.ai.is_some(),
            version: env!("CARGO_PKG_VERSION"),
        },
        None,
    ))
}

pub async fn get_templates_handler(
    state: &State<AppState>,
) -> Json<DataResponse<Vec<TemplateInfo>>> {
    let templates = state.exporter.templates().list_templates().to_vec();
    Json(DataResponse::success(
        format!("{} templates available", templates.len()),
        templates,
        None,
    ))
}

pub async fn get_locations_handler() -> Json<DataResponse<&'static [Country]>> {
    Json(DataResponse::success(
        format!("{} countries available", COUNTRIES.len()),
        COUNTRIES,
        None,
    ))
}

pub async fn get_cities_handler(country: &str) -> ApiResult<Json<DataResponse<Vec<String>>>> {
    match locations::resolve_country(country) {
        Some(found) => Ok(Json(DataResponse::success(
            format!("Cities in {}", found.name),
            found.cities.iter().map(|c| c.to_string()).collect(),
            None,
        ))),
        None => Err(not_found(&format!("Country '{}'", country), None)),
    }
}
