// src/web/mod.rs

pub mod guards;
pub mod handlers;
pub mod state;
pub mod types;

pub use guards::Caller;
pub use state::AppState;
pub use types::*;

use anyhow::Result;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{
    catchers, delete, get, options, patch, post, put, routes, Build, Request, Response, Rocket,
    State,
};

use crate::app_log;
use crate::ats::AnalysisOutcome;
use crate::core::template_engine::TemplateInfo;
use crate::core::ConfigManager;
use crate::jobs::locations::Country;
use crate::jobs::{JobFilters, JobPage, JobPosting};
use crate::records::{
    Application, ApplicationUpdate, CvRecord, CvUpdate, NewApplication, NewCv, SavedJob,
};

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, PUT, PATCH, DELETE, OPTIONS",
        ));
        response.set_header(Header::new("Access-Control-Allow-Headers", "*"));
        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

// ===== System =====

#[get("/health")]
pub async fn health(state: &State<AppState>) -> Json<DataResponse<HealthData>> {
    handlers::health_handler(state).await
}

#[get("/templates")]
pub async fn get_templates(state: &State<AppState>) -> Json<DataResponse<Vec<TemplateInfo>>> {
    handlers::get_templates_handler(state).await
}

#[get("/locations")]
pub async fn get_locations() -> Json<DataResponse<&'static [Country]>> {
    handlers::get_locations_handler().await
}

#[get("/locations/<country>/cities")]
pub async fn get_cities(country: &str) -> ApiResult<Json<DataResponse<Vec<String>>>> {
    handlers::get_cities_handler(country).await
}

// ===== CVs =====

#[post("/cvs", data = "<request>")]
pub async fn create_cv(
    request: Json<StandardRequest<NewCv>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<CvRecord>>> {
    handlers::create_cv_handler(request, caller, state).await
}

#[get("/cvs")]
pub async fn list_cvs(
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<Vec<CvRecord>>>> {
    handlers::list_cvs_handler(caller, state).await
}

#[get("/cvs/<id>")]
pub async fn get_cv(
    id: &str,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<CvRecord>>> {
    handlers::get_cv_handler(id, caller, state).await
}

#[put("/cvs/<id>", data = "<request>")]
pub async fn update_cv(
    id: &str,
    request: Json<StandardRequest<CvUpdate>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<CvRecord>>> {
    handlers::update_cv_handler(id, request, caller, state).await
}

#[delete("/cvs/<id>")]
pub async fn delete_cv(
    id: &str,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<ActionResponse>> {
    handlers::delete_cv_handler(id, caller, state).await
}

#[post("/cvs/<id>/primary")]
pub async fn set_primary_cv(
    id: &str,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<ActionResponse>> {
    handlers::set_primary_cv_handler(id, caller, state).await
}

#[post("/cvs/<id>/duplicate")]
pub async fn duplicate_cv(
    id: &str,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<CvRecord>>> {
    handlers::duplicate_cv_handler(id, caller, state).await
}

#[post("/cvs/<id>/export", data = "<request>")]
pub async fn export_cv(
    id: &str,
    request: Json<StandardRequest<ExportRequest>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<PdfResponse> {
    handlers::export_cv_handler(id, request, caller, state).await
}

// ===== ATS and AI =====

#[post("/ats/analyze", data = "<request>")]
pub async fn analyze_cv(
    request: Json<StandardRequest<AnalyzeRequest>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<AnalysisOutcome>>> {
    handlers::analyze_handler(request, caller, state).await
}

#[get("/ats/latest")]
pub async fn latest_analysis(
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<AnalysisOutcome>>> {
    handlers::latest_analysis_handler(caller, state).await
}

#[post("/ai/generate", data = "<request>")]
pub async fn generate_text(
    request: Json<StandardRequest<GenerateTextRequest>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<GeneratedText>>> {
    handlers::generate_text_handler(request, caller, state).await
}

// ===== Jobs =====

#[post("/jobs/search", data = "<request>")]
pub async fn search_jobs(
    request: Json<StandardRequest<JobFilters>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<JobPage>>> {
    handlers::search_jobs_handler(request, caller, state).await
}

#[get("/jobs/<id>")]
pub async fn get_job(
    id: &str,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<JobPosting>>> {
    handlers::get_job_handler(id, caller, state).await
}

#[post("/jobs/cache/clear")]
pub async fn clear_search_cache(caller: Caller, state: &State<AppState>) -> Json<ActionResponse> {
    handlers::clear_search_cache_handler(caller, state).await
}

// ===== Tracker =====

#[get("/saved-jobs")]
pub async fn list_saved_jobs(
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<Vec<SavedJob>>>> {
    handlers::list_saved_jobs_handler(caller, state).await
}

#[post("/saved-jobs", data = "<request>")]
pub async fn save_job(
    request: Json<StandardRequest<SaveJobRequest>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<SavedJob>>> {
    handlers::save_job_handler(request, caller, state).await
}

#[delete("/saved-jobs/<id>")]
pub async fn delete_saved_job(
    id: &str,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<ActionResponse>> {
    handlers::delete_saved_job_handler(id, caller, state).await
}

#[get("/applications?<status>")]
pub async fn list_applications(
    status: Option<&str>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<Vec<Application>>>> {
    handlers::list_applications_handler(status, caller, state).await
}

#[post("/applications", data = "<request>")]
pub async fn create_application(
    request: Json<StandardRequest<NewApplication>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<Application>>> {
    handlers::create_application_handler(request, caller, state).await
}

#[patch("/applications/<id>", data = "<request>")]
pub async fn update_application(
    id: &str,
    request: Json<StandardRequest<ApplicationUpdate>>,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<DataResponse<Application>>> {
    handlers::update_application_handler(id, request, caller, state).await
}

#[delete("/applications/<id>")]
pub async fn delete_application(
    id: &str,
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<Json<ActionResponse>> {
    handlers::delete_application_handler(id, caller, state).await
}

#[get("/applications/export")]
pub async fn export_applications(
    caller: Caller,
    state: &State<AppState>,
) -> ApiResult<CsvResponse> {
    handlers::export_applications_handler(caller, state).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
        None,
    ))
}

#[rocket::catch(401)]
pub fn unauthorized() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Missing or invalid user identity".to_string(),
        "UNAUTHORIZED".to_string(),
        vec![format!("Send the {} header", guards::USER_HEADER)],
        None,
    ))
}

#[rocket::catch(404)]
pub fn not_found_catcher(req: &Request) -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        format!("No route for {}", req.uri().path()),
        "NOT_FOUND".to_string(),
        vec!["Check the endpoint path".to_string()],
        None,
    ))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Request body does not match the expected shape".to_string(),
        "VALIDATION_ERROR".to_string(),
        vec!["Check field names and value types".to_string()],
        None,
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec![
            "Try again in a few moments".to_string(),
            "Contact support if the problem persists".to_string(),
        ],
        None,
    ))
}

pub fn build_rocket(state: AppState, port: u16) -> Rocket<Build> {
    let figment = rocket::Config::figment()
        .merge(("address", "0.0.0.0"))
        .merge(("port", port));

    rocket::custom(figment)
        .attach(Cors)
        .manage(state)
        .register(
            "/api",
            catchers![
                bad_request,
                unauthorized,
                not_found_catcher,
                unprocessable,
                internal_error
            ],
        )
        .mount(
            "/api",
            routes![
                health,
                get_templates,
                get_locations,
                get_cities,
                create_cv,
                list_cvs,
                get_cv,
                update_cv,
                delete_cv,
                set_primary_cv,
                duplicate_cv,
                export_cv,
                analyze_cv,
                latest_analysis,
                generate_text,
                search_jobs,
                get_job,
                clear_search_cache,
                list_saved_jobs,
                save_job,
                delete_saved_job,
                list_applications,
                create_application,
                update_application,
                delete_application,
                export_applications,
                options,
            ],
        )
}

// Main server start function
pub async fn start_web_server(config: ConfigManager) -> Result<()> {
    let state = AppState::from_config(&config).await?;
    let port = config.environment.port;

    app_log!(info, "Starting careerkit API server ({})", config.environment_name);
    app_log!(info, "Database: {}", config.environment.database_path.display());
    app_log!(info, "Server: http://0.0.0.0:{}", port);

    build_rocket(state, port).launch().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{AiAction, AiGenerator};
    use crate::ats::AtsPolicy;
    use crate::core::{Database, TemplateEngine};
    use crate::export::PdfExporter;
    use crate::jobs::tests::posting;
    use crate::jobs::{JobSearchService, JobSource, SourcePage};
    use crate::types::cv_data::CvDocument;
    use rocket::http::{ContentType, Header};
    use rocket::local::asynchronous::Client;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Default)]
    struct StubJobs {
        searches: AtomicUsize,
    }

    #[rocket::async_trait]
    impl JobSource for StubJobs {
        async fn search(&self, _filters: &JobFilters) -> anyhow::Result<SourcePage> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            Ok(SourcePage {
                jobs: vec![posting("job-1"), posting("job-2")],
                total: 2,
            })
        }

        async fn fetch_job(&self, id: &str) -> anyhow::Result<Option<JobPosting>> {
            Ok((id == "job-9").then(|| posting("job-9")))
        }
    }

    struct StubAi;

    #[rocket::async_trait]
    impl AiGenerator for StubAi {
        async fn generate(
            &self,
            action: AiAction,
            _cv: &CvDocument,
            _job_description: Option<&str>,
            _context: Option<&str>,
        ) -> anyhow::Result<String> {
            match action {
                AiAction::AtsAnalyze => Ok(r#"{"score": 90, "suggestions": ["Mention Kubernetes"]}"#.to_string()),
                _ => Ok(format!("generated {}", action)),
            }
        }
    }

    async fn client_with(ai: Option<Arc<dyn AiGenerator>>) -> (Client, Arc<StubJobs>) {
        let db = Database::in_memory().await.unwrap();
        let source = Arc::new(StubJobs::default());
        let jobs = JobSearchService::new(source.clone(), Duration::from_secs(5));
        let templates = TemplateEngine::new("missing-templates-dir".into()).unwrap();
        let exporter = PdfExporter::new(Arc::new(templates))
            .with_binary("careerkit-test-no-such-typst");
        let state = AppState::assemble(
            db,
            AtsPolicy::default(),
            ai,
            Duration::from_secs(1),
            jobs,
            exporter,
        );
        let client = Client::tracked(build_rocket(state, 0)).await.unwrap();
        (client, source)
    }

    async fn client() -> Client {
        client_with(None).await.0
    }

    fn user(id: &str) -> Header<'static> {
        Header::new("X-User-Id", id.to_string())
    }

    fn cv_body(title: &str) -> Value {
        json!({
            "title": title,
            "document": {
                "personal_info": { "full_name": "Ada Lovelace", "email": "ada@example.com" },
                "summary": "Engineer",
                "experience": [{
                    "company": "Acme",
                    "title": "Engineer",
                    "achievements": ["Led a team of 5 engineers to reduce latency by 30%"]
                }]
            }
        })
    }

    async fn create_cv_for(client: &Client, user_id: &str, title: &str) -> Value {
        let response = client
            .post("/api/cvs")
            .header(ContentType::JSON)
            .header(user(user_id))
            .body(cv_body(title).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        response.into_json::<Value>().await.unwrap()
    }

    #[rocket::async_test]
    async fn test_health_and_locations() {
        let client = client().await;

        let response = client.get("/api/health").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["data"]["database"], true);
        assert_eq!(body["data"]["ai_configured"], false);

        let response = client.get("/api/locations/de/cities").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.unwrap();
        assert!(body["data"].as_array().unwrap().iter().any(|c| c == "Berlin"));

        let response = client.get("/api/locations/xx/cities").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_missing_identity_is_unauthorized() {
        let client = client().await;
        let response = client.get("/api/cvs").dispatch().await;
        assert_eq!(response.status(), Status::Unauthorized);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error_code"], "UNAUTHORIZED");
        assert_eq!(body["success"], false);
    }

    #[rocket::async_test]
    async fn test_cv_lifecycle_is_scoped_to_user() {
        let client = client().await;
        let first = create_cv_for(&client, "u1", "Backend").await;
        assert_eq!(first["data"]["is_primary"], true);
        let id = first["data"]["id"].as_str().unwrap().to_string();

        let other = client
            .get(format!("/api/cvs/{}", id))
            .header(user("u2"))
            .dispatch()
            .await;
        assert_eq!(other.status(), Status::NotFound);

        let copy = client
            .post(format!("/api/cvs/{}/duplicate", id))
            .header(user("u1"))
            .dispatch()
            .await;
        let copy: Value = copy.into_json().await.unwrap();
        assert_eq!(copy["data"]["title"], "Backend (Copy)");
        assert_eq!(copy["data"]["is_primary"], false);

        let list: Value = client
            .get("/api/cvs")
            .header(user("u1"))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(list["data"].as_array().unwrap().len(), 2);
        assert_eq!(list["data"][0]["id"], id.as_str());

        let deleted = client
            .delete(format!("/api/cvs/{}", id))
            .header(user("u1"))
            .dispatch()
            .await;
        assert_eq!(deleted.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn test_invalid_cv_is_rejected() {
        let client = client().await;
        let response = client
            .post("/api/cvs")
            .header(ContentType::JSON)
            .header(user("u1"))
            .body(json!({ "title": " ", "document": { "personal_info": { "email": "nope" } } }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error_code"], "VALIDATION_ERROR");
        assert_eq!(body["suggestions"].as_array().unwrap().len(), 3);
    }

    #[rocket::async_test]
    async fn test_analysis_by_id_stores_score() {
        let client = client().await;
        let created = create_cv_for(&client, "u1", "Backend").await;
        let id = created["data"]["id"].as_str().unwrap();

        let response = client
            .post("/api/ats/analyze")
            .header(ContentType::JSON)
            .header(user("u1"))
            .body(json!({ "cv_id": id, "conversation_id": "c-1" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["conversation_id"], "c-1");
        let score = body["data"]["result"]["score"].as_u64().unwrap();
        assert!(score <= 100);

        let stored: Value = client
            .get(format!("/api/cvs/{}", id))
            .header(user("u1"))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(stored["data"]["ats_score"].as_u64(), Some(score));

        let latest = client.get("/api/ats/latest").header(user("u1")).dispatch().await;
        assert_eq!(latest.status(), Status::Ok);
        let latest = client.get("/api/ats/latest").header(user("u2")).dispatch().await;
        assert_eq!(latest.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn test_analysis_needs_a_cv() {
        let client = client().await;
        let response = client
            .post("/api/ats/analyze")
            .header(ContentType::JSON)
            .header(user("u1"))
            .body(json!({ "mode": "hybrid" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
    }

    #[rocket::async_test]
    async fn test_ai_generation_requires_configuration() {
        let client = client().await;
        let body = json!({ "action": "summary", "cv": { "summary": "Engineer" } }).to_string();
        let response = client
            .post("/api/ai/generate")
            .header(ContentType::JSON)
            .header(user("u1"))
            .body(body.clone())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::ServiceUnavailable);

        let (client, _) = client_with(Some(Arc::new(StubAi))).await;
        let response = client
            .post("/api/ai/generate")
            .header(ContentType::JSON)
            .header(user("u1"))
            .body(body)
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Ok);
        let value: Value = response.into_json().await.unwrap();
        assert_eq!(value["data"]["text"], "generated summary");

        let response = client
            .post("/api/ai/generate")
            .header(ContentType::JSON)
            .header(user("u1"))
            .body(json!({ "action": "cover-letter", "cv": {} }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::UnprocessableEntity);
    }

    #[rocket::async_test]
    async fn test_job_search_is_cached_per_session() {
        let (client, source) = client_with(None).await;
        let search = || {
            client
                .post("/api/jobs/search")
                .header(ContentType::JSON)
                .header(user("u1"))
                .body(json!({ "query": "rust" }).to_string())
        };

        let first: Value = search().dispatch().await.into_json().await.unwrap();
        assert_eq!(first["data"]["from_cache"], false);
        let second: Value = search().dispatch().await.into_json().await.unwrap();
        assert_eq!(second["data"]["from_cache"], true);
        assert_eq!(source.searches.load(Ordering::SeqCst), 1);

        let cleared = client
            .post("/api/jobs/cache/clear")
            .header(user("u1"))
            .dispatch()
            .await;
        assert_eq!(cleared.status(), Status::Ok);
        search().dispatch().await;
        assert_eq!(source.searches.load(Ordering::SeqCst), 2);

        let invalid = client
            .post("/api/jobs/search")
            .header(ContentType::JSON)
            .header(user("u1"))
            .body(json!({ "query": "rust", "per_page": 500 }).to_string())
            .dispatch()
            .await;
        assert_eq!(invalid.status(), Status::UnprocessableEntity);
    }

    #[rocket::async_test]
    async fn test_saved_jobs_and_applications() {
        let client = client().await;

        let saved = client
            .post("/api/saved-jobs")
            .header(ContentType::JSON)
            .header(user("u1"))
            .body(json!({ "job_id": "job-9", "notes": "Apply soon" }).to_string())
            .dispatch()
            .await;
        assert_eq!(saved.status(), Status::Ok);

        let missing = client
            .post("/api/saved-jobs")
            .header(ContentType::JSON)
            .header(user("u1"))
            .body(json!({ "job_id": "unknown" }).to_string())
            .dispatch()
            .await;
        assert_eq!(missing.status(), Status::NotFound);

        let created: Value = client
            .post("/api/applications")
            .header(ContentType::JSON)
            .header(user("u1"))
            .body(json!({ "company": "Acme", "position": "Engineer", "job_id": "job-9" }).to_string())
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        let id = created["data"]["id"].as_str().unwrap();

        let updated: Value = client
            .patch(format!("/api/applications/{}", id))
            .header(ContentType::JSON)
            .header(user("u1"))
            .body(json!({ "status": "applied" }).to_string())
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert_eq!(updated["data"]["status"], "applied");
        assert!(updated["data"]["applied_at"].is_string());

        let filtered: Value = client
            .get("/api/applications?status=offer")
            .header(user("u1"))
            .dispatch()
            .await
            .into_json()
            .await
            .unwrap();
        assert!(filtered["data"].as_array().unwrap().is_empty());

        let bad_status = client
            .get("/api/applications?status=ghosted")
            .header(user("u1"))
            .dispatch()
            .await;
        assert_eq!(bad_status.status(), Status::UnprocessableEntity);

        let csv = client
            .get("/api/applications/export")
            .header(user("u1"))
            .dispatch()
            .await;
        assert_eq!(csv.status(), Status::Ok);
        assert!(csv.content_type().is_some_and(|c| c.is_csv()));
        let text = csv.into_string().await.unwrap();
        assert!(text.starts_with("company,position,status"));
        assert!(text.contains("Acme,Engineer,applied"));
    }

    #[rocket::async_test]
    async fn test_export_without_typst_is_unavailable() {
        let client = client().await;
        let created = create_cv_for(&client, "u1", "Backend").await;
        let id = created["data"]["id"].as_str().unwrap();

        let response = client
            .post(format!("/api/cvs/{}/export", id))
            .header(ContentType::JSON)
            .header(user("u1"))
            .body(json!({ "paper": "letter" }).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::ServiceUnavailable);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["error_code"], "SERVICE_UNAVAILABLE");
    }
}
