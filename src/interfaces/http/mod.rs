use actix_cors::Cors;
use actix_web::dev::Server;
use actix_web::error::{InternalError, JsonPayloadError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{get, post, put, web, App, HttpRequest, HttpResponse, HttpServer, Responder};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::application::use_cases::defects::DefectFilter;
use crate::application::use_cases::operation_flow::OperationFlowFilter;
use crate::application::{
    ChecklistTracker, DashboardUseCase, DefectsUseCase, HealthCheckUseCase, HealthMonitor,
    OperationFlowUseCase, ReportsUseCase, TestCasesUseCase,
};
use crate::domain::checklist::StepStatus;
use crate::domain::error::AppError;
use crate::domain::test_case::{ExecutionInput, TestCaseFilter};
use crate::infrastructure::api_client::QaBackend;
use crate::infrastructure::config::AppConfig;

const LOG_LIMIT: usize = 100;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LogEntry {
    pub time: String,
    pub level: String,
    pub source: String,
    pub message: String,
}

pub struct HttpState {
    pub dashboard: DashboardUseCase,
    pub test_cases: TestCasesUseCase,
    pub defects: DefectsUseCase,
    pub reports: ReportsUseCase,
    pub operation_flow: OperationFlowUseCase,
    pub health: HealthMonitor,
    pub checklist: Mutex<ChecklistTracker>,
    pub logs: Arc<Mutex<Vec<LogEntry>>>,
}

impl HttpState {
    pub fn new(backend: QaBackend, config: &AppConfig, logs: Arc<Mutex<Vec<LogEntry>>>) -> Self {
        Self {
            dashboard: DashboardUseCase::new(backend.clone(), config.recent_tests_limit),
            test_cases: TestCasesUseCase::new(backend.clone()),
            defects: DefectsUseCase::new(backend.clone()),
            reports: ReportsUseCase::new(backend.clone()),
            operation_flow: OperationFlowUseCase::new(backend.clone()),
            health: HealthMonitor::new(
                HealthCheckUseCase::new(backend),
                config.health_refresh_interval(),
            ),
            checklist: Mutex::new(ChecklistTracker::new()),
            logs,
        }
    }

    fn checklist(&self) -> Result<MutexGuard<'_, ChecklistTracker>, AppError> {
        self.checklist
            .lock()
            .map_err(|_| AppError::Internal("Checklist lock poisoned".to_string()))
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
    /// Path and query that re-issue the failed view, for upstream failures.
    retry: Option<String>,
}

fn status_for(err: &AppError) -> StatusCode {
    match err {
        AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        AppError::TimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
        AppError::Network(_) | AppError::Http { .. } | AppError::Decode(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(data: &HttpState, req: &HttpRequest, source: &str, err: AppError) -> HttpResponse {
    let status = status_for(&err);
    let level = if status.is_server_error() { "ERROR" } else { "WARN" };
    add_log(&data.logs, level, source, &err.to_string());
    if status.is_server_error() {
        error!(path = %req.path(), kind = err.kind(), error = %err, "View request failed");
    } else {
        warn!(path = %req.path(), kind = err.kind(), error = %err, "View request rejected");
    }

    let retry = err.is_upstream().then(|| {
        req.uri()
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| req.path().to_string())
    });
    HttpResponse::build(status).json(ErrorBody {
        error: err.to_string(),
        kind: err.kind(),
        retry,
    })
}

/// Extractor failures would otherwise surface as actix's plain-text 400.
fn rejected_request(req: &HttpRequest, err: AppError) -> HttpResponse {
    match req.app_data::<web::Data<HttpState>>() {
        Some(data) => error_response(data, req, "HttpApi", err),
        None => HttpResponse::BadRequest().json(ErrorBody {
            error: err.to_string(),
            kind: err.kind(),
            retry: None,
        }),
    }
}

fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    let response = rejected_request(
        req,
        AppError::ValidationError(format!("Invalid request body: {}", err)),
    );
    InternalError::from_response(err, response).into()
}

fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    let response = rejected_request(
        req,
        AppError::ValidationError(format!("Invalid query string: {}", err)),
    );
    InternalError::from_response(err, response).into()
}

fn respond<T: Serialize>(
    data: &HttpState,
    req: &HttpRequest,
    source: &str,
    outcome: Result<T, AppError>,
) -> HttpResponse {
    match outcome {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(err) => error_response(data, req, source, err),
    }
}

#[get("/dashboard")]
async fn dashboard(data: web::Data<HttpState>, req: HttpRequest) -> impl Responder {
    let outcome = data.dashboard.load().await;
    respond(&data, &req, "Dashboard", outcome)
}

#[get("/test-cases")]
async fn test_cases(
    data: web::Data<HttpState>,
    req: HttpRequest,
    filter: web::Query<TestCaseFilter>,
) -> impl Responder {
    let outcome = data.test_cases.load(filter.into_inner()).await;
    respond(&data, &req, "TestCases", outcome)
}

#[derive(Deserialize)]
struct QueueQuery {
    #[serde(default)]
    show_all: bool,
}

#[get("/test-cases/queue")]
async fn execution_queue(
    data: web::Data<HttpState>,
    req: HttpRequest,
    query: web::Query<QueueQuery>,
) -> impl Responder {
    let outcome = data.test_cases.execution_queue(query.show_all).await;
    respond(&data, &req, "TestExecution", outcome)
}

#[get("/test-cases/history")]
async fn execution_history(data: web::Data<HttpState>, req: HttpRequest) -> impl Responder {
    let outcome = data.test_cases.history();
    respond(&data, &req, "TestExecution", outcome)
}

#[post("/test-cases/{id}/execute")]
async fn execute_test_case(
    data: web::Data<HttpState>,
    req: HttpRequest,
    id: web::Path<i64>,
    filter: web::Query<TestCaseFilter>,
    input: web::Json<ExecutionInput>,
) -> impl Responder {
    let id = id.into_inner();
    let outcome = data
        .test_cases
        .execute(id, input.into_inner(), &filter)
        .await;
    if let Ok(outcome) = &outcome {
        add_log(&data.logs, "INFO", "TestExecution", &outcome.message);
    }
    respond(&data, &req, "TestExecution", outcome)
}

#[get("/defects")]
async fn defects(
    data: web::Data<HttpState>,
    req: HttpRequest,
    filter: web::Query<DefectFilter>,
) -> impl Responder {
    let outcome = data.defects.load(filter.into_inner()).await;
    respond(&data, &req, "Defects", outcome)
}

#[get("/reports")]
async fn reports(data: web::Data<HttpState>, req: HttpRequest) -> impl Responder {
    let outcome = data.reports.load().await;
    respond(&data, &req, "Reports", outcome)
}

#[get("/operation-flow")]
async fn operation_flow(
    data: web::Data<HttpState>,
    req: HttpRequest,
    filter: web::Query<OperationFlowFilter>,
) -> impl Responder {
    let outcome = data.operation_flow.load(filter.into_inner()).await;
    respond(&data, &req, "OperationFlow", outcome)
}

#[get("/health")]
async fn health(data: web::Data<HttpState>) -> impl Responder {
    HttpResponse::Ok().json(data.health.refresh().await)
}

#[derive(Deserialize)]
struct AutoRefreshRequest {
    enabled: bool,
}

#[derive(Serialize)]
struct AutoRefreshResponse {
    enabled: bool,
}

#[post("/health/auto-refresh")]
async fn health_auto_refresh(
    data: web::Data<HttpState>,
    req: HttpRequest,
    body: web::Json<AutoRefreshRequest>,
) -> impl Responder {
    let outcome = data
        .health
        .set_auto_refresh(body.enabled)
        .map(|enabled| AutoRefreshResponse { enabled });
    respond(&data, &req, "Health", outcome)
}

#[get("/checklist")]
async fn checklist(data: web::Data<HttpState>, req: HttpRequest) -> impl Responder {
    let outcome = data.checklist().map(|tracker| tracker.view());
    respond(&data, &req, "Checklist", outcome)
}

#[get("/checklist/{section}/{step}")]
async fn checklist_step(
    data: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (section, step) = path.into_inner();
    let outcome = data
        .checklist()
        .and_then(|tracker| tracker.step(&section, &step));
    respond(&data, &req, "Checklist", outcome)
}

#[post("/checklist/{section}/{step}/toggle")]
async fn toggle_step(
    data: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
) -> impl Responder {
    let (section, step) = path.into_inner();
    let outcome = data.checklist().and_then(|mut tracker| {
        tracker.toggle_step(&section, &step)?;
        Ok(tracker.view())
    });
    respond(&data, &req, "Checklist", outcome)
}

#[derive(Deserialize)]
struct StatusRequest {
    status: StepStatus,
}

#[put("/checklist/{section}/{step}/status")]
async fn set_step_status(
    data: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Json<StatusRequest>,
) -> impl Responder {
    let (section, step) = path.into_inner();
    let outcome = data
        .checklist()
        .and_then(|mut tracker| tracker.set_step_status(&section, &step, body.status));
    respond(&data, &req, "Checklist", outcome)
}

#[derive(Deserialize)]
struct NotesRequest {
    #[serde(default)]
    notes: String,
}

#[put("/checklist/{section}/{step}/notes")]
async fn set_step_notes(
    data: web::Data<HttpState>,
    req: HttpRequest,
    path: web::Path<(String, String)>,
    body: web::Json<NotesRequest>,
) -> impl Responder {
    let (section, step) = path.into_inner();
    let notes = body.into_inner().notes;
    let outcome = data
        .checklist()
        .and_then(|mut tracker| tracker.set_step_notes(&section, &step, notes));
    respond(&data, &req, "Checklist", outcome)
}

#[derive(Deserialize)]
struct ResetRequest {
    #[serde(default)]
    confirm: bool,
}

#[post("/checklist/reset")]
async fn reset_checklist(
    data: web::Data<HttpState>,
    req: HttpRequest,
    body: web::Json<ResetRequest>,
) -> impl Responder {
    let outcome = data.checklist().and_then(|mut tracker| {
        tracker.reset_all(body.confirm)?;
        Ok(tracker.view())
    });
    if outcome.is_ok() {
        add_log(&data.logs, "INFO", "Checklist", "Checklist progress reset");
    }
    respond(&data, &req, "Checklist", outcome)
}

#[get("/logs")]
async fn get_logs(data: web::Data<HttpState>) -> impl Responder {
    let logs = data
        .logs
        .lock()
        .map(|logs| logs.clone())
        .unwrap_or_default();
    HttpResponse::Ok().json(logs)
}

pub fn add_log_entry(
    logs: &Mutex<Vec<LogEntry>>,
    level: &str,
    source: &str,
    message: &str,
) -> LogEntry {
    let entry = LogEntry {
        time: Local::now().format("%H:%M:%S").to_string(),
        level: level.to_string(),
        source: source.to_string(),
        message: message.to_string(),
    };
    let mut logs = logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    logs.push(entry.clone());
    if logs.len() > LOG_LIMIT {
        logs.remove(0);
    }
    entry
}

pub fn add_log(logs: &Mutex<Vec<LogEntry>>, level: &str, source: &str, message: &str) {
    add_log_entry(logs, level, source, message);
}

/// Mounts every view route. Shared by the server and the tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .service(
        web::scope("/views")
            .service(dashboard)
            .service(execution_queue)
            .service(execution_history)
            .service(test_cases)
            .service(execute_test_case)
            .service(defects)
            .service(reports)
            .service(operation_flow)
            .service(health)
            .service(health_auto_refresh)
            .service(checklist)
            .service(reset_checklist)
            .service(checklist_step)
            .service(toggle_step)
            .service(set_step_status)
            .service(set_step_notes),
    )
    .service(get_logs);
}

pub fn start_server(state: web::Data<HttpState>, host: &str, port: u16) -> std::io::Result<Server> {
    add_log(
        &state.logs,
        "INFO",
        "HttpApi",
        &format!("View server listening on http://{}:{}", host, port),
    );
    info!(host, port, "Starting view server");

    let server = HttpServer::new(move || {
        let cors = Cors::permissive(); // Allow all origins for local tool

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((host.to_string(), port))?
    .run();

    Ok(server)
}
