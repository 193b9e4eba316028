//! A configurable stand-in for the QA backend's REST surface.
//!
//! Routes match on method, path (with `{param}` segments) and optional query
//! values; the most specific match wins. Used by `qa-dashboard stub-backend`
//! and by tests that need a real socket.

use actix_web::dev::ServerHandle;
use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use crate::domain::error::{AppError, Result};
use crate::interfaces::http::{add_log, LogEntry};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryMatcher {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StubResponse {
    pub status: u16,
    #[serde(default)]
    pub body: JsonValue,
    #[serde(default)]
    pub delay_ms: Option<u64>,
    /// Overlay the fields of a JSON object request body onto `body`.
    #[serde(default)]
    pub merge_request_body: bool,
}

impl Default for StubResponse {
    fn default() -> Self {
        Self::json(200, json!({}))
    }
}

impl StubResponse {
    pub fn json(status: u16, body: JsonValue) -> Self {
        Self {
            status,
            body,
            delay_ms: None,
            merge_request_body: false,
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = Some(delay_ms);
        self
    }

    pub fn merging_request_body(mut self) -> Self {
        self.merge_request_body = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StubRoute {
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub query: Vec<QueryMatcher>,
    #[serde(default)]
    pub response: StubResponse,
}

impl StubRoute {
    pub fn new(method: &str, path: &str, response: StubResponse) -> Self {
        Self {
            method: method.to_uppercase(),
            path: path.to_string(),
            query: Vec::new(),
            response,
        }
    }

    pub fn get(path: &str, response: StubResponse) -> Self {
        Self::new("GET", path, response)
    }

    pub fn put(path: &str, response: StubResponse) -> Self {
        Self::new("PUT", path, response)
    }

    pub fn when_query(mut self, key: &str, value: &str) -> Self {
        self.query.push(QueryMatcher {
            key: key.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// `None` when the route does not apply, otherwise how many query matchers it satisfied.
    fn score(&self, method: &str, path: &str, query: &HashMap<String, String>) -> Option<usize> {
        if !self.method.trim().eq_ignore_ascii_case(method) || !path_matches(&self.path, path) {
            return None;
        }
        let all_match = self.query.iter().all(|matcher| {
            query
                .get(&matcher.key.trim().to_lowercase())
                .is_some_and(|value| value == matcher.value.trim())
        });
        all_match.then_some(self.query.len())
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RoutesFile {
    List(Vec<StubRoute>),
    Wrapped { routes: Vec<StubRoute> },
}

/// Reads routes from a JSON file holding either an array or `{ "routes": [...] }`.
pub fn load_routes(path: &Path) -> Result<Vec<StubRoute>> {
    let content = fs::read_to_string(path).map_err(|err| {
        AppError::ConfigError(format!("Failed to read stub routes {}: {}", path.display(), err))
    })?;
    let parsed: RoutesFile = serde_json::from_str(&content).map_err(|err| {
        AppError::ConfigError(format!("Failed to parse stub routes {}: {}", path.display(), err))
    })?;
    Ok(match parsed {
        RoutesFile::List(routes) | RoutesFile::Wrapped { routes } => routes,
    })
}

fn fixture_cases() -> JsonValue {
    json!([
        {
            "id": 1, "test_case_id": "TC-AUTH-001", "title": "Login with valid credentials",
            "module": "Authentication", "priority": "critical", "status": "pass",
            "test_steps": "1. Open login page\n2. Enter valid credentials\n3. Submit",
            "expected_result": "Dashboard is shown", "actual_result": "Dashboard is shown",
            "executed_at": "2024-03-10T09:15:00Z", "execution_time_ms": 1800
        },
        {
            "id": 2, "test_case_id": "TC-TXN-004", "title": "Fund transfer above daily limit",
            "module": "Transactions", "priority": "high", "status": "fail",
            "test_steps": "1. Open transfer form\n2. Enter amount above limit\n3. Submit",
            "test_data": "{\"amount\": 600000, \"currency\": \"INR\"}",
            "expected_result": "Transfer rejected", "actual_result": "Transfer accepted",
            "executed_at": "2024-03-11T14:02:00Z", "execution_time_ms": 2400
        },
        {
            "id": 3, "test_case_id": "TC-ACC-002", "title": "Statement download",
            "module": "Accounts", "priority": "medium", "status": "blocked",
            "executed_at": "2024-03-09 17:45:00"
        },
        {
            "id": 4, "test_case_id": "TC-LOAN-007", "title": "EMI schedule for 20 year loan",
            "module": "Loans", "priority": "low", "status": "not_run"
        }
    ])
}

/// Canned answers for every endpoint the dashboard reads or writes.
pub fn default_fixture_routes() -> Vec<StubRoute> {
    let cases = fixture_cases();
    let not_run: Vec<JsonValue> = cases
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter(|case| case["status"] == "not_run")
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    vec![
        StubRoute::get(
            "/api/dashboard/stats",
            StubResponse::json(
                200,
                json!({
                    "customers": 1250, "accounts": 2100, "transactions": 15840,
                    "totalBalance": 123456789.5,
                    "totalTestCases": 4, "passedTests": 1, "failedTests": 1,
                    "blockedTests": 1, "notRunTests": 1, "openDefects": 2
                }),
            ),
        ),
        StubRoute::get("/api/test-cases", StubResponse::json(200, cases)),
        StubRoute::get("/api/test-cases", StubResponse::json(200, JsonValue::Array(not_run)))
            .when_query("status", "not_run"),
        StubRoute::put(
            "/api/test-cases/{id}/execute",
            StubResponse::json(
                200,
                json!({"id": 4, "test_case_id": "TC-LOAN-007", "module": "Loans", "priority": "low"}),
            )
            .merging_request_body(),
        ),
        StubRoute::get(
            "/api/test-suites",
            StubResponse::json(
                200,
                json!([
                    {"id": 1, "name": "Core Banking", "module": "Accounts", "total_cases": 2, "passed": 1, "failed": 0, "blocked": 1, "not_run": 0},
                    {"id": 2, "name": "Payments", "module": "Transactions", "total_cases": 2, "passed": 0, "failed": 1, "blocked": 0, "not_run": 1}
                ]),
            ),
        ),
        StubRoute::get(
            "/api/defects",
            StubResponse::json(
                200,
                json!([
                    {"id": 1, "defect_id": "DEF-101", "title": "Daily limit not enforced", "severity": "critical", "status": "open", "module": "Transactions", "test_case_id": "TC-TXN-004"},
                    {"id": 2, "defect_id": "DEF-102", "title": "Statement PDF times out", "severity": "major", "status": "in_progress", "module": "Accounts"},
                    {"id": 3, "defect_id": "DEF-103", "title": "Misaligned footer", "severity": "trivial", "status": "closed", "module": "Authentication"}
                ]),
            ),
        ),
        StubRoute::get(
            "/api/test-runs",
            StubResponse::json(
                200,
                json!([
                    {"id": 1, "run_name": "Sprint 14 regression", "run_date": "2024-03-11", "environment": "staging",
                     "total_cases": 4, "passed": 1, "failed": 1, "blocked": 1, "skipped": 0, "status": "completed"}
                ]),
            ),
        ),
        StubRoute::get(
            "/api/operation-flow",
            StubResponse::json(
                200,
                json!({"operations": [
                    {"operation_name": "Authenticate", "method": "POST", "endpoint": "/auth/login", "status_code": "200",
                     "status": "success", "duration": 142, "test_case": "TC-AUTH-001",
                     "request_payload": {"username": "qa.user"}, "response_payload": {"token": "***"}},
                    {"operationName": "Transfer funds", "requestType": "POST", "url": "/transfers", "responseCode": 200,
                     "status": "failed", "responseTime": "2400 ms", "testCase": "TC-TXN-004",
                     "requestPayload": "{\"amount\": 600000}"}
                ]}),
            ),
        ),
        StubRoute::get(
            "/api/schema",
            StubResponse::json(
                200,
                json!([
                    {"table": "customers", "row_count": 1250},
                    {"table": "accounts", "rowCount": 2100},
                    {"table": "transactions", "count": 15840}
                ]),
            ),
        ),
        StubRoute::get("/api/health", StubResponse::json(200, json!({"status": "ok"}))),
    ]
}

struct StubState {
    routes: Vec<StubRoute>,
    logs: Arc<Mutex<Vec<LogEntry>>>,
}

/// A running stub bound to an ephemeral port.
pub struct StubHandle {
    pub url: String,
    handle: ServerHandle,
    logs: Arc<Mutex<Vec<LogEntry>>>,
}

impl StubHandle {
    pub fn logs(&self) -> Vec<LogEntry> {
        self.logs.lock().map(|logs| logs.clone()).unwrap_or_default()
    }

    pub async fn stop(self) {
        stop_server(&self.handle, &self.logs).await;
    }
}

async fn stop_server(handle: &ServerHandle, logs: &Mutex<Vec<LogEntry>>) {
    let graceful = timeout(Duration::from_secs(2), handle.stop(true)).await;
    if graceful.is_err() {
        handle.stop(false).await;
        add_log(logs, "WARN", "StubBackend", "Stub backend forced stop after timeout");
    } else {
        add_log(logs, "INFO", "StubBackend", "Stub backend stopped");
    }
}

fn bind(
    routes: Vec<StubRoute>,
    port: u16,
    logs: Arc<Mutex<Vec<LogEntry>>>,
) -> std::io::Result<(actix_web::dev::Server, u16)> {
    let state = web::Data::new(StubState { routes, logs });
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .default_service(web::route().to(handle_stub_request))
    })
    .workers(1)
    .bind(("127.0.0.1", port))?;
    let bound_port = server
        .addrs()
        .first()
        .map(|addr| addr.port())
        .unwrap_or(port);
    Ok((server.run(), bound_port))
}

/// Starts the stub on `127.0.0.1:0` in the background.
pub async fn spawn_stub(routes: Vec<StubRoute>) -> Result<StubHandle> {
    let logs = Arc::new(Mutex::new(Vec::new()));
    let route_count = routes.len();
    let (server, port) = bind(routes, 0, logs.clone())
        .map_err(|err| AppError::Internal(format!("Failed to bind stub backend: {}", err)))?;
    let handle = server.handle();
    tokio::spawn(server);

    let url = format!("http://127.0.0.1:{}", port);
    add_log(
        &logs,
        "INFO",
        "StubBackend",
        &format!("Stub backend started on {} ({} routes)", url, route_count),
    );
    Ok(StubHandle { url, handle, logs })
}

/// Serves `routes` on `port` until the process is interrupted.
pub async fn run_stub(port: u16, routes: Vec<StubRoute>) -> std::io::Result<()> {
    let logs = Arc::new(Mutex::new(Vec::new()));
    let route_count = routes.len();
    let (server, port) = bind(routes, port, logs)?;
    info!(port, routes = route_count, "Stub backend listening on http://127.0.0.1:{}", port);
    server.await
}

async fn handle_stub_request(
    req: HttpRequest,
    body: web::Bytes,
    data: web::Data<StubState>,
) -> HttpResponse {
    let method = req.method().as_str().to_uppercase();
    let path = req.path().to_string();
    let query = parse_query(req.query_string());

    let best = data
        .routes
        .iter()
        .filter_map(|route| route.score(&method, &path, &query).map(|score| (route, score)))
        .fold(None::<(&StubRoute, usize)>, |best, (route, score)| match best {
            Some((_, best_score)) if best_score >= score => best,
            _ => Some((route, score)),
        });

    let Some((route, _)) = best else {
        add_log(
            &data.logs,
            "WARN",
            "StubBackend",
            &format!("No stub route matched (method={} path={})", method, path),
        );
        return HttpResponse::NotFound().json(json!({
            "detail": format!("No stub route for {} {}", method, path),
        }));
    };

    if let Some(delay_ms) = route.response.delay_ms.filter(|ms| *ms > 0) {
        sleep(Duration::from_millis(delay_ms)).await;
    }

    let mut payload = route.response.body.clone();
    if route.response.merge_request_body {
        merge_body(&mut payload, &body);
    }

    add_log(
        &data.logs,
        "INFO",
        "StubBackend",
        &format!(
            "Stub response served (method={} path={} status={})",
            method, path, route.response.status
        ),
    );

    let status = actix_web::http::StatusCode::from_u16(route.response.status).unwrap_or_else(|_| {
        warn!(status = route.response.status, "Invalid stub status, answering 200");
        actix_web::http::StatusCode::OK
    });
    HttpResponse::build(status).json(payload)
}

fn merge_body(payload: &mut JsonValue, body: &[u8]) {
    let Ok(JsonValue::Object(incoming)) = serde_json::from_slice::<JsonValue>(body) else {
        return;
    };
    if let JsonValue::Object(target) = payload {
        target.extend(incoming);
    }
}

fn path_matches(route_path: &str, path: &str) -> bool {
    let route_segments: Vec<&str> = normalize_path(route_path).split('/').collect();
    let path_segments: Vec<&str> = normalize_path(path).split('/').collect();
    route_segments.len() == path_segments.len()
        && route_segments
            .iter()
            .zip(path_segments.iter())
            .all(|(expected, actual)| {
                (expected.starts_with('{') && expected.ends_with('}') && !actual.is_empty())
                    || expected == actual
            })
}

fn normalize_path(path: &str) -> &str {
    let trimmed = path.trim();
    if trimmed == "/" {
        return trimmed;
    }
    trimmed.trim_end_matches('/')
}

fn parse_query(query: &str) -> HashMap<String, String> {
    url::form_urlencoded::parse(query.as_bytes())
        .into_owned()
        .map(|(key, value)| (key.to_lowercase(), value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_params_match_one_segment() {
        assert!(path_matches("/api/test-cases/{id}/execute", "/api/test-cases/42/execute"));
        assert!(path_matches("/api/defects/", "/api/defects"));
        assert!(!path_matches("/api/test-cases/{id}/execute", "/api/test-cases/execute"));
        assert!(!path_matches("/api/test-cases", "/api/test-suites"));
    }

    #[test]
    fn query_matchers_make_a_route_more_specific() {
        let plain = StubRoute::get("/api/test-cases", StubResponse::default());
        let filtered = StubRoute::get("/api/test-cases", StubResponse::default())
            .when_query("status", "not_run");
        let query = parse_query("status=not_run&module=Loans");

        assert_eq!(plain.score("GET", "/api/test-cases", &query), Some(0));
        assert_eq!(filtered.score("GET", "/api/test-cases", &query), Some(1));
        assert_eq!(filtered.score("GET", "/api/test-cases", &HashMap::new()), None);
        assert_eq!(plain.score("PUT", "/api/test-cases", &query), None);
    }

    #[test]
    fn loads_wrapped_and_bare_route_files() {
        let dir = std::env::temp_dir().join(format!("qa-stub-routes-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let bare = dir.join("bare.json");
        let wrapped = dir.join("wrapped.json");
        fs::write(
            &bare,
            r#"[{"method": "GET", "path": "/api/health", "response": {"status": 503, "delayMs": 10}}]"#,
        )
        .unwrap();
        fs::write(&wrapped, r#"{"routes": [{"method": "GET", "path": "/api/defects"}]}"#).unwrap();

        let routes = load_routes(&bare).unwrap();
        assert_eq!(routes[0].response.status, 503);
        assert_eq!(routes[0].response.delay_ms, Some(10));
        let routes = load_routes(&wrapped).unwrap();
        assert_eq!(routes[0].response.status, 200);

        let err = load_routes(&dir.join("missing.json")).unwrap_err();
        assert_eq!(err.kind(), "config");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[actix_web::test]
    async fn serves_fixtures_over_http() {
        let stub = spawn_stub(default_fixture_routes()).await.unwrap();
        let client = reqwest::Client::new();

        let queue: JsonValue = client
            .get(format!("{}/api/test-cases?status=not_run", stub.url))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(queue.as_array().unwrap().len(), 1);

        let updated: JsonValue = client
            .put(format!("{}/api/test-cases/4/execute", stub.url))
            .json(&json!({"status": "pass", "actual_result": "Schedule correct"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(updated["status"], "pass");
        assert_eq!(updated["test_case_id"], "TC-LOAN-007");

        let missing = client
            .get(format!("{}/api/unknown", stub.url))
            .send()
            .await
            .unwrap();
        assert_eq!(missing.status().as_u16(), 404);
        assert!(stub.logs().iter().any(|entry| entry.level == "WARN"));
        stub.stop().await;
    }
}
