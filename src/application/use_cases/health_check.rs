use chrono::Utc;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::formatting::format_uptime;
use super::page_state::{PageCell, PageState};
use crate::domain::error::{AppError, Result};
use crate::domain::health::{
    DatabaseStats, HealthStatus, OverallHealth, ProbeKind, ServiceHealth, ServiceProbe,
};
use crate::infrastructure::api_client::backend::{DASHBOARD_STATS_PATH, HEALTH_PATH, SCHEMA_PATH, TEST_CASES_PATH};
use crate::infrastructure::api_client::{ApiRequest, QaBackend};

pub const SERVICES: [ServiceProbe; 5] = [
    ServiceProbe {
        key: "api",
        name: "API Server",
        endpoint: Some(DASHBOARD_STATS_PATH),
        kind: ProbeKind::Status,
        static_detail: None,
    },
    ServiceProbe {
        key: "database",
        name: "Database",
        endpoint: Some(SCHEMA_PATH),
        kind: ProbeKind::Data,
        static_detail: None,
    },
    ServiceProbe {
        key: "health",
        name: "Backend Health",
        endpoint: Some(HEALTH_PATH),
        kind: ProbeKind::Status,
        static_detail: None,
    },
    ServiceProbe {
        key: "testEngine",
        name: "Test Engine",
        endpoint: Some(TEST_CASES_PATH),
        kind: ProbeKind::Data,
        static_detail: None,
    },
    ServiceProbe {
        key: "soapui",
        name: "SoapUI",
        endpoint: None,
        kind: ProbeKind::Static,
        static_detail: Some("~/SoapUI/SoapUI-5.7.2/"),
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub overall: OverallHealth,
    pub services: Vec<ServiceHealth>,
    pub healthy_count: usize,
    pub database: DatabaseStats,
    pub last_full_check: String,
}

/// Outcome of one probe. `database` is set only by the schema probe.
struct ProbeResult {
    health: ServiceHealth,
    database: Option<DatabaseStats>,
}

fn has_data(value: &JsonValue) -> Option<usize> {
    match value {
        JsonValue::Array(items) if !items.is_empty() => Some(items.len()),
        JsonValue::Object(map) if !map.is_empty() => Some(map.len()),
        _ => None,
    }
}

/// Table count and row total from `/api/schema`, reading `row_count`, `rowCount` or `count`.
pub fn database_stats(schema: &JsonValue) -> Option<DatabaseStats> {
    let tables = schema.as_array()?;
    let total_rows = tables
        .iter()
        .map(|table| {
            ["row_count", "rowCount", "count"]
                .iter()
                .filter_map(|key| table.get(*key))
                .find_map(|value| value.as_u64().filter(|n| *n > 0))
                .unwrap_or(0)
        })
        .sum();
    Some(DatabaseStats {
        tables: tables.len() as u64,
        total_rows,
    })
}

pub fn overall_health(services: &[ServiceHealth]) -> OverallHealth {
    if services.is_empty() {
        OverallHealth::Checking
    } else if services.iter().all(|s| s.status == HealthStatus::Healthy) {
        OverallHealth::Healthy
    } else {
        OverallHealth::Degraded
    }
}

pub struct HealthCheckUseCase {
    backend: QaBackend,
}

impl HealthCheckUseCase {
    pub fn new(backend: QaBackend) -> Self {
        Self { backend }
    }

    async fn probe(&self, probe: &ServiceProbe) -> ProbeResult {
        let health = |status: HealthStatus, elapsed: u64, detail: String| ServiceHealth {
            key: probe.key.to_string(),
            name: probe.name.to_string(),
            status,
            response_time_ms: elapsed,
            last_checked: Utc::now().to_rfc3339(),
            detail,
        };

        let endpoint = match (probe.kind, probe.endpoint) {
            (ProbeKind::Static, _) | (_, None) => {
                return ProbeResult {
                    health: health(
                        HealthStatus::Healthy,
                        0,
                        probe.static_detail.unwrap_or_default().to_string(),
                    ),
                    database: None,
                };
            }
            (_, Some(endpoint)) => endpoint,
        };

        let started = Instant::now();
        let outcome = self.backend.send_raw(&ApiRequest::get(endpoint)).await;
        let elapsed = started.elapsed().as_millis() as u64;

        let response = match outcome {
            Ok(response) => response,
            Err(err) => {
                let detail = match err {
                    AppError::TimedOut(_) => "Request timed out".to_string(),
                    other => other.to_string(),
                };
                warn!(service = probe.key, detail = %detail, "Health probe failed");
                return ProbeResult {
                    health: health(HealthStatus::Unhealthy, elapsed, detail),
                    database: None,
                };
            }
        };

        match probe.kind {
            ProbeKind::Data => match response.json::<JsonValue>() {
                Ok(data) => {
                    let database = (probe.key == "database")
                        .then(|| database_stats(&data))
                        .flatten();
                    let (status, detail) = match has_data(&data) {
                        Some(n) => (HealthStatus::Healthy, format!("{} records", n)),
                        None => (HealthStatus::Unhealthy, "No data returned".to_string()),
                    };
                    ProbeResult {
                        health: health(status, elapsed, detail),
                        database,
                    }
                }
                Err(err) => ProbeResult {
                    health: health(HealthStatus::Unhealthy, elapsed, err.to_string()),
                    database: None,
                },
            },
            _ => {
                let status = if response.is_success() {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Unhealthy
                };
                ProbeResult {
                    health: health(status, elapsed, format!("HTTP {}", response.status)),
                    database: None,
                }
            }
        }
    }

    /// Probes every service concurrently. Never fails: a broken service is a result.
    pub async fn run_checks(&self) -> HealthReport {
        let [api, database, health, engine, soapui] = &SERVICES;
        let (api, database, health, engine, soapui) = tokio::join!(
            self.probe(api),
            self.probe(database),
            self.probe(health),
            self.probe(engine),
            self.probe(soapui)
        );
        let results = [api, database, health, engine, soapui];
        let mut database = DatabaseStats::default();
        let services: Vec<ServiceHealth> = results
            .into_iter()
            .map(|result| {
                if let Some(stats) = result.database {
                    database = stats;
                }
                result.health
            })
            .collect();
        let healthy_count = services
            .iter()
            .filter(|s| s.status == HealthStatus::Healthy)
            .count();
        let report = HealthReport {
            overall: overall_health(&services),
            healthy_count,
            services,
            database,
            last_full_check: Utc::now().to_rfc3339(),
        };
        info!(
            overall = ?report.overall,
            healthy = report.healthy_count,
            total = report.services.len(),
            "Health checks completed"
        );
        report
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthView {
    pub overall: OverallHealth,
    pub report: PageState<HealthReport>,
    pub auto_refresh: bool,
    pub refresh_interval_secs: u64,
    pub uptime: String,
}

/// Owns the health page: the latest report, the auto-refresh task and the uptime clock.
pub struct HealthMonitor {
    use_case: Arc<HealthCheckUseCase>,
    cell: Arc<PageCell<HealthReport>>,
    interval: Duration,
    started_at: Instant,
    task: Mutex<Option<JoinHandle<()>>>,
}

async fn refresh_into(use_case: &HealthCheckUseCase, cell: &PageCell<HealthReport>) -> bool {
    let Some(ticket) = cell.begin() else {
        return false;
    };
    let report = use_case.run_checks().await;
    cell.complete(ticket, Ok(report))
}

impl HealthMonitor {
    pub fn new(use_case: HealthCheckUseCase, interval: Duration) -> Self {
        Self {
            use_case: Arc::new(use_case),
            cell: Arc::new(PageCell::new()),
            interval,
            started_at: Instant::now(),
            task: Mutex::new(None),
        }
    }

    pub async fn refresh(&self) -> HealthView {
        refresh_into(&self.use_case, &self.cell).await;
        self.view()
    }

    /// Starts or stops periodic refresh. Stopping aborts the running task.
    pub fn set_auto_refresh(&self, enabled: bool) -> Result<bool> {
        let mut task = self
            .task
            .lock()
            .map_err(|_| AppError::Internal("Health monitor lock poisoned".to_string()))?;
        if !enabled {
            if let Some(handle) = task.take() {
                handle.abort();
                info!("Health auto-refresh stopped");
            }
            return Ok(false);
        }
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return Ok(true);
        }
        if self.cell.is_disposed() {
            return Err(AppError::ValidationError(
                "Health monitor has been disposed.".to_string(),
            ));
        }

        let use_case = Arc::clone(&self.use_case);
        let cell = Arc::clone(&self.cell);
        let period = self.interval;
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if !refresh_into(&use_case, &cell).await && cell.is_disposed() {
                    debug!("Health auto-refresh exiting after dispose");
                    break;
                }
            }
        }));
        info!(interval_secs = period.as_secs(), "Health auto-refresh started");
        Ok(true)
    }

    pub fn auto_refresh_enabled(&self) -> bool {
        self.task
            .lock()
            .map(|task| task.as_ref().is_some_and(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    pub fn uptime(&self) -> String {
        format_uptime(self.started_at.elapsed().as_secs())
    }

    pub fn view(&self) -> HealthView {
        let report = self.cell.snapshot();
        let overall = match &report {
            PageState::Ready(report) => report.overall,
            PageState::Loading => OverallHealth::Checking,
            PageState::Failed(_) => OverallHealth::Degraded,
        };
        HealthView {
            overall,
            report,
            auto_refresh: self.auto_refresh_enabled(),
            refresh_interval_secs: self.interval.as_secs(),
            uptime: self.uptime(),
        }
    }

    /// Stops the timer and drops any probe result still in flight.
    pub fn dispose(&self) {
        self.cell.dispose();
        if let Ok(mut task) = self.task.lock() {
            if let Some(handle) = task.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::api_client::testing::{RecordingClient, Scripted};
    use crate::infrastructure::api_client::ApiMethod;
    use serde_json::json;

    fn healthy_client() -> RecordingClient {
        RecordingClient::new()
            .on_get("/api/dashboard/stats", 200, json!({"customers": 10}))
            .on_get(
                "/api/schema",
                200,
                json!([
                    {"name": "customers", "row_count": 120},
                    {"name": "accounts", "rowCount": 80},
                    {"name": "audit", "count": 5},
                    {"name": "empty"}
                ]),
            )
            .on_get("/api/health", 200, json!({"status": "ok"}))
            .on_get("/api/test-cases", 200, json!([{"id": 1}]))
    }

    #[tokio::test]
    async fn all_probes_healthy() {
        let use_case = HealthCheckUseCase::new(QaBackend::new(Arc::new(healthy_client())));
        let report = use_case.run_checks().await;

        assert_eq!(report.overall, OverallHealth::Healthy);
        assert_eq!(report.services.len(), 5);
        assert_eq!(report.healthy_count, 5);
        assert_eq!(
            report.database,
            DatabaseStats {
                tables: 4,
                total_rows: 205
            }
        );
        let soapui = report.services.iter().find(|s| s.key == "soapui").unwrap();
        assert_eq!(soapui.detail, "~/SoapUI/SoapUI-5.7.2/");
        assert_eq!(soapui.response_time_ms, 0);
        let engine = report.services.iter().find(|s| s.key == "testEngine").unwrap();
        assert_eq!(engine.detail, "1 records");
    }

    #[tokio::test]
    async fn timeout_and_empty_data_degrade() {
        let client = healthy_client()
            .script(
                ApiMethod::Get,
                "/api/dashboard/stats",
                Scripted::Fail(AppError::TimedOut("GET /api/dashboard/stats".to_string())),
            )
            .on_get("/api/test-cases", 200, json!([]));
        let report = HealthCheckUseCase::new(QaBackend::new(Arc::new(client)))
            .run_checks()
            .await;

        assert_eq!(report.overall, OverallHealth::Degraded);
        let api = report.services.iter().find(|s| s.key == "api").unwrap();
        assert_eq!(api.status, HealthStatus::Unhealthy);
        assert_eq!(api.detail, "Request timed out");
        let engine = report.services.iter().find(|s| s.key == "testEngine").unwrap();
        assert_eq!(engine.detail, "No data returned");
    }

    #[tokio::test]
    async fn status_probe_reports_http_code() {
        let client = healthy_client().on_get("/api/health", 503, json!({"status": "down"}));
        let report = HealthCheckUseCase::new(QaBackend::new(Arc::new(client)))
            .run_checks()
            .await;
        let health = report.services.iter().find(|s| s.key == "health").unwrap();
        assert_eq!(health.status, HealthStatus::Unhealthy);
        assert_eq!(health.detail, "HTTP 503");
    }

    #[test]
    fn overall_is_checking_without_results() {
        assert_eq!(overall_health(&[]), OverallHealth::Checking);
        assert!(database_stats(&json!({"tables": []})).is_none());
    }

    #[tokio::test]
    async fn monitor_starts_checking_then_reports() {
        let monitor = HealthMonitor::new(
            HealthCheckUseCase::new(QaBackend::new(Arc::new(healthy_client()))),
            Duration::from_secs(30),
        );
        assert_eq!(monitor.view().overall, OverallHealth::Checking);
        let view = monitor.refresh().await;
        assert_eq!(view.overall, OverallHealth::Healthy);
        assert_eq!(view.refresh_interval_secs, 30);
        assert_eq!(view.uptime, "0s");
    }

    #[tokio::test(start_paused = true)]
    async fn auto_refresh_polls_until_switched_off() {
        let client = Arc::new(healthy_client());
        let monitor = HealthMonitor::new(
            HealthCheckUseCase::new(QaBackend::new(client.clone())),
            Duration::from_secs(30),
        );
        assert!(monitor.set_auto_refresh(true).unwrap());
        assert!(monitor.auto_refresh_enabled());

        tokio::time::sleep(Duration::from_secs(65)).await;
        let polled = client.calls_to("/api/health").len();
        assert_eq!(polled, 2);

        assert!(!monitor.set_auto_refresh(false).unwrap());
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(client.calls_to("/api/health").len(), polled);
        assert!(!monitor.auto_refresh_enabled());
    }

    #[tokio::test]
    async fn dispose_stops_timer_and_drops_results() {
        let monitor = HealthMonitor::new(
            HealthCheckUseCase::new(QaBackend::new(Arc::new(healthy_client()))),
            Duration::from_secs(30),
        );
        monitor.set_auto_refresh(true).unwrap();
        monitor.dispose();
        assert!(!monitor.auto_refresh_enabled());
        let view = monitor.refresh().await;
        assert_eq!(view.report, PageState::Loading);
        assert!(monitor.set_auto_refresh(true).is_err());
    }
}
