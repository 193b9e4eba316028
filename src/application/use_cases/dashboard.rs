use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use tracing::warn;

use super::aggregation::{StackedBar, StatusCounts};
use super::formatting::{format_indian_currency, format_indian_number};
use crate::domain::dashboard::DashboardStats;
use crate::domain::error::Result;
use crate::domain::test_case::{TestCase, TestCaseFilter};
use crate::infrastructure::api_client::QaBackend;

const RECENT_FETCH_LIMIT: u32 = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatCard {
    pub label: &'static str,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtext: Option<String>,
}

impl StatCard {
    fn new(label: &'static str, value: String) -> Self {
        Self {
            label,
            value,
            subtext: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarChartRow {
    pub key: String,
    pub label: String,
    pub count: u64,
    /// Height relative to the tallest bar.
    pub height_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub business_cards: Vec<StatCard>,
    pub testing_cards: Vec<StatCard>,
    pub pass_rate: String,
    pub status_bar: StackedBar,
    pub bar_chart: Vec<BarChartRow>,
    pub recent_tests: Vec<TestCase>,
}

pub struct DashboardUseCase {
    backend: QaBackend,
    recent_limit: usize,
}

impl DashboardUseCase {
    pub fn new(backend: QaBackend, recent_limit: usize) -> Self {
        Self {
            backend,
            recent_limit,
        }
    }

    /// Stats and recent executions are fetched together. Stats are required; a
    /// failed recent-tests fetch shows as an empty list.
    pub async fn load(&self) -> Result<DashboardView> {
        let recent_filter = TestCaseFilter {
            limit: Some(RECENT_FETCH_LIMIT),
            ..TestCaseFilter::default()
        };
        let (stats, recent) = tokio::join!(
            self.backend.dashboard_stats(),
            self.backend.test_cases(&recent_filter)
        );
        let stats = stats?;
        let recent = recent.unwrap_or_else(|err| {
            warn!(error = %err, "Recent executions unavailable, showing none");
            Vec::new()
        });
        Ok(build_view(&stats, recent, self.recent_limit))
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Executed cases only, newest first.
pub fn recent_executions(cases: Vec<TestCase>, limit: usize) -> Vec<TestCase> {
    let mut executed: Vec<(Option<DateTime<Utc>>, TestCase)> = cases
        .into_iter()
        .filter(|case| {
            case.executed_at
                .as_deref()
                .is_some_and(|at| !at.trim().is_empty())
        })
        .map(|case| (case.executed_at.as_deref().and_then(parse_timestamp), case))
        .collect();
    executed.sort_by(|(a, _), (b, _)| b.cmp(a));
    executed
        .into_iter()
        .take(limit)
        .map(|(_, case)| case)
        .collect()
}

pub fn build_view(stats: &DashboardStats, recent: Vec<TestCase>, recent_limit: usize) -> DashboardView {
    let counts = StatusCounts::from_totals(
        stats.total_test_cases.unwrap_or(0),
        stats.passed_tests.unwrap_or(0),
        stats.failed_tests.unwrap_or(0),
        stats.blocked_tests.unwrap_or(0),
        stats.not_run_tests.unwrap_or(0),
    );
    let pass_rate = counts.pass_rate();
    let number = |value: Option<u64>| format_indian_number(value.map(|v| v as f64));

    let business_cards = vec![
        StatCard::new("Customers", number(stats.customers)),
        StatCard::new("Accounts", number(stats.accounts)),
        StatCard::new("Transactions", number(stats.transactions)),
        StatCard::new(
            "Total Balance",
            format!("\u{20B9} {}", format_indian_currency(stats.total_balance)),
        ),
    ];
    let testing_cards = vec![
        StatCard::new("Total Tests", number(Some(counts.total))),
        StatCard {
            subtext: Some(format!("{}% pass rate", pass_rate)),
            ..StatCard::new("Passed", number(Some(counts.pass)))
        },
        StatCard::new("Failed", number(Some(counts.fail))),
        StatCard::new("Blocked", number(Some(counts.blocked))),
        StatCard::new("Not Run", number(Some(counts.not_run))),
        StatCard::new("Open Defects", number(stats.open_defects)),
    ];

    let buckets = counts.bar_buckets();
    let tallest = buckets.iter().map(|b| b.count).max().unwrap_or(0).max(1);
    let bar_chart = buckets
        .iter()
        .map(|bucket| BarChartRow {
            key: bucket.key.clone(),
            label: bucket.label.clone(),
            count: bucket.count,
            height_pct: bucket.count as f64 * 100.0 / tallest as f64,
        })
        .collect();

    DashboardView {
        business_cards,
        testing_cards,
        status_bar: counts.status_bar(),
        pass_rate,
        bar_chart,
        recent_tests: recent_executions(recent, recent_limit),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;
    use crate::infrastructure::api_client::testing::{RecordingClient, Scripted};
    use crate::infrastructure::api_client::ApiMethod;
    use serde_json::json;
    use std::sync::Arc;

    fn stats_body() -> serde_json::Value {
        json!({
            "customers": 1250,
            "accounts": 2310,
            "transactions": 154320,
            "totalTestCases": 10,
            "passedTests": 6,
            "failedTests": 2,
            "blockedTests": 1,
            "notRunTests": 1,
            "openDefects": 4,
            "totalBalance": 1234567.89
        })
    }

    #[tokio::test]
    async fn renders_pass_rate_and_four_segment_bar() {
        let client = Arc::new(
            RecordingClient::new()
                .on_get("/api/dashboard/stats", 200, stats_body())
                .on_get("/api/test-cases", 200, json!([])),
        );
        let view = DashboardUseCase::new(QaBackend::new(client.clone()), 8)
            .load()
            .await
            .unwrap();

        assert_eq!(view.pass_rate, "60.0");
        assert_eq!(view.testing_cards[1].subtext.as_deref(), Some("60.0% pass rate"));
        let widths: Vec<f64> = view.status_bar.segments.iter().map(|s| s.width_pct).collect();
        assert_eq!(widths, vec![60.0, 20.0, 10.0, 10.0]);
        assert_eq!(view.status_bar.legend[3].count, 1);
        assert_eq!(view.business_cards[3].value, "\u{20B9} 12,34,567.89");
        assert_eq!(view.business_cards[2].value, "1,54,320");
        assert_eq!(view.bar_chart[0].height_pct, 100.0);

        let recent_call = &client.calls_to("/api/test-cases")[0];
        assert_eq!(
            recent_call.query,
            vec![("limit".to_string(), "10".to_string())]
        );
    }

    #[tokio::test]
    async fn recent_tests_failure_degrades_to_empty() {
        let client = Arc::new(
            RecordingClient::new()
                .on_get("/api/dashboard/stats", 200, stats_body())
                .on_get("/api/test-cases", 500, json!({"detail": "boom"})),
        );
        let view = DashboardUseCase::new(QaBackend::new(client), 8)
            .load()
            .await
            .unwrap();
        assert!(view.recent_tests.is_empty());
        assert_eq!(view.pass_rate, "60.0");
    }

    #[tokio::test]
    async fn stats_failure_fails_the_page() {
        let client = Arc::new(
            RecordingClient::new()
                .script(
                    ApiMethod::Get,
                    "/api/dashboard/stats",
                    Scripted::Fail(AppError::TimedOut("GET /api/dashboard/stats".to_string())),
                )
                .on_get("/api/test-cases", 200, json!([])),
        );
        let err = DashboardUseCase::new(QaBackend::new(client), 8)
            .load()
            .await
            .unwrap_err();
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn missing_stats_render_as_zero() {
        let view = build_view(&DashboardStats::default(), Vec::new(), 8);
        assert_eq!(view.pass_rate, "0.0");
        assert_eq!(view.business_cards[0].value, "0");
        assert_eq!(view.business_cards[3].value, "\u{20B9} 0.00");
        assert!(view.status_bar.segments.is_empty());
        assert_eq!(view.bar_chart[0].height_pct, 0.0);
    }

    #[test]
    fn recent_keeps_executed_newest_first() {
        let case = |code: &str, at: Option<&str>| TestCase {
            test_case_id: code.to_string(),
            executed_at: at.map(str::to_string),
            ..TestCase::default()
        };
        let cases = vec![
            case("TC-1", Some("2024-05-01 09:00:00")),
            case("TC-2", None),
            case("TC-3", Some("2024-05-03T10:15:00Z")),
            case("TC-4", Some("2024-05-02 18:30:00")),
            case("TC-5", Some("")),
        ];
        let recent = recent_executions(cases, 2);
        let codes: Vec<&str> = recent.iter().map(|c| c.test_case_id.as_str()).collect();
        assert_eq!(codes, vec!["TC-3", "TC-4"]);
    }
}
