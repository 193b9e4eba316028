use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::info;

use super::normalize::normalize_operation_flow;
use super::{ApiClient, ApiRequest, ApiResponse};
use crate::domain::dashboard::DashboardStats;
use crate::domain::defect::Defect;
use crate::domain::error::Result;
use crate::domain::operation_flow::OperationFlowEntry;
use crate::domain::test_case::{ExecutionInput, TestCase, TestCaseFilter, TestSuite};
use crate::domain::test_run::TestRun;

pub const DASHBOARD_STATS_PATH: &str = "/api/dashboard/stats";
pub const TEST_CASES_PATH: &str = "/api/test-cases";
pub const TEST_SUITES_PATH: &str = "/api/test-suites";
pub const DEFECTS_PATH: &str = "/api/defects";
pub const TEST_RUNS_PATH: &str = "/api/test-runs";
pub const OPERATION_FLOW_PATH: &str = "/api/operation-flow";
pub const SCHEMA_PATH: &str = "/api/schema";
pub const HEALTH_PATH: &str = "/api/health";

/// Typed view of the QA backend's REST surface.
#[derive(Clone)]
pub struct QaBackend {
    client: Arc<dyn ApiClient + Send + Sync>,
}

impl QaBackend {
    pub fn new(client: Arc<dyn ApiClient + Send + Sync>) -> Self {
        Self { client }
    }

    /// Sends without judging the status. Used by probes that time raw calls.
    pub async fn send_raw(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.client.send(request).await
    }

    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.client
            .send(&request)
            .await?
            .ensure_success(&request)?
            .json()
    }

    pub async fn dashboard_stats(&self) -> Result<DashboardStats> {
        self.fetch(ApiRequest::get(DASHBOARD_STATS_PATH)).await
    }

    pub async fn test_cases(&self, filter: &TestCaseFilter) -> Result<Vec<TestCase>> {
        self.fetch(ApiRequest::get(TEST_CASES_PATH).with_query(filter.to_query()))
            .await
    }

    pub async fn test_suites(&self) -> Result<Vec<TestSuite>> {
        self.fetch(ApiRequest::get(TEST_SUITES_PATH)).await
    }

    /// Records an execution result. The caller validates `input` first.
    pub async fn execute_test_case(&self, id: i64, input: &ExecutionInput) -> Result<TestCase> {
        let body = serde_json::to_value(input)?;
        let request = ApiRequest::put(format!("{}/{}/execute", TEST_CASES_PATH, id), body);
        let updated: TestCase = self.fetch(request).await?;
        info!(
            test_case = %updated.test_case_id,
            status = %input.status,
            "Execution result recorded"
        );
        Ok(updated)
    }

    pub async fn defects(&self) -> Result<Vec<Defect>> {
        self.fetch(ApiRequest::get(DEFECTS_PATH)).await
    }

    pub async fn test_runs(&self) -> Result<Vec<TestRun>> {
        self.fetch(ApiRequest::get(TEST_RUNS_PATH)).await
    }

    pub async fn operation_flow(&self) -> Result<Vec<OperationFlowEntry>> {
        let payload: JsonValue = self.fetch(ApiRequest::get(OPERATION_FLOW_PATH)).await?;
        Ok(normalize_operation_flow(&payload))
    }

    pub async fn schema(&self) -> Result<JsonValue> {
        self.fetch(ApiRequest::get(SCHEMA_PATH)).await
    }

    pub async fn health(&self) -> Result<JsonValue> {
        self.fetch(ApiRequest::get(HEALTH_PATH)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::test_case::TestCaseStatus;
    use crate::infrastructure::api_client::testing::RecordingClient;
    use crate::infrastructure::api_client::ApiMethod;
    use serde_json::json;

    #[tokio::test]
    async fn execute_puts_documented_body() {
        let client = Arc::new(RecordingClient::new().on_put(
            "/api/test-cases/42/execute",
            200,
            json!({"id": 42, "test_case_id": "TC-042", "status": "fail"}),
        ));
        let backend = QaBackend::new(client.clone());
        let input = ExecutionInput {
            status: TestCaseStatus::Fail,
            actual_result: "OTP never arrived".to_string(),
            notes: Some("SMS gateway down".to_string()),
            execution_time_ms: Some(3200),
        };

        let updated = backend.execute_test_case(42, &input).await.unwrap();
        assert_eq!(updated.status, TestCaseStatus::Fail);

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, ApiMethod::Put);
        assert_eq!(
            calls[0].body,
            Some(json!({
                "status": "fail",
                "actual_result": "OTP never arrived",
                "notes": "SMS gateway down",
                "execution_time_ms": 3200
            }))
        );
    }

    #[tokio::test]
    async fn test_cases_forward_filter_as_query() {
        let client = Arc::new(RecordingClient::new().on_get("/api/test-cases", 200, json!([])));
        let backend = QaBackend::new(client.clone());
        let filter = TestCaseFilter {
            module: Some("Loans".to_string()),
            status: Some("all".to_string()),
            priority: Some("critical".to_string()),
            limit: None,
        };
        backend.test_cases(&filter).await.unwrap();
        assert_eq!(
            client.calls()[0].query,
            vec![
                ("module".to_string(), "Loans".to_string()),
                ("priority".to_string(), "critical".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn non_array_list_body_is_decode_failure() {
        let client = Arc::new(RecordingClient::new().on_get(
            "/api/defects",
            200,
            json!({"defects": []}),
        ));
        let err = QaBackend::new(client).defects().await.unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[tokio::test]
    async fn operation_flow_is_normalized_at_the_boundary() {
        let client = Arc::new(RecordingClient::new().on_get(
            "/api/operation-flow",
            200,
            json!({"flows": [{"requestType": "post", "statusCode": 201}]}),
        ));
        let entries = QaBackend::new(client).operation_flow().await.unwrap();
        assert_eq!(entries[0].method, "POST");
        assert_eq!(entries[0].status_code.as_deref(), Some("201"));
    }
}
