use serde::{Deserialize, Serialize};

use super::defects::distinct;
use crate::domain::error::Result;
use crate::domain::operation_flow::{CallOutcome, OperationFlowEntry};
use crate::infrastructure::api_client::QaBackend;
use crate::infrastructure::payload::pretty_payload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCodeClass {
    Success,
    Redirect,
    ClientError,
    ServerError,
    Unknown,
}

impl StatusCodeClass {
    /// Leading digits decide, so `"201 Created"` still reads as success.
    pub fn of(code: Option<&str>) -> Self {
        let digits: String = code
            .unwrap_or("")
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        match digits.parse::<u16>() {
            Ok(200..=299) => StatusCodeClass::Success,
            Ok(300..=399) => StatusCodeClass::Redirect,
            Ok(400..=499) => StatusCodeClass::ClientError,
            Ok(code) if code >= 500 => StatusCodeClass::ServerError,
            _ => StatusCodeClass::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationRow {
    pub title: String,
    pub method: String,
    pub endpoint: String,
    pub status_code: String,
    pub status_code_class: StatusCodeClass,
    pub outcome: CallOutcome,
    pub badge: String,
    pub duration: Option<String>,
    pub test_case: Option<String>,
    pub timestamp: Option<String>,
    pub request_payload: String,
    pub response_payload: String,
}

impl OperationRow {
    fn new(index: usize, entry: OperationFlowEntry) -> Self {
        let outcome = entry.outcome();
        Self {
            title: entry
                .operation_name
                .clone()
                .unwrap_or_else(|| format!("Operation {}", index + 1)),
            status_code_class: StatusCodeClass::of(entry.status_code.as_deref()),
            status_code: entry.status_code.clone().unwrap_or_else(|| "N/A".to_string()),
            endpoint: entry.endpoint.clone().unwrap_or_else(|| "N/A".to_string()),
            badge: outcome.badge().to_string(),
            outcome,
            duration: entry.duration.as_ref().map(|d| d.to_string()),
            request_payload: pretty_payload(entry.request_payload.as_ref()),
            response_payload: pretty_payload(entry.response_payload.as_ref()),
            method: entry.method,
            test_case: entry.test_case,
            timestamp: entry.timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OperationFlowFilter {
    #[serde(default)]
    pub test_case: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OperationFlowView {
    pub filter: OperationFlowFilter,
    pub test_cases: Vec<String>,
    pub total: usize,
    pub showing: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub operations: Vec<OperationRow>,
}

pub struct OperationFlowUseCase {
    backend: QaBackend,
}

impl OperationFlowUseCase {
    pub fn new(backend: QaBackend) -> Self {
        Self { backend }
    }

    pub async fn load(&self, filter: OperationFlowFilter) -> Result<OperationFlowView> {
        let entries = self.backend.operation_flow().await?;
        Ok(build_view(entries, filter))
    }
}

pub fn build_view(entries: Vec<OperationFlowEntry>, filter: OperationFlowFilter) -> OperationFlowView {
    let total = entries.len();
    let test_cases = distinct(
        entries
            .iter()
            .filter_map(|entry| entry.test_case.as_deref()),
    );
    let wanted = filter
        .test_case
        .as_deref()
        .filter(|value| !value.is_empty() && *value != "all");
    let shown: Vec<OperationFlowEntry> = entries
        .into_iter()
        .filter(|entry| match wanted {
            Some(wanted) => entry.test_case.as_deref().unwrap_or("") == wanted,
            None => true,
        })
        .collect();

    let success_count = shown
        .iter()
        .filter(|entry| entry.outcome() == CallOutcome::Success)
        .count();
    let failure_count = shown
        .iter()
        .filter(|entry| entry.outcome().is_failure())
        .count();
    let operations: Vec<OperationRow> = shown
        .into_iter()
        .enumerate()
        .map(|(index, entry)| OperationRow::new(index, entry))
        .collect();

    OperationFlowView {
        filter,
        test_cases,
        total,
        showing: operations.len(),
        success_count,
        failure_count,
        operations,
    }
}
