use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;

/// Recorded duration of a traced API call, as the backend happened to send it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CallDuration {
    Millis(f64),
    Text(String),
}

impl fmt::Display for CallDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallDuration::Millis(ms) if ms.fract() == 0.0 => write!(f, "{} ms", *ms as i64),
            CallDuration::Millis(ms) => write!(f, "{} ms", ms),
            CallDuration::Text(text) => f.write_str(text),
        }
    }
}

/// Canonical operation-flow record. Alias resolution happens once, in
/// `infrastructure::api_client::normalize`, and nothing downstream looks at raw fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationFlowEntry {
    pub operation_name: Option<String>,
    pub method: String,
    pub endpoint: Option<String>,
    /// Kept as text: some producers send `"200"`, others `200`.
    pub status_code: Option<String>,
    pub status: Option<String>,
    pub duration: Option<CallDuration>,
    pub request_payload: Option<JsonValue>,
    pub response_payload: Option<JsonValue>,
    pub timestamp: Option<String>,
    pub test_case: Option<String>,
}

impl OperationFlowEntry {
    pub fn outcome(&self) -> CallOutcome {
        CallOutcome::classify(self.status.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "label", rename_all = "snake_case")]
pub enum CallOutcome {
    Success,
    Failure,
    Error,
    Pending(String),
    Unknown(String),
}

impl CallOutcome {
    pub fn classify(status: Option<&str>) -> Self {
        let raw = status.unwrap_or("");
        let lowered = raw.to_lowercase();
        match lowered.as_str() {
            "success" | "passed" | "pass" => CallOutcome::Success,
            "failure" | "failed" | "fail" => CallOutcome::Failure,
            "error" => CallOutcome::Error,
            "pending" | "running" => CallOutcome::Pending(lowered.to_uppercase()),
            "" => CallOutcome::Unknown("UNKNOWN".to_string()),
            _ => CallOutcome::Unknown(raw.to_uppercase()),
        }
    }

    pub fn badge(&self) -> &str {
        match self {
            CallOutcome::Success => "SUCCESS",
            CallOutcome::Failure => "FAILURE",
            CallOutcome::Error => "ERROR",
            CallOutcome::Pending(label) | CallOutcome::Unknown(label) => label.as_str(),
        }
    }

    /// Whether the call counts toward the failure tally (`error` included).
    pub fn is_failure(&self) -> bool {
        matches!(self, CallOutcome::Failure | CallOutcome::Error)
    }
}
