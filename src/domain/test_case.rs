use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::lenient::{lenient_enum, null_as_default};

lenient_enum! {
    pub enum TestCaseStatus {
        Pass => "pass",
        Fail => "fail",
        Blocked => "blocked",
        NotRun => "not_run",
        InProgress => "in_progress",
        Skipped => "skipped",
    }
}

lenient_enum! {
    pub enum Priority {
        Critical => "critical",
        High => "high",
        Medium => "medium",
        Low => "low",
    }
}

impl TestCaseStatus {
    /// Statuses a tester may record through the execute action.
    pub const EXECUTION_OUTCOMES: &'static [TestCaseStatus] = &[
        TestCaseStatus::Pass,
        TestCaseStatus::Fail,
        TestCaseStatus::Blocked,
        TestCaseStatus::Skipped,
    ];

    pub fn label(&self) -> &str {
        match self {
            TestCaseStatus::Pass => "Pass",
            TestCaseStatus::Fail => "Fail",
            TestCaseStatus::Blocked => "Blocked",
            TestCaseStatus::NotRun => "Not Run",
            TestCaseStatus::InProgress => "In Progress",
            TestCaseStatus::Skipped => "Skipped",
            TestCaseStatus::Other(raw) => raw.as_str(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TestCase {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub test_case_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub module: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: TestCaseStatus,
    #[serde(default)]
    pub preconditions: Option<String>,
    /// Newline-delimited, see `infrastructure::payload::parse_test_steps`.
    #[serde(default)]
    pub test_steps: Option<String>,
    /// JSON text or a plain string, see `infrastructure::payload::parse_test_data`.
    #[serde(default)]
    pub test_data: Option<String>,
    #[serde(default)]
    pub expected_result: Option<String>,
    #[serde(default)]
    pub actual_result: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub executed_at: Option<String>,
    #[serde(default)]
    pub execution_time_ms: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TestSuite {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub module: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_cases: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub passed: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub failed: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub not_run: u64,
}

/// Server-side filters for the test case list. `None` and `"all"` mean unfiltered.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TestCaseFilter {
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
}

impl TestCaseFilter {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        for (key, value) in [
            ("module", &self.module),
            ("status", &self.status),
            ("priority", &self.priority),
        ] {
            if let Some(value) = value.as_deref().map(str::trim) {
                if !value.is_empty() && value != "all" {
                    query.push((key.to_string(), value.to_string()));
                }
            }
        }
        if let Some(limit) = self.limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        query
    }
}

/// Body of `PUT /api/test-cases/:id/execute`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Validate)]
pub struct ExecutionInput {
    #[validate(custom(function = "validate_execution_status"))]
    pub status: TestCaseStatus,
    #[validate(custom(function = "validate_not_blank"))]
    #[serde(default)]
    pub actual_result: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[validate(range(min = 0, message = "Execution time cannot be negative."))]
    #[serde(default)]
    pub execution_time_ms: Option<i64>,
}

fn validate_execution_status(status: &TestCaseStatus) -> std::result::Result<(), ValidationError> {
    if TestCaseStatus::EXECUTION_OUTCOMES.contains(status) {
        return Ok(());
    }
    let mut err = ValidationError::new("execution_status");
    err.message = Some("Status must be one of pass, fail, blocked or skipped.".into());
    Err(err)
}

fn validate_not_blank(value: &str) -> std::result::Result<(), ValidationError> {
    if !value.trim().is_empty() {
        return Ok(());
    }
    let mut err = ValidationError::new("required");
    err.message = Some("Actual result is required.".into());
    Err(err)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_and_missing_status_decode_leniently() {
        let json = r#"[
            {"id": 1, "test_case_id": "TC-001", "module": "Loans", "priority": "high", "status": "pass"},
            {"id": 2, "test_case_id": "TC-002", "module": "Loans", "priority": "urgent", "status": "retest"},
            {"id": 3, "test_case_id": "TC-003", "module": "Loans", "status": null}
        ]"#;
        let cases: Vec<TestCase> = serde_json::from_str(json).unwrap();
        assert_eq!(cases[0].status, TestCaseStatus::Pass);
        assert_eq!(cases[0].priority, Priority::High);
        assert_eq!(cases[1].status, TestCaseStatus::Other("retest".to_string()));
        assert_eq!(cases[1].priority, Priority::Other("urgent".to_string()));
        assert_eq!(cases[2].status, TestCaseStatus::default());
        assert!(!cases[2].priority.is_recognized());
    }

    #[test]
    fn null_columns_decode_to_defaults() {
        let json = r#"[{"id": 1, "test_case_id": "TC-1", "module": null, "status": "pass"}]"#;
        let cases: Vec<TestCase> = serde_json::from_str(json).unwrap();
        assert_eq!(cases[0].module, "");
        assert_eq!(cases[0].status, TestCaseStatus::Pass);

        let json = r#"{"id": 4, "name": null, "module": "Loans", "total_cases": null, "passed": 3}"#;
        let suite: TestSuite = serde_json::from_str(json).unwrap();
        assert_eq!(suite.name, "");
        assert_eq!(suite.total_cases, 0);
        assert_eq!(suite.passed, 3);
    }

    #[test]
    fn execution_body_without_actual_result_fails_validation() {
        let input: ExecutionInput = serde_json::from_str(r#"{"status": "pass"}"#).unwrap();
        let err = input.validate().unwrap_err();
        let errors = err.field_errors();
        assert_eq!(
            errors["actual_result"][0].message.as_deref(),
            Some("Actual result is required.")
        );
    }

    #[test]
    fn status_serializes_back_to_wire_value() {
        let json = serde_json::to_value(TestCaseStatus::NotRun).unwrap();
        assert_eq!(json, "not_run");
        assert_eq!(TestCaseStatus::InProgress.label(), "In Progress");
    }

    #[test]
    fn filter_skips_all_and_blank_values() {
        let filter = TestCaseFilter {
            module: Some("Bill Payment".to_string()),
            status: Some("all".to_string()),
            priority: Some("  ".to_string()),
            limit: Some(10),
        };
        assert_eq!(
            filter.to_query(),
            vec![
                ("module".to_string(), "Bill Payment".to_string()),
                ("limit".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn execution_input_requires_actual_result() {
        let input = ExecutionInput {
            status: TestCaseStatus::Pass,
            actual_result: "   ".to_string(),
            notes: None,
            execution_time_ms: Some(120),
        };
        let err = input.validate().unwrap_err();
        assert!(err.field_errors().contains_key("actual_result"));
    }

    #[test]
    fn execution_input_rejects_non_outcome_status() {
        let input = ExecutionInput {
            status: TestCaseStatus::NotRun,
            actual_result: "Balance updated".to_string(),
            notes: None,
            execution_time_ms: None,
        };
        let err = input.validate().unwrap_err();
        assert!(err.field_errors().contains_key("status"));
    }

    #[test]
    fn execution_input_rejects_negative_time() {
        let input = ExecutionInput {
            status: TestCaseStatus::Fail,
            actual_result: "Timeout on OTP screen".to_string(),
            notes: Some("retry later".to_string()),
            execution_time_ms: Some(-5),
        };
        assert!(input.validate().is_err());

        let ok = ExecutionInput {
            execution_time_ms: Some(250),
            ..input
        };
        assert!(ok.validate().is_ok());
    }
}
