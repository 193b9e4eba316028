//! Alias resolution for operation-flow records.
//!
//! Producers of `/api/operation-flow` disagree on field names. Every alias is
//! resolved here, once, so the rest of the crate only sees `OperationFlowEntry`.

use serde_json::{Map, Value as JsonValue};

use crate::domain::operation_flow::{CallDuration, OperationFlowEntry};

const METHOD: &[&str] = &["request_type", "method", "requestType"];
const STATUS_CODE: &[&str] = &["response_code", "responseCode", "status_code", "statusCode"];
const OPERATION_NAME: &[&str] = &["operation_name", "operationName", "name", "operation"];
const ENDPOINT: &[&str] = &["endpoint", "url", "path"];
const TEST_CASE: &[&str] = &["test_case", "testCase", "test_case_name", "tc_title"];
const TIMESTAMP: &[&str] = &["timestamp", "created_at", "createdAt"];
const DURATION: &[&str] = &["duration", "duration_ms"];
const REQUEST_PAYLOAD: &[&str] = &[
    "request_payload",
    "requestPayload",
    "request_body",
    "requestBody",
];
const RESPONSE_PAYLOAD: &[&str] = &[
    "response_payload",
    "responsePayload",
    "response_body",
    "responseBody",
];

/// Accepts `{operations: [...]}`, `{flows: [...]}` or a bare array. Any other shape
/// yields no entries; non-object items are skipped.
pub fn normalize_operation_flow(payload: &JsonValue) -> Vec<OperationFlowEntry> {
    let items = match payload {
        JsonValue::Array(items) => Some(items),
        JsonValue::Object(map) => ["operations", "flows"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find(|value| is_truthy(value))
            .and_then(|value| value.as_array()),
        _ => None,
    };
    items
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_object())
                .map(normalize_entry)
                .collect()
        })
        .unwrap_or_default()
}

pub fn normalize_entry(record: &Map<String, JsonValue>) -> OperationFlowEntry {
    let method = first_truthy(record, METHOD)
        .map(value_to_text)
        .unwrap_or_else(|| "GET".to_string())
        .to_uppercase();

    OperationFlowEntry {
        operation_name: first_truthy(record, OPERATION_NAME).map(value_to_text),
        method,
        endpoint: first_truthy(record, ENDPOINT).map(value_to_text),
        status_code: first_truthy(record, STATUS_CODE).map(value_to_text),
        status: first_truthy(record, &["status"]).map(value_to_text),
        duration: first_truthy(record, DURATION).map(|value| match value {
            JsonValue::Number(n) => n
                .as_f64()
                .map(CallDuration::Millis)
                .unwrap_or_else(|| CallDuration::Text(n.to_string())),
            other => CallDuration::Text(value_to_text(other)),
        }),
        request_payload: first_truthy(record, REQUEST_PAYLOAD).cloned(),
        response_payload: first_truthy(record, RESPONSE_PAYLOAD).cloned(),
        timestamp: first_truthy(record, TIMESTAMP).map(value_to_text),
        test_case: first_truthy(record, TEST_CASE).map(value_to_text),
    }
}

fn first_truthy<'a>(record: &'a Map<String, JsonValue>, aliases: &[&str]) -> Option<&'a JsonValue> {
    aliases
        .iter()
        .filter_map(|alias| record.get(*alias))
        .find(|value| is_truthy(value))
}

/// Empty strings, zero, `false` and `null` do not count as present.
fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

fn value_to_text(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn accepts_all_three_envelopes() {
        let op = json!({"operation_name": "Login"});
        assert_eq!(normalize_operation_flow(&json!({"operations": [op.clone()]})).len(), 1);
        assert_eq!(normalize_operation_flow(&json!({"flows": [op.clone(), op.clone()]})).len(), 2);
        assert_eq!(normalize_operation_flow(&json!([op])).len(), 1);
        assert!(normalize_operation_flow(&json!({"unexpected": true})).is_empty());
        assert!(normalize_operation_flow(&json!("nope")).is_empty());
    }

    #[test]
    fn snake_case_alias_wins_over_camel_case() {
        let entries = normalize_operation_flow(&json!([{
            "request_type": "post",
            "requestType": "DELETE",
            "response_code": 201,
            "statusCode": 500,
            "operationName": "Create account",
            "url": "/api/accounts",
            "testCase": "TC-ACC-001",
            "createdAt": "2024-05-01T10:00:00Z",
            "duration_ms": 87
        }]));
        let entry = &entries[0];
        assert_eq!(entry.method, "POST");
        assert_eq!(entry.status_code.as_deref(), Some("201"));
        assert_eq!(entry.operation_name.as_deref(), Some("Create account"));
        assert_eq!(entry.endpoint.as_deref(), Some("/api/accounts"));
        assert_eq!(entry.test_case.as_deref(), Some("TC-ACC-001"));
        assert_eq!(entry.timestamp.as_deref(), Some("2024-05-01T10:00:00Z"));
        assert_eq!(entry.duration, Some(CallDuration::Millis(87.0)));
    }

    #[test]
    fn empty_values_fall_through_to_next_alias() {
        let entries = normalize_operation_flow(&json!([{
            "request_type": "",
            "method": null,
            "requestType": "put",
            "response_code": 0,
            "responseCode": "404",
            "test_case": "",
            "tc_title": "Transfer funds",
            "request_body": {"amount": 500},
            "responsePayload": "{\"ok\":false}"
        }]));
        let entry = &entries[0];
        assert_eq!(entry.method, "PUT");
        assert_eq!(entry.status_code.as_deref(), Some("404"));
        assert_eq!(entry.test_case.as_deref(), Some("Transfer funds"));
        assert_eq!(entry.request_payload, Some(json!({"amount": 500})));
        assert_eq!(entry.response_payload, Some(json!("{\"ok\":false}")));
    }

    #[test]
    fn missing_method_defaults_to_get() {
        let entries = normalize_operation_flow(&json!({"operations": [{"status": "success"}, 7]}));
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].method, "GET");
        assert_eq!(entries[0].status.as_deref(), Some("success"));
        assert!(entries[0].endpoint.is_none());
        assert!(entries[0].duration.is_none());
    }
}
