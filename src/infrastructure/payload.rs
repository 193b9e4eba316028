use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value as JsonValue;

static STEP_NUMBER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s*\d+\.\s*").unwrap());

/// Test data as stored by the backend: usually JSON text, sometimes free text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TestData {
    Json(JsonValue),
    Text(String),
}

/// Splits newline-delimited steps, drops blank lines and strips `1.` style numbering.
pub fn parse_test_steps(raw: Option<&str>) -> Vec<String> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| STEP_NUMBER_PATTERN.replace(line, "").trim().to_string())
        .filter(|line| !line.is_empty())
        .collect()
}

pub fn parse_test_data(raw: Option<&str>) -> Option<TestData> {
    let raw = raw?;
    if raw.trim().is_empty() {
        return None;
    }
    match serde_json::from_str::<JsonValue>(raw) {
        Ok(value) => Some(TestData::Json(value)),
        Err(_) => Some(TestData::Text(raw.to_string())),
    }
}

/// Pretty-prints JSON payloads; text that is not JSON is returned untouched.
pub fn pretty_payload(value: Option<&JsonValue>) -> String {
    match value {
        None | Some(JsonValue::Null) => "N/A".to_string(),
        Some(JsonValue::String(text)) => match serde_json::from_str::<JsonValue>(text) {
            Ok(parsed) => serde_json::to_string_pretty(&parsed).unwrap_or_else(|_| text.clone()),
            Err(_) => text.clone(),
        },
        Some(other) => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    }
}
