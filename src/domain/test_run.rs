use serde::{Deserialize, Serialize};

use super::lenient::null_as_default;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct TestRun {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub run_name: String,
    #[serde(default)]
    pub run_date: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_cases: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub passed: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub failed: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub blocked: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub skipped: u64,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_counters_decode_as_zero() {
        let json = r#"{"id": 2, "run_name": "Sprint 4", "total_cases": 10, "passed": 7, "failed": null, "blocked": null}"#;
        let run: TestRun = serde_json::from_str(json).unwrap();
        assert_eq!(run.run_name, "Sprint 4");
        assert_eq!(run.passed, 7);
        assert_eq!(run.failed, 0);
        assert_eq!(run.blocked, 0);
        assert_eq!(run.skipped, 0);
    }
}
