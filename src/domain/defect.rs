use serde::{Deserialize, Serialize};

use super::lenient::{lenient_enum, null_as_default};

lenient_enum! {
    pub enum Severity {
        Blocker => "blocker",
        Critical => "critical",
        Major => "major",
        Minor => "minor",
        Trivial => "trivial",
    }
}

lenient_enum! {
    pub enum DefectStatus {
        Open => "open",
        InProgress => "in_progress",
        Fixed => "fixed",
        Verified => "verified",
        Closed => "closed",
        Reopened => "reopened",
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Defect {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub defect_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub status: DefectStatus,
    #[serde(default)]
    pub tc_code: Option<String>,
    #[serde(default)]
    pub tc_title: Option<String>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub reported_by: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}
