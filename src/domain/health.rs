use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeKind {
    /// Healthy when the endpoint answers 2xx.
    Status,
    /// Healthy when the endpoint answers with a non-empty JSON array or object.
    Data,
    /// Not probed, always reported healthy.
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceProbe {
    pub key: &'static str,
    pub name: &'static str,
    pub endpoint: Option<&'static str>,
    pub kind: ProbeKind,
    pub static_detail: Option<&'static str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallHealth {
    Checking,
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub key: String,
    pub name: String,
    pub status: HealthStatus,
    pub response_time_ms: u64,
    pub last_checked: String,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStats {
    pub tables: u64,
    pub total_rows: u64,
}
