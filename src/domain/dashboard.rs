use serde::{Deserialize, Serialize};

/// Payload of `GET /api/dashboard/stats`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(default)]
    pub customers: Option<u64>,
    #[serde(default)]
    pub accounts: Option<u64>,
    #[serde(default)]
    pub transactions: Option<u64>,
    #[serde(default)]
    pub total_test_cases: Option<u64>,
    #[serde(default)]
    pub passed_tests: Option<u64>,
    #[serde(default)]
    pub failed_tests: Option<u64>,
    #[serde(default)]
    pub blocked_tests: Option<u64>,
    #[serde(default)]
    pub not_run_tests: Option<u64>,
    #[serde(default)]
    pub open_defects: Option<u64>,
    #[serde(default)]
    pub total_balance: Option<f64>,
}
