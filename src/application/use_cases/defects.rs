use serde::{Deserialize, Serialize};

use super::aggregation::{count_by_severity, severity_bar, DefectCounts, SeverityCount, StackedBar};
use crate::domain::defect::Defect;
use crate::domain::error::Result;
use crate::infrastructure::api_client::QaBackend;

/// Client-side filters. `None`, blank and `"all"` mean no filter.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DefectFilter {
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

fn active(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty() && *value != "all")
}

impl DefectFilter {
    pub fn matches(&self, defect: &Defect) -> bool {
        if let Some(severity) = active(&self.severity) {
            if defect.severity.as_str() != severity {
                return false;
            }
        }
        if let Some(status) = active(&self.status) {
            if defect.status.as_str() != status {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefectsView {
    pub filter: DefectFilter,
    pub counts: DefectCounts,
    pub severity_counts: Vec<SeverityCount>,
    /// Absent when there are no defects at all.
    pub severity_bar: Option<StackedBar>,
    pub distinct_severities: Vec<String>,
    pub distinct_statuses: Vec<String>,
    pub defects: Vec<Defect>,
    pub showing: usize,
    pub total: usize,
}

pub struct DefectsUseCase {
    backend: QaBackend,
}

/// Distinct values in first-seen order.
pub fn distinct<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for value in values {
        if !seen.iter().any(|known| known == value) {
            seen.push(value.to_string());
        }
    }
    seen
}

impl DefectsUseCase {
    pub fn new(backend: QaBackend) -> Self {
        Self { backend }
    }

    pub async fn load(&self, filter: DefectFilter) -> Result<DefectsView> {
        let defects = self.backend.defects().await?;
        Ok(build_view(defects, filter))
    }
}

pub fn build_view(defects: Vec<Defect>, filter: DefectFilter) -> DefectsView {
    let total = defects.len();
    let filtered: Vec<Defect> = defects
        .iter()
        .filter(|defect| filter.matches(defect))
        .cloned()
        .collect();
    DefectsView {
        counts: DefectCounts::from_defects(&defects),
        severity_counts: count_by_severity(&defects),
        severity_bar: (total > 0).then(|| severity_bar(&defects)),
        distinct_severities: distinct(defects.iter().map(|d| d.severity.as_str())),
        distinct_statuses: distinct(defects.iter().map(|d| d.status.as_str())),
        showing: filtered.len(),
        defects: filtered,
        total,
        filter,
    }
}
