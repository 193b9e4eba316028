use serde::Serialize;

use super::aggregation::{
    capitalize, group_by_module, group_by_priority, modules_covered, pass_rate, tally,
    ModuleGroup, PriorityGroup, StackedBar, StatusCounts,
};
use crate::domain::defect::Defect;
use crate::domain::error::Result;
use crate::domain::test_case::{TestCase, TestCaseFilter};
use crate::domain::test_run::TestRun;
use crate::infrastructure::api_client::QaBackend;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TallyEntry {
    pub key: String,
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRow {
    #[serde(flatten)]
    pub run: TestRun,
    pub status_label: String,
    pub pass_rate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportView {
    pub total: u64,
    pub pass_rate: String,
    pub fail_rate: String,
    pub modules_covered: usize,
    pub counts: StatusCounts,
    pub execution_bar: StackedBar,
    pub modules: Vec<ModuleGroup>,
    pub priorities: Vec<PriorityGroup>,
    pub runs: Vec<RunRow>,
    pub total_defects: usize,
    pub defects_by_severity: Vec<TallyEntry>,
    pub defects_by_status: Vec<TallyEntry>,
}

pub struct ReportsUseCase {
    backend: QaBackend,
}

impl ReportsUseCase {
    pub fn new(backend: QaBackend) -> Self {
        Self { backend }
    }

    /// All three feeds or nothing; the first failure is the page's error.
    pub async fn load(&self) -> Result<ReportView> {
        let unfiltered = TestCaseFilter::default();
        let (cases, runs, defects) = tokio::try_join!(
            self.backend.test_cases(&unfiltered),
            self.backend.test_runs(),
            self.backend.defects()
        )?;
        Ok(build_report(&cases, runs, &defects))
    }
}

fn tally_entries<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<TallyEntry> {
    tally(values)
        .into_iter()
        .map(|(key, count)| TallyEntry {
            label: capitalize(&key),
            key,
            count,
        })
        .collect()
}

pub fn build_report(cases: &[TestCase], runs: Vec<TestRun>, defects: &[Defect]) -> ReportView {
    let counts = StatusCounts::from_cases(cases);
    ReportView {
        total: counts.total,
        pass_rate: counts.pass_rate(),
        fail_rate: counts.fail_rate(),
        modules_covered: modules_covered(cases),
        execution_bar: counts.status_bar(),
        counts,
        modules: group_by_module(cases),
        priorities: group_by_priority(cases),
        runs: runs
            .into_iter()
            .map(|run| RunRow {
                status_label: capitalize(run.status.as_deref().unwrap_or("")),
                pass_rate: pass_rate(run.passed, run.total_cases),
                run,
            })
            .collect(),
        total_defects: defects.len(),
        defects_by_severity: tally_entries(defects.iter().map(|d| d.severity.as_str())),
        defects_by_status: tally_entries(defects.iter().map(|d| d.status.as_str())),
    }
}
