use serde::Serialize;
use std::sync::Mutex;
use tracing::{info, warn};
use validator::Validate;

use super::aggregation::{pass_rate, suite_rollup, SuiteRollup};
use crate::domain::error::{AppError, Result};
use crate::domain::test_case::{ExecutionInput, TestCase, TestCaseFilter, TestCaseStatus, TestSuite};
use crate::infrastructure::api_client::QaBackend;
use crate::infrastructure::payload::{parse_test_data, parse_test_steps, TestData};

const HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCaseDetail {
    #[serde(flatten)]
    pub case: TestCase,
    pub status_label: String,
    pub steps: Vec<String>,
    pub parsed_test_data: Option<TestData>,
}

impl From<TestCase> for TestCaseDetail {
    fn from(case: TestCase) -> Self {
        Self {
            status_label: case.status.label().to_string(),
            steps: parse_test_steps(case.test_steps.as_deref()),
            parsed_test_data: parse_test_data(case.test_data.as_deref()),
            case,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuiteCard {
    #[serde(flatten)]
    pub suite: TestSuite,
    pub pass_pct: f64,
    pub fail_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCasesView {
    pub filter: TestCaseFilter,
    pub rollup: SuiteRollup,
    pub rollup_pass_rate: String,
    pub suites: Vec<SuiteCard>,
    pub test_cases: Vec<TestCaseDetail>,
}

/// One submitted execution, kept for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionRecord {
    pub id: i64,
    pub test_case_id: String,
    pub title: Option<String>,
    pub module: String,
    pub status: TestCaseStatus,
    pub execution_time_ms: Option<i64>,
    pub executed_at: Option<String>,
    pub actual_result: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecutionOutcome {
    pub message: String,
    pub updated: TestCase,
    /// The list as the backend reports it after the write.
    pub test_cases: Vec<TestCaseDetail>,
    pub history: Vec<ExecutionRecord>,
}

pub struct TestCasesUseCase {
    backend: QaBackend,
    history: Mutex<Vec<ExecutionRecord>>,
}

fn suite_card(suite: TestSuite) -> SuiteCard {
    let pct = |part: u64| {
        if suite.total_cases == 0 {
            0.0
        } else {
            part as f64 * 100.0 / suite.total_cases as f64
        }
    };
    SuiteCard {
        pass_pct: pct(suite.passed),
        fail_pct: pct(suite.failed),
        suite,
    }
}

impl TestCasesUseCase {
    pub fn new(backend: QaBackend) -> Self {
        Self {
            backend,
            history: Mutex::new(Vec::new()),
        }
    }

    /// Filtered list and suite rollup, both required.
    pub async fn load(&self, filter: TestCaseFilter) -> Result<TestCasesView> {
        let (cases, suites) = tokio::try_join!(
            self.backend.test_cases(&filter),
            self.backend.test_suites()
        )?;
        let rollup = suite_rollup(&suites);
        Ok(TestCasesView {
            rollup_pass_rate: pass_rate(rollup.passed, rollup.total_cases),
            rollup,
            suites: suites.into_iter().map(suite_card).collect(),
            test_cases: cases.into_iter().map(TestCaseDetail::from).collect(),
            filter,
        })
    }

    /// Cases waiting to be executed, or every case when `show_all` is set.
    pub async fn execution_queue(&self, show_all: bool) -> Result<Vec<TestCaseDetail>> {
        let filter = if show_all {
            TestCaseFilter::default()
        } else {
            TestCaseFilter {
                status: Some(TestCaseStatus::NotRun.as_str().to_string()),
                ..TestCaseFilter::default()
            }
        };
        let cases = self.backend.test_cases(&filter).await?;
        Ok(cases.into_iter().map(TestCaseDetail::from).collect())
    }

    /// Validates, writes the result, then re-fetches the list with `filter`.
    pub async fn execute(
        &self,
        id: i64,
        input: ExecutionInput,
        filter: &TestCaseFilter,
    ) -> Result<ExecutionOutcome> {
        input.validate().map_err(|errors| {
            let err = AppError::from(errors);
            warn!(test_case = id, error = %err, "Execution rejected before submit");
            err
        })?;

        let updated = self.backend.execute_test_case(id, &input).await?;
        let message = format!(
            "Test case {} updated to \"{}\".",
            updated.test_case_id,
            updated.status.label()
        );
        let history = self.push_history(&updated)?;

        let refreshed = self.backend.test_cases(filter).await?;
        info!(
            test_case = %updated.test_case_id,
            cases = refreshed.len(),
            "Test case list refreshed after execution"
        );
        Ok(ExecutionOutcome {
            message,
            updated,
            test_cases: refreshed.into_iter().map(TestCaseDetail::from).collect(),
            history,
        })
    }

    fn push_history(&self, updated: &TestCase) -> Result<Vec<ExecutionRecord>> {
        let mut history = self
            .history
            .lock()
            .map_err(|_| AppError::Internal("Execution history lock poisoned".to_string()))?;
        history.insert(
            0,
            ExecutionRecord {
                id: updated.id,
                test_case_id: updated.test_case_id.clone(),
                title: updated.title.clone(),
                module: updated.module.clone(),
                status: updated.status.clone(),
                execution_time_ms: updated.execution_time_ms,
                executed_at: updated.executed_at.clone(),
                actual_result: updated.actual_result.clone(),
            },
        );
        history.truncate(HISTORY_LIMIT);
        Ok(history.clone())
    }

    pub fn history(&self) -> Result<Vec<ExecutionRecord>> {
        self.history
            .lock()
            .map(|history| history.clone())
            .map_err(|_| AppError::Internal("Execution history lock poisoned".to_string()))
    }
}
