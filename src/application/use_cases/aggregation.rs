//! Summary statistics over fetched records. Nothing here fails: every input may be
//! empty and every division is guarded.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::domain::defect::{Defect, DefectStatus, Severity};
use crate::domain::test_case::{Priority, TestCase, TestCaseStatus, TestSuite};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatusCounts {
    pub pass: u64,
    pub fail: u64,
    pub blocked: u64,
    pub not_run: u64,
    pub in_progress: u64,
    pub skipped: u64,
    /// Records whose status is missing or outside the known vocabulary.
    pub unrecognized: u64,
    pub total: u64,
}

impl StatusCounts {
    pub fn from_cases<'a>(cases: impl IntoIterator<Item = &'a TestCase>) -> Self {
        cases.into_iter().fold(Self::default(), |mut counts, case| {
            counts.record(&case.status);
            counts
        })
    }

    /// Counts taken as-is from a precomputed source such as the dashboard stats.
    pub fn from_totals(total: u64, pass: u64, fail: u64, blocked: u64, not_run: u64) -> Self {
        Self {
            pass,
            fail,
            blocked,
            not_run,
            total,
            ..Self::default()
        }
    }

    fn record(&mut self, status: &TestCaseStatus) {
        let slot = match status {
            TestCaseStatus::Pass => &mut self.pass,
            TestCaseStatus::Fail => &mut self.fail,
            TestCaseStatus::Blocked => &mut self.blocked,
            TestCaseStatus::NotRun => &mut self.not_run,
            TestCaseStatus::InProgress => &mut self.in_progress,
            TestCaseStatus::Skipped => &mut self.skipped,
            TestCaseStatus::Other(_) => &mut self.unrecognized,
        };
        *slot += 1;
        self.total += 1;
    }

    pub fn get(&self, status: &TestCaseStatus) -> u64 {
        match status {
            TestCaseStatus::Pass => self.pass,
            TestCaseStatus::Fail => self.fail,
            TestCaseStatus::Blocked => self.blocked,
            TestCaseStatus::NotRun => self.not_run,
            TestCaseStatus::InProgress => self.in_progress,
            TestCaseStatus::Skipped => self.skipped,
            TestCaseStatus::Other(_) => self.unrecognized,
        }
    }

    pub fn pass_rate(&self) -> String {
        pass_rate(self.pass, self.total)
    }

    pub fn fail_rate(&self) -> String {
        pass_rate(self.fail, self.total)
    }

    /// The four buckets every status bar shows, in display order.
    pub fn bar_buckets(&self) -> Vec<Bucket> {
        [
            TestCaseStatus::Pass,
            TestCaseStatus::Fail,
            TestCaseStatus::Blocked,
            TestCaseStatus::NotRun,
        ]
        .iter()
        .map(|status| Bucket::new(status.as_str(), status_bar_label(status), self.get(status)))
        .collect()
    }

    pub fn status_bar(&self) -> StackedBar {
        distribution(&self.bar_buckets(), self.total)
    }
}

fn status_bar_label(status: &TestCaseStatus) -> &str {
    match status {
        TestCaseStatus::Pass => "Passed",
        TestCaseStatus::Fail => "Failed",
        other => other.label(),
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}

/// One decimal from the exact binary value, halves rounded up. `{:.1}` alone
/// rounds exact halves to even, so the digits are inspected directly.
fn to_fixed_1(value: f64) -> String {
    let exact = format!("{:.60}", value.max(0.0));
    let (whole, fraction) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let mut digits = fraction.bytes().map(|b| u64::from(b - b'0'));
    let tenths = digits.next().unwrap_or(0);
    let round_up = digits.next().is_some_and(|hundredths| hundredths >= 5);
    let scaled = whole.parse::<u64>().unwrap_or(0) * 10 + tenths + u64::from(round_up);
    format!("{}.{}", scaled / 10, scaled % 10)
}

/// `part / total * 100` to one decimal, `"0.0"` when `total` is zero.
pub fn pass_rate(part: u64, total: u64) -> String {
    if total == 0 {
        return "0.0".to_string();
    }
    to_fixed_1(part as f64 / total as f64 * 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub key: String,
    pub label: String,
    pub count: u64,
}

impl Bucket {
    pub fn new(key: impl Into<String>, label: impl Into<String>, count: u64) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub key: String,
    pub label: String,
    pub count: u64,
    pub width_pct: f64,
    /// Wide enough to carry an inline label.
    pub show_label: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackedBar {
    pub total: u64,
    pub segments: Vec<Segment>,
    pub legend: Vec<Bucket>,
}

/// Buckets keep their order. Zero-count buckets stay in the legend but get no segment.
pub fn distribution(buckets: &[Bucket], total: u64) -> StackedBar {
    let segments = buckets
        .iter()
        .filter(|bucket| bucket.count > 0 && total > 0)
        .map(|bucket| {
            let width_pct = percentage(bucket.count, total);
            Segment {
                key: bucket.key.clone(),
                label: bucket.label.clone(),
                count: bucket.count,
                width_pct,
                show_label: width_pct >= 10.0,
            }
        })
        .collect();
    StackedBar {
        total,
        segments,
        legend: buckets.to_vec(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleGroup {
    pub module: String,
    pub counts: StatusCounts,
    pub pass_rate: String,
}

/// One group per distinct module, sorted, never omitting a module.
pub fn group_by_module(cases: &[TestCase]) -> Vec<ModuleGroup> {
    let mut groups: BTreeMap<&str, Vec<&TestCase>> = BTreeMap::new();
    for case in cases {
        groups.entry(case.module.as_str()).or_default().push(case);
    }
    groups
        .into_iter()
        .map(|(module, members)| {
            let counts = StatusCounts::from_cases(members);
            ModuleGroup {
                module: module.to_string(),
                pass_rate: counts.pass_rate(),
                counts,
            }
        })
        .collect()
}

pub fn modules_covered(cases: &[TestCase]) -> usize {
    group_by_module(cases).len()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriorityGroup {
    pub priority: Priority,
    pub counts: StatusCounts,
    pub pass_rate: String,
}

/// Ranked critical to low. Empty priorities and unknown values are left out.
pub fn group_by_priority(cases: &[TestCase]) -> Vec<PriorityGroup> {
    Priority::ALL
        .iter()
        .filter_map(|priority| {
            let counts =
                StatusCounts::from_cases(cases.iter().filter(|case| &case.priority == priority));
            if counts.total == 0 {
                return None;
            }
            Some(PriorityGroup {
                priority: priority.clone(),
                pass_rate: counts.pass_rate(),
                counts,
            })
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeverityCount {
    pub severity: Severity,
    pub count: u64,
}

/// Ranked blocker to trivial, zero counts omitted.
pub fn count_by_severity(defects: &[Defect]) -> Vec<SeverityCount> {
    Severity::ALL
        .iter()
        .filter_map(|severity| {
            let count = defects
                .iter()
                .filter(|defect| &defect.severity == severity)
                .count() as u64;
            (count > 0).then(|| SeverityCount {
                severity: severity.clone(),
                count,
            })
        })
        .collect()
}

pub fn severity_bar(defects: &[Defect]) -> StackedBar {
    let buckets: Vec<Bucket> = Severity::ALL
        .iter()
        .map(|severity| {
            let count = defects
                .iter()
                .filter(|defect| &defect.severity == severity)
                .count() as u64;
            Bucket::new(severity.as_str(), capitalize(severity.as_str()), count)
        })
        .collect();
    let mut bar = distribution(&buckets, defects.len() as u64);
    bar.legend.retain(|bucket| bucket.count > 0);
    bar
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DefectCounts {
    pub total: u64,
    pub open: u64,
    pub in_progress: u64,
    pub fixed: u64,
    pub verified: u64,
    pub closed: u64,
    pub reopened: u64,
}

impl DefectCounts {
    pub fn from_defects(defects: &[Defect]) -> Self {
        defects.iter().fold(Self::default(), |mut counts, defect| {
            counts.total += 1;
            match defect.status {
                DefectStatus::Open => counts.open += 1,
                DefectStatus::InProgress => counts.in_progress += 1,
                DefectStatus::Fixed => counts.fixed += 1,
                DefectStatus::Verified => counts.verified += 1,
                DefectStatus::Closed => counts.closed += 1,
                DefectStatus::Reopened => counts.reopened += 1,
                DefectStatus::Other(_) => {}
            }
            counts
        })
    }
}

/// Raw value to count, in first-seen order. Unknown values get their own entry.
pub fn tally<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<(String, u64)> {
    let mut tally: Vec<(String, u64)> = Vec::new();
    for value in values {
        match tally.iter_mut().find(|(seen, _)| seen == value) {
            Some((_, count)) => *count += 1,
            None => tally.push((value.to_string(), 1)),
        }
    }
    tally
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SuiteRollup {
    pub suites: usize,
    pub total_cases: u64,
    pub passed: u64,
    pub failed: u64,
    pub not_run: u64,
}

impl SuiteRollup {
    pub fn pass_rate(&self) -> String {
        pass_rate(self.passed, self.total_cases)
    }
}

pub fn suite_rollup(suites: &[TestSuite]) -> SuiteRollup {
    suites.iter().fold(
        SuiteRollup {
            suites: suites.len(),
            ..SuiteRollup::default()
        },
        |mut rollup, suite| {
            rollup.total_cases += suite.total_cases;
            rollup.passed += suite.passed;
            rollup.failed += suite.failed;
            rollup.not_run += suite.not_run;
            rollup
        },
    )
}

/// `in_progress` reads "In Progress", anything else gets its first letter upper-cased.
pub fn capitalize(raw: &str) -> String {
    if raw == "in_progress" {
        return "In Progress".to_string();
    }
    let mut chars = raw.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
