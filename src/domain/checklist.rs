use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    #[default]
    NotStarted,
    InProgress,
    Done,
}

impl StepStatus {
    pub fn label(self) -> &'static str {
        match self {
            StepStatus::NotStarted => "Not Started",
            StepStatus::InProgress => "In Progress",
            StepStatus::Done => "Done",
        }
    }
}

/// Display-only ranking of a checklist step. Never weights progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StepPriority {
    P0,
    P1,
    P2,
}

impl StepPriority {
    pub fn label(self) -> &'static str {
        match self {
            StepPriority::P0 => "P0 Critical",
            StepPriority::P1 => "P1 High",
            StepPriority::P2 => "P2 Medium",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StepState {
    pub checked: bool,
    pub status: StepStatus,
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepDefinition {
    /// Stable identity, unaffected by reordering the catalog.
    pub id: &'static str,
    pub text: &'static str,
    pub priority: StepPriority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionDefinition {
    pub id: &'static str,
    pub title: &'static str,
    pub steps: &'static [StepDefinition],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressTone {
    Good,
    Fair,
    Poor,
}

impl ProgressTone {
    pub fn for_percent(pct: u32) -> Self {
        if pct >= 80 {
            ProgressTone::Good
        } else if pct >= 50 {
            ProgressTone::Fair
        } else {
            ProgressTone::Poor
        }
    }
}
