use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use super::checklist_catalog::{find_section, SECTIONS};
use crate::domain::checklist::{
    ProgressTone, SectionDefinition, StepDefinition, StepPriority, StepState, StepStatus,
};
use crate::domain::error::{AppError, Result};

/// Completion state for the compiled-in catalog, keyed by step id.
///
/// `checked` and `status == Done` always agree: every mutation goes through
/// `toggle_step` or `set_step_status`, and both derive one from the other.
#[derive(Debug, Clone, PartialEq)]
pub struct ChecklistTracker {
    state: HashMap<&'static str, StepState>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub done: usize,
    pub total: usize,
    pub percent: u32,
    pub tone: ProgressTone,
}

impl Progress {
    pub fn new(done: usize, total: usize) -> Self {
        let percent = if total == 0 {
            0
        } else {
            (done as f64 / total as f64 * 100.0).round() as u32
        };
        Self {
            done,
            total,
            percent,
            tone: ProgressTone::for_percent(percent),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepView {
    pub id: &'static str,
    pub text: &'static str,
    pub priority: StepPriority,
    pub priority_label: &'static str,
    pub checked: bool,
    pub status: StepStatus,
    pub status_label: &'static str,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionView {
    pub id: &'static str,
    pub title: &'static str,
    pub progress: Progress,
    pub steps: Vec<StepView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChecklistView {
    pub overall: Progress,
    pub sections: Vec<SectionView>,
}

impl Default for ChecklistTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ChecklistTracker {
    pub fn new() -> Self {
        let state = SECTIONS
            .iter()
            .flat_map(|section| section.steps.iter())
            .map(|step| (step.id, StepState::default()))
            .collect();
        Self { state }
    }

    fn locate(
        section_id: &str,
        step_id: &str,
    ) -> Result<(&'static SectionDefinition, &'static StepDefinition)> {
        let section = find_section(section_id)
            .ok_or_else(|| AppError::NotFound(format!("Checklist section '{}'", section_id)))?;
        let step = section
            .steps
            .iter()
            .find(|step| step.id == step_id)
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Step '{}' in checklist section '{}'",
                    step_id, section_id
                ))
            })?;
        Ok((section, step))
    }

    fn state_mut(&mut self, section_id: &str, step_id: &str) -> Result<&mut StepState> {
        let (_, step) = Self::locate(section_id, step_id)?;
        Ok(self.state.entry(step.id).or_default())
    }

    pub fn step(&self, section_id: &str, step_id: &str) -> Result<StepState> {
        let (_, step) = Self::locate(section_id, step_id)?;
        Ok(self.state.get(step.id).cloned().unwrap_or_default())
    }

    pub fn toggle_step(&mut self, section_id: &str, step_id: &str) -> Result<StepState> {
        let state = self.state_mut(section_id, step_id)?;
        state.checked = !state.checked;
        state.status = if state.checked {
            StepStatus::Done
        } else {
            StepStatus::NotStarted
        };
        Ok(state.clone())
    }

    pub fn set_step_status(
        &mut self,
        section_id: &str,
        step_id: &str,
        status: StepStatus,
    ) -> Result<StepState> {
        let state = self.state_mut(section_id, step_id)?;
        state.status = status;
        state.checked = status == StepStatus::Done;
        Ok(state.clone())
    }

    pub fn set_step_notes(
        &mut self,
        section_id: &str,
        step_id: &str,
        notes: impl Into<String>,
    ) -> Result<StepState> {
        let state = self.state_mut(section_id, step_id)?;
        state.notes = notes.into();
        Ok(state.clone())
    }

    fn progress_of<'a>(&self, steps: impl Iterator<Item = &'a StepDefinition>) -> Progress {
        let (done, total) = steps.fold((0, 0), |(done, total), step| {
            let checked = self.state.get(step.id).map(|s| s.checked).unwrap_or(false);
            (done + usize::from(checked), total + 1)
        });
        Progress::new(done, total)
    }

    pub fn section_progress(&self, section_id: &str) -> Result<Progress> {
        let section = find_section(section_id)
            .ok_or_else(|| AppError::NotFound(format!("Checklist section '{}'", section_id)))?;
        Ok(self.progress_of(section.steps.iter()))
    }

    pub fn overall_progress(&self) -> Progress {
        self.progress_of(SECTIONS.iter().flat_map(|section| section.steps.iter()))
    }

    /// Drops every check, status and note. Refused unless the operator confirmed.
    pub fn reset_all(&mut self, confirmed: bool) -> Result<()> {
        if !confirmed {
            return Err(AppError::ValidationError(
                "Reset requires confirmation: all checklist progress will be lost.".to_string(),
            ));
        }
        let cleared = self.overall_progress().done;
        *self = Self::new();
        info!(cleared, "Checklist reset");
        Ok(())
    }

    pub fn view(&self) -> ChecklistView {
        let sections = SECTIONS
            .iter()
            .map(|section| SectionView {
                id: section.id,
                title: section.title,
                progress: self.progress_of(section.steps.iter()),
                steps: section
                    .steps
                    .iter()
                    .map(|step| {
                        let state = self.state.get(step.id).cloned().unwrap_or_default();
                        StepView {
                            id: step.id,
                            text: step.text,
                            priority: step.priority,
                            priority_label: step.priority.label(),
                            checked: state.checked,
                            status: state.status,
                            status_label: state.status.label(),
                            notes: state.notes,
                        }
                    })
                    .collect(),
            })
            .collect();
        ChecklistView {
            overall: self.overall_progress(),
            sections,
        }
    }
}
