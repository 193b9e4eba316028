pub mod checklist;
pub mod dashboard;
pub mod defect;
pub mod error;
pub mod health;
pub mod operation_flow;
pub mod test_case;
pub mod test_run;

mod lenient;
