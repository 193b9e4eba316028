pub mod aggregation;
pub mod checklist;
pub mod checklist_catalog;
pub mod dashboard;
pub mod defects;
pub mod formatting;
pub mod health_check;
pub mod operation_flow;
pub mod page_state;
pub mod reports;
pub mod test_cases;
