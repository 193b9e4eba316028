pub mod use_cases;

pub use use_cases::checklist::ChecklistTracker;
pub use use_cases::dashboard::DashboardUseCase;
pub use use_cases::defects::DefectsUseCase;
pub use use_cases::health_check::{HealthCheckUseCase, HealthMonitor};
pub use use_cases::operation_flow::OperationFlowUseCase;
pub use use_cases::reports::ReportsUseCase;
pub use use_cases::test_cases::TestCasesUseCase;
