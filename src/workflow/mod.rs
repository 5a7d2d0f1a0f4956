pub mod compare_flow;
pub mod generate_flow;
mod in_flight;
pub mod report;
pub mod review_flow;
pub mod session_manager;

pub use compare_flow::{CompareFlow, CompareOutcome};
pub use generate_flow::{GenerateFlow, GeneratedContract};
pub use report::{default_report_filename, render_comparison_report, ChangeSet};
pub use review_flow::{ReviewFlow, ReviewOutcome};
pub use session_manager::SessionManager;
