pub mod remediation_ctx;
pub mod remediation_flow;

pub use remediation_ctx::RemediationCtx;
pub use remediation_flow::{attempt_statistics, RemediationFlow, StepReport};
