//! Workflow domain module
//!
//! A workflow is a candidate's run through a snapshot of a template. Its
//! status is never stored; it is derived from the step statuses.

mod entity;
mod status;
mod step;

pub use entity::Workflow;
pub use status::ApprovalStatus;
pub use step::{Delegation, RestartRecord, WorkflowStep};
