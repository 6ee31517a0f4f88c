//! Hiring Workflow
//!
//! Companies define approval templates as ordered steps, each assigned to an
//! employee or a role. A workflow snapshots a template for one candidate and
//! moves through its steps in order:
//! - Sequential approve/reject gated by assignment, role or delegation
//! - Restart of finished workflows
//! - Reassignment and time-boxed delegation of steps

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::{ApprovalStatus, Workflow, WorkflowError, WorkflowTemplate};
pub use infrastructure::services::WorkflowService;
