//! Workflow template domain module
//!
//! A template is a company-owned, ordered list of approval steps. Each step
//! names the employee or role allowed to resolve it. Templates are edited
//! freely; workflows take a snapshot of the steps when they are created.

mod entity;
mod step;
mod validation;

pub use entity::WorkflowTemplate;
pub use step::WorkflowStepTemplate;
pub use validation::{validate_description, validate_name, DEFAULT_MIN_NAME_LENGTH};
