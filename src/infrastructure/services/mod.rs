//! Infrastructure services

mod workflow_service;

pub use workflow_service::{CreateTemplateRequest, StepRequest, WorkflowService};
