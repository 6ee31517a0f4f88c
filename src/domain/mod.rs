//! Domain layer - Core business logic and entities

pub mod clock;
pub mod error;
pub mod identity;
pub mod organization;
pub mod workflow;
pub mod workflow_template;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ErrorKind, WorkflowError};
pub use identity::{CandidateId, CompanyId, EmployeeId, RoleId, WorkflowId, WorkflowTemplateId};
pub use organization::{Candidate, Company, Employee, OrganizationValidationError, Role};
pub use workflow::{ApprovalStatus, Delegation, RestartRecord, Workflow, WorkflowStep};
pub use workflow_template::{WorkflowStepTemplate, WorkflowTemplate};
