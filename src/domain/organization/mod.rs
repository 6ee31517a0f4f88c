//! Organization domain module
//!
//! Employees, candidates, companies and roles. Workflows only read their
//! identifiers, plus the employee's role for authorization checks.

mod entity;
mod validation;

pub use entity::{Candidate, Company, Employee, Role};
pub use validation::{validate_person_name, OrganizationValidationError};
