//! Organization validation

use thiserror::Error;

/// Errors that can occur when creating organization entities
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OrganizationValidationError {
    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Name cannot exceed {0} characters")]
    NameTooLong(usize),

    #[error("{0} identifier cannot be nil")]
    NilId(&'static str),
}

const MAX_NAME_LENGTH: usize = 200;

/// Validate a display name of a person, company or role
pub fn validate_person_name(name: &str) -> Result<(), OrganizationValidationError> {
    let name = name.trim();

    if name.is_empty() {
        return Err(OrganizationValidationError::EmptyName);
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(OrganizationValidationError::NameTooLong(MAX_NAME_LENGTH));
    }

    Ok(())
}
