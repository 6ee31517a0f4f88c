//! Name and description rules shared by templates and workflows

use crate::domain::error::WorkflowError;

/// Minimum trimmed length of template and workflow names
pub const DEFAULT_MIN_NAME_LENGTH: usize = 5;

/// Validate a template or workflow name against a minimum trimmed length
pub fn validate_name(name: &str, min_length: usize) -> Result<(), WorkflowError> {
    let trimmed = name.trim();

    if trimmed.is_empty() {
        return Err(WorkflowError::invalid_argument("Name cannot be empty"));
    }

    if trimmed.chars().count() < min_length {
        return Err(WorkflowError::invalid_argument(format!(
            "Name must be at least {} characters long",
            min_length
        )));
    }

    Ok(())
}

/// Validate that a description is present
pub fn validate_description(description: &str) -> Result<(), WorkflowError> {
    if description.trim().is_empty() {
        return Err(WorkflowError::invalid_argument(
            "Description cannot be empty",
        ));
    }

    Ok(())
}
