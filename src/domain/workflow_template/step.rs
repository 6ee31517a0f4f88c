//! Step template entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::validate_description;
use crate::domain::error::WorkflowError;
use crate::domain::identity::{EmployeeId, RoleId};

/// One ordinal step of a template and who may resolve it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StepTemplateRecord")]
pub struct WorkflowStepTemplate {
    /// Position within the template, 1-based
    number: u32,
    description: String,
    /// Employee assigned to the step
    #[serde(skip_serializing_if = "Option::is_none")]
    employee_id: Option<EmployeeId>,
    /// Role whose holders may resolve the step
    #[serde(skip_serializing_if = "Option::is_none")]
    role_id: Option<RoleId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Stored form of a step template, checked before it becomes one
#[derive(Deserialize)]
struct StepTemplateRecord {
    number: u32,
    description: String,
    #[serde(default)]
    employee_id: Option<EmployeeId>,
    #[serde(default)]
    role_id: Option<RoleId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StepTemplateRecord> for WorkflowStepTemplate {
    type Error = WorkflowError;

    fn try_from(record: StepTemplateRecord) -> Result<Self, Self::Error> {
        validate_step(
            record.number,
            &record.description,
            record.employee_id,
            record.role_id,
        )?;

        if record.updated_at < record.created_at {
            return Err(WorkflowError::invalid_argument(format!(
                "Step {} was updated before it was created",
                record.number
            )));
        }

        Ok(Self::from_parts(
            record.number,
            record.description,
            record.employee_id,
            record.role_id,
            record.created_at,
            record.updated_at,
        ))
    }
}

impl WorkflowStepTemplate {
    /// Create a step template; only the owning template calls this
    pub(crate) fn create(
        number: u32,
        description: impl Into<String>,
        employee_id: Option<EmployeeId>,
        role_id: Option<RoleId>,
        now: DateTime<Utc>,
    ) -> Result<Self, WorkflowError> {
        let description = description.into();
        validate_step(number, &description, employee_id, role_id)?;

        Ok(Self::from_parts(
            number,
            description,
            employee_id,
            role_id,
            now,
            now,
        ))
    }

    fn from_parts(
        number: u32,
        description: String,
        employee_id: Option<EmployeeId>,
        role_id: Option<RoleId>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        assert!(number >= 1, "step number must be positive");
        assert!(
            employee_id.is_some() || role_id.is_some(),
            "step must have an assignee"
        );
        assert!(
            !employee_id.is_some_and(|id| id.is_nil()) && !role_id.is_some_and(|id| id.is_nil()),
            "step assignee cannot be nil"
        );
        assert!(updated_at >= created_at, "step updated before it was created");

        Self {
            number,
            description,
            employee_id,
            role_id,
            created_at,
            updated_at,
        }
    }

    // Getters

    pub fn number(&self) -> u32 {
        self.number
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn employee_id(&self) -> Option<EmployeeId> {
        self.employee_id
    }

    pub fn role_id(&self) -> Option<RoleId> {
        self.role_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Mutators

    /// Replace the description, trimmed
    pub fn update_info(&mut self, description: &str, now: DateTime<Utc>) {
        self.description = description.trim().to_string();
        self.touch(now);
    }

    pub fn update_number(&mut self, number: u32, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        if number == 0 {
            return Err(invalid_number(number));
        }

        if number != self.number {
            self.number = number;
            self.touch(now);
        }

        Ok(())
    }

    pub fn update_role_id(&mut self, role_id: RoleId, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        if role_id.is_nil() {
            return Err(WorkflowError::invalid_argument(format!(
                "{} is not a valid role identifier",
                role_id
            )));
        }

        if self.role_id != Some(role_id) {
            self.role_id = Some(role_id);
            self.touch(now);
        }

        Ok(())
    }

    pub fn update_employee_id(
        &mut self,
        employee_id: EmployeeId,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        if employee_id.is_nil() {
            return Err(WorkflowError::invalid_argument(format!(
                "{} is not a valid employee identifier",
                employee_id
            )));
        }

        if self.employee_id != Some(employee_id) {
            self.employee_id = Some(employee_id);
            self.touch(now);
        }

        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

fn validate_step(
    number: u32,
    description: &str,
    employee_id: Option<EmployeeId>,
    role_id: Option<RoleId>,
) -> Result<(), WorkflowError> {
    if number == 0 {
        return Err(invalid_number(number));
    }

    validate_description(description)?;

    if employee_id.is_none() && role_id.is_none() {
        return Err(WorkflowError::invalid_argument(
            "Step must be assigned to an employee or a role",
        ));
    }

    if let Some(id) = employee_id.filter(|id| id.is_nil()) {
        return Err(WorkflowError::invalid_argument(format!(
            "{} is not a valid employee identifier",
            id
        )));
    }

    if let Some(id) = role_id.filter(|id| id.is_nil()) {
        return Err(WorkflowError::invalid_argument(format!(
            "{} is not a valid role identifier",
            id
        )));
    }

    Ok(())
}

fn invalid_number(number: u32) -> WorkflowError {
    WorkflowError::invalid_argument(format!("{} is not a valid step number", number))
}
