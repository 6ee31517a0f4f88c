//! Workflow template entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::step::WorkflowStepTemplate;
use super::validation::{validate_description, validate_name, DEFAULT_MIN_NAME_LENGTH};
use crate::domain::error::WorkflowError;
use crate::domain::identity::{CompanyId, EmployeeId, RoleId, WorkflowTemplateId};

fn default_min_name_length() -> usize {
    DEFAULT_MIN_NAME_LENGTH
}

/// Ordered blueprint of approval steps owned by a company
///
/// Steps are always stored in `number` order and numbered `1..=len`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "TemplateRecord")]
pub struct WorkflowTemplate {
    id: WorkflowTemplateId,
    name: String,
    description: String,
    company_id: CompanyId,
    steps: Vec<WorkflowStepTemplate>,
    /// Minimum name length, carried into workflows created from this template
    min_name_length: usize,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Stored form of a template, checked before it becomes one
#[derive(Deserialize)]
struct TemplateRecord {
    id: WorkflowTemplateId,
    name: String,
    description: String,
    company_id: CompanyId,
    steps: Vec<WorkflowStepTemplate>,
    #[serde(default = "default_min_name_length")]
    min_name_length: usize,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<TemplateRecord> for WorkflowTemplate {
    type Error = WorkflowError;

    fn try_from(record: TemplateRecord) -> Result<Self, Self::Error> {
        if record.id.is_nil() {
            return Err(WorkflowError::invalid_argument(format!(
                "{} is not a valid template identifier",
                record.id
            )));
        }

        if record.company_id.is_nil() {
            return Err(WorkflowError::invalid_argument(format!(
                "{} is not a valid company identifier",
                record.company_id
            )));
        }

        validate_name(&record.name, record.min_name_length)?;
        validate_description(&record.description)?;

        let contiguous = record
            .steps
            .iter()
            .enumerate()
            .all(|(i, step)| step.number() as usize == i + 1);
        if !contiguous {
            let numbers: Vec<u32> = record.steps.iter().map(|s| s.number()).collect();
            return Err(WorkflowError::invalid_argument(format!(
                "Template step numbers must run 1..={} in order, found {:?}",
                record.steps.len(),
                numbers
            )));
        }

        if record.updated_at < record.created_at {
            return Err(WorkflowError::invalid_argument(
                "Template was updated before it was created",
            ));
        }

        Ok(Self::from_parts(
            record.id,
            record.name,
            record.description,
            record.company_id,
            record.steps,
            record.min_name_length,
            record.created_at,
            record.updated_at,
        ))
    }
}

impl WorkflowTemplate {
    /// Create an empty template with the default name length rule
    pub fn create(
        name: &str,
        description: &str,
        company_id: CompanyId,
        now: DateTime<Utc>,
    ) -> Result<Self, WorkflowError> {
        Self::create_with_min_name_length(
            name,
            description,
            company_id,
            DEFAULT_MIN_NAME_LENGTH,
            now,
        )
    }

    /// Create an empty template requiring names of at least `min_name_length` characters
    pub fn create_with_min_name_length(
        name: &str,
        description: &str,
        company_id: CompanyId,
        min_name_length: usize,
        now: DateTime<Utc>,
    ) -> Result<Self, WorkflowError> {
        if name.trim().is_empty() {
            return Err(WorkflowError::invalid_argument(
                "Template name cannot be empty",
            ));
        }

        validate_description(description)?;

        if company_id.is_nil() {
            return Err(WorkflowError::invalid_argument(format!(
                "{} is not a valid company identifier",
                company_id
            )));
        }

        validate_name(name, min_name_length)?;

        Ok(Self::from_parts(
            WorkflowTemplateId::new(),
            name.trim().to_string(),
            description.to_string(),
            company_id,
            Vec::new(),
            min_name_length,
            now,
            now,
        ))
    }

    #[allow(clippy::too_many_arguments)]
    fn from_parts(
        id: WorkflowTemplateId,
        name: String,
        description: String,
        company_id: CompanyId,
        steps: Vec<WorkflowStepTemplate>,
        min_name_length: usize,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        assert!(!id.is_nil(), "template id cannot be nil");
        assert!(!company_id.is_nil(), "template company id cannot be nil");
        assert!(
            name.chars().count() >= min_name_length,
            "template name shorter than minimum"
        );
        assert!(!description.is_empty(), "template description cannot be empty");
        assert!(
            steps
                .iter()
                .enumerate()
                .all(|(i, s)| s.number() as usize == i + 1),
            "template steps must be numbered 1..=len"
        );
        assert!(updated_at >= created_at, "template updated before it was created");

        Self {
            id,
            name,
            description,
            company_id,
            steps,
            min_name_length,
            created_at,
            updated_at,
        }
    }

    // Getters

    pub fn id(&self) -> WorkflowTemplateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    /// Steps in `number` order
    pub fn steps(&self) -> &[WorkflowStepTemplate] {
        &self.steps
    }

    pub fn step(&self, number: u32) -> Option<&WorkflowStepTemplate> {
        self.index_of(number).map(|i| &self.steps[i])
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn min_name_length(&self) -> usize {
        self.min_name_length
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Mutators

    /// Update name and/or description; only real changes bump `updated_at`
    pub fn update_info(
        &mut self,
        name: Option<&str>,
        description: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        if let Some(name) = name {
            validate_name(name, self.min_name_length)?;
        }

        if let Some(description) = description {
            validate_description(description)?;
        }

        let mut changed = false;

        if let Some(name) = name.map(str::trim).filter(|n| *n != self.name) {
            self.name = name.to_string();
            changed = true;
        }

        if let Some(description) = description
            .map(str::trim)
            .filter(|d| *d != self.description)
        {
            self.description = description.to_string();
            changed = true;
        }

        if changed {
            self.touch(now);
        }

        Ok(())
    }

    /// Append a step numbered `step_count() + 1`, returning its number
    pub fn add_step(
        &mut self,
        description: &str,
        employee_id: Option<EmployeeId>,
        role_id: Option<RoleId>,
        now: DateTime<Utc>,
    ) -> Result<u32, WorkflowError> {
        let number = self.steps.len() as u32 + 1;
        let step = WorkflowStepTemplate::create(number, description, employee_id, role_id, now)
            .map_err(|e| e.context("Failed to add step"))?;

        self.steps.push(step);
        self.touch(now);

        Ok(number)
    }

    /// Remove a step and shift the following steps down by one
    pub fn remove_step(
        &mut self,
        number: u32,
        now: DateTime<Utc>,
    ) -> Result<WorkflowStepTemplate, WorkflowError> {
        let index = self.index_of(number).ok_or_else(|| self.missing_step(number))?;

        let removed = self.steps.remove(index);
        self.renumber_from(index, now)?;
        self.touch(now);

        Ok(removed)
    }

    /// Exchange the positions of two steps
    ///
    /// Both the numbers and the storage order change, so `steps()` stays
    /// sorted by `number`.
    pub fn swap_steps(
        &mut self,
        number_first: u32,
        number_second: u32,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        let first = self
            .index_of(number_first)
            .ok_or_else(|| self.missing_step(number_first))?;
        let second = self
            .index_of(number_second)
            .ok_or_else(|| self.missing_step(number_second))?;

        if first != second {
            self.steps.swap(first, second);
            self.steps[first].update_number(number_first, now)?;
            self.steps[second].update_number(number_second, now)?;
        }

        self.touch(now);
        Ok(())
    }

    /// Replace the description of a step
    pub fn update_step_info(
        &mut self,
        number: u32,
        description: &str,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        self.step_mut(number)?.update_info(description, now);
        self.touch(now);
        Ok(())
    }

    /// Assign a step to an employee
    pub fn update_step_employee(
        &mut self,
        number: u32,
        employee_id: EmployeeId,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        self.step_mut(number)?.update_employee_id(employee_id, now)?;
        self.touch(now);
        Ok(())
    }

    /// Allow holders of a role to resolve a step
    pub fn update_step_role(
        &mut self,
        number: u32,
        role_id: RoleId,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        self.step_mut(number)?.update_role_id(role_id, now)?;
        self.touch(now);
        Ok(())
    }

    fn index_of(&self, number: u32) -> Option<usize> {
        let index = (number as usize).checked_sub(1)?;
        (index < self.steps.len()).then_some(index)
    }

    fn step_mut(&mut self, number: u32) -> Result<&mut WorkflowStepTemplate, WorkflowError> {
        let index = self.index_of(number).ok_or_else(|| self.missing_step(number))?;
        Ok(&mut self.steps[index])
    }

    fn missing_step(&self, number: u32) -> WorkflowError {
        WorkflowError::out_of_range(format!(
            "Template has no step number {} (it has {} steps)",
            number,
            self.steps.len()
        ))
    }

    fn renumber_from(&mut self, index: usize, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        for (i, step) in self.steps.iter_mut().enumerate().skip(index) {
            step.update_number(i as u32 + 1, now)?;
        }
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
