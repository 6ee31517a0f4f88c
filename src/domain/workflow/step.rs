//! Live workflow step and its state machine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::ApprovalStatus;
use crate::domain::error::WorkflowError;
use crate::domain::identity::{CandidateId, EmployeeId, RoleId};
use crate::domain::organization::Employee;
use crate::domain::workflow_template::WorkflowStepTemplate;

/// Time-boxed grant letting another employee resolve a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delegation {
    employee_id: EmployeeId,
    starts_at: DateTime<Utc>,
    ends_at: DateTime<Utc>,
}

impl Delegation {
    pub fn employee_id(&self) -> EmployeeId {
        self.employee_id
    }

    pub fn starts_at(&self) -> DateTime<Utc> {
        self.starts_at
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.ends_at
    }

    /// Both bounds are inclusive
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && now <= self.ends_at
    }
}

/// Who restarted a step last, and when
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartRecord {
    author_id: EmployeeId,
    restarted_at: DateTime<Utc>,
}

impl RestartRecord {
    pub fn author_id(&self) -> EmployeeId {
        self.author_id
    }

    pub fn restarted_at(&self) -> DateTime<Utc> {
        self.restarted_at
    }
}

/// One approval gate of a workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StepRecord")]
pub struct WorkflowStep {
    candidate_id: CandidateId,
    /// Copied from the template, never renumbered
    number: u32,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    employee_id: Option<EmployeeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role_id: Option<RoleId>,
    status: ApprovalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delegation: Option<Delegation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    restart: Option<RestartRecord>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Stored form of a workflow step, checked before it becomes one
#[derive(Deserialize)]
struct StepRecord {
    candidate_id: CandidateId,
    number: u32,
    description: String,
    #[serde(default)]
    employee_id: Option<EmployeeId>,
    #[serde(default)]
    role_id: Option<RoleId>,
    #[serde(default)]
    status: ApprovalStatus,
    #[serde(default)]
    feedback: Option<String>,
    #[serde(default)]
    delegation: Option<Delegation>,
    #[serde(default)]
    restart: Option<RestartRecord>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StepRecord> for WorkflowStep {
    type Error = WorkflowError;

    fn try_from(record: StepRecord) -> Result<Self, Self::Error> {
        let invalid = |what: &str| {
            WorkflowError::invalid_argument(format!("Step {} {}", record.number, what))
        };

        if record.candidate_id.is_nil() {
            return Err(invalid("has a nil candidate identifier"));
        }

        if record.number == 0 {
            return Err(invalid("is not a valid step number"));
        }

        if record.employee_id.is_none() && record.role_id.is_none() {
            return Err(invalid("must be assigned to an employee or a role"));
        }

        if record.employee_id.is_some_and(|id| id.is_nil())
            || record.role_id.is_some_and(|id| id.is_nil())
        {
            return Err(invalid("has a nil assignee"));
        }

        if let Some(delegation) = &record.delegation {
            if delegation.employee_id.is_nil() {
                return Err(invalid("is delegated to a nil employee"));
            }
            if delegation.starts_at >= delegation.ends_at {
                return Err(invalid("has a delegation that ends before it starts"));
            }
        }

        if record.restart.is_some_and(|r| r.author_id.is_nil()) {
            return Err(invalid("was restarted by a nil employee"));
        }

        if record.updated_at < record.created_at {
            return Err(invalid("was updated before it was created"));
        }

        Ok(Self {
            candidate_id: record.candidate_id,
            number: record.number,
            description: record.description,
            employee_id: record.employee_id,
            role_id: record.role_id,
            status: record.status,
            feedback: record.feedback,
            delegation: record.delegation,
            restart: record.restart,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

impl WorkflowStep {
    /// Snapshot a step template for one candidate
    pub(crate) fn create(
        candidate_id: CandidateId,
        template: &WorkflowStepTemplate,
        now: DateTime<Utc>,
    ) -> Result<Self, WorkflowError> {
        if candidate_id.is_nil() {
            return Err(WorkflowError::invalid_argument(format!(
                "{} is not a valid candidate identifier",
                candidate_id
            )));
        }

        if template.employee_id().is_none() && template.role_id().is_none() {
            return Err(WorkflowError::invalid_argument(format!(
                "Step {} must be assigned to an employee or a role",
                template.number()
            )));
        }

        assert!(template.number() >= 1, "step number must be positive");

        Ok(Self {
            candidate_id,
            number: template.number(),
            description: template.description().to_string(),
            employee_id: template.employee_id(),
            role_id: template.role_id(),
            status: ApprovalStatus::Expectation,
            feedback: None,
            delegation: None,
            restart: None,
            created_at: now,
            updated_at: now,
        })
    }

    // Getters

    pub fn candidate_id(&self) -> CandidateId {
        self.candidate_id
    }

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

    pub fn status(&self) -> ApprovalStatus {
        self.status
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub fn delegation(&self) -> Option<&Delegation> {
        self.delegation.as_ref()
    }

    pub fn delegated_employee_id(&self) -> Option<EmployeeId> {
        self.delegation.map(|d| d.employee_id)
    }

    pub fn delegate_start_time(&self) -> Option<DateTime<Utc>> {
        self.delegation.map(|d| d.starts_at)
    }

    pub fn delegate_end_time(&self) -> Option<DateTime<Utc>> {
        self.delegation.map(|d| d.ends_at)
    }

    pub fn restart_author_employee_id(&self) -> Option<EmployeeId> {
        self.restart.map(|r| r.author_id)
    }

    pub fn restart_date(&self) -> Option<DateTime<Utc>> {
        self.restart.map(|r| r.restarted_at)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether `employee` may approve or reject this step at `now`
    ///
    /// The assigned employee, any holder of the assigned role, or the
    /// delegate while the delegation window is open.
    pub fn is_authorized(&self, employee: &Employee, now: DateTime<Utc>) -> bool {
        let id = employee.id();

        if self.employee_id == Some(id) {
            return true;
        }

        if self.role_id.is_some() && employee.role_id() == self.role_id {
            return true;
        }

        self.delegation
            .is_some_and(|d| d.employee_id == id && d.is_active(now))
    }

    // Transitions

    pub fn approve(
        &mut self,
        employee: &Employee,
        feedback: &str,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        self.resolve(employee, ApprovalStatus::Approved, feedback, now)
    }

    pub fn reject(
        &mut self,
        employee: &Employee,
        feedback: &str,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        self.resolve(employee, ApprovalStatus::Rejected, feedback, now)
    }

    /// Send the step back to Expectation, recording who did it
    pub fn restart(&mut self, author_id: EmployeeId, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        if author_id.is_nil() {
            return Err(WorkflowError::invalid_argument(format!(
                "{} is not a valid employee identifier",
                author_id
            )));
        }

        self.status = ApprovalStatus::Expectation;
        self.restart = Some(RestartRecord {
            author_id,
            restarted_at: now,
        });
        self.touch(now);

        Ok(())
    }

    /// Assign the step to an employee
    ///
    /// The role binding and any delegation granted by the previous assignee
    /// are dropped.
    pub fn set_employee(&mut self, employee: &Employee, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        ensure_employee(employee)?;
        self.ensure_pending()?;

        self.employee_id = Some(employee.id());
        self.role_id = None;
        self.delegation = None;
        self.touch(now);

        Ok(())
    }

    /// Let `delegate` act for the assigned employee between `starts_at` and `ends_at`
    pub fn delegate(
        &mut self,
        employee: &Employee,
        delegate: &Employee,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Delegation, WorkflowError> {
        ensure_employee(employee)?;
        ensure_employee(delegate)?;

        if self.employee_id != Some(employee.id()) {
            return Err(WorkflowError::unauthorized(format!(
                "Only the employee assigned to step {} can delegate it",
                self.number
            )));
        }

        self.ensure_pending()?;

        if starts_at >= ends_at {
            return Err(WorkflowError::invalid_argument(
                "Delegation must start before it ends",
            ));
        }

        if starts_at < now || ends_at < now {
            return Err(WorkflowError::invalid_argument(
                "Delegation window cannot be in the past",
            ));
        }

        let delegation = Delegation {
            employee_id: delegate.id(),
            starts_at,
            ends_at,
        };
        self.delegation = Some(delegation);
        self.touch(now);

        Ok(delegation)
    }

    fn resolve(
        &mut self,
        employee: &Employee,
        outcome: ApprovalStatus,
        feedback: &str,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        ensure_employee(employee)?;

        if !self.is_authorized(employee, now) {
            return Err(WorkflowError::unauthorized(format!(
                "Employee {} cannot resolve step {}",
                employee.id(),
                self.number
            )));
        }

        self.ensure_pending()?;

        self.status = outcome;
        self.feedback = Some(feedback.trim().to_string()).filter(|f| !f.is_empty());
        self.touch(now);

        Ok(())
    }

    fn ensure_pending(&self) -> Result<(), WorkflowError> {
        if !self.status.is_pending() {
            return Err(WorkflowError::step_terminal(format!(
                "Step {} is already {}",
                self.number, self.status
            )));
        }
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

pub(super) fn ensure_employee(employee: &Employee) -> Result<(), WorkflowError> {
    if employee.id().is_nil() {
        return Err(WorkflowError::invalid_argument(format!(
            "{} is not a valid employee identifier",
            employee.id()
        )));
    }
    Ok(())
}
