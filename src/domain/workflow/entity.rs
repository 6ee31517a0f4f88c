//! Workflow aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::status::ApprovalStatus;
use super::step::{ensure_employee, Delegation, WorkflowStep};
use crate::domain::error::WorkflowError;
use crate::domain::identity::{CandidateId, CompanyId, EmployeeId, WorkflowId, WorkflowTemplateId};
use crate::domain::organization::Employee;
use crate::domain::workflow_template::{
    validate_description, validate_name, WorkflowTemplate, DEFAULT_MIN_NAME_LENGTH,
};

fn default_min_name_length() -> usize {
    DEFAULT_MIN_NAME_LENGTH
}

/// A candidate's run through a template
///
/// Steps are fixed when the workflow is created and kept in `number` order.
/// Approve, reject and assign act on the earliest step still in Expectation,
/// so later steps cannot be resolved before earlier ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WorkflowRecord")]
pub struct Workflow {
    id: WorkflowId,
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    feedback: Option<String>,
    template_id: WorkflowTemplateId,
    author_id: EmployeeId,
    candidate_id: CandidateId,
    company_id: CompanyId,
    steps: Vec<WorkflowStep>,
    /// Step that received the most recent delegation
    #[serde(skip_serializing_if = "Option::is_none")]
    delegated_step: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delegation: Option<Delegation>,
    min_name_length: usize,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Stored form of a workflow, checked before it becomes one
#[derive(Deserialize)]
struct WorkflowRecord {
    id: WorkflowId,
    name: String,
    description: String,
    #[serde(default)]
    feedback: Option<String>,
    template_id: WorkflowTemplateId,
    author_id: EmployeeId,
    candidate_id: CandidateId,
    company_id: CompanyId,
    steps: Vec<WorkflowStep>,
    #[serde(default)]
    delegated_step: Option<u32>,
    #[serde(default)]
    delegation: Option<Delegation>,
    #[serde(default = "default_min_name_length")]
    min_name_length: usize,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<WorkflowRecord> for Workflow {
    type Error = WorkflowError;

    fn try_from(record: WorkflowRecord) -> Result<Self, Self::Error> {
        let nil = [
            ("workflow", record.id.is_nil()),
            ("template", record.template_id.is_nil()),
            ("author", record.author_id.is_nil()),
            ("candidate", record.candidate_id.is_nil()),
            ("company", record.company_id.is_nil()),
        ];
        if let Some((what, _)) = nil.iter().find(|(_, is_nil)| *is_nil) {
            return Err(WorkflowError::invalid_argument(format!(
                "Workflow has a nil {} identifier",
                what
            )));
        }

        validate_name(&record.name, record.min_name_length)?;
        validate_description(&record.description)?;

        if record.steps.is_empty() {
            return Err(WorkflowError::empty_template("Workflow has no steps"));
        }

        if !record
            .steps
            .windows(2)
            .all(|w| w[0].number() < w[1].number())
        {
            return Err(WorkflowError::invalid_argument(
                "Workflow steps must be unique and sorted by number",
            ));
        }

        if let Some(step) = record
            .steps
            .iter()
            .find(|s| s.candidate_id() != record.candidate_id)
        {
            return Err(WorkflowError::invalid_argument(format!(
                "Step {} belongs to another candidate",
                step.number()
            )));
        }

        match (record.delegated_step, &record.delegation) {
            (None, None) => {}
            (Some(number), Some(_)) if record.steps.iter().any(|s| s.number() == number) => {}
            _ => {
                return Err(WorkflowError::invalid_argument(
                    "Workflow delegation must name one of its steps",
                ));
            }
        }

        if record.updated_at < record.created_at {
            return Err(WorkflowError::invalid_argument(
                "Workflow was updated before it was created",
            ));
        }

        Ok(Self {
            id: record.id,
            name: record.name,
            description: record.description,
            feedback: record.feedback,
            template_id: record.template_id,
            author_id: record.author_id,
            candidate_id: record.candidate_id,
            company_id: record.company_id,
            steps: record.steps,
            delegated_step: record.delegated_step,
            delegation: record.delegation,
            min_name_length: record.min_name_length,
            created_at: record.created_at,
            updated_at: record.updated_at,
        })
    }
}

impl Workflow {
    /// Instantiate a workflow for a candidate from a template snapshot
    ///
    /// Either every step is created or no workflow is returned.
    pub fn create(
        author_id: EmployeeId,
        candidate_id: CandidateId,
        template: &WorkflowTemplate,
        now: DateTime<Utc>,
    ) -> Result<Self, WorkflowError> {
        if author_id.is_nil() {
            return Err(WorkflowError::invalid_argument(format!(
                "{} is not a valid employee identifier",
                author_id
            )));
        }

        if candidate_id.is_nil() {
            return Err(WorkflowError::invalid_argument(format!(
                "{} is not a valid candidate identifier",
                candidate_id
            )));
        }

        validate_name(template.name(), template.min_name_length())?;

        if template.is_empty() {
            return Err(WorkflowError::empty_template(format!(
                "Template '{}' has no steps",
                template.name()
            )));
        }

        let mut steps = template
            .steps()
            .iter()
            .map(|step| WorkflowStep::create(candidate_id, step, now))
            .collect::<Result<Vec<_>, _>>()?;
        steps.sort_by_key(|s| s.number());

        Ok(Self::from_parts(
            WorkflowId::new(),
            template,
            author_id,
            candidate_id,
            steps,
            now,
        ))
    }

    fn from_parts(
        id: WorkflowId,
        template: &WorkflowTemplate,
        author_id: EmployeeId,
        candidate_id: CandidateId,
        steps: Vec<WorkflowStep>,
        now: DateTime<Utc>,
    ) -> Self {
        assert!(!id.is_nil(), "workflow id cannot be nil");
        assert!(!author_id.is_nil(), "workflow author cannot be nil");
        assert!(!candidate_id.is_nil(), "workflow candidate cannot be nil");
        assert!(!template.id().is_nil(), "workflow template id cannot be nil");
        assert!(!template.company_id().is_nil(), "workflow company cannot be nil");
        assert!(!steps.is_empty(), "workflow must have steps");
        assert!(
            steps.windows(2).all(|w| w[0].number() < w[1].number()),
            "workflow step numbers must be unique and ordered"
        );

        Self {
            id,
            name: template.name().to_string(),
            description: template.description().to_string(),
            feedback: None,
            template_id: template.id(),
            author_id,
            candidate_id,
            company_id: template.company_id(),
            steps,
            delegated_step: None,
            delegation: None,
            min_name_length: template.min_name_length(),
            created_at: now,
            updated_at: now,
        }
    }

    // Getters

    pub fn id(&self) -> WorkflowId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    pub fn template_id(&self) -> WorkflowTemplateId {
        self.template_id
    }

    pub fn author_id(&self) -> EmployeeId {
        self.author_id
    }

    pub fn candidate_id(&self) -> CandidateId {
        self.candidate_id
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    /// Steps in `number` order
    pub fn steps(&self) -> &[WorkflowStep] {
        &self.steps
    }

    pub fn step(&self, number: u32) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.number() == number)
    }

    /// The earliest step still waiting for a decision
    pub fn current_step(&self) -> Option<&WorkflowStep> {
        self.current_index().map(|i| &self.steps[i])
    }

    /// Most recent delegation and the step it was granted on
    pub fn last_delegation(&self) -> Option<(u32, &Delegation)> {
        self.delegated_step.zip(self.delegation.as_ref())
    }

    /// Derived from the steps on every call
    pub fn status(&self) -> ApprovalStatus {
        ApprovalStatus::aggregate(self.steps.iter().map(|s| s.status()))
    }

    pub fn is_finished(&self) -> bool {
        self.status().is_terminal()
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

    pub fn set_feedback(&mut self, feedback: Option<&str>, now: DateTime<Utc>) {
        self.feedback = feedback
            .map(str::trim)
            .filter(|f| !f.is_empty())
            .map(str::to_string);
        self.touch(now);
    }

    /// Approve the current step, returning its number
    pub fn approve(
        &mut self,
        employee: &Employee,
        feedback: &str,
        now: DateTime<Utc>,
    ) -> Result<u32, WorkflowError> {
        ensure_employee(employee)?;

        match self.status() {
            ApprovalStatus::Rejected => {
                return Err(WorkflowError::terminal_state(
                    "A rejected workflow cannot be approved",
                ));
            }
            ApprovalStatus::Approved => return Err(self.finished()),
            ApprovalStatus::Expectation => {}
        }

        let index = self.current_index().ok_or_else(|| self.finished())?;
        self.steps[index].approve(employee, feedback, now)?;
        self.touch(now);

        Ok(self.steps[index].number())
    }

    /// Reject the current step, returning its number
    pub fn reject(
        &mut self,
        employee: &Employee,
        feedback: &str,
        now: DateTime<Utc>,
    ) -> Result<u32, WorkflowError> {
        ensure_employee(employee)?;
        self.ensure_pending()?;

        let index = self.current_index().ok_or_else(|| self.finished())?;
        self.steps[index].reject(employee, feedback, now)?;
        self.touch(now);

        Ok(self.steps[index].number())
    }

    /// Send every step back to Expectation
    pub fn restart(&mut self, employee: &Employee, now: DateTime<Utc>) -> Result<(), WorkflowError> {
        ensure_employee(employee)?;

        for step in &mut self.steps {
            step.restart(employee.id(), now)?;
        }
        self.touch(now);

        Ok(())
    }

    /// Assign the current step to `employee`, returning its number
    pub fn set_employee(&mut self, employee: &Employee, now: DateTime<Utc>) -> Result<u32, WorkflowError> {
        ensure_employee(employee)?;
        self.ensure_pending()?;

        let index = self.current_index().ok_or_else(|| self.finished())?;
        self.steps[index].set_employee(employee, now)?;
        let number = self.steps[index].number();
        self.forget_delegation(number);
        self.touch(now);

        Ok(number)
    }

    /// Assign step `number` to `employee`
    pub fn set_employee_in_step(
        &mut self,
        employee: &Employee,
        number: u32,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        ensure_employee(employee)?;
        self.ensure_pending()?;

        let index = self.index_of(number)?;
        self.steps[index].set_employee(employee, now)?;
        self.forget_delegation(number);
        self.touch(now);

        Ok(())
    }

    /// Let `delegate` resolve step `number` on behalf of its assigned employee
    pub fn set_delegated_employee_in_step(
        &mut self,
        employee: &Employee,
        delegate: &Employee,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        number: u32,
        now: DateTime<Utc>,
    ) -> Result<(), WorkflowError> {
        let index = self.index_of(number)?;
        let delegation = self.steps[index].delegate(employee, delegate, starts_at, ends_at, now)?;

        self.delegated_step = Some(number);
        self.delegation = Some(delegation);
        self.touch(now);

        Ok(())
    }

    fn current_index(&self) -> Option<usize> {
        self.steps
            .iter()
            .enumerate()
            .filter(|(_, s)| s.status().is_pending())
            .min_by_key(|(_, s)| s.number())
            .map(|(i, _)| i)
    }

    fn index_of(&self, number: u32) -> Result<usize, WorkflowError> {
        self.steps
            .iter()
            .position(|s| s.number() == number)
            .ok_or_else(|| {
                WorkflowError::out_of_range(format!("Workflow has no step number {}", number))
            })
    }

    /// Reassignment revokes the step's delegation
    fn forget_delegation(&mut self, number: u32) {
        if self.delegated_step == Some(number) {
            self.delegated_step = None;
            self.delegation = None;
        }
    }

        fn ensure_pending(&self) -> Result<(), WorkflowError> {
        if self.status() != ApprovalStatus::Expectation {
            return Err(self.finished());
        }
        Ok(())
    }

    fn finished(&self) -> WorkflowError {
        WorkflowError::terminal_state(format!(
            "Workflow {} is already {}",
            self.id,
            self.status()
        ))
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorKind;
    use crate::domain::identity::RoleId;
    use chrono::{Duration, TimeZone};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 20, hour, 0, 0).unwrap()
    }

    fn employee(company_id: CompanyId, role_id: Option<RoleId>) -> Employee {
        Employee::new("Pavel Orlov", company_id, role_id).unwrap()
    }

    fn nil_employee() -> Employee {
        serde_json::from_value(serde_json::json!({
            "id": "00000000-0000-0000-0000-000000000000",
            "name": "Ghost",
            "company_id": CompanyId::new(),
            "created_at": at(8),
        }))
        .unwrap()
    }

    struct Fixture {
        company_id: CompanyId,
        interviewer: Employee,
        role_id: RoleId,
        lead: Employee,
        template: WorkflowTemplate,
    }

    /// Template with `[{employee: interviewer}, {role: lead's role}]`
    fn fixture() -> Fixture {
        let company_id = CompanyId::new();
        let role_id = RoleId::new();
        let interviewer = employee(company_id, None);
        let lead = employee(company_id, Some(role_id));

        let mut template =
            WorkflowTemplate::create("Backend hiring", "Interviews", company_id, at(7)).unwrap();
        template
            .add_step("Technical interview", Some(interviewer.id()), None, at(7))
            .unwrap();
        template
            .add_step("Team lead review", None, Some(role_id), at(7))
            .unwrap();

        Fixture {
            company_id,
            interviewer,
            role_id,
            lead,
            template,
        }
    }

    fn create_workflow(f: &Fixture) -> Workflow {
        Workflow::create(EmployeeId::new(), CandidateId::new(), &f.template, at(8)).unwrap()
    }

    fn statuses(workflow: &Workflow) -> Vec<ApprovalStatus> {
        workflow.steps().iter().map(|s| s.status()).collect()
    }

    #[test]
    fn test_create_snapshots_template() {
        let f = fixture();
        let author_id = EmployeeId::new();
        let candidate_id = CandidateId::new();

        let workflow = Workflow::create(author_id, candidate_id, &f.template, at(8)).unwrap();

        assert_eq!(workflow.name(), "Backend hiring");
        assert_eq!(workflow.description(), "Interviews");
        assert_eq!(workflow.template_id(), f.template.id());
        assert_eq!(workflow.company_id(), f.company_id);
        assert_eq!(workflow.author_id(), author_id);
        assert_eq!(workflow.candidate_id(), candidate_id);
        assert_eq!(workflow.steps().len(), 2);
        assert_eq!(workflow.step(1).unwrap().employee_id(), Some(f.interviewer.id()));
        assert_eq!(workflow.step(2).unwrap().role_id(), Some(f.role_id));
        assert!(workflow.steps().iter().all(|s| s.candidate_id() == candidate_id));
        assert_eq!(workflow.status(), ApprovalStatus::Expectation);
        assert_eq!(workflow.created_at(), at(8));
        assert_eq!(workflow.updated_at(), at(8));
    }

    #[test]
    fn test_create_invalid_inputs() {
        let f = fixture();

        let err = Workflow::create(EmployeeId::nil(), CandidateId::new(), &f.template, at(8))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.message().contains("employee identifier"));

        let err = Workflow::create(EmployeeId::new(), CandidateId::nil(), &f.template, at(8))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(err.message().contains("candidate identifier"));
    }

    #[test]
    fn test_broken_templates_never_reach_create() {
        let f = fixture();
        let value = serde_json::to_value(&f.template).unwrap();

        let mut unassigned = value.clone();
        unassigned["steps"][1]
            .as_object_mut()
            .unwrap()
            .remove("role_id");
        assert!(serde_json::from_value::<WorkflowTemplate>(unassigned).is_err());

        let mut duplicated = value;
        duplicated["steps"][1]["number"] = serde_json::json!(1);
        assert!(serde_json::from_value::<WorkflowTemplate>(duplicated).is_err());
    }

    #[test]
    fn test_create_from_empty_template() {
        let template =
            WorkflowTemplate::create("Backend hiring", "Interviews", CompanyId::new(), at(7))
                .unwrap();

        let err = Workflow::create(EmployeeId::new(), CandidateId::new(), &template, at(8))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyTemplate);
    }

    #[test]
    fn test_create_from_template_with_short_name() {
        let mut template = WorkflowTemplate::create_with_min_name_length(
            "QA",
            "Interviews",
            CompanyId::new(),
            2,
            at(7),
        )
        .unwrap();
        template
            .add_step("Test task", None, Some(RoleId::new()), at(7))
            .unwrap();

        let mut workflow =
            Workflow::create(EmployeeId::new(), CandidateId::new(), &template, at(8)).unwrap();
        assert_eq!(workflow.name(), "QA");

        assert!(workflow.update_info(Some("A"), None, at(9)).is_err());
    }

    #[test]
    fn test_later_template_edits_do_not_affect_workflow() {
        let mut f = fixture();
        let workflow = create_workflow(&f);

        f.template.remove_step(1, at(9)).unwrap();
        f.template.update_step_info(1, "Changed", at(9)).unwrap();

        assert_eq!(workflow.steps().len(), 2);
        assert_eq!(workflow.step(2).unwrap().description(), "Team lead review");
    }

    #[test]
    fn test_end_to_end_approval() {
        let f = fixture();
        let mut workflow = create_workflow(&f);

        assert_eq!(workflow.approve(&f.interviewer, "ok", at(9)).unwrap(), 1);
        assert_eq!(workflow.step(1).unwrap().status(), ApprovalStatus::Approved);
        assert_eq!(workflow.status(), ApprovalStatus::Expectation);
        assert_eq!(workflow.updated_at(), at(9));

        assert_eq!(workflow.approve(&f.lead, "ok", at(10)).unwrap(), 2);
        assert_eq!(workflow.status(), ApprovalStatus::Approved);
        assert!(workflow.is_finished());
        assert!(workflow.current_step().is_none());

        let err = workflow.approve(&f.lead, "ok", at(11)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TerminalState);
        assert_eq!(workflow.updated_at(), at(10));
    }

    #[test]
    fn test_sequential_gating() {
        let f = fixture();
        let mut workflow = create_workflow(&f);

        // the role holder cannot jump ahead to step 2
        let err = workflow.approve(&f.lead, "ok", at(9)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(
            statuses(&workflow),
            vec![ApprovalStatus::Expectation, ApprovalStatus::Expectation]
        );
        assert_eq!(workflow.current_step().unwrap().number(), 1);
        assert_eq!(workflow.updated_at(), at(8));
    }

    #[test]
    fn test_gating_over_many_steps() {
        let company_id = CompanyId::new();
        let actor = employee(company_id, None);
        let mut template =
            WorkflowTemplate::create("Long process", "Five steps", company_id, at(7)).unwrap();
        for i in 0..5 {
            template
                .add_step(&format!("Step {}", i + 1), Some(actor.id()), None, at(7))
                .unwrap();
        }
        let mut workflow =
            Workflow::create(EmployeeId::new(), CandidateId::new(), &template, at(8)).unwrap();

        for expected in 1..=5 {
            assert_eq!(workflow.current_step().unwrap().number(), expected);
            assert_eq!(workflow.approve(&actor, "ok", at(9)).unwrap(), expected);
        }
        assert_eq!(workflow.status(), ApprovalStatus::Approved);
    }

    #[test]
    fn test_reject_finishes_workflow() {
        let f = fixture();
        let mut workflow = create_workflow(&f);

        workflow.approve(&f.interviewer, "ok", at(9)).unwrap();
        assert_eq!(workflow.reject(&f.lead, "no", at(10)).unwrap(), 2);

        assert_eq!(workflow.status(), ApprovalStatus::Rejected);
        assert_eq!(workflow.step(2).unwrap().feedback(), Some("no"));

        let err = workflow.reject(&f.lead, "again", at(11)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TerminalState);
    }

    #[test]
    fn test_rejected_workflow_cannot_be_approved() {
        let f = fixture();
        let mut workflow = create_workflow(&f);
        workflow.reject(&f.interviewer, "no", at(9)).unwrap();

        assert_eq!(
            statuses(&workflow),
            vec![ApprovalStatus::Rejected, ApprovalStatus::Expectation]
        );
        assert_eq!(workflow.status(), ApprovalStatus::Rejected);

        let err = workflow.approve(&f.lead, "ok", at(10)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TerminalState);
        assert_eq!(err.message(), "A rejected workflow cannot be approved");
    }

    #[test]
    fn test_nil_employee_is_invalid() {
        let f = fixture();
        let mut workflow = create_workflow(&f);
        let ghost = nil_employee();

        assert_eq!(
            workflow.approve(&ghost, "ok", at(9)).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            workflow.reject(&ghost, "no", at(9)).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            workflow.restart(&ghost, at(9)).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            workflow.set_employee(&ghost, at(9)).unwrap_err().kind(),
            ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn test_restart_reopens_all_steps() {
        let f = fixture();
        let mut workflow = create_workflow(&f);
        workflow.approve(&f.interviewer, "ok", at(9)).unwrap();
        workflow.reject(&f.lead, "no", at(10)).unwrap();

        let hr = employee(f.company_id, None);
        workflow.restart(&hr, at(11)).unwrap();

        assert_eq!(workflow.status(), ApprovalStatus::Expectation);
        for step in workflow.steps() {
            assert_eq!(step.status(), ApprovalStatus::Expectation);
            assert_eq!(step.restart_author_employee_id(), Some(hr.id()));
            assert_eq!(step.restart_date(), Some(at(11)));
        }
        assert_eq!(workflow.updated_at(), at(11));

        assert_eq!(workflow.approve(&f.interviewer, "second look", at(12)).unwrap(), 1);
    }

    #[test]
    fn test_set_employee_targets_current_step() {
        let f = fixture();
        let mut workflow = create_workflow(&f);
        workflow.approve(&f.interviewer, "ok", at(9)).unwrap();

        let replacement = employee(f.company_id, None);
        assert_eq!(workflow.set_employee(&replacement, at(10)).unwrap(), 2);

        let step = workflow.step(2).unwrap();
        assert_eq!(step.employee_id(), Some(replacement.id()));
        assert!(step.role_id().is_none());

        // role holder lost access once the step was reassigned
        let err = workflow.approve(&f.lead, "ok", at(11)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        workflow.approve(&replacement, "ok", at(11)).unwrap();
        assert_eq!(workflow.status(), ApprovalStatus::Approved);
    }

    #[test]
    fn test_set_employee_on_finished_workflow() {
        let f = fixture();
        let mut workflow = create_workflow(&f);
        workflow.reject(&f.interviewer, "no", at(9)).unwrap();

        let err = workflow
            .set_employee(&employee(f.company_id, None), at(10))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TerminalState);

        let err = workflow
            .set_employee_in_step(&employee(f.company_id, None), 2, at(10))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TerminalState);
    }

    #[test]
    fn test_set_employee_in_step() {
        let f = fixture();
        let mut workflow = create_workflow(&f);
        let replacement = employee(f.company_id, None);

        workflow.set_employee_in_step(&replacement, 2, at(9)).unwrap();
        assert_eq!(workflow.step(2).unwrap().employee_id(), Some(replacement.id()));
        assert_eq!(workflow.step(2).unwrap().role_id(), None);

        let err = workflow
            .set_employee_in_step(&replacement, 3, at(9))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn test_set_employee_in_resolved_step() {
        let f = fixture();
        let mut workflow = create_workflow(&f);
        workflow.approve(&f.interviewer, "ok", at(9)).unwrap();

        let err = workflow
            .set_employee_in_step(&employee(f.company_id, None), 1, at(10))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StepTerminal);
    }

    #[test]
    fn test_delegation_window() {
        let f = fixture();
        let mut workflow = create_workflow(&f);
        let deputy = employee(f.company_id, None);

        workflow
            .set_delegated_employee_in_step(&f.interviewer, &deputy, at(10), at(12), 1, at(9))
            .unwrap();

        let (number, delegation) = workflow.last_delegation().unwrap();
        assert_eq!(number, 1);
        assert_eq!(delegation.employee_id(), deputy.id());
        assert_eq!(delegation.starts_at(), at(10));
        assert_eq!(delegation.ends_at(), at(12));

        let err = workflow
            .approve(&deputy, "too late", at(12) + Duration::minutes(1))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);

        workflow.approve(&deputy, "on behalf", at(11)).unwrap();
        assert_eq!(workflow.step(1).unwrap().status(), ApprovalStatus::Approved);
    }

    #[test]
    fn test_role_only_assignee_cannot_delegate() {
        let f = fixture();
        let mut workflow = create_workflow(&f);

        let err = workflow
            .set_delegated_employee_in_step(
                &f.lead,
                &employee(f.company_id, None),
                at(10),
                at(12),
                2,
                at(9),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert!(workflow.last_delegation().is_none());
    }

    #[test]
    fn test_delegation_to_missing_step() {
        let f = fixture();
        let mut workflow = create_workflow(&f);

        let err = workflow
            .set_delegated_employee_in_step(
                &f.interviewer,
                &employee(f.company_id, None),
                at(10),
                at(12),
                7,
                at(9),
            )
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OutOfRange);
    }

    #[test]
    fn test_update_info() {
        let f = fixture();
        let mut workflow = create_workflow(&f);

        workflow
            .update_info(Some(" Senior backend "), Some(" Three rounds "), at(9))
            .unwrap();
        assert_eq!(workflow.name(), "Senior backend");
        assert_eq!(workflow.description(), "Three rounds");
        assert_eq!(workflow.updated_at(), at(9));

        workflow
            .update_info(Some("Senior backend"), Some("Three rounds"), at(10))
            .unwrap();
        assert_eq!(workflow.updated_at(), at(9));

        let err = workflow.update_info(Some(""), None, at(11)).unwrap_err();
        assert_eq!(err.message(), "Name cannot be empty");
        assert_eq!(f.template.name(), "Backend hiring");
    }

    #[test]
    fn test_set_feedback() {
        let f = fixture();
        let mut workflow = create_workflow(&f);

        workflow.set_feedback(Some(" Strong candidate "), at(9));
        assert_eq!(workflow.feedback(), Some("Strong candidate"));

        workflow.set_feedback(None, at(10));
        assert!(workflow.feedback().is_none());
    }

    #[test]
    fn test_workflow_serialization() {
        let f = fixture();
        let mut workflow = create_workflow(&f);
        workflow.approve(&f.interviewer, "ok", at(9)).unwrap();

        let json = serde_json::to_string_pretty(&workflow).unwrap();
        assert!(json.contains("\"status\": \"approved\""));
        assert!(json.contains("\"status\": \"expectation\""));

        let deserialized: Workflow = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, workflow);
        assert_eq!(deserialized.status(), ApprovalStatus::Expectation);
    }

    #[test]
    fn test_reassignment_clears_workflow_delegation() {
        let f = fixture();
        let mut workflow = create_workflow(&f);
        let deputy = employee(f.company_id, None);
        let successor = employee(f.company_id, None);

        workflow
            .set_delegated_employee_in_step(&f.interviewer, &deputy, at(10), at(12), 1, at(9))
            .unwrap();
        workflow.set_employee_in_step(&successor, 1, at(10)).unwrap();

        assert!(workflow.last_delegation().is_none());
        assert!(workflow.step(1).unwrap().delegation().is_none());
        let err = workflow.approve(&deputy, "on behalf", at(11)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }

    #[test]
    fn test_delegate_rejects_within_window() {
        let f = fixture();
        let mut workflow = create_workflow(&f);
        let deputy = employee(f.company_id, None);
        workflow
            .set_delegated_employee_in_step(&f.interviewer, &deputy, at(10), at(12), 1, at(9))
            .unwrap();

        let err = workflow.reject(&deputy, "too late", at(13)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(workflow.status(), ApprovalStatus::Expectation);

        assert_eq!(workflow.reject(&deputy, "not a fit", at(10)).unwrap(), 1);
        assert_eq!(workflow.status(), ApprovalStatus::Rejected);
    }

    fn serialized_workflow() -> serde_json::Value {
        let f = fixture();
        let mut workflow = create_workflow(&f);
        workflow
            .set_delegated_employee_in_step(
                &f.interviewer,
                &employee(f.company_id, None),
                at(10),
                at(12),
                1,
                at(9),
            )
            .unwrap();
        serde_json::to_value(&workflow).unwrap()
    }

    #[test]
    fn test_deserialize_keeps_delegation() {
        let value = serialized_workflow();
        let workflow: Workflow = serde_json::from_value(value).unwrap();

        let (number, _) = workflow.last_delegation().unwrap();
        assert_eq!(number, 1);
    }

    #[test]
    fn test_deserialize_rejects_empty_steps() {
        let mut value = serialized_workflow();
        value["steps"] = serde_json::json!([]);
        value.as_object_mut().unwrap().remove("delegated_step");
        value.as_object_mut().unwrap().remove("delegation");

        let err = serde_json::from_value::<Workflow>(value).unwrap_err();
        assert!(err.to_string().contains("Workflow has no steps"));
    }

    #[test]
    fn test_deserialize_rejects_unordered_steps() {
        let mut duplicated = serialized_workflow();
        duplicated["steps"][1]["number"] = serde_json::json!(1);
        let err = serde_json::from_value::<Workflow>(duplicated).unwrap_err();
        assert!(err.to_string().contains("unique and sorted"));

        let mut reversed = serialized_workflow();
        reversed["steps"].as_array_mut().unwrap().reverse();
        assert!(serde_json::from_value::<Workflow>(reversed).is_err());
    }

    #[test]
    fn test_deserialize_rejects_nil_ids() {
        for field in ["id", "template_id", "author_id", "candidate_id", "company_id"] {
            let mut value = serialized_workflow();
            value[field] = serde_json::json!(WorkflowId::nil());

            let err = serde_json::from_value::<Workflow>(value).unwrap_err();
            assert!(err.to_string().contains("nil"), "{}: {}", field, err);
        }
    }

    #[test]
    fn test_deserialize_rejects_foreign_step() {
        let mut value = serialized_workflow();
        value["steps"][1]["candidate_id"] = serde_json::json!(CandidateId::new());

        let err = serde_json::from_value::<Workflow>(value).unwrap_err();
        assert!(err.to_string().contains("belongs to another candidate"));
    }

    #[test]
    fn test_deserialize_rejects_dangling_delegation() {
        let mut missing_step = serialized_workflow();
        missing_step["delegated_step"] = serde_json::json!(7);
        assert!(serde_json::from_value::<Workflow>(missing_step).is_err());

        let mut unpaired = serialized_workflow();
        unpaired.as_object_mut().unwrap().remove("delegation");
        assert!(serde_json::from_value::<Workflow>(unpaired).is_err());
    }
}
