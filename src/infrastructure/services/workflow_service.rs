//! Workflow service - template setup and workflow transitions

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::config::WorkflowConfig;
use crate::domain::workflow_template::DEFAULT_MIN_NAME_LENGTH;
use crate::domain::{
    Candidate, Clock, CompanyId, Employee, EmployeeId, ErrorKind, RoleId, Workflow, WorkflowError,
    WorkflowTemplate,
};

/// Request to create a template together with its steps
#[derive(Debug, Clone)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub description: String,
    pub company_id: CompanyId,
    pub steps: Vec<StepRequest>,
}

impl CreateTemplateRequest {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        company_id: CompanyId,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            company_id,
            steps: Vec::new(),
        }
    }

    pub fn with_steps(mut self, steps: Vec<StepRequest>) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_step(mut self, step: StepRequest) -> Self {
        self.steps.push(step);
        self
    }
}

/// One step of a [`CreateTemplateRequest`], appended in order
#[derive(Debug, Clone)]
pub struct StepRequest {
    pub description: String,
    pub employee_id: Option<EmployeeId>,
    pub role_id: Option<RoleId>,
}

impl StepRequest {
    pub fn for_employee(description: impl Into<String>, employee_id: EmployeeId) -> Self {
        Self {
            description: description.into(),
            employee_id: Some(employee_id),
            role_id: None,
        }
    }

    pub fn for_role(description: impl Into<String>, role_id: RoleId) -> Self {
        Self {
            description: description.into(),
            employee_id: None,
            role_id: Some(role_id),
        }
    }

    pub fn with_role(mut self, role_id: RoleId) -> Self {
        self.role_id = Some(role_id);
        self
    }
}

/// Runs workflow operations against the configured clock
///
/// Holds no workflow state; callers own the aggregates and must not run two
/// operations on the same workflow at once.
pub struct WorkflowService {
    clock: Arc<dyn Clock>,
    min_name_length: usize,
}

impl std::fmt::Debug for WorkflowService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowService")
            .field("min_name_length", &self.min_name_length)
            .finish()
    }
}

impl WorkflowService {
    /// Create a service with the default name length rule
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            min_name_length: DEFAULT_MIN_NAME_LENGTH,
        }
    }

    pub fn with_config(clock: Arc<dyn Clock>, config: &WorkflowConfig) -> Self {
        Self {
            clock,
            min_name_length: config.min_name_length,
        }
    }

    /// Create a template and append the requested steps in order
    #[instrument(skip_all, fields(company_id = %request.company_id))]
    pub fn create_template(
        &self,
        request: CreateTemplateRequest,
    ) -> Result<WorkflowTemplate, WorkflowError> {
        debug!(name = %request.name, steps = request.steps.len(), "Creating template");

        let now = self.clock.now();
        let mut template = WorkflowTemplate::create_with_min_name_length(
            &request.name,
            &request.description,
            request.company_id,
            self.min_name_length,
            now,
        )?;

        for step in &request.steps {
            template.add_step(&step.description, step.employee_id, step.role_id, now)?;
        }

        info!(
            template_id = %template.id(),
            steps = template.step_count(),
            "Template created"
        );

        Ok(template)
    }

    /// Start a workflow for `candidate` from a snapshot of `template`
    #[instrument(skip_all, fields(template_id = %template.id()))]
    pub fn instantiate(
        &self,
        author: &Employee,
        candidate: &Candidate,
        template: &WorkflowTemplate,
    ) -> Result<Workflow, WorkflowError> {
        debug!(author_id = %author.id(), candidate_id = %candidate.id(), "Creating workflow");

        let workflow = Workflow::create(author.id(), candidate.id(), template, self.clock.now())?;

        info!(
            workflow_id = %workflow.id(),
            steps = workflow.steps().len(),
            "Workflow created"
        );

        Ok(workflow)
    }

    #[instrument(skip_all, fields(workflow_id = %workflow.id(), employee_id = %employee.id()))]
    pub fn approve(
        &self,
        workflow: &mut Workflow,
        employee: &Employee,
        feedback: &str,
    ) -> Result<u32, WorkflowError> {
        debug!("Approving current step");

        let number = workflow
            .approve(employee, feedback, self.clock.now())
            .inspect_err(|e| log_refusal("approve", e))?;

        info!(step = number, status = %workflow.status(), "Step approved");
        Ok(number)
    }

    #[instrument(skip_all, fields(workflow_id = %workflow.id(), employee_id = %employee.id()))]
    pub fn reject(
        &self,
        workflow: &mut Workflow,
        employee: &Employee,
        feedback: &str,
    ) -> Result<u32, WorkflowError> {
        debug!("Rejecting current step");

        let number = workflow
            .reject(employee, feedback, self.clock.now())
            .inspect_err(|e| log_refusal("reject", e))?;

        warn!(step = number, status = %workflow.status(), "Step rejected");
        Ok(number)
    }

    #[instrument(skip_all, fields(workflow_id = %workflow.id(), employee_id = %employee.id()))]
    pub fn restart(&self, workflow: &mut Workflow, employee: &Employee) -> Result<(), WorkflowError> {
        debug!(status = %workflow.status(), "Restarting workflow");

        workflow
            .restart(employee, self.clock.now())
            .inspect_err(|e| log_refusal("restart", e))?;

        info!("Workflow restarted");
        Ok(())
    }

    /// Reassign the current step to `employee`
    #[instrument(skip_all, fields(workflow_id = %workflow.id(), employee_id = %employee.id()))]
    pub fn assign(&self, workflow: &mut Workflow, employee: &Employee) -> Result<u32, WorkflowError> {
        debug!("Assigning current step");

        let number = workflow
            .set_employee(employee, self.clock.now())
            .inspect_err(|e| log_refusal("assign", e))?;

        info!(step = number, "Step assigned");
        Ok(number)
    }

    #[instrument(skip_all, fields(workflow_id = %workflow.id(), employee_id = %employee.id()))]
    pub fn assign_in_step(
        &self,
        workflow: &mut Workflow,
        employee: &Employee,
        number: u32,
    ) -> Result<(), WorkflowError> {
        debug!(step = number, "Assigning step");

        workflow
            .set_employee_in_step(employee, number, self.clock.now())
            .inspect_err(|e| log_refusal("assign_in_step", e))?;

        info!(step = number, "Step assigned");
        Ok(())
    }

    /// Grant `delegate` the right to resolve step `number` during a window
    #[instrument(skip_all, fields(workflow_id = %workflow.id(), employee_id = %employee.id()))]
    pub fn delegate(
        &self,
        workflow: &mut Workflow,
        employee: &Employee,
        delegate: &Employee,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        number: u32,
    ) -> Result<(), WorkflowError> {
        debug!(step = number, delegate_id = %delegate.id(), "Delegating step");

        workflow
            .set_delegated_employee_in_step(
                employee,
                delegate,
                starts_at,
                ends_at,
                number,
                self.clock.now(),
            )
            .inspect_err(|e| log_refusal("delegate", e))?;

        info!(
            step = number,
            delegate_id = %delegate.id(),
            %starts_at,
            %ends_at,
            "Step delegated"
        );
        Ok(())
    }
}

fn log_refusal(operation: &str, error: &WorkflowError) {
    match error.kind() {
        ErrorKind::Unauthorized | ErrorKind::TerminalState | ErrorKind::StepTerminal => {
            warn!(operation, kind = %error.kind(), error = %error, "Transition refused");
        }
        _ => debug!(operation, kind = %error.kind(), error = %error, "Invalid request"),
    }
}
