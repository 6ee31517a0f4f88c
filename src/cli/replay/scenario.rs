//! Scenario file format and the replay driver

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};

use crate::config::WorkflowConfig;
use crate::domain::{
    Candidate, Clock, Company, Employee, FixedClock, Role, SystemClock, Workflow, WorkflowError,
    WorkflowTemplate,
};
use crate::infrastructure::services::{CreateTemplateRequest, StepRequest, WorkflowService};

/// A hiring process described as data
///
/// Employees and roles are referred to by the `key` given in the file.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub company: String,
    #[serde(default)]
    pub roles: Vec<RoleSpec>,
    pub employees: Vec<EmployeeSpec>,
    pub candidate: String,
    pub template: TemplateSpec,
    /// Employee who starts the workflow
    pub author: String,
    /// Creation time; wall clock when absent
    #[serde(default)]
    pub start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actions: Vec<ScenarioAction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoleSpec {
    pub key: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeSpec {
    pub key: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TemplateSpec {
    pub name: String,
    pub description: String,
    pub steps: Vec<StepSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StepSpec {
    pub description: String,
    #[serde(default)]
    pub employee: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// One action plus the time it happens at
#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioAction {
    #[serde(default)]
    pub at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub action: Action,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Approve {
        employee: String,
        #[serde(default)]
        feedback: String,
    },
    Reject {
        employee: String,
        #[serde(default)]
        feedback: String,
    },
    Restart {
        employee: String,
    },
    Assign {
        employee: String,
    },
    AssignInStep {
        employee: String,
        step: u32,
    },
    Delegate {
        employee: String,
        delegate: String,
        step: u32,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
    },
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Approve { .. } => "approve",
            Self::Reject { .. } => "reject",
            Self::Restart { .. } => "restart",
            Self::Assign { .. } => "assign",
            Self::AssignInStep { .. } => "assign_in_step",
            Self::Delegate { .. } => "delegate",
        }
    }
}

/// What happened to one action
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub index: usize,
    pub action: &'static str,
    pub result: Result<Option<u32>, WorkflowError>,
}

#[derive(Debug)]
pub struct ReplayReport {
    pub template: WorkflowTemplate,
    pub workflow: Workflow,
    pub outcomes: Vec<ActionOutcome>,
}

impl ReplayReport {
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }
}

struct Directory {
    employees: HashMap<String, Employee>,
}

impl Directory {
    fn employee(&self, key: &str) -> anyhow::Result<&Employee> {
        self.employees
            .get(key)
            .ok_or_else(|| anyhow!("Unknown employee '{}'", key))
    }
}

/// Build the organization and workflow, then apply every action in order
///
/// Setup problems abort the replay. Refused actions are recorded and the
/// replay moves on to the next one.
pub fn replay(scenario: &Scenario, config: &WorkflowConfig) -> anyhow::Result<ReplayReport> {
    let company = Company::new(&scenario.company).context("Invalid company")?;

    let mut roles = HashMap::new();
    for spec in &scenario.roles {
        let role = Role::new(&spec.name, company.id())
            .with_context(|| format!("Invalid role '{}'", spec.key))?;
        roles.insert(spec.key.clone(), role);
    }

    let mut employees = HashMap::new();
    for spec in &scenario.employees {
        let role_id = match &spec.role {
            Some(key) => Some(lookup_role(&roles, key)?.id()),
            None => None,
        };
        let employee = Employee::new(&spec.name, company.id(), role_id)
            .with_context(|| format!("Invalid employee '{}'", spec.key))?;
        employees.insert(spec.key.clone(), employee);
    }
    let directory = Directory { employees };

    let candidate = Candidate::new(&scenario.candidate).context("Invalid candidate")?;

    let mut request = CreateTemplateRequest::new(
        &scenario.template.name,
        &scenario.template.description,
        company.id(),
    );
    for spec in &scenario.template.steps {
        request = request.with_step(StepRequest {
            description: spec.description.clone(),
            employee_id: spec
                .employee
                .as_deref()
                .map(|key| directory.employee(key).map(Employee::id))
                .transpose()?,
            role_id: spec
                .role
                .as_deref()
                .map(|key| lookup_role(&roles, key).map(Role::id))
                .transpose()?,
        });
    }

    let setup = WorkflowService::with_config(clock(scenario.start), config);
    let template = setup
        .create_template(request)
        .context("Failed to create template")?;
    let author = directory.employee(&scenario.author)?;
    let mut workflow = setup
        .instantiate(author, &candidate, &template)
        .context("Failed to create workflow")?;

    let mut outcomes = Vec::with_capacity(scenario.actions.len());
    for (index, step) in scenario.actions.iter().enumerate() {
        let service = WorkflowService::with_config(clock(step.at), config);
        let result = apply(&service, &mut workflow, &directory, &step.action)?;

        match &result {
            Ok(number) => info!(
                index,
                action = step.action.name(),
                step = ?number,
                status = %workflow.status(),
                "Action applied"
            ),
            Err(e) => warn!(
                index,
                action = step.action.name(),
                kind = %e.kind(),
                error = %e,
                "Action failed"
            ),
        }

        outcomes.push(ActionOutcome {
            index,
            action: step.action.name(),
            result,
        });
    }

    Ok(ReplayReport {
        template,
        workflow,
        outcomes,
    })
}

/// Unknown employee keys are setup errors; workflow refusals are outcomes
fn apply(
    service: &WorkflowService,
    workflow: &mut Workflow,
    directory: &Directory,
    action: &Action,
) -> anyhow::Result<Result<Option<u32>, WorkflowError>> {
    let result = match action {
        Action::Approve { employee, feedback } => service
            .approve(workflow, directory.employee(employee)?, feedback)
            .map(Some),
        Action::Reject { employee, feedback } => service
            .reject(workflow, directory.employee(employee)?, feedback)
            .map(Some),
        Action::Restart { employee } => service
            .restart(workflow, directory.employee(employee)?)
            .map(|_| None),
        Action::Assign { employee } => service
            .assign(workflow, directory.employee(employee)?)
            .map(Some),
        Action::AssignInStep { employee, step } => service
            .assign_in_step(workflow, directory.employee(employee)?, *step)
            .map(|_| Some(*step)),
        Action::Delegate {
            employee,
            delegate,
            step,
            starts_at,
            ends_at,
        } => service
            .delegate(
                workflow,
                directory.employee(employee)?,
                directory.employee(delegate)?,
                *starts_at,
                *ends_at,
                *step,
            )
            .map(|_| Some(*step)),
    };

    Ok(result)
}

fn lookup_role<'a>(roles: &'a HashMap<String, Role>, key: &str) -> anyhow::Result<&'a Role> {
    roles.get(key).ok_or_else(|| anyhow!("Unknown role '{}'", key))
}

fn clock(at: Option<DateTime<Utc>>) -> Arc<dyn Clock> {
    match at {
        Some(at) => Arc::new(FixedClock::new(at)),
        None => Arc::new(SystemClock),
    }
}
