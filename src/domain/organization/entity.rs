//! Organization entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{validate_person_name, OrganizationValidationError};
use crate::domain::identity::{CandidateId, CompanyId, EmployeeId, RoleId};

fn ensure_not_nil(nil: bool, what: &'static str) -> Result<(), OrganizationValidationError> {
    if nil {
        return Err(OrganizationValidationError::NilId(what));
    }
    Ok(())
}

/// Employee of a company, possibly holding a role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    id: EmployeeId,
    name: String,
    company_id: CompanyId,
    #[serde(skip_serializing_if = "Option::is_none")]
    role_id: Option<RoleId>,
    created_at: DateTime<Utc>,
}

impl Employee {
    /// Create a new employee with a fresh identifier
    pub fn new(
        name: impl Into<String>,
        company_id: CompanyId,
        role_id: Option<RoleId>,
    ) -> Result<Self, OrganizationValidationError> {
        Self::with_id(EmployeeId::new(), name, company_id, role_id)
    }

    /// Create an employee with a known identifier
    pub fn with_id(
        id: EmployeeId,
        name: impl Into<String>,
        company_id: CompanyId,
        role_id: Option<RoleId>,
    ) -> Result<Self, OrganizationValidationError> {
        let name = name.into();
        validate_person_name(&name)?;
        ensure_not_nil(id.is_nil(), "Employee")?;
        ensure_not_nil(company_id.is_nil(), "Company")?;

        if role_id.is_some_and(|r| r.is_nil()) {
            return Err(OrganizationValidationError::NilId("Role"));
        }

        Ok(Self {
            id,
            name: name.trim().to_string(),
            company_id,
            role_id,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> EmployeeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn role_id(&self) -> Option<RoleId> {
        self.role_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Person going through the hiring process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    id: CandidateId,
    name: String,
    created_at: DateTime<Utc>,
}

impl Candidate {
    pub fn new(name: impl Into<String>) -> Result<Self, OrganizationValidationError> {
        Self::with_id(CandidateId::new(), name)
    }

    pub fn with_id(
        id: CandidateId,
        name: impl Into<String>,
    ) -> Result<Self, OrganizationValidationError> {
        let name = name.into();
        validate_person_name(&name)?;
        ensure_not_nil(id.is_nil(), "Candidate")?;

        Ok(Self {
            id,
            name: name.trim().to_string(),
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> CandidateId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Company owning templates and workflows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    id: CompanyId,
    name: String,
    created_at: DateTime<Utc>,
}

impl Company {
    pub fn new(name: impl Into<String>) -> Result<Self, OrganizationValidationError> {
        Self::with_id(CompanyId::new(), name)
    }

    pub fn with_id(
        id: CompanyId,
        name: impl Into<String>,
    ) -> Result<Self, OrganizationValidationError> {
        let name = name.into();
        validate_person_name(&name)?;
        ensure_not_nil(id.is_nil(), "Company")?;

        Ok(Self {
            id,
            name: name.trim().to_string(),
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> CompanyId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Job position within a company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    id: RoleId,
    name: String,
    company_id: CompanyId,
    created_at: DateTime<Utc>,
}

impl Role {
    pub fn new(
        name: impl Into<String>,
        company_id: CompanyId,
    ) -> Result<Self, OrganizationValidationError> {
        Self::with_id(RoleId::new(), name, company_id)
    }

    pub fn with_id(
        id: RoleId,
        name: impl Into<String>,
        company_id: CompanyId,
    ) -> Result<Self, OrganizationValidationError> {
        let name = name.into();
        validate_person_name(&name)?;
        ensure_not_nil(id.is_nil(), "Role")?;
        ensure_not_nil(company_id.is_nil(), "Company")?;

        Ok(Self {
            id,
            name: name.trim().to_string(),
            company_id,
            created_at: Utc::now(),
        })
    }

    pub fn id(&self) -> RoleId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn company_id(&self) -> CompanyId {
        self.company_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
