//! Approval status shared by steps and workflows

use serde::{Deserialize, Serialize};

/// Where a step, or a whole workflow, stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    /// Waiting for a decision
    #[default]
    Expectation,
    /// Approved by an authorized employee
    Approved,
    /// Rejected by an authorized employee
    Rejected,
}

impl ApprovalStatus {
    /// Approved and Rejected only leave through a restart
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Expectation)
    }

    /// Derive a workflow status from its step statuses
    ///
    /// Any rejection wins, then all-approved, otherwise still pending. An
    /// empty input counts as approved.
    pub fn aggregate<I>(statuses: I) -> Self
    where
        I: IntoIterator<Item = ApprovalStatus>,
    {
        let mut all_approved = true;

        for status in statuses {
            match status {
                Self::Rejected => return Self::Rejected,
                Self::Expectation => all_approved = false,
                Self::Approved => {}
            }
        }

        if all_approved {
            Self::Approved
        } else {
            Self::Expectation
        }
    }
}

impl std::fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expectation => write!(f, "expectation"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}
