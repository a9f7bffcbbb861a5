//! Status lifecycles for workflow-driven entities.
//!
//! Each status column is a closed enum with an explicit transition table of
//! `(from, action, to)` triples. A transition that is not in the table is illegal, which
//! makes every terminal state (a state with no outgoing edge) final. Handlers use
//! [`Lifecycle::apply`] to compute the next state, so illegal transitions never reach the
//! database. Repositories then write it with `UPDATE ... WHERE id = $1 AND status = $2`, so
//! when two requests race from the same state only one of them matches a row.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::errors::Error;

/// A status enum with a fixed transition table.
pub trait Lifecycle: Copy + Eq + fmt::Debug + 'static {
    type Action: Copy + Eq + fmt::Display + 'static;

    /// Human readable name of the entity, used in error messages
    const ENTITY: &'static str;

    /// Every legal `(from, action, to)` edge
    const TRANSITIONS: &'static [(Self, Self::Action, Self)];

    /// Compute the state reached by applying `action`, or reject the transition.
    fn apply(self, action: Self::Action) -> Result<Self, Error> {
        Self::TRANSITIONS
            .iter()
            .find(|(from, candidate, _)| *from == self && *candidate == action)
            .map(|(_, _, to)| *to)
            .ok_or_else(|| Error::InvalidTransition {
                resource: Self::ENTITY.to_string(),
                from: format!("{self:?}"),
                action: action.to_string(),
            })
    }

    /// A state is terminal when no transition leaves it.
    fn is_terminal(self) -> bool {
        !Self::TRANSITIONS.iter().any(|(from, _, _)| *from == self)
    }
}

/// HMO claim status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "claim_status")]
pub enum ClaimStatus {
    Pending,
    UnderRevision,
    Approved,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimAction {
    Review,
    Approve,
    Deny,
}

impl fmt::Display for ClaimAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimAction::Review => write!(f, "review"),
            ClaimAction::Approve => write!(f, "approve"),
            ClaimAction::Deny => write!(f, "deny"),
        }
    }
}

impl Lifecycle for ClaimStatus {
    type Action = ClaimAction;
    const ENTITY: &'static str = "claim";
    const TRANSITIONS: &'static [(Self, ClaimAction, Self)] = &[
        (ClaimStatus::Pending, ClaimAction::Review, ClaimStatus::UnderRevision),
        (ClaimStatus::Pending, ClaimAction::Approve, ClaimStatus::Approved),
        (ClaimStatus::Pending, ClaimAction::Deny, ClaimStatus::Denied),
        (ClaimStatus::UnderRevision, ClaimAction::Approve, ClaimStatus::Approved),
        (ClaimStatus::UnderRevision, ClaimAction::Deny, ClaimStatus::Denied),
    ];
}

/// HMO enrollment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "enrollment_status")]
pub enum EnrollmentStatus {
    Active,
    Terminated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentAction {
    Terminate,
}

impl fmt::Display for EnrollmentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnrollmentAction::Terminate => write!(f, "terminate"),
        }
    }
}

impl Lifecycle for EnrollmentStatus {
    type Action = EnrollmentAction;
    const ENTITY: &'static str = "enrollment";
    const TRANSITIONS: &'static [(Self, EnrollmentAction, Self)] =
        &[(EnrollmentStatus::Active, EnrollmentAction::Terminate, EnrollmentStatus::Terminated)];
}

/// Status shared by pay adjustment and grade revision requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "approval_status")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalAction {
    Approve,
    Deny,
}

impl fmt::Display for ApprovalAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalAction::Approve => write!(f, "approve"),
            ApprovalAction::Deny => write!(f, "deny"),
        }
    }
}

impl Lifecycle for ApprovalStatus {
    type Action = ApprovalAction;
    const ENTITY: &'static str = "request";
    const TRANSITIONS: &'static [(Self, ApprovalAction, Self)] = &[
        (ApprovalStatus::Pending, ApprovalAction::Approve, ApprovalStatus::Approved),
        (ApprovalStatus::Pending, ApprovalAction::Deny, ApprovalStatus::Denied),
    ];
}

/// Payroll run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payroll_run_status")]
pub enum PayrollRunStatus {
    Draft,
    Processing,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayrollAction {
    Process,
    Complete,
    Cancel,
}

impl fmt::Display for PayrollAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PayrollAction::Process => write!(f, "process"),
            PayrollAction::Complete => write!(f, "complete"),
            PayrollAction::Cancel => write!(f, "cancel"),
        }
    }
}

impl Lifecycle for PayrollRunStatus {
    type Action = PayrollAction;
    const ENTITY: &'static str = "payroll run";
    const TRANSITIONS: &'static [(Self, PayrollAction, Self)] = &[
        (PayrollRunStatus::Draft, PayrollAction::Process, PayrollRunStatus::Processing),
        (PayrollRunStatus::Processing, PayrollAction::Complete, PayrollRunStatus::Completed),
        (PayrollRunStatus::Draft, PayrollAction::Cancel, PayrollRunStatus::Cancelled),
        (PayrollRunStatus::Processing, PayrollAction::Cancel, PayrollRunStatus::Cancelled),
    ];
}

/// Optional note recorded with a status change. `reason` is accepted as an alias.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct TransitionNote {
    #[serde(alias = "reason")]
    pub comment: Option<String>,
}

impl TransitionNote {
    /// Trimmed comment, blank treated as absent
    pub fn comment(&self) -> Option<String> {
        self.comment.as_deref().map(str::trim).filter(|c| !c.is_empty()).map(str::to_string)
    }
}
