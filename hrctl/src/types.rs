//! Common type definitions and permission system types.
//!
//! This module defines:
//! - Type aliases for entity IDs (UserId, EmployeeId, etc.)
//! - Resource and operation enums for access control
//!
//! # ID Types
//!
//! All entity IDs are positive 64-bit integers generated by the database (`BIGSERIAL`).
//! The aliases exist so signatures say which table an id belongs to.
//!
//! # Permission System
//!
//! Authorization is expressed as `(Resource, Operation)` pairs, which the policy table in
//! [`crate::auth::permissions`] maps onto the set of roles allowed to perform them.
//!
//! Operations come in two flavors:
//! - **All**: Unrestricted access to all entities (e.g., `ReadAll`, `Create`)
//! - **Own**: Restricted to the caller's own records (e.g., `ReadOwn`, `CreateOwn`)

use std::fmt;

// Type aliases for IDs
pub type UserId = i64;
pub type EmployeeId = i64;
pub type DepartmentId = i64;
pub type BranchId = i64;
pub type PositionId = i64;
pub type SalaryId = i64;
pub type BonusId = i64;
pub type DeductionId = i64;
pub type BenefitCategoryId = i64;
pub type BenefitId = i64;
pub type BenefitAssignmentId = i64;
pub type PayrollRunId = i64;
pub type PayslipId = i64;
pub type HmoProviderId = i64;
pub type HmoPlanId = i64;
pub type EnrollmentId = i64;
pub type ClaimId = i64;
pub type SalaryGradeId = i64;
pub type PayBandId = i64;
pub type GradeMappingId = i64;
pub type PayAdjustmentId = i64;
pub type GradeRevisionId = i64;
pub type DocumentId = i64;

/// Parse a path segment as an entity id. Only strictly positive integers are ids.
pub fn parse_positive_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

// Operations that can be performed on resources
// *-All means unrestricted access, *-Own means restricted to the caller's own records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ReadAll,
    ReadOwn,
    Create,
    CreateOwn,
    Update,
    Delete,
    Approve,
}

// Resources that can be operated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Employees,
    Departments,
    Branches,
    Positions,
    Benefits,
    Salaries,
    Bonuses,
    Deductions,
    Payroll,
    HmoCatalog,
    HmoEnrollments,
    HmoClaims,
    Compensation,
    PayAdjustments,
    GradeRevisions,
    Documents,
    Analytics,
    Reports,
    Dashboard,
    Integrations,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::ReadAll | Operation::ReadOwn => write!(f, "read"),
            Operation::Create | Operation::CreateOwn => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
            Operation::Approve => write!(f, "approve"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Users => "users",
            Resource::Employees => "employees",
            Resource::Departments => "departments",
            Resource::Branches => "branches",
            Resource::Positions => "positions",
            Resource::Benefits => "benefits",
            Resource::Salaries => "salaries",
            Resource::Bonuses => "bonuses",
            Resource::Deductions => "deductions",
            Resource::Payroll => "payroll",
            Resource::HmoCatalog => "HMO providers and plans",
            Resource::HmoEnrollments => "HMO enrollments",
            Resource::HmoClaims => "HMO claims",
            Resource::Compensation => "compensation plans",
            Resource::PayAdjustments => "pay adjustments",
            Resource::GradeRevisions => "grade revisions",
            Resource::Documents => "documents",
            Resource::Analytics => "analytics",
            Resource::Reports => "reports",
            Resource::Dashboard => "the dashboard",
            Resource::Integrations => "integrations",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive_id() {
        assert_eq!(parse_positive_id("42"), Some(42));
        assert_eq!(parse_positive_id(" 7 "), Some(7));
        assert_eq!(parse_positive_id("0"), None);
        assert_eq!(parse_positive_id("-3"), None);
        assert_eq!(parse_positive_id("abc"), None);
        assert_eq!(parse_positive_id("1.5"), None);
        assert_eq!(parse_positive_id(""), None);
    }

    #[test]
    fn test_operation_display_groups_scopes() {
        assert_eq!(Operation::ReadAll.to_string(), "read");
        assert_eq!(Operation::ReadOwn.to_string(), "read");
        assert_eq!(Operation::CreateOwn.to_string(), "create");
        assert_eq!(Operation::Approve.to_string(), "approve");
    }
}
