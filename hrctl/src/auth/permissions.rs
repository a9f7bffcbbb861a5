//! Role based access control.
//!
//! [`POLICY`] maps every `(resource, operation)` pair onto the roles allowed to perform it.
//! `System Admin` is allowed everything and never appears in the table. Handlers state
//! their requirement as a [`RequiresPermission`] extractor argument, which rejects the
//! request with 403 before the handler body runs.
//!
//! "Own" operations (`ReadOwn`, `CreateOwn`) additionally require that the record belongs
//! to the caller's linked employee; handlers check that with [`require_read`] or
//! [`require_create`] once they know the record's owner.

use std::{marker::PhantomData, ops::Deref};

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    AppState,
    api::models::users::{CurrentUser, Role},
    errors::Error,
    types::{EmployeeId, Operation, Resource},
};

use Operation::*;
use Resource::*;

const HRM: Role = Role::HrManager;
const HRS: Role = Role::HrStaff;
const PO: Role = Role::PayrollOfficer;
const MGR: Role = Role::Manager;
const EMP: Role = Role::Employee;

const EVERYONE: &[Role] = &[HRM, HRS, PO, MGR, EMP];
const HR: &[Role] = &[HRM, HRS];
const PAYROLL: &[Role] = &[HRM, PO];

/// Which roles may perform each operation. Pairs missing from the table are admin only.
pub const POLICY: &[(Resource, Operation, &[Role])] = &[
    (Users, ReadAll, &[HRM]),
    (Employees, ReadAll, &[HRM, HRS, PO, MGR]),
    (Employees, ReadOwn, EVERYONE),
    (Employees, Create, HR),
    (Employees, Update, HR),
    (Employees, Delete, &[HRM]),
    (Departments, ReadAll, EVERYONE),
    (Departments, Create, HR),
    (Departments, Update, HR),
    (Departments, Delete, &[HRM]),
    (Branches, ReadAll, EVERYONE),
    (Branches, Create, HR),
    (Branches, Update, HR),
    (Branches, Delete, &[HRM]),
    (Positions, ReadAll, EVERYONE),
    (Positions, Create, HR),
    (Positions, Update, HR),
    (Positions, Delete, &[HRM]),
    (Benefits, ReadAll, EVERYONE),
    (Benefits, Create, HR),
    (Benefits, Update, HR),
    (Benefits, Delete, &[HRM]),
    (HmoCatalog, ReadAll, EVERYONE),
    (HmoCatalog, Create, HR),
    (HmoCatalog, Update, HR),
    (HmoCatalog, Delete, &[HRM]),
    (Salaries, ReadAll, PAYROLL),
    (Salaries, Create, PAYROLL),
    (Salaries, Update, PAYROLL),
    (Salaries, Delete, &[HRM]),
    (Bonuses, ReadAll, PAYROLL),
    (Bonuses, Create, PAYROLL),
    (Bonuses, Update, PAYROLL),
    (Bonuses, Delete, PAYROLL),
    (Deductions, ReadAll, PAYROLL),
    (Deductions, Create, PAYROLL),
    (Deductions, Update, PAYROLL),
    (Deductions, Delete, PAYROLL),
    (Payroll, ReadAll, PAYROLL),
    (Payroll, ReadOwn, EVERYONE),
    (Payroll, Create, PAYROLL),
    (Payroll, Update, PAYROLL),
    (Payroll, Delete, PAYROLL),
    (Payroll, Approve, PAYROLL),
    (HmoEnrollments, ReadAll, HR),
    (HmoEnrollments, ReadOwn, EVERYONE),
    (HmoEnrollments, Create, HR),
    (HmoEnrollments, Update, HR),
    (HmoClaims, ReadAll, &[HRM, HRS, MGR]),
    (HmoClaims, ReadOwn, EVERYONE),
    (HmoClaims, Create, HR),
    (HmoClaims, CreateOwn, EVERYONE),
    (HmoClaims, Update, HR),
    (HmoClaims, Approve, &[HRM, MGR]),
    (Compensation, ReadAll, &[HRM, HRS, PO]),
    (Compensation, Create, &[HRM]),
    (Compensation, Update, &[HRM]),
    (Compensation, Delete, &[HRM]),
    (PayAdjustments, ReadAll, &[HRM, PO, MGR]),
    (PayAdjustments, Create, &[HRM, HRS, MGR]),
    (PayAdjustments, Approve, &[HRM]),
    (GradeRevisions, ReadAll, PAYROLL),
    (GradeRevisions, Create, HR),
    (GradeRevisions, Approve, &[HRM]),
    (Documents, ReadAll, HR),
    (Documents, ReadOwn, EVERYONE),
    (Documents, Create, HR),
    (Documents, CreateOwn, EVERYONE),
    (Documents, Delete, HR),
    (Analytics, ReadAll, &[HRM, HRS, PO]),
    (Analytics, Delete, &[HRM]),
    (Reports, ReadAll, &[HRM, HRS, PO]),
    (Dashboard, ReadAll, EVERYONE),
    (Integrations, ReadAll, PAYROLL),
    (Integrations, Update, PAYROLL),
];

/// Whether `role` may perform `operation` on `resource`
pub fn is_allowed(role: Role, resource: Resource, operation: Operation) -> bool {
    if role == Role::SystemAdmin {
        return true;
    }
    POLICY
        .iter()
        .find(|(r, o, _)| *r == resource && *o == operation)
        .is_some_and(|(_, _, roles)| roles.contains(&role))
}

pub fn can(user: &CurrentUser, resource: Resource, operation: Operation) -> bool {
    is_allowed(user.role, resource, operation)
}

pub fn can_read_all_resources(user: &CurrentUser, resource: Resource) -> bool {
    can(user, resource, ReadAll)
}

/// Own-scope read: the caller is allowed `ReadOwn` and the record belongs to their employee
pub fn can_read_own_resource(user: &CurrentUser, resource: Resource, owner: EmployeeId) -> bool {
    user.employee_id == Some(owner) && can(user, resource, ReadOwn)
}

pub fn require(user: &CurrentUser, resource: Resource, operation: Operation) -> Result<(), Error> {
    if can(user, resource, operation) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            action: operation,
            resource,
        })
    }
}

/// Read access to a single record owned by `owner`
pub fn require_read(user: &CurrentUser, resource: Resource, owner: EmployeeId) -> Result<(), Error> {
    if can_read_all_resources(user, resource) || can_read_own_resource(user, resource, owner) {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            action: ReadAll,
            resource,
        })
    }
}

/// Create access for a record that will belong to `owner`
pub fn require_create(user: &CurrentUser, resource: Resource, owner: EmployeeId) -> Result<(), Error> {
    let own = user.employee_id == Some(owner) && can(user, resource, CreateOwn);
    if can(user, resource, Create) || own {
        Ok(())
    } else {
        Err(Error::InsufficientPermissions {
            action: Create,
            resource,
        })
    }
}

/// Employee filter to apply to a list for callers that may only see their own records.
///
/// `Ok(None)` means no restriction. Callers with only own-scope access and no linked
/// employee get a 403, since they own nothing.
pub fn own_scope(user: &CurrentUser, resource: Resource) -> Result<Option<EmployeeId>, Error> {
    if can_read_all_resources(user, resource) {
        return Ok(None);
    }
    match user.employee_id {
        Some(employee_id) if can(user, resource, ReadOwn) => Ok(Some(employee_id)),
        _ => Err(Error::InsufficientPermissions {
            action: ReadAll,
            resource,
        }),
    }
}

pub trait ResourceMarker: Send + Sync + 'static {
    const RESOURCE: Resource;
}

pub trait OperationMarker: Send + Sync + 'static {
    const OPERATION: Operation;
}

/// Type level resources for [`RequiresPermission`]
pub mod resource {
    use super::{Resource, ResourceMarker};

    macro_rules! resources {
        ($($name:ident),* $(,)?) => {
            $(
                pub struct $name;
                impl ResourceMarker for $name {
                    const RESOURCE: Resource = Resource::$name;
                }
            )*
        };
    }

    resources!(
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
    );
}

/// Type level operations for [`RequiresPermission`]
pub mod operation {
    use super::{Operation, OperationMarker};

    macro_rules! operations {
        ($($name:ident),* $(,)?) => {
            $(
                pub struct $name;
                impl OperationMarker for $name {
                    const OPERATION: Operation = Operation::$name;
                }
            )*
        };
    }

    operations!(ReadAll, ReadOwn, Create, CreateOwn, Update, Delete, Approve);
}

/// Extractor that authenticates the caller and checks one policy entry
pub struct RequiresPermission<R: ResourceMarker, O: OperationMarker> {
    pub user: CurrentUser,
    _marker: PhantomData<(R, O)>,
}

impl<R: ResourceMarker, O: OperationMarker> Deref for RequiresPermission<R, O> {
    type Target = CurrentUser;

    fn deref(&self) -> &CurrentUser {
        &self.user
    }
}

impl<R: ResourceMarker, O: OperationMarker> FromRequestParts<AppState> for RequiresPermission<R, O> {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        require(&user, R::RESOURCE, O::OPERATION)?;
        Ok(Self {
            user,
            _marker: PhantomData,
        })
    }
}
