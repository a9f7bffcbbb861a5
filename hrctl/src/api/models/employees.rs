//! API request/response models for employees.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

use super::pagination::Pagination;
use super::validation::Validator;
use crate::db::models::employees::{EmployeeCreateDBRequest, EmployeeDBResponse, EmployeeUpdateDBRequest};
use crate::errors::Error;
use crate::types::{BranchId, DepartmentId, PositionId};

/// Contract under which an employee is engaged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "employment_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum EmploymentType {
    FullTime,
    PartTime,
    Contract,
    Temporary,
}

impl EmploymentType {
    pub const NAMES: &'static [&'static str] = &["full_time", "part_time", "contract", "temporary"];
}

pub type EmployeeResponse = EmployeeDBResponse;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct EmployeeCreate {
    pub employee_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub job_title: Option<String>,
    #[schema(value_type = Option<i64>)]
    pub department_id: Option<Value>,
    #[schema(value_type = Option<i64>)]
    pub branch_id: Option<Value>,
    #[schema(value_type = Option<i64>)]
    pub position_id: Option<Value>,
    #[schema(value_type = Option<i64>)]
    pub manager_id: Option<Value>,
    /// `YYYY-MM-DD`, defaults to today
    pub hire_date: Option<String>,
    #[schema(value_type = Option<EmploymentType>)]
    pub employment_type: Option<String>,
}

impl EmployeeCreate {
    pub fn validate(self) -> Result<EmployeeCreateDBRequest, Error> {
        let mut v = Validator::new();
        let employee_number = v.optional_text(self.employee_number);
        let first_name = v.required_text("first_name", self.first_name);
        let last_name = v.required_text("last_name", self.last_name);
        let email = v.required_email("email", self.email);
        let phone = v.optional_text(self.phone);
        let job_title = v.required_text("job_title", self.job_title);
        let department_id = v.required_id("department_id", self.department_id);
        let branch_id = v.optional_id("branch_id", self.branch_id);
        let position_id = v.optional_id("position_id", self.position_id);
        let manager_id = v.optional_id("manager_id", self.manager_id);
        let hire_date = v.optional_date("hire_date", self.hire_date);
        let employment_type = v.optional_enum("employment_type", self.employment_type, EmploymentType::NAMES);

        v.finish(|| {
            Some(EmployeeCreateDBRequest {
                employee_number,
                first_name: first_name?,
                last_name: last_name?,
                email: email?,
                phone,
                job_title: job_title?,
                department_id: department_id?,
                branch_id,
                position_id,
                manager_id,
                hire_date,
                employment_type,
            })
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EmployeeUpdate {
    pub employee_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    pub phone: Option<Option<String>>,
    pub job_title: Option<String>,
    #[schema(value_type = Option<i64>)]
    pub department_id: Option<Value>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i64>)]
    pub branch_id: Option<Option<Value>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i64>)]
    pub position_id: Option<Option<Value>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i64>)]
    pub manager_id: Option<Option<Value>>,
    pub hire_date: Option<String>,
    #[schema(value_type = Option<EmploymentType>)]
    pub employment_type: Option<String>,
    /// `true`/`false` or `1`/`0`
    #[schema(value_type = Option<bool>)]
    pub is_active: Option<Value>,
}

impl EmployeeUpdate {
    pub fn validate(self) -> Result<EmployeeUpdateDBRequest, Error> {
        let mut v = Validator::new();
        let email = v.optional_email("email", self.email);
        let department_id = v.optional_id("department_id", self.department_id);
        let branch_id = v.nullable_id("branch_id", self.branch_id);
        let position_id = v.nullable_id("position_id", self.position_id);
        let manager_id = v.nullable_id("manager_id", self.manager_id);
        let hire_date = v.optional_date("hire_date", self.hire_date);
        let employment_type = v.optional_enum("employment_type", self.employment_type, EmploymentType::NAMES);
        let is_active = v.optional_bool("is_active", self.is_active);
        let request = EmployeeUpdateDBRequest {
            employee_number: v.optional_text(self.employee_number),
            first_name: v.optional_text(self.first_name),
            last_name: v.optional_text(self.last_name),
            email,
            phone: v.nullable_text(self.phone),
            job_title: v.optional_text(self.job_title),
            department_id,
            branch_id,
            position_id,
            manager_id,
            hire_date,
            employment_type,
            is_active,
        };
        v.finish(|| Some(request))
    }
}

/// Query parameters for listing employees
#[serde_as]
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListEmployeesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub department_id: Option<DepartmentId>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub branch_id: Option<BranchId>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub position_id: Option<PositionId>,

    pub employment_type: Option<EmploymentType>,

    /// Matches first name, last name, email or employee number
    pub search: Option<String>,

    /// Include deactivated employees
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub include_inactive: Option<bool>,
}
