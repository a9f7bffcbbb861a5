use thiserror::Error;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation")]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Foreign key constraint violation
    #[error("Foreign key constraint violation")]
    ForeignKeyViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Check constraint violation
    #[error("Check constraint violation")]
    CheckViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convert from sqlx::Error using proper sqlx error categorization
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => {
                let constraint = db_err.constraint().map(|s| s.to_string());
                let table = db_err.table().map(|s| s.to_string());
                let message = db_err.message().to_string();

                if db_err.is_unique_violation() {
                    DbError::UniqueViolation {
                        constraint,
                        table,
                        message,
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation {
                        constraint,
                        table,
                        message,
                    }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation {
                        constraint,
                        table,
                        message,
                    }
                } else {
                    // All other database errors are non-recoverable - convert to anyhow
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// Human readable description of a unique constraint, used in conflict responses.
pub fn describe_unique_violation(table: Option<&str>, constraint: Option<&str>) -> &'static str {
    match (table, constraint) {
        (Some("users"), Some(c)) if c.contains("email") => "A user with this email address already exists",
        (Some("users"), Some(c)) if c.contains("employee") => "This employee is already linked to a user account",
        (Some("employees"), Some(c)) if c.contains("email") => "An employee with this email address already exists",
        (Some("employees"), Some(c)) if c.contains("number") => "An employee with this employee number already exists",
        (Some("departments"), _) => "A department with this name already exists",
        (Some("branches"), _) => "A branch with this name already exists",
        (Some("benefit_categories"), _) => "A benefit category with this name already exists",
        (Some("employee_benefits"), _) => "The employee already has this benefit assigned",
        (Some("hmo_providers"), _) => "An HMO provider with this name already exists",
        (Some("hmo_enrollments"), _) => "The employee already has an active enrollment in this plan",
        (Some("salary_grades"), _) => "A salary grade with this code already exists",
        (Some("salaries"), _) => "The employee already has a current salary",
        (Some("employee_grade_mappings"), _) => "The employee already has a current grade mapping",
        (Some("payslips"), _) => "A payslip for this employee already exists in the payroll run",
        _ => "Resource already exists",
    }
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;
