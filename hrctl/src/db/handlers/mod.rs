//! Repository implementations for database access.
//!
//! Each repository wraps a borrowed connection or transaction. Entities with plain CRUD
//! implement [`Repository`]; workflow entities (enrollments, claims, approval requests)
//! expose only the operations their lifecycle allows.
//!
//! - [`Users`], [`PasswordResetTokens`], [`TwoFactorChallenges`]: accounts and login
//! - [`Employees`], [`Departments`], [`Branches`], [`Positions`]: organization
//! - [`BenefitCategories`], [`Benefits`], [`BenefitAssignments`]: benefits catalog
//! - [`Salaries`], [`Bonuses`], [`Deductions`], [`PayrollRuns`], [`Payslips`]: pay
//! - [`HmoProviders`], [`HmoPlans`], [`Enrollments`], [`Claims`]: health maintenance plans
//! - [`SalaryGrades`], [`PayBands`], [`GradeMappings`], [`PayAdjustments`], [`GradeRevisions`]:
//!   compensation planning
//! - [`Documents`]: employee document metadata
//! - [`Analytics`], [`Reports`]: read-only aggregates

pub mod analytics;
pub mod benefits;
pub mod bonuses;
pub mod branches;
pub mod compensation;
pub mod deductions;
pub mod departments;
pub mod documents;
pub mod employees;
pub mod hmo;
pub mod password_reset_tokens;
pub mod payroll;
pub mod positions;
pub mod reports;
pub mod repository;
pub mod salaries;
pub mod sql;
pub mod two_factor;
pub mod users;

pub use analytics::Analytics;
pub use benefits::{BenefitAssignments, BenefitCategories, Benefits};
pub use bonuses::Bonuses;
pub use branches::Branches;
pub use compensation::{GradeMappings, GradeRevisions, PayAdjustments, PayBands, SalaryGrades};
pub use deductions::Deductions;
pub use departments::Departments;
pub use documents::Documents;
pub use employees::Employees;
pub use hmo::{Claims, Enrollments, HmoPlans, HmoProviders};
pub use password_reset_tokens::PasswordResetTokens;
pub use payroll::{PayrollRuns, Payslips};
pub use positions::Positions;
pub use reports::Reports;
pub use repository::Repository;
pub use salaries::Salaries;
pub use two_factor::TwoFactorChallenges;
pub use users::Users;
