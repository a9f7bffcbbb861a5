//! Database layer.
//!
//! Built on SQLx and PostgreSQL, organized around the repository pattern:
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  (api::handlers - HTTP, authorization, transactions)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers - queries)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - rows and insert/update requests)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │  PostgreSQL │
//! └─────────────┘
//! ```
//!
//! Repositories borrow a `PgConnection`, so the caller decides the transaction boundary.
//! Anything that writes more than one row (processing a payroll run, approving a pay
//! adjustment, syncing HMO premiums) opens a transaction and builds each repository from it:
//!
//! ```ignore
//! let mut tx = pool.begin().await?;
//! let run = PayrollRuns::new(&mut tx).transition(id, from, to, actor, None).await?;
//! PayrollRuns::new(&mut tx).generate_payslips(&run).await?;
//! tx.commit().await?;
//! ```
//!
//! Migrations live in `migrations/` and run at startup through [`crate::migrator`].

pub mod errors;
pub mod handlers;
pub mod models;
