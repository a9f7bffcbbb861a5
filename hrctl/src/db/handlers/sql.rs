//! Query building helpers shared by the repositories.
//!
//! Every value reaches the database as a bind parameter. Column and table names passed to
//! these helpers are always string literals from the repositories, never request input.

use sqlx::{Encode, FromRow, PgConnection, Postgres, QueryBuilder, Type, postgres::PgRow};

use crate::db::errors::{DbError, Result};

/// `ILIKE` pattern matching `term` anywhere, with `%` and `_` in the term taken literally
pub fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// `AND`-joined filter conditions appended to a query.
///
/// Starts the clause with ` WHERE TRUE` so each condition can add ` AND ...` unconditionally.
pub struct Conditions<'b> {
    builder: &'b mut QueryBuilder<'static, Postgres>,
}

impl<'b> Conditions<'b> {
    pub fn new(builder: &'b mut QueryBuilder<'static, Postgres>) -> Self {
        builder.push(" WHERE TRUE");
        Self { builder }
    }

    /// `column = value`, skipped when the value is absent
    pub fn eq<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: 'static + Encode<'static, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            self.builder.push(format!(" AND {column} = "));
            self.builder.push_bind(value);
        }
        self
    }

    /// `column <op> value` for range filters, skipped when the value is absent
    pub fn cmp<T>(&mut self, column: &str, op: &str, value: Option<T>) -> &mut Self
    where
        T: 'static + Encode<'static, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            self.builder.push(format!(" AND {column} {op} "));
            self.builder.push_bind(value);
        }
        self
    }

    /// Hide soft-deleted rows unless asked for them
    pub fn active(&mut self, column: &str, include_inactive: bool) -> &mut Self {
        if !include_inactive {
            self.builder.push(format!(" AND {column}"));
        }
        self
    }

    /// Case-insensitive substring match over any of `columns`
    pub fn search(&mut self, columns: &[&str], term: Option<&str>) -> &mut Self {
        let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
            return self;
        };
        let pattern = like_pattern(term);
        self.builder.push(" AND (");
        for (i, column) in columns.iter().enumerate() {
            if i > 0 {
                self.builder.push(" OR ");
            }
            self.builder.push(format!("{column} ILIKE "));
            self.builder.push_bind(pattern.clone());
        }
        self.builder.push(")");
        self
    }

    /// Arbitrary condition with one bound value, e.g. `" AND employee_id IN (SELECT ... = "`
    /// followed by `")"`
    pub fn raw<T>(&mut self, prefix: &str, value: Option<T>, suffix: &str) -> &mut Self
    where
        T: 'static + Encode<'static, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            self.builder.push(prefix);
            self.builder.push_bind(value);
            self.builder.push(suffix);
        }
        self
    }
}

/// Append ` ORDER BY <order> LIMIT $n OFFSET $m`
pub fn paginate(builder: &mut QueryBuilder<'static, Postgres>, order: &str, skip: i64, limit: i64) {
    builder.push(format!(" ORDER BY {order} LIMIT "));
    builder.push_bind(limit);
    builder.push(" OFFSET ");
    builder.push_bind(skip);
}

/// `UPDATE <table> SET ...` writing only the columns that were supplied
pub struct PartialUpdate {
    builder: QueryBuilder<'static, Postgres>,
}

impl PartialUpdate {
    pub fn new(table: &str) -> Self {
        Self {
            builder: QueryBuilder::new(format!("UPDATE {table} SET updated_at = NOW()")),
        }
    }

    /// Write `column` when a value is present
    pub fn set<T>(&mut self, column: &str, value: Option<T>) -> &mut Self
    where
        T: 'static + Encode<'static, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            self.builder.push(format!(", {column} = "));
            self.builder.push_bind(value);
        }
        self
    }

    /// Write a nullable `column`: `Some(None)` stores NULL, `None` leaves it untouched
    pub fn set_nullable<T>(&mut self, column: &str, value: Option<Option<T>>) -> &mut Self
    where
        T: 'static + Encode<'static, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            self.builder.push(format!(", {column} = "));
            self.builder.push_bind(value);
        }
        self
    }

    /// Run the update for row `id`, returning the updated row
    pub async fn execute<R>(mut self, id: i64, conn: &mut PgConnection) -> Result<R>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
    {
        self.builder.push(" WHERE id = ");
        self.builder.push_bind(id);
        self.builder.push(" RETURNING *");

        self.builder
            .build_query_as::<R>()
            .fetch_optional(&mut *conn)
            .await?
            .ok_or(DbError::NotFound)
    }

    /// Run the update for row `id` only while `status` still holds `expected`.
    ///
    /// Returns `None` when the row is gone or another request moved its status first.
    pub async fn execute_when<R, S>(mut self, id: i64, expected: S, conn: &mut PgConnection) -> Result<Option<R>>
    where
        R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
        S: 'static + Encode<'static, Postgres> + Type<Postgres> + Send,
    {
        self.builder.push(" WHERE id = ");
        self.builder.push_bind(id);
        self.builder.push(" AND status = ");
        self.builder.push_bind(expected);
        self.builder.push(" RETURNING *");

        Ok(self.builder.build_query_as::<R>().fetch_optional(&mut *conn).await?)
    }
}

/// Soft delete: flip `is_active` off. Returns false when the row does not exist.
pub async fn deactivate(conn: &mut PgConnection, table: &str, id: i64) -> Result<bool> {
    let result = sqlx::query(&format!("UPDATE {table} SET is_active = FALSE, updated_at = NOW() WHERE id = $1"))
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}
