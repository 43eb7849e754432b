//! Query gateway: parameterized statements in, ordered named-field rows out.
//!
//! Every value reaches the database as a bound parameter. Statements are
//! written with `?` placeholders; for PostgreSQL they are rewritten to `$n`
//! before execution.

use std::borrow::Cow;

use sqlx::any::{AnyArguments, AnyRow, AnyTypeInfoKind};
use sqlx::pool::PoolConnection;
use sqlx::query::Query;
use sqlx::{Any, Column, Row as _, ValueRef};

use crate::{DbEngine, DbError, DbHandle, Result};

/// A positional statement parameter.
///
/// Each variant carries its SQL type even when the value is `NULL`, so that
/// backends with strict parameter typing (PostgreSQL) accept typed nulls.
#[derive(Debug, Clone, PartialEq)]
pub enum Param {
    Bool(Option<bool>),
    Int(Option<i64>),
    Float(Option<f64>),
    Text(Option<String>),
}

impl Param {
    fn bind<'q>(
        self,
        query: Query<'q, Any, AnyArguments<'q>>,
    ) -> Query<'q, Any, AnyArguments<'q>> {
        match self {
            Param::Bool(v) => query.bind(v),
            Param::Int(v) => query.bind(v),
            Param::Float(v) => query.bind(v),
            Param::Text(v) => query.bind(v),
        }
    }
}

impl From<bool> for Param {
    fn from(v: bool) -> Self {
        Param::Bool(Some(v))
    }
}

impl From<i32> for Param {
    fn from(v: i32) -> Self {
        Param::Int(Some(i64::from(v)))
    }
}

impl From<i64> for Param {
    fn from(v: i64) -> Self {
        Param::Int(Some(v))
    }
}

impl From<Option<i64>> for Param {
    fn from(v: Option<i64>) -> Self {
        Param::Int(v)
    }
}

impl From<f64> for Param {
    fn from(v: f64) -> Self {
        Param::Float(Some(v))
    }
}

impl From<Option<f64>> for Param {
    fn from(v: Option<f64>) -> Self {
        Param::Float(v)
    }
}

impl From<&str> for Param {
    fn from(v: &str) -> Self {
        Param::Text(Some(v.to_owned()))
    }
}

impl From<String> for Param {
    fn from(v: String) -> Self {
        Param::Text(Some(v))
    }
}

impl From<Option<String>> for Param {
    fn from(v: Option<String>) -> Self {
        Param::Text(v)
    }
}

/// A single decoded column value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
}

/// One result row: column names and values in select-list order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new(columns: Vec<(String, SqlValue)>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[(String, SqlValue)] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Value by column name (case-insensitive; MySQL may echo upper-case aliases).
    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column))
            .map(|(_, v)| v)
    }

    pub fn i64(&self, column: &str) -> Result<i64> {
        match self.get(column) {
            Some(SqlValue::Int(v)) => Ok(*v),
            _ => Err(decode_err(column, "an integer")),
        }
    }

    /// Integers are widened; SQLite may hand back whole REAL values as INTEGER.
    pub fn f64(&self, column: &str) -> Result<f64> {
        self.opt_f64(column)?
            .ok_or_else(|| decode_err(column, "a number"))
    }

    pub fn opt_f64(&self, column: &str) -> Result<Option<f64>> {
        match self.get(column) {
            Some(SqlValue::Null) => Ok(None),
            Some(SqlValue::Float(v)) => Ok(Some(*v)),
            #[allow(clippy::cast_precision_loss)]
            Some(SqlValue::Int(v)) => Ok(Some(*v as f64)),
            _ => Err(decode_err(column, "a number")),
        }
    }

    pub fn string(&self, column: &str) -> Result<String> {
        self.opt_string(column)?
            .ok_or_else(|| decode_err(column, "text"))
    }

    pub fn opt_string(&self, column: &str) -> Result<Option<String>> {
        match self.get(column) {
            Some(SqlValue::Null) => Ok(None),
            Some(SqlValue::Text(v)) => Ok(Some(v.clone())),
            _ => Err(decode_err(column, "text")),
        }
    }
}

fn decode_err(column: &str, expected: &'static str) -> DbError {
    DbError::Decode {
        column: column.to_string(),
        expected,
    }
}

impl DbHandle {
    /// Run a statement and collect its rows.
    ///
    /// Zero matching rows is `Ok(vec![])`. Failing to get a connection is
    /// [`DbError::Connection`]; a statement rejected by the database is
    /// [`DbError::Query`]; exceeding the statement timeout is
    /// [`DbError::Timeout`].
    pub async fn run(&self, sql: &str, params: &[Param]) -> Result<Vec<Row>> {
        let sql = self.prepare_sql(sql);
        let mut conn = self.acquire().await?;

        let query = build_query(&sql, params);
        let fetched =
            tokio::time::timeout(self.statement_timeout, query.fetch_all(&mut *conn)).await;

        let rows = match fetched {
            Ok(result) => result.map_err(DbError::from_statement)?,
            Err(_) => {
                self.discard_after_timeout(&mut conn);
                return Err(DbError::Timeout(self.statement_timeout));
            }
        };

        let decoded = rows.iter().map(decode_row).collect::<Result<Vec<_>>>()?;
        tracing::trace!(rows = decoded.len(), "statement returned");
        Ok(decoded)
    }

    /// Execute a statement that returns no rows; yields the affected row count.
    pub async fn execute(&self, sql: &str, params: &[Param]) -> Result<u64> {
        let sql = self.prepare_sql(sql);
        let mut conn = self.acquire().await?;

        let query = build_query(&sql, params);
        match tokio::time::timeout(self.statement_timeout, query.execute(&mut *conn)).await {
            Ok(result) => Ok(result.map_err(DbError::from_statement)?.rows_affected()),
            Err(_) => {
                self.discard_after_timeout(&mut conn);
                Err(DbError::Timeout(self.statement_timeout))
            }
        }
    }

    /// The server may still be working on a timed-out statement, so the
    /// connection is not handed to the next caller. An in-memory SQLite
    /// connection is kept: closing it would drop the whole database. The
    /// next statement on it waits until the abandoned one stops.
    fn discard_after_timeout(&self, conn: &mut PoolConnection<Any>) {
        if self.in_memory {
            tracing::warn!(timeout = ?self.statement_timeout, "statement timed out on in-memory database");
        } else {
            conn.close_on_drop();
        }
    }

    fn prepare_sql<'a>(&self, sql: &'a str) -> Cow<'a, str> {
        match self.engine {
            DbEngine::Postgres => Cow::Owned(numbered_placeholders(sql)),
            DbEngine::MySql | DbEngine::Sqlite => Cow::Borrowed(sql),
        }
    }
}

fn build_query<'q>(sql: &'q str, params: &[Param]) -> Query<'q, Any, AnyArguments<'q>> {
    params
        .iter()
        .cloned()
        .fold(sqlx::query::<Any>(sql), |query, param| param.bind(query))
}

fn decode_row(row: &AnyRow) -> Result<Row> {
    let mut columns = Vec::with_capacity(row.len());
    for (idx, column) in row.columns().iter().enumerate() {
        let name = column.name().to_string();
        let kind = {
            let raw = row.try_get_raw(idx).map_err(DbError::Query)?;
            if raw.is_null() {
                None
            } else {
                Some(raw.type_info().kind())
            }
        };

        let value = match kind {
            None | Some(AnyTypeInfoKind::Null) => SqlValue::Null,
            Some(AnyTypeInfoKind::Bool) => SqlValue::Bool(row.try_get(idx).map_err(DbError::Query)?),
            Some(AnyTypeInfoKind::SmallInt | AnyTypeInfoKind::Integer | AnyTypeInfoKind::BigInt) => {
                SqlValue::Int(row.try_get::<i64, _>(idx).map_err(DbError::Query)?)
            }
            Some(AnyTypeInfoKind::Real) => {
                SqlValue::Float(f64::from(row.try_get::<f32, _>(idx).map_err(DbError::Query)?))
            }
            Some(AnyTypeInfoKind::Double) => {
                SqlValue::Float(row.try_get::<f64, _>(idx).map_err(DbError::Query)?)
            }
            Some(AnyTypeInfoKind::Text) => {
                SqlValue::Text(row.try_get::<String, _>(idx).map_err(DbError::Query)?)
            }
            Some(AnyTypeInfoKind::Blob) => {
                SqlValue::Bytes(row.try_get::<Vec<u8>, _>(idx).map_err(DbError::Query)?)
            }
        };
        columns.push((name, value));
    }
    Ok(Row::new(columns))
}

/// Rewrite `?` placeholders to `$1, $2, ...`, leaving quoted text alone.
fn numbered_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut n = 0usize;
    let mut quote: Option<char> = None;

    for ch in sql.chars() {
        match (quote, ch) {
            (Some(q), c) if c == q => {
                quote = None;
                out.push(c);
            }
            (Some(_), c) => out.push(c),
            (None, '\'' | '"') => {
                quote = Some(ch);
                out.push(ch);
            }
            (None, '?') => {
                n += 1;
                out.push('$');
                out.push_str(&n.to_string());
            }
            (None, c) => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_numbered_outside_quotes() {
        assert_eq!(
            numbered_placeholders("SELECT * FROM t WHERE a = ? AND b = '?' AND c = ?"),
            "SELECT * FROM t WHERE a = $1 AND b = '?' AND c = $2"
        );
        assert_eq!(numbered_placeholders("SELECT 1"), "SELECT 1");
    }

    #[test]
    fn row_accessors() {
        let row = Row::new(vec![
            ("id".into(), SqlValue::Int(7)),
            ("name".into(), SqlValue::Text("Lentilles".into())),
            ("protein".into(), SqlValue::Null),
            ("calories".into(), SqlValue::Int(2000)),
            ("fat".into(), SqlValue::Float(65.5)),
        ]);

        assert_eq!(row.i64("ID").unwrap(), 7);
        assert_eq!(row.string("name").unwrap(), "Lentilles");
        assert_eq!(row.opt_f64("protein").unwrap(), None);
        assert_eq!(row.f64("calories").unwrap(), 2000.0);
        assert_eq!(row.f64("fat").unwrap(), 65.5);
        assert!(matches!(
            row.f64("protein"),
            Err(DbError::Decode { .. })
        ));
        assert!(matches!(row.i64("missing"), Err(DbError::Decode { .. })));
        assert!(matches!(row.string("id"), Err(DbError::Decode { .. })));
    }

    #[test]
    fn param_conversions_keep_type_for_nulls() {
        assert_eq!(Param::from(None::<f64>), Param::Float(None));
        assert_eq!(Param::from(None::<String>), Param::Text(None));
        assert_eq!(Param::from(3_i32), Param::Int(Some(3)));
        assert_eq!(Param::from("x"), Param::Text(Some("x".into())));
    }
}
