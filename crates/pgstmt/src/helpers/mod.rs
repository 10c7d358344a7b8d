//! Column sets and the statements generated from them.
//!
//! Describe once which properties go to which columns, then reuse that
//! description for any number of INSERT/UPDATE statements.
//!
//! # Features
//!
//! - **Shorthand columns**: `"?id"` (match-only), `"data:json"`, `"raw^"`
//! - **Cached fragments**: name, placeholder and assignment lists are built once per set
//! - **Value policies**: per-column defaults, `init` overrides and `skip` predicates
//! - **Multi-row UPDATE**: `UPDATE ... FROM (VALUES ...)` from an array of objects
//!
//! # Usage
//!
//! ```
//! use pgstmt::helpers;
//! use pgstmt::{ColumnSet, ColumnSetOptions};
//! use serde_json::json;
//!
//! let cs = ColumnSet::new(["?id", "val", "msg"], ColumnSetOptions::new().table("my-table"))?;
//!
//! let data = json!([
//!     {"id": 1, "val": 123, "msg": "hello"},
//!     {"id": 2, "val": 456, "msg": "world!"},
//! ]);
//! let sql = helpers::update(&data).columns(&cs).to_sql()? + " WHERE v.id = t.id";
//! assert_eq!(
//!     sql,
//!     r#"UPDATE "my-table" AS t SET "val"=v."val","msg"=v."msg" FROM (VALUES(1,123,'hello'),(2,456,'world!')) AS v("id","val","msg") WHERE v.id = t.id"#
//! );
//! # Ok::<(), pgstmt::StmtError>(())
//! ```

mod column;
mod column_set;
mod insert;
mod update;

pub use column::{Column, ColumnConfig, ColumnContext, ColumnSpec, InitFn, SkipFn};
pub use column_set::{AssignOptions, ColumnSet, ColumnSetOptions, ColumnSetSource};
pub use insert::InsertStmt;
pub use update::{UpdateOptions, UpdateStmt};

use crate::error::{StmtError, StmtResult};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Column argument of a generator: a shared set, or a spec built on demand.
#[derive(Debug, Clone)]
pub(crate) enum Columns<'a> {
    Shared(&'a ColumnSet),
    Spec(ColumnSetSource),
}

impl<'a> Columns<'a> {
    pub(crate) fn resolve(&self) -> StmtResult<Cow<'a, ColumnSet>> {
        match self {
            Columns::Shared(cs) => Ok(Cow::Borrowed(*cs)),
            Columns::Spec(source) => Ok(Cow::Owned(ColumnSet::new(
                source.clone(),
                ColumnSetOptions::default(),
            )?)),
        }
    }
}

/// Statement input: one object, or an array of rows.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Rows<'v> {
    One(&'v Map<String, Value>),
    Many(&'v [Value]),
}

impl<'v> Rows<'v> {
    pub(crate) fn of(data: &'v Value) -> StmtResult<Self> {
        match data {
            Value::Object(row) => Ok(Rows::One(row)),
            Value::Array(rows) => Ok(Rows::Many(rows)),
            _ => Err(StmtError::type_error("Invalid parameter 'data' specified.")),
        }
    }

    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    pub(crate) fn len(&self) -> usize {
        match self {
            Rows::One(_) => 1,
            Rows::Many(rows) => rows.len(),
        }
    }
}

/// `(v1,v2,...)` for one object.
pub(crate) fn row_tuple(cs: &ColumnSet, row: &Map<String, Value>) -> StmtResult<String> {
    Ok(format!("({})", cs.render_tuple(row)?))
}

/// Tuples for every row, each row required to be an object.
pub(crate) fn row_tuples(cs: &ColumnSet, rows: &[Value], kind: &str) -> StmtResult<String> {
    let mut tuples = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let Value::Object(row) = row else {
            return Err(StmtError::unsatisfiable(format!(
                "Invalid {kind} object at index {index}."
            )));
        };
        tuples.push(row_tuple(cs, row)?);
    }
    Ok(tuples.join(","))
}

/// Start an INSERT for one object or an array of objects.
///
/// # Example
/// ```
/// use serde_json::json;
///
/// let sql = pgstmt::helpers::insert(&json!({"id": 1, "val": "x"}))
///     .column_spec(["id", "val"])
///     .table("tbl")
///     .to_sql()?;
/// assert_eq!(sql, r#"INSERT INTO "tbl" ("id","val") VALUES (1,'x')"#);
/// # Ok::<(), pgstmt::StmtError>(())
/// ```
pub fn insert(data: &Value) -> InsertStmt<'_> {
    InsertStmt::new(data)
}

/// Start an UPDATE for one object, or a multi-row UPDATE for an array.
///
/// # Example
/// ```
/// use serde_json::json;
///
/// let sql = pgstmt::helpers::update(&json!({"id": 1, "val": 123, "msg": "hello"}))
///     .table("my-table")
///     .to_sql()?;
/// assert_eq!(sql, r#"UPDATE "my-table" SET "id"=1,"val"=123,"msg"='hello'"#);
/// # Ok::<(), pgstmt::StmtError>(())
/// ```
pub fn update(data: &Value) -> UpdateStmt<'_> {
    UpdateStmt::new(data)
}

/// The formatted SET list for one object, without the UPDATE/SET keywords.
///
/// Empty when every column is conditional or skipped.
pub fn sets(data: &Map<String, Value>, columns: &ColumnSet) -> StmtResult<String> {
    columns.render_assignments(data)
}

/// Value tuples for one object (`(..)`) or an array of objects (`(..),(..)`).
pub fn values(data: &Value, columns: &ColumnSet) -> StmtResult<String> {
    match data {
        Value::Object(row) => row_tuple(columns, row),
        Value::Array(rows) if rows.is_empty() => Err(StmtError::unsatisfiable(
            "Cannot generate values from an empty array.",
        )),
        Value::Array(rows) => row_tuples(columns, rows, "values"),
        _ => Err(StmtError::type_error("Invalid parameter 'data' specified.")),
    }
}
