//! # pgstmt
//!
//! Escaped Postgres INSERT/UPDATE statement text from plain JSON data.
//!
//! ## Features
//!
//! - **Declare once, reuse**: a [`ColumnSet`] describes which properties go to which
//!   columns and caches the SQL fragments derived from it
//! - **Shorthand specs**: `"?id"` marks a match-only column, `"data:json"` picks a modifier
//! - **Value policies**: defaults, `init` overrides and `skip` predicates per column
//! - **Multi-row writes**: multi-row INSERT and `UPDATE ... FROM (VALUES ...)`
//! - **Self-contained formatting**: [`format`] substitutes `$1` / `${prop}` tokens with
//!   escaped literals and identifiers
//!
//! ## Helpers
//!
//! ```
//! use pgstmt::helpers;
//! use pgstmt::{ColumnConfig, ColumnSet, ColumnSetOptions, ColumnSpec};
//! use serde_json::json;
//!
//! let cs = ColumnSet::new(
//!     vec![
//!         ColumnSpec::from(ColumnConfig::new("id").conditional(true)),
//!         "name".into(),
//!         ColumnConfig::new("tags").cast("text[]").into(),
//!     ],
//!     ColumnSetOptions::new().table("users"),
//! )?;
//!
//! // INSERT
//! let row = json!({"id": 1, "name": "alice", "tags": ["a"]});
//! let sql = helpers::insert(&row).columns(&cs).to_sql()?;
//! assert_eq!(
//!     sql,
//!     r#"INSERT INTO "users" ("id","name","tags") VALUES (1,'alice',array['a']::text[])"#
//! );
//!
//! // UPDATE (append the WHERE clause yourself)
//! let sql = helpers::update(&row).columns(&cs).to_sql()? + " WHERE id = 1";
//! assert_eq!(
//!     sql,
//!     r#"UPDATE "users" SET "name"='alice',"tags"=array['a']::text[] WHERE id = 1"#
//! );
//! # Ok::<(), pgstmt::StmtError>(())
//! ```

pub mod config;
pub mod error;
pub mod format;
pub mod helpers;
pub mod ident;
pub mod prelude;

pub use config::StmtConfig;
pub use error::{StmtError, StmtResult};
pub use format::{Modifier, as_alias, as_name, format};
pub use helpers::{
    AssignOptions, Column, ColumnConfig, ColumnContext, ColumnSet, ColumnSetOptions,
    ColumnSetSource, ColumnSpec, InsertStmt, UpdateOptions, UpdateStmt, insert, update,
};
pub use ident::{TableName, TableSource};
