//! SQL identifier quoting and table references.
//!
//! This module provides [`TableName`], an immutable `schema.table` reference with its
//! escaped form computed once, plus the identifier helpers used by the formatter:
//!
//! - [`as_name`] always double-quotes, escaping `"` as `""`
//! - [`as_alias`] leaves same-case simple identifiers (`t`, `V_1`) bare and quotes the rest
//!
//! # Example
//! ```
//! use pgstmt::TableName;
//!
//! let t = TableName::qualified("public", "users")?;
//! assert_eq!(t.to_string(), r#""public"."users""#);
//! # Ok::<(), pgstmt::StmtError>(())
//! ```

use crate::error::{StmtError, StmtResult};
use serde_json::Value;
use std::fmt;

pub(crate) fn write_quoted(out: &mut String, name: &str) {
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push_str("\"\"");
        } else {
            out.push(ch);
        }
    }
    out.push('"');
}

pub(crate) fn quote_ident(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    write_quoted(&mut out, name);
    out
}

/// Double-quote an SQL identifier.
///
/// ```
/// assert_eq!(pgstmt::as_name(r#"my "col""#).unwrap(), r#""my ""col""""#);
/// ```
pub fn as_name(name: &str) -> StmtResult<String> {
    if name.is_empty() {
        return Err(StmtError::value("Invalid sql name: \"\""));
    }
    if name.contains('\0') {
        return Err(StmtError::value(
            "Identifier cannot contain NUL character",
        ));
    }
    Ok(quote_ident(name))
}

fn is_simple_alias(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    let rest: Vec<char> = chars.collect();
    let lower = (first == '_' || first.is_ascii_lowercase())
        && rest
            .iter()
            .all(|&c| c == '_' || c == '$' || c.is_ascii_lowercase() || c.is_ascii_digit());
    let upper = (first == '_' || first.is_ascii_uppercase())
        && rest
            .iter()
            .all(|&c| c == '_' || c == '$' || c.is_ascii_uppercase() || c.is_ascii_digit());
    lower || upper
}

/// Render an alias, quoting it only when Postgres would not keep it verbatim.
pub fn as_alias(name: &str) -> StmtResult<String> {
    if is_simple_alias(name) {
        Ok(name.to_string())
    } else {
        as_name(name)
    }
}

/// A destination table, optionally schema-qualified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableName {
    table: String,
    schema: Option<String>,
    name: String,
}

impl TableName {
    /// Create a table reference. An empty `schema` is treated as absent.
    pub fn new(table: impl Into<String>, schema: Option<&str>) -> StmtResult<Self> {
        let table = table.into();
        if table.is_empty() {
            return Err(StmtError::type_error(
                "Table name must be a non-empty text string.",
            ));
        }
        let schema = schema.filter(|s| !s.is_empty()).map(str::to_string);
        let mut name = String::with_capacity(table.len() + 2);
        if let Some(schema) = &schema {
            write_quoted(&mut name, schema);
            name.push('.');
        }
        write_quoted(&mut name, &table);
        Ok(Self {
            table,
            schema,
            name,
        })
    }

    /// Create a `schema.table` reference.
    pub fn qualified(schema: &str, table: impl Into<String>) -> StmtResult<Self> {
        Self::new(table, Some(schema))
    }

    /// Build from a JSON string or a `{"table": .., "schema": ..}` record.
    pub fn from_value(value: &Value) -> StmtResult<Self> {
        match value {
            Value::String(table) => Self::new(table.as_str(), None),
            Value::Object(map) => {
                let table = match map.get("table") {
                    Some(Value::String(t)) => t.as_str(),
                    _ => {
                        return Err(StmtError::type_error(
                            "Table name must be a non-empty text string.",
                        ));
                    }
                };
                let schema = match map.get("schema") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(s)) => Some(s.as_str()),
                    Some(_) => return Err(StmtError::type_error("Invalid schema name.")),
                };
                Self::new(table, schema)
            }
            _ => Err(StmtError::type_error(
                "Table name must be a non-empty text string.",
            )),
        }
    }

    /// Unescaped table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Unescaped schema name, if any.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Escaped, schema-qualified name ready to be embedded in SQL.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A table argument accepted by the statement generators.
///
/// Text is validated lazily, when the statement is generated.
#[derive(Debug, Clone)]
pub enum TableSource {
    Text(String),
    Name(TableName),
}

impl TableSource {
    /// Coerce to a [`TableName`]; empty text is a type error.
    pub(crate) fn into_name(self) -> StmtResult<TableName> {
        match self {
            TableSource::Name(name) => Ok(name),
            TableSource::Text(text) => TableName::new(text, None),
        }
    }

    /// Table argument of a generator; empty text means no table was given.
    pub(crate) fn resolve(self) -> StmtResult<TableName> {
        match self {
            TableSource::Name(name) => Ok(name),
            TableSource::Text(text) if text.is_empty() => {
                Err(StmtError::unsatisfiable("Table name is unknown."))
            }
            TableSource::Text(text) => TableName::new(text, None),
        }
    }
}

impl From<&str> for TableSource {
    fn from(value: &str) -> Self {
        TableSource::Text(value.to_string())
    }
}

impl From<String> for TableSource {
    fn from(value: String) -> Self {
        TableSource::Text(value)
    }
}

impl From<TableName> for TableSource {
    fn from(value: TableName) -> Self {
        TableSource::Name(value)
    }
}

impl From<&TableName> for TableSource {
    fn from(value: &TableName) -> Self {
        TableSource::Name(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn table_simple() {
        let t = TableName::new("users", None).unwrap();
        assert_eq!(t.name(), r#""users""#);
        assert_eq!(t.schema(), None);
    }

    #[test]
    fn table_with_schema() {
        let t = TableName::qualified("public", "users").unwrap();
        assert_eq!(t.to_string(), r#""public"."users""#);
        assert_eq!(t.table(), "users");
        assert_eq!(t.schema(), Some("public"));
    }

    #[test]
    fn table_empty_schema_is_absent() {
        let t = TableName::new("users", Some("")).unwrap();
        assert_eq!(t.schema(), None);
        assert_eq!(t.name(), r#""users""#);
    }

    #[test]
    fn table_escapes_quotes() {
        let t = TableName::new(r#"my"table"#, None).unwrap();
        assert_eq!(t.name(), r#""my""table""#);
    }

    #[test]
    fn table_rejects_empty() {
        assert!(TableName::new("", None).unwrap_err().is_type_error());
    }

    #[test]
    fn table_from_record() {
        let t = TableName::from_value(&json!({"table": "users", "schema": "s"})).unwrap();
        assert_eq!(t.name(), r#""s"."users""#);
    }

    #[test]
    fn table_from_record_rejects_bad_schema() {
        let err = TableName::from_value(&json!({"table": "users", "schema": 1})).unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn table_from_number_rejected() {
        assert!(TableName::from_value(&json!(5)).unwrap_err().is_type_error());
    }

    #[test]
    fn empty_table_text_is_unknown() {
        let err = TableSource::from("").resolve().unwrap_err();
        assert_eq!(err.message(), "Table name is unknown.");
    }

    #[test]
    fn empty_table_text_is_not_a_name() {
        let err = TableSource::from("").into_name().unwrap_err();
        assert!(err.is_type_error());
        let name = TableSource::from("logs").into_name().unwrap();
        assert_eq!(name.name(), r#""logs""#);
    }

    #[test]
    fn alias_simple_kept() {
        assert_eq!(as_alias("t").unwrap(), "t");
        assert_eq!(as_alias("VALS_1").unwrap(), "VALS_1");
    }

    #[test]
    fn alias_mixed_case_quoted() {
        assert_eq!(as_alias("Vals").unwrap(), r#""Vals""#);
        assert_eq!(as_alias("my alias").unwrap(), r#""my alias""#);
    }

    #[test]
    fn name_rejects_empty() {
        assert!(as_name("").is_err());
    }
}
