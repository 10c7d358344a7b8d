//! UPDATE statement generator.

use super::{ColumnSet, ColumnSetSource, Columns, Rows, row_tuples};
use crate::config::StmtConfig;
use crate::error::{StmtError, StmtResult};
use crate::format::format;
use crate::ident::{TableSource, as_alias};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::borrow::Cow;

const DEFAULT_TABLE_ALIAS: &str = "t";
const DEFAULT_VALUE_ALIAS: &str = "v";

/// Aliases of a multi-row `UPDATE ... FROM (VALUES ...)`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UpdateOptions {
    /// Alias of the updated table (default `t`).
    pub table_alias: Option<String>,
    /// Alias of the VALUES source (default `v`).
    pub value_alias: Option<String>,
}

impl UpdateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table_alias(mut self, alias: impl Into<String>) -> Self {
        self.table_alias = Some(alias.into());
        self
    }

    pub fn value_alias(mut self, alias: impl Into<String>) -> Self {
        self.value_alias = Some(alias.into());
        self
    }

    /// Read `{"tableAlias": .., "valueAlias": ..}`; `null` means defaults.
    pub fn from_value(value: &Value) -> StmtResult<Self> {
        match value {
            Value::Null => Ok(Self::default()),
            Value::Object(_) => serde_json::from_value(value.clone())
                .map_err(|e| StmtError::type_error(format!("Invalid update options: {e}"))),
            _ => Err(StmtError::type_error(
                "Invalid parameter 'options' specified.",
            )),
        }
    }

    fn alias(alias: Option<&str>, default: &str) -> StmtResult<String> {
        match alias {
            None => Ok(default.to_string()),
            Some("") => Err(StmtError::value("An alias must be a non-empty text string.")),
            Some(alias) => as_alias(alias),
        }
    }
}

/// UPDATE generator.
///
/// For one object this emits `UPDATE table SET ...` and the caller appends the
/// WHERE clause. For an array of objects it emits the multi-row form
/// `UPDATE table AS t SET "col"=v."col",... FROM (VALUES (..),(..)) AS v("col",...)`,
/// where conditional columns stay in the VALUES tuples as join keys.
#[must_use]
#[derive(Debug, Clone)]
pub struct UpdateStmt<'a> {
    data: &'a Value,
    columns: Option<Columns<'a>>,
    table: Option<TableSource>,
    options: UpdateOptions,
    config: StmtConfig,
}

impl<'a> UpdateStmt<'a> {
    pub fn new(data: &'a Value) -> Self {
        Self {
            data,
            columns: None,
            table: None,
            options: UpdateOptions::default(),
            config: StmtConfig::default(),
        }
    }

    /// Use a prebuilt column set.
    pub fn columns(mut self, columns: &'a ColumnSet) -> Self {
        self.columns = Some(Columns::Shared(columns));
        self
    }

    /// Build a column set from `spec` when the statement is generated.
    pub fn column_spec(mut self, spec: impl Into<ColumnSetSource>) -> Self {
        self.columns = Some(Columns::Spec(spec.into()));
        self
    }

    /// Destination table; wins over the column set's default table.
    pub fn table(mut self, table: impl Into<TableSource>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn options(mut self, options: UpdateOptions) -> Self {
        self.options = options;
        self
    }

    pub fn table_alias(mut self, alias: impl Into<String>) -> Self {
        self.options.table_alias = Some(alias.into());
        self
    }

    pub fn value_alias(mut self, alias: impl Into<String>) -> Self {
        self.options.value_alias = Some(alias.into());
        self
    }

    pub fn config(mut self, config: StmtConfig) -> Self {
        self.config = config;
        self
    }

    /// Upper- or lower-case SQL keywords.
    pub fn capitalize(mut self, capitalize: bool) -> Self {
        self.config.capitalize = capitalize;
        self
    }

    fn column_set(&self, rows: Rows<'a>) -> StmtResult<Cow<'a, ColumnSet>> {
        match (&self.columns, rows) {
            (Some(columns), _) => columns.resolve(),
            (None, Rows::One(shape)) => Ok(Cow::Owned(ColumnSet::new(shape, Default::default())?)),
            (None, Rows::Many(_)) => Err(StmtError::type_error(
                "Parameter 'columns' is required when updating multiple records.",
            )),
        }
    }

    /// Generate the UPDATE text.
    pub fn to_sql(&self) -> StmtResult<String> {
        let rows = Rows::of(self.data)?;
        let columns = self.column_set(rows)?;
        if let Rows::Many([]) = rows {
            return Err(StmtError::unsatisfiable(
                "Cannot generate an UPDATE from an empty array.",
            ));
        }

        let table = match (&self.table, columns.table()) {
            (Some(table), _) => table.clone().resolve()?,
            (None, Some(table)) => table.clone(),
            (None, None) => return Err(StmtError::unsatisfiable("Table name is unknown.")),
        };

        let sql = match rows {
            Rows::One(row) => {
                let sets = columns.render_assignments(row)?;
                if sets.is_empty() {
                    return Err(Self::no_columns());
                }
                let template = self.config.keywords("update $1^ set $2^");
                format(&template, &json!([table.name(), sets]))?
            }
            Rows::Many(items) => {
                let table_alias =
                    UpdateOptions::alias(self.options.table_alias.as_deref(), DEFAULT_TABLE_ALIAS)?;
                let value_alias =
                    UpdateOptions::alias(self.options.value_alias.as_deref(), DEFAULT_VALUE_ALIAS)?;

                let sets = columns
                    .columns()
                    .iter()
                    .filter(|c| !c.is_conditional())
                    .map(|c| {
                        format!(
                            "{n}={value_alias}.{n}{cast}",
                            n = c.escaped_name(),
                            cast = c.cast_suffix()
                        )
                    })
                    .collect::<Vec<_>>();
                if sets.is_empty() {
                    return Err(Self::no_columns());
                }

                let values = row_tuples(&columns, items, "update")?;
                let template = self
                    .config
                    .keywords("update $1^ as $2^ set $3^ from (values$4^) as $5^$6^");
                format(
                    &template,
                    &json!([
                        table.name(),
                        table_alias,
                        sets.join(","),
                        values,
                        value_alias,
                        columns.names_list()
                    ]),
                )?
            }
        };

        #[cfg(feature = "tracing")]
        tracing::trace!(
            target: "pgstmt.sql",
            kind = "update",
            rows = rows.len(),
            sql = %sql,
            "statement generated"
        );

        Ok(sql)
    }

    fn no_columns() -> StmtError {
        StmtError::unsatisfiable("Cannot generate a valid UPDATE without any columns.")
    }
}
