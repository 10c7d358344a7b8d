//! INSERT statement generator.

use super::{ColumnSet, ColumnSetSource, Columns, Rows, row_tuple, row_tuples};
use crate::config::StmtConfig;
use crate::error::{StmtError, StmtResult};
use crate::format::format;
use crate::ident::TableSource;
use serde_json::{Value, json};
use std::borrow::Cow;

/// INSERT generator for one object or an array of objects.
///
/// Columns come from a shared [`ColumnSet`], a column spec, or (single object
/// only) the object's own keys. The table comes from [`InsertStmt::table`] or the
/// column set's default table.
#[must_use]
#[derive(Debug, Clone)]
pub struct InsertStmt<'a> {
    data: &'a Value,
    columns: Option<Columns<'a>>,
    table: Option<TableSource>,
    config: StmtConfig,
}

impl<'a> InsertStmt<'a> {
    pub fn new(data: &'a Value) -> Self {
        Self {
            data,
            columns: None,
            table: None,
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
                "Parameter 'columns' is required when inserting multiple records.",
            )),
        }
    }

    /// Generate the INSERT text.
    pub fn to_sql(&self) -> StmtResult<String> {
        let rows = Rows::of(self.data)?;
        let columns = self.column_set(rows)?;
        if let Rows::Many([]) = rows {
            return Err(StmtError::unsatisfiable(
                "Cannot generate an INSERT from an empty array.",
            ));
        }

        let table = match (&self.table, columns.table()) {
            (Some(table), _) => table.clone().resolve()?,
            (None, Some(table)) => table.clone(),
            (None, None) => return Err(StmtError::unsatisfiable("Table name is unknown.")),
        };

        if columns.is_empty() {
            return Err(StmtError::unsatisfiable(
                "Cannot generate a valid INSERT without any columns.",
            ));
        }

        let values = match rows {
            Rows::One(row) => row_tuple(&columns, row)?,
            Rows::Many(rows) => row_tuples(&columns, rows, "insert")?,
        };

        let template = self.config.keywords("insert into $1^ $2^ values $3^");
        let sql = format(&template, &json!([table.name(), columns.names_list(), values]))?;

        #[cfg(feature = "tracing")]
        tracing::trace!(
            target: "pgstmt.sql",
            kind = "insert",
            rows = rows.len(),
            sql = %sql,
            "statement generated"
        );

        Ok(sql)
    }
}
