//! Reusable column sets with memoized SQL fragments.

use super::column::{Column, ColumnConfig, ColumnSpec};
use crate::error::{StmtError, StmtResult};
use crate::ident::{TableName, TableSource, as_alias};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

/// Options for [`ColumnSet::new`].
#[derive(Debug, Clone, Default)]
pub struct ColumnSetOptions {
    /// Default destination table for the generators.
    pub table: Option<TableSource>,
    /// Accepted for parity with prototype-based sources; JSON maps only have
    /// own keys, so this has no effect.
    pub inherit: bool,
}

impl ColumnSetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn table(mut self, table: impl Into<TableSource>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn inherit(mut self, inherit: bool) -> Self {
        self.inherit = inherit;
        self
    }
}

/// Anything a [`ColumnSet`] can be built from.
#[derive(Debug, Clone)]
pub enum ColumnSetSource {
    /// An ordered list of column specs.
    Specs(Vec<ColumnSpec>),
    /// Object shape: one column per key, in key order.
    Object(Map<String, Value>),
    /// Dynamic JSON: an array of specs or an object shape.
    Value(Value),
}

impl<T: Into<ColumnSpec>> From<Vec<T>> for ColumnSetSource {
    fn from(value: Vec<T>) -> Self {
        ColumnSetSource::Specs(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ColumnSpec>, const N: usize> From<[T; N]> for ColumnSetSource {
    fn from(value: [T; N]) -> Self {
        ColumnSetSource::Specs(value.into_iter().map(Into::into).collect())
    }
}

impl From<&[&str]> for ColumnSetSource {
    fn from(value: &[&str]) -> Self {
        ColumnSetSource::Specs(value.iter().map(|s| ColumnSpec::from(*s)).collect())
    }
}

impl From<Column> for ColumnSetSource {
    fn from(value: Column) -> Self {
        ColumnSetSource::Specs(vec![ColumnSpec::Column(value)])
    }
}

impl From<ColumnConfig> for ColumnSetSource {
    fn from(value: ColumnConfig) -> Self {
        ColumnSetSource::Specs(vec![ColumnSpec::Config(value)])
    }
}

impl From<Map<String, Value>> for ColumnSetSource {
    fn from(value: Map<String, Value>) -> Self {
        ColumnSetSource::Object(value)
    }
}

impl From<&Map<String, Value>> for ColumnSetSource {
    fn from(value: &Map<String, Value>) -> Self {
        ColumnSetSource::Object(value.clone())
    }
}

impl From<Value> for ColumnSetSource {
    fn from(value: Value) -> Self {
        ColumnSetSource::Value(value)
    }
}

impl From<&Value> for ColumnSetSource {
    fn from(value: &Value) -> Self {
        ColumnSetSource::Value(value.clone())
    }
}

/// Options for [`ColumnSet::assign_columns`].
#[derive(Debug, Clone, Default)]
pub struct AssignOptions {
    /// Alias prefixed to the value side, e.g. `excluded`.
    pub from: Option<String>,
    /// Alias prefixed to the target side.
    pub to: Option<String>,
    /// Column names left out.
    pub skip: Vec<String>,
}

impl AssignOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_alias(mut self, alias: impl Into<String>) -> Self {
        self.from = Some(alias.into());
        self
    }

    pub fn to_alias(mut self, alias: impl Into<String>) -> Self {
        self.to = Some(alias.into());
        self
    }

    pub fn skip<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip = names.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone)]
enum UpdateCache {
    /// A SET-list column has a `skip` predicate: the list depends on the object.
    Uncacheable,
    Lazy(OnceLock<String>),
}

/// An ordered, immutable set of columns describing one table shape.
///
/// Build it once and reuse it for every statement against that shape: the name
/// list, the placeholder list and (when no SET column has a `skip` predicate)
/// the assignment list are computed on first use and kept.
///
/// # Example
/// ```
/// use pgstmt::{ColumnSet, ColumnSetOptions};
///
/// let cs = ColumnSet::new(["?id", "name", "data:json"], ColumnSetOptions::new().table("users"))?;
/// assert_eq!(cs.names_list(), r#"("id","name","data")"#);
/// assert_eq!(cs.placeholders_list(), "${id},${name},${data:json}");
/// # Ok::<(), pgstmt::StmtError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ColumnSet {
    columns: Vec<Column>,
    table: Option<TableName>,
    names: OnceLock<String>,
    variables: OnceLock<String>,
    updates: UpdateCache,
}

impl ColumnSet {
    /// Build a column set.
    pub fn new(
        source: impl Into<ColumnSetSource>,
        options: ColumnSetOptions,
    ) -> StmtResult<Self> {
        let columns = match source.into() {
            ColumnSetSource::Specs(specs) => specs
                .into_iter()
                .map(Column::new)
                .collect::<StmtResult<Vec<_>>>()?,
            ColumnSetSource::Object(map) => Self::columns_of(&map)?,
            ColumnSetSource::Value(Value::Array(items)) => items
                .iter()
                .map(Column::from_value)
                .collect::<StmtResult<Vec<_>>>()?,
            ColumnSetSource::Value(Value::Object(map)) => Self::columns_of(&map)?,
            ColumnSetSource::Value(_) => {
                return Err(StmtError::type_error(
                    "Invalid parameter 'columns' specified.",
                ));
            }
        };
        let table = options.table.map(TableSource::into_name).transpose()?;
        Self::from_columns(columns, table)
    }

    /// One same-named column per key of an object shape.
    pub(crate) fn columns_of(map: &Map<String, Value>) -> StmtResult<Vec<Column>> {
        map.keys()
            .map(|key| Column::from_config(ColumnConfig::new(key.as_str())))
            .collect()
    }

    pub(crate) fn from_columns(columns: Vec<Column>, table: Option<TableName>) -> StmtResult<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        for col in &columns {
            if !seen.insert(col.name()) {
                return Err(StmtError::value(format!(
                    "Duplicate column name \"{}\".",
                    col.name()
                )));
            }
        }

        let cacheable = !columns
            .iter()
            .any(|c| !c.is_conditional() && c.has_skip());
        let updates = if cacheable {
            UpdateCache::Lazy(OnceLock::new())
        } else {
            UpdateCache::Uncacheable
        };

        #[cfg(feature = "tracing")]
        tracing::debug!(
            target: "pgstmt.columns",
            columns = columns.len(),
            table = table.as_ref().map(TableName::name),
            update_cacheable = cacheable,
            "column set built"
        );

        Ok(Self {
            columns,
            table,
            names: OnceLock::new(),
            variables: OnceLock::new(),
            updates,
        })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Default destination table.
    pub fn table(&self) -> Option<&TableName> {
        self.table.as_ref()
    }

    /// `("a","b",...)`, or an empty string when there are no columns.
    pub fn names_list(&self) -> &str {
        self.names.get_or_init(|| {
            if self.columns.is_empty() {
                return String::new();
            }
            let names: Vec<&str> = self.columns.iter().map(Column::escaped_name).collect();
            format!("({})", names.join(","))
        })
    }

    /// Every column's placeholder and cast, conditional columns included.
    ///
    /// Casts are copied verbatim, so the list is a template for [`format`](crate::format())
    /// only when no cast contains a `$` token. The generators render values directly.
    pub fn placeholders_list(&self) -> &str {
        self.variables.get_or_init(|| {
            self.columns
                .iter()
                .map(|c| format!("{}{}", c.placeholder(), c.cast_suffix()))
                .collect::<Vec<_>>()
                .join(",")
        })
    }

    /// `"col"=${prop}::cast,...` for the non-conditional columns not skipped for `source`.
    pub fn update_assignments(&self, source: &Map<String, Value>) -> Cow<'_, str> {
        match &self.updates {
            UpdateCache::Lazy(cache) => {
                Cow::Borrowed(cache.get_or_init(|| self.build_assignments(None)))
            }
            UpdateCache::Uncacheable => Cow::Owned(self.build_assignments(Some(source))),
        }
    }

    /// `(v1,v2,...)` content for one object: every column's prepared value rendered
    /// for its modifier and followed by its cast.
    pub(crate) fn render_tuple(&self, source: &Map<String, Value>) -> StmtResult<String> {
        let prepared = self.prepare(source);
        let values = self
            .columns
            .iter()
            .map(|c| c.render(prepared.get(c.prop_name())))
            .collect::<StmtResult<Vec<_>>>()?;
        Ok(values.join(","))
    }

    /// `"col"=value::cast,...` for one object, with the columns of
    /// [`update_assignments`](Self::update_assignments).
    pub(crate) fn render_assignments(&self, source: &Map<String, Value>) -> StmtResult<String> {
        let prepared = self.prepare(source);
        let mut sets = Vec::with_capacity(self.columns.len());
        for col in self.columns.iter().filter(|c| !c.is_conditional()) {
            if col.skipped(source) {
                continue;
            }
            let value = col.render(prepared.get(col.prop_name()))?;
            sets.push(format!("{}={value}", col.escaped_name()));
        }
        Ok(sets.join(","))
    }

    fn build_assignments(&self, source: Option<&Map<String, Value>>) -> String {
        self.columns
            .iter()
            .filter(|c| !c.is_conditional())
            .filter(|c| source.is_none_or(|s| !c.skipped(s)))
            .map(|c| format!("{}={}{}", c.escaped_name(), c.placeholder(), c.cast_suffix()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Whether an UPDATE for `data` would have at least one SET column.
    ///
    /// Arrays only subtract conditional columns: multi-row updates never consult `skip`.
    pub fn can_generate_update(&self, data: &Value) -> StmtResult<bool> {
        let conditional = self.columns.iter().filter(|c| c.is_conditional()).count();
        match data {
            Value::Array(rows) => Ok(self.columns.len() > conditional && !rows.is_empty()),
            Value::Object(source) => {
                let excluded = self
                    .columns
                    .iter()
                    .filter(|c| c.is_conditional() || c.skipped(source))
                    .count();
                Ok(self.columns.len() > excluded)
            }
            _ => Err(StmtError::type_error("Invalid parameter 'data' specified.")),
        }
    }

    /// Resolve every column's value for `source` (defaults and `init` applied).
    ///
    /// Keys are effective property names; columns with no value and no default
    /// are left out.
    pub fn prepare(&self, source: &Map<String, Value>) -> Map<String, Value> {
        let mut out = Map::new();
        for col in &self.columns {
            if let Some(value) = col.resolve(source) {
                out.insert(col.prop_name().to_string(), value);
            }
        }
        out
    }

    /// `to."col"=from."col",...` for the non-conditional columns, as used by
    /// `ON CONFLICT ... DO UPDATE SET` and `UPDATE ... FROM`.
    pub fn assign_columns(&self, options: &AssignOptions) -> StmtResult<String> {
        let prefix = |alias: &Option<String>| -> StmtResult<String> {
            match alias {
                Some(a) if !a.is_empty() => Ok(format!("{}.", as_alias(a)?)),
                _ => Ok(String::new()),
            }
        };
        let from = prefix(&options.from)?;
        let to = prefix(&options.to)?;
        Ok(self
            .columns
            .iter()
            .filter(|c| !c.is_conditional())
            .filter(|c| !options.skip.iter().any(|s| s == c.name()))
            .map(|c| format!("{to}{n}={from}{n}", n = c.escaped_name()))
            .collect::<Vec<_>>()
            .join(","))
    }

    /// New set with `specs` appended. Duplicate names fail.
    pub fn extend(&self, specs: impl Into<ColumnSetSource>) -> StmtResult<Self> {
        let added = Self::new(specs, ColumnSetOptions::default())?;
        let mut columns = self.columns.clone();
        columns.extend(added.columns);
        Self::from_columns(columns, self.table.clone())
    }

    /// New set where same-named columns of `specs` replace the existing ones in
    /// place and the rest are appended.
    pub fn merge(&self, specs: impl Into<ColumnSetSource>) -> StmtResult<Self> {
        let added = Self::new(specs, ColumnSetOptions::default())?;
        let mut columns = self.columns.clone();
        for col in added.columns {
            match columns.iter().position(|c| c.name() == col.name()) {
                Some(i) => columns[i] = col,
                None => columns.push(col),
            }
        }
        Self::from_columns(columns, self.table.clone())
    }
}

impl fmt::Display for ColumnSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ColumnSet {")?;
        if let Some(table) = &self.table {
            write!(f, "\n    table: {table}")?;
        }
        for col in &self.columns {
            write!(f, "\n    {col}")?;
        }
        f.write_str("\n}")
    }
}
