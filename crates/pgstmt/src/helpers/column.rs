//! Column descriptors.

use crate::error::{StmtError, StmtResult};
use crate::format::{Modifier, render};
use crate::ident::quote_ident;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Value-override callback, see [`ColumnConfig::init`].
pub type InitFn = Arc<dyn Fn(&ColumnContext<'_>) -> Value + Send + Sync>;

/// Dynamic exclusion predicate, see [`ColumnConfig::skip`].
pub type SkipFn = Arc<dyn Fn(&ColumnContext<'_>) -> bool + Send + Sync>;

/// What a column callback sees of the object being processed.
#[derive(Debug, Clone, Copy)]
pub struct ColumnContext<'a> {
    /// The source object.
    pub source: &'a Map<String, Value>,
    /// Effective property name of the column.
    pub name: &'a str,
    /// Current value: the property value, or the default when the property is missing.
    pub value: Option<&'a Value>,
    /// Whether `source` has the property.
    pub exists: bool,
}

/// Structured column specification.
///
/// # Example
/// ```
/// use pgstmt::{Column, ColumnConfig};
/// use serde_json::json;
///
/// let col = Column::new(
///     ColumnConfig::new("created")
///         .cast("::timestamptz")
///         .with_default(json!("now")),
/// )?;
/// assert_eq!(col.cast(), Some("timestamptz"));
/// assert_eq!(col.placeholder(), "${created}");
/// # Ok::<(), pgstmt::StmtError>(())
/// ```
#[derive(Clone)]
pub struct ColumnConfig {
    pub name: String,
    pub prop: Option<String>,
    pub modifier: Option<Modifier>,
    pub cast: Option<String>,
    pub conditional: bool,
    pub default: Option<Value>,
    pub init: Option<InitFn>,
    pub skip: Option<SkipFn>,
}

impl ColumnConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            prop: None,
            modifier: None,
            cast: None,
            conditional: false,
            default: None,
            init: None,
            skip: None,
        }
    }

    /// Read the value from a differently-named source property.
    pub fn prop(mut self, prop: impl Into<String>) -> Self {
        self.prop = Some(prop.into());
        self
    }

    pub fn modifier(mut self, modifier: Modifier) -> Self {
        self.modifier = Some(modifier);
        self
    }

    /// Server-side type cast; leading colons are stripped.
    pub fn cast(mut self, cast: impl Into<String>) -> Self {
        self.cast = Some(cast.into());
        self
    }

    /// Match-only column: kept out of SET lists.
    pub fn conditional(mut self, conditional: bool) -> Self {
        self.conditional = conditional;
        self
    }

    /// Value used when the source object lacks the property.
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Replace the resolved value. Runs whenever the property exists, and for a
    /// missing property only when a default is configured.
    pub fn init<F>(mut self, f: F) -> Self
    where
        F: Fn(&ColumnContext<'_>) -> Value + Send + Sync + 'static,
    {
        self.init = Some(Arc::new(f));
        self
    }

    /// Leave the column out of a single-object update when the predicate holds.
    /// Ignored for conditional columns and for multi-row updates.
    pub fn skip<F>(mut self, f: F) -> Self
    where
        F: Fn(&ColumnContext<'_>) -> bool + Send + Sync + 'static,
    {
        self.skip = Some(Arc::new(f));
        self
    }
}

impl fmt::Debug for ColumnConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnConfig")
            .field("name", &self.name)
            .field("prop", &self.prop)
            .field("modifier", &self.modifier)
            .field("cast", &self.cast)
            .field("conditional", &self.conditional)
            .field("default", &self.default)
            .field("init", &self.init.as_ref().map(|_| "<fn>"))
            .field("skip", &self.skip.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Anything a [`Column`] can be built from.
#[derive(Debug, Clone)]
pub enum ColumnSpec {
    /// Shorthand text: `[?...]name[modifier]`.
    Text(String),
    Config(ColumnConfig),
    Column(Column),
}

impl From<&str> for ColumnSpec {
    fn from(value: &str) -> Self {
        ColumnSpec::Text(value.to_string())
    }
}

impl From<String> for ColumnSpec {
    fn from(value: String) -> Self {
        ColumnSpec::Text(value)
    }
}

impl From<&String> for ColumnSpec {
    fn from(value: &String) -> Self {
        ColumnSpec::Text(value.clone())
    }
}

impl From<ColumnConfig> for ColumnSpec {
    fn from(value: ColumnConfig) -> Self {
        ColumnSpec::Config(value)
    }
}

impl From<Column> for ColumnSpec {
    fn from(value: Column) -> Self {
        ColumnSpec::Column(value)
    }
}

impl From<&Column> for ColumnSpec {
    fn from(value: &Column) -> Self {
        ColumnSpec::Column(value.clone())
    }
}

/// A normalized destination column.
///
/// Immutable once built; the placeholder, cast suffix and escaped name are
/// derived at construction.
#[derive(Clone)]
pub struct Column {
    name: String,
    prop: Option<String>,
    modifier: Option<Modifier>,
    cast: Option<String>,
    conditional: bool,
    default: Option<Value>,
    init: Option<InitFn>,
    skip: Option<SkipFn>,
    placeholder: String,
    cast_suffix: String,
    escaped_name: String,
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn optional_text(map: &Map<String, Value>, key: &str) -> StmtResult<Option<String>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(StmtError::type_error(format!(
            "Column '{key}' must be a text string, got {other}."
        ))),
    }
}

impl Column {
    /// Build a column from any supported specification.
    pub fn new(spec: impl Into<ColumnSpec>) -> StmtResult<Self> {
        match spec.into() {
            ColumnSpec::Text(text) => Self::parse(&text),
            ColumnSpec::Config(config) => Self::from_config(config),
            ColumnSpec::Column(column) => Ok(column),
        }
    }

    /// Parse the shorthand form: leading `?`s mark the column conditional, and the
    /// first modifier token found splits the name from its modifier.
    ///
    /// ```
    /// use pgstmt::{Column, Modifier};
    ///
    /// let col = Column::parse("?data:json")?;
    /// assert_eq!(col.name(), "data");
    /// assert_eq!(col.modifier(), Some(Modifier::Json));
    /// assert!(col.is_conditional());
    /// # Ok::<(), pgstmt::StmtError>(())
    /// ```
    pub fn parse(text: &str) -> StmtResult<Self> {
        let rest = text.trim_start_matches('?');
        let conditional = rest.len() != text.len();

        let found = Modifier::ALL
            .into_iter()
            .filter_map(|m| rest.find(m.token()).map(|pos| (pos, m)))
            .min_by_key(|(pos, _)| *pos);

        let (name, modifier) = match found {
            Some((pos, m)) => {
                let trailing = &rest[pos + m.token().len()..];
                if !trailing.is_empty() {
                    return Err(StmtError::value(format!(
                        "Invalid column syntax: \"{text}\"."
                    )));
                }
                (&rest[..pos], Some(m))
            }
            None => (rest, None),
        };

        let mut config = ColumnConfig::new(name).conditional(conditional);
        config.modifier = modifier;
        Self::from_config(config)
    }

    /// Build from a JSON string (shorthand) or object with the keys
    /// `name`, `prop`, `mod`, `cast`, `cnd` and `def`.
    pub fn from_value(value: &Value) -> StmtResult<Self> {
        match value {
            Value::String(text) => Self::parse(text),
            Value::Object(map) => {
                let name = match map.get("name") {
                    Some(Value::String(s)) => s.clone(),
                    _ => return Err(Self::bad_name()),
                };
                let mut config = ColumnConfig::new(name);
                config.prop = optional_text(map, "prop")?;
                config.modifier = match optional_text(map, "mod")? {
                    Some(m) if !m.is_empty() => Some(Modifier::parse(&m).ok_or_else(|| {
                        StmtError::value(format!("Invalid modifier: \"{m}\"."))
                    })?),
                    _ => None,
                };
                config.cast = optional_text(map, "cast")?;
                config.conditional = map.get("cnd").is_some_and(truthy);
                config.default = map.get("def").cloned();
                Self::from_config(config)
            }
            _ => Err(StmtError::type_error(
                "A column must be a string or a configurator object.",
            )),
        }
    }

    fn bad_name() -> StmtError {
        StmtError::type_error("Invalid column name: must be a non-empty text string.")
    }

    /// Validate a structured spec and derive the rendering strings.
    pub fn from_config(config: ColumnConfig) -> StmtResult<Self> {
        let ColumnConfig {
            name,
            prop,
            modifier,
            cast,
            conditional,
            default,
            init,
            skip,
        } = config;

        if name.is_empty() {
            return Err(Self::bad_name());
        }
        if let Some(prop) = &prop {
            if prop.is_empty() {
                return Err(StmtError::type_error(
                    "Invalid column prop: must be a non-empty text string.",
                ));
            }
        }

        let effective = prop.as_deref().unwrap_or(&name);
        let clashes = effective.contains('}')
            || Modifier::ALL.iter().any(|m| effective.ends_with(m.token()));
        if clashes {
            return Err(StmtError::value(format!(
                "Invalid property name \"{effective}\": it cannot be used in a placeholder."
            )));
        }

        let cast = cast
            .map(|c| c.trim_start_matches(':').to_string())
            .filter(|c| !c.is_empty());

        let mut placeholder = String::with_capacity(effective.len() + 8);
        placeholder.push_str("${");
        placeholder.push_str(effective);
        if let Some(m) = modifier {
            placeholder.push_str(m.token());
        }
        placeholder.push('}');

        let cast_suffix = cast.as_ref().map(|c| format!("::{c}")).unwrap_or_default();
        let escaped_name = quote_ident(&name);

        Ok(Self {
            name,
            prop,
            modifier,
            cast,
            conditional,
            default,
            init,
            skip,
            placeholder,
            cast_suffix,
            escaped_name,
        })
    }

    /// Destination column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Source property override.
    pub fn prop(&self) -> Option<&str> {
        self.prop.as_deref()
    }

    /// Name of the source property the value is read from.
    pub fn prop_name(&self) -> &str {
        self.prop.as_deref().unwrap_or(&self.name)
    }

    pub fn modifier(&self) -> Option<Modifier> {
        self.modifier
    }

    /// Type cast, without leading colons.
    pub fn cast(&self) -> Option<&str> {
        self.cast.as_deref()
    }

    pub fn is_conditional(&self) -> bool {
        self.conditional
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn has_init(&self) -> bool {
        self.init.is_some()
    }

    pub fn has_skip(&self) -> bool {
        self.skip.is_some()
    }

    /// Named token for this column's value, e.g. `${data:json}`.
    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    /// `::cast`, or empty.
    pub fn cast_suffix(&self) -> &str {
        &self.cast_suffix
    }

    /// Double-quoted column name.
    pub fn escaped_name(&self) -> &str {
        &self.escaped_name
    }

    /// Shorthand text that parses back to the same name, modifier and flag.
    pub fn to_spec(&self) -> String {
        let mut out = String::new();
        if self.conditional {
            out.push('?');
        }
        out.push_str(&self.name);
        if let Some(m) = self.modifier {
            out.push_str(m.token());
        }
        out
    }

    /// Value this column contributes for `source`, or `None` when nothing is written.
    pub(crate) fn resolve(&self, source: &Map<String, Value>) -> Option<Value> {
        let name = self.prop_name();
        let (current, exists) = match source.get(name) {
            Some(value) => (value, true),
            None => (self.default.as_ref()?, false),
        };
        Some(match &self.init {
            Some(init) => init(&ColumnContext {
                source,
                name,
                value: Some(current),
                exists,
            }),
            None => current.clone(),
        })
    }

    /// SQL text of a resolved value: rendered for the modifier, then cast.
    ///
    /// `None` is a property that was neither present nor defaulted.
    pub(crate) fn render(&self, value: Option<&Value>) -> StmtResult<String> {
        let value = value.ok_or_else(|| {
            StmtError::format(format!("Property '{}' doesn't exist.", self.prop_name()))
        })?;
        let mut out = render(value, self.modifier)?;
        out.push_str(&self.cast_suffix);
        Ok(out)
    }

    /// Whether the skip predicate excludes this column for `source`.
    pub(crate) fn skipped(&self, source: &Map<String, Value>) -> bool {
        let Some(skip) = &self.skip else {
            return false;
        };
        let name = self.prop_name();
        let value = source.get(name);
        skip(&ColumnContext {
            source,
            name,
            value,
            exists: value.is_some(),
        })
    }
}

impl fmt::Debug for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("name", &self.name)
            .field("prop", &self.prop)
            .field("modifier", &self.modifier)
            .field("cast", &self.cast)
            .field("conditional", &self.conditional)
            .field("default", &self.default)
            .field("init", &self.init.as_ref().map(|_| "<fn>"))
            .field("skip", &self.skip.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// Lists only the fields that are set.
impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Column {{ name: {:?}", self.name)?;
        if let Some(prop) = &self.prop {
            write!(f, ", prop: {prop:?}")?;
        }
        if let Some(m) = self.modifier {
            write!(f, ", mod: {:?}", m.token())?;
        }
        if let Some(cast) = &self.cast {
            write!(f, ", cast: {cast:?}")?;
        }
        if self.conditional {
            f.write_str(", cnd: true")?;
        }
        if let Some(def) = &self.default {
            write!(f, ", def: {def}")?;
        }
        if self.init.is_some() {
            f.write_str(", init: [fn]")?;
        }
        if self.skip.is_some() {
            f.write_str(", skip: [fn]")?;
        }
        f.write_str(" }")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_plain_name() {
        let col = Column::parse("id").unwrap();
        assert_eq!(col.name(), "id");
        assert_eq!(col.modifier(), None);
        assert!(!col.is_conditional());
        assert_eq!(col.placeholder(), "${id}");
        assert_eq!(col.escaped_name(), r#""id""#);
        assert_eq!(col.cast_suffix(), "");
    }

    #[test]
    fn parse_conditional_prefixes() {
        let col = Column::parse("??id").unwrap();
        assert_eq!(col.name(), "id");
        assert!(col.is_conditional());
    }

    #[test]
    fn parse_symbol_modifiers() {
        assert_eq!(Column::parse("a^").unwrap().modifier(), Some(Modifier::Caret));
        assert_eq!(Column::parse("a~").unwrap().modifier(), Some(Modifier::Tilde));
        assert_eq!(Column::parse("a#").unwrap().modifier(), Some(Modifier::Hash));
        assert_eq!(Column::parse("a:csv").unwrap().placeholder(), "${a:csv}");
    }

    #[test]
    fn parse_rejects_text_after_modifier() {
        let err = Column::parse("col:raw:name").unwrap_err();
        assert!(err.is_value_error());
    }

    #[test]
    fn parse_rejects_empty_name() {
        assert!(Column::parse("").unwrap_err().is_type_error());
        assert!(Column::parse("?").unwrap_err().is_type_error());
        assert!(Column::parse(":json").unwrap_err().is_type_error());
    }

    #[test]
    fn spec_text_reparses() {
        for text in ["id", "?id", "data:json", "?raw^", "v:value", "n~"] {
            let col = Column::parse(text).unwrap();
            let again = Column::parse(&col.to_spec()).unwrap();
            assert_eq!(again.name(), col.name());
            assert_eq!(again.modifier(), col.modifier());
            assert_eq!(again.is_conditional(), col.is_conditional());
        }
    }

    #[test]
    fn config_cast_strips_colons() {
        let col = Column::new(ColumnConfig::new("x").cast("::int")).unwrap();
        assert_eq!(col.cast(), Some("int"));
        assert_eq!(col.cast_suffix(), "::int");
    }

    #[test]
    fn config_prop_drives_placeholder() {
        let col = Column::new(
            ColumnConfig::new("first_name")
                .prop("firstName")
                .modifier(Modifier::Raw),
        )
        .unwrap();
        assert_eq!(col.placeholder(), "${firstName:raw}");
        assert_eq!(col.escaped_name(), r#""first_name""#);
    }

    #[test]
    fn dollar_signs_allowed_in_names() {
        assert_eq!(Column::parse("a$1").unwrap().escaped_name(), r#""a$1""#);
        assert_eq!(Column::parse("a$(b)").unwrap().placeholder(), "${a$(b)}");
        assert_eq!(Column::parse("a$b").unwrap().escaped_name(), r#""a$b""#);
        // `}` would end the placeholder early.
        assert!(Column::parse("a${b}").unwrap_err().is_value_error());
    }

    #[test]
    fn render_applies_modifier_then_cast() {
        let col = Column::new(
            ColumnConfig::new("a")
                .modifier(Modifier::Json)
                .cast("t$1"),
        )
        .unwrap();
        assert_eq!(col.render(Some(&json!({"k": 1}))).unwrap(), r#"'{"k":1}'::t$1"#);
        assert!(col.render(None).unwrap_err().is_format_error());
    }

    #[test]
    fn config_rejects_empty_prop() {
        let err = Column::new(ColumnConfig::new("x").prop("")).unwrap_err();
        assert!(err.is_type_error());
    }

    #[test]
    fn from_value_rejects_number() {
        let err = Column::from_value(&json!(123)).unwrap_err();
        assert!(err.is_type_error());
        assert_eq!(
            err.message(),
            "A column must be a string or a configurator object."
        );
    }

    #[test]
    fn from_value_object() {
        let col = Column::from_value(&json!({
            "name": "id",
            "mod": "^",
            "cast": "int",
            "cnd": 1,
            "def": null,
        }))
        .unwrap();
        assert_eq!(col.modifier(), Some(Modifier::Caret));
        assert!(col.is_conditional());
        assert_eq!(col.default_value(), Some(&Value::Null));
    }

    #[test]
    fn from_value_empty_mod_ignored() {
        let col = Column::from_value(&json!({"name": "id", "mod": ""})).unwrap();
        assert_eq!(col.modifier(), None);
    }

    #[test]
    fn from_value_requires_name() {
        assert!(Column::from_value(&json!({"prop": "x"})).unwrap_err().is_type_error());
    }

    #[test]
    fn display_lists_set_fields_only() {
        let col = Column::parse("id").unwrap();
        assert_eq!(col.to_string(), r#"Column { name: "id" }"#);

        let col = Column::new(
            ColumnConfig::new("id")
                .cast("int")
                .conditional(true)
                .with_default(5)
                .init(|ctx| ctx.value.cloned().unwrap_or(Value::Null)),
        )
        .unwrap();
        assert_eq!(
            col.to_string(),
            r#"Column { name: "id", cast: "int", cnd: true, def: 5, init: [fn] }"#
        );
    }

    #[test]
    fn resolve_default_and_init() {
        let empty = Map::new();
        let col = Column::new(ColumnConfig::new("n").with_default(5)).unwrap();
        assert_eq!(col.resolve(&empty), Some(json!(5)));

        let col = Column::new(
            ColumnConfig::new("n")
                .with_default(5)
                .init(|ctx| json!(ctx.value.and_then(Value::as_i64).unwrap_or(0) * 2)),
        )
        .unwrap();
        assert_eq!(col.resolve(&empty), Some(json!(10)));

        let col = Column::new(ColumnConfig::new("n").init(|_| json!(1))).unwrap();
        assert_eq!(col.resolve(&empty), None);
    }
}
