//! Template formatting with SQL-safe escaping.
//!
//! [`format`] substitutes tokens in a template with escaped literals or identifiers:
//!
//! - positional: `$1`, `$2`, ... index into a JSON array (a scalar is `$1`)
//! - named: `${prop}`, `$(prop)`, `$<prop>`, `$[prop]` look up a JSON object property
//!
//! An object only feeds named tokens; positional tokens are left as written. Property
//! names are matched exactly, whitespace included.
//!
//! Either form may end with a [`Modifier`] (`$1^`, `${data:json}`, `$(cols~)`).
//!
//! ```
//! use pgstmt::format;
//! use serde_json::json;
//!
//! let sql = format("SELECT ${cols~} WHERE name = ${name}", &json!({
//!     "cols": ["id", "name"],
//!     "name": "O'Neil",
//! }))?;
//! assert_eq!(sql, r#"SELECT "id","name" WHERE name = 'O''Neil'"#);
//! # Ok::<(), pgstmt::StmtError>(())
//! ```

use crate::error::{StmtError, StmtResult};
use crate::ident::quote_ident;
use serde_json::Value;
use std::fmt;

pub use crate::ident::{as_alias, as_name};

/// How a substituted value is rendered.
///
/// The symbolic forms are aliases: `^` renders like `:raw`, `~` like `:name`
/// and `#` like `:value`. Both spellings are kept so placeholders reproduce
/// the text they were declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// `:raw`, text injected verbatim.
    Raw,
    /// `:name`, SQL identifier(s).
    Name,
    /// `:json`, JSON text as a literal.
    Json,
    /// `:csv`, comma-separated formatted values.
    Csv,
    /// `:value`, escaped text without the surrounding quotes.
    Value,
    /// `^`
    Caret,
    /// `~`
    Tilde,
    /// `#`
    Hash,
}

impl Modifier {
    /// Every modifier, in the order they are matched inside a column spec.
    pub const ALL: [Modifier; 8] = [
        Modifier::Caret,
        Modifier::Tilde,
        Modifier::Hash,
        Modifier::Raw,
        Modifier::Name,
        Modifier::Json,
        Modifier::Csv,
        Modifier::Value,
    ];

    /// Template spelling of the modifier.
    pub fn token(self) -> &'static str {
        match self {
            Modifier::Raw => ":raw",
            Modifier::Name => ":name",
            Modifier::Json => ":json",
            Modifier::Csv => ":csv",
            Modifier::Value => ":value",
            Modifier::Caret => "^",
            Modifier::Tilde => "~",
            Modifier::Hash => "#",
        }
    }

    /// Parse an exact modifier token.
    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.token() == token)
    }

    /// Modifier that ends `text`, if any: `(rest, modifier)`.
    fn strip_suffix(text: &str) -> (&str, Option<Self>) {
        for m in Self::ALL {
            if let Some(rest) = text.strip_suffix(m.token()) {
                return (rest, Some(m));
            }
        }
        (text, None)
    }

    /// Modifier that starts `text`, if any, followed by a non-word character.
    fn strip_prefix(text: &str) -> (Option<Self>, &str) {
        for m in Self::ALL {
            if let Some(rest) = text.strip_prefix(m.token()) {
                let boundary = m.token().len() == 1
                    || !rest
                        .chars()
                        .next()
                        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
                if boundary {
                    return (Some(m), rest);
                }
            }
        }
        (None, text)
    }
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Substitute every token of `template` with the matching value from `values`.
pub fn format(template: &str, values: &Value) -> StmtResult<String> {
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 && !values.is_object() {
            let digits = &after[..digits];
            let index: usize = digits
                .parse()
                .map_err(|_| StmtError::format(format!("Invalid variable ${digits}")))?;
            let (modifier, tail) = Modifier::strip_prefix(&after[digits.len()..]);
            let value = positional(values, index)?;
            out.push_str(&render(value, modifier)?);
            rest = tail;
            continue;
        }

        let close = match after.chars().next() {
            Some('{') => Some('}'),
            Some('(') => Some(')'),
            Some('<') => Some('>'),
            Some('[') => Some(']'),
            _ => None,
        };
        let Some(close) = close else {
            out.push('$');
            rest = after;
            continue;
        };
        let Some(end) = after[1..].find(close) else {
            out.push('$');
            rest = after;
            continue;
        };

        let (prop, modifier) = Modifier::strip_suffix(&after[1..1 + end]);
        if prop.is_empty() {
            return Err(StmtError::format(format!(
                "Empty property name in \"${}\"",
                &after[..end + 2]
            )));
        }
        let value = named(values, prop)?;
        out.push_str(&render(value, modifier)?);
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

fn positional(values: &Value, index: usize) -> StmtResult<&Value> {
    let found = match values {
        Value::Array(items) => index.checked_sub(1).and_then(|i| items.get(i)),
        single if index == 1 => Some(single),
        _ => None,
    };
    found.ok_or_else(|| {
        let len = match values {
            Value::Array(items) => items.len(),
            _ => 1,
        };
        StmtError::format(format!(
            "Variable ${index} out of range. Parameters array length: {len}"
        ))
    })
}

fn named<'v>(values: &'v Value, prop: &str) -> StmtResult<&'v Value> {
    values
        .as_object()
        .and_then(|map| map.get(prop))
        .ok_or_else(|| StmtError::format(format!("Property '{prop}' doesn't exist.")))
}

/// Render a single value the way `format` would for the given modifier.
pub fn render(value: &Value, modifier: Option<Modifier>) -> StmtResult<String> {
    match modifier {
        None => literal(value),
        Some(Modifier::Raw | Modifier::Caret) => raw(value),
        Some(Modifier::Name | Modifier::Tilde) => names(value),
        Some(Modifier::Json) => json(value),
        Some(Modifier::Csv) => csv(value),
        Some(Modifier::Value | Modifier::Hash) => open_value(value),
    }
}

/// Single-quote a string literal, doubling embedded quotes.
pub fn quote_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('\'');
    push_escaped(&mut out, text);
    out.push('\'');
    out
}

fn push_escaped(out: &mut String, text: &str) {
    let mut position = 0;
    for (i, c) in text.char_indices() {
        if c == '\'' {
            out.push_str(&text[position..i]);
            out.push_str("''");
            position = i + 1;
        }
    }
    out.push_str(&text[position..]);
}

fn json_text(value: &Value) -> StmtResult<String> {
    serde_json::to_string(value).map_err(|e| StmtError::format(e.to_string()))
}

fn literal(value: &Value) -> StmtResult<String> {
    Ok(match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => quote_text(s),
        Value::Array(items) if items.is_empty() => "'{}'".to_string(),
        Value::Array(items) => format!("array{}", array_body(items)?),
        Value::Object(_) => quote_text(&json_text(value)?),
    })
}

fn array_body(items: &[Value]) -> StmtResult<String> {
    let mut parts = Vec::with_capacity(items.len());
    for item in items {
        parts.push(match item {
            Value::Array(inner) => array_body(inner)?,
            other => literal(other)?,
        });
    }
    Ok(format!("[{}]", parts.join(",")))
}

fn raw(value: &Value) -> StmtResult<String> {
    Ok(match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => json_text(value)?,
    })
}

fn one_name(value: &Value) -> StmtResult<String> {
    match value {
        Value::String(s) if s == "*" => Ok(s.clone()),
        Value::String(s) if !s.is_empty() => Ok(quote_ident(s)),
        other => Err(StmtError::format(format!("Invalid sql name: {other}"))),
    }
}

fn names(value: &Value) -> StmtResult<String> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                return Err(StmtError::format(
                    "Cannot retrieve sql names from an empty array.",
                ));
            }
            let parts = items.iter().map(one_name).collect::<StmtResult<Vec<_>>>()?;
            Ok(parts.join(","))
        }
        Value::Object(map) => {
            if map.is_empty() {
                return Err(StmtError::format(
                    "Cannot retrieve sql names from an empty object.",
                ));
            }
            Ok(map.keys().map(|k| quote_ident(k)).collect::<Vec<_>>().join(","))
        }
        other => one_name(other),
    }
}

fn json(value: &Value) -> StmtResult<String> {
    match value {
        Value::Null => Ok("null".to_string()),
        other => Ok(quote_text(&json_text(other)?)),
    }
}

fn csv(value: &Value) -> StmtResult<String> {
    let parts = match value {
        Value::Array(items) => items.iter().map(literal).collect::<StmtResult<Vec<_>>>()?,
        Value::Object(map) => map.values().map(literal).collect::<StmtResult<Vec<_>>>()?,
        other => return literal(other),
    };
    Ok(parts.join(","))
}

fn open_value(value: &Value) -> StmtResult<String> {
    match value {
        Value::Null => Err(StmtError::format("Open values cannot be null.")),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => {
            let mut out = String::with_capacity(s.len());
            push_escaped(&mut out, s);
            Ok(out)
        }
        Value::Array(_) | Value::Object(_) => Err(StmtError::format(
            "Open values cannot be arrays or objects.",
        )),
    }
}
