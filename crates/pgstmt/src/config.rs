//! Library-wide statement settings.

use serde::{Deserialize, Serialize};

/// Settings shared by every statement generator.
///
/// Only affects the fixed SQL keywords of generated text (`INSERT INTO`, `SET`,
/// `FROM`, ...); identifiers and values are never re-cased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StmtConfig {
    /// Emit SQL keywords in upper case (default `true`).
    pub capitalize: bool,
}

impl Default for StmtConfig {
    fn default() -> Self {
        Self { capitalize: true }
    }
}

impl StmtConfig {
    /// Create a configuration with defaults (upper-case keywords).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set keyword casing.
    pub fn with_capitalize(mut self, capitalize: bool) -> Self {
        self.capitalize = capitalize;
        self
    }

    /// Upper-case keywords.
    pub fn capitalized() -> Self {
        Self { capitalize: true }
    }

    /// Lower-case keywords.
    pub fn lowercase() -> Self {
        Self { capitalize: false }
    }

    /// Apply keyword casing to a statement template.
    ///
    /// Templates are written in lower case; only the literal text is re-cased, never
    /// the substituted tokens, so callers must apply this before formatting.
    pub(crate) fn keywords(&self, template: &str) -> String {
        if self.capitalize {
            template.to_uppercase()
        } else {
            template.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_capitalized() {
        assert!(StmtConfig::default().capitalize);
        assert_eq!(StmtConfig::new().keywords("update $1^ set $2^"), "UPDATE $1^ SET $2^");
    }

    #[test]
    fn lowercase_keeps_template() {
        assert_eq!(
            StmtConfig::lowercase().keywords("insert into $1^"),
            "insert into $1^"
        );
    }

    #[test]
    fn deserializes_with_defaults() {
        let cfg: StmtConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, StmtConfig::capitalized());
        let cfg: StmtConfig = serde_json::from_str(r#"{"capitalize": false}"#).unwrap();
        assert_eq!(cfg, StmtConfig::lowercase().with_capitalize(false));
    }
}
