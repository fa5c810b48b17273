use serde::Deserialize;

use crate::error::RegistryError;
use crate::identifier::IdentifierRule;
use crate::model::KeyScheme;
use crate::score::ScorerKind;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Run configuration, usually loaded from a `*.terceros.toml` file.
/// Every section is optional; an empty document is a valid config.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub key_scheme: KeyScheme,
    #[serde(default)]
    pub scorer: ScorerKind,
    #[serde(default)]
    pub identifier: IdentifierRule,
    #[serde(default)]
    pub names: NamesConfig,
    #[serde(default)]
    pub transforms: TransformsConfig,
    #[serde(default)]
    pub sql: SqlConfig,
}

fn default_name() -> String {
    "terceros".into()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            key_scheme: KeyScheme::default(),
            scorer: ScorerKind::default(),
            identifier: IdentifierRule::default(),
            names: NamesConfig::default(),
            transforms: TransformsConfig::default(),
            sql: SqlConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Names
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NamesConfig {
    /// Placeholder words rejected in addition to the built-in stoplist.
    #[serde(default)]
    pub extra_stoplist: Vec<String>,
}

// ---------------------------------------------------------------------------
// Transforms
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransformsConfig {
    #[serde(default = "enabled")]
    pub repair_document_type: bool,
    #[serde(default = "enabled")]
    pub strip_document_prefix: bool,
    #[serde(default = "enabled")]
    pub split_full_name: bool,
}

fn enabled() -> bool {
    true
}

impl Default for TransformsConfig {
    fn default() -> Self {
        Self {
            repair_document_type: true,
            strip_document_prefix: true,
            split_full_name: true,
        }
    }
}

// ---------------------------------------------------------------------------
// SQL rendering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqlConfig {
    #[serde(default = "default_table")]
    pub table: String,
    /// Emits a `USE <database>;` header when set.
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default = "default_rows_per_statement")]
    pub rows_per_statement: usize,
    #[serde(default = "default_statements_per_file")]
    pub statements_per_file: usize,
}

fn default_table() -> String {
    "t_tercero".into()
}

fn default_rows_per_statement() -> usize {
    1000
}

fn default_statements_per_file() -> usize {
    100
}

impl Default for SqlConfig {
    fn default() -> Self {
        Self {
            table: default_table(),
            database: None,
            rows_per_statement: default_rows_per_statement(),
            statements_per_file: default_statements_per_file(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RegistryConfig {
    pub fn from_toml(input: &str) -> Result<Self, RegistryError> {
        let config: RegistryConfig =
            toml::from_str(input).map_err(|e| RegistryError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RegistryError> {
        let rule = &self.identifier;
        if rule.min_digits == 0 || rule.min_digits > rule.max_digits {
            return Err(RegistryError::ConfigValidation(format!(
                "identifier digits must satisfy 1 <= min_digits <= max_digits, got {}..={}",
                rule.min_digits, rule.max_digits
            )));
        }

        if self.sql.table.trim().is_empty() {
            return Err(RegistryError::ConfigValidation("sql.table must not be empty".into()));
        }

        if self.sql.rows_per_statement == 0 || self.sql.statements_per_file == 0 {
            return Err(RegistryError::ConfigValidation(
                "sql.rows_per_statement and sql.statements_per_file must be at least 1".into(),
            ));
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
