//! TOML-based configuration for sqlweave.
//!
//! Example configuration:
//! ```toml
//! [dialect]
//! name = "postgresql"
//! paramstyle = "named"        # override the dialect's placeholder style
//! max_identifier_length = 30
//!
//! [naming_convention]
//! pk = "pk_%(table_name)s"
//! fk = "fk_%(table_name)s_%(column_0_name)s_%(referred_table_name)s"
//! uq = "uq_%(table_name)s_%(column_0_N_name)s"
//! ck = "ck_%(table_name)s_%(constraint_name)s"
//! ix = "ix_%(column_0_label)s"
//!
//! [compile]
//! literal_binds = false
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::sql::compiler::CompileOptions;
use crate::sql::dialect::{ConfiguredDialect, Dialect, ParamStyle};
use crate::sql::naming::NamingConvention;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Target dialect and its overrides.
    pub dialect: DialectSettings,

    /// Constraint naming templates keyed by `pk`, `fk`, `uq`, `ck` and `ix`.
    ///
    /// An empty table keeps the default convention.
    pub naming_convention: BTreeMap<String, String>,

    /// Compilation switches.
    pub compile: CompileOptions,
}

/// Dialect selection.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DialectSettings {
    /// `ansi`, `postgresql`, `mysql`, `sqlite`, `mssql` or `duckdb`.
    pub name: Dialect,

    /// Placeholder style override.
    pub paramstyle: Option<ParamStyle>,

    /// Identifier length limit override.
    pub max_identifier_length: Option<usize>,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), dialect = %settings.dialect.name, "loaded settings");
        Ok(settings)
    }

    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.dialect.max_identifier_length == Some(0) {
            return Err(SettingsError::InvalidConfig(
                "dialect.max_identifier_length must be at least 1".to_string(),
            ));
        }
        // Surface bad convention keys at load time rather than at first use.
        self.naming_convention()?;
        Ok(())
    }

    /// The configured dialect with its overrides applied.
    pub fn dialect(&self) -> ConfiguredDialect {
        let mut dialect = ConfiguredDialect::new(self.dialect.name);
        dialect.param_style = self.dialect.paramstyle;
        dialect.max_identifier_length = self.dialect.max_identifier_length;
        dialect
    }

    /// The naming convention described by `[naming_convention]`.
    pub fn naming_convention(&self) -> Result<NamingConvention, SettingsError> {
        if self.naming_convention.is_empty() {
            return Ok(NamingConvention::default());
        }
        NamingConvention::from_map(self.naming_convention.clone())
            .map_err(|e| SettingsError::InvalidConfig(format!("naming_convention: {}", e)))
    }

    pub fn compile_options(&self) -> CompileOptions {
        self.compile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::SqlDialect;
    use crate::sql::naming::ConstraintKind;

    #[test]
    fn test_parse_toml() {
        let toml = r#"
[dialect]
name = "postgresql"
paramstyle = "qmark"
max_identifier_length = 30

[naming_convention]
uq = "uq_%(table_name)s_%(column_0_name)s"

[compile]
literal_binds = true
"#;

        let settings = Settings::from_toml_str(toml).unwrap();

        assert_eq!(settings.dialect.name, Dialect::Postgres);
        let dialect = settings.dialect();
        assert_eq!(dialect.param_style(), ParamStyle::Qmark);
        assert_eq!(dialect.max_identifier_length(), 30);
        assert_eq!(dialect.name(), "postgresql");

        let convention = settings.naming_convention().unwrap();
        assert_eq!(
            convention.template(ConstraintKind::Unique),
            Some("uq_%(table_name)s_%(column_0_name)s")
        );
        assert!(settings.compile_options().literal_binds);
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        let dialect = settings.dialect();

        assert_eq!(dialect.base, Dialect::Ansi);
        assert_eq!(dialect.param_style(), ParamStyle::Named);
        assert!(!settings.compile_options().literal_binds);
        assert_eq!(
            settings.naming_convention().unwrap().template(ConstraintKind::Index),
            Some("ix_%(column_0_label)s")
        );
    }

    #[test]
    fn test_mssql_alias() {
        let settings = Settings::from_toml_str("[dialect]\nname = \"mssql\"\n").unwrap();
        assert_eq!(settings.dialect.name, Dialect::TSql);
    }

    #[test]
    fn test_unknown_convention_key_rejected() {
        let err = Settings::from_toml_str("[naming_convention]\nzz = \"x\"\n").unwrap_err();
        assert!(matches!(err, SettingsError::InvalidConfig(_)));
    }

    #[test]
    fn test_unknown_dialect_rejected() {
        let err = Settings::from_toml_str("[dialect]\nname = \"oracle\"\n").unwrap_err();
        assert!(matches!(err, SettingsError::ParseError(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = Settings::from_file("/nonexistent/sqlweave.toml").unwrap_err();
        assert!(matches!(err, SettingsError::FileNotFound(_)));
    }
}
