// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Analyzer Configuration
//!
//! This module provides configuration for the structure analyzer.
//!
//! ## Configuration Structure
//!
//! - SQL dialect used by the external parser
//! - Parser recursion limit (guards against deeply nested input)
//! - Identifier folding (PostgreSQL-style lower-casing of unquoted names)
//!
//! ## Example
//!
//! ```rust
//! use sql_structure_analyzer::{AnalyzerConfig, SqlDialect};
//!
//! let config = AnalyzerConfig {
//!     dialect: SqlDialect::DuckDb,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlparser::dialect::{
    AnsiDialect, BigQueryDialect, ClickHouseDialect, Dialect, DuckDbDialect, GenericDialect,
    HiveDialect, MsSqlDialect, MySqlDialect, PostgreSqlDialect, RedshiftSqlDialect,
    SQLiteDialect, SnowflakeDialect,
};
use std::fmt;
use std::str::FromStr;

/// Default parser recursion limit, matching the parser's own default
pub const DEFAULT_RECURSION_LIMIT: usize = 50;

/// SQL dialect handed to the external parser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SqlDialect {
    Generic,
    #[default]
    PostgreSql,
    MySql,
    DuckDb,
    Sqlite,
    BigQuery,
    Snowflake,
    ClickHouse,
    Ansi,
    MsSql,
    Hive,
    Redshift,
}

impl SqlDialect {
    /// Get all supported dialects
    pub fn all() -> &'static [SqlDialect] {
        &[
            SqlDialect::Generic,
            SqlDialect::PostgreSql,
            SqlDialect::MySql,
            SqlDialect::DuckDb,
            SqlDialect::Sqlite,
            SqlDialect::BigQuery,
            SqlDialect::Snowflake,
            SqlDialect::ClickHouse,
            SqlDialect::Ansi,
            SqlDialect::MsSql,
            SqlDialect::Hive,
            SqlDialect::Redshift,
        ]
    }

    /// Get dialect name as string
    pub fn name(&self) -> &'static str {
        match self {
            SqlDialect::Generic => "generic",
            SqlDialect::PostgreSql => "postgresql",
            SqlDialect::MySql => "mysql",
            SqlDialect::DuckDb => "duckdb",
            SqlDialect::Sqlite => "sqlite",
            SqlDialect::BigQuery => "bigquery",
            SqlDialect::Snowflake => "snowflake",
            SqlDialect::ClickHouse => "clickhouse",
            SqlDialect::Ansi => "ansi",
            SqlDialect::MsSql => "mssql",
            SqlDialect::Hive => "hive",
            SqlDialect::Redshift => "redshift",
        }
    }

    /// Parser dialect implementing this SQL flavor
    pub fn parser_dialect(&self) -> Box<dyn Dialect> {
        match self {
            SqlDialect::Generic => Box::new(GenericDialect {}),
            SqlDialect::PostgreSql => Box::new(PostgreSqlDialect {}),
            SqlDialect::MySql => Box::new(MySqlDialect {}),
            SqlDialect::DuckDb => Box::new(DuckDbDialect {}),
            SqlDialect::Sqlite => Box::new(SQLiteDialect {}),
            SqlDialect::BigQuery => Box::new(BigQueryDialect {}),
            SqlDialect::Snowflake => Box::new(SnowflakeDialect {}),
            SqlDialect::ClickHouse => Box::new(ClickHouseDialect {}),
            SqlDialect::Ansi => Box::new(AnsiDialect {}),
            SqlDialect::MsSql => Box::new(MsSqlDialect {}),
            SqlDialect::Hive => Box::new(HiveDialect {}),
            SqlDialect::Redshift => Box::new(RedshiftSqlDialect {}),
        }
    }
}

impl FromStr for SqlDialect {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generic" => Ok(SqlDialect::Generic),
            "postgresql" | "postgres" => Ok(SqlDialect::PostgreSql),
            "mysql" => Ok(SqlDialect::MySql),
            "duckdb" => Ok(SqlDialect::DuckDb),
            "sqlite" => Ok(SqlDialect::Sqlite),
            "bigquery" => Ok(SqlDialect::BigQuery),
            "snowflake" => Ok(SqlDialect::Snowflake),
            "clickhouse" => Ok(SqlDialect::ClickHouse),
            "ansi" => Ok(SqlDialect::Ansi),
            "mssql" => Ok(SqlDialect::MsSql),
            "hive" => Ok(SqlDialect::Hive),
            "redshift" => Ok(SqlDialect::Redshift),
            _ => Err(ConfigError::UnknownDialect(s.to_string())),
        }
    }
}

impl fmt::Display for SqlDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Main analyzer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalyzerConfig {
    /// SQL dialect
    pub dialect: SqlDialect,

    /// Maximum nesting depth the parser accepts
    pub recursion_limit: usize,

    /// Lower-case unquoted identifiers
    pub fold_identifiers: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            dialect: SqlDialect::default(),
            recursion_limit: DEFAULT_RECURSION_LIMIT,
            fold_identifiers: true,
        }
    }
}

impl AnalyzerConfig {
    pub fn new(dialect: SqlDialect) -> Self {
        Self {
            dialect,
            ..Default::default()
        }
    }

    pub fn with_recursion_limit(mut self, limit: usize) -> Self {
        self.recursion_limit = limit;
        self
    }

    pub fn with_fold_identifiers(mut self, fold: bool) -> Self {
        self.fold_identifiers = fold;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recursion_limit == 0 {
            return Err(ConfigError::InvalidRecursionLimit(self.recursion_limit));
        }
        Ok(())
    }

    /// Parse config from a client settings payload.
    ///
    /// Expected shape:
    /// {
    ///   "sqlStructure": {
    ///     "dialect": "postgresql" | "duckdb" | ...,
    ///     "recursionLimit": 50,
    ///     "foldIdentifiers": true
    ///   }
    /// }
    ///
    /// Returns `Ok(None)` when the payload has no `sqlStructure` section.
    pub fn from_settings(settings: &Value) -> Result<Option<Self>, ConfigError> {
        let Some(section) = settings.get("sqlStructure") else {
            return Ok(None);
        };

        // Accept dialect aliases ("postgres") and report unknown names as
        // UnknownDialect rather than a serde message
        let mut section = section.clone();
        if let Some(dialect) = section.get_mut("dialect") {
            if let Some(name) = dialect.as_str() {
                let parsed = SqlDialect::from_str(name)?;
                *dialect = Value::String(parsed.name().to_string());
            }
        }

        let config: AnalyzerConfig = serde_json::from_value(section)?;
        config.validate()?;
        Ok(Some(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_dialect_from_str() {
        assert_eq!(SqlDialect::from_str("postgres").unwrap(), SqlDialect::PostgreSql);
        assert_eq!(SqlDialect::from_str("DuckDB").unwrap(), SqlDialect::DuckDb);
        assert!(matches!(
            SqlDialect::from_str("cobol"),
            Err(ConfigError::UnknownDialect(_))
        ));
    }

    #[test]
    fn test_dialect_names_round_trip() {
        for dialect in SqlDialect::all() {
            assert_eq!(SqlDialect::from_str(dialect.name()).unwrap(), *dialect);
        }
    }

    #[test]
    fn test_default_config() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.dialect, SqlDialect::PostgreSql);
        assert_eq!(config.recursion_limit, DEFAULT_RECURSION_LIMIT);
        assert!(config.fold_identifiers);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_recursion_limit_is_invalid() {
        let config = AnalyzerConfig::default().with_recursion_limit(0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRecursionLimit(0))
        ));
    }

    #[test]
    fn test_from_settings() {
        let settings = json!({
            "sqlStructure": {
                "dialect": "postgres",
                "recursionLimit": 20,
                "foldIdentifiers": false
            }
        });
        let config = AnalyzerConfig::from_settings(&settings).unwrap().unwrap();
        assert_eq!(config.dialect, SqlDialect::PostgreSql);
        assert_eq!(config.recursion_limit, 20);
        assert!(!config.fold_identifiers);
    }

    #[test]
    fn test_from_settings_partial_uses_defaults() {
        let settings = json!({ "sqlStructure": { "dialect": "mysql" } });
        let config = AnalyzerConfig::from_settings(&settings).unwrap().unwrap();
        assert_eq!(config.dialect, SqlDialect::MySql);
        assert_eq!(config.recursion_limit, DEFAULT_RECURSION_LIMIT);
    }

    #[test]
    fn test_from_settings_missing_section() {
        assert!(AnalyzerConfig::from_settings(&json!({})).unwrap().is_none());
    }

    #[test]
    fn test_from_settings_rejects_unknown_dialect() {
        let settings = json!({ "sqlStructure": { "dialect": "cobol" } });
        assert!(matches!(
            AnalyzerConfig::from_settings(&settings),
            Err(ConfigError::UnknownDialect(_))
        ));
    }
}
