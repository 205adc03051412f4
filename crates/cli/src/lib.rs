// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # sql-structure command line
//!
//! Reads one SQL statement from a file or standard input and prints its
//! query tree as JSON, or only the names of the source tables it reads.
//!
//! ## Configuration file
//!
//! `--config` accepts a YAML file with the analyzer settings, either at the
//! top level or under a `sqlStructure` key:
//!
//! ```yaml
//! dialect: duckdb
//! recursionLimit: 100
//! foldIdentifiers: true
//! ```
//!
//! Command-line flags override values from the file.

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use sql_structure_analyzer::{Analyzer, AnalyzerConfig, SqlDialect};
use sql_structure_tree::QueryTree;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// sql-structure - Show the structure of a SQL statement
#[derive(Debug, Parser)]
#[command(name = "sql-structure", author, version, about, long_about = None)]
pub struct Cli {
    /// SQL file to analyze; standard input is read when omitted
    pub file: Option<PathBuf>,

    /// SQL dialect (postgresql, mysql, duckdb, sqlite, ...)
    #[arg(long, short)]
    pub dialect: Option<SqlDialect>,

    /// Include byte offsets (`start`/`end`) for every node
    #[arg(long)]
    pub locations: bool,

    /// Print only the source table names, one per line
    #[arg(long)]
    pub tables_only: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Keep unquoted identifiers as written instead of lower-casing them
    #[arg(long)]
    pub preserve_case: bool,

    /// YAML file with analyzer settings
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Analyzer settings from the config file, overridden by flags
    pub fn analyzer_config(&self) -> Result<AnalyzerConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => AnalyzerConfig::default(),
        };
        if let Some(dialect) = self.dialect {
            config.dialect = dialect;
        }
        if self.preserve_case {
            config.fold_identifiers = false;
        }
        config.validate()?;
        Ok(config)
    }

    /// Name of the input for messages
    pub fn input_name(&self) -> String {
        self.file
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<stdin>".to_string())
    }

    /// Read the SQL text from the file or standard input
    pub fn read_input(&self) -> Result<String> {
        match &self.file {
            Some(path) => std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display())),
            None => {
                let mut sql = String::new();
                std::io::stdin()
                    .read_to_string(&mut sql)
                    .context("failed to read standard input")?;
                Ok(sql)
            }
        }
    }
}

/// Load analyzer settings from a YAML file
pub fn load_config(path: &Path) -> Result<AnalyzerConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    parse_config(&text).with_context(|| format!("invalid config file {}", path.display()))
}

/// Parse YAML analyzer settings
///
/// Settings may sit at the top level or under `sqlStructure`; an empty
/// document yields the defaults.
pub fn parse_config(text: &str) -> Result<AnalyzerConfig> {
    let value: Value = serde_yaml::from_str(text)?;
    let settings = match value {
        Value::Null => return Ok(AnalyzerConfig::default()),
        value if value.get("sqlStructure").is_some() => value,
        section => serde_json::json!({ "sqlStructure": section }),
    };

    let config = AnalyzerConfig::from_settings(&settings)?.unwrap_or_default();
    Ok(config)
}

/// Render a tree the way the flags ask for
pub fn render(tree: &QueryTree, cli: &Cli) -> Result<String> {
    if cli.tables_only {
        return Ok(tree.source_table_names().join("\n"));
    }

    let value = tree.to_json(cli.locations);
    let text = if cli.pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(text)
}

/// Analyze `sql` and render the result
pub fn run(cli: &Cli, sql: &str) -> Result<String> {
    let config = cli.analyzer_config()?;
    debug!(dialect = %config.dialect, input = %cli.input_name(), "analyzing");

    let tree = Analyzer::new(config)
        .analyze(sql)
        .with_context(|| format!("failed to analyze {}", cli.input_name()))?;
    render(&tree, cli)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["sql-structure"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_flags_parse() {
        let cli = cli(&["query.sql", "--dialect", "duckdb", "--pretty", "--locations"]);
        assert_eq!(cli.file, Some(PathBuf::from("query.sql")));
        assert_eq!(cli.dialect, Some(SqlDialect::DuckDb));
        assert!(cli.pretty);
        assert!(cli.locations);
        assert!(!cli.tables_only);
    }

    #[test]
    fn test_unknown_dialect_is_rejected() {
        assert!(Cli::try_parse_from(["sql-structure", "--dialect", "cobol"]).is_err());
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = cli(&["-d", "mysql", "--preserve-case"])
            .analyzer_config()
            .unwrap();
        assert_eq!(config.dialect, SqlDialect::MySql);
        assert!(!config.fold_identifiers);
    }

    #[test]
    fn test_parse_config_top_level() {
        let config = parse_config("dialect: postgres\nrecursionLimit: 10\n").unwrap();
        assert_eq!(config.dialect, SqlDialect::PostgreSql);
        assert_eq!(config.recursion_limit, 10);
    }

    #[test]
    fn test_parse_config_nested_section() {
        let config = parse_config("sqlStructure:\n  dialect: sqlite\n  foldIdentifiers: false\n")
            .unwrap();
        assert_eq!(config.dialect, SqlDialect::Sqlite);
        assert!(!config.fold_identifiers);
    }

    #[test]
    fn test_parse_config_empty_document() {
        assert_eq!(parse_config("").unwrap(), AnalyzerConfig::default());
    }

    #[test]
    fn test_parse_config_rejects_bad_values() {
        assert!(parse_config("recursionLimit: 0").is_err());
        assert!(parse_config("dialect: cobol").is_err());
    }
}
