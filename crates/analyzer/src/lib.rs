// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # SQL Structure Analyzer
//!
//! Builds a [`QueryTree`] describing the structure of one SQL statement:
//! every SELECT block, WITH clause, referenced table, inline subquery,
//! projected column and column reference, with aliases resolved according to
//! lexical scope.
//!
//! ## Overview
//!
//! Analysis runs in three steps:
//! - **Parse**: the text is parsed by `sqlparser` using the configured dialect
//! - **Walk**: a recursive-descent walker visits the statement in document order
//! - **Track**: the [`QueryTreeTracker`] turns walker events into tree nodes
//!
//! ```rust
//! use sql_structure_analyzer::analyze;
//!
//! let tree = analyze("SELECT o.id FROM orders o").unwrap();
//! assert_eq!(tree.source_table_names(), vec!["orders"]);
//! ```
//!
//! ## CTE handling
//!
//! Names bound by a WITH clause are never reported as source tables:
//!
//! ```rust
//! use sql_structure_analyzer::{Analyzer, AnalyzerConfig};
//!
//! let analyzer = Analyzer::new(AnalyzerConfig::default());
//! let tree = analyzer
//!     .analyze("WITH recent AS (SELECT * FROM orders) SELECT * FROM recent")
//!     .unwrap();
//! assert_eq!(tree.source_table_names(), vec!["orders"]);
//! ```

pub mod config;
pub mod error;
pub mod location;
mod names;
mod refs;
pub mod tracker;
mod walker;

pub use config::{AnalyzerConfig, SqlDialect, DEFAULT_RECURSION_LIMIT};
pub use error::{AnalyzerError, AnalyzerResult, ConfigError};
pub use location::LineIndex;
pub use sql_structure_tree::QueryTree;
pub use tracker::{QueryTreeTracker, ScopeKind};

use names::NameFolding;
use sqlparser::ast::Statement;
use sqlparser::parser::Parser;
use tracing::{debug, warn};
use walker::QueryWalker;

/// Configured entry point for analysis
///
/// Holds only configuration, so one analyzer can serve any number of
/// independent calls, including from several threads.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    config: AnalyzerConfig,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Self {
        Self { config }
    }

    /// Create an analyzer after validating the configuration
    pub fn try_new(config: AnalyzerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Parse the text and return its first statement
    ///
    /// Scripts with more than one statement are truncated to the first one.
    pub fn parse_statement(&self, sql: &str) -> AnalyzerResult<Statement> {
        let dialect = self.config.dialect.parser_dialect();
        let mut statements = Parser::new(&*dialect)
            .with_recursion_limit(self.config.recursion_limit)
            .try_with_sql(sql)?
            .parse_statements()?;

        debug!(
            dialect = %self.config.dialect,
            statements = statements.len(),
            "parsed SQL text"
        );
        if statements.len() > 1 {
            warn!(
                ignored = statements.len() - 1,
                "only the first statement is analyzed"
            );
        }

        if statements.is_empty() {
            return Err(AnalyzerError::EmptyInput);
        }
        Ok(statements.swap_remove(0))
    }

    /// Build the query tree of the first statement in `sql`
    pub fn analyze(&self, sql: &str) -> AnalyzerResult<QueryTree> {
        let statement = self.parse_statement(sql)?;
        Ok(self.run_tracker(&statement, sql).finish())
    }

    /// Walk an already parsed statement and return the tracker
    ///
    /// `sql` must be the text the statement was parsed from; it is used to
    /// turn parser locations into byte offsets. The tracker is returned
    /// unfinished so its counters can be inspected.
    pub fn run_tracker(&self, statement: &Statement, sql: &str) -> QueryTreeTracker {
        let index = LineIndex::new(sql);
        let mut walker = QueryWalker::new(&index, NameFolding::new(self.config.fold_identifiers));
        walker.walk_statement(statement);
        walker.into_tracker()
    }
}

/// Analyze `sql` with the default configuration
pub fn analyze(sql: &str) -> AnalyzerResult<QueryTree> {
    Analyzer::default().analyze(sql)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        assert!(matches!(analyze(""), Err(AnalyzerError::EmptyInput)));
        assert!(matches!(analyze("  ;  "), Err(AnalyzerError::EmptyInput)));
    }

    #[test]
    fn test_syntax_error_is_reported() {
        let err = analyze("SELECT FROM").unwrap_err();
        assert!(err.is_syntax_error());
    }

    #[test]
    fn test_first_statement_only() {
        let tree = analyze("SELECT a FROM first_t; SELECT b FROM second_t").unwrap();
        assert_eq!(tree.source_table_names(), vec!["first_t"]);
    }

    #[test]
    fn test_try_new_rejects_invalid_config() {
        let config = AnalyzerConfig::default().with_recursion_limit(0);
        assert!(Analyzer::try_new(config).is_err());
    }

    #[test]
    fn test_analyzer_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Analyzer>();
    }
}
