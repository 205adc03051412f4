// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Statement walker
//!
//! Recursive descent over the parser's AST with one function per construct
//! the query tree models. Each function reports an enter event to the
//! [`QueryTreeTracker`], descends into the children it cares about and
//! reports the matching exit, so the tracker always sees balanced events in
//! document order.
//!
//! | Construct | Tracker events |
//! |-----------|----------------|
//! | `WITH [RECURSIVE] ...` | `enter_cte`, one `enter_cte_table` per definition |
//! | `SELECT ...` | `enter_selection` |
//! | `FROM name [alias]` | `enter_table` |
//! | `FROM (SELECT ...) alias` | `enter_sub_query` |
//! | SELECT-list item | `enter_column`, `handle_ref` per reference |
//!
//! Within a SELECT the FROM clause is walked before the projection so that
//! aliases are registered before the columns that use them. Table-valued
//! function calls, `UNNEST` and similar FROM items are not modeled.
//!
//! Clauses that contribute no nodes of their own (JOIN conditions, WHERE,
//! GROUP BY, HAVING, QUALIFY, windows, ORDER BY, LIMIT) are still searched
//! for subqueries, so every table the statement reads is registered.
//! Queries already walked are remembered by address and never walked twice.

use crate::location::LineIndex;
use crate::names::NameFolding;
use crate::refs::{scan_expr, scan_subqueries, ExprEvent};
use crate::tracker::QueryTreeTracker;
use sql_structure_tree::SourceSpan;
use sqlparser::ast::{
    Cte, Expr, Query, Select, SelectItem, SetExpr, Spanned, Statement, TableFactor,
    TableWithJoins, Visit, With,
};
use sqlparser::tokenizer::Span;
use std::collections::HashSet;
use std::ptr;
use tracing::{debug, trace};

pub(crate) struct QueryWalker<'a> {
    tracker: QueryTreeTracker,
    index: &'a LineIndex<'a>,
    folding: NameFolding,
    /// Addresses of the queries walked so far; identity only, never read through
    walked: HashSet<*const Query>,
}

impl<'a> QueryWalker<'a> {
    pub(crate) fn new(index: &'a LineIndex<'a>, folding: NameFolding) -> Self {
        Self {
            tracker: QueryTreeTracker::new(),
            index,
            folding,
            walked: HashSet::new(),
        }
    }

    pub(crate) fn into_tracker(self) -> QueryTreeTracker {
        self.tracker
    }

    pub(crate) fn walk_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Query(query) => self.walk_query(query),
            Statement::Insert(insert) => match &insert.source {
                Some(source) => self.walk_query(source),
                None => debug!("INSERT without a source query has no structure"),
            },
            Statement::CreateView { query, .. } => self.walk_query(query),
            _ => debug!("statement kind is not analyzed"),
        }
    }

    fn walk_query(&mut self, query: &Query) {
        self.walked.insert(ptr::from_ref(query));
        match &query.with {
            Some(with) => self.walk_with(with, query),
            None => {
                self.walk_set_expr(&query.body);
                self.walk_remaining_subqueries(query, true);
            }
        }
    }

    fn walk_with(&mut self, with: &With, query: &Query) {
        if with.recursive {
            debug!(
                definitions = with.cte_tables.len(),
                "recursive WITH: self references are treated as plain CTE references"
            );
        }

        let span = self.location(query.span());
        self.tracker.enter_cte(span);
        for cte in &with.cte_tables {
            self.walk_cte_definition(cte);
        }
        self.walk_set_expr(&query.body);
        self.walk_remaining_subqueries(query, true);
        self.tracker.exit_node();
    }

    fn walk_cte_definition(&mut self, cte: &Cte) {
        let name = self.folding.ident(&cte.alias.name);
        let span = self.location(cte.alias.name.span.union(&cte.query.span()));

        self.tracker.enter_cte_table(&name, span);
        self.walk_query(&cte.query);
        self.tracker.exit_node();
    }

    fn walk_set_expr(&mut self, body: &SetExpr) {
        match body {
            SetExpr::Select(select) => self.walk_select(select),
            SetExpr::Query(query) => self.walk_query(query),
            SetExpr::SetOperation { left, right, .. } => {
                self.walk_set_expr(left);
                self.walk_set_expr(right);
            }
            _ => debug!("query body without a SELECT is not analyzed"),
        }
    }

    fn walk_select(&mut self, select: &Select) {
        let span = self.location(select.span());
        self.tracker.enter_selection(span);

        for table in &select.from {
            self.walk_table_with_joins(table);
        }
        for item in &select.projection {
            self.walk_select_item(item);
        }
        // Other clauses contribute no columns, only the subqueries they contain
        self.walk_remaining_subqueries(select, false);

        self.tracker.exit_node();
    }

    fn walk_table_with_joins(&mut self, table: &TableWithJoins) {
        self.walk_table_factor(&table.relation);
        for join in &table.joins {
            self.walk_table_factor(&join.relation);
        }
    }

    fn walk_table_factor(&mut self, factor: &TableFactor) {
        match factor {
            TableFactor::Table {
                name, alias, args, ..
            } => {
                if args.is_some() {
                    debug!(function = %name, "table-valued function call is not analyzed");
                    return;
                }
                let parts = self.folding.object_name(name);
                let alias = alias.as_ref().map(|alias| self.folding.ident(&alias.name));

                let span = self.location(factor.span());
                self.tracker
                    .enter_qualified_table(&parts, alias.as_deref(), span);
                self.tracker.exit_node();
            }
            TableFactor::Derived {
                subquery, alias, ..
            } => {
                let alias = alias.as_ref().map(|alias| self.folding.ident(&alias.name));
                let span = self.location(factor.span());

                self.tracker.enter_sub_query(alias.as_deref(), span);
                self.walk_query(subquery);
                self.tracker.exit_node();
            }
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => self.walk_table_with_joins(table_with_joins),
            _ => debug!("FROM item is not analyzed"),
        }
    }

    fn walk_select_item(&mut self, item: &SelectItem) {
        let span = self.location(item.span());
        match item {
            SelectItem::UnnamedExpr(expr) => self.walk_column(expr, None, span),
            SelectItem::ExprWithAlias { expr, alias } => {
                let alias = self.folding.ident(alias);
                self.walk_column(expr, Some(&alias), span);
            }
            SelectItem::Wildcard(_) => {
                self.tracker.enter_column(None, span);
                self.tracker.handle_ref(None, "*", span);
                self.tracker.exit_node();
            }
            SelectItem::QualifiedWildcard(..) => {
                let rendered = item.to_string();
                let prefix = rendered.find(".*").map_or(rendered.as_str(), |end| &rendered[..end]);
                let qualifier = self.folding.display_parts(prefix).pop();

                self.tracker.enter_column(None, span);
                self.tracker.handle_ref(qualifier.as_deref(), "*", span);
                self.tracker.exit_node();
            }
        }
    }

    fn walk_column(&mut self, expr: &Expr, alias: Option<&str>, span: Option<SourceSpan>) {
        self.tracker.enter_column(alias, span);
        let folding = self.folding;
        scan_expr(expr, folding, |event| match event {
            ExprEvent::Reference {
                qualifier,
                name,
                span,
            } => {
                let span = self.location(span);
                self.tracker.handle_ref(qualifier, name, span);
            }
            ExprEvent::Subquery(query) => self.walk_query(query),
        });
        self.tracker.exit_node();
    }

    /// Walk every outermost subquery below `node` that has not been walked yet
    fn walk_remaining_subqueries<T: Visit>(&mut self, node: &T, skip_root: bool) {
        scan_subqueries(node, skip_root, |query| {
            if self.walked.contains(&ptr::from_ref(query)) {
                return;
            }
            trace!("walking subquery outside of FROM and the SELECT list");
            self.walk_query(query);
        });
    }

    fn location(&self, span: Span) -> Option<SourceSpan> {
        self.index.span(span)
    }
}
