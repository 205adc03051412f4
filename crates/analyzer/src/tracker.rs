// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details
//
//! # Query tree tracker
//!
//! The tracker receives enter/exit events from the walker in document order
//! and builds the [`QueryTree`] as it goes.
//!
//! ## Scoping
//!
//! A single stack of scope frames records the construct that is open at each
//! depth. Tables are additionally registered in a lookup map keyed by alias;
//! each key holds a stack so that an inner binding shadows an outer one. The
//! binding lives as long as the Select or CTE that owns the table, and closing
//! that owner restores the outer binding.
//!
//! ```sql
//! SELECT t.a                                -- resolves to `orders t`
//! FROM orders t
//! WHERE EXISTS (SELECT t.b FROM items t)    -- inner `t` shadows while open
//! ```
//!
//! ## CTE names
//!
//! Every name bound by a CTE is remembered for the rest of the statement.
//! Tables with such a name are never reported as source tables, even after
//! the WITH clause that bound the name has closed.
//!
//! ## Failure semantics
//!
//! The tracker never fails. A qualifier with no visible table leaves the
//! reference unresolved; an exit without a matching enter is logged and
//! ignored.

use sql_structure_tree::{
    ColumnNode, ColumnRefNode, CteNode, NestedSelectNode, NodeId, NodeKind, QueryTree,
    SelectNode, SourceSpan, TableNode,
};
use std::collections::{HashMap, HashSet};
use tracing::{trace, warn};

/// Kind of an open scope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Select,
    Cte,
    Table,
    Column,
}

/// An open construct on the scope stack
///
/// Selects and CTEs own the lookup bindings of the tables registered in them;
/// the bindings are dropped when the owner closes.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Scope {
    Select { id: NodeId, bindings: Vec<String> },
    Cte { id: NodeId, bindings: Vec<String> },
    Table(NodeId),
    Column(NodeId),
}

impl Scope {
    fn kind(&self) -> ScopeKind {
        match self {
            Scope::Select { .. } => ScopeKind::Select,
            Scope::Cte { .. } => ScopeKind::Cte,
            Scope::Table(_) => ScopeKind::Table,
            Scope::Column(_) => ScopeKind::Column,
        }
    }

    fn id(&self) -> NodeId {
        match self {
            Scope::Select { id, .. } | Scope::Cte { id, .. } => *id,
            Scope::Table(id) | Scope::Column(id) => *id,
        }
    }
}

/// Builds a [`QueryTree`] from walker events
#[derive(Debug, Default)]
pub struct QueryTreeTracker {
    tree: QueryTree,
    scopes: Vec<Scope>,
    table_map: HashMap<String, Vec<NodeId>>,
    temporary_tables: HashSet<String>,
    enter_count: usize,
    exit_count: usize,
}

impl QueryTreeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a SELECT block
    ///
    /// The new select fills the `select` slot of the enclosing CTE or nested
    /// select when that slot is still empty, and becomes the root if none is
    /// set yet.
    pub fn enter_selection(&mut self, span: Option<SourceSpan>) -> NodeId {
        let id = self
            .tree
            .add_node(NodeKind::Select(SelectNode::default()), span);

        if let Some(parent) = self.scopes.last().map(Scope::id) {
            if let Some(node) = self.tree.node_mut(parent) {
                match &mut node.kind {
                    NodeKind::Cte(cte) if cte.select.is_none() => cte.select = Some(id),
                    NodeKind::NestedSelect(nested) if nested.select.is_none() => {
                        nested.select = Some(id)
                    }
                    _ => {}
                }
            }
        }

        self.tree.set_root_if_unset(id);
        self.push(Scope::Select {
            id,
            bindings: Vec::new(),
        });
        id
    }

    /// Open a WITH clause
    pub fn enter_cte(&mut self, span: Option<SourceSpan>) -> NodeId {
        let id = self.tree.add_node(NodeKind::Cte(CteNode::default()), span);
        self.tree.set_root_if_unset(id);
        self.push(Scope::Cte {
            id,
            bindings: Vec::new(),
        });
        id
    }

    /// Open a named table from a FROM clause
    ///
    /// `alias` defaults to `table_name`. The table is a source table unless
    /// its name was bound by a CTE earlier in the statement.
    pub fn enter_table(
        &mut self,
        table_name: &str,
        alias: Option<&str>,
        span: Option<SourceSpan>,
    ) -> NodeId {
        self.open_table(table_name, alias, None, span)
    }

    /// Open a table whose name may carry a schema or catalog prefix
    ///
    /// The table name is the dotted join of `parts` and `alias` still defaults
    /// to it. Without an explicit alias the last part is bound as well, so
    /// `public.orders` can be referenced as `orders`.
    pub fn enter_qualified_table(
        &mut self,
        parts: &[String],
        alias: Option<&str>,
        span: Option<SourceSpan>,
    ) -> NodeId {
        let table_name = parts.join(".");
        let short_name = match (alias, parts) {
            (None, [_, .., last]) => Some(last.as_str()),
            _ => None,
        };
        self.open_table(&table_name, alias, short_name, span)
    }

    /// Open a subquery used as a table (`FROM (SELECT ...) alias`)
    pub fn enter_sub_query(&mut self, alias: Option<&str>, span: Option<SourceSpan>) -> NodeId {
        let nested = NestedSelectNode::new(None, alias.map(str::to_string));
        let keys = nested.table.lookup_name().map(str::to_string).into_iter().collect();
        let id = self.tree.add_node(NodeKind::NestedSelect(nested), span);
        self.register_table(id, keys, false);
        self.push(Scope::Table(id));
        id
    }

    /// Open one CTE definition (`name AS (...)`)
    ///
    /// The name is marked as temporary before the definition is registered,
    /// so the body and everything after it see `name` as a non-source table.
    pub fn enter_cte_table(&mut self, name: &str, span: Option<SourceSpan>) -> NodeId {
        self.temporary_tables.insert(name.to_string());
        let nested = NestedSelectNode::new(Some(name.to_string()), None);
        let keys = nested.table.lookup_name().map(str::to_string).into_iter().collect();
        let id = self.tree.add_node(NodeKind::NestedSelect(nested), span);
        self.register_table(id, keys, false);
        self.push(Scope::Table(id));
        id
    }

    /// Open one item of a SELECT list
    pub fn enter_column(&mut self, alias: Option<&str>, span: Option<SourceSpan>) -> NodeId {
        let column = ColumnNode {
            column_refs: Vec::new(),
            alias: alias.map(str::to_string),
        };
        let id = self.tree.add_node(NodeKind::Column(column), span);

        if let Some(select) = self.nearest(ScopeKind::Select) {
            if let Some(NodeKind::Select(node)) = self.tree.node_mut(select).map(|n| &mut n.kind) {
                node.columns.push(id);
            }
        }

        self.push(Scope::Column(id));
        id
    }

    /// Close the innermost open construct
    ///
    /// Closing a Select or CTE drops the lookup bindings of its tables,
    /// restoring whatever bindings they shadowed.
    pub fn exit_node(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            warn!("exit_node called with no open scope");
            return;
        };
        self.exit_count += 1;
        trace!(kind = ?scope.kind(), node = %scope.id(), depth = self.scopes.len(), "exit scope");

        if let Scope::Select { bindings, .. } | Scope::Cte { bindings, .. } = scope {
            for key in bindings.iter().rev() {
                if let Some(stack) = self.table_map.get_mut(key) {
                    stack.pop();
                    if stack.is_empty() {
                        self.table_map.remove(key);
                    }
                }
            }
        }
    }

    /// Record a column reference inside the open column
    ///
    /// Ignored unless the innermost scope is a column. Qualified references
    /// resolve against the innermost table registered under the qualifier;
    /// unqualified ones are left unresolved.
    pub fn handle_ref(
        &mut self,
        qualifier: Option<&str>,
        name: &str,
        span: Option<SourceSpan>,
    ) -> Option<NodeId> {
        let column = match self.scopes.last() {
            Some(Scope::Column(id)) => *id,
            _ => {
                trace!(name, "reference outside of a column ignored");
                return None;
            }
        };

        let table = qualifier.and_then(|q| self.lookup_table(q));
        let full_name = match (qualifier, table) {
            (Some(q), Some(_)) => format!("{}.{}", q, name),
            _ => name.to_string(),
        };
        trace!(%full_name, resolved = table.is_some(), "column reference");

        let id = self.tree.add_node(
            NodeKind::ColumnRef(ColumnRefNode {
                name: name.to_string(),
                full_name,
                table,
            }),
            span,
        );
        if let Some(NodeKind::Column(node)) = self.tree.node_mut(column).map(|n| &mut n.kind) {
            node.column_refs.push(id);
        }
        Some(id)
    }

    /// Innermost table currently visible under `name`
    pub fn lookup_table(&self, name: &str) -> Option<NodeId> {
        self.table_map
            .get(name)
            .and_then(|bindings| bindings.last().copied())
    }

    /// Whether `name` has been bound by a CTE anywhere so far
    pub fn is_temporary_table(&self, name: &str) -> bool {
        self.temporary_tables.contains(name)
    }

    /// Kind of the innermost open scope
    pub fn current_kind(&self) -> Option<ScopeKind> {
        self.scopes.last().map(Scope::kind)
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn enter_count(&self) -> usize {
        self.enter_count
    }

    pub fn exit_count(&self) -> usize {
        self.exit_count
    }

    /// Every enter has been matched by an exit
    pub fn is_balanced(&self) -> bool {
        self.scopes.is_empty() && self.enter_count == self.exit_count
    }

    pub fn tree(&self) -> &QueryTree {
        &self.tree
    }

    /// Hand over the finished tree
    pub fn finish(self) -> QueryTree {
        if !self.is_balanced() {
            warn!(
                open = self.scopes.len(),
                enters = self.enter_count,
                exits = self.exit_count,
                "query tree finished with unbalanced scopes"
            );
        }
        self.tree
    }

    fn push(&mut self, scope: Scope) {
        self.enter_count += 1;
        trace!(kind = ?scope.kind(), node = %scope.id(), depth = self.scopes.len(), "enter scope");
        self.scopes.push(scope);
    }

    fn nearest(&self, kind: ScopeKind) -> Option<NodeId> {
        self.scopes
            .iter()
            .rev()
            .find(|scope| scope.kind() == kind)
            .map(Scope::id)
    }

    fn open_table(
        &mut self,
        table_name: &str,
        alias: Option<&str>,
        extra_key: Option<&str>,
        span: Option<SourceSpan>,
    ) -> NodeId {
        let is_source_table = !self.temporary_tables.contains(table_name);
        let table = TableNode::new(
            Some(table_name.to_string()),
            alias.map(str::to_string),
            is_source_table,
        );
        let keys = table
            .lookup_name()
            .into_iter()
            .chain(extra_key)
            .map(str::to_string)
            .collect();
        let id = self.tree.add_node(NodeKind::Table(table), span);
        self.register_table(id, keys, is_source_table);
        self.push(Scope::Table(id));
        id
    }

    /// Shared registration for tables, subqueries and CTE definitions
    ///
    /// The table is appended to the nearest open Select or CTE, which also
    /// owns its lookup bindings. Source tables go to the tree's flat list.
    fn register_table(&mut self, id: NodeId, keys: Vec<String>, is_source_table: bool) {
        let owner = self
            .scopes
            .iter_mut()
            .rev()
            .find(|scope| matches!(scope.kind(), ScopeKind::Select | ScopeKind::Cte));

        match owner {
            Some(Scope::Select { id: owner, bindings } | Scope::Cte { id: owner, bindings }) => {
                let owner = *owner;
                for key in keys {
                    self.table_map.entry(key.clone()).or_default().push(id);
                    bindings.push(key);
                }
                match self.tree.node_mut(owner).map(|n| &mut n.kind) {
                    Some(NodeKind::Select(select)) => select.tables.push(id),
                    Some(NodeKind::Cte(cte)) => cte.tables.push(id),
                    _ => {}
                }
            }
            _ => trace!(node = %id, "table registered outside of any select"),
        }

        if is_source_table {
            self.tree.add_source_table(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sql_structure_tree::NodeType;

    #[test]
    fn test_simple_select() {
        let mut tracker = QueryTreeTracker::new();
        let select = tracker.enter_selection(None);
        let orders = tracker.enter_table("orders", None, None);
        tracker.exit_node();
        tracker.enter_column(None, None);
        tracker.handle_ref(None, "a", None);
        tracker.exit_node();
        tracker.exit_node();

        assert!(tracker.is_balanced());
        let tree = tracker.finish();
        assert_eq!(tree.root(), Some(select));
        assert_eq!(tree.source_tables(), &[orders]);

        let select_node = tree.node(select).unwrap().as_select().unwrap();
        assert_eq!(select_node.tables, vec![orders]);
        assert_eq!(select_node.columns.len(), 1);
    }

    #[test]
    fn test_alias_visible_until_owner_closes() {
        let mut tracker = QueryTreeTracker::new();
        tracker.enter_selection(None);
        let orders = tracker.enter_table("orders", Some("o"), None);
        tracker.exit_node();

        tracker.enter_column(None, None);
        let resolved = tracker.handle_ref(Some("o"), "id", None).unwrap();
        let missing = tracker.handle_ref(Some("x"), "id", None).unwrap();
        let bare = tracker.handle_ref(None, "id", None).unwrap();
        tracker.exit_node();
        tracker.exit_node();
        assert_eq!(tracker.lookup_table("o"), None);

        let tree = tracker.finish();
        let resolved = tree.node(resolved).unwrap().as_column_ref().unwrap();
        assert_eq!(resolved.full_name, "o.id");
        assert_eq!(resolved.table, Some(orders));

        let missing = tree.node(missing).unwrap().as_column_ref().unwrap();
        assert_eq!(missing.full_name, "id");
        assert!(missing.table.is_none());

        let bare = tree.node(bare).unwrap().as_column_ref().unwrap();
        assert_eq!(bare.full_name, "id");
        assert!(bare.table.is_none());
    }

    #[test]
    fn test_inner_binding_shadows_then_restores() {
        let mut tracker = QueryTreeTracker::new();
        tracker.enter_selection(None);
        let outer = tracker.enter_table("orders", Some("t"), None);
        tracker.exit_node();

        // scalar subquery in the SELECT list
        tracker.enter_column(None, None);
        tracker.enter_selection(None);
        let inner = tracker.enter_table("items", Some("t"), None);
        tracker.exit_node();
        assert_eq!(tracker.lookup_table("t"), Some(inner));
        tracker.exit_node();
        assert_eq!(tracker.lookup_table("t"), Some(outer));
        tracker.exit_node();

        tracker.exit_node();
        assert_eq!(tracker.lookup_table("t"), None);
        assert!(tracker.is_balanced());
    }

    #[test]
    fn test_qualified_table_keeps_full_name_as_alias() {
        let mut tracker = QueryTreeTracker::new();
        tracker.enter_selection(None);
        let parts = ["public".to_string(), "orders".to_string()];
        let orders = tracker.enter_qualified_table(&parts, None, None);
        tracker.exit_node();

        assert_eq!(tracker.lookup_table("public.orders"), Some(orders));
        assert_eq!(tracker.lookup_table("orders"), Some(orders));
        tracker.enter_column(None, None);
        let reference = tracker.handle_ref(Some("orders"), "id", None).unwrap();
        tracker.exit_node();
        tracker.exit_node();
        assert_eq!(tracker.lookup_table("orders"), None);

        let tree = tracker.finish();
        let table = tree.node(orders).unwrap().as_table().unwrap();
        assert_eq!(table.table_name.as_deref(), Some("public.orders"));
        assert_eq!(table.alias.as_deref(), Some("public.orders"));
        let reference = tree.node(reference).unwrap().as_column_ref().unwrap();
        assert_eq!(reference.table, Some(orders));
    }

    #[test]
    fn test_qualified_table_with_alias_binds_alias_only() {
        let mut tracker = QueryTreeTracker::new();
        tracker.enter_selection(None);
        let parts = ["public".to_string(), "orders".to_string()];
        let orders = tracker.enter_qualified_table(&parts, Some("o"), None);
        tracker.exit_node();

        assert_eq!(tracker.lookup_table("o"), Some(orders));
        assert_eq!(tracker.lookup_table("orders"), None);
        assert_eq!(tracker.lookup_table("public.orders"), None);
        tracker.exit_node();
    }

    #[test]
    fn test_reference_outside_column_is_ignored() {
        let mut tracker = QueryTreeTracker::new();
        tracker.enter_selection(None);
        assert!(tracker.handle_ref(None, "a", None).is_none());
        tracker.exit_node();
        assert_eq!(tracker.tree().nodes_of_type(NodeType::ColumnRef).len(), 0);
    }

    #[test]
    fn test_cte_table_marks_name_temporary() {
        let mut tracker = QueryTreeTracker::new();
        let cte = tracker.enter_cte(None);
        let recent = tracker.enter_cte_table("recent", None);
        let body = tracker.enter_selection(None);
        tracker.enter_table("orders", None, None);
        tracker.exit_node();
        tracker.exit_node();
        tracker.exit_node();

        let main = tracker.enter_selection(None);
        let consumer = tracker.enter_table("recent", None, None);
        tracker.exit_node();
        tracker.exit_node();
        tracker.exit_node();

        assert!(tracker.is_temporary_table("recent"));
        let tree = tracker.finish();
        assert_eq!(tree.root(), Some(cte));

        let cte_node = tree.node(cte).unwrap().as_cte().unwrap();
        assert_eq!(cte_node.tables, vec![recent]);
        assert_eq!(cte_node.select, Some(main));

        let recent_node = tree.node(recent).unwrap().as_nested_select().unwrap();
        assert_eq!(recent_node.select, Some(body));

        let consumer_node = tree.node(consumer).unwrap().as_table().unwrap();
        assert!(!consumer_node.is_source_table);
        assert_eq!(tree.source_table_names(), vec!["orders"]);
    }

    #[test]
    fn test_sub_query_attaches_first_select_only() {
        let mut tracker = QueryTreeTracker::new();
        tracker.enter_selection(None);
        let sub = tracker.enter_sub_query(Some("sub"), None);
        let first = tracker.enter_selection(None);
        tracker.exit_node();
        tracker.enter_selection(None);
        tracker.exit_node();
        tracker.exit_node();
        tracker.exit_node();

        let tree = tracker.finish();
        let nested = tree.node(sub).unwrap().as_nested_select().unwrap();
        assert_eq!(nested.select, Some(first));
        assert_eq!(nested.table.alias.as_deref(), Some("sub"));
        assert!(tree.source_tables().is_empty());
    }

    #[test]
    fn test_unmatched_exit_is_ignored() {
        let mut tracker = QueryTreeTracker::new();
        tracker.exit_node();
        assert_eq!(tracker.exit_count(), 0);
        assert!(tracker.is_balanced());
    }

    #[test]
    fn test_unbalanced_tracker_still_finishes() {
        let mut tracker = QueryTreeTracker::new();
        tracker.enter_selection(None);
        assert!(!tracker.is_balanced());
        assert_eq!(tracker.current_kind(), Some(ScopeKind::Select));
        let tree = tracker.finish();
        assert!(tree.root().is_some());
    }
}
