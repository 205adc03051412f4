// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Query tree nodes
//!
//! Every node of a [`QueryTree`](crate::QueryTree) is stored in the tree's
//! arena and addressed by a [`NodeId`]. Parent nodes keep ordered lists of
//! child ids; a [`ColumnRefNode`] keeps the id of the table it resolves to.
//! Ids never own anything, so many references may point at the same table
//! while the table itself belongs to exactly one parent list.
//!
//! ## Node Types
//!
//! | Type | Payload | Children |
//! |------|---------|----------|
//! | `Select` | [`SelectNode`] | tables (FROM order), columns (SELECT order) |
//! | `CTE` | [`CteNode`] | tables, the scoped select |
//! | `Table` | [`TableNode`] | none |
//! | `NestedSelect` | [`NestedSelectNode`] | the subquery select |
//! | `Column` | [`ColumnNode`] | column references |
//! | `ColumnRef` | [`ColumnRefNode`] | none (non-owning table link) |

use crate::span::SourceSpan;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Index of a node inside its tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Type tag of a query tree node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Select,
    #[serde(rename = "CTE")]
    Cte,
    Table,
    NestedSelect,
    Column,
    ColumnRef,
}

impl NodeType {
    /// Tag used in the serialized tree
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::Select => "Select",
            NodeType::Cte => "CTE",
            NodeType::Table => "Table",
            NodeType::NestedSelect => "NestedSelect",
            NodeType::Column => "Column",
            NodeType::ColumnRef => "ColumnRef",
        }
    }

    /// Whether nodes of this type can be found in a parent's `tables` list
    pub fn is_table_like(&self) -> bool {
        matches!(self, NodeType::Table | NodeType::NestedSelect)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A SELECT block
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectNode {
    /// FROM-clause tables in source order
    pub tables: Vec<NodeId>,
    /// Projected columns in SELECT-list order
    pub columns: Vec<NodeId>,
}

/// A WITH clause together with the statement it scopes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CteNode {
    pub tables: Vec<NodeId>,
    /// The statement following the WITH clause, attached lazily
    pub select: Option<NodeId>,
}

/// A relation referenced in a FROM clause
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableNode {
    /// Absent for subqueries
    pub table_name: Option<String>,
    /// Defaults to `table_name`
    pub alias: Option<String>,
    /// False iff the name was bound by a CTE somewhere in the statement
    pub is_source_table: bool,
    /// Reserved for downstream lineage; never populated by the analyzer
    pub available_columns: Vec<String>,
}

impl TableNode {
    /// Create a table node; the alias falls back to the table name
    pub fn new(table_name: Option<String>, alias: Option<String>, is_source_table: bool) -> Self {
        let alias = alias.or_else(|| table_name.clone());
        Self {
            table_name,
            alias,
            is_source_table,
            available_columns: Vec::new(),
        }
    }

    /// Name the table is registered under for reference lookups
    pub fn lookup_name(&self) -> Option<&str> {
        self.alias.as_deref().or(self.table_name.as_deref())
    }
}

/// A subquery or CTE body used as a table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NestedSelectNode {
    pub table: TableNode,
    pub select: Option<NodeId>,
}

impl NestedSelectNode {
    /// Nested selects are never source tables
    pub fn new(table_name: Option<String>, alias: Option<String>) -> Self {
        Self {
            table: TableNode::new(table_name, alias, false),
            select: None,
        }
    }
}

/// One item of a SELECT list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnNode {
    pub column_refs: Vec<NodeId>,
    /// Output alias, when one was written
    pub alias: Option<String>,
}

/// A column reference inside a projected expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRefNode {
    pub name: String,
    /// `alias.name` when resolved, otherwise `name`
    pub full_name: String,
    /// Non-owning link to the resolved table
    pub table: Option<NodeId>,
}

/// Type-specific payload of a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Select(SelectNode),
    Cte(CteNode),
    Table(TableNode),
    NestedSelect(NestedSelectNode),
    Column(ColumnNode),
    ColumnRef(ColumnRefNode),
}

/// A node of the query tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTreeNode {
    pub span: Option<SourceSpan>,
    pub kind: NodeKind,
}

impl QueryTreeNode {
    pub fn new(kind: NodeKind, span: Option<SourceSpan>) -> Self {
        Self { span, kind }
    }

    pub fn node_type(&self) -> NodeType {
        match &self.kind {
            NodeKind::Select(_) => NodeType::Select,
            NodeKind::Cte(_) => NodeType::Cte,
            NodeKind::Table(_) => NodeType::Table,
            NodeKind::NestedSelect(_) => NodeType::NestedSelect,
            NodeKind::Column(_) => NodeType::Column,
            NodeKind::ColumnRef(_) => NodeType::ColumnRef,
        }
    }

    /// Table view of `Table` and `NestedSelect` nodes
    pub fn as_table(&self) -> Option<&TableNode> {
        match &self.kind {
            NodeKind::Table(table) => Some(table),
            NodeKind::NestedSelect(nested) => Some(&nested.table),
            _ => None,
        }
    }

    pub fn as_select(&self) -> Option<&SelectNode> {
        match &self.kind {
            NodeKind::Select(select) => Some(select),
            _ => None,
        }
    }

    pub fn as_cte(&self) -> Option<&CteNode> {
        match &self.kind {
            NodeKind::Cte(cte) => Some(cte),
            _ => None,
        }
    }

    pub fn as_nested_select(&self) -> Option<&NestedSelectNode> {
        match &self.kind {
            NodeKind::NestedSelect(nested) => Some(nested),
            _ => None,
        }
    }

    pub fn as_column(&self) -> Option<&ColumnNode> {
        match &self.kind {
            NodeKind::Column(column) => Some(column),
            _ => None,
        }
    }

    pub fn as_column_ref(&self) -> Option<&ColumnRefNode> {
        match &self.kind {
            NodeKind::ColumnRef(column_ref) => Some(column_ref),
            _ => None,
        }
    }

    /// Owned children in serialization order
    pub fn children(&self) -> Vec<NodeId> {
        match &self.kind {
            NodeKind::Select(select) => select
                .tables
                .iter()
                .chain(select.columns.iter())
                .copied()
                .collect(),
            NodeKind::Cte(cte) => cte.tables.iter().copied().chain(cte.select).collect(),
            NodeKind::NestedSelect(nested) => nested.select.into_iter().collect(),
            NodeKind::Column(column) => column.column_refs.clone(),
            NodeKind::Table(_) | NodeKind::ColumnRef(_) => Vec::new(),
        }
    }
}
