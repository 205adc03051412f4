// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # SQL Structure - Query Tree
//!
//! This crate holds the output model of the SQL structure analyzer: a tree of
//! SELECT blocks, CTEs, tables, projected columns and column references for
//! one statement.
//!
//! ## Ownership
//!
//! All nodes live in the [`QueryTree`] arena. Parents refer to children by
//! [`NodeId`]; a column reference refers to its table by [`NodeId`] as well,
//! without owning it.
//!
//! ## Example
//!
//! ```rust
//! use sql_structure_tree::{NodeKind, QueryTree, SelectNode, TableNode};
//!
//! let mut tree = QueryTree::new();
//! let orders = tree.add_node(
//!     NodeKind::Table(TableNode::new(Some("orders".into()), None, true)),
//!     None,
//! );
//! let select = tree.add_node(
//!     NodeKind::Select(SelectNode { tables: vec![orders], columns: vec![] }),
//!     None,
//! );
//! tree.set_root_if_unset(select);
//! tree.add_source_table(orders);
//!
//! assert_eq!(tree.source_table_names(), vec!["orders"]);
//! assert_eq!(tree.to_json(false)["root"]["type"], "Select");
//! ```

pub mod json;
pub mod node;
pub mod span;
pub mod tree;

pub use json::TreeSerializer;
pub use node::{
    ColumnNode, ColumnRefNode, CteNode, NestedSelectNode, NodeId, NodeKind, NodeType,
    QueryTreeNode, SelectNode, TableNode,
};
pub use span::SourceSpan;
pub use tree::QueryTree;
