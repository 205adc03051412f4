// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Query tree
//!
//! [`QueryTree`] owns every node built for one statement. Nodes are appended
//! while the statement is walked and are never removed, so a [`NodeId`]
//! handed out by [`QueryTree::add_node`] stays valid for the life of the tree.

use crate::node::{
    ColumnRefNode, NodeId, NodeKind, NodeType, QueryTreeNode, TableNode,
};
use crate::span::SourceSpan;

/// The analyzed structure of one SQL statement
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryTree {
    nodes: Vec<QueryTreeNode>,

    /// Top-level Select or CTE; absent for unsupported statements
    root: Option<NodeId>,

    /// Tables with `is_source_table == true`, in registration order
    tables: Vec<NodeId>,
}

impl QueryTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node to the arena
    pub fn add_node(&mut self, kind: NodeKind, span: Option<SourceSpan>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(QueryTreeNode::new(kind, span));
        id
    }

    /// Look up a node by id
    ///
    /// Ids are only produced by this tree, so lookups by an id from the same
    /// tree always succeed.
    pub fn node(&self, id: NodeId) -> Option<&QueryTreeNode> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut QueryTreeNode> {
        self.nodes.get_mut(id.0)
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Set the root unless one is already set; returns whether it was set
    pub fn set_root_if_unset(&mut self, id: NodeId) -> bool {
        if self.root.is_none() {
            self.root = Some(id);
            true
        } else {
            false
        }
    }

    pub fn root_node(&self) -> Option<&QueryTreeNode> {
        self.root.and_then(|id| self.node(id))
    }

    /// Record a table in the flat source-table list
    pub fn add_source_table(&mut self, id: NodeId) {
        self.tables.push(id);
    }

    /// Ids of the source tables, in the order they were encountered
    pub fn source_tables(&self) -> &[NodeId] {
        &self.tables
    }

    /// Source table nodes, in the order they were encountered
    pub fn source_table_nodes(&self) -> impl Iterator<Item = &TableNode> + '_ {
        self.tables
            .iter()
            .filter_map(|id| self.node(*id))
            .filter_map(QueryTreeNode::as_table)
    }

    /// Distinct source table names, first occurrence order
    ///
    /// A self-join registers the same table twice; this collapses it.
    pub fn source_table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for table in self.source_table_nodes() {
            if let Some(name) = &table.table_name {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
        }
        names
    }

    /// All nodes in creation order
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &QueryTreeNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index), node))
    }

    /// Ids of every node of the given type, in creation order
    pub fn nodes_of_type(&self, node_type: NodeType) -> Vec<NodeId> {
        self.iter()
            .filter(|(_, node)| node.node_type() == node_type)
            .map(|(id, _)| id)
            .collect()
    }

    /// Follow a column reference to the table it resolved to
    pub fn resolved_table(&self, column_ref: &ColumnRefNode) -> Option<&TableNode> {
        column_ref
            .table
            .and_then(|id| self.node(id))
            .and_then(QueryTreeNode::as_table)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
