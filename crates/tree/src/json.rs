// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Tree serialization
//!
//! Converts a [`QueryTree`] into a plain JSON structure with children inlined.
//! Consumers (editor tooling, lineage views) read this shape without depending
//! on the arena types.
//!
//! ## Shape
//!
//! ```text
//! { type, start?, end?,
//!   Select:       tables, columns
//!   CTE:          tables, select?
//!   Table:        tableName?, alias?, isSourceTable
//!   NestedSelect: tableName?, alias?, isSourceTable, select
//!   Column:       refs, alias?
//!   ColumnRef:    fullName }
//! ```
//!
//! `start`/`end` are byte offsets and are emitted only when locations are
//! requested.

use crate::node::{NodeId, NodeKind, TableNode};
use crate::tree::QueryTree;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

impl QueryTree {
    /// Serialize the whole tree as `{ root, tables }`
    pub fn to_json(&self, include_location: bool) -> Value {
        let mut object = Map::new();
        object.insert(
            "root".to_string(),
            self.root()
                .map(|id| self.node_to_json(id, include_location))
                .unwrap_or(Value::Null),
        );
        object.insert(
            "tables".to_string(),
            self.ids_to_json(self.source_tables(), include_location),
        );
        Value::Object(object)
    }

    /// Serialize one node and everything it owns
    pub fn node_to_json(&self, id: NodeId, include_location: bool) -> Value {
        let Some(node) = self.node(id) else {
            return Value::Null;
        };

        let mut object = Map::new();
        object.insert(
            "type".to_string(),
            Value::String(node.node_type().as_str().to_string()),
        );
        if include_location {
            if let Some(span) = node.span {
                object.insert("start".to_string(), Value::from(span.start));
                object.insert("end".to_string(), Value::from(span.end));
            }
        }

        match &node.kind {
            NodeKind::Select(select) => {
                object.insert(
                    "tables".to_string(),
                    self.ids_to_json(&select.tables, include_location),
                );
                object.insert(
                    "columns".to_string(),
                    self.ids_to_json(&select.columns, include_location),
                );
            }
            NodeKind::Cte(cte) => {
                object.insert(
                    "tables".to_string(),
                    self.ids_to_json(&cte.tables, include_location),
                );
                if let Some(select) = cte.select {
                    object.insert(
                        "select".to_string(),
                        self.node_to_json(select, include_location),
                    );
                }
            }
            NodeKind::Table(table) => {
                insert_table_fields(&mut object, table);
            }
            NodeKind::NestedSelect(nested) => {
                insert_table_fields(&mut object, &nested.table);
                object.insert(
                    "select".to_string(),
                    nested
                        .select
                        .map(|select| self.node_to_json(select, include_location))
                        .unwrap_or(Value::Null),
                );
            }
            NodeKind::Column(column) => {
                object.insert(
                    "refs".to_string(),
                    self.ids_to_json(&column.column_refs, include_location),
                );
                if let Some(alias) = &column.alias {
                    object.insert("alias".to_string(), Value::String(alias.clone()));
                }
            }
            NodeKind::ColumnRef(column_ref) => {
                object.insert(
                    "fullName".to_string(),
                    Value::String(column_ref.full_name.clone()),
                );
            }
        }

        Value::Object(object)
    }

    fn ids_to_json(&self, ids: &[NodeId], include_location: bool) -> Value {
        Value::Array(
            ids.iter()
                .map(|id| self.node_to_json(*id, include_location))
                .collect(),
        )
    }
}

fn insert_table_fields(object: &mut Map<String, Value>, table: &TableNode) {
    if let Some(name) = &table.table_name {
        object.insert("tableName".to_string(), Value::String(name.clone()));
    }
    if let Some(alias) = &table.alias {
        object.insert("alias".to_string(), Value::String(alias.clone()));
    }
    object.insert(
        "isSourceTable".to_string(),
        Value::Bool(table.is_source_table),
    );
}

/// Serde adapter for a tree and its output options
///
/// ```
/// use sql_structure_tree::{QueryTree, TreeSerializer};
///
/// let tree = QueryTree::new();
/// let text = serde_json::to_string(&TreeSerializer::new(&tree)).unwrap();
/// assert_eq!(text, r#"{"root":null,"tables":[]}"#);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TreeSerializer<'a> {
    tree: &'a QueryTree,
    include_location: bool,
}

impl<'a> TreeSerializer<'a> {
    pub fn new(tree: &'a QueryTree) -> Self {
        Self {
            tree,
            include_location: false,
        }
    }

    pub fn with_location(mut self, include_location: bool) -> Self {
        self.include_location = include_location;
        self
    }
}

impl Serialize for TreeSerializer<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.tree.to_json(self.include_location).serialize(serializer)
    }
}
