// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Query tree assertions

use sql_structure_tree::{NodeId, NodeType, QueryTree, TableNode};

/// Custom assertion helpers for query trees
pub struct TreeAssertions;

impl TreeAssertions {
    /// Assert the type of the root node
    pub fn assert_root_type(tree: &QueryTree, expected: NodeType) {
        let root = tree.root_node().expect("Expected a root node, found none");
        assert_eq!(
            root.node_type(),
            expected,
            "Expected root of type {}, found {}",
            expected,
            root.node_type()
        );
    }

    /// Assert the distinct source table names, in order
    pub fn assert_source_tables(tree: &QueryTree, expected: &[&str]) {
        let names = tree.source_table_names();
        assert_eq!(names, expected, "Source table mismatch");

        for table in tree.source_table_nodes() {
            assert!(
                table.is_source_table,
                "Table {:?} is listed as a source but not flagged as one",
                table.table_name
            );
        }
    }

    /// Find the only table registered under `alias`
    pub fn table_by_alias<'a>(tree: &'a QueryTree, alias: &str) -> (NodeId, &'a TableNode) {
        let matches: Vec<_> = tree
            .iter()
            .filter_map(|(id, node)| node.as_table().map(|table| (id, table)))
            .filter(|(_, table)| table.alias.as_deref() == Some(alias))
            .collect();
        assert_eq!(
            matches.len(),
            1,
            "Expected exactly one table aliased '{}', found {}",
            alias,
            matches.len()
        );
        matches[0]
    }

    /// Assert that every reference named `full_name` resolves to `table`
    ///
    /// Returns the number of references checked; fails if there are none.
    pub fn assert_ref_resolves(tree: &QueryTree, full_name: &str, table: NodeId) -> usize {
        let refs: Vec<_> = tree
            .iter()
            .filter_map(|(_, node)| node.as_column_ref())
            .filter(|column_ref| column_ref.full_name == full_name)
            .collect();
        assert!(!refs.is_empty(), "No reference named '{}'", full_name);

        for column_ref in &refs {
            assert_eq!(
                column_ref.table,
                Some(table),
                "Reference '{}' resolved to {:?}, expected {}",
                full_name,
                column_ref.table,
                table
            );
        }
        refs.len()
    }

    /// Assert that a reference named `name` exists and is unresolved
    pub fn assert_ref_unresolved(tree: &QueryTree, name: &str) {
        let found = tree
            .iter()
            .filter_map(|(_, node)| node.as_column_ref())
            .any(|column_ref| {
                column_ref.name == name && column_ref.full_name == name && column_ref.table.is_none()
            });
        assert!(found, "No unresolved reference named '{}'", name);
    }

    /// Assert the number of nodes of one type
    pub fn assert_node_count(tree: &QueryTree, node_type: NodeType, expected: usize) {
        let count = tree.nodes_of_type(node_type).len();
        assert_eq!(
            count, expected,
            "Expected {} {} nodes, found {}",
            expected, node_type, count
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sql_structure_tree::{ColumnNode, ColumnRefNode, NodeKind, SelectNode};

    fn sample_tree() -> (QueryTree, NodeId) {
        let mut tree = QueryTree::new();
        let select = tree.add_node(NodeKind::Select(SelectNode::default()), None);
        tree.set_root_if_unset(select);
        let orders = tree.add_node(
            NodeKind::Table(TableNode::new(
                Some("orders".to_string()),
                Some("o".to_string()),
                true,
            )),
            None,
        );
        tree.add_source_table(orders);
        tree.add_node(NodeKind::Column(ColumnNode::default()), None);
        tree.add_node(
            NodeKind::ColumnRef(ColumnRefNode {
                name: "id".to_string(),
                full_name: "o.id".to_string(),
                table: Some(orders),
            }),
            None,
        );
        tree.add_node(
            NodeKind::ColumnRef(ColumnRefNode {
                name: "total".to_string(),
                full_name: "total".to_string(),
                table: None,
            }),
            None,
        );
        (tree, orders)
    }

    #[test]
    fn test_assertions_accept_matching_tree() {
        let (tree, orders) = sample_tree();
        TreeAssertions::assert_root_type(&tree, NodeType::Select);
        TreeAssertions::assert_source_tables(&tree, &["orders"]);
        assert_eq!(TreeAssertions::assert_ref_resolves(&tree, "o.id", orders), 1);
        TreeAssertions::assert_ref_unresolved(&tree, "total");
        TreeAssertions::assert_node_count(&tree, NodeType::ColumnRef, 2);
        assert_eq!(TreeAssertions::table_by_alias(&tree, "o").0, orders);
    }

    #[test]
    #[should_panic(expected = "Expected root of type CTE")]
    fn test_assert_root_type_fails() {
        let (tree, _) = sample_tree();
        TreeAssertions::assert_root_type(&tree, NodeType::Cte);
    }

    #[test]
    #[should_panic(expected = "No reference named")]
    fn test_assert_ref_resolves_fails_on_missing_ref() {
        let (tree, orders) = sample_tree();
        TreeAssertions::assert_ref_resolves(&tree, "x.id", orders);
    }
}
