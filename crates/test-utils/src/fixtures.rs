// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Test fixtures and sample SQL queries

/// Sample SQL queries for testing
pub struct SqlFixtures;

impl SqlFixtures {
    // ===== Basic SELECT queries =====

    /// Simple SELECT with column list
    pub const fn simple_select() -> &'static str {
        "SELECT a, b FROM orders"
    }

    /// SELECT with all columns
    pub const fn select_all() -> &'static str {
        "SELECT * FROM orders"
    }

    /// SELECT with column aliases and a qualified wildcard
    pub const fn select_with_aliases() -> &'static str {
        "SELECT o.id AS order_id, o.total * 2 AS doubled, o.* FROM orders o"
    }

    /// Schema-qualified table without an alias
    pub const fn schema_qualified() -> &'static str {
        "SELECT orders.id FROM public.orders"
    }

    // ===== JOIN queries =====

    /// Two aliased tables joined on a key
    pub const fn aliased_join() -> &'static str {
        "SELECT o.id, c.name FROM orders o JOIN customers c ON o.cust_id = c.id"
    }

    /// Multiple JOINs
    pub const fn multiple_joins() -> &'static str {
        "SELECT u.name, o.total, p.name
         FROM users u
         INNER JOIN orders o ON u.id = o.user_id
         INNER JOIN products p ON o.product_id = p.id"
    }

    /// Parenthesised join in FROM
    pub const fn nested_join() -> &'static str {
        "SELECT a.x, b.y FROM (a JOIN b ON a.id = b.id)"
    }

    // ===== Subqueries =====

    /// Subquery used as a table
    pub const fn derived_table() -> &'static str {
        "SELECT x FROM (SELECT y AS x FROM orders) sub"
    }

    /// Scalar subquery in the SELECT list shadowing an outer alias
    pub const fn scalar_subquery_shadowing() -> &'static str {
        "SELECT t.a, (SELECT max(t.b) FROM items t) AS top FROM orders t"
    }

    /// Subqueries in WHERE
    pub const fn where_subquery() -> &'static str {
        "SELECT id FROM users WHERE id IN (SELECT user_id FROM orders)"
    }

    /// Subquery in a JOIN condition
    pub const fn join_on_subquery() -> &'static str {
        "SELECT a.x FROM a JOIN b ON b.id IN (SELECT id FROM secret)"
    }

    /// Subquery in ORDER BY
    pub const fn order_by_subquery() -> &'static str {
        "SELECT a.x FROM a ORDER BY (SELECT max(z) FROM hidden)"
    }

    /// Subquery in GROUP BY
    pub const fn group_by_subquery() -> &'static str {
        "SELECT count(*) FROM a GROUP BY (SELECT 1 FROM grp)"
    }

    /// Subqueries in LIMIT and OFFSET
    pub const fn limit_offset_subquery() -> &'static str {
        "SELECT a.x FROM a LIMIT (SELECT max(n) FROM page_size) OFFSET (SELECT min(n) FROM page_start)"
    }

    /// Subquery in a named WINDOW definition
    pub const fn window_subquery() -> &'static str {
        "SELECT sum(a.x) OVER w FROM a WINDOW w AS (PARTITION BY (SELECT 1 FROM buckets))"
    }

    // ===== CTE (Common Table Expressions) =====

    /// Single CTE consumed by the main query
    pub const fn with_cte() -> &'static str {
        "WITH recent AS (SELECT * FROM orders) SELECT * FROM recent"
    }

    /// Two CTEs, the second reading the first
    pub const fn chained_ctes() -> &'static str {
        "WITH a AS (SELECT id FROM orders),
              b AS (SELECT id FROM a)
         SELECT b.id FROM b JOIN customers c ON b.id = c.id"
    }

    /// CTE name reused as a table after the WITH clause has closed
    pub const fn cte_name_reused() -> &'static str {
        "SELECT a.id, t.id
         FROM (WITH t AS (SELECT 1 AS id) SELECT id FROM t) a
         JOIN t ON a.id = t.id"
    }

    /// Recursive CTE
    pub const fn recursive_cte() -> &'static str {
        "WITH RECURSIVE nums AS (
             SELECT 1 AS n
             UNION ALL
             SELECT n + 1 FROM nums WHERE n < 10
         )
         SELECT n FROM nums"
    }

    // ===== Set operations =====

    /// UNION of two SELECTs
    pub const fn union_all() -> &'static str {
        "SELECT id FROM orders UNION ALL SELECT id FROM archived_orders"
    }

    // ===== Other statements =====

    /// INSERT with a source query
    pub const fn insert_select() -> &'static str {
        "INSERT INTO order_copy SELECT o.id FROM orders o"
    }

    /// View definition
    pub const fn create_view() -> &'static str {
        "CREATE VIEW big_orders AS SELECT id FROM orders WHERE total > 100"
    }

    /// Statement without any query
    pub const fn simple_update() -> &'static str {
        "UPDATE users SET name = 'Bob' WHERE id = 1"
    }

    // ===== Error cases =====

    /// Missing table after FROM
    pub const fn error_missing_from() -> &'static str {
        "SELECT FROM"
    }

    /// Only whitespace and separators
    pub const fn error_empty() -> &'static str {
        " ; "
    }

    /// Every fixture that analyzes successfully
    pub fn valid_queries() -> Vec<&'static str> {
        vec![
            Self::simple_select(),
            Self::select_all(),
            Self::select_with_aliases(),
            Self::schema_qualified(),
            Self::aliased_join(),
            Self::multiple_joins(),
            Self::nested_join(),
            Self::derived_table(),
            Self::scalar_subquery_shadowing(),
            Self::where_subquery(),
            Self::join_on_subquery(),
            Self::order_by_subquery(),
            Self::group_by_subquery(),
            Self::limit_offset_subquery(),
            Self::window_subquery(),
            Self::with_cte(),
            Self::chained_ctes(),
            Self::cte_name_reused(),
            Self::recursive_cte(),
            Self::union_all(),
            Self::insert_select(),
            Self::create_view(),
            Self::simple_update(),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_are_not_empty() {
        for sql in SqlFixtures::valid_queries() {
            assert!(!sql.trim().is_empty());
        }
    }

    #[test]
    fn test_error_fixtures_are_not_listed_as_valid() {
        let valid = SqlFixtures::valid_queries();
        assert!(!valid.contains(&SqlFixtures::error_missing_from()));
        assert!(!valid.contains(&SqlFixtures::error_empty()));
    }
}
