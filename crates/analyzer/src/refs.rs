// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! # Column reference discovery
//!
//! Expressions are scanned with the parser's [`Visitor`]. Only references
//! that belong to the expression itself are reported: once the scan enters a
//! subquery, everything below it is skipped and the subquery is handed to the
//! caller so the walker can analyze it in its own scope.
//!
//! Events are delivered through a callback while the scan is running, so
//! subqueries are lent out of the AST instead of copied.

use crate::names::NameFolding;
use sqlparser::ast::{Expr, Query, Spanned, Visit, Visitor};
use sqlparser::tokenizer::Span;
use std::convert::Infallible;
use std::ops::ControlFlow;

/// Something found inside an expression, in document order
#[derive(Debug, Clone, Copy)]
pub(crate) enum ExprEvent<'q> {
    Reference {
        qualifier: Option<&'q str>,
        name: &'q str,
        span: Span,
    },
    Subquery(&'q Query),
}

struct Scan<F> {
    /// References are reported only when folding is set
    folding: Option<NameFolding>,
    /// Query depth at which subqueries are reported
    floor: usize,
    depth: usize,
    on_event: F,
}

impl<F> Visitor for Scan<F>
where
    F: FnMut(ExprEvent<'_>),
{
    type Break = Infallible;

    fn pre_visit_query(&mut self, query: &Query) -> ControlFlow<Self::Break> {
        if self.depth == self.floor {
            (self.on_event)(ExprEvent::Subquery(query));
        }
        self.depth += 1;
        ControlFlow::Continue(())
    }

    fn post_visit_query(&mut self, _query: &Query) -> ControlFlow<Self::Break> {
        self.depth = self.depth.saturating_sub(1);
        ControlFlow::Continue(())
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Self::Break> {
        let Some(folding) = self.folding else {
            return ControlFlow::Continue(());
        };
        if self.depth > 0 {
            return ControlFlow::Continue(());
        }
        match expr {
            Expr::Identifier(ident) => {
                let name = folding.ident(ident);
                (self.on_event)(ExprEvent::Reference {
                    qualifier: None,
                    name: &name,
                    span: ident.span,
                });
            }
            Expr::CompoundIdentifier(idents) => {
                if let Some((last, rest)) = idents.split_last() {
                    let qualifier = rest.last().map(|ident| folding.ident(ident));
                    let name = folding.ident(last);
                    (self.on_event)(ExprEvent::Reference {
                        qualifier: qualifier.as_deref(),
                        name: &name,
                        span: expr.span(),
                    });
                }
            }
            _ => {}
        }
        ControlFlow::Continue(())
    }
}

fn run<T, F>(node: &T, folding: Option<NameFolding>, floor: usize, on_event: F)
where
    T: Visit + ?Sized,
    F: FnMut(ExprEvent<'_>),
{
    let mut scan = Scan {
        folding,
        floor,
        depth: 0,
        on_event,
    };
    match node.visit(&mut scan) {
        ControlFlow::Continue(()) => {}
        ControlFlow::Break(never) => match never {},
    }
}

/// Report the references and top-level subqueries of an expression
pub(crate) fn scan_expr<F>(expr: &Expr, folding: NameFolding, on_event: F)
where
    F: FnMut(ExprEvent<'_>),
{
    run(expr, Some(folding), 0, on_event);
}

/// Report the outermost subqueries found anywhere below `node`
///
/// With `skip_root`, a query passed as `node` is not reported itself; its
/// direct subqueries are.
pub(crate) fn scan_subqueries<T, F>(node: &T, skip_root: bool, mut on_query: F)
where
    T: Visit + ?Sized,
    F: FnMut(&Query),
{
    let floor = usize::from(skip_root);
    run(node, None, floor, |event| {
        if let ExprEvent::Subquery(query) = event {
            on_query(query);
        }
    });
}
