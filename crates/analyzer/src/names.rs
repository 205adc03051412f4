// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Identifier normalization
//!
//! Unquoted identifiers fold to lower case when folding is enabled; quoted
//! identifiers keep their spelling and lose their quotes.

use sqlparser::ast::{Ident, ObjectName};

const QUOTE_PAIRS: [(char, char); 3] = [('"', '"'), ('`', '`'), ('[', ']')];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct NameFolding {
    fold: bool,
}

impl NameFolding {
    pub(crate) fn new(fold: bool) -> Self {
        Self { fold }
    }

    pub(crate) fn ident(&self, ident: &Ident) -> String {
        if ident.quote_style.is_none() && self.fold {
            ident.value.to_lowercase()
        } else {
            ident.value.clone()
        }
    }

    /// Normalized parts of a dotted name
    pub(crate) fn object_name(&self, name: &ObjectName) -> Vec<String> {
        self.display_parts(&name.to_string())
    }

    /// Split a rendered dotted name (`schema."Table"`) into normalized parts
    pub(crate) fn display_parts(&self, rendered: &str) -> Vec<String> {
        split_dotted(rendered)
            .into_iter()
            .map(|part| self.display_part(part))
            .collect()
    }

    fn display_part(&self, part: &str) -> String {
        let part = part.trim();
        for (open, close) in QUOTE_PAIRS {
            if part.len() >= 2 && part.starts_with(open) && part.ends_with(close) {
                let inner = &part[open.len_utf8()..part.len() - close.len_utf8()];
                let doubled: String = [close, close].iter().collect();
                return inner.replace(&doubled, &close.to_string());
            }
        }
        if self.fold {
            part.to_lowercase()
        } else {
            part.to_string()
        }
    }
}

/// Split on dots that are not inside a quoted part
fn split_dotted(rendered: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut closing: Option<char> = None;
    let mut start = 0;

    for (index, c) in rendered.char_indices() {
        match closing {
            Some(close) if c == close => closing = None,
            Some(_) => {}
            None => {
                if let Some((_, close)) = QUOTE_PAIRS.iter().find(|(open, _)| *open == c) {
                    closing = Some(*close);
                } else if c == '.' {
                    parts.push(&rendered[start..index]);
                    start = index + 1;
                }
            }
        }
    }
    parts.push(&rendered[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ident_folding() {
        let folding = NameFolding::new(true);
        assert_eq!(folding.ident(&Ident::new("Orders")), "orders");
        assert_eq!(folding.ident(&Ident::with_quote('"', "Orders")), "Orders");

        let preserving = NameFolding::new(false);
        assert_eq!(preserving.ident(&Ident::new("Orders")), "Orders");
    }

    #[test]
    fn test_display_parts() {
        let folding = NameFolding::new(true);
        assert_eq!(
            folding.display_parts("Analytics.\"Daily.Events\""),
            vec!["analytics", "Daily.Events"]
        );
        assert_eq!(folding.display_parts("`db`.t"), vec!["db", "t"]);
        assert_eq!(folding.display_parts("[dbo].[Orders]"), vec!["dbo", "Orders"]);
        assert_eq!(folding.display_parts("\"a\"\"b\""), vec!["a\"b"]);
    }
}
