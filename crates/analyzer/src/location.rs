// Copyright (c) 2025 woxQAQ
//
// Licensed under the MIT License or Apache License 2.0
// See LICENSE files for details

//! Conversion from parser line/column spans to byte offsets

use sql_structure_tree::SourceSpan;
use sqlparser::tokenizer::{Location, Span};

/// Line start offsets of a source text
///
/// The parser reports 1-based line numbers and 1-based columns counted in
/// characters; tree nodes carry byte offsets.
#[derive(Debug, Clone)]
pub struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .char_indices()
                .filter(|(_, c)| *c == '\n')
                .map(|(index, _)| index + 1),
        );
        Self {
            source,
            line_starts,
        }
    }

    /// Byte offset of a parser location, clamped to the end of the text
    ///
    /// Returns `None` for the parser's empty location (line 0).
    pub fn offset(&self, location: &Location) -> Option<usize> {
        if location.line == 0 || location.column == 0 {
            return None;
        }
        let line_start = *self.line_starts.get((location.line - 1) as usize)?;
        let column = (location.column - 1) as usize;
        let offset = self.source[line_start..]
            .char_indices()
            .nth(column)
            .map(|(index, _)| line_start + index)
            .unwrap_or(self.source.len());
        Some(offset)
    }

    /// Byte range of a parser span; empty parser spans have no location
    pub fn span(&self, span: Span) -> Option<SourceSpan> {
        if span == Span::empty() {
            return None;
        }
        let start = self.offset(&span.start)?;
        let end = self.offset(&span.end)?;
        Some(SourceSpan::new(start, end))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
