//! Source spans attached to parsed statements
//!
//! A [`SourceLocation`] shares the full program text through an `Arc`, so
//! every statement of a program points at the same allocation.
//!
//! Only the byte range is serialized, as `[start, end]`. Each function value
//! writes the lines its body was written on (see `Value::Function`), and
//! those lines are attached back to every location of the body when it is
//! read. A location may therefore hold an excerpt of a longer program, in
//! which case it also knows how many lines came before the excerpt.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

/// A byte range inside the text of a program
///
/// A location read on its own has no text until [`SourceLocation::attach`]
/// gives it one. Every accessor stays within the text it has, whatever the
/// stored range says.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation {
    source: Arc<str>,
    start: usize,
    end: usize,
    /// Lines of the program before `source` begins
    line_base: usize,
}

impl SourceLocation {
    /// Create a location covering `start..end` of `source`
    ///
    /// The range is clamped to the source text and never ends before it starts.
    pub fn new(source: Arc<str>, start: usize, end: usize) -> Self {
        let start = floor_boundary(&source, start.min(source.len()));
        let end = floor_boundary(&source, end.clamp(start, source.len()));
        Self {
            source,
            start,
            end,
            line_base: 0,
        }
    }

    /// The same range inside `source`, clamped like [`SourceLocation::new`]
    pub fn attach(&self, source: Arc<str>) -> Self {
        Self {
            line_base: self.line_base,
            ..Self::new(source, self.start, self.end)
        }
    }

    /// The same range moved into an excerpt of the program
    ///
    /// `excerpt` is the program text from byte `from` on, and `line_base`
    /// lines of the program come before it.
    pub fn rebase(&self, excerpt: Arc<str>, from: usize, line_base: usize) -> Self {
        Self {
            line_base,
            ..Self::new(
                excerpt,
                self.start.saturating_sub(from),
                self.end.saturating_sub(from),
            )
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Shared handle to the program text
    pub fn shared_source(&self) -> &Arc<str> {
        &self.source
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Lines of the program before [`Self::source`] begins
    pub fn line_base(&self) -> usize {
        self.line_base
    }

    /// Byte range of the whole lines this location touches
    pub fn line_range(&self) -> (usize, usize) {
        let (line_start, _) = self.line_bounds();
        let (_, end) = self.bounds();
        let line_end = self.source[end..]
            .find('\n')
            .map(|i| end + i)
            .unwrap_or(self.source.len());
        (line_start, line_end)
    }

    /// The stored range, clamped to the text and to char boundaries
    fn bounds(&self) -> (usize, usize) {
        let start = floor_boundary(&self.source, self.start.min(self.source.len()));
        let end = floor_boundary(&self.source, self.end.clamp(start, self.source.len()));
        (start, end)
    }

    /// The text covered by this location
    pub fn text(&self) -> &str {
        let (start, end) = self.bounds();
        &self.source[start..end]
    }

    /// 1-based line number of the first character
    pub fn line_number(&self) -> usize {
        let (start, _) = self.bounds();
        self.line_base
            .saturating_add(self.source[..start].matches('\n').count())
            .saturating_add(1)
    }

    /// Byte offsets of the line containing the start of this location
    fn line_bounds(&self) -> (usize, usize) {
        let (start, _) = self.bounds();
        let line_start = self.source[..start]
            .rfind('\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let line_end = self.source[start..]
            .find('\n')
            .map(|i| start + i)
            .unwrap_or(self.source.len());
        (line_start, line_end)
    }

    /// The full line of source containing the start of this location,
    /// without its line terminator
    pub fn source_line(&self) -> &str {
        let (line_start, line_end) = self.line_bounds();
        self.source[line_start..line_end].trim_end_matches('\r')
    }

    /// Start and end columns of this location within [`Self::source_line`]
    ///
    /// Columns count characters from 0. A location spanning several lines is
    /// cut off at the end of its first line.
    pub fn line_span(&self) -> (usize, usize) {
        let (start, end) = self.bounds();
        let (line_start, line_end) = self.line_bounds();
        let start_col = self.source[line_start..start].chars().count();
        let end_col = start_col + self.source[start..end.min(line_end)].chars().count();
        (start_col, end_col)
    }

    /// The source line followed by a line of carets under this location
    ///
    /// At least one caret is always drawn, even for an empty span.
    pub fn underline(&self) -> String {
        let (start_col, end_col) = self.line_span();
        let width = end_col.saturating_sub(start_col).max(1);
        format!(
            "{}\n{}{}",
            self.source_line(),
            " ".repeat(start_col),
            "^".repeat(width)
        )
    }
}

fn floor_boundary(text: &str, mut index: usize) -> usize {
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

impl Serialize for SourceLocation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.start, self.end).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SourceLocation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (start, end) = <(usize, usize)>::deserialize(deserializer)?;
        Ok(Self {
            source: Arc::from(""),
            start,
            end,
            line_base: 0,
        })
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, end) = self.line_span();
        write!(f, "line {}, columns {}-{}", self.line_number(), start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(src: &str, start: usize, end: usize) -> SourceLocation {
        SourceLocation::new(Arc::from(src), start, end)
    }

    #[test]
    fn test_single_line_underline() {
        let l = loc("1 2 add", 4, 7);
        assert_eq!(l.text(), "add");
        assert_eq!(l.line_number(), 1);
        assert_eq!(l.line_span(), (4, 7));
        assert_eq!(l.underline(), "1 2 add\n    ^^^");
    }

    #[test]
    fn test_second_line() {
        let src = "1 2\n  foo 3";
        let l = loc(src, 6, 9);
        assert_eq!(l.line_number(), 2);
        assert_eq!(l.source_line(), "  foo 3");
        assert_eq!(l.underline(), "  foo 3\n  ^^^");
        assert_eq!(l.to_string(), "line 2, columns 2-5");
    }

    #[test]
    fn test_empty_span_still_has_caret() {
        let l = loc("abc", 3, 3);
        assert_eq!(l.underline(), "abc\n   ^");
    }

    #[test]
    fn test_multi_line_span_cut_at_first_line() {
        let src = "\"a\nb\" print";
        let l = loc(src, 0, 5);
        assert_eq!(l.source_line(), "\"a");
        assert_eq!(l.line_span(), (0, 2));
    }

    #[test]
    fn test_columns_count_chars() {
        let src = "\"héllo\" foo";
        let start = src.find("foo").unwrap();
        let l = loc(src, start, start + 3);
        assert_eq!(l.line_span(), (8, 11));
    }

    #[test]
    fn test_serializes_range_only() {
        let l = loc("1 2 add", 4, 7);
        let json = serde_json::to_string(&l).unwrap();
        assert_eq!(json, "[4,7]");

        let back: SourceLocation = serde_json::from_str(&json).unwrap();
        assert_eq!(back.attach(Arc::from("1 2 add")), l);
    }

    #[test]
    fn test_bad_stored_range_does_not_panic() {
        let detached: SourceLocation = serde_json::from_str("[40, 2]").unwrap();
        assert_eq!(detached.text(), "");
        assert_eq!(detached.underline(), "\n^");

        let attached = detached.attach(Arc::from("héllo"));
        assert_eq!(attached.start(), 6);
        assert_eq!(attached.underline(), "héllo\n     ^");

        // A range that falls inside a multi-byte char is floored to its start
        let inside: SourceLocation = serde_json::from_str("[2, 9]").unwrap();
        let inside = inside.attach(Arc::from("héllo"));
        assert_eq!(inside.text(), "éllo");
    }

    #[test]
    fn test_rebase_into_excerpt() {
        let src = "1 2\n3 foo 4\n5\n";
        let start = src.find("foo").unwrap();
        let l = loc(src, start, start + 3);
        assert_eq!(l.line_range(), (4, 11));

        let moved = l.rebase(Arc::from(&src[4..11]), 4, 1);
        assert_eq!(moved.text(), "foo");
        assert_eq!(moved.line_base(), 1);
        assert_eq!(moved.to_string(), l.to_string());
        assert_eq!(moved.underline(), l.underline());
    }

    #[test]
    fn test_out_of_range_is_clamped() {
        let l = loc("abc", 2, 99);
        assert_eq!(l.end(), 3);
        assert_eq!(l.text(), "c");
    }
}
