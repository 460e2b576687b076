//! Core types used throughout the project.

use std::fmt;

/// Metadata field naming the locale of a canonical document.
pub const LOCALE_KEY: &str = "@@locale";

/// Keys starting with this marker are document annotations, not translatable content.
pub const METADATA_MARKER: char = '@';

/// Returns true if `key` is a metadata key (`@@locale`, `@greeting`, ...).
#[must_use]
pub fn is_metadata_key(key: &str) -> bool {
    key.starts_with(METADATA_MARKER)
}

/// A position in source text (0-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourcePosition {
    pub line: u32,
    pub character: u32,
}

impl SourcePosition {
    #[must_use]
    pub const fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }

    /// Advances past `c`.
    pub const fn advance(&mut self, c: char) {
        if c == '\n' {
            self.line += 1;
            self.character = 0;
        } else {
            self.character += 1;
        }
    }
}

/// Displayed 1-indexed, the way editors report it.
impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.character + 1)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case::locale("@@locale", true)]
    #[case::annotation("@home_title", true)]
    #[case::plain("home_title", false)]
    #[case::inner_marker("home@title", false)]
    #[case::empty("", false)]
    fn test_is_metadata_key(#[case] key: &str, #[case] expected: bool) {
        assert_that!(is_metadata_key(key), eq(expected));
    }

    #[rstest]
    fn test_advance_tracks_lines_and_columns() {
        let mut pos = SourcePosition::default();
        for c in "ab\ncd".chars() {
            pos.advance(c);
        }

        assert_that!(pos, eq(SourcePosition::new(1, 2)));
        assert_that!(pos.to_string(), eq("2:3"));
    }
}
