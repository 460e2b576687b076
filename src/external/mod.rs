//! The translation service's side of the exchange: locale files written as JavaScript object
//! literals, and the records the service hands back.

mod lexer;
pub mod import;
pub mod parser;
pub mod region;
pub mod service;

use thiserror::Error;

pub use parser::{
    LocaleLiteral,
    parse_locale_file,
};

use crate::types::SourcePosition;

/// Longest snippet of the offending line kept in a `ParseError`.
const SNIPPET_MAX_CHARS: usize = 80;

/// A locale file that could not be tokenized or parsed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{source_name}:{position}: {message} near `{snippet}`")]
pub struct ParseError {
    /// File path or other identifier of the input.
    pub source_name: String,
    pub position: SourcePosition,
    pub message: String,
    /// Trimmed text of the line the error points at.
    pub snippet: String,
}

impl ParseError {
    pub(crate) fn new(
        source_name: &str,
        text: &str,
        position: SourcePosition,
        message: impl Into<String>,
    ) -> Self {
        let snippet = text
            .lines()
            .nth(position.line as usize)
            .map(|line| line.trim().chars().take(SNIPPET_MAX_CHARS).collect())
            .unwrap_or_default();

        Self { source_name: source_name.to_string(), position, message: message.into(), snippet }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    #[rstest]
    fn parse_error_display() {
        let error = ParseError::new(
            "locales/en_US.js",
            "let json = {\n    a: ?\n}",
            SourcePosition::new(1, 7),
            "Unexpected character '?'",
        );

        assert_that!(
            error.to_string(),
            eq("locales/en_US.js:2:8: Unexpected character '?' near `a: ?`")
        );
    }

    #[rstest]
    fn parse_error_past_end_has_empty_snippet() {
        let error = ParseError::new("a.js", "", SourcePosition::new(3, 0), "Expected '{'");

        assert_that!(error.snippet, eq(""));
    }
}
