//! Recursive-descent parser for service locale files.
//!
//! Statements before the binding are skipped, and nothing after `export default <name>` is read.
//!
//! ```text
//! document := ("let" | "const" | "var") IDENT "=" object [";"] (export | EOF)
//! export   := "export" "default" IDENT
//! object   := "{" [member ("," member)* [","]] "}"
//! member   := (STRING | IDENT | NUMBER) ":" value
//! array    := "[" [value ("," value)* [","]] "]"
//! value    := STRING | NUMBER | "true" | "false" | "null" | object | array
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{
    Map,
    Number,
    Value,
};

use super::ParseError;
use super::lexer::{
    Lexer,
    Token,
    TokenKind,
};
use crate::types::SourcePosition;

/// Nesting deeper than this is rejected instead of recursing further.
const MAX_DEPTH: usize = 64;

/// Where a `let <name>` style binding may start.
#[allow(clippy::expect_used)]
static BINDING_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:let|const|var)\s+[A-Za-z_$]").expect("binding regex is valid"));

/// A parsed `let <binding> = { ... }` locale file.
#[derive(Debug, Clone, PartialEq)]
pub struct LocaleLiteral {
    pub binding: String,
    /// Top-level entries in source order.
    pub entries: Map<String, Value>,
}

/// Parses a locale file, starting from the first binding that parses.
///
/// # Errors
/// `ParseError` naming `source_name`, the position and the offending line. When no candidate
/// binding parses, the error is the one from the first candidate.
pub fn parse_locale_file(source_name: &str, text: &str) -> Result<LocaleLiteral, ParseError> {
    let mut first_error = None;
    for candidate in BINDING_REGEX.find_iter(text) {
        match Parser::new(source_name, text, candidate.start()).document() {
            Ok(literal) => return Ok(literal),
            Err(error) => {
                tracing::trace!(source = source_name, offset = candidate.start(), "Binding candidate rejected");
                if first_error.is_none() {
                    first_error = Some(error);
                }
            }
        }
    }

    first_error.map_or_else(|| Parser::new(source_name, text, 0).document(), Err)
}

/// Pulls tokens from the lexer one at a time, so text after the export is never tokenized.
struct Parser<'a> {
    source_name: &'a str,
    text: &'a str,
    lexer: Lexer<'a>,
    /// Token read by `peek` and not yet consumed.
    lookahead: Option<Token>,
}

impl<'a> Parser<'a> {
    fn new(source_name: &'a str, text: &'a str, offset: usize) -> Self {
        Self { source_name, text, lexer: Lexer::starting_at(source_name, text, offset), lookahead: None }
    }

    fn peek(&mut self) -> Result<&Token, ParseError> {
        let token = self.lookahead.take().map_or_else(|| self.lexer.next_token(), Ok)?;
        Ok(self.lookahead.insert(token))
    }

    fn bump(&mut self) -> Result<Token, ParseError> {
        self.lookahead.take().map_or_else(|| self.lexer.next_token(), Ok)
    }

    fn error_at(&self, position: SourcePosition, message: impl Into<String>) -> ParseError {
        ParseError::new(self.source_name, self.text, position, message)
    }

    fn unexpected_token(&self, token: &Token, expected: &str) -> ParseError {
        self.error_at(token.position, format!("Expected {expected}, found {}", token.kind.describe()))
    }

    /// Error for the next token, or the lexer's error if it cannot be read.
    fn unexpected(&mut self, expected: &str) -> ParseError {
        let token = match self.peek() {
            Ok(token) => token.clone(),
            Err(error) => return error,
        };
        self.unexpected_token(&token, expected)
    }

    fn eat(&mut self, kind: &TokenKind) -> Result<bool, ParseError> {
        if self.peek()?.kind == *kind {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<(), ParseError> {
        if self.eat(kind)? { Ok(()) } else { Err(self.unexpected(expected)) }
    }

    fn eat_keyword(&mut self, keyword: &str) -> Result<bool, ParseError> {
        if matches!(&self.peek()?.kind, TokenKind::Ident(name) if name == keyword) {
            self.bump()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<(String, SourcePosition), ParseError> {
        if matches!(self.peek()?.kind, TokenKind::Ident(_)) {
            let token = self.bump()?;
            if let TokenKind::Ident(name) = token.kind {
                return Ok((name, token.position));
            }
        }
        Err(self.unexpected(expected))
    }

    fn document(&mut self) -> Result<LocaleLiteral, ParseError> {
        if !(self.eat_keyword("let")? || self.eat_keyword("const")? || self.eat_keyword("var")?) {
            return Err(self.unexpected("`let <name> = {` binding"));
        }
        let (binding, _) = self.expect_ident("binding name")?;
        self.expect(&TokenKind::Equals, "'='")?;
        let entries = self.object(0)?;
        self.eat(&TokenKind::Semicolon)?;

        if self.eat_keyword("export")? {
            if !self.eat_keyword("default")? {
                return Err(self.unexpected("'default'"));
            }
            let (exported, position) = self.expect_ident("exported name")?;
            if exported != binding {
                return Err(self.error_at(
                    position,
                    format!("Exported name '{exported}' does not match binding '{binding}'"),
                ));
            }
        } else if self.peek()?.kind != TokenKind::Eof {
            return Err(self.unexpected("end of input"));
        }

        Ok(LocaleLiteral { binding, entries })
    }

    fn object(&mut self, depth: usize) -> Result<Map<String, Value>, ParseError> {
        if depth > MAX_DEPTH {
            let position = self.peek()?.position;
            return Err(self.error_at(position, "Literal is nested too deeply"));
        }
        self.expect(&TokenKind::LBrace, "'{'")?;
        let mut map = Map::new();

        loop {
            if self.eat(&TokenKind::RBrace)? {
                return Ok(map);
            }

            let token = self.bump()?;
            let key = match token.kind {
                TokenKind::Str(key) | TokenKind::Ident(key) | TokenKind::Number(key) => key,
                _ => return Err(self.unexpected_token(&token, "property name or '}'")),
            };
            self.expect(&TokenKind::Colon, "':'")?;
            let value = self.value(depth + 1)?;
            // later duplicates win, as in a JavaScript object literal
            map.insert(key, value);

            if !self.eat(&TokenKind::Comma)? {
                self.expect(&TokenKind::RBrace, "',' or '}'")?;
                return Ok(map);
            }
        }
    }

    fn array(&mut self, depth: usize) -> Result<Vec<Value>, ParseError> {
        if depth > MAX_DEPTH {
            let position = self.peek()?.position;
            return Err(self.error_at(position, "Literal is nested too deeply"));
        }
        self.expect(&TokenKind::LBracket, "'['")?;
        let mut items = Vec::new();

        loop {
            if self.eat(&TokenKind::RBracket)? {
                return Ok(items);
            }
            items.push(self.value(depth + 1)?);
            if !self.eat(&TokenKind::Comma)? {
                self.expect(&TokenKind::RBracket, "',' or ']'")?;
                return Ok(items);
            }
        }
    }

    fn value(&mut self, depth: usize) -> Result<Value, ParseError> {
        if self.peek()?.kind == TokenKind::LBrace {
            return self.object(depth).map(Value::Object);
        }
        if self.peek()?.kind == TokenKind::LBracket {
            return self.array(depth).map(Value::Array);
        }

        let token = self.bump()?;
        match &token.kind {
            TokenKind::Str(value) => Ok(Value::String(value.clone())),
            TokenKind::Number(raw) => parse_number(raw)
                .ok_or_else(|| self.error_at(token.position, format!("Invalid number '{raw}'"))),
            TokenKind::Ident(name) => match name.as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                "null" => Ok(Value::Null),
                other => Err(self.error_at(
                    token.position,
                    format!("Expected a literal value, found identifier '{other}'"),
                )),
            },
            _ => Err(self.unexpected_token(&token, "value")),
        }
    }
}

fn parse_number(raw: &str) -> Option<Value> {
    let cleaned = raw.replace('_', "");
    let (negative, digits) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };

    let hex = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X"));
    if let Some(hex) = hex {
        let magnitude = i64::from_str_radix(hex, 16).ok()?;
        return Some(Value::from(if negative { -magnitude } else { magnitude }));
    }

    if let Ok(integer) = digits.parse::<u64>() {
        if !negative {
            return Some(Value::from(integer));
        }
        if let Ok(signed) = i64::try_from(integer) {
            return Some(Value::from(-signed));
        }
    }

    let float: f64 = cleaned.parse().ok()?;
    Number::from_f64(float).map(Value::Number)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use googletest::prelude::*;
    use pretty_assertions::assert_eq;
    use rstest::*;
    use serde_json::json;

    use super::*;

    #[rstest]
    fn parse_preserves_urls_with_double_slash() {
        let text = "let json = {\n// lingo-start\n\"k\": \"https://example.com//x\",\n// lingo-end\n}\nexport default json";

        let literal = parse_locale_file("zh_CN.js", text).unwrap();

        assert_eq!(Value::Object(literal.entries), json!({"k": "https://example.com//x"}));
        assert_that!(literal.binding, eq("json"));
    }

    #[rstest]
    fn parse_lenient_syntax() {
        let text = r#"
/* generated */
const messages = {
  // lingo-start
  'single': 'it\'s',
  bare_key: "value", // trailing comment
  "nested": { "list": [1, 2.5, -3, true, null,], },
  42: "numeric key",
  // lingo-end
};
export default messages;
"#;

        let literal = parse_locale_file("en_US.js", text).unwrap();

        assert_eq!(
            Value::Object(literal.entries),
            json!({
                "single": "it's",
                "bare_key": "value",
                "nested": { "list": [1, 2.5, -3, true, null] },
                "42": "numeric key"
            })
        );
    }

    #[rstest]
    fn parse_keeps_source_order() {
        let literal = parse_locale_file("a.js", "let json = { b: '1', a: '2', c: '3' }").unwrap();

        let keys: Vec<_> = literal.entries.keys().map(String::as_str).collect();
        assert_that!(keys, elements_are![eq(&"b"), eq(&"a"), eq(&"c")]);
    }

    #[rstest]
    fn parse_duplicate_keys_last_wins() {
        let literal = parse_locale_file("a.js", "let json = { k: 'old', k: 'new' }").unwrap();

        assert_eq!(Value::Object(literal.entries), json!({"k": "new"}));
    }

    #[rstest]
    fn parse_empty_managed_region() {
        let text = "let json = {\n// lingo-start\n// lingo-end\n}\nexport default json\n";

        let literal = parse_locale_file("ja_JP.js", text).unwrap();

        assert_that!(literal.entries.is_empty(), eq(true));
    }

    #[rstest]
    #[case::no_binding("{ \"k\": \"v\" }", "binding")]
    #[case::missing_equals("let json { }", "Expected '='")]
    #[case::missing_comma("let json = { a: '1' b: '2' }", "Expected ',' or '}'")]
    #[case::double_comma("let json = { a: '1',, }", "property name")]
    #[case::unclosed("let json = { a: '1'", "Expected ',' or '}'")]
    #[case::export_mismatch("let json = {} export default other", "does not match binding")]
    #[case::trailing_code("let json = {} other", "Expected end of input")]
    #[case::identifier_value("let json = { a: undefined }", "identifier 'undefined'")]
    #[case::call_expression("let json = { a: (1) }", "Unexpected character '('")]
    fn parse_rejects_malformed_input(#[case] text: &str, #[case] message: &str) {
        let result = parse_locale_file("bad.js", text);

        assert_that!(
            result,
            err(all![
                field!(ParseError.source_name, eq("bad.js")),
                field!(ParseError.message, contains_substring(message))
            ])
        );
    }

    #[rstest]
    fn parse_error_names_position_and_text() {
        let text = "let json = {\n  \"a\": \"1\"\n  \"b\": \"2\"\n}";

        let error = parse_locale_file("zh_CN.js", text).unwrap_err();

        assert_that!(error.position, eq(SourcePosition::new(2, 2)));
        assert_that!(error.snippet, eq("\"b\": \"2\""));
        assert_that!(error.to_string(), contains_substring("zh_CN.js:3:3"));
    }

    #[rstest]
    fn parse_rejects_deep_nesting() {
        let text = format!("let json = {}{}", "{a:".repeat(100), "}".repeat(100));

        let result = parse_locale_file("deep.js", &text);

        assert_that!(result, err(field!(ParseError.message, contains_substring("nested too deeply"))));
    }

    #[rstest]
    #[case::use_strict("'use strict';\nlet json = { a: 'x' }\nexport default json\n")]
    #[case::other_binding("const version = 2;\nlet json = { a: 'x' };\nexport default json;\n")]
    #[case::binding_in_comment("// let json = {} is generated\nlet json = { a: 'x' }\nexport default json")]
    #[case::code_after_export("let json = { a: 'x' }\nexport default json;\nconsole.log(json);\n")]
    fn parse_skips_surrounding_statements(#[case] text: &str) {
        let literal = parse_locale_file("zh_CN.js", text).unwrap();

        assert_eq!(Value::Object(literal.entries), json!({"a": "x"}));
        assert_that!(literal.binding, eq("json"));
    }

    #[rstest]
    fn parse_reports_first_candidate_error() {
        let text = "'use strict';\nlet json = { a: 'x' b: 'y' }\nexport default json\n";

        let error = parse_locale_file("zh_CN.js", text).unwrap_err();

        assert_that!(error.position, eq(SourcePosition::new(1, 20)));
        assert_that!(error.message, contains_substring("Expected ',' or '}'"));
    }

    #[rstest]
    #[case("0x1F", json!(31))]
    #[case("-7", json!(-7))]
    #[case("1_000", json!(1000))]
    #[case("1e3", json!(1000.0))]
    fn parse_number_cases(#[case] raw: &str, #[case] expected: Value) {
        assert_eq!(parse_number(raw), Some(expected));
    }
}
