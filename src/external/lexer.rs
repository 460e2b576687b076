//! Tokenizer for service locale files.
//!
//! Comments and whitespace are trivia and never produce tokens. String literals are decoded
//! here, so `//` inside a quoted URL is just string content.

use std::iter::Peekable;
use std::str::CharIndices;

use super::ParseError;
use crate::types::SourcePosition;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum TokenKind {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Equals,
    Semicolon,
    /// Decoded string contents.
    Str(String),
    /// Raw numeric literal text.
    Number(String),
    Ident(String),
    Eof,
}

impl TokenKind {
    /// How the token reads in error messages.
    pub(crate) fn describe(&self) -> String {
        match self {
            Self::LBrace => "'{'".to_string(),
            Self::RBrace => "'}'".to_string(),
            Self::LBracket => "'['".to_string(),
            Self::RBracket => "']'".to_string(),
            Self::Colon => "':'".to_string(),
            Self::Comma => "','".to_string(),
            Self::Equals => "'='".to_string(),
            Self::Semicolon => "';'".to_string(),
            Self::Str(_) => "string".to_string(),
            Self::Number(raw) => format!("number '{raw}'"),
            Self::Ident(name) => format!("'{name}'"),
            Self::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Token {
    pub(crate) kind: TokenKind,
    pub(crate) position: SourcePosition,
}

pub(crate) struct Lexer<'a> {
    source_name: &'a str,
    text: &'a str,
    chars: Peekable<CharIndices<'a>>,
    position: SourcePosition,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(source_name: &'a str, text: &'a str) -> Self {
        Self {
            source_name,
            text,
            chars: text.char_indices().peekable(),
            position: SourcePosition::default(),
        }
    }

    /// Starts at byte `offset` of `text`, keeping positions relative to the whole text.
    pub(crate) fn starting_at(source_name: &'a str, text: &'a str, offset: usize) -> Self {
        let mut lexer = Self::new(source_name, text);
        while lexer.chars.peek().is_some_and(|(index, _)| *index < offset) {
            lexer.bump();
        }
        lexer
    }

    /// Tokenizes the whole input. The last token is always `Eof`.
    #[cfg(test)]
    pub(crate) fn tokenize(mut self) -> Result<Vec<Token>, ParseError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    /// Second character ahead, without consuming anything.
    fn peek_second(&self) -> Option<char> {
        let mut ahead = self.chars.clone();
        ahead.next();
        ahead.next().map(|(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        self.position.advance(c);
        Some(c)
    }

    fn error(&self, position: SourcePosition, message: impl Into<String>) -> ParseError {
        ParseError::new(self.source_name, self.text, position, message)
    }

    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() || c == '\u{feff}' => {
                    self.bump();
                }
                Some('/') => match self.peek_second() {
                    Some('/') => {
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.bump();
                        }
                    }
                    Some('*') => {
                        let start = self.position;
                        self.bump();
                        self.bump();
                        loop {
                            match self.bump() {
                                Some('*') if self.peek() == Some('/') => {
                                    self.bump();
                                    break;
                                }
                                Some(_) => {}
                                None => return Err(self.error(start, "Unterminated block comment")),
                            }
                        }
                    }
                    _ => return Ok(()),
                },
                _ => return Ok(()),
            }
        }
    }

    /// Reads one token. At the end of input this keeps returning `Eof`.
    pub(crate) fn next_token(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia()?;
        let position = self.position;

        let Some(c) = self.peek() else {
            return Ok(Token { kind: TokenKind::Eof, position });
        };

        let kind = match c {
            '{' | '}' | '[' | ']' | ':' | ',' | '=' | ';' => {
                self.bump();
                match c {
                    '{' => TokenKind::LBrace,
                    '}' => TokenKind::RBrace,
                    '[' => TokenKind::LBracket,
                    ']' => TokenKind::RBracket,
                    ':' => TokenKind::Colon,
                    ',' => TokenKind::Comma,
                    '=' => TokenKind::Equals,
                    _ => TokenKind::Semicolon,
                }
            }
            '"' | '\'' | '`' => TokenKind::Str(self.string(c)?),
            '-' | '+' | '.' | '0'..='9' => TokenKind::Number(self.number()?),
            c if is_ident_start(c) => {
                let mut name = String::new();
                while let Some(c) = self.peek() {
                    if !is_ident_continue(c) {
                        break;
                    }
                    name.push(c);
                    self.bump();
                }
                TokenKind::Ident(name)
            }
            other => return Err(self.error(position, format!("Unexpected character '{other}'"))),
        };

        Ok(Token { kind, position })
    }

    fn number(&mut self) -> Result<String, ParseError> {
        let start = self.position;
        let mut raw = String::new();
        if let Some(sign @ ('-' | '+')) = self.peek() {
            raw.push(sign);
            self.bump();
        }
        while let Some(c) = self.peek() {
            let exponent_sign = matches!(c, '-' | '+') && raw.ends_with(['e', 'E']);
            if !(c.is_ascii_alphanumeric() || c == '.' || c == '_' || exponent_sign) {
                break;
            }
            raw.push(c);
            self.bump();
        }
        if raw.chars().any(|c| c.is_ascii_digit()) {
            Ok(raw)
        } else {
            Err(self.error(start, format!("Invalid number '{raw}'")))
        }
    }

    fn string(&mut self, quote: char) -> Result<String, ParseError> {
        let start = self.position;
        self.bump();
        let mut value = String::new();

        loop {
            let Some(c) = self.bump() else {
                return Err(self.error(start, "Unterminated string literal"));
            };
            match c {
                c if c == quote => return Ok(value),
                '\\' => self.escape(&mut value)?,
                '\n' if quote != '`' => {
                    return Err(self.error(start, "Line break inside string literal"));
                }
                '$' if quote == '`' && self.peek() == Some('{') => {
                    return Err(self.error(start, "Template interpolation is not a literal"));
                }
                c => value.push(c),
            }
        }
    }

    fn escape(&mut self, value: &mut String) -> Result<(), ParseError> {
        let position = self.position;
        let Some(c) = self.bump() else {
            return Err(self.error(position, "Unterminated escape sequence"));
        };
        match c {
            'n' => value.push('\n'),
            'r' => value.push('\r'),
            't' => value.push('\t'),
            'b' => value.push('\u{8}'),
            'f' => value.push('\u{c}'),
            'v' => value.push('\u{b}'),
            '0' => value.push('\0'),
            // line continuation
            '\n' => {}
            '\r' => {
                if self.peek() == Some('\n') {
                    self.bump();
                }
            }
            'x' => {
                let code = self.hex_digits(2, position)?;
                value.push(self.to_char(code, position)?);
            }
            'u' => {
                let code = self.unicode_code_unit(position)?;
                if (0xD800..0xDC00).contains(&code) {
                    let low_position = self.position;
                    if self.bump() != Some('\\') || self.bump() != Some('u') {
                        return Err(self.error(position, "Unpaired UTF-16 surrogate"));
                    }
                    let low = self.unicode_code_unit(low_position)?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(self.error(position, "Unpaired UTF-16 surrogate"));
                    }
                    let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                    value.push(self.to_char(combined, position)?);
                } else {
                    value.push(self.to_char(code, position)?);
                }
            }
            // \\ \" \' \` \/ and any other character stand for themselves
            other => value.push(other),
        }
        Ok(())
    }

    /// Reads the part after `\u`: either `XXXX` or `{X...}`.
    fn unicode_code_unit(&mut self, position: SourcePosition) -> Result<u32, ParseError> {
        if self.peek() != Some('{') {
            return self.hex_digits(4, position);
        }
        self.bump();
        let mut digits = String::new();
        loop {
            match self.bump() {
                Some('}') => break,
                Some(c) if c.is_ascii_hexdigit() && digits.len() < 6 => digits.push(c),
                _ => return Err(self.error(position, "Invalid \\u{...} escape")),
            }
        }
        u32::from_str_radix(&digits, 16)
            .map_err(|_| self.error(position, "Invalid \\u{...} escape"))
    }

    fn hex_digits(&mut self, count: usize, position: SourcePosition) -> Result<u32, ParseError> {
        let mut digits = String::with_capacity(count);
        for _ in 0..count {
            match self.bump() {
                Some(c) if c.is_ascii_hexdigit() => digits.push(c),
                _ => {
                    return Err(
                        self.error(position, format!("Expected {count} hex digits in escape"))
                    );
                }
            }
        }
        u32::from_str_radix(&digits, 16)
            .map_err(|_| self.error(position, format!("Expected {count} hex digits in escape")))
    }

    fn to_char(&self, code: u32, position: SourcePosition) -> Result<char, ParseError> {
        char::from_u32(code).ok_or_else(|| {
            self.error(position, format!("Escape does not encode a character: {code:#x}"))
        })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use googletest::prelude::*;
    use rstest::*;

    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        Lexer::new("test.js", text).tokenize().unwrap().into_iter().map(|t| t.kind).collect()
    }

    fn single_string(text: &str) -> String {
        match kinds(text).into_iter().next() {
            Some(TokenKind::Str(value)) => value,
            other => panic!("expected a string token, got {other:?}"),
        }
    }

    #[rstest]
    fn tokenize_skips_comments() {
        let tokens = kinds("{ // lingo-start\n /* block\n comment */ a: 1, }");

        assert_eq!(
            tokens,
            vec![
                TokenKind::LBrace,
                TokenKind::Ident("a".to_string()),
                TokenKind::Colon,
                TokenKind::Number("1".to_string()),
                TokenKind::Comma,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[rstest]
    fn tokenize_keeps_double_slash_inside_strings() {
        assert_that!(single_string(r#""https://example.com//x""#), eq("https://example.com//x"));
        assert_that!(single_string("'a // b /* c */'"), eq("a // b /* c */"));
    }

    #[rstest]
    #[case::newline(r#""a\nb""#, "a\nb")]
    #[case::quotes(r#""say \"hi\" \'x\'""#, "say \"hi\" 'x'")]
    #[case::backslash(r#""a\\b""#, "a\\b")]
    #[case::hex(r#""\x41""#, "A")]
    #[case::bmp(r#""\u4F60\u597D""#, "你好")]
    #[case::surrogate_pair(r#""\uD83D\uDE00""#, "😀")]
    #[case::braced(r#""\u{1F600}""#, "😀")]
    #[case::continuation("\"a\\\nb\"", "ab")]
    #[case::unknown_escape(r#""\q""#, "q")]
    #[case::backtick("`multi\nline`", "multi\nline")]
    fn tokenize_decodes_escapes(#[case] text: &str, #[case] expected: &str) {
        assert_that!(single_string(text), eq(expected));
    }

    #[rstest]
    #[case::unterminated_string(r#""abc"#, "Unterminated string")]
    #[case::raw_newline("\"a\nb\"", "Line break")]
    #[case::lone_surrogate(r#""\uD83D""#, "Unpaired UTF-16 surrogate")]
    #[case::bad_hex(r#""\xZZ""#, "hex digits")]
    #[case::interpolation("`${x}`", "interpolation")]
    #[case::unterminated_comment("{ /* open", "Unterminated block comment")]
    #[case::stray_character("{ # }", "Unexpected character '#'")]
    fn tokenize_reports_errors(#[case] text: &str, #[case] message: &str) {
        let result = Lexer::new("test.js", text).tokenize();

        assert_that!(result, err(field!(ParseError.message, contains_substring(message))));
    }

    #[rstest]
    fn tokenize_tracks_positions() {
        let tokens = Lexer::new("test.js", "let json = {\n  \"k\": 1\n}").tokenize().unwrap();

        let key = tokens.iter().find(|t| t.kind == TokenKind::Str("k".to_string())).unwrap();
        assert_that!(key.position, eq(SourcePosition::new(1, 2)));
    }

    #[rstest]
    fn starting_at_keeps_whole_text_positions() {
        let text = "'use strict';\nlet json = {}";
        let offset = text.find("let").unwrap();

        let mut lexer = Lexer::starting_at("test.js", text, offset);
        let token = lexer.next_token().unwrap();

        assert_that!(token.kind, eq(&TokenKind::Ident("let".to_string())));
        assert_that!(token.position, eq(SourcePosition::new(1, 0)));
    }

    #[rstest]
    #[case("-1.5e-3")]
    #[case("0x1F")]
    #[case("42")]
    fn tokenize_numbers(#[case] text: &str) {
        assert_eq!(kinds(text)[0], TokenKind::Number(text.to_string()));
    }
}
