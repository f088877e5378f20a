// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Error types for templated-YAML parsing.
//!
//! Errors carry the offending token so callers can report accurate
//! line/column information. As an error bubbles out of the parser it is
//! wrapped with context describing what was being parsed; the first error
//! terminates the parse. End of input from the scanner is a distinguished
//! sentinel, not a failure.

use colored::Colorize;
use derive_more::Display;

use crate::token::{Token, TokenKind};

/// The kind of parse error.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum ErrorKind {
    /// Scanner end-of-input sentinel. Not a true error.
    #[display("end of input")]
    EndOfInput,

    /// Block scalar header options were not a chomping/indent indicator
    #[display("invalid block scalar header")]
    InvalidBlockScalarHeader,

    /// A `{{` action with no matching `}}`
    #[display("unterminated template action")]
    UnterminatedTemplate,

    /// A quoted string with no closing quote
    #[display("unterminated quoted string")]
    UnterminatedQuote,

    /// A token that cannot appear in the current context
    #[display("unexpected {_0} token")]
    UnexpectedToken(TokenKind),

    /// A plain mapping key spanning multiple lines
    #[display("unexpected key name")]
    UnexpectedKeyName,

    /// A mapping key whose value starts at the key column
    #[display("could not find expected ':' token")]
    MissingMappingValue,

    /// A `%` directive not followed by `---`
    #[display("unexpected directive value. document not started")]
    DirectiveWithoutDocument,

    /// `!!seq` and `!!set` are declared unsupported
    #[display("sorry, currently not supported {_0} tag")]
    UnsupportedTag(String),

    /// `&` with no name token following
    #[display("unexpected anchor. anchor name is undefined")]
    AnchorNameUndefined,

    /// `&name` with no value node following
    #[display("unexpected anchor. anchor value is undefined")]
    AnchorValueUndefined,

    /// `*` with no name token following
    #[display("unexpected alias. alias name is undefined")]
    AliasNameUndefined,

    /// A `|`/`>` header not followed by scalar content
    #[display("unexpected token. required string token")]
    RequiredStringToken,

    /// A `{` with no matching `}`
    #[display("could not find flow mapping end token")]
    FlowMappingNotClosed,

    /// A `[` with no matching `]`
    #[display("could not find flow sequence end token")]
    FlowSequenceNotClosed,

    /// An error raised by the template sub-parser
    #[display("template: {_0}")]
    Template(String),
}

/// An error produced while scanning or parsing.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    /// The kind of error.
    pub kind: ErrorKind,
    /// The token at which the error occurred, when one is available.
    pub token: Option<Token>,
    /// Context pushed as the error bubbles outward, innermost first.
    context: Vec<String>,
}

impl ParseError {
    /// Create a new error at the given token.
    #[must_use]
    pub fn new(kind: ErrorKind, token: Token) -> Self {
        Self {
            kind,
            token: Some(token),
            context: Vec::new(),
        }
    }

    /// Create an error with no token position.
    #[must_use]
    pub fn without_token(kind: ErrorKind) -> Self {
        Self {
            kind,
            token: None,
            context: Vec::new(),
        }
    }

    /// The end-of-input sentinel returned by [`Scanner::scan`](crate::Scanner::scan).
    #[must_use]
    pub fn end_of_input() -> Self {
        Self::without_token(ErrorKind::EndOfInput)
    }

    /// Returns `true` if this is the end-of-input sentinel.
    #[must_use]
    pub fn is_end_of_input(&self) -> bool {
        self.kind == ErrorKind::EndOfInput
    }

    /// Wrap the error with outward-facing context.
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for ctx in self.context.iter().rev() {
            write!(f, "{ctx}: ")?;
        }
        write!(f, "{}", self.kind)
    }
}

impl std::error::Error for ParseError {}

/// Render a parse error for display.
///
/// The output contains the error message prefixed with the `[line:column]`
/// of the offending token. When `include_source` is set, a source excerpt
/// with a caret under the token is appended. When `colored` is set, the
/// message and caret are wrapped in ANSI color codes.
#[must_use]
pub fn format_error(err: &ParseError, colored: bool, include_source: bool) -> String {
    let Some(token) = &err.token else {
        return err.to_string();
    };

    let message = format!(
        "[{}:{}] {}",
        token.position.line, token.position.column, err
    );
    let mut out = if colored {
        message.red().to_string()
    } else {
        message
    };

    if include_source {
        let line = excerpt_line(token);
        let number = format!("{:>4} | ", token.position.line);
        let caret_pad = " ".repeat(number.len() + token.position.column.saturating_sub(1));
        let caret = if colored {
            "^".red().bold().to_string()
        } else {
            "^".to_owned()
        };
        out.push('\n');
        out.push_str(&number);
        out.push_str(&line);
        out.push('\n');
        out.push_str(&caret_pad);
        out.push_str(&caret);
    }

    out
}

/// Reconstruct the source line containing the token start.
///
/// Only the token stream is available here, so the excerpt is built from
/// the token's own origin text: leading newlines are dropped and the line
/// is padded out to the token's column.
fn excerpt_line(token: &Token) -> String {
    let origin = token.origin.trim_start_matches(['\r', '\n']);
    let first_line = origin.split(['\r', '\n']).next().unwrap_or(origin);
    let trimmed = first_line.trim_start_matches(' ');
    let mut line = " ".repeat(token.position.column.saturating_sub(1));
    line.push_str(trimmed);
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Position;

    fn token_at(value: &str, line: usize, column: usize) -> Token {
        Token::new(
            value,
            value,
            Position {
                line,
                column,
                ..Position::default()
            },
        )
    }

    #[test]
    fn test_display_with_context() {
        let err = ParseError::new(
            ErrorKind::UnexpectedKeyName,
            token_at("foo", 2, 1),
        )
        .with_context("validate mapping key error")
        .with_context("failed to parse map key");
        assert_eq!(
            err.to_string(),
            "failed to parse map key: validate mapping key error: unexpected key name"
        );
    }

    #[test]
    fn test_end_of_input_sentinel() {
        let err = ParseError::end_of_input();
        assert!(err.is_end_of_input());
        assert_eq!(err.to_string(), "end of input");
    }

    #[test]
    fn test_format_error_plain() {
        let err = ParseError::new(ErrorKind::MissingMappingValue, token_at("value", 3, 5));
        let rendered = format_error(&err, false, true);
        assert!(rendered.starts_with("[3:5] could not find expected ':' token"));
        assert!(rendered.contains("   3 | "));
        assert!(rendered.ends_with('^'));
    }

    #[test]
    fn test_format_error_without_source() {
        let err = ParseError::new(ErrorKind::UnexpectedToken(TokenKind::MappingValue), token_at(":", 1, 1));
        let rendered = format_error(&err, false, false);
        assert_eq!(rendered, "[1:1] unexpected ':' token");
        assert!(!rendered.contains('\n'));
    }
}
