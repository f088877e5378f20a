// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! A parser for templated YAML: YAML 1.2 block/flow syntax with inline
//! Go-style template actions delimited by `{{` and `}}`.
//!
//! The front end has three stages: an indentation-sensitive scanner
//! producing a token stream, a template lexer re-tokenizing the text
//! inside `{{…}}` actions, and a two-headed recursive-descent parser
//! consuming both streams into a single AST. Templates can appear at any
//! structural position of a document — as values, as whole documents, or
//! wrapping mapping entries — and template constructs can in turn contain
//! YAML fragments.
//!
//! Every token records both its normalized value and the exact source
//! text (`origin`) that produced it, so the token stream reconstructs the
//! input byte-for-byte. The parser stops at the first error; use
//! [`format_error`] to render errors with positions and source excerpts.
//!
//! # Example
//!
//! ```
//! use yaml_template_parser::{parse_bytes, Mode};
//!
//! let input = b"replicas: {{ .Values.replicas }}\n";
//! let file = parse_bytes(input, Mode::default()).unwrap();
//! assert_eq!(file.docs.len(), 1);
//! ```

pub mod ast;
mod error;
mod parser;
mod scanner;
pub mod token;
mod unquote;

pub use ast::{dump, dump_template, File, Node, NodeKind};
pub use error::{format_error, ErrorKind, ParseError};
pub use parser::{parse, parse_bytes, parse_file, Mode};
pub use scanner::{Chomping, IndentState, Scanner};
pub use token::{Position, Token, TokenKind, Tokens};

/// Split `text` into tokens.
///
/// This is a lenient convenience over [`Scanner`]: scanning stops at end
/// of input or at the first scan error, returning the tokens produced so
/// far. [`parse_bytes`] reports scan errors instead.
#[must_use]
pub fn tokenize(text: &str) -> Tokens {
    let mut scanner = Scanner::new(text);
    let mut tokens = Tokens::new();
    while let Ok(batch) = scanner.scan() {
        tokens.extend(batch);
    }
    let leftover = scanner.take_pending_origin();
    if !leftover.is_empty() {
        if let Some(last) = tokens.last_mut() {
            last.origin.push_str(&leftover);
        }
    }
    tokens
}

#[cfg(test)]
mod tests;
