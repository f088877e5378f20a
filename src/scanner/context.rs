// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Per-call scratch state for [`Scanner::scan`](super::Scanner::scan).
//!
//! The context owns the two accumulation buffers: `buf` holds the
//! normalized value of the scalar currently being assembled, `obuf` holds
//! the verbatim origin text (including whitespace) that will be attached
//! to the next emitted token. Flushing the buffers produces a token whose
//! position is where the first buffered content character appeared.

use crate::token::{Position, Token, TokenKind, Tokens};

/// Block scalar chomping behavior, derived from the header options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Chomping {
    /// `-`: strip all trailing newlines.
    Strip,
    /// Default: keep exactly one trailing newline.
    #[default]
    Clip,
    /// `+`: keep all trailing newlines.
    Keep,
}

#[derive(Debug)]
pub(super) struct Context<'a> {
    /// Index of the current rune within `src`.
    pub(super) idx: usize,
    src: &'a [char],
    /// Normalized value buffer.
    buf: String,
    /// Verbatim origin buffer.
    obuf: String,
    /// Byte length of `buf` through its last non-space character.
    not_space_char_pos: usize,
    /// Position where the first buffered content character appeared.
    buf_position: Option<Position>,
    pub(super) is_raw_folded: bool,
    pub(super) is_literal: bool,
    pub(super) is_folded: bool,
    /// Chomping indicator from the block scalar header.
    pub(super) chomping: Chomping,
    /// Tokens produced by the current scan call.
    pub(super) tokens: Tokens,
}

impl<'a> Context<'a> {
    pub(super) fn new(src: &'a [char]) -> Self {
        Self {
            idx: 0,
            src,
            buf: String::new(),
            obuf: String::new(),
            not_space_char_pos: 0,
            buf_position: None,
            is_raw_folded: false,
            is_literal: false,
            is_folded: false,
            chomping: Chomping::Clip,
            tokens: Tokens::new(),
        }
    }

    pub(super) fn next(&self) -> bool {
        self.idx < self.src.len()
    }

    pub(super) fn current_char(&self) -> char {
        self.src[self.idx]
    }

    pub(super) fn previous_char(&self) -> char {
        if self.idx > 0 {
            self.src[self.idx - 1]
        } else {
            '\0'
        }
    }

    pub(super) fn next_char(&self) -> char {
        self.src.get(self.idx + 1).copied().unwrap_or('\0')
    }

    /// The rune `n` positions ahead of the cursor, if any.
    pub(super) fn peek_at(&self, n: usize) -> Option<char> {
        self.src.get(self.idx + n).copied()
    }

    /// Number of consecutive occurrences of `c` starting at the cursor.
    pub(super) fn repeat_num(&self, c: char) -> usize {
        self.src[self.idx..].iter().take_while(|&&r| r == c).count()
    }

    pub(super) fn progress(&mut self, num: usize) {
        self.idx += num;
    }

    /// The current rune is the last rune of the source.
    pub(super) fn is_eos(&self) -> bool {
        self.idx + 1 >= self.src.len()
    }

    pub(super) fn is_block_scalar(&self) -> bool {
        self.is_literal || self.is_folded || self.is_raw_folded
    }

    pub(super) fn break_scalar(&mut self) {
        self.is_literal = false;
        self.is_folded = false;
        self.is_raw_folded = false;
        self.chomping = Chomping::Clip;
    }

    pub(super) fn add_token(&mut self, token: Token) {
        self.tokens.add(token);
    }

    /// Append a rune to the normalized value buffer.
    ///
    /// Leading spaces are dropped; the first content character pins the
    /// buffered token's position.
    pub(super) fn add_buf(&mut self, c: char, position: Position) {
        if self.buf.is_empty() {
            if c == ' ' {
                return;
            }
            self.buf_position = Some(position);
        }
        self.buf.push(c);
        if c != ' ' && c != '\t' {
            self.not_space_char_pos = self.buf.len();
        }
    }

    pub(super) fn add_origin(&mut self, c: char) {
        self.obuf.push(c);
    }

    pub(super) fn add_origin_str(&mut self, s: &str) {
        self.obuf.push_str(s);
    }

    pub(super) fn origin(&self) -> &str {
        &self.obuf
    }

    /// Take any origin text not yet attached to a token.
    pub(super) fn take_origin(&mut self) -> String {
        std::mem::take(&mut self.obuf)
    }

    /// Seed the origin buffer with text carried over from the previous
    /// scan batch.
    pub(super) fn seed_origin(&mut self, origin: String) {
        debug_assert!(self.obuf.is_empty());
        self.obuf = origin;
    }

    pub(super) fn set_raw_folded(&mut self) {
        self.is_raw_folded = true;
    }

    /// Drain the origin buffer, appending `lit`, for a fixed-text token.
    pub(super) fn origin_with(&mut self, lit: &str) -> String {
        let mut origin = std::mem::take(&mut self.obuf);
        origin.push_str(lit);
        origin
    }

    /// The normalized buffer content with trailing spaces removed.
    fn buffered_src(&self) -> &str {
        &self.buf[..self.not_space_char_pos]
    }

    pub(super) fn exists_buffer(&self) -> bool {
        !self.buffered_src().is_empty()
    }

    /// Flush the buffers into a token, or `None` when nothing is buffered.
    ///
    /// Inside a block scalar the token is always a String and the
    /// chomping indicator is applied to its trailing newlines.
    pub(super) fn buffered_token(&mut self) -> Option<Token> {
        let mut value = self.buffered_src().to_owned();
        if value.is_empty() {
            return None;
        }
        if self.is_block_scalar() {
            match self.chomping {
                Chomping::Strip => {
                    while value.ends_with('\n') {
                        value.pop();
                    }
                }
                Chomping::Clip => {
                    while value.ends_with("\n\n") {
                        value.pop();
                    }
                }
                Chomping::Keep => {}
            }
        }
        let position = self.buf_position.unwrap_or_default();
        let origin = std::mem::take(&mut self.obuf);
        let token = if self.is_block_scalar() {
            Token::with_kind(TokenKind::String, value, origin, position)
        } else {
            Token::new(value, origin, position)
        };
        self.reset_buffer();
        Some(token)
    }

    pub(super) fn add_buffered_token_if_exists(&mut self) {
        if let Some(token) = self.buffered_token() {
            self.add_token(token);
        }
    }

    fn reset_buffer(&mut self) {
        self.buf.clear();
        self.obuf.clear();
        self.not_space_char_pos = 0;
        self.buf_position = None;
    }
}
