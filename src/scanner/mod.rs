// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Indentation-sensitive scanner for templated YAML.
//!
//! The scanner walks the input rune by rune, tracking line, column, byte
//! offset and the relationship of each line's indentation to the previous
//! line's (the indent state machine). Each [`Scanner::scan`] call emits
//! the next batch of tokens and returns when a structural token was just
//! emitted, a separator was reached, or the input is exhausted; end of
//! input is signalled by the [`ParseError::end_of_input`] sentinel.
//!
//! `{{ … }}` regions are captured verbatim as a single opaque Template
//! token; the template lexer in the parser re-tokenizes their text.

mod context;

pub use context::Chomping;

use crate::error::{ErrorKind, ParseError};
use crate::token::{Position, Token, TokenKind, Tokens};

use self::context::Context;

/// The relationship of the current line's indentation to the previous
/// line's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndentState {
    /// Same indentation as the previous line.
    #[default]
    Equal,
    /// More indentation than the previous line.
    Up,
    /// Less indentation than the previous line.
    Down,
    /// Not at the first character of a line; no indent change applies.
    Keep,
}

/// Scanner state while processing a given text.
///
/// A `Scanner` can be allocated as part of another structure but must be
/// initialized via [`Scanner::init`] before use.
#[derive(Debug, Default)]
pub struct Scanner {
    source: Vec<char>,
    /// Rune index of the next scan batch within `source`.
    source_pos: usize,
    line: usize,
    column: usize,
    /// Byte offset into the original UTF-8 input.
    offset: usize,
    prev_indent_level: usize,
    prev_indent_num: usize,
    /// Column pinned by a sequence entry, mapping value, or merge key.
    /// Overrides space counting when deriving the indent state.
    prev_indent_column: usize,
    /// Column of the first content character of a block scalar.
    doc_start_column: usize,
    indent_level: usize,
    indent_num: usize,
    is_first_char_at_line: bool,
    is_anchor: bool,
    flow_sequence_depth: usize,
    flow_map_depth: usize,
    indent_state: IndentState,
    /// Origin text reaching end of input with no token to carry it.
    pending_origin: String,
}

fn is_new_line_char(c: char) -> bool {
    c == '\n' || c == '\r'
}

impl Scanner {
    /// Create a scanner positioned at the beginning of `text`.
    #[must_use]
    pub fn new(text: &str) -> Self {
        let mut scanner = Self::default();
        scanner.init(text);
        scanner
    }

    /// Prepare the scanner to tokenize `text` from the beginning.
    pub fn init(&mut self, text: &str) {
        self.source = text.chars().collect();
        self.source_pos = 0;
        self.line = 1;
        self.column = 1;
        self.offset = 0;
        self.prev_indent_level = 0;
        self.prev_indent_num = 0;
        self.prev_indent_column = 0;
        self.doc_start_column = 0;
        self.indent_level = 0;
        self.indent_num = 0;
        self.is_first_char_at_line = true;
        self.is_anchor = false;
        self.flow_sequence_depth = 0;
        self.flow_map_depth = 0;
        self.indent_state = IndentState::Equal;
        self.pending_origin = String::new();
    }

    /// Scan the next batch of tokens.
    ///
    /// Returns the end-of-input sentinel once the source is exhausted.
    pub fn scan(&mut self) -> Result<Tokens, ParseError> {
        if self.source_pos >= self.source.len() {
            return Err(ParseError::end_of_input());
        }
        let source = std::mem::take(&mut self.source);
        let mut ctx = Context::new(&source[self.source_pos..]);
        ctx.seed_origin(std::mem::take(&mut self.pending_origin));
        let result = self.scan_batch(&mut ctx);
        self.source_pos += ctx.idx;
        let tokens = std::mem::take(&mut ctx.tokens);
        let leftover = ctx.take_origin();
        drop(ctx);
        self.source = source;
        self.pending_origin = leftover;
        result.map(|()| tokens)
    }

    /// Origin text not yet attached to a token — either carried into the
    /// next batch, or (at end of input) consumed by
    /// [`tokenize`](crate::tokenize) to keep the origin round-trip exact.
    pub(crate) fn take_pending_origin(&mut self) -> String {
        std::mem::take(&mut self.pending_origin)
    }

    fn pos(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.offset,
            indent_num: self.indent_num,
            indent_level: self.indent_level,
        }
    }

    /// Consume one non-newline rune.
    fn advance(&mut self, ctx: &mut Context<'_>, c: char) {
        self.column += 1;
        self.offset += c.len_utf8();
        ctx.progress(1);
    }

    fn advance_n(&mut self, ctx: &mut Context<'_>, n: usize) {
        for _ in 0..n {
            let c = ctx.current_char();
            self.advance(ctx, c);
        }
    }

    /// Consume a line break (`\n`, `\r\n`, or lone `\r`), returning the
    /// exact text consumed. `\r\n` counts as a single break.
    fn consume_line_break(&mut self, ctx: &mut Context<'_>) -> &'static str {
        let c = ctx.current_char();
        let text = if c == '\r' && ctx.next_char() == '\n' {
            self.offset += 1;
            ctx.progress(1);
            "\r\n"
        } else if c == '\r' {
            "\r"
        } else {
            "\n"
        };
        self.offset += 1;
        ctx.progress(1);
        self.line += 1;
        self.column = 1;
        self.indent_num = 0;
        self.is_first_char_at_line = true;
        self.is_anchor = false;
        text
    }

    fn keep_previous_indent(&self, ctx: &Context<'_>, c: char) -> bool {
        if self.indent_state != IndentState::Up {
            return false;
        }
        if ctx.is_block_scalar() {
            return true;
        }
        c == '-' && ctx.exists_buffer()
    }

    fn update_indent(&mut self, ctx: &Context<'_>, c: char) {
        if self.is_first_char_at_line && is_new_line_char(c) && ctx.is_block_scalar() {
            return;
        }
        if self.is_first_char_at_line && c == ' ' {
            self.indent_num += 1;
            return;
        }
        if !self.is_first_char_at_line {
            self.indent_state = IndentState::Keep;
            return;
        }

        if self.prev_indent_num < self.indent_num {
            self.indent_level = self.prev_indent_level + 1;
            self.indent_state = IndentState::Up;
        } else if self.prev_indent_num == self.indent_num {
            self.indent_level = self.prev_indent_level;
            self.indent_state = IndentState::Equal;
        } else {
            self.indent_state = IndentState::Down;
            if self.prev_indent_level > 0 {
                self.indent_level = self.prev_indent_level - 1;
            }
        }

        // A pinned collection column overrides space counting.
        if self.prev_indent_column > 0 {
            if self.prev_indent_column < self.column {
                self.indent_state = IndentState::Up;
            } else if self.prev_indent_column == self.column {
                self.indent_state = IndentState::Equal;
            } else {
                self.indent_state = IndentState::Down;
            }
        }
        self.is_first_char_at_line = false;
        if self.keep_previous_indent(ctx, c) {
            return;
        }
        self.prev_indent_num = self.indent_num;
        self.prev_indent_column = 0;
        self.prev_indent_level = self.indent_level;
    }

    fn new_line_count(s: &str) -> usize {
        let mut count = 0;
        let mut chars = s.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\r' => {
                    if chars.peek() == Some(&'\n') {
                        chars.next();
                    }
                    count += 1;
                }
                '\n' => count += 1,
                _ => {}
            }
        }
        count
    }

    /// Append `c` to the value and origin buffers as plain scalar content.
    fn scan_plain(&mut self, ctx: &mut Context<'_>, c: char) {
        let pos = self.pos();
        ctx.add_buf(c, pos);
        ctx.add_origin(c);
        self.advance(ctx, c);
    }

    fn scan_single_quote(&mut self, ctx: &mut Context<'_>) -> Result<Token, ParseError> {
        let pos = self.pos();
        let mut origin = String::from("'");
        let mut value = String::new();
        self.advance(ctx, '\'');

        let mut is_first_line_char = false;
        while ctx.next() {
            let c = ctx.current_char();
            if is_new_line_char(c) {
                value.push(' ');
                is_first_line_char = true;
                origin.push_str(self.consume_line_break(ctx));
                continue;
            }
            if c == ' ' && is_first_line_char {
                origin.push(' ');
                self.advance(ctx, c);
                continue;
            }
            if c == '\'' {
                if ctx.next_char() == '\'' {
                    // '' is an escaped single quote
                    value.push('\'');
                    origin.push_str("''");
                    self.advance_n(ctx, 2);
                    is_first_line_char = false;
                    continue;
                }
                origin.push('\'');
                self.advance(ctx, c);
                let origin = ctx.origin_with(&origin);
                return Ok(Token::with_kind(TokenKind::SingleQuote, value, origin, pos));
            }
            value.push(c);
            origin.push(c);
            self.advance(ctx, c);
            is_first_line_char = false;
        }
        Err(ParseError::new(
            ErrorKind::UnterminatedQuote,
            Token::with_kind(TokenKind::SingleQuote, value, origin, pos),
        ))
    }

    /// Decode the escape sequence following a `\`, returning the number of
    /// runes consumed after the backslash and the decoded text. Unknown or
    /// truncated escapes return `None`: the backslash is preserved as-is.
    fn decode_escape(ctx: &Context<'_>) -> Option<(usize, String)> {
        let next = ctx.next_char();
        let simple = |s: &str| Some((1, s.to_owned()));
        match next {
            'b' => simple("\u{8}"),
            'e' => simple("\u{1b}"),
            'f' => simple("\u{c}"),
            'n' => simple("\n"),
            'v' => simple("\u{b}"),
            'L' => simple("\u{2028}"),
            'N' => simple("\u{85}"),
            'P' => simple("\u{2029}"),
            '_' => simple("\u{a0}"),
            '"' => simple("\""),
            '\\' => simple("\\"),
            'x' | 'u' | 'U' => {
                let digits = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let mut code: u32 = 0;
                for i in 0..digits {
                    let d = ctx.peek_at(2 + i)?.to_digit(16)?;
                    code = code << 4 | d;
                }
                let decoded = char::from_u32(code)?;
                Some((1 + digits, decoded.to_string()))
            }
            _ => None,
        }
    }

    fn scan_double_quote(&mut self, ctx: &mut Context<'_>) -> Result<Token, ParseError> {
        let pos = self.pos();
        let mut origin = String::from("\"");
        let mut value = String::new();
        self.advance(ctx, '"');

        let mut is_first_line_char = false;
        while ctx.next() {
            let c = ctx.current_char();
            if is_new_line_char(c) {
                value.push(' ');
                is_first_line_char = true;
                origin.push_str(self.consume_line_break(ctx));
                continue;
            }
            if c == ' ' && is_first_line_char {
                origin.push(' ');
                self.advance(ctx, c);
                continue;
            }
            if c == '\\' {
                if let Some((consumed, decoded)) = Self::decode_escape(ctx) {
                    origin.push('\\');
                    self.advance(ctx, '\\');
                    for _ in 0..consumed {
                        let e = ctx.current_char();
                        origin.push(e);
                        self.advance(ctx, e);
                    }
                    value.push_str(&decoded);
                } else {
                    value.push('\\');
                    origin.push('\\');
                    self.advance(ctx, '\\');
                }
                is_first_line_char = false;
                continue;
            }
            if c == '"' {
                origin.push('"');
                self.advance(ctx, c);
                let origin = ctx.origin_with(&origin);
                return Ok(Token::with_kind(TokenKind::DoubleQuote, value, origin, pos));
            }
            value.push(c);
            origin.push(c);
            self.advance(ctx, c);
            is_first_line_char = false;
        }
        Err(ParseError::new(
            ErrorKind::UnterminatedQuote,
            Token::with_kind(TokenKind::DoubleQuote, value, origin, pos),
        ))
    }

    /// Capture a `{{ … }}` region verbatim, honoring `\"` escapes inside
    /// double-quoted template strings.
    fn scan_template(&mut self, ctx: &mut Context<'_>) -> Result<Token, ParseError> {
        let pos = self.pos();
        let mut text = String::from("{{");
        self.advance_n(ctx, 2);

        while ctx.next() {
            let c = ctx.current_char();
            if c == '}' && ctx.repeat_num('}') == 2 {
                text.push_str("}}");
                self.advance_n(ctx, 2);
                let origin = ctx.origin_with(&text);
                return Ok(Token::with_kind(TokenKind::Template, text, origin, pos));
            }
            if c == '"' {
                self.scan_template_string(ctx, &mut text);
                continue;
            }
            if is_new_line_char(c) {
                text.push_str(self.consume_line_break(ctx));
                continue;
            }
            text.push(c);
            self.advance(ctx, c);
        }
        Err(ParseError::new(
            ErrorKind::UnterminatedTemplate,
            Token::with_kind(TokenKind::Template, text.clone(), text, pos),
        ))
    }

    /// Absorb a double-quoted string inside a template action. The string
    /// ends at the next unescaped `"` or at a line break.
    fn scan_template_string(&mut self, ctx: &mut Context<'_>, text: &mut String) {
        text.push('"');
        self.advance(ctx, '"');
        while ctx.next() {
            let c = ctx.current_char();
            if is_new_line_char(c) {
                text.push_str(self.consume_line_break(ctx));
                return;
            }
            let prev = ctx.previous_char();
            text.push(c);
            self.advance(ctx, c);
            if c == '"' && prev != '\\' {
                return;
            }
        }
    }

    /// Scan a `!tag` up to the next space or line break, which is left for
    /// the main loop.
    fn scan_tag(&mut self, ctx: &mut Context<'_>) {
        let pos = self.pos();
        let mut value = String::new();
        while ctx.next() {
            let c = ctx.current_char();
            if c == ' ' || is_new_line_char(c) {
                break;
            }
            value.push(c);
            self.advance(ctx, c);
        }
        let origin = ctx.origin_with(&value);
        ctx.add_token(Token::with_kind(TokenKind::Tag, value, origin, pos));
    }

    /// Scan a comment to end of line. A `\` before the line break continues
    /// the comment onto the next line.
    fn scan_comment(&mut self, ctx: &mut Context<'_>) {
        let pos = self.pos();
        let mut text = String::from("#");
        self.advance(ctx, '#');
        while ctx.next() {
            let c = ctx.current_char();
            if is_new_line_char(c) {
                if ctx.previous_char() != '\\' {
                    break;
                }
                text.push_str(self.consume_line_break(ctx));
                continue;
            }
            text.push(c);
            self.advance(ctx, c);
        }
        let value = text[1..].to_owned();
        let origin = ctx.origin_with(&text);
        ctx.add_token(Token::with_kind(TokenKind::Comment, value, origin, pos));
    }

    /// Scan the `|` or `>` header line: optional chomping/indent options,
    /// trailing spaces, and the line break all belong to the header token.
    fn scan_block_scalar_header(
        &mut self,
        ctx: &mut Context<'_>,
        header: char,
    ) -> Result<(), ParseError> {
        let pos = self.pos();
        let mut text = String::new();
        self.advance(ctx, header);

        while ctx.next() {
            let c = ctx.current_char();
            if is_new_line_char(c) {
                let opt = text.trim_end_matches(' ').to_owned();
                if !valid_block_header_opt(&opt) {
                    let bad = format!("{header}{text}");
                    return Err(ParseError::new(
                        ErrorKind::InvalidBlockScalarHeader,
                        Token::with_kind(TokenKind::String, bad.clone(), bad, pos),
                    ));
                }
                let mut lit = String::new();
                lit.push(header);
                lit.push_str(&text);
                lit.push_str(self.consume_line_break(ctx));
                let origin = ctx.origin_with(&lit);
                let (kind, value) = if header == '|' {
                    ctx.is_literal = true;
                    (TokenKind::Literal, format!("|{opt}"))
                } else {
                    ctx.is_folded = true;
                    (TokenKind::Folded, format!(">{opt}"))
                };
                ctx.add_token(Token::with_kind(kind, value, origin, pos));
                ctx.chomping = if opt.contains('-') {
                    Chomping::Strip
                } else if opt.contains('+') {
                    Chomping::Keep
                } else {
                    Chomping::Clip
                };
                self.indent_state = IndentState::Keep;
                return Ok(());
            }
            text.push(c);
            self.advance(ctx, c);
        }
        let bad = format!("{header}{text}");
        Err(ParseError::new(
            ErrorKind::InvalidBlockScalarHeader,
            Token::with_kind(TokenKind::String, bad.clone(), bad, pos),
        ))
    }

    /// Scan one rune of block scalar content.
    fn scan_block_scalar(&mut self, ctx: &mut Context<'_>, c: char) {
        if ctx.is_eos() {
            let pos = self.pos();
            if is_new_line_char(c) {
                if ctx.is_literal {
                    ctx.add_buf('\n', pos);
                }
                let brk = self.consume_line_break(ctx);
                ctx.add_origin_str(brk);
            } else {
                ctx.add_buf(c, pos);
                ctx.add_origin(c);
                self.advance(ctx, c);
            }
            ctx.add_buffered_token_if_exists();
        } else if is_new_line_char(c) {
            let pos = self.pos();
            ctx.add_buf(if ctx.is_literal { '\n' } else { ' ' }, pos);
            let brk = self.consume_line_break(ctx);
            ctx.add_origin_str(brk);
        } else if self.is_first_char_at_line && c == ' ' {
            if self.doc_start_column > 0 && self.doc_start_column <= self.column {
                let pos = self.pos();
                ctx.add_buf(c, pos);
            }
            ctx.add_origin(c);
            self.advance(ctx, c);
        } else {
            if self.doc_start_column == 0 {
                self.doc_start_column = self.column;
            }
            let pos = self.pos();
            ctx.add_buf(c, pos);
            ctx.add_origin(c);
            self.advance(ctx, c);
        }
    }

    /// Handle a line break outside block scalar content: possibly flush the
    /// buffered scalar, fold the break into a space, and advance the line.
    fn scan_new_line(&mut self, ctx: &mut Context<'_>, _c: char) {
        let pos = self.pos();
        let at_eos = ctx.is_eos();
        let was_anchor = self.is_anchor;
        ctx.add_buf(' ', pos);
        let brk = self.consume_line_break(ctx);
        ctx.add_origin_str(brk);
        if at_eos || was_anchor {
            ctx.add_buffered_token_if_exists();
        }
    }

    fn scan_batch(&mut self, ctx: &mut Context<'_>) -> Result<(), ParseError> {
        while ctx.next() {
            let c = ctx.current_char();
            self.update_indent(ctx, c);

            if ctx.is_block_scalar() {
                if matches!(self.indent_state, IndentState::Equal | IndentState::Down) {
                    ctx.add_buffered_token_if_exists();
                    self.doc_start_column = 0;
                    ctx.break_scalar();
                } else {
                    self.scan_block_scalar(ctx, c);
                    continue;
                }
            } else if self.indent_state == IndentState::Down {
                ctx.add_buffered_token_if_exists();
            } else if self.indent_state == IndentState::Equal {
                // A buffer spanning more than one line break is a raw
                // folded scalar and must not be flushed yet.
                if !ctx.origin().is_empty() && Self::new_line_count(ctx.origin()) <= 1 {
                    ctx.add_buffered_token_if_exists();
                }
            }

            match c {
                '{' => {
                    if ctx.repeat_num('{') == 2 {
                        ctx.add_buffered_token_if_exists();
                        let token = self.scan_template(ctx)?;
                        ctx.add_token(token);
                        return Ok(());
                    }
                    if !ctx.exists_buffer() {
                        let pos = self.pos();
                        let origin = ctx.origin_with("{");
                        ctx.add_token(Token::with_kind(TokenKind::MappingStart, "{", origin, pos));
                        self.flow_map_depth += 1;
                        self.advance(ctx, c);
                        return Ok(());
                    }
                    self.scan_plain(ctx, c);
                }
                '}' => {
                    if !ctx.exists_buffer() || self.flow_map_depth > 0 {
                        ctx.add_buffered_token_if_exists();
                        let pos = self.pos();
                        let origin = ctx.origin_with("}");
                        ctx.add_token(Token::with_kind(TokenKind::MappingEnd, "}", origin, pos));
                        self.flow_map_depth = self.flow_map_depth.saturating_sub(1);
                        self.advance(ctx, c);
                        return Ok(());
                    }
                    self.scan_plain(ctx, c);
                }
                '.' => {
                    if self.indent_num == 0 && ctx.repeat_num('.') == 3 {
                        ctx.add_buffered_token_if_exists();
                        let pos = self.pos();
                        let origin = ctx.origin_with("...");
                        ctx.add_token(Token::with_kind(TokenKind::DocumentEnd, "...", origin, pos));
                        self.advance_n(ctx, 3);
                        return Ok(());
                    }
                    self.scan_plain(ctx, c);
                }
                '<' => {
                    if ctx.repeat_num('<') == 2 {
                        ctx.add_buffered_token_if_exists();
                        let pos = self.pos();
                        self.prev_indent_column = self.column;
                        let origin = ctx.origin_with("<<");
                        ctx.add_token(Token::with_kind(TokenKind::MergeKey, "<<", origin, pos));
                        self.advance_n(ctx, 2);
                        return Ok(());
                    }
                    self.scan_plain(ctx, c);
                }
                '-' => {
                    if self.indent_num == 0 && ctx.repeat_num('-') == 3 {
                        ctx.add_buffered_token_if_exists();
                        let pos = self.pos();
                        let origin = ctx.origin_with("---");
                        ctx.add_token(Token::with_kind(
                            TokenKind::DocumentHeader,
                            "---",
                            origin,
                            pos,
                        ));
                        self.advance_n(ctx, 3);
                        return Ok(());
                    }
                    if ctx.exists_buffer() && self.indent_state == IndentState::Up {
                        // a '-' continuation line of a raw folded scalar
                        ctx.set_raw_folded();
                        self.scan_plain(ctx, c);
                        continue;
                    }
                    if ctx.exists_buffer() {
                        self.scan_plain(ctx, c);
                        continue;
                    }
                    let nc = ctx.next_char();
                    if nc == ' ' || is_new_line_char(nc) {
                        ctx.add_buffered_token_if_exists();
                        let pos = self.pos();
                        let origin = ctx.origin_with("-");
                        self.prev_indent_column = pos.column;
                        ctx.add_token(Token::with_kind(TokenKind::SequenceEntry, "-", origin, pos));
                        self.advance(ctx, c);
                        return Ok(());
                    }
                    self.scan_plain(ctx, c);
                }
                '[' => {
                    if !ctx.exists_buffer() {
                        let pos = self.pos();
                        let origin = ctx.origin_with("[");
                        ctx.add_token(Token::with_kind(TokenKind::SequenceStart, "[", origin, pos));
                        self.flow_sequence_depth += 1;
                        self.advance(ctx, c);
                        return Ok(());
                    }
                    self.scan_plain(ctx, c);
                }
                ']' => {
                    if !ctx.exists_buffer() || self.flow_sequence_depth > 0 {
                        ctx.add_buffered_token_if_exists();
                        let pos = self.pos();
                        let origin = ctx.origin_with("]");
                        ctx.add_token(Token::with_kind(TokenKind::SequenceEnd, "]", origin, pos));
                        self.flow_sequence_depth = self.flow_sequence_depth.saturating_sub(1);
                        self.advance(ctx, c);
                        return Ok(());
                    }
                    self.scan_plain(ctx, c);
                }
                ',' => {
                    if self.flow_sequence_depth > 0 || self.flow_map_depth > 0 {
                        ctx.add_buffered_token_if_exists();
                        let pos = self.pos();
                        let origin = ctx.origin_with(",");
                        ctx.add_token(Token::with_kind(TokenKind::CollectEntry, ",", origin, pos));
                        self.advance(ctx, c);
                        return Ok(());
                    }
                    self.scan_plain(ctx, c);
                }
                ':' => {
                    let nc = ctx.next_char();
                    if self.flow_map_depth > 0 || nc == ' ' || is_new_line_char(nc) || nc == '\0' {
                        if let Some(token) = ctx.buffered_token() {
                            self.prev_indent_column = token.position.column;
                            ctx.add_token(token);
                        }
                        let pos = self.pos();
                        let origin = ctx.origin_with(":");
                        ctx.add_token(Token::with_kind(TokenKind::MappingValue, ":", origin, pos));
                        self.advance(ctx, c);
                        return Ok(());
                    }
                    self.scan_plain(ctx, c);
                }
                '|' | '>' => {
                    if !ctx.exists_buffer() {
                        self.scan_block_scalar_header(ctx, c)?;
                        continue;
                    }
                    self.scan_plain(ctx, c);
                }
                '!' => {
                    if !ctx.exists_buffer() {
                        self.scan_tag(ctx);
                        return Ok(());
                    }
                    self.scan_plain(ctx, c);
                }
                '%' => {
                    if !ctx.exists_buffer() && self.indent_num == 0 {
                        let pos = self.pos();
                        let origin = ctx.origin_with("%");
                        ctx.add_token(Token::with_kind(TokenKind::Directive, "%", origin, pos));
                        self.advance(ctx, c);
                        return Ok(());
                    }
                    self.scan_plain(ctx, c);
                }
                '?' => {
                    if !ctx.exists_buffer() && ctx.next_char() == ' ' {
                        let pos = self.pos();
                        let origin = ctx.origin_with("?");
                        ctx.add_token(Token::with_kind(TokenKind::MappingKey, "?", origin, pos));
                        self.advance(ctx, c);
                        return Ok(());
                    }
                    self.scan_plain(ctx, c);
                }
                '&' => {
                    if !ctx.exists_buffer() {
                        let pos = self.pos();
                        let origin = ctx.origin_with("&");
                        ctx.add_token(Token::with_kind(TokenKind::Anchor, "&", origin, pos));
                        self.is_anchor = true;
                        self.advance(ctx, c);
                        return Ok(());
                    }
                    self.scan_plain(ctx, c);
                }
                '*' => {
                    if !ctx.exists_buffer() {
                        let pos = self.pos();
                        let origin = ctx.origin_with("*");
                        ctx.add_token(Token::with_kind(TokenKind::Alias, "*", origin, pos));
                        self.advance(ctx, c);
                        return Ok(());
                    }
                    self.scan_plain(ctx, c);
                }
                '#' => {
                    if !ctx.exists_buffer() || ctx.previous_char() == ' ' {
                        ctx.add_buffered_token_if_exists();
                        self.scan_comment(ctx);
                        return Ok(());
                    }
                    self.scan_plain(ctx, c);
                }
                '\'' => {
                    if !ctx.exists_buffer() {
                        let token = self.scan_single_quote(ctx)?;
                        ctx.add_token(token);
                        return Ok(());
                    }
                    self.scan_plain(ctx, c);
                }
                '"' => {
                    if !ctx.exists_buffer() {
                        let token = self.scan_double_quote(ctx)?;
                        ctx.add_token(token);
                        return Ok(());
                    }
                    self.scan_plain(ctx, c);
                }
                '\r' | '\n' => {
                    self.scan_new_line(ctx, c);
                }
                ' ' => {
                    if !self.is_anchor && !self.is_first_char_at_line {
                        let pos = self.pos();
                        ctx.add_buf(' ', pos);
                        ctx.add_origin(' ');
                        self.advance(ctx, c);
                    } else if self.is_first_char_at_line {
                        ctx.add_origin(' ');
                        self.advance(ctx, c);
                    } else {
                        // the space ends an anchor name
                        ctx.add_buffered_token_if_exists();
                        ctx.add_origin(' ');
                        self.advance(ctx, c);
                        self.is_anchor = false;
                        return Ok(());
                    }
                }
                _ => {
                    self.scan_plain(ctx, c);
                }
            }
        }
        ctx.add_buffered_token_if_exists();
        Ok(())
    }
}

/// Scan `text` to completion, failing on the first scan error.
///
/// Trailing origin text with no token to own it (whitespace at end of
/// input) is appended to the final token so the origin concatenation
/// reconstructs the input exactly.
pub(crate) fn scan_all(text: &str) -> Result<Tokens, ParseError> {
    let mut scanner = Scanner::new(text);
    let mut tokens = Tokens::new();
    loop {
        match scanner.scan() {
            Ok(batch) => tokens.extend(batch),
            Err(err) if err.is_end_of_input() => break,
            Err(err) => return Err(err),
        }
    }
    let leftover = scanner.take_pending_origin();
    if !leftover.is_empty() {
        if let Some(last) = tokens.last_mut() {
            last.origin.push_str(&leftover);
        }
    }
    Ok(tokens)
}

/// Block scalar header options are at most one chomping indicator and one
/// explicit indent digit, in either order.
fn valid_block_header_opt(opt: &str) -> bool {
    let mut signs = 0;
    let mut digits = 0;
    for c in opt.chars() {
        match c {
            '+' | '-' => signs += 1,
            '0'..='9' => digits += 1,
            _ => return false,
        }
    }
    signs <= 1 && digits <= 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_all(input: &str) -> Tokens {
        let mut scanner = Scanner::new(input);
        let mut tokens = Tokens::new();
        loop {
            match scanner.scan() {
                Ok(batch) => tokens.extend(batch),
                Err(err) => {
                    assert!(err.is_end_of_input(), "unexpected scan error: {err}");
                    break;
                }
            }
        }
        tokens
    }

    #[test]
    fn test_single_quote() {
        let cases = [
            ("'foo'", "foo"),
            ("'''foo'", "'foo"),
            ("'foo'''", "foo'"),
            ("'\"foo\"'", "\"foo\""),
            ("'f''oo'", "f'oo"),
        ];
        for (input, expected) in cases {
            let tokens = scan_all(input);
            assert_eq!(tokens.len(), 1, "input {input:?}");
            assert_eq!(tokens[0].kind, TokenKind::SingleQuote);
            assert_eq!(tokens[0].value, expected, "input {input:?}");
        }
    }

    #[test]
    fn test_double_quote_escapes() {
        let cases = [
            (r#""aAb""#, "aAb"),
            (r#""a\nb""#, "a\nb"),
            (r#""a\x41""#, "aA"),
            (r#""a\qb""#, "a\\qb"),
            (r#""a\"b""#, "a\"b"),
        ];
        for (input, expected) in cases {
            let tokens = scan_all(input);
            assert_eq!(tokens.len(), 1, "input {input:?}");
            assert_eq!(tokens[0].kind, TokenKind::DoubleQuote);
            assert_eq!(tokens[0].value, expected, "input {input:?}");
        }
    }

    #[test]
    fn test_unterminated_quote_is_error() {
        let mut scanner = Scanner::new("'foo");
        let err = scanner.scan().expect_err("expected scan error");
        assert_eq!(err.kind, ErrorKind::UnterminatedQuote);
    }

    #[test]
    fn test_mapping_tokens() {
        let tokens = scan_all("key: value\n");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [TokenKind::String, TokenKind::MappingValue, TokenKind::String]
        );
        assert_eq!(tokens[0].value, "key");
        assert_eq!(tokens[2].value, "value");
    }

    #[test]
    fn test_sequence_tokens() {
        let tokens = scan_all("- 1\n- 2\n");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [
                TokenKind::SequenceEntry,
                TokenKind::Integer,
                TokenKind::SequenceEntry,
                TokenKind::Integer
            ]
        );
    }

    #[test]
    fn test_document_markers() {
        let tokens = scan_all("---\nfoo\n...\n");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [
                TokenKind::DocumentHeader,
                TokenKind::String,
                TokenKind::DocumentEnd
            ]
        );
    }

    #[test]
    fn test_two_dashes_is_scalar() {
        let tokens = scan_all("--\n");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].value, "--");
    }

    #[test]
    fn test_template_capture() {
        let tokens = scan_all("{{ .Foo }}");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Template);
        assert_eq!(tokens[0].value, "{{ .Foo }}");
    }

    #[test]
    fn test_template_with_quoted_braces() {
        let tokens = scan_all(r#"{{ printf "}}" }}"#);
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Template);
        assert_eq!(tokens[0].value, r#"{{ printf "}}" }}"#);
    }

    #[test]
    fn test_unterminated_template_is_error() {
        let mut scanner = Scanner::new("{{ .Foo ");
        let err = scanner.scan().expect_err("expected scan error");
        assert_eq!(err.kind, ErrorKind::UnterminatedTemplate);
    }

    #[test]
    fn test_literal_block_scalar() {
        let tokens = scan_all("|\n  a\n  b\n");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, [TokenKind::Literal, TokenKind::String]);
        assert_eq!(tokens[0].value, "|");
        assert_eq!(tokens[1].value, "a\nb\n");
    }

    #[test]
    fn test_folded_block_scalar_strip() {
        let tokens = scan_all(">-\n  a\n  b\n");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, [TokenKind::Folded, TokenKind::String]);
        assert_eq!(tokens[0].value, ">-");
        assert_eq!(tokens[1].value, "a b");
    }

    #[test]
    fn test_block_scalar_chomping_keep() {
        let tokens = scan_all("|+\n  a\n\n\n");
        assert_eq!(tokens[1].value, "a\n\n\n");
    }

    #[test]
    fn test_block_scalar_chomping_clip() {
        let tokens = scan_all("|\n  a\n\n\n");
        assert_eq!(tokens[1].value, "a\n");
    }

    #[test]
    fn test_invalid_block_scalar_header() {
        let mut scanner = Scanner::new("|junk\n  a\n");
        let err = scanner.scan().expect_err("expected scan error");
        assert_eq!(err.kind, ErrorKind::InvalidBlockScalarHeader);
    }

    #[test]
    fn test_flow_collection_tokens() {
        let tokens = scan_all("[a, {b: 1}]\n");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [
                TokenKind::SequenceStart,
                TokenKind::String,
                TokenKind::CollectEntry,
                TokenKind::MappingStart,
                TokenKind::String,
                TokenKind::MappingValue,
                TokenKind::Integer,
                TokenKind::MappingEnd,
                TokenKind::SequenceEnd
            ]
        );
    }

    #[test]
    fn test_anchor_and_alias() {
        let tokens = scan_all("a: &x 1\nb: *x\n");
        let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            [
                TokenKind::String,
                TokenKind::MappingValue,
                TokenKind::Anchor,
                TokenKind::String,
                TokenKind::Integer,
                TokenKind::String,
                TokenKind::MappingValue,
                TokenKind::Alias,
                TokenKind::String
            ]
        );
    }

    #[test]
    fn test_comment_token() {
        let tokens = scan_all("a: 1 # trailing\n");
        let comment = tokens.iter().find(|t| t.kind == TokenKind::Comment);
        let comment = comment.expect("comment token missing");
        assert_eq!(comment.value, " trailing");
    }

    #[test]
    fn test_empty_input() {
        let mut scanner = Scanner::new("");
        let err = scanner.scan().expect_err("expected sentinel");
        assert!(err.is_end_of_input());
    }

    #[test]
    fn test_whitespace_only_input() {
        let tokens = scan_all("   \n  ");
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_positions_are_one_based() {
        let tokens = scan_all("a: b\nc: d\n");
        assert_eq!(tokens[0].position.line, 1);
        assert_eq!(tokens[0].position.column, 1);
        assert_eq!(tokens[3].position.line, 2);
        assert_eq!(tokens[3].position.column, 1);
    }

    #[test]
    fn test_multibyte_columns() {
        let tokens = scan_all("é: b\n");
        assert_eq!(tokens[1].kind, TokenKind::MappingValue);
        // 'é' is one column wide but two bytes
        assert_eq!(tokens[1].position.column, 2);
        assert_eq!(tokens[1].position.offset, 2);
    }
}
