// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Item lexer for template actions.
//!
//! Re-tokenizes the text of a Template token (delimiters included) into
//! items: delimiters, identifiers, keywords, numbers, strings, variables,
//! fields, punctuation and space runs. The lexer is a state machine
//! driven on demand: [`TemplateLexer::next_item`] steps states until an
//! item is produced, so the parser fully controls the cadence and
//! dropping the lexer cancels it.

use std::collections::VecDeque;

use crate::ast::Node;
use crate::token::Token;

const LEFT_DELIM: &str = "{{";
const RIGHT_DELIM: &str = "}}";

const LEFT_COMMENT: &str = "/*";
const RIGHT_COMMENT: &str = "*/";

/// Trim markers: `{{- ` eats preceding whitespace, ` -}}` following. An
/// ASCII space is required so `{{-3}}` stays a number.
const LEFT_TRIM_MARKER: &str = "- ";
const RIGHT_TRIM_MARKER: &str = " -";

/// The kind of a lexed template item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ItemKind {
    /// An error occurred; the item value is the message.
    Error,
    Bool,
    /// A printable ASCII character (grab bag for `,` and friends).
    Char,
    CharConstant,
    Complex,
    /// `=` introducing an assignment.
    Assign,
    /// `:=` introducing a declaration.
    Declare,
    Eof,
    /// An alphanumeric identifier starting with `.`.
    Field,
    /// An alphanumeric identifier not starting with `.`.
    Identifier,
    LeftDelim,
    LeftParen,
    Number,
    Pipe,
    RawString,
    RightDelim,
    RightParen,
    /// A run of spaces separating arguments.
    Space,
    Str,
    /// A variable starting with `$`.
    Variable,
    // Keywords.
    Block,
    Dot,
    Define,
    Else,
    End,
    If,
    Nil,
    Range,
    Template,
    With,
    /// A YAML fragment produced by the parser, not the lexer.
    Yaml,
}

impl ItemKind {
    fn keyword(word: &str) -> Option<Self> {
        match word {
            "block" => Some(Self::Block),
            "define" => Some(Self::Define),
            "else" => Some(Self::Else),
            "end" => Some(Self::End),
            "if" => Some(Self::If),
            "nil" => Some(Self::Nil),
            "range" => Some(Self::Range),
            "template" => Some(Self::Template),
            "with" => Some(Self::With),
            _ => None,
        }
    }
}

/// A token or text string returned from the template lexer.
#[derive(Debug, Clone)]
pub(crate) struct Item {
    pub(crate) kind: ItemKind,
    /// Byte position of this item within the action text.
    pub(crate) pos: usize,
    pub(crate) val: String,
    /// 1-based line number within the action at the start of this item.
    pub(crate) line: usize,
    /// The Template token this item was lexed from.
    pub(crate) token: Option<Token>,
    /// The node carried by a synthetic Yaml item.
    pub(crate) node: Option<Node>,
}

impl Item {
    pub(crate) fn eof() -> Self {
        Self {
            kind: ItemKind::Eof,
            pos: 0,
            val: String::new(),
            line: 0,
            token: None,
            node: None,
        }
    }

    pub(crate) fn yaml(node: Option<Node>) -> Self {
        Self {
            kind: ItemKind::Yaml,
            pos: 0,
            val: String::new(),
            line: 0,
            token: None,
            node,
        }
    }
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ItemKind::Eof => f.write_str("EOF"),
            ItemKind::Error => f.write_str(&self.val),
            ItemKind::Yaml => f.write_str("yaml fragment"),
            ItemKind::Block
            | ItemKind::Dot
            | ItemKind::Define
            | ItemKind::Else
            | ItemKind::End
            | ItemKind::If
            | ItemKind::Nil
            | ItemKind::Range
            | ItemKind::Template
            | ItemKind::With => write!(f, "<{}>", self.val),
            _ if self.val.chars().count() > 10 => {
                let prefix: String = self.val.chars().take(10).collect();
                write!(f, "{prefix:?}...")
            }
            _ => write!(f, "{:?}", self.val),
        }
    }
}

/// The lexer's state, one variant per state function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    LeftDelim,
    Comment,
    RightDelim,
    InsideAction,
    Space,
    Identifier,
    Field,
    Variable,
    Char,
    Number,
    Quote,
    RawQuote,
    Done,
}

/// State-machine lexer over a single Template token's text.
#[derive(Debug)]
pub(crate) struct TemplateLexer {
    input: String,
    token: Token,
    pub(crate) left_delim: String,
    pub(crate) right_delim: String,
    trim_right_delim: String,
    pos: usize,
    start: usize,
    width: usize,
    paren_depth: i32,
    line: usize,
    start_line: usize,
    state: State,
    items: VecDeque<Item>,
    done: bool,
}

fn is_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_end_of_line(c: char) -> bool {
    c == '\r' || c == '\n'
}

fn is_alphanumeric(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

impl TemplateLexer {
    /// Create a lexer for the given Template token. Empty delimiter
    /// strings select the defaults.
    pub(crate) fn new(token: &Token, left: &str, right: &str) -> Self {
        let left = if left.is_empty() { LEFT_DELIM } else { left };
        let right = if right.is_empty() { RIGHT_DELIM } else { right };
        Self {
            input: token.value.clone(),
            token: token.clone(),
            left_delim: left.to_owned(),
            right_delim: right.to_owned(),
            trim_right_delim: format!("{RIGHT_TRIM_MARKER}{right}"),
            pos: 0,
            start: 0,
            width: 0,
            paren_depth: 0,
            line: 1,
            start_line: 1,
            state: State::LeftDelim,
            items: VecDeque::new(),
            done: false,
        }
    }

    /// Return the next item. After the first Eof (or an Error), every
    /// subsequent call returns Eof.
    pub(crate) fn next_item(&mut self) -> Item {
        loop {
            if let Some(item) = self.items.pop_front() {
                if matches!(item.kind, ItemKind::Eof | ItemKind::Error) {
                    self.done = true;
                }
                return item;
            }
            if self.done || self.state == State::Done {
                return Item::eof();
            }
            self.state = self.step(self.state);
        }
    }

    fn step(&mut self, state: State) -> State {
        match state {
            State::LeftDelim => self.lex_left_delim(),
            State::Comment => self.lex_comment(),
            State::RightDelim => self.lex_right_delim(),
            State::InsideAction => self.lex_inside_action(),
            State::Space => self.lex_space(),
            State::Identifier => self.lex_identifier(),
            State::Field => self.lex_field(),
            State::Variable => self.lex_variable(),
            State::Char => self.lex_char(),
            State::Number => self.lex_number(),
            State::Quote => self.lex_quote(),
            State::RawQuote => self.lex_raw_quote(),
            State::Done => State::Done,
        }
    }

    // === cursor helpers ===

    fn rest(&self) -> &str {
        &self.input[self.pos..]
    }

    fn next(&mut self) -> Option<char> {
        let Some(c) = self.rest().chars().next() else {
            self.width = 0;
            return None;
        };
        self.width = c.len_utf8();
        self.pos += self.width;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    /// Step back one rune. Valid once per call of `next`.
    fn backup(&mut self) {
        self.pos -= self.width;
        if self.width == 1 && self.input.as_bytes().get(self.pos) == Some(&b'\n') {
            self.line -= 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        let c = self.next();
        if c.is_some() {
            self.backup();
        }
        c
    }

    fn accept(&mut self, valid: &str) -> bool {
        match self.next() {
            Some(c) if valid.contains(c) => true,
            Some(_) => {
                self.backup();
                false
            }
            None => false,
        }
    }

    fn accept_run(&mut self, valid: &str) {
        while self.accept(valid) {}
    }

    fn emit(&mut self, kind: ItemKind) {
        self.items.push_back(Item {
            kind,
            pos: self.start,
            val: self.input[self.start..self.pos].to_owned(),
            line: self.start_line,
            token: Some(self.token.clone()),
            node: None,
        });
        self.start = self.pos;
        self.start_line = self.line;
    }

    /// Skip over the pending input before this point.
    fn ignore(&mut self) {
        self.line += self.input[self.start..self.pos].matches('\n').count();
        self.start = self.pos;
        self.start_line = self.line;
    }

    fn errorf(&mut self, message: String) -> State {
        self.items.push_back(Item {
            kind: ItemKind::Error,
            pos: self.start,
            val: message,
            line: self.start_line,
            token: Some(self.token.clone()),
            node: None,
        });
        State::Done
    }

    /// Whether the lexer is at a right delimiter, possibly with a trim
    /// marker.
    fn at_right_delim(&self) -> (bool, bool) {
        if self.rest().starts_with(&self.trim_right_delim) {
            return (true, true);
        }
        if self.rest().starts_with(&self.right_delim) {
            return (true, false);
        }
        (false, false)
    }

    fn at_terminator(&mut self) -> bool {
        let Some(c) = self.peek() else {
            return true;
        };
        if is_space(c) || is_end_of_line(c) {
            return true;
        }
        match c {
            '.' | ',' | '|' | ':' | ')' | '(' => return true,
            _ => {}
        }
        self.right_delim.starts_with(c)
    }

    // === state functions ===

    fn lex_left_delim(&mut self) -> State {
        self.pos += self.left_delim.len();
        let trim_space = self.rest().starts_with(LEFT_TRIM_MARKER);
        let after_marker = if trim_space { LEFT_TRIM_MARKER.len() } else { 0 };
        if self.input[self.pos + after_marker..].starts_with(LEFT_COMMENT) {
            self.pos += after_marker;
            self.ignore();
            return State::Comment;
        }
        self.emit(ItemKind::LeftDelim);
        self.pos += after_marker;
        self.ignore();
        self.paren_depth = 0;
        State::InsideAction
    }

    fn lex_comment(&mut self) -> State {
        self.pos += LEFT_COMMENT.len();
        let Some(idx) = self.rest().find(RIGHT_COMMENT) else {
            return self.errorf("unclosed comment".to_owned());
        };
        self.pos += idx + RIGHT_COMMENT.len();
        let (delim, trim_space) = self.at_right_delim();
        if !delim {
            return self.errorf("comment ends before closing delimiter".to_owned());
        }
        if trim_space {
            self.pos += RIGHT_TRIM_MARKER.len();
        }
        self.pos += self.right_delim.len();
        if trim_space {
            self.pos += left_trim_length(self.rest());
        }
        self.ignore();
        self.emit(ItemKind::Eof);
        State::Done
    }

    fn lex_right_delim(&mut self) -> State {
        let trim_space = self.rest().starts_with(RIGHT_TRIM_MARKER);
        if trim_space {
            self.pos += RIGHT_TRIM_MARKER.len();
            self.ignore();
        }
        self.pos += self.right_delim.len();
        self.emit(ItemKind::RightDelim);
        if trim_space {
            self.pos += left_trim_length(self.rest());
            self.ignore();
        }
        self.emit(ItemKind::Eof);
        State::Done
    }

    fn lex_inside_action(&mut self) -> State {
        let (delim, _) = self.at_right_delim();
        if delim {
            if self.paren_depth == 0 {
                return State::RightDelim;
            }
            return self.errorf("unclosed left paren".to_owned());
        }
        let Some(c) = self.next() else {
            return self.errorf("unclosed action".to_owned());
        };
        if is_end_of_line(c) {
            return self.errorf("unclosed action".to_owned());
        }
        match c {
            _ if is_space(c) => {
                // put the space back in case we have " -}}"
                self.backup();
                State::Space
            }
            '=' => {
                self.emit(ItemKind::Assign);
                State::InsideAction
            }
            ':' => {
                if self.next() != Some('=') {
                    return self.errorf("expected :=".to_owned());
                }
                self.emit(ItemKind::Declare);
                State::InsideAction
            }
            '|' => {
                self.emit(ItemKind::Pipe);
                State::InsideAction
            }
            '"' => State::Quote,
            '`' => State::RawQuote,
            '$' => State::Variable,
            '\'' => State::Char,
            '.' => {
                // look ahead for ".field"; '.' can also start a number
                match self.rest().bytes().next() {
                    Some(b) if b.is_ascii_digit() => {
                        self.backup();
                        State::Number
                    }
                    _ => State::Field,
                }
            }
            '+' | '-' | '0'..='9' => {
                self.backup();
                State::Number
            }
            _ if is_alphanumeric(c) => {
                self.backup();
                State::Identifier
            }
            '(' => {
                self.emit(ItemKind::LeftParen);
                self.paren_depth += 1;
                State::InsideAction
            }
            ')' => {
                self.emit(ItemKind::RightParen);
                self.paren_depth -= 1;
                if self.paren_depth < 0 {
                    return self.errorf(format!("unexpected right paren {}", format_rune(c)));
                }
                State::InsideAction
            }
            _ if c.is_ascii() && !c.is_control() => {
                self.emit(ItemKind::Char);
                State::InsideAction
            }
            _ => self.errorf(format!("unrecognized character in action: {}", format_rune(c))),
        }
    }

    fn lex_space(&mut self) -> State {
        let mut num_spaces = 0;
        while let Some(c) = self.peek() {
            if !is_space(c) {
                break;
            }
            self.next();
            num_spaces += 1;
        }
        // A trim-marked closing delimiter has a minus after a space.
        if self.pos > 0 && self.input[self.pos - 1..].starts_with(&self.trim_right_delim) {
            self.backup();
            if num_spaces == 1 {
                return State::RightDelim;
            }
        }
        self.emit(ItemKind::Space);
        State::InsideAction
    }

    fn lex_identifier(&mut self) -> State {
        let terminator = loop {
            match self.next() {
                Some(c) if is_alphanumeric(c) => {}
                other => {
                    if other.is_some() {
                        self.backup();
                    }
                    break other;
                }
            }
        };
        let word = self.input[self.start..self.pos].to_owned();
        if !self.at_terminator() {
            let c = terminator.unwrap_or('\0');
            return self.errorf(format!("bad character {}", format_rune(c)));
        }
        if let Some(keyword) = ItemKind::keyword(&word) {
            self.emit(keyword);
        } else if word == "true" || word == "false" {
            self.emit(ItemKind::Bool);
        } else {
            self.emit(ItemKind::Identifier);
        }
        State::InsideAction
    }

    fn lex_field(&mut self) -> State {
        self.lex_field_or_variable(ItemKind::Field)
    }

    fn lex_variable(&mut self) -> State {
        if self.at_terminator() {
            // nothing interesting follows: '$'
            self.emit(ItemKind::Variable);
            return State::InsideAction;
        }
        self.lex_field_or_variable(ItemKind::Variable)
    }

    /// Lex a field or variable; the `.` or `$` has been consumed.
    fn lex_field_or_variable(&mut self, kind: ItemKind) -> State {
        if self.at_terminator() {
            // nothing interesting follows: '.' or '$'
            if kind == ItemKind::Variable {
                self.emit(ItemKind::Variable);
            } else {
                self.emit(ItemKind::Dot);
            }
            return State::InsideAction;
        }
        let mut last = '\0';
        loop {
            match self.next() {
                Some(c) if is_alphanumeric(c) => {}
                other => {
                    if let Some(c) = other {
                        last = c;
                        self.backup();
                    }
                    break;
                }
            }
        }
        if !self.at_terminator() {
            return self.errorf(format!("bad character {}", format_rune(last)));
        }
        self.emit(kind);
        State::InsideAction
    }

    fn lex_char(&mut self) -> State {
        loop {
            match self.next() {
                Some('\\') => match self.next() {
                    Some(c) if c != '\n' => {}
                    _ => return self.errorf("unterminated character constant".to_owned()),
                },
                None | Some('\n') => {
                    return self.errorf("unterminated character constant".to_owned());
                }
                Some('\'') => break,
                Some(_) => {}
            }
        }
        self.emit(ItemKind::CharConstant);
        State::InsideAction
    }

    fn lex_number(&mut self) -> State {
        if !self.scan_number() {
            let text = self.input[self.start..self.pos].to_owned();
            return self.errorf(format!("bad number syntax: {text:?}"));
        }
        if matches!(self.peek(), Some('+' | '-')) {
            // complex: 1+2i; no spaces, must end in 'i'
            self.next();
            if !self.scan_number() || self.input.as_bytes().get(self.pos - 1) != Some(&b'i') {
                let text = self.input[self.start..self.pos].to_owned();
                return self.errorf(format!("bad number syntax: {text:?}"));
            }
            self.emit(ItemKind::Complex);
        } else {
            self.emit(ItemKind::Number);
        }
        State::InsideAction
    }

    fn scan_number(&mut self) -> bool {
        self.accept("+-");
        let mut digits = "0123456789_";
        let mut kind = 10;
        if self.accept("0") {
            // a leading 0 does not mean octal in floats
            if self.accept("xX") {
                digits = "0123456789abcdefABCDEF_";
                kind = 16;
            } else if self.accept("oO") {
                digits = "01234567_";
                kind = 8;
            } else if self.accept("bB") {
                digits = "01_";
                kind = 2;
            }
        }
        self.accept_run(digits);
        if self.accept(".") {
            self.accept_run(digits);
        }
        if kind == 10 && self.accept("eE") {
            self.accept("+-");
            self.accept_run("0123456789_");
        }
        if kind == 16 && self.accept("pP") {
            self.accept("+-");
            self.accept_run("0123456789_");
        }
        // is it imaginary?
        self.accept("i");
        // the next thing must not be alphanumeric
        if self.peek().is_some_and(is_alphanumeric) {
            self.next();
            return false;
        }
        true
    }

    fn lex_quote(&mut self) -> State {
        loop {
            match self.next() {
                Some('\\') => match self.next() {
                    Some(c) if c != '\n' => {}
                    _ => return self.errorf("unterminated quoted string".to_owned()),
                },
                None | Some('\n') => {
                    return self.errorf("unterminated quoted string".to_owned());
                }
                Some('"') => break,
                Some(_) => {}
            }
        }
        self.emit(ItemKind::Str);
        State::InsideAction
    }

    fn lex_raw_quote(&mut self) -> State {
        loop {
            match self.next() {
                None => return self.errorf("unterminated raw quoted string".to_owned()),
                Some('`') => break,
                Some(_) => {}
            }
        }
        self.emit(ItemKind::RawString);
        State::InsideAction
    }
}

/// The length of the spaces at the beginning of `s`.
fn left_trim_length(s: &str) -> usize {
    s.len() - s.trim_start_matches([' ', '\t', '\r', '\n']).len()
}

/// Format a rune the way diagnostic messages expect: `U+0029 ')'`.
fn format_rune(c: char) -> String {
    format!("U+{:04X} '{c}'", c as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Position, Token, TokenKind};

    fn lex_all(action: &str) -> Vec<(ItemKind, String)> {
        let token = Token::with_kind(
            TokenKind::Template,
            action,
            action,
            Position::default(),
        );
        let mut lexer = TemplateLexer::new(&token, "", "");
        let mut items = Vec::new();
        loop {
            let item = lexer.next_item();
            let done = matches!(item.kind, ItemKind::Eof | ItemKind::Error);
            items.push((item.kind, item.val));
            if done {
                break;
            }
        }
        items
    }

    fn kinds(action: &str) -> Vec<ItemKind> {
        lex_all(action).into_iter().map(|(kind, _)| kind).collect()
    }

    #[test]
    fn test_simple_field_action() {
        assert_eq!(
            kinds("{{ .Foo }}"),
            [
                ItemKind::LeftDelim,
                ItemKind::Space,
                ItemKind::Field,
                ItemKind::Space,
                ItemKind::RightDelim,
                ItemKind::Eof
            ]
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            kinds("{{if .X}}"),
            [
                ItemKind::LeftDelim,
                ItemKind::If,
                ItemKind::Space,
                ItemKind::Field,
                ItemKind::RightDelim,
                ItemKind::Eof
            ]
        );
        assert_eq!(
            kinds("{{end}}"),
            [ItemKind::LeftDelim, ItemKind::End, ItemKind::RightDelim, ItemKind::Eof]
        );
    }

    #[test]
    fn test_pipeline_and_declaration() {
        assert_eq!(
            kinds("{{$x := .A | len}}"),
            [
                ItemKind::LeftDelim,
                ItemKind::Variable,
                ItemKind::Space,
                ItemKind::Declare,
                ItemKind::Space,
                ItemKind::Field,
                ItemKind::Space,
                ItemKind::Pipe,
                ItemKind::Space,
                ItemKind::Identifier,
                ItemKind::RightDelim,
                ItemKind::Eof
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let items = lex_all("{{1 0x1f 1.5 1e3 2i 1+2i}}");
        let numbers: Vec<_> = items
            .iter()
            .filter(|(kind, _)| matches!(kind, ItemKind::Number | ItemKind::Complex))
            .collect();
        assert_eq!(numbers.len(), 6);
        assert_eq!(numbers[5].0, ItemKind::Complex);
        assert_eq!(numbers[5].1, "1+2i");
    }

    #[test]
    fn test_strings_and_chars() {
        assert_eq!(
            kinds(r#"{{"hi" `raw` 'c'}}"#),
            [
                ItemKind::LeftDelim,
                ItemKind::Str,
                ItemKind::Space,
                ItemKind::RawString,
                ItemKind::Space,
                ItemKind::CharConstant,
                ItemKind::RightDelim,
                ItemKind::Eof
            ]
        );
    }

    #[test]
    fn test_trim_markers() {
        let items = lex_all("{{- .X -}}");
        assert_eq!(items[0].0, ItemKind::LeftDelim);
        assert_eq!(items[1].0, ItemKind::Field);
        // the single space before -}} belongs to the trim marker
        assert_eq!(items[2].0, ItemKind::RightDelim);
    }

    #[test]
    fn test_comment_action_emits_only_eof() {
        assert_eq!(kinds("{{/* note */}}"), [ItemKind::Eof]);
    }

    #[test]
    fn test_unclosed_comment_is_error() {
        let items = lex_all("{{/* note }}");
        assert_eq!(items.last().unwrap().0, ItemKind::Error);
    }

    #[test]
    fn test_bad_character_after_identifier() {
        let items = lex_all("{{foo@bar}}");
        let last = items.last().unwrap();
        assert_eq!(last.0, ItemKind::Error);
        assert!(last.1.contains("bad character"), "message: {}", last.1);
    }

    #[test]
    fn test_dollar_alone_is_variable() {
        let items = lex_all("{{$}}");
        assert_eq!(items[1].0, ItemKind::Variable);
        assert_eq!(items[1].1, "$");
    }

    #[test]
    fn test_dot_alone() {
        let items = lex_all("{{.}}");
        assert_eq!(items[1].0, ItemKind::Dot);
    }

    #[test]
    fn test_parens() {
        assert_eq!(
            kinds("{{(len .X)}}"),
            [
                ItemKind::LeftDelim,
                ItemKind::LeftParen,
                ItemKind::Identifier,
                ItemKind::Space,
                ItemKind::Field,
                ItemKind::RightParen,
                ItemKind::RightDelim,
                ItemKind::Eof
            ]
        );
    }

    #[test]
    fn test_unbalanced_right_paren() {
        let items = lex_all("{{len)}}");
        assert_eq!(items.last().unwrap().0, ItemKind::Error);
    }
}
