// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Recursive-descent parser for templated YAML.
//!
//! The parser walks the scanner's token stream through a cursor
//! [`Context`]. Template tokens are handed to the template sub-parser
//! (`template.rs`), which shares the same cursor so template constructs
//! can wrap YAML fragments and vice versa. The first error terminates
//! the parse and is wrapped with context on the way out.

mod lex;
mod template;

use std::ops::BitOr;
use std::path::Path;

use crate::ast::{File, Node};
use crate::error::{ErrorKind, ParseError};
use crate::scanner;
use crate::token::{Position, ReservedTagKeyword, Token, TokenKind, Tokens};

/// Parse mode flag bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mode(u32);

impl Mode {
    /// Parse comments and attach them to the AST.
    pub const PARSE_COMMENTS: Self = Self(1);

    /// Returns `true` if all flags in `other` are set.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for Mode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Parse a byte slice into a [`File`].
pub fn parse_bytes(bytes: &[u8], mode: Mode) -> Result<File, ParseError> {
    let text = String::from_utf8_lossy(bytes);
    let tokens = scanner::scan_all(&text)?;
    parse(tokens, mode).map_err(|err| err.with_context("failed to parse"))
}

/// Parse an already-scanned token stream into a [`File`].
pub fn parse(tokens: Tokens, mode: Mode) -> Result<File, ParseError> {
    let mut ctx = Context::new(tokens, mode);
    let mut file = File::default();
    while ctx.next() {
        let node = parse_token(&mut ctx).map_err(|err| err.with_context("failed to parse"))?;
        ctx.progress_ignore_comment(1);
        let Some(node) = node else {
            continue;
        };
        if node.is_document() {
            file.docs.push(node);
        } else {
            file.docs.push(Node::document(None, None, node));
        }
    }
    Ok(file)
}

/// Parse the file at `path`, recording its name in the result.
pub fn parse_file(path: impl AsRef<Path>, mode: Mode) -> Result<File, ParseError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|err| {
        ParseError::without_token(ErrorKind::Template(format!(
            "failed to read file {}: {err}",
            path.display()
        )))
    })?;
    let mut file = parse_bytes(&bytes, mode)?;
    file.name = path.display().to_string();
    Ok(file)
}

/// Token cursor shared by the YAML parser and the template sub-parser.
#[derive(Debug)]
pub(crate) struct Context {
    tokens: Vec<Token>,
    idx: usize,
    /// Names of user-supplied template functions, checked alongside the
    /// builtins when resolving identifiers in pipelines.
    pub(crate) funcs: Vec<String>,
}

impl Context {
    fn new(tokens: Tokens, mode: Mode) -> Self {
        let parse_comments = mode.contains(Mode::PARSE_COMMENTS);
        let tokens = tokens
            .into_iter()
            .filter(|token| parse_comments || token.kind != TokenKind::Comment)
            .collect();
        Self {
            tokens,
            idx: 0,
            funcs: Vec::new(),
        }
    }

    pub(crate) fn next(&self) -> bool {
        self.idx < self.tokens.len()
    }

    pub(crate) fn current_token(&self) -> Option<&Token> {
        self.tokens.get(self.idx)
    }

    pub(crate) fn next_token(&self) -> Option<&Token> {
        self.tokens.get(self.idx + 1)
    }

    fn previous_token(&self) -> Option<&Token> {
        self.idx.checked_sub(1).and_then(|idx| self.tokens.get(idx))
    }

    fn not_comment_index_from(&self, mut idx: usize) -> Option<usize> {
        while let Some(token) = self.tokens.get(idx) {
            if token.kind != TokenKind::Comment {
                return Some(idx);
            }
            idx += 1;
        }
        None
    }

    /// The next token after the current one, skipping comments.
    fn next_not_comment_token(&self) -> Option<&Token> {
        let idx = self.not_comment_index_from(self.idx + 1)?;
        self.tokens.get(idx)
    }

    /// The token after [`Context::next_not_comment_token`], skipping
    /// comments again.
    fn after_next_not_comment_token(&self) -> Option<&Token> {
        let idx = self.not_comment_index_from(self.idx + 1)?;
        let idx = self.not_comment_index_from(idx + 1)?;
        self.tokens.get(idx)
    }

    pub(crate) fn progress(&mut self, num: usize) {
        self.idx += num;
    }

    /// Advance by `num`, then step over any comment tokens.
    pub(crate) fn progress_ignore_comment(&mut self, num: usize) {
        self.idx += num;
        while matches!(self.current_token(), Some(token) if token.kind == TokenKind::Comment) {
            self.idx += 1;
        }
    }

    fn insert_token(&mut self, idx: usize, token: Token) {
        self.tokens.insert(idx, token);
    }
}

fn syntax_error(kind: ErrorKind, token: &Token) -> ParseError {
    ParseError::new(kind, token.clone())
}

/// A synthetic null token one column to the right of `base`, standing in
/// for an omitted value.
fn create_null_token(base: &Token) -> Token {
    let position = Position {
        column: base.position.column + 1,
        ..base.position
    };
    Token::new("null", "null", position)
}

/// Dispatch on the current token and parse one node.
///
/// Returns `None` for tokens that do not begin a node (a stray document
/// end, or exhausted input). The cursor is left on the parsed node's last
/// token; the caller advances past it.
pub(crate) fn parse_token(ctx: &mut Context) -> Result<Option<Node>, ParseError> {
    let Some(tk) = ctx.current_token().cloned() else {
        return Ok(None);
    };

    // <key> followed by ':' begins a block mapping.
    if matches!(ctx.next_token(), Some(next) if next.kind == TokenKind::MappingValue) {
        return parse_block_mapping(ctx).map(Some);
    }

    if let Some(node) = parse_scalar_value_with_comment(ctx, &tk)? {
        return Ok(Some(node));
    }

    match tk.kind {
        TokenKind::Comment => {
            let comment = parse_comment(ctx, tk)?;
            let node = parse_token(ctx)
                .map_err(|err| err.with_context("failed to parse node after comment"))?;
            let Some(mut node) = node else {
                return Ok(Some(comment));
            };
            node.set_comment(comment.token().clone());
            Ok(Some(node))
        }
        TokenKind::MappingKey => parse_mapping_key(ctx, tk).map(Some),
        TokenKind::DocumentHeader => parse_document(ctx, tk).map(Some),
        TokenKind::MappingStart => parse_flow_mapping(ctx, tk).map(Some),
        TokenKind::SequenceStart => parse_flow_sequence(ctx, tk).map(Some),
        TokenKind::SequenceEntry => parse_sequence_entry(ctx, tk).map(Some),
        TokenKind::Anchor => parse_anchor(ctx, tk).map(Some),
        TokenKind::Alias => parse_alias(ctx, tk).map(Some),
        TokenKind::Directive => parse_directive(ctx, tk).map(Some),
        TokenKind::Tag => parse_tag(ctx, tk).map(Some),
        TokenKind::Literal | TokenKind::Folded => parse_literal(ctx, tk).map(Some),
        TokenKind::Template => {
            if let Some((_, Some(after))) = peek_template_body(ctx, false) {
                if after.kind == TokenKind::MappingValue {
                    return parse_block_mapping(ctx).map(Some);
                }
            }
            template::parse_template(ctx, false).map(Some)
        }
        TokenKind::MappingValue
        | TokenKind::MappingEnd
        | TokenKind::SequenceEnd
        | TokenKind::CollectEntry => Err(syntax_error(ErrorKind::UnexpectedToken(tk.kind), &tk)),
        _ => Ok(None),
    }
}

/// Build a scalar node for the current token, attaching a trailing
/// same-line comment when one follows.
fn parse_scalar_value_with_comment(
    ctx: &mut Context,
    tk: &Token,
) -> Result<Option<Node>, ParseError> {
    let Some(mut node) = crate::ast::scalar_node(tk) else {
        return Ok(None);
    };
    if is_same_line_comment(ctx.next_token(), &node) {
        ctx.progress(1);
        set_same_line_comment_if_exists(ctx, &mut node);
    }
    Ok(Some(node))
}

fn is_same_line_comment(tk: Option<&Token>, node: &Node) -> bool {
    matches!(
        tk,
        Some(tk) if tk.kind == TokenKind::Comment && tk.position.line == node.token().position.line
    )
}

fn set_same_line_comment_if_exists(ctx: &Context, node: &mut Node) {
    if let Some(tk) = ctx.current_token() {
        if is_same_line_comment(Some(tk), node) {
            node.set_comment(tk.clone());
        }
    }
}

/// Accumulate consecutive comment tokens into a single Comment node. The
/// node exposes the verbatim origin text of the merged comments.
fn parse_comment(ctx: &mut Context, first: Token) -> Result<Node, ParseError> {
    let mut origin = String::new();
    while let Some(tk) = ctx.current_token() {
        if tk.kind != TokenKind::Comment {
            break;
        }
        origin.push_str(&tk.origin);
        ctx.progress(1);
    }
    let merged = Token::with_kind(TokenKind::Comment, origin.clone(), origin, first.position);
    Ok(Node::comment(merged))
}

/// Parse a block mapping: entries at the same column, each `key: value`.
fn parse_block_mapping(ctx: &mut Context) -> Result<Node, ParseError> {
    let first = parse_mapping_value(ctx)?;
    let map_token = first.token().clone();
    let map_column = map_token.position.column;
    let mut values = vec![first];

    while continue_mapping(ctx, map_column) {
        ctx.progress_ignore_comment(1);
        values.push(parse_mapping_value(ctx)?);
    }

    Ok(Node::mapping(map_token, false, values, None))
}

/// Whether the token stream continues the current block mapping: the next
/// entry must sit at the mapping column and be followed by `:`.
fn continue_mapping(ctx: &Context, map_column: usize) -> bool {
    let mut ntk = ctx.next_not_comment_token().cloned();
    let mut antk = ctx.after_next_not_comment_token().cloned();
    if matches!(&ntk, Some(tk) if tk.kind == TokenKind::Template) {
        if let Some((tbody, after)) = peek_template_body(ctx, true) {
            ntk = Some(tbody);
            antk = after;
        }
    }
    match (ntk, antk) {
        (Some(ntk), Some(antk)) => {
            antk.kind == TokenKind::MappingValue && ntk.position.column == map_column
        }
        _ => false,
    }
}

/// How a template token participates in construct nesting.
enum TemplateActionKind {
    /// `if`, `range`, `with`, `block`, `define`: opens a construct closed
    /// by a matching `end`.
    Opener,
    /// `end`
    Closer,
    /// A plain action, `else`, or a comment.
    Other,
}

fn template_action_kind(value: &str) -> TemplateActionKind {
    // The value includes the delimiters: strip "{{", an optional trim
    // marker, and leading spaces before reading the leading word.
    let body = value.strip_prefix("{{").unwrap_or(value);
    let body = body.strip_prefix('-').unwrap_or(body);
    let body = body.trim_start_matches([' ', '\t', '\r', '\n']);
    let word: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect();
    match word.as_str() {
        "if" | "range" | "with" | "block" | "define" => TemplateActionKind::Opener,
        "end" => TemplateActionKind::Closer,
        _ => TemplateActionKind::Other,
    }
}

/// Peek into a template construct starting at the current (or next
/// non-comment) token.
///
/// For a control construct the returned pair is its first body token and
/// the token following it; for a plain action it is the template token
/// itself and the token after it. The parser uses the second token to
/// decide whether the construct participates in a block mapping.
fn peek_template_body(ctx: &Context, from_next: bool) -> Option<(Token, Option<Token>)> {
    let start = if from_next {
        ctx.not_comment_index_from(ctx.idx + 1)?
    } else {
        ctx.idx
    };
    let first = ctx.tokens.get(start)?;
    if first.kind != TokenKind::Template {
        return None;
    }

    match template_action_kind(&first.value) {
        TemplateActionKind::Opener => {
            let mut depth = 1usize;
            let mut idx = start + 1;
            while let Some(tk) = ctx.tokens.get(idx) {
                if tk.kind == TokenKind::Template {
                    match template_action_kind(&tk.value) {
                        TemplateActionKind::Opener => depth += 1,
                        TemplateActionKind::Closer => {
                            depth -= 1;
                            if depth == 0 {
                                return None;
                            }
                        }
                        TemplateActionKind::Other => {}
                    }
                } else {
                    // first body token of the construct
                    return Some((tk.clone(), ctx.tokens.get(idx + 1).cloned()));
                }
                idx += 1;
            }
            None
        }
        _ => Some((first.clone(), ctx.tokens.get(start + 1).cloned())),
    }
}

/// Parse one `key: value` entry (or a template construct standing in
/// entry position).
fn parse_mapping_value(ctx: &mut Context) -> Result<Node, ParseError> {
    let mut comment = None;
    if let Some(tk) = ctx.current_token().cloned() {
        if tk.kind == TokenKind::Comment {
            comment = Some(parse_comment(ctx, tk)?);
        }
    }

    if let Some(tk) = ctx.current_token().cloned() {
        if tk.kind == TokenKind::Template {
            let template = template::parse_template(ctx, true)?;
            let mut node = Node::mapping_template(tk, template);
            if let Some(comment) = comment {
                node.set_comment(comment.token().clone());
            }
            return Ok(node);
        }
    }

    let mut key = parse_map_key(ctx).map_err(|err| err.with_context("failed to parse map key"))?;
    validate_map_key(key.token()).map_err(|err| err.with_context("validate mapping key error"))?;
    ctx.progress(1); // progress to the ':' token
    let colon = ctx
        .current_token()
        .cloned()
        .unwrap_or_else(|| key.token().clone());
    ctx.progress(1); // progress to the value token
    set_same_line_comment_if_exists(ctx, &mut key);
    if key.comment.is_some() {
        ctx.progress_ignore_comment(1);
    }

    let value = parse_map_value(ctx, &key, &colon)
        .map_err(|err| err.with_context("failed to parse map value"))?;
    validate_map_value(ctx, &key, &value)
        .map_err(|err| err.with_context("failed to validate map value"))?;

    let mut node = Node::mapping_value(key.token().clone(), key, value);
    if let Some(comment) = comment {
        node.set_comment(comment.token().clone());
    }
    Ok(node)
}

fn parse_map_key(ctx: &mut Context) -> Result<Node, ParseError> {
    let Some(tk) = ctx.current_token().cloned() else {
        return Err(ParseError::without_token(ErrorKind::UnexpectedToken(
            TokenKind::MappingValue,
        )));
    };
    if let Some(node) = crate::ast::scalar_node(&tk) {
        return Ok(node);
    }
    match tk.kind {
        TokenKind::MergeKey => Ok(Node::merge_key(tk)),
        TokenKind::MappingKey => parse_mapping_key(ctx, tk),
        _ => Err(syntax_error(ErrorKind::UnexpectedToken(tk.kind), &tk)),
    }
}

/// A plain mapping key must not span lines.
fn validate_map_key(tk: &Token) -> Result<(), ParseError> {
    if tk.kind != TokenKind::String {
        return Ok(());
    }
    let origin = tk.origin.trim_start_matches(['\r', '\n']);
    if origin.contains(['\n', '\r']) {
        return Err(syntax_error(ErrorKind::UnexpectedKeyName, tk));
    }
    Ok(())
}

fn parse_map_value(ctx: &mut Context, key: &Node, colon: &Token) -> Result<Node, ParseError> {
    let key_column = key.token().position.column;
    let synthesize_null = match ctx.current_token() {
        None => true,
        Some(tk) => {
            // `key:` with the next token back at (or left of) the key
            // column means the value was omitted.
            (tk.position.column == key_column && tk.kind == TokenKind::String)
                || tk.position.column < key_column
        }
    };
    if synthesize_null {
        let null_token = create_null_token(colon);
        ctx.insert_token(ctx.idx, null_token.clone());
        return Ok(Node::null(null_token));
    }

    let node =
        parse_token(ctx).map_err(|err| err.with_context("failed to parse mapping value node"))?;
    match node {
        Some(node) => Ok(node),
        None => {
            let null_token = create_null_token(colon);
            ctx.insert_token(ctx.idx, null_token.clone());
            Ok(Node::null(null_token))
        }
    }
}

/// A plain string value at the key column must itself be a key; anything
/// else lost its `:` somewhere.
fn validate_map_value(ctx: &Context, key: &Node, value: &Node) -> Result<(), ParseError> {
    let key_column = key.token().position.column;
    let value_column = value.token().position.column;
    if key_column != value_column || !value.is_string() {
        return Ok(());
    }
    match ctx.next_token() {
        Some(ntk)
            if ntk.kind == TokenKind::MappingValue || ntk.kind == TokenKind::SequenceEntry =>
        {
            Ok(())
        }
        _ => Err(syntax_error(ErrorKind::MissingMappingValue, value.token())),
    }
}

/// Parse an explicit `? key` entry.
fn parse_mapping_key(ctx: &mut Context, tk: Token) -> Result<Node, ParseError> {
    ctx.progress(1); // skip the '?' token
    let value = parse_token(ctx)
        .map_err(|err| err.with_context("failed to parse map key"))?
        .ok_or_else(|| syntax_error(ErrorKind::UnexpectedToken(TokenKind::MappingKey), &tk))?;
    Ok(Node::mapping_key(tk, value))
}

/// Parse a flow mapping `{ a: b, c: d }`.
fn parse_flow_mapping(ctx: &mut Context, start: Token) -> Result<Node, ParseError> {
    ctx.progress(1); // skip the '{' token
    let mut values = Vec::new();
    let mut end = None;
    while let Some(tk) = ctx.current_token().cloned() {
        match tk.kind {
            TokenKind::MappingEnd => {
                end = Some(tk);
                break;
            }
            TokenKind::CollectEntry => {
                ctx.progress(1);
            }
            _ => {
                let value = parse_mapping_value(ctx).map_err(|err| {
                    err.with_context("failed to parse mapping value in mapping node")
                })?;
                values.push(value);
                ctx.progress(1);
            }
        }
    }
    if end.is_none() {
        return Err(syntax_error(ErrorKind::FlowMappingNotClosed, &start));
    }
    Ok(Node::mapping(start, true, values, end))
}

/// Parse a flow sequence `[ a, b ]`.
fn parse_flow_sequence(ctx: &mut Context, start: Token) -> Result<Node, ParseError> {
    ctx.progress(1); // skip the '[' token
    let mut values = Vec::new();
    let mut end = None;
    while let Some(tk) = ctx.current_token().cloned() {
        match tk.kind {
            TokenKind::SequenceEnd => {
                end = Some(tk);
                break;
            }
            TokenKind::CollectEntry => {
                ctx.progress(1);
            }
            _ => {
                let value = parse_token(ctx).map_err(|err| {
                    err.with_context("failed to parse sequence value in flow sequence node")
                })?;
                match value {
                    Some(value) => values.push(value),
                    None => break,
                }
                ctx.progress(1);
            }
        }
    }
    if end.is_none() {
        return Err(syntax_error(ErrorKind::FlowSequenceNotClosed, &start));
    }
    Ok(Node::sequence(start, true, values, end))
}

/// Parse a block sequence: `-` entries at the same column.
fn parse_sequence_entry(ctx: &mut Context, start: Token) -> Result<Node, ParseError> {
    let column = start.position.column;
    let mut values = Vec::new();

    loop {
        ctx.progress(1); // skip the '-' token
        let value =
            parse_token(ctx).map_err(|err| err.with_context("failed to parse sequence"))?;
        match value {
            Some(value) => values.push(value),
            None => {
                let null_token = create_null_token(&start);
                ctx.insert_token(ctx.idx, null_token.clone());
                values.push(Node::null(null_token));
            }
        }
        match ctx.next_not_comment_token() {
            Some(tk) if tk.kind == TokenKind::SequenceEntry && tk.position.column == column => {
                ctx.progress_ignore_comment(1);
            }
            _ => break,
        }
    }

    Ok(Node::sequence(start, false, values, None))
}

/// Parse `&name value`.
fn parse_anchor(ctx: &mut Context, tk: Token) -> Result<Node, ParseError> {
    if ctx.next_token().is_none() {
        return Err(syntax_error(ErrorKind::AnchorNameUndefined, &tk));
    }
    ctx.progress(1); // skip the '&' token
    let name = parse_token(ctx)
        .map_err(|err| err.with_context("failed to parse anchor name node"))?
        .ok_or_else(|| syntax_error(ErrorKind::AnchorNameUndefined, &tk))?;
    if ctx.next_token().is_none() {
        let current = ctx.current_token().cloned().unwrap_or_else(|| tk.clone());
        return Err(syntax_error(ErrorKind::AnchorValueUndefined, &current));
    }
    ctx.progress(1);
    let value = parse_token(ctx)
        .map_err(|err| err.with_context("failed to parse anchor value node"))?
        .ok_or_else(|| syntax_error(ErrorKind::AnchorValueUndefined, &tk))?;
    Ok(Node::anchor(tk, name, value))
}

/// Parse `*name`.
fn parse_alias(ctx: &mut Context, tk: Token) -> Result<Node, ParseError> {
    if ctx.next_token().is_none() {
        return Err(syntax_error(ErrorKind::AliasNameUndefined, &tk));
    }
    ctx.progress(1); // skip the '*' token
    let name = parse_token(ctx)
        .map_err(|err| err.with_context("failed to parse alias name node"))?
        .ok_or_else(|| syntax_error(ErrorKind::AliasNameUndefined, &tk))?;
    Ok(Node::alias(tk, name))
}

/// Parse a `%` directive, which must be followed by `---`.
fn parse_directive(ctx: &mut Context, tk: Token) -> Result<Node, ParseError> {
    ctx.progress(1); // skip the '%' token
    let value = parse_token(ctx)
        .map_err(|err| err.with_context("failed to parse directive value"))?
        .ok_or_else(|| syntax_error(ErrorKind::DirectiveWithoutDocument, &tk))?;
    ctx.progress(1);
    match ctx.current_token() {
        Some(current) if current.kind == TokenKind::DocumentHeader => {}
        Some(current) => {
            return Err(syntax_error(ErrorKind::DirectiveWithoutDocument, current));
        }
        None => {
            let previous = ctx.previous_token().cloned().unwrap_or_else(|| tk.clone());
            return Err(syntax_error(ErrorKind::DirectiveWithoutDocument, &previous));
        }
    }
    Ok(Node::directive(tk, value))
}

/// Parse a `!tag value`, narrowing the value type for reserved tags.
fn parse_tag(ctx: &mut Context, tag_token: Token) -> Result<Node, ParseError> {
    ctx.progress(1); // skip the tag token
    let value = match ReservedTagKeyword::from_tag(&tag_token.value) {
        Some(ReservedTagKeyword::Map | ReservedTagKeyword::OrderedMap) => {
            match ctx.current_token().cloned() {
                Some(start) if start.kind == TokenKind::MappingStart => {
                    parse_flow_mapping(ctx, start)
                }
                _ => Err(syntax_error(
                    ErrorKind::UnexpectedToken(TokenKind::Tag),
                    &tag_token,
                )),
            }
        }
        Some(
            ReservedTagKeyword::Integer
            | ReservedTagKeyword::Float
            | ReservedTagKeyword::String
            | ReservedTagKeyword::Binary
            | ReservedTagKeyword::Timestamp
            | ReservedTagKeyword::Null,
        ) => {
            let Some(tk) = ctx.current_token().cloned() else {
                return Err(syntax_error(
                    ErrorKind::UnexpectedToken(TokenKind::Tag),
                    &tag_token,
                ));
            };
            if matches!(tk.kind, TokenKind::Literal | TokenKind::Folded) {
                parse_literal(ctx, tk)
            } else {
                crate::ast::scalar_node(&tk)
                    .ok_or_else(|| syntax_error(ErrorKind::UnexpectedToken(tk.kind), &tk))
            }
        }
        Some(ReservedTagKeyword::Sequence | ReservedTagKeyword::Set) => {
            return Err(syntax_error(
                ErrorKind::UnsupportedTag(tag_token.value.clone()),
                &tag_token,
            ));
        }
        None => {
            // custom tag
            parse_token(ctx).and_then(|node| {
                node.ok_or_else(|| {
                    syntax_error(ErrorKind::UnexpectedToken(TokenKind::Tag), &tag_token)
                })
            })
        }
    }
    .map_err(|err| err.with_context("failed to parse tag value"))?;
    Ok(Node::tag(tag_token, value))
}

/// Parse a `|`/`>` header and its following scalar content.
fn parse_literal(ctx: &mut Context, tk: Token) -> Result<Node, ParseError> {
    ctx.progress(1); // skip the literal/folded header token
    let value = parse_token(ctx)
        .map_err(|err| err.with_context("failed to parse literal/folded value"))?
        .ok_or_else(|| syntax_error(ErrorKind::RequiredStringToken, &tk))?;
    if !value.is_string() {
        return Err(syntax_error(ErrorKind::RequiredStringToken, value.token()));
    }
    Ok(Node::literal(tk, value))
}

/// Parse an explicit document: `---` body, optionally closed by `...`.
fn parse_document(ctx: &mut Context, start: Token) -> Result<Node, ParseError> {
    ctx.progress(1); // skip the document header token
    let body = parse_token(ctx)
        .map_err(|err| err.with_context("failed to parse document body"))?;
    let body = match body {
        Some(body) => body,
        None => {
            // an empty explicit document
            let null_token = create_null_token(&start);
            ctx.insert_token(ctx.idx, null_token.clone());
            Node::null(null_token)
        }
    };
    let mut end = None;
    if matches!(ctx.next_token(), Some(ntk) if ntk.kind == TokenKind::DocumentEnd) {
        end = ctx.next_token().cloned();
        ctx.progress(1);
    }
    Ok(Node::document(Some(start), end, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{IntegerValue, NodeKind};

    fn parse_str(input: &str) -> Result<File, ParseError> {
        parse_bytes(input.as_bytes(), Mode::default())
    }

    fn document_body(file: &File, idx: usize) -> &Node {
        let NodeKind::Document { body, .. } = &file.docs[idx].kind else {
            panic!("expected document at index {idx}");
        };
        body
    }

    #[test]
    fn test_mapping_value_missing_colon_is_error() {
        // A quoted scalar at the key column cannot be a value; it lost
        // its ':' somewhere.
        let err = parse_str("a:\n'c'\n").expect_err("expected parse error");
        assert!(
            err.to_string().contains("could not find expected ':' token"),
            "unexpected message: {err}"
        );
    }

    #[test]
    fn test_colon_at_column_zero_is_error() {
        assert!(parse_str(": a\n").is_err());
    }

    #[test]
    fn test_multiline_key_is_error() {
        let err = parse_str("a\n b: c\n").expect_err("expected parse error");
        assert!(
            err.to_string().contains("unexpected key name"),
            "unexpected message: {err}"
        );
    }

    #[test]
    fn test_directive_requires_document_header() {
        let err = parse_str("%YAML 1.2\nfoo: bar\n").expect_err("expected parse error");
        assert!(
            err.to_string().contains("document not started"),
            "unexpected message: {err}"
        );
    }

    #[test]
    fn test_unsupported_seq_tag() {
        let err = parse_str("!!seq [1, 2]\n").expect_err("expected parse error");
        assert!(
            err.to_string().contains("not supported !!seq tag"),
            "unexpected message: {err}"
        );
    }

    #[test]
    fn test_unclosed_flow_sequence_is_error() {
        assert!(parse_str("[1, 2\n").is_err());
    }

    #[test]
    fn test_omitted_map_value_becomes_null() {
        let file = parse_str("a:\nb: 1\n").expect("parse failed");
        assert_eq!(file.docs.len(), 1);
        let NodeKind::Mapping { values, .. } = &document_body(&file, 0).kind else {
            panic!("expected mapping");
        };
        assert_eq!(values.len(), 2);
        let NodeKind::MappingValue { value, .. } = &values[0].kind else {
            panic!("expected mapping value");
        };
        assert!(matches!(
            value.as_deref().map(|v| &v.kind),
            Some(NodeKind::Null)
        ));
    }

    #[test]
    fn test_block_sequence_of_integers() {
        let file = parse_str("- 1\n- 2\n").expect("parse failed");
        let NodeKind::Sequence { values, is_flow, .. } = &document_body(&file, 0).kind else {
            panic!("expected sequence");
        };
        assert!(!is_flow);
        assert_eq!(values.len(), 2);
        assert!(matches!(
            values[0].kind,
            NodeKind::Integer {
                value: IntegerValue::Signed(1)
            }
        ));
    }

    #[test]
    fn test_anchor_and_alias_nodes() {
        let file = parse_str("a: &x 1\nb: *x\n").expect("parse failed");
        let NodeKind::Mapping { values, .. } = &document_body(&file, 0).kind else {
            panic!("expected mapping");
        };
        let NodeKind::MappingValue { value, .. } = &values[0].kind else {
            panic!("expected entry");
        };
        assert!(matches!(
            value.as_deref().map(|v| &v.kind),
            Some(NodeKind::Anchor { .. })
        ));
        let NodeKind::MappingValue { value, .. } = &values[1].kind else {
            panic!("expected entry");
        };
        assert!(matches!(
            value.as_deref().map(|v| &v.kind),
            Some(NodeKind::Alias { .. })
        ));
    }

    #[test]
    fn test_merge_key_entry() {
        let file = parse_str("<<: *base\n").expect("parse failed");
        let NodeKind::Mapping { values, .. } = &document_body(&file, 0).kind else {
            panic!("expected mapping");
        };
        let NodeKind::MappingValue { key, .. } = &values[0].kind else {
            panic!("expected entry");
        };
        assert!(matches!(
            key.as_deref().map(|k| &k.kind),
            Some(NodeKind::MergeKey)
        ));
    }

    #[test]
    fn test_explicit_document_markers() {
        let file = parse_str("---\nfoo\n...\n").expect("parse failed");
        assert_eq!(file.docs.len(), 1);
        let NodeKind::Document { start, end, body } = &file.docs[0].kind else {
            panic!("expected document");
        };
        assert!(start.is_some());
        assert!(end.is_some());
        assert!(matches!(&body.kind, NodeKind::String { value } if value == "foo"));
    }

    #[test]
    fn test_custom_tag_wraps_value() {
        let file = parse_str("!mytag 42\n").expect("parse failed");
        let NodeKind::Tag { value } = &document_body(&file, 0).kind else {
            panic!("expected tag");
        };
        assert!(matches!(value.kind, NodeKind::Integer { .. }));
    }
}
