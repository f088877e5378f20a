// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Template action sub-parser.
//!
//! Invoked when the YAML parser dispatches a Template token. The
//! sub-parser shares the outer token cursor: when its lexer exhausts one
//! action, the cursor advances — a following Template token restarts the
//! lexer, while any other token is parsed by the outer parser and yielded
//! as a synthetic Yaml item. This is how `{{if}} … {{end}}` constructs
//! wrap YAML fragments and vice versa.
//!
//! A toplevel template (column 1, not in mapping-entry position) may
//! accumulate YAML fragments; an embedded template must produce exactly
//! one node. Parse errors unwind to [`parse_template`] via `Result`, and
//! dropping the lexer is all the cancellation it needs.

use std::collections::HashMap;

use super::lex::{Item, ItemKind, TemplateLexer};
use super::{create_null_token, parse_token, Context};
use crate::ast::{BranchNode, CommandNode, Node, NumberNode, PipeNode, TemplateNode};
use crate::error::{ErrorKind, ParseError};
use crate::token::{Token, TokenKind};
use crate::unquote;

/// Functions an identifier may name without a user-supplied table.
const BUILTINS: &[&str] = &[
    "and", "call", "html", "index", "slice", "js", "len", "not", "or", "print", "printf",
    "println", "urlquery", "eq", "ge", "gt", "le", "lt", "ne",
];

/// Parse the template construct starting at the current Template token.
///
/// `embedded` forces single-node parsing even at column 1 (used for
/// templates standing in mapping-entry position).
pub(crate) fn parse_template(ctx: &mut Context, embedded: bool) -> Result<Node, ParseError> {
    let Some(tk) = ctx.current_token().cloned() else {
        return Err(ParseError::without_token(ErrorKind::UnexpectedToken(
            TokenKind::Template,
        )));
    };
    if tk.kind != TokenKind::Template {
        return Err(ParseError::new(ErrorKind::UnexpectedToken(tk.kind), tk));
    }
    let toplevel = !embedded && tk.position.column == 1;
    let mut parser = TemplateParser::new(ctx, tk.clone(), toplevel);
    let mut root = parser.parse()?;
    match root.len() {
        0 => {
            let null_token = create_null_token(&tk);
            ctx.insert_token(ctx.idx, null_token.clone());
            Ok(Node::null(null_token))
        }
        1 => Ok(root.remove(0)),
        _ => Err(ParseError::new(
            ErrorKind::Template("expected exactly one template node".to_owned()),
            tk,
        )),
    }
}

/// How an item list terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListEnd {
    End,
    Else,
}

/// The result of parsing one action: a node, or one of the
/// parser-internal `{{end}}` / `{{else}}` delimiters.
enum ActionResult {
    Node(Node),
    End,
    Else,
}

struct TemplateParser<'a> {
    ctx: &'a mut Context,
    /// The name of the template being parsed; updated while parsing
    /// `define` and `block` bodies.
    name: String,
    parse_name: String,
    toplevel: bool,
    /// The Template token currently feeding the lexer.
    current_token: Token,
    lexer: TemplateLexer,
    /// Three-item lookahead.
    lookahead: [Item; 3],
    peek_count: usize,
    /// Variables defined at the moment; `$` is always bound.
    vars: Vec<String>,
    /// Named trees registered by `define` and `block`.
    tree_set: HashMap<String, Vec<Node>>,
    last_line: usize,
}

impl<'a> TemplateParser<'a> {
    fn new(ctx: &'a mut Context, token: Token, toplevel: bool) -> Self {
        let lexer = TemplateLexer::new(&token, "", "");
        Self {
            ctx,
            name: "template".to_owned(),
            parse_name: "template".to_owned(),
            toplevel,
            current_token: token,
            lexer,
            lookahead: [Item::eof(), Item::eof(), Item::eof()],
            peek_count: 0,
            vars: vec!["$".to_owned()],
            tree_set: HashMap::new(),
            last_line: 1,
        }
    }

    // === errors ===

    fn errorf(&self, message: impl Into<String>) -> ParseError {
        let message = message.into();
        ParseError::new(
            ErrorKind::Template(format!("{}:{}: {message}", self.parse_name, self.last_line)),
            self.current_token.clone(),
        )
    }

    fn unexpected(&self, item: &Item, context: &str) -> ParseError {
        self.errorf(format!("unexpected {item} in {context}"))
    }

    // === item stream ===

    /// Fetch the next item, crossing into the outer token stream when the
    /// current action is exhausted.
    fn lex_next(&mut self) -> Result<Item, ParseError> {
        let item = self.lexer.next_item();
        if item.kind != ItemKind::Eof {
            return Ok(item);
        }
        self.next_node()
    }

    /// Advance the outer cursor past the current token: a Template token
    /// restarts the lexer, anything else is parsed as a YAML fragment.
    fn next_node(&mut self) -> Result<Item, ParseError> {
        loop {
            self.ctx.progress_ignore_comment(1);
            let Some(tk) = self.ctx.current_token().cloned() else {
                return Ok(Item::eof());
            };
            if tk.kind != TokenKind::Template {
                match parse_token(self.ctx)? {
                    Some(node) => return Ok(Item::yaml(Some(node))),
                    None => continue,
                }
            }
            self.current_token = tk.clone();
            let left = self.lexer.left_delim.clone();
            let right = self.lexer.right_delim.clone();
            self.lexer = TemplateLexer::new(&tk, &left, &right);
            let item = self.lexer.next_item();
            if item.kind != ItemKind::Eof {
                return Ok(item);
            }
            // a comment-only action; keep going
        }
    }

    fn next(&mut self) -> Result<Item, ParseError> {
        if self.peek_count > 0 {
            self.peek_count -= 1;
        } else {
            self.lookahead[0] = self.lex_next()?;
        }
        let item = self.lookahead[self.peek_count].clone();
        if item.line > 0 {
            self.last_line = item.line;
        }
        Ok(item)
    }

    /// Back the input stream up one item.
    fn backup(&mut self) {
        self.peek_count += 1;
    }

    /// Back the input stream up two items; the zeroth is already there.
    fn backup2(&mut self, t1: Item) {
        self.lookahead[1] = t1;
        self.peek_count = 2;
    }

    /// Back the input stream up three items; the zeroth is already there.
    fn backup3(&mut self, t2: Item, t1: Item) {
        self.lookahead[1] = t1;
        self.lookahead[2] = t2;
        self.peek_count = 3;
    }

    fn peek(&mut self) -> Result<Item, ParseError> {
        if self.peek_count > 0 {
            return Ok(self.lookahead[self.peek_count - 1].clone());
        }
        self.lookahead[0] = self.lex_next()?;
        self.peek_count = 1;
        Ok(self.lookahead[0].clone())
    }

    fn next_non_space(&mut self) -> Result<Item, ParseError> {
        loop {
            let item = self.next()?;
            if item.kind != ItemKind::Space {
                return Ok(item);
            }
        }
    }

    fn peek_non_space(&mut self) -> Result<Item, ParseError> {
        let item = self.next_non_space()?;
        self.backup();
        Ok(item)
    }

    /// Consume the next item, requiring the given kind.
    fn expect(&mut self, expected: ItemKind, context: &str) -> Result<Item, ParseError> {
        let item = self.next_non_space()?;
        if item.kind != expected {
            return Err(self.unexpected(&item, context));
        }
        Ok(item)
    }

    fn expect_one_of(
        &mut self,
        expected1: ItemKind,
        expected2: ItemKind,
        context: &str,
    ) -> Result<Item, ParseError> {
        let item = self.next_non_space()?;
        if item.kind != expected1 && item.kind != expected2 {
            return Err(self.unexpected(&item, context));
        }
        Ok(item)
    }

    /// The Template token an item was lexed from.
    fn item_token(&self, item: &Item) -> Token {
        item.token.clone().unwrap_or_else(|| self.current_token.clone())
    }

    // === parsing ===

    /// Top-level template parse. A toplevel template accumulates nodes
    /// (and `define` registrations) until EOF; an embedded one parses a
    /// single action.
    fn parse(&mut self) -> Result<Vec<Node>, ParseError> {
        if !self.toplevel {
            self.expect(ItemKind::LeftDelim, "template")?;
            return match self.action()? {
                ActionResult::Node(node) => Ok(vec![node]),
                ActionResult::End => Err(self.errorf("unexpected {{end}}")),
                ActionResult::Else => Err(self.errorf("unexpected {{else}}")),
            };
        }

        let mut root = Vec::new();
        while self.peek()?.kind != ItemKind::Eof {
            if self.peek()?.kind == ItemKind::LeftDelim {
                let delim = self.next()?;
                if self.next_non_space()?.kind == ItemKind::Define {
                    self.parse_definition()?;
                    continue;
                }
                self.backup2(delim);
            }
            match self.text_or_action()? {
                ActionResult::Node(node) => root.push(node),
                ActionResult::End => return Err(self.errorf("unexpected {{end}}")),
                ActionResult::Else => return Err(self.errorf("unexpected {{else}}")),
            }
        }
        Ok(root)
    }

    /// Parse a `{{define "name"}} … {{end}}` definition and register it.
    fn parse_definition(&mut self) -> Result<(), ParseError> {
        const CONTEXT: &str = "define clause";
        let name_item = self.expect_one_of(ItemKind::Str, ItemKind::RawString, CONTEXT)?;
        let name = unquote::unquote(&name_item.val)
            .ok_or_else(|| self.errorf(format!("invalid syntax: {}", name_item.val)))?;
        self.expect(ItemKind::RightDelim, CONTEXT)?;

        let saved_name = std::mem::replace(&mut self.name, name.clone());
        let saved_vars = std::mem::replace(&mut self.vars, vec!["$".to_owned()]);
        let result = self.item_list();
        self.name = saved_name;
        self.vars = saved_vars;

        let (root, end) = result?;
        if end != ListEnd::End {
            return Err(self.errorf(format!("unexpected {{{{else}}}} in {CONTEXT}")));
        }
        self.add_tree(&name, root)
    }

    /// Register a named tree. Re-registering is allowed only while one of
    /// the trees is empty.
    fn add_tree(&mut self, name: &str, root: Vec<Node>) -> Result<(), ParseError> {
        match self.tree_set.get(name) {
            None => {
                self.tree_set.insert(name.to_owned(), root);
                Ok(())
            }
            Some(existing) if existing.is_empty() => {
                self.tree_set.insert(name.to_owned(), root);
                Ok(())
            }
            Some(_) if root.is_empty() => Ok(()),
            Some(_) => Err(self.errorf(format!("multiple definition of template {name:?}"))),
        }
    }

    /// Parse nodes until `{{end}}` or `{{else}}`, returned separately.
    fn item_list(&mut self) -> Result<(Vec<Node>, ListEnd), ParseError> {
        let mut list = Vec::new();
        loop {
            if self.peek_non_space()?.kind == ItemKind::Eof {
                return Err(self.errorf("unexpected EOF"));
            }
            match self.text_or_action()? {
                ActionResult::Node(node) => list.push(node),
                ActionResult::End => return Ok((list, ListEnd::End)),
                ActionResult::Else => return Ok((list, ListEnd::Else)),
            }
        }
    }

    fn text_or_action(&mut self) -> Result<ActionResult, ParseError> {
        let item = self.next_non_space()?;
        match item.kind {
            ItemKind::Yaml => match item.node.clone() {
                Some(node) => Ok(ActionResult::Node(node)),
                None => Err(self.unexpected(&item, "input")),
            },
            ItemKind::LeftDelim => self.action(),
            _ => Err(self.unexpected(&item, "input")),
        }
    }

    /// Parse one action; the left delimiter is already consumed. The
    /// first word may be a control keyword.
    fn action(&mut self) -> Result<ActionResult, ParseError> {
        let item = self.next_non_space()?;
        match item.kind {
            ItemKind::Block => self.block_control(&item).map(ActionResult::Node),
            ItemKind::Else => self.else_control(),
            ItemKind::End => self.end_control(),
            ItemKind::If => {
                let token = self.item_token(&item);
                self.if_control(token).map(ActionResult::Node)
            }
            ItemKind::Range => {
                let token = self.item_token(&item);
                let branch = self.parse_control(false, "range", &token)?;
                Ok(ActionResult::Node(Node::range(token, branch)))
            }
            ItemKind::Template => self.template_control(&item).map(ActionResult::Node),
            ItemKind::With => {
                let token = self.item_token(&item);
                let branch = self.parse_control(false, "with", &token)?;
                Ok(ActionResult::Node(Node::with(token, branch)))
            }
            _ => {
                self.backup();
                let token = self.item_token(&item);
                // variables declared here persist until "end"
                let pipe = self.pipeline("command")?;
                Ok(ActionResult::Node(Node::action(token, pipe)))
            }
        }
    }

    fn if_control(&mut self, token: Token) -> Result<Node, ParseError> {
        let branch = self.parse_control(true, "if", &token)?;
        Ok(Node::if_node(token, branch))
    }

    /// `{{end}}`; the keyword is past.
    fn end_control(&mut self) -> Result<ActionResult, ParseError> {
        self.expect(ItemKind::RightDelim, "end")?;
        Ok(ActionResult::End)
    }

    /// `{{else}}`; the keyword is past. `{{else if` leaves the `if`
    /// pending for the enclosing control to consume.
    fn else_control(&mut self) -> Result<ActionResult, ParseError> {
        if self.peek_non_space()?.kind == ItemKind::If {
            return Ok(ActionResult::Else);
        }
        self.expect(ItemKind::RightDelim, "else")?;
        Ok(ActionResult::Else)
    }

    /// Shared body of `if`/`range`/`with`: pipeline, body list, optional
    /// else list. Variables declared inside are unwound on exit.
    fn parse_control(
        &mut self,
        allow_else_if: bool,
        context: &str,
        token: &Token,
    ) -> Result<BranchNode, ParseError> {
        let vars_len = self.vars.len();
        let result = self.parse_control_body(allow_else_if, context, token);
        self.vars.truncate(vars_len);
        result
    }

    fn parse_control_body(
        &mut self,
        allow_else_if: bool,
        context: &str,
        token: &Token,
    ) -> Result<BranchNode, ParseError> {
        let pipe = self.pipeline(context)?;
        let (list, end) = self.item_list()?;
        let else_list = match end {
            ListEnd::End => None,
            ListEnd::Else => {
                if allow_else_if && self.peek()?.kind == ItemKind::If {
                    // Treat {{if a}}_{{else if b}}_{{end}} as
                    // {{if a}}_{{else}}{{if b}}_{{end}}{{end}}: parse the
                    // nested if and assume its {{end}}.
                    self.next()?;
                    let nested = self.if_control(token.clone())?;
                    Some(vec![nested])
                } else {
                    let (else_list, end) = self.item_list()?;
                    if end != ListEnd::End {
                        return Err(self.errorf("expected end; found {{else}}"));
                    }
                    Some(else_list)
                }
            }
        };
        Ok(BranchNode {
            pipe,
            list,
            else_list,
        })
    }

    /// `{{block "name" pipeline}} … {{end}}`: define and invoke.
    fn block_control(&mut self, item: &Item) -> Result<Node, ParseError> {
        const CONTEXT: &str = "block clause";
        let token = self.item_token(item);
        let name_item = self.next_non_space()?;
        let name = self.parse_template_name(&name_item, CONTEXT)?;
        let pipe = self.pipeline(CONTEXT)?;

        let saved_name = std::mem::replace(&mut self.name, name.clone());
        let saved_vars = std::mem::replace(&mut self.vars, vec!["$".to_owned()]);
        let result = self.item_list();
        self.name = saved_name;
        self.vars = saved_vars;

        let (root, end) = result?;
        if end != ListEnd::End {
            return Err(self.errorf(format!("unexpected {{{{else}}}} in {CONTEXT}")));
        }
        self.add_tree(&name, root)?;
        Ok(Node::template_invoke(token, name, Some(pipe)))
    }

    /// `{{template "name"}}` or `{{template "name" pipeline}}`.
    fn template_control(&mut self, item: &Item) -> Result<Node, ParseError> {
        const CONTEXT: &str = "template clause";
        let token = self.item_token(item);
        let name_item = self.next_non_space()?;
        let name = self.parse_template_name(&name_item, CONTEXT)?;
        let pipe = if self.next_non_space()?.kind == ItemKind::RightDelim {
            None
        } else {
            self.backup();
            // do not pop variables; they persist until "end"
            Some(self.pipeline(CONTEXT)?)
        };
        Ok(Node::template_invoke(token, name, pipe))
    }

    fn parse_template_name(&self, item: &Item, context: &str) -> Result<String, ParseError> {
        match item.kind {
            ItemKind::Str | ItemKind::RawString => unquote::unquote(&item.val)
                .ok_or_else(|| self.errorf(format!("invalid syntax: {}", item.val))),
            _ => Err(self.unexpected(item, context)),
        }
    }

    /// Pipeline: optional declarations, then commands separated by `|`.
    fn pipeline(&mut self, context: &str) -> Result<PipeNode, ParseError> {
        let mut pipe = PipeNode::default();

        // Are there declarations or assignments?
        loop {
            let v = self.peek_non_space()?;
            if v.kind != ItemKind::Variable {
                break;
            }
            self.next_non_space()?;
            // Space is a token, so three-item lookahead is needed in the
            // worst case: in "$x foo" only "foo" (as opposed to ":=")
            // tells us $x is an argument rather than a declaration.
            let token_after_variable = self.peek()?;
            let next = self.peek_non_space()?;
            match next.kind {
                ItemKind::Assign | ItemKind::Declare => {
                    pipe.is_assign = next.kind == ItemKind::Assign;
                    self.next_non_space()?;
                    pipe.decls.push(TemplateNode::variable(&v.val));
                    self.vars.push(v.val.clone());
                    break;
                }
                ItemKind::Char if next.val == "," => {
                    self.next_non_space()?;
                    pipe.decls.push(TemplateNode::variable(&v.val));
                    self.vars.push(v.val.clone());
                    if context == "range" && pipe.decls.len() < 2 {
                        match self.peek_non_space()?.kind {
                            ItemKind::Variable | ItemKind::RightDelim | ItemKind::RightParen => {
                                // second initialized variable in a range
                                continue;
                            }
                            _ => {
                                return Err(
                                    self.errorf("range can only initialize variables")
                                );
                            }
                        }
                    }
                    return Err(self.errorf(format!("too many declarations in {context}")));
                }
                _ if token_after_variable.kind == ItemKind::Space => {
                    self.backup3(v, token_after_variable);
                    break;
                }
                _ => {
                    self.backup2(v);
                    break;
                }
            }
        }

        loop {
            let item = self.next_non_space()?;
            match item.kind {
                ItemKind::RightDelim | ItemKind::RightParen => {
                    self.check_pipeline(&pipe, context)?;
                    if item.kind == ItemKind::RightParen {
                        self.backup();
                    }
                    return Ok(pipe);
                }
                ItemKind::Bool
                | ItemKind::CharConstant
                | ItemKind::Complex
                | ItemKind::Dot
                | ItemKind::Field
                | ItemKind::Identifier
                | ItemKind::Number
                | ItemKind::Nil
                | ItemKind::RawString
                | ItemKind::Str
                | ItemKind::Variable
                | ItemKind::LeftParen => {
                    self.backup();
                    let command = self.command()?;
                    pipe.append(command);
                }
                _ => return Err(self.unexpected(&item, context)),
            }
        }
    }

    fn check_pipeline(&self, pipe: &PipeNode, context: &str) -> Result<(), ParseError> {
        if pipe.cmds.is_empty() {
            return Err(self.errorf(format!("missing value for {context}")));
        }
        // Only the first command of a pipeline can start with a non
        // executable operand.
        for (stage, command) in pipe.cmds.iter().enumerate().skip(1) {
            if let Some(first) = command.args.first() {
                if first.is_literal() {
                    return Err(self.errorf(format!(
                        "non executable command in pipeline stage {}",
                        stage + 1
                    )));
                }
            }
        }
        Ok(())
    }

    /// Command: space-separated operands up to a pipe or right delimiter.
    fn command(&mut self) -> Result<CommandNode, ParseError> {
        let mut command = CommandNode::default();
        loop {
            self.peek_non_space()?; // skip leading spaces
            if let Some(operand) = self.operand()? {
                command.append(operand);
            }
            let item = self.next()?;
            match item.kind {
                ItemKind::Space => continue,
                ItemKind::Error => return Err(self.errorf(item.val)),
                ItemKind::RightDelim | ItemKind::RightParen => {
                    self.backup();
                }
                ItemKind::Pipe => {}
                _ => return Err(self.errorf(format!("unexpected {item} in operand"))),
            }
            break;
        }
        if command.args.is_empty() {
            return Err(self.errorf("empty command"));
        }
        Ok(command)
    }

    /// Operand: a term possibly followed by field accesses. Chained
    /// fields extend Field and Variable terms in place; other terms get a
    /// Chain wrapper. Chaining a literal is an error.
    fn operand(&mut self) -> Result<Option<TemplateNode>, ParseError> {
        let Some(node) = self.term()? else {
            return Ok(None);
        };
        let mut node = node;
        if self.peek()?.kind == ItemKind::Field {
            let mut fields = Vec::new();
            while self.peek()?.kind == ItemKind::Field {
                let item = self.next()?;
                for segment in item.val.trim_start_matches('.').split('.') {
                    fields.push(segment.to_owned());
                }
            }
            node = match node {
                TemplateNode::Field { mut ident } => {
                    ident.extend(fields);
                    TemplateNode::Field { ident }
                }
                TemplateNode::Variable { mut ident } => {
                    ident.extend(fields);
                    TemplateNode::Variable { ident }
                }
                node if node.is_literal() => {
                    return Err(
                        self.errorf(format!("unexpected . after term {:?}", node.to_string()))
                    );
                }
                node => TemplateNode::Chain {
                    node: Box::new(node),
                    field: fields,
                },
            };
        }
        Ok(Some(node))
    }

    /// Term: literal, function identifier, `.`, field, variable, or a
    /// parenthesized pipeline. `None` means the next item is not a term.
    fn term(&mut self) -> Result<Option<TemplateNode>, ParseError> {
        let item = self.next_non_space()?;
        match item.kind {
            ItemKind::Error => Err(self.errorf(item.val)),
            ItemKind::Identifier => {
                if !self.has_function(&item.val) {
                    return Err(self.errorf(format!("function {:?} not defined", item.val)));
                }
                Ok(Some(TemplateNode::Identifier { ident: item.val }))
            }
            ItemKind::Dot => Ok(Some(TemplateNode::Dot)),
            ItemKind::Nil => Ok(Some(TemplateNode::Nil)),
            ItemKind::Variable => self.use_var(&item).map(Some),
            ItemKind::Field => Ok(Some(TemplateNode::field(&item.val))),
            ItemKind::Bool => Ok(Some(TemplateNode::Bool {
                value: item.val == "true",
            })),
            ItemKind::CharConstant | ItemKind::Complex | ItemKind::Number => {
                let number =
                    NumberNode::parse(&item.val).map_err(|message| self.errorf(message))?;
                Ok(Some(TemplateNode::Number(number)))
            }
            ItemKind::LeftParen => {
                let pipe = self.pipeline("parenthesized pipeline")?;
                let next = self.next()?;
                if next.kind != ItemKind::RightParen {
                    return Err(self.errorf(format!("unclosed right paren: unexpected {next}")));
                }
                Ok(Some(TemplateNode::Pipe(pipe)))
            }
            ItemKind::Str | ItemKind::RawString => {
                let text = unquote::unquote(&item.val)
                    .ok_or_else(|| self.errorf(format!("invalid syntax: {}", item.val)))?;
                Ok(Some(TemplateNode::Str {
                    quoted: item.val,
                    text,
                }))
            }
            _ => {
                self.backup();
                Ok(None)
            }
        }
    }

    /// Whether `name` names a builtin or user-supplied function.
    fn has_function(&self, name: &str) -> bool {
        BUILTINS.contains(&name) || self.ctx.funcs.iter().any(|func| func == name)
    }

    /// A variable reference must already be declared.
    fn use_var(&self, item: &Item) -> Result<TemplateNode, ParseError> {
        let node = TemplateNode::variable(&item.val);
        let TemplateNode::Variable { ident } = &node else {
            return Err(self.unexpected(item, "variable"));
        };
        match ident.first() {
            Some(first) if self.vars.iter().any(|var| var == first) => Ok(node),
            Some(first) => Err(self.errorf(format!("undefined variable {first:?}"))),
            None => Err(self.unexpected(item, "variable")),
        }
    }
}
