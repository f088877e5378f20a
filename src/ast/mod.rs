// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! AST node types for templated YAML.
//!
//! YAML-side nodes and template-side nodes are separate sum types. A
//! [`Node`] always carries its primary token (and an optional attached
//! comment token); template constructs embedded in a document appear as
//! the `Action`, `If`, `Range`, `With` and `TemplateInvoke` variants,
//! whose pipelines are built from [`template::TemplateNode`] values.

pub mod dump;
pub mod template;

pub use dump::{dump, dump_template};
pub use template::{CommandNode, NumberNode, PipeNode, TemplateNode};

use crate::token::{Token, TokenKind};
use crate::unquote;

/// The integral value of an Integer node.
///
/// Values that fit in `i64` are signed; larger magnitudes fall back to
/// `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegerValue {
    Signed(i64),
    Unsigned(u64),
}

impl std::fmt::Display for IntegerValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Signed(v) => write!(f, "{v}"),
            Self::Unsigned(v) => write!(f, "{v}"),
        }
    }
}

/// The body of an `if`, `range` or `with` action.
#[derive(Debug, Clone, PartialEq)]
pub struct BranchNode {
    /// The pipeline to be evaluated.
    pub pipe: PipeNode,
    /// Nodes for the non-empty case.
    pub list: Vec<Node>,
    /// Nodes for the empty case, when an `{{else}}` clause is present.
    pub else_list: Option<Vec<Node>>,
}

/// A YAML node variant with its children.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Null,
    Bool {
        value: bool,
    },
    Integer {
        value: IntegerValue,
    },
    Float {
        precision: usize,
        value: f64,
    },
    Infinity {
        value: f64,
    },
    Nan,
    String {
        value: String,
    },
    /// A `|` or `>` block scalar; `value` is always a String node.
    Literal {
        value: Box<Node>,
    },
    MergeKey,
    Tag {
        value: Box<Node>,
    },
    Anchor {
        name: Box<Node>,
        value: Box<Node>,
    },
    Alias {
        value: Box<Node>,
    },
    Directive {
        value: Box<Node>,
    },
    Sequence {
        values: Vec<Node>,
        is_flow: bool,
        end: Option<Token>,
    },
    /// `values` holds MappingValue nodes.
    Mapping {
        values: Vec<Node>,
        is_flow: bool,
        end: Option<Token>,
    },
    /// An explicit `? key` entry.
    MappingKey {
        value: Box<Node>,
    },
    /// A single `key: value` entry. A template standing in entry position
    /// has no key/value and carries the template node instead.
    MappingValue {
        key: Option<Box<Node>>,
        value: Option<Box<Node>>,
        template: Option<Box<Node>>,
    },
    Document {
        start: Option<Token>,
        end: Option<Token>,
        body: Box<Node>,
    },
    Comment,
    /// A bare `{{ pipeline }}` action.
    Action {
        pipe: PipeNode,
    },
    If(Box<BranchNode>),
    Range(Box<BranchNode>),
    With(Box<BranchNode>),
    /// A `{{template "name" pipeline}}` or `{{block …}}` invocation.
    TemplateInvoke {
        name: String,
        pipe: Option<PipeNode>,
    },
}

/// A YAML AST node: a variant plus its primary token and an optional
/// attached comment.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub token: Token,
    pub comment: Option<Token>,
}

impl Node {
    fn new(kind: NodeKind, token: Token) -> Self {
        Self {
            kind,
            token,
            comment: None,
        }
    }

    /// The node's primary token.
    #[must_use]
    pub fn token(&self) -> &Token {
        &self.token
    }

    /// Attach a comment token to this node.
    pub fn set_comment(&mut self, comment: Token) {
        self.comment = Some(comment);
    }

    /// The name of this node's variant, as printed by [`dump`].
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Null => "Null",
            NodeKind::Bool { .. } => "Bool",
            NodeKind::Integer { .. } => "Integer",
            NodeKind::Float { .. } => "Float",
            NodeKind::Infinity { .. } => "Infinity",
            NodeKind::Nan => "Nan",
            NodeKind::String { .. } => "String",
            NodeKind::Literal { .. } => "Literal",
            NodeKind::MergeKey => "MergeKey",
            NodeKind::Tag { .. } => "Tag",
            NodeKind::Anchor { .. } => "Anchor",
            NodeKind::Alias { .. } => "Alias",
            NodeKind::Directive { .. } => "Directive",
            NodeKind::Sequence { .. } => "Sequence",
            NodeKind::Mapping { .. } => "Mapping",
            NodeKind::MappingKey { .. } => "MappingKey",
            NodeKind::MappingValue { .. } => "MappingValue",
            NodeKind::Document { .. } => "Document",
            NodeKind::Comment => "Comment",
            NodeKind::Action { .. } => "Action",
            NodeKind::If(_) => "If",
            NodeKind::Range(_) => "Range",
            NodeKind::With(_) => "With",
            NodeKind::TemplateInvoke { .. } => "TemplateInvoke",
        }
    }

    /// Create a Null node.
    #[must_use]
    pub fn null(token: Token) -> Self {
        Self::new(NodeKind::Null, token)
    }

    /// Create a Bool node from a Bool token.
    #[must_use]
    pub fn bool(token: Token) -> Self {
        let value = matches!(token.value.as_str(), "true" | "True" | "TRUE");
        Self::new(NodeKind::Bool { value }, token)
    }

    /// Create an Integer node, parsing the token value in its radix.
    #[must_use]
    pub fn integer(token: Token) -> Self {
        let text = &token.value;
        let value = unquote::parse_int(text)
            .map(IntegerValue::Signed)
            .or_else(|| unquote::parse_uint(text).map(IntegerValue::Unsigned))
            .unwrap_or(IntegerValue::Signed(0));
        Self::new(NodeKind::Integer { value }, token)
    }

    /// Create a Float node.
    #[must_use]
    pub fn float(token: Token) -> Self {
        let text = &token.value;
        let precision = text
            .split('.')
            .nth(1)
            .map(|frac| frac.bytes().take_while(u8::is_ascii_digit).count())
            .unwrap_or(0);
        let value = text.parse::<f64>().unwrap_or(0.0);
        Self::new(NodeKind::Float { precision, value }, token)
    }

    /// Create an Infinity node.
    #[must_use]
    pub fn infinity(token: Token) -> Self {
        let value = if token.value.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
        Self::new(NodeKind::Infinity { value }, token)
    }

    /// Create a Nan node.
    #[must_use]
    pub fn nan(token: Token) -> Self {
        Self::new(NodeKind::Nan, token)
    }

    /// Create a String node.
    #[must_use]
    pub fn string(token: Token) -> Self {
        let value = token.value.clone();
        Self::new(NodeKind::String { value }, token)
    }

    /// Create a Literal node from a `|`/`>` header token and its content.
    #[must_use]
    pub fn literal(token: Token, value: Node) -> Self {
        Self::new(
            NodeKind::Literal {
                value: Box::new(value),
            },
            token,
        )
    }

    /// Create a MergeKey node.
    #[must_use]
    pub fn merge_key(token: Token) -> Self {
        Self::new(NodeKind::MergeKey, token)
    }

    /// Create a Tag node wrapping its value.
    #[must_use]
    pub fn tag(token: Token, value: Node) -> Self {
        Self::new(
            NodeKind::Tag {
                value: Box::new(value),
            },
            token,
        )
    }

    /// Create an Anchor node binding `name` to `value`.
    #[must_use]
    pub fn anchor(token: Token, name: Node, value: Node) -> Self {
        Self::new(
            NodeKind::Anchor {
                name: Box::new(name),
                value: Box::new(value),
            },
            token,
        )
    }

    /// Create an Alias node referencing `name`.
    #[must_use]
    pub fn alias(token: Token, name: Node) -> Self {
        Self::new(
            NodeKind::Alias {
                value: Box::new(name),
            },
            token,
        )
    }

    /// Create a Directive node.
    #[must_use]
    pub fn directive(token: Token, value: Node) -> Self {
        Self::new(
            NodeKind::Directive {
                value: Box::new(value),
            },
            token,
        )
    }

    /// Create a Sequence node. `end` is the `]` token for flow style.
    #[must_use]
    pub fn sequence(token: Token, is_flow: bool, values: Vec<Node>, end: Option<Token>) -> Self {
        Self::new(
            NodeKind::Sequence {
                values,
                is_flow,
                end,
            },
            token,
        )
    }

    /// Create a Mapping node from its entries. `end` is the `}` token for
    /// flow style.
    #[must_use]
    pub fn mapping(token: Token, is_flow: bool, values: Vec<Node>, end: Option<Token>) -> Self {
        Self::new(
            NodeKind::Mapping {
                values,
                is_flow,
                end,
            },
            token,
        )
    }

    /// Create an explicit MappingKey node.
    #[must_use]
    pub fn mapping_key(token: Token, value: Node) -> Self {
        Self::new(
            NodeKind::MappingKey {
                value: Box::new(value),
            },
            token,
        )
    }

    /// Create a `key: value` entry node.
    #[must_use]
    pub fn mapping_value(token: Token, key: Node, value: Node) -> Self {
        Self::new(
            NodeKind::MappingValue {
                key: Some(Box::new(key)),
                value: Some(Box::new(value)),
                template: None,
            },
            token,
        )
    }

    /// Create a mapping entry produced entirely by a template construct.
    #[must_use]
    pub fn mapping_template(token: Token, template: Node) -> Self {
        Self::new(
            NodeKind::MappingValue {
                key: None,
                value: None,
                template: Some(Box::new(template)),
            },
            token,
        )
    }

    /// Create a Document node. `start` is the `---` token and `end` the
    /// `...` token, when explicit.
    #[must_use]
    pub fn document(start: Option<Token>, end: Option<Token>, body: Node) -> Self {
        let token = start.clone().unwrap_or_else(|| body.token().clone());
        Self::new(
            NodeKind::Document {
                start,
                end,
                body: Box::new(body),
            },
            token,
        )
    }

    /// Create a standalone Comment node.
    #[must_use]
    pub fn comment(token: Token) -> Self {
        Self::new(NodeKind::Comment, token)
    }

    /// Create an Action node for a bare `{{ pipeline }}`.
    #[must_use]
    pub fn action(token: Token, pipe: PipeNode) -> Self {
        Self::new(NodeKind::Action { pipe }, token)
    }

    /// Create an If node.
    #[must_use]
    pub fn if_node(token: Token, branch: BranchNode) -> Self {
        Self::new(NodeKind::If(Box::new(branch)), token)
    }

    /// Create a Range node.
    #[must_use]
    pub fn range(token: Token, branch: BranchNode) -> Self {
        Self::new(NodeKind::Range(Box::new(branch)), token)
    }

    /// Create a With node.
    #[must_use]
    pub fn with(token: Token, branch: BranchNode) -> Self {
        Self::new(NodeKind::With(Box::new(branch)), token)
    }

    /// Create a TemplateInvoke node.
    #[must_use]
    pub fn template_invoke(token: Token, name: String, pipe: Option<PipeNode>) -> Self {
        Self::new(NodeKind::TemplateInvoke { name, pipe }, token)
    }

    /// Returns `true` for plain String nodes.
    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self.kind, NodeKind::String { .. })
    }

    /// Returns `true` if this node is a Document.
    #[must_use]
    pub fn is_document(&self) -> bool {
        matches!(self.kind, NodeKind::Document { .. })
    }
}

/// Try to build a scalar node from a scalar-kinded token.
///
/// Returns `None` for structural tokens; quoted tokens are always String
/// nodes regardless of their content.
#[must_use]
pub fn scalar_node(token: &Token) -> Option<Node> {
    let token = token.clone();
    let node = match token.kind {
        TokenKind::Null => Node::null(token),
        TokenKind::Bool => Node::bool(token),
        TokenKind::Integer
        | TokenKind::BinaryInteger
        | TokenKind::OctetInteger
        | TokenKind::HexInteger => Node::integer(token),
        TokenKind::Float => Node::float(token),
        TokenKind::Infinity => Node::infinity(token),
        TokenKind::Nan => Node::nan(token),
        TokenKind::String | TokenKind::SingleQuote | TokenKind::DoubleQuote => Node::string(token),
        _ => return None,
    };
    Some(node)
}

/// The result of a parse: one node per document, plus the source name when
/// parsed from a file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct File {
    /// The documents in source order. Every entry is a Document node.
    pub docs: Vec<Node>,
    /// The file name, empty unless parsed via `parse_file`.
    pub name: String,
}
