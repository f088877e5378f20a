// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Textual tree dumps of parsed nodes.
//!
//! The format is line-based: each node prints `- *Type*` at its depth,
//! followed by `- Key: `value`` property lines and children indented four
//! spaces deeper. Property values are C-style quoted with the outer
//! quotes stripped. Output is byte-deterministic for a given tree.

use std::io::{self, Write};

use super::template::{CommandNode, PipeNode, TemplateNode};
use super::{Node, NodeKind};

/// Print a textual representation of the tree rooted at `node`.
pub fn dump<W: Write>(writer: &mut W, node: &Node) -> io::Result<()> {
    dump_node(writer, 0, node)
}

/// Print a textual representation of the template tree rooted at `node`.
pub fn dump_template<W: Write>(writer: &mut W, node: &TemplateNode) -> io::Result<()> {
    dump_template_node(writer, 0, node)
}

enum Child<'a> {
    Node(&'a Node),
    Pipe(&'a PipeNode),
}

fn dump_child<W: Write>(writer: &mut W, level: usize, child: &Child<'_>) -> io::Result<()> {
    match child {
        Child::Node(node) => dump_node(writer, level, node),
        Child::Pipe(pipe) => dump_pipe(writer, level, pipe),
    }
}

fn dumpf<W: Write>(
    writer: &mut W,
    level: usize,
    type_name: &str,
    properties: &[(&str, String)],
) -> io::Result<()> {
    let indent = "    ".repeat(level);
    writeln!(writer, "{indent}- *{type_name}*")?;
    for (key, value) in properties {
        writeln!(writer, "{indent}    - {key}: `{}`", quote_value(value))?;
    }
    Ok(())
}

fn dump_node<W: Write>(writer: &mut W, level: usize, node: &Node) -> io::Result<()> {
    let mut properties: Vec<(&str, String)> = Vec::new();
    if let Some(comment) = &node.comment {
        properties.push(("Comment", comment.value.clone()));
    }
    properties.push(("Token", node.token.value.clone()));
    properties.push(("Position", node.token.position.to_string()));

    let mut children: Vec<Child<'_>> = Vec::new();
    match &node.kind {
        NodeKind::Null | NodeKind::Nan | NodeKind::MergeKey | NodeKind::Comment => {}
        NodeKind::Bool { value } => {
            properties.push(("Value", value.to_string()));
        }
        NodeKind::Integer { value } => {
            properties.push(("Value", value.to_string()));
        }
        NodeKind::Float { precision, value } => {
            properties.push(("Precision", precision.to_string()));
            properties.push(("Value", value.to_string()));
        }
        NodeKind::Infinity { value } => {
            properties.push(("Value", value.to_string()));
        }
        NodeKind::String { value } => {
            properties.push(("Value", value.clone()));
        }
        NodeKind::Literal { value } => {
            if let NodeKind::String { value } = &value.kind {
                properties.push(("Value", value.clone()));
            }
        }
        NodeKind::Tag { value } | NodeKind::Directive { value } => {
            properties.push(("Start", node.token.value.clone()));
            children.push(Child::Node(value));
        }
        NodeKind::Anchor { name, value } => {
            properties.push(("Start", node.token.value.clone()));
            children.push(Child::Node(name));
            children.push(Child::Node(value));
        }
        NodeKind::Alias { value } => {
            properties.push(("Start", node.token.value.clone()));
            children.push(Child::Node(value));
        }
        NodeKind::Sequence {
            values,
            is_flow,
            end,
        }
        | NodeKind::Mapping {
            values,
            is_flow,
            end,
        } => {
            properties.push(("Start", node.token.value.clone()));
            if let Some(end) = end {
                properties.push(("End", end.value.clone()));
            }
            properties.push(("IsFlowStyle", is_flow.to_string()));
            children.extend(values.iter().map(Child::Node));
        }
        NodeKind::MappingKey { value } => {
            properties.push(("Start", node.token.value.clone()));
            children.push(Child::Node(value));
        }
        NodeKind::MappingValue {
            key,
            value,
            template,
        } => {
            properties.push(("Start", node.token.value.clone()));
            if let Some(template) = template {
                children.push(Child::Node(template));
            }
            if let Some(key) = key {
                children.push(Child::Node(key));
            }
            if let Some(value) = value {
                children.push(Child::Node(value));
            }
        }
        NodeKind::Document { start, end, body } => {
            if let Some(start) = start {
                properties.push(("Start", start.value.clone()));
            }
            if let Some(end) = end {
                properties.push(("End", end.value.clone()));
            }
            children.push(Child::Node(body));
        }
        NodeKind::Action { pipe } => {
            children.push(Child::Pipe(pipe));
        }
        NodeKind::If(branch) | NodeKind::Range(branch) | NodeKind::With(branch) => {
            children.push(Child::Pipe(&branch.pipe));
            children.extend(branch.list.iter().map(Child::Node));
            if let Some(else_list) = &branch.else_list {
                children.extend(else_list.iter().map(Child::Node));
            }
        }
        NodeKind::TemplateInvoke { name, pipe } => {
            properties.push(("Name", name.clone()));
            if let Some(pipe) = pipe {
                children.push(Child::Pipe(pipe));
            }
        }
    }

    dumpf(writer, level, node.type_name(), &properties)?;
    for child in &children {
        dump_child(writer, level + 1, child)?;
    }
    Ok(())
}

fn dump_pipe<W: Write>(writer: &mut W, level: usize, pipe: &PipeNode) -> io::Result<()> {
    let mut properties = vec![("IsAssign", pipe.is_assign.to_string())];
    let decls: Vec<&str> = pipe
        .decls
        .iter()
        .filter_map(|decl| match decl {
            TemplateNode::Variable { ident } => ident.first().map(String::as_str),
            _ => None,
        })
        .collect();
    properties.push(("Decl", format!("[{}]", decls.join(","))));
    dumpf(writer, level, "Pipe", &properties)?;
    for cmd in &pipe.cmds {
        dump_command(writer, level + 1, cmd)?;
    }
    Ok(())
}

fn dump_command<W: Write>(writer: &mut W, level: usize, command: &CommandNode) -> io::Result<()> {
    dumpf(writer, level, "Command", &[])?;
    for arg in &command.args {
        dump_template_node(writer, level + 1, arg)?;
    }
    Ok(())
}

fn dump_template_node<W: Write>(
    writer: &mut W,
    level: usize,
    node: &TemplateNode,
) -> io::Result<()> {
    match node {
        TemplateNode::Pipe(pipe) => dump_pipe(writer, level, pipe),
        TemplateNode::Dot | TemplateNode::Nil => dumpf(writer, level, node.type_name(), &[]),
        TemplateNode::Identifier { ident } => {
            dumpf(writer, level, "Identifier", &[("Ident", ident.clone())])
        }
        TemplateNode::Variable { ident } => dumpf(
            writer,
            level,
            "Variable",
            &[("Ident", format!("[{}]", ident.join(",")))],
        ),
        TemplateNode::Field { ident } => dumpf(
            writer,
            level,
            "Field",
            &[("Ident", format!("[{}]", ident.join(",")))],
        ),
        TemplateNode::Chain { node, field } => {
            dumpf(
                writer,
                level,
                "Chain",
                &[("Field", format!("[{}]", field.join(",")))],
            )?;
            dump_template_node(writer, level + 1, node)
        }
        TemplateNode::Bool { value } => {
            dumpf(writer, level, "TemplateBool", &[("True", value.to_string())])
        }
        TemplateNode::Number(number) => {
            let (re, im) = number.complex128;
            let sign = if im >= 0.0 { "+" } else { "-" };
            let complex = format!("({re}{sign}{}i)", im.abs());
            let properties = [
                ("IsInt", number.is_int.to_string()),
                ("IsUint", number.is_uint.to_string()),
                ("IsFloat", number.is_float.to_string()),
                ("IsComplex", number.is_complex.to_string()),
                ("Int64", number.int64.to_string()),
                ("Uint64", number.uint64.to_string()),
                ("Float64", number.float64.to_string()),
                ("Complex128", complex),
                ("Text", number.text.clone()),
            ];
            dumpf(writer, level, "TemplateNumber", &properties)
        }
        TemplateNode::Str { quoted, text } => {
            let properties = [("Quoted", quoted.clone()), ("Text", text.clone())];
            dumpf(writer, level, "TemplateString", &properties)
        }
    }
}

/// C-style quote a value and strip the outer quotes.
fn quote_value(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{c}' => out.push_str("\\f"),
            '\u{b}' => out.push_str("\\v"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::{Position, Token};

    fn plain(value: &str) -> Token {
        Token::new(value, value, Position { line: 1, column: 1, ..Position::default() })
    }

    #[test]
    fn test_quote_value() {
        assert_eq!(quote_value("a\nb"), "a\\nb");
        assert_eq!(quote_value("say \"hi\""), "say \\\"hi\\\"");
        assert_eq!(quote_value("tab\there"), "tab\\there");
        assert_eq!(quote_value("plain"), "plain");
    }

    #[test]
    fn test_dump_scalar() {
        let node = Node::string(plain("hello"));
        let mut out = Vec::new();
        dump(&mut out, &node).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "- *String*\n    - Token: `hello`\n    - Position: `[level:0,line:1,column:1,offset:0]`\n    - Value: `hello`\n"
        );
    }

    #[test]
    fn test_dump_is_deterministic() {
        let node = Node::integer(plain("42"));
        let mut first = Vec::new();
        let mut second = Vec::new();
        dump(&mut first, &node).unwrap();
        dump(&mut second, &node).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_dump_template_field() {
        let node = TemplateNode::field(".Foo.Bar");
        let mut out = Vec::new();
        dump_template(&mut out, &node).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "- *Field*\n    - Ident: `[Foo,Bar]`\n");
    }
}
