// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! AST node types for template actions.
//!
//! These nodes describe the contents of a `{{ … }}` action: pipelines of
//! commands whose operands are identifiers, fields, variables, literals
//! and parenthesized sub-pipelines. They carry no YAML token; the
//! enclosing Action/If/Range/With node owns the source position.

use std::fmt;

use crate::unquote;

/// A template expression node.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateNode {
    /// A pipeline used as an operand (parenthesized).
    Pipe(PipeNode),
    /// A function name.
    Identifier { ident: String },
    /// A `$` variable, possibly with chained field accesses. The dollar
    /// sign is part of the first segment.
    Variable { ident: Vec<String> },
    /// The cursor, `.`.
    Dot,
    /// The untyped `nil` constant.
    Nil,
    /// A field access chain `.a.b`; the periods are dropped.
    Field { ident: Vec<String> },
    /// A term followed by field accesses, where the term is not itself a
    /// field or variable.
    Chain {
        node: Box<TemplateNode>,
        field: Vec<String>,
    },
    /// A boolean constant.
    Bool { value: bool },
    /// A numeric constant.
    Number(NumberNode),
    /// A string constant.
    Str {
        /// The original text, quotes included.
        quoted: String,
        /// The text after quote processing.
        text: String,
    },
}

impl TemplateNode {
    /// The name of this node's variant, as printed by
    /// [`dump_template`](super::dump_template).
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Pipe(_) => "Pipe",
            Self::Identifier { .. } => "Identifier",
            Self::Variable { .. } => "Variable",
            Self::Dot => "Dot",
            Self::Nil => "Nil",
            Self::Field { .. } => "Field",
            Self::Chain { .. } => "Chain",
            Self::Bool { .. } => "TemplateBool",
            Self::Number(_) => "TemplateNumber",
            Self::Str { .. } => "TemplateString",
        }
    }

    /// Create a Field node from `.a.b` text; the leading period is
    /// dropped from each segment.
    #[must_use]
    pub fn field(ident: &str) -> Self {
        let ident = ident
            .trim_start_matches('.')
            .split('.')
            .map(str::to_owned)
            .collect();
        Self::Field { ident }
    }

    /// Create a Variable node from `$name` or `$name.field` text.
    #[must_use]
    pub fn variable(ident: &str) -> Self {
        let ident = ident.split('.').map(str::to_owned).collect();
        Self::Variable { ident }
    }

    /// A literal node cannot be chained or follow another pipeline stage.
    #[must_use]
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Self::Bool { .. } | Self::Dot | Self::Nil | Self::Number(_) | Self::Str { .. }
        )
    }
}

impl fmt::Display for TemplateNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pipe(pipe) => write!(f, "{pipe}"),
            Self::Identifier { ident } => f.write_str(ident),
            Self::Variable { ident } => f.write_str(&ident.join(".")),
            Self::Dot => f.write_str("."),
            Self::Nil => f.write_str("nil"),
            Self::Field { ident } => {
                for segment in ident {
                    write!(f, ".{segment}")?;
                }
                Ok(())
            }
            Self::Chain { node, field } => {
                if matches!(node.as_ref(), Self::Pipe(_)) {
                    write!(f, "({node})")?;
                } else {
                    write!(f, "{node}")?;
                }
                for segment in field {
                    write!(f, ".{segment}")?;
                }
                Ok(())
            }
            Self::Bool { value } => write!(f, "{value}"),
            Self::Number(number) => f.write_str(&number.text),
            Self::Str { quoted, .. } => f.write_str(quoted),
        }
    }
}

/// A pipeline: optional variable declarations followed by one or more
/// commands separated by `|`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PipeNode {
    /// The variables are being assigned (`=`) rather than declared (`:=`).
    pub is_assign: bool,
    /// Declared variables in lexical order. Always Variable nodes.
    pub decls: Vec<TemplateNode>,
    /// The commands in lexical order.
    pub cmds: Vec<CommandNode>,
}

impl PipeNode {
    /// Append a command to the pipeline.
    pub fn append(&mut self, command: CommandNode) {
        self.cmds.push(command);
    }
}

impl fmt::Display for PipeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.decls.is_empty() {
            for (i, decl) in self.decls.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{decl}")?;
            }
            f.write_str(" := ")?;
        }
        for (i, cmd) in self.cmds.iter().enumerate() {
            if i > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{cmd}")?;
        }
        Ok(())
    }
}

/// One stage of a pipeline: an operand and its arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandNode {
    /// Arguments in lexical order: identifier, field, or constant.
    pub args: Vec<TemplateNode>,
}

impl CommandNode {
    /// Append an argument.
    pub fn append(&mut self, arg: TemplateNode) {
        self.args.push(arg);
    }
}

impl fmt::Display for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if let TemplateNode::Pipe(pipe) = arg {
                write!(f, "({pipe})")?;
            } else {
                write!(f, "{arg}")?;
            }
        }
        Ok(())
    }
}

/// A numeric constant, stored under every representation that can hold its
/// value. This mirrors the behavior of ideal constants in the template
/// source language: `3` is usable as int, uint and float alike.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberNode {
    pub is_int: bool,
    pub is_uint: bool,
    pub is_float: bool,
    pub is_complex: bool,
    pub int64: i64,
    pub uint64: u64,
    pub float64: f64,
    /// Real and imaginary parts.
    pub complex128: (f64, f64),
    /// The original textual representation from the input.
    pub text: String,
}

impl NumberNode {
    /// Parse a numeric constant: integer, float, imaginary/complex, or
    /// character constant.
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut n = Self {
            is_int: false,
            is_uint: false,
            is_float: false,
            is_complex: false,
            int64: 0,
            uint64: 0,
            float64: 0.0,
            complex128: (0.0, 0.0),
            text: text.to_owned(),
        };

        if let Some(rest) = text.strip_prefix('\'') {
            let (c, tail) = unquote::unquote_char(rest, '\'')
                .ok_or_else(|| format!("malformed character constant: {text}"))?;
            if tail != "'" {
                return Err(format!("malformed character constant: {text}"));
            }
            let code = i64::from(u32::from(c));
            n.int64 = code;
            n.is_int = true;
            n.uint64 = code as u64;
            n.is_uint = true;
            n.float64 = code as f64;
            n.is_float = true;
            return Ok(n);
        }

        if text.ends_with('i') {
            let body = &text[..text.len() - 1];
            if let Some(imag) = unquote::parse_float(body) {
                n.is_complex = true;
                n.complex128 = (0.0, imag);
                n.simplify_complex();
                return Ok(n);
            }
            if let Some((re, im)) = parse_complex_pair(body) {
                n.is_complex = true;
                n.complex128 = (re, im);
                n.simplify_complex();
                return Ok(n);
            }
            return Err(format!("illegal number syntax: {text:?}"));
        }

        if let Some(u) = unquote::parse_uint(text) {
            n.is_uint = true;
            n.uint64 = u;
        }
        if let Some(i) = unquote::parse_int(text) {
            n.is_int = true;
            n.int64 = i;
            if i == 0 {
                n.is_uint = true;
                n.uint64 = 0;
            }
        }
        if n.is_int {
            n.is_float = true;
            n.float64 = n.int64 as f64;
        } else if n.is_uint {
            n.is_float = true;
            n.float64 = n.uint64 as f64;
        } else if let Some(f) = unquote::parse_float(text) {
            // A float that spells an integer is an integer too large to
            // represent; reject it rather than silently rounding.
            if !text.contains(['.', 'e', 'E', 'p', 'P']) {
                return Err(format!("integer overflow: {text:?}"));
            }
            n.is_float = true;
            n.float64 = f;
            if f == f.trunc() {
                if f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                    n.is_int = true;
                    n.int64 = f as i64;
                }
                if f >= 0.0 && f <= u64::MAX as f64 {
                    n.is_uint = true;
                    n.uint64 = f as u64;
                }
            }
        }

        if !n.is_int && !n.is_uint && !n.is_float {
            return Err(format!("illegal number syntax: {text:?}"));
        }
        Ok(n)
    }

    /// Pull out the other representations a complex value with zero
    /// imaginary part can take.
    fn simplify_complex(&mut self) {
        let (re, im) = self.complex128;
        self.is_float = im == 0.0;
        if self.is_float {
            self.float64 = re;
            if re == re.trunc() && re >= i64::MIN as f64 && re <= i64::MAX as f64 {
                self.is_int = true;
                self.int64 = re as i64;
            }
            if re == re.trunc() && re >= 0.0 && re <= u64::MAX as f64 {
                self.is_uint = true;
                self.uint64 = re as u64;
            }
        }
    }
}

/// Split `1+2` (the trailing `i` already removed) into real and imaginary
/// parts of a complex constant.
fn parse_complex_pair(body: &str) -> Option<(f64, f64)> {
    // Find the sign separating the parts: not at position 0 and not part
    // of an exponent.
    let bytes = body.as_bytes();
    for idx in (1..bytes.len()).rev() {
        let b = bytes[idx];
        if b != b'+' && b != b'-' {
            continue;
        }
        let prev = bytes[idx - 1].to_ascii_lowercase();
        if prev == b'e' || prev == b'p' {
            continue;
        }
        let re = unquote::parse_float(&body[..idx])?;
        let im = unquote::parse_float(&body[idx..])?;
        return Some((re, im));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_constant() {
        let n = NumberNode::parse("17").unwrap();
        assert!(n.is_int && n.is_uint && n.is_float);
        assert_eq!(n.int64, 17);
        assert_eq!(n.uint64, 17);
        assert_eq!(n.float64, 17.0);
    }

    #[test]
    fn test_negative_integer() {
        let n = NumberNode::parse("-3").unwrap();
        assert!(n.is_int && !n.is_uint);
        assert_eq!(n.int64, -3);
    }

    #[test]
    fn test_hex_and_underscores() {
        assert_eq!(NumberNode::parse("0x_1f").unwrap().int64, 31);
        assert_eq!(NumberNode::parse("1_000").unwrap().int64, 1000);
        assert_eq!(NumberNode::parse("0b101").unwrap().int64, 5);
    }

    #[test]
    fn test_float_constant() {
        let n = NumberNode::parse("2.5").unwrap();
        assert!(n.is_float && !n.is_int);
        assert_eq!(n.float64, 2.5);
    }

    #[test]
    fn test_float_spelling_integer() {
        let n = NumberNode::parse("4.0").unwrap();
        assert!(n.is_float && n.is_int && n.is_uint);
        assert_eq!(n.int64, 4);
    }

    #[test]
    fn test_imaginary_constant() {
        let n = NumberNode::parse("2i").unwrap();
        assert!(n.is_complex && !n.is_float);
        assert_eq!(n.complex128, (0.0, 2.0));
    }

    #[test]
    fn test_complex_pair() {
        let n = NumberNode::parse("1+2i").unwrap();
        assert!(n.is_complex);
        assert_eq!(n.complex128, (1.0, 2.0));
    }

    #[test]
    fn test_char_constant() {
        let n = NumberNode::parse("'a'").unwrap();
        assert!(n.is_int && n.is_uint && n.is_float);
        assert_eq!(n.int64, 97);
        let newline = NumberNode::parse(r"'\n'").unwrap();
        assert_eq!(newline.int64, 10);
    }

    #[test]
    fn test_bad_numbers() {
        assert!(NumberNode::parse("abc").is_err());
        assert!(NumberNode::parse("'ab'").is_err());
        assert!(NumberNode::parse("0x").is_err());
    }

    #[test]
    fn test_field_segments() {
        let field = TemplateNode::field(".a.b");
        assert_eq!(
            field,
            TemplateNode::Field {
                ident: vec!["a".to_owned(), "b".to_owned()]
            }
        );
    }

    #[test]
    fn test_pipe_display() {
        let mut pipe = PipeNode::default();
        let mut cmd = CommandNode::default();
        cmd.append(TemplateNode::field(".name"));
        pipe.append(cmd);
        let mut cmd = CommandNode::default();
        cmd.append(TemplateNode::Identifier {
            ident: "printf".to_owned(),
        });
        cmd.append(TemplateNode::Str {
            quoted: "\"%s\"".to_owned(),
            text: "%s".to_owned(),
        });
        pipe.append(cmd);
        assert_eq!(pipe.to_string(), ".name | printf \"%s\"");
    }
}
