// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Crate-level parse tests.
//!
//! These exercise the full pipeline: scanner, template lexer, parser and
//! dump, including the interleaving of YAML structure and template
//! constructs.

use super::*;
use crate::ast::{BranchNode, IntegerValue, TemplateNode};

fn parse_str(input: &str) -> File {
    parse_bytes(input.as_bytes(), Mode::default())
        .unwrap_or_else(|err| panic!("parse failed for {input:?}: {err}"))
}

fn body(file: &File) -> &Node {
    assert_eq!(file.docs.len(), 1, "expected a single document");
    let NodeKind::Document { body, .. } = &file.docs[0].kind else {
        panic!("expected document node");
    };
    body
}

fn mapping_entries(node: &Node) -> &[Node] {
    let NodeKind::Mapping { values, .. } = &node.kind else {
        panic!("expected mapping, got {}", node.type_name());
    };
    values
}

fn entry_key_value(entry: &Node) -> (&Node, &Node) {
    let NodeKind::MappingValue {
        key: Some(key),
        value: Some(value),
        ..
    } = &entry.kind
    else {
        panic!("expected key/value entry");
    };
    (key, value)
}

fn string_value(node: &Node) -> &str {
    let NodeKind::String { value } = &node.kind else {
        panic!("expected string, got {}", node.type_name());
    };
    value
}

#[test]
fn test_single_quoted_scalar() {
    let file = parse_str("'foo'");
    assert_eq!(string_value(body(&file)), "foo");
}

#[test]
fn test_single_quote_escape() {
    let file = parse_str("'f''oo'");
    assert_eq!(string_value(body(&file)), "f'oo");
}

#[test]
fn test_double_quote_unicode_escape() {
    let file = parse_str("\"a\\u0041b\"");
    assert_eq!(string_value(body(&file)), "aAb");
}

#[test]
fn test_simple_mapping() {
    let file = parse_str("key: value\n");
    let entries = mapping_entries(body(&file));
    assert_eq!(entries.len(), 1);
    let (key, value) = entry_key_value(&entries[0]);
    assert_eq!(string_value(key), "key");
    assert_eq!(string_value(value), "value");
}

#[test]
fn test_block_sequence_canonicalizes_integers() {
    let file = parse_str("- 1\n- 2\n");
    let NodeKind::Sequence { values, .. } = &body(&file).kind else {
        panic!("expected sequence");
    };
    assert_eq!(values.len(), 2);
    for (node, expected) in values.iter().zip([1i64, 2]) {
        assert!(matches!(
            node.kind,
            NodeKind::Integer {
                value: IntegerValue::Signed(v)
            } if v == expected
        ));
    }
}

#[test]
fn test_bare_action_document() {
    let file = parse_str("{{ .Foo }}");
    let NodeKind::Action { pipe } = &body(&file).kind else {
        panic!("expected action, got {}", body(&file).type_name());
    };
    assert!(!pipe.is_assign);
    assert!(pipe.decls.is_empty());
    assert_eq!(pipe.cmds.len(), 1);
    assert_eq!(pipe.cmds[0].args.len(), 1);
    assert_eq!(
        pipe.cmds[0].args[0],
        TemplateNode::Field {
            ident: vec!["Foo".to_owned()]
        }
    );
}

#[test]
fn test_if_else_as_mapping_value() {
    let file = parse_str("a: {{ if .X }}b{{ else }}c{{ end }}");
    let entries = mapping_entries(body(&file));
    let (key, value) = entry_key_value(&entries[0]);
    assert_eq!(string_value(key), "a");
    let NodeKind::If(branch) = &value.kind else {
        panic!("expected if node, got {}", value.type_name());
    };
    let BranchNode {
        pipe,
        list,
        else_list,
    } = branch.as_ref();
    assert_eq!(
        pipe.cmds[0].args[0],
        TemplateNode::Field {
            ident: vec!["X".to_owned()]
        }
    );
    assert_eq!(list.len(), 1);
    assert_eq!(string_value(&list[0]), "b");
    let else_list = else_list.as_ref().expect("expected else list");
    assert_eq!(else_list.len(), 1);
    assert_eq!(string_value(&else_list[0]), "c");
}

#[test]
fn test_literal_block_scalar_node() {
    let file = parse_str("|\n  a\n  b\n");
    let NodeKind::Literal { value } = &body(&file).kind else {
        panic!("expected literal");
    };
    assert_eq!(string_value(value), "a\nb\n");
    assert_eq!(body(&file).token().value, "|");
}

#[test]
fn test_folded_block_scalar_with_strip() {
    let file = parse_str(">-\n  a\n  b\n");
    let NodeKind::Literal { value } = &body(&file).kind else {
        panic!("expected literal");
    };
    assert_eq!(string_value(value), "a b");
    assert_eq!(body(&file).token().value, ">-");
}

#[test]
fn test_explicit_document() {
    let file = parse_str("---\nfoo\n...\n");
    let NodeKind::Document { start, end, body } = &file.docs[0].kind else {
        panic!("expected document");
    };
    assert!(start.is_some());
    assert!(end.is_some());
    assert_eq!(string_value(body), "foo");
}

#[test]
fn test_multiple_documents() {
    let file = parse_str("---\na: 1\n---\nb: 2\n");
    assert_eq!(file.docs.len(), 2);
}

// =========================================================================
// Template constructs
// =========================================================================

#[test]
fn test_template_wrapping_mapping_entries() {
    let input = "a: 1\n{{ if .X }}\nb: 2\n{{ end }}\nc: 3\n";
    let file = parse_str(input);
    let entries = mapping_entries(body(&file));
    assert_eq!(entries.len(), 3);
    let NodeKind::MappingValue {
        template: Some(template),
        key,
        ..
    } = &entries[1].kind
    else {
        panic!("expected template entry");
    };
    assert!(key.is_none());
    assert!(matches!(template.kind, NodeKind::If(_)));
}

#[test]
fn test_define_registers_and_yields_null() {
    let file = parse_str("{{ define \"named\" }}a: b{{ end }}");
    assert!(matches!(body(&file).kind, NodeKind::Null));
}

#[test]
fn test_duplicate_definition_is_error() {
    let input = "{{ define \"x\" }}a{{ end }}{{ define \"x\" }}b{{ end }}";
    let err = parse_bytes(input.as_bytes(), Mode::default()).expect_err("expected error");
    assert!(
        err.to_string().contains("multiple definition of template"),
        "unexpected message: {err}"
    );
}

#[test]
fn test_template_invocation() {
    let file = parse_str("{{ template \"named\" . }}");
    let NodeKind::TemplateInvoke { name, pipe } = &body(&file).kind else {
        panic!("expected template invoke");
    };
    assert_eq!(name, "named");
    assert!(pipe.is_some());
}

#[test]
fn test_template_invocation_without_pipe() {
    let file = parse_str("{{ template \"named\" }}");
    let NodeKind::TemplateInvoke { name, pipe } = &body(&file).kind else {
        panic!("expected template invoke");
    };
    assert_eq!(name, "named");
    assert!(pipe.is_none());
}

#[test]
fn test_block_defines_and_invokes() {
    let file = parse_str("{{ block \"b\" . }}x{{ end }}");
    let NodeKind::TemplateInvoke { name, pipe } = &body(&file).kind else {
        panic!("expected template invoke");
    };
    assert_eq!(name, "b");
    assert!(pipe.is_some());
}

#[test]
fn test_else_if_rewrites_to_nested_if() {
    let file = parse_str("{{ if .A }}a{{ else if .B }}b{{ end }}");
    let NodeKind::If(branch) = &body(&file).kind else {
        panic!("expected if");
    };
    let else_list = branch.else_list.as_ref().expect("expected else list");
    assert_eq!(else_list.len(), 1);
    assert!(matches!(else_list[0].kind, NodeKind::If(_)));
}

#[test]
fn test_range_with_declarations() {
    let file = parse_str("{{ range $i, $v := .Items }}x{{ end }}");
    let NodeKind::Range(branch) = &body(&file).kind else {
        panic!("expected range");
    };
    assert_eq!(branch.pipe.decls.len(), 2);
    assert!(!branch.pipe.is_assign);
}

#[test]
fn test_assignment_pipeline() {
    let file = parse_str("a: {{ $x := .Value }}\n");
    let entries = mapping_entries(body(&file));
    let (_, value) = entry_key_value(&entries[0]);
    let NodeKind::Action { pipe } = &value.kind else {
        panic!("expected action, got {}", value.type_name());
    };
    assert_eq!(pipe.decls.len(), 1);
    assert!(!pipe.is_assign);
}

#[test]
fn test_pipeline_stages() {
    let file = parse_str("{{ .Name | printf \"%s\" | len }}");
    let NodeKind::Action { pipe } = &body(&file).kind else {
        panic!("expected action");
    };
    assert_eq!(pipe.cmds.len(), 3);
    assert!(matches!(
        pipe.cmds[1].args[0],
        TemplateNode::Identifier { .. }
    ));
}

#[test]
fn test_chain_on_parenthesized_pipeline() {
    let file = parse_str("{{ (len .X).Foo }}");
    let NodeKind::Action { pipe } = &body(&file).kind else {
        panic!("expected action");
    };
    assert!(matches!(
        pipe.cmds[0].args[0],
        TemplateNode::Chain { .. }
    ));
}

#[test]
fn test_undefined_variable_is_error() {
    let err = parse_bytes(b"{{ $nope }}", Mode::default()).expect_err("expected error");
    assert!(
        err.to_string().contains("undefined variable"),
        "unexpected message: {err}"
    );
}

#[test]
fn test_unknown_function_is_error() {
    let err = parse_bytes(b"{{ nosuch .X }}", Mode::default()).expect_err("expected error");
    assert!(
        err.to_string().contains("not defined"),
        "unexpected message: {err}"
    );
}

#[test]
fn test_builtin_function_resolves() {
    let file = parse_str("{{ len .Items }}");
    let NodeKind::Action { pipe } = &body(&file).kind else {
        panic!("expected action");
    };
    assert_eq!(
        pipe.cmds[0].args[0],
        TemplateNode::Identifier {
            ident: "len".to_owned()
        }
    );
}

#[test]
fn test_stray_end_is_error() {
    let err = parse_bytes(b"{{ end }}", Mode::default()).expect_err("expected error");
    assert!(
        err.to_string().contains("unexpected {{end}}"),
        "unexpected message: {err}"
    );
}

#[test]
fn test_empty_action_is_error() {
    let err = parse_bytes(b"{{}}", Mode::default()).expect_err("expected error");
    assert!(
        err.to_string().contains("missing value for command"),
        "unexpected message: {err}"
    );
}

#[test]
fn test_non_executable_pipeline_stage_is_error() {
    let err = parse_bytes(b"{{ .X | 1 }}", Mode::default()).expect_err("expected error");
    assert!(
        err.to_string().contains("non executable command"),
        "unexpected message: {err}"
    );
}

#[test]
fn test_comment_action_parses_to_null() {
    let file = parse_str("{{/* just a comment */}}");
    assert!(matches!(body(&file).kind, NodeKind::Null));
}

// =========================================================================
// Comments
// =========================================================================

#[test]
fn test_same_line_comment_attaches_to_value() {
    let file = parse_bytes(b"a: 1 # note\n", Mode::PARSE_COMMENTS).expect("parse failed");
    let entries = mapping_entries(body(&file));
    let (_, value) = entry_key_value(&entries[0]);
    let comment = value.comment.as_ref().expect("expected comment");
    assert_eq!(comment.value, " note");
}

#[test]
fn test_leading_comment_attaches_to_next_node() {
    let file = parse_bytes(b"# heading\nfoo\n", Mode::PARSE_COMMENTS).expect("parse failed");
    let node = body(&file);
    assert_eq!(string_value(node), "foo");
    // comment nodes expose origin text, '#' included
    let comment = node.comment.as_ref().expect("expected comment");
    assert_eq!(comment.value, "# heading");
}

#[test]
fn test_comments_dropped_without_mode_flag() {
    let file = parse_str("a: 1 # note\n");
    let entries = mapping_entries(body(&file));
    let (_, value) = entry_key_value(&entries[0]);
    assert!(value.comment.is_none());
}

// =========================================================================
// Dump output
// =========================================================================

#[test]
fn test_dump_mapping_format() {
    let file = parse_str("key: value\n");
    let mut out = Vec::new();
    dump(&mut out, &file.docs[0]).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "- *Document*");
    assert!(lines.iter().any(|line| line.trim() == "- *Mapping*"));
    assert!(lines.iter().any(|line| line.contains("- Value: `value`")));
    // children are indented four spaces per level
    assert!(text.contains("\n    - *Mapping*\n"));
}

#[test]
fn test_dump_template_pipe() {
    let file = parse_str("{{ .Foo }}");
    let mut out = Vec::new();
    dump(&mut out, body(&file)).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert!(text.starts_with("- *Action*"));
    assert!(text.contains("- *Pipe*"));
    assert!(text.contains("- *Command*"));
    assert!(text.contains("- Ident: `[Foo]`"));
}
