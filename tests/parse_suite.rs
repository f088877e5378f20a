// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! End-to-end invariant tests over a corpus of inputs.
//!
//! These check the properties that must hold for any input that scans and
//! parses successfully: the token stream reconstructs the source exactly,
//! positions are monotonic, flow collections balance, and scanning and
//! dumping are deterministic.

use yaml_template_parser::{
    dump, parse_bytes, tokenize, Mode, ParseError, Scanner, TokenKind, Tokens,
};

/// Inputs that must scan and parse successfully.
const CORPUS: &[&str] = &[
    "foo",
    "'foo'",
    "\"foo bar\"",
    "key: value\n",
    "a: 1\nb: 2\nc: 3\n",
    "a:\n  b: c\n  d: e\n",
    "- 1\n- 2\n- 3\n",
    "- a\n- - b\n  - c\n",
    "seq:\n  - x\n  - y\n",
    "[1, 2, 3]",
    "{a: 1, b: 2}",
    "nested: {list: [a, b], map: {x: y}}\n",
    "---\na: 1\n---\nb: 2\n",
    "---\nfoo\n...\n",
    "a: &anchor value\nb: *anchor\n",
    "<<: *base\nkey: value\n",
    "tagged: !custom 17\n",
    "lit: |\n  line one\n  line two\n",
    "fold: >-\n  folded\n  text\n",
    "keep: |+\n  kept\n\n\n",
    "empty:\nnext: 1\n",
    "? explicit\n",
    "quoted keys:\n  'a b': 1\n  \"c d\": 2\n",
    "numbers:\n  int: 42\n  hex: 0x2a\n  oct: 0o52\n  bin: 0b101010\n  float: 4.2\n  exp: 1e3\n  inf: .inf\n  nan: .nan\n  none: null\n  yes: true\n",
    "{{ .Foo }}",
    "a: {{ .Values.replicas }}\n",
    "a: {{ if .X }}b{{ else }}c{{ end }}",
    "{{ if .Enabled }}\nname: on\n{{ end }}",
    "a: 1\n{{ if .X }}\nb: 2\n{{ end }}\nc: 3\n",
    "{{ range $i, $v := .Items }}x{{ end }}",
    "{{ define \"tpl\" }}inner: 1{{ end }}",
    "{{ template \"tpl\" . }}",
    "{{ block \"blk\" . }}content{{ end }}",
    "cmd: {{ .Name | printf \"%q\" | len }}\n",
    "{{/* leading comment action */}}",
    "note: {{ printf \"x\" }}\n",
    "multi\u{e9}byte: caf\u{e9}\n",
];

fn scan_tokens(input: &str) -> Tokens {
    let tokens = tokenize(input);
    assert!(
        !tokens.is_empty() || input.trim().is_empty(),
        "no tokens for {input:?}"
    );
    tokens
}

#[test]
fn test_origin_round_trip() {
    for input in CORPUS {
        let tokens = scan_tokens(input);
        let rebuilt: String = tokens.iter().map(|t| t.origin.as_str()).collect();
        assert_eq!(&rebuilt, input, "origin round-trip failed");
    }
}

#[test]
fn test_position_monotonicity() {
    for input in CORPUS {
        let tokens = scan_tokens(input);
        for pair in tokens.windows(2) {
            let (a, b) = (&pair[0].position, &pair[1].position);
            assert!(
                (a.line, a.column) <= (b.line, b.column),
                "positions regressed in {input:?}: {a:?} then {b:?}"
            );
            assert!(a.offset <= b.offset, "offsets regressed in {input:?}");
        }
    }
}

#[test]
fn test_flow_balance() {
    for input in CORPUS {
        let tokens = scan_tokens(input);
        let count = |kind: TokenKind| tokens.iter().filter(|t| t.kind == kind).count();
        assert_eq!(
            count(TokenKind::MappingStart),
            count(TokenKind::MappingEnd),
            "unbalanced flow mappings in {input:?}"
        );
        assert_eq!(
            count(TokenKind::SequenceStart),
            count(TokenKind::SequenceEnd),
            "unbalanced flow sequences in {input:?}"
        );
    }
}

#[test]
fn test_scanner_determinism() {
    for input in CORPUS {
        let first = tokenize(input);
        let second = tokenize(input);
        assert_eq!(first, second, "scan of {input:?} was not deterministic");
    }
}

#[test]
fn test_corpus_parses() {
    for input in CORPUS {
        let file = parse_bytes(input.as_bytes(), Mode::default())
            .unwrap_or_else(|err| panic!("parse failed for {input:?}: {err}"));
        assert!(!file.docs.is_empty(), "no documents for {input:?}");
    }
}

#[test]
fn test_dump_determinism() {
    for input in CORPUS {
        let file = parse_bytes(input.as_bytes(), Mode::default())
            .unwrap_or_else(|err| panic!("parse failed for {input:?}: {err}"));
        let mut first = Vec::new();
        let mut second = Vec::new();
        for doc in &file.docs {
            dump(&mut first, doc).unwrap();
            dump(&mut second, doc).unwrap();
        }
        assert_eq!(first, second, "dump of {input:?} was not deterministic");
    }
}

#[test]
fn test_crlf_normalization_preserves_values() {
    for input in CORPUS {
        if !input.contains('\n') {
            continue;
        }
        let crlf = input.replace('\n', "\r\n");
        let unix_tokens = tokenize(input);
        let crlf_tokens = tokenize(&crlf);
        assert_eq!(
            unix_tokens.len(),
            crlf_tokens.len(),
            "token counts differ for {input:?}"
        );
        for (a, b) in unix_tokens.iter().zip(crlf_tokens.iter()) {
            assert_eq!(a.kind, b.kind, "token kinds differ in {input:?}");
            assert_eq!(a.value, b.value, "token values differ in {input:?}");
        }
    }
}

#[test]
fn test_scan_batches_match_tokenize() {
    for input in CORPUS {
        let mut scanner = Scanner::new(input);
        let mut collected = Tokens::new();
        loop {
            match scanner.scan() {
                Ok(batch) => collected.extend(batch),
                Err(err) => {
                    assert!(err.is_end_of_input(), "scan error for {input:?}: {err}");
                    break;
                }
            }
        }
        let values: Vec<_> = collected.iter().map(|t| (t.kind, t.value.clone())).collect();
        let expected: Vec<_> = tokenize(input)
            .iter()
            .map(|t| (t.kind, t.value.clone()))
            .collect();
        assert_eq!(values, expected, "batch scan differs for {input:?}");
    }
}

#[test]
fn test_empty_and_whitespace_inputs() {
    assert!(tokenize("").is_empty());
    assert!(tokenize("   \n  \n").is_empty());

    let file = parse_bytes(b"", Mode::default()).expect("empty input should parse");
    assert!(file.docs.is_empty());
}

#[test]
fn test_error_inputs() {
    let cases: &[&str] = &[
        "'unterminated",
        "\"unterminated",
        ": novalue\n",
        "a:\n'c'\n",
        "!!seq [1]\n",
        "%YAML 1.2\nno document\n",
        "{{ if .X }}no end",
        "{{ $undeclared }}",
        "[1, 2\n",
    ];
    for input in cases {
        let result: Result<_, ParseError> = parse_bytes(input.as_bytes(), Mode::default());
        assert!(result.is_err(), "expected error for {input:?}");
    }
}

#[test]
fn test_parse_comments_round_trip() {
    let input = "# top\na: 1 # same line\n# trailing\nb: 2\n";
    let with = parse_bytes(input.as_bytes(), Mode::PARSE_COMMENTS).expect("parse failed");
    let without = parse_bytes(input.as_bytes(), Mode::default()).expect("parse failed");
    assert_eq!(with.docs.len(), without.docs.len());
}
