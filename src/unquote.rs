// Copyright (c) 2026 Arista Networks, Inc.
// Use of this source code is governed by the Apache License 2.0
// that can be found in the LICENSE file.

//! Quoted-string and numeric constant parsing for template literals.
//!
//! Template actions use Go literal syntax: double-quoted strings with
//! backslash escapes, backquoted raw strings, single-quoted character
//! constants, and numbers with radix prefixes, digit-separating
//! underscores and binary exponents. This module decodes them.

/// Unquote a string literal: `"…"`, `` `…` `` or `'c'`.
pub(crate) fn unquote(text: &str) -> Option<String> {
    let mut chars = text.chars();
    let quote = chars.next()?;
    if text.len() < 2 || !text.ends_with(quote) {
        return None;
    }
    let inner = &text[quote.len_utf8()..text.len() - quote.len_utf8()];

    match quote {
        '`' => {
            if inner.contains('`') || inner.contains('\r') {
                return None;
            }
            Some(inner.to_owned())
        }
        '\'' => {
            let (c, rest) = unquote_char(inner, quote)?;
            if !rest.is_empty() {
                return None;
            }
            Some(c.to_string())
        }
        '"' => {
            let mut out = String::with_capacity(inner.len());
            let mut rest = inner;
            while !rest.is_empty() {
                if rest.starts_with('\n') {
                    return None;
                }
                let (c, tail) = unquote_char(rest, quote)?;
                out.push(c);
                rest = tail;
            }
            Some(out)
        }
        _ => None,
    }
}

/// Decode one character (possibly escaped) from `s`, returning it and the
/// remaining text. `quote` is the surrounding quote character; only that
/// quote may appear escaped.
pub(crate) fn unquote_char(s: &str, quote: char) -> Option<(char, &str)> {
    let mut chars = s.chars();
    let first = chars.next()?;
    if first == quote {
        return None;
    }
    if first != '\\' {
        return Some((first, chars.as_str()));
    }

    let escape = chars.next()?;
    let rest = chars.as_str();
    let simple = |c: char| Some((c, rest));
    match escape {
        'a' => simple('\u{7}'),
        'b' => simple('\u{8}'),
        'f' => simple('\u{c}'),
        'n' => simple('\n'),
        'r' => simple('\r'),
        't' => simple('\t'),
        'v' => simple('\u{b}'),
        '\\' => simple('\\'),
        '\'' | '"' => {
            if escape != quote {
                return None;
            }
            simple(escape)
        }
        'x' | 'u' | 'U' => {
            let digits = match escape {
                'x' => 2,
                'u' => 4,
                _ => 8,
            };
            if rest.len() < digits {
                return None;
            }
            let (hex, tail) = rest.split_at(digits);
            let code = u32::from_str_radix(hex, 16).ok()?;
            Some((char::from_u32(code)?, tail))
        }
        '0'..='7' => {
            let mut code = escape.to_digit(8)?;
            let mut tail = rest;
            for _ in 0..2 {
                let mut iter = tail.chars();
                let d = iter.next()?.to_digit(8)?;
                code = code * 8 + d;
                tail = iter.as_str();
            }
            Some((char::from_u32(code)?, tail))
        }
        _ => None,
    }
}

/// Parse a signed integer with a base-0 prefix (`0x`, `0o`, `0b`, leading
/// `0` for octal) and optional digit-separating underscores.
pub(crate) fn parse_int(text: &str) -> Option<i64> {
    let (negative, rest) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    let magnitude = parse_uint(rest)?;
    if negative {
        if magnitude > i64::MAX as u64 + 1 {
            return None;
        }
        Some((magnitude as i64).wrapping_neg())
    } else {
        i64::try_from(magnitude).ok()
    }
}

/// Parse an unsigned integer with a base-0 prefix and optional underscores.
/// Signs are rejected.
pub(crate) fn parse_uint(text: &str) -> Option<u64> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    if cleaned.is_empty() || cleaned.starts_with(['+', '-']) {
        return None;
    }
    let (radix, digits) = radix_split(&cleaned);
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}

fn radix_split(s: &str) -> (u32, &str) {
    if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (16, rest)
    } else if let Some(rest) = s.strip_prefix("0o").or_else(|| s.strip_prefix("0O")) {
        (8, rest)
    } else if let Some(rest) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        (2, rest)
    } else if s.len() > 1 && s.starts_with('0') {
        // a bare leading zero means octal under base-0 rules
        (8, &s[1..])
    } else {
        (10, s)
    }
}

/// Parse a floating point number: decimal with optional exponent, or a
/// hexadecimal mantissa with a required binary (`p`) exponent.
pub(crate) fn parse_float(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    if cleaned.is_empty() {
        return None;
    }
    let (negative, rest) = match cleaned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, cleaned.strip_prefix('+').unwrap_or(&cleaned)),
    };

    let magnitude = if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
        parse_hex_float(hex)?
    } else {
        // reject alphabetic forms like "inf" that f64::from_str accepts
        if !rest.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
            return None;
        }
        rest.parse::<f64>().ok()?
    };
    Some(if negative { -magnitude } else { magnitude })
}

/// Parse the hex mantissa and binary exponent of a hexadecimal float, the
/// `0x` prefix already stripped.
fn parse_hex_float(s: &str) -> Option<f64> {
    let exp_idx = s.find(['p', 'P'])?;
    let (mantissa, exp) = (&s[..exp_idx], &s[exp_idx + 1..]);
    let exp: i32 = exp.parse().ok()?;

    let (int_part, frac_part) = match mantissa.find('.') {
        Some(idx) => (&mantissa[..idx], &mantissa[idx + 1..]),
        None => (mantissa, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut value = 0f64;
    for c in int_part.chars() {
        value = value * 16.0 + f64::from(c.to_digit(16)?);
    }
    let mut scale = 1.0 / 16.0;
    for c in frac_part.chars() {
        value += f64::from(c.to_digit(16)?) * scale;
        scale /= 16.0;
    }
    Some(value * 2f64.powi(exp))
}
