//! HTML entity decoding for names coming back from the help-center API.
//!
//! The destination escapes collection names and article titles (`R&D` comes
//! back as `R&amp;D`, `Équipe` as `&Eacute;quipe`), so listings are decoded
//! before being matched against source names. Decoding follows the HTML5
//! rules, including references written without the trailing semicolon
//! (`&#39`, `&amp`) where browsers accept them.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::OnceLock;

const REPLACEMENT: char = '\u{fffd}';

/// Named entities that HTML5 also recognises without the closing `;`.
const LEGACY_ENTITIES: &[&str] = &[
    "AElig", "AMP", "Aacute", "Acirc", "Agrave", "Aring", "Atilde", "Auml", "COPY", "Ccedil",
    "ETH", "Eacute", "Ecirc", "Egrave", "Euml", "GT", "Iacute", "Icirc", "Igrave", "Iuml", "LT",
    "Ntilde", "Oacute", "Ocirc", "Ograve", "Oslash", "Otilde", "Ouml", "QUOT", "REG", "THORN",
    "Uacute", "Ucirc", "Ugrave", "Uuml", "Yacute", "aacute", "acirc", "acute", "aelig", "agrave",
    "amp", "aring", "atilde", "auml", "brvbar", "ccedil", "cedil", "cent", "copy", "curren",
    "deg", "divide", "eacute", "ecirc", "egrave", "eth", "euml", "frac12", "frac14", "frac34",
    "gt", "iacute", "icirc", "iexcl", "igrave", "iquest", "iuml", "laquo", "lt", "macr", "micro",
    "middot", "nbsp", "not", "ntilde", "oacute", "ocirc", "ograve", "ordf", "ordm", "oslash",
    "otilde", "ouml", "para", "plusmn", "pound", "quot", "raquo", "reg", "sect", "shy", "sup1",
    "sup2", "sup3", "szlig", "thorn", "times", "uacute", "ucirc", "ugrave", "uml", "uuml",
    "yacute", "yen", "yuml",
];

fn entity_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"&(#[0-9]+;?|#[xX][0-9a-fA-F]+;?|[^\t\n\x0C <&#;]{1,32};?)")
            .expect("entity pattern is a valid regex")
    })
}

/// Entity name (without `&` and `;`) to its replacement text.
fn entity_table() -> &'static HashMap<&'static str, &'static str> {
    static TABLE: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    TABLE.get_or_init(|| {
        entities::ENTITIES
            .iter()
            .filter_map(|e| {
                let name = e.entity.strip_prefix('&')?.strip_suffix(';')?;
                Some((name, e.characters))
            })
            .collect()
    })
}

fn legacy_entity(name: &str) -> Option<&'static str> {
    if LEGACY_ENTITIES.contains(&name) {
        entity_table().get(name).copied()
    } else {
        None
    }
}

// Windows-1252 characters that numeric references in the C1 range stand for.
fn c1_replacement(code: u32) -> Option<char> {
    let c = match code {
        0x00 => REPLACEMENT,
        0x0d => '\r',
        0x80 => '\u{20ac}',
        0x82 => '\u{201a}',
        0x83 => '\u{0192}',
        0x84 => '\u{201e}',
        0x85 => '\u{2026}',
        0x86 => '\u{2020}',
        0x87 => '\u{2021}',
        0x88 => '\u{02c6}',
        0x89 => '\u{2030}',
        0x8a => '\u{0160}',
        0x8b => '\u{2039}',
        0x8c => '\u{0152}',
        0x8e => '\u{017d}',
        0x91 => '\u{2018}',
        0x92 => '\u{2019}',
        0x93 => '\u{201c}',
        0x94 => '\u{201d}',
        0x95 => '\u{2022}',
        0x96 => '\u{2013}',
        0x97 => '\u{2014}',
        0x98 => '\u{02dc}',
        0x99 => '\u{2122}',
        0x9a => '\u{0161}',
        0x9b => '\u{203a}',
        0x9c => '\u{0153}',
        0x9e => '\u{017e}',
        0x9f => '\u{0178}',
        0x81 | 0x8d | 0x8f | 0x90 | 0x9d => return char::from_u32(code),
        _ => return None,
    };
    Some(c)
}

fn is_dropped_codepoint(code: u32) -> bool {
    matches!(code, 0x01..=0x08 | 0x0b | 0x0e..=0x1f | 0x7f..=0x9f | 0xfdd0..=0xfdef)
        || (code & 0xfffe) == 0xfffe
}

fn decode_numeric(digits: &str, radix: u32) -> String {
    let digits = digits.trim_end_matches(';');
    let Ok(code) = u32::from_str_radix(digits, radix) else {
        // Too long to fit is necessarily out of range.
        return REPLACEMENT.to_string();
    };
    if let Some(c) = c1_replacement(code) {
        return c.to_string();
    }
    if (0xd800..=0xdfff).contains(&code) || code > 0x10ffff {
        return REPLACEMENT.to_string();
    }
    if is_dropped_codepoint(code) {
        return String::new();
    }
    char::from_u32(code).map(String::from).unwrap_or_default()
}

fn decode_named(reference: &str) -> String {
    let exact = match reference.strip_suffix(';') {
        Some(name) => entity_table().get(name).copied(),
        None => legacy_entity(reference),
    };
    if let Some(text) = exact {
        return text.to_string();
    }

    // Longest legacy entity that prefixes the reference wins; the rest is kept.
    let bounds: Vec<usize> = reference.char_indices().map(|(i, _)| i).collect();
    for &end in bounds.iter().skip(2).rev() {
        if let Some(text) = legacy_entity(&reference[..end]) {
            return format!("{text}{}", &reference[end..]);
        }
    }
    format!("&{reference}")
}

/// Decode HTML character references. Unknown entities are left untouched.
pub fn unescape(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    entity_pattern()
        .replace_all(input, |caps: &Captures| {
            let reference = &caps[1];
            if let Some(hex) = reference
                .strip_prefix("#x")
                .or_else(|| reference.strip_prefix("#X"))
            {
                decode_numeric(hex, 16)
            } else if let Some(dec) = reference.strip_prefix('#') {
                decode_numeric(dec, 10)
            } else {
                decode_named(reference)
            }
        })
        .into_owned()
}
