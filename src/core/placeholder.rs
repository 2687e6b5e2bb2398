// src/core/placeholder.rs

//! # Placeholder Expander
//!
//! Replaces `{{key}}` (escaped) and `{{!key}}` (raw) tokens in command and
//! directory templates. Expansion is a single pass: text produced by a
//! substitution is never scanned again, and unknown keys stay verbatim.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::fmt::Write;

lazy_static! {
    // `{{key}}` or `{{!key}}`; group 1 is the raw marker, group 2 the key.
    static ref PLACEHOLDER_RE: Regex =
        Regex::new(r"\{\{(!?)([^{}]+)\}\}").expect("placeholder regex is valid");
}

/// Expands a single `key` in `template`.
///
/// An empty `value` leaves the template unchanged for that key.
pub fn expand(template: &str, key: &str, value: &str) -> String {
    expand_all(template, &[(key, value)])
}

/// Expands every known key in one pass.
///
/// `pairs` is ordered by precedence: the first pair with a non-empty value for a key wins.
pub fn expand_all(template: &str, pairs: &[(&str, &str)]) -> String {
    if !template.contains("{{") {
        return template.to_string();
    }

    PLACEHOLDER_RE
        .replace_all(template, |caps: &Captures<'_>| {
            let whole = caps.get(0).map_or("", |m| m.as_str());
            let raw = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
            let key = caps.get(2).map_or("", |m| m.as_str());

            match lookup(pairs, key) {
                Some(value) if raw => value.to_string(),
                Some(value) => escape(value),
                None => whole.to_string(),
            }
        })
        .into_owned()
}

fn lookup<'a>(pairs: &[(&str, &'a str)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, v)| *k == key && !v.is_empty())
        .map(|(_, v)| *v)
}

/// Backslash-escapes a value so it can sit inside a double-quoted shell string.
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0b' => out.push_str("\\v"),
            '\x0c' => out.push_str("\\f"),
            c if c.is_control() => {
                let _ = write!(out, "\\x{:02x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out
}
