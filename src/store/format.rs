//! On-disk document formats.
//!
//! Translation documents are stored as `key=value` lines; every other domain
//! is stored as nested TOML tables built from the dot-path keys.

use std::collections::BTreeMap;

use crate::store::codec::{self, ValueTree};
use crate::store::error::FormatError;
use crate::store::types::{ConfigKey, Domain};

/// A serialization strategy for one document.
pub trait DocumentFormat: Send + Sync {
    /// File extension without the leading dot.
    fn extension(&self) -> &'static str;

    /// Encode a flat map, including the generated header.
    fn serialize(&self, key: &ConfigKey, values: &BTreeMap<String, String>) -> Result<String, FormatError>;

    /// Decode a document body into a flat map.
    fn deserialize(&self, content: &str) -> Result<BTreeMap<String, String>, FormatError>;

    /// The values exactly as a write followed by a read would return them.
    fn normalize(&self, values: BTreeMap<String, String>) -> BTreeMap<String, String> {
        values
    }
}

/// Select the format used by `domain`.
pub fn format_for(domain: Domain) -> &'static dyn DocumentFormat {
    match domain {
        Domain::Translation => &LineFormat,
        Domain::Application | Domain::FeatureFlag | Domain::Custom => &TreeFormat,
    }
}

fn header(key: &ConfigKey) -> String {
    let mut out = format!("# {} configuration: {}\n", key.domain(), key.category());
    if let Some(locale) = key.locale() {
        out.push_str(&format!("# Locale: {locale}\n"));
    }
    out.push_str("# Generated by dynconf. Edits take effect after a cache clear.\n");
    out
}

/// `key=value` lines sorted by key.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineFormat;

impl DocumentFormat for LineFormat {
    fn extension(&self) -> &'static str {
        "properties"
    }

    fn serialize(&self, key: &ConfigKey, values: &BTreeMap<String, String>) -> Result<String, FormatError> {
        let mut out = header(key);
        for (k, v) in values {
            out.push_str(&escape(k, true));
            out.push('=');
            out.push_str(&escape(v, false));
            out.push('\n');
        }
        Ok(out)
    }

    fn deserialize(&self, content: &str) -> Result<BTreeMap<String, String>, FormatError> {
        let mut values = BTreeMap::new();
        for line in content.lines() {
            let trimmed = line.trim_start();
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                continue;
            }
            let (raw_key, raw_value) = split_unescaped(trimmed);
            values.insert(
                unescape(trim_key_end(raw_key)),
                unescape(raw_value.trim_start()),
            );
        }
        Ok(values)
    }
}

/// Keys escape all whitespace and a leading comment marker; values escape
/// leading whitespace only. Parsing trims both, so anything unescaped there
/// would not survive a reload.
fn escape(text: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '=' if is_key => out.push_str("\\="),
            '#' | '!' if is_key && i == 0 => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_whitespace() && (is_key || i == 0) => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Trim trailing whitespace from a raw key unless it is escaped.
fn trim_key_end(raw: &str) -> &str {
    let trimmed = raw.trim_end();
    let backslashes = trimmed.chars().rev().take_while(|c| *c == '\\').count();
    if backslashes % 2 == 0 || trimmed.len() == raw.len() {
        return trimmed;
    }
    let escaped_len = raw[trimmed.len()..].chars().next().map_or(0, char::len_utf8);
    &raw[..trimmed.len() + escaped_len]
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

/// Split on the first `=` not preceded by an escaping backslash. A line
/// without a separator is a key with an empty value.
fn split_unescaped(line: &str) -> (&str, &str) {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            '\\' if !escaped => escaped = true,
            '=' if !escaped => return (&line[..i], &line[i + 1..]),
            _ => escaped = false,
        }
    }
    (line, "")
}

/// Nested TOML tables with keys sorted at every level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeFormat;

impl DocumentFormat for TreeFormat {
    fn extension(&self) -> &'static str {
        "toml"
    }

    fn serialize(&self, key: &ConfigKey, values: &BTreeMap<String, String>) -> Result<String, FormatError> {
        let table = match tree_to_toml(codec::unflatten(values)) {
            toml::Value::Table(table) => table,
            _ => return Err(FormatError::NotATable),
        };
        let body = toml::to_string(&table)?;
        Ok(format!("{}\n{}", header(key), body))
    }

    fn deserialize(&self, content: &str) -> Result<BTreeMap<String, String>, FormatError> {
        let table: toml::Table = content.parse()?;
        Ok(codec::flatten(&toml_to_tree(toml::Value::Table(table))))
    }

    /// Keys shadowed by a nested key are dropped, as they would be on disk.
    fn normalize(&self, values: BTreeMap<String, String>) -> BTreeMap<String, String> {
        codec::flatten(&codec::unflatten(&values))
    }
}

fn tree_to_toml(tree: ValueTree) -> toml::Value {
    match tree {
        ValueTree::Leaf(value) => toml::Value::String(value),
        ValueTree::Node(children) => toml::Value::Table(
            children
                .into_iter()
                .map(|(k, v)| (k, tree_to_toml(v)))
                .collect(),
        ),
    }
}

fn toml_to_tree(value: toml::Value) -> ValueTree {
    match value {
        toml::Value::Table(table) => ValueTree::Node(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_tree(v)))
                .collect(),
        ),
        toml::Value::String(s) => ValueTree::Leaf(s),
        other => ValueTree::Leaf(other.to_string()),
    }
}
