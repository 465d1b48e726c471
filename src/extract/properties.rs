use std::fmt::Write as _;

use indexmap::IndexMap;

use super::{
    ExtractError,
    Extractor,
};
use crate::mapping::StringMapping;

/// Java `.properties` files: `key = value`, `key: value` or `key value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertiesExtractor;

impl PropertiesExtractor {
    /// Logical lines with continuations joined, comments and blanks dropped.
    fn logical_lines(content: &str) -> Vec<String> {
        let mut lines = Vec::new();
        let mut pending: Option<String> = None;

        for raw in content.lines() {
            let mut line = match pending.take() {
                Some(mut joined) => {
                    joined.push_str(raw.trim_start());
                    joined
                }
                None => {
                    let trimmed = raw.trim_start();
                    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                        continue;
                    }
                    trimmed.to_string()
                }
            };

            if ends_with_continuation(&line) {
                line.pop();
                pending = Some(line);
            } else {
                lines.push(line);
            }
        }

        if let Some(line) = pending {
            lines.push(line);
        }
        lines
    }
}

/// True when `line` ends in an odd number of backslashes.
fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Splits a logical line at the first unescaped separator.
///
/// Returns `None` for a bare key with nothing after it.
fn split_entry(line: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    let mut key_end = None;

    for (index, c) in line.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '=' || c == ':' || c.is_whitespace() {
            key_end = Some(index);
            break;
        }
    }

    let key_end = key_end?;
    let (key, rest) = line.split_at(key_end);
    let rest = rest.trim_start();
    let value = match rest.strip_prefix(['=', ':']) {
        Some(value) => value.trim_start(),
        None if rest.is_empty() => return None,
        None => rest,
    };
    Some((key, value))
}

/// Drops the backslash from escaped separators and comment markers in a key.
fn unescape_key(key: &str) -> String {
    let mut result = String::with_capacity(key.len());
    let mut chars = key.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped @ ('=' | ':' | ' ' | '#' | '!')) => result.push(escaped),
                Some(other) => {
                    result.push('\\');
                    result.push(other);
                }
                None => result.push('\\'),
            }
        } else {
            result.push(c);
        }
    }
    result
}

impl Extractor for PropertiesExtractor {
    fn extract_mapping(&self, source: &str, content: &str) -> Result<StringMapping, ExtractError> {
        let mut mapping = StringMapping::new(source);

        for line in Self::logical_lines(content) {
            if let Some((key, value)) = split_entry(&line) {
                mapping.add_mapping(&unescape_key(key), Some(value));
            }
        }

        Ok(mapping)
    }

    fn write_mapping(
        &self,
        mapping: &IndexMap<String, Option<String>>,
    ) -> Result<String, ExtractError> {
        let mut output = String::new();
        for (key, value) in mapping {
            if let Some(value) = value {
                let _ = writeln!(output, "{key} = {value}");
            }
        }
        Ok(output)
    }
}
