//! Apple `.strings` files.
//!
//! ```text
//! /* Menu item */
//! "Open" = "Open";
//! "%d files" = "%d files";
//! Bare_Key = "Value";
//! ```

use std::fmt::Write as _;

use indexmap::IndexMap;

use super::{
    ExtractError,
    Extractor,
};
use crate::mapping::StringMapping;

/// Attribute suffixes Interface Builder uses in object-id keys.
const INTERFACE_BUILDER_ATTRIBUTES: [&str; 4] = ["placeholder", "text", "title", "normalTitle"];

#[derive(Debug, Clone, Copy, Default)]
pub struct StringsExtractor;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    /// Quoted text, escapes left in place.
    Quoted(String),
    Bare(String),
    Equals,
    Semicolon,
}

/// Splits `content` into tokens with their line numbers, skipping comments.
fn tokenize(source: &str, content: &str) -> Result<Vec<(Token, usize)>, ExtractError> {
    let mut tokens = Vec::new();
    let mut chars = content.chars().peekable();
    let mut line = 1;

    while let Some(c) = chars.next() {
        match c {
            '\n' => line += 1,
            c if c.is_whitespace() => {}
            '=' => tokens.push((Token::Equals, line)),
            ';' => tokens.push((Token::Semicolon, line)),
            '/' if chars.peek() == Some(&'/') => {
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        line += 1;
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                let start = line;
                chars.next();
                let mut previous = '\0';
                let mut closed = false;
                for skipped in chars.by_ref() {
                    if skipped == '\n' {
                        line += 1;
                    }
                    if previous == '*' && skipped == '/' {
                        closed = true;
                        break;
                    }
                    previous = skipped;
                }
                if !closed {
                    return Err(syntax(source, start, "unterminated comment"));
                }
            }
            '"' => {
                let start = line;
                let mut text = String::new();
                let mut escaped = false;
                let mut closed = false;
                for inner in chars.by_ref() {
                    if inner == '\n' {
                        line += 1;
                    }
                    if !escaped && inner == '"' {
                        closed = true;
                        break;
                    }
                    escaped = !escaped && inner == '\\';
                    text.push(inner);
                }
                if !closed {
                    return Err(syntax(source, start, "unterminated string"));
                }
                tokens.push((Token::Quoted(text), start));
            }
            first => {
                let mut text = String::from(first);
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || matches!(next, '=' | ';' | '"') {
                        break;
                    }
                    text.push(next);
                    chars.next();
                }
                tokens.push((Token::Bare(text), line));
            }
        }
    }

    Ok(tokens)
}

fn syntax(source: &str, line: usize, message: &str) -> ExtractError {
    ExtractError::Syntax { source_name: source.to_string(), line, message: message.to_string() }
}

/// True for keys like `Ab1-c2-D3e.title` that name a storyboard object
/// rather than a string.
fn is_interface_builder_key(key: &str) -> bool {
    let Some((object_id, attribute)) = key.split_once('.') else {
        return false;
    };
    let is_word = |part: &str, len: usize| {
        part.chars().count() == len && part.chars().all(|c| c.is_alphanumeric() || c == '_')
    };
    let parts: Vec<&str> = object_id.split('-').collect();

    matches!(parts.as_slice(), [a, b, c] if is_word(a, 3) && is_word(b, 2) && is_word(c, 3))
        && INTERFACE_BUILDER_ATTRIBUTES.iter().any(|name| attribute.starts_with(name))
}

/// Quotes `text` for a `.strings` literal.
///
/// Mapping values keep line breaks as `\n`/`\r` escapes, so those pass
/// through unchanged. Every other backslash is doubled.
fn encode(text: &str) -> String {
    let mut encoded = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.peek() {
                Some(&(escape @ ('n' | 'r'))) => {
                    chars.next();
                    encoded.push('\\');
                    encoded.push(escape);
                }
                _ => encoded.push_str("\\\\"),
            },
            '"' => encoded.push_str("\\\""),
            '\t' => encoded.push_str("\\t"),
            '\n' => encoded.push_str("\\n"),
            '\r' => encoded.push_str("\\r"),
            other => encoded.push(other),
        }
    }
    encoded
}

impl Extractor for StringsExtractor {
    fn extract_mapping(&self, source: &str, content: &str) -> Result<StringMapping, ExtractError> {
        let mut mapping = StringMapping::new(source);
        let mut tokens = tokenize(source, content)?.into_iter();

        while let Some((token, line)) = tokens.next() {
            let key = match token {
                Token::Quoted(text) | Token::Bare(text) => text,
                Token::Equals | Token::Semicolon => {
                    return Err(syntax(source, line, "expected a key"));
                }
            };

            let value = match tokens.next() {
                Some((Token::Semicolon, _)) => key.clone(),
                Some((Token::Equals, _)) => {
                    let value = match tokens.next() {
                        Some((Token::Quoted(text) | Token::Bare(text), _)) => text,
                        _ => return Err(syntax(source, line, "expected a value after '='")),
                    };
                    if !matches!(tokens.next(), Some((Token::Semicolon, _))) {
                        return Err(syntax(source, line, "expected ';' after value"));
                    }
                    value
                }
                _ => return Err(syntax(source, line, "expected '=' or ';' after key")),
            };

            let key = if is_interface_builder_key(&key) { value.clone() } else { key };
            mapping.add_mapping(&key, Some(&value));
        }

        Ok(mapping)
    }

    fn write_mapping(
        &self,
        mapping: &IndexMap<String, Option<String>>,
    ) -> Result<String, ExtractError> {
        let mut entries: Vec<(&String, &String)> =
            mapping.iter().filter_map(|(key, value)| value.as_ref().map(|value| (key, value))).collect();
        entries.sort_unstable();

        let mut output = String::new();
        for (key, value) in entries {
            let _ = writeln!(output, "\"{}\" = \"{}\";", encode(key), encode(value));
        }
        Ok(output)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[googletest::test]
    fn extracts_quoted_and_bare_entries() {
        let content = r#"
/* Menu title */
"Open" = "Open";
// single line comment
"%d files" = "%d files"; "Inline" = "Two on a line";
Bare_Key = "Bare value";
"Same";
"Escaped \"quote\"" = "Line\nbreak";
"#;

        let mapping = StringsExtractor.extract_mapping("Localizable.strings", content).unwrap();

        expect_that!(mapping.get_string("Open"), some(eq("Open")));
        expect_that!(mapping.get_string("%d files"), some(eq("%d files")));
        expect_that!(mapping.get_string("Inline"), some(eq("Two on a line")));
        expect_that!(mapping.get_string("Bare_Key"), some(eq("Bare value")));
        expect_that!(mapping.get_string("Same"), some(eq("Same")));
        expect_that!(mapping.get_string("Escaped \"quote\""), some(eq(r"Line\nbreak")));
        expect_that!(mapping.len(), eq(6));
    }

    #[googletest::test]
    fn comment_markers_inside_strings_are_text() {
        let content = r#""http://example.com" = "/* not a comment */";"#;

        let mapping = StringsExtractor.extract_mapping("a.strings", content).unwrap();

        expect_that!(mapping.get_string("http://example.com"), some(eq("/* not a comment */")));
    }

    #[googletest::test]
    fn interface_builder_keys_use_their_value() {
        let content = r#""aB3-xY-7kL.title" = "Preferences";"#;

        let mapping = StringsExtractor.extract_mapping("Main.strings", content).unwrap();

        expect_that!(mapping.get_string("Preferences"), some(eq("Preferences")));
        expect_that!(mapping.contains_key("aB3-xY-7kL.title"), eq(false));
    }

    #[rstest]
    #[case::unterminated_string(r#""Open" = "Open;"#, 1)]
    #[case::missing_semicolon("\"Open\" = \"Open\"\n\"Close\" = \"Close\";", 1)]
    #[case::unterminated_comment("\n/* never closed", 2)]
    fn reports_syntax_errors(#[case] content: &str, #[case] expected_line: usize) {
        let result = StringsExtractor.extract_mapping("a.strings", content);

        assert!(
            matches!(result, Err(ExtractError::Syntax { line, .. }) if line == expected_line),
            "{result:?}"
        );
    }

    #[googletest::test]
    fn writes_sorted_escaped_entries() {
        let mut mapping = IndexMap::new();
        mapping.insert("Zoom".to_string(), Some("Zoomer".to_string()));
        mapping.insert("Say \"hi\"".to_string(), Some("Dire \"salut\"".to_string()));
        mapping.insert("Skipped".to_string(), None);

        let output = StringsExtractor.write_mapping(&mapping).unwrap();

        assert_that!(
            output,
            eq("\"Say \\\"hi\\\"\" = \"Dire \\\"salut\\\"\";\n\"Zoom\" = \"Zoomer\";\n")
        );
    }

    #[googletest::test]
    fn written_output_reads_back() {
        let mut mapping = IndexMap::new();
        mapping.insert("Open %@".to_string(), Some("Ouvrir %@".to_string()));
        mapping.insert("Tab\there".to_string(), Some("Line\\nbreak".to_string()));

        let output = StringsExtractor.write_mapping(&mapping).unwrap();
        let read_back = StringsExtractor.extract_mapping("fr.strings", &output).unwrap();

        expect_that!(read_back.get_string("Open %@"), some(eq("Ouvrir %@")));
        expect_that!(read_back.get_string("Tab\there"), some(eq("Line\\nbreak")));
    }

    #[googletest::test]
    fn backslashes_survive_a_write_and_read() {
        let mut mapping = IndexMap::new();
        mapping.insert("Path".to_string(), Some("C:\\".to_string()));
        mapping.insert("Quote \\\"".to_string(), Some("a\\b\\nc".to_string()));

        let output = StringsExtractor.write_mapping(&mapping).unwrap();
        let read_back = StringsExtractor.extract_mapping("fr.strings", &output).unwrap();

        expect_that!(output.contains(r#""Path" = "C:\\";"#), eq(true));
        expect_that!(read_back.get_string("Path"), some(eq("C:\\")));
        expect_that!(read_back.get_string("Quote \\\""), some(eq("a\\b\\nc")));
    }

    #[rstest]
    #[case::real_newline("one\ntwo", r#""k" = "one\ntwo";"#)]
    #[case::real_carriage_return("one\rtwo", r#""k" = "one\rtwo";"#)]
    #[case::newline_escape(r"one\ntwo", r#""k" = "one\ntwo";"#)]
    #[case::lone_backslash(r"one\two", r#""k" = "one\\two";"#)]
    fn encodes_backslashes_and_line_breaks(#[case] value: &str, #[case] expected: &str) {
        let mut mapping = IndexMap::new();
        mapping.insert("k".to_string(), Some(value.to_string()));

        let output = StringsExtractor.write_mapping(&mapping).unwrap();

        assert_that!(output.trim_end(), eq(expected));
    }
}
