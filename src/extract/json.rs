//! Nested JSON resources, as used by web front ends.
//!
//! `{"menu": {"open": "Open"}}` maps key `menu.open` to `Open`.

use indexmap::IndexMap;
use serde_json::{
    Map,
    Value,
};

use super::{
    ExtractError,
    Extractor,
};
use crate::mapping::StringMapping;

/// Separator between nested object keys.
const KEY_SEPARATOR: &str = ".";

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonExtractor;

/// Flattens nested JSON into dotted keys.
///
/// Array elements are keyed as `parent[index]`. Non-string leaves are kept
/// as their JSON text.
#[must_use]
pub fn flatten_json(json: &Value, separator: &str, prefix: Option<&str>) -> IndexMap<String, String> {
    let mut result = IndexMap::new();
    flatten_json_value(json, separator, prefix, &mut result);
    result
}

fn flatten_json_value(
    json: &Value,
    separator: &str,
    prefix: Option<&str>,
    result: &mut IndexMap<String, String>,
) {
    match json {
        Value::Object(map) => {
            for (key, value) in map {
                let full_key = prefix.map_or_else(|| key.clone(), |p| format!("{p}{separator}{key}"));
                flatten_json_value(value, separator, Some(&full_key), result);
            }
        }
        Value::Array(arr) => {
            for (index, value) in arr.iter().enumerate() {
                let full_key = prefix.map_or_else(|| format!("[{index}]"), |p| format!("{p}[{index}]"));
                flatten_json_value(value, separator, Some(&full_key), result);
            }
        }
        Value::String(s) => {
            if let Some(key) = prefix {
                result.insert(key.to_string(), s.clone());
            }
        }
        _ => {
            if let Some(key) = prefix {
                result.insert(key.to_string(), json.to_string());
            }
        }
    }
}

/// Inserts `value` at the dotted `key` path, creating objects on the way.
///
/// Returns false when a path segment is already a leaf.
fn insert_nested(root: &mut Map<String, Value>, key: &str, value: &str) -> bool {
    let mut segments = key.split(KEY_SEPARATOR).peekable();
    let mut current = root;

    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            if current.contains_key(segment) {
                return false;
            }
            current.insert(segment.to_string(), Value::String(value.to_string()));
            return true;
        }

        let child = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        let Value::Object(child) = child else {
            return false;
        };
        current = child;
    }

    false
}

impl Extractor for JsonExtractor {
    fn extract_mapping(&self, source: &str, content: &str) -> Result<StringMapping, ExtractError> {
        let json: Value = serde_json::from_str(content)
            .map_err(|err| ExtractError::Json { source_name: source.to_string(), source: err })?;

        let mut mapping = StringMapping::new(source);
        for (key, value) in flatten_json(&json, KEY_SEPARATOR, None) {
            mapping.add_mapping(&key, Some(&value));
        }
        Ok(mapping)
    }

    fn write_mapping(
        &self,
        mapping: &IndexMap<String, Option<String>>,
    ) -> Result<String, ExtractError> {
        let mut root = Map::new();
        for (key, value) in mapping {
            let Some(value) = value else {
                continue;
            };
            if !insert_nested(&mut root, key, value) {
                tracing::warn!(key = %key, "Key collides with another nested key; skipped");
            }
        }

        let mut output = serde_json::to_string_pretty(&Value::Object(root))
            .map_err(|err| ExtractError::Render(err.to_string()))?;
        output.push('\n');
        Ok(output)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use serde_json::json;

    use super::*;

    #[googletest::test]
    fn flatten_json_nested() {
        let json = json!({
            "common": {
                "hello": "Hello",
                "nested": { "deep": "Deep value" }
            },
            "count": 3
        });

        let result = flatten_json(&json, ".", None);

        expect_that!(result.get("common.hello"), some(eq(&"Hello".to_string())));
        expect_that!(result.get("common.nested.deep"), some(eq(&"Deep value".to_string())));
        expect_that!(result.get("count"), some(eq(&"3".to_string())));
    }

    #[googletest::test]
    fn flatten_json_with_array() {
        let json = json!({ "items": ["first", { "name": "second" }] });

        let result = flatten_json(&json, ".", None);

        expect_that!(result.get("items[0]"), some(eq(&"first".to_string())));
        expect_that!(result.get("items[1].name"), some(eq(&"second".to_string())));
    }

    #[googletest::test]
    fn extract_mapping_flattens_keys() {
        let content = r#"{"menu": {"open": "Open %s", "close": "Close"}}"#;

        let mapping = JsonExtractor.extract_mapping("en.json", content).unwrap();

        expect_that!(mapping.get_string("menu.open"), some(eq("Open %s")));
        expect_that!(mapping.get_string("menu.close"), some(eq("Close")));
        expect_that!(mapping.get_filenames("menu.open").to_vec(), elements_are![eq("en.json")]);
    }

    #[googletest::test]
    fn extract_mapping_rejects_malformed_json() {
        let result = JsonExtractor.extract_mapping("en.json", "{");

        assert!(matches!(result, Err(ExtractError::Json { .. })));
    }

    #[googletest::test]
    fn write_mapping_nests_keys() {
        let mut mapping = IndexMap::new();
        mapping.insert("menu.open".to_string(), Some("Ouvrir".to_string()));
        mapping.insert("menu.close".to_string(), Some("Fermer".to_string()));
        mapping.insert("title".to_string(), None);
        mapping.insert("menu.open.extra".to_string(), Some("collides".to_string()));

        let output = JsonExtractor.write_mapping(&mapping).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();

        assert_that!(value, eq(&json!({ "menu": { "open": "Ouvrir", "close": "Fermer" } })));
    }
}
