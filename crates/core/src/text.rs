//! Converting memory values and function results to prompt text.

use crate::tokenizer::Tokenizer;
use serde_json::Value;

/// Render a value as prompt text.
///
/// Strings are used verbatim and `null` is empty. Structured values are
/// serialized both as JSON and as YAML and the encoding that costs fewer
/// tokens wins.
pub fn to_text(tokenizer: &dyn Tokenizer, value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(_) | Value::Object(_) => {
            let as_json = serde_json::to_string(value).unwrap_or_default();
            match serde_yaml::to_string(value) {
                Ok(as_yaml) => {
                    let as_yaml = as_yaml.trim_end().to_string();
                    if tokenizer.count(&as_yaml) < tokenizer.count(&as_json) {
                        as_yaml
                    } else {
                        as_json
                    }
                }
                Err(_) => as_json,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Chars;

    impl Tokenizer for Chars {
        fn encode(&self, text: &str) -> Vec<u32> {
            text.chars().map(u32::from).collect()
        }
        fn decode(&self, tokens: &[u32]) -> String {
            tokens.iter().filter_map(|t| char::from_u32(*t)).collect()
        }
    }

    #[test]
    fn scalars_render_plainly() {
        assert_eq!(to_text(&Chars, &Value::Null), "");
        assert_eq!(to_text(&Chars, &json!("hi")), "hi");
        assert_eq!(to_text(&Chars, &json!(42)), "42");
        assert_eq!(to_text(&Chars, &json!(true)), "true");
    }

    #[test]
    fn structured_values_pick_cheaper_encoding() {
        // JSON `{"a":1}` is 7 chars, YAML `a: 1` is 4.
        assert_eq!(to_text(&Chars, &json!({"a": 1})), "a: 1");
        // JSON `[]` is 2 chars, YAML `[]` ties and JSON is kept.
        assert_eq!(to_text(&Chars, &json!([])), "[]");
    }
}
