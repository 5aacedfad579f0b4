//! `serde_json::Value` as a host representation.

use super::DynamicValue;
use serde_json::Value as JsonValue;

impl DynamicValue for JsonValue {
    fn is_null(&self) -> bool {
        JsonValue::is_null(self)
    }

    fn is_array_like(&self) -> bool {
        JsonValue::is_array(self)
    }

    fn is_dictionary_like(&self) -> bool {
        JsonValue::is_object(self)
    }

    fn field(&self, name: &str) -> Option<&dyn DynamicValue> {
        self.as_object()
            .and_then(|obj| obj.get(name))
            .map(|v| v as &dyn DynamicValue)
    }

    fn size(&self) -> Option<usize> {
        self.as_array().map(Vec::len)
    }

    fn element(&self, index: usize) -> Option<&dyn DynamicValue> {
        self.as_array()
            .and_then(|items| items.get(index))
            .map(|v| v as &dyn DynamicValue)
    }

    fn as_bool(&self) -> Option<bool> {
        JsonValue::as_bool(self)
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            JsonValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            JsonValue::Number(n) if n.is_f64() => n.as_f64(),
            _ => None,
        }
    }

    fn as_str(&self) -> Option<&str> {
        JsonValue::as_str(self)
    }

    fn describe(&self) -> String {
        let text = self.to_string();
        if text.len() > 64 {
            let mut cut = 61;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            format!("{}...", &text[..cut])
        } else {
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_capabilities() {
        let doc = json!({"id": 1, "score": 2.5, "tags": ["x"], "gone": null});
        let dynamic: &dyn DynamicValue = &doc;
        assert!(dynamic.is_dictionary_like());
        assert_eq!(dynamic.field("id").and_then(|v| v.as_i64()), Some(1));
        assert_eq!(dynamic.field("id").and_then(|v| v.as_f64()), None);
        assert_eq!(dynamic.field("score").and_then(|v| v.as_f64()), Some(2.5));
        assert!(dynamic.field("gone").is_some_and(|v| v.is_null()));
        assert!(dynamic.field("missing").is_none());
        assert_eq!(dynamic.field("tags").and_then(|v| v.size()), Some(1));
        assert!(dynamic.as_row().is_none());
    }
}
