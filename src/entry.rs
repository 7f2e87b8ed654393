// Stored entries and value type inference

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

/// Descriptive classification of a stored value, assigned once at insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    Number,
    Boolean,
    String,
    Array,
    Object,
    Null,
}

impl std::fmt::Display for TypeTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypeTag::Number => write!(f, "number"),
            TypeTag::Boolean => write!(f, "boolean"),
            TypeTag::String => write!(f, "string"),
            TypeTag::Array => write!(f, "array"),
            TypeTag::Object => write!(f, "object"),
            TypeTag::Null => write!(f, "null"),
        }
    }
}

/// One record in the store: the raw value plus its inferred tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    #[serde(rename = "type")]
    pub type_tag: TypeTag,
    /// Exactly what the caller supplied, never re-encoded
    pub value: String,
}

impl Entry {
    /// Build an entry from a raw value, inferring its tag
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            type_tag: classify(&value),
            value,
        }
    }
}

/// Infer a tag by parsing `raw` as JSON.
///
/// Anything that does not parse is a `String`. Numbers are checked against
/// the JSON grammar only, so `1e400` is a `Number`, and nesting depth is
/// unbounded.
pub fn classify(raw: &str) -> TypeTag {
    if validate_json(raw).is_err() {
        return TypeTag::String;
    }

    // Valid JSON: the first non-whitespace byte decides the kind
    match raw.trim_start_matches([' ', '\t', '\n', '\r']).as_bytes().first() {
        Some(b'{') => TypeTag::Object,
        Some(b'[') => TypeTag::Array,
        Some(b'"') => TypeTag::String,
        Some(b't' | b'f') => TypeTag::Boolean,
        Some(b'n') => TypeTag::Null,
        _ => TypeTag::Number,
    }
}

/// Check `raw` against the JSON grammar without building a value
fn validate_json(raw: &str) -> serde_json::Result<()> {
    let mut de = serde_json::Deserializer::from_str(raw);
    de.disable_recursion_limit();
    IgnoredAny::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_table() {
        assert_eq!(classify("42"), TypeTag::Number);
        assert_eq!(classify("-3.5e2"), TypeTag::Number);
        assert_eq!(classify("true"), TypeTag::Boolean);
        assert_eq!(classify("false"), TypeTag::Boolean);
        assert_eq!(classify("hello"), TypeTag::String);
        assert_eq!(classify("\"quoted\""), TypeTag::String);
        assert_eq!(classify("[1,2,3]"), TypeTag::Array);
        assert_eq!(classify("{\"x\":1}"), TypeTag::Object);
        assert_eq!(classify("null"), TypeTag::Null);
        assert_eq!(classify("1e400"), TypeTag::Number);
        assert_eq!(classify("123456789012345678901234567890"), TypeTag::Number);

        let deep = format!("{}{}", "[".repeat(200), "]".repeat(200));
        assert_eq!(classify(&deep), TypeTag::Array);
    }

    #[test]
    fn test_classify_has_no_depth_limit() {
        let deep = format!("{}1{}", "[{\"a\":".repeat(5000), "}]".repeat(5000));
        assert_eq!(classify(&deep), TypeTag::Array);

        // Unbalanced nesting is still rejected
        let unbalanced = format!("{}{}", "[".repeat(5000), "]".repeat(4999));
        assert_eq!(classify(&unbalanced), TypeTag::String);
    }

    #[test]
    fn test_classify_unparseable_is_string() {
        assert_eq!(classify(""), TypeTag::String);
        assert_eq!(classify("[1,2"), TypeTag::String);
        assert_eq!(classify("42abc"), TypeTag::String);
        assert_eq!(classify("True"), TypeTag::String);
        assert_eq!(classify("1e"), TypeTag::String);
        assert_eq!(classify("01"), TypeTag::String);
        assert_eq!(classify("nul"), TypeTag::String);
        assert_eq!(classify("[1] [2]"), TypeTag::String);
    }

    #[test]
    fn test_classify_accepts_surrounding_whitespace() {
        assert_eq!(classify("  7\n"), TypeTag::Number);
    }

    #[test]
    fn test_entry_keeps_raw_value() {
        let entry = Entry::new(" [1, 2,3] ");
        assert_eq!(entry.type_tag, TypeTag::Array);
        assert_eq!(entry.value, " [1, 2,3] ");
    }

    #[test]
    fn test_entry_serialized_shape() {
        let json = serde_json::to_string(&Entry::new("42")).unwrap();
        assert_eq!(json, r#"{"type":"number","value":"42"}"#);
    }

    #[test]
    fn test_type_tag_display_matches_serde() {
        for tag in [
            TypeTag::Number,
            TypeTag::Boolean,
            TypeTag::String,
            TypeTag::Array,
            TypeTag::Object,
            TypeTag::Null,
        ] {
            let json = serde_json::to_string(&tag).unwrap();
            assert_eq!(json, format!("\"{}\"", tag));
        }
    }
}
