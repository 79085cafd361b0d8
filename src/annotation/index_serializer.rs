//! Text form of index annotations.
//!
//! Each index is rendered as `{ Name: IX, Order: 1, IsClustered: True, IsUnique: False }`
//! with only configured properties present and no separator between groups.
//! Commas and opening braces inside names are escaped with a backslash.

use std::sync::LazyLock;

use regex::Regex;

use super::index::{bool_text, IndexAnnotation, IndexAttribute};
use super::{AnnotationSerializer, AnnotationValue};
use crate::error::EdmxError;

static PROPERTY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(Name|Order|IsClustered|IsUnique):(.*)$").expect("valid index property pattern")
});

/// Serializer for the `Index` custom annotation.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndexAnnotationSerializer;

impl IndexAnnotationSerializer {
    pub fn serialize_annotation(annotation: &IndexAnnotation) -> String {
        let mut out = String::new();
        for index in annotation.indexes() {
            out.push_str(&serialize_index(index));
        }
        out
    }

    pub fn deserialize_annotation(value: &str) -> Result<IndexAnnotation, EdmxError> {
        let groups = split_indexes(value)?;
        let mut indexes = Vec::with_capacity(groups.len());
        for group in groups {
            indexes.push(parse_index(group, value)?);
        }
        IndexAnnotation::from_indexes(indexes)
    }
}

impl AnnotationSerializer for IndexAnnotationSerializer {
    fn serialize(&self, _name: &str, value: &AnnotationValue) -> Result<String, EdmxError> {
        match value {
            AnnotationValue::Index(annotation) => Ok(Self::serialize_annotation(annotation)),
            AnnotationValue::Text(text) => Ok(text.clone()),
        }
    }

    fn deserialize(&self, _name: &str, value: &str) -> Result<AnnotationValue, EdmxError> {
        Self::deserialize_annotation(value).map(AnnotationValue::Index)
    }
}

fn serialize_index(index: &IndexAttribute) -> String {
    let mut parts = Vec::new();
    if let Some(name) = index.name().filter(|n| !n.trim().is_empty()) {
        parts.push(format!("Name: {}", escape_name(name)));
    }
    if let Some(order) = index.order() {
        parts.push(format!("Order: {order}"));
    }
    if let Some(is_clustered) = index.is_clustered() {
        parts.push(format!("IsClustered: {}", bool_text(is_clustered)));
    }
    if let Some(is_unique) = index.is_unique() {
        parts.push(format!("IsUnique: {}", bool_text(is_unique)));
    }

    if parts.is_empty() {
        "{ }".to_string()
    } else {
        format!("{{ {} }}", parts.join(", "))
    }
}

fn escape_name(name: &str) -> String {
    name.replace(',', "\\,").replace('{', "\\{")
}

fn unescape_name(name: &str) -> String {
    name.replace("\\,", ",").replace("\\{", "{")
}

fn format_error(value: &str) -> EdmxError {
    EdmxError::IndexAnnotationFormat {
        value: value.to_string(),
    }
}

/// Split the annotation text into group bodies (without the braces).
///
/// Groups end at an unescaped `}` that is followed by optional whitespace and
/// the next `{`, or by the end of the text.
fn split_indexes(value: &str) -> Result<Vec<&str>, EdmxError> {
    let trimmed = value.trim();
    if !trimmed.starts_with('{') || !trimmed.ends_with('}') || trimmed.len() < 2 {
        return Err(format_error(value));
    }

    let bytes = trimmed.as_bytes();
    let mut groups = Vec::new();
    let mut start = 1;
    let mut i = 1;
    while i < bytes.len() {
        if bytes[i] == b'}' && bytes[i - 1] != b'\\' {
            let mut next = i + 1;
            while next < bytes.len() && bytes[next].is_ascii_whitespace() {
                next += 1;
            }
            if next == bytes.len() {
                groups.push(&trimmed[start..i]);
                return Ok(groups);
            }
            if bytes[next] == b'{' {
                groups.push(&trimmed[start..i]);
                start = next + 1;
                i = next + 1;
                continue;
            }
        }
        i += 1;
    }
    Err(format_error(value))
}

/// Split a group body on commas not preceded by a backslash.
fn split_properties(body: &str) -> Vec<&str> {
    let bytes = body.as_bytes();
    let mut parts = Vec::new();
    let mut start = 0;
    for i in 0..bytes.len() {
        if bytes[i] == b',' && (i == 0 || bytes[i - 1] != b'\\') {
            parts.push(&body[start..i]);
            start = i + 1;
        }
    }
    parts.push(&body[start..]);
    parts
}

fn parse_index(body: &str, value: &str) -> Result<IndexAttribute, EdmxError> {
    let mut index = IndexAttribute::new();
    if body.trim().is_empty() {
        return Ok(index);
    }

    for part in split_properties(body) {
        let caps = PROPERTY_RE
            .captures(part.trim())
            .ok_or_else(|| format_error(value))?;
        let raw = caps[2].trim();
        match &caps[1] {
            "Name" => {
                if raw.is_empty() || index.name().is_some() {
                    return Err(format_error(value));
                }
                index.set_name(unescape_name(raw));
            }
            "Order" => {
                let order = raw.parse::<i32>().map_err(|_| format_error(value))?;
                if order < 0 || index.order().is_some() {
                    return Err(format_error(value));
                }
                index.set_order(order);
            }
            "IsClustered" => {
                let flag = parse_bool(raw).ok_or_else(|| format_error(value))?;
                if index.is_clustered().is_some() {
                    return Err(format_error(value));
                }
                index.set_clustered(flag);
            }
            "IsUnique" => {
                let flag = parse_bool(raw).ok_or_else(|| format_error(value))?;
                if index.is_unique().is_some() {
                    return Err(format_error(value));
                }
                index.set_unique(flag);
            }
            _ => return Err(format_error(value)),
        }
    }
    Ok(index)
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}
