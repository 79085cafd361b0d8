//! Helpers for reading EDMX family documents with roxmltree.

use roxmltree::Node;

use crate::error::EdmxError;

/// Child elements with the given local name, in the node's namespace.
pub(crate) fn children_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    local_name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    let namespace = node.tag_name().namespace();
    node.children().filter(move |c| {
        c.is_element() && c.tag_name().name() == local_name && c.tag_name().namespace() == namespace
    })
}

pub(crate) fn first_child_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    local_name: &'a str,
) -> Option<Node<'a, 'input>> {
    children_named(node, local_name).next()
}

/// Attribute value, or an `InvalidSchema` error naming the element.
pub(crate) fn required_attribute<'a>(node: Node<'a, '_>, name: &str) -> Result<&'a str, EdmxError> {
    node.attribute(name).ok_or_else(|| {
        EdmxError::invalid_schema(format!(
            "element '{}' is missing the '{}' attribute",
            node.tag_name().name(),
            name
        ))
    })
}

/// Parse an XML schema boolean attribute (`true`/`false`/`1`/`0`).
pub(crate) fn bool_attribute(node: Node<'_, '_>, name: &str) -> Result<Option<bool>, EdmxError> {
    match node.attribute(name) {
        None => Ok(None),
        Some(value) => parse_xml_bool(value).map(Some).ok_or_else(|| {
            EdmxError::invalid_schema(format!(
                "attribute '{}' on '{}' is not a boolean: '{}'",
                name,
                node.tag_name().name(),
                value
            ))
        }),
    }
}

pub(crate) fn parse_xml_bool(value: &str) -> Option<bool> {
    match value.trim() {
        v if v.eq_ignore_ascii_case("true") || v == "1" => Some(true),
        v if v.eq_ignore_ascii_case("false") || v == "0" => Some(false),
        _ => None,
    }
}

/// Parse a numeric attribute.
pub(crate) fn number_attribute<T: std::str::FromStr>(
    node: Node<'_, '_>,
    name: &str,
) -> Result<Option<T>, EdmxError> {
    match node.attribute(name) {
        None => Ok(None),
        Some(value) => value.trim().parse().map(Some).map_err(|_| {
            EdmxError::invalid_schema(format!(
                "attribute '{}' on '{}' is not a number: '{}'",
                name,
                node.tag_name().name(),
                value
            ))
        }),
    }
}

/// Strip an alias or namespace qualifier: `Self.Customer` -> `Customer`.
pub(crate) fn unqualified(name: &str) -> &str {
    name.rsplit_once('.').map(|(_, n)| n).unwrap_or(name)
}

/// Resolve `Alias.Name` against a schema alias, leaving other names as-is.
pub(crate) fn resolve_alias(name: &str, alias: Option<&str>, namespace: &str) -> String {
    match (alias, name.rsplit_once('.')) {
        (Some(alias), Some((qualifier, local))) if qualifier == alias => {
            format!("{}.{}", namespace, local)
        }
        _ => name.to_string(),
    }
}

/// Parse a document, tagging errors with a short description of its origin.
pub(crate) fn parse_document<'input>(
    text: &'input str,
    document: &str,
) -> Result<roxmltree::Document<'input>, EdmxError> {
    roxmltree::Document::parse(text).map_err(|source| EdmxError::XmlParseError {
        document: document.to_string(),
        source,
    })
}
