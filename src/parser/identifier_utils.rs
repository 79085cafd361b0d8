//! Identifier quoting helpers.
//!
//! Splitting names goes through the multipart identifier parser; these helpers
//! cover the other direction (producing bracket-quoted names for generated
//! query text) and light normalization of names found in documents.
//!
//! # Examples
//!
//! ```ignore
//! use crate::parser::identifier_utils::*;
//!
//! assert_eq!(normalize_identifier("[People]"), "People");
//! assert_eq!(quote_identifier("Odd]Name"), "[Odd]]Name]");
//! assert_eq!(quote_qualified(&["ShopStoreContainer", "People"]), "[ShopStoreContainer].[People]");
//! ```

use super::multipart_identifier::{
    parse_multipart_identifier, MultipartIdentifierOptions, MultipartName,
};

/// Trim whitespace, then any surrounding `[`, `]` or `"`.
pub fn normalize_identifier(ident: &str) -> String {
    ident
        .trim()
        .trim_matches(|c| c == '[' || c == ']' || c == '"')
        .to_string()
}

/// Bracket-quote a single identifier, doubling any `]` inside it.
pub fn quote_identifier(ident: &str) -> String {
    format!("[{}]", ident.replace(']', "]]"))
}

/// Bracket-quote each part and join them with `.`.
pub fn quote_qualified(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| quote_identifier(p))
        .collect::<Vec<_>>()
        .join(".")
}

/// Splits a possibly quoted `schema.name` into its two parts, defaulting the
/// schema when only one part is present. Returns `None` for names the
/// multipart parser rejects.
///
/// ```ignore
/// assert_eq!(split_qualified_name("[stock].[Levels]", "dbo"), Some(("stock".into(), "Levels".into())));
/// assert_eq!(split_qualified_name("Orders", "sales"), Some(("sales".into(), "Orders".into())));
/// ```
pub fn split_qualified_name(name: &str, default_schema: &str) -> Option<(String, String)> {
    let name = MultipartName::parse(name).ok()?;
    let table = name.table()?.to_string();
    let schema = name
        .schema()
        .filter(|s| !s.is_empty())
        .unwrap_or(default_schema)
        .to_string();
    Some((schema, table))
}

/// Re-quote a dotted name so every part is bracketed: `dbo.T` becomes `[dbo].[T]`.
pub fn normalize_object_name(name: &str) -> Option<String> {
    let parts =
        parse_multipart_identifier(name, &MultipartIdentifierOptions::sql_server()).ok()?;
    let refs: Vec<&str> = parts.iter().map(String::as_str).collect();
    Some(quote_qualified(&refs))
}
