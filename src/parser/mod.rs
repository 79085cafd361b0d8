//! Identifier parsing

pub mod identifier_utils;
pub mod multipart_identifier;

pub use identifier_utils::{normalize_identifier, quote_identifier, quote_qualified};
pub use multipart_identifier::{
    parse_multipart_identifier, MultipartIdentifierOptions, MultipartName, MAX_PARTS,
};
