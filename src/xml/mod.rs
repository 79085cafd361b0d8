//! XML reading and writing helpers.

pub(crate) mod reader;
pub(crate) mod writer;
