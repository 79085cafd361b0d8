//! MSL mapping documents: reading and writing.

mod reader;
mod writer;

pub use reader::read_msl;
pub use writer::{MslWriter, MAPPING_SPACE};

use std::io::Write;

use tracing::debug;

use crate::mapping::{walk_mapping, DbDatabaseMapping, MappingNode};
use crate::schema::EntityFrameworkVersion;
use crate::xml::writer::{new_writer, write_declaration};

/// Write `mapping` as an MSL document for `version` into `inner`.
pub fn write_msl_to<W: Write>(
    inner: W,
    mapping: &DbDatabaseMapping,
    version: EntityFrameworkVersion,
    with_declaration: bool,
) -> anyhow::Result<W> {
    let mut writer = new_writer(inner);
    if with_declaration {
        write_declaration(&mut writer)?;
    }
    let mut msl = MslWriter::new(writer, mapping, version);
    walk_mapping(&mut msl, MappingNode::from(mapping))?;
    debug!(version = %version, "wrote mapping");
    Ok(msl.into_inner())
}

pub fn write_msl(mapping: &DbDatabaseMapping, version: EntityFrameworkVersion) -> anyhow::Result<String> {
    let bytes = write_msl_to(Vec::new(), mapping, version, true)?;
    Ok(String::from_utf8(bytes)?)
}
