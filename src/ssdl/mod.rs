//! SSDL (store schema) generation.

mod schema_writer;
mod visitor;

pub use schema_writer::{SsdlSchemaWriter, MAX_LENGTH_SENTINEL, SSDL_ALIAS};
pub use visitor::{association_end_roles, infer_multiplicity, SsdlSerializingVisitor, SELF_ROLE_SUFFIX};

use std::io::Write;

use tracing::debug;

use crate::schema::EntityFrameworkVersion;
use crate::store::{DbDatabaseMetadata, DbDatabaseVisitor, StoreStatistics};
use crate::xml::writer::{new_writer, write_declaration};

/// Write `database` as an SSDL document for `version` into `inner`.
pub fn write_ssdl_to<W: Write>(
    inner: W,
    database: &DbDatabaseMetadata,
    version: EntityFrameworkVersion,
    with_declaration: bool,
) -> anyhow::Result<W> {
    let mut writer = new_writer(inner);
    if with_declaration {
        write_declaration(&mut writer)?;
    }

    let mut schema_writer = SsdlSchemaWriter::new(writer, version);
    SsdlSerializingVisitor::new(&mut schema_writer).visit_database(database)?;

    let stats = StoreStatistics::collect(database);
    debug!(
        version = %version,
        tables = stats.tables,
        associations = stats.foreign_keys,
        "wrote store schema"
    );
    Ok(schema_writer.into_inner())
}

/// Write `database` as a standalone SSDL document.
pub fn write_ssdl(
    database: &DbDatabaseMetadata,
    version: EntityFrameworkVersion,
) -> anyhow::Result<String> {
    let bytes = write_ssdl_to(Vec::new(), database, version, true)?;
    Ok(String::from_utf8(bytes)?)
}
