//! Schema versions and namespace tables.

mod namespaces;
mod version;

pub use namespaces::{
    csdl_namespace, edmx_namespace, msl_namespace, namespace_for, ssdl_namespace,
    try_version_for_namespace, version_for_namespace_or_oldest, NamespaceManager, SchemaKind,
    ANNOTATION_NAMESPACE, CODE_GENERATION_NAMESPACE, CUSTOM_ANNOTATION_NAMESPACE,
    ENTITY_STORE_SCHEMA_GENERATOR_NAMESPACE,
};
pub use version::{EntityFrameworkVersion, VersionNumber};
