//! Loading EDMX documents (and standalone SSDL files) into the conceptual,
//! store and mapping models.

use std::path::Path;
use std::sync::Arc;

use encoding_rs::WINDOWS_1252;
use roxmltree::Node;
use tracing::debug;

use crate::edm::{read_csdl, EdmModel};
use crate::error::EdmxError;
use crate::mapping::DbDatabaseMapping;
use crate::msl::read_msl;
use crate::schema::{try_version_for_namespace, EntityFrameworkVersion, NamespaceManager, SchemaKind};
use crate::store::{read_ssdl, DbDatabaseMetadata};
use crate::xml::reader::parse_document;

const CONCEPTUAL_SCHEMA_PATH: &str = "edmx:Runtime/edmx:ConceptualModels/csdl:Schema";
const STORE_SCHEMA_PATH: &str = "edmx:Runtime/edmx:StorageModels/ssdl:Schema";
const MAPPING_PATH: &str = "edmx:Runtime/edmx:Mappings/msl:Mapping";

/// The models read from one document.
#[derive(Debug, Clone)]
pub struct EdmxDocument {
    /// Version of the document's root namespace.
    pub version: EntityFrameworkVersion,
    /// Absent for standalone SSDL input.
    pub conceptual: Option<Arc<EdmModel>>,
    pub store: Arc<DbDatabaseMetadata>,
    /// Absent for standalone SSDL input or an EDMX without a mapping section.
    pub mapping: Option<DbDatabaseMapping>,
}

impl EdmxDocument {
    /// Parse an `Edmx` document or a standalone SSDL `Schema`.
    pub fn parse(text: &str) -> Result<Self, EdmxError> {
        Self::parse_named(text, "<input>")
    }

    /// Read and parse a document from disk.
    pub fn load(path: &Path) -> Result<Self, EdmxError> {
        let text = read_file_with_encoding_fallback(path).map_err(|source| EdmxError::FileReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let text = text.strip_prefix('\u{FEFF}').unwrap_or(&text);
        Self::parse_named(text, &path.display().to_string())
    }

    fn parse_named(text: &str, document: &str) -> Result<Self, EdmxError> {
        let doc = parse_document(text, document)?;
        let root = doc.root_element();
        let namespace = root.tag_name().namespace().unwrap_or_default();

        match try_version_for_namespace(namespace) {
            Some((SchemaKind::Edmx, version)) if root.tag_name().name() == "Edmx" => {
                Self::from_edmx(root, version)
            }
            Some((SchemaKind::Ssdl, version)) => {
                let store = read_ssdl(root)?;
                debug!(document, version = %version, "loaded standalone store schema");
                Ok(Self {
                    version,
                    conceptual: None,
                    store: Arc::new(store),
                    mapping: None,
                })
            }
            _ => Err(EdmxError::invalid_schema(format!(
                "'{}' in namespace '{}' is neither an EDMX nor an SSDL document",
                root.tag_name().name(),
                namespace
            ))),
        }
    }

    fn from_edmx(root: Node<'_, '_>, version: EntityFrameworkVersion) -> Result<Self, EdmxError> {
        let namespaces = NamespaceManager::for_version(version);

        let store = namespaces
            .select_single_node(root, STORE_SCHEMA_PATH)
            .ok_or_else(|| {
                EdmxError::invalid_schema(format!(
                    "EDMX {} document has no storage model",
                    version
                ))
            })
            .and_then(read_ssdl)
            .map(Arc::new)?;

        let conceptual = namespaces
            .select_single_node(root, CONCEPTUAL_SCHEMA_PATH)
            .map(read_csdl)
            .transpose()?
            .map(Arc::new);

        let mapping = match (namespaces.select_single_node(root, MAPPING_PATH), &conceptual) {
            (Some(node), Some(model)) => Some(read_msl(node, Arc::clone(model), Arc::clone(&store))?),
            (Some(_), None) => {
                return Err(EdmxError::invalid_schema(
                    "EDMX document has a mapping section but no conceptual model",
                ))
            }
            (None, _) => None,
        };

        debug!(
            version = %version,
            conceptual = conceptual.is_some(),
            mapping = mapping.is_some(),
            "loaded EDMX document"
        );

        Ok(Self {
            version,
            conceptual,
            store,
            mapping,
        })
    }
}

/// Read a file as a string, trying UTF-8 first, then Windows-1252.
fn read_file_with_encoding_fallback(path: &Path) -> std::io::Result<String> {
    let bytes = std::fs::read(path)?;

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(err) => {
            let bytes = err.into_bytes();
            let (decoded, _, had_errors) = WINDOWS_1252.decode(&bytes);
            if had_errors {
                Err(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    "File contains invalid characters",
                ))
            } else {
                Ok(decoded.into_owned())
            }
        }
    }
}
