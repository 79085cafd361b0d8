//! XML namespaces of the EDMX family of documents.
//!
//! The CSDL, SSDL, MSL and EDMX vocabularies each have one namespace per
//! schema version. A handful of auxiliary namespaces are version independent.

use roxmltree::Node;

use super::version::EntityFrameworkVersion;

pub const ENTITY_STORE_SCHEMA_GENERATOR_NAMESPACE: &str =
    "http://schemas.microsoft.com/ado/2007/12/edm/EntityStoreSchemaGenerator";
pub const ANNOTATION_NAMESPACE: &str = "http://schemas.microsoft.com/ado/2009/02/edm/annotation";
pub const CODE_GENERATION_NAMESPACE: &str =
    "http://schemas.microsoft.com/ado/2006/04/codegeneration";
pub const CUSTOM_ANNOTATION_NAMESPACE: &str =
    "http://schemas.microsoft.com/ado/2013/11/edm/customannotation";

/// The versioned document kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKind {
    Csdl,
    Ssdl,
    Msl,
    Edmx,
}

impl SchemaKind {
    pub const ALL: [SchemaKind; 4] = [
        SchemaKind::Csdl,
        SchemaKind::Ssdl,
        SchemaKind::Msl,
        SchemaKind::Edmx,
    ];

    /// Namespace URIs for V1, V2 and V3, in that order.
    const fn table(self) -> &'static [&'static str; 3] {
        match self {
            SchemaKind::Csdl => &CSDL_NAMESPACES,
            SchemaKind::Ssdl => &SSDL_NAMESPACES,
            SchemaKind::Msl => &MSL_NAMESPACES,
            SchemaKind::Edmx => &EDMX_NAMESPACES,
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            SchemaKind::Csdl => "csdl",
            SchemaKind::Ssdl => "ssdl",
            SchemaKind::Msl => "msl",
            SchemaKind::Edmx => "edmx",
        }
    }
}

const CSDL_NAMESPACES: [&str; 3] = [
    "http://schemas.microsoft.com/ado/2006/04/edm",
    "http://schemas.microsoft.com/ado/2008/09/edm",
    "http://schemas.microsoft.com/ado/2009/11/edm",
];

const SSDL_NAMESPACES: [&str; 3] = [
    "http://schemas.microsoft.com/ado/2006/04/edm/ssdl",
    "http://schemas.microsoft.com/ado/2009/02/edm/ssdl",
    "http://schemas.microsoft.com/ado/2009/11/edm/ssdl",
];

const MSL_NAMESPACES: [&str; 3] = [
    "urn:schemas-microsoft-com:windows:storage:mapping:CS",
    "http://schemas.microsoft.com/ado/2008/09/mapping/cs",
    "http://schemas.microsoft.com/ado/2009/11/mapping/cs",
];

const EDMX_NAMESPACES: [&str; 3] = [
    "http://schemas.microsoft.com/ado/2007/06/edmx",
    "http://schemas.microsoft.com/ado/2008/10/edmx",
    "http://schemas.microsoft.com/ado/2009/11/edmx",
];

const fn version_slot(version: EntityFrameworkVersion) -> usize {
    match version {
        EntityFrameworkVersion::V1 => 0,
        EntityFrameworkVersion::V2 => 1,
        EntityFrameworkVersion::V3 => 2,
    }
}

pub fn namespace_for(kind: SchemaKind, version: EntityFrameworkVersion) -> &'static str {
    kind.table()[version_slot(version)]
}

pub fn csdl_namespace(version: EntityFrameworkVersion) -> &'static str {
    namespace_for(SchemaKind::Csdl, version)
}

pub fn ssdl_namespace(version: EntityFrameworkVersion) -> &'static str {
    namespace_for(SchemaKind::Ssdl, version)
}

pub fn msl_namespace(version: EntityFrameworkVersion) -> &'static str {
    namespace_for(SchemaKind::Msl, version)
}

pub fn edmx_namespace(version: EntityFrameworkVersion) -> &'static str {
    namespace_for(SchemaKind::Edmx, version)
}

/// Find the version and document kind a namespace URI belongs to.
pub fn try_version_for_namespace(
    namespace: &str,
) -> Option<(SchemaKind, EntityFrameworkVersion)> {
    SchemaKind::ALL.into_iter().find_map(|kind| {
        EntityFrameworkVersion::ALL
            .into_iter()
            .find(|v| namespace_for(kind, *v) == namespace)
            .map(|v| (kind, v))
    })
}

/// Version a namespace URI belongs to, falling back to the oldest supported
/// version for namespaces that are not recognized.
///
/// Known issue: the fallback hides unknown namespaces instead of reporting
/// them. Callers that need to tell the difference use
/// [`try_version_for_namespace`].
pub fn version_for_namespace_or_oldest(namespace: &str) -> EntityFrameworkVersion {
    try_version_for_namespace(namespace)
        .map(|(_, version)| version)
        .unwrap_or(EntityFrameworkVersion::OLDEST)
}

/// Prefix to namespace bindings for path queries over EDMX documents.
#[derive(Debug, Clone)]
pub struct NamespaceManager {
    bindings: Vec<(&'static str, &'static str)>,
}

impl NamespaceManager {
    /// Bind `edmx`, `csdl`, `ssdl` and `msl` to the namespaces of `version`,
    /// plus the version independent prefixes.
    pub fn for_version(version: EntityFrameworkVersion) -> Self {
        let mut bindings: Vec<(&'static str, &'static str)> = SchemaKind::ALL
            .into_iter()
            .map(|kind| (kind.prefix(), namespace_for(kind, version)))
            .collect();
        bindings.push(("store", ENTITY_STORE_SCHEMA_GENERATOR_NAMESPACE));
        bindings.push(("annotation", ANNOTATION_NAMESPACE));
        bindings.push(("cg", CODE_GENERATION_NAMESPACE));
        bindings.push(("customannotation", CUSTOM_ANNOTATION_NAMESPACE));
        Self { bindings }
    }

    pub fn lookup(&self, prefix: &str) -> Option<&'static str> {
        self.bindings
            .iter()
            .find(|(p, _)| *p == prefix)
            .map(|(_, ns)| *ns)
    }

    /// Evaluate a `/`-separated path of `prefix:LocalName` child steps.
    ///
    /// Steps without a prefix match elements in no namespace. Unknown prefixes
    /// match nothing.
    pub fn select_nodes<'a, 'input>(
        &self,
        node: Node<'a, 'input>,
        path: &str,
    ) -> Vec<Node<'a, 'input>> {
        let mut current = vec![node];
        for step in path.split('/').filter(|s| !s.is_empty()) {
            let (namespace, local) = match step.split_once(':') {
                Some((prefix, local)) => match self.lookup(prefix) {
                    Some(ns) => (Some(ns), local),
                    None => return Vec::new(),
                },
                None => (None, step),
            };
            current = current
                .iter()
                .flat_map(|n| n.children())
                .filter(|c| {
                    c.is_element()
                        && c.tag_name().name() == local
                        && c.tag_name().namespace() == namespace
                })
                .collect();
        }
        current
    }

    pub fn select_single_node<'a, 'input>(
        &self,
        node: Node<'a, 'input>,
        path: &str,
    ) -> Option<Node<'a, 'input>> {
        self.select_nodes(node, path).into_iter().next()
    }
}
