//! Schema version and namespace table tests

use rust_edmx::schema::{
    csdl_namespace, edmx_namespace, namespace_for, try_version_for_namespace,
    version_for_namespace_or_oldest, NamespaceManager, SchemaKind, VersionNumber,
    CUSTOM_ANNOTATION_NAMESPACE, ENTITY_STORE_SCHEMA_GENERATOR_NAMESPACE,
};
use rust_edmx::{EdmxError, EntityFrameworkVersion};

#[test]
fn test_version_parses_from_cli_forms() {
    let cases = [
        ("1", EntityFrameworkVersion::V1),
        ("v2", EntityFrameworkVersion::V2),
        ("V2.0", EntityFrameworkVersion::V2),
        (" 3.0 ", EntityFrameworkVersion::V3),
        ("3.0.0", EntityFrameworkVersion::V3),
    ];
    for (text, expected) in cases {
        assert_eq!(
            text.parse::<EntityFrameworkVersion>().unwrap(),
            expected,
            "parsing {:?}",
            text
        );
    }
}

#[test]
fn test_unsupported_version_reports_input() {
    let err = "4.0".parse::<EntityFrameworkVersion>().unwrap_err();
    match err {
        EdmxError::UnsupportedVersion { version } => assert_eq!(version, "4.0.0.0"),
        other => panic!("unexpected error: {other}"),
    }

    let err = "1.0.0.0.0".parse::<EntityFrameworkVersion>().unwrap_err();
    assert!(matches!(err, EdmxError::UnsupportedVersion { .. }));
}

#[test]
fn test_version_ordering_and_bounds() {
    assert!(EntityFrameworkVersion::V1 < EntityFrameworkVersion::V2);
    assert!(EntityFrameworkVersion::V2 < EntityFrameworkVersion::V3);
    assert_eq!(EntityFrameworkVersion::OLDEST, EntityFrameworkVersion::V1);
    assert_eq!(EntityFrameworkVersion::LATEST, EntityFrameworkVersion::V3);
    assert_eq!(
        EntityFrameworkVersion::try_from(VersionNumber::new(2, 0, 0, 0)).unwrap(),
        EntityFrameworkVersion::V2
    );
}

#[test]
fn test_every_kind_has_distinct_namespace_per_version() {
    let mut seen = Vec::new();
    for kind in SchemaKind::ALL {
        for version in EntityFrameworkVersion::ALL {
            let ns = namespace_for(kind, version);
            assert!(!seen.contains(&ns), "duplicate namespace {ns}");
            seen.push(ns);
        }
    }
    assert_eq!(seen.len(), 12);
}

#[test]
fn test_reverse_lookup_identifies_kind() {
    assert_eq!(
        try_version_for_namespace("http://schemas.microsoft.com/ado/2008/09/edm"),
        Some((SchemaKind::Csdl, EntityFrameworkVersion::V2))
    );
    assert_eq!(
        try_version_for_namespace("http://schemas.microsoft.com/ado/2009/11/mapping/cs"),
        Some((SchemaKind::Msl, EntityFrameworkVersion::V3))
    );
    // Auxiliary namespaces are not versioned
    assert_eq!(try_version_for_namespace(CUSTOM_ANNOTATION_NAMESPACE), None);
}

#[test]
fn test_unknown_namespace_uses_oldest_version() {
    assert_eq!(
        version_for_namespace_or_oldest("http://example.com/not-edm"),
        EntityFrameworkVersion::V1
    );
    assert_eq!(
        version_for_namespace_or_oldest(""),
        EntityFrameworkVersion::OLDEST
    );
    assert_eq!(
        version_for_namespace_or_oldest(csdl_namespace(EntityFrameworkVersion::V3)),
        EntityFrameworkVersion::V3
    );
}

#[test]
fn test_namespace_manager_bindings() {
    let manager = NamespaceManager::for_version(EntityFrameworkVersion::V2);
    assert_eq!(
        manager.lookup("edmx"),
        Some(edmx_namespace(EntityFrameworkVersion::V2))
    );
    assert_eq!(
        manager.lookup("store"),
        Some(ENTITY_STORE_SCHEMA_GENERATOR_NAMESPACE)
    );
    assert_eq!(manager.lookup("customannotation"), Some(CUSTOM_ANNOTATION_NAMESPACE));
    assert_eq!(manager.lookup("xs"), None);
}

#[test]
fn test_select_nodes_over_edmx() {
    let xml = r#"<edmx:Edmx Version="2.0" xmlns:edmx="http://schemas.microsoft.com/ado/2008/10/edmx">
  <edmx:Runtime>
    <edmx:ConceptualModels>
      <Schema Namespace="A" xmlns="http://schemas.microsoft.com/ado/2008/09/edm" />
      <Schema Namespace="B" xmlns="http://schemas.microsoft.com/ado/2008/09/edm" />
    </edmx:ConceptualModels>
    <edmx:StorageModels>
      <Schema Namespace="A.Store" xmlns="http://schemas.microsoft.com/ado/2009/02/edm/ssdl" />
    </edmx:StorageModels>
  </edmx:Runtime>
</edmx:Edmx>"#;
    let doc = roxmltree::Document::parse(xml).unwrap();
    let root = doc.root_element();

    let v2 = NamespaceManager::for_version(EntityFrameworkVersion::V2);
    let conceptual: Vec<_> = v2
        .select_nodes(root, "edmx:Runtime/edmx:ConceptualModels/csdl:Schema")
        .iter()
        .filter_map(|n| n.attribute("Namespace"))
        .collect();
    assert_eq!(conceptual, vec!["A", "B"]);

    let store = v2
        .select_single_node(root, "edmx:Runtime/edmx:StorageModels/ssdl:Schema")
        .unwrap();
    assert_eq!(store.attribute("Namespace"), Some("A.Store"));

    // The same path under another version's bindings finds nothing
    let v3 = NamespaceManager::for_version(EntityFrameworkVersion::V3);
    assert!(v3
        .select_single_node(root, "edmx:Runtime/edmx:StorageModels/ssdl:Schema")
        .is_none());
}
