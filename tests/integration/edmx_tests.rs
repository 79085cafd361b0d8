//! Integration tests for loading EDMX documents

use std::io::Write;

use rust_edmx::mapping::{DbMappingItemKind, MappingNode, MappingVisitor, Walk, walk_mapping};
use rust_edmx::{msl, EdmxDocument, EdmxError, EntityFrameworkVersion};
use tempfile::NamedTempFile;

use crate::common::{fixture_path, read_fixture};

#[test]
fn test_load_shop_fixture() {
    let doc = EdmxDocument::load(&fixture_path("shop.edmx")).unwrap();
    assert_eq!(doc.version, EntityFrameworkVersion::V3);

    let model = doc.conceptual.as_ref().unwrap();
    let vip = model.entity_type("Shop.VipCustomer").unwrap();
    let names: Vec<&str> = model
        .all_properties(vip)
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names, vec!["Id", "Name", "Address", "Level"]);

    let mapping = doc.mapping.as_ref().unwrap();
    let people = mapping
        .container_mapping("ShopContext")
        .and_then(|c| c.entity_set_mapping("People"))
        .unwrap();
    assert_eq!(people.entity_type_mappings.len(), 4);
    assert!(people.entity_type_mappings.as_slice()[0].is_hierarchy_mapping);
}

#[test]
fn test_complex_property_paths_resolve() {
    let doc = EdmxDocument::parse(&read_fixture("shop.edmx")).unwrap();
    let mapping = doc.mapping.unwrap();

    let customer = mapping.entity_type_mappings_for("Shop.Customer").next().unwrap();
    let fragment = &customer.fragments.as_slice()[0];
    let street = fragment.property_mapping(&["Address", "Street"]).unwrap();
    assert_eq!(street.column.column, "Street");
    assert_eq!(street.leaf().map(|p| p.name.as_str()), Some("Street"));
}

/// Counts nodes per kind.
#[derive(Default)]
struct KindCounter {
    counts: Vec<(DbMappingItemKind, usize)>,
}

impl MappingVisitor for KindCounter {
    type Error = std::convert::Infallible;

    fn enter(&mut self, node: MappingNode<'_>) -> Result<Walk, Self::Error> {
        let kind = node.kind();
        match self.counts.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, n)) => *n += 1,
            None => self.counts.push((kind, 1)),
        }
        Ok(Walk::Continue)
    }
}

#[test]
fn test_walk_loaded_mapping() {
    let doc = EdmxDocument::parse(&read_fixture("shop.edmx")).unwrap();
    let mapping = doc.mapping.unwrap();

    let mut counter = KindCounter::default();
    match walk_mapping(&mut counter, MappingNode::from(&mapping)) {
        Ok(()) => {}
        Err(never) => match never {},
    }
    let count = |kind| {
        counter
            .counts
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    };

    assert_eq!(count(DbMappingItemKind::DatabaseMapping), 1);
    assert_eq!(count(DbMappingItemKind::EntitySetMapping), 2);
    assert_eq!(count(DbMappingItemKind::EntityTypeMapping), 5);
    assert_eq!(count(DbMappingItemKind::EntityTypeMappingFragment), 6);
    assert_eq!(count(DbMappingItemKind::AssociationEndMapping), 2);
    assert_eq!(count(DbMappingItemKind::ColumnCondition), 4);
    assert_eq!(count(DbMappingItemKind::QueryViewMapping), 0);
}

#[test]
fn test_unresolved_mapping_reference() {
    let xml = read_fixture("shop.edmx").replace(
        r#"<ScalarProperty Name="Salary" ColumnName="Salary" />"#,
        r#"<ScalarProperty Name="Salary" ColumnName="Wages" />"#,
    );
    let err = EdmxDocument::parse(&xml).unwrap_err();
    assert!(
        matches!(err, EdmxError::UnresolvedReference { kind: "column", ref name } if name.contains("Wages")),
        "{err}"
    );
}

#[test]
fn test_query_view_association_set_round_trip() {
    let fixture = read_fixture("shop.edmx");
    let start = fixture.find("<AssociationSetMapping").unwrap();
    let end = fixture.find("</AssociationSetMapping>").unwrap() + "</AssociationSetMapping>".len();
    let xml = fixture.replace(
        &fixture[start..end],
        r#"<AssociationSetMapping Name="Order_Customer" TypeName="Shop.Order_Customer"><QueryView>SELECT VALUE 1</QueryView></AssociationSetMapping>"#,
    );

    let doc = EdmxDocument::parse(&xml).unwrap();
    let mapping = doc.mapping.as_ref().unwrap();
    let association = mapping.association_set_mappings().next().unwrap();
    assert!(association.table.is_none());
    assert!(association.ends().is_none());

    let msl_text = msl::write_msl(mapping, doc.version).unwrap();
    let msl_doc = roxmltree::Document::parse(&msl_text).unwrap();
    let reread = msl::read_msl(
        msl_doc.root_element(),
        doc.conceptual.clone().unwrap(),
        doc.store.clone(),
    )
    .unwrap();
    let association = reread.association_set_mappings().next().unwrap();
    assert!(association.table.is_none());
    assert_eq!(
        association.query_view.as_ref().map(|v| v.query.as_str()),
        Some("SELECT VALUE 1")
    );
    assert_eq!(reread.entity_set_mappings().count(), 2);
}

#[test]
fn test_malformed_xml_reports_document() {
    let mut file = NamedTempFile::with_suffix(".edmx").unwrap();
    file.write_all(b"<edmx:Edmx").unwrap();
    file.flush().unwrap();

    let err = EdmxDocument::load(file.path()).unwrap_err();
    match err {
        EdmxError::XmlParseError { document, .. } => {
            assert!(document.ends_with(".edmx"), "{document}")
        }
        other => panic!("unexpected error: {other}"),
    }
}
