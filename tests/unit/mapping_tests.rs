//! Mapping tree tests: item kinds, lazy collections and traversal

use std::collections::HashMap;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use rust_edmx::annotation::{AnnotationValue, DataModelAnnotation, LazyList};
use rust_edmx::edm::{EdmEntityType, EdmModel, EdmProperty, PrimitiveTypeKind};
use rust_edmx::mapping::{
    walk_mapping, DbAssociationEndMapping, DbAssociationSetMapping, DbColumnCondition,
    DbDatabaseMapping, DbEdmPropertyMapping, DbEntityContainerMapping, DbEntitySetMapping,
    DbEntityTypeMapping, DbEntityTypeMappingFragment, DbMappingItemKind, DbQueryViewMapping,
    MappingItem, MappingMetadataItem, MappingNode, MappingVisitor, Walk,
};
use rust_edmx::store::{ColumnRef, DbDatabaseMetadata, DbTableColumnMetadata};
use rust_edmx::EntityFrameworkVersion;

/// `Zoo.Animal` <- `Zoo.Cat` <- `Zoo.Lion`, and `Zoo.Keeper`, mapped TPH
/// onto `dbo.Animals` plus `dbo.Keepers`.
fn zoo_mapping() -> DbDatabaseMapping {
    let mut model = EdmModel::new("Zoo", EntityFrameworkVersion::V3);
    let mut animal = EdmEntityType::new("Zoo", "Animal");
    animal.key = vec!["Id".to_string()];
    animal.properties = vec![
        EdmProperty::primitive("Id", PrimitiveTypeKind::Int32).not_null(),
        EdmProperty::primitive("Name", PrimitiveTypeKind::String),
    ];
    let mut cat = EdmEntityType::new("Zoo", "Cat");
    cat.base_type = Some("Zoo.Animal".to_string());
    let mut lion = EdmEntityType::new("Zoo", "Lion");
    lion.base_type = Some("Zoo.Cat".to_string());
    let mut keeper = EdmEntityType::new("Zoo", "Keeper");
    keeper.key = vec!["Id".to_string()];
    keeper.properties = vec![EdmProperty::primitive("Id", PrimitiveTypeKind::Int32).not_null()];
    model.entity_types = vec![animal, cat, lion, keeper];

    let mut db = DbDatabaseMetadata::new("ZooStoreContainer", "Zoo.Store", EntityFrameworkVersion::V3);
    let animals = db.add_table(
        "dbo",
        "Animals",
        vec![
            DbTableColumnMetadata::new("Id", "int").primary_key(),
            DbTableColumnMetadata::new("Name", "nvarchar"),
            DbTableColumnMetadata::new("Kind", "nvarchar").not_null(),
            DbTableColumnMetadata::new("KeeperId", "int"),
        ],
    );
    let keepers = db.add_table(
        "dbo",
        "Keepers",
        vec![DbTableColumnMetadata::new("Id", "int").primary_key()],
    );

    let id = EdmProperty::primitive("Id", PrimitiveTypeKind::Int32).not_null();
    let name = EdmProperty::primitive("Name", PrimitiveTypeKind::String);

    let mut animal_fragment = DbEntityTypeMappingFragment::new(animals);
    animal_fragment
        .property_mappings
        .push(DbEdmPropertyMapping::new(vec![id.clone()], ColumnRef::new(animals, "Id")));
    animal_fragment
        .property_mappings
        .push(DbEdmPropertyMapping::new(vec![name], ColumnRef::new(animals, "Name")));
    animal_fragment
        .column_conditions
        .push(DbColumnCondition::equals(ColumnRef::new(animals, "Kind"), "Animal"));
    let mut animal_mapping = DbEntityTypeMapping::new("Zoo.Animal", true);
    animal_mapping.fragments.push(animal_fragment);

    let mut lion_fragment = DbEntityTypeMappingFragment::new(animals);
    lion_fragment
        .column_conditions
        .push(DbColumnCondition::equals(ColumnRef::new(animals, "Kind"), "Lion"));
    let mut lion_mapping = DbEntityTypeMapping::new("Zoo.Lion", false);
    lion_mapping.fragments.push(lion_fragment);

    let mut animal_set = DbEntitySetMapping::new("Animals");
    animal_set.entity_type_mappings.push(animal_mapping);
    animal_set.entity_type_mappings.push(lion_mapping);

    let mut keeper_fragment = DbEntityTypeMappingFragment::new(keepers);
    keeper_fragment
        .property_mappings
        .push(DbEdmPropertyMapping::new(vec![id.clone()], ColumnRef::new(keepers, "Id")));
    let mut keeper_mapping = DbEntityTypeMapping::new("Zoo.Keeper", false);
    keeper_mapping.fragments.push(keeper_fragment);
    let mut keeper_set = DbEntitySetMapping::new("Keepers");
    keeper_set.entity_type_mappings.push(keeper_mapping);

    let mut source = DbAssociationEndMapping::new("Animal");
    source
        .property_mappings
        .push(DbEdmPropertyMapping::new(vec![id.clone()], ColumnRef::new(animals, "Id")));
    let mut target = DbAssociationEndMapping::new("Keeper");
    target
        .property_mappings
        .push(DbEdmPropertyMapping::new(vec![id], ColumnRef::new(animals, "KeeperId")));
    let mut association = DbAssociationSetMapping::new("Animal_Keeper", animals, source, target);
    association
        .column_conditions
        .push(DbColumnCondition::null_check(ColumnRef::new(animals, "KeeperId"), false));

    let mut container = DbEntityContainerMapping::new("ZooContext");
    container.entity_set_mappings.push(animal_set);
    container.entity_set_mappings.push(keeper_set);
    container.association_set_mappings.push(association);

    let mut mapping = DbDatabaseMapping::new(Arc::new(model), Arc::new(db));
    mapping.entity_container_mappings.push(container);
    mapping
}

#[derive(Default)]
struct Recorder {
    entered: Vec<DbMappingItemKind>,
    left: usize,
    skip: Option<DbMappingItemKind>,
}

impl MappingVisitor for Recorder {
    type Error = String;

    fn enter(&mut self, node: MappingNode<'_>) -> Result<Walk, String> {
        self.entered.push(node.kind());
        if Some(node.kind()) == self.skip {
            Ok(Walk::SkipChildren)
        } else {
            Ok(Walk::Continue)
        }
    }

    fn leave(&mut self, _node: MappingNode<'_>) -> Result<(), String> {
        self.left += 1;
        Ok(())
    }
}

fn count(kinds: &[DbMappingItemKind]) -> HashMap<DbMappingItemKind, usize> {
    let mut counts = HashMap::new();
    for kind in kinds {
        *counts.entry(*kind).or_insert(0) += 1;
    }
    counts
}

// ============================================================================
// Item kinds
// ============================================================================

#[test]
fn test_item_kind_names_are_unique() {
    let names: Vec<&str> = DbMappingItemKind::ALL.iter().map(|k| k.name()).collect();
    for (i, name) in names.iter().enumerate() {
        assert!(!names[i + 1..].contains(name), "duplicate kind name {name}");
    }
    assert_eq!(DbMappingItemKind::ColumnCondition.to_string(), "ColumnCondition");
}

#[test]
fn test_item_kind_containers() {
    let leaves: Vec<DbMappingItemKind> = DbMappingItemKind::ALL
        .into_iter()
        .filter(|k| !k.is_container())
        .collect();
    assert_eq!(
        leaves,
        vec![
            DbMappingItemKind::EdmPropertyMapping,
            DbMappingItemKind::ColumnCondition,
            DbMappingItemKind::PropertyCondition,
            DbMappingItemKind::QueryViewMapping,
        ]
    );
}

#[test]
fn test_items_report_their_kind() {
    let mapping = zoo_mapping();
    assert_eq!(mapping.item_kind(), DbMappingItemKind::DatabaseMapping);
    let container = &mapping.entity_container_mappings.as_slice()[0];
    assert_eq!(container.item_kind(), DbMappingItemKind::EntityContainerMapping);
    let association = &container.association_set_mappings.as_slice()[0];
    assert_eq!(association.item_kind(), DbMappingItemKind::AssociationSetMapping);
    assert_eq!(
        association.ends().map(|(source, _)| source.item_kind()),
        Some(DbMappingItemKind::AssociationEndMapping)
    );
}

// ============================================================================
// Lazy collections
// ============================================================================

#[test]
fn test_lazy_list_reads_empty_until_written() {
    let mut list: LazyList<i32> = LazyList::new();
    assert!(list.is_empty());
    assert!(!list.is_materialized());
    assert_eq!(list.iter().count(), 0);
    assert_eq!(list.iter_mut().count(), 0);

    list.push(1);
    list.get_or_create().push(2);
    assert!(list.is_materialized());
    assert_eq!(list.as_slice(), &[1, 2]);

    list.replace(None);
    assert!(list.is_empty());
    assert!(!list.is_materialized());

    list.replace(Some(Vec::new()));
    assert!(list.is_materialized());
    assert_eq!(list, LazyList::new());
}

#[test]
fn test_lazy_list_from_iterator() {
    let list: LazyList<&str> = ["a", "b"].into_iter().collect();
    let collected: Vec<&&str> = (&list).into_iter().collect();
    assert_eq!(collected, vec![&"a", &"b"]);
}

#[test]
fn test_new_items_have_no_annotations() {
    let mapping = zoo_mapping();
    assert!(!mapping.annotations().is_materialized());
    assert!(mapping
        .entity_set_mappings()
        .all(|s| s.annotations().is_empty() && s.query_view.is_none()));
}

#[test]
fn test_annotations_are_mutable_through_trait() {
    let mut mapping = zoo_mapping();
    let set = mapping
        .entity_container_mappings
        .iter_mut()
        .flat_map(|c| c.entity_set_mappings.iter_mut())
        .find(|s| s.entity_set == "Keepers")
        .unwrap();
    set.annotations_mut().push(DataModelAnnotation::new(
        None,
        "Note",
        AnnotationValue::Text("reviewed".to_string()),
    ));

    let container = mapping.container_mapping("ZooContext").unwrap();
    let keepers = container.entity_set_mapping("Keepers").unwrap();
    assert_eq!(keepers.annotations().len(), 1);
    assert_eq!(keepers.annotations().as_slice()[0].full_name(), "Note");
    assert!(container.entity_set_mapping("Animals").unwrap().annotations().is_empty());
}

// ============================================================================
// Lookups
// ============================================================================

#[test]
fn test_hierarchy_mapping_applies_to_descendants() {
    let mapping = zoo_mapping();
    let animal = mapping.entity_type_mappings_for("Zoo.Animal").next().unwrap();
    assert!(animal.applies_to(&mapping.model, "Zoo.Animal"));
    assert!(animal.applies_to(&mapping.model, "Zoo.Cat"));
    assert!(animal.applies_to(&mapping.model, "Zoo.Lion"));
    assert!(!animal.applies_to(&mapping.model, "Zoo.Keeper"));

    let lion = mapping.entity_type_mappings_for("Zoo.Lion").next().unwrap();
    assert!(lion.applies_to(&mapping.model, "Zoo.Lion"));
    assert!(!lion.applies_to(&mapping.model, "Zoo.Cat"));
}

#[test]
fn test_fragment_property_lookup() {
    let mapping = zoo_mapping();
    let animal = mapping.entity_type_mappings_for("Zoo.Animal").next().unwrap();
    let fragment = &animal.fragments.as_slice()[0];

    let name = fragment.property_mapping(&["Name"]).unwrap();
    assert_eq!(name.column.column, "Name");
    assert_eq!(name.leaf().map(|p| p.name.as_str()), Some("Name"));
    assert_eq!(name.path_names(), vec!["Name"]);
    assert!(fragment.property_mapping(&["Missing"]).is_none());
    assert!(fragment.property_mapping(&[]).is_none());

    let table = mapping.database.table(fragment.table).unwrap();
    assert_eq!(table.name, "Animals");
    assert!(mapping.database.column(&name.column).is_some());
}

#[test]
fn test_set_mapping_iteration() {
    let mapping = zoo_mapping();
    let sets: Vec<&str> = mapping
        .entity_set_mappings()
        .map(|s| s.entity_set.as_str())
        .collect();
    assert_eq!(sets, vec!["Animals", "Keepers"]);
    assert_eq!(mapping.association_set_mappings().count(), 1);
    assert!(mapping.container_mapping("Other").is_none());
}

// ============================================================================
// Traversal
// ============================================================================

#[test]
fn test_walk_document_order() {
    let mapping = zoo_mapping();
    let mut recorder = Recorder::default();
    walk_mapping(&mut recorder, MappingNode::from(&mapping)).unwrap();

    assert_eq!(recorder.left, recorder.entered.len());
    assert_eq!(
        &recorder.entered[..4],
        &[
            DbMappingItemKind::DatabaseMapping,
            DbMappingItemKind::EntityContainerMapping,
            DbMappingItemKind::EntitySetMapping,
            DbMappingItemKind::EntityTypeMapping,
        ]
    );
    // association sets come after every entity set
    let first_association = recorder
        .entered
        .iter()
        .position(|k| *k == DbMappingItemKind::AssociationSetMapping)
        .unwrap();
    let last_entity_set = recorder
        .entered
        .iter()
        .rposition(|k| *k == DbMappingItemKind::EntitySetMapping)
        .unwrap();
    assert!(first_association > last_entity_set);

    let counts = count(&recorder.entered);
    assert_eq!(counts[&DbMappingItemKind::EntitySetMapping], 2);
    assert_eq!(counts[&DbMappingItemKind::EntityTypeMapping], 3);
    assert_eq!(counts[&DbMappingItemKind::EntityTypeMappingFragment], 3);
    assert_eq!(counts[&DbMappingItemKind::EdmPropertyMapping], 5);
    assert_eq!(counts[&DbMappingItemKind::AssociationEndMapping], 2);
    assert_eq!(counts[&DbMappingItemKind::ColumnCondition], 3);
    assert!(!counts.contains_key(&DbMappingItemKind::QueryViewMapping));
}

#[test]
fn test_walk_skip_children() {
    let mapping = zoo_mapping();
    let mut recorder = Recorder {
        skip: Some(DbMappingItemKind::EntitySetMapping),
        ..Recorder::default()
    };
    walk_mapping(&mut recorder, MappingNode::from(&mapping)).unwrap();

    let counts = count(&recorder.entered);
    assert_eq!(counts[&DbMappingItemKind::EntitySetMapping], 2);
    assert!(!counts.contains_key(&DbMappingItemKind::EntityTypeMapping));
    // association set children are still visited
    assert_eq!(counts[&DbMappingItemKind::AssociationEndMapping], 2);
    assert_eq!(counts[&DbMappingItemKind::EdmPropertyMapping], 2);
    assert_eq!(recorder.left, recorder.entered.len());
}

struct FailOn(DbMappingItemKind);

impl MappingVisitor for FailOn {
    type Error = String;

    fn enter(&mut self, node: MappingNode<'_>) -> Result<Walk, String> {
        if node.kind() == self.0 {
            Err(format!("stopped at {}", node.kind()))
        } else {
            Ok(Walk::Continue)
        }
    }
}

#[test]
fn test_walk_stops_on_error() {
    let mapping = zoo_mapping();
    let err = walk_mapping(
        &mut FailOn(DbMappingItemKind::ColumnCondition),
        MappingNode::from(&mapping),
    )
    .unwrap_err();
    assert_eq!(err, "stopped at ColumnCondition");
}

#[test]
fn test_walk_from_inner_node() {
    let mapping = zoo_mapping();
    let association = mapping.association_set_mappings().next().unwrap();
    let mut recorder = Recorder::default();
    walk_mapping(&mut recorder, MappingNode::AssociationSetMapping(association)).unwrap();
    assert_eq!(
        recorder.entered,
        vec![
            DbMappingItemKind::AssociationSetMapping,
            DbMappingItemKind::AssociationEndMapping,
            DbMappingItemKind::EdmPropertyMapping,
            DbMappingItemKind::AssociationEndMapping,
            DbMappingItemKind::EdmPropertyMapping,
            DbMappingItemKind::ColumnCondition,
        ]
    );
}

#[test]
fn test_walk_query_view_association_set() {
    let association = DbAssociationSetMapping::from_query_view(
        "Animal_Keeper",
        DbQueryViewMapping::new("SELECT VALUE 1"),
    );
    let mut recorder = Recorder::default();
    walk_mapping(&mut recorder, MappingNode::AssociationSetMapping(&association)).unwrap();
    assert_eq!(
        recorder.entered,
        vec![
            DbMappingItemKind::AssociationSetMapping,
            DbMappingItemKind::QueryViewMapping,
        ]
    );
    assert_eq!(recorder.left, 2);
}
