//! Unit tests for index annotations
//!
//! These tests cover the annotation text format and the merge rules applied
//! when several configurations describe indexes on the same column.

use std::borrow::Cow;

use rust_edmx::annotation::{
    merge_annotation, AnnotationValue, DataModelAnnotation, IndexAnnotation,
    IndexAnnotationSerializer, IndexAttribute, LazyList, MergeableAnnotation,
};
use rust_edmx::EdmxError;

fn parse(value: &str) -> IndexAnnotation {
    IndexAnnotationSerializer::deserialize_annotation(value).unwrap()
}

fn format(annotation: &IndexAnnotation) -> String {
    IndexAnnotationSerializer::serialize_annotation(annotation)
}

// ============================================================================
// Format Tests
// ============================================================================

#[test]
fn test_format_canonical_property_order() {
    let annotation = parse("{ IsUnique: False, Order: 3, Name: IX_A, IsClustered: True }");
    assert_eq!(
        format(&annotation),
        "{ Name: IX_A, Order: 3, IsClustered: True, IsUnique: False }"
    );
}

#[test]
fn test_format_omits_unconfigured_properties() {
    assert_eq!(format(&parse("{ Name: IX_A }")), "{ Name: IX_A }");
    assert_eq!(format(&parse("{ }")), "{ }");
}

#[test]
fn test_bad_text_reports_expected_format() {
    let err = IndexAnnotationSerializer::deserialize_annotation("Name=IX").unwrap_err();
    assert!(matches!(err, EdmxError::IndexAnnotationFormat { .. }));
    assert!(err.to_string().contains("{ Name: MyIndex, Order: 7"), "{err}");
}

// ============================================================================
// Merge Tests
// ============================================================================

#[test]
fn test_merge_two_configurations() {
    let merged = parse("{ Name: IX_A, Order: 1 }")
        .merge_with(&parse("{ Name: IX_A, IsUnique: True } { Name: IX_B }"))
        .unwrap()
        .into_owned();
    assert_eq!(
        format(&merged),
        "{ Name: IX_A, Order: 1, IsUnique: True }{ Name: IX_B }"
    );
}

#[test]
fn test_merge_is_borrowed_only_for_the_same_instance() {
    let a = parse("{ Name: IX_A }");
    let b = a.clone();
    assert!(matches!(a.merge_with(&a).unwrap(), Cow::Borrowed(_)));
    assert!(matches!(a.merge_with(&b).unwrap(), Cow::Owned(_)));
}

#[test]
fn test_conflicting_order_names_both_values() {
    let err = parse("{ Name: IX_A, Order: 1 }")
        .merge_with(&parse("{ Name: IX_A, Order: 2 }"))
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("'IX_A'"), "{message}");
    assert!(message.contains("'Order' = '1'"), "{message}");
    assert!(message.contains("'Order' = '2'"), "{message}");
}

#[test]
fn test_compatibility_check_does_not_merge() {
    let a = parse("{ Name: IX_A, IsClustered: True }");
    let b = parse("{ Name: IX_A, IsClustered: False }");
    assert!(!a.is_compatible_with(&b).is_compatible());
    assert!(a.is_compatible_with(&parse("{ Name: IX_B }")).is_compatible());
    assert_eq!(a.len(), 1);
}

#[test]
fn test_merge_annotation_into_list() {
    let mut annotations = LazyList::new();
    merge_annotation(
        &mut annotations,
        DataModelAnnotation::index(IndexAnnotation::new(IndexAttribute::named("IX_A"))),
    )
    .unwrap();
    merge_annotation(
        &mut annotations,
        DataModelAnnotation::index(IndexAnnotation::new(IndexAttribute::named("IX_B"))),
    )
    .unwrap();

    assert_eq!(annotations.len(), 1);
    match &annotations.as_slice()[0].value {
        AnnotationValue::Index(index) => assert_eq!(index.len(), 2),
        other => panic!("expected an index annotation, got {other:?}"),
    }
}
