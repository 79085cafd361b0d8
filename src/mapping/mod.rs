//! The EDM-to-store mapping tree.
//!
//! A [`DbDatabaseMapping`] owns container mappings, which own set mappings,
//! and so on down to property mappings and conditions. Conceptual items are
//! referred to by (qualified) name or by value, store tables by [`TableId`].
//! Setters do not check cross references; that is left to validation.
//!
//! Every collection is a [`LazyList`]: reading an unset collection yields an
//! empty slice and `replace(None)` resets it.

mod kind;
mod visit;

pub use kind::DbMappingItemKind;
pub use visit::{walk_mapping, MappingNode, MappingVisitor, Walk};

use std::sync::Arc;

use crate::annotation::{DataModelAnnotation, LazyList};
use crate::edm::{EdmModel, EdmProperty};
use crate::store::{ColumnRef, DbDatabaseMetadata, TableId};

/// Any item of the mapping tree.
pub trait MappingItem {
    fn item_kind(&self) -> DbMappingItemKind;
}

/// A mapping item that carries data model annotations.
pub trait MappingMetadataItem: MappingItem {
    fn annotations(&self) -> &LazyList<DataModelAnnotation>;

    fn annotations_mut(&mut self) -> &mut LazyList<DataModelAnnotation>;
}

macro_rules! mapping_metadata_item {
    ($($ty:ty => $kind:ident),* $(,)?) => {
        $(
            impl MappingItem for $ty {
                fn item_kind(&self) -> DbMappingItemKind {
                    DbMappingItemKind::$kind
                }
            }

            impl MappingMetadataItem for $ty {
                fn annotations(&self) -> &LazyList<DataModelAnnotation> {
                    &self.annotations
                }

                fn annotations_mut(&mut self) -> &mut LazyList<DataModelAnnotation> {
                    &mut self.annotations
                }
            }
        )*
    };
}

mapping_metadata_item! {
    DbDatabaseMapping => DatabaseMapping,
    DbEntityContainerMapping => EntityContainerMapping,
    DbEntitySetMapping => EntitySetMapping,
    DbAssociationSetMapping => AssociationSetMapping,
    DbEntityTypeMapping => EntityTypeMapping,
    DbEntityTypeMappingFragment => EntityTypeMappingFragment,
    DbEdmPropertyMapping => EdmPropertyMapping,
    DbAssociationEndMapping => AssociationEndMapping,
    DbColumnCondition => ColumnCondition,
    DbPropertyCondition => PropertyCondition,
    DbQueryViewMapping => QueryViewMapping,
}

/// Root of a mapping tree.
#[derive(Debug, Clone, PartialEq)]
pub struct DbDatabaseMapping {
    /// Conceptual model being mapped.
    pub model: Arc<EdmModel>,
    /// Store model being mapped onto.
    pub database: Arc<DbDatabaseMetadata>,
    pub entity_container_mappings: LazyList<DbEntityContainerMapping>,
    pub annotations: LazyList<DataModelAnnotation>,
}

impl DbDatabaseMapping {
    pub fn new(model: Arc<EdmModel>, database: Arc<DbDatabaseMetadata>) -> Self {
        Self {
            model,
            database,
            entity_container_mappings: LazyList::new(),
            annotations: LazyList::new(),
        }
    }

    pub fn container_mapping(&self, entity_container: &str) -> Option<&DbEntityContainerMapping> {
        self.entity_container_mappings
            .iter()
            .find(|m| m.entity_container == entity_container)
    }

    /// Entity set mappings of every container.
    pub fn entity_set_mappings(&self) -> impl Iterator<Item = &DbEntitySetMapping> {
        self.entity_container_mappings
            .iter()
            .flat_map(|c| c.entity_set_mappings.iter())
    }

    pub fn association_set_mappings(&self) -> impl Iterator<Item = &DbAssociationSetMapping> {
        self.entity_container_mappings
            .iter()
            .flat_map(|c| c.association_set_mappings.iter())
    }

    /// Every type mapping targeting `entity_type`, across all sets.
    pub fn entity_type_mappings_for<'a>(
        &'a self,
        entity_type: &'a str,
    ) -> impl Iterator<Item = &'a DbEntityTypeMapping> + 'a {
        self.entity_set_mappings()
            .flat_map(|s| s.entity_type_mappings.iter())
            .filter(move |m| m.entity_type == entity_type)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbEntityContainerMapping {
    /// Name of the conceptual entity container.
    pub entity_container: String,
    pub entity_set_mappings: LazyList<DbEntitySetMapping>,
    pub association_set_mappings: LazyList<DbAssociationSetMapping>,
    pub annotations: LazyList<DataModelAnnotation>,
}

impl DbEntityContainerMapping {
    pub fn new(entity_container: impl Into<String>) -> Self {
        Self {
            entity_container: entity_container.into(),
            ..Self::default()
        }
    }

    pub fn entity_set_mapping(&self, entity_set: &str) -> Option<&DbEntitySetMapping> {
        self.entity_set_mappings
            .iter()
            .find(|m| m.entity_set == entity_set)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbEntitySetMapping {
    /// Name of the conceptual entity set.
    pub entity_set: String,
    pub entity_type_mappings: LazyList<DbEntityTypeMapping>,
    /// Hand-written view replacing the type mappings.
    pub query_view: Option<DbQueryViewMapping>,
    pub annotations: LazyList<DataModelAnnotation>,
}

impl DbEntitySetMapping {
    pub fn new(entity_set: impl Into<String>) -> Self {
        Self {
            entity_set: entity_set.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbEntityTypeMapping {
    /// Qualified name of the mapped entity type.
    pub entity_type: String,
    /// `true`: applies to the type and all of its subtypes (`IsTypeOf`).
    /// `false`: applies to exactly this type.
    pub is_hierarchy_mapping: bool,
    /// More than one fragment means the type is split across tables.
    pub fragments: LazyList<DbEntityTypeMappingFragment>,
    pub annotations: LazyList<DataModelAnnotation>,
}

impl DbEntityTypeMapping {
    pub fn new(entity_type: impl Into<String>, is_hierarchy_mapping: bool) -> Self {
        Self {
            entity_type: entity_type.into(),
            is_hierarchy_mapping,
            ..Self::default()
        }
    }

    /// Whether this mapping covers `entity_type` in `model`.
    pub fn applies_to(&self, model: &EdmModel, entity_type: &str) -> bool {
        if self.is_hierarchy_mapping {
            model.is_assignable(entity_type, &self.entity_type)
        } else {
            self.entity_type == entity_type
        }
    }
}

/// Properties of one type mapped to one table under a set of conditions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbEntityTypeMappingFragment {
    pub table: TableId,
    pub property_mappings: LazyList<DbEdmPropertyMapping>,
    pub column_conditions: LazyList<DbColumnCondition>,
    pub property_conditions: LazyList<DbPropertyCondition>,
    pub annotations: LazyList<DataModelAnnotation>,
}

impl DbEntityTypeMappingFragment {
    pub fn new(table: TableId) -> Self {
        Self {
            table,
            property_mappings: LazyList::new(),
            column_conditions: LazyList::new(),
            property_conditions: LazyList::new(),
            annotations: LazyList::new(),
        }
    }

    /// Whether any column or property condition restricts the fragment's rows.
    pub fn has_conditions(&self) -> bool {
        !self.column_conditions.is_empty() || !self.property_conditions.is_empty()
    }

    /// Mapping whose path is exactly `path` (property names).
    pub fn property_mapping(&self, path: &[&str]) -> Option<&DbEdmPropertyMapping> {
        self.property_mappings.iter().find(|m| {
            m.property_path.len() == path.len()
                && m.property_path.iter().zip(path).all(|(p, n)| p.name == *n)
        })
    }
}

/// A property path (through complex properties to a scalar) mapped to a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbEdmPropertyMapping {
    pub property_path: LazyList<EdmProperty>,
    pub column: ColumnRef,
    pub annotations: LazyList<DataModelAnnotation>,
}

impl DbEdmPropertyMapping {
    pub fn new(property_path: Vec<EdmProperty>, column: ColumnRef) -> Self {
        Self {
            property_path: LazyList::from(property_path),
            column,
            annotations: LazyList::new(),
        }
    }

    /// The scalar property at the end of the path.
    pub fn leaf(&self) -> Option<&EdmProperty> {
        self.property_path.as_slice().last()
    }

    pub fn path_names(&self) -> Vec<&str> {
        self.property_path.iter().map(|p| p.name.as_str()).collect()
    }
}

/// Discriminates rows by a column value or by the column's nullness. Only one
/// of `value` and `is_null` is meant to be set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbColumnCondition {
    pub column: ColumnRef,
    pub value: Option<String>,
    pub is_null: Option<bool>,
    pub annotations: LazyList<DataModelAnnotation>,
}

impl DbColumnCondition {
    pub fn equals(column: ColumnRef, value: impl Into<String>) -> Self {
        Self {
            column,
            value: Some(value.into()),
            is_null: None,
            annotations: LazyList::new(),
        }
    }

    pub fn null_check(column: ColumnRef, is_null: bool) -> Self {
        Self {
            column,
            value: None,
            is_null: Some(is_null),
            annotations: LazyList::new(),
        }
    }
}

/// Like [`DbColumnCondition`] but on a conceptual property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbPropertyCondition {
    pub property: EdmProperty,
    pub value: Option<String>,
    pub is_null: Option<bool>,
    pub annotations: LazyList<DataModelAnnotation>,
}

impl DbPropertyCondition {
    pub fn null_check(property: EdmProperty, is_null: bool) -> Self {
        Self {
            property,
            value: None,
            is_null: Some(is_null),
            annotations: LazyList::new(),
        }
    }
}

/// Entity-SQL view supplied verbatim instead of fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbQueryViewMapping {
    pub query: String,
    pub annotations: LazyList<DataModelAnnotation>,
}

impl DbQueryViewMapping {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            annotations: LazyList::new(),
        }
    }
}

/// An association set mapped either onto a store table (with both ends) or
/// only through a hand-written query view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbAssociationSetMapping {
    /// Name of the conceptual association set.
    pub association_set: String,
    pub table: Option<TableId>,
    pub source_end: Option<DbAssociationEndMapping>,
    pub target_end: Option<DbAssociationEndMapping>,
    pub column_conditions: LazyList<DbColumnCondition>,
    pub query_view: Option<DbQueryViewMapping>,
    pub annotations: LazyList<DataModelAnnotation>,
}

impl DbAssociationSetMapping {
    pub fn new(
        association_set: impl Into<String>,
        table: TableId,
        source_end: DbAssociationEndMapping,
        target_end: DbAssociationEndMapping,
    ) -> Self {
        Self {
            association_set: association_set.into(),
            table: Some(table),
            source_end: Some(source_end),
            target_end: Some(target_end),
            ..Self::default()
        }
    }

    /// Mapping with no store table whose rows come from `query_view`.
    pub fn from_query_view(association_set: impl Into<String>, query_view: DbQueryViewMapping) -> Self {
        Self {
            association_set: association_set.into(),
            query_view: Some(query_view),
            ..Self::default()
        }
    }

    /// Both end mappings, when the set is mapped onto a table.
    pub fn ends(&self) -> Option<(&DbAssociationEndMapping, &DbAssociationEndMapping)> {
        self.source_end.as_ref().zip(self.target_end.as_ref())
    }
}

/// Maps the key properties of one association end to columns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbAssociationEndMapping {
    /// Role name of the association end.
    pub association_end: String,
    pub property_mappings: LazyList<DbEdmPropertyMapping>,
    pub annotations: LazyList<DataModelAnnotation>,
}

impl DbAssociationEndMapping {
    pub fn new(association_end: impl Into<String>) -> Self {
        Self {
            association_end: association_end.into(),
            ..Self::default()
        }
    }
}
