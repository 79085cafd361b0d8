//! Kind-dispatched traversal of the mapping tree.
//!
//! [`MappingNode`] borrows any mapping item under a variant that matches its
//! [`DbMappingItemKind`], so visitors `match` on the node instead of
//! downcasting. Adding a kind makes every exhaustive match fail to compile.

use super::{
    DbAssociationEndMapping, DbAssociationSetMapping, DbColumnCondition, DbDatabaseMapping,
    DbEdmPropertyMapping, DbEntityContainerMapping, DbEntitySetMapping, DbEntityTypeMapping,
    DbEntityTypeMappingFragment, DbMappingItemKind, DbPropertyCondition, DbQueryViewMapping,
    MappingMetadataItem,
};
use crate::annotation::{DataModelAnnotation, LazyList};

#[derive(Debug, Clone, Copy)]
pub enum MappingNode<'a> {
    DatabaseMapping(&'a DbDatabaseMapping),
    EntityContainerMapping(&'a DbEntityContainerMapping),
    EntitySetMapping(&'a DbEntitySetMapping),
    AssociationSetMapping(&'a DbAssociationSetMapping),
    EntityTypeMapping(&'a DbEntityTypeMapping),
    EntityTypeMappingFragment(&'a DbEntityTypeMappingFragment),
    EdmPropertyMapping(&'a DbEdmPropertyMapping),
    AssociationEndMapping(&'a DbAssociationEndMapping),
    ColumnCondition(&'a DbColumnCondition),
    PropertyCondition(&'a DbPropertyCondition),
    QueryViewMapping(&'a DbQueryViewMapping),
}

impl<'a> MappingNode<'a> {
    pub fn kind(&self) -> DbMappingItemKind {
        match self {
            MappingNode::DatabaseMapping(_) => DbMappingItemKind::DatabaseMapping,
            MappingNode::EntityContainerMapping(_) => DbMappingItemKind::EntityContainerMapping,
            MappingNode::EntitySetMapping(_) => DbMappingItemKind::EntitySetMapping,
            MappingNode::AssociationSetMapping(_) => DbMappingItemKind::AssociationSetMapping,
            MappingNode::EntityTypeMapping(_) => DbMappingItemKind::EntityTypeMapping,
            MappingNode::EntityTypeMappingFragment(_) => {
                DbMappingItemKind::EntityTypeMappingFragment
            }
            MappingNode::EdmPropertyMapping(_) => DbMappingItemKind::EdmPropertyMapping,
            MappingNode::AssociationEndMapping(_) => DbMappingItemKind::AssociationEndMapping,
            MappingNode::ColumnCondition(_) => DbMappingItemKind::ColumnCondition,
            MappingNode::PropertyCondition(_) => DbMappingItemKind::PropertyCondition,
            MappingNode::QueryViewMapping(_) => DbMappingItemKind::QueryViewMapping,
        }
    }

    pub fn annotations(&self) -> &'a LazyList<DataModelAnnotation> {
        match *self {
            MappingNode::DatabaseMapping(n) => n.annotations(),
            MappingNode::EntityContainerMapping(n) => n.annotations(),
            MappingNode::EntitySetMapping(n) => n.annotations(),
            MappingNode::AssociationSetMapping(n) => n.annotations(),
            MappingNode::EntityTypeMapping(n) => n.annotations(),
            MappingNode::EntityTypeMappingFragment(n) => n.annotations(),
            MappingNode::EdmPropertyMapping(n) => n.annotations(),
            MappingNode::AssociationEndMapping(n) => n.annotations(),
            MappingNode::ColumnCondition(n) => n.annotations(),
            MappingNode::PropertyCondition(n) => n.annotations(),
            MappingNode::QueryViewMapping(n) => n.annotations(),
        }
    }

    /// Direct children in document order.
    pub fn children(&self) -> Vec<MappingNode<'a>> {
        match *self {
            MappingNode::DatabaseMapping(n) => n
                .entity_container_mappings
                .iter()
                .map(MappingNode::EntityContainerMapping)
                .collect(),
            MappingNode::EntityContainerMapping(n) => n
                .entity_set_mappings
                .iter()
                .map(MappingNode::EntitySetMapping)
                .chain(
                    n.association_set_mappings
                        .iter()
                        .map(MappingNode::AssociationSetMapping),
                )
                .collect(),
            MappingNode::EntitySetMapping(n) => n
                .query_view
                .iter()
                .map(MappingNode::QueryViewMapping)
                .chain(n.entity_type_mappings.iter().map(MappingNode::EntityTypeMapping))
                .collect(),
            MappingNode::AssociationSetMapping(n) => n
                .query_view
                .iter()
                .map(MappingNode::QueryViewMapping)
                .chain(
                    n.source_end
                        .iter()
                        .chain(n.target_end.iter())
                        .map(MappingNode::AssociationEndMapping),
                )
                .chain(n.column_conditions.iter().map(MappingNode::ColumnCondition))
                .collect(),
            MappingNode::EntityTypeMapping(n) => n
                .fragments
                .iter()
                .map(MappingNode::EntityTypeMappingFragment)
                .collect(),
            MappingNode::EntityTypeMappingFragment(n) => n
                .property_mappings
                .iter()
                .map(MappingNode::EdmPropertyMapping)
                .chain(n.column_conditions.iter().map(MappingNode::ColumnCondition))
                .chain(n.property_conditions.iter().map(MappingNode::PropertyCondition))
                .collect(),
            MappingNode::AssociationEndMapping(n) => n
                .property_mappings
                .iter()
                .map(MappingNode::EdmPropertyMapping)
                .collect(),
            MappingNode::EdmPropertyMapping(_)
            | MappingNode::ColumnCondition(_)
            | MappingNode::PropertyCondition(_)
            | MappingNode::QueryViewMapping(_) => Vec::new(),
        }
    }
}

impl<'a> From<&'a DbDatabaseMapping> for MappingNode<'a> {
    fn from(mapping: &'a DbDatabaseMapping) -> Self {
        MappingNode::DatabaseMapping(mapping)
    }
}

/// What to do after entering a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Walk {
    Continue,
    SkipChildren,
}

pub trait MappingVisitor {
    type Error;

    fn enter(&mut self, node: MappingNode<'_>) -> Result<Walk, Self::Error> {
        let _ = node;
        Ok(Walk::Continue)
    }

    /// Called after the children, also when they were skipped.
    fn leave(&mut self, node: MappingNode<'_>) -> Result<(), Self::Error> {
        let _ = node;
        Ok(())
    }
}

/// Depth-first, document-order traversal starting at `node`.
pub fn walk_mapping<V>(v: &mut V, node: MappingNode<'_>) -> Result<(), V::Error>
where
    V: MappingVisitor + ?Sized,
{
    if v.enter(node)? == Walk::Continue {
        for child in node.children() {
            walk_mapping(v, child)?;
        }
    }
    v.leave(node)
}
