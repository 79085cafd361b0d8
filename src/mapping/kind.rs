use std::fmt;

/// Closed set of mapping concepts. Every mapping item reports exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DbMappingItemKind {
    DatabaseMapping,
    EntityContainerMapping,
    EntitySetMapping,
    AssociationSetMapping,
    EntityTypeMapping,
    EntityTypeMappingFragment,
    EdmPropertyMapping,
    AssociationEndMapping,
    ColumnCondition,
    PropertyCondition,
    QueryViewMapping,
}

impl DbMappingItemKind {
    pub const ALL: [DbMappingItemKind; 11] = [
        DbMappingItemKind::DatabaseMapping,
        DbMappingItemKind::EntityContainerMapping,
        DbMappingItemKind::EntitySetMapping,
        DbMappingItemKind::AssociationSetMapping,
        DbMappingItemKind::EntityTypeMapping,
        DbMappingItemKind::EntityTypeMappingFragment,
        DbMappingItemKind::EdmPropertyMapping,
        DbMappingItemKind::AssociationEndMapping,
        DbMappingItemKind::ColumnCondition,
        DbMappingItemKind::PropertyCondition,
        DbMappingItemKind::QueryViewMapping,
    ];

    pub fn name(self) -> &'static str {
        match self {
            DbMappingItemKind::DatabaseMapping => "DatabaseMapping",
            DbMappingItemKind::EntityContainerMapping => "EntityContainerMapping",
            DbMappingItemKind::EntitySetMapping => "EntitySetMapping",
            DbMappingItemKind::AssociationSetMapping => "AssociationSetMapping",
            DbMappingItemKind::EntityTypeMapping => "EntityTypeMapping",
            DbMappingItemKind::EntityTypeMappingFragment => "EntityTypeMappingFragment",
            DbMappingItemKind::EdmPropertyMapping => "EdmPropertyMapping",
            DbMappingItemKind::AssociationEndMapping => "AssociationEndMapping",
            DbMappingItemKind::ColumnCondition => "ColumnCondition",
            DbMappingItemKind::PropertyCondition => "PropertyCondition",
            DbMappingItemKind::QueryViewMapping => "QueryViewMapping",
        }
    }

    /// Whether items of this kind can own other mapping items.
    pub fn is_container(self) -> bool {
        !matches!(
            self,
            DbMappingItemKind::EdmPropertyMapping
                | DbMappingItemKind::ColumnCondition
                | DbMappingItemKind::PropertyCondition
                | DbMappingItemKind::QueryViewMapping
        )
    }
}

impl fmt::Display for DbMappingItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
