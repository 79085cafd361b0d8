//! Conceptual model (CSDL side).
//!
//! The mapping tree refers to conceptual items by name; this graph is what
//! those names resolve against. It is read only from the mapping's point of
//! view.

mod csdl_reader;

pub use csdl_reader::read_csdl;

use std::fmt;
use std::str::FromStr;

use crate::schema::EntityFrameworkVersion;

/// Multiplicity of an association end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationshipMultiplicity {
    /// `0..1`
    ZeroOrOne,
    /// `1`
    One,
    /// `*`
    Many,
}

impl RelationshipMultiplicity {
    pub fn as_str(self) -> &'static str {
        match self {
            RelationshipMultiplicity::ZeroOrOne => "0..1",
            RelationshipMultiplicity::One => "1",
            RelationshipMultiplicity::Many => "*",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "0..1" => Some(RelationshipMultiplicity::ZeroOrOne),
            "1" => Some(RelationshipMultiplicity::One),
            "*" => Some(RelationshipMultiplicity::Many),
            _ => None,
        }
    }
}

impl fmt::Display for RelationshipMultiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primitive types of the conceptual type system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveTypeKind {
    Binary,
    Boolean,
    Byte,
    DateTime,
    DateTimeOffset,
    Time,
    Decimal,
    Double,
    Guid,
    Single,
    SByte,
    Int16,
    Int32,
    Int64,
    String,
    Geography,
    Geometry,
}

impl PrimitiveTypeKind {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveTypeKind::Binary => "Binary",
            PrimitiveTypeKind::Boolean => "Boolean",
            PrimitiveTypeKind::Byte => "Byte",
            PrimitiveTypeKind::DateTime => "DateTime",
            PrimitiveTypeKind::DateTimeOffset => "DateTimeOffset",
            PrimitiveTypeKind::Time => "Time",
            PrimitiveTypeKind::Decimal => "Decimal",
            PrimitiveTypeKind::Double => "Double",
            PrimitiveTypeKind::Guid => "Guid",
            PrimitiveTypeKind::Single => "Single",
            PrimitiveTypeKind::SByte => "SByte",
            PrimitiveTypeKind::Int16 => "Int16",
            PrimitiveTypeKind::Int32 => "Int32",
            PrimitiveTypeKind::Int64 => "Int64",
            PrimitiveTypeKind::String => "String",
            PrimitiveTypeKind::Geography => "Geography",
            PrimitiveTypeKind::Geometry => "Geometry",
        }
    }
}

impl FromStr for PrimitiveTypeKind {
    type Err = ();

    /// Accepts both `Int32` and `Edm.Int32`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.strip_prefix("Edm.").unwrap_or(s);
        let kind = match name {
            "Binary" => PrimitiveTypeKind::Binary,
            "Boolean" => PrimitiveTypeKind::Boolean,
            "Byte" => PrimitiveTypeKind::Byte,
            "DateTime" => PrimitiveTypeKind::DateTime,
            "DateTimeOffset" => PrimitiveTypeKind::DateTimeOffset,
            "Time" => PrimitiveTypeKind::Time,
            "Decimal" => PrimitiveTypeKind::Decimal,
            "Double" => PrimitiveTypeKind::Double,
            "Guid" => PrimitiveTypeKind::Guid,
            "Single" => PrimitiveTypeKind::Single,
            "SByte" => PrimitiveTypeKind::SByte,
            "Int16" => PrimitiveTypeKind::Int16,
            "Int32" => PrimitiveTypeKind::Int32,
            "Int64" => PrimitiveTypeKind::Int64,
            "String" => PrimitiveTypeKind::String,
            "Geography" => PrimitiveTypeKind::Geography,
            "Geometry" => PrimitiveTypeKind::Geometry,
            _ => return Err(()),
        };
        Ok(kind)
    }
}

/// Type of a conceptual property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdmPropertyType {
    Primitive(PrimitiveTypeKind),
    /// Namespace-qualified complex type name.
    Complex(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdmProperty {
    pub name: String,
    pub property_type: EdmPropertyType,
    pub nullable: bool,
    pub max_length: Option<u32>,
    pub is_max_length: bool,
}

impl EdmProperty {
    pub fn primitive(name: impl Into<String>, kind: PrimitiveTypeKind) -> Self {
        Self {
            name: name.into(),
            property_type: EdmPropertyType::Primitive(kind),
            nullable: true,
            max_length: None,
            is_max_length: false,
        }
    }

    pub fn complex(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            property_type: EdmPropertyType::Complex(type_name.into()),
            nullable: false,
            max_length: None,
            is_max_length: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn is_complex(&self) -> bool {
        matches!(self.property_type, EdmPropertyType::Complex(_))
    }

    pub fn complex_type_name(&self) -> Option<&str> {
        match &self.property_type {
            EdmPropertyType::Complex(name) => Some(name),
            EdmPropertyType::Primitive(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdmEntityType {
    pub name: String,
    pub namespace: String,
    /// Qualified name of the base type.
    pub base_type: Option<String>,
    pub is_abstract: bool,
    /// Names of the declared key properties; empty for derived types.
    pub key: Vec<String>,
    /// Declared (not inherited) properties.
    pub properties: Vec<EdmProperty>,
}

impl EdmEntityType {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            base_type: None,
            is_abstract: false,
            key: Vec::new(),
            properties: Vec::new(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    pub fn declared_property(&self, name: &str) -> Option<&EdmProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdmComplexType {
    pub name: String,
    pub namespace: String,
    pub properties: Vec<EdmProperty>,
}

impl EdmComplexType {
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    pub fn property(&self, name: &str) -> Option<&EdmProperty> {
        self.properties.iter().find(|p| p.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdmAssociationEnd {
    pub role: String,
    /// Qualified entity type name.
    pub entity_type: String,
    pub multiplicity: RelationshipMultiplicity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdmAssociationType {
    pub name: String,
    pub namespace: String,
    pub source_end: EdmAssociationEnd,
    pub target_end: EdmAssociationEnd,
}

impl EdmAssociationType {
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.namespace, self.name)
    }

    pub fn end(&self, role: &str) -> Option<&EdmAssociationEnd> {
        [&self.source_end, &self.target_end]
            .into_iter()
            .find(|e| e.role == role)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdmEntitySet {
    pub name: String,
    /// Qualified element type name.
    pub element_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdmAssociationSet {
    pub name: String,
    /// Qualified association type name.
    pub association_type: String,
    pub source_set: String,
    pub target_set: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdmEntityContainer {
    pub name: String,
    pub entity_sets: Vec<EdmEntitySet>,
    pub association_sets: Vec<EdmAssociationSet>,
}

impl EdmEntityContainer {
    pub fn entity_set(&self, name: &str) -> Option<&EdmEntitySet> {
        self.entity_sets.iter().find(|s| s.name == name)
    }

    pub fn association_set(&self, name: &str) -> Option<&EdmAssociationSet> {
        self.association_sets.iter().find(|s| s.name == name)
    }
}

/// The conceptual model being mapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdmModel {
    pub namespace: String,
    pub version: EntityFrameworkVersion,
    pub entity_types: Vec<EdmEntityType>,
    pub complex_types: Vec<EdmComplexType>,
    pub association_types: Vec<EdmAssociationType>,
    pub containers: Vec<EdmEntityContainer>,
}

impl EdmModel {
    pub fn new(namespace: impl Into<String>, version: EntityFrameworkVersion) -> Self {
        Self {
            namespace: namespace.into(),
            version,
            entity_types: Vec::new(),
            complex_types: Vec::new(),
            association_types: Vec::new(),
            containers: Vec::new(),
        }
    }

    pub fn entity_type(&self, full_name: &str) -> Option<&EdmEntityType> {
        self.entity_types.iter().find(|t| t.full_name() == full_name)
    }

    pub fn complex_type(&self, full_name: &str) -> Option<&EdmComplexType> {
        self.complex_types.iter().find(|t| t.full_name() == full_name)
    }

    pub fn association_type(&self, full_name: &str) -> Option<&EdmAssociationType> {
        self.association_types
            .iter()
            .find(|t| t.full_name() == full_name)
    }

    pub fn container(&self, name: &str) -> Option<&EdmEntityContainer> {
        self.containers.iter().find(|c| c.name == name)
    }

    /// The type followed by its ancestors, nearest first.
    pub fn base_chain<'a>(&'a self, entity_type: &'a EdmEntityType) -> Vec<&'a EdmEntityType> {
        let mut chain = vec![entity_type];
        let mut current = entity_type;
        while let Some(base) = current.base_type.as_deref().and_then(|b| self.entity_type(b)) {
            if chain.iter().any(|t| std::ptr::eq(*t, base)) {
                break;
            }
            chain.push(base);
            current = base;
        }
        chain
    }

    /// All properties of a type, inherited ones first.
    pub fn all_properties<'a>(&'a self, entity_type: &'a EdmEntityType) -> Vec<&'a EdmProperty> {
        self.base_chain(entity_type)
            .into_iter()
            .rev()
            .flat_map(|t| t.properties.iter())
            .collect()
    }

    pub fn find_property<'a>(
        &'a self,
        entity_type: &'a EdmEntityType,
        name: &str,
    ) -> Option<&'a EdmProperty> {
        self.base_chain(entity_type)
            .into_iter()
            .find_map(|t| t.declared_property(name))
    }

    /// Key property names, taken from the root of the hierarchy.
    pub fn key_properties<'a>(&'a self, entity_type: &'a EdmEntityType) -> &'a [String] {
        self.base_chain(entity_type)
            .into_iter()
            .rev()
            .find(|t| !t.key.is_empty())
            .map(|t| t.key.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `derived` is `base` or one of its descendants.
    pub fn is_assignable(&self, derived: &str, base: &str) -> bool {
        match self.entity_type(derived) {
            Some(t) => self.base_chain(t).iter().any(|b| b.full_name() == base),
            None => derived == base,
        }
    }

    /// `base` and every type deriving from it, directly or not, in
    /// declaration order.
    pub fn type_and_descendants(&self, base: &str) -> Vec<&EdmEntityType> {
        self.entity_types
            .iter()
            .filter(|t| self.is_assignable(&t.full_name(), base))
            .collect()
    }
}
