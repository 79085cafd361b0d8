//! Build an [`EdmModel`] from a CSDL `Schema` element.

use roxmltree::Node;
use tracing::debug;

use super::{
    EdmAssociationEnd, EdmAssociationSet, EdmAssociationType, EdmComplexType, EdmEntityContainer,
    EdmEntitySet, EdmEntityType, EdmModel, EdmProperty, EdmPropertyType, PrimitiveTypeKind,
    RelationshipMultiplicity,
};
use crate::error::EdmxError;
use crate::schema::{try_version_for_namespace, SchemaKind};
use crate::xml::reader::{
    bool_attribute, children_named, first_child_named, number_attribute, required_attribute,
    resolve_alias,
};

/// Read a CSDL `Schema` element.
pub fn read_csdl(schema: Node<'_, '_>) -> Result<EdmModel, EdmxError> {
    let version = match schema
        .tag_name()
        .namespace()
        .and_then(try_version_for_namespace)
    {
        Some((SchemaKind::Csdl, version)) => version,
        _ => {
            return Err(EdmxError::invalid_schema(format!(
                "'{}' is not a CSDL Schema element",
                schema.tag_name().name()
            )))
        }
    };

    let namespace = required_attribute(schema, "Namespace")?.to_string();
    let alias = schema.attribute("Alias");
    let qualify = |name: &str| resolve_alias(name, alias, &namespace);

    let mut model = EdmModel::new(namespace.clone(), version);

    for node in children_named(schema, "EntityType") {
        model.entity_types.push(read_entity_type(node, &namespace, &qualify)?);
    }
    for node in children_named(schema, "ComplexType") {
        model.complex_types.push(EdmComplexType {
            name: required_attribute(node, "Name")?.to_string(),
            namespace: namespace.clone(),
            properties: read_properties(node, &qualify)?,
        });
    }
    for node in children_named(schema, "Association") {
        model
            .association_types
            .push(read_association(node, &namespace, &qualify)?);
    }
    for node in children_named(schema, "EntityContainer") {
        model.containers.push(read_container(node, &qualify)?);
    }

    debug!(
        namespace = %model.namespace,
        entity_types = model.entity_types.len(),
        associations = model.association_types.len(),
        "read conceptual schema"
    );
    Ok(model)
}

fn read_entity_type(
    node: Node<'_, '_>,
    namespace: &str,
    qualify: &impl Fn(&str) -> String,
) -> Result<EdmEntityType, EdmxError> {
    let mut entity_type = EdmEntityType::new(namespace, required_attribute(node, "Name")?);
    entity_type.base_type = node.attribute("BaseType").map(qualify);
    entity_type.is_abstract = bool_attribute(node, "Abstract")?.unwrap_or(false);
    if let Some(key) = first_child_named(node, "Key") {
        for property_ref in children_named(key, "PropertyRef") {
            entity_type
                .key
                .push(required_attribute(property_ref, "Name")?.to_string());
        }
    }
    entity_type.properties = read_properties(node, qualify)?;
    Ok(entity_type)
}

fn read_properties(
    node: Node<'_, '_>,
    qualify: &impl Fn(&str) -> String,
) -> Result<Vec<EdmProperty>, EdmxError> {
    children_named(node, "Property")
        .map(|p| read_property(p, qualify))
        .collect()
}

fn read_property(
    node: Node<'_, '_>,
    qualify: &impl Fn(&str) -> String,
) -> Result<EdmProperty, EdmxError> {
    let name = required_attribute(node, "Name")?;
    let type_name = required_attribute(node, "Type")?;
    let property_type = match type_name.parse::<PrimitiveTypeKind>() {
        Ok(kind) => EdmPropertyType::Primitive(kind),
        Err(()) => EdmPropertyType::Complex(qualify(type_name)),
    };

    let (max_length, is_max_length) = match node.attribute("MaxLength") {
        Some(v) if v.eq_ignore_ascii_case("max") => (None, true),
        Some(_) => (number_attribute(node, "MaxLength")?, false),
        None => (None, false),
    };

    Ok(EdmProperty {
        name: name.to_string(),
        nullable: bool_attribute(node, "Nullable")?.unwrap_or(true),
        property_type,
        max_length,
        is_max_length,
    })
}

fn read_association(
    node: Node<'_, '_>,
    namespace: &str,
    qualify: &impl Fn(&str) -> String,
) -> Result<EdmAssociationType, EdmxError> {
    let name = required_attribute(node, "Name")?;
    let ends: Vec<EdmAssociationEnd> = children_named(node, "End")
        .map(|end| -> Result<EdmAssociationEnd, EdmxError> {
            let multiplicity = required_attribute(end, "Multiplicity")?;
            Ok(EdmAssociationEnd {
                role: required_attribute(end, "Role")?.to_string(),
                entity_type: qualify(required_attribute(end, "Type")?),
                multiplicity: RelationshipMultiplicity::parse(multiplicity).ok_or_else(|| {
                    EdmxError::invalid_schema(format!(
                        "association '{name}' has an invalid multiplicity '{multiplicity}'"
                    ))
                })?,
            })
        })
        .collect::<Result<_, _>>()?;

    let [source_end, target_end]: [EdmAssociationEnd; 2] = ends.try_into().map_err(|_| {
        EdmxError::invalid_schema(format!("association '{name}' must have exactly two ends"))
    })?;

    Ok(EdmAssociationType {
        name: name.to_string(),
        namespace: namespace.to_string(),
        source_end,
        target_end,
    })
}

fn read_container(
    node: Node<'_, '_>,
    qualify: &impl Fn(&str) -> String,
) -> Result<EdmEntityContainer, EdmxError> {
    let mut container = EdmEntityContainer {
        name: required_attribute(node, "Name")?.to_string(),
        ..EdmEntityContainer::default()
    };

    for set in children_named(node, "EntitySet") {
        container.entity_sets.push(EdmEntitySet {
            name: required_attribute(set, "Name")?.to_string(),
            element_type: qualify(required_attribute(set, "EntityType")?),
        });
    }

    for set in children_named(node, "AssociationSet") {
        let name = required_attribute(set, "Name")?;
        let ends: Vec<&str> = children_named(set, "End")
            .map(|end| required_attribute(end, "EntitySet"))
            .collect::<Result<_, _>>()?;
        let [source_set, target_set]: [&str; 2] = ends.try_into().map_err(|_| {
            EdmxError::invalid_schema(format!("association set '{name}' must have two ends"))
        })?;
        container.association_sets.push(EdmAssociationSet {
            name: name.to_string(),
            association_type: qualify(required_attribute(set, "Association")?),
            source_set: source_set.to_string(),
            target_set: target_set.to_string(),
        });
    }

    Ok(container)
}
