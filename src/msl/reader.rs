//! Build a [`DbDatabaseMapping`] from an MSL `Mapping` element.

use std::sync::Arc;

use roxmltree::Node;
use tracing::{debug, trace};

use crate::edm::{EdmEntityContainer, EdmModel, EdmProperty};
use crate::error::EdmxError;
use crate::mapping::{
    DbAssociationEndMapping, DbAssociationSetMapping, DbColumnCondition, DbDatabaseMapping,
    DbEdmPropertyMapping, DbEntityContainerMapping, DbEntitySetMapping, DbEntityTypeMapping,
    DbEntityTypeMappingFragment, DbPropertyCondition, DbQueryViewMapping,
};
use crate::schema::{try_version_for_namespace, SchemaKind};
use crate::store::{ColumnRef, DbDatabaseMetadata, DbTableMetadata};
use crate::xml::reader::{bool_attribute, children_named, first_child_named, required_attribute};

const IS_TYPE_OF: &str = "IsTypeOf(";

/// Read an MSL `Mapping` element against the conceptual and store models it
/// maps between.
pub fn read_msl(
    mapping: Node<'_, '_>,
    model: Arc<EdmModel>,
    database: Arc<DbDatabaseMetadata>,
) -> Result<DbDatabaseMapping, EdmxError> {
    match mapping
        .tag_name()
        .namespace()
        .and_then(try_version_for_namespace)
    {
        Some((SchemaKind::Msl, _)) => {}
        _ => {
            return Err(EdmxError::invalid_schema(format!(
                "'{}' is not an MSL Mapping element",
                mapping.tag_name().name()
            )))
        }
    }

    let mut result = DbDatabaseMapping::new(model, database);
    let context = Context {
        model: &result.model,
        database: &result.database,
    };

    let mut containers = Vec::new();
    for node in children_named(mapping, "EntityContainerMapping") {
        containers.push(context.container_mapping(node)?);
    }
    result.entity_container_mappings.replace(Some(containers));

    debug!(
        entity_sets = result.entity_set_mappings().count(),
        association_sets = result.association_set_mappings().count(),
        "read mapping"
    );
    Ok(result)
}

struct Context<'a> {
    model: &'a EdmModel,
    database: &'a DbDatabaseMetadata,
}

impl Context<'_> {
    fn container_mapping(&self, node: Node<'_, '_>) -> Result<DbEntityContainerMapping, EdmxError> {
        let name = required_attribute(node, "CdmEntityContainer")?;
        let container = self
            .model
            .container(name)
            .ok_or_else(|| EdmxError::unresolved("entity container", name))?;

        let mut mapping = DbEntityContainerMapping::new(name);
        for set in children_named(node, "EntitySetMapping") {
            mapping
                .entity_set_mappings
                .push(self.entity_set_mapping(container, set)?);
        }
        for set in children_named(node, "AssociationSetMapping") {
            mapping
                .association_set_mappings
                .push(self.association_set_mapping(container, set)?);
        }
        Ok(mapping)
    }

    fn entity_set_mapping(
        &self,
        container: &EdmEntityContainer,
        node: Node<'_, '_>,
    ) -> Result<DbEntitySetMapping, EdmxError> {
        let name = required_attribute(node, "Name")?;
        if container.entity_set(name).is_none() {
            return Err(EdmxError::unresolved("entity set", name));
        }

        let mut mapping = DbEntitySetMapping::new(name);
        mapping.query_view = query_view(node);
        for type_mapping in children_named(node, "EntityTypeMapping") {
            let type_names = required_attribute(type_mapping, "TypeName")?;
            for type_name in type_names.split(';').map(str::trim).filter(|t| !t.is_empty()) {
                let (entity_type, is_hierarchy_mapping) = split_type_of(type_name);
                trace!(entity_set = name, entity_type, is_hierarchy_mapping, "entity type mapping");
                mapping
                    .entity_type_mappings
                    .push(self.entity_type_mapping(entity_type, is_hierarchy_mapping, type_mapping)?);
            }
        }
        Ok(mapping)
    }

    fn entity_type_mapping(
        &self,
        type_name: &str,
        is_hierarchy_mapping: bool,
        node: Node<'_, '_>,
    ) -> Result<DbEntityTypeMapping, EdmxError> {
        let entity_type = self
            .model
            .entity_type(type_name)
            .ok_or_else(|| EdmxError::unresolved("entity type", type_name))?;

        let mut mapping = DbEntityTypeMapping::new(type_name, is_hierarchy_mapping);
        for fragment_node in children_named(node, "MappingFragment") {
            let table = self.table(required_attribute(fragment_node, "StoreEntitySet")?)?;
            let mut fragment = DbEntityTypeMappingFragment::new(table.id);

            let resolve = |name: &str| self.model.find_property(entity_type, name).cloned();
            self.property_mappings(
                fragment_node,
                table,
                &resolve,
                &mut Vec::new(),
                fragment.property_mappings.get_or_create(),
            )?;

            for condition in children_named(fragment_node, "Condition") {
                match condition.attribute("ColumnName") {
                    Some(_) => fragment
                        .column_conditions
                        .push(column_condition(condition, table)?),
                    None => {
                        let name = required_attribute(condition, "Name")?;
                        let property = resolve(name)
                            .ok_or_else(|| EdmxError::unresolved("property", format!("{type_name}.{name}")))?;
                        fragment.property_conditions.push(DbPropertyCondition {
                            property,
                            value: condition.attribute("Value").map(str::to_string),
                            is_null: bool_attribute(condition, "IsNull")?,
                            annotations: Default::default(),
                        });
                    }
                }
            }
            if fragment.property_mappings.is_empty() {
                fragment.property_mappings.replace(None);
            }
            mapping.fragments.push(fragment);
        }
        Ok(mapping)
    }

    /// Collect `ScalarProperty` mappings under `node`, descending into
    /// `ComplexProperty` elements with `prefix` as the path so far.
    fn property_mappings(
        &self,
        node: Node<'_, '_>,
        table: &DbTableMetadata,
        resolve: &dyn Fn(&str) -> Option<EdmProperty>,
        prefix: &mut Vec<EdmProperty>,
        out: &mut Vec<DbEdmPropertyMapping>,
    ) -> Result<(), EdmxError> {
        for child in node.children().filter(|c| c.is_element()) {
            match child.tag_name().name() {
                "ScalarProperty" => {
                    let name = required_attribute(child, "Name")?;
                    let property =
                        resolve(name).ok_or_else(|| EdmxError::unresolved("property", name))?;
                    let column = column_ref(table, required_attribute(child, "ColumnName")?)?;
                    let mut path = prefix.clone();
                    path.push(property);
                    out.push(DbEdmPropertyMapping::new(path, column));
                }
                "ComplexProperty" => {
                    let name = required_attribute(child, "Name")?;
                    let property =
                        resolve(name).ok_or_else(|| EdmxError::unresolved("property", name))?;
                    let type_name = child
                        .attribute("TypeName")
                        .or(property.complex_type_name())
                        .unwrap_or_default()
                        .to_string();
                    let complex = self
                        .model
                        .complex_type(&type_name)
                        .ok_or_else(|| EdmxError::unresolved("complex type", type_name.as_str()))?;
                    let resolve_member = |member: &str| complex.property(member).cloned();

                    prefix.push(property);
                    self.property_mappings(child, table, &resolve_member, prefix, out)?;
                    prefix.pop();
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn association_set_mapping(
        &self,
        container: &EdmEntityContainer,
        node: Node<'_, '_>,
    ) -> Result<DbAssociationSetMapping, EdmxError> {
        let name = required_attribute(node, "Name")?;
        let association_type = container
            .association_set(name)
            .and_then(|s| self.model.association_type(&s.association_type))
            .ok_or_else(|| EdmxError::unresolved("association set", name))?;

        if node.attribute("StoreEntitySet").is_none() {
            if let Some(view) = query_view(node) {
                if first_child_named(node, "EndProperty").is_some()
                    || first_child_named(node, "Condition").is_some()
                {
                    return Err(EdmxError::invalid_schema(format!(
                        "association set mapping '{name}' maps ends or conditions without a 'StoreEntitySet'"
                    )));
                }
                trace!(association_set = name, "association set mapped by query view");
                return Ok(DbAssociationSetMapping::from_query_view(name, view));
            }
        }
        let table = self.table(required_attribute(node, "StoreEntitySet")?)?;

        let mut ends = Vec::with_capacity(2);
        for end_node in children_named(node, "EndProperty") {
            let role = required_attribute(end_node, "Name")?;
            let end = association_type
                .end(role)
                .ok_or_else(|| EdmxError::unresolved("association end", format!("{name}.{role}")))?;
            let end_type = self
                .model
                .entity_type(&end.entity_type)
                .ok_or_else(|| EdmxError::unresolved("entity type", end.entity_type.as_str()))?;

            let mut mapping = DbAssociationEndMapping::new(role);
            let resolve = |property: &str| self.model.find_property(end_type, property).cloned();
            self.property_mappings(
                end_node,
                table,
                &resolve,
                &mut Vec::new(),
                mapping.property_mappings.get_or_create(),
            )?;
            ends.push(mapping);
        }

        let [source_end, target_end]: [DbAssociationEndMapping; 2] =
            ends.try_into().map_err(|_| {
                EdmxError::invalid_schema(format!(
                    "association set mapping '{name}' must have two EndProperty elements"
                ))
            })?;

        let mut mapping = DbAssociationSetMapping::new(name, table.id, source_end, target_end);
        mapping.query_view = query_view(node);
        for condition in children_named(node, "Condition") {
            mapping
                .column_conditions
                .push(column_condition(condition, table)?);
        }
        Ok(mapping)
    }

    fn table(&self, entity_set: &str) -> Result<&DbTableMetadata, EdmxError> {
        self.database
            .table_by_name(entity_set)
            .ok_or_else(|| EdmxError::unresolved("store entity set", entity_set))
    }
}

/// `IsTypeOf(Ns.T)` -> (`Ns.T`, true); `Ns.T` -> (`Ns.T`, false).
fn split_type_of(type_name: &str) -> (&str, bool) {
    match type_name
        .strip_prefix(IS_TYPE_OF)
        .and_then(|rest| rest.strip_suffix(')'))
    {
        Some(inner) => (inner.trim(), true),
        None => (type_name, false),
    }
}

fn query_view(node: Node<'_, '_>) -> Option<DbQueryViewMapping> {
    first_child_named(node, "QueryView")
        .and_then(|q| q.text())
        .map(|text| DbQueryViewMapping::new(text.trim()))
}

fn column_ref(table: &DbTableMetadata, column: &str) -> Result<ColumnRef, EdmxError> {
    if table.column(column).is_none() {
        return Err(EdmxError::unresolved(
            "column",
            format!("{}.{}", table.name, column),
        ));
    }
    Ok(ColumnRef::new(table.id, column))
}

fn column_condition(node: Node<'_, '_>, table: &DbTableMetadata) -> Result<DbColumnCondition, EdmxError> {
    let column = column_ref(table, required_attribute(node, "ColumnName")?)?;
    let condition = match (node.attribute("Value"), bool_attribute(node, "IsNull")?) {
        (Some(value), _) => DbColumnCondition::equals(column, value),
        (None, Some(is_null)) => DbColumnCondition::null_check(column, is_null),
        (None, None) => {
            return Err(EdmxError::invalid_schema(format!(
                "condition on column '{}' needs a Value or IsNull attribute",
                column.column
            )))
        }
    };
    Ok(condition)
}
