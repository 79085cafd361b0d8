//! Build a [`DbDatabaseMetadata`] from an SSDL `Schema` element.

use std::collections::HashMap;

use roxmltree::Node;
use tracing::{debug, warn};

use super::{
    DbDatabaseMetadata, DbForeignKeyConstraintMetadata, DbProviderInfo, DbTableColumnMetadata,
    OperationAction, StoreGeneratedPattern, TableId,
};
use crate::annotation::{serializer_for, DataModelAnnotation};
use crate::error::EdmxError;
use crate::schema::{try_version_for_namespace, SchemaKind, CUSTOM_ANNOTATION_NAMESPACE};
use crate::xml::reader::{
    bool_attribute, children_named, first_child_named, number_attribute, required_attribute,
    resolve_alias,
};

const DEFAULT_SCHEMA: &str = "dbo";

/// Read an SSDL `Schema` element in any supported SSDL namespace.
pub fn read_ssdl(schema: Node<'_, '_>) -> Result<DbDatabaseMetadata, EdmxError> {
    let version = match schema
        .tag_name()
        .namespace()
        .and_then(try_version_for_namespace)
    {
        Some((SchemaKind::Ssdl, version)) => version,
        _ => {
            return Err(EdmxError::invalid_schema(format!(
                "'{}' is not an SSDL Schema element",
                schema.tag_name().name()
            )))
        }
    };

    let namespace = required_attribute(schema, "Namespace")?;
    let alias = schema.attribute("Alias");
    let qualify = |name: &str| resolve_alias(name, alias, namespace);

    let container = first_child_named(schema, "EntityContainer")
        .ok_or_else(|| EdmxError::invalid_schema("SSDL schema has no EntityContainer"))?;

    let mut database =
        DbDatabaseMetadata::new(required_attribute(container, "Name")?, namespace, version);
    let defaults = DbProviderInfo::default();
    database.provider = DbProviderInfo {
        provider_invariant_name: schema
            .attribute("Provider")
            .map(str::to_string)
            .unwrap_or(defaults.provider_invariant_name),
        provider_manifest_token: schema
            .attribute("ProviderManifestToken")
            .map(str::to_string)
            .unwrap_or(defaults.provider_manifest_token),
    };

    let mut entity_types = HashMap::new();
    for node in children_named(schema, "EntityType") {
        let name = format!("{}.{}", namespace, required_attribute(node, "Name")?);
        entity_types.insert(name, read_columns(node)?);
    }

    // Tables come from entity sets; the entity type only supplies columns.
    let mut tables_by_type: HashMap<String, TableId> = HashMap::new();
    for set in children_named(container, "EntitySet") {
        let name = required_attribute(set, "Name")?;
        let entity_type = qualify(required_attribute(set, "EntityType")?);
        let columns = entity_types
            .get(&entity_type)
            .cloned()
            .ok_or_else(|| EdmxError::unresolved("entity type", entity_type.as_str()))?;
        let schema_name = set.attribute("Schema").unwrap_or(DEFAULT_SCHEMA);

        let id = database.add_table(schema_name, name, columns);
        if let Some(table) = database.table_mut(id) {
            if let Some(identifier) = set.attribute("Table") {
                table.database_identifier = identifier.to_string();
            }
        }
        tables_by_type.insert(entity_type, id);
    }

    for association in children_named(schema, "Association") {
        read_foreign_key(association, &qualify, &tables_by_type, &mut database)?;
    }

    debug!(
        container = %database.name,
        tables = database.tables().count(),
        "read store schema"
    );
    Ok(database)
}

fn read_columns(entity_type: Node<'_, '_>) -> Result<Vec<DbTableColumnMetadata>, EdmxError> {
    let key: Vec<&str> = match first_child_named(entity_type, "Key") {
        Some(key) => children_named(key, "PropertyRef")
            .map(|r| required_attribute(r, "Name"))
            .collect::<Result<_, _>>()?,
        None => Vec::new(),
    };

    children_named(entity_type, "Property")
        .map(|property| -> Result<DbTableColumnMetadata, EdmxError> {
            let mut column = read_column(property)?;
            column.is_primary_key_column = key.contains(&column.name.as_str());
            Ok(column)
        })
        .collect()
}

fn read_column(property: Node<'_, '_>) -> Result<DbTableColumnMetadata, EdmxError> {
    let mut column = DbTableColumnMetadata::new(
        required_attribute(property, "Name")?,
        required_attribute(property, "Type")?,
    );
    column.is_nullable = bool_attribute(property, "Nullable")?.unwrap_or(true);

    let facets = &mut column.facets;
    facets.is_fixed_length = bool_attribute(property, "FixedLength")?;
    facets.is_unicode = bool_attribute(property, "Unicode")?;
    match property.attribute("MaxLength") {
        Some(v) if v.eq_ignore_ascii_case("max") => facets.is_max_length = true,
        Some(_) => facets.max_length = number_attribute(property, "MaxLength")?,
        None => {}
    }
    facets.precision = number_attribute(property, "Precision")?;
    facets.scale = number_attribute(property, "Scale")?;

    if let Some(pattern) = property.attribute("StoreGeneratedPattern") {
        column.store_generated_pattern = StoreGeneratedPattern::parse(pattern).ok_or_else(|| {
            EdmxError::invalid_schema(format!(
                "column '{}' has an unknown StoreGeneratedPattern '{}'",
                column.name, pattern
            ))
        })?;
    }

    for attribute in property.attributes() {
        if attribute.namespace() != Some(CUSTOM_ANNOTATION_NAMESPACE) {
            continue;
        }
        let name = attribute.name();
        let value = serializer_for(name).deserialize(name, attribute.value())?;
        column
            .annotations
            .push(DataModelAnnotation::custom(name, value));
    }

    Ok(column)
}

fn read_foreign_key(
    association: Node<'_, '_>,
    qualify: &impl Fn(&str) -> String,
    tables_by_type: &HashMap<String, TableId>,
    database: &mut DbDatabaseMetadata,
) -> Result<(), EdmxError> {
    let name = required_attribute(association, "Name")?;
    let Some(constraint) = first_child_named(association, "ReferentialConstraint") else {
        warn!(association = name, "skipping store association without a referential constraint");
        return Ok(());
    };

    let principal = first_child_named(constraint, "Principal")
        .ok_or_else(|| EdmxError::invalid_schema(format!("association '{name}' has no Principal")))?;
    let dependent = first_child_named(constraint, "Dependent")
        .ok_or_else(|| EdmxError::invalid_schema(format!("association '{name}' has no Dependent")))?;
    let principal_role = required_attribute(principal, "Role")?;
    let dependent_role = required_attribute(dependent, "Role")?;

    let principal_end = association_end(association, name, principal_role)?;
    let dependent_end = association_end(association, name, dependent_role)?;
    let principal_table = end_table(principal_end, qualify, tables_by_type)?;
    let dependent_table = end_table(dependent_end, qualify, tables_by_type)?;

    let delete_action = match first_child_named(principal_end, "OnDelete")
        .and_then(|d| d.attribute("Action"))
    {
        Some("Cascade") => OperationAction::Cascade,
        _ => OperationAction::None,
    };

    let dependent_columns = children_named(dependent, "PropertyRef")
        .map(|r| required_attribute(r, "Name").map(str::to_string))
        .collect::<Result<Vec<_>, _>>()?;

    database.add_foreign_key(
        dependent_table,
        DbForeignKeyConstraintMetadata {
            name: name.to_string(),
            principal_table,
            dependent_columns,
            delete_action,
        },
    );
    Ok(())
}

fn association_end<'a, 'input>(
    association: Node<'a, 'input>,
    association_name: &str,
    role: &str,
) -> Result<Node<'a, 'input>, EdmxError> {
    children_named(association, "End")
        .find(|e| e.attribute("Role") == Some(role))
        .ok_or_else(|| EdmxError::unresolved("association end", format!("{association_name}.{role}")))
}

fn end_table(
    end: Node<'_, '_>,
    qualify: &impl Fn(&str) -> String,
    tables_by_type: &HashMap<String, TableId>,
) -> Result<TableId, EdmxError> {
    let entity_type = qualify(required_attribute(end, "Type")?);
    tables_by_type
        .get(&entity_type)
        .copied()
        .ok_or_else(|| EdmxError::unresolved("entity type", entity_type))
}
