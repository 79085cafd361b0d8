//! Entity-SQL query views compiled from a mapping.
//!
//! Each entity set becomes a `UNION ALL` of one branch per concrete type in
//! its hierarchy; each association set becomes a projection of two
//! `CreateRef` calls. Output is deterministic: branches follow type
//! declaration order and table aliases follow first use.

use tracing::{debug, trace};

use crate::edm::{EdmEntityContainer, EdmEntityType, EdmProperty};
use crate::error::EdmxError;
use crate::mapping::{
    DbAssociationEndMapping, DbAssociationSetMapping, DbDatabaseMapping, DbEntitySetMapping,
    DbEntityTypeMapping, DbEntityTypeMappingFragment,
};
use crate::parser::identifier_utils::{quote_identifier, quote_qualified};
use crate::store::{ColumnRef, TableId};

/// Store types whose condition literals are written unquoted.
const NUMERIC_STORE_TYPES: &[&str] = &[
    "bigint",
    "bit",
    "decimal",
    "float",
    "int",
    "money",
    "numeric",
    "real",
    "smallint",
    "smallmoney",
    "tinyint",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewTarget {
    EntitySet,
    AssociationSet,
}

/// The query view of one conceptual set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingView {
    /// Conceptual entity container name.
    pub container: String,
    /// Entity set or association set name.
    pub set: String,
    pub target: ViewTarget,
    pub query: String,
}

/// Compile a query view for every entity set and association set mapping.
pub fn generate_views(mapping: &DbDatabaseMapping) -> Result<Vec<MappingView>, EdmxError> {
    let mut views = Vec::new();

    for container_mapping in mapping.entity_container_mappings.iter() {
        let container = mapping
            .model
            .container(&container_mapping.entity_container)
            .ok_or_else(|| {
                EdmxError::unresolved("entity container", container_mapping.entity_container.as_str())
            })?;

        for set in container_mapping.entity_set_mappings.iter() {
            let query = match &set.query_view {
                Some(view) => view.query.clone(),
                None => entity_set_view(mapping, container, set)?,
            };
            views.push(MappingView {
                container: container.name.clone(),
                set: set.entity_set.clone(),
                target: ViewTarget::EntitySet,
                query,
            });
        }

        for set in container_mapping.association_set_mappings.iter() {
            let query = match &set.query_view {
                Some(view) => view.query.clone(),
                None => association_set_view(mapping, container, set)?,
            };
            views.push(MappingView {
                container: container.name.clone(),
                set: set.association_set.clone(),
                target: ViewTarget::AssociationSet,
                query,
            });
        }
    }

    debug!(views = views.len(), "generated mapping views");
    Ok(views)
}

fn view_error(set: &str, message: String) -> EdmxError {
    EdmxError::ViewGenerationError {
        set: set.to_string(),
        message,
    }
}

fn entity_set_view(
    mapping: &DbDatabaseMapping,
    container: &EdmEntityContainer,
    set: &DbEntitySetMapping,
) -> Result<String, EdmxError> {
    let model = &mapping.model;
    let edm_set = container
        .entity_set(&set.entity_set)
        .ok_or_else(|| EdmxError::unresolved("entity set", set.entity_set.as_str()))?;

    let concrete: Vec<&EdmEntityType> = model
        .type_and_descendants(&edm_set.element_type)
        .into_iter()
        .filter(|t| !t.is_abstract)
        .collect();

    let mut branches = Vec::with_capacity(concrete.len());
    for &entity_type in &concrete {
        let type_name = entity_type.full_name();
        let applicable: Vec<&DbEntityTypeMapping> = set
            .entity_type_mappings
            .iter()
            .filter(|m| m.applies_to(model, &type_name))
            .collect();
        let fragments: Vec<&DbEntityTypeMappingFragment> =
            applicable.iter().flat_map(|m| m.fragments.iter()).collect();
        if fragments.is_empty() {
            return Err(view_error(
                &set.entity_set,
                format!("entity type '{type_name}' has no mapping fragment"),
            ));
        }

        // A branch built only from an ancestor's unconditioned fragments
        // would also select the rows of every sibling type.
        let inherited_only = applicable.iter().all(|m| m.entity_type != type_name);
        if inherited_only && concrete.len() > 1 && !fragments.iter().any(|f| f.has_conditions()) {
            return Err(view_error(
                &set.entity_set,
                format!(
                    "entity type '{type_name}' has no mapping fragment of its own and \
its inherited fragments do not distinguish it from other types"
                ),
            ));
        }

        let branch = type_query(mapping, entity_type, &fragments)
            .map_err(|message| view_error(&set.entity_set, message))?;
        trace!(set = %set.entity_set, entity_type = %type_name, fragments = fragments.len(), "compiled view branch");
        branches.push(branch);
    }

    if branches.is_empty() {
        return Err(view_error(
            &set.entity_set,
            format!("'{}' has no concrete entity type", edm_set.element_type),
        ));
    }
    Ok(branches.join("\nUNION ALL\n"))
}

/// `SELECT VALUE` branch constructing one concrete type from its fragments.
fn type_query(
    mapping: &DbDatabaseMapping,
    entity_type: &EdmEntityType,
    fragments: &[&DbEntityTypeMappingFragment],
) -> Result<String, String> {
    let mut scope = TableScope::new(mapping);
    for fragment in fragments {
        scope.add(fragment.table);
    }

    let key = mapping.model.key_properties(entity_type);
    let mut key_columns = Vec::with_capacity(scope.tables.len());
    for &table in &scope.tables {
        let mut columns = Vec::with_capacity(key.len());
        for property in key {
            let column = fragments
                .iter()
                .filter(|f| f.table == table)
                .find_map(|f| f.property_mapping(&[property.as_str()]))
                .map(|m| &m.column)
                .ok_or_else(|| {
                    format!(
                        "table '{}' does not map key property '{}'",
                        scope.table_name(table),
                        property
                    )
                })?;
            columns.push(column);
        }
        key_columns.push(columns);
    }

    let mut conditions = Vec::new();
    for fragment in fragments {
        for condition in fragment.column_conditions.iter() {
            let rendered = scope.condition(&condition.column, condition.value.as_deref(), condition.is_null)?;
            if !conditions.contains(&rendered) {
                conditions.push(rendered);
            }
        }
        for condition in fragment.property_conditions.iter() {
            let column = fragment
                .property_mappings
                .iter()
                .find(|m| m.leaf().is_some_and(|p| p.name == condition.property.name))
                .map(|m| &m.column)
                .ok_or_else(|| {
                    format!(
                        "condition on property '{}' has no mapped column",
                        condition.property.name
                    )
                })?;
            let rendered = scope.condition(column, condition.value.as_deref(), condition.is_null)?;
            if !conditions.contains(&rendered) {
                conditions.push(rendered);
            }
        }
    }

    let properties = mapping.model.all_properties(entity_type);
    let mut path = Vec::new();
    let constructor = construct(
        &scope,
        &entity_type.full_name(),
        &properties,
        &mut path,
        fragments,
    )?;

    let mut query = format!("SELECT VALUE {} FROM {}", constructor, scope.from_clause(&key_columns)?);
    push_where(&mut query, &conditions);
    Ok(query)
}

/// Type constructor over `properties`, nesting complex properties and
/// writing `NULL` for properties no fragment maps.
fn construct(
    scope: &TableScope<'_>,
    type_name: &str,
    properties: &[&EdmProperty],
    path: &mut Vec<String>,
    fragments: &[&DbEntityTypeMappingFragment],
) -> Result<String, String> {
    let mut arguments = Vec::with_capacity(properties.len());
    for property in properties {
        path.push(property.name.clone());
        let argument = match property.complex_type_name() {
            Some(complex_name) => {
                let complex = scope
                    .mapping
                    .model
                    .complex_type(complex_name)
                    .ok_or_else(|| format!("complex type '{complex_name}' is not in the model"))?;
                let nested: Vec<&EdmProperty> = complex.properties.iter().collect();
                construct(scope, complex_name, &nested, path, fragments)?
            }
            None => {
                let names: Vec<&str> = path.iter().map(String::as_str).collect();
                match fragments.iter().find_map(|f| f.property_mapping(&names)) {
                    Some(m) => scope.column(&m.column)?,
                    None => "NULL".to_string(),
                }
            }
        };
        path.pop();
        arguments.push(argument);
    }
    Ok(format!("{}({})", type_name, arguments.join(", ")))
}

fn association_set_view(
    mapping: &DbDatabaseMapping,
    container: &EdmEntityContainer,
    set: &DbAssociationSetMapping,
) -> Result<String, EdmxError> {
    let edm_set = container
        .association_set(&set.association_set)
        .ok_or_else(|| EdmxError::unresolved("association set", set.association_set.as_str()))?;
    let association = mapping
        .model
        .association_type(&edm_set.association_type)
        .ok_or_else(|| EdmxError::unresolved("association type", edm_set.association_type.as_str()))?;

    let fail = |message: String| view_error(&set.association_set, message);
    let (Some(table), Some((source_end, target_end))) = (set.table, set.ends()) else {
        return Err(fail("no store table or end mappings to build a view from".to_string()));
    };
    let mut scope = TableScope::new(mapping);
    scope.add(table);

    let create_ref = |end: &DbAssociationEndMapping| -> Result<String, EdmxError> {
        let (edm_end, entity_set) = if end.association_end == association.source_end.role {
            (&association.source_end, &edm_set.source_set)
        } else if end.association_end == association.target_end.role {
            (&association.target_end, &edm_set.target_set)
        } else {
            return Err(EdmxError::unresolved("association end", end.association_end.as_str()));
        };
        if end.property_mappings.is_empty() {
            return Err(fail(format!("end '{}' maps no key column", end.association_end)));
        }
        let columns = end
            .property_mappings
            .iter()
            .map(|m| scope.column(&m.column))
            .collect::<Result<Vec<_>, _>>()
            .map_err(fail)?;
        Ok(format!(
            "CreateRef({}.{}, row({}), {})",
            container.name,
            entity_set,
            columns.join(", "),
            edm_end.entity_type
        ))
    };

    let source = create_ref(source_end)?;
    let target = create_ref(target_end)?;

    let mut conditions = Vec::new();
    for condition in set.column_conditions.iter() {
        conditions.push(
            scope
                .condition(&condition.column, condition.value.as_deref(), condition.is_null)
                .map_err(fail)?,
        );
    }

    let mut query = format!(
        "SELECT VALUE {}({}, {}) FROM {}",
        association.full_name(),
        source,
        target,
        scope.from_clause(&[]).map_err(fail)?
    );
    push_where(&mut query, &conditions);
    Ok(query)
}

fn push_where(query: &mut String, conditions: &[String]) {
    if !conditions.is_empty() {
        query.push_str(" WHERE ");
        query.push_str(&conditions.join(" AND "));
    }
}

/// Store tables referenced by one query, aliased `T1`, `T2`, ... in the
/// order they were added.
struct TableScope<'m> {
    mapping: &'m DbDatabaseMapping,
    tables: Vec<TableId>,
}

impl<'m> TableScope<'m> {
    fn new(mapping: &'m DbDatabaseMapping) -> Self {
        Self {
            mapping,
            tables: Vec::new(),
        }
    }

    fn add(&mut self, table: TableId) {
        if !self.tables.contains(&table) {
            self.tables.push(table);
        }
    }

    fn alias(&self, table: TableId) -> Result<String, String> {
        self.tables
            .iter()
            .position(|t| *t == table)
            .map(|i| format!("T{}", i + 1))
            .ok_or_else(|| format!("table {} is not part of the query", table))
    }

    fn table_name(&self, table: TableId) -> &'m str {
        self.mapping
            .database
            .table(table)
            .map(|t| t.name.as_str())
            .unwrap_or_default()
    }

    fn column(&self, column: &ColumnRef) -> Result<String, String> {
        Ok(format!(
            "{}.{}",
            self.alias(column.table)?,
            quote_identifier(&column.column)
        ))
    }

    fn condition(
        &self,
        column: &ColumnRef,
        value: Option<&str>,
        is_null: Option<bool>,
    ) -> Result<String, String> {
        let target = self.column(column)?;
        match (value, is_null) {
            (Some(value), _) => Ok(format!("{} = {}", target, self.literal(column, value))),
            (None, Some(true)) => Ok(format!("{target} IS NULL")),
            (None, Some(false)) => Ok(format!("{target} IS NOT NULL")),
            (None, None) => Err(format!(
                "condition on column '{}' has neither a value nor a null check",
                column.column
            )),
        }
    }

    fn literal(&self, column: &ColumnRef, value: &str) -> String {
        let numeric = self
            .mapping
            .database
            .column(column)
            .is_some_and(|c| NUMERIC_STORE_TYPES.contains(&c.type_name.to_ascii_lowercase().as_str()));
        if numeric {
            value.to_string()
        } else {
            format!("'{}'", value.replace('\'', "''"))
        }
    }

    /// `FROM` source joining every table to the first on the key columns in
    /// `key_columns` (one list per table, same order as the scope).
    fn from_clause(&self, key_columns: &[Vec<&ColumnRef>]) -> Result<String, String> {
        let container = self.mapping.database.name.as_str();
        let mut from = String::new();
        for (i, &table) in self.tables.iter().enumerate() {
            let name = self
                .mapping
                .database
                .table(table)
                .map(|t| t.name.as_str())
                .ok_or_else(|| format!("mapping references missing table {}", table))?;
            let source = format!("{} AS {}", quote_qualified(&[container, name]), self.alias(table)?);
            if i == 0 {
                from.push_str(&source);
                continue;
            }

            let (Some(first), Some(current)) = (key_columns.first(), key_columns.get(i)) else {
                return Err(format!("no join columns for table '{name}'"));
            };
            let mut on = Vec::with_capacity(first.len());
            for (left, right) in first.iter().zip(current) {
                on.push(format!("{} = {}", self.column(left)?, self.column(right)?));
            }
            from.push_str(&format!(" INNER JOIN {} ON {}", source, on.join(" AND ")));
        }
        Ok(from)
    }
}
