//! SSDL serialization as a store visitor, including the association
//! multiplicity rules derived from foreign keys.

use std::collections::HashSet;
use std::io::Write;

use anyhow::anyhow;

use super::schema_writer::SsdlSchemaWriter;
use crate::edm::RelationshipMultiplicity;
use crate::store::{
    walk_database, walk_table, DbDatabaseMetadata, DbDatabaseVisitor,
    DbForeignKeyConstraintMetadata, DbTableColumnMetadata, DbTableMetadata, OperationAction,
};

/// Suffix given to the dependent role of a self-referencing foreign key.
pub const SELF_ROLE_SUFFIX: &str = "Self";

/// Principal and dependent multiplicities implied by a foreign key.
///
/// The principal end is required when no dependent column is nullable. When
/// the dependent columns are exactly the dependent table's key the
/// relationship is one to zero-or-one.
pub fn infer_multiplicity(
    dependent: &DbTableMetadata,
    constraint: &DbForeignKeyConstraintMetadata,
) -> (RelationshipMultiplicity, RelationshipMultiplicity) {
    let mut principal = RelationshipMultiplicity::ZeroOrOne;
    let mut dependent_multiplicity = RelationshipMultiplicity::Many;

    let any_nullable = constraint
        .dependent_columns
        .iter()
        .any(|name| dependent.column(name).is_some_and(|c| c.is_nullable));
    if !any_nullable {
        principal = RelationshipMultiplicity::One;
    }

    let key: Vec<&str> = dependent.key_columns().map(|c| c.name.as_str()).collect();
    let fk: HashSet<&str> = constraint.dependent_columns.iter().map(String::as_str).collect();
    if constraint.dependent_columns.len() == key.len()
        && key.iter().all(|k| fk.contains(k))
    {
        principal = RelationshipMultiplicity::One;
        dependent_multiplicity = RelationshipMultiplicity::ZeroOrOne;
    }

    (principal, dependent_multiplicity)
}

/// Role names for the principal and dependent ends.
pub fn association_end_roles(
    principal: &DbTableMetadata,
    dependent: &DbTableMetadata,
) -> (String, String) {
    let dependent_role = if principal.id == dependent.id {
        format!("{}{}", dependent.name, SELF_ROLE_SUFFIX)
    } else {
        dependent.name.clone()
    };
    (principal.name.clone(), dependent_role)
}

pub struct SsdlSerializingVisitor<'a, W: Write> {
    writer: &'a mut SsdlSchemaWriter<W>,
}

impl<'a, W: Write> SsdlSerializingVisitor<'a, W> {
    pub fn new(writer: &'a mut SsdlSchemaWriter<W>) -> Self {
        Self { writer }
    }

    fn write_entity_container(&mut self, database: &DbDatabaseMetadata) -> anyhow::Result<()> {
        self.writer
            .write_entity_container_element_header(&database.name)?;
        for schema in &database.schemas {
            for table in &schema.tables {
                self.writer.write_entity_set_element(schema, table)?;
            }
        }
        for dependent in database.tables() {
            for constraint in &dependent.foreign_key_constraints {
                let principal = principal_table(database, constraint)?;
                let (principal_role, dependent_role) = association_end_roles(principal, dependent);
                self.writer.write_association_set_element(
                    &constraint.name,
                    [
                        (principal_role.as_str(), principal.name.as_str()),
                        (dependent_role.as_str(), dependent.name.as_str()),
                    ],
                )?;
            }
        }
        self.writer.write_end_element("EntityContainer")
    }
}

impl<W: Write> DbDatabaseVisitor for SsdlSerializingVisitor<'_, W> {
    type Error = anyhow::Error;

    fn visit_database(&mut self, database: &DbDatabaseMetadata) -> anyhow::Result<()> {
        let has_custom_annotations = database
            .tables()
            .flat_map(|t| t.columns.iter())
            .any(|c| c.annotations.iter().any(|a| a.is_custom()));

        self.writer
            .write_schema_element_header(database, has_custom_annotations)?;
        walk_database(self, database)?;
        self.write_entity_container(database)?;
        self.writer.write_end_element("Schema")
    }

    fn visit_table(
        &mut self,
        database: &DbDatabaseMetadata,
        table: &DbTableMetadata,
    ) -> anyhow::Result<()> {
        self.writer.write_entity_type_element_header(table)?;
        walk_table(self, database, table)?;
        self.writer.write_end_element("EntityType")
    }

    fn visit_column(
        &mut self,
        _table: &DbTableMetadata,
        column: &DbTableColumnMetadata,
    ) -> anyhow::Result<()> {
        self.writer.write_property(column)
    }

    fn visit_foreign_key(
        &mut self,
        database: &DbDatabaseMetadata,
        dependent: &DbTableMetadata,
        constraint: &DbForeignKeyConstraintMetadata,
    ) -> anyhow::Result<()> {
        let principal = principal_table(database, constraint)?;
        let (principal_multiplicity, dependent_multiplicity) =
            infer_multiplicity(dependent, constraint);
        let (principal_role, dependent_role) = association_end_roles(principal, dependent);

        self.writer
            .write_association_type_element_header(&constraint.name)?;
        self.writer.write_association_end(
            &principal_role,
            principal,
            principal_multiplicity,
            constraint.delete_action,
        )?;
        self.writer.write_association_end(
            &dependent_role,
            dependent,
            dependent_multiplicity,
            OperationAction::None,
        )?;

        let principal_columns: Vec<&str> = principal.key_columns().map(|c| c.name.as_str()).collect();
        let dependent_columns: Vec<&str> =
            constraint.dependent_columns.iter().map(String::as_str).collect();
        self.writer.write_referential_constraint(
            &principal_role,
            &principal_columns,
            &dependent_role,
            &dependent_columns,
        )?;
        self.writer.write_end_element("Association")
    }
}

fn principal_table<'d>(
    database: &'d DbDatabaseMetadata,
    constraint: &DbForeignKeyConstraintMetadata,
) -> anyhow::Result<&'d DbTableMetadata> {
    database.table(constraint.principal_table).ok_or_else(|| {
        anyhow!(
            "foreign key '{}' references missing principal table {}",
            constraint.name,
            constraint.principal_table
        )
    })
}
