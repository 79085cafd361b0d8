//! Element-level SSDL writing.
//!
//! Each method writes one SSDL construct. Element order and nesting are the
//! caller's responsibility; see [`super::SsdlSerializingVisitor`].

use std::io::Write;

use quick_xml::Writer;

use crate::annotation::serializer_for;
use crate::edm::RelationshipMultiplicity;
use crate::schema::{
    ssdl_namespace, EntityFrameworkVersion, CUSTOM_ANNOTATION_NAMESPACE,
    ENTITY_STORE_SCHEMA_GENERATOR_NAMESPACE,
};
use crate::store::{
    DbDatabaseMetadata, DbSchemaMetadata, DbTableColumnMetadata, DbTableMetadata,
    OperationAction, StoreGeneratedPattern,
};
use crate::xml::writer::{write_empty, write_end, write_property_ref, write_start, xml_bool};

/// Alias used for type references inside the schema.
pub const SSDL_ALIAS: &str = "Self";

/// Written for unbounded `MaxLength` facets.
pub const MAX_LENGTH_SENTINEL: &str = "max";

pub struct SsdlSchemaWriter<W: Write> {
    writer: Writer<W>,
    version: EntityFrameworkVersion,
}

impl<W: Write> SsdlSchemaWriter<W> {
    pub fn new(writer: Writer<W>, version: EntityFrameworkVersion) -> Self {
        Self { writer, version }
    }

    pub fn version(&self) -> EntityFrameworkVersion {
        self.version
    }

    /// Custom annotations are only representable from EF 3 on.
    pub fn supports_custom_annotations(&self) -> bool {
        self.version >= EntityFrameworkVersion::V3
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    pub fn write_schema_element_header(
        &mut self,
        database: &DbDatabaseMetadata,
        has_custom_annotations: bool,
    ) -> anyhow::Result<()> {
        let mut attributes = vec![
            ("Namespace", database.namespace.as_str()),
            ("Provider", database.provider.provider_invariant_name.as_str()),
            (
                "ProviderManifestToken",
                database.provider.provider_manifest_token.as_str(),
            ),
            ("Alias", SSDL_ALIAS),
            ("xmlns:store", ENTITY_STORE_SCHEMA_GENERATOR_NAMESPACE),
        ];
        if has_custom_annotations && self.supports_custom_annotations() {
            attributes.push(("xmlns:customannotation", CUSTOM_ANNOTATION_NAMESPACE));
        }
        attributes.push(("xmlns", ssdl_namespace(self.version)));
        write_start(&mut self.writer, "Schema", &attributes)
    }

    /// `<EntityType Name>` followed by its `Key`, if the table has one.
    pub fn write_entity_type_element_header(
        &mut self,
        table: &DbTableMetadata,
    ) -> anyhow::Result<()> {
        write_start(&mut self.writer, "EntityType", &[("Name", table.name.as_str())])?;

        let mut keys = table.key_columns().peekable();
        if keys.peek().is_some() {
            write_start(&mut self.writer, "Key", &[])?;
            for column in keys {
                write_property_ref(&mut self.writer, &column.name)?;
            }
            write_end(&mut self.writer, "Key")?;
        }
        Ok(())
    }

    pub fn write_property(&mut self, column: &DbTableColumnMetadata) -> anyhow::Result<()> {
        let facets = &column.facets;
        let mut owned: Vec<(&str, String)> = Vec::new();

        if let Some(fixed) = facets.is_fixed_length {
            owned.push(("FixedLength", xml_bool(fixed).to_string()));
        }
        if let Some(unicode) = facets.is_unicode {
            owned.push(("Unicode", xml_bool(unicode).to_string()));
        }
        if let Some(max_length) = facets.max_length {
            owned.push(("MaxLength", max_length.to_string()));
        } else if facets.is_max_length {
            owned.push(("MaxLength", MAX_LENGTH_SENTINEL.to_string()));
        }
        if let Some(precision) = facets.precision {
            owned.push(("Precision", precision.to_string()));
        }
        if let Some(scale) = facets.scale {
            owned.push(("Scale", scale.to_string()));
        }
        if column.store_generated_pattern != StoreGeneratedPattern::None {
            owned.push((
                "StoreGeneratedPattern",
                column.store_generated_pattern.as_str().to_string(),
            ));
        }
        owned.push(("Nullable", xml_bool(column.is_nullable).to_string()));

        let mut annotation_names = Vec::new();
        if self.supports_custom_annotations() {
            for annotation in column.annotations.iter().filter(|a| a.is_custom()) {
                let text = serializer_for(&annotation.name).serialize(&annotation.name, &annotation.value)?;
                annotation_names.push((format!("customannotation:{}", annotation.name), text));
            }
        }

        let mut attributes = vec![("Name", column.name.as_str()), ("Type", column.type_name.as_str())];
        attributes.extend(owned.iter().map(|(k, v)| (*k, v.as_str())));
        attributes.extend(annotation_names.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        write_empty(&mut self.writer, "Property", &attributes)
    }

    pub fn write_association_type_element_header(&mut self, name: &str) -> anyhow::Result<()> {
        write_start(&mut self.writer, "Association", &[("Name", name)])
    }

    /// `<End Role Type Multiplicity>`, with an `OnDelete` child for cascades.
    pub fn write_association_end(
        &mut self,
        role: &str,
        table: &DbTableMetadata,
        multiplicity: RelationshipMultiplicity,
        delete_action: OperationAction,
    ) -> anyhow::Result<()> {
        let type_name = qualified(&table.name);
        let attributes = [
            ("Role", role),
            ("Type", type_name.as_str()),
            ("Multiplicity", multiplicity.as_str()),
        ];
        match delete_action {
            OperationAction::Cascade => {
                write_start(&mut self.writer, "End", &attributes)?;
                write_empty(&mut self.writer, "OnDelete", &[("Action", "Cascade")])?;
                write_end(&mut self.writer, "End")
            }
            OperationAction::None => write_empty(&mut self.writer, "End", &attributes),
        }
    }

    pub fn write_referential_constraint(
        &mut self,
        principal_role: &str,
        principal_columns: &[&str],
        dependent_role: &str,
        dependent_columns: &[&str],
    ) -> anyhow::Result<()> {
        write_start(&mut self.writer, "ReferentialConstraint", &[])?;
        for (element, role, columns) in [
            ("Principal", principal_role, principal_columns),
            ("Dependent", dependent_role, dependent_columns),
        ] {
            write_start(&mut self.writer, element, &[("Role", role)])?;
            for column in columns {
                write_property_ref(&mut self.writer, column)?;
            }
            write_end(&mut self.writer, element)?;
        }
        write_end(&mut self.writer, "ReferentialConstraint")
    }

    pub fn write_entity_container_element_header(&mut self, name: &str) -> anyhow::Result<()> {
        write_start(&mut self.writer, "EntityContainer", &[("Name", name)])
    }

    pub fn write_entity_set_element(
        &mut self,
        schema: &DbSchemaMetadata,
        table: &DbTableMetadata,
    ) -> anyhow::Result<()> {
        let entity_type = qualified(&table.name);
        write_empty(
            &mut self.writer,
            "EntitySet",
            &[
                ("Name", table.name.as_str()),
                ("EntityType", entity_type.as_str()),
                ("Schema", schema.database_identifier.as_str()),
                ("Table", table.database_identifier.as_str()),
                ("store:Type", "Tables"),
            ],
        )
    }

    /// `<AssociationSet>` with its two `End` elements.
    pub fn write_association_set_element(
        &mut self,
        name: &str,
        ends: [(&str, &str); 2],
    ) -> anyhow::Result<()> {
        let association = qualified(name);
        write_start(
            &mut self.writer,
            "AssociationSet",
            &[("Name", name), ("Association", association.as_str())],
        )?;
        for (role, entity_set) in ends {
            write_empty(&mut self.writer, "End", &[("Role", role), ("EntitySet", entity_set)])?;
        }
        write_end(&mut self.writer, "AssociationSet")
    }

    pub fn write_end_element(&mut self, name: &str) -> anyhow::Result<()> {
        write_end(&mut self.writer, name)
    }
}

fn qualified(name: &str) -> String {
    format!("{}.{}", SSDL_ALIAS, name)
}
