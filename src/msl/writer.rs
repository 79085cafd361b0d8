//! MSL generation as a mapping visitor.

use std::io::Write;

use anyhow::{anyhow, Context};
use quick_xml::Writer;

use crate::edm::EdmProperty;
use crate::mapping::{
    DbColumnCondition, DbDatabaseMapping, DbEdmPropertyMapping, DbPropertyCondition, MappingNode,
    MappingVisitor, Walk,
};
use crate::schema::{msl_namespace, EntityFrameworkVersion};
use crate::xml::writer::{write_empty, write_end, write_start, write_text_element, xml_bool};

/// Mapping space attribute value for conceptual-to-store mappings.
pub const MAPPING_SPACE: &str = "C-S";

pub struct MslWriter<'m, W: Write> {
    writer: Writer<W>,
    mapping: &'m DbDatabaseMapping,
    version: EntityFrameworkVersion,
    /// Names of the `ComplexProperty` elements currently open.
    open_complex: Vec<String>,
    /// Conceptual container of the container mapping being written.
    container: Option<String>,
}

impl<'m, W: Write> MslWriter<'m, W> {
    pub fn new(writer: Writer<W>, mapping: &'m DbDatabaseMapping, version: EntityFrameworkVersion) -> Self {
        Self {
            writer,
            mapping,
            version,
            open_complex: Vec::new(),
            container: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn table_name(&self, table: crate::store::TableId) -> anyhow::Result<&'m str> {
        self.mapping
            .database
            .table(table)
            .map(|t| t.name.as_str())
            .ok_or_else(|| anyhow!("mapping references missing table {}", table))
    }

    fn close_complex_to(&mut self, depth: usize) -> anyhow::Result<()> {
        while self.open_complex.len() > depth {
            self.open_complex.pop();
            write_end(&mut self.writer, "ComplexProperty")?;
        }
        Ok(())
    }

    /// Reuse the open `ComplexProperty` elements shared with `path`, then open
    /// the rest of its complex prefix.
    fn open_complex_for(&mut self, path: &[EdmProperty]) -> anyhow::Result<()> {
        let prefix = &path[..path.len().saturating_sub(1)];
        let shared = self
            .open_complex
            .iter()
            .zip(prefix)
            .take_while(|(open, p)| **open == p.name)
            .count();
        self.close_complex_to(shared)?;

        for property in &prefix[shared..] {
            let type_name = property.complex_type_name().unwrap_or_default();
            write_start(
                &mut self.writer,
                "ComplexProperty",
                &[("Name", property.name.as_str()), ("TypeName", type_name)],
            )?;
            self.open_complex.push(property.name.clone());
        }
        Ok(())
    }

    fn write_property_mapping(&mut self, mapping: &DbEdmPropertyMapping) -> anyhow::Result<()> {
        let path = mapping.property_path.as_slice();
        let leaf = path
            .last()
            .ok_or_else(|| anyhow!("property mapping for column '{}' has an empty path", mapping.column.column))?;
        self.open_complex_for(path)?;
        write_empty(
            &mut self.writer,
            "ScalarProperty",
            &[("Name", leaf.name.as_str()), ("ColumnName", mapping.column.column.as_str())],
        )
    }

    fn write_condition(
        &mut self,
        target: (&str, &str),
        value: Option<&str>,
        is_null: Option<bool>,
    ) -> anyhow::Result<()> {
        let check = match (value, is_null) {
            (Some(value), _) => ("Value", value),
            (None, Some(is_null)) => ("IsNull", xml_bool(is_null)),
            (None, None) => {
                return Err(anyhow!(
                    "condition on '{}' has neither a value nor a null check",
                    target.1
                ))
            }
        };
        self.close_complex_to(0)?;
        write_empty(&mut self.writer, "Condition", &[target, check])
    }

    fn write_column_condition(&mut self, condition: &DbColumnCondition) -> anyhow::Result<()> {
        self.write_condition(
            ("ColumnName", condition.column.column.as_str()),
            condition.value.as_deref(),
            condition.is_null,
        )
    }

    fn write_property_condition(&mut self, condition: &DbPropertyCondition) -> anyhow::Result<()> {
        self.write_condition(
            ("Name", condition.property.name.as_str()),
            condition.value.as_deref(),
            condition.is_null,
        )
    }

    fn association_type_name(&self, association_set: &str) -> anyhow::Result<String> {
        let container = self.container.as_deref().unwrap_or_default();
        self.mapping
            .model
            .container(container)
            .and_then(|c| c.association_set(association_set))
            .map(|s| s.association_type.clone())
            .with_context(|| {
                format!("association set '{association_set}' is not in container '{container}'")
            })
    }
}

impl<W: Write> MappingVisitor for MslWriter<'_, W> {
    type Error = anyhow::Error;

    fn enter(&mut self, node: MappingNode<'_>) -> anyhow::Result<Walk> {
        match node {
            MappingNode::DatabaseMapping(_) => {
                write_start(
                    &mut self.writer,
                    "Mapping",
                    &[("Space", MAPPING_SPACE), ("xmlns", msl_namespace(self.version))],
                )?;
            }
            MappingNode::EntityContainerMapping(n) => {
                self.container = Some(n.entity_container.clone());
                write_start(
                    &mut self.writer,
                    "EntityContainerMapping",
                    &[
                        ("StorageEntityContainer", self.mapping.database.name.as_str()),
                        ("CdmEntityContainer", n.entity_container.as_str()),
                    ],
                )?;
            }
            MappingNode::EntitySetMapping(n) => {
                write_start(&mut self.writer, "EntitySetMapping", &[("Name", n.entity_set.as_str())])?;
            }
            MappingNode::QueryViewMapping(n) => {
                write_text_element(&mut self.writer, "QueryView", &n.query)?;
            }
            MappingNode::EntityTypeMapping(n) => {
                let type_name = if n.is_hierarchy_mapping {
                    format!("IsTypeOf({})", n.entity_type)
                } else {
                    n.entity_type.clone()
                };
                write_start(&mut self.writer, "EntityTypeMapping", &[("TypeName", type_name.as_str())])?;
            }
            MappingNode::EntityTypeMappingFragment(n) => {
                let table = self.table_name(n.table)?;
                write_start(&mut self.writer, "MappingFragment", &[("StoreEntitySet", table)])?;
            }
            MappingNode::EdmPropertyMapping(n) => self.write_property_mapping(n)?,
            MappingNode::ColumnCondition(n) => self.write_column_condition(n)?,
            MappingNode::PropertyCondition(n) => self.write_property_condition(n)?,
            MappingNode::AssociationSetMapping(n) => {
                let type_name = self.association_type_name(&n.association_set)?;
                let mut attributes = vec![
                    ("Name", n.association_set.as_str()),
                    ("TypeName", type_name.as_str()),
                ];
                match n.table {
                    Some(table) => attributes.push(("StoreEntitySet", self.table_name(table)?)),
                    None if n.query_view.is_none() => {
                        return Err(anyhow!(
                            "association set mapping '{}' has neither a store table nor a query view",
                            n.association_set
                        ))
                    }
                    None => {}
                }
                write_start(&mut self.writer, "AssociationSetMapping", &attributes)?;
            }
            MappingNode::AssociationEndMapping(n) => {
                write_start(&mut self.writer, "EndProperty", &[("Name", n.association_end.as_str())])?;
            }
        }
        Ok(Walk::Continue)
    }

    fn leave(&mut self, node: MappingNode<'_>) -> anyhow::Result<()> {
        let element = match node {
            MappingNode::DatabaseMapping(_) => "Mapping",
            MappingNode::EntityContainerMapping(_) => {
                self.container = None;
                "EntityContainerMapping"
            }
            MappingNode::EntitySetMapping(_) => "EntitySetMapping",
            MappingNode::EntityTypeMapping(_) => "EntityTypeMapping",
            MappingNode::EntityTypeMappingFragment(_) => {
                self.close_complex_to(0)?;
                "MappingFragment"
            }
            MappingNode::AssociationSetMapping(_) => "AssociationSetMapping",
            MappingNode::AssociationEndMapping(_) => {
                self.close_complex_to(0)?;
                "EndProperty"
            }
            MappingNode::EdmPropertyMapping(_)
            | MappingNode::ColumnCondition(_)
            | MappingNode::PropertyCondition(_)
            | MappingNode::QueryViewMapping(_) => return Ok(()),
        };
        write_end(&mut self.writer, element)
    }
}
