//! Store (SSDL side) metadata: schemas, tables, columns and foreign keys.
//!
//! Tables live inside their schema but are addressed everywhere else by a
//! [`TableId`], so mapping fragments and foreign keys can point at a table
//! without borrowing the database.

mod reader;
mod visitor;

pub use reader::read_ssdl;
pub use visitor::{
    walk_column, walk_database, walk_foreign_key, walk_schema, walk_table, DbDatabaseVisitor,
    StoreStatistics,
};

use std::fmt;

use crate::annotation::{DataModelAnnotation, LazyList};
use crate::schema::EntityFrameworkVersion;

/// Stable handle to a table within one [`DbDatabaseMetadata`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TableId(pub(crate) u32);

impl fmt::Display for TableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A column of a specific table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: TableId,
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: TableId, column: impl Into<String>) -> Self {
        Self {
            table,
            column: column.into(),
        }
    }
}

/// Provider the store schema targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbProviderInfo {
    pub provider_invariant_name: String,
    pub provider_manifest_token: String,
}

impl Default for DbProviderInfo {
    fn default() -> Self {
        Self {
            provider_invariant_name: "System.Data.SqlClient".to_string(),
            provider_manifest_token: "2008".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StoreGeneratedPattern {
    #[default]
    None,
    Identity,
    Computed,
}

impl StoreGeneratedPattern {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreGeneratedPattern::None => "None",
            StoreGeneratedPattern::Identity => "Identity",
            StoreGeneratedPattern::Computed => "Computed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "None" => Some(StoreGeneratedPattern::None),
            "Identity" => Some(StoreGeneratedPattern::Identity),
            "Computed" => Some(StoreGeneratedPattern::Computed),
            _ => None,
        }
    }
}

/// Action taken on dependent rows when the principal row is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OperationAction {
    #[default]
    None,
    Cascade,
}

/// Explicitly configured column facets. `None` means "not set", and unset
/// facets are not written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DbColumnFacets {
    pub is_fixed_length: Option<bool>,
    pub is_unicode: Option<bool>,
    pub max_length: Option<u32>,
    pub is_max_length: bool,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbTableColumnMetadata {
    pub name: String,
    /// Store type name, e.g. `nvarchar`.
    pub type_name: String,
    pub is_nullable: bool,
    pub is_primary_key_column: bool,
    pub facets: DbColumnFacets,
    pub store_generated_pattern: StoreGeneratedPattern,
    pub annotations: LazyList<DataModelAnnotation>,
}

impl DbTableColumnMetadata {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            is_nullable: true,
            is_primary_key_column: false,
            facets: DbColumnFacets::default(),
            store_generated_pattern: StoreGeneratedPattern::None,
            annotations: LazyList::new(),
        }
    }

    pub fn not_null(mut self) -> Self {
        self.is_nullable = false;
        self
    }

    /// Mark as a primary key column. Key columns are never nullable.
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key_column = true;
        self.is_nullable = false;
        self
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.facets.max_length = Some(max_length);
        self
    }

    pub fn with_store_generated(mut self, pattern: StoreGeneratedPattern) -> Self {
        self.store_generated_pattern = pattern;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbForeignKeyConstraintMetadata {
    pub name: String,
    pub principal_table: TableId,
    /// Columns of the owning (dependent) table, in principal key order.
    pub dependent_columns: Vec<String>,
    pub delete_action: OperationAction,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbTableMetadata {
    pub id: TableId,
    pub name: String,
    /// Name of the table in the database, if it differs from `name`.
    pub database_identifier: String,
    pub columns: Vec<DbTableColumnMetadata>,
    pub foreign_key_constraints: Vec<DbForeignKeyConstraintMetadata>,
}

impl DbTableMetadata {
    pub fn column(&self, name: &str) -> Option<&DbTableColumnMetadata> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut DbTableColumnMetadata> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Primary key columns in declaration order.
    pub fn key_columns(&self) -> impl Iterator<Item = &DbTableColumnMetadata> {
        self.columns.iter().filter(|c| c.is_primary_key_column)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbSchemaMetadata {
    pub name: String,
    pub database_identifier: String,
    pub tables: Vec<DbTableMetadata>,
}

impl DbSchemaMetadata {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            database_identifier: name.clone(),
            name,
            tables: Vec::new(),
        }
    }
}

/// The store model: one entity container worth of tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbDatabaseMetadata {
    /// Entity container name.
    pub name: String,
    /// SSDL schema namespace.
    pub namespace: String,
    pub version: EntityFrameworkVersion,
    pub provider: DbProviderInfo,
    pub schemas: Vec<DbSchemaMetadata>,
    next_table_id: u32,
}

impl DbDatabaseMetadata {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        version: EntityFrameworkVersion,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            version,
            provider: DbProviderInfo::default(),
            schemas: Vec::new(),
            next_table_id: 0,
        }
    }

    /// Add a table to `schema` (created on first use) and return its id.
    pub fn add_table(
        &mut self,
        schema: &str,
        name: impl Into<String>,
        columns: Vec<DbTableColumnMetadata>,
    ) -> TableId {
        let id = TableId(self.next_table_id);
        self.next_table_id += 1;

        let name = name.into();
        let table = DbTableMetadata {
            id,
            database_identifier: name.clone(),
            name,
            columns,
            foreign_key_constraints: Vec::new(),
        };

        match self.schemas.iter_mut().find(|s| s.name == schema) {
            Some(existing) => existing.tables.push(table),
            None => {
                let mut created = DbSchemaMetadata::new(schema);
                created.tables.push(table);
                self.schemas.push(created);
            }
        }
        id
    }

    pub fn table(&self, id: TableId) -> Option<&DbTableMetadata> {
        self.tables().find(|t| t.id == id)
    }

    pub fn table_mut(&mut self, id: TableId) -> Option<&mut DbTableMetadata> {
        self.schemas
            .iter_mut()
            .flat_map(|s| s.tables.iter_mut())
            .find(|t| t.id == id)
    }

    /// Look a table up by its entity set name.
    pub fn table_by_name(&self, name: &str) -> Option<&DbTableMetadata> {
        self.tables().find(|t| t.name == name)
    }

    /// Schema containing the table.
    pub fn schema_of(&self, id: TableId) -> Option<&DbSchemaMetadata> {
        self.schemas
            .iter()
            .find(|s| s.tables.iter().any(|t| t.id == id))
    }

    pub fn tables(&self) -> impl Iterator<Item = &DbTableMetadata> {
        self.schemas.iter().flat_map(|s| s.tables.iter())
    }

    pub fn column(&self, column: &ColumnRef) -> Option<&DbTableColumnMetadata> {
        self.table(column.table)?.column(&column.column)
    }

    /// Add a foreign key owned by `dependent`. Returns `false` when the
    /// dependent table does not exist.
    pub fn add_foreign_key(
        &mut self,
        dependent: TableId,
        constraint: DbForeignKeyConstraintMetadata,
    ) -> bool {
        match self.table_mut(dependent) {
            Some(table) => {
                table.foreign_key_constraints.push(constraint);
                true
            }
            None => false,
        }
    }
}
