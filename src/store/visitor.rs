//! Depth-first traversal of the store model.
//!
//! Every `visit_*` method defaults to the matching `walk_*` function, so an
//! implementation overrides only the items it cares about and calls the
//! `walk_*` function itself when it still wants the children visited.

use super::{
    DbDatabaseMetadata, DbForeignKeyConstraintMetadata, DbSchemaMetadata, DbTableColumnMetadata,
    DbTableMetadata,
};

pub trait DbDatabaseVisitor {
    type Error;

    fn visit_database(&mut self, database: &DbDatabaseMetadata) -> Result<(), Self::Error> {
        walk_database(self, database)
    }

    fn visit_schema(
        &mut self,
        database: &DbDatabaseMetadata,
        schema: &DbSchemaMetadata,
    ) -> Result<(), Self::Error> {
        walk_schema(self, database, schema)
    }

    fn visit_table(
        &mut self,
        database: &DbDatabaseMetadata,
        table: &DbTableMetadata,
    ) -> Result<(), Self::Error> {
        walk_table(self, database, table)
    }

    fn visit_column(
        &mut self,
        table: &DbTableMetadata,
        column: &DbTableColumnMetadata,
    ) -> Result<(), Self::Error> {
        walk_column(self, table, column)
    }

    fn visit_foreign_key(
        &mut self,
        database: &DbDatabaseMetadata,
        dependent: &DbTableMetadata,
        constraint: &DbForeignKeyConstraintMetadata,
    ) -> Result<(), Self::Error> {
        walk_foreign_key(self, database, dependent, constraint)
    }
}

/// Visit every schema, then every foreign key of every table.
pub fn walk_database<V>(v: &mut V, database: &DbDatabaseMetadata) -> Result<(), V::Error>
where
    V: DbDatabaseVisitor + ?Sized,
{
    for schema in &database.schemas {
        v.visit_schema(database, schema)?;
    }
    for table in database.tables() {
        for constraint in &table.foreign_key_constraints {
            v.visit_foreign_key(database, table, constraint)?;
        }
    }
    Ok(())
}

pub fn walk_schema<V>(
    v: &mut V,
    database: &DbDatabaseMetadata,
    schema: &DbSchemaMetadata,
) -> Result<(), V::Error>
where
    V: DbDatabaseVisitor + ?Sized,
{
    for table in &schema.tables {
        v.visit_table(database, table)?;
    }
    Ok(())
}

pub fn walk_table<V>(
    v: &mut V,
    _database: &DbDatabaseMetadata,
    table: &DbTableMetadata,
) -> Result<(), V::Error>
where
    V: DbDatabaseVisitor + ?Sized,
{
    for column in &table.columns {
        v.visit_column(table, column)?;
    }
    Ok(())
}

pub fn walk_column<V>(
    _v: &mut V,
    _table: &DbTableMetadata,
    _column: &DbTableColumnMetadata,
) -> Result<(), V::Error>
where
    V: DbDatabaseVisitor + ?Sized,
{
    Ok(())
}

pub fn walk_foreign_key<V>(
    _v: &mut V,
    _database: &DbDatabaseMetadata,
    _dependent: &DbTableMetadata,
    _constraint: &DbForeignKeyConstraintMetadata,
) -> Result<(), V::Error>
where
    V: DbDatabaseVisitor + ?Sized,
{
    Ok(())
}

/// Counts of store items, gathered with a visitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStatistics {
    pub schemas: usize,
    pub tables: usize,
    pub columns: usize,
    pub foreign_keys: usize,
}

impl StoreStatistics {
    pub fn collect(database: &DbDatabaseMetadata) -> Self {
        let mut stats = Self::default();
        match stats.visit_database(database) {
            Ok(()) => stats,
            Err(never) => match never {},
        }
    }
}

impl DbDatabaseVisitor for StoreStatistics {
    type Error = std::convert::Infallible;

    fn visit_schema(
        &mut self,
        database: &DbDatabaseMetadata,
        schema: &DbSchemaMetadata,
    ) -> Result<(), Self::Error> {
        self.schemas += 1;
        walk_schema(self, database, schema)
    }

    fn visit_table(
        &mut self,
        database: &DbDatabaseMetadata,
        table: &DbTableMetadata,
    ) -> Result<(), Self::Error> {
        self.tables += 1;
        walk_table(self, database, table)
    }

    fn visit_column(
        &mut self,
        _table: &DbTableMetadata,
        _column: &DbTableColumnMetadata,
    ) -> Result<(), Self::Error> {
        self.columns += 1;
        Ok(())
    }

    fn visit_foreign_key(
        &mut self,
        _database: &DbDatabaseMetadata,
        _dependent: &DbTableMetadata,
        _constraint: &DbForeignKeyConstraintMetadata,
    ) -> Result<(), Self::Error> {
        self.foreign_keys += 1;
        Ok(())
    }
}
