//! SSDL writer tests over hand-built store metadata

use pretty_assertions::assert_eq;
use rust_edmx::annotation::{DataModelAnnotation, IndexAnnotation, IndexAttribute};
use rust_edmx::schema::{ssdl_namespace, CUSTOM_ANNOTATION_NAMESPACE};
use rust_edmx::ssdl::write_ssdl;
use rust_edmx::store::{
    DbDatabaseMetadata, DbForeignKeyConstraintMetadata, DbTableColumnMetadata, OperationAction,
    StoreGeneratedPattern, TableId,
};
use rust_edmx::EntityFrameworkVersion;

struct Library {
    db: DbDatabaseMetadata,
    authors: TableId,
    books: TableId,
}

/// `dbo.Authors` and `lib.Books`, with a required FK from Books to Authors
/// and a nullable self reference on Authors.
fn library() -> Library {
    let mut db = DbDatabaseMetadata::new("LibraryStoreContainer", "Library.Store", EntityFrameworkVersion::V3);

    let mut name = DbTableColumnMetadata::new("Name", "nvarchar").not_null();
    name.facets.is_max_length = true;
    name.annotations.push(DataModelAnnotation::index(IndexAnnotation::new(
        IndexAttribute::named("IX_Authors_Name").with_unique(true),
    )));

    let authors = db.add_table(
        "dbo",
        "Authors",
        vec![
            DbTableColumnMetadata::new("AuthorId", "int")
                .primary_key()
                .with_store_generated(StoreGeneratedPattern::Identity),
            name,
            DbTableColumnMetadata::new("MentorId", "int"),
        ],
    );

    let mut price = DbTableColumnMetadata::new("Price", "decimal").not_null();
    price.facets.precision = Some(10);
    price.facets.scale = Some(2);
    let mut isbn = DbTableColumnMetadata::new("Isbn", "char").with_max_length(13);
    isbn.facets.is_fixed_length = Some(true);
    isbn.facets.is_unicode = Some(false);

    let books = db.add_table(
        "lib",
        "Books",
        vec![
            DbTableColumnMetadata::new("BookId", "int").primary_key(),
            DbTableColumnMetadata::new("AuthorId", "int").not_null(),
            price,
            isbn,
            DbTableColumnMetadata::new("RowVersion", "timestamp")
                .not_null()
                .with_store_generated(StoreGeneratedPattern::Computed),
        ],
    );
    db.schemas[1].database_identifier = "library".to_string();
    db.table_mut(books).unwrap().database_identifier = "tblBooks".to_string();

    assert!(db.add_foreign_key(
        books,
        DbForeignKeyConstraintMetadata {
            name: "FK_Books_Authors".to_string(),
            principal_table: authors,
            dependent_columns: vec!["AuthorId".to_string()],
            delete_action: OperationAction::Cascade,
        },
    ));
    assert!(db.add_foreign_key(
        authors,
        DbForeignKeyConstraintMetadata {
            name: "FK_Authors_Mentor".to_string(),
            principal_table: authors,
            dependent_columns: vec!["MentorId".to_string()],
            delete_action: OperationAction::None,
        },
    ));

    Library { db, authors, books }
}

fn child_elements<'a, 'input>(
    node: roxmltree::Node<'a, 'input>,
    name: &str,
) -> Vec<roxmltree::Node<'a, 'input>> {
    node.children()
        .filter(|c| c.is_element() && c.tag_name().name() == name)
        .collect()
}

fn property<'a, 'input>(
    schema: roxmltree::Node<'a, 'input>,
    entity_type: &str,
    column: &str,
) -> roxmltree::Node<'a, 'input> {
    let entity = child_elements(schema, "EntityType")
        .into_iter()
        .find(|e| e.attribute("Name") == Some(entity_type))
        .unwrap_or_else(|| panic!("missing EntityType {entity_type}"));
    child_elements(entity, "Property")
        .into_iter()
        .find(|p| p.attribute("Name") == Some(column))
        .unwrap_or_else(|| panic!("missing Property {entity_type}.{column}"))
}

#[test]
fn test_schema_header() {
    let lib = library();
    let xml = write_ssdl(&lib.db, EntityFrameworkVersion::V3).unwrap();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));

    let doc = roxmltree::Document::parse(&xml).unwrap();
    let schema = doc.root_element();
    assert_eq!(schema.tag_name().name(), "Schema");
    assert_eq!(
        schema.tag_name().namespace(),
        Some(ssdl_namespace(EntityFrameworkVersion::V3))
    );
    assert_eq!(schema.attribute("Namespace"), Some("Library.Store"));
    assert_eq!(schema.attribute("Alias"), Some("Self"));
    assert_eq!(schema.attribute("Provider"), Some("System.Data.SqlClient"));
    assert_eq!(schema.attribute("ProviderManifestToken"), Some("2008"));
    assert_eq!(schema.lookup_prefix(CUSTOM_ANNOTATION_NAMESPACE), Some("customannotation"));
}

#[test]
fn test_element_order() {
    let lib = library();
    let xml = write_ssdl(&lib.db, EntityFrameworkVersion::V3).unwrap();
    let doc = roxmltree::Document::parse(&xml).unwrap();

    let names: Vec<String> = doc
        .root_element()
        .children()
        .filter(|c| c.is_element())
        .map(|c| format!("{}:{}", c.tag_name().name(), c.attribute("Name").unwrap_or("")))
        .collect();
    assert_eq!(
        names,
        vec![
            "EntityType:Authors",
            "EntityType:Books",
            "Association:FK_Authors_Mentor",
            "Association:FK_Books_Authors",
            "EntityContainer:LibraryStoreContainer",
        ]
    );
}

#[test]
fn test_property_facets() {
    let lib = library();
    let xml = write_ssdl(&lib.db, EntityFrameworkVersion::V3).unwrap();
    let doc = roxmltree::Document::parse(&xml).unwrap();
    let schema = doc.root_element();

    let id = property(schema, "Authors", "AuthorId");
    assert_eq!(id.attribute("StoreGeneratedPattern"), Some("Identity"));
    assert_eq!(id.attribute("Nullable"), Some("false"));

    let name = property(schema, "Authors", "Name");
    assert_eq!(name.attribute("MaxLength"), Some("max"));

    let mentor = property(schema, "Authors", "MentorId");
    assert_eq!(mentor.attribute("Nullable"), Some("true"));
    assert_eq!(mentor.attribute("StoreGeneratedPattern"), None);
    assert_eq!(mentor.attribute("MaxLength"), None);

    let price = property(schema, "Books", "Price");
    assert_eq!(price.attribute("Precision"), Some("10"));
    assert_eq!(price.attribute("Scale"), Some("2"));

    let isbn = property(schema, "Books", "Isbn");
    assert_eq!(isbn.attribute("MaxLength"), Some("13"));
    assert_eq!(isbn.attribute("FixedLength"), Some("true"));
    assert_eq!(isbn.attribute("Unicode"), Some("false"));

    let row_version = property(schema, "Books", "RowVersion");
    assert_eq!(row_version.attribute("StoreGeneratedPattern"), Some("Computed"));
}

#[test]
fn test_keys() {
    let lib = library();
    let xml = write_ssdl(&lib.db, EntityFrameworkVersion::V3).unwrap();
    let doc = roxmltree::Document::parse(&xml).unwrap();

    for (entity, key) in [("Authors", "AuthorId"), ("Books", "BookId")] {
        let node = child_elements(doc.root_element(), "EntityType")
            .into_iter()
            .find(|e| e.attribute("Name") == Some(entity))
            .unwrap();
        let key_node = child_elements(node, "Key").pop().unwrap();
        let refs: Vec<&str> = child_elements(key_node, "PropertyRef")
            .iter()
            .filter_map(|r| r.attribute("Name"))
            .collect();
        assert_eq!(refs, vec![key]);
    }
}

#[test]
fn test_custom_annotation_written_for_v3_only() {
    let lib = library();

    let v3 = write_ssdl(&lib.db, EntityFrameworkVersion::V3).unwrap();
    let doc = roxmltree::Document::parse(&v3).unwrap();
    let name = property(doc.root_element(), "Authors", "Name");
    assert_eq!(
        name.attribute((CUSTOM_ANNOTATION_NAMESPACE, "Index")),
        Some("{ Name: IX_Authors_Name, IsUnique: True }")
    );

    for version in [EntityFrameworkVersion::V1, EntityFrameworkVersion::V2] {
        let xml = write_ssdl(&lib.db, version).unwrap();
        assert!(!xml.contains("customannotation"), "{version} output: {xml}");
        let doc = roxmltree::Document::parse(&xml).unwrap();
        assert_eq!(
            doc.root_element().tag_name().namespace(),
            Some(ssdl_namespace(version))
        );
    }
}

#[test]
fn test_no_custom_namespace_without_annotations() {
    let mut lib = library();
    let authors = lib.db.table_mut(lib.authors).unwrap();
    authors.column_mut("Name").unwrap().annotations.replace(None);

    let xml = write_ssdl(&lib.db, EntityFrameworkVersion::V3).unwrap();
    assert!(!xml.contains("customannotation"));
}

#[test]
fn test_associations() {
    let lib = library();
    let xml = write_ssdl(&lib.db, EntityFrameworkVersion::V3).unwrap();
    let doc = roxmltree::Document::parse(&xml).unwrap();
    let associations = child_elements(doc.root_element(), "Association");

    let books = associations
        .iter()
        .find(|a| a.attribute("Name") == Some("FK_Books_Authors"))
        .unwrap();
    let ends = child_elements(*books, "End");
    let summary: Vec<(&str, &str, &str)> = ends
        .iter()
        .map(|e| {
            (
                e.attribute("Role").unwrap(),
                e.attribute("Type").unwrap(),
                e.attribute("Multiplicity").unwrap(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![("Authors", "Self.Authors", "1"), ("Books", "Self.Books", "*")]
    );
    let on_delete = child_elements(ends[0], "OnDelete").pop().unwrap();
    assert_eq!(on_delete.attribute("Action"), Some("Cascade"));
    assert!(child_elements(ends[1], "OnDelete").is_empty());

    let constraint = child_elements(*books, "ReferentialConstraint").pop().unwrap();
    let principal = child_elements(constraint, "Principal").pop().unwrap();
    let dependent = child_elements(constraint, "Dependent").pop().unwrap();
    assert_eq!(principal.attribute("Role"), Some("Authors"));
    assert_eq!(dependent.attribute("Role"), Some("Books"));
    assert_eq!(
        child_elements(dependent, "PropertyRef")[0].attribute("Name"),
        Some("AuthorId")
    );

    let mentor = associations
        .iter()
        .find(|a| a.attribute("Name") == Some("FK_Authors_Mentor"))
        .unwrap();
    let roles: Vec<(&str, &str)> = child_elements(*mentor, "End")
        .iter()
        .map(|e| (e.attribute("Role").unwrap(), e.attribute("Multiplicity").unwrap()))
        .collect();
    assert_eq!(roles, vec![("Authors", "0..1"), ("AuthorsSelf", "*")]);
}

#[test]
fn test_entity_container() {
    let lib = library();
    let xml = write_ssdl(&lib.db, EntityFrameworkVersion::V3).unwrap();
    let doc = roxmltree::Document::parse(&xml).unwrap();
    let container = child_elements(doc.root_element(), "EntityContainer").pop().unwrap();
    let store_ns = container
        .lookup_namespace_uri(Some("store"))
        .expect("store prefix bound");

    let sets = child_elements(container, "EntitySet");
    let books = sets
        .iter()
        .find(|s| s.attribute("Name") == Some("Books"))
        .unwrap();
    assert_eq!(books.attribute("EntityType"), Some("Self.Books"));
    assert_eq!(books.attribute("Schema"), Some("library"));
    assert_eq!(books.attribute("Table"), Some("tblBooks"));
    assert_eq!(books.attribute((store_ns, "Type")), Some("Tables"));

    let authors = sets
        .iter()
        .find(|s| s.attribute("Name") == Some("Authors"))
        .unwrap();
    assert_eq!(authors.attribute("Schema"), Some("dbo"));
    assert_eq!(authors.attribute("Table"), Some("Authors"));

    let association_sets: Vec<&str> = child_elements(container, "AssociationSet")
        .iter()
        .filter_map(|s| s.attribute("Association"))
        .collect();
    assert_eq!(
        association_sets,
        vec!["Self.FK_Authors_Mentor", "Self.FK_Books_Authors"]
    );
}

#[test]
fn test_dangling_foreign_key_is_an_error() {
    let mut lib = library();
    let missing = {
        let mut other = DbDatabaseMetadata::new("X", "X", EntityFrameworkVersion::V3);
        other.add_table("dbo", "A", Vec::new());
        other.add_table("dbo", "B", Vec::new());
        other.add_table("dbo", "C", Vec::new())
    };
    assert!(lib.db.add_foreign_key(
        lib.books,
        DbForeignKeyConstraintMetadata {
            name: "FK_Dangling".to_string(),
            principal_table: missing,
            dependent_columns: vec!["AuthorId".to_string()],
            delete_action: OperationAction::None,
        },
    ));

    let err = write_ssdl(&lib.db, EntityFrameworkVersion::V3).unwrap_err();
    assert!(err.to_string().contains("FK_Dangling"), "{err}");
}
