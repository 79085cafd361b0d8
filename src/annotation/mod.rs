//! Annotations carried by metadata items, and the lazy list that holds them.

mod index;
mod index_serializer;
mod lazy_list;

pub use index::{
    CompatibilityResult, IndexAnnotation, IndexAttribute, IndexIdentity, MergeableAnnotation,
    INDEX_ANNOTATION_NAME,
};
pub use index_serializer::IndexAnnotationSerializer;
pub use lazy_list::LazyList;

use crate::error::EdmxError;
use crate::schema::CUSTOM_ANNOTATION_NAMESPACE;

/// Value of a data model annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnotationValue {
    Text(String),
    Index(IndexAnnotation),
}

/// A namespaced name/value pair attached to a metadata item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataModelAnnotation {
    pub namespace: Option<String>,
    pub name: String,
    pub value: AnnotationValue,
}

impl DataModelAnnotation {
    pub fn new(namespace: Option<&str>, name: impl Into<String>, value: AnnotationValue) -> Self {
        Self {
            namespace: namespace.map(str::to_string),
            name: name.into(),
            value,
        }
    }

    /// A custom annotation, the kind written as `customannotation:<Name>` in SSDL.
    pub fn custom(name: impl Into<String>, value: AnnotationValue) -> Self {
        Self::new(Some(CUSTOM_ANNOTATION_NAMESPACE), name, value)
    }

    /// An `Index` custom annotation.
    pub fn index(annotation: IndexAnnotation) -> Self {
        Self::custom(INDEX_ANNOTATION_NAME, AnnotationValue::Index(annotation))
    }

    pub fn is_custom(&self) -> bool {
        self.namespace.as_deref() == Some(CUSTOM_ANNOTATION_NAMESPACE)
    }

    /// `namespace:name`, or just the name when there is no namespace.
    pub fn full_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{}:{}", ns, self.name),
            None => self.name.clone(),
        }
    }
}

/// Converts annotation values to and from their attribute text.
pub trait AnnotationSerializer {
    fn serialize(&self, name: &str, value: &AnnotationValue) -> Result<String, EdmxError>;

    fn deserialize(&self, name: &str, value: &str) -> Result<AnnotationValue, EdmxError>;
}

/// Serializer for annotations without structure: the text is kept verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextAnnotationSerializer;

impl AnnotationSerializer for TextAnnotationSerializer {
    fn serialize(&self, _name: &str, value: &AnnotationValue) -> Result<String, EdmxError> {
        match value {
            AnnotationValue::Text(text) => Ok(text.clone()),
            AnnotationValue::Index(annotation) => {
                Ok(IndexAnnotationSerializer::serialize_annotation(annotation))
            }
        }
    }

    fn deserialize(&self, _name: &str, value: &str) -> Result<AnnotationValue, EdmxError> {
        Ok(AnnotationValue::Text(value.to_string()))
    }
}

/// Pick the serializer registered for a custom annotation name.
pub fn serializer_for(name: &str) -> &'static dyn AnnotationSerializer {
    if name == INDEX_ANNOTATION_NAME {
        &IndexAnnotationSerializer
    } else {
        &TextAnnotationSerializer
    }
}

/// Merge `annotation` into `annotations`, combining index annotations with the
/// same full name instead of adding a second entry.
pub fn merge_annotation(
    annotations: &mut LazyList<DataModelAnnotation>,
    annotation: DataModelAnnotation,
) -> Result<(), EdmxError> {
    let existing = annotations
        .iter_mut()
        .find(|a| a.namespace == annotation.namespace && a.name == annotation.name);
    let Some(existing) = existing else {
        annotations.push(annotation);
        return Ok(());
    };

    match (&existing.value, &annotation.value) {
        (AnnotationValue::Index(current), AnnotationValue::Index(incoming)) => {
            let merged = current.merge_with(incoming)?.into_owned();
            existing.value = AnnotationValue::Index(merged);
        }
        _ => existing.value = annotation.value,
    }
    Ok(())
}
