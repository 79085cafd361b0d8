//! Index annotations attached to store columns.
//!
//! An `IndexAnnotation` holds the indexes a column participates in. Several
//! annotations for the same column (one per mapped property, for example) are
//! merged; merging is strict: two descriptions of the same index must agree on
//! every property both of them configure.

use std::borrow::Cow;
use std::fmt;

use tracing::trace;

use crate::error::EdmxError;

/// Annotation name used for index annotations on columns.
pub const INDEX_ANNOTATION_NAME: &str = "Index";

/// A single index descriptor.
///
/// Every property is optional; `None` means "not configured", which is what
/// merging and serialization care about.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexAttribute {
    name: Option<String>,
    order: Option<i32>,
    is_clustered: Option<bool>,
    is_unique: Option<bool>,
}

/// Identity used to decide whether two descriptors describe the same index.
///
/// Named indexes are identified by name. Unnamed indexes are identified by
/// their configured values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexIdentity {
    Named(String),
    Structural {
        order: Option<i32>,
        is_clustered: Option<bool>,
        is_unique: Option<bool>,
    },
}

impl IndexAttribute {
    /// An unnamed index with nothing configured.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_clustered(mut self, is_clustered: bool) -> Self {
        self.is_clustered = Some(is_clustered);
        self
    }

    pub fn with_unique(mut self, is_unique: bool) -> Self {
        self.is_unique = Some(is_unique);
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn order(&self) -> Option<i32> {
        self.order
    }

    pub fn is_clustered(&self) -> Option<bool> {
        self.is_clustered
    }

    pub fn is_unique(&self) -> Option<bool> {
        self.is_unique
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = Some(name);
    }

    pub(crate) fn set_order(&mut self, order: i32) {
        self.order = Some(order);
    }

    pub(crate) fn set_clustered(&mut self, is_clustered: bool) {
        self.is_clustered = Some(is_clustered);
    }

    pub(crate) fn set_unique(&mut self, is_unique: bool) {
        self.is_unique = Some(is_unique);
    }

    pub fn identity(&self) -> IndexIdentity {
        match &self.name {
            Some(name) => IndexIdentity::Named(name.clone()),
            None => IndexIdentity::Structural {
                order: self.order,
                is_clustered: self.is_clustered,
                is_unique: self.is_unique,
            },
        }
    }

    /// Whether `other` describes the same index as `self`.
    ///
    /// Two unnamed descriptors with different identities never match.
    fn matches(&self, other: &IndexAttribute) -> bool {
        if self.identity() == other.identity() {
            return true;
        }
        match (&self.name, &other.name) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    /// Describe every property configured on both sides with different values.
    fn conflicts_with(&self, other: &IndexAttribute) -> Vec<String> {
        let mut conflicts = Vec::new();
        if let (Some(a), Some(b)) = (&self.name, &other.name) {
            if a != b {
                conflicts.push(conflict_detail("Name", a, b));
            }
        }
        if let (Some(a), Some(b)) = (self.order, other.order) {
            if a != b {
                conflicts.push(conflict_detail("Order", a, b));
            }
        }
        if let (Some(a), Some(b)) = (self.is_clustered, other.is_clustered) {
            if a != b {
                conflicts.push(conflict_detail("IsClustered", bool_text(a), bool_text(b)));
            }
        }
        if let (Some(a), Some(b)) = (self.is_unique, other.is_unique) {
            if a != b {
                conflicts.push(conflict_detail("IsUnique", bool_text(a), bool_text(b)));
            }
        }
        conflicts
    }

    /// Combine two compatible descriptors, preferring configured values.
    fn merged_with(&self, other: &IndexAttribute) -> IndexAttribute {
        IndexAttribute {
            name: self.name.clone().or_else(|| other.name.clone()),
            order: self.order.or(other.order),
            is_clustered: self.is_clustered.or(other.is_clustered),
            is_unique: self.is_unique.or(other.is_unique),
        }
    }
}

fn conflict_detail(property: &str, a: impl fmt::Display, b: impl fmt::Display) -> String {
    format!("'{property}' = '{a}' conflicts with '{property}' = '{b}'")
}

/// Booleans are rendered the way the annotation grammar spells them.
pub(crate) fn bool_text(value: bool) -> &'static str {
    if value {
        "True"
    } else {
        "False"
    }
}

/// Outcome of a compatibility check between two annotations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompatibilityResult {
    Compatible,
    Incompatible(String),
}

impl CompatibilityResult {
    pub fn is_compatible(&self) -> bool {
        matches!(self, CompatibilityResult::Compatible)
    }
}

/// Annotations that can be combined when two model items contribute a value
/// for the same target.
pub trait MergeableAnnotation: Sized + Clone {
    fn is_compatible_with(&self, other: &Self) -> CompatibilityResult;

    fn merge_with<'a>(&'a self, other: &'a Self) -> Result<Cow<'a, Self>, EdmxError>;
}

/// The set of indexes a column participates in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexAnnotation {
    indexes: Vec<IndexAttribute>,
}

impl IndexAnnotation {
    pub fn new(index: IndexAttribute) -> Self {
        Self {
            indexes: vec![index],
        }
    }

    /// Build an annotation from several descriptors, merging the ones that
    /// describe the same index.
    pub fn from_indexes<I>(indexes: I) -> Result<Self, EdmxError>
    where
        I: IntoIterator<Item = IndexAttribute>,
    {
        let mut merged = Vec::new();
        merge_lists(&mut merged, indexes)?;
        Ok(Self { indexes: merged })
    }

    pub fn indexes(&self) -> &[IndexAttribute] {
        &self.indexes
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<&IndexAttribute> {
        self.indexes.iter().find(|i| i.name() == Some(name))
    }
}

impl MergeableAnnotation for IndexAnnotation {
    fn is_compatible_with(&self, other: &Self) -> CompatibilityResult {
        if std::ptr::eq(self, other) {
            return CompatibilityResult::Compatible;
        }
        let mut scratch = self.indexes.clone();
        match merge_lists(&mut scratch, other.indexes.iter().cloned()) {
            Ok(()) => CompatibilityResult::Compatible,
            Err(err) => CompatibilityResult::Incompatible(err.to_string()),
        }
    }

    /// Merge `other` into a copy of `self`.
    ///
    /// Merging an annotation with itself returns the same instance.
    fn merge_with<'a>(&'a self, other: &'a Self) -> Result<Cow<'a, Self>, EdmxError> {
        if std::ptr::eq(self, other) {
            return Ok(Cow::Borrowed(self));
        }
        let mut merged = self.indexes.clone();
        merge_lists(&mut merged, other.indexes.iter().cloned())?;
        trace!(
            existing = self.indexes.len(),
            incoming = other.indexes.len(),
            merged = merged.len(),
            "merged index annotations"
        );
        Ok(Cow::Owned(IndexAnnotation { indexes: merged }))
    }
}

/// Fold `incoming` into `existing`. A matched descriptor is replaced in place
/// by the merged one; unmatched descriptors are appended.
fn merge_lists<I>(existing: &mut Vec<IndexAttribute>, incoming: I) -> Result<(), EdmxError>
where
    I: IntoIterator<Item = IndexAttribute>,
{
    for index in incoming {
        let mut matches = existing
            .iter()
            .enumerate()
            .filter(|(_, candidate)| candidate.matches(&index))
            .map(|(position, _)| position);

        let Some(position) = matches.next() else {
            existing.push(index);
            continue;
        };
        if matches.next().is_some() {
            return Err(EdmxError::IndexAnnotationAmbiguous {
                name: display_name(&index),
            });
        }

        let current = &existing[position];
        let conflicts = current.conflicts_with(&index);
        if !conflicts.is_empty() {
            let details: String = conflicts
                .iter()
                .map(|c| format!("\n\t{c}"))
                .collect();
            return Err(EdmxError::IncompatibleIndexAnnotation {
                name: display_name(current),
                details,
            });
        }
        let merged = current.merged_with(&index);
        existing[position] = merged;
    }
    Ok(())
}

fn display_name(index: &IndexAttribute) -> String {
    index.name().unwrap_or("").to_string()
}
