//! Projection of opaque attribute triples into named fields.
//!
//! Work items, link targets and lookup tables all carry the same
//! `key`/`label`/`content` triples. They expose them through [`Attributed`]
//! and share the single [`project`] function.

use crate::envelope::{Attribute, AttributeValuesDto, LinkTarget, Value, WorkItemDto};
use std::collections::BTreeMap;

/// Anything carrying a list of attribute triples.
pub trait Attributed {
    fn attributes(&self) -> &[Attribute];
}

impl Attributed for [Attribute] {
    fn attributes(&self) -> &[Attribute] {
        self
    }
}

impl Attributed for Vec<Attribute> {
    fn attributes(&self) -> &[Attribute] {
        self
    }
}

impl Attributed for Value {
    fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

impl Attributed for WorkItemDto {
    fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

impl Attributed for LinkTarget {
    fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }
}

impl Attributed for AttributeValuesDto {
    fn attributes(&self) -> &[Attribute] {
        &self.values
    }
}

/// Name to display-value map produced by [`project`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap(BTreeMap<String, String>);

impl FieldMap {
    /// Value for `key`, or `""` when the attribute was not present.
    #[must_use]
    pub fn get(&self, key: &str) -> &str {
        self.lookup(key).unwrap_or_default()
    }

    /// Value for `key`, distinguishing absence from an empty value.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, String> {
        self.0
    }
}

/// Project attribute triples into a [`FieldMap`].
///
/// Labels win over content; a repeated key keeps its last value.
pub fn project<A: Attributed + ?Sized>(source: &A) -> FieldMap {
    let fields = source
        .attributes()
        .iter()
        .map(|attr| (attr.key.clone(), attr.value.display().to_string()))
        .collect();
    FieldMap(fields)
}
