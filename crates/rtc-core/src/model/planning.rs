use crate::attributes::project;
use crate::envelope::{AttributeValuesDto, IterationDto, ReleaseDto};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Iteration {
    pub id: String,
    pub item_id: String,
    pub label: String,
    pub completed: bool,
    pub archived: bool,
}

impl From<&IterationDto> for Iteration {
    fn from(dto: &IterationDto) -> Self {
        Self {
            id: dto.id.clone(),
            item_id: dto.item_id.clone(),
            label: dto.label.clone(),
            completed: dto.completed,
            archived: dto.archived,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Release {
    pub id: String,
    pub item_id: String,
    pub label: String,
    pub completed: bool,
    pub archived: bool,
    pub iterations: Vec<Iteration>,
}

impl From<&ReleaseDto> for Release {
    fn from(dto: &ReleaseDto) -> Self {
        Self {
            id: dto.id.clone(),
            item_id: dto.item_id.clone(),
            label: dto.label.clone(),
            completed: dto.completed,
            archived: dto.archived,
            iterations: dto.iterations.iter().map(Iteration::from).collect(),
        }
    }
}

/// Release order, then iteration order. Positions in this list are the
/// indexes [`IterationSelector::Index`] refers to.
#[must_use]
pub fn flatten(releases: &[Release]) -> Vec<Iteration> {
    releases
        .iter()
        .flat_map(|release| release.iterations.iter().cloned())
        .collect()
}

/// How a caller names an iteration.
///
/// An index is only meaningful against a list fetched right before use; an
/// item id stays valid across calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationSelector {
    Index(usize),
    ItemId(String),
}

impl IterationSelector {
    /// Pick the selected iteration out of a freshly fetched flattened list.
    #[must_use]
    pub fn select<'a>(&self, iterations: &'a [Iteration]) -> Option<&'a Iteration> {
        match self {
            Self::Index(index) => iterations.get(*index),
            Self::ItemId(item_id) => iterations.iter().find(|it| &it.item_id == item_id),
        }
    }
}

impl FromStr for IterationSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Ok(trimmed
            .parse::<usize>()
            .map_or_else(|_| Self::ItemId(trimmed.to_string()), Self::Index))
    }
}

impl fmt::Display for IterationSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(index) => write!(f, "#{index}"),
            Self::ItemId(item_id) => f.write_str(item_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Owner {
    pub id: String,
    pub name: String,
}

/// Owners from the `owner` lookup table, sorted by name.
#[must_use]
pub fn owners_from(tables: &[AttributeValuesDto]) -> Vec<Owner> {
    let mut owners: Vec<Owner> = tables
        .iter()
        .filter(|table| table.attribute_id == "owner")
        .flat_map(|table| project(table).into_inner())
        .map(|(id, name)| Owner { id, name })
        .collect();
    owners.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    owners
}
