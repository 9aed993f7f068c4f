use crate::attributes::{FieldMap, project};
use crate::envelope::{LinkTarget, Row, WorkItemSummaryDto};
use crate::model::IterationSelector;
use serde::Serialize;

/// Positions of the result-set columns in a row's labels.
mod column {
    pub const TYPE: usize = 0;
    pub const SUMMARY: usize = 1;
    pub const CREATOR: usize = 2;
    pub const OWNER: usize = 3;
    pub const ESTIMATE: usize = 5;
    pub const CATEGORY: usize = 6;
    pub const TARGET: usize = 7;
    pub const STATE: usize = 10;
}

/// Placeholder for fields a listing endpoint does not return.
pub const NOT_LOADED: &str = "-";

/// A work item as the client assembles it.
///
/// Listing endpoints fill only part of it; `get_work_item` fills everything
/// including links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkItem {
    pub id: String,
    pub item_id: String,
    pub state_id: String,
    pub kind: String,
    pub summary: String,
    pub created_by: String,
    pub owned_by: String,
    pub description: String,
    pub location_uri: String,
    pub state: String,
    pub resolution: String,
    pub estimate: String,
    pub time_spent: String,
    pub filed_against: String,
    pub planned_for: String,
    pub code_changes: String,
    pub parents: Vec<Reference>,
    pub children: Vec<Reference>,
}

impl WorkItem {
    /// `"{kind} {id} - {summary}"`.
    #[must_use]
    pub fn title(&self) -> String {
        format!("{} {} - {}", self.kind, self.id, self.summary)
    }

    /// Initials of the owner's name, e.g. `FGC` for `Felipe Gonçalves Coury`.
    #[must_use]
    pub fn owner_initials(&self) -> String {
        self.owned_by
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .collect()
    }

    pub(crate) fn from_summary(dto: &WorkItemSummaryDto) -> Self {
        Self {
            id: dto.id.clone(),
            item_id: dto.item_id.clone(),
            kind: dto.type_name.clone(),
            summary: dto.summary.clone(),
            created_by: dto.creator_name.clone(),
            owned_by: dto.owner_name.clone(),
            description: dto.description.clone(),
            location_uri: dto.location_uri.clone(),
            state: dto.state_name.clone(),
            ..Self::default()
        }
    }

    pub(crate) fn from_search_hit(dto: &WorkItemSummaryDto) -> Self {
        Self {
            planned_for: NOT_LOADED.to_string(),
            ..Self::from_summary(dto)
        }
    }

    pub(crate) fn from_row(row: &Row) -> Self {
        let label = |idx: usize| row.labels.get(idx).cloned().unwrap_or_default();
        Self {
            id: row.id.clone(),
            item_id: row.item_id.clone(),
            kind: label(column::TYPE),
            summary: label(column::SUMMARY),
            created_by: label(column::CREATOR),
            owned_by: label(column::OWNER),
            estimate: label(column::ESTIMATE),
            filed_against: label(column::CATEGORY),
            planned_for: label(column::TARGET),
            state: label(column::STATE),
            location_uri: row.location_uri.clone(),
            ..Self::default()
        }
    }

    /// Overlay the detail read's attributes onto a retrieved item.
    pub(crate) fn apply_detail(&mut self, fields: &FieldMap) {
        self.planned_for = fields.get("target").to_string();
        self.state = fields.get("internalState").to_string();
        self.resolution = fields.get("internalResolution").to_string();
        self.time_spent = fields.get("timeSpent").to_string();
        self.estimate = fields.get("duration").to_string();
        self.code_changes = fields.get("code-change").to_string();
        if let Some(category) = fields.lookup("category") {
            self.filed_against = category.to_string();
        }
    }
}

/// Lightweight pointer to a linked work item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Reference {
    pub id: String,
    pub item_id: String,
    pub state_id: String,
    pub location_uri: String,
    pub summary: String,
    pub kind: String,
}

impl Reference {
    #[must_use]
    pub fn from_target(target: &LinkTarget) -> Self {
        let fields = project(target);
        Self {
            id: fields.get("id").to_string(),
            item_id: target.item_id.clone(),
            state_id: target.state_id.clone(),
            location_uri: target.location_uri.clone(),
            summary: fields.get("summary").to_string(),
            kind: fields.get("workItemType").to_string(),
        }
    }
}

pub const DEFAULT_KIND: &str = "task";

/// Input for `create`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkItem {
    pub summary: String,
    /// Work item type id, e.g. `task` or `defect`.
    pub kind: String,
    /// Public id of the parent to link after creation.
    pub parent: Option<String>,
}

impl NewWorkItem {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            kind: DEFAULT_KIND.to_string(),
            parent: None,
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    #[must_use]
    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// Scalar attribute changes for `update`. Unset fields stay untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkItemUpdate {
    pub id: String,
    pub estimate: Option<String>,
    pub time_spent: Option<String>,
    pub iteration: Option<IterationSelector>,
}

impl WorkItemUpdate {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// True when at least one attribute would be written.
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.estimate.is_some() || self.time_spent.is_some() || self.iteration.is_some()
    }
}
