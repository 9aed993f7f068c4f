//! Typed tree for the service's response envelope.
//!
//! Every struct is `#[serde(default)]`: an absent element decodes to an empty
//! string, zero, or an empty list. Only malformed payloads are errors.

use serde::Deserialize;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Envelope {
    #[serde(rename = "Body")]
    pub body: Body,
}

impl Envelope {
    /// Shortcut to the return value every caller ends up reading.
    #[must_use]
    pub const fn return_value(&self) -> &ReturnValue {
        &self.body.response.return_value
    }

    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.body.response.return_value.value
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Body {
    pub response: Response,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Response {
    pub method: String,
    pub interface: String,
    #[serde(rename = "returnValue")]
    pub return_value: ReturnValue,
}

/// The polymorphic payload: a single `value`, or one of the bulk lists that
/// the normalizer produced from `values xsi:type=...` elements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReturnValue {
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: Value,
    #[serde(rename = "ReleaseDTO")]
    pub releases: Vec<ReleaseDto>,
    #[serde(rename = "WorkItemDTO")]
    pub work_items: Vec<WorkItemDto>,
    #[serde(rename = "AttributeValuesDTO")]
    pub attribute_values: Vec<AttributeValuesDto>,
}

/// Union of every single-object return shape the client reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Value {
    #[serde(rename = "startIndex")]
    pub start_index: i64,
    #[serde(rename = "totalCount")]
    pub total_count: i64,
    #[serde(rename = "estimatedTotal")]
    pub estimated_total: i64,
    pub limit: i64,
    #[serde(rename = "resultToken")]
    pub result_token: String,
    pub headers: Vec<Header>,
    pub rows: Vec<Row>,
    #[serde(rename = "workItemSummaryDTOs")]
    pub summaries: Vec<WorkItemSummaryDto>,

    pub id: String,
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "stateId")]
    pub state_id: String,
    #[serde(rename = "locationUri")]
    pub location_uri: String,
    pub attributes: Vec<Attribute>,
    #[serde(rename = "linkTypes")]
    pub link_types: Vec<LinkType>,

    /// Saved item echoed back by `workItem2` calls.
    #[serde(rename = "workItem")]
    pub work_item: Option<WorkItemDto>,
}

/// Result-set column header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Header {
    #[serde(rename = "attributeId")]
    pub attribute_id: String,
    #[serde(rename = "attributeType")]
    pub attribute_type: String,
    pub label: String,
}

/// Result-set row; `labels` is positional against the requested columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Row {
    pub id: String,
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "stateGroup")]
    pub state_group: String,
    pub labels: Vec<String>,
    #[serde(rename = "locationUri")]
    pub location_uri: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkItemSummaryDto {
    pub id: String,
    #[serde(rename = "workItemItemId", alias = "itemId")]
    pub item_id: String,
    pub summary: String,
    #[serde(rename = "ownerName")]
    pub owner_name: String,
    #[serde(rename = "creatorName")]
    pub creator_name: String,
    #[serde(rename = "typeName")]
    pub type_name: String,
    #[serde(rename = "stateName")]
    pub state_name: String,
    #[serde(rename = "locationUri")]
    pub location_uri: String,
    pub description: String,
}

/// One opaque `key` / `value` triple.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Attribute {
    pub key: String,
    pub value: AttributeValue,
}

impl Attribute {
    #[must_use]
    pub fn new(key: impl Into<String>, label: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: AttributeValue {
                label: label.into(),
                content: content.into(),
                id: String::new(),
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AttributeValue {
    pub label: String,
    pub content: String,
    pub id: String,
}

impl AttributeValue {
    /// Label when present, content otherwise.
    #[must_use]
    pub fn display(&self) -> &str {
        if self.label.is_empty() {
            &self.content
        } else {
            &self.label
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LinkType {
    #[serde(rename = "endpointId")]
    pub endpoint_id: String,
    #[serde(rename = "displayName")]
    pub display_name: String,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Link {
    pub target: LinkTarget,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LinkTarget {
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "stateId")]
    pub state_id: String,
    #[serde(rename = "locationUri")]
    pub location_uri: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct WorkItemDto {
    pub id: String,
    #[serde(rename = "itemId")]
    pub item_id: String,
    #[serde(rename = "stateId")]
    pub state_id: String,
    #[serde(rename = "locationUri")]
    pub location_uri: String,
    pub attributes: Vec<Attribute>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReleaseDto {
    pub id: String,
    #[serde(rename = "itemId")]
    pub item_id: String,
    pub label: String,
    pub completed: bool,
    pub archived: bool,
    pub iterations: Vec<IterationDto>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IterationDto {
    pub id: String,
    #[serde(rename = "itemId")]
    pub item_id: String,
    pub label: String,
    pub completed: bool,
    pub archived: bool,
}

/// One lookup table: entries keyed by item id, labelled with display names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AttributeValuesDto {
    #[serde(rename = "attributeId")]
    pub attribute_id: String,
    pub values: Vec<Attribute>,
}
