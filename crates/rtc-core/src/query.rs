//! Query builder for the result-set endpoint.
//!
//! A [`QuerySpec`] becomes a form-encoded body. The filters travel as a
//! compact JSON expression in the `jsonExpression` field, next to paging,
//! column and sort parameters.

use crate::error::RtcError;
use serde::{Deserialize, Serialize};

/// Result-set columns, in the order row labels come back.
pub const COLUMNS: [&str; 11] = [
    "workItemType",
    "summary",
    "creator",
    "owner",
    "creationDate",
    "duration",
    "category",
    "target",
    "projectArea",
    "internalTags",
    "internalState",
];

pub const DEFAULT_SORT_FIELD: &str = "modified";
pub const DEFAULT_MAX_RESULTS: usize = 100;

const PARENT_LINK_FIELD: &str = "link:com.ibm.team.workitem.linktype.parentworkitem:target/id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Is,
    Contains,
}

/// Server-side variable substituted into a filter, e.g. `state/closed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    pub id: String,
    pub arguments: String,
}

impl Variable {
    pub fn new(id: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            arguments: arguments.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub operator: FilterOp,
    pub values: Vec<String>,
    pub variables: Vec<Variable>,
}

impl Filter {
    pub fn is(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operator: FilterOp::Is,
            values: vec![value.into()],
            variables: Vec::new(),
        }
    }

    pub fn contains(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            operator: FilterOp::Contains,
            ..Self::is(field, value)
        }
    }

    /// `is` filter matching a server variable instead of literal values.
    pub fn variable(field: impl Into<String>, variable: Variable) -> Self {
        Self {
            field: field.into(),
            operator: FilterOp::Is,
            values: Vec::new(),
            variables: vec![variable],
        }
    }

    pub fn owner(owner_id: impl Into<String>) -> Self {
        Self::is("owner", owner_id)
    }

    #[must_use]
    pub fn closed() -> Self {
        Self::variable("internalState", Variable::new("state", "closed"))
    }

    #[must_use]
    pub fn open() -> Self {
        Self::variable("internalState", Variable::new("state", "open or in progress"))
    }

    #[must_use]
    pub fn current_iteration() -> Self {
        Self::variable("target", Variable::new("current milestone", ""))
    }

    pub fn summary_contains(text: impl Into<String>) -> Self {
        Self::contains("summary", text)
    }

    pub fn parent(parent_id: impl Into<String>) -> Self {
        Self::is(PARENT_LINK_FIELD, parent_id)
    }

    pub fn owner_name_contains(name: impl Into<String>) -> Self {
        Self::contains("owner/name", name)
    }
}

/// Everything the result-set query needs besides the project area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub filters: Vec<Filter>,
    pub sort_field: String,
    pub sort_ascending: bool,
    pub max_results: usize,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            sort_field: DEFAULT_SORT_FIELD.to_string(),
            sort_ascending: false,
            max_results: DEFAULT_MAX_RESULTS,
        }
    }
}

impl QuerySpec {
    #[must_use]
    pub fn with_filters(filters: Vec<Filter>) -> Self {
        Self {
            filters,
            ..Self::default()
        }
    }
}

/// Wire shape of the embedded filter expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterExpression {
    pub operator: String,
    pub attribute_expressions: Vec<AttributeExpression>,
    pub term_expressions: Vec<serde_json::Value>,
    pub similarity_expressions: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeExpression {
    pub attribute_id: String,
    pub operator: FilterOp,
    pub values: Vec<String>,
    pub variables: Vec<Variable>,
}

impl From<&Filter> for AttributeExpression {
    fn from(filter: &Filter) -> Self {
        Self {
            attribute_id: filter.field.clone(),
            operator: filter.operator,
            values: filter.values.clone(),
            variables: filter.variables.clone(),
        }
    }
}

/// Ordered form fields ready to be sent as the request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    fields: Vec<(&'static str, String)>,
}

impl QueryRequest {
    /// `application/x-www-form-urlencoded` body.
    #[must_use]
    pub fn body(&self) -> String {
        self.fields
            .iter()
            .map(|(name, value)| format!("{name}={}", urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// First value of the form field `name`.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Every value of a repeated form field.
    #[must_use]
    pub fn fields(&self, name: &str) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    /// Decode the embedded filter expression.
    ///
    /// # Errors
    ///
    /// Returns [`RtcError::Decode`] if the field is missing or not valid JSON.
    pub fn expression(&self) -> Result<FilterExpression, RtcError> {
        let raw = self.field("jsonExpression").unwrap_or_default();
        serde_json::from_str(raw).map_err(|e| RtcError::decode(format!("filter expression: {e}"), raw))
    }
}

/// Build the result-set request for `spec` within `project_area`.
///
/// # Errors
///
/// Returns [`RtcError::Validation`] for an empty sort field or a zero page
/// size.
pub fn build(spec: &QuerySpec, project_area: &str) -> Result<QueryRequest, RtcError> {
    if spec.sort_field.trim().is_empty() {
        return Err(RtcError::validation("sort field must not be empty"));
    }
    if spec.max_results == 0 {
        return Err(RtcError::validation("max results must be at least 1"));
    }

    let expression = FilterExpression {
        operator: "AND".to_string(),
        attribute_expressions: spec.filters.iter().map(AttributeExpression::from).collect(),
        term_expressions: Vec::new(),
        similarity_expressions: Vec::new(),
    };
    let json = serde_json::to_string(&expression)
        .map_err(|e| RtcError::validation(format!("cannot serialize filter expression: {e}")))?;

    let mut fields: Vec<(&'static str, String)> = vec![
        ("startIndex", "0".to_string()),
        ("maxResults", spec.max_results.to_string()),
        ("filterAttribute", String::new()),
        ("filterValue", String::new()),
    ];
    fields.extend(COLUMNS.iter().map(|c| ("columnIdentifiers", (*c).to_string())));
    fields.push(("sortColumns", spec.sort_field.clone()));
    fields.push(("sortDirections", spec.sort_ascending.to_string()));
    fields.push(("projectAreaItemId", project_area.to_string()));
    fields.push(("jsonExpression", json));

    Ok(QueryRequest { fields })
}

/// Query flags as the command line collects them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub mine: bool,
    pub closed: bool,
    pub open: bool,
    pub current: bool,
    pub summary: Option<String>,
    pub parent: Option<String>,
    pub owner_name: Option<String>,
    pub sort: String,
    pub ascending: bool,
    pub max_results: usize,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            mine: false,
            closed: false,
            open: false,
            current: false,
            summary: None,
            parent: None,
            owner_name: None,
            sort: DEFAULT_SORT_FIELD.to_string(),
            ascending: false,
            max_results: 15,
        }
    }
}

impl QueryOptions {
    /// Reject contradictory flags.
    ///
    /// # Errors
    ///
    /// Returns [`RtcError::Validation`] when both `closed` and `open` are set.
    pub fn check(&self) -> Result<(), RtcError> {
        if self.closed && self.open {
            return Err(RtcError::validation("can't use --closed with --open"));
        }
        Ok(())
    }

    /// Translate the flags into a [`QuerySpec`], scoping `mine` to `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`RtcError::Validation`] for contradictory flags or when
    /// `mine` is requested without a configured owner.
    pub fn to_spec(&self, owner_id: &str) -> Result<QuerySpec, RtcError> {
        self.check()?;

        let mut filters = Vec::new();
        if self.mine {
            if owner_id.is_empty() {
                return Err(RtcError::validation(
                    "--mine needs credentials.owner_id in the config",
                ));
            }
            filters.push(Filter::owner(owner_id));
        }
        if self.closed {
            filters.push(Filter::closed());
        }
        if self.open {
            filters.push(Filter::open());
        }
        if self.current {
            filters.push(Filter::current_iteration());
        }
        if let Some(text) = non_empty(self.summary.as_deref()) {
            filters.push(Filter::summary_contains(text));
        }
        if let Some(parent) = non_empty(self.parent.as_deref()) {
            filters.push(Filter::parent(parent));
        }
        if let Some(name) = non_empty(self.owner_name.as_deref()) {
            filters.push(Filter::owner_name_contains(name));
        }

        Ok(QuerySpec {
            filters,
            sort_field: self.sort.clone(),
            sort_ascending: self.ascending,
            max_results: self.max_results,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    const PROJECT: &str = "_U7zMYFRcEd61fuNW84kdiQ";

    #[test]
    fn zero_filters_is_a_match_all_and() {
        let req = build(&QuerySpec::default(), PROJECT).expect("build");
        let expr = req.expression().expect("expression");
        assert_eq!(expr.operator, "AND");
        assert!(expr.attribute_expressions.is_empty());
        assert_eq!(
            req.field("jsonExpression"),
            Some(r#"{"operator":"AND","attributeExpressions":[],"termExpressions":[],"similarityExpressions":[]}"#)
        );
    }

    #[test]
    fn sort_direction_is_always_explicit() {
        let req = build(&QuerySpec::default(), PROJECT).expect("build");
        assert_eq!(req.field("sortDirections"), Some("false"));
        assert!(req.body().contains("sortDirections=false"));

        let asc = QuerySpec {
            sort_ascending: true,
            ..QuerySpec::default()
        };
        let req = build(&asc, PROJECT).expect("build");
        assert_eq!(req.field("sortDirections"), Some("true"));
    }

    #[test]
    fn paging_columns_and_project_are_included() {
        let spec = QuerySpec {
            max_results: 15,
            sort_field: "id".into(),
            ..QuerySpec::default()
        };
        let req = build(&spec, PROJECT).expect("build");
        assert_eq!(req.field("startIndex"), Some("0"));
        assert_eq!(req.field("maxResults"), Some("15"));
        assert_eq!(req.field("sortColumns"), Some("id"));
        assert_eq!(req.field("projectAreaItemId"), Some(PROJECT));
        assert_eq!(req.fields("columnIdentifiers"), COLUMNS.to_vec());
    }

    #[test]
    fn filters_are_carried_in_order() {
        let spec = QuerySpec::with_filters(vec![Filter::owner("_u1"), Filter::closed()]);
        let expr = build(&spec, PROJECT).expect("build").expression().expect("expr");

        assert_eq!(expr.attribute_expressions.len(), 2);
        let owner = &expr.attribute_expressions[0];
        assert_eq!(owner.attribute_id, "owner");
        assert_eq!(owner.operator, FilterOp::Is);
        assert_eq!(owner.values, vec!["_u1"]);

        let closed = &expr.attribute_expressions[1];
        assert_eq!(closed.attribute_id, "internalState");
        assert!(closed.values.is_empty());
        assert_eq!(closed.variables, vec![Variable::new("state", "closed")]);
    }

    #[test]
    fn body_is_form_encoded() {
        let spec = QuerySpec::with_filters(vec![Filter::summary_contains("a & b")]);
        let body = build(&spec, PROJECT).expect("build").body();
        assert!(body.contains("jsonExpression=%7B%22operator%22%3A%22AND%22"), "{body}");
        assert!(body.contains("a%20%26%20b"), "{body}");
        assert!(!body.contains(' '));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let spec = QuerySpec {
            max_results: 0,
            ..QuerySpec::default()
        };
        let err = build(&spec, PROJECT).expect_err("must fail");
        assert_eq!(err.code(), ErrorCode::ValidationFailed);
    }

    #[test]
    fn closed_and_open_together_is_invalid() {
        let opts = QueryOptions {
            closed: true,
            open: true,
            ..QueryOptions::default()
        };
        let err = opts.to_spec("_u1").expect_err("must fail");
        assert!(err.to_string().contains("--closed"));
    }

    #[test]
    fn options_translate_to_canned_filters() {
        let opts = QueryOptions {
            mine: true,
            open: true,
            current: true,
            summary: Some("crash".into()),
            parent: Some("900".into()),
            owner_name: Some(String::new()),
            ..QueryOptions::default()
        };
        let spec = opts.to_spec("_u1").expect("spec");
        let fields: Vec<&str> = spec.filters.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(
            fields,
            vec!["owner", "internalState", "target", "summary", PARENT_LINK_FIELD]
        );
        assert_eq!(spec.filters[3].operator, FilterOp::Contains);
        assert_eq!(spec.max_results, 15);
        assert_eq!(spec.sort_field, "modified");
    }

    #[test]
    fn mine_without_owner_is_invalid() {
        let opts = QueryOptions {
            mine: true,
            ..QueryOptions::default()
        };
        assert_eq!(
            opts.to_spec("").expect_err("must fail").code(),
            ErrorCode::ValidationFailed
        );
    }
}
