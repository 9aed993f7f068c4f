//! Mutations: create, link, attribute updates and workflow actions.
//!
//! Multi-step flows are not transactional. A failure after something was
//! committed on the server comes back as [`RtcError::StepFailed`] naming the
//! committed side effect.

use super::endpoints::SaveForm;
use super::Client;
use crate::attributes::project;
use crate::envelope::{Envelope, WorkItemDto};
use crate::error::{RtcError, StepContext};
use crate::lifecycle::{LifecycleAction, LifecycleState};
use crate::model::{Iteration, IterationSelector, NewWorkItem, WorkItem, WorkItemUpdate};
use crate::transport::{Exchange, Method};
use tracing::{debug, info, warn};

/// "Where found" classification every new item is filed under.
const DEFAULT_WHERE_FOUND: &str = "Work_Product_where_found.literal.l2";

/// Internal handles of an item, read right before a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemIds {
    pub item_id: String,
    pub state_id: String,
    /// `internalState` label at the time of the read.
    pub state: String,
}

impl<X: Exchange> Client<X> {
    /// Create a work item, then link it to `new.parent` if one is given.
    ///
    /// # Errors
    ///
    /// [`RtcError::Validation`] for an empty summary, otherwise
    /// [`RtcError::StepFailed`] naming the failed step.
    pub fn create(&mut self, new: &NewWorkItem) -> Result<WorkItem, RtcError> {
        self.create_as("create", new)
    }

    /// Create a task titled `"{kind}: {parent summary}"` under `parent_id`.
    ///
    /// # Errors
    ///
    /// [`RtcError::StepFailed`]; when linking fails the created id is reported.
    pub fn create_subtask(&mut self, parent_id: &str, kind: &str) -> Result<WorkItem, RtcError> {
        const OP: &str = "create subtask";

        let parent = self.retrieve(parent_id).step(OP, "retrieve parent", None)?;
        let new = NewWorkItem::new(format!("{kind}: {}", parent.summary)).parent(parent_id);
        self.create_as(OP, &new)
    }

    fn create_as(&mut self, op: &'static str, new: &NewWorkItem) -> Result<WorkItem, RtcError> {
        if new.summary.trim().is_empty() {
            return Err(RtcError::validation("summary must not be empty"));
        }
        let kind = new.kind.to_ascii_lowercase();

        let item_id = self.allocate(&kind).step(op, "allocate item id", None)?;
        let id = self.commit_new(&item_id, &kind, &new.summary).step(op, "commit", None)?;
        info!(id = %id, kind = %kind, "created work item");

        let committed = format!("work item {id}");
        let item = self
            .retrieve(&id)
            .step(op, "re-fetch", Some(committed.as_str()))?;

        if let Some(parent) = &new.parent {
            self.add_parent(&id, parent)
                .step(op, "link parent", Some(committed.as_str()))?;
        }

        Ok(item)
    }

    fn allocate(&mut self, kind: &str) -> Result<String, RtcError> {
        let url = self.endpoints.allocate(kind);
        let envelope = self.envelope(Method::Get, &url, "")?;
        let item_id = envelope.body.response.return_value.value.item_id;
        if item_id.is_empty() {
            return Err(RtcError::decode("allocation response without itemId", ""));
        }
        Ok(item_id)
    }

    fn commit_new(&mut self, item_id: &str, kind: &str, summary: &str) -> Result<String, RtcError> {
        let mut form = SaveForm::new(item_id)
            .attribute("summary", summary)
            .attribute("workItemType", kind)
            .attribute("work_product_where_found", DEFAULT_WHERE_FOUND);
        if !self.identity.owner_id.is_empty() {
            form = form.attribute("owner", &self.identity.owner_id);
        }

        let envelope = self.save(form)?;
        envelope
            .value()
            .work_item
            .as_ref()
            .map(public_id)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| RtcError::decode("save response without the new work item id", ""))
    }

    /// Link `id` under `parent_id` with the configured parent link type.
    ///
    /// # Errors
    ///
    /// Propagates read and save failures.
    pub fn add_parent(&mut self, id: &str, parent_id: &str) -> Result<(), RtcError> {
        let child = self.resolve_ids(id)?;
        let parent = self.get_work_item(parent_id)?;

        let command = serde_json::json!({
            "cmd": "addLink",
            "type": self.server.link_type_parent,
            "end": "target",
            "name": "Parent",
            "itemId": parent.item_id,
            "comment": format!("{}: {}", parent.id, parent.summary),
        })
        .to_string();

        let form = SaveForm::new(&child.item_id)
            .state(&child.state_id)
            .update_links(&command);
        self.save(form)?;
        info!(id, parent = parent_id, "linked parent");
        Ok(())
    }

    /// Write estimate, time spent and/or planned iteration.
    ///
    /// # Errors
    ///
    /// [`RtcError::Validation`] for a missing id, an update with no fields,
    /// or an iteration that cannot be found.
    pub fn update(&mut self, update: &WorkItemUpdate) -> Result<(), RtcError> {
        if update.id.is_empty() {
            return Err(RtcError::validation("missing work item id"));
        }
        if !update.has_changes() {
            return Err(RtcError::validation(
                "nothing to update: set an estimate, time spent or iteration",
            ));
        }

        let mut changes: Vec<(&str, String)> = Vec::new();
        if let Some(time_spent) = &update.time_spent {
            changes.push(("timeSpent", time_spent.clone()));
        }
        if let Some(estimate) = &update.estimate {
            changes.push(("duration", estimate.clone()));
        }
        if let Some(selector) = &update.iteration {
            changes.push(("target", self.resolve_iteration(selector)?.item_id));
        }

        self.set_attributes(&update.id, &changes)?;
        info!(id = %update.id, fields = changes.len(), "updated work item");
        Ok(())
    }

    /// Plan `id` for the selected iteration.
    ///
    /// # Errors
    ///
    /// [`RtcError::NotFound`] for an unknown item, [`RtcError::Validation`]
    /// for an iteration that is out of range or unknown.
    pub fn move_to_iteration(
        &mut self,
        id: &str,
        selector: &IterationSelector,
    ) -> Result<(WorkItem, Iteration), RtcError> {
        let item = self.get_work_item(id)?;
        let iteration = self.resolve_iteration(selector)?;
        self.set_attributes(id, &[("target", iteration.item_id.clone())])?;
        info!(id, iteration = %iteration.label, "moved work item");
        Ok((item, iteration))
    }

    /// Look the selector up in a freshly fetched iteration list.
    fn resolve_iteration(&mut self, selector: &IterationSelector) -> Result<Iteration, RtcError> {
        let iterations = self.iterations()?;
        selector.select(&iterations).cloned().ok_or_else(|| {
            let detail = match selector {
                IterationSelector::Index(index) => format!(
                    "iteration {index} is out of range ({} iterations)",
                    iterations.len()
                ),
                IterationSelector::ItemId(item_id) => format!("iteration {item_id} not found"),
            };
            RtcError::validation(format!("{detail}; use the iterations command"))
        })
    }

    fn set_attributes(&mut self, id: &str, changes: &[(&str, String)]) -> Result<Envelope, RtcError> {
        let ids = self.resolve_ids(id)?;
        let form = changes
            .iter()
            .fold(SaveForm::new(&ids.item_id).state(&ids.state_id), |form, (k, v)| {
                form.attribute(k, v)
            });
        self.save(form)
    }

    fn save(&mut self, form: SaveForm) -> Result<Envelope, RtcError> {
        let url = self.endpoints.save();
        let body = form.finish(self.endpoints.project_area());
        self.envelope(Method::Post, &url, &body)
    }

    /// Detail read for the internal ids a write needs.
    ///
    /// # Errors
    ///
    /// [`RtcError::NotFound`] when the server knows no such item.
    pub fn resolve_ids(&mut self, id: &str) -> Result<ItemIds, RtcError> {
        let detail = self.detail(id)?;
        let state = project(&detail).get("internalState").to_string();
        Ok(ItemIds {
            item_id: detail.item_id,
            state_id: detail.state_id,
            state,
        })
    }

    /// Write phase of a workflow action: post it and return the saved item.
    ///
    /// # Errors
    ///
    /// Transport, status and decode failures of the save.
    pub fn apply_action(
        &mut self,
        ids: &ItemIds,
        wire_action: &str,
    ) -> Result<Option<WorkItemDto>, RtcError> {
        debug!(item = %ids.item_id, action = wire_action, "applying workflow action");
        let form = SaveForm::new(&ids.item_id)
            .state(&ids.state_id)
            .attribute("internalResolution", "")
            .action(wire_action);
        Ok(self.save(form)?.body.response.return_value.value.work_item)
    }

    /// Verify phase: the saved item must report `expected` as its state.
    ///
    /// On a mismatch the item is re-read so the error names its real state.
    ///
    /// # Errors
    ///
    /// [`RtcError::ActionFailed`] on mismatch. A failed re-read comes back as
    /// [`RtcError::StepFailed`], since the action was already posted.
    pub fn verify_action(
        &mut self,
        name: &str,
        id: &str,
        saved: Option<&WorkItemDto>,
        expected: &str,
    ) -> Result<(), RtcError> {
        let reported = saved.map(|dto| project(dto).get("internalState").to_string());
        if reported.as_deref() == Some(expected) {
            return Ok(());
        }

        warn!(id, action = name, expected, reported = ?reported, "workflow action not reflected");
        let committed = format!("{name} posted for work item {id}");
        let current = self
            .get_work_item(id)
            .step("workflow action", "verify re-read", Some(committed.as_str()))?;
        Err(RtcError::ActionFailed {
            action: name.to_string(),
            id: id.to_string(),
            expected: expected.to_string(),
            actual: current.state,
        })
    }

    /// Run a workflow action by code and check the state it lands in.
    ///
    /// # Errors
    ///
    /// As [`Client::apply_action`] and [`Client::verify_action`].
    pub fn perform_action(
        &mut self,
        name: &str,
        id: &str,
        code: &str,
        expected: &str,
    ) -> Result<(), RtcError> {
        let ids = self.resolve_ids(id)?;
        let wire = format!("{}.{code}", self.server.workflow_action_prefix);
        let saved = self.apply_action(&ids, &wire)?;
        self.verify_action(name, id, saved.as_ref(), expected)
    }

    /// Drive `action` after checking it is allowed from the current state.
    ///
    /// States the client does not recognize are left for the server to judge.
    ///
    /// # Errors
    ///
    /// [`RtcError::InvalidTransition`] before any write, otherwise as
    /// [`Client::perform_action`].
    pub fn transition(&mut self, id: &str, action: LifecycleAction) -> Result<(), RtcError> {
        let ids = self.resolve_ids(id)?;

        match LifecycleState::from_label(&ids.state) {
            Some(state) if !state.allows(action) => {
                return Err(RtcError::InvalidTransition {
                    id: id.to_string(),
                    action: action.name(),
                    from: ids.state,
                });
            }
            Some(_) => {}
            None => debug!(id, state = %ids.state, "unrecognized state; deferring to server"),
        }

        let wire = action.wire_action(&self.server.workflow_action_prefix);
        let saved = self.apply_action(&ids, &wire)?;
        self.verify_action(action.name(), id, saved.as_ref(), action.expected_label())?;
        info!(id, action = action.name(), "work item {}", action.expected_label().to_lowercase());
        Ok(())
    }
}

/// Public id of a saved item: the `id` element, or its `id` attribute.
fn public_id(dto: &WorkItemDto) -> String {
    if dto.id.is_empty() {
        project(dto).get("id").to_string()
    } else {
        dto.id.clone()
    }
}
