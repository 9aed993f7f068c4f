//! `rtc update` and `rtc close`.

use crate::context::Context;
use crate::output::{progress, render};
use anyhow::Context as _;
use clap::Args;
use rtc_core::RtcError;
use rtc_core::lifecycle::LifecycleAction;
use rtc_core::model::{IterationSelector, WorkItemUpdate};
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Work item id.
    pub id: String,

    /// New estimate, e.g. `8h`.
    #[arg(long)]
    pub estimate: Option<String>,

    /// Time spent so far.
    #[arg(long = "timespent")]
    pub time_spent: Option<String>,

    /// Iteration index or item id (see `rtc iterations`).
    #[arg(long)]
    pub iteration: Option<IterationSelector>,

    /// Start working on the item.
    #[arg(long)]
    pub start: bool,

    /// Resolve the item.
    #[arg(long)]
    pub resolve: bool,

    /// Close the item.
    #[arg(long)]
    pub close: bool,

    /// Reopen the item.
    #[arg(long)]
    pub reopen: bool,
}

impl UpdateArgs {
    /// Requested actions in the order they run.
    fn actions(&self) -> Vec<LifecycleAction> {
        [
            (self.start, LifecycleAction::Start),
            (self.resolve, LifecycleAction::Resolve),
            (self.close, LifecycleAction::Close),
            (self.reopen, LifecycleAction::Reopen),
        ]
        .into_iter()
        .filter_map(|(set, action)| set.then_some(action))
        .collect()
    }

    fn to_update(&self) -> WorkItemUpdate {
        WorkItemUpdate {
            estimate: self.estimate.clone(),
            time_spent: self.time_spent.clone(),
            iteration: self.iteration.clone(),
            ..WorkItemUpdate::new(self.id.clone())
        }
    }
}

fn applied(actions: &[LifecycleAction]) -> String {
    if actions.is_empty() {
        "none".to_string()
    } else {
        actions.iter().map(|a| a.name()).collect::<Vec<_>>().join(",")
    }
}

#[derive(Args, Debug)]
pub struct CloseArgs {
    /// Work item id.
    pub id: String,
}

#[derive(Debug, Serialize)]
struct UpdateOutcome {
    id: String,
    actions: Vec<&'static str>,
    attributes_updated: bool,
}

/// Execute `rtc update <id>`.
///
/// Actions run first (start, resolve, close, reopen), then attribute
/// changes. The first failure stops the command and names the actions that
/// already went through.
///
/// # Errors
///
/// [`RtcError::Validation`] when nothing was requested, otherwise login,
/// transition and update failures.
pub fn run_update(args: &UpdateArgs, ctx: &Context) -> anyhow::Result<()> {
    let actions = args.actions();
    let update = args.to_update();
    if actions.is_empty() && !update.has_changes() {
        return Err(RtcError::Validation(
            "nothing to update: pass --estimate, --timespent, --iteration or an action flag"
                .into(),
        )
        .into());
    }

    let mut client = ctx.connect()?;
    for (done, action) in actions.iter().enumerate() {
        progress(
            ctx.output,
            format!("Attempting to {} work item {}...", action.name(), args.id),
        );
        client.transition(&args.id, *action).with_context(|| {
            format!(
                "{} on work item {} (already applied: {})",
                action.name(),
                args.id,
                applied(&actions[..done])
            )
        })?;
    }

    if update.has_changes() {
        progress(ctx.output, format!("Updating work item {}...", args.id));
        client.update(&update).with_context(|| {
            format!(
                "updating work item {} (already applied: {})",
                args.id,
                applied(&actions)
            )
        })?;
    }

    let outcome = UpdateOutcome {
        id: args.id.clone(),
        actions: actions.iter().map(|a| a.name()).collect(),
        attributes_updated: update.has_changes(),
    };
    render(ctx.output, &outcome, |_, w| {
        writeln!(w, "Work item successfully updated.")
    })
}

/// Execute `rtc close <id>`.
///
/// # Errors
///
/// Login and transition failures.
pub fn run_close(args: &CloseArgs, ctx: &Context) -> anyhow::Result<()> {
    let mut client = ctx.connect()?;
    client.transition(&args.id, LifecycleAction::Close)?;

    let outcome = UpdateOutcome {
        id: args.id.clone(),
        actions: vec![LifecycleAction::Close.name()],
        attributes_updated: false,
    };
    render(ctx.output, &outcome, |o, w| {
        writeln!(w, "Successfully closed work item {}", o.id)
    })
}
