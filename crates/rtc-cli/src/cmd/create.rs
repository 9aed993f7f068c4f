//! `rtc create` and `rtc subtask`.

use crate::context::Context;
use crate::output::{progress, render};
use clap::Args;
use rtc_core::model::{DEFAULT_KIND, NewWorkItem};
use std::io::Write;

#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Summary of the new work item.
    pub summary: String,

    /// Work item type.
    #[arg(long = "type", value_name = "TYPE", default_value = DEFAULT_KIND)]
    pub kind: String,

    /// Id of the parent to link the new item under.
    #[arg(long)]
    pub parent: Option<String>,
}

impl CreateArgs {
    fn to_new(&self) -> NewWorkItem {
        let new = NewWorkItem::new(self.summary.clone()).kind(self.kind.clone());
        match self.parent.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(parent) => new.parent(parent),
            None => new,
        }
    }
}

#[derive(Args, Debug)]
pub struct SubtaskArgs {
    /// Id of the story to add a subtask to.
    pub id: String,

    /// Subtask kind, used as the summary prefix.
    #[arg(long = "type", value_name = "TYPE", default_value = "Artifacts")]
    pub kind: String,
}

/// Execute `rtc create <summary>`.
///
/// # Errors
///
/// Login failures and any step of the create flow.
pub fn run_create(args: &CreateArgs, ctx: &Context) -> anyhow::Result<()> {
    let new = args.to_new();
    let mut client = ctx.connect()?;

    progress(ctx.output, format!("Creating {} {}...", new.kind, new.summary));
    if let Some(parent) = &new.parent {
        progress(ctx.output, format!("Adding {parent} as parent..."));
    }
    let item = client.create(&new)?;

    render(ctx.output, &item, |item, w| {
        writeln!(w, "Successfully created: {}", item.title())
    })
}

/// Execute `rtc subtask <id>`.
///
/// # Errors
///
/// Login failures and any step of the subtask flow.
pub fn run_subtask(args: &SubtaskArgs, ctx: &Context) -> anyhow::Result<()> {
    let mut client = ctx.connect()?;

    progress(ctx.output, format!("Creating a subtask of type {}...", args.kind));
    let item = client.create_subtask(&args.id, &args.kind)?;

    render(ctx.output, &item, |item, w| {
        writeln!(w, "Created {}", item.title())
    })
}
