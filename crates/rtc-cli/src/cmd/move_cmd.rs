//! `rtc move`: plan work items for an iteration.

use crate::context::Context;
use crate::output::{progress, render};
use anyhow::Context as _;
use clap::Args;
use rtc_core::RtcError;
use rtc_core::model::{Iteration, IterationSelector};
use serde::Serialize;
use std::io::Write;

#[derive(Args, Debug)]
pub struct MoveArgs {
    /// Work item ids, comma-separated.
    pub ids: String,

    /// Iteration index or item id (see `rtc iterations`).
    pub iteration: IterationSelector,
}

#[derive(Debug, Serialize)]
struct MoveOutcome {
    moved: Vec<String>,
    iteration: Iteration,
}

fn split_ids(ids: &str) -> Vec<&str> {
    ids.split(',').map(str::trim).filter(|id| !id.is_empty()).collect()
}

/// Execute `rtc move <ids> <iteration>`.
///
/// Items are moved one at a time; the first failure stops the command and
/// names the items already moved.
///
/// # Errors
///
/// [`RtcError::Validation`] without ids, otherwise login and move failures.
pub fn run_move(args: &MoveArgs, ctx: &Context) -> anyhow::Result<()> {
    let ids = split_ids(&args.ids);
    if ids.is_empty() {
        return Err(RtcError::Validation("no work item ids given".into()).into());
    }

    let mut client = ctx.connect()?;
    let mut moved = Vec::with_capacity(ids.len());
    let mut target = None;
    for id in ids {
        progress(ctx.output, format!("Moving work item {id}..."));
        let (_, iteration) = client
            .move_to_iteration(id, &args.iteration)
            .with_context(|| format!("moving {id} (already moved: {})", describe(&moved)))?;
        moved.push(id.to_string());
        target = Some(iteration);
    }

    let outcome = MoveOutcome {
        moved,
        iteration: target.unwrap_or_default(),
    };
    render(ctx.output, &outcome, |o, w| {
        writeln!(
            w,
            "\nSuccessfully moved work items {} to iteration {}",
            o.moved.join(","),
            o.iteration.label
        )
    })
}

fn describe(moved: &[String]) -> String {
    if moved.is_empty() {
        "none".to_string()
    } else {
        moved.join(",")
    }
}
