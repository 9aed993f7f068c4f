//! `rtc releases` and `rtc iterations`.
//!
//! Rows are numbered by position in the full list, so the numbers shown by
//! `rtc iterations` are the indexes `rtc move` and `--iteration` accept even
//! when completed entries are hidden.

use crate::context::Context;
use crate::output::{Renderable, render_list};
use clap::Args;
use rtc_core::model::{Iteration, Release};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct PlanningArgs {
    /// Include completed entries.
    #[arg(long)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
pub struct PlanRow {
    pub index: usize,
    pub item_id: String,
    pub label: String,
    pub completed: bool,
}

impl PlanRow {
    fn from_iteration(index: usize, iteration: &Iteration) -> Self {
        Self {
            index,
            item_id: iteration.item_id.clone(),
            label: iteration.label.clone(),
            completed: iteration.completed,
        }
    }

    fn from_release(index: usize, release: &Release) -> Self {
        Self {
            index,
            item_id: release.item_id.clone(),
            label: release.label.clone(),
            completed: release.completed,
        }
    }
}

impl Renderable for PlanRow {
    fn cells(&self) -> Vec<String> {
        vec![self.index.to_string(), self.label.clone(), self.item_id.clone()]
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *w, self)?;
        writeln!(w)
    }

    fn table_headers() -> &'static [&'static str] {
        &["Id", "Label", "Item Id"]
    }
}

fn visible(rows: Vec<PlanRow>, all: bool) -> Vec<PlanRow> {
    rows.into_iter().filter(|row| all || !row.completed).collect()
}

/// Execute `rtc releases`.
///
/// # Errors
///
/// Login, fetch and rendering failures.
pub fn run_releases(args: &PlanningArgs, ctx: &Context) -> anyhow::Result<()> {
    let mut client = ctx.connect()?;
    let rows = client
        .releases()?
        .iter()
        .enumerate()
        .map(|(i, release)| PlanRow::from_release(i, release))
        .collect();
    render_list(&visible(rows, args.all), ctx.output, ctx.max_width())?;
    Ok(())
}

/// Execute `rtc iterations`.
///
/// # Errors
///
/// Login, fetch and rendering failures.
pub fn run_iterations(args: &PlanningArgs, ctx: &Context) -> anyhow::Result<()> {
    let mut client = ctx.connect()?;
    let rows = client
        .iterations()?
        .iter()
        .enumerate()
        .map(|(i, iteration)| PlanRow::from_iteration(i, iteration))
        .collect();
    render_list(&visible(rows, args.all), ctx.output, ctx.max_width())?;
    Ok(())
}
