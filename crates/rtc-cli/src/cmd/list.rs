//! `rtc list`: open work items owned by the configured owner.

use crate::context::Context;
use crate::output::{OutputMode, Renderable, progress, render_list};
use clap::Args;
use rtc_core::model::WorkItem;
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only items of this type (case-insensitive), e.g. `Defect`.
    #[arg(long = "type", value_name = "TYPE")]
    pub kind: Option<String>,
}

/// One table row: Id, Type, Summary, Planned For, Owner initials, State.
pub struct ItemRow<'a>(pub &'a WorkItem);

impl Renderable for ItemRow<'_> {
    fn cells(&self) -> Vec<String> {
        let item = self.0;
        vec![
            item.id.clone(),
            item.kind.clone(),
            item.summary.clone(),
            item.planned_for.clone(),
            item.owner_initials(),
            item.state.clone(),
        ]
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *w, self.0)?;
        writeln!(w)
    }

    fn table_headers() -> &'static [&'static str] {
        &["Id", "Type", "Summary", "Planned For", "Owner", "State"]
    }
}

/// Print work items as a table, or a note when there are none.
///
/// # Errors
///
/// Returns an error if writing to stdout fails.
pub fn render_items(items: &[WorkItem], output: OutputMode, max_width: usize) -> anyhow::Result<()> {
    if items.is_empty() && output == OutputMode::Pretty {
        println!("No work items to be displayed.");
        return Ok(());
    }
    let rows: Vec<ItemRow<'_>> = items.iter().map(ItemRow).collect();
    render_list(&rows, output, max_width)?;
    Ok(())
}

fn filter_kind(items: Vec<WorkItem>, kind: Option<&str>) -> Vec<WorkItem> {
    match kind.map(str::trim).filter(|k| !k.is_empty()) {
        Some(kind) => items
            .into_iter()
            .filter(|item| item.kind.eq_ignore_ascii_case(kind))
            .collect(),
        None => items,
    }
}

/// Execute `rtc list`.
///
/// # Errors
///
/// Login, query and rendering failures.
pub fn run_list(args: &ListArgs, ctx: &Context) -> anyhow::Result<()> {
    let mut client = ctx.connect()?;
    let items = filter_kind(client.current_work_items()?, args.kind.as_deref());

    progress(
        ctx.output,
        format!("Listing the {} open items assigned to you\n", items.len()),
    );
    render_items(&items, ctx.output, ctx.max_width())
}
