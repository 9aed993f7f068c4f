//! `rtc open`: show a work item in the web UI.

use crate::context::Context;
use crate::output::{progress, render};
use anyhow::Context as _;
use clap::Args;
use std::io::Write;

#[derive(Args, Debug)]
pub struct OpenArgs {
    /// Work item id.
    pub id: String,

    /// Print the location instead of launching a browser.
    #[arg(long)]
    pub print: bool,
}

/// Execute `rtc open <id>`.
///
/// # Errors
///
/// Login and retrieve failures, or a browser that could not be launched.
pub fn run_open(args: &OpenArgs, ctx: &Context) -> anyhow::Result<()> {
    let mut client = ctx.connect()?;
    let uri = client.work_item_uri(&args.id)?;

    if !args.print && !ctx.output.is_json() {
        progress(
            ctx.output,
            format!("Opening work item {} in your browser...", args.id),
        );
        open::that(&uri).with_context(|| format!("launching a browser for {uri}"))?;
        return Ok(());
    }

    let location = serde_json::json!({ "id": args.id, "location_uri": uri });
    render(ctx.output, &location, |_, w| writeln!(w, "{uri}"))
}
