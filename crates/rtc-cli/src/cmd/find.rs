//! `rtc find`: full-text search.

use crate::cmd::list::render_items;
use crate::context::Context;
use crate::output::progress;
use clap::Args;

#[derive(Args, Debug)]
pub struct FindArgs {
    /// Text to search for.
    pub text: String,
}

/// Execute `rtc find <text>`.
///
/// # Errors
///
/// Login, search and rendering failures.
pub fn run_find(args: &FindArgs, ctx: &Context) -> anyhow::Result<()> {
    let mut client = ctx.connect()?;
    progress(
        ctx.output,
        format!("Searching for work items containing \"{}\"...\n", args.text),
    );
    let items = client.search(&args.text)?;
    render_items(&items, ctx.output, ctx.max_width())
}
