//! `rtc query`: result-set query built from filter flags.

use crate::cmd::list::render_items;
use crate::context::Context;
use crate::output::progress;
use clap::Args;
use rtc_core::query::{DEFAULT_SORT_FIELD, QueryOptions};

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Items whose summary contains this text.
    #[arg(long)]
    pub summary: Option<String>,

    /// Items linked under this parent id.
    #[arg(long)]
    pub parent: Option<String>,

    /// Items whose owner name contains this text.
    #[arg(long)]
    pub owner: Option<String>,

    /// Field to sort by.
    #[arg(long, default_value = DEFAULT_SORT_FIELD)]
    pub sort: String,

    /// Sort ascending (descending is the default).
    #[arg(long)]
    pub asc: bool,

    /// How many results to return.
    #[arg(long = "maxresults", default_value_t = 15)]
    pub max_results: usize,

    /// Only items owned by the configured owner.
    #[arg(long)]
    pub mine: bool,

    /// Only closed items.
    #[arg(long, conflicts_with = "open")]
    pub closed: bool,

    /// Only open or in-progress items.
    #[arg(long)]
    pub open: bool,

    /// Only items planned for the current iteration.
    #[arg(long)]
    pub current: bool,
}

impl QueryArgs {
    fn to_options(&self) -> QueryOptions {
        QueryOptions {
            mine: self.mine,
            closed: self.closed,
            open: self.open,
            current: self.current,
            summary: self.summary.clone(),
            parent: self.parent.clone(),
            owner_name: self.owner.clone(),
            sort: self.sort.clone(),
            ascending: self.asc,
            max_results: self.max_results,
        }
    }
}

/// Execute `rtc query`.
///
/// # Errors
///
/// Contradictory or incomplete filters, login and query failures.
pub fn run_query(args: &QueryArgs, ctx: &Context) -> anyhow::Result<()> {
    let options = args.to_options();
    let spec = options.to_spec(&ctx.config.credentials.owner_id)?;

    let mut client = ctx.connect()?;
    progress(ctx.output, "Querying for work items that match your query...");
    let items = client.query(&spec)?;
    render_items(&items, ctx.output, ctx.max_width())
}
