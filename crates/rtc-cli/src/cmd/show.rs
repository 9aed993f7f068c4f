//! `rtc show` / `rtc info` and `rtc tree`: one work item in detail, and its
//! parent/child links.

use crate::context::Context;
use crate::output::{pretty_kv, pretty_rule, render};
use clap::Args;
use regex::{Captures, Regex};
use rtc_core::model::{Reference, WorkItem};
use std::io::{self, Write};
use std::sync::LazyLock;

static BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<br\s*/?>|</p\s*>|</div\s*>|</li\s*>").expect("regex"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("regex"));
static BLANK_LINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("regex"));
static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#[xX]([0-9a-fA-F]{1,6})|#([0-9]{1,7})|([a-zA-Z]+));").expect("regex")
});

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Work item id.
    pub id: String,

    /// Omit the description.
    #[arg(long)]
    pub summary: bool,
}

#[derive(Args, Debug)]
pub struct TreeArgs {
    /// Work item id.
    pub id: String,
}

/// Reduce an HTML description to plain text.
///
/// Block ends become line breaks, remaining tags are dropped and the common
/// entities are decoded.
pub fn html_to_text(html: &str) -> String {
    let text = BREAK.replace_all(html, "\n");
    let text = TAG.replace_all(&text, "");
    let text = ENTITY.replace_all(&text, |caps: &Captures<'_>| {
        decode_entity(caps).map_or_else(|| caps[0].to_string(), String::from)
    });
    BLANK_LINES.replace_all(text.trim(), "\n\n").into_owned()
}

/// One entity match; unknown names and invalid code points yield `None`.
fn decode_entity(caps: &Captures<'_>) -> Option<char> {
    if let Some(hex) = caps.get(1) {
        return u32::from_str_radix(hex.as_str(), 16).ok().and_then(char::from_u32);
    }
    if let Some(dec) = caps.get(2) {
        return dec.as_str().parse().ok().and_then(char::from_u32);
    }
    match caps.get(3)?.as_str() {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some(' '),
        _ => None,
    }
}

fn write_links(w: &mut dyn Write, heading: &str, links: &[Reference]) -> io::Result<()> {
    writeln!(w, "{heading}:\n")?;
    for link in links {
        writeln!(w, "  - {} {} - {}", link.kind, link.id, link.summary)?;
    }
    Ok(())
}

fn write_tree(w: &mut dyn Write, item: &WorkItem) -> io::Result<()> {
    if !item.parents.is_empty() {
        write_links(w, "Parents", &item.parents)?;
        if !item.children.is_empty() {
            writeln!(w)?;
        }
    }
    if !item.children.is_empty() {
        write_links(w, "Children", &item.children)?;
    }
    Ok(())
}

fn write_card(w: &mut dyn Write, item: &WorkItem, with_description: bool) -> io::Result<()> {
    let title = format!(" {} ", item.title());
    let width = title.chars().count();

    pretty_rule(w, width)?;
    writeln!(w, "{title}")?;
    pretty_rule(w, width)?;
    writeln!(w)?;

    let state = if item.resolution.is_empty() {
        item.state.clone()
    } else {
        format!("{} / {}", item.state, item.resolution)
    };
    pretty_kv(w, "State", state)?;
    pretty_kv(w, "Planned For", &item.planned_for)?;
    pretty_kv(w, "Filed Against", &item.filed_against)?;
    pretty_kv(w, "Created By", &item.created_by)?;
    pretty_kv(w, "Owner", &item.owned_by)?;
    if !item.estimate.is_empty() {
        pretty_kv(w, "Estimate", &item.estimate)?;
    }
    if !item.time_spent.is_empty() {
        pretty_kv(w, "Time spent", &item.time_spent)?;
    }

    if with_description {
        writeln!(w)?;
        pretty_rule(w, width)?;
        writeln!(w, "\nDescription:\n\n{}", item.description)?;
    }

    if !item.parents.is_empty() || !item.children.is_empty() {
        writeln!(w)?;
        pretty_rule(w, width)?;
        writeln!(w)?;
        write_tree(w, item)?;
    }
    Ok(())
}

/// Execute `rtc show <id>`.
///
/// # Errors
///
/// Login, read and rendering failures.
pub fn run_show(args: &ShowArgs, ctx: &Context) -> anyhow::Result<()> {
    let mut client = ctx.connect()?;
    let mut item = client.get_work_item(&args.id)?;
    if args.summary {
        item.description.clear();
    } else {
        item.description = html_to_text(&item.description);
    }

    render(ctx.output, &item, |item, w| {
        write_card(w, item, !args.summary)
    })
}

/// Execute `rtc tree <id>`.
///
/// # Errors
///
/// Login, read and rendering failures.
pub fn run_tree(args: &TreeArgs, ctx: &Context) -> anyhow::Result<()> {
    let mut client = ctx.connect()?;
    let item = client.get_work_item(&args.id)?;

    let links = serde_json::json!({
        "id": item.id,
        "title": item.title(),
        "parents": item.parents,
        "children": item.children,
    });
    render(ctx.output, &links, |_, w| {
        writeln!(w, "{}\n", item.title())?;
        write_tree(w, &item)
    })
}
