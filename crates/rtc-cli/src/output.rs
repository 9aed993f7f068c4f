//! Shared output layer for pretty/text/JSON parity across all CLI commands.
//!
//! Every command handler receives an [`OutputMode`] and formats its output
//! accordingly: aligned tables for humans, tab-separated rows for pipes, or
//! stable JSON.
//!
//! # Output mode resolution
//!
//! Precedence (highest wins):
//! 1. `--json` flag
//! 2. `FORMAT` env var → `"pretty"` | `"text"` | `"json"`
//! 3. `display.output` from the config file
//! 4. Default: [`OutputMode::Pretty`] if stdout is a TTY; [`OutputMode::Text`] if piped.

use rtc_core::RtcError;
use serde::Serialize;
use std::io::{self, IsTerminal, Write};

/// Write a horizontal separator of `width` dashes.
pub fn pretty_rule(w: &mut dyn Write, width: usize) -> io::Result<()> {
    writeln!(w, "{:-<width$}", "")
}

/// Render a right-aligned key/value line, as in a work item card.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(w, "{:>14} {}", format!("{key}:"), value.as_ref())
}

/// The three output modes supported by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-optimized output (tables, cards, rules).
    Pretty,
    /// Tab-separated rows for scripts and pipes.
    Text,
    /// Machine-readable JSON.
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }

    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "text" => Some(Self::Text),
            "pretty" => Some(Self::Pretty),
            _ => None,
        }
    }
}

/// Core resolution logic, separated from I/O for testability.
fn resolve_output_mode_inner(
    json_flag: bool,
    format_env: Option<&str>,
    configured: Option<&str>,
    is_tty: bool,
) -> OutputMode {
    if json_flag {
        return OutputMode::Json;
    }

    // Unknown values fall through to the next source.
    if let Some(mode) = format_env.and_then(OutputMode::parse) {
        return mode;
    }
    if let Some(mode) = configured.and_then(OutputMode::parse) {
        return mode;
    }

    if is_tty {
        OutputMode::Pretty
    } else {
        OutputMode::Text
    }
}

/// Resolve the output mode from the flag, environment, config and TTY.
pub fn resolve_output_mode(json_flag: bool, configured: Option<&str>) -> OutputMode {
    let env_val = std::env::var("FORMAT").ok();
    let is_tty = io::stdout().is_terminal();
    resolve_output_mode_inner(json_flag, env_val.as_deref(), configured, is_tty)
}

/// Cut `value` to at most `width` characters, marking the cut with `...`.
pub fn truncate(value: &str, width: usize) -> String {
    if value.chars().count() <= width {
        return value.to_string();
    }
    if width <= 3 {
        return value.chars().take(width).collect();
    }
    let kept: String = value.chars().take(width - 3).collect();
    format!("{kept}...")
}

/// Trait implemented by any CLI result type that can be rendered in all modes.
///
/// List rows provide their [`cells`](Renderable::cells) in the order of
/// [`table_headers`](Renderable::table_headers); pretty mode aligns them into
/// a table, text mode joins them with tabs.
pub trait Renderable {
    /// Column values for one row.
    fn cells(&self) -> Vec<String>;

    /// Render as a JSON value.
    fn render_json(&self, w: &mut dyn Write) -> io::Result<()>;

    /// Render as a single tab-separated row.
    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}", self.cells().join("\t"))
    }

    /// Column headers, in the same order as [`cells`](Renderable::cells).
    fn table_headers() -> &'static [&'static str]
    where
        Self: Sized,
    {
        &[]
    }
}

/// Render a list of [`Renderable`] rows to stdout.
///
/// - In JSON mode, wraps items in a JSON array.
/// - In pretty mode, aligns rows under a header; cells wider than
///   `max_width` are truncated.
/// - In text mode, writes a header line and one tab-separated row per item.
pub fn render_list<R: Renderable>(items: &[R], mode: OutputMode, max_width: usize) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_list(&mut out, items, mode, max_width)
}

fn write_list<R: Renderable>(
    out: &mut dyn Write,
    items: &[R],
    mode: OutputMode,
    max_width: usize,
) -> io::Result<()> {
    match mode {
        OutputMode::Pretty => {
            let rows: Vec<Vec<String>> = items.iter().map(Renderable::cells).collect();
            write_table(out, R::table_headers(), &rows, max_width)
        }
        OutputMode::Text => {
            if !items.is_empty() && !R::table_headers().is_empty() {
                writeln!(out, "{}", R::table_headers().join("\t"))?;
            }
            for item in items {
                item.render_table(out)?;
            }
            Ok(())
        }
        OutputMode::Json => {
            write!(out, "[")?;
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    write!(out, ",")?;
                }
                writeln!(out)?;
                let mut buf = Vec::new();
                item.render_json(&mut buf)?;
                if buf.last() == Some(&b'\n') {
                    buf.pop();
                }
                out.write_all(&buf)?;
            }
            writeln!(out, "\n]")
        }
    }
}

/// Left-aligned table; each column is as wide as its widest cell, capped at
/// `max_width`.
fn write_table(
    out: &mut dyn Write,
    headers: &[&str],
    rows: &[Vec<String>],
    max_width: usize,
) -> io::Result<()> {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            let len = cell.chars().count().min(max_width);
            match widths.get_mut(i) {
                Some(width) => *width = (*width).max(len),
                None => widths.push(len),
            }
        }
    }

    let line = |out: &mut dyn Write, cells: &[String]| -> io::Result<()> {
        let padded: Vec<String> = cells
            .iter()
            .zip(&widths)
            .map(|(cell, &width)| format!("{:<width$}", truncate(cell, width)))
            .collect();
        writeln!(out, "{}", padded.join("  ").trim_end())
    };

    if !headers.is_empty() {
        let header: Vec<String> = headers.iter().map(|h| h.to_uppercase()).collect();
        line(out, &header)?;
        let total = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        pretty_rule(out, total)?;
    }
    for row in rows {
        line(out, row)?;
    }
    Ok(())
}

/// Render a serializable value; pretty and text share `human_fn`.
pub fn render<T: Serialize>(
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut out, value)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => human_fn(value, &mut out)?,
    }
    Ok(())
}

/// Progress note on stderr, suppressed in JSON mode.
pub fn progress(mode: OutputMode, message: impl AsRef<str>) {
    if !mode.is_json() {
        eprintln!("{}", message.as_ref());
    }
}

/// A structured error with optional suggestion and error code.
#[derive(Debug, Serialize)]
pub struct CliError {
    /// Human-readable error message.
    pub message: String,
    /// Optional suggestion for how to fix the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
    /// Machine-readable error code (e.g. `E4001`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CliError {
    /// Create a simple error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            error_code: None,
        }
    }
}

impl From<&RtcError> for CliError {
    fn from(err: &RtcError) -> Self {
        Self {
            message: err.to_string(),
            suggestion: err.hint().map(str::to_string),
            error_code: Some(err.code().code().to_string()),
        }
    }
}

/// Context messages are kept down to the first [`RtcError`], which supplies
/// the code and hint. Its own message already names its causes.
impl From<&anyhow::Error> for CliError {
    fn from(err: &anyhow::Error) -> Self {
        let mut parts = Vec::new();
        let mut rtc = None;
        for cause in err.chain() {
            parts.push(cause.to_string());
            if let Some(found) = cause.downcast_ref::<RtcError>() {
                rtc = Some(found);
                break;
            }
        }

        let mut cli = rtc.map_or_else(|| Self::new(""), Self::from);
        cli.message = parts.join(": ");
        cli
    }
}

/// Render an error to stderr in the requested format.
pub fn render_error(mode: OutputMode, error: &CliError) -> anyhow::Result<()> {
    let stderr = io::stderr();
    let mut out = stderr.lock();
    match mode {
        OutputMode::Json => {
            let wrapper = serde_json::json!({
                "error": error,
            });
            serde_json::to_writer_pretty(&mut out, &wrapper)?;
            writeln!(out)?;
        }
        OutputMode::Pretty | OutputMode::Text => {
            match &error.error_code {
                Some(code) => writeln!(out, "error[{code}]: {}", error.message)?,
                None => writeln!(out, "error: {}", error.message)?,
            }
            if let Some(ref suggestion) = error.suggestion {
                writeln!(out, "  suggestion: {suggestion}")?;
            }
        }
    }
    Ok(())
}
