use crate::context::Context;
use crate::output::{OutputMode, Renderable, render, render_list, resolve_output_mode};
use anyhow::{Result, bail};
use clap::{Args, Subcommand};
use rtc_core::config::{Config, PASSWORD_ENV, save_config};
use rtc_core::model::Owner;
use std::io::{self, Write};
use std::path::Path;

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a new config file
    Init(InitArgs),
    /// Print the config file location
    Path,
    /// List owners, to pick a value for credentials.owner_id
    Owners,
}

#[derive(Args, Debug)]
struct InitArgs {
    /// Jazz user name
    #[arg(long)]
    user: String,

    /// Owner id scoping `list` and `query --mine` (see `rtc config owners`)
    #[arg(long, default_value = "")]
    owner: String,

    /// Server base URL, e.g. https://jazz.example.com/jazz
    #[arg(long)]
    base_url: Option<String>,

    /// Project area item id
    #[arg(long)]
    project_area: Option<String>,

    /// Store a password in the file (RTC_PASSWORD is preferred)
    #[arg(long)]
    password: Option<String>,

    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

impl InitArgs {
    fn to_config(&self) -> Config {
        let mut config = Config::default();
        config.credentials.username.clone_from(&self.user);
        config.credentials.owner_id.clone_from(&self.owner);
        config.credentials.password.clone_from(&self.password);
        if let Some(base_url) = &self.base_url {
            config.server.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(project_area) = &self.project_area {
            config.server.project_area_id.clone_from(project_area);
        }
        config
    }
}

struct OwnerRow<'a>(&'a Owner);

impl Renderable for OwnerRow<'_> {
    fn cells(&self) -> Vec<String> {
        vec![self.0.id.clone(), self.0.name.clone()]
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(&mut *w, self.0)?;
        writeln!(w)
    }

    fn table_headers() -> &'static [&'static str] {
        &["Owner Id", "Name"]
    }
}

/// Execute `rtc config <command>`.
///
/// `init` and `path` work without an existing config file.
///
/// # Errors
///
/// I/O failures writing the file, an existing file without `--force`, or
/// login and lookup failures for `owners`.
pub fn run_config(args: &ConfigArgs, path: &Path, json: bool, verbose: bool) -> Result<()> {
    match &args.command {
        ConfigCommand::Init(init) => run_init(init, path, resolve_output_mode(json, None)),
        ConfigCommand::Path => {
            let output = resolve_output_mode(json, None);
            let location = serde_json::json!({ "path": path });
            render(output, &location, |_, w| writeln!(w, "{}", path.display()))
        }
        ConfigCommand::Owners => {
            let ctx = Context::load(path, json, verbose)?;
            let mut client = ctx.connect()?;
            let owners = client.owners()?;
            let rows: Vec<OwnerRow<'_>> = owners.iter().map(OwnerRow).collect();
            render_list(&rows, ctx.output, ctx.max_width())?;
            Ok(())
        }
    }
}

fn run_init(args: &InitArgs, path: &Path, output: OutputMode) -> Result<()> {
    if path.exists() && !args.force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }

    let config = args.to_config();
    save_config(path, &config)?;

    let written = serde_json::json!({
        "path": path,
        "username": config.credentials.username,
        "base_url": config.server.base_url,
    });
    render(output, &written, |_, w| {
        writeln!(w, "Wrote {}", path.display())?;
        if config.credentials.password.is_none() {
            writeln!(w, "Set {PASSWORD_ENV} or add credentials.password to log in.")?;
        }
        if config.credentials.owner_id.is_empty() {
            writeln!(w, "Run `rtc config owners` to find your owner id.")?;
        }
        Ok(())
    })
}
