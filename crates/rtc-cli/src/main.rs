#![forbid(unsafe_code)]

mod cmd;
mod context;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use context::Context;
use output::{CliError, render_error, resolve_output_mode};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "rtc",
    author,
    version,
    about = "rtc: work items on a Jazz / Rational Team Concert server",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging, including each HTTP exchange.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Config file to use instead of the default location.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Read",
        visible_alias = "l",
        about = "List your open work items",
        long_about = "List open and in-progress work items owned by credentials.owner_id.",
        after_help = "EXAMPLES:\n    # Everything assigned to you\n    rtc list\n\n    # Only defects\n    rtc list --type defect"
    )]
    List(cmd::list::ListArgs),

    #[command(
        next_help_heading = "Read",
        visible_alias = "f",
        about = "Full-text search for work items",
        after_help = "EXAMPLES:\n    rtc find \"login timeout\""
    )]
    Find(cmd::find::FindArgs),

    #[command(
        next_help_heading = "Read",
        visible_aliases = ["info", "s", "i"],
        about = "Show one work item",
        long_about = "Show state, planning, owner, description and links of a work item.",
        after_help = "EXAMPLES:\n    rtc show 1001\n\n    # Without the description\n    rtc info 1001 --summary"
    )]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Read",
        visible_alias = "t",
        about = "Show parents and children of a work item"
    )]
    Tree(cmd::show::TreeArgs),

    #[command(
        next_help_heading = "Read",
        visible_alias = "q",
        about = "Query work items by filters",
        after_help = "EXAMPLES:\n    # My open items in the current iteration\n    rtc query --mine --open --current\n\n    # Children of a story, oldest first\n    rtc query --parent 900 --asc"
    )]
    Query(cmd::query::QueryArgs),

    #[command(
        next_help_heading = "Planning",
        visible_alias = "rel",
        about = "List releases"
    )]
    Releases(cmd::planning::PlanningArgs),

    #[command(
        next_help_heading = "Planning",
        visible_alias = "iter",
        about = "List iterations",
        long_about = "List iterations in release order. The Id column is the index `move` and `update --iteration` accept."
    )]
    Iterations(cmd::planning::PlanningArgs),

    #[command(
        next_help_heading = "Write",
        visible_alias = "c",
        about = "Create a work item",
        after_help = "EXAMPLES:\n    rtc create \"Write release notes\"\n\n    # A defect under story 900\n    rtc create \"Crash on save\" --type defect --parent 900"
    )]
    Create(cmd::create::CreateArgs),

    #[command(
        next_help_heading = "Write",
        visible_alias = "st",
        about = "Create a subtask of a story",
        long_about = "Create a task titled \"<type>: <story summary>\" and link it under the story."
    )]
    Subtask(cmd::create::SubtaskArgs),

    #[command(
        next_help_heading = "Write",
        visible_alias = "u",
        about = "Update fields or drive workflow actions",
        after_help = "EXAMPLES:\n    rtc update 1001 --estimate 8h --timespent 2h\n\n    rtc update 1001 --start\n\n    rtc update 1001 --resolve --iteration 4"
    )]
    Update(cmd::update::UpdateArgs),

    #[command(next_help_heading = "Write", visible_alias = "cl", about = "Close a work item")]
    Close(cmd::update::CloseArgs),

    #[command(
        next_help_heading = "Write",
        visible_alias = "mv",
        about = "Plan work items for an iteration",
        after_help = "EXAMPLES:\n    # By index from `rtc iterations`\n    rtc move 1001,1002 4\n\n    # By iteration item id\n    rtc move 1001 _nrtnkGAiEd6QQ7s7cowCAg"
    )]
    Move(cmd::move_cmd::MoveArgs),

    #[command(
        next_help_heading = "Web",
        visible_alias = "o",
        about = "Open a work item in the browser"
    )]
    Open(cmd::open::OpenArgs),

    #[command(
        next_help_heading = "Developer",
        visible_alias = "req",
        about = "Send a raw authenticated request"
    )]
    Request(cmd::request::RequestArgs),

    #[command(
        next_help_heading = "Setup",
        visible_alias = "cf",
        about = "Create, locate or complete the config file",
        after_help = "EXAMPLES:\n    rtc config init --user fcoury\n\n    rtc config owners\n\n    rtc config path"
    )]
    Config(cmd::config::ConfigArgs),

    #[command(
        next_help_heading = "Setup",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    rtc completions bash\n\n    rtc completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("RTC_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "rtc=debug,info"
        } else {
            "rtc=info,warn"
        })
    });

    let format = env::var("RTC_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args, &mut command);
    }

    let path = context::config_path(cli.config.as_deref())?;
    debug!(path = %path.display(), "config location");

    if let Commands::Config(args) = &cli.command {
        return cmd::config::run_config(args, &path, cli.json, cli.verbose);
    }

    let ctx = Context::load(&path, cli.json, cli.verbose)?;
    match &cli.command {
        Commands::List(args) => cmd::list::run_list(args, &ctx),
        Commands::Find(args) => cmd::find::run_find(args, &ctx),
        Commands::Show(args) => cmd::show::run_show(args, &ctx),
        Commands::Tree(args) => cmd::show::run_tree(args, &ctx),
        Commands::Query(args) => cmd::query::run_query(args, &ctx),
        Commands::Releases(args) => cmd::planning::run_releases(args, &ctx),
        Commands::Iterations(args) => cmd::planning::run_iterations(args, &ctx),
        Commands::Create(args) => cmd::create::run_create(args, &ctx),
        Commands::Subtask(args) => cmd::create::run_subtask(args, &ctx),
        Commands::Update(args) => cmd::update::run_update(args, &ctx),
        Commands::Close(args) => cmd::update::run_close(args, &ctx),
        Commands::Move(args) => cmd::move_cmd::run_move(args, &ctx),
        Commands::Open(args) => cmd::open::run_open(args, &ctx),
        Commands::Request(args) => cmd::request::run_request(args, &ctx),
        Commands::Config(_) | Commands::Completions(_) => Ok(()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let json = cli.json;
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let output = resolve_output_mode(json, None);
            if render_error(output, &CliError::from(&err)).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_parses_before_and_after_subcommand() {
        assert!(Cli::parse_from(["rtc", "--json", "list"]).json);
        assert!(Cli::parse_from(["rtc", "list", "--json"]).json);
        assert!(!Cli::parse_from(["rtc", "list"]).json);
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["rtc", "show", "1001", "--config", "/tmp/rtc.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/rtc.toml")));
    }

    #[test]
    fn info_is_an_alias_for_show() {
        let cli = Cli::parse_from(["rtc", "info", "1001", "--summary"]);
        assert!(matches!(
            cli.command,
            Commands::Show(cmd::show::ShowArgs { ref id, summary: true }) if id == "1001"
        ));
    }

    #[test]
    fn create_defaults_to_task() {
        let cli = Cli::parse_from(["rtc", "create", "Write docs"]);
        match cli.command {
            Commands::Create(args) => {
                assert_eq!(args.kind, "task");
                assert!(args.parent.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn subtask_defaults_to_artifacts() {
        let cli = Cli::parse_from(["rtc", "subtask", "900"]);
        match cli.command {
            Commands::Subtask(args) => assert_eq!(args.kind, "Artifacts"),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn move_parses_numeric_iteration_as_index() {
        use rtc_core::model::IterationSelector;

        let cli = Cli::parse_from(["rtc", "move", "1001,1002", "4"]);
        match cli.command {
            Commands::Move(args) => {
                assert_eq!(args.ids, "1001,1002");
                assert_eq!(args.iteration, IterationSelector::Index(4));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::parse_from(["rtc", "move", "1001", "_it4"]);
        match cli.command {
            Commands::Move(args) => {
                assert_eq!(args.iteration, IterationSelector::ItemId("_it4".into()));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn request_method_is_case_insensitive() {
        for method in ["GET", "get", "POST", "post"] {
            let parsed = Cli::try_parse_from(["rtc", "request", "/x", "--method", method]);
            assert!(parsed.is_ok(), "{method}: {:?}", parsed.err());
        }
    }

    #[test]
    fn all_subcommands_parse() {
        let subcommands = [
            vec!["rtc", "list", "--type", "defect"],
            vec!["rtc", "find", "crash"],
            vec!["rtc", "show", "1"],
            vec!["rtc", "tree", "1"],
            vec!["rtc", "query", "--mine", "--open", "--maxresults", "5"],
            vec!["rtc", "releases", "--all"],
            vec!["rtc", "iterations"],
            vec!["rtc", "create", "x", "--type", "defect", "--parent", "9"],
            vec!["rtc", "subtask", "9", "--type", "Tests"],
            vec!["rtc", "update", "1", "--estimate", "8h", "--resolve"],
            vec!["rtc", "close", "1"],
            vec!["rtc", "move", "1,2", "3"],
            vec!["rtc", "open", "1"],
            vec!["rtc", "request", "https://x/y"],
            vec!["rtc", "config", "init", "--user", "u"],
            vec!["rtc", "config", "path"],
            vec!["rtc", "config", "owners"],
            vec!["rtc", "completions", "bash"],
        ];
        for args in &subcommands {
            let result = Cli::try_parse_from(args.iter());
            assert!(result.is_ok(), "failed to parse {args:?}: {:?}", result.err());
        }
    }

    #[test]
    fn clap_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
