//! `rtc completions`: shell completion scripts for the whole command tree.

use anyhow::{Result, anyhow};
use clap::{Args, Command};
use clap_complete::{Shell, generate};
use std::io::{self, Write};

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell; detected from `$SHELL` when omitted.
    #[arg(value_enum)]
    pub shell: Option<Shell>,
}

impl CompletionsArgs {
    fn shell(&self) -> Result<Shell> {
        self.shell.or_else(Shell::from_env).ok_or_else(|| {
            anyhow!("cannot detect the shell from $SHELL; name it, e.g. `rtc completions zsh`")
        })
    }
}

/// Write the completion script for `command` to `out`, under the binary name
/// the command tree declares.
fn write_completions(shell: Shell, command: &mut Command, out: &mut dyn Write) {
    let name = command
        .get_bin_name()
        .unwrap_or_else(|| command.get_name())
        .to_string();
    generate(shell, command, name, out);
}

/// Execute `rtc completions [shell]`.
///
/// # Errors
///
/// No shell given and none detectable from the environment.
pub fn run_completions(args: &CompletionsArgs, command: &mut Command) -> Result<()> {
    let shell = args.shell()?;
    write_completions(shell, command, &mut io::stdout().lock());
    Ok(())
}
