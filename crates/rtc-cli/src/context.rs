//! Per-invocation state: where the config lives, what it says, and how to
//! print.

use crate::output::{OutputMode, resolve_output_mode};
use anyhow::{Context as _, Result, anyhow};
use rtc_core::Client;
use rtc_core::config::{Config, default_config_path, load_config};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Config file location: the `--config` override, else the user default.
///
/// # Errors
///
/// Fails when no override is given and the platform has no config dir.
pub fn config_path(flag: Option<&Path>) -> Result<PathBuf> {
    flag.map(Path::to_path_buf)
        .or_else(default_config_path)
        .ok_or_else(|| anyhow!("cannot determine a config directory; pass --config <path>"))
}

pub struct Context {
    pub config: Config,
    pub output: OutputMode,
    pub verbose: bool,
}

impl Context {
    /// Load the config at `path` and settle the output mode.
    ///
    /// # Errors
    ///
    /// Missing or malformed config files.
    pub fn load(path: &Path, json: bool, verbose: bool) -> Result<Self> {
        let config = load_config(path)?;
        debug!(path = %path.display(), base_url = %config.server.base_url, "loaded config");
        let output = resolve_output_mode(json, config.display.output.as_deref());
        Ok(Self {
            config,
            output,
            verbose,
        })
    }

    pub const fn max_width(&self) -> usize {
        self.config.display.max_width
    }

    /// A logged-in client for the configured server.
    ///
    /// # Errors
    ///
    /// Login failures from the core.
    pub fn connect(&self) -> Result<Client> {
        let mut client = Client::from_config(&self.config);
        client.set_verbose(self.verbose);
        client
            .login()
            .with_context(|| format!("logging in to {}", self.config.server.base_url))?;
        Ok(client)
    }
}
