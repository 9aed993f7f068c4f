use crate::error::RtcError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured password.
pub const PASSWORD_ENV: &str = "RTC_PASSWORD";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Where the Jazz server lives and the project-specific ids it needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_project_area_id")]
    pub project_area_id: String,
    /// Process area whose releases/iterations are listed.
    #[serde(default = "default_process_area_uuid")]
    pub process_area_uuid: String,
    /// Work item used as the context for lookup-table requests.
    #[serde(default = "default_all_values_item_id")]
    pub all_values_item_id: String,
    #[serde(default = "default_workflow_action_prefix")]
    pub workflow_action_prefix: String,
    #[serde(default = "default_link_type_parent")]
    pub link_type_parent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            project_area_id: default_project_area_id(),
            process_area_uuid: default_process_area_uuid(),
            all_values_item_id: default_all_values_item_id(),
            workflow_action_prefix: default_workflow_action_prefix(),
            link_type_parent: default_link_type_parent(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Owner whose items `list` and `query --mine` are scoped to.
    #[serde(default)]
    pub owner_id: String,
}

impl Credentials {
    /// Password with the environment override applied.
    #[must_use]
    pub fn resolved_password(&self) -> Option<String> {
        resolve_password(self.password.clone(), std::env::var(PASSWORD_ENV).ok())
    }
}

fn resolve_password(configured: Option<String>, env_value: Option<String>) -> Option<String> {
    env_value
        .filter(|p| !p.is_empty())
        .or_else(|| configured.filter(|p| !p.is_empty()))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_max_width")]
    pub max_width: usize,
    #[serde(default)]
    pub output: Option<String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
            output: None,
        }
    }
}

/// Default location: `<config dir>/rtc/config.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("rtc").join("config.toml"))
}

/// Load and parse the config file at `path`.
///
/// # Errors
///
/// Returns [`RtcError::Config`] when the file is missing, unreadable or
/// not valid TOML for [`Config`].
pub fn load_config(path: &Path) -> Result<Config, RtcError> {
    if !path.exists() {
        return Err(RtcError::Config {
            message: format!("{} does not exist", path.display()),
            missing: true,
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| RtcError::Config {
        message: format!("failed to read {}: {e}", path.display()),
        missing: false,
    })?;

    toml::from_str::<Config>(&content).map_err(|e| RtcError::Config {
        message: format!("failed to parse {}: {e}", path.display()),
        missing: false,
    })
}

/// Write `config` to `path`, creating parent directories.
///
/// # Errors
///
/// Returns [`RtcError::Config`] on serialization or I/O failure.
pub fn save_config(path: &Path, config: &Config) -> Result<(), RtcError> {
    let io_err = |e: std::io::Error| RtcError::Config {
        message: format!("failed to write {}: {e}", path.display()),
        missing: false,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }

    let content = toml::to_string_pretty(config).map_err(|e| RtcError::Config {
        message: format!("failed to serialize config: {e}"),
        missing: false,
    })?;

    std::fs::write(path, content).map_err(io_err)
}

fn default_base_url() -> String {
    "https://igartc01.swg.usma.ibm.com/jazz".to_string()
}

fn default_project_area_id() -> String {
    "_U7zMYFRcEd61fuNW84kdiQ".to_string()
}

fn default_process_area_uuid() -> String {
    "_nrtnkGAiEd6QQ7s7cowCAg".to_string()
}

fn default_all_values_item_id() -> String {
    "_IDpPV6fhEeSicYpAbHXWsw".to_string()
}

fn default_workflow_action_prefix() -> String {
    "bugzillaWorkflow.action".to_string()
}

fn default_link_type_parent() -> String {
    "com.ibm.team.workitem.linktype.parentworkitem".to_string()
}

const fn default_max_width() -> usize {
    80
}
