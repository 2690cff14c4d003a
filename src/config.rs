//! Startup configuration.
//!
//! Settings come from a TOML file, the password may also come from the
//! environment. Everything is validated before the workflow starts so that a
//! bad setting never surfaces halfway through a run.
use crate::actions::MAX_ACTION_WORKERS;
use crate::endpoint::{Credentials, LoginMode, MembershipStatus};
use crate::error::ConfigError;
use crate::workflow::WorkflowSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable consulted when the config file carries no password.
pub const PASSWORD_ENV: &str = "GROUPADM_PASSWORD";

const DEFAULT_MAX_FOLDER_DEPTH: u32 = 5;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

fn default_max_folder_depth() -> u32 {
    DEFAULT_MAX_FOLDER_DEPTH
}

fn default_course_status() -> Vec<MembershipStatus> {
    vec![MembershipStatus::Admin]
}

fn default_action_workers() -> usize {
    1
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Contents of `config.toml`. Only the connection settings are required.
#[derive(Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default)]
    pub login_mode: LoginMode,
    #[serde(default = "default_max_folder_depth")]
    pub max_folder_depth: u32,
    #[serde(default = "default_course_status")]
    pub course_status: Vec<MembershipStatus>,
    #[serde(default = "default_action_workers")]
    pub action_workers: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_dir: Option<PathBuf>,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("endpoint", &self.endpoint)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("login_mode", &self.login_mode)
            .field("max_folder_depth", &self.max_folder_depth)
            .field("course_status", &self.course_status)
            .field("action_workers", &self.action_workers)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("report_dir", &self.report_dir)
            .finish()
    }
}

/// `<config dir>/groupadm/config.toml`, when the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("groupadm").join("config.toml"))
}

pub fn parse_config(text: &str) -> Result<AppConfig> {
    toml::from_str(text).context("parse config TOML")
}

pub fn load_config(path: &Path) -> Result<AppConfig> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read config {}", path.display()))?;
    parse_config(&text).with_context(|| format!("load config {}", path.display()))
}

fn require(value: &str, key: &'static str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Missing(key));
    }
    Ok(())
}

impl AppConfig {
    /// Fill the password from `PASSWORD_ENV` when the file has none.
    pub fn with_env_password(mut self) -> Self {
        if matches!(self.password.as_deref(), None | Some("")) {
            if let Ok(password) = std::env::var(PASSWORD_ENV) {
                self.password = Some(password);
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        require(&self.endpoint, "endpoint")?;
        let endpoint = self.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                key: "endpoint",
                reason: format!("`{endpoint}` is not an http(s) URL"),
            });
        }
        require(&self.client_id, "client_id")?;
        require(&self.username, "username")?;
        require(self.password.as_deref().unwrap_or_default(), "password")?;
        if self.login_mode == LoginMode::Cas {
            return Err(ConfigError::UnsupportedLoginMode(
                self.login_mode.as_str().to_string(),
            ));
        }
        if self.course_status.is_empty() {
            return Err(ConfigError::Invalid {
                key: "course_status",
                reason: "at least one membership status is required".to_string(),
            });
        }
        if self.action_workers == 0 || self.action_workers > MAX_ACTION_WORKERS {
            return Err(ConfigError::Invalid {
                key: "action_workers",
                reason: format!("must be between 1 and {MAX_ACTION_WORKERS}"),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "request_timeout_secs",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            client_id: self.client_id.trim().to_string(),
            username: self.username.trim().to_string(),
            password: self.password.clone().unwrap_or_default(),
            mode: self.login_mode,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            max_folder_depth: self.max_folder_depth,
            course_status: self.course_status.clone(),
            action_workers: self.action_workers,
            report_dir: self.report_dir.clone(),
        }
    }

    /// TOML rendering with the password masked, for `groupadm check`.
    pub fn redacted_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        if shown.password.is_some() {
            shown.password = Some("<redacted>".to_string());
        }
        toml::to_string_pretty(&shown).context("render config TOML")
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
