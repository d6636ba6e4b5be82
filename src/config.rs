//! Static startup configuration
//!
//! Loaded once from TOML and shared read-only by every run. All fields have
//! defaults, so an absent file is equivalent to an empty one.

use crate::error::{Error, Result};
use crate::types::{MergeMethod, Reaction};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory name under the user config dir
const CONFIG_DIR: &str = "mergebot";

/// Filename for the config file
const CONFIG_FILE: &str = "config.toml";

/// Upper bound for both the poll interval and the check timeout (one day)
pub const MAX_WAIT_SECS: u64 = 24 * 60 * 60;

/// Bot configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MergeBotConfig {
    /// Name the bot is mentioned by (`@merge-bot merge`)
    pub bot_name: String,
    /// Whether a bare `merge` word counts as a command
    pub accept_bare_merge: bool,
    /// Seconds between check polls
    pub poll_interval_secs: u64,
    /// Seconds to wait for required checks before giving up
    pub timeout_secs: u64,
    /// Merge method
    pub merge_method: MergeMethod,
    /// Delete the head branch after merging
    pub delete_branch: bool,
    /// Reaction posted on the triggering comment when a command is recognized
    pub ack_reaction: Reaction,
    /// Checks treated as required in addition to branch protection
    pub extra_required_checks: Vec<String>,
    /// Ignore a command while another run for the same PR is in flight
    pub ignore_duplicate_commands: bool,
    /// GitHub Enterprise host (None for github.com)
    pub host: Option<String>,
}

impl Default for MergeBotConfig {
    fn default() -> Self {
        Self {
            bot_name: "merge-bot".to_string(),
            accept_bare_merge: true,
            poll_interval_secs: 30,
            timeout_secs: 600,
            merge_method: MergeMethod::Squash,
            delete_branch: true,
            ack_reaction: Reaction::Eyes,
            extra_required_checks: Vec::new(),
            ignore_duplicate_commands: true,
            host: None,
        }
    }
}

impl MergeBotConfig {
    /// Interval between check polls
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Deadline for required checks, measured from when the gates pass
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Reject values no run could work with
    pub fn validate(&self) -> Result<()> {
        if self.bot_name.trim().trim_start_matches('@').is_empty() {
            return Err(Error::Config("bot_name must not be empty".to_string()));
        }
        if self.poll_interval_secs == 0 {
            return Err(Error::Config(
                "poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        for (field, value) in [
            ("poll_interval_secs", self.poll_interval_secs),
            ("timeout_secs", self.timeout_secs),
        ] {
            if value > MAX_WAIT_SECS {
                return Err(Error::Config(format!(
                    "{field} must be at most {MAX_WAIT_SECS} (got {value})"
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}

/// Default config file location (`~/.config/mergebot/config.toml` on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Load configuration.
///
/// An explicit `path` must exist. Without one, the default location is used
/// if present and built-in defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<MergeBotConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) if p.exists() => p,
            _ => return Ok(MergeBotConfig::default()),
        },
    };

    let content = fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

    MergeBotConfig::from_toml(&content)
        .map_err(|e| Error::Config(format!("{}: {e}", path.display())))
}
