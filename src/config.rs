use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ReleaseError, Result};
use crate::version_file::is_forbidden_char;

/// File name looked up at the root of the repository work tree.
pub const LOCAL_CONFIG_FILE: &str = "gitrelease.toml";

/// File name looked up in the user config directory.
pub const USER_CONFIG_FILE: &str = ".gitrelease.toml";

/// Placeholder substituted with the version in every template.
pub const VERSION_PLACEHOLDER: &str = "{version}";

/// Represents the complete configuration for git-release.
///
/// Describes where the version lives, where releases are pushed, and how
/// tags and commit messages are named.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Version declaration file, relative to the repository work tree
    #[serde(default = "default_version_file")]
    pub version_file: PathBuf,

    #[serde(default = "default_remote")]
    pub remote: String,

    /// Remote branch that receives the release commits
    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_snapshot_suffix")]
    pub snapshot_suffix: String,

    #[serde(default)]
    pub templates: TemplatesConfig,
}

fn default_version_file() -> PathBuf {
    PathBuf::from("version.sbt")
}

fn default_remote() -> String {
    "origin".to_string()
}

fn default_branch() -> String {
    "master".to_string()
}

fn default_snapshot_suffix() -> String {
    "-SNAPSHOT".to_string()
}

fn default_template() -> String {
    "v{version}".to_string()
}

/// Naming templates for tags and commit messages.
///
/// Each template must contain the `{version}` placeholder exactly once.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TemplatesConfig {
    #[serde(default = "default_template")]
    pub tag: String,

    #[serde(default = "default_template")]
    pub release_commit: String,

    #[serde(default = "default_template")]
    pub snapshot_commit: String,
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        TemplatesConfig {
            tag: default_template(),
            release_commit: default_template(),
            snapshot_commit: default_template(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            version_file: default_version_file(),
            remote: default_remote(),
            branch: default_branch(),
            snapshot_suffix: default_snapshot_suffix(),
            templates: TemplatesConfig::default(),
        }
    }
}

impl Config {
    /// Checks the invariants serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.version_file.as_os_str().is_empty() {
            return Err(ReleaseError::config("version_file must not be empty"));
        }
        if self.version_file.is_absolute() {
            return Err(ReleaseError::config(format!(
                "version_file must be relative to the repository root, got '{}'",
                self.version_file.display()
            )));
        }
        if self.remote.trim().is_empty() {
            return Err(ReleaseError::config("remote must not be empty"));
        }
        if self.branch.trim().is_empty() {
            return Err(ReleaseError::config("branch must not be empty"));
        }
        if let Some(c) = self.snapshot_suffix.chars().find(|c| is_forbidden_char(*c)) {
            return Err(ReleaseError::config(format!(
                "snapshot_suffix contains forbidden character {:?}",
                c
            )));
        }

        for (name, template) in [
            ("templates.tag", &self.templates.tag),
            ("templates.release_commit", &self.templates.release_commit),
            ("templates.snapshot_commit", &self.templates.snapshot_commit),
        ] {
            if template.matches(VERSION_PLACEHOLDER).count() != 1 {
                return Err(ReleaseError::config(format!(
                    "{} must contain {} exactly once, got '{}'",
                    name, VERSION_PLACEHOLDER, template
                )));
            }
        }

        Ok(())
    }

    /// Tag name for a release version (e.g. "1.0.0" -> "v1.0.0")
    pub fn tag_name(&self, version: &str) -> String {
        render(&self.templates.tag, version)
    }

    pub fn release_commit_message(&self, version: &str) -> String {
        render(&self.templates.release_commit, version)
    }

    /// Commit message for the snapshot commit; `snapshot_version` already carries the suffix
    pub fn snapshot_commit_message(&self, snapshot_version: &str) -> String {
        render(&self.templates.snapshot_commit, snapshot_version)
    }

    /// Appends the configured snapshot suffix (e.g. "1.1.0" -> "1.1.0-SNAPSHOT")
    pub fn snapshot_version(&self, new_version: &str) -> String {
        format!("{}{}", new_version, self.snapshot_suffix)
    }
}

fn render(template: &str, version: &str) -> String {
    template.replace(VERSION_PLACEHOLDER, version)
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `gitrelease.toml` at the root of `workdir`
/// 3. `.gitrelease.toml` in user config directory
/// 4. Default configuration if no file found
///
/// The loaded configuration is validated before it is returned.
pub fn load_config(config_path: Option<&Path>, workdir: &Path) -> Result<Config> {
    let local = workdir.join(LOCAL_CONFIG_FILE);
    let source = if let Some(path) = config_path {
        Some(path.to_path_buf())
    } else if local.exists() {
        Some(local)
    } else {
        dirs::config_dir()
            .map(|dir| dir.join(USER_CONFIG_FILE))
            .filter(|path| path.exists())
    };

    let config = match source {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading configuration");
            let contents = fs::read_to_string(&path).map_err(|e| {
                ReleaseError::config(format!("cannot read '{}': {}", path.display(), e))
            })?;
            parse_config(&contents)?
        }
        None => {
            tracing::debug!("no configuration file found, using defaults");
            Config::default()
        }
    };

    config.validate()?;
    Ok(config)
}

/// Parses configuration from TOML text without validating it.
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| ReleaseError::config(e.to_string()))
}
