//! Deployment configuration for skiff
//!
//! One config file per project, `skiff-deploy.json`, persisted in the working
//! directory as pretty-printed JSON. The password is stored in clear text,
//! which is why the store appends the filename to `.gitignore` when one is
//! present.

use std::fs;
use std::path::PathBuf;

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize};

use crate::error::{DeployError, DeployResult};

/// Well-known config filename, fixed per working directory.
pub const CONFIG_FILE: &str = "skiff-deploy.json";

/// Version-control ignore file the config filename is appended to.
pub const IGNORE_FILE: &str = ".gitignore";

/// Shell hook configuration value.
///
/// Deserialization is tolerant: a hook value that is not a list of strings
/// degrades to `Invalid` instead of failing the whole config load. The hook
/// runner reports and skips `Invalid`; the deployment continues.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Hooks {
    /// Key absent (or explicit null)
    #[default]
    Unset,
    /// Ordered list of shell commands
    Commands(Vec<String>),
    /// Present but malformed; never persisted back
    Invalid,
}

impl Hooks {
    pub fn is_unset(&self) -> bool {
        !matches!(self, Hooks::Commands(_))
    }
}

impl Serialize for Hooks {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Hooks::Commands(commands) => {
                let mut seq = serializer.serialize_seq(Some(commands.len()))?;
                for command in commands {
                    seq.serialize_element(command)?;
                }
                seq.end()
            }
            Hooks::Unset | Hooks::Invalid => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Hooks {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(match value {
            serde_json::Value::Null => Hooks::Unset,
            serde_json::Value::Array(items) => {
                let mut commands = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        serde_json::Value::String(command) => commands.push(command),
                        _ => return Ok(Hooks::Invalid),
                    }
                }
                Hooks::Commands(commands)
            }
            _ => Hooks::Invalid,
        })
    }
}

/// Persisted deployment configuration, immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeployConfig {
    #[serde(default)]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    #[serde(default)]
    pub local_path: String,

    #[serde(default)]
    pub remote_path: String,

    #[serde(default)]
    pub always_overwrite: bool,

    #[serde(default, skip_serializing_if = "Hooks::is_unset")]
    pub shell_before_deploy: Hooks,

    #[serde(default, skip_serializing_if = "Hooks::is_unset")]
    pub shell_after_deploy: Hooks,
}

fn default_port() -> u16 {
    22
}

impl DeployConfig {
    /// Check every required field is present and non-empty.
    ///
    /// Iteration order is fixed; the first missing field is reported.
    pub fn validate(&self) -> DeployResult<()> {
        let required: [(&'static str, &str); 5] = [
            ("host", &self.host),
            ("username", &self.username),
            ("password", &self.password),
            ("local_path", &self.local_path),
            ("remote_path", &self.remote_path),
        ];

        for (field, value) in required {
            if value.is_empty() {
                return Err(DeployError::MissingField { field });
            }
        }

        Ok(())
    }

    /// Check `local_path` resolves to an existing directory.
    pub fn check_local_path(&self) -> DeployResult<()> {
        let path = PathBuf::from(&self.local_path);
        if !path.exists() {
            return Err(DeployError::InvalidLocalPath {
                path,
                reason: "does not exist",
            });
        }
        if !path.is_dir() {
            return Err(DeployError::InvalidLocalPath {
                path,
                reason: "is not a directory",
            });
        }
        Ok(())
    }
}

/// Loads and persists the config file in one working directory.
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the process working directory.
    pub fn current_dir() -> std::io::Result<Self> {
        Ok(Self::new(std::env::current_dir()?))
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE)
    }

    pub fn exists(&self) -> bool {
        self.path().exists()
    }

    /// Parse the persisted config file.
    pub fn load(&self) -> DeployResult<DeployConfig> {
        let content = match fs::read_to_string(self.path()) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(DeployError::ConfigMissing { file: CONFIG_FILE });
            }
            Err(err) => {
                return Err(DeployError::ConfigUnreadable {
                    reason: err.to_string(),
                });
            }
        };

        serde_json::from_str(&content).map_err(|err| DeployError::ConfigUnreadable {
            reason: err.to_string(),
        })
    }

    /// Write the config file, pretty-printed for hand editing.
    pub fn save(&self, config: &DeployConfig) -> DeployResult<()> {
        let content = serde_json::to_string_pretty(config).map_err(|err| {
            DeployError::ConfigUnreadable {
                reason: err.to_string(),
            }
        })?;
        fs::write(self.path(), content + "\n")?;
        Ok(())
    }

    /// Append the config filename to `.gitignore` so the clear-text password
    /// is not committed. Best-effort: a missing ignore file is tolerated,
    /// and an already-listed filename is not duplicated.
    pub fn append_to_ignore_file(&self) {
        let ignore_path = self.dir.join(IGNORE_FILE);
        let Ok(content) = fs::read_to_string(&ignore_path) else {
            return;
        };

        if content.lines().any(|line| line.trim() == CONFIG_FILE) {
            return;
        }

        let mut updated = content;
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(CONFIG_FILE);
        updated.push('\n');

        let _ = fs::write(&ignore_path, updated);
    }
}
