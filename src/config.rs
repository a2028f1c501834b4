use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const APP_DIR: &str = ".config/nix-go";
const CONFIG_FILE: &str = "config.json";
const DATABASE_FILE: &str = "nixgo.db";

/// Overrides the database location from the settings file.
pub const DATABASE_ENV: &str = "NIX_GO_DB";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHomeDirectory,

    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// How a project shell is started.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchSettings {
    /// Executable that materializes the environment.
    pub package_shell: String,
    /// Interactive shell passed to `--run`.
    pub interactive_shell: String,
    /// Used when a project has no packages, since `-p` needs at least one.
    pub placeholder_package: String,
    /// Set in the child environment to the active project name.
    pub project_env_var: String,
}

impl Default for LaunchSettings {
    fn default() -> Self {
        Self {
            package_shell: "nix-shell".to_string(),
            interactive_shell: "zsh".to_string(),
            placeholder_package: "hello".to_string(),
            project_env_var: "NIX_ENV".to_string(),
        }
    }
}

/// Resolved settings for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_path: PathBuf,
    pub launch: LaunchSettings,
}

/// On-disk layout of `config.json`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SettingsFile {
    database_path: Option<PathBuf>,
    #[serde(flatten)]
    launch: LaunchSettings,
}

impl Settings {
    /// Load settings from `~/.config/nix-go/config.json`, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self, ConfigError> {
        let dir = config_dir()?;
        let env_db = std::env::var_os(DATABASE_ENV).map(PathBuf::from);
        Self::load_from(&dir, env_db)
    }

    /// Load settings from `dir`. `database_override` wins over the file.
    pub fn load_from(dir: &Path, database_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        let config_path = dir.join(CONFIG_FILE);
        let file = if config_path.exists() {
            let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
                path: config_path.clone(),
                source,
            })?;
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: config_path.clone(),
                source,
            })?
        } else {
            SettingsFile::default()
        };

        let database_path = database_override
            .filter(|p| !p.as_os_str().is_empty())
            .or(file.database_path)
            .unwrap_or_else(|| dir.join(DATABASE_FILE));

        Ok(Self {
            database_path,
            launch: file.launch,
        })
    }
}

fn config_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(home.join(APP_DIR))
}
