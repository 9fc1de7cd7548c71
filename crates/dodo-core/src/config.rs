use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Project-local config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "dodo.toml";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_true")]
    pub graphiql: bool,
    /// Actor used when a request carries no `x-dodo-actor` header.
    #[serde(default)]
    pub default_actor: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            graphiql: default_true(),
            default_actor: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file. Defaults to `<data_dir>/dodo/dodo.sqlite3`.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `EnvFilter` directive, used when `DODO_LOG` is unset.
    #[serde(default)]
    pub filter: Option<String>,
    /// `compact` or `json`, used when `DODO_LOG_FORMAT` is unset.
    #[serde(default)]
    pub format: Option<String>,
}

impl Config {
    /// Database path after applying the platform default.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(default_database_path)
    }
}

/// Parse one config file.
pub fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<Config>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the effective config.
///
/// Lookup order: `explicit`, `./dodo.toml`, `<config_dir>/dodo/config.toml`,
/// then built-in defaults. `DODO_DATABASE` and `DODO_BIND` override the file.
pub fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    let user_path = dirs::config_dir().map(|dir| dir.join("dodo/config.toml"));
    let path = find_config_path(explicit, Path::new(LOCAL_CONFIG_FILE), user_path.as_deref());

    let config = match path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            load_config_file(&path)?
        }
        None => Config::default(),
    };

    Ok(apply_env_overrides(
        config,
        env::var("DODO_DATABASE").ok(),
        env::var("DODO_BIND").ok(),
    ))
}

fn find_config_path(
    explicit: Option<&Path>,
    local: &Path,
    user: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if local.exists() {
        return Some(local.to_path_buf());
    }
    user.filter(|path| path.exists()).map(Path::to_path_buf)
}

fn apply_env_overrides(
    mut config: Config,
    env_database: Option<String>,
    env_bind: Option<String>,
) -> Config {
    if let Some(path) = env_database.filter(|value| !value.trim().is_empty()) {
        config.database.path = Some(PathBuf::from(path));
    }
    if let Some(bind) = env_bind.filter(|value| !value.trim().is_empty()) {
        config.server.bind = bind;
    }
    config
}

fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("dodo")
        .join("dodo.sqlite3")
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

const fn default_true() -> bool {
    true
}
