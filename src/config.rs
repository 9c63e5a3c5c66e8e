use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs::{File, create_dir_all};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

pub const SERVER_URL_ENV: &str = "RECALL_SERVER_URL";

fn default_server_url() -> String {
    "http://localhost:3000".to_string()
}
fn default_active() -> String {
    "active".to_string()
}
fn default_archived() -> String {
    "archived".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no home directory to keep configuration in")]
    NoHome,
    #[error("open {} failed: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("write {} failed: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Where the two collections live and how chatty the log is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecallConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_active")]
    pub active_collection: String,
    #[serde(default = "default_archived")]
    pub archived_collection: String,
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for RecallConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            active_collection: default_active(),
            archived_collection: default_archived(),
            debug_logging: false,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "RustyRecall")
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    let dirs = project_dirs().ok_or(ConfigError::NoHome)?;
    Ok(dirs.config_dir().join("recall.json"))
}

pub fn log_path() -> Result<PathBuf, ConfigError> {
    let dirs = project_dirs().ok_or(ConfigError::NoHome)?;
    Ok(dirs.data_local_dir().join("recall.log"))
}

fn read_config(path: &Path) -> RecallConfig {
    File::open(path)
        .ok()
        .and_then(|f| serde_json::from_reader(BufReader::new(f)).ok())
        .unwrap_or_default()
}

/// Loads the config at `path`, falling back to defaults when the file is
/// missing or unreadable. The server URL can be overridden from the
/// environment.
pub fn load_config_from(path: &Path) -> RecallConfig {
    let mut cfg = read_config(path);
    apply_env(&mut cfg, std::env::var(SERVER_URL_ENV).ok());
    cfg
}

pub fn load_config() -> RecallConfig {
    match config_path() {
        Ok(path) => load_config_from(&path),
        Err(_) => {
            let mut cfg = RecallConfig::default();
            apply_env(&mut cfg, std::env::var(SERVER_URL_ENV).ok());
            cfg
        }
    }
}

fn apply_env(cfg: &mut RecallConfig, server_url: Option<String>) {
    if let Some(url) = server_url.filter(|u| !u.trim().is_empty()) {
        cfg.server_url = url;
    }
}

pub fn save_config_to(cfg: &RecallConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    let file = File::create(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::to_writer_pretty(BufWriter::new(file), cfg).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

pub fn save_config(cfg: &RecallConfig) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path()?)
}
