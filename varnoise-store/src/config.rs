use std::fmt::{self, Display};
use std::fs::read_to_string;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use varnoise_core::store::StoreResult;
use varnoise_core::{DEFAULT_BATCH_SIZE, MemoryStore, Store};

use crate::sqlite::SqliteStore;

/// Environment variable naming a config file when no path is given explicitly.
pub const CONFIG_ENV_VAR: &str = "VARNOISEDB_CONFIG";

pub const DEFAULT_DATABASE_PATH: &str = "variants.db";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file {path}: {source}")]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("batch_size must be at least 1")]
    ZeroBatchSize,
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DatabaseConfig {
    Sqlite {
        #[serde(alias = "name")]
        path: PathBuf,
    },
    Memory,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig::Sqlite {
            path: PathBuf::from(DEFAULT_DATABASE_PATH),
        }
    }
}

impl Display for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseConfig::Sqlite { path } => write!(f, "sqlite database at {}", path.display()),
            DatabaseConfig::Memory => write!(f, "in-memory database"),
        }
    }
}

impl DatabaseConfig {
    ///
    /// Open the configured backend. SQLite tables are created on open if
    /// they do not exist yet.
    ///
    pub fn open(&self) -> StoreResult<Box<dyn Store>> {
        match self {
            DatabaseConfig::Sqlite { path } => Ok(Box::new(SqliteStore::open(path)?)),
            DatabaseConfig::Memory => Ok(Box::new(MemoryStore::new())),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
pub struct VarNoiseConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    pub batch_size: Option<usize>,
}

impl VarNoiseConfig {
    pub fn batch_size(&self) -> ConfigResult<NonZeroUsize> {
        match self.batch_size {
            None => Ok(DEFAULT_BATCH_SIZE),
            Some(n) => NonZeroUsize::new(n).ok_or(ConfigError::ZeroBatchSize),
        }
    }

    ///
    /// Find the config to run with: an explicit path wins, then the file named
    /// by `VARNOISEDB_CONFIG`, then the built-in defaults.
    ///
    pub fn resolve(explicit: Option<&Path>) -> ConfigResult<Self> {
        let from_env = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        VarNoiseConfig::resolve_from(explicit, from_env.as_deref())
    }

    fn resolve_from(explicit: Option<&Path>, from_env: Option<&Path>) -> ConfigResult<Self> {
        match explicit.or(from_env) {
            Some(path) => {
                info!("Using config file {}", path.display());
                VarNoiseConfig::try_from(path)
            }
            None => Ok(VarNoiseConfig::default()),
        }
    }
}

impl TryFrom<&Path> for VarNoiseConfig {
    type Error = ConfigError;

    fn try_from(path: &Path) -> ConfigResult<Self> {
        let raw = read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: VarNoiseConfig =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?;
        config.batch_size()?;
        Ok(config)
    }
}
