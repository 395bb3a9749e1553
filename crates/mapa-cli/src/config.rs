//! Locating and reading the CLI's TOML configuration.
//!
//! A configuration comes from the first [`ConfigSource`] that exists, then
//! goes through [`AppConfig::validate`] before the pipeline sees it.

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use thiserror::Error;

use mapa::{MapaError, config::AppConfig};

/// Configuration file looked up relative to the working directory.
const LOCAL_CONFIG: &str = "mapa/config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration file: {}", .0.display())]
    MissingFile(PathBuf),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse TOML in {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl From<ConfigError> for MapaError {
    fn from(err: ConfigError) -> Self {
        MapaError::Config(err.to_string())
    }
}

/// Where the configuration was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given on the command line; must exist.
    Explicit(PathBuf),
    /// `mapa/config.toml` under the working directory.
    Local(PathBuf),
    /// `config.toml` in the platform configuration directory.
    System(PathBuf),
    /// No file found; built-in defaults.
    Default,
}

impl ConfigSource {
    /// Picks the source to load, preferring `explicit`, then the local file,
    /// then the platform file.
    pub fn locate(explicit: Option<&Path>) -> Self {
        if let Some(path) = explicit {
            return Self::Explicit(path.to_path_buf());
        }

        let local = PathBuf::from(LOCAL_CONFIG);
        if local.exists() {
            return Self::Local(local);
        }

        match ProjectDirs::from("com", "mapa", "mapa") {
            Some(dirs) => {
                let system = dirs.config_dir().join("config.toml");
                if system.exists() {
                    return Self::System(system);
                }
                debug!(path = system.display().to_string(); "System configuration file not found");
            }
            None => debug!("Could not determine platform-specific config directory"),
        }

        Self::Default
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(path) | Self::Local(path) | Self::System(path) => Some(path),
            Self::Default => None,
        }
    }

    /// Reads and validates the configuration this source points at.
    ///
    /// # Errors
    ///
    /// Returns [`MapaError::Config`] if the file is missing, unreadable, not
    /// valid TOML or holds values the renderer rejects.
    pub fn load(&self) -> Result<AppConfig, MapaError> {
        let config = match self.path() {
            Some(path) => read(path)?,
            None => AppConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Explicit(_) => write!(f, "explicit"),
            Self::Local(_) => write!(f, "local"),
            Self::System(_) => write!(f, "system"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Locates, reads and validates the configuration.
///
/// # Errors
///
/// See [`ConfigSource::load`].
pub fn load_config(explicit_path: Option<impl AsRef<Path>>) -> Result<AppConfig, MapaError> {
    let source = ConfigSource::locate(explicit_path.as_ref().map(|path| path.as_ref()));
    match source.path() {
        Some(path) => info!(source:%, path = path.display().to_string(); "Loading configuration"),
        None => info!(source:%; "No configuration file found, using defaults"),
    }
    source.load()
}

fn read(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => ConfigError::MissingFile(path.to_path_buf()),
        _ => ConfigError::Read {
            path: path.to_path_buf(),
            source,
        },
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
