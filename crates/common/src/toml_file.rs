//! Loading service configuration from TOML files.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

/// Failure to load a configuration file.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// The file could not be read.
    #[error("reading {}: {source}", path.display())]
    Read {
        /// The file.
        path: PathBuf,

        /// The underlying failure.
        source: io::Error,
    },

    /// The contents do not describe a valid configuration.
    #[error("parsing {}: {source}", path.display())]
    Parse {
        /// The file.
        path: PathBuf,

        /// The underlying failure.
        source: toml::de::Error,
    },
}

/// Reads `path` and deserializes it into `T`.
pub fn load<T>(path: impl AsRef<Path>) -> Result<T, ConfigFileError>
where
    T: std::fmt::Debug + DeserializeOwned,
{
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigFileError::Read {
        path: path.to_owned(),
        source,
    })?;

    let parsed = toml::from_str::<T>(&contents).map_err(|source| ConfigFileError::Parse {
        path: path.to_owned(),
        source,
    })?;
    debug!(path = %path.display(), ?parsed, "loaded configuration");

    Ok(parsed)
}
