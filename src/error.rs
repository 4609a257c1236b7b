use std::{io, path::PathBuf};
use thiserror::Error;

/// Failures surfaced by scanning or provisioning projects.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("parent directory does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Project {0} already exists")]
    AlreadyExists(String),

    #[error("invalid project name: {0:?}")]
    InvalidName(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed: {output}")]
    ToolFailure { command: String, output: String },
}

impl RepositoryError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Failures loading or saving the settings file, or preparing the root directory.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHomeDirectory,

    #[error("could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("could not parse {}: {source}", path.display())]
    LegacyParse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("could not save configuration: {0}")]
    Write(String),

    #[error("could not create directory: {0}")]
    CreateDir(io::Error),

    #[error("error accessing directory: {0}")]
    Access(io::Error),

    #[error("the specified path is not a directory")]
    NotADirectory,

    #[error("directory is not writable: {0}")]
    NotWritable(io::Error),
}
