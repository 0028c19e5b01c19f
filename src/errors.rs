// src/errors.rs

//! Crate-wide error type and result alias.

use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpawnerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("unable to expand template for {component}: {source}")]
    Template {
        component: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("filesystem error for {component} at {path:?}: {source}")]
    Filesystem {
        component: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error during populating component {component}: {source}")]
    Populate {
        component: String,
        #[source]
        source: Box<SpawnerError>,
    },

    #[error("unable to create {stream} pipe for {component}")]
    Pipe { component: String, stream: Stream },

    #[error("execution of {component} failed, reason: {reason}")]
    Execution {
        component: String,
        reason: ExecutionFailure,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SpawnerError {
    pub fn execution(component: impl Into<String>, reason: ExecutionFailure) -> Self {
        SpawnerError::Execution {
            component: component.into(),
            reason,
        }
    }
}

/// Why a component's own process did not complete successfully.
#[derive(Error, Debug)]
pub enum ExecutionFailure {
    #[error("{0}")]
    Start(std::io::Error),

    #[error("{0}")]
    Wait(std::io::Error),

    #[error("{0}")]
    Exit(ExitStatus),

    #[error("killed")]
    Killed,

    #[error("cancelled")]
    Cancelled,
}

/// One of the two output streams of a component process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Stdout => f.write_str("stdout"),
            Stream::Stderr => f.write_str("stderr"),
        }
    }
}

pub type Result<T> = std::result::Result<T, SpawnerError>;
