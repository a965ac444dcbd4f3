use std::path::PathBuf;

use thiserror::Error;

/// Terminal resolution failures. None of these are retried: given the same
/// inputs they fail the same way.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("malformed address (expected repository::revision::file): {0}")]
    MalformedAddress(String),
    #[error("{field} contains the address delimiter '::': {value}")]
    DelimiterInField { field: &'static str, value: String },
    #[error("cannot determine remote from {remotes:?}")]
    NoRemoteDeterminable { remotes: Vec<String> },
    #[error("cannot determine URL for {file_path} at {revision}")]
    NoUrlDeterminable { revision: String, file_path: String },
}

#[derive(Debug, Error)]
pub enum GitError {
    #[error("path does not exist: {0}")]
    MissingPath(PathBuf),
    #[error("path is not a directory: {0}")]
    NotDirectory(PathBuf),
    #[error("path is not inside a git repository: {0}")]
    NotRepository(PathBuf),
    #[error("failed to execute git in {path}: {message}")]
    GitCommand { path: PathBuf, message: String },
    #[error("git {args} failed in {path}: {stderr}")]
    GitStatus {
        path: PathBuf,
        args: String,
        stderr: String,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid remote URL pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("unknown link format: {0}")]
    UnknownFormat(String),
}

#[derive(Debug, Error)]
pub enum LinkError {
    #[error("broken link {address}: {source}")]
    Broken {
        address: String,
        #[source]
        source: ResolveError,
    },
    #[error(transparent)]
    Git(#[from] GitError),
}

impl LinkError {
    pub fn broken(address: &str, source: ResolveError) -> Self {
        Self::Broken {
            address: address.to_string(),
            source,
        }
    }

    pub fn resolve_error(&self) -> Option<&ResolveError> {
        match self {
            Self::Broken { source, .. } => Some(source),
            Self::Git(_) => None,
        }
    }
}
