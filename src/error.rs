//! Errors returned by the sync stages.

use std::io;
use std::path::{
    Path,
    PathBuf,
};

use thiserror::Error;

use crate::config::ConfigError;
use crate::external::ParseError;
use crate::external::region::RegionError;
use crate::pipeline::runner::ExternalCallError;
use crate::validate::ValidationReport;

/// Why a single document could not be read.
#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Literal(#[from] ParseError),

    #[error("The top-level value must be an object")]
    NotAnObject,

    #[error("'@@locale' must be a string")]
    InvalidLocaleField,

    #[error("Invalid template document: {0}")]
    Template(String),

    #[error(transparent)]
    Region(#[from] RegionError),
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An input some earlier stage should have produced.
    #[error("{} not found. {hint}", .path.display())]
    MissingArtifact { path: PathBuf, hint: String },

    #[error("Malformed document {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: DocumentError,
    },

    #[error(transparent)]
    Validation(#[from] ValidationReport),

    #[error(transparent)]
    External(#[from] ExternalCallError),

    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SyncError {
    pub fn missing(path: impl Into<PathBuf>, hint: impl Into<String>) -> Self {
        Self::MissingArtifact { path: path.into(), hint: hint.into() }
    }

    pub fn malformed(path: impl Into<PathBuf>, source: impl Into<DocumentError>) -> Self {
        Self::Malformed { path: path.into(), source: source.into() }
    }

    pub fn io(path: &Path, source: io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }

    /// Process exit status for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Io { .. } => 1,
            Self::Config(_) => 2,
            Self::MissingArtifact { .. } => 3,
            Self::Malformed { .. } => 4,
            Self::Validation(_) => 5,
            Self::External(_) => 6,
        }
    }
}
