//! Error taxonomy for the scanning engine.
//!
//! Every error maps onto a stable [`ErrorCode`]. The codes are part of the
//! C boundary contract and must not be renumbered.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::engine::LifecycleState;

/// Stable numeric codes surfaced to C callers.
///
/// | code | meaning |
/// |------|---------|
/// | 0 | success |
/// | 1 | signature catalog failed to compile |
/// | 2 | scan requested while the engine is not ready |
/// | 3 | path missing, unreadable, or not a directory |
/// | 4 | null or non-UTF-8 path at the boundary |
/// | 5 | cleanup forced termination after a poisoned state |
/// | 6 | internal panic caught at the boundary |
/// | 7 | scan worker pool could not be created |
/// | 8 | configuration file could not be loaded |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum ErrorCode {
    Ok = 0,
    CatalogBuild = 1,
    NotReady = 2,
    InputNotFound = 3,
    InvalidPath = 4,
    StatePoisoned = 5,
    Panic = 6,
    WorkerPool = 7,
    Config = 8,
}

impl ErrorCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

/// Failure to build a signature catalog from its declarative table.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("signature {id}: invalid pattern: {source}")]
    InvalidPattern {
        id: String,
        #[source]
        source: regex::Error,
    },

    #[error("signature {0}: matcher is empty")]
    EmptyMatcher(String),

    #[error("duplicate signature id: {0}")]
    DuplicateId(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml_edit::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    pub fn error_code(&self) -> ErrorCode {
        ErrorCode::Config
    }
}

/// Lifecycle failures reported by `init` and `cleanup`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to build signature catalog: {0}")]
    Catalog(#[from] CatalogError),

    #[error("failed to start scan workers: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("engine state was poisoned by an earlier panic; forced to terminated")]
    StatePoisoned,
}

impl EngineError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            EngineError::Catalog(_) => ErrorCode::CatalogBuild,
            EngineError::WorkerPool(_) => ErrorCode::WorkerPool,
            EngineError::Config(_) => ErrorCode::Config,
            EngineError::StatePoisoned => ErrorCode::StatePoisoned,
        }
    }
}

/// A scan that could not be performed at all.
///
/// Per-file failures inside a directory walk are not errors; they are
/// counted as skipped entries on the `DirectoryScan`.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("engine is not ready (state: {0})")]
    NotReady(LifecycleState),

    #[error("cannot read {}: {source}", path.display())]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

impl ScanError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ScanError::NotReady(_) => ErrorCode::NotReady,
            ScanError::InputNotFound { .. } | ScanError::NotADirectory(_) => {
                ErrorCode::InputNotFound
            }
        }
    }

    pub(crate) fn input(path: &std::path::Path, source: io::Error) -> Self {
        ScanError::InputNotFound {
            path: path.to_path_buf(),
            source,
        }
    }
}
