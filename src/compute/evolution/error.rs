//! Runtime errors for elite search.
//!
//! Every variant is fatal. The only retried conditions (archive contention
//! and an empty sample) are not errors and never surface here.

use std::io;
use std::path::PathBuf;

use crate::schema::ConfigError;

/// Fatal errors raised while running a search.
#[derive(Debug, thiserror::Error)]
pub enum EvolutionError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("Design has not been evaluated")]
    NotEvaluated,
    #[error("Exclusive access protocol violated: {0}")]
    ProtocolViolation(String),
    #[error("Out of resources: {0}. Please reduce the population size")]
    ResourceExhaustion(String),
    #[error("Failed to write {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read archive {}: {source}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Archive serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Run aborted after a fatal error in another task")]
    Aborted,
}

/// Result alias for evolution operations.
pub type Result<T> = std::result::Result<T, EvolutionError>;
