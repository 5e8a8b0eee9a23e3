use thiserror::Error;

/// Failures raised while acquiring or driving an engine instance.
///
/// The orchestrator converts every variant into the failure side of an
/// outcome; none of them escape `run_validated`/`run_freeform`.
#[derive(Debug, Error)]
pub enum GymError {
    /// Configuration error: the schema id is not in the seed catalog.
    #[error("config error: unknown database '{0}' (expected one of: employees, ecommerce, movies)")]
    UnknownSchema(String),

    /// Every slot up to the global ceiling is in use. Retryable by the caller.
    #[error(
        "Database pool exhausted. Too many concurrent operations ({max} instances in use). Please wait and try again."
    )]
    PoolExhausted { max: usize },

    /// The embedded engine rejected or failed a statement.
    #[error("{0}")]
    Engine(#[from] rusqlite::Error),

    #[error("query cancelled after exceeding the {0} ms statement timeout")]
    Timeout(u64),

    #[error("engine task failed: {0}")]
    Task(String),
}

impl GymError {
    /// Only exhaustion is worth retrying; everything else fails the same way twice.
    pub fn is_retryable(&self) -> bool {
        matches!(self, GymError::PoolExhausted { .. })
    }
}

impl From<tokio::task::JoinError> for GymError {
    fn from(e: tokio::task::JoinError) -> Self {
        GymError::Task(format!("spawn_blocking join error: {}", e))
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
pub struct ConfigError(pub String);
