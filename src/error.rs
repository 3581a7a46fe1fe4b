use thiserror::Error;

use crate::optimizer::SolverError;

/// Failures of the persistence backend.
///
/// Kept distinct from [`GridError::NoData`] so callers can tell "nothing
/// recorded yet" apart from "storage unreachable".
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[cfg(feature = "db")]
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Errors surfaced by the engine and its stores.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("access denied for region: {0}")]
    InvalidRegion(String),

    #[error("no grid state data found for {}", region.as_deref().unwrap_or("any region"))]
    NoData { region: Option<String> },

    #[error("malformed sample: {0}")]
    MalformedSample(String),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("solver failed: {0}")]
    Solver(#[from] SolverError),

    #[error("{0}")]
    JobAborted(String),
}

impl GridError {
    pub fn no_data(region: Option<&str>) -> Self {
        GridError::NoData {
            region: region.map(str::to_string),
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, GridError::NoData { .. })
    }
}

pub type GridResult<T> = Result<T, GridError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            GridError::no_data(Some("us-west")).to_string(),
            "no grid state data found for us-west"
        );
        assert_eq!(
            GridError::no_data(None).to_string(),
            "no grid state data found for any region"
        );
        assert_eq!(
            GridError::InvalidRegion("atlantis".into()).to_string(),
            "access denied for region: atlantis"
        );
    }

    #[test]
    fn test_storage_error_is_not_no_data() {
        let err: GridError = StorageError::Unavailable("pool closed".into()).into();
        assert!(!err.is_no_data());
        assert_eq!(err.to_string(), "storage unavailable: pool closed");
    }
}
