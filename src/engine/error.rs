//! Engine error types.

use thiserror::Error;

use crate::report::{RejectionReason, RejectionRecord};

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Faults that abandon the analysis of one unit.
///
/// Neither is fatal to a run; each becomes a unit-level rejection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The unit's deadline expired.
    #[error("analysis of `{path}` exceeded its deadline after {elapsed_ms} ms")]
    Timeout { path: String, elapsed_ms: u64 },

    /// Brackets nest deeper than the recognizer follows.
    #[error("bracket nesting depth {depth} exceeds the limit of {limit}")]
    NestingTooDeep { depth: usize, limit: usize },

    /// Unexpected fault while analysing the unit.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    pub fn rejection_reason(&self) -> RejectionReason {
        match self {
            EngineError::Timeout { .. } => RejectionReason::Timeout,
            EngineError::NestingTooDeep { .. } | EngineError::Internal(_) => {
                RejectionReason::InternalError
            }
        }
    }

    /// Attach the unit path to a timeout raised below the unit boundary.
    pub fn for_unit(self, unit_path: &str) -> Self {
        match self {
            EngineError::Timeout { path, elapsed_ms } if path.is_empty() => EngineError::Timeout {
                path: unit_path.to_string(),
                elapsed_ms,
            },
            other => other,
        }
    }

    /// Unit-level rejection record for this error.
    pub fn to_rejection(&self, source_file: &str) -> RejectionRecord {
        RejectionRecord::new(source_file, 0, self.rejection_reason()).with_detail(self.to_string())
    }
}
