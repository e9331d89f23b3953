//! Record store error types.

use thiserror::Error;
use ward_types::{ErrorCode, VisitId};

/// Errors raised by a [`RecordStore`](super::RecordStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No record with this id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A bill already exists for the visit.
    #[error("bill already issued for {0}")]
    DuplicateBill(VisitId),

    /// The visit is not in a state that allows the write.
    #[error("{visit}: {reason}")]
    VisitConflict { visit: VisitId, reason: &'static str },

    /// Restored records violate a store invariant.
    #[error("inconsistent records: {0}")]
    Inconsistent(String),
}

impl StoreError {
    /// Creates a NotFound error.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Creates an Inconsistent error.
    pub fn inconsistent(msg: impl Into<String>) -> Self {
        Self::Inconsistent(msg.into())
    }
}

impl ErrorCode for StoreError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "STORE_NOT_FOUND",
            Self::DuplicateBill(_) => "STORE_DUPLICATE_BILL",
            Self::VisitConflict { .. } => "STORE_VISIT_CONFLICT",
            Self::Inconsistent(_) => "STORE_INCONSISTENT",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        ward_types::assert_error_codes(
            &[
                StoreError::not_found("visit", VisitId::new(3)),
                StoreError::DuplicateBill(VisitId::new(3)),
                StoreError::VisitConflict {
                    visit: VisitId::new(3),
                    reason: "visit already holds a room",
                },
                StoreError::inconsistent("x"),
            ],
            "STORE_",
        );
    }

    #[test]
    fn not_found_display() {
        let err = StoreError::not_found("patient", ward_types::PatientId::new(7));
        assert_eq!(err.to_string(), "patient not found: patient:7");
    }
}
