//! Orchestrator-facing error type.
//!
//! [`WardError`] is what every [`Orchestrator`](crate::Orchestrator)
//! operation returns. Every variant is recoverable except a store
//! consistency failure.

use crate::store::StoreError;
use thiserror::Error;
use ward_auth::AccessDenied;
use ward_types::{ErrorCode, VisitId};

/// Failure of one orchestrator operation.
///
/// # Example
///
/// ```
/// use ward_auth::AccessDenied;
/// use ward_runtime::WardError;
/// use ward_types::ErrorCode;
///
/// let err: WardError = AccessDenied::new("DiagnosisAgent", "identity_read").into();
/// assert_eq!(err.code(), "WARD_PERMISSION_DENIED");
/// assert!(err.is_recoverable());
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WardError {
    /// The access gate refused the operation; nothing was mutated.
    #[error("permission denied: {agent} may not {action}")]
    PermissionDenied { agent: String, action: String },

    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// No instance of a pooled resource is free. Retry later.
    #[error("no free {resource} available")]
    ResourceUnavailable { resource: &'static str },

    /// A create operation pointed at an entity that does not exist.
    #[error("invalid reference in field '{field}'")]
    InvalidReference { field: &'static str },

    /// Caller-supplied input was rejected before touching any state.
    #[error("invalid input in field '{field}'")]
    InvalidInput { field: &'static str },

    /// The visit is not in a state that permits the operation.
    #[error("{visit}: {reason}")]
    InvalidState { visit: VisitId, reason: &'static str },

    /// The record store rejected the operation.
    #[error("store error: {0}")]
    Store(StoreError),
}

impl WardError {
    pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub(crate) fn invalid_state(visit: VisitId, reason: &'static str) -> Self {
        Self::InvalidState { visit, reason }
    }

    /// Returns `true` for a permission denial.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

impl From<AccessDenied> for WardError {
    fn from(err: AccessDenied) -> Self {
        Self::PermissionDenied {
            agent: err.agent,
            action: err.action,
        }
    }
}

impl From<StoreError> for WardError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => Self::NotFound { entity, id },
            StoreError::VisitConflict { visit, reason } => Self::InvalidState { visit, reason },
            other => Self::Store(other),
        }
    }
}

impl ErrorCode for WardError {
    fn code(&self) -> &'static str {
        match self {
            Self::PermissionDenied { .. } => "WARD_PERMISSION_DENIED",
            Self::NotFound { .. } => "WARD_NOT_FOUND",
            Self::ResourceUnavailable { .. } => "WARD_RESOURCE_UNAVAILABLE",
            Self::InvalidReference { .. } => "WARD_INVALID_REFERENCE",
            Self::InvalidInput { .. } => "WARD_INVALID_INPUT",
            Self::InvalidState { .. } => "WARD_INVALID_STATE",
            Self::Store(_) => "WARD_STORE_ERROR",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_recoverable(),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_maps_to_not_found() {
        let err: WardError = StoreError::not_found("visit", VisitId::new(4)).into();
        assert_eq!(
            err,
            WardError::NotFound {
                entity: "visit",
                id: "visit:4".into()
            }
        );
    }

    #[test]
    fn store_visit_conflict_maps_to_invalid_state() {
        let err: WardError = StoreError::VisitConflict {
            visit: VisitId::new(2),
            reason: "visit already holds a room",
        }
        .into();
        assert_eq!(err, WardError::invalid_state(VisitId::new(2), "visit already holds a room"));
    }

    #[test]
    fn store_other_is_wrapped() {
        let err: WardError = StoreError::DuplicateBill(VisitId::new(1)).into();
        assert!(matches!(err, WardError::Store(_)));
        assert_eq!(err.code(), "WARD_STORE_ERROR");
    }

    #[test]
    fn error_codes() {
        ward_types::assert_error_codes(
            &[
                WardError::PermissionDenied {
                    agent: "a".into(),
                    action: "b".into(),
                },
                WardError::not_found("patient", 1),
                WardError::ResourceUnavailable { resource: "room" },
                WardError::InvalidReference { field: "patient_id" },
                WardError::InvalidInput { field: "phone" },
                WardError::invalid_state(VisitId::new(1), "visit is completed"),
                WardError::Store(StoreError::inconsistent("x")),
            ],
            "WARD_",
        );
    }

    #[test]
    fn inconsistent_store_is_not_recoverable() {
        assert!(!WardError::Store(StoreError::inconsistent("x")).is_recoverable());
        assert!(WardError::ResourceUnavailable { resource: "room" }.is_recoverable());
    }
}
