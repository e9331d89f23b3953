//! Errors raised by the permission layer.

use thiserror::Error;
use ward_types::ErrorCode;

/// A guarded operation was refused by the access gate.
///
/// The denial has already been written to the audit log by the time this
/// value exists; callers only decide how to surface it.
///
/// # Example
///
/// ```
/// use ward_auth::AccessDenied;
///
/// let err = AccessDenied::new("DiagnosisAgent", "identity_read");
/// assert_eq!(err.to_string(), "permission denied: DiagnosisAgent may not identity_read");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("permission denied: {agent} may not {action}")]
pub struct AccessDenied {
    /// Identity that made the request.
    pub agent: String,
    /// Action that was refused.
    pub action: String,
}

impl AccessDenied {
    /// Creates a denial for `agent` attempting `action`.
    pub fn new(agent: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            action: action.into(),
        }
    }
}

impl ErrorCode for AccessDenied {
    fn code(&self) -> &'static str {
        "AUTH_PERMISSION_DENIED"
    }

    fn is_recoverable(&self) -> bool {
        true
    }
}

/// Invalid permission table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The table names an agent that is not a known role.
    #[error("unknown agent '{agent}' in permission table")]
    UnknownAgent { agent: String },

    /// The table grants an action that does not exist.
    #[error("unknown action '{action}' granted to '{agent}'")]
    UnknownAction { agent: String, action: String },
}

impl ErrorCode for RegistryError {
    fn code(&self) -> &'static str {
        match self {
            Self::UnknownAgent { .. } => "AUTH_UNKNOWN_AGENT",
            Self::UnknownAction { .. } => "AUTH_UNKNOWN_ACTION",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ward_types::{assert_error_code, assert_error_codes};

    #[test]
    fn access_denied_display_and_code() {
        let err = AccessDenied::new("RoomAgent", "billing_create");
        let msg = err.to_string();
        assert!(msg.contains("RoomAgent"), "got: {msg}");
        assert!(msg.contains("billing_create"), "got: {msg}");
        assert_error_code(&err, "AUTH_");
        assert!(err.is_recoverable());
    }

    #[test]
    fn registry_error_codes() {
        assert_error_codes(
            &[
                RegistryError::UnknownAgent { agent: "x".into() },
                RegistryError::UnknownAction {
                    agent: "x".into(),
                    action: "y".into(),
                },
            ],
            "AUTH_",
        );
    }
}
