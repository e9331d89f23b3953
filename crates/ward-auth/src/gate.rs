//! The access gate: decide, log, return.
//!
//! ```text
//! caller ──► AccessGate::check(request)
//!                 │
//!                 ├─ registry.permitted(agent) ∋ action ?  → verdict
//!                 ├─ audit.append(verdict)                  (always)
//!                 └─ tracing: debug (allowed) / warn (denied)
//!                 ▼
//!              bool
//! ```
//!
//! The gate never raises on denial. [`AccessGate::require`] is the
//! `Result`-returning wrapper used by callers that must halt.

use crate::{AccessDenied, AccessRecord, AuditSink, Capability, CapabilityRegistry, Verdict};
use std::sync::Arc;
use ward_types::AgentRole;

/// One capability check.
///
/// # Example
///
/// ```
/// use ward_auth::{AccessRequest, Capability};
/// use ward_types::AgentRole;
///
/// let req = AccessRequest::new(AgentRole::Diagnosis, Capability::VISIT_READ_ANONYMIZED)
///     .on("visit")
///     .id(12)
///     .note("run_diagnosis");
/// assert_eq!(req.resource_id.as_deref(), Some("12"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRequest {
    pub agent: AgentRole,
    pub action: Capability,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub note: String,
}

impl AccessRequest {
    /// A request with no resource and an empty note.
    #[must_use]
    pub fn new(agent: AgentRole, action: Capability) -> Self {
        Self {
            agent,
            action,
            resource_type: None,
            resource_id: None,
            note: String::new(),
        }
    }

    /// Sets the targeted resource type.
    #[must_use]
    pub fn on(mut self, resource_type: impl Into<String>) -> Self {
        self.resource_type = Some(resource_type.into());
        self
    }

    /// Sets the targeted resource id.
    #[must_use]
    pub fn id(mut self, resource_id: impl ToString) -> Self {
        self.resource_id = Some(resource_id.to_string());
        self
    }

    /// Sets the free-text note recorded with the decision.
    #[must_use]
    pub fn note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }
}

/// Capability check + audit append.
///
/// The registry is an explicit constructor argument; there is no
/// process-wide permission table.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use ward_auth::{AccessGate, AccessRequest, AuditLog, AuditSink, Capability, CapabilityRegistry};
/// use ward_types::AgentRole;
///
/// let audit = Arc::new(AuditLog::new());
/// let gate = AccessGate::new(CapabilityRegistry::standard(), audit.clone());
///
/// assert!(gate.check(&AccessRequest::new(AgentRole::Room, Capability::ROOM_READ)));
/// assert!(!gate.check(&AccessRequest::new(AgentRole::Room, Capability::LOGS_READ)));
/// assert_eq!(audit.len(), 2);
/// assert_eq!(audit.denied_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct AccessGate {
    registry: Arc<CapabilityRegistry>,
    audit: Arc<dyn AuditSink>,
}

impl AccessGate {
    /// Creates a gate over `registry` that logs to `audit`.
    #[must_use]
    pub fn new(registry: CapabilityRegistry, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            registry: Arc::new(registry),
            audit,
        }
    }

    /// Returns the registry this gate evaluates against.
    #[must_use]
    pub fn registry(&self) -> &CapabilityRegistry {
        &self.registry
    }

    /// Returns the audit sink this gate writes to.
    #[must_use]
    pub fn audit(&self) -> &Arc<dyn AuditSink> {
        &self.audit
    }

    /// Evaluates `request`, logs the verdict and returns it.
    pub fn check(&self, request: &AccessRequest) -> bool {
        let allowed = self.registry.allows(request.agent, request.action);
        self.record(
            request.agent.as_str(),
            request.action,
            request.resource_type.clone(),
            request.resource_id.clone(),
            request.note.clone(),
            allowed,
        );
        allowed
    }

    /// Evaluates a request whose identity is an asserted string.
    ///
    /// A string that is not a known [`AgentRole`] is denied and logged
    /// under the raw string, with the note prefixed by `unknown agent`.
    pub fn check_named(
        &self,
        agent: &str,
        action: Capability,
        resource_type: Option<&str>,
        resource_id: Option<&str>,
        note: &str,
    ) -> bool {
        match AgentRole::parse(agent) {
            Some(role) => {
                let mut request = AccessRequest::new(role, action).note(note);
                request.resource_type = resource_type.map(str::to_string);
                request.resource_id = resource_id.map(str::to_string);
                self.check(&request)
            }
            None => {
                let note = if note.is_empty() {
                    "unknown agent".to_string()
                } else {
                    format!("unknown agent: {note}")
                };
                self.record(
                    agent,
                    action,
                    resource_type.map(str::to_string),
                    resource_id.map(str::to_string),
                    note,
                    false,
                );
                false
            }
        }
    }

    /// Like [`check`](Self::check), but maps a denial to [`AccessDenied`].
    ///
    /// # Errors
    ///
    /// Returns [`AccessDenied`] when the registry does not grant the action.
    pub fn require(&self, request: &AccessRequest) -> Result<(), AccessDenied> {
        if self.check(request) {
            Ok(())
        } else {
            Err(AccessDenied::new(
                request.agent.as_str(),
                request.action.to_string(),
            ))
        }
    }

    fn record(
        &self,
        agent: &str,
        action: Capability,
        resource_type: Option<String>,
        resource_id: Option<String>,
        note: String,
        allowed: bool,
    ) {
        let verdict = Verdict::from_allowed(allowed);
        let entry = self.audit.append(AccessRecord {
            agent: agent.to_string(),
            action: action.to_string(),
            resource_type,
            resource_id,
            verdict,
            note,
        });

        if allowed {
            tracing::debug!(
                seq = entry.seq,
                agent = %entry.agent,
                action = %entry.action,
                resource = ?entry.resource_type,
                "access allowed"
            );
        } else {
            tracing::warn!(
                seq = entry.seq,
                agent = %entry.agent,
                action = %entry.action,
                resource = ?entry.resource_type,
                note = %entry.note,
                "access denied"
            );
        }
    }
}
