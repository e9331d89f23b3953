//! Permission layer for the ward orchestrator.
//!
//! # Model
//!
//! ```text
//! CapabilityRegistry      AgentRole → Capability      (static, fail-closed)
//!         │
//! AccessGate::check       verdict = action ∈ permitted(agent)
//!         │
//! AuditSink::append       one AccessLogEntry per check (ALLOWED and DENIED)
//! ```
//!
//! The gate is the only way a caller learns a verdict, so no check can
//! happen without an audit entry.

pub mod audit;
pub mod capability;
pub mod error;
pub mod gate;
pub mod registry;

pub use audit::{AccessLogEntry, AccessRecord, AuditLog, AuditSink, Verdict};
pub use capability::Capability;
pub use error::{AccessDenied, RegistryError};
pub use gate::{AccessGate, AccessRequest};
pub use registry::CapabilityRegistry;

pub use ward_types::AgentRole;
