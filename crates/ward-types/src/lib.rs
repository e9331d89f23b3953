//! Core types for the ward orchestrator.
//!
//! This crate sits at the bottom of the workspace and has no logic beyond
//! identity:
//!
//! ```text
//! ward-types   (PatientId, VisitId, BillId, AgentRole, ErrorCode)  ◄── HERE
//!     ↑
//! ward-auth    (Capability, CapabilityRegistry, AccessGate, AuditLog)
//!     ↑
//! ward-runtime (RoomPool, RecordStore, Orchestrator, config)
//!     ↑
//! ward-cli     (the `ward` binary)
//! ```

mod agent;
mod error;
mod id;

pub use agent::AgentRole;
pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{BillId, PatientId, VisitId};
