//! Visit lifecycle orchestration for the ward.
//!
//! ```text
//! caller ──► Orchestrator::op
//!               │
//!               ├─ AccessGate::require (check + audit, always)
//!               │        │ denied → WardError::PermissionDenied
//!               ▼
//!      RecordStore / DiagnosisModel / RoomPool
//! ```
//!
//! # Modules
//!
//! - [`model`]: typed patient, visit, room and bill records
//! - [`store`]: [`RecordStore`] trait and the in-memory backend
//! - [`pool`]: the mutex-guarded room pool
//! - [`diagnosis`]: the de-identified diagnosis boundary
//! - [`config`]: layered TOML configuration
//! - [`snapshot`]: JSON persistence of the whole state

pub mod config;
pub mod diagnosis;
mod error;
pub mod model;
mod orchestrator;
pub mod pool;
pub mod snapshot;
pub mod store;

pub use config::{ConfigLoader, WardConfig};
pub use error::WardError;
pub use orchestrator::{Orchestrator, OrchestratorBuilder, CONSULTATION_FEE_ITEM};
pub use pool::RoomPool;
pub use snapshot::{SnapshotFile, SnapshotLock, WardSnapshot};
pub use store::{MemoryStore, RecordStore};
