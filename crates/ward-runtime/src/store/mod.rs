//! Patient, visit and bill persistence.
//!
//! The [`RecordStore`] trait is the seam between the orchestrator and the
//! storage backend. Every method is a single atomic statement against the
//! backend; the orchestrator never holds a store lock across calls.

mod error;
mod memory;

pub use error::StoreError;
pub use memory::MemoryStore;

use crate::model::{Bill, Diagnosis, LineItem, NewVisit, Patient, PatientDraft, Visit, VisitStatus};
use serde::{Deserialize, Serialize};
use ward_types::{PatientId, VisitId};

/// Full contents of a store, in id order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordSet {
    #[serde(default)]
    pub patients: Vec<Patient>,
    #[serde(default)]
    pub visits: Vec<Visit>,
    #[serde(default)]
    pub bills: Vec<Bill>,
}

/// Storage backend for clinical records.
///
/// Implementations must be thread-safe (`Send + Sync`); the orchestrator
/// is shared across threads.
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    fn get_patient(&self, id: PatientId) -> Option<Patient>;

    fn find_patient_by_phone(&self, phone: &str) -> Option<Patient>;

    /// The most recently registered patient with exactly this name.
    fn find_latest_patient_by_name(&self, name: &str) -> Option<Patient>;

    /// Every patient, newest first.
    fn list_patients(&self) -> Vec<Patient>;

    /// Inserts a patient, or merges into the one already holding `phone`.
    ///
    /// On merge the name is replaced and demographics follow
    /// [`Demographics::merge`](crate::model::Demographics::merge).
    fn upsert_patient_by_phone(&self, draft: &PatientDraft) -> Patient;

    /// Creates an ongoing visit with no diagnosis and no room.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the patient does not exist.
    fn create_visit(&self, visit: NewVisit) -> Result<Visit, StoreError>;

    fn get_visit(&self, id: VisitId) -> Option<Visit>;

    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the visit does not exist.
    fn update_visit_diagnosis(
        &self,
        id: VisitId,
        diagnosis: Diagnosis,
    ) -> Result<Visit, StoreError>;

    /// Sets or clears the allocated room unconditionally.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the visit does not exist.
    fn update_visit_room(&self, id: VisitId, room: Option<String>) -> Result<Visit, StoreError>;

    /// Records `room` on an ongoing visit that holds no room yet.
    ///
    /// The check and the write happen under one lock, so of two racing
    /// claims on the same visit exactly one succeeds.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the visit does not exist,
    /// [`StoreError::VisitConflict`] if it is completed or already holds
    /// a room.
    fn claim_visit_room(&self, id: VisitId, room: String) -> Result<Visit, StoreError>;

    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the visit does not exist.
    fn set_visit_status(&self, id: VisitId, status: VisitStatus) -> Result<Visit, StoreError>;

    /// Issues a bill whose total is the sum of `items`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the visit does not exist,
    /// [`StoreError::DuplicateBill`] if one was already issued.
    fn create_bill(&self, visit_id: VisitId, items: Vec<LineItem>) -> Result<Bill, StoreError>;

    fn bill_for_visit(&self, visit_id: VisitId) -> Option<Bill>;

    /// Copies every record for persistence.
    fn export(&self) -> RecordSet;
}
