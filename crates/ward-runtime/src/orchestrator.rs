//! Visit lifecycle controller.
//!
//! Every public operation first asks the [`AccessGate`] with a fixed
//! (role, action) pair and returns [`WardError::PermissionDenied`] before
//! touching the store, the pool or the diagnosis model when refused.
//!
//! ```text
//!  [none] --create_visit--> ONGOING --run_diagnosis--> ONGOING(diagnosed)
//!  ONGOING(*) --assign_room--> ONGOING(roomed)
//!  ONGOING(*) --generate_bill--> COMPLETED (room released)
//!  ONGOING(*) --complete_visit--> COMPLETED (room released, no bill)
//! ```
//!
//! There is no per-visit lock. Two callers racing on the same visit are
//! serialized only per store call.

use crate::config::{ConfigError, WardConfig};
use crate::diagnosis::{ClinicalSnapshot, DiagnosisModel, RuleBasedDiagnosis};
use crate::model::{
    Bill, LineItem, NewVisit, Patient, PatientDraft, Room, RoomAssignment, Visit, VisitDetails,
    VisitStatus,
};
use crate::pool::RoomPool;
use crate::snapshot::{SnapshotError, WardSnapshot};
use crate::store::{MemoryStore, RecordStore, StoreError};
use crate::WardError;
use std::sync::Arc;
use tracing::{info, warn};
use ward_auth::{
    AccessGate, AccessLogEntry, AccessRequest, AuditLog, AuditSink, Capability,
    CapabilityRegistry,
};
use ward_types::{AgentRole, PatientId, VisitId};

/// Line item name used for the consultation fee.
pub const CONSULTATION_FEE_ITEM: &str = "Consultation Fee";

/// Capability-checked façade over the store, the room pool and the
/// diagnosis model.
///
/// `Orchestrator` is `Send + Sync`; share one instance behind an `Arc`.
///
/// # Example
///
/// ```
/// use ward_runtime::model::{NewVisit, PatientDraft};
/// use ward_runtime::Orchestrator;
///
/// let orch = Orchestrator::from_config(&Default::default())?;
/// let patient = orch.register_patient(PatientDraft::new("Asha", "555-0100"))?;
/// let visit = orch.create_visit(NewVisit {
///     patient_id: patient.id,
///     demographics: patient.demographics.clone(),
///     symptoms: "fever and cough".into(),
/// })?;
/// let visit = orch.run_diagnosis(visit.id)?;
/// assert!(visit.diagnosis.is_some());
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Orchestrator {
    gate: AccessGate,
    store: Arc<dyn RecordStore>,
    pool: Arc<RoomPool>,
    diagnosis: Arc<dyn DiagnosisModel>,
}

impl Orchestrator {
    /// Starts a builder with the standard registry, an empty in-memory
    /// store, an empty pool and the rule-based diagnosis model.
    #[must_use]
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Fresh state from configuration: registry, seeded rooms, empty
    /// records and audit log.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an invalid permission table or room seed.
    pub fn from_config(config: &WardConfig) -> Result<Self, ConfigError> {
        Ok(Self::builder()
            .registry(config.registry()?)
            .pool(config.room_pool()?)
            .build())
    }

    /// Rebuilds state from a snapshot.
    ///
    /// Permissions always come from `config`, never from the file. An
    /// empty room list in the snapshot is seeded from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] if the records or rooms are inconsistent
    /// or the config is invalid.
    pub fn restore(snapshot: WardSnapshot, config: &WardConfig) -> Result<Self, SnapshotError> {
        let pool = if snapshot.rooms.is_empty() {
            config.room_pool()?
        } else {
            RoomPool::from_rooms(snapshot.rooms)?
        };
        let orch = Self::builder()
            .registry(config.registry()?)
            .store(MemoryStore::from_records(snapshot.records)?)
            .pool(pool)
            .audit(Arc::new(AuditLog::from_entries(snapshot.audit)))
            .build();
        info!(
            rooms = orch.pool.len(),
            audit_entries = orch.gate.audit().len(),
            "state restored"
        );
        Ok(orch)
    }

    /// Exports the full state. Not gated: persistence is an embedding
    /// concern, not an agent action.
    #[must_use]
    pub fn snapshot(&self) -> WardSnapshot {
        WardSnapshot::new(self.store.export(), self.pool.rooms(), self.gate.audit().entries())
    }

    /// The audit sink every check writes to.
    #[must_use]
    pub fn audit(&self) -> &Arc<dyn AuditSink> {
        self.gate.audit()
    }

    /// The room pool. Read-only inspection for callers and tests.
    #[must_use]
    pub fn pool(&self) -> &RoomPool {
        &self.pool
    }

    // === Intake ===

    /// Looks up by exact phone first, then by most recent exact name.
    ///
    /// A miss is `Ok(None)`, not an error.
    ///
    /// # Errors
    ///
    /// [`WardError::PermissionDenied`] if the check fails.
    pub fn find_patient(&self, name: &str, phone: &str) -> Result<Option<Patient>, WardError> {
        self.guard(
            AccessRequest::new(AgentRole::Intake, Capability::IDENTITY_READ)
                .on("patient")
                .note("find_patient"),
        )?;

        let phone = phone.trim();
        if !phone.is_empty() {
            if let Some(patient) = self.store.find_patient_by_phone(phone) {
                return Ok(Some(patient));
            }
        }
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }
        Ok(self.store.find_latest_patient_by_name(name))
    }

    /// Inserts a patient or updates the one holding the same phone.
    ///
    /// # Errors
    ///
    /// [`WardError::PermissionDenied`] if the check fails,
    /// [`WardError::InvalidInput`] for a blank name or phone.
    pub fn register_patient(&self, draft: PatientDraft) -> Result<Patient, WardError> {
        self.guard(
            AccessRequest::new(AgentRole::Intake, Capability::IDENTITY_WRITE)
                .on("patient")
                .note("register_patient"),
        )?;

        let draft = PatientDraft {
            name: draft.name.trim().to_string(),
            phone: draft.phone.trim().to_string(),
            demographics: draft.demographics,
        };
        if draft.name.is_empty() {
            return Err(WardError::InvalidInput { field: "name" });
        }
        if draft.phone.is_empty() {
            return Err(WardError::InvalidInput { field: "phone" });
        }

        let patient = self.store.upsert_patient_by_phone(&draft);
        info!(patient = %patient.id, "patient registered");
        Ok(patient)
    }

    /// Opens an ongoing visit with no diagnosis and no room.
    ///
    /// # Errors
    ///
    /// [`WardError::PermissionDenied`] if the check fails,
    /// [`WardError::InvalidReference`] if the patient does not exist.
    pub fn create_visit(&self, visit: NewVisit) -> Result<Visit, WardError> {
        self.guard(
            AccessRequest::new(AgentRole::Intake, Capability::CREATE_VISIT)
                .on("patient")
                .id(visit.patient_id)
                .note("create_visit"),
        )?;

        if self.store.get_patient(visit.patient_id).is_none() {
            return Err(WardError::InvalidReference { field: "patient_id" });
        }
        let visit = self.store.create_visit(visit).map_err(|e| match e {
            StoreError::NotFound { .. } => WardError::InvalidReference { field: "patient_id" },
            other => other.into(),
        })?;
        info!(visit = %visit.id, patient = %visit.patient_id, "visit created");
        Ok(visit)
    }

    // === Diagnosis ===

    /// Runs the diagnosis model on the visit's de-identified snapshot.
    ///
    /// Diagnosis is written once; a diagnosed or completed visit is
    /// rejected.
    ///
    /// # Errors
    ///
    /// [`WardError::PermissionDenied`], [`WardError::NotFound`] or
    /// [`WardError::InvalidState`].
    pub fn run_diagnosis(&self, visit_id: VisitId) -> Result<Visit, WardError> {
        self.guard(
            AccessRequest::new(AgentRole::Diagnosis, Capability::VISIT_READ_ANONYMIZED)
                .on("visit")
                .id(visit_id)
                .note("run_diagnosis"),
        )?;

        let visit = self.load_visit(visit_id)?;
        if !visit.is_ongoing() {
            return Err(WardError::invalid_state(visit_id, "visit is completed"));
        }
        if visit.diagnosis.is_some() {
            return Err(WardError::invalid_state(visit_id, "visit is already diagnosed"));
        }

        let diagnosis = self.diagnosis.predict(&ClinicalSnapshot::from_visit(&visit));
        info!(visit = %visit_id, severity = %diagnosis.severity, "diagnosis recorded");
        Ok(self.store.update_visit_diagnosis(visit_id, diagnosis)?)
    }

    // === Rooms ===

    /// Gives the visit's patient the first free room.
    ///
    /// Both `room_read` and `room_write` are checked and logged. The room
    /// is recorded on the visit with a conditional claim; if another call
    /// got there first, the acquired room goes straight back to the pool.
    ///
    /// # Errors
    ///
    /// [`WardError::PermissionDenied`], [`WardError::NotFound`],
    /// [`WardError::InvalidState`] for a completed visit or one that
    /// already holds a room, [`WardError::ResourceUnavailable`] when
    /// every room is occupied.
    pub fn assign_room(&self, visit_id: VisitId) -> Result<RoomAssignment, WardError> {
        for action in [Capability::ROOM_READ, Capability::ROOM_WRITE] {
            self.guard(
                AccessRequest::new(AgentRole::Room, action)
                    .on("visit")
                    .id(visit_id)
                    .note("assign_room"),
            )?;
        }

        let visit = self.load_visit(visit_id)?;
        if !visit.is_ongoing() {
            return Err(WardError::invalid_state(visit_id, "visit is completed"));
        }
        if visit.allocated_room.is_some() {
            return Err(WardError::invalid_state(visit_id, "visit already holds a room"));
        }

        let Some(room) = self.pool.acquire_first_free(visit.patient_id) else {
            warn!(visit = %visit_id, "no free room");
            return Err(WardError::ResourceUnavailable { resource: "room" });
        };

        match self.store.claim_visit_room(visit_id, room.number.clone()) {
            Ok(visit) => {
                info!(visit = %visit_id, room = %room.number, "room assigned");
                Ok(RoomAssignment { room, visit })
            }
            Err(e) => {
                self.pool.release(&room.number);
                Err(e.into())
            }
        }
    }

    /// Current state of every room, in allocation order.
    ///
    /// # Errors
    ///
    /// [`WardError::PermissionDenied`] if the check fails.
    pub fn list_rooms(&self) -> Result<Vec<Room>, WardError> {
        self.guard(
            AccessRequest::new(AgentRole::Room, Capability::ROOM_READ)
                .on("room")
                .note("list_rooms"),
        )?;
        Ok(self.pool.rooms())
    }

    /// Frees every room without looking at visits.
    ///
    /// A visit may still name a room afterwards; nothing reconciles it.
    /// Returns how many rooms were occupied.
    ///
    /// # Errors
    ///
    /// [`WardError::PermissionDenied`] if the check fails.
    pub fn reset_all_rooms(&self) -> Result<usize, WardError> {
        self.guard(
            AccessRequest::new(AgentRole::Room, Capability::ROOM_WRITE)
                .on("room")
                .note("reset_all_rooms"),
        )?;
        let freed = self.pool.reset_all();
        if freed > 0 {
            warn!(freed, "all rooms reset; visits may still reference freed rooms");
        }
        Ok(freed)
    }

    // === Completion ===

    /// Ends the visit without a bill, releasing its room.
    ///
    /// # Errors
    ///
    /// [`WardError::PermissionDenied`], [`WardError::NotFound`] or
    /// [`WardError::InvalidState`] if already completed.
    pub fn complete_visit(&self, visit_id: VisitId) -> Result<Visit, WardError> {
        self.guard(
            AccessRequest::new(AgentRole::Records, Capability::VISIT_WRITE)
                .on("visit")
                .id(visit_id)
                .note("complete_visit"),
        )?;
        let visit = self.load_visit(visit_id)?;
        if !visit.is_ongoing() {
            return Err(WardError::invalid_state(visit_id, "visit is already completed"));
        }
        self.finish(visit)
    }

    /// Issues the visit's bill and completes the visit.
    ///
    /// # Errors
    ///
    /// [`WardError::PermissionDenied`], [`WardError::InvalidInput`] for a
    /// negative or non-finite fee, [`WardError::NotFound`], or
    /// [`WardError::InvalidState`] if already completed.
    pub fn generate_bill(
        &self,
        visit_id: VisitId,
        consultation_fee: f64,
    ) -> Result<Bill, WardError> {
        self.guard(
            AccessRequest::new(AgentRole::Billing, Capability::BILLING_CREATE)
                .on("visit")
                .id(visit_id)
                .note("generate_bill"),
        )?;

        if !consultation_fee.is_finite() || consultation_fee < 0.0 {
            return Err(WardError::InvalidInput { field: "consultation_fee" });
        }
        let visit = self.load_visit(visit_id)?;
        if !visit.is_ongoing() {
            return Err(WardError::invalid_state(visit_id, "visit is already completed"));
        }

        let bill = self
            .store
            .create_bill(visit_id, vec![LineItem::new(CONSULTATION_FEE_ITEM, consultation_fee)])?;
        info!(visit = %visit_id, bill = %bill.id, total = bill.total, "bill issued");
        self.finish(visit)?;
        Ok(bill)
    }

    // === Records ===

    /// # Errors
    ///
    /// [`WardError::PermissionDenied`] or [`WardError::NotFound`].
    pub fn get_visit(&self, visit_id: VisitId) -> Result<Visit, WardError> {
        self.guard(
            AccessRequest::new(AgentRole::Records, Capability::VISIT_READ)
                .on("visit")
                .id(visit_id)
                .note("get_visit"),
        )?;
        self.load_visit(visit_id)
    }

    /// The visit joined with its patient and bill.
    ///
    /// # Errors
    ///
    /// [`WardError::PermissionDenied`] or [`WardError::NotFound`].
    pub fn visit_details(&self, visit_id: VisitId) -> Result<VisitDetails, WardError> {
        self.guard(
            AccessRequest::new(AgentRole::Records, Capability::VISIT_READ)
                .on("visit")
                .id(visit_id)
                .note("visit_details"),
        )?;
        let visit = self.load_visit(visit_id)?;
        let patient = self.load_patient(visit.patient_id)?;
        let bill = self.store.bill_for_visit(visit_id);
        Ok(VisitDetails {
            visit,
            patient,
            bill,
        })
    }

    /// Every patient, newest first.
    ///
    /// # Errors
    ///
    /// [`WardError::PermissionDenied`] if the check fails.
    pub fn list_patients(&self) -> Result<Vec<Patient>, WardError> {
        self.guard(
            AccessRequest::new(AgentRole::Records, Capability::PATIENT_READ)
                .on("patient")
                .note("list_patients"),
        )?;
        Ok(self.store.list_patients())
    }

    // === Security ===

    /// Up to `limit` audit entries, newest first. This call's own check
    /// is the first entry returned.
    ///
    /// # Errors
    ///
    /// [`WardError::PermissionDenied`] if the check fails.
    pub fn security_logs(&self, limit: usize) -> Result<Vec<AccessLogEntry>, WardError> {
        self.guard(
            AccessRequest::new(AgentRole::Security, Capability::LOGS_READ)
                .on("audit_log")
                .note("security_logs"),
        )?;
        Ok(self.gate.audit().list_recent(limit))
    }

    fn guard(&self, request: AccessRequest) -> Result<(), WardError> {
        Ok(self.gate.require(&request)?)
    }

    fn load_visit(&self, id: VisitId) -> Result<Visit, WardError> {
        self.store
            .get_visit(id)
            .ok_or_else(|| WardError::not_found("visit", id))
    }

    fn load_patient(&self, id: PatientId) -> Result<Patient, WardError> {
        self.store
            .get_patient(id)
            .ok_or_else(|| WardError::not_found("patient", id))
    }

    /// Releases the room, clears it from the visit and marks it completed.
    fn finish(&self, visit: Visit) -> Result<Visit, WardError> {
        if let Some(room) = &visit.allocated_room {
            self.pool.release(room);
            self.store.update_visit_room(visit.id, None)?;
        }
        let visit = self.store.set_visit_status(visit.id, VisitStatus::Completed)?;
        info!(visit = %visit.id, "visit completed");
        Ok(visit)
    }
}

/// Builder for [`Orchestrator`].
///
/// ```
/// use std::sync::Arc;
/// use ward_auth::{AuditLog, CapabilityRegistry};
/// use ward_runtime::pool::{RoomPool, RoomSeed};
/// use ward_runtime::Orchestrator;
///
/// let orch = Orchestrator::builder()
///     .registry(CapabilityRegistry::standard())
///     .pool(RoomPool::seed(&[RoomSeed::new("1", "Dr. Nair")])?)
///     .audit(Arc::new(AuditLog::new()))
///     .build();
/// assert_eq!(orch.pool().len(), 1);
/// # Ok::<(), ward_runtime::pool::PoolError>(())
/// ```
#[derive(Debug, Default)]
pub struct OrchestratorBuilder {
    registry: Option<CapabilityRegistry>,
    audit: Option<Arc<dyn AuditSink>>,
    store: Option<Arc<dyn RecordStore>>,
    pool: Option<RoomPool>,
    diagnosis: Option<Arc<dyn DiagnosisModel>>,
}

impl OrchestratorBuilder {
    #[must_use]
    pub fn registry(mut self, registry: CapabilityRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    #[must_use]
    pub fn store(mut self, store: impl RecordStore + 'static) -> Self {
        self.store = Some(Arc::new(store));
        self
    }

    #[must_use]
    pub fn pool(mut self, pool: RoomPool) -> Self {
        self.pool = Some(pool);
        self
    }

    #[must_use]
    pub fn diagnosis(mut self, model: impl DiagnosisModel + 'static) -> Self {
        self.diagnosis = Some(Arc::new(model));
        self
    }

    #[must_use]
    pub fn build(self) -> Orchestrator {
        let registry = self.registry.unwrap_or_else(CapabilityRegistry::standard);
        let audit = self.audit.unwrap_or_else(|| Arc::new(AuditLog::new()));
        Orchestrator {
            gate: AccessGate::new(registry, audit),
            store: self.store.unwrap_or_else(|| Arc::new(MemoryStore::new())),
            pool: Arc::new(self.pool.unwrap_or_else(RoomPool::empty)),
            diagnosis: self
                .diagnosis
                .unwrap_or_else(|| Arc::new(RuleBasedDiagnosis)),
        }
    }
}
