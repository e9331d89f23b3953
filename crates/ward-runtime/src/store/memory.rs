//! In-memory record store.

use super::{RecordSet, RecordStore, StoreError};
use crate::model::{
    Bill, Diagnosis, LineItem, NewVisit, Patient, PatientDraft, Visit, VisitStatus,
};
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use ward_types::{BillId, PatientId, VisitId};

#[derive(Debug, Default)]
struct Tables {
    patients: BTreeMap<PatientId, Patient>,
    by_phone: HashMap<String, PatientId>,
    visits: BTreeMap<VisitId, Visit>,
    bills: BTreeMap<BillId, Bill>,
    bill_by_visit: HashMap<VisitId, BillId>,
    next_patient: u64,
    next_visit: u64,
    next_bill: u64,
}

impl Tables {
    fn visit_mut(&mut self, id: VisitId) -> Result<&mut Visit, StoreError> {
        self.visits
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found("visit", id))
    }
}

/// Store backed by ordered maps under one `RwLock`.
///
/// Ids start at 1 and are never reused. The phone index enforces
/// patient uniqueness by phone.
///
/// # Example
///
/// ```
/// use ward_runtime::model::PatientDraft;
/// use ward_runtime::store::{MemoryStore, RecordStore};
///
/// let store = MemoryStore::new();
/// let first = store.upsert_patient_by_phone(&PatientDraft::new("Asha", "555-0100"));
/// let again = store.upsert_patient_by_phone(&PatientDraft::new("Asha K", "555-0100"));
/// assert_eq!(first.id, again.id);
/// assert_eq!(again.name, "Asha K");
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a store from exported records.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Inconsistent`] on duplicate ids or phones,
    /// visits pointing at unknown patients, or bills pointing at unknown
    /// or already billed visits.
    pub fn from_records(records: RecordSet) -> Result<Self, StoreError> {
        let mut t = Tables::default();

        for patient in records.patients {
            if t.by_phone.insert(patient.phone.clone(), patient.id).is_some() {
                return Err(StoreError::inconsistent(format!(
                    "duplicate phone {}",
                    patient.phone
                )));
            }
            t.next_patient = t.next_patient.max(patient.id.get());
            if t.patients.insert(patient.id, patient).is_some() {
                return Err(StoreError::inconsistent("duplicate patient id"));
            }
        }

        for visit in records.visits {
            if !t.patients.contains_key(&visit.patient_id) {
                return Err(StoreError::inconsistent(format!(
                    "{} references unknown {}",
                    visit.id, visit.patient_id
                )));
            }
            t.next_visit = t.next_visit.max(visit.id.get());
            if t.visits.insert(visit.id, visit).is_some() {
                return Err(StoreError::inconsistent("duplicate visit id"));
            }
        }

        for bill in records.bills {
            if !t.visits.contains_key(&bill.visit_id) {
                return Err(StoreError::inconsistent(format!(
                    "{} references unknown {}",
                    bill.id, bill.visit_id
                )));
            }
            if t.bill_by_visit.insert(bill.visit_id, bill.id).is_some() {
                return Err(StoreError::DuplicateBill(bill.visit_id));
            }
            t.next_bill = t.next_bill.max(bill.id.get());
            if t.bills.insert(bill.id, bill).is_some() {
                return Err(StoreError::inconsistent("duplicate bill id"));
            }
        }

        Ok(Self {
            tables: RwLock::new(t),
        })
    }
}

impl RecordStore for MemoryStore {
    fn get_patient(&self, id: PatientId) -> Option<Patient> {
        self.tables.read().patients.get(&id).cloned()
    }

    fn find_patient_by_phone(&self, phone: &str) -> Option<Patient> {
        let t = self.tables.read();
        t.by_phone.get(phone).and_then(|id| t.patients.get(id)).cloned()
    }

    fn find_latest_patient_by_name(&self, name: &str) -> Option<Patient> {
        self.tables
            .read()
            .patients
            .values()
            .rev()
            .find(|p| p.name == name)
            .cloned()
    }

    fn list_patients(&self) -> Vec<Patient> {
        self.tables.read().patients.values().rev().cloned().collect()
    }

    fn upsert_patient_by_phone(&self, draft: &PatientDraft) -> Patient {
        let mut t = self.tables.write();

        if let Some(id) = t.by_phone.get(&draft.phone).copied() {
            if let Some(existing) = t.patients.get_mut(&id) {
                existing.name.clone_from(&draft.name);
                existing.demographics.merge(&draft.demographics);
                tracing::debug!(patient = %id, "patient updated");
                return existing.clone();
            }
        }

        t.next_patient += 1;
        let id = PatientId::new(t.next_patient);
        let patient = Patient {
            id,
            name: draft.name.clone(),
            phone: draft.phone.clone(),
            demographics: draft.demographics.clone(),
        };
        t.by_phone.insert(draft.phone.clone(), id);
        t.patients.insert(id, patient.clone());
        tracing::debug!(patient = %id, "patient inserted");
        patient
    }

    fn create_visit(&self, visit: NewVisit) -> Result<Visit, StoreError> {
        let mut t = self.tables.write();
        if !t.patients.contains_key(&visit.patient_id) {
            return Err(StoreError::not_found("patient", visit.patient_id));
        }
        t.next_visit += 1;
        let record = Visit {
            id: VisitId::new(t.next_visit),
            patient_id: visit.patient_id,
            symptoms: visit.symptoms,
            demographics: visit.demographics,
            diagnosis: None,
            allocated_room: None,
            status: VisitStatus::Ongoing,
        };
        t.visits.insert(record.id, record.clone());
        Ok(record)
    }

    fn get_visit(&self, id: VisitId) -> Option<Visit> {
        self.tables.read().visits.get(&id).cloned()
    }

    fn update_visit_diagnosis(
        &self,
        id: VisitId,
        diagnosis: Diagnosis,
    ) -> Result<Visit, StoreError> {
        let mut t = self.tables.write();
        let visit = t.visit_mut(id)?;
        visit.diagnosis = Some(diagnosis);
        Ok(visit.clone())
    }

    fn update_visit_room(&self, id: VisitId, room: Option<String>) -> Result<Visit, StoreError> {
        let mut t = self.tables.write();
        let visit = t.visit_mut(id)?;
        visit.allocated_room = room;
        Ok(visit.clone())
    }

    fn claim_visit_room(&self, id: VisitId, room: String) -> Result<Visit, StoreError> {
        let mut t = self.tables.write();
        let visit = t.visit_mut(id)?;
        let reason = if visit.status != VisitStatus::Ongoing {
            Some("visit is completed")
        } else if visit.allocated_room.is_some() {
            Some("visit already holds a room")
        } else {
            None
        };
        if let Some(reason) = reason {
            return Err(StoreError::VisitConflict { visit: id, reason });
        }
        visit.allocated_room = Some(room);
        Ok(visit.clone())
    }

    fn set_visit_status(&self, id: VisitId, status: VisitStatus) -> Result<Visit, StoreError> {
        let mut t = self.tables.write();
        let visit = t.visit_mut(id)?;
        visit.status = status;
        Ok(visit.clone())
    }

    fn create_bill(&self, visit_id: VisitId, items: Vec<LineItem>) -> Result<Bill, StoreError> {
        let mut t = self.tables.write();
        if !t.visits.contains_key(&visit_id) {
            return Err(StoreError::not_found("visit", visit_id));
        }
        if t.bill_by_visit.contains_key(&visit_id) {
            return Err(StoreError::DuplicateBill(visit_id));
        }
        t.next_bill += 1;
        let bill = Bill {
            id: BillId::new(t.next_bill),
            visit_id,
            total: items.iter().map(|i| i.amount).sum(),
            items,
            created_at: Utc::now(),
        };
        t.bill_by_visit.insert(visit_id, bill.id);
        t.bills.insert(bill.id, bill.clone());
        Ok(bill)
    }

    fn bill_for_visit(&self, visit_id: VisitId) -> Option<Bill> {
        let t = self.tables.read();
        t.bill_by_visit.get(&visit_id).and_then(|id| t.bills.get(id)).cloned()
    }

    fn export(&self) -> RecordSet {
        let t = self.tables.read();
        RecordSet {
            patients: t.patients.values().cloned().collect(),
            visits: t.visits.values().cloned().collect(),
            bills: t.bills.values().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Demographics;

    fn store_with_patient() -> (MemoryStore, Patient) {
        let store = MemoryStore::new();
        let patient = store.upsert_patient_by_phone(&PatientDraft::new("Asha", "555-0100"));
        (store, patient)
    }

    fn new_visit(patient_id: PatientId) -> NewVisit {
        NewVisit {
            patient_id,
            demographics: Demographics::default(),
            symptoms: "fever and cough".into(),
        }
    }

    #[test]
    fn ids_start_at_one() {
        let (store, patient) = store_with_patient();
        assert_eq!(patient.id, PatientId::new(1));
        let visit = store.create_visit(new_visit(patient.id)).expect("visit");
        assert_eq!(visit.id, VisitId::new(1));
        assert_eq!(visit.status, VisitStatus::Ongoing);
        assert!(visit.diagnosis.is_none());
        assert!(visit.allocated_room.is_none());
    }

    #[test]
    fn upsert_merges_demographics_and_keeps_one_row() {
        let store = MemoryStore::new();
        let first = store.upsert_patient_by_phone(
            &PatientDraft::new("Asha", "555").with_demographics(Demographics {
                age: Some(30),
                gender: Some("F".into()),
                ..Default::default()
            }),
        );
        let second = store.upsert_patient_by_phone(
            &PatientDraft::new("Asha R", "555").with_demographics(Demographics {
                weight: Some(60.0),
                ..Default::default()
            }),
        );
        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Asha R");
        assert_eq!(second.demographics.age, Some(30));
        assert_eq!(second.demographics.weight, Some(60.0));
        assert_eq!(store.list_patients().len(), 1);
    }

    #[test]
    fn latest_by_name_prefers_highest_id() {
        let store = MemoryStore::new();
        store.upsert_patient_by_phone(&PatientDraft::new("Ravi", "1"));
        let newer = store.upsert_patient_by_phone(&PatientDraft::new("Ravi", "2"));
        assert_eq!(store.find_latest_patient_by_name("Ravi").map(|p| p.id), Some(newer.id));
        assert!(store.find_latest_patient_by_name("ravi").is_none());
    }

    #[test]
    fn list_patients_newest_first() {
        let store = MemoryStore::new();
        store.upsert_patient_by_phone(&PatientDraft::new("A", "1"));
        store.upsert_patient_by_phone(&PatientDraft::new("B", "2"));
        let names: Vec<String> = store.list_patients().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn create_visit_requires_patient() {
        let store = MemoryStore::new();
        let err = store.create_visit(new_visit(PatientId::new(9))).expect_err("no patient");
        assert!(matches!(err, StoreError::NotFound { entity: "patient", .. }));
    }

    #[test]
    fn one_bill_per_visit() {
        let (store, patient) = store_with_patient();
        let visit = store.create_visit(new_visit(patient.id)).expect("visit");
        let bill = store
            .create_bill(visit.id, vec![LineItem::new("Consultation Fee", 500.0)])
            .expect("bill");
        assert_eq!(bill.total, 500.0);
        assert_eq!(store.bill_for_visit(visit.id), Some(bill));
        let err = store
            .create_bill(visit.id, vec![LineItem::new("Consultation Fee", 500.0)])
            .expect_err("second bill");
        assert_eq!(err, StoreError::DuplicateBill(visit.id));
    }

    #[test]
    fn update_room_sets_and_clears() {
        let (store, patient) = store_with_patient();
        let visit = store.create_visit(new_visit(patient.id)).expect("visit");
        let updated = store.update_visit_room(visit.id, Some("101".into())).expect("set");
        assert_eq!(updated.allocated_room.as_deref(), Some("101"));
        let cleared = store.update_visit_room(visit.id, None).expect("clear");
        assert!(cleared.allocated_room.is_none());
        assert!(store.update_visit_room(VisitId::new(42), None).is_err());
    }

    #[test]
    fn claim_room_only_on_free_ongoing_visit() {
        let (store, patient) = store_with_patient();
        let visit = store.create_visit(new_visit(patient.id)).expect("visit");

        let claimed = store.claim_visit_room(visit.id, "101".into()).expect("claim");
        assert_eq!(claimed.allocated_room.as_deref(), Some("101"));

        let err = store.claim_visit_room(visit.id, "102".into()).expect_err("second claim");
        assert!(matches!(
            err,
            StoreError::VisitConflict { reason: "visit already holds a room", .. }
        ));
        assert_eq!(
            store.get_visit(visit.id).and_then(|v| v.allocated_room).as_deref(),
            Some("101")
        );

        store.update_visit_room(visit.id, None).expect("clear");
        store.set_visit_status(visit.id, VisitStatus::Completed).expect("complete");
        let err = store.claim_visit_room(visit.id, "103".into()).expect_err("completed");
        assert!(matches!(err, StoreError::VisitConflict { reason: "visit is completed", .. }));
    }

    #[test]
    fn export_and_restore_continue_ids() {
        let (store, patient) = store_with_patient();
        let visit = store.create_visit(new_visit(patient.id)).expect("visit");
        store
            .create_bill(visit.id, vec![LineItem::new("Consultation Fee", 10.0)])
            .expect("bill");

        let restored = MemoryStore::from_records(store.export()).expect("consistent");
        assert_eq!(restored.export(), store.export());
        let next = restored.upsert_patient_by_phone(&PatientDraft::new("Ravi", "999"));
        assert_eq!(next.id, PatientId::new(2));
        let next_visit = restored.create_visit(new_visit(next.id)).expect("visit");
        assert_eq!(next_visit.id, VisitId::new(2));
    }

    #[test]
    fn restore_rejects_dangling_visit() {
        let records = RecordSet {
            visits: vec![Visit {
                id: VisitId::new(1),
                patient_id: PatientId::new(5),
                symptoms: String::new(),
                demographics: Demographics::default(),
                diagnosis: None,
                allocated_room: None,
                status: VisitStatus::Ongoing,
            }],
            ..Default::default()
        };
        let err = MemoryStore::from_records(records).expect_err("dangling");
        assert!(matches!(err, StoreError::Inconsistent(_)));
    }

    #[test]
    fn concurrent_upserts_same_phone_yield_one_patient() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = std::sync::Arc::clone(&store);
                std::thread::spawn(move || {
                    store.upsert_patient_by_phone(&PatientDraft::new(format!("P{i}"), "555")).id
                })
            })
            .collect();
        let ids: Vec<PatientId> = handles.into_iter().map(|h| h.join().expect("thread")).collect();
        assert!(ids.iter().all(|id| *id == ids[0]));
        assert_eq!(store.list_patients().len(), 1);
    }
}
