//! Concurrency tests: one orchestrator shared by many threads.

use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use ward_auth::Verdict;
use ward_runtime::model::{Demographics, NewVisit, PatientDraft};
use ward_runtime::pool::{RoomPool, RoomSeed};
use ward_runtime::{Orchestrator, SnapshotFile, WardConfig, WardError};
use ward_types::VisitId;

fn ward(rooms: usize) -> Arc<Orchestrator> {
    let seeds: Vec<RoomSeed> = (0..rooms)
        .map(|i| RoomSeed::new(format!("{}", 201 + i), format!("Dr. {i}")))
        .collect();
    Arc::new(
        Orchestrator::builder()
            .pool(RoomPool::seed(&seeds).expect("seed"))
            .build(),
    )
}

fn admit_many(orch: &Orchestrator, count: usize) -> Vec<VisitId> {
    (0..count)
        .map(|i| {
            let patient = orch
                .register_patient(PatientDraft::new(format!("P{i}"), format!("555-{i:04}")))
                .expect("register");
            orch.create_visit(NewVisit {
                patient_id: patient.id,
                demographics: Demographics::default(),
                symptoms: "cough".into(),
            })
            .expect("visit")
            .id
        })
        .collect()
}

#[test]
fn m_assignments_against_k_rooms() {
    const ROOMS: usize = 4;
    const VISITS: usize = 24;

    let orch = ward(ROOMS);
    let visits = admit_many(&orch, VISITS);
    let barrier = Arc::new(Barrier::new(VISITS));

    let handles: Vec<_> = visits
        .into_iter()
        .map(|visit| {
            let orch = Arc::clone(&orch);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                orch.assign_room(visit)
            })
        })
        .collect();

    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();

    let granted: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    let unavailable = results
        .iter()
        .filter(|r| matches!(r, Err(WardError::ResourceUnavailable { resource: "room" })))
        .count();

    assert_eq!(granted.len(), ROOMS);
    assert_eq!(unavailable, VISITS - ROOMS);

    let rooms: HashSet<&str> = granted.iter().map(|a| a.room.number.as_str()).collect();
    assert_eq!(rooms.len(), ROOMS, "a room was handed out twice");

    let occupants: HashSet<_> = orch.pool().rooms().iter().filter_map(|r| r.occupant).collect();
    assert_eq!(occupants.len(), ROOMS);
    for assignment in &granted {
        assert_eq!(
            assignment.visit.allocated_room.as_deref(),
            Some(assignment.room.number.as_str())
        );
        assert_eq!(
            orch.pool().get(&assignment.room.number).and_then(|r| r.occupant),
            Some(assignment.visit.patient_id)
        );
    }
}

#[test]
fn concurrent_release_and_acquire_keep_pool_consistent() {
    const ROOMS: usize = 3;
    const ROUNDS: usize = 40;

    let orch = ward(ROOMS);
    let visits = admit_many(&orch, ROUNDS);
    let barrier = Arc::new(Barrier::new(ROUNDS));

    let handles: Vec<_> = visits
        .into_iter()
        .map(|visit| {
            let orch = Arc::clone(&orch);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                // Retry until a room frees up, then bill to release it.
                loop {
                    match orch.assign_room(visit) {
                        Ok(_) => break,
                        Err(WardError::ResourceUnavailable { .. }) => thread::yield_now(),
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
                orch.generate_bill(visit, 100.0).expect("bill");
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread panicked");
    }

    assert_eq!(orch.pool().free_count(), ROOMS);
    assert!(orch.pool().rooms().iter().all(|r| r.occupant.is_none()));
}

#[test]
fn racing_assignments_on_one_visit_hold_one_room() {
    const THREADS: usize = 8;

    let orch = ward(THREADS);
    let visit = admit_many(&orch, 1)[0];
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let orch = Arc::clone(&orch);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                orch.assign_room(visit)
            })
        })
        .collect();
    let results: Vec<_> = handles
        .into_iter()
        .map(|h| h.join().expect("thread panicked"))
        .collect();

    let granted: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(granted.len(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, WardError::InvalidState { .. })));

    assert_eq!(orch.pool().free_count(), THREADS - 1);
    let held = orch.get_visit(visit).expect("visit").allocated_room;
    assert_eq!(held.as_deref(), Some(granted[0].room.number.as_str()));
}

#[test]
fn concurrent_checks_each_leave_one_entry() {
    const THREADS: usize = 16;

    let orch = ward(0);
    let barrier = Arc::new(Barrier::new(THREADS));
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let orch = Arc::clone(&orch);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                if i % 2 == 0 {
                    orch.list_rooms().map(|_| ())
                } else {
                    orch.list_patients().map(|_| ())
                }
            })
        })
        .collect();
    for handle in handles {
        let _ = handle.join().expect("thread panicked");
    }

    let entries = orch.audit().entries();
    assert_eq!(entries.len(), THREADS);
    let seqs: HashSet<u64> = entries.iter().map(|e| e.seq).collect();
    assert_eq!(seqs.len(), THREADS);
    assert!(entries.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert!(entries.iter().all(|e| e.verdict == Verdict::Allowed));
}

// ─── Snapshot file shared between writers ─────────────────────────

#[test]
fn locked_snapshot_cycles_lose_no_updates() {
    const WRITERS: usize = 8;

    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("ward.json");
    let config = WardConfig::default();
    let barrier = Arc::new(Barrier::new(WRITERS));

    thread::scope(|s| {
        for i in 0..WRITERS {
            let (path, config, barrier) = (&path, &config, Arc::clone(&barrier));
            s.spawn(move || {
                let file = SnapshotFile::new(path);
                barrier.wait();
                let lock = file.lock().expect("lock");
                let orch = match file.load().expect("load") {
                    Some(snapshot) => Orchestrator::restore(snapshot, config).expect("restore"),
                    None => Orchestrator::from_config(config).expect("fresh"),
                };
                orch.register_patient(PatientDraft::new(format!("W{i}"), format!("555-{i:04}")))
                    .expect("register");
                file.save(&orch.snapshot()).expect("save");
                drop(lock);
            });
        }
    });

    let snapshot = SnapshotFile::new(&path).load().expect("load").expect("present");
    assert_eq!(snapshot.records.patients.len(), WRITERS);
    assert_eq!(snapshot.audit.len(), WRITERS);
    let seqs: HashSet<u64> = snapshot.audit.iter().map(|e| e.seq).collect();
    assert_eq!(seqs.len(), WRITERS);
}
