//! Fixed pool of allocatable rooms.
//!
//! The pool is the single owner of room state. Every operation takes the
//! same mutex, so scanning for a free room and marking it occupied is one
//! critical section and two callers can never receive the same room.
//!
//! Allocation order is the seed order: the first free room in the order
//! rooms were seeded is always the one handed out.

use crate::model::{Room, RoomStatus};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use ward_types::{ErrorCode, PatientId};

/// Seed entry for one room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSeed {
    pub number: String,
    pub staff: String,
}

impl RoomSeed {
    pub fn new(number: impl Into<String>, staff: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            staff: staff.into(),
        }
    }
}

/// Invalid pool seed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Two seed entries share a room number.
    #[error("duplicate room number '{0}' in seed")]
    DuplicateRoom(String),

    /// A seed entry has a blank room number.
    #[error("room number must not be empty")]
    EmptyRoomNumber,
}

impl ErrorCode for PoolError {
    fn code(&self) -> &'static str {
        match self {
            Self::DuplicateRoom(_) => "POOL_DUPLICATE_ROOM",
            Self::EmptyRoomNumber => "POOL_EMPTY_ROOM_NUMBER",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Mutex-guarded room set.
///
/// # Example
///
/// ```
/// use ward_runtime::pool::{RoomPool, RoomSeed};
/// use ward_types::PatientId;
///
/// let pool = RoomPool::seed(&[RoomSeed::new("101", "Dr. Rao"), RoomSeed::new("102", "Dr. Sen")])?;
///
/// let first = pool.acquire_first_free(PatientId::new(1)).expect("room free");
/// assert_eq!(first.number, "101");
///
/// pool.release("101");
/// pool.release("101"); // no-op
/// assert_eq!(pool.free_count(), 2);
/// # Ok::<(), ward_runtime::pool::PoolError>(())
/// ```
#[derive(Debug)]
pub struct RoomPool {
    rooms: Mutex<Vec<Room>>,
}

impl RoomPool {
    /// A pool with no rooms; every acquire returns `None`.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rooms: Mutex::new(Vec::new()),
        }
    }

    /// Creates a pool of free rooms in seed order.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError`] for blank or duplicate room numbers.
    pub fn seed(seeds: &[RoomSeed]) -> Result<Self, PoolError> {
        Self::from_rooms(
            seeds
                .iter()
                .map(|s| Room::free(s.number.trim(), s.staff.clone()))
                .collect(),
        )
    }

    /// Restores a pool from stored rooms, keeping their order and state.
    ///
    /// A free room's occupant is cleared; an occupied room without an
    /// occupant is kept occupied.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError`] for blank or duplicate room numbers.
    pub fn from_rooms(mut rooms: Vec<Room>) -> Result<Self, PoolError> {
        let mut seen = HashSet::new();
        for room in &mut rooms {
            if room.number.trim().is_empty() {
                return Err(PoolError::EmptyRoomNumber);
            }
            if !seen.insert(room.number.clone()) {
                return Err(PoolError::DuplicateRoom(room.number.clone()));
            }
            if room.status == RoomStatus::Free {
                room.occupant = None;
            }
        }
        Ok(Self {
            rooms: Mutex::new(rooms),
        })
    }

    /// Marks the first free room occupied by `occupant` and returns it.
    ///
    /// Returns `None` immediately when every room is occupied.
    pub fn acquire_first_free(&self, occupant: PatientId) -> Option<Room> {
        let mut rooms = self.rooms.lock();
        let room = rooms.iter_mut().find(|r| r.is_free())?;
        room.status = RoomStatus::Occupied;
        room.occupant = Some(occupant);
        tracing::debug!(room = %room.number, %occupant, "room acquired");
        Some(room.clone())
    }

    /// Frees `number`. Unknown or already free rooms are left untouched.
    ///
    /// Returns `true` if the room changed state.
    pub fn release(&self, number: &str) -> bool {
        let mut rooms = self.rooms.lock();
        match rooms.iter_mut().find(|r| r.number == number) {
            Some(room) if !room.is_free() => {
                room.status = RoomStatus::Free;
                room.occupant = None;
                tracing::debug!(room = %number, "room released");
                true
            }
            Some(_) => false,
            None => {
                tracing::debug!(room = %number, "release of unknown room ignored");
                false
            }
        }
    }

    /// Frees every room. Returns how many were occupied.
    pub fn reset_all(&self) -> usize {
        let mut rooms = self.rooms.lock();
        let mut freed = 0;
        for room in rooms.iter_mut().filter(|r| !r.is_free()) {
            room.status = RoomStatus::Free;
            room.occupant = None;
            freed += 1;
        }
        freed
    }

    /// Copies the current state of every room, in seed order.
    #[must_use]
    pub fn rooms(&self) -> Vec<Room> {
        self.rooms.lock().clone()
    }

    /// Copies the current state of one room.
    #[must_use]
    pub fn get(&self, number: &str) -> Option<Room> {
        self.rooms.lock().iter().find(|r| r.number == number).cloned()
    }

    #[must_use]
    pub fn free_count(&self) -> usize {
        self.rooms.lock().iter().filter(|r| r.is_free()).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rooms.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rooms.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Barrier};

    fn pool(n: usize) -> RoomPool {
        let seeds: Vec<RoomSeed> = (0..n)
            .map(|i| RoomSeed::new(format!("{}", 101 + i), format!("Dr. {i}")))
            .collect();
        RoomPool::seed(&seeds).expect("valid seed")
    }

    #[test]
    fn sequential_acquire_is_ascending_then_none() {
        let pool = pool(3);
        let numbers: Vec<String> = (1..=3)
            .map(|i| pool.acquire_first_free(PatientId::new(i)).expect("free").number)
            .collect();
        assert_eq!(numbers, vec!["101", "102", "103"]);
        assert!(pool.acquire_first_free(PatientId::new(4)).is_none());
    }

    #[test]
    fn released_lowest_room_is_reused() {
        let pool = pool(3);
        for i in 1..=3 {
            pool.acquire_first_free(PatientId::new(i));
        }
        assert!(pool.release("102"));
        let room = pool.acquire_first_free(PatientId::new(9)).expect("room 102 free");
        assert_eq!(room.number, "102");
        assert_eq!(room.occupant, Some(PatientId::new(9)));
    }

    #[test]
    fn release_is_idempotent() {
        let pool = pool(2);
        pool.acquire_first_free(PatientId::new(1));
        assert!(pool.release("101"));
        let after_first = pool.rooms();
        assert!(!pool.release("101"));
        assert!(!pool.release("999"));
        assert_eq!(pool.rooms(), after_first);
    }

    #[test]
    fn reset_all_frees_everything() {
        let pool = pool(3);
        pool.acquire_first_free(PatientId::new(1));
        pool.acquire_first_free(PatientId::new(2));
        assert_eq!(pool.reset_all(), 2);
        assert_eq!(pool.free_count(), 3);
        assert!(pool.rooms().iter().all(|r| r.occupant.is_none()));
        assert_eq!(pool.reset_all(), 0);
    }

    #[test]
    fn seed_rejects_duplicates_and_blanks() {
        let dup = RoomPool::seed(&[RoomSeed::new("1", "a"), RoomSeed::new("1", "b")]);
        assert_eq!(dup.expect_err("duplicate"), PoolError::DuplicateRoom("1".into()));
        let blank = RoomPool::seed(&[RoomSeed::new("  ", "a")]);
        assert_eq!(blank.expect_err("blank"), PoolError::EmptyRoomNumber);
    }

    #[test]
    fn from_rooms_keeps_order_and_state() {
        let mut occupied = Room::free("201", "Dr. A");
        occupied.status = RoomStatus::Occupied;
        occupied.occupant = Some(PatientId::new(5));
        let pool = RoomPool::from_rooms(vec![occupied, Room::free("200", "Dr. B")]).expect("valid");
        let room = pool.acquire_first_free(PatientId::new(6)).expect("one free");
        assert_eq!(room.number, "200");
        assert_eq!(pool.get("201").and_then(|r| r.occupant), Some(PatientId::new(5)));
    }

    #[test]
    fn concurrent_acquire_never_double_assigns() {
        let pool = Arc::new(pool(4));
        let barrier = Arc::new(Barrier::new(16));
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let pool = Arc::clone(&pool);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    barrier.wait();
                    pool.acquire_first_free(PatientId::new(i))
                })
            })
            .collect();

        let granted: Vec<Room> = handles
            .into_iter()
            .filter_map(|h| h.join().expect("thread"))
            .collect();
        assert_eq!(granted.len(), 4);
        let unique: HashSet<_> = granted.iter().map(|r| r.number.clone()).collect();
        assert_eq!(unique.len(), 4);
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn error_codes() {
        ward_types::assert_error_codes(
            &[PoolError::DuplicateRoom("x".into()), PoolError::EmptyRoomNumber],
            "POOL_",
        );
    }
}
