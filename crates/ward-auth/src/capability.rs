//! Action names as a capability set.
//!
//! Every guarded operation names exactly one action. An agent's permission
//! set is a [`Capability`] value; a check passes when the requested action
//! is contained in it.
//!
//! # Example
//!
//! ```
//! use ward_auth::Capability;
//!
//! let intake = Capability::IDENTITY_READ | Capability::IDENTITY_WRITE | Capability::CREATE_VISIT;
//! assert!(intake.contains(Capability::CREATE_VISIT));
//! assert!(!intake.contains(Capability::ROOM_WRITE));
//! assert_eq!(Capability::ROOM_READ.to_string(), "room_read");
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// A set of action names.
    ///
    /// | Flag | Action name | Guards |
    /// |------|-------------|--------|
    /// | [`IDENTITY_READ`](Self::IDENTITY_READ) | `identity_read` | patient lookup |
    /// | [`IDENTITY_WRITE`](Self::IDENTITY_WRITE) | `identity_write` | patient registration |
    /// | [`CREATE_VISIT`](Self::CREATE_VISIT) | `create_visit` | visit creation |
    /// | [`PATIENT_READ`](Self::PATIENT_READ) | `patient_read` | patient listing |
    /// | [`VISIT_READ`](Self::VISIT_READ) | `visit_read` | full visit reads |
    /// | [`VISIT_WRITE`](Self::VISIT_WRITE) | `visit_write` | visit completion |
    /// | [`VISIT_READ_ANONYMIZED`](Self::VISIT_READ_ANONYMIZED) | `visit_read_anonymized` | diagnosis |
    /// | [`ROOM_READ`](Self::ROOM_READ) | `room_read` | room inspection, assignment |
    /// | [`ROOM_WRITE`](Self::ROOM_WRITE) | `room_write` | assignment, reset |
    /// | [`BILLING_CREATE`](Self::BILLING_CREATE) | `billing_create` | bill generation |
    /// | [`BILLING_READ`](Self::BILLING_READ) | `billing_read` | bill reads |
    /// | [`VISIT_BASIC_READ`](Self::VISIT_BASIC_READ) | `visit_basic_read` | billing-side visit reads |
    /// | [`LOGS_READ`](Self::LOGS_READ) | `logs_read` | audit log reads |
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Capability: u16 {
        const IDENTITY_READ         = 1 << 0;
        const IDENTITY_WRITE        = 1 << 1;
        const CREATE_VISIT          = 1 << 2;
        const PATIENT_READ          = 1 << 3;
        const VISIT_READ            = 1 << 4;
        const VISIT_WRITE           = 1 << 5;
        const VISIT_READ_ANONYMIZED = 1 << 6;
        const ROOM_READ             = 1 << 7;
        const ROOM_WRITE            = 1 << 8;
        const BILLING_CREATE        = 1 << 9;
        const BILLING_READ          = 1 << 10;
        const VISIT_BASIC_READ      = 1 << 11;
        const LOGS_READ             = 1 << 12;
    }
}

/// Action name for every single-flag capability, in bit order.
const ACTION_NAMES: [(Capability, &str); 13] = [
    (Capability::IDENTITY_READ, "identity_read"),
    (Capability::IDENTITY_WRITE, "identity_write"),
    (Capability::CREATE_VISIT, "create_visit"),
    (Capability::PATIENT_READ, "patient_read"),
    (Capability::VISIT_READ, "visit_read"),
    (Capability::VISIT_WRITE, "visit_write"),
    (Capability::VISIT_READ_ANONYMIZED, "visit_read_anonymized"),
    (Capability::ROOM_READ, "room_read"),
    (Capability::ROOM_WRITE, "room_write"),
    (Capability::BILLING_CREATE, "billing_create"),
    (Capability::BILLING_READ, "billing_read"),
    (Capability::VISIT_BASIC_READ, "visit_basic_read"),
    (Capability::LOGS_READ, "logs_read"),
];

impl Capability {
    /// Returns the action names contained in this set, in bit order.
    #[must_use]
    pub fn names(self) -> Vec<&'static str> {
        ACTION_NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }

    /// Parses one action name (case-insensitive, `-` accepted for `_`).
    ///
    /// ```
    /// use ward_auth::Capability;
    ///
    /// assert_eq!(Capability::parse("room_write"), Some(Capability::ROOM_WRITE));
    /// assert_eq!(Capability::parse("Billing-Create"), Some(Capability::BILLING_CREATE));
    /// assert_eq!(Capability::parse("drop_tables"), None);
    /// ```
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let normalized = name.trim().to_ascii_lowercase().replace('-', "_");
        ACTION_NAMES
            .iter()
            .find(|(_, n)| *n == normalized)
            .map(|(flag, _)| *flag)
    }

    /// Parses a list of action names into a combined set.
    ///
    /// Returns the set and the names that did not parse; the caller
    /// decides whether unknown names are fatal.
    #[must_use]
    pub fn parse_list<'a, S: AsRef<str>>(names: &'a [S]) -> (Self, Vec<&'a str>) {
        let mut caps = Self::empty();
        let mut unknown = Vec::new();
        for name in names {
            match Self::parse(name.as_ref()) {
                Some(flag) => caps |= flag,
                None => unknown.push(name.as_ref()),
            }
        }
        (caps, unknown)
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names = self.names();
        if names.is_empty() {
            f.write_str("(none)")
        } else {
            f.write_str(&names.join(" | "))
        }
    }
}
