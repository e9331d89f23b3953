//! Identifier types for ward records.
//!
//! Record identifiers are sequential integers handed out by the record
//! store, starting at 1. Ordering by id is therefore ordering by creation,
//! which the patient lookup relies on ("most recent exact name match").

use serde::{Deserialize, Serialize};

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            /// Wraps a raw store identifier.
            #[must_use]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            /// Returns the raw store identifier.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }
    };
}

record_id!(
    /// Identifier of a registered patient.
    ///
    /// ```
    /// use ward_types::PatientId;
    ///
    /// let id = PatientId::new(7);
    /// assert_eq!(id.get(), 7);
    /// assert_eq!(id.to_string(), "patient:7");
    /// ```
    PatientId,
    "patient"
);

record_id!(
    /// Identifier of one clinical encounter.
    VisitId,
    "visit"
);

record_id!(
    /// Identifier of an issued bill.
    BillId,
    "bill"
);
