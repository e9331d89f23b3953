//! Typed clinical records.
//!
//! Optional fields are `Option` throughout so that "absent" is never
//! confused with "zero" or "empty" when patient demographics are merged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ward_types::{BillId, PatientId, VisitId};

/// Optional demographic fields shared by patients and visit snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Demographics {
    pub age: Option<u32>,
    pub gender: Option<String>,
    /// Centimetres.
    pub height: Option<f64>,
    /// Kilograms.
    pub weight: Option<f64>,
}

impl Demographics {
    /// Overwrites every field that is present in `newer`; keeps the rest.
    ///
    /// ```
    /// use ward_runtime::model::Demographics;
    ///
    /// let mut stored = Demographics {
    ///     age: Some(30),
    ///     gender: Some("F".into()),
    ///     ..Default::default()
    /// };
    /// stored.merge(&Demographics { age: Some(31), ..Default::default() });
    /// assert_eq!(stored.age, Some(31));
    /// assert_eq!(stored.gender.as_deref(), Some("F"));
    /// ```
    pub fn merge(&mut self, newer: &Self) {
        if newer.age.is_some() {
            self.age = newer.age;
        }
        if newer.gender.is_some() {
            self.gender.clone_from(&newer.gender);
        }
        if newer.height.is_some() {
            self.height = newer.height;
        }
        if newer.weight.is_some() {
            self.weight = newer.weight;
        }
    }
}

/// A registered patient. Unique by `phone`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: PatientId,
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub demographics: Demographics,
}

/// Registration input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientDraft {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub demographics: Demographics,
}

impl PatientDraft {
    /// A draft with no demographics.
    pub fn new(name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phone: phone.into(),
            demographics: Demographics::default(),
        }
    }

    /// Attaches demographics.
    #[must_use]
    pub fn with_demographics(mut self, demographics: Demographics) -> Self {
        self.demographics = demographics;
        self
    }
}

/// Visit lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisitStatus {
    Ongoing,
    Completed,
}

impl std::fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ongoing => f.write_str("ongoing"),
            Self::Completed => f.write_str("completed"),
        }
    }
}

/// Bounded diagnosis-risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Parses `low` / `medium` / `high` (case-insensitive).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Finding and severity written onto a visit by the diagnosis step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub finding: String,
    pub severity: Severity,
}

/// One clinical encounter.
///
/// `demographics` is a copy taken at creation; later patient edits do not
/// reach it. `allocated_room` is only set while the visit is ongoing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visit {
    pub id: VisitId,
    pub patient_id: PatientId,
    pub symptoms: String,
    #[serde(default)]
    pub demographics: Demographics,
    pub diagnosis: Option<Diagnosis>,
    pub allocated_room: Option<String>,
    pub status: VisitStatus,
}

impl Visit {
    #[must_use]
    pub fn is_ongoing(&self) -> bool {
        self.status == VisitStatus::Ongoing
    }
}

/// Visit creation input.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVisit {
    pub patient_id: PatientId,
    pub demographics: Demographics,
    pub symptoms: String,
}

/// Room occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Free,
    Occupied,
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Free => f.write_str("free"),
            Self::Occupied => f.write_str("occupied"),
        }
    }
}

/// A physical room. `occupant` is `Some` exactly when `status` is occupied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub number: String,
    pub staff: String,
    pub status: RoomStatus,
    pub occupant: Option<PatientId>,
}

impl Room {
    /// A free room.
    pub fn free(number: impl Into<String>, staff: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            staff: staff.into(),
            status: RoomStatus::Free,
            occupant: None,
        }
    }

    #[must_use]
    pub fn is_free(&self) -> bool {
        self.status == RoomStatus::Free
    }
}

/// One bill line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub item: String,
    pub amount: f64,
}

impl LineItem {
    pub fn new(item: impl Into<String>, amount: f64) -> Self {
        Self {
            item: item.into(),
            amount,
        }
    }
}

/// An issued bill. Never amended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    pub visit_id: VisitId,
    pub items: Vec<LineItem>,
    pub total: f64,
    pub created_at: DateTime<Utc>,
}

/// Result of a successful room assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomAssignment {
    pub room: Room,
    pub visit: Visit,
}

/// A visit joined with its patient and bill, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisitDetails {
    pub visit: Visit,
    pub patient: Patient,
    pub bill: Option<Bill>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_keeps_absent_fields() {
        let mut stored = Demographics {
            age: Some(40),
            gender: Some("M".into()),
            height: Some(170.0),
            weight: Some(70.0),
        };
        stored.merge(&Demographics {
            weight: Some(68.5),
            ..Default::default()
        });
        assert_eq!(stored.age, Some(40));
        assert_eq!(stored.gender.as_deref(), Some("M"));
        assert_eq!(stored.height, Some(170.0));
        assert_eq!(stored.weight, Some(68.5));
    }

    #[test]
    fn severity_parse_and_display() {
        assert_eq!(Severity::parse("MEDIUM"), Some(Severity::Medium));
        assert_eq!(Severity::parse("critical"), None);
        assert_eq!(Severity::High.to_string(), "high");
        assert!(Severity::Low < Severity::High);
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&VisitStatus::Completed).expect("serialize");
        assert_eq!(json, "\"completed\"");
        let json = serde_json::to_string(&RoomStatus::Occupied).expect("serialize");
        assert_eq!(json, "\"occupied\"");
    }

    #[test]
    fn free_room_has_no_occupant() {
        let room = Room::free("101", "Dr. Rao");
        assert!(room.is_free());
        assert!(room.occupant.is_none());
    }
}
