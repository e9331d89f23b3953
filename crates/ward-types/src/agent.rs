//! Agent (caller role) identities.
//!
//! An [`AgentRole`] names the sub-agent on whose behalf an operation runs.
//! It is identity only: what a role may do is decided by the capability
//! registry in `ward-auth`.
//!
//! Identities arrive as asserted strings at the embedding boundary, so the
//! closed enumeration comes with [`AgentRole::parse`]. A string that does
//! not parse is an *unknown agent*, which the access gate denies and logs.

use serde::{Deserialize, Serialize};

/// The asserted role of a caller.
///
/// | Variant | Name | Typical duties |
/// |---------|------|----------------|
/// | `Intake` | `IntakeAgent` | Patient lookup, registration, visit creation |
/// | `Records` | `RecordsAgent` | Visit/patient reads, visit completion |
/// | `Diagnosis` | `DiagnosisAgent` | Anonymized visit reads |
/// | `Room` | `RoomAgent` | Room allocation and release |
/// | `Billing` | `BillingAgent` | Bill creation |
/// | `Security` | `SecurityAgent` | Audit log reads |
///
/// # Example
///
/// ```
/// use ward_types::AgentRole;
///
/// assert_eq!(AgentRole::parse("RoomAgent"), Some(AgentRole::Room));
/// assert_eq!(AgentRole::parse("room"), Some(AgentRole::Room));
/// assert_eq!(AgentRole::parse("JanitorAgent"), None);
/// assert_eq!(AgentRole::Billing.to_string(), "BillingAgent");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AgentRole {
    /// Front-desk identity resolution and visit creation.
    Intake,
    /// Record keeping.
    Records,
    /// Diagnosis; sees only de-identified clinical data.
    Diagnosis,
    /// Room allocation.
    Room,
    /// Billing.
    Billing,
    /// Audit log access.
    Security,
}

impl AgentRole {
    /// Every role, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Intake,
        Self::Records,
        Self::Diagnosis,
        Self::Room,
        Self::Billing,
        Self::Security,
    ];

    /// Returns the canonical identity string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intake => "IntakeAgent",
            Self::Records => "RecordsAgent",
            Self::Diagnosis => "DiagnosisAgent",
            Self::Room => "RoomAgent",
            Self::Billing => "BillingAgent",
            Self::Security => "SecurityAgent",
        }
    }

    /// Parses an asserted identity (case-insensitive).
    ///
    /// Accepts the canonical name (`"IntakeAgent"`) and the short form
    /// without the `Agent` suffix (`"intake"`).
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let lower = name.trim().to_ascii_lowercase();
        let short = lower.strip_suffix("agent").unwrap_or(&lower);
        match short {
            "intake" => Some(Self::Intake),
            "records" => Some(Self::Records),
            "diagnosis" => Some(Self::Diagnosis),
            "room" => Some(Self::Room),
            "billing" => Some(Self::Billing),
            "security" => Some(Self::Security),
            _ => None,
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
