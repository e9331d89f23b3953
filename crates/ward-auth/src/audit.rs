//! Append-only access log.
//!
//! Every capability check, granted or denied, becomes one
//! [`AccessLogEntry`]. Denied entries are the intrusion signal, so the
//! gate never skips the write.
//!
//! # Ordering
//!
//! ```text
//! append(record)
//!   └─ lock
//!        ├─ seq       = previous seq + 1
//!        ├─ timestamp = max(now, previous timestamp)
//!        └─ push_back
//! ```
//!
//! Sequence numbers give a total order even when wall-clock timestamps tie
//! or the clock steps backwards.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Outcome of one capability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    /// The agent holds the action.
    Allowed,
    /// The agent does not hold the action, or is unknown.
    Denied,
}

impl Verdict {
    /// Maps a boolean decision to a verdict.
    #[must_use]
    pub fn from_allowed(allowed: bool) -> Self {
        if allowed {
            Self::Allowed
        } else {
            Self::Denied
        }
    }

    /// Returns `true` for [`Verdict::Allowed`].
    #[must_use]
    pub fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Allowed => f.write_str("ALLOWED"),
            Self::Denied => f.write_str("DENIED"),
        }
    }
}

/// A decision about to be logged. The sink stamps it with `seq` and time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    pub agent: String,
    pub action: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub verdict: Verdict,
    pub note: String,
}

/// One immutable audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessLogEntry {
    /// Position in the log, starting at 1.
    pub seq: u64,
    /// Non-decreasing within one log.
    pub timestamp: DateTime<Utc>,
    /// Calling identity exactly as asserted.
    pub agent: String,
    /// Requested action name.
    pub action: String,
    pub resource_type: Option<String>,
    pub resource_id: Option<String>,
    pub verdict: Verdict,
    pub note: String,
}

/// Destination for access decisions.
///
/// Implementations must keep appends totally ordered and must not drop
/// entries.
pub trait AuditSink: Send + Sync + std::fmt::Debug {
    /// Appends a decision and returns the stored entry.
    fn append(&self, record: AccessRecord) -> AccessLogEntry;

    /// Returns up to `limit` entries, newest first.
    fn list_recent(&self, limit: usize) -> Vec<AccessLogEntry>;

    /// Returns every entry, oldest first.
    fn entries(&self) -> Vec<AccessLogEntry>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    /// Returns `true` if nothing has been logged.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of [`Verdict::Denied`] entries.
    fn denied_count(&self) -> usize {
        self.entries()
            .iter()
            .filter(|e| e.verdict == Verdict::Denied)
            .count()
    }
}

#[derive(Debug, Default)]
struct LogState {
    entries: Vec<AccessLogEntry>,
    last_seq: u64,
    last_timestamp: Option<DateTime<Utc>>,
}

/// Thread-safe in-memory [`AuditSink`].
///
/// # Example
///
/// ```
/// use ward_auth::{AccessRecord, AuditLog, AuditSink, Verdict};
///
/// let log = AuditLog::new();
/// log.append(AccessRecord {
///     agent: "RoomAgent".into(),
///     action: "room_read".into(),
///     resource_type: Some("room".into()),
///     resource_id: None,
///     verdict: Verdict::Allowed,
///     note: "assign_room".into(),
/// });
///
/// let recent = log.list_recent(10);
/// assert_eq!(recent.len(), 1);
/// assert_eq!(recent[0].seq, 1);
/// ```
#[derive(Debug, Default)]
pub struct AuditLog {
    state: Mutex<LogState>,
}

impl AuditLog {
    /// Creates an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a log from previously stored entries (oldest first).
    ///
    /// New appends continue after the highest stored `seq` and never
    /// carry a timestamp earlier than the latest stored one.
    #[must_use]
    pub fn from_entries(mut entries: Vec<AccessLogEntry>) -> Self {
        entries.sort_by_key(|e| e.seq);
        let last_seq = entries.last().map_or(0, |e| e.seq);
        let last_timestamp = entries.iter().map(|e| e.timestamp).max();
        Self {
            state: Mutex::new(LogState {
                entries,
                last_seq,
                last_timestamp,
            }),
        }
    }
}

impl AuditSink for AuditLog {
    fn append(&self, record: AccessRecord) -> AccessLogEntry {
        let mut state = self.state.lock();
        let now = Utc::now();
        let timestamp = match state.last_timestamp {
            Some(prev) if prev > now => prev,
            _ => now,
        };
        state.last_seq += 1;
        state.last_timestamp = Some(timestamp);

        let entry = AccessLogEntry {
            seq: state.last_seq,
            timestamp,
            agent: record.agent,
            action: record.action,
            resource_type: record.resource_type,
            resource_id: record.resource_id,
            verdict: record.verdict,
            note: record.note,
        };
        state.entries.push(entry.clone());
        entry
    }

    fn list_recent(&self, limit: usize) -> Vec<AccessLogEntry> {
        self.state
            .lock()
            .entries
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect()
    }

    fn entries(&self) -> Vec<AccessLogEntry> {
        self.state.lock().entries.clone()
    }

    fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    fn denied_count(&self) -> usize {
        self.state
            .lock()
            .entries
            .iter()
            .filter(|e| e.verdict == Verdict::Denied)
            .count()
    }
}
