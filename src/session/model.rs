//! Core data types for a group discussion session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a session.
///
/// Transitions flow one way: `Initialized -> InProgress -> Completed`. There
/// is no pause/resume and no timeout-driven transition; elapsed time is read
/// by callers to decide on candidate injection, never by the engine itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    /// Created, participants seeded, discussion not started.
    Initialized,
    /// Topic announced, turns being exchanged.
    InProgress,
    /// Closed and evaluated.
    Completed,
}

impl SessionStatus {
    /// Returns the wire representation of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Initialized => "initialized",
            SessionStatus::InProgress => "in_progress",
            SessionStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A participant in a group discussion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Sequential identifier within the session ("p0", "p1", ...).
    pub id: String,
    /// Display name. Uniqueness is caller discipline; a duplicate name
    /// silently shadows the earlier participant's metrics slot.
    pub name: String,
    /// Whether this participant is the human user.
    pub is_human: bool,
    /// When the participant joined the session.
    pub join_time: DateTime<Utc>,
}

/// One entry in the discussion transcript.
///
/// The transcript is append-only: entry order is insertion order is
/// conversation order, and entries are never reordered or removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscriptEntry {
    /// Display name of the speaker.
    pub participant: String,
    /// What was said.
    pub text: String,
    /// RFC 3339 timestamp supplied by the caller or recorded at append time.
    pub timestamp: String,
}

/// Participation metrics for one participant, updated on every tracked
/// message and never decreasing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParticipationMetrics {
    /// Every tracked message text, in order.
    pub messages: Vec<String>,
    /// Seconds from session start to this participant's first tracked
    /// message. Set exactly once; `None` until they first speak.
    pub entry_time: Option<f64>,
    /// Number of tracked messages.
    pub speaking_count: u32,
    /// Cumulative whitespace-delimited token count across tracked messages.
    pub word_count: u32,
}

impl ParticipationMetrics {
    /// Records one message: appends the text, bumps the speaking and word
    /// counts, and pins the entry time on the first call.
    pub fn record(&mut self, text: &str, elapsed: f64) {
        self.messages.push(text.to_string());
        self.speaking_count += 1;
        self.word_count += text.split_whitespace().count() as u32;

        if self.entry_time.is_none() {
            self.entry_time = Some(elapsed);
        }
    }
}
