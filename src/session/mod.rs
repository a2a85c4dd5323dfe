//! Session management for gd-sim.
//!
//! A session owns one group discussion: its participants, transcript,
//! participation metrics and lifecycle status. The [`engine`] module runs the
//! turn-taking loop for a single session; the [`store`] module owns the
//! process-wide table of live sessions and exposes the boundary operations a
//! caller (CLI, front end or test harness) uses.

pub mod engine;
pub mod model;
pub mod store;

pub use engine::{DiscussionClose, DiscussionEngine, DiscussionOpening};
pub use model::{Participant, ParticipationMetrics, SessionStatus, TranscriptEntry};
pub use store::{MessageOutcome, SessionCreated, SessionSnapshot, SessionStore};
