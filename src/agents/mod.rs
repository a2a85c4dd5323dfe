//! Discussion agents for gd-sim.
//!
//! Three roles talk to the text-generation backend: the moderator announces
//! the topic and closes the round, candidates produce simulated replies, and
//! the evaluator scores every non-moderator participant once the discussion
//! ends. Backend failure never surfaces from any of them: each role carries
//! a canned fallback as a first-class part of its contract, and the
//! [`AgentOutput`] wrapper records which path produced the value.

pub mod candidate;
pub mod evaluator;
pub mod moderator;

pub use candidate::{CandidateAgent, Personality};
pub use evaluator::{EvaluationReport, EvaluatorAgent, PlacementReadiness, Scorecard};
pub use moderator::{ModeratorAgent, TopicAnnouncement, MODERATOR_NAME};

/// Output of an agent interaction with the generation backend.
///
/// `Generated` carries content the backend actually produced; `Fallback`
/// carries the canned substitute used when the backend was unreachable or
/// returned something unparseable. Both variants are valid results; callers
/// that don't care about provenance use [`AgentOutput::into_inner`].
#[derive(Debug, Clone, PartialEq)]
pub enum AgentOutput<T> {
    /// Content parsed from a real backend response.
    Generated(T),
    /// Canned content substituted after a backend or parse failure.
    Fallback(T),
}

impl<T> AgentOutput<T> {
    /// Returns a reference to the inner value regardless of provenance.
    pub fn value(&self) -> &T {
        match self {
            AgentOutput::Generated(v) | AgentOutput::Fallback(v) => v,
        }
    }

    /// Consumes the output, returning the inner value.
    pub fn into_inner(self) -> T {
        match self {
            AgentOutput::Generated(v) | AgentOutput::Fallback(v) => v,
        }
    }

    /// Returns true if this value came from the canned fallback path.
    pub fn is_fallback(&self) -> bool {
        matches!(self, AgentOutput::Fallback(_))
    }
}
