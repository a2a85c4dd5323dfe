//! Turn-taking engine for a single group discussion session.
//!
//! The engine owns the transcript, the elapsed-time clock and the policy for
//! selecting which simulated candidates respond to a human message. It drives
//! the moderator at the start and end of the discussion and hands the final
//! state to the evaluator.
//!
//! Transcript appends and metrics tracking are separate calls on purpose:
//! moderator messages are recorded but never metered, so callers invoke the
//! two independently.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::agents::evaluator::{EvaluationReport, EvaluatorAgent};
use crate::agents::moderator::{ModeratorAgent, MODERATOR_NAME};
use crate::agents::{CandidateAgent, Personality};
use crate::config::SimConfig;
use crate::llm::LlmProvider;

use super::model::{Participant, ParticipationMetrics, SessionStatus, TranscriptEntry};

/// Topic reported when a discussion is evaluated before one was announced.
const DEFAULT_TOPIC: &str = "General Discussion";

/// Result of starting a discussion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscussionOpening {
    /// The announced topic.
    pub topic: String,
    /// The moderator's opening announcement.
    pub message: String,
    /// When the discussion clock started.
    pub start_time: DateTime<Utc>,
}

/// Result of ending a discussion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscussionClose {
    /// The moderator's closing line.
    pub closing: String,
    /// Ranked scorecards for all non-moderator participants.
    pub evaluation: EvaluationReport,
}

/// Turn-taking engine for one session.
pub struct DiscussionEngine {
    session_id: String,
    status: SessionStatus,
    topic: Option<String>,
    start_time: Option<DateTime<Utc>>,
    participants: Vec<Participant>,
    transcript: Vec<TranscriptEntry>,
    metrics: HashMap<String, ParticipationMetrics>,
    participant_seq: usize,
    candidates: Vec<CandidateAgent>,
    moderator: ModeratorAgent,
    evaluator: EvaluatorAgent,
    llm_client: Arc<dyn LlmProvider>,
    config: SimConfig,
    rng: ChaCha8Rng,
}

impl std::fmt::Debug for DiscussionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscussionEngine")
            .field("session_id", &self.session_id)
            .field("status", &self.status)
            .field("topic", &self.topic)
            .field("participants", &self.participants.len())
            .field("transcript", &self.transcript.len())
            .finish_non_exhaustive()
    }
}

impl DiscussionEngine {
    /// Creates a new engine for the given session.
    ///
    /// A seed pins every random decision (candidate personalities, responder
    /// selection, pacing jitter) for deterministic tests; `None` seeds from
    /// the OS.
    pub fn new(
        session_id: impl Into<String>,
        llm_client: Arc<dyn LlmProvider>,
        config: SimConfig,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_os_rng(),
        };

        Self {
            session_id: session_id.into(),
            status: SessionStatus::Initialized,
            topic: None,
            start_time: None,
            participants: Vec::new(),
            transcript: Vec::new(),
            metrics: HashMap::new(),
            participant_seq: 0,
            candidates: Vec::new(),
            moderator: ModeratorAgent::new(llm_client.clone(), config.clone()),
            evaluator: EvaluatorAgent::new(llm_client.clone(), config.clone()),
            llm_client,
            config,
            rng,
        }
    }

    /// Returns the session identifier.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Returns the lifecycle status.
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    /// Returns the announced topic, if the discussion has started.
    pub fn topic(&self) -> Option<&str> {
        self.topic.as_deref()
    }

    /// Returns the participant list in join order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Returns the transcript in conversation order.
    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Returns the metrics recorded for a participant, if any.
    pub fn metrics(&self, participant: &str) -> Option<&ParticipationMetrics> {
        self.metrics.get(participant)
    }

    /// Counts the human participants.
    pub fn human_count(&self) -> usize {
        self.participants.iter().filter(|p| p.is_human).count()
    }

    // ------------------------------------------------------------------
    // Participant registry
    // ------------------------------------------------------------------

    /// Registers a participant with a fresh sequential id and zeroed metrics.
    ///
    /// No uniqueness check: registering a duplicate name re-inserts the
    /// metrics slot under that name, silently shadowing the earlier
    /// participant's numbers.
    pub fn add_participant(&mut self, name: &str, is_human: bool) {
        let participant = Participant {
            id: format!("p{}", self.participant_seq),
            name: name.to_string(),
            is_human,
            join_time: Utc::now(),
        };
        self.participants.push(participant);
        self.metrics
            .insert(name.to_string(), ParticipationMetrics::default());
        self.participant_seq += 1;
    }

    /// Adds a simulated candidate with the next ordinal name and a randomly
    /// drawn personality. Returns the candidate's name.
    pub fn add_candidate(&mut self) -> String {
        let ordinal = self.participants.iter().filter(|p| !p.is_human).count() + 1;
        let name = format!("Candidate {}", ordinal);

        let personality = Personality::random(&mut self.rng);
        self.candidates.push(CandidateAgent::new(
            name.clone(),
            personality,
            self.llm_client.clone(),
            self.config.clone(),
        ));

        self.add_participant(&name, false);

        tracing::debug!(
            session_id = %self.session_id,
            candidate = %name,
            personality = %personality,
            "Candidate added"
        );

        name
    }

    // ------------------------------------------------------------------
    // Turn taking
    // ------------------------------------------------------------------

    /// Starts the discussion: the moderator announces a topic and the opening
    /// message is appended to the transcript.
    pub async fn start_discussion(&mut self) -> DiscussionOpening {
        self.status = SessionStatus::InProgress;
        let start_time = Utc::now();
        self.start_time = Some(start_time);

        let announcement = self.moderator.announce_topic().await.into_inner();
        self.topic = Some(announcement.topic.clone());

        let timestamp = Utc::now().to_rfc3339();
        self.record_message(MODERATOR_NAME, &announcement.message, &timestamp);

        tracing::info!(
            session_id = %self.session_id,
            topic = %announcement.topic,
            "Discussion started"
        );

        DiscussionOpening {
            topic: announcement.topic,
            message: announcement.message,
            start_time,
        }
    }

    /// Appends a message to the transcript. Pure append; metrics tracking is
    /// a separate call.
    pub fn record_message(&mut self, participant: &str, text: &str, timestamp: &str) {
        self.transcript.push(TranscriptEntry {
            participant: participant.to_string(),
            text: text.to_string(),
            timestamp: timestamp.to_string(),
        });
    }

    /// Updates participation metrics for a tracked message. Unknown
    /// participant names are silently ignored.
    pub fn track_participation(&mut self, participant: &str, text: &str) {
        let elapsed = self.elapsed_time();
        if let Some(data) = self.metrics.get_mut(participant) {
            data.record(text, elapsed);
        }
    }

    /// Seconds elapsed since the discussion started; 0.0 before the start.
    pub fn elapsed_time(&self) -> f64 {
        match self.start_time {
            Some(start) => (Utc::now() - start).num_milliseconds() as f64 / 1000.0,
            None => 0.0,
        }
    }

    /// Asks a random subset of candidates to reply to the latest human
    /// message.
    ///
    /// Selects a uniform count in `[1, min(max_responders, k)]`, then that
    /// many distinct candidates without replacement. Replies are generated
    /// sequentially, each conditioned on the topic, the trailing transcript
    /// window and the human text; each is recorded, tracked, and followed by
    /// a pacing pause that emulates typing cadence. Returns the replies in
    /// generation order.
    pub async fn generate_candidate_responses(&mut self, human_text: &str) -> Vec<TranscriptEntry> {
        if self.candidates.is_empty() {
            return Vec::new();
        }

        let cap = self.config.max_responders.min(self.candidates.len());
        let count = self.rng.random_range(1..=cap);

        let indices: Vec<usize> = (0..self.candidates.len()).collect();
        let chosen: Vec<usize> = indices
            .choose_multiple(&mut self.rng, count)
            .copied()
            .collect();

        let topic = self
            .topic
            .clone()
            .unwrap_or_else(|| DEFAULT_TOPIC.to_string());

        let mut responses = Vec::with_capacity(count);

        for idx in chosen {
            let window_start = self
                .transcript
                .len()
                .saturating_sub(self.config.history_window);
            let recent = self.transcript[window_start..].to_vec();

            let name = self.candidates[idx].name().to_string();
            let reply = self.candidates[idx]
                .respond(&topic, &recent, human_text)
                .await
                .into_inner();

            let timestamp = Utc::now().to_rfc3339();
            self.record_message(&name, &reply, &timestamp);
            self.track_participation(&name, &reply);

            tracing::debug!(
                session_id = %self.session_id,
                candidate = %name,
                "Candidate replied"
            );

            responses.push(TranscriptEntry {
                participant: name,
                text: reply,
                timestamp,
            });

            self.pacing_pause().await;
        }

        responses
    }

    /// Ends the discussion: the moderator's closing line is appended and the
    /// evaluator scores every non-moderator participant.
    pub async fn end_discussion(&mut self) -> DiscussionClose {
        self.status = SessionStatus::Completed;

        let closing = self.moderator.close_discussion();
        let timestamp = Utc::now().to_rfc3339();
        self.record_message(MODERATOR_NAME, &closing, &timestamp);

        let topic = self
            .topic
            .clone()
            .unwrap_or_else(|| DEFAULT_TOPIC.to_string());

        let evaluation = self
            .evaluator
            .evaluate_all(&self.participants, &self.metrics, &self.transcript, &topic)
            .await;

        tracing::info!(
            session_id = %self.session_id,
            scored = evaluation.rankings.len(),
            "Discussion ended"
        );

        DiscussionClose {
            closing,
            evaluation,
        }
    }

    /// Sleeps for a uniform random duration within the configured pacing
    /// bounds. A zero upper bound disables the pause.
    async fn pacing_pause(&mut self) {
        let min = self.config.pacing_delay_min.as_millis() as u64;
        let max = self.config.pacing_delay_max.as_millis() as u64;
        if max == 0 {
            return;
        }

        let wait = self.rng.random_range(min..=max);
        tokio::time::sleep(Duration::from_millis(wait)).await;
    }
}
