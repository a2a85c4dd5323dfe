//! Process-wide session table and boundary operations.
//!
//! The store replaces a global mutable map with an explicit object handed to
//! every caller. Concurrency discipline: the table itself sits behind an
//! async `RwLock`, and each session is wrapped in its own `Mutex`, so exactly
//! one caller at a time operates on a given session while different sessions
//! proceed independently.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::config::SimConfig;
use crate::error::SessionError;
use crate::llm::LlmProvider;

use super::engine::{DiscussionClose, DiscussionEngine, DiscussionOpening};
use super::model::{Participant, SessionStatus, TranscriptEntry};

/// Name of the human participant seeded into every session.
const HUMAN_NAME: &str = "YOU";

/// Result of creating a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCreated {
    /// The session identifier (supplied or generated).
    pub session_id: String,
    /// Lifecycle status (always `initialized` at creation).
    pub status: SessionStatus,
    /// The seeded participant roster.
    pub participants: Vec<Participant>,
}

/// Result of submitting a human message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageOutcome {
    /// Candidate replies in generation order.
    pub replies: Vec<TranscriptEntry>,
    /// Seconds elapsed since the discussion started.
    pub elapsed_time: f64,
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    /// The session identifier.
    pub session_id: String,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// The announced topic, if the discussion has started.
    pub topic: Option<String>,
    /// Seconds elapsed since the discussion started.
    pub elapsed_time: f64,
    /// Participant roster in join order.
    pub participants: Vec<Participant>,
    /// Full transcript in conversation order.
    pub transcript: Vec<TranscriptEntry>,
}

/// In-memory table of live discussion sessions.
///
/// Sessions exist only in process memory; deleting a session or exiting the
/// process destroys them. Entries are independent of one another.
pub struct SessionStore {
    llm_client: Arc<dyn LlmProvider>,
    config: SimConfig,
    seed: Option<u64>,
    sessions: RwLock<HashMap<String, Arc<Mutex<DiscussionEngine>>>>,
}

impl SessionStore {
    /// Creates an empty store using the given LLM client and configuration.
    pub fn new(llm_client: Arc<dyn LlmProvider>, config: SimConfig) -> Self {
        Self {
            llm_client,
            config,
            seed: None,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Pins the RNG seed used by every session created from this store.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of live sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Looks up the engine handle for a session.
    async fn engine(&self, session_id: &str) -> Result<Arc<Mutex<DiscussionEngine>>, SessionError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    /// Creates a session seeded with the human participant and the configured
    /// number of simulated candidates.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyExists` when an explicit id collides
    /// with a live session.
    pub async fn create_session(
        &self,
        session_id: Option<String>,
    ) -> Result<SessionCreated, SessionError> {
        let session_id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());

        let mut sessions = self.sessions.write().await;
        if sessions.contains_key(&session_id) {
            return Err(SessionError::AlreadyExists(session_id));
        }

        let mut engine = DiscussionEngine::new(
            session_id.clone(),
            self.llm_client.clone(),
            self.config.clone(),
            self.seed,
        );

        engine.add_participant(HUMAN_NAME, true);
        for _ in 0..self.config.seeded_candidates {
            engine.add_candidate();
        }

        let created = SessionCreated {
            session_id: session_id.clone(),
            status: engine.status(),
            participants: engine.participants().to_vec(),
        };

        sessions.insert(session_id.clone(), Arc::new(Mutex::new(engine)));
        tracing::info!(session_id = %session_id, "Session created");

        Ok(created)
    }

    /// Starts the discussion: moderator announces the topic.
    pub async fn start_session(&self, session_id: &str) -> Result<DiscussionOpening, SessionError> {
        let engine = self.engine(session_id).await?;
        let mut engine = engine.lock().await;
        Ok(engine.start_discussion().await)
    }

    /// Submits a human message: records it, meters it, and triggers candidate
    /// replies.
    pub async fn submit_message(
        &self,
        session_id: &str,
        participant: &str,
        text: &str,
        timestamp: &str,
    ) -> Result<MessageOutcome, SessionError> {
        let engine = self.engine(session_id).await?;
        let mut engine = engine.lock().await;

        engine.record_message(participant, text, timestamp);
        engine.track_participation(participant, text);

        let replies = engine.generate_candidate_responses(text).await;

        Ok(MessageOutcome {
            replies,
            elapsed_time: engine.elapsed_time(),
        })
    }

    /// Returns a point-in-time snapshot of a session.
    pub async fn session_status(&self, session_id: &str) -> Result<SessionSnapshot, SessionError> {
        let engine = self.engine(session_id).await?;
        let engine = engine.lock().await;

        Ok(SessionSnapshot {
            session_id: engine.session_id().to_string(),
            status: engine.status(),
            topic: engine.topic().map(str::to_string),
            elapsed_time: engine.elapsed_time(),
            participants: engine.participants().to_vec(),
            transcript: engine.transcript().to_vec(),
        })
    }

    /// Ends the discussion and produces the ranked evaluation report.
    pub async fn end_session(&self, session_id: &str) -> Result<DiscussionClose, SessionError> {
        let engine = self.engine(session_id).await?;
        let mut engine = engine.lock().await;
        Ok(engine.end_discussion().await)
    }

    /// Injects extra candidates once the discussion has run past the
    /// configured threshold: 2 more with one human, 1 more with two, none
    /// with three or more. Before the threshold this is a no-op.
    ///
    /// Returns the (possibly grown) participant roster.
    pub async fn inject_candidates(
        &self,
        session_id: &str,
    ) -> Result<Vec<Participant>, SessionError> {
        let engine = self.engine(session_id).await?;
        let mut engine = engine.lock().await;

        if engine.elapsed_time() >= self.config.injection_threshold.as_secs_f64() {
            let additions = match engine.human_count() {
                1 => 2,
                2 => 1,
                _ => 0,
            };

            for _ in 0..additions {
                let name = engine.add_candidate();
                tracing::info!(session_id = %session_id, candidate = %name, "Candidate injected");
            }
        }

        Ok(engine.participants().to_vec())
    }

    /// Removes a session from the table. Idempotent: deleting an absent
    /// session is a successful no-op. Returns whether an entry was removed.
    pub async fn delete_session(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            tracing::info!(session_id = %session_id, "Session deleted");
        }
        removed
    }
}
