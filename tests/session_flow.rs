//! Integration tests for the full session lifecycle.
//!
//! These tests drive the session store end to end against a scripted
//! provider that routes on prompt content, the way the real backend would
//! see one announcement request, one request per candidate reply and one
//! request per evaluated participant.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use gd_sim::config::SimConfig;
use gd_sim::error::LlmError;
use gd_sim::llm::{Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage};
use gd_sim::session::{SessionStatus, SessionStore};

/// Provider that answers each request based on which role's prompt it sees.
struct RoutingProvider;

const TOPIC_JSON: &str =
    r#"{"topic": "Is remote work the future of corporate life?", "message": "Good morning everyone. Today we discuss remote work. You may begin."}"#;

const EVAL_JSON: &str = r#"{
    "communication": 8,
    "content_relevance": 7,
    "leadership": 6,
    "confidence": 8,
    "team_behavior": 7,
    "corporate_readiness": 8,
    "strengths": ["Structured arguments", "Good listening"],
    "weaknesses": ["Entered late"],
    "hr_remarks": "Consistent performer.",
    "suggestions": ["Open the discussion next time"]
}"#;

#[async_trait]
impl LlmProvider for RoutingProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let content = if prompt.contains("HR moderator") {
            TOPIC_JSON
        } else if prompt.contains("HR evaluator") {
            EVAL_JSON
        } else {
            "I agree, and I would add that flexibility matters most."
        };

        Ok(GenerationResponse {
            id: "scripted".to_string(),
            model: "scripted-model".to_string(),
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(content),
                finish_reason: "stop".to_string(),
            }],
            usage: Usage {
                prompt_tokens: 100,
                completion_tokens: 60,
                total_tokens: 160,
            },
        })
    }
}

/// Provider where every request fails, forcing every fallback path at once.
struct DownProvider;

#[async_trait]
impl LlmProvider for DownProvider {
    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        Err(LlmError::RequestFailed("connection refused".to_string()))
    }
}

fn scripted_store() -> SessionStore {
    SessionStore::new(
        Arc::new(RoutingProvider),
        SimConfig::default().without_pacing_delay(),
    )
    .with_seed(1)
}

#[tokio::test]
async fn test_full_session_lifecycle() {
    let store = scripted_store();

    // Create: 1 human + 4 candidates
    let created = store
        .create_session(Some("lifecycle".to_string()))
        .await
        .expect("create should succeed");
    assert_eq!(created.status, SessionStatus::Initialized);

    let names: Vec<&str> = created.participants.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["YOU", "Candidate 1", "Candidate 2", "Candidate 3", "Candidate 4"]
    );

    // Start: moderator announces the scripted topic
    let opening = store.start_session("lifecycle").await.expect("start should succeed");
    assert_eq!(opening.topic, "Is remote work the future of corporate life?");
    assert!(!opening.message.is_empty());

    // Exchange a few turns
    for text in ["I think hybrid models win.", "Offices still matter for onboarding."] {
        let outcome = store
            .submit_message("lifecycle", "YOU", text, "2026-01-01T09:00:00Z")
            .await
            .expect("submit should succeed");

        assert!(!outcome.replies.is_empty());
        assert!(outcome.replies.len() <= 2);

        let speakers: HashSet<&str> = outcome.replies.iter().map(|r| r.participant.as_str()).collect();
        assert_eq!(speakers.len(), outcome.replies.len());
    }

    // Status reflects everything recorded so far, in order
    let snapshot = store.session_status("lifecycle").await.expect("status should succeed");
    assert_eq!(snapshot.status, SessionStatus::InProgress);
    assert_eq!(snapshot.transcript[0].participant, "Moderator");
    assert_eq!(snapshot.transcript[1].participant, "YOU");
    assert!(snapshot.elapsed_time >= 0.0);

    // End: every non-moderator participant is scored and ranked
    let close = store.end_session("lifecycle").await.expect("end should succeed");
    assert!(close.closing.contains("concluded"));

    let rankings = &close.evaluation.rankings;
    assert_eq!(rankings.len(), 5);
    for (idx, card) in rankings.iter().enumerate() {
        assert_eq!(card.rank, idx as u32 + 1);
        assert_ne!(card.name, "Moderator");
    }
    for window in rankings.windows(2) {
        assert!(window[0].overall_score >= window[1].overall_score);
    }
    assert!(close.evaluation.summary.contains("5 participants"));

    // Identical scores: ties keep evaluation (join) order
    assert_eq!(rankings[0].name, "YOU");

    let snapshot = store.session_status("lifecycle").await.expect("status should succeed");
    assert_eq!(snapshot.status, SessionStatus::Completed);

    // Cleanup is idempotent
    assert!(store.delete_session("lifecycle").await);
    assert!(!store.delete_session("lifecycle").await);
}

#[tokio::test]
async fn test_lifecycle_survives_dead_backend() {
    let store = SessionStore::new(
        Arc::new(DownProvider),
        SimConfig::default().without_pacing_delay(),
    )
    .with_seed(2);

    store
        .create_session(Some("degraded".to_string()))
        .await
        .expect("create should succeed");

    // Topic announcement degrades to the canned pair
    let opening = store.start_session("degraded").await.expect("start should succeed");
    assert!(!opening.topic.is_empty());
    assert!(!opening.message.is_empty());

    // Candidate replies degrade to the topic-referencing fallback
    let outcome = store
        .submit_message("degraded", "YOU", "Anyone there?", "2026-01-01T09:00:00Z")
        .await
        .expect("submit should succeed");
    assert!(!outcome.replies.is_empty());
    for reply in &outcome.replies {
        assert!(reply.text.contains(&opening.topic));
    }

    // Evaluation degrades to structurally complete neutral scorecards
    let close = store.end_session("degraded").await.expect("end should succeed");
    assert_eq!(close.evaluation.rankings.len(), 5);
    for card in &close.evaluation.rankings {
        assert!((card.overall_score - 6.0).abs() < f64::EPSILON);
        assert!(!card.strengths.is_empty());
        assert!(!card.hr_remarks.is_empty());
    }
}

#[tokio::test]
async fn test_injection_threshold_and_counts() {
    // Threshold zero makes the elapsed-time gate pass immediately
    let store = SessionStore::new(
        Arc::new(RoutingProvider),
        SimConfig::default()
            .without_pacing_delay()
            .with_injection_threshold(Duration::ZERO),
    )
    .with_seed(3);

    store
        .create_session(Some("inject".to_string()))
        .await
        .expect("create should succeed");
    store.start_session("inject").await.expect("start should succeed");

    // One human: two late joiners
    let roster = store.inject_candidates("inject").await.expect("inject should succeed");
    assert_eq!(roster.len(), 7);
    assert_eq!(roster[5].name, "Candidate 5");
    assert_eq!(roster[6].name, "Candidate 6");

    // New candidates participate in selection from now on
    let outcome = store
        .submit_message("inject", "YOU", "Welcome the new folks.", "2026-01-01T09:05:00Z")
        .await
        .expect("submit should succeed");
    assert!(!outcome.replies.is_empty());
}

#[tokio::test]
async fn test_injection_noop_before_threshold() {
    let store = scripted_store();

    store
        .create_session(Some("early".to_string()))
        .await
        .expect("create should succeed");
    store.start_session("early").await.expect("start should succeed");

    // Default threshold is five minutes; nothing happens this early
    let roster = store.inject_candidates("early").await.expect("inject should succeed");
    assert_eq!(roster.len(), 5);
}
