//! Simulated candidate agents for group discussion sessions.
//!
//! Each candidate is bound to one display name and one personality
//! descriptor drawn at creation time. Candidates reply to the latest human
//! message conditioned on the topic and a short excerpt of the recent
//! transcript, excluding their own prior turns.

use std::sync::Arc;

use rand::seq::IndexedRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::llm::{GenerationRequest, LlmProvider, Message};
use crate::session::TranscriptEntry;

use super::AgentOutput;

/// User prompt template for candidate replies.
const RESPONSE_TEMPLATE: &str = r#"You are a candidate in a corporate Group Discussion for campus placements.

Topic: {topic}

Recent discussion:
{context}

Latest input: {human_input}

Your personality: {personality}

Generate a response (2-4 sentences) that:
- Relates to the topic and ongoing discussion
- Shows you're listening to others
- Presents a clear viewpoint
- Uses professional language
- Occasionally builds on or politely disagrees with others

Keep it natural and conversational. DO NOT be overly formal."#;

// ============================================================================
// Personalities
// ============================================================================

/// Personality traits a simulated candidate can embody.
///
/// Each candidate draws one trait at creation, independently and with
/// replacement, so a session may contain several candidates with the same
/// trait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Personality {
    /// Leads with numbers and evidence.
    Analytical,
    /// Argues with conviction and energy.
    Persuasive,
    /// Weighs every side before committing.
    Diplomatic,
    /// Reaches for novel angles and ideas.
    Creative,
    /// Steers toward workable outcomes.
    Pragmatic,
}

impl Personality {
    /// All available personality traits.
    pub const ALL: [Personality; 5] = [
        Personality::Analytical,
        Personality::Persuasive,
        Personality::Diplomatic,
        Personality::Creative,
        Personality::Pragmatic,
    ];

    /// Returns the display name for this personality.
    pub fn display_name(&self) -> &'static str {
        match self {
            Personality::Analytical => "Analytical",
            Personality::Persuasive => "Persuasive",
            Personality::Diplomatic => "Diplomatic",
            Personality::Creative => "Creative",
            Personality::Pragmatic => "Pragmatic",
        }
    }

    /// Returns the descriptor injected into the candidate prompt.
    pub fn descriptor(&self) -> &'static str {
        match self {
            Personality::Analytical => "analytical and data-driven",
            Personality::Persuasive => "passionate and persuasive",
            Personality::Diplomatic => "balanced and diplomatic",
            Personality::Creative => "creative and innovative",
            Personality::Pragmatic => "practical and solution-oriented",
        }
    }

    /// Draws a personality uniformly at random.
    pub fn random(rng: &mut impl Rng) -> Self {
        Personality::ALL
            .choose(rng)
            .copied()
            .unwrap_or(Personality::Diplomatic)
    }
}

impl std::fmt::Display for Personality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Candidate agent
// ============================================================================

/// A simulated candidate bound to one name and one personality.
pub struct CandidateAgent {
    name: String,
    personality: Personality,
    llm_client: Arc<dyn LlmProvider>,
    config: SimConfig,
}

impl std::fmt::Debug for CandidateAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateAgent")
            .field("name", &self.name)
            .field("personality", &self.personality)
            .finish_non_exhaustive()
    }
}

impl CandidateAgent {
    /// Creates a new candidate with the given name and personality.
    pub fn new(
        name: impl Into<String>,
        personality: Personality,
        llm_client: Arc<dyn LlmProvider>,
        config: SimConfig,
    ) -> Self {
        Self {
            name: name.into(),
            personality,
            llm_client,
            config,
        }
    }

    /// Returns this candidate's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns this candidate's personality trait.
    pub fn personality(&self) -> Personality {
        self.personality
    }

    /// Generates a reply to the latest human input.
    ///
    /// The prompt quotes the most recent context entries, excluding this
    /// candidate's own turns. Backend failure yields a fixed generic
    /// fallback sentence referencing the topic.
    pub async fn respond(
        &self,
        topic: &str,
        recent_context: &[TranscriptEntry],
        human_text: &str,
    ) -> AgentOutput<String> {
        let prompt = self.build_response_prompt(topic, recent_context, human_text);

        let request = GenerationRequest::new("", vec![Message::user(prompt)])
            .with_temperature(self.config.response_temperature)
            .with_max_tokens(self.config.response_max_tokens);

        match self.llm_client.generate(request).await {
            Ok(response) => {
                if let Some(content) = response.first_content() {
                    let text = content.trim();
                    if !text.is_empty() {
                        return AgentOutput::Generated(text.to_string());
                    }
                }
                tracing::warn!(candidate = %self.name, "Empty candidate reply, using fallback");
            }
            Err(e) => {
                tracing::warn!(
                    candidate = %self.name,
                    error = %e,
                    "Candidate reply request failed, using fallback"
                );
            }
        }

        AgentOutput::Fallback(format!(
            "That's an interesting point. I believe we should consider multiple perspectives on {}.",
            topic
        ))
    }

    /// Builds the reply prompt from topic, context excerpt and human input.
    fn build_response_prompt(
        &self,
        topic: &str,
        recent_context: &[TranscriptEntry],
        human_text: &str,
    ) -> String {
        let excerpt: Vec<String> = recent_context
            .iter()
            .filter(|entry| entry.participant != self.name)
            .map(|entry| format!("{}: {}", entry.participant, entry.text))
            .collect();

        let tail_start = excerpt.len().saturating_sub(self.config.context_excerpt);
        let context = excerpt[tail_start..].join("\n");

        RESPONSE_TEMPLATE
            .replace("{topic}", topic)
            .replace("{context}", &context)
            .replace("{human_input}", human_text)
            .replace("{personality}", self.personality.descriptor())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{Choice, GenerationResponse, Usage};
    use async_trait::async_trait;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct MockLlmProvider {
        response: Result<String, String>,
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            match &self.response {
                Ok(content) => Ok(GenerationResponse {
                    id: "mock-id".to_string(),
                    model: "mock-model".to_string(),
                    choices: vec![Choice {
                        index: 0,
                        message: Message::assistant(content.clone()),
                        finish_reason: "stop".to_string(),
                    }],
                    usage: Usage {
                        prompt_tokens: 80,
                        completion_tokens: 40,
                        total_tokens: 120,
                    },
                }),
                Err(message) => Err(LlmError::RequestFailed(message.clone())),
            }
        }
    }

    fn entry(participant: &str, text: &str) -> TranscriptEntry {
        TranscriptEntry {
            participant: participant.to_string(),
            text: text.to_string(),
            timestamp: "2026-01-01T09:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_personality_all_distinct_descriptors() {
        let descriptors: std::collections::HashSet<_> =
            Personality::ALL.iter().map(|p| p.descriptor()).collect();
        assert_eq!(descriptors.len(), Personality::ALL.len());
    }

    #[test]
    fn test_personality_random_is_seed_deterministic() {
        let mut a = ChaCha8Rng::seed_from_u64(7);
        let mut b = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..10 {
            assert_eq!(Personality::random(&mut a), Personality::random(&mut b));
        }
    }

    #[test]
    fn test_personality_display() {
        assert_eq!(format!("{}", Personality::Analytical), "Analytical");
        assert_eq!(Personality::Pragmatic.descriptor(), "practical and solution-oriented");
    }

    #[test]
    fn test_prompt_excludes_own_turns() {
        let provider = Arc::new(MockLlmProvider {
            response: Ok("Sure.".to_string()),
        });
        let agent = CandidateAgent::new(
            "Candidate 2",
            Personality::Analytical,
            provider,
            SimConfig::default(),
        );

        let context = vec![
            entry("Moderator", "Topic is announced."),
            entry("Candidate 2", "My earlier point."),
            entry("YOU", "What do others think?"),
        ];

        let prompt = agent.build_response_prompt("AI and jobs", &context, "What do others think?");
        assert!(prompt.contains("Moderator: Topic is announced."));
        assert!(prompt.contains("YOU: What do others think?"));
        assert!(!prompt.contains("My earlier point."));
        assert!(prompt.contains("analytical and data-driven"));
    }

    #[test]
    fn test_prompt_keeps_only_excerpt_tail() {
        let provider = Arc::new(MockLlmProvider {
            response: Ok("Sure.".to_string()),
        });
        let agent = CandidateAgent::new(
            "Candidate 1",
            Personality::Creative,
            provider,
            SimConfig::default(),
        );

        let context = vec![
            entry("YOU", "first"),
            entry("Candidate 3", "second"),
            entry("YOU", "third"),
            entry("Candidate 2", "fourth"),
            entry("YOU", "fifth"),
        ];

        // Default excerpt keeps the last 3 non-own entries
        let prompt = agent.build_response_prompt("Topic", &context, "fifth");
        assert!(!prompt.contains("YOU: first"));
        assert!(prompt.contains("YOU: third"));
        assert!(prompt.contains("Candidate 2: fourth"));
        assert!(prompt.contains("YOU: fifth"));
    }

    #[tokio::test]
    async fn test_respond_trims_content() {
        let provider = Arc::new(MockLlmProvider {
            response: Ok("  A measured reply.  \n".to_string()),
        });
        let agent = CandidateAgent::new(
            "Candidate 1",
            Personality::Diplomatic,
            provider,
            SimConfig::default(),
        );

        let output = agent.respond("AI and jobs", &[], "Thoughts?").await;
        assert!(!output.is_fallback());
        assert_eq!(output.into_inner(), "A measured reply.");
    }

    #[tokio::test]
    async fn test_respond_fallback_references_topic() {
        let provider = Arc::new(MockLlmProvider {
            response: Err("timeout".to_string()),
        });
        let agent = CandidateAgent::new(
            "Candidate 4",
            Personality::Persuasive,
            provider,
            SimConfig::default(),
        );

        let output = agent.respond("data privacy", &[], "Thoughts?").await;
        assert!(output.is_fallback());
        assert!(output.value().contains("data privacy"));
    }

    #[tokio::test]
    async fn test_respond_fallback_on_empty_reply() {
        let provider = Arc::new(MockLlmProvider {
            response: Ok("   ".to_string()),
        });
        let agent = CandidateAgent::new(
            "Candidate 1",
            Personality::Pragmatic,
            provider,
            SimConfig::default(),
        );

        let output = agent.respond("topic", &[], "Thoughts?").await;
        assert!(output.is_fallback());
    }
}
