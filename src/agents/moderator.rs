//! Moderator agent for group discussion sessions.
//!
//! The moderator has exactly two interactions with a session: announcing the
//! topic when the discussion starts and delivering a closing line when it
//! ends. The announcement is a single generation request expected to return a
//! `{"topic", "message"}` JSON object; the closing line is fixed and makes no
//! backend call.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::llm::{GenerationRequest, LlmProvider, Message};
use crate::utils::json_extraction::extract_json_object;

use super::AgentOutput;

/// Transcript name under which moderator messages are recorded. Participants
/// with this name are excluded from evaluation.
pub const MODERATOR_NAME: &str = "Moderator";

/// Prompt asking the backend for a discussion topic and opening announcement.
const TOPIC_ANNOUNCEMENT_PROMPT: &str = r#"You are an HR moderator conducting a Group Discussion for campus placements.

Generate a relevant and challenging GD topic suitable for engineering students.
The topic should be current, debatable, and test their analytical and communication skills.

Then write a professional opening announcement (2-3 sentences) that:
1. Introduces the topic
2. Sets expectations for corporate behavior
3. Starts the discussion

Return response in JSON format:
{
    "topic": "the GD topic",
    "message": "your opening announcement"
}"#;

/// Fixed closing line delivered when a discussion ends.
const CLOSING_LINE: &str = "Thank you everyone for your participation. The discussion is now \
concluded. Please wait while we prepare your evaluation reports.";

/// Fallback topic used when the backend fails or returns unparseable output.
const FALLBACK_TOPIC: &str = "Should AI replace human jobs in the next decade?";

/// Fallback opening announcement paired with [`FALLBACK_TOPIC`].
const FALLBACK_MESSAGE: &str = "Good morning everyone. Today's topic is: Should AI replace human \
jobs in the next decade? This is a corporate-style group discussion. Please maintain \
professionalism, listen to others, and present your viewpoints clearly. You may begin.";

/// A discussion topic together with the moderator's opening announcement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopicAnnouncement {
    /// The discussion topic.
    pub topic: String,
    /// The moderator's opening announcement.
    pub message: String,
}

impl TopicAnnouncement {
    /// Returns the canned announcement used on backend or parse failure.
    pub fn fallback() -> Self {
        Self {
            topic: FALLBACK_TOPIC.to_string(),
            message: FALLBACK_MESSAGE.to_string(),
        }
    }
}

/// Moderator agent producing the opening and closing of a discussion.
pub struct ModeratorAgent {
    llm_client: Arc<dyn LlmProvider>,
    config: SimConfig,
}

impl std::fmt::Debug for ModeratorAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModeratorAgent")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ModeratorAgent {
    /// Creates a new moderator agent with the given LLM client.
    pub fn new(llm_client: Arc<dyn LlmProvider>, config: SimConfig) -> Self {
        Self { llm_client, config }
    }

    /// Generates a topic and opening announcement for a new discussion.
    ///
    /// Returns `AgentOutput::Fallback` with a fixed announcement pair on any
    /// backend or parse failure; the caller cannot observe an error.
    pub async fn announce_topic(&self) -> AgentOutput<TopicAnnouncement> {
        let request = GenerationRequest::new("", vec![Message::user(TOPIC_ANNOUNCEMENT_PROMPT)])
            .with_temperature(self.config.topic_temperature);

        match self.llm_client.generate(request).await {
            Ok(response) => {
                if let Some(content) = response.first_content() {
                    if let Some(json) = extract_json_object(content) {
                        if let Ok(announcement) = serde_json::from_str::<TopicAnnouncement>(&json) {
                            return AgentOutput::Generated(announcement);
                        }
                    }
                    tracing::warn!("Topic announcement was not valid JSON, using fallback");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Topic announcement request failed, using fallback");
            }
        }

        AgentOutput::Fallback(TopicAnnouncement::fallback())
    }

    /// Returns the fixed closing line for the end of a discussion.
    pub fn close_discussion(&self) -> String {
        CLOSING_LINE.to_string()
    }
}
