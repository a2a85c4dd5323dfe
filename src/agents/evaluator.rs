//! Evaluation agent producing the end-of-discussion scorecards.
//!
//! After a discussion ends, every non-moderator participant gets one
//! generation request asking for six 1-10 sub-scores plus qualitative
//! feedback, grounded in that participant's speaking metrics and message
//! content. Parse or backend failure substitutes a fixed neutral scorecard.
//! The ranked report is the session's final artifact.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::llm::{GenerationRequest, LlmProvider, Message};
use crate::session::{Participant, ParticipationMetrics, TranscriptEntry};
use crate::utils::json_extraction::extract_json_object;

use super::moderator::MODERATOR_NAME;
use super::AgentOutput;

/// Number of scored dimensions on a scorecard.
const SUB_SCORE_COUNT: f64 = 6.0;

/// Entry time reported for participants who never spoke.
const SILENT_ENTRY_TIME: f64 = 999.0;

/// User prompt template for per-participant evaluation.
const EVALUATION_TEMPLATE: &str = r#"You are an HR evaluator for campus placements conducting a strict GD evaluation.

Participant: {name}
Topic: {topic}
Speaking frequency: {speaking_count} times
Total words: {word_count}
Entry time: {entry_time} seconds
Content: {content}

Evaluate this participant on a scale of 1-10 for each:

1. Communication: Clarity, articulation, confidence
2. Content Relevance: How well they addressed the topic
3. Leadership: Initiative, guiding discussion
4. Confidence: Body language (inferred), conviction
5. Team Behavior: Listening, building on others' points
6. Corporate Readiness: Professional language, maturity

Also provide:
- 2-3 specific strengths
- 2-3 areas for improvement
- 1-2 sentences of HR remarks
- 2-3 actionable suggestions for improvement

Return ONLY valid JSON:
{
    "communication": score,
    "content_relevance": score,
    "leadership": score,
    "confidence": score,
    "team_behavior": score,
    "corporate_readiness": score,
    "strengths": ["strength1", "strength2"],
    "weaknesses": ["weakness1", "weakness2"],
    "hr_remarks": "remarks here",
    "suggestions": ["suggestion1", "suggestion2"]
}"#;

// ============================================================================
// Scorecard types
// ============================================================================

/// Placement readiness tier derived from the overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementReadiness {
    /// Overall score >= 8.5.
    TopTierReady,
    /// Overall score >= 7.5.
    MidTierReady,
    /// Overall score >= 6.5.
    NeedsPractice,
    /// Everything below.
    NeedsSignificantImprovement,
}

impl PlacementReadiness {
    /// Derives the readiness tier from an overall score.
    pub fn from_score(score: f64) -> Self {
        if score >= 8.5 {
            PlacementReadiness::TopTierReady
        } else if score >= 7.5 {
            PlacementReadiness::MidTierReady
        } else if score >= 6.5 {
            PlacementReadiness::NeedsPractice
        } else {
            PlacementReadiness::NeedsSignificantImprovement
        }
    }

    /// Returns the display label for this tier.
    pub fn display_name(&self) -> &'static str {
        match self {
            PlacementReadiness::TopTierReady => "Excellent - Ready for top-tier placements",
            PlacementReadiness::MidTierReady => "Good - Ready for mid-tier placements",
            PlacementReadiness::NeedsPractice => "Moderate - Needs practice",
            PlacementReadiness::NeedsSignificantImprovement => "Needs Significant Improvement",
        }
    }
}

impl std::fmt::Display for PlacementReadiness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Per-participant evaluation result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scorecard {
    /// Participant display name.
    pub name: String,
    /// Clarity, articulation, confidence (1-10).
    pub communication: u8,
    /// How well the participant addressed the topic (1-10).
    pub content_relevance: u8,
    /// Initiative and guiding the discussion (1-10).
    pub leadership: u8,
    /// Conviction and presence (1-10).
    pub confidence: u8,
    /// Listening and building on others' points (1-10).
    pub team_behavior: u8,
    /// Professional language and maturity (1-10).
    pub corporate_readiness: u8,
    /// Arithmetic mean of the six sub-scores, two-decimal rounding.
    pub overall_score: f64,
    /// 2-3 specific strengths.
    pub strengths: Vec<String>,
    /// 2-3 areas for improvement.
    pub weaknesses: Vec<String>,
    /// Short HR remarks.
    pub hr_remarks: String,
    /// 2-3 actionable suggestions.
    pub suggestions: Vec<String>,
    /// Position in the ranked report (1 = highest overall score).
    pub rank: u32,
    /// Readiness tier derived from the overall score.
    pub placement_readiness: PlacementReadiness,
}

impl Scorecard {
    /// Builds a scorecard from sub-scores, deriving overall and readiness.
    #[allow(clippy::too_many_arguments)]
    fn from_scores(
        name: String,
        sub_scores: [u8; 6],
        strengths: Vec<String>,
        weaknesses: Vec<String>,
        hr_remarks: String,
        suggestions: Vec<String>,
    ) -> Self {
        let total: u32 = sub_scores.iter().map(|&s| s as u32).sum();
        let overall_score = (total as f64 / SUB_SCORE_COUNT * 100.0).round() / 100.0;

        Self {
            name,
            communication: sub_scores[0],
            content_relevance: sub_scores[1],
            leadership: sub_scores[2],
            confidence: sub_scores[3],
            team_behavior: sub_scores[4],
            corporate_readiness: sub_scores[5],
            overall_score,
            strengths,
            weaknesses,
            hr_remarks,
            suggestions,
            rank: 0,
            placement_readiness: PlacementReadiness::from_score(overall_score),
        }
    }

    /// Returns the fixed neutral scorecard substituted on backend failure.
    pub fn neutral_fallback(name: impl Into<String>) -> Self {
        Self::from_scores(
            name.into(),
            [6, 6, 5, 6, 7, 6],
            vec![
                "Participated in discussion".to_string(),
                "Professional demeanor".to_string(),
            ],
            vec![
                "Could improve content depth".to_string(),
                "Need more initiative".to_string(),
            ],
            "Satisfactory performance with room for growth.".to_string(),
            vec![
                "Practice speaking with more examples".to_string(),
                "Take more initiative".to_string(),
            ],
        )
    }
}

/// Ranked evaluation over all scored participants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Scorecards sorted by descending overall score, ranks assigned.
    pub rankings: Vec<Scorecard>,
    /// One-line count summary.
    pub summary: String,
}

/// JSON shape expected back from the evaluation request. Scores arrive as
/// numbers; models occasionally send fractional values, so they are rounded
/// and clamped into 1-10 on conversion.
#[derive(Debug, Deserialize)]
struct EvaluationResponse {
    communication: f64,
    content_relevance: f64,
    leadership: f64,
    confidence: f64,
    team_behavior: f64,
    corporate_readiness: f64,
    #[serde(default)]
    strengths: Vec<String>,
    #[serde(default)]
    weaknesses: Vec<String>,
    #[serde(default)]
    hr_remarks: String,
    #[serde(default)]
    suggestions: Vec<String>,
}

fn clamp_score(raw: f64) -> u8 {
    raw.round().clamp(1.0, 10.0) as u8
}

// ============================================================================
// Evaluator agent
// ============================================================================

/// Evaluation agent scoring every non-moderator participant.
pub struct EvaluatorAgent {
    llm_client: Arc<dyn LlmProvider>,
    config: SimConfig,
}

impl std::fmt::Debug for EvaluatorAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluatorAgent")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl EvaluatorAgent {
    /// Creates a new evaluator agent with the given LLM client.
    pub fn new(llm_client: Arc<dyn LlmProvider>, config: SimConfig) -> Self {
        Self { llm_client, config }
    }

    /// Evaluates all non-moderator participants and ranks them.
    ///
    /// One generation request per participant, issued sequentially. Every
    /// failure degrades to the neutral fallback scorecard, so the report
    /// always covers the full scored subset.
    pub async fn evaluate_all(
        &self,
        participants: &[Participant],
        metrics: &HashMap<String, ParticipationMetrics>,
        transcript: &[TranscriptEntry],
        topic: &str,
    ) -> EvaluationReport {
        tracing::debug!(
            participants = participants.len(),
            transcript_entries = transcript.len(),
            "Starting evaluation"
        );

        let empty = ParticipationMetrics::default();
        let mut cards = Vec::new();

        for participant in participants {
            if participant.name == MODERATOR_NAME {
                continue;
            }

            let data = metrics.get(&participant.name).unwrap_or(&empty);
            let output = self.evaluate_participant(&participant.name, topic, data).await;

            if output.is_fallback() {
                tracing::warn!(participant = %participant.name, "Using neutral fallback scorecard");
            }

            cards.push(output.into_inner());
        }

        // Stable sort: original evaluation order breaks ties
        cards.sort_by(|a, b| {
            b.overall_score
                .partial_cmp(&a.overall_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        for (idx, card) in cards.iter_mut().enumerate() {
            card.rank = idx as u32 + 1;
        }

        let summary = format!(
            "Evaluation complete for {} participants. Rankings have been determined based on comprehensive performance analysis.",
            cards.len()
        );

        EvaluationReport {
            rankings: cards,
            summary,
        }
    }

    /// Evaluates a single participant from their participation metrics.
    pub async fn evaluate_participant(
        &self,
        name: &str,
        topic: &str,
        data: &ParticipationMetrics,
    ) -> AgentOutput<Scorecard> {
        let prompt = self.build_evaluation_prompt(name, topic, data);

        let request = GenerationRequest::new("", vec![Message::user(prompt)])
            .with_temperature(self.config.eval_temperature)
            .with_max_tokens(self.config.eval_max_tokens);

        match self.llm_client.generate(request).await {
            Ok(response) => {
                if let Some(content) = response.first_content() {
                    if let Some(json) = extract_json_object(content) {
                        if let Ok(parsed) = serde_json::from_str::<EvaluationResponse>(&json) {
                            return AgentOutput::Generated(Scorecard::from_scores(
                                name.to_string(),
                                [
                                    clamp_score(parsed.communication),
                                    clamp_score(parsed.content_relevance),
                                    clamp_score(parsed.leadership),
                                    clamp_score(parsed.confidence),
                                    clamp_score(parsed.team_behavior),
                                    clamp_score(parsed.corporate_readiness),
                                ],
                                parsed.strengths,
                                parsed.weaknesses,
                                parsed.hr_remarks,
                                parsed.suggestions,
                            ));
                        }
                    }
                    tracing::warn!(
                        participant = name,
                        "Evaluation response was not valid JSON"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(participant = name, error = %e, "Evaluation request failed");
            }
        }

        AgentOutput::Fallback(Scorecard::neutral_fallback(name))
    }

    /// Builds the evaluation prompt for one participant.
    fn build_evaluation_prompt(
        &self,
        name: &str,
        topic: &str,
        data: &ParticipationMetrics,
    ) -> String {
        let content = if data.messages.is_empty() {
            "No contribution".to_string()
        } else {
            data.messages.join(" ")
        };

        let entry_time = data.entry_time.unwrap_or(SILENT_ENTRY_TIME);

        EVALUATION_TEMPLATE
            .replace("{name}", name)
            .replace("{topic}", topic)
            .replace("{speaking_count}", &data.speaking_count.to_string())
            .replace("{word_count}", &data.word_count.to_string())
            .replace("{entry_time}", &format!("{:.1}", entry_time))
            .replace("{content}", &content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{Choice, GenerationResponse, Usage};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Mock provider replaying a queue of scripted responses.
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<String, String>>>,
    }

    impl ScriptedProvider {
        fn new(responses: Vec<Result<String, String>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            let next = self
                .responses
                .lock()
                .expect("lock not poisoned")
                .pop_front()
                .unwrap_or(Err("script exhausted".to_string()));

            match next {
                Ok(content) => Ok(GenerationResponse {
                    id: "mock-id".to_string(),
                    model: "mock-model".to_string(),
                    choices: vec![Choice {
                        index: 0,
                        message: Message::assistant(content),
                        finish_reason: "stop".to_string(),
                    }],
                    usage: Usage {
                        prompt_tokens: 200,
                        completion_tokens: 150,
                        total_tokens: 350,
                    },
                }),
                Err(message) => Err(LlmError::RequestFailed(message)),
            }
        }
    }

    fn eval_json(scores: [i32; 6]) -> String {
        format!(
            r#"{{
                "communication": {},
                "content_relevance": {},
                "leadership": {},
                "confidence": {},
                "team_behavior": {},
                "corporate_readiness": {},
                "strengths": ["Clear structure", "Good examples"],
                "weaknesses": ["Spoke late"],
                "hr_remarks": "Solid showing.",
                "suggestions": ["Enter earlier"]
            }}"#,
            scores[0], scores[1], scores[2], scores[3], scores[4], scores[5]
        )
    }

    fn participant(name: &str, is_human: bool) -> Participant {
        Participant {
            id: format!("p-{}", name),
            name: name.to_string(),
            is_human,
            join_time: Utc::now(),
        }
    }

    fn spoken_metrics(texts: &[&str]) -> ParticipationMetrics {
        let mut data = ParticipationMetrics::default();
        for (i, text) in texts.iter().enumerate() {
            data.record(text, 10.0 + i as f64);
        }
        data
    }

    #[test]
    fn test_readiness_thresholds() {
        assert_eq!(
            PlacementReadiness::from_score(8.5),
            PlacementReadiness::TopTierReady
        );
        assert_eq!(
            PlacementReadiness::from_score(8.49),
            PlacementReadiness::MidTierReady
        );
        assert_eq!(
            PlacementReadiness::from_score(7.5),
            PlacementReadiness::MidTierReady
        );
        assert_eq!(
            PlacementReadiness::from_score(6.5),
            PlacementReadiness::NeedsPractice
        );
        assert_eq!(
            PlacementReadiness::from_score(6.49),
            PlacementReadiness::NeedsSignificantImprovement
        );
    }

    #[test]
    fn test_overall_score_two_decimal_rounding() {
        let card = Scorecard::from_scores(
            "x".to_string(),
            [8, 8, 8, 8, 8, 7],
            vec![],
            vec![],
            String::new(),
            vec![],
        );
        // 47 / 6 = 7.8333...
        assert!((card.overall_score - 7.83).abs() < f64::EPSILON);
        assert_eq!(card.placement_readiness, PlacementReadiness::MidTierReady);
    }

    #[test]
    fn test_clamp_score() {
        assert_eq!(clamp_score(15.0), 10);
        assert_eq!(clamp_score(0.0), 1);
        assert_eq!(clamp_score(-3.0), 1);
        assert_eq!(clamp_score(7.6), 8);
    }

    #[test]
    fn test_neutral_fallback_is_structurally_complete() {
        let card = Scorecard::neutral_fallback("Candidate 1");
        assert_eq!(card.name, "Candidate 1");
        assert!((card.overall_score - 6.0).abs() < f64::EPSILON);
        assert!(!card.strengths.is_empty());
        assert!(!card.weaknesses.is_empty());
        assert!(!card.hr_remarks.is_empty());
        assert!(!card.suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_evaluate_participant_parses_scores() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(eval_json([8, 7, 9, 8, 7, 9]))]));
        let evaluator = EvaluatorAgent::new(provider, SimConfig::default());

        let output = evaluator
            .evaluate_participant("YOU", "AI and jobs", &spoken_metrics(&["a point", "another"]))
            .await;

        assert!(!output.is_fallback());
        let card = output.into_inner();
        assert_eq!(card.communication, 8);
        assert_eq!(card.leadership, 9);
        // 48 / 6 = 8.0
        assert!((card.overall_score - 8.0).abs() < f64::EPSILON);
        assert_eq!(card.placement_readiness, PlacementReadiness::MidTierReady);
    }

    #[tokio::test]
    async fn test_evaluate_participant_clamps_out_of_range() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(eval_json([
            15, 0, 8, 8, 8, 8,
        ]))]));
        let evaluator = EvaluatorAgent::new(provider, SimConfig::default());

        let card = evaluator
            .evaluate_participant("YOU", "topic", &spoken_metrics(&["hi"]))
            .await
            .into_inner();

        assert_eq!(card.communication, 10);
        assert_eq!(card.content_relevance, 1);
    }

    #[tokio::test]
    async fn test_evaluate_participant_fallback_on_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err("down".to_string())]));
        let evaluator = EvaluatorAgent::new(provider, SimConfig::default());

        let output = evaluator
            .evaluate_participant("Candidate 2", "topic", &ParticipationMetrics::default())
            .await;

        assert!(output.is_fallback());
        assert!((output.value().overall_score - 6.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_evaluate_participant_fallback_on_prose() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(
            "This participant did well overall.".to_string(),
        )]));
        let evaluator = EvaluatorAgent::new(provider, SimConfig::default());

        let output = evaluator
            .evaluate_participant("Candidate 3", "topic", &ParticipationMetrics::default())
            .await;

        assert!(output.is_fallback());
    }

    #[tokio::test]
    async fn test_evaluate_all_ranks_descending_without_gaps() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(eval_json([6, 6, 6, 6, 6, 6])), // YOU: 6.0
            Ok(eval_json([9, 9, 9, 9, 9, 9])), // Candidate 1: 9.0
            Ok(eval_json([7, 7, 7, 7, 7, 7])), // Candidate 2: 7.0
        ]));
        let evaluator = EvaluatorAgent::new(provider, SimConfig::default());

        let participants = vec![
            participant("YOU", true),
            participant("Candidate 1", false),
            participant("Candidate 2", false),
        ];
        let mut metrics = HashMap::new();
        for p in &participants {
            metrics.insert(p.name.clone(), spoken_metrics(&["something to say"]));
        }

        let report = evaluator
            .evaluate_all(&participants, &metrics, &[], "AI and jobs")
            .await;

        assert_eq!(report.rankings.len(), 3);
        assert_eq!(report.rankings[0].name, "Candidate 1");
        assert_eq!(report.rankings[0].rank, 1);
        assert_eq!(report.rankings[1].name, "Candidate 2");
        assert_eq!(report.rankings[1].rank, 2);
        assert_eq!(report.rankings[2].name, "YOU");
        assert_eq!(report.rankings[2].rank, 3);

        // Monotone scores, gapless ranks
        for window in report.rankings.windows(2) {
            assert!(window[0].overall_score >= window[1].overall_score);
            assert_eq!(window[1].rank, window[0].rank + 1);
        }

        assert!(report.summary.contains("3 participants"));
    }

    #[tokio::test]
    async fn test_evaluate_all_ties_keep_input_order() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(eval_json([7, 7, 7, 7, 7, 7])),
            Ok(eval_json([7, 7, 7, 7, 7, 7])),
        ]));
        let evaluator = EvaluatorAgent::new(provider, SimConfig::default());

        let participants = vec![participant("YOU", true), participant("Candidate 1", false)];
        let metrics = HashMap::new();

        let report = evaluator
            .evaluate_all(&participants, &metrics, &[], "topic")
            .await;

        assert_eq!(report.rankings[0].name, "YOU");
        assert_eq!(report.rankings[0].rank, 1);
        assert_eq!(report.rankings[1].name, "Candidate 1");
        assert_eq!(report.rankings[1].rank, 2);
    }

    #[tokio::test]
    async fn test_evaluate_all_excludes_moderator() {
        let provider = Arc::new(ScriptedProvider::new(vec![Ok(eval_json([8, 8, 8, 8, 8, 8]))]));
        let evaluator = EvaluatorAgent::new(provider, SimConfig::default());

        let participants = vec![participant(MODERATOR_NAME, false), participant("YOU", true)];
        let metrics = HashMap::new();

        let report = evaluator
            .evaluate_all(&participants, &metrics, &[], "topic")
            .await;

        assert_eq!(report.rankings.len(), 1);
        assert_eq!(report.rankings[0].name, "YOU");
    }

    #[test]
    fn test_evaluation_prompt_for_silent_participant() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let evaluator = EvaluatorAgent::new(provider, SimConfig::default());

        let prompt =
            evaluator.build_evaluation_prompt("Candidate 4", "topic", &ParticipationMetrics::default());
        assert!(prompt.contains("Content: No contribution"));
        assert!(prompt.contains("Entry time: 999.0 seconds"));
        assert!(prompt.contains("Speaking frequency: 0 times"));
    }
}
