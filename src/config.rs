//! Simulation configuration for gd-sim.
//!
//! This module provides the knobs shared by the session engine and the
//! agents: sampling temperatures and token caps per role, pacing-delay
//! bounds, transcript context windows, seeding counts and the candidate
//! injection threshold. Defaults match the observed product behavior.

use std::time::Duration;

use crate::error::ConfigError;

/// Configuration for a group discussion simulation.
#[derive(Debug, Clone)]
pub struct SimConfig {
    // Seeding
    /// Number of simulated candidates seeded at session creation.
    pub seeded_candidates: usize,

    // Turn taking
    /// Upper bound on candidates asked to reply to one human message.
    pub max_responders: usize,
    /// Number of trailing transcript entries given to a responding candidate.
    pub history_window: usize,
    /// Number of those entries quoted verbatim in the candidate prompt.
    pub context_excerpt: usize,
    /// Inclusive bounds for the artificial pause between candidate replies.
    /// Emulates typing cadence; set both to zero to disable in tests.
    pub pacing_delay_min: Duration,
    /// See `pacing_delay_min`.
    pub pacing_delay_max: Duration,

    // Candidate injection
    /// Elapsed time after which extra candidates may be injected.
    pub injection_threshold: Duration,

    // LLM sampling
    /// Temperature for topic announcement (moderately creative).
    pub topic_temperature: f64,
    /// Temperature for candidate replies (most varied).
    pub response_temperature: f64,
    /// Token cap for candidate replies.
    pub response_max_tokens: u32,
    /// Temperature for evaluation (near-deterministic scoring).
    pub eval_temperature: f64,
    /// Token cap for evaluation responses.
    pub eval_max_tokens: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seeded_candidates: 4,

            max_responders: 2,
            history_window: 5,
            context_excerpt: 3,
            pacing_delay_min: Duration::from_secs(1),
            pacing_delay_max: Duration::from_secs(3),

            injection_threshold: Duration::from_secs(300),

            topic_temperature: 0.8,
            response_temperature: 0.9,
            response_max_tokens: 150,
            eval_temperature: 0.3,
            eval_max_tokens: 800,
        }
    }
}

impl SimConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of candidates seeded at creation (at least 1).
    pub fn with_seeded_candidates(mut self, count: usize) -> Self {
        self.seeded_candidates = count.max(1);
        self
    }

    /// Sets the pacing-delay bounds for candidate replies.
    pub fn with_pacing_delay(mut self, min: Duration, max: Duration) -> Self {
        self.pacing_delay_min = min;
        self.pacing_delay_max = max.max(min);
        self
    }

    /// Disables the pacing delay entirely (useful in tests).
    pub fn without_pacing_delay(self) -> Self {
        self.with_pacing_delay(Duration::ZERO, Duration::ZERO)
    }

    /// Sets the elapsed-time threshold for candidate injection.
    pub fn with_injection_threshold(mut self, threshold: Duration) -> Self {
        self.injection_threshold = threshold;
        self
    }

    /// Sets the candidate reply temperature (clamped to 0.0 - 2.0).
    pub fn with_response_temperature(mut self, temperature: f64) -> Self {
        self.response_temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Validates internal consistency of the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pacing_delay_min > self.pacing_delay_max {
            return Err(ConfigError::InvalidValue {
                key: "pacing_delay".to_string(),
                message: "min delay exceeds max delay".to_string(),
            });
        }

        if self.context_excerpt > self.history_window {
            return Err(ConfigError::InvalidValue {
                key: "context_excerpt".to_string(),
                message: format!(
                    "excerpt ({}) exceeds history window ({})",
                    self.context_excerpt, self.history_window
                ),
            });
        }

        if self.max_responders == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_responders must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}
