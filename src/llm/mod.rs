//! LLM integration for gd-sim.
//!
//! This module provides the client used by the moderator, candidate and
//! evaluator agents to talk to an OpenAI-compatible chat-completions backend
//! (OpenRouter by default).
//!
//! All generation requests in a discussion are issued one at a time: the
//! turn-taking engine paces candidate replies to emulate human typing
//! cadence, so there is nothing to gain from fanning requests out.
//!
//! ```ignore
//! use gd_sim::llm::{OpenRouterClient, GenerationRequest, Message, LlmProvider};
//!
//! let client = OpenRouterClient::from_env()?;
//! let request = GenerationRequest::new("", vec![Message::user("Say hello")])
//!     .with_temperature(0.8);
//! let response = client.generate(request).await?;
//! ```

pub mod client;

pub use client::{
    Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, OpenRouterClient, Usage,
};
