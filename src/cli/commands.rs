//! CLI command definitions for gd-sim.
//!
//! `gd-sim run` drives one discussion session interactively from the
//! terminal: the moderator opens, the user types contributions on stdin,
//! candidates reply with a typing-cadence delay, and `:end` closes the round
//! and prints the ranked scorecards.

use std::sync::Arc;

use chrono::Utc;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::agents::Personality;
use crate::config::SimConfig;
use crate::llm::OpenRouterClient;
use crate::session::{DiscussionClose, SessionStore};

/// Default model to use for generation.
const DEFAULT_MODEL: &str = "qwen/qwen-2.5-7b-instruct";

/// Default API base for the generation backend.
const DEFAULT_API_BASE: &str = "https://openrouter.ai/api/v1";

/// AI group discussion simulator for interview practice.
#[derive(Parser)]
#[command(name = "gd-sim")]
#[command(about = "Run moderated AI group discussion rounds for interview practice")]
#[command(version)]
#[command(
    long_about = "gd-sim runs a corporate-style group discussion: a moderator announces a topic,\nsimulated candidates respond to your contributions, and an evaluator ranks\neveryone when the round ends.\n\nExample usage:\n  OPENROUTER_API_KEY=... gd-sim run --model qwen/qwen-2.5-7b-instruct"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run an interactive group discussion session.
    Run(RunArgs),

    /// List the personality traits simulated candidates can draw.
    Personalities,
}

/// Arguments for `gd-sim run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Explicit session id (a UUID is generated when omitted).
    #[arg(long)]
    pub session_id: Option<String>,

    /// LLM model to use for all roles.
    #[arg(short = 'm', long, default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the OpenRouter-compatible backend.
    #[arg(long, default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// OpenRouter API key (can also be set via OPENROUTER_API_KEY env var).
    #[arg(long, env = "OPENROUTER_API_KEY")]
    pub api_key: String,

    /// RNG seed pinning personalities, responder selection and pacing.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Parses command-line arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parses command-line arguments and runs the selected command.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Runs the selected command with pre-parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => run_session(args).await,
        Commands::Personalities => {
            list_personalities();
            Ok(())
        }
    }
}

/// Prints the candidate personality roster.
fn list_personalities() {
    println!("Candidate personalities (drawn at random, with replacement):");
    for personality in Personality::ALL {
        println!("  {:<12} {}", personality.display_name(), personality.descriptor());
    }
}

/// Runs one interactive discussion session end to end.
async fn run_session(args: RunArgs) -> anyhow::Result<()> {
    info!(model = %args.model, "Starting gd-sim session");

    let client = OpenRouterClient::new(args.api_base, args.api_key, args.model);
    let mut store = SessionStore::new(Arc::new(client), SimConfig::default());
    if let Some(seed) = args.seed {
        store = store.with_seed(seed);
    }

    let created = store.create_session(args.session_id).await?;
    let session_id = created.session_id.clone();

    println!("Session {} created.", session_id);
    println!("Participants:");
    for participant in &created.participants {
        let role = if participant.is_human { "human" } else { "simulated" };
        println!("  {:<4} {:<14} ({})", participant.id, participant.name, role);
    }

    let opening = store.start_session(&session_id).await?;
    println!();
    println!("Topic: {}", opening.topic);
    println!("Moderator: {}", opening.message);
    println!();
    println!("Type your contribution and press enter. Commands: :status, :end, :quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            ":quit" => {
                store.delete_session(&session_id).await;
                println!("Session discarded.");
                break;
            }
            ":status" => {
                let snapshot = store.session_status(&session_id).await?;
                println!(
                    "status={} topic={} elapsed={:.1}s participants={} messages={}",
                    snapshot.status,
                    snapshot.topic.as_deref().unwrap_or("-"),
                    snapshot.elapsed_time,
                    snapshot.participants.len(),
                    snapshot.transcript.len()
                );
            }
            ":end" => {
                let close = store.end_session(&session_id).await?;
                print_report(&close);
                store.delete_session(&session_id).await;
                break;
            }
            text => {
                let roster_before = store.session_status(&session_id).await?.participants.len();

                let outcome = store
                    .submit_message(&session_id, "YOU", text, &Utc::now().to_rfc3339())
                    .await?;

                for reply in &outcome.replies {
                    println!("{}: {}", reply.participant, reply.text);
                }

                // Late joiners keep a long-running round lively
                let roster = store.inject_candidates(&session_id).await?;
                for participant in roster.iter().skip(roster_before) {
                    println!("* {} has joined the discussion.", participant.name);
                }
            }
        }
    }

    Ok(())
}

/// Prints the closing line and the ranked scorecard table.
fn print_report(close: &DiscussionClose) {
    println!();
    println!("Moderator: {}", close.closing);
    println!();
    println!("===== Evaluation =====");

    for card in &close.evaluation.rankings {
        println!(
            "#{} {:<14} {:>5.2}  {}",
            card.rank,
            card.name,
            card.overall_score,
            card.placement_readiness
        );
        println!(
            "    communication {} | relevance {} | leadership {} | confidence {} | team {} | corporate {}",
            card.communication,
            card.content_relevance,
            card.leadership,
            card.confidence,
            card.team_behavior,
            card.corporate_readiness
        );
        if !card.strengths.is_empty() {
            println!("    strengths:   {}", card.strengths.join("; "));
        }
        if !card.weaknesses.is_empty() {
            println!("    weaknesses:  {}", card.weaknesses.join("; "));
        }
        if !card.suggestions.is_empty() {
            println!("    suggestions: {}", card.suggestions.join("; "));
        }
        if !card.hr_remarks.is_empty() {
            println!("    remarks:     {}", card.hr_remarks);
        }
    }

    println!();
    println!("{}", close.evaluation.summary);
}
