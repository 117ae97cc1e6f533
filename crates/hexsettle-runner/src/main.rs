//! Headless Hexsettle game: every seat is played by the AI.

use hexsettle_runner::{AiRunOutcome, GameSession, RunnerConfig};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RunnerConfig::from_env();
    info!(?config, "Starting headless game...");

    let session =
        GameSession::new(config.game_config(), config.think_delay)?.with_turn_limit(config.max_turns);

    // Ctrl-C abandons the game; the pending AI move is dropped cleanly
    let interrupt = {
        let session = session.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, abandoning game");
                session.abandon();
            }
        })
    };

    let outcome = session.run_ai_turns().await?;
    interrupt.abort();

    match outcome {
        AiRunOutcome::GameOver { winner } => info!(winner, "Game over"),
        other => warn!(?other, "Game stopped without a winner"),
    }

    let snapshot = session.snapshot().await;
    let report = serde_json::json!({
        "session": session.id(),
        "outcome": outcome,
        "game": snapshot,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
