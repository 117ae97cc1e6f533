//! Hexsettle session runner.
//!
//! Wraps a [`hexsettle_core::GameState`] in a single-writer session, plays
//! AI seats behind a cancelable thinking delay, and reads its settings from
//! the environment.

pub mod config;
pub mod scheduler;
pub mod session;

pub use config::RunnerConfig;
pub use scheduler::{schedule, ScheduledTurn, TurnCanceller};
pub use session::{AiRunOutcome, GameSession, SessionError};
