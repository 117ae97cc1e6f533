//! Single-writer game session.
//!
//! A [`GameSession`] owns one game behind a tokio mutex together with the
//! bots for its AI seats. Human requests come in through [`GameSession::submit`];
//! AI seats are played by [`GameSession::run_ai_turns`], which waits out a
//! cancelable thinking delay before every bot move. While an AI turn is
//! scheduled or running, human requests are turned away.

use crate::scheduler::{self, TurnCanceller};
use hexsettle_core::{
    Bot, ConfigError, GameAction, GameConfig, GameError, GameEvent, GameSnapshot, GameState,
    PlayerId, TurnOutcome,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("An AI turn is in progress")]
    AiTurnInProgress,

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("Invalid game config: {0}")]
    Config(#[from] ConfigError),
}

/// Why `run_ai_turns` handed control back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AiRunOutcome {
    /// A human seat is up
    HumanTurn(PlayerId),
    /// A human seat owes a discard before the AI can continue
    AwaitingDiscard(PlayerId),
    /// The bot could not make progress
    Stalled(PlayerId),
    GameOver { winner: PlayerId },
    /// The configured turn limit was reached
    TurnLimit,
    /// `abandon` was called while a turn was pending
    Cancelled,
}

struct Table {
    game: GameState,
    bots: BTreeMap<PlayerId, Bot>,
}

/// One running game
#[derive(Clone)]
pub struct GameSession {
    id: Uuid,
    table: Arc<Mutex<Table>>,
    ai_busy: Arc<AtomicBool>,
    abandoned: Arc<AtomicBool>,
    pending: Arc<std::sync::Mutex<Option<TurnCanceller>>>,
    think_delay: Duration,
    turn_limit: Option<u32>,
}

impl GameSession {
    /// Start a game, with a bot for every AI seat
    pub fn new(config: GameConfig, think_delay: Duration) -> Result<Self, SessionError> {
        let seed = config.seed;
        let seats: Vec<_> = config
            .players
            .iter()
            .map(|seat| seat.controller.difficulty())
            .collect();
        let game = GameState::new(config)?;

        let bots = seats
            .into_iter()
            .enumerate()
            .filter_map(|(id, difficulty)| {
                let id = id as PlayerId;
                let difficulty = difficulty?;
                let bot = match seed {
                    Some(seed) => Bot::with_seed(id, difficulty, seed.wrapping_add(id as u64 + 1)),
                    None => Bot::new(id, difficulty),
                };
                Some((id, bot))
            })
            .collect::<BTreeMap<_, _>>();

        let id = Uuid::new_v4();
        info!(session = %id, bots = bots.len(), "session created");

        Ok(Self {
            id,
            table: Arc::new(Mutex::new(Table { game, bots })),
            ai_busy: Arc::new(AtomicBool::new(false)),
            abandoned: Arc::new(AtomicBool::new(false)),
            pending: Arc::new(std::sync::Mutex::new(None)),
            think_delay,
            turn_limit: None,
        })
    }

    /// Stop `run_ai_turns` once the game reaches this turn number
    pub fn with_turn_limit(mut self, turns: u32) -> Self {
        self.turn_limit = Some(turns);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn ai_turn_in_progress(&self) -> bool {
        self.ai_busy.load(Ordering::SeqCst)
    }

    pub async fn snapshot(&self) -> GameSnapshot {
        self.table.lock().await.game.snapshot()
    }

    /// Apply a human request. Turned away while an AI seat is acting; a
    /// human may still discard when a bot's 7 demands it.
    pub async fn submit(
        &self,
        player: PlayerId,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, SessionError> {
        if self.ai_turn_in_progress() {
            return Err(SessionError::AiTurnInProgress);
        }

        let mut table = self.table.lock().await;
        let current = table.game.current_player();
        let discarding = matches!(action, GameAction::Discard(_))
            && table.game.discard_requirement(player).is_some();
        if table.bots.contains_key(&current) && !discarding {
            return Err(SessionError::AiTurnInProgress);
        }

        let events = table.game.apply_action(player, action)?;
        debug!(session = %self.id, player, events = events.len(), "human request applied");
        Ok(events)
    }

    /// Play AI seats, one thinking delay per turn, until a human must act,
    /// the game ends, or the session is abandoned
    pub async fn run_ai_turns(&self) -> Result<AiRunOutcome, SessionError> {
        if self
            .ai_busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(SessionError::AiTurnInProgress);
        }

        let outcome = self
            .drive_bots()
            .instrument(info_span!("ai_turns", session = %self.id))
            .await;
        self.ai_busy.store(false, Ordering::SeqCst);
        Ok(outcome)
    }

    async fn drive_bots(&self) -> AiRunOutcome {
        loop {
            if self.abandoned.load(Ordering::SeqCst) {
                return AiRunOutcome::Cancelled;
            }

            let current = {
                let mut table = self.table.lock().await;
                let Table { game, bots } = &mut *table;
                if let Some(winner) = game.winner() {
                    return AiRunOutcome::GameOver { winner };
                }
                if self.turn_limit.is_some_and(|limit| game.turn_number() >= limit) {
                    return AiRunOutcome::TurnLimit;
                }
                for bot in bots.values_mut() {
                    bot.discard_if_required(game);
                }
                if let Some((&human, _)) = game
                    .pending_discards()
                    .iter()
                    .find(|(id, _)| !bots.contains_key(*id))
                {
                    return AiRunOutcome::AwaitingDiscard(human);
                }
                let current = game.current_player();
                if !bots.contains_key(&current) {
                    return AiRunOutcome::HumanTurn(current);
                }
                current
            };

            let table = self.table.clone();
            let turn = scheduler::schedule(self.think_delay, async move {
                let mut table = table.lock().await;
                let Table { game, bots } = &mut *table;
                let outcome = bots.get_mut(&current).map(|bot| bot.take_turn(game));
                (outcome, game.take_events())
            });
            self.set_pending(Some(turn.canceller()));
            if self.abandoned.load(Ordering::SeqCst) {
                turn.cancel();
            }

            let result = turn.join().await;
            self.set_pending(None);

            let Some((outcome, events)) = result else {
                info!("AI turn cancelled");
                return AiRunOutcome::Cancelled;
            };
            for event in &events {
                debug!(?event, "game event");
            }
            debug!(player = current, ?outcome, "AI turn finished");

            if matches!(outcome, Some(TurnOutcome::Waiting) | None) {
                let table = self.table.lock().await;
                let stuck = table.game.current_player() == current
                    && table.game.pending_discards().is_empty();
                if stuck {
                    return AiRunOutcome::Stalled(current);
                }
            }
        }
    }

    /// Cancel any scheduled AI turn and stop `run_ai_turns`
    pub fn abandon(&self) {
        self.abandoned.store(true, Ordering::SeqCst);
        if let Some(canceller) = self.pending_slot().take() {
            canceller.cancel();
        }
        info!(session = %self.id, "session abandoned");
    }

    fn set_pending(&self, canceller: Option<TurnCanceller>) {
        *self.pending_slot() = canceller;
    }

    fn pending_slot(&self) -> std::sync::MutexGuard<'_, Option<TurnCanceller>> {
        self.pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
