//! Hexsettle - a hex-board settlement and trading game engine
//!
//! This crate provides the core game logic, including:
//! - Hex coordinate system and an arena-backed board topology
//! - Player state, resources and the development-card deck
//! - Game state machine with full rule enforcement
//! - Longest Road / Largest Army tracking
//! - AI players in three difficulty tiers
//!
//! # Architecture
//!
//! Tiles, vertices and edges live in flat arenas addressed by integer ids,
//! so two tiles sharing a corner share the same vertex record. All game
//! changes go through [`GameState`], which is single-writer: only the
//! current player's requests are accepted. Rendering, input collection and
//! scheduling are left to callers; they read [`GameSnapshot`]s and submit
//! [`GameAction`]s.
//!
//! # Modules
//!
//! - [`hex`]: Axial coordinates, pixel conversion and the corner lattice
//! - [`board`]: Board topology, terrain, harbors and the robber
//! - [`economy`]: Resource hands, costs and bank trading
//! - [`player`]: Player state and controllers
//! - [`cards`]: Development cards and their effects
//! - [`achievements`]: Longest Road and Largest Army
//! - [`actions`]: Requests, result codes and events
//! - [`game`]: Game state machine
//! - [`snapshot`]: Display-ready views of a game
//! - [`bot`]: AI players

pub mod achievements;
pub mod actions;
pub mod board;
pub mod bot;
pub mod cards;
pub mod economy;
pub mod game;
pub mod hex;
pub mod player;
pub mod snapshot;

// Re-export commonly used types
pub use actions::{BuildResult, GameAction, GameEvent};
pub use board::{
    Board, BoardLayout, EdgeBuilding, EdgeId, Harbor, HarborKind, PlayerId, Resource, Tile,
    TileId, TileType, VertexBuilding, VertexId,
};
pub use bot::{Bot, Difficulty, TurnOutcome};
pub use cards::{CardEffect, DevCard};
pub use economy::ResourceHand;
pub use game::{
    ActiveCard, ConfigError, GameConfig, GameError, GamePhase, GameState, PlayerConfig,
    SetupPlacing,
};
pub use hex::{CornerKey, HexCoord, Point};
pub use player::{ControllerKind, Player, PlayerColor};
pub use snapshot::GameSnapshot;
