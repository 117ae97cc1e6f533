//! Core game state machine.
//!
//! `GameState` owns the board, the players, the development deck and the
//! title tracker, and is the only place game-affecting state changes. Build
//! and trade requests answer with a [`BuildResult`]; every other request
//! answers with `Result<_, GameError>`. A rejected request never changes
//! anything.

use crate::achievements::{Achievements, Title, TitleChange};
use crate::actions::{BuildResult, GameAction, GameEvent};
use crate::board::{Board, BoardLayout, EdgeId, PlayerId, Resource, TileId, VertexBuilding, VertexId};
use crate::cards::{self, CardEffect, DevCard};
use crate::economy::{self, costs, EconomyError, ResourceHand};
use crate::hex::Point;
use crate::player::{ControllerKind, Player};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info, trace};

/// Victory points needed to win
pub const DEFAULT_VICTORY_POINTS: u32 = 10;

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;

/// One seat at the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub name: String,
    pub controller: ControllerKind,
}

impl PlayerConfig {
    pub fn new(name: impl Into<String>, controller: ControllerKind) -> Self {
        Self {
            name: name.into(),
            controller,
        }
    }
}

/// Everything needed to start a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub players: Vec<PlayerConfig>,
    pub radius: u32,
    pub hex_size: f64,
    pub origin: Point,
    pub victory_points_to_win: u32,
    /// Seed for board generation, dice, deck and steals; `None` uses entropy
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::with_players(4, ControllerKind::Human)
    }
}

impl GameConfig {
    /// `count` players named "Player 1".."Player n", all with one controller
    pub fn with_players(count: usize, controller: ControllerKind) -> Self {
        let layout = BoardLayout::default();
        Self {
            players: (1..=count)
                .map(|n| PlayerConfig::new(format!("Player {n}"), controller))
                .collect(),
            radius: layout.radius,
            hex_size: layout.hex_size,
            origin: layout.origin,
            victory_points_to_win: DEFAULT_VICTORY_POINTS,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&self.players.len()) {
            return Err(ConfigError::PlayerCount(self.players.len()));
        }
        if self.radius == 0 {
            return Err(ConfigError::Radius);
        }
        if self.hex_size.is_nan() || self.hex_size <= 0.0 {
            return Err(ConfigError::HexSize(self.hex_size));
        }
        if self.victory_points_to_win == 0 {
            return Err(ConfigError::VictoryPoints);
        }
        Ok(())
    }

    pub fn layout(&self) -> BoardLayout {
        BoardLayout {
            radius: self.radius,
            hex_size: self.hex_size,
            origin: self.origin,
        }
    }
}

/// Reasons a game can't be created from a config
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("expected 2 to 6 players, got {0}")]
    PlayerCount(usize),

    #[error("board radius must be at least 1")]
    Radius,

    #[error("hex size must be positive, got {0}")]
    HexSize(f64),

    #[error("victory point target must be positive")]
    VictoryPoints,
}

/// Game phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Initial placement phase
    Setup {
        /// Which round of setup (1 or 2)
        round: u8,
        /// What we're currently placing
        placing: SetupPlacing,
    },

    /// Roll, then build/trade/play cards, then end the turn
    Main,

    /// A 7 or a Knight: discards, then robber move, then steal
    RobberPending,

    /// A played card is waiting for follow-up input
    CardActive(ActiveCard),

    /// Game is over
    Finished { winner: PlayerId },
}

/// What we're placing during setup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetupPlacing {
    Settlement,
    Road,
}

/// Card effects that need more input from the actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActiveCard {
    RoadBuilding { roads_left: u8 },
    YearOfPlenty,
    Monopoly,
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Invalid action for current phase")]
    InvalidPhase,

    #[error("Invalid placement location")]
    InvalidLocation,

    #[error("Dice total {0} is out of range")]
    InvalidRoll(u8),

    #[error("Player {0} can't be robbed")]
    InvalidVictim(PlayerId),

    #[error("Cannot afford this")]
    CannotAfford,

    #[error("No development cards left in deck")]
    EmptyDeck,

    #[error("Don't have that card")]
    NoSuchCard,

    #[error("A development card was already played this turn")]
    CardAlreadyPlayed,

    #[error("Invalid discard")]
    InvalidDiscard,

    #[error("Players still have to discard")]
    DiscardsPending,

    #[error("Request rejected: {0:?}")]
    Rejected(BuildResult),

    #[error("Game is over")]
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece {
    Settlement,
    Road,
    City,
}

/// The complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    pub(crate) board: Board,
    pub(crate) players: Vec<Player>,
    pub(crate) current_player: PlayerId,
    pub(crate) phase: GamePhase,
    pub(crate) dice_roll_required: bool,
    pub(crate) robber_must_move: bool,
    pub(crate) card_played_this_turn: bool,
    /// Players who still owe a discard, with the number owed
    pub(crate) pending_discards: BTreeMap<PlayerId, u32>,
    /// Victims to choose from after the robber moved
    pub(crate) robber_victims: Vec<PlayerId>,
    pub(crate) dev_deck: Vec<DevCard>,
    pub(crate) achievements: Achievements,
    /// Turn number (0 during setup)
    pub(crate) turn_number: u32,
    pub(crate) last_roll: Option<u8>,
    victory_points_to_win: u32,
    rng: StdRng,
    events: Vec<GameEvent>,
}

impl GameState {
    /// Create a new game in the first setup round, player 0 to place
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let board = Board::generate(config.layout(), &mut rng);
        let dev_deck = DevCard::standard_deck(&mut rng);

        let players: Vec<Player> = config
            .players
            .iter()
            .enumerate()
            .map(|(i, seat)| Player::new(i as PlayerId, seat.name.clone(), seat.controller))
            .collect();

        info!(
            players = players.len(),
            radius = config.radius,
            seed = ?config.seed,
            "new game"
        );

        Ok(Self {
            board,
            players,
            current_player: 0,
            phase: GamePhase::Setup {
                round: 1,
                placing: SetupPlacing::Settlement,
            },
            dice_roll_required: false,
            robber_must_move: false,
            card_played_this_turn: false,
            pending_discards: BTreeMap::new(),
            robber_victims: Vec::new(),
            dev_deck,
            achievements: Achievements::default(),
            turn_number: 0,
            last_roll: None,
            victory_points_to_win: config.victory_points_to_win,
            rng,
            events: Vec::new(),
        })
    }

    // ==================== Queries ====================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Get a player by ID
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn current_player(&self) -> PlayerId {
        self.current_player
    }

    pub fn phase(&self) -> &GamePhase {
        &self.phase
    }

    pub fn is_setup(&self) -> bool {
        matches!(self.phase, GamePhase::Setup { .. })
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, GamePhase::Finished { .. })
    }

    pub fn winner(&self) -> Option<PlayerId> {
        match self.phase {
            GamePhase::Finished { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn dice_roll_required(&self) -> bool {
        self.dice_roll_required
    }

    pub fn robber_must_move(&self) -> bool {
        self.robber_must_move
    }

    pub fn card_played_this_turn(&self) -> bool {
        self.card_played_this_turn
    }

    pub fn pending_discards(&self) -> &BTreeMap<PlayerId, u32> {
        &self.pending_discards
    }

    /// Cards `player` still has to discard, if any
    pub fn discard_requirement(&self, player: PlayerId) -> Option<u32> {
        self.pending_discards.get(&player).copied()
    }

    pub fn robber_victims(&self) -> &[PlayerId] {
        &self.robber_victims
    }

    pub fn longest_road_holder(&self) -> Option<PlayerId> {
        self.achievements.longest_road_holder()
    }

    pub fn largest_army_holder(&self) -> Option<PlayerId> {
        self.achievements.largest_army_holder()
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn last_roll(&self) -> Option<u8> {
        self.last_roll
    }

    pub fn dev_cards_remaining(&self) -> usize {
        self.dev_deck.len()
    }

    pub fn victory_points_to_win(&self) -> u32 {
        self.victory_points_to_win
    }

    /// Bank trade ratio for `player` giving `resource`
    pub fn trade_ratio(&self, player: PlayerId, resource: Resource) -> u32 {
        economy::trade_ratio(&self.board.harbors_for(player), resource)
    }

    /// Drain the event log
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // ==================== Placement predicates ====================

    /// Vertices where `player` could legally place a settlement right now,
    /// ignoring cost and supply.
    pub fn valid_settlement_spots(&self, player: PlayerId) -> Vec<VertexId> {
        let setup = self.is_setup();
        self.board
            .vertices()
            .iter()
            .map(|v| v.id)
            .filter(|&v| self.board.satisfies_distance_rule(v))
            .filter(|&v| setup || self.board.touches_own_road(v, player))
            .collect()
    }

    /// Edges where `player` could legally place a road right now, ignoring
    /// cost and supply.
    pub fn valid_road_spots(&self, player: PlayerId) -> Vec<EdgeId> {
        self.board
            .edges()
            .iter()
            .filter(|e| e.owner().is_none())
            .map(|e| e.id)
            .filter(|&e| self.road_location_connects(player, e))
            .collect()
    }

    /// Settlements `player` could upgrade
    pub fn valid_city_spots(&self, player: PlayerId) -> Vec<VertexId> {
        self.player(player)
            .map(|p| p.settlements.iter().copied().collect())
            .unwrap_or_default()
    }

    /// What `build_settlement` would answer, without building
    pub fn check_settlement(&self, player: PlayerId, vertex: VertexId) -> BuildResult {
        if !self.build_allowed(player, Piece::Settlement) {
            return BuildResult::WrongPhase;
        }
        if self.board.vertex(vertex).is_none() || !self.board.satisfies_distance_rule(vertex) {
            return BuildResult::InvalidVertex;
        }
        let Some(p) = self.player(player) else {
            return BuildResult::WrongPhase;
        };
        if p.settlements_remaining() == 0 {
            return BuildResult::TooManySettlements;
        }
        if self.is_setup() {
            return BuildResult::Success;
        }
        if !self.board.touches_own_road(vertex, player) {
            return BuildResult::NotConnected;
        }
        if !p.resources.can_afford(&costs::settlement()) {
            return BuildResult::InsufficientResources;
        }
        BuildResult::Success
    }

    /// What `build_road` would answer, without building
    pub fn check_road(&self, player: PlayerId, edge: EdgeId) -> BuildResult {
        if !self.build_allowed(player, Piece::Road) {
            return BuildResult::WrongPhase;
        }
        if !self.board.edge(edge).is_some_and(|e| e.owner().is_none()) {
            return BuildResult::InvalidEdge;
        }
        let Some(p) = self.player(player) else {
            return BuildResult::WrongPhase;
        };
        if p.roads_remaining() == 0 {
            return BuildResult::TooManyRoads;
        }
        if !self.road_location_connects(player, edge) {
            return BuildResult::NotConnected;
        }
        if !self.road_is_free() && !p.resources.can_afford(&costs::road()) {
            return BuildResult::InsufficientResources;
        }
        BuildResult::Success
    }

    /// What `build_city` would answer, without building
    pub fn check_city(&self, player: PlayerId, vertex: VertexId) -> BuildResult {
        if !self.build_allowed(player, Piece::City) {
            return BuildResult::WrongPhase;
        }
        if self.board.vertex(vertex).map(|v| v.building) != Some(VertexBuilding::Settlement(player))
        {
            return BuildResult::InvalidVertex;
        }
        let Some(p) = self.player(player) else {
            return BuildResult::WrongPhase;
        };
        if p.cities_remaining() == 0 {
            return BuildResult::TooManyCities;
        }
        if !p.resources.can_afford(&costs::city()) {
            return BuildResult::InsufficientResources;
        }
        BuildResult::UpgradedToCity
    }

    fn build_allowed(&self, player: PlayerId, piece: Piece) -> bool {
        if player != self.current_player {
            return false;
        }
        match (&self.phase, piece) {
            (
                GamePhase::Setup {
                    placing: SetupPlacing::Settlement,
                    ..
                },
                Piece::Settlement,
            ) => true,
            (
                GamePhase::Setup {
                    placing: SetupPlacing::Road,
                    ..
                },
                Piece::Road,
            ) => true,
            (GamePhase::CardActive(ActiveCard::RoadBuilding { .. }), Piece::Road) => true,
            (GamePhase::Main, _) => !self.dice_roll_required,
            _ => false,
        }
    }

    fn road_is_free(&self) -> bool {
        matches!(
            self.phase,
            GamePhase::Setup { .. } | GamePhase::CardActive(ActiveCard::RoadBuilding { .. })
        )
    }

    /// During setup a road must touch the settlement it goes with (first road
    /// to first settlement, second to second). Otherwise it must join the
    /// player's network.
    fn road_location_connects(&self, player: PlayerId, edge: EdgeId) -> bool {
        let Some(target) = self.board.edge(edge) else {
            return false;
        };
        if self.is_setup() {
            return self
                .setup_anchor(player)
                .is_some_and(|vertex| target.has_endpoint(vertex));
        }
        self.board.road_connects(edge, player)
    }

    fn setup_anchor(&self, player: PlayerId) -> Option<VertexId> {
        let p = self.player(player)?;
        if p.roads.is_empty() {
            p.first_settlement
        } else {
            p.second_settlement
        }
    }

    // ==================== Building ====================

    /// Place a settlement. During setup it is free and needs no road; on a
    /// vertex holding the player's own settlement it upgrades to a city.
    pub fn build_settlement(&mut self, player: PlayerId, vertex: VertexId) -> BuildResult {
        if self.phase == GamePhase::Main
            && self
                .board
                .vertex(vertex)
                .is_some_and(|v| v.building == VertexBuilding::Settlement(player))
        {
            return self.build_city(player, vertex);
        }

        let result = self.check_settlement(player, vertex);
        if result != BuildResult::Success {
            debug!(player, vertex, ?result, "settlement rejected");
            return result;
        }

        let setup = self.is_setup();
        let idx = player as usize;
        if !setup && self.players[idx].resources.remove_hand(&costs::settlement()).is_err() {
            return BuildResult::InsufficientResources;
        }

        self.board.place_settlement(vertex, player);
        let p = &mut self.players[idx];
        p.settlements.insert(vertex);
        p.score += 1;
        let second_setup_settlement = setup && p.first_settlement.is_some();
        if setup {
            if p.first_settlement.is_none() {
                p.first_settlement = Some(vertex);
            } else {
                p.second_settlement = Some(vertex);
            }
        }

        debug!(player, vertex, setup, "settlement built");
        self.events.push(GameEvent::SettlementBuilt { player, vertex });

        if second_setup_settlement {
            self.grant_starting_resources(player, vertex);
        }

        if let GamePhase::Setup { round, .. } = self.phase {
            self.phase = GamePhase::Setup {
                round,
                placing: SetupPlacing::Road,
            };
        } else {
            // A settlement can cut an opponent's road
            self.refresh_longest_road();
            self.check_victory(player);
        }

        BuildResult::Success
    }

    /// Upgrade one of the player's settlements to a city
    pub fn build_city(&mut self, player: PlayerId, vertex: VertexId) -> BuildResult {
        let result = self.check_city(player, vertex);
        if result != BuildResult::UpgradedToCity {
            debug!(player, vertex, ?result, "city rejected");
            return result;
        }

        let idx = player as usize;
        if self.players[idx].resources.remove_hand(&costs::city()).is_err() {
            return BuildResult::InsufficientResources;
        }

        self.board.upgrade_to_city(vertex, player);
        let p = &mut self.players[idx];
        p.settlements.remove(&vertex);
        p.cities.insert(vertex);
        p.score += 1;

        debug!(player, vertex, "city built");
        self.events.push(GameEvent::CityBuilt { player, vertex });
        self.check_victory(player);

        BuildResult::UpgradedToCity
    }

    /// Place a road (free during setup and Road Building)
    pub fn build_road(&mut self, player: PlayerId, edge: EdgeId) -> BuildResult {
        let result = self.check_road(player, edge);
        if result != BuildResult::Success {
            debug!(player, edge, ?result, "road rejected");
            return result;
        }

        let idx = player as usize;
        let free = self.road_is_free();
        if !free && self.players[idx].resources.remove_hand(&costs::road()).is_err() {
            return BuildResult::InsufficientResources;
        }

        self.board.place_road(edge, player);
        self.players[idx].roads.insert(edge);

        debug!(player, edge, free, "road built");
        self.events.push(GameEvent::RoadBuilt { player, edge, free });

        match self.phase {
            GamePhase::Setup { .. } => {
                self.advance_setup();
                return BuildResult::Success;
            }
            GamePhase::CardActive(ActiveCard::RoadBuilding { roads_left }) => {
                self.phase = if roads_left > 1 {
                    GamePhase::CardActive(ActiveCard::RoadBuilding {
                        roads_left: roads_left - 1,
                    })
                } else {
                    GamePhase::Main
                };
            }
            _ => {}
        }

        self.refresh_longest_road();
        self.check_victory(player);
        BuildResult::Success
    }

    /// Trade with the bank at the player's best harbor ratio
    pub fn bank_trade(&mut self, player: PlayerId, give: Resource, receive: Resource) -> BuildResult {
        if self.ensure_turn(player).is_err() || !self.in_main_after_roll() {
            return BuildResult::WrongPhase;
        }

        let ratio = self.trade_ratio(player, give);
        match economy::bank_trade(&mut self.players[player as usize].resources, give, receive, ratio)
        {
            Ok(()) => {
                debug!(player, ?give, ?receive, ratio, "bank trade");
                self.events.push(GameEvent::BankTradeCompleted {
                    player,
                    gave: give,
                    gave_count: ratio,
                    received: receive,
                });
                BuildResult::Success
            }
            Err(EconomyError::SameResource) => BuildResult::InvalidTrade,
            Err(EconomyError::InsufficientResources) => BuildResult::InsufficientResources,
        }
    }

    fn grant_starting_resources(&mut self, player: PlayerId, vertex: VertexId) {
        let distributions: Vec<(PlayerId, Resource, u32)> = self
            .board
            .tiles_at_vertex(vertex)
            .filter_map(|tile| tile.resource())
            .map(|resource| (player, resource, 1))
            .collect();

        for &(_, resource, amount) in &distributions {
            self.players[player as usize].resources.add(resource, amount);
        }
        if !distributions.is_empty() {
            self.events
                .push(GameEvent::ResourcesDistributed { distributions });
        }
    }

    /// Snake order: forward through round 1, the last player places twice,
    /// then backward through round 2.
    fn advance_setup(&mut self) {
        let GamePhase::Setup { round, .. } = self.phase else {
            return;
        };
        let count = self.players.len() as PlayerId;

        if self.players.iter().all(|p| p.structure_count() >= 2) {
            self.phase = GamePhase::Main;
            self.current_player = 0;
            self.dice_roll_required = true;
            self.turn_number = 1;
            info!("setup complete");
            self.events.push(GameEvent::SetupCompleted);
        } else if round == 1 && self.players.iter().all(|p| p.structure_count() >= 1) {
            self.phase = GamePhase::Setup {
                round: 2,
                placing: SetupPlacing::Settlement,
            };
        } else if round == 1 {
            self.current_player = (self.current_player + 1) % count;
            self.phase = GamePhase::Setup {
                round: 1,
                placing: SetupPlacing::Settlement,
            };
        } else {
            self.current_player = if self.current_player == 0 {
                count - 1
            } else {
                self.current_player - 1
            };
            self.phase = GamePhase::Setup {
                round: 2,
                placing: SetupPlacing::Settlement,
            };
        }
    }

    // ==================== Dice ====================

    /// Roll two dice and resolve the total
    pub fn roll_dice(&mut self, player: PlayerId) -> Result<u8, GameError> {
        self.ensure_can_roll(player)?;
        let total = self.rng.gen_range(1..=6u8) + self.rng.gen_range(1..=6u8);
        self.resolve_roll(player, total)?;
        Ok(total)
    }

    /// Resolve a known dice total: a 7 starts the robber flow, anything
    /// else pays out. Scripted games and replays only; play goes through
    /// [`GameState::roll_dice`].
    #[doc(hidden)]
    pub fn resolve_roll(&mut self, player: PlayerId, total: u8) -> Result<(), GameError> {
        self.ensure_can_roll(player)?;
        if !(2..=12).contains(&total) {
            return Err(GameError::InvalidRoll(total));
        }

        self.dice_roll_required = false;
        self.last_roll = Some(total);
        debug!(player, total, "dice rolled");
        self.events.push(GameEvent::DiceRolled { player, total });

        if total == 7 {
            for p in &self.players {
                if let Some(count) = p.resources.discard_requirement() {
                    self.pending_discards.insert(p.id, count);
                    self.events.push(GameEvent::DiscardRequired {
                        player: p.id,
                        count,
                    });
                }
            }
            self.activate_robber();
            return Ok(());
        }

        let distributions = self.board.production(total);
        for &(owner, resource, amount) in &distributions {
            self.players[owner as usize].resources.add(resource, amount);
        }
        trace!(total, payouts = distributions.len(), "resources distributed");
        if !distributions.is_empty() {
            self.events
                .push(GameEvent::ResourcesDistributed { distributions });
        }
        Ok(())
    }

    fn ensure_can_roll(&self, player: PlayerId) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        if self.phase != GamePhase::Main || !self.dice_roll_required {
            return Err(GameError::InvalidPhase);
        }
        Ok(())
    }

    // ==================== Robber ====================

    pub(crate) fn activate_robber(&mut self) {
        self.phase = GamePhase::RobberPending;
        self.robber_must_move = true;
        self.robber_victims.clear();
    }

    fn finish_robber(&mut self) {
        self.robber_victims.clear();
        self.robber_must_move = false;
        self.phase = GamePhase::Main;
    }

    /// Discard exactly the owed number of cards after a 7
    pub fn discard(&mut self, player: PlayerId, cards: &ResourceHand) -> Result<(), GameError> {
        if self.is_finished() {
            return Err(GameError::GameOver);
        }
        if self.phase != GamePhase::RobberPending {
            return Err(GameError::InvalidPhase);
        }
        let required = self
            .discard_requirement(player)
            .ok_or(GameError::InvalidDiscard)?;
        if cards.total() != required {
            return Err(GameError::InvalidDiscard);
        }

        self.players[player as usize]
            .resources
            .remove_hand(cards)
            .map_err(|_| GameError::InvalidDiscard)?;
        self.pending_discards.remove(&player);

        debug!(player, count = required, "cards discarded");
        self.events.push(GameEvent::CardsDiscarded {
            player,
            count: required,
        });
        Ok(())
    }

    /// Move the robber to a different tile. With one possible victim the
    /// steal happens at once; with several the actor must call `steal`.
    pub fn move_robber(&mut self, player: PlayerId, tile: TileId) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        if self.phase != GamePhase::RobberPending || !self.robber_must_move {
            return Err(GameError::InvalidPhase);
        }
        if !self.pending_discards.is_empty() {
            return Err(GameError::DiscardsPending);
        }
        if self.board.tile(tile).is_none() || tile == self.board.robber() {
            return Err(GameError::InvalidLocation);
        }

        let from = self.board.robber();
        self.board.move_robber(tile);
        self.robber_must_move = false;
        debug!(player, from, to = tile, "robber moved");
        self.events.push(GameEvent::RobberMoved {
            player,
            from,
            to: tile,
        });

        let victims: Vec<PlayerId> = self
            .board
            .players_on_tile(tile)
            .into_iter()
            .filter(|&p| p != player && self.players[p as usize].resources.total() > 0)
            .collect();

        match victims.as_slice() {
            [] => self.finish_robber(),
            [victim] => {
                self.steal_from(player, *victim);
                self.finish_robber();
            }
            _ => self.robber_victims = victims,
        }
        Ok(())
    }

    /// Steal one random card from a player next to the robber
    pub fn steal(&mut self, player: PlayerId, victim: PlayerId) -> Result<Option<Resource>, GameError> {
        self.ensure_turn(player)?;
        if self.phase != GamePhase::RobberPending || self.robber_victims.is_empty() {
            return Err(GameError::InvalidPhase);
        }
        if !self.robber_victims.contains(&victim) {
            return Err(GameError::InvalidVictim(victim));
        }

        let stolen = self.steal_from(player, victim);
        self.finish_robber();
        Ok(stolen)
    }

    fn steal_from(&mut self, thief: PlayerId, victim: PlayerId) -> Option<Resource> {
        let stolen = self.players[victim as usize]
            .resources
            .steal_random(&mut self.rng);
        if let Some(resource) = stolen {
            self.players[thief as usize].resources.add(resource, 1);
        }
        debug!(thief, victim, ?stolen, "steal");
        self.events.push(GameEvent::ResourceStolen {
            thief,
            victim,
            resource: stolen,
        });
        stolen
    }

    // ==================== Development Cards ====================

    pub fn buy_development_card(&mut self, player: PlayerId) -> Result<DevCard, GameError> {
        self.ensure_turn(player)?;
        if !self.in_main_after_roll() {
            return Err(GameError::InvalidPhase);
        }
        if self.dev_deck.is_empty() {
            return Err(GameError::EmptyDeck);
        }

        let idx = player as usize;
        self.players[idx]
            .resources
            .remove_hand(&costs::development_card())
            .map_err(|_| GameError::CannotAfford)?;
        let card = self.dev_deck.pop().ok_or(GameError::EmptyDeck)?;
        self.players[idx].new_dev_cards.add(card);

        debug!(player, remaining = self.dev_deck.len(), "development card bought");
        self.events
            .push(GameEvent::DevelopmentCardPurchased { player });
        Ok(card)
    }

    /// Play a card from the playable pile. Knight and Victory Point may be
    /// played before rolling; at most one non-VP card per turn.
    pub fn play_development_card(
        &mut self,
        player: PlayerId,
        card: DevCard,
    ) -> Result<CardEffect, GameError> {
        self.ensure_turn(player)?;
        if self.phase != GamePhase::Main {
            return Err(GameError::InvalidPhase);
        }
        if self.dice_roll_required && !matches!(card, DevCard::Knight | DevCard::VictoryPoint) {
            return Err(GameError::InvalidPhase);
        }
        if card.counts_as_play() && self.card_played_this_turn {
            return Err(GameError::CardAlreadyPlayed);
        }
        if !self.players[player as usize].dev_cards.remove(card) {
            return Err(GameError::NoSuchCard);
        }
        if card.counts_as_play() {
            self.card_played_this_turn = true;
        }

        debug!(player, ?card, "development card played");
        self.events
            .push(GameEvent::DevelopmentCardPlayed { player, card });
        Ok(cards::apply(card, player, self))
    }

    /// Take two resources from the bank after Year of Plenty
    pub fn choose_year_of_plenty(
        &mut self,
        player: PlayerId,
        first: Resource,
        second: Resource,
    ) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        if self.phase != GamePhase::CardActive(ActiveCard::YearOfPlenty) {
            return Err(GameError::InvalidPhase);
        }

        let hand = &mut self.players[player as usize].resources;
        hand.add(first, 1);
        hand.add(second, 1);
        self.phase = GamePhase::Main;

        self.events.push(GameEvent::YearOfPlentyTaken {
            player,
            resources: (first, second),
        });
        Ok(())
    }

    /// Collect every opponent's stock of `resource` after Monopoly
    pub fn choose_monopoly(&mut self, player: PlayerId, resource: Resource) -> Result<u32, GameError> {
        self.ensure_turn(player)?;
        if self.phase != GamePhase::CardActive(ActiveCard::Monopoly) {
            return Err(GameError::InvalidPhase);
        }

        let mut total = 0;
        for other in 0..self.players.len() {
            if other == player as usize {
                continue;
            }
            let amount = self.players[other].resources.get(resource);
            let (from, to) = pair_mut(&mut self.players, other, player as usize);
            if economy::transfer(&mut from.resources, &mut to.resources, resource, amount).is_ok() {
                total += amount;
            }
        }
        self.phase = GamePhase::Main;

        debug!(player, ?resource, total, "monopoly");
        self.events.push(GameEvent::MonopolyCollected {
            player,
            resource,
            total,
        });
        Ok(total)
    }

    /// Give up the remaining Road Building placements
    pub fn forfeit_free_roads(&mut self, player: PlayerId) -> Result<(), GameError> {
        self.ensure_turn(player)?;
        if !matches!(
            self.phase,
            GamePhase::CardActive(ActiveCard::RoadBuilding { .. })
        ) {
            return Err(GameError::InvalidPhase);
        }
        self.phase = GamePhase::Main;
        Ok(())
    }

    // ==================== Turn Management ====================

    /// End the turn and pass the dice to the next player
    pub fn end_turn(&mut self, player: PlayerId) -> Result<PlayerId, GameError> {
        self.ensure_turn(player)?;
        if !self.in_main_after_roll() {
            return Err(GameError::InvalidPhase);
        }

        self.players[player as usize].end_turn();

        let next_player = (self.current_player + 1) % self.players.len() as PlayerId;
        self.current_player = next_player;
        self.turn_number += 1;
        self.dice_roll_required = true;
        self.card_played_this_turn = false;

        debug!(player, next_player, turn = self.turn_number, "turn ended");
        self.events.push(GameEvent::TurnEnded {
            player,
            next_player,
        });
        Ok(next_player)
    }

    /// Apply a request and return the events it produced
    pub fn apply_action(
        &mut self,
        player: PlayerId,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.is_finished() {
            return Err(GameError::GameOver);
        }

        let start = self.events.len();
        match action {
            GameAction::BuildSettlement(vertex) => accept(self.build_settlement(player, vertex))?,
            GameAction::BuildRoad(edge) => accept(self.build_road(player, edge))?,
            GameAction::BuildCity(vertex) => accept(self.build_city(player, vertex))?,
            GameAction::BankTrade { give, receive } => {
                accept(self.bank_trade(player, give, receive))?
            }
            GameAction::RollDice => {
                self.roll_dice(player)?;
            }
            GameAction::EndTurn => {
                self.end_turn(player)?;
            }
            GameAction::Discard(cards) => self.discard(player, &cards)?,
            GameAction::MoveRobber(tile) => self.move_robber(player, tile)?,
            GameAction::Steal(victim) => {
                self.steal(player, victim)?;
            }
            GameAction::BuyDevelopmentCard => {
                self.buy_development_card(player)?;
            }
            GameAction::PlayDevelopmentCard(card) => {
                self.play_development_card(player, card)?;
            }
            GameAction::ChooseYearOfPlenty(first, second) => {
                self.choose_year_of_plenty(player, first, second)?
            }
            GameAction::ChooseMonopoly(resource) => {
                self.choose_monopoly(player, resource)?;
            }
            GameAction::ForfeitFreeRoads => self.forfeit_free_roads(player)?,
        }

        Ok(self.events.split_off(start))
    }

    // ==================== Bank hooks ====================

    /// Hand resources from the bank to a player (scenario setup and replays)
    #[doc(hidden)]
    pub fn grant_resources(&mut self, player: PlayerId, hand: &ResourceHand) {
        if let Some(p) = self.players.get_mut(player as usize) {
            p.resources.add_hand(hand);
        }
    }

    /// Put a playable development card straight into a player's hand
    #[doc(hidden)]
    pub fn grant_development_card(&mut self, player: PlayerId, card: DevCard) {
        if let Some(p) = self.players.get_mut(player as usize) {
            p.dev_cards.add(card);
        }
    }

    // ==================== Helpers ====================

    fn ensure_turn(&self, player: PlayerId) -> Result<(), GameError> {
        if self.is_finished() {
            return Err(GameError::GameOver);
        }
        if player != self.current_player {
            return Err(GameError::NotYourTurn);
        }
        Ok(())
    }

    fn in_main_after_roll(&self) -> bool {
        self.phase == GamePhase::Main && !self.dice_roll_required
    }

    pub(crate) fn refresh_longest_road(&mut self) {
        let change = self
            .achievements
            .update_longest_road(&self.board, &mut self.players);
        self.record_title_change(change);
    }

    pub(crate) fn refresh_largest_army(&mut self) {
        let change = self.achievements.update_largest_army(&mut self.players);
        self.record_title_change(change);
    }

    fn record_title_change(&mut self, change: Option<TitleChange>) {
        let Some(change) = change else {
            return;
        };
        info!(
            title = ?change.title,
            previous = ?change.previous,
            current = change.current,
            value = change.value,
            "title changed hands"
        );
        self.events.push(match change.title {
            Title::LongestRoad => GameEvent::LongestRoadChanged {
                previous: change.previous,
                current: change.current,
                length: change.value,
            },
            Title::LargestArmy => GameEvent::LargestArmyChanged {
                previous: change.previous,
                current: change.current,
                knights: change.value,
            },
        });
    }

    /// End the game if anyone has reached the target.
    ///
    /// Title transfers can lift a player other than the actor, so every seat
    /// is checked, starting with `actor` and going round in turn order.
    pub(crate) fn check_victory(&mut self, actor: PlayerId) {
        if self.is_finished() {
            return;
        }
        let seats = self.players.len();
        let winner = (0..seats)
            .map(|offset| (actor as usize + offset) % seats)
            .map(|idx| &self.players[idx])
            .find(|p| p.score >= self.victory_points_to_win)
            .map(|p| (p.id, p.score));

        if let Some((player, score)) = winner {
            self.phase = GamePhase::Finished { winner: player };
            info!(player, score, "game won");
            self.events.push(GameEvent::GameWon {
                player,
                victory_points: score,
            });
        }
    }
}

fn accept(result: BuildResult) -> Result<(), GameError> {
    if result.is_success() {
        Ok(())
    } else {
        Err(GameError::Rejected(result))
    }
}

/// Two distinct players borrowed mutably at once
fn pair_mut(players: &mut [Player], a: usize, b: usize) -> (&mut Player, &mut Player) {
    if a < b {
        let (left, right) = players.split_at_mut(b);
        (&mut left[a], &mut right[0])
    } else {
        let (left, right) = players.split_at_mut(a);
        (&mut right[0], &mut left[b])
    }
}
