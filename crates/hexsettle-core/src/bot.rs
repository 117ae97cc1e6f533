//! AI players.
//!
//! Each difficulty tier is an ordered list of greedy heuristics. During its
//! main phase a bot runs down the list, takes the first heuristic that
//! changes the game, and starts over until nothing applies; then it ends the
//! turn. Forced decisions (setup placement, robber, card follow-ups) are
//! handled before the list is consulted.
//!
//! - Easy: random settlement and road spots
//! - Medium: scored settlement spots
//! - Hard: scored settlement spots plus bank trading

use crate::board::{PlayerId, Resource, TileId, VertexId};
use crate::cards::DevCard;
use crate::economy::{costs, ResourceHand};
use crate::game::{ActiveCard, GamePhase, GameState, SetupPlacing};
use crate::player::Player;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

/// Main-phase actions a bot takes in one turn before it ends the turn anyway
const MAX_TURN_ACTIONS: usize = 8;

/// Upper bound on steps in one call to `take_turn`
const MAX_STEPS: usize = 64;

/// Bot difficulty level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown difficulty {0:?} (expected easy, medium or hard)")]
pub struct ParseDifficultyError(String);

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        })
    }
}

/// One greedy rule a bot can try during its main phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Heuristic {
    /// Upgrade a random owned settlement if a city is affordable
    CityUpgrade,
    /// Trade a stack of 4+ for a resource held at zero
    BankTrade,
    /// Play a development card when it helps
    PlayCards,
    /// Settle on a random legal spot
    RandomSettlement,
    /// Settle on the best-scoring legal spot
    ScoredSettlement,
    /// Build a random legal road, only when no settlement spot is open
    RandomRoad,
    /// Buy a development card
    BuyCard,
}

impl Difficulty {
    pub fn heuristics(&self) -> &'static [Heuristic] {
        use Heuristic::*;
        match self {
            Difficulty::Easy => &[CityUpgrade, PlayCards, RandomSettlement, RandomRoad, BuyCard],
            Difficulty::Medium => &[CityUpgrade, PlayCards, ScoredSettlement, RandomRoad, BuyCard],
            Difficulty::Hard => &[
                CityUpgrade,
                BankTrade,
                PlayCards,
                ScoredSettlement,
                RandomRoad,
                BuyCard,
            ],
        }
    }

    fn scores_settlements(&self) -> bool {
        self.heuristics().contains(&Heuristic::ScoredSettlement)
    }
}

/// Where `take_turn` left the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnOutcome {
    /// The bot passed play to someone else
    Ended,
    /// Another player has to act first (a discard, or it isn't our turn)
    Waiting,
    GameOver,
}

enum Step {
    Continue,
    Done(TurnOutcome),
}

/// A bot player that drives one seat
#[derive(Debug, Clone)]
pub struct Bot {
    pub player_id: PlayerId,
    pub difficulty: Difficulty,
    rng: StdRng,
    actions_this_turn: usize,
}

impl Bot {
    pub fn new(player_id: PlayerId, difficulty: Difficulty) -> Self {
        Self::with_rng(player_id, difficulty, StdRng::from_entropy())
    }

    pub fn with_seed(player_id: PlayerId, difficulty: Difficulty, seed: u64) -> Self {
        Self::with_rng(player_id, difficulty, StdRng::seed_from_u64(seed))
    }

    fn with_rng(player_id: PlayerId, difficulty: Difficulty, rng: StdRng) -> Self {
        Self {
            player_id,
            difficulty,
            rng,
            actions_this_turn: 0,
        }
    }

    /// Discard for this seat if a 7 demanded it. Returns whether anything
    /// was discarded.
    pub fn discard_if_required(&mut self, game: &mut GameState) -> bool {
        if game.discard_requirement(self.player_id).is_none() {
            return false;
        }
        let hand = bot_discard(game, self.player_id);
        let ok = game.discard(self.player_id, &hand).is_ok();
        debug!(player = self.player_id, count = hand.total(), ok, "bot discarded");
        ok
    }

    /// Play until the turn passes, the game ends, or someone else must act
    pub fn take_turn(&mut self, game: &mut GameState) -> TurnOutcome {
        if game.is_finished() {
            return TurnOutcome::GameOver;
        }
        self.discard_if_required(game);
        if game.current_player() != self.player_id {
            return TurnOutcome::Waiting;
        }

        for _ in 0..MAX_STEPS {
            if let Step::Done(outcome) = self.step(game) {
                return outcome;
            }
        }

        // Out of steps: pass the turn if the rules allow it
        if game.end_turn(self.player_id).is_ok() {
            self.actions_this_turn = 0;
            TurnOutcome::Ended
        } else {
            TurnOutcome::Waiting
        }
    }

    fn step(&mut self, game: &mut GameState) -> Step {
        let me = self.player_id;
        if game.is_finished() {
            return Step::Done(TurnOutcome::GameOver);
        }
        if game.current_player() != me {
            return Step::Done(TurnOutcome::Ended);
        }

        match game.phase().clone() {
            GamePhase::Finished { .. } => Step::Done(TurnOutcome::GameOver),
            GamePhase::Setup {
                placing: SetupPlacing::Settlement,
                ..
            } => {
                let Some(vertex) = self.pick_settlement(game) else {
                    return Step::Done(TurnOutcome::Waiting);
                };
                progress(game.build_settlement(me, vertex).is_success())
            }
            GamePhase::Setup {
                placing: SetupPlacing::Road,
                ..
            } => {
                let spots = game.valid_road_spots(me);
                let Some(&edge) = spots.choose(&mut self.rng) else {
                    return Step::Done(TurnOutcome::Waiting);
                };
                progress(game.build_road(me, edge).is_success())
            }
            GamePhase::RobberPending => {
                if !game.pending_discards().is_empty() {
                    return Step::Done(TurnOutcome::Waiting);
                }
                if game.robber_must_move() {
                    let tile = self.pick_robber_tile(game);
                    progress(tile.is_some_and(|t| game.move_robber(me, t).is_ok()))
                } else {
                    let victim = richest_victim(game);
                    progress(victim.is_some_and(|v| game.steal(me, v).is_ok()))
                }
            }
            GamePhase::CardActive(ActiveCard::RoadBuilding { .. }) => {
                let spots = game.valid_road_spots(me);
                match spots.choose(&mut self.rng) {
                    Some(&edge) if game.build_road(me, edge).is_success() => Step::Continue,
                    _ => progress(game.forfeit_free_roads(me).is_ok()),
                }
            }
            GamePhase::CardActive(ActiveCard::YearOfPlenty) => {
                let (first, second) = year_of_plenty_choice(game, me);
                progress(game.choose_year_of_plenty(me, first, second).is_ok())
            }
            GamePhase::CardActive(ActiveCard::Monopoly) => {
                let resource = monopoly_target(game, me);
                progress(game.choose_monopoly(me, resource).is_ok())
            }
            GamePhase::Main if game.dice_roll_required() => {
                if self.wants_knight(game)
                    && game.play_development_card(me, DevCard::Knight).is_ok()
                {
                    return Step::Continue;
                }
                progress(game.roll_dice(me).is_ok())
            }
            GamePhase::Main => {
                if self.actions_this_turn < MAX_TURN_ACTIONS && self.run_heuristics(game) {
                    self.actions_this_turn += 1;
                    return Step::Continue;
                }
                self.actions_this_turn = 0;
                match game.end_turn(me) {
                    Ok(_) => Step::Done(TurnOutcome::Ended),
                    Err(_) => Step::Done(TurnOutcome::Waiting),
                }
            }
        }
    }

    /// Try each heuristic in tier order; true once one of them acts
    fn run_heuristics(&mut self, game: &mut GameState) -> bool {
        for &heuristic in self.difficulty.heuristics() {
            let acted = match heuristic {
                Heuristic::CityUpgrade => self.city_upgrade(game),
                Heuristic::BankTrade => self.bank_trade(game),
                Heuristic::PlayCards => self.play_cards(game),
                Heuristic::RandomSettlement | Heuristic::ScoredSettlement => {
                    self.build_settlement(game)
                }
                Heuristic::RandomRoad => self.random_road(game),
                Heuristic::BuyCard => self.buy_card(game),
            };
            if acted {
                debug!(player = self.player_id, ?heuristic, "bot acted");
                return true;
            }
        }
        false
    }

    fn me<'a>(&self, game: &'a GameState) -> Option<&'a Player> {
        game.player(self.player_id)
    }

    fn city_upgrade(&mut self, game: &mut GameState) -> bool {
        if !self.me(game).is_some_and(Player::can_afford_city) {
            return false;
        }
        let spots = game.valid_city_spots(self.player_id);
        match spots.choose(&mut self.rng) {
            Some(&vertex) => game.build_city(self.player_id, vertex).is_success(),
            None => false,
        }
    }

    /// First resource held at zero, paid for with the first one held at 4+
    fn bank_trade(&mut self, game: &mut GameState) -> bool {
        let Some(hand) = self.me(game).map(|p| p.resources.clone()) else {
            return false;
        };
        for want in Resource::ALL.into_iter().filter(|&r| hand.get(r) == 0) {
            for give in Resource::ALL.into_iter().filter(|&r| r != want && hand.get(r) >= 4) {
                if game.bank_trade(self.player_id, give, want).is_success() {
                    return true;
                }
            }
        }
        false
    }

    fn play_cards(&mut self, game: &mut GameState) -> bool {
        let me = self.player_id;
        let Some(player) = self.me(game) else {
            return false;
        };

        if player.has_playable(DevCard::VictoryPoint) {
            return game.play_development_card(me, DevCard::VictoryPoint).is_ok();
        }
        if game.card_played_this_turn() {
            return false;
        }

        let candidates = [
            (DevCard::Knight, self.wants_knight(game)),
            (
                DevCard::RoadBuilding,
                player.roads_remaining() > 0 && !game.valid_road_spots(me).is_empty(),
            ),
            (DevCard::YearOfPlenty, true),
            (
                DevCard::Monopoly,
                game.players()
                    .iter()
                    .any(|p| p.id != me && !p.resources.is_empty()),
            ),
        ];
        for (card, useful) in candidates {
            if useful && player.has_playable(card) {
                return game.play_development_card(me, card).is_ok();
            }
        }
        false
    }

    fn build_settlement(&mut self, game: &mut GameState) -> bool {
        if !self.me(game).is_some_and(Player::can_afford_settlement) {
            return false;
        }
        match self.pick_settlement(game) {
            Some(vertex) => game.build_settlement(self.player_id, vertex).is_success(),
            None => false,
        }
    }

    fn random_road(&mut self, game: &mut GameState) -> bool {
        let me = self.player_id;
        if !self.me(game).is_some_and(Player::can_afford_road) {
            return false;
        }
        // Roads only reach for new spots
        if !game.valid_settlement_spots(me).is_empty() {
            return false;
        }
        let spots = game.valid_road_spots(me);
        match spots.choose(&mut self.rng) {
            Some(&edge) => game.build_road(me, edge).is_success(),
            None => false,
        }
    }

    fn buy_card(&mut self, game: &mut GameState) -> bool {
        if !self.me(game).is_some_and(Player::can_afford_dev_card) || game.dev_cards_remaining() == 0
        {
            return false;
        }
        game.buy_development_card(self.player_id).is_ok()
    }

    /// The tier's settlement pick among legal spots
    fn pick_settlement(&mut self, game: &GameState) -> Option<VertexId> {
        let spots = game.valid_settlement_spots(self.player_id);
        if self.difficulty.scores_settlements() {
            spots
                .into_iter()
                .max_by_key(|&v| settlement_score(game, self.player_id, v))
        } else {
            spots.choose(&mut self.rng).copied()
        }
    }

    /// Best-pips tile with an opponent on it and none of our buildings
    fn pick_robber_tile(&self, game: &GameState) -> Option<TileId> {
        let me = self.player_id;
        let board = game.board();
        let current = board.robber();
        let candidates = || board.tiles().iter().filter(move |t| t.id != current);

        candidates()
            .filter(|t| {
                let occupants = board.players_on_tile(t.id);
                !occupants.contains(&me) && occupants.iter().any(|&p| p != me)
            })
            .max_by_key(|t| t.pips())
            .or_else(|| candidates().find(|t| !board.players_on_tile(t.id).contains(&me)))
            .or_else(|| candidates().next())
            .map(|t| t.id)
    }

    /// Play a knight when the robber sits on us or the army title is in reach
    fn wants_knight(&self, game: &GameState) -> bool {
        let me = self.player_id;
        let Some(player) = self.me(game) else {
            return false;
        };
        if !player.has_playable(DevCard::Knight) || game.card_played_this_turn() {
            return false;
        }

        let robbed = game.board().players_on_tile(game.board().robber()).contains(&me);
        let knights = player.played_knights + 1;
        let rival_best = game
            .players()
            .iter()
            .filter(|p| p.id != me)
            .map(|p| p.played_knights)
            .max()
            .unwrap_or(0);
        let army_in_reach =
            knights >= crate::achievements::MIN_LARGEST_ARMY && knights > rival_best;

        robbed || army_in_reach
    }
}

fn progress(acted: bool) -> Step {
    if acted {
        Step::Continue
    } else {
        Step::Done(TurnOutcome::Waiting)
    }
}

/// Resource kinds any of the player's buildings already collect
fn produced_kinds(game: &GameState, player: PlayerId) -> BTreeSet<Resource> {
    let Some(p) = game.player(player) else {
        return BTreeSet::new();
    };
    p.structures()
        .flat_map(|v| game.board().tiles_at_vertex(v).filter_map(|t| t.resource()))
        .collect()
}

/// `2 * pips + 3 * distinct kinds + 4 * kinds not yet produced`, minus 100
/// next to an opponent's building
pub fn settlement_score(game: &GameState, player: PlayerId, vertex: VertexId) -> i32 {
    let board = game.board();
    let Some(v) = board.vertex(vertex) else {
        return i32::MIN;
    };

    let pips: u32 = board.tiles_at_vertex(vertex).map(|t| t.pips()).sum();
    let kinds: BTreeSet<Resource> = board
        .tiles_at_vertex(vertex)
        .filter_map(|t| t.resource())
        .collect();
    let produced = produced_kinds(game, player);
    let new_kinds = kinds.difference(&produced).count();
    let crowded = v
        .neighbors
        .iter()
        .any(|&n| matches!(board.vertex_owner(n), Some(owner) if owner != player));

    2 * pips as i32 + 3 * kinds.len() as i32 + 4 * new_kinds as i32 - if crowded { 100 } else { 0 }
}

fn richest_victim(game: &GameState) -> Option<PlayerId> {
    game.robber_victims()
        .iter()
        .copied()
        .max_by_key(|&v| game.player(v).map_or(0, |p| p.resources.total()))
}

/// The two scarcest resources, in fixed order on ties
fn year_of_plenty_choice(game: &GameState, player: PlayerId) -> (Resource, Resource) {
    let hand = game
        .player(player)
        .map(|p| p.resources.clone())
        .unwrap_or_default();
    let mut order = Resource::ALL;
    order.sort_by_key(|&r| hand.get(r));
    (order[0], order[1])
}

/// A resource that completes a city or settlement, else the one worth the
/// most bank trades
fn monopoly_target(game: &GameState, player: PlayerId) -> Resource {
    let Some(me) = game.player(player) else {
        return Resource::ALL[0];
    };
    let haul = |r: Resource| -> u32 {
        game.players()
            .iter()
            .filter(|p| p.id != player)
            .map(|p| p.resources.get(r))
            .sum()
    };

    for cost in [costs::city(), costs::settlement()] {
        if me.resources.can_afford(&cost) {
            continue;
        }
        let completes = Resource::ALL.into_iter().find(|&r| {
            let mut after = me.resources.clone();
            after.add(r, haul(r));
            after.can_afford(&cost)
        });
        if let Some(resource) = completes {
            return resource;
        }
    }

    Resource::ALL
        .into_iter()
        .max_by_key(|&r| (haul(r) / game.trade_ratio(player, r), haul(r)))
        .unwrap_or(Resource::ALL[0])
}

/// Cards to throw away on a 7: one at a time from the biggest pile
pub fn bot_discard(game: &GameState, player_id: PlayerId) -> ResourceHand {
    let Some(player) = game.player(player_id) else {
        return ResourceHand::new();
    };
    let Some(required) = game
        .discard_requirement(player_id)
        .or_else(|| player.resources.discard_requirement())
    else {
        return ResourceHand::new();
    };

    let mut remaining = player.resources.clone();
    let mut discard = ResourceHand::new();
    for _ in 0..required {
        let Some(resource) = remaining.most_plentiful() else {
            break;
        };
        if remaining.remove(resource, 1).is_err() {
            break;
        }
        discard.add(resource, 1);
    }
    discard
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::GameConfig;
    use crate::player::ControllerKind;
    use pretty_assertions::assert_eq;

    fn bot_game(players: usize, difficulty: Difficulty, seed: u64) -> (GameState, Vec<Bot>) {
        let config = GameConfig::with_players(players, ControllerKind::Ai(difficulty)).with_seed(seed);
        let game = GameState::new(config).unwrap();
        let bots = (0..players as PlayerId)
            .map(|id| Bot::with_seed(id, difficulty, seed + id as u64))
            .collect();
        (game, bots)
    }

    /// Finish setup on the first legal spots, leaving player 0 to roll
    fn quick_setup(game: &mut GameState) {
        while game.is_setup() {
            let id = game.current_player();
            let vertex = game.valid_settlement_spots(id)[0];
            assert!(game.build_settlement(id, vertex).is_success());
            let edge = game.valid_road_spots(id)[0];
            assert!(game.build_road(id, edge).is_success());
        }
    }

    fn drive(game: &mut GameState, bots: &mut [Bot], max_calls: usize) {
        for _ in 0..max_calls {
            if game.is_finished() {
                return;
            }
            for bot in bots.iter_mut() {
                bot.discard_if_required(game);
            }
            let current = game.current_player() as usize;
            bots[current].take_turn(game);
        }
    }

    #[test]
    fn test_difficulty_parsing() {
        assert_eq!("easy".parse::<Difficulty>(), Ok(Difficulty::Easy));
        assert_eq!(" HARD ".parse::<Difficulty>(), Ok(Difficulty::Hard));
        assert!("expert".parse::<Difficulty>().is_err());
        assert_eq!(Difficulty::default().to_string(), "medium");
    }

    #[test]
    fn test_tier_heuristics() {
        assert!(!Difficulty::Easy.scores_settlements());
        assert!(Difficulty::Medium.scores_settlements());
        assert!(Difficulty::Hard.heuristics().contains(&Heuristic::BankTrade));
        assert!(!Difficulty::Medium.heuristics().contains(&Heuristic::BankTrade));
        assert_eq!(Difficulty::Easy.heuristics()[0], Heuristic::CityUpgrade);
    }

    #[test]
    fn test_bots_complete_setup() {
        let (mut game, mut bots) = bot_game(3, Difficulty::Easy, 5);
        drive(&mut game, &mut bots, 6);
        assert!(!game.is_setup());
        for p in game.players() {
            // Nobody can afford a third building this early
            assert_eq!(p.structure_count(), 2);
            assert!(p.roads.len() >= 2);
        }
    }

    #[test]
    fn test_scored_setup_takes_best_spot() {
        let (mut game, mut bots) = bot_game(2, Difficulty::Medium, 6);
        let before = game.clone();
        let best = before
            .valid_settlement_spots(0)
            .into_iter()
            .map(|v| settlement_score(&before, 0, v))
            .max()
            .unwrap();

        bots[0].take_turn(&mut game);
        let placed = game.player(0).unwrap().first_settlement.unwrap();
        assert_eq!(settlement_score(&before, 0, placed), best);
        assert_eq!(game.player(0).unwrap().roads.len(), 1);
        assert_eq!(game.current_player(), 1);
    }

    #[test]
    fn test_bot_plays_turns() {
        let (mut game, mut bots) = bot_game(4, Difficulty::Hard, 7);
        drive(&mut game, &mut bots, 200);
        assert!(game.turn_number() > 1 || game.is_finished());
        for p in game.players() {
            assert!(p.settlements.len() + p.cities.len() >= 2);
            assert!(p.roads.len() >= 2);
        }
    }

    #[test]
    fn test_discard_from_biggest_pile() {
        let (mut game, _) = bot_game(2, Difficulty::Easy, 8);
        game.grant_resources(1, &ResourceHand::with_amounts(6, 1, 1, 1, 1));
        let discard = bot_discard(&game, 1);
        assert_eq!(discard, ResourceHand::with_amounts(5, 0, 0, 0, 0));

        let (empty, _) = bot_game(2, Difficulty::Easy, 8);
        assert_eq!(bot_discard(&empty, 0).total(), 0);
    }

    #[test]
    fn test_hard_bank_trade_fills_gap() {
        let (mut game, mut bots) = bot_game(2, Difficulty::Hard, 9);
        quick_setup(&mut game);
        game.resolve_roll(0, 2).unwrap();

        let hand = ResourceHand::with_amounts(0, 5, 1, 1, 1);
        game.players[0].resources = hand;
        assert!(bots[0].bank_trade(&mut game));
        assert_eq!(game.player(0).unwrap().resources.brick, 1);
    }

    #[test]
    fn test_robber_avoids_own_tiles() {
        let (mut game, bots) = bot_game(2, Difficulty::Medium, 10);
        quick_setup(&mut game);
        let tile = bots[0].pick_robber_tile(&game).unwrap();
        assert_ne!(tile, game.board().robber());
        assert!(!game.board().players_on_tile(tile).contains(&0));
    }

    #[test]
    fn test_monopoly_completes_city() {
        let (mut game, _) = bot_game(2, Difficulty::Medium, 11);
        game.players[0].resources = ResourceHand::with_amounts(0, 0, 1, 2, 0);
        game.players[1].resources = ResourceHand::with_amounts(3, 0, 2, 0, 0);
        assert_eq!(monopoly_target(&game, 0), Resource::Ore);
    }

    #[test]
    fn test_year_of_plenty_picks_missing() {
        let (mut game, _) = bot_game(2, Difficulty::Easy, 12);
        game.players[0].resources = ResourceHand::with_amounts(2, 0, 3, 0, 1);
        assert_eq!(
            year_of_plenty_choice(&game, 0),
            (Resource::Wood, Resource::Grain)
        );
    }
}
