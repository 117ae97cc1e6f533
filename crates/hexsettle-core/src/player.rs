//! Player state.
//!
//! This module contains:
//! - Player struct with resources, development cards, owned structures and score
//! - Controller kind (human or AI tier) so any player can be built without a UI
//! - Player colors for rendering collaborators

use crate::board::{EdgeId, PlayerId, VertexId};
use crate::bot::Difficulty;
use crate::cards::{DevCard, DevCardHand};
use crate::economy::{costs, ResourceHand};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Roads in each player's supply
pub const MAX_ROADS: usize = 15;
/// Settlements in each player's supply
pub const MAX_SETTLEMENTS: usize = 5;
/// Cities in each player's supply
pub const MAX_CITIES: usize = 4;

/// Player color for UI rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerColor {
    Red,
    Blue,
    Orange,
    White,
    Green,
    Brown,
}

impl PlayerColor {
    /// Get color for a player index
    pub fn for_player(id: PlayerId) -> Self {
        match id % 6 {
            0 => PlayerColor::Red,
            1 => PlayerColor::Blue,
            2 => PlayerColor::Orange,
            3 => PlayerColor::White,
            4 => PlayerColor::Green,
            _ => PlayerColor::Brown,
        }
    }

    /// Get hex color code for rendering
    pub fn hex_code(&self) -> u32 {
        match self {
            PlayerColor::Red => 0xE74C3C,
            PlayerColor::Blue => 0x3498DB,
            PlayerColor::Orange => 0xE67E22,
            PlayerColor::White => 0xECF0F1,
            PlayerColor::Green => 0x27AE60,
            PlayerColor::Brown => 0x8E5B3A,
        }
    }
}

/// Who makes decisions for a player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ControllerKind {
    /// Requests arrive from an external client
    #[default]
    Human,
    /// Turns are played by the built-in strategy engine
    Ai(Difficulty),
}

impl ControllerKind {
    pub fn is_ai(&self) -> bool {
        matches!(self, ControllerKind::Ai(_))
    }

    pub fn difficulty(&self) -> Option<Difficulty> {
        match self {
            ControllerKind::Ai(difficulty) => Some(*difficulty),
            ControllerKind::Human => None,
        }
    }
}

/// A single player's state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Player ID (turn order index)
    pub id: PlayerId,
    /// Display name
    pub name: String,
    /// Player color
    pub color: PlayerColor,
    pub controller: ControllerKind,
    /// Current resources
    pub resources: ResourceHand,
    /// Development cards that can be played
    pub dev_cards: DevCardHand,
    /// Development cards bought this turn (can't be played same turn)
    pub new_dev_cards: DevCardHand,
    /// Vertices holding this player's settlements
    pub settlements: BTreeSet<VertexId>,
    /// Vertices holding this player's cities
    pub cities: BTreeSet<VertexId>,
    /// Edges holding this player's roads
    pub roads: BTreeSet<EdgeId>,
    /// Victory points: buildings, titles and played VP cards
    pub score: u32,
    /// Number of knights played (for Largest Army)
    pub played_knights: u32,
    /// Whether this player has the Longest Road title
    pub has_longest_road: bool,
    /// Whether this player has the Largest Army title
    pub has_largest_army: bool,
    /// First settlement placed during setup
    pub first_settlement: Option<VertexId>,
    /// Second settlement placed during setup; it pays out its adjacent tiles
    pub second_settlement: Option<VertexId>,
}

impl Player {
    /// Create a new player
    pub fn new(id: PlayerId, name: impl Into<String>, controller: ControllerKind) -> Self {
        Self {
            id,
            name: name.into(),
            color: PlayerColor::for_player(id),
            controller,
            resources: ResourceHand::new(),
            dev_cards: DevCardHand::default(),
            new_dev_cards: DevCardHand::default(),
            settlements: BTreeSet::new(),
            cities: BTreeSet::new(),
            roads: BTreeSet::new(),
            score: 0,
            played_knights: 0,
            has_longest_road: false,
            has_largest_army: false,
            first_settlement: None,
            second_settlement: None,
        }
    }

    pub fn is_ai(&self) -> bool {
        self.controller.is_ai()
    }

    pub fn roads_remaining(&self) -> usize {
        MAX_ROADS.saturating_sub(self.roads.len())
    }

    /// Upgrading to a city returns the settlement piece to supply
    pub fn settlements_remaining(&self) -> usize {
        MAX_SETTLEMENTS.saturating_sub(self.settlements.len())
    }

    pub fn cities_remaining(&self) -> usize {
        MAX_CITIES.saturating_sub(self.cities.len())
    }

    /// Settlements and cities on the board
    pub fn structure_count(&self) -> usize {
        self.settlements.len() + self.cities.len()
    }

    /// Vertices holding any of this player's buildings
    pub fn structures(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.settlements.iter().chain(self.cities.iter()).copied()
    }

    pub fn owns_structure_at(&self, vertex: VertexId) -> bool {
        self.settlements.contains(&vertex) || self.cities.contains(&vertex)
    }

    pub fn can_afford_road(&self) -> bool {
        self.resources.can_afford(&costs::road()) && self.roads_remaining() > 0
    }

    pub fn can_afford_settlement(&self) -> bool {
        self.resources.can_afford(&costs::settlement()) && self.settlements_remaining() > 0
    }

    pub fn can_afford_city(&self) -> bool {
        self.resources.can_afford(&costs::city()) && self.cities_remaining() > 0
    }

    pub fn can_afford_dev_card(&self) -> bool {
        self.resources.can_afford(&costs::development_card())
    }

    /// Check if player has a playable development card of given type
    pub fn has_playable(&self, card: DevCard) -> bool {
        self.dev_cards.get(card) > 0
    }

    /// All unplayed development cards, playable or not
    pub fn dev_card_count(&self) -> u32 {
        self.dev_cards.total() + self.new_dev_cards.total()
    }

    /// Called at end of turn - move bought cards to playable pile
    pub fn end_turn(&mut self) {
        let bought = std::mem::take(&mut self.new_dev_cards);
        self.dev_cards.merge(&bought);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player_has_full_supply() {
        let player = Player::new(2, "Test", ControllerKind::Human);
        assert_eq!(player.color, PlayerColor::Orange);
        assert_eq!(player.roads_remaining(), 15);
        assert_eq!(player.settlements_remaining(), 5);
        assert_eq!(player.cities_remaining(), 4);
        assert_eq!(player.score, 0);
    }

    #[test]
    fn test_city_returns_settlement_piece() {
        let mut player = Player::new(0, "Test", ControllerKind::Human);
        player.settlements.extend([3, 9]);
        assert_eq!(player.settlements_remaining(), 3);

        player.settlements.remove(&3);
        player.cities.insert(3);
        assert_eq!(player.settlements_remaining(), 4);
        assert_eq!(player.cities_remaining(), 3);
        assert_eq!(player.structure_count(), 2);
        assert!(player.owns_structure_at(3));
    }

    #[test]
    fn test_can_afford_road_needs_supply() {
        let mut player = Player::new(0, "Test", ControllerKind::Human);
        player.resources = ResourceHand::with_amounts(5, 5, 5, 5, 5);
        assert!(player.can_afford_road());

        player.roads.extend(0..MAX_ROADS);
        assert!(!player.can_afford_road());
    }

    #[test]
    fn test_dev_card_bought_this_turn() {
        let mut player = Player::new(0, "Test", ControllerKind::Ai(Difficulty::Easy));
        player.new_dev_cards.add(DevCard::Knight);

        assert!(!player.has_playable(DevCard::Knight));
        assert_eq!(player.dev_card_count(), 1);

        player.end_turn();

        assert!(player.has_playable(DevCard::Knight));
        assert_eq!(player.new_dev_cards.total(), 0);
        assert!(player.is_ai());
    }

    #[test]
    fn test_six_distinct_colors() {
        let colors: std::collections::HashSet<u32> =
            (0..6).map(|id| PlayerColor::for_player(id).hex_code()).collect();
        assert_eq!(colors.len(), 6);
    }
}
