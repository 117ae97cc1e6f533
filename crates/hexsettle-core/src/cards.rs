//! Development cards.
//!
//! Card kinds form a closed set. Playing a card goes through [`apply`], which
//! performs the immediate part of the effect and reports what (if anything)
//! the actor still has to supply: a robber target, free road placements, or
//! a resource choice.

use crate::board::PlayerId;
use crate::game::{ActiveCard, GamePhase, GameState};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Free roads granted by Road Building
pub const FREE_ROADS: u8 = 2;

/// Development card types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DevCard {
    /// Move robber and steal, counts toward Largest Army
    Knight,
    /// Build 2 roads for free
    RoadBuilding,
    /// Take any 2 resources from the bank
    YearOfPlenty,
    /// All players must give you all of one resource type
    Monopoly,
    /// Worth 1 VP when played
    VictoryPoint,
}

impl DevCard {
    pub const ALL: [DevCard; 5] = [
        DevCard::Knight,
        DevCard::RoadBuilding,
        DevCard::YearOfPlenty,
        DevCard::Monopoly,
        DevCard::VictoryPoint,
    ];

    /// Create the standard development card deck (25 cards), shuffled
    pub fn standard_deck<R: Rng>(rng: &mut R) -> Vec<DevCard> {
        let mut deck = Vec::with_capacity(25);
        deck.extend(std::iter::repeat(DevCard::Knight).take(14));
        deck.extend(std::iter::repeat(DevCard::VictoryPoint).take(5));
        deck.extend(std::iter::repeat(DevCard::RoadBuilding).take(2));
        deck.extend(std::iter::repeat(DevCard::YearOfPlenty).take(2));
        deck.extend(std::iter::repeat(DevCard::Monopoly).take(2));
        deck.shuffle(rng);
        deck
    }

    /// Victory Point cards don't count toward the one-card-per-turn limit
    pub fn counts_as_play(&self) -> bool {
        !matches!(self, DevCard::VictoryPoint)
    }
}

/// Development card counts
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevCardHand {
    pub knight: u32,
    pub road_building: u32,
    pub year_of_plenty: u32,
    pub monopoly: u32,
    pub victory_point: u32,
}

impl DevCardHand {
    pub fn get(&self, card: DevCard) -> u32 {
        match card {
            DevCard::Knight => self.knight,
            DevCard::RoadBuilding => self.road_building,
            DevCard::YearOfPlenty => self.year_of_plenty,
            DevCard::Monopoly => self.monopoly,
            DevCard::VictoryPoint => self.victory_point,
        }
    }

    fn slot(&mut self, card: DevCard) -> &mut u32 {
        match card {
            DevCard::Knight => &mut self.knight,
            DevCard::RoadBuilding => &mut self.road_building,
            DevCard::YearOfPlenty => &mut self.year_of_plenty,
            DevCard::Monopoly => &mut self.monopoly,
            DevCard::VictoryPoint => &mut self.victory_point,
        }
    }

    pub fn add(&mut self, card: DevCard) {
        *self.slot(card) += 1;
    }

    /// Take one card out of the hand. Returns false if there is none.
    pub fn remove(&mut self, card: DevCard) -> bool {
        let slot = self.slot(card);
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    pub fn merge(&mut self, other: &DevCardHand) {
        for card in DevCard::ALL {
            *self.slot(card) += other.get(card);
        }
    }

    pub fn total(&self) -> u32 {
        DevCard::ALL.iter().map(|&card| self.get(card)).sum()
    }
}

/// What playing a card did, and what the actor must supply next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardEffect {
    /// Robber must be moved (and a victim robbed) before play continues
    RobberActivated,
    /// This many road placements are free of cost
    FreeRoads(u8),
    /// Two resources of the actor's choice are waiting to be named
    AwaitingResourceChoice,
    /// The resource to monopolize is waiting to be named
    AwaitingMonopolyChoice,
    /// +1 score applied immediately
    VictoryPoint,
    /// The knight took Largest Army and its points ended the game
    GameWon,
}

/// Apply a card's effect for `actor`.
///
/// The card has already been taken out of the actor's hand.
pub fn apply(card: DevCard, actor: PlayerId, state: &mut GameState) -> CardEffect {
    match card {
        DevCard::Knight => {
            if let Some(player) = state.players.get_mut(actor as usize) {
                player.played_knights += 1;
            }
            state.refresh_largest_army();
            state.check_victory(actor);
            if state.is_finished() {
                return CardEffect::GameWon;
            }
            state.activate_robber();
            CardEffect::RobberActivated
        }
        DevCard::RoadBuilding => {
            let supply = state
                .players
                .get(actor as usize)
                .map_or(0, |p| p.roads_remaining());
            let roads_left = FREE_ROADS.min(supply as u8);
            if roads_left > 0 {
                state.phase = GamePhase::CardActive(ActiveCard::RoadBuilding { roads_left });
            }
            CardEffect::FreeRoads(roads_left)
        }
        DevCard::YearOfPlenty => {
            state.phase = GamePhase::CardActive(ActiveCard::YearOfPlenty);
            CardEffect::AwaitingResourceChoice
        }
        DevCard::Monopoly => {
            state.phase = GamePhase::CardActive(ActiveCard::Monopoly);
            CardEffect::AwaitingMonopolyChoice
        }
        DevCard::VictoryPoint => {
            if let Some(player) = state.players.get_mut(actor as usize) {
                player.score += 1;
            }
            state.check_victory(actor);
            CardEffect::VictoryPoint
        }
    }
}
