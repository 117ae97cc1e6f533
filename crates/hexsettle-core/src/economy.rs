//! Resource bank operations.
//!
//! This module contains:
//! - `ResourceHand` for managing resource counts
//! - Building and development card costs
//! - Sufficiency-checked add/remove/transfer/trade primitives used by
//!   builds, development cards and the robber
//!
//! The bank itself has unlimited stock; only player hands can run short, and
//! every primitive checks the hand before touching it.

use crate::board::{HarborKind, Resource};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hands above this size must discard half on a 7.
pub const DISCARD_THRESHOLD: u32 = 7;

/// Bank trade ratio without any harbor.
pub const DEFAULT_TRADE_RATIO: u32 = 4;

/// Reasons a resource operation is refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum EconomyError {
    #[error("not enough resources")]
    InsufficientResources,

    #[error("cannot trade a resource for itself")]
    SameResource,
}

/// A hand of resources
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHand {
    pub brick: u32,
    pub wood: u32,
    pub ore: u32,
    pub grain: u32,
    pub wool: u32,
}

impl ResourceHand {
    /// Create an empty hand
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hand with specific amounts
    pub fn with_amounts(brick: u32, wood: u32, ore: u32, grain: u32, wool: u32) -> Self {
        Self {
            brick,
            wood,
            ore,
            grain,
            wool,
        }
    }

    /// Create a hand with a single resource
    pub fn single(resource: Resource, amount: u32) -> Self {
        let mut hand = Self::new();
        hand.add(resource, amount);
        hand
    }

    /// Total number of resource cards
    pub fn total(&self) -> u32 {
        self.brick + self.wood + self.ore + self.grain + self.wool
    }

    /// Check if hand is empty
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Get count of a specific resource
    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Brick => self.brick,
            Resource::Wood => self.wood,
            Resource::Ore => self.ore,
            Resource::Grain => self.grain,
            Resource::Wool => self.wool,
        }
    }

    fn slot(&mut self, resource: Resource) -> &mut u32 {
        match resource {
            Resource::Brick => &mut self.brick,
            Resource::Wood => &mut self.wood,
            Resource::Ore => &mut self.ore,
            Resource::Grain => &mut self.grain,
            Resource::Wool => &mut self.wool,
        }
    }

    /// Set count of a specific resource
    pub fn set(&mut self, resource: Resource, count: u32) {
        *self.slot(resource) = count;
    }

    /// Add resources to hand
    pub fn add(&mut self, resource: Resource, amount: u32) {
        *self.slot(resource) += amount;
    }

    /// Add another hand to this one
    pub fn add_hand(&mut self, other: &ResourceHand) {
        for (resource, amount) in other.iter() {
            self.add(resource, amount);
        }
    }

    /// Check if can afford a cost
    pub fn can_afford(&self, cost: &ResourceHand) -> bool {
        Resource::ALL
            .iter()
            .all(|&resource| self.get(resource) >= cost.get(resource))
    }

    /// Remove `amount` of one resource. Nothing changes when short.
    pub fn remove(&mut self, resource: Resource, amount: u32) -> Result<(), EconomyError> {
        let slot = self.slot(resource);
        if *slot < amount {
            return Err(EconomyError::InsufficientResources);
        }
        *slot -= amount;
        Ok(())
    }

    /// Remove a whole cost. Nothing changes when any part is short.
    pub fn remove_hand(&mut self, cost: &ResourceHand) -> Result<(), EconomyError> {
        if !self.can_afford(cost) {
            return Err(EconomyError::InsufficientResources);
        }
        for (resource, amount) in cost.iter() {
            *self.slot(resource) -= amount;
        }
        Ok(())
    }

    /// Remove every card of one resource, returning how many there were
    pub fn take_all(&mut self, resource: Resource) -> u32 {
        std::mem::take(self.slot(resource))
    }

    /// Remove a random card (for robber stealing)
    pub fn steal_random<R: Rng>(&mut self, rng: &mut R) -> Option<Resource> {
        let available: Vec<Resource> = self
            .iter()
            .flat_map(|(resource, amount)| std::iter::repeat(resource).take(amount as usize))
            .collect();

        let resource = *available.choose(rng)?;
        *self.slot(resource) -= 1;
        Some(resource)
    }

    /// Resources with their counts, in fixed resource order
    pub fn iter(&self) -> impl Iterator<Item = (Resource, u32)> + '_ {
        Resource::ALL.iter().map(move |&r| (r, self.get(r)))
    }

    /// Resource this hand holds the most of (first in fixed order on ties)
    pub fn most_plentiful(&self) -> Option<Resource> {
        let mut best: Option<(Resource, u32)> = None;
        for (resource, amount) in self.iter() {
            if amount > 0 && best.map_or(true, |(_, n)| amount > n) {
                best = Some((resource, amount));
            }
        }
        best.map(|(resource, _)| resource)
    }

    /// How many cards must be discarded on a 7, if any
    pub fn discard_requirement(&self) -> Option<u32> {
        let total = self.total();
        (total > DISCARD_THRESHOLD).then_some(total / 2)
    }
}

/// Building costs
pub mod costs {
    use super::ResourceHand;

    /// Cost to build a road: 1 brick, 1 wood
    pub fn road() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 0, 0, 0)
    }

    /// Cost to build a settlement: 1 brick, 1 wood, 1 grain, 1 wool
    pub fn settlement() -> ResourceHand {
        ResourceHand::with_amounts(1, 1, 0, 1, 1)
    }

    /// Cost to upgrade to city: 3 ore, 2 grain
    pub fn city() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 3, 2, 0)
    }

    /// Cost to buy a development card: 1 ore, 1 grain, 1 wool
    pub fn development_card() -> ResourceHand {
        ResourceHand::with_amounts(0, 0, 1, 1, 1)
    }
}

/// Bank trade ratio for giving `resource`, given the harbors a player can use.
pub fn trade_ratio(harbors: &[HarborKind], resource: Resource) -> u32 {
    harbors
        .iter()
        .filter(|harbor| match harbor {
            HarborKind::Generic => true,
            HarborKind::Specific(kind) => *kind == resource,
        })
        .map(HarborKind::rate)
        .min()
        .unwrap_or(DEFAULT_TRADE_RATIO)
}

/// Trade `ratio` cards of `give` to the bank for one `receive`.
pub fn bank_trade(
    hand: &mut ResourceHand,
    give: Resource,
    receive: Resource,
    ratio: u32,
) -> Result<(), EconomyError> {
    if give == receive {
        return Err(EconomyError::SameResource);
    }
    hand.remove(give, ratio)?;
    hand.add(receive, 1);
    Ok(())
}

/// Move `amount` of one resource between two hands.
pub fn transfer(
    from: &mut ResourceHand,
    to: &mut ResourceHand,
    resource: Resource,
    amount: u32,
) -> Result<(), EconomyError> {
    from.remove(resource, amount)?;
    to.add(resource, amount);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_resource_hand_total() {
        let hand = ResourceHand::with_amounts(1, 2, 3, 4, 5);
        assert_eq!(hand.total(), 15);
    }

    #[test]
    fn test_resource_hand_can_afford() {
        let hand = ResourceHand::with_amounts(2, 2, 2, 2, 2);
        let cost = ResourceHand::with_amounts(1, 1, 1, 1, 1);
        assert!(hand.can_afford(&cost));

        let expensive = ResourceHand::with_amounts(3, 0, 0, 0, 0);
        assert!(!hand.can_afford(&expensive));
    }

    #[test]
    fn test_remove_hand_is_all_or_nothing() {
        let mut hand = ResourceHand::with_amounts(1, 0, 5, 5, 5);
        let before = hand.clone();
        assert_eq!(
            hand.remove_hand(&costs::road()),
            Err(EconomyError::InsufficientResources)
        );
        assert_eq!(hand, before);
    }

    #[test]
    fn test_road_cost_round_trip() {
        let mut hand = ResourceHand::with_amounts(2, 3, 1, 0, 4);
        let before = hand.clone();
        hand.remove_hand(&costs::road()).unwrap();
        hand.add(Resource::Brick, 1);
        hand.add(Resource::Wood, 1);
        assert_eq!(hand, before);
    }

    #[test]
    fn test_building_costs() {
        assert_eq!(costs::road().total(), 2);
        assert_eq!(costs::settlement().total(), 4);
        assert_eq!(costs::city().total(), 5);
        assert_eq!(costs::development_card().total(), 3);
    }

    #[test]
    fn test_trade_ratio() {
        assert_eq!(trade_ratio(&[], Resource::Brick), 4);
        assert_eq!(trade_ratio(&[HarborKind::Generic], Resource::Brick), 3);
        assert_eq!(
            trade_ratio(
                &[HarborKind::Generic, HarborKind::Specific(Resource::Brick)],
                Resource::Brick
            ),
            2
        );
        assert_eq!(
            trade_ratio(&[HarborKind::Specific(Resource::Ore)], Resource::Brick),
            4
        );
    }

    #[test]
    fn test_bank_trade() {
        let mut hand = ResourceHand::with_amounts(4, 0, 0, 0, 0);
        bank_trade(&mut hand, Resource::Brick, Resource::Ore, 4).unwrap();
        assert_eq!(hand, ResourceHand::with_amounts(0, 0, 1, 0, 0));

        let mut short = ResourceHand::with_amounts(3, 0, 0, 0, 0);
        assert_eq!(
            bank_trade(&mut short, Resource::Brick, Resource::Ore, 4),
            Err(EconomyError::InsufficientResources)
        );
        assert_eq!(short.brick, 3);

        assert_eq!(
            bank_trade(&mut hand, Resource::Ore, Resource::Ore, 1),
            Err(EconomyError::SameResource)
        );
    }

    #[test]
    fn test_transfer() {
        let mut a = ResourceHand::with_amounts(0, 0, 0, 2, 0);
        let mut b = ResourceHand::new();
        transfer(&mut a, &mut b, Resource::Grain, 2).unwrap();
        assert_eq!(b.grain, 2);
        assert!(a.is_empty());
        assert!(transfer(&mut a, &mut b, Resource::Grain, 1).is_err());
    }

    #[test]
    fn test_discard_requirement() {
        assert_eq!(ResourceHand::with_amounts(2, 2, 2, 1, 0).discard_requirement(), None);
        assert_eq!(ResourceHand::with_amounts(2, 2, 2, 2, 1).discard_requirement(), Some(4));
        assert_eq!(ResourceHand::with_amounts(4, 3, 3, 0, 0).discard_requirement(), Some(5));
    }

    #[test]
    fn test_steal_random() {
        let mut hand = ResourceHand::with_amounts(0, 0, 0, 1, 0);
        let mut rng = rand::thread_rng();

        let stolen = hand.steal_random(&mut rng);
        assert_eq!(stolen, Some(Resource::Grain));
        assert!(hand.is_empty());
        assert_eq!(hand.steal_random(&mut rng), None);
    }
}
