//! Game actions that players can take.
//!
//! This module defines all possible requests a client can make, the events
//! that result from them, and the result codes returned by build and trade
//! requests.

use crate::board::{EdgeId, PlayerId, Resource, TileId, VertexId};
use crate::cards::DevCard;
use crate::economy::ResourceHand;
use serde::{Deserialize, Serialize};

/// Outcome of a build or trade request.
///
/// Every code other than `Success` and `UpgradedToCity` means the game state
/// was left untouched.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildResult {
    Success,
    /// No roads left in supply
    TooManyRoads,
    /// No settlements left in supply
    TooManySettlements,
    /// No cities left in supply
    TooManyCities,
    /// Target doesn't join the player's network
    NotConnected,
    InsufficientResources,
    /// Edge doesn't exist or is already taken
    InvalidEdge,
    /// Vertex doesn't exist, is taken, or breaks the distance rule
    InvalidVertex,
    /// A settlement became a city
    UpgradedToCity,
    /// Not the player's turn, or the current phase doesn't allow this request
    WrongPhase,
    /// Trading a resource for itself
    InvalidTrade,
}

impl BuildResult {
    /// Whether the request changed the game
    pub fn is_success(&self) -> bool {
        matches!(self, BuildResult::Success | BuildResult::UpgradedToCity)
    }
}

/// All possible requests a player can make
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    // ==================== Building ====================
    /// Place a settlement (free during setup). On the player's own settlement
    /// this upgrades it to a city.
    BuildSettlement(VertexId),
    /// Place a road (free during setup and Road Building)
    BuildRoad(EdgeId),
    /// Upgrade a settlement to a city
    BuildCity(VertexId),

    // ==================== Turn Actions ====================
    /// Roll the dice (must be done at start of turn)
    RollDice,
    /// End your turn
    EndTurn,

    // ==================== Robber Actions ====================
    /// Discard cards when you have more than 7 after a 7 is rolled
    Discard(ResourceHand),
    /// Move the robber to a new tile
    MoveRobber(TileId),
    /// Choose a player to steal from (after moving robber)
    Steal(PlayerId),

    // ==================== Development Cards ====================
    /// Buy a development card from the deck
    BuyDevelopmentCard,
    /// Play a development card from hand
    PlayDevelopmentCard(DevCard),
    /// Name the two resources for Year of Plenty
    ChooseYearOfPlenty(Resource, Resource),
    /// Name the resource for Monopoly
    ChooseMonopoly(Resource),
    /// Give up remaining Road Building placements
    ForfeitFreeRoads,

    // ==================== Trading ====================
    /// Trade with the bank (4:1) or harbor (3:1 or 2:1)
    BankTrade { give: Resource, receive: Resource },
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Dice were rolled
    DiceRolled { player: PlayerId, total: u8 },

    /// Resources were distributed after a dice roll or second setup settlement
    ResourcesDistributed {
        distributions: Vec<(PlayerId, Resource, u32)>,
    },

    /// A player holds too many cards on a 7
    DiscardRequired { player: PlayerId, count: u32 },

    /// Player discarded cards
    CardsDiscarded { player: PlayerId, count: u32 },

    /// A settlement was built
    SettlementBuilt { player: PlayerId, vertex: VertexId },

    /// A settlement was upgraded to a city
    CityBuilt { player: PlayerId, vertex: VertexId },

    /// A road was built
    RoadBuilt {
        player: PlayerId,
        edge: EdgeId,
        free: bool,
    },

    /// Every player has placed their starting pieces
    SetupCompleted,

    /// A development card was purchased
    DevelopmentCardPurchased { player: PlayerId },

    /// A development card was played
    DevelopmentCardPlayed { player: PlayerId, card: DevCard },

    /// Year of plenty resources were taken
    YearOfPlentyTaken {
        player: PlayerId,
        resources: (Resource, Resource),
    },

    /// Monopoly collected a resource from every opponent
    MonopolyCollected {
        player: PlayerId,
        resource: Resource,
        total: u32,
    },

    /// The robber was moved
    RobberMoved {
        player: PlayerId,
        from: TileId,
        to: TileId,
    },

    /// A resource was stolen
    ResourceStolen {
        thief: PlayerId,
        victim: PlayerId,
        resource: Option<Resource>,
    },

    /// Bank trade completed
    BankTradeCompleted {
        player: PlayerId,
        gave: Resource,
        gave_count: u32,
        received: Resource,
    },

    /// Longest road changed hands
    LongestRoadChanged {
        previous: Option<PlayerId>,
        current: PlayerId,
        length: u32,
    },

    /// Largest army changed hands
    LargestArmyChanged {
        previous: Option<PlayerId>,
        current: PlayerId,
        knights: u32,
    },

    /// Turn ended
    TurnEnded {
        player: PlayerId,
        next_player: PlayerId,
    },

    /// A player won the game
    GameWon {
        player: PlayerId,
        victory_points: u32,
    },
}
