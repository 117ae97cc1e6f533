//! Display-ready views of a game.
//!
//! A [`GameSnapshot`] is a plain, owned copy of everything a renderer needs.
//! Nothing in it points back into the live state.

use crate::achievements::longest_road;
use crate::board::{EdgeId, HarborKind, PlayerId, TileId, TileType, VertexBuilding, VertexId};
use crate::cards::DevCardHand;
use crate::economy::ResourceHand;
use crate::game::{GamePhase, GameState};
use crate::hex::{HexCoord, Point};
use crate::player::{ControllerKind, PlayerColor};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileSnapshot {
    pub id: TileId,
    pub coord: HexCoord,
    pub center: Point,
    pub tile_type: TileType,
    pub number: u8,
    pub has_robber: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VertexSnapshot {
    pub id: VertexId,
    pub position: Point,
    pub building: VertexBuilding,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSnapshot {
    pub id: EdgeId,
    pub from: Point,
    pub to: Point,
    pub owner: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HarborSnapshot {
    pub edge: EdgeId,
    pub position: Point,
    pub kind: HarborKind,
}

/// Public counts for every player, plus the private hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub color: PlayerColor,
    pub controller: ControllerKind,
    pub score: u32,
    pub resource_count: u32,
    pub dev_card_count: u32,
    pub played_knights: u32,
    pub road_length: u32,
    pub settlements: usize,
    pub cities: usize,
    pub roads: usize,
    pub has_longest_road: bool,
    pub has_largest_army: bool,
    pub resources: ResourceHand,
    pub dev_cards: DevCardHand,
}

/// Everything needed to draw the table and the status bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub phase: GamePhase,
    pub current_player: PlayerId,
    pub turn_number: u32,
    pub last_roll: Option<u8>,
    pub dice_roll_required: bool,
    pub robber_must_move: bool,
    pub robber: TileId,
    pub pending_discards: BTreeMap<PlayerId, u32>,
    pub longest_road_holder: Option<PlayerId>,
    pub largest_army_holder: Option<PlayerId>,
    pub dev_cards_remaining: usize,
    pub tiles: Vec<TileSnapshot>,
    pub vertices: Vec<VertexSnapshot>,
    pub edges: Vec<EdgeSnapshot>,
    pub harbors: Vec<HarborSnapshot>,
    pub players: Vec<PlayerSnapshot>,
}

impl GameSnapshot {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Copy with other players' hands cleared, for sending to `viewer`
    pub fn for_viewer(&self, viewer: PlayerId) -> Self {
        let mut view = self.clone();
        for player in view.players.iter_mut().filter(|p| p.id != viewer) {
            player.resources = ResourceHand::new();
            player.dev_cards = DevCardHand::default();
        }
        view
    }
}

impl GameState {
    pub fn snapshot(&self) -> GameSnapshot {
        let board = self.board();
        let robber = board.robber();
        let position = |v: VertexId| board.vertices()[v].position;

        GameSnapshot {
            phase: self.phase().clone(),
            current_player: self.current_player(),
            turn_number: self.turn_number(),
            last_roll: self.last_roll(),
            dice_roll_required: self.dice_roll_required(),
            robber_must_move: self.robber_must_move(),
            robber,
            pending_discards: self.pending_discards().clone(),
            longest_road_holder: self.longest_road_holder(),
            largest_army_holder: self.largest_army_holder(),
            dev_cards_remaining: self.dev_cards_remaining(),
            tiles: board
                .tiles()
                .iter()
                .map(|t| TileSnapshot {
                    id: t.id,
                    coord: t.coord,
                    center: t.center,
                    tile_type: t.tile_type,
                    number: t.number,
                    has_robber: t.id == robber,
                })
                .collect(),
            vertices: board
                .vertices()
                .iter()
                .map(|v| VertexSnapshot {
                    id: v.id,
                    position: v.position,
                    building: v.building,
                })
                .collect(),
            edges: board
                .edges()
                .iter()
                .map(|e| EdgeSnapshot {
                    id: e.id,
                    from: position(e.vertices[0]),
                    to: position(e.vertices[1]),
                    owner: e.owner(),
                })
                .collect(),
            harbors: board
                .harbors()
                .iter()
                .map(|h| HarborSnapshot {
                    edge: h.edge,
                    position: board.edge_midpoint(h.edge),
                    kind: h.kind,
                })
                .collect(),
            players: self
                .players()
                .iter()
                .map(|p| PlayerSnapshot {
                    id: p.id,
                    name: p.name.clone(),
                    color: p.color,
                    controller: p.controller,
                    score: p.score,
                    resource_count: p.resources.total(),
                    dev_card_count: p.dev_card_count(),
                    played_knights: p.played_knights,
                    road_length: longest_road(board, p.id),
                    settlements: p.settlements.len(),
                    cities: p.cities.len(),
                    roads: p.roads.len(),
                    has_longest_road: p.has_longest_road,
                    has_largest_army: p.has_largest_army,
                    resources: p.resources.clone(),
                    dev_cards: p.dev_cards.clone(),
                })
                .collect(),
        }
    }
}
