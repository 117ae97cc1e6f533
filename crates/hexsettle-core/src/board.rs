//! Game board representation: tiles, vertices, edges, harbors and the robber.
//!
//! This module contains:
//! - Resource and tile types
//! - The board topology builder, which unifies the corners and sides that
//!   neighbouring tiles generate independently into single vertex and edge
//!   records
//! - Terrain, dice number and harbor assignment
//! - Board validation and query methods
//!
//! Tiles, vertices and edges live in arenas and refer to each other by index.
//! Indices are stable for the lifetime of the board; the only mutable state
//! after generation is building ownership and the robber position.

use crate::hex::{CornerKey, HexCoord, Point};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Player identifier (index into the game's player list)
pub type PlayerId = u8;
/// Index of a tile in [`Board::tiles`]
pub type TileId = usize;
/// Index of a vertex in [`Board::vertices`]
pub type VertexId = usize;
/// Index of an edge in [`Board::edges`]
pub type EdgeId = usize;

/// Dice number carried by desert tiles. Never produces.
pub const DESERT_NUMBER: u8 = 7;

/// Radius of the classic 19-tile board.
pub const STANDARD_RADIUS: u32 = 2;

/// Resource types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Resource {
    Brick,
    Wood,
    Ore,
    Grain,
    Wool,
}

impl Resource {
    /// All resource types, in the fixed order used for tie-breaking
    pub const ALL: [Resource; 5] = [
        Resource::Brick,
        Resource::Wood,
        Resource::Ore,
        Resource::Grain,
        Resource::Wool,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Brick => "brick",
            Resource::Wood => "wood",
            Resource::Ore => "ore",
            Resource::Grain => "grain",
            Resource::Wool => "wool",
        }
    }
}

/// Terrain of one 18-tile set. Larger boards repeat it.
const BASE_TERRAIN: [Resource; 18] = [
    Resource::Wood,
    Resource::Wood,
    Resource::Wood,
    Resource::Wood,
    Resource::Grain,
    Resource::Grain,
    Resource::Grain,
    Resource::Grain,
    Resource::Wool,
    Resource::Wool,
    Resource::Wool,
    Resource::Wool,
    Resource::Ore,
    Resource::Ore,
    Resource::Ore,
    Resource::Brick,
    Resource::Brick,
    Resource::Brick,
];

/// Dice numbers of one 18-tile set, in the order they are laid on the
/// standard board.
const BASE_NUMBERS: [u8; 18] = [5, 2, 6, 3, 8, 10, 9, 12, 11, 4, 8, 10, 9, 4, 5, 6, 3, 11];

/// Harbors of the standard board
const BASE_HARBORS: [HarborKind; 9] = [
    HarborKind::Generic,
    HarborKind::Generic,
    HarborKind::Generic,
    HarborKind::Generic,
    HarborKind::Specific(Resource::Brick),
    HarborKind::Specific(Resource::Wood),
    HarborKind::Specific(Resource::Ore),
    HarborKind::Specific(Resource::Grain),
    HarborKind::Specific(Resource::Wool),
];

/// Expected production weight of a dice number (ways to roll it with 2d6)
pub fn pips(number: u8) -> u32 {
    match number {
        2..=6 => (number - 1) as u32,
        8..=12 => (13 - number) as u32,
        _ => 0,
    }
}

/// Type of hex tile on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TileType {
    /// Produces a resource when its number is rolled
    Resource(Resource),
    /// No production
    Desert,
}

/// Harbor types for bank trading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarborKind {
    /// 3:1 trade any resource
    Generic,
    /// 2:1 trade for a specific resource
    Specific(Resource),
}

impl HarborKind {
    /// The exchange rate for this harbor
    pub fn rate(&self) -> u32 {
        match self {
            HarborKind::Generic => 3,
            HarborKind::Specific(_) => 2,
        }
    }
}

/// A single hex tile on the board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    /// Position on the hex grid
    pub coord: HexCoord,
    pub tile_type: TileType,
    /// Dice number that triggers production (7 for deserts)
    pub number: u8,
    /// Pixel-space center
    pub center: Point,
    /// Boundary vertices in corner order
    pub vertices: [VertexId; 6],
    /// Boundary edges; edge k joins corner k and corner k+1
    pub edges: [EdgeId; 6],
}

impl Tile {
    /// Get the resource this tile produces, if any
    pub fn resource(&self) -> Option<Resource> {
        match self.tile_type {
            TileType::Resource(r) => Some(r),
            TileType::Desert => None,
        }
    }

    pub fn is_desert(&self) -> bool {
        matches!(self.tile_type, TileType::Desert)
    }

    /// Production weight of this tile (0 for deserts)
    pub fn pips(&self) -> u32 {
        if self.is_desert() {
            0
        } else {
            pips(self.number)
        }
    }
}

/// What's built on a vertex (corner)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VertexBuilding {
    /// Nothing built
    #[default]
    Empty,
    /// Settlement (1 VP, 1 resource per adjacent tile)
    Settlement(PlayerId),
    /// City (2 VP, 2 resources per adjacent tile)
    City(PlayerId),
}

impl VertexBuilding {
    /// Get the owner of this building, if any
    pub fn owner(&self) -> Option<PlayerId> {
        match self {
            VertexBuilding::Empty => None,
            VertexBuilding::Settlement(p) | VertexBuilding::City(p) => Some(*p),
        }
    }

    /// Victory points provided by this building
    pub fn victory_points(&self) -> u32 {
        self.resource_multiplier()
    }

    /// Resource multiplier (how many resources per production)
    pub fn resource_multiplier(&self) -> u32 {
        match self {
            VertexBuilding::Empty => 0,
            VertexBuilding::Settlement(_) => 1,
            VertexBuilding::City(_) => 2,
        }
    }
}

/// A board corner where settlements and cities are built
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    pub id: VertexId,
    pub key: CornerKey,
    pub position: Point,
    /// Tiles touching this corner (1 to 3)
    pub tiles: Vec<TileId>,
    /// Vertices one edge away
    pub neighbors: Vec<VertexId>,
    /// Edges ending here
    pub edges: Vec<EdgeId>,
    pub building: VertexBuilding,
}

impl Vertex {
    pub fn owner(&self) -> Option<PlayerId> {
        self.building.owner()
    }
}

/// What's built on an edge (side)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EdgeBuilding {
    /// Nothing built
    #[default]
    Empty,
    /// Road
    Road(PlayerId),
}

impl EdgeBuilding {
    /// Get the owner of this road, if any
    pub fn owner(&self) -> Option<PlayerId> {
        match self {
            EdgeBuilding::Empty => None,
            EdgeBuilding::Road(p) => Some(*p),
        }
    }
}

/// A tile side where roads are built
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    /// Endpoints, lower index first
    pub vertices: [VertexId; 2],
    /// Tiles bordering this edge (1 on the coast, 2 inland)
    pub tiles: Vec<TileId>,
    pub road: EdgeBuilding,
}

impl Edge {
    pub fn owner(&self) -> Option<PlayerId> {
        self.road.owner()
    }

    pub fn has_endpoint(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }

    /// The endpoint opposite `vertex`
    pub fn other_end(&self, vertex: VertexId) -> Option<VertexId> {
        match self.vertices {
            [a, b] if a == vertex => Some(b),
            [a, b] if b == vertex => Some(a),
            _ => None,
        }
    }

    pub fn is_coastal(&self) -> bool {
        self.tiles.len() == 1
    }
}

/// Harbor placement on the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Harbor {
    /// The coastal edge where ships dock
    pub edge: EdgeId,
    pub kind: HarborKind,
}

/// Geometry of a generated board
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoardLayout {
    /// Tiles cover every axial coordinate within this many steps of the center
    pub radius: u32,
    /// Center-to-corner distance in pixels
    pub hex_size: f64,
    /// Pixel position of the center tile
    pub origin: Point,
}

impl Default for BoardLayout {
    fn default() -> Self {
        Self {
            radius: STANDARD_RADIUS,
            hex_size: 60.0,
            origin: Point::default(),
        }
    }
}

impl BoardLayout {
    pub fn tile_count(&self) -> usize {
        let r = self.radius as usize;
        3 * r * r + 3 * r + 1
    }

    /// Deserts on a board of this size: 7 when the side length is 2 mod 3,
    /// otherwise 1. The rest of the board is whole 18-tile sets.
    pub fn desert_count(&self) -> usize {
        if (self.radius + 1) % 3 == 2 {
            7
        } else {
            1
        }
    }
}

/// Builds the tile/vertex/edge arenas, deduplicating shared corners and sides.
///
/// The coordinate indexes only exist while building; `finish` drops them.
struct TopologyBuilder {
    layout: BoardLayout,
    tiles: Vec<Tile>,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    vertex_index: HashMap<CornerKey, VertexId>,
    edge_index: HashMap<(VertexId, VertexId), EdgeId>,
}

impl TopologyBuilder {
    fn new(layout: BoardLayout) -> Self {
        Self {
            layout,
            tiles: Vec::with_capacity(layout.tile_count()),
            vertices: Vec::new(),
            edges: Vec::new(),
            vertex_index: HashMap::new(),
            edge_index: HashMap::new(),
        }
    }

    fn vertex_for(&mut self, key: CornerKey) -> VertexId {
        if let Some(&id) = self.vertex_index.get(&key) {
            return id;
        }
        let id = self.vertices.len();
        self.vertices.push(Vertex {
            id,
            key,
            position: key.to_pixel(self.layout.hex_size, self.layout.origin),
            tiles: Vec::new(),
            neighbors: Vec::new(),
            edges: Vec::new(),
            building: VertexBuilding::Empty,
        });
        self.vertex_index.insert(key, id);
        id
    }

    fn edge_for(&mut self, a: VertexId, b: VertexId) -> EdgeId {
        let pair = (a.min(b), a.max(b));
        if let Some(&id) = self.edge_index.get(&pair) {
            return id;
        }
        let id = self.edges.len();
        self.edges.push(Edge {
            id,
            vertices: [pair.0, pair.1],
            tiles: Vec::new(),
            road: EdgeBuilding::Empty,
        });
        self.edge_index.insert(pair, id);

        self.vertices[a].neighbors.push(b);
        self.vertices[a].edges.push(id);
        self.vertices[b].neighbors.push(a);
        self.vertices[b].edges.push(id);
        id
    }

    fn add_tile(&mut self, coord: HexCoord, tile_type: TileType, number: u8) {
        let id = self.tiles.len();
        let vertices = coord.corner_keys().map(|key| self.vertex_for(key));
        let edges: [EdgeId; 6] =
            std::array::from_fn(|k| self.edge_for(vertices[k], vertices[(k + 1) % 6]));

        for &v in &vertices {
            self.vertices[v].tiles.push(id);
        }
        for &e in &edges {
            self.edges[e].tiles.push(id);
        }

        self.tiles.push(Tile {
            id,
            coord,
            tile_type,
            number,
            center: coord.to_pixel(self.layout.hex_size, self.layout.origin),
            vertices,
            edges,
        });
    }

    fn finish(self) -> (Vec<Tile>, Vec<Vertex>, Vec<Edge>) {
        (self.tiles, self.vertices, self.edges)
    }
}

/// Terrain and dice numbers for every tile, in `HexCoord::within_radius` order.
fn assign_terrain<R: Rng>(layout: &BoardLayout, rng: &mut R) -> Vec<(TileType, u8)> {
    let deserts = layout.desert_count();
    let productive = layout.tile_count().saturating_sub(deserts);

    let mut kinds: Vec<TileType> = BASE_TERRAIN
        .iter()
        .cycle()
        .take(productive)
        .map(|&r| TileType::Resource(r))
        .collect();
    kinds.extend(std::iter::repeat(TileType::Desert).take(deserts));
    kinds.shuffle(rng);

    let mut numbers: Vec<u8> = BASE_NUMBERS.iter().copied().cycle().take(productive).collect();
    if layout.radius != STANDARD_RADIUS {
        numbers.shuffle(rng);
    }
    let mut numbers = numbers.into_iter();

    kinds
        .into_iter()
        .map(|kind| match kind {
            TileType::Desert => (kind, DESERT_NUMBER),
            TileType::Resource(_) => (kind, numbers.next().unwrap_or(DESERT_NUMBER)),
        })
        .collect()
}

/// The complete game board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    layout: BoardLayout,
    tiles: Vec<Tile>,
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
    harbors: Vec<Harbor>,
    /// Tile currently holding the robber
    robber: TileId,
}

impl Board {
    /// Generate a board for `layout`, drawing terrain and harbors from `rng`
    pub fn generate<R: Rng>(layout: BoardLayout, rng: &mut R) -> Self {
        let coords = HexCoord::within_radius(layout.radius);
        let terrain = assign_terrain(&layout, rng);

        let mut builder = TopologyBuilder::new(layout);
        for (coord, (tile_type, number)) in coords.into_iter().zip(terrain) {
            builder.add_tile(coord, tile_type, number);
        }
        let (tiles, vertices, edges) = builder.finish();

        // Robber starts on the first desert
        let robber = tiles.iter().position(Tile::is_desert).unwrap_or(0);

        let mut board = Self {
            layout,
            tiles,
            vertices,
            edges,
            harbors: Vec::new(),
            robber,
        };
        board.place_harbors(rng);

        tracing::debug!(
            radius = layout.radius,
            tiles = board.tiles.len(),
            vertices = board.vertices.len(),
            edges = board.edges.len(),
            harbors = board.harbors.len(),
            "board generated"
        );
        board
    }

    /// Place harbors on coastal edges, spread around the coast.
    ///
    /// Roughly three harbors per ten coastal edges (9 on the standard board).
    fn place_harbors<R: Rng>(&mut self, rng: &mut R) {
        let coastal: Vec<EdgeId> = self
            .edges
            .iter()
            .filter(|e| e.is_coastal())
            .map(|e| e.id)
            .collect();
        let count = coastal.len() * 3 / 10;

        let mut kinds: Vec<HarborKind> = BASE_HARBORS
            .iter()
            .copied()
            .cycle()
            .take((count + BASE_HARBORS.len() - 1) / BASE_HARBORS.len() * BASE_HARBORS.len())
            .collect();
        kinds.shuffle(rng);

        let selected = self.select_distributed_edges(&coastal, count, rng);
        self.harbors = selected
            .into_iter()
            .zip(kinds)
            .map(|(edge, kind)| Harbor { edge, kind })
            .collect();
    }

    /// Select `count` edges that are well-distributed around the board
    fn select_distributed_edges<R: Rng>(
        &self,
        candidates: &[EdgeId],
        count: usize,
        rng: &mut R,
    ) -> Vec<EdgeId> {
        if candidates.len() <= count {
            return candidates.to_vec();
        }

        let mut selected: Vec<EdgeId> = Vec::with_capacity(count);
        let mut available: Vec<EdgeId> = candidates.to_vec();
        available.shuffle(rng);

        while selected.len() < count && !available.is_empty() {
            let mut best: Option<(usize, f64)> = None;

            for (idx, &candidate) in available.iter().enumerate() {
                let min_dist = selected
                    .iter()
                    .map(|&s| self.edge_midpoint(candidate).distance_to(&self.edge_midpoint(s)))
                    .fold(f64::MAX, f64::min);

                if best.map_or(true, |(_, d)| min_dist > d) {
                    best = Some((idx, min_dist));
                }
            }

            match best {
                Some((idx, _)) => selected.push(available.remove(idx)),
                None => break,
            }
        }

        selected
    }

    // ==================== Query Methods ====================

    pub fn layout(&self) -> &BoardLayout {
        &self.layout
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn harbors(&self) -> &[Harbor] {
        &self.harbors
    }

    pub fn tile(&self, id: TileId) -> Option<&Tile> {
        self.tiles.get(id)
    }

    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Get a tile by axial coordinate
    pub fn tile_at(&self, coord: HexCoord) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.coord == coord)
    }

    /// Get the robber's current tile
    pub fn robber(&self) -> TileId {
        self.robber
    }

    pub fn vertex_owner(&self, vertex: VertexId) -> Option<PlayerId> {
        self.vertices.get(vertex).and_then(Vertex::owner)
    }

    pub fn road_owner(&self, edge: EdgeId) -> Option<PlayerId> {
        self.edges.get(edge).and_then(Edge::owner)
    }

    /// The edge joining two vertices, if they are neighbours
    pub fn edge_between(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.vertices
            .get(a)?
            .edges
            .iter()
            .copied()
            .find(|&e| self.edges[e].has_endpoint(b))
    }

    /// Pixel midpoint of an edge
    pub fn edge_midpoint(&self, edge: EdgeId) -> Point {
        let [a, b] = self.edges[edge].vertices;
        self.vertices[a].position.midpoint(&self.vertices[b].position)
    }

    /// Get tiles adjacent to a vertex
    pub fn tiles_at_vertex(&self, vertex: VertexId) -> impl Iterator<Item = &Tile> + '_ {
        self.vertices
            .get(vertex)
            .into_iter()
            .flat_map(|v| v.tiles.iter().map(|&t| &self.tiles[t]))
    }

    /// Get all harbors a player has access to (through their buildings)
    pub fn harbors_for(&self, player: PlayerId) -> Vec<HarborKind> {
        self.harbors
            .iter()
            .filter(|h| {
                self.edges[h.edge]
                    .vertices
                    .iter()
                    .any(|&v| self.vertices[v].owner() == Some(player))
            })
            .map(|h| h.kind)
            .collect()
    }

    /// Players with a building on a tile's corners (for robber stealing)
    pub fn players_on_tile(&self, tile: TileId) -> BTreeSet<PlayerId> {
        self.tiles
            .get(tile)
            .map(|t| {
                t.vertices
                    .iter()
                    .filter_map(|&v| self.vertices[v].owner())
                    .collect()
            })
            .unwrap_or_default()
    }

    // ==================== Validation Methods ====================

    /// Vertex is free and no neighbour one edge away is built on
    pub fn satisfies_distance_rule(&self, vertex: VertexId) -> bool {
        match self.vertices.get(vertex) {
            Some(v) => {
                v.owner().is_none()
                    && v.neighbors
                        .iter()
                        .all(|&n| self.vertices[n].owner().is_none())
            }
            None => false,
        }
    }

    /// Check if one of the player's roads ends at this vertex
    pub fn touches_own_road(&self, vertex: VertexId, player: PlayerId) -> bool {
        self.vertices.get(vertex).is_some_and(|v| {
            v.edges
                .iter()
                .any(|&e| self.edges[e].owner() == Some(player))
        })
    }

    /// Check if an edge connects to a player's network.
    ///
    /// An endpoint connects when the player has a building there, or when it
    /// is not an opponent's building and another of the player's roads ends
    /// there.
    pub fn road_connects(&self, edge: EdgeId, player: PlayerId) -> bool {
        let Some(target) = self.edges.get(edge) else {
            return false;
        };
        target.vertices.iter().any(|&endpoint| {
            let vertex = &self.vertices[endpoint];
            match vertex.owner() {
                Some(owner) if owner == player => true,
                Some(_) => false,
                None => vertex
                    .edges
                    .iter()
                    .any(|&e| e != edge && self.edges[e].owner() == Some(player)),
            }
        })
    }

    // ==================== Mutation Methods ====================

    /// Place a settlement (assumes validation already done)
    pub fn place_settlement(&mut self, vertex: VertexId, player: PlayerId) {
        self.vertices[vertex].building = VertexBuilding::Settlement(player);
    }

    /// Upgrade a settlement to a city
    pub fn upgrade_to_city(&mut self, vertex: VertexId, player: PlayerId) {
        self.vertices[vertex].building = VertexBuilding::City(player);
    }

    /// Place a road
    pub fn place_road(&mut self, edge: EdgeId, player: PlayerId) {
        self.edges[edge].road = EdgeBuilding::Road(player);
    }

    /// Move the robber to a new tile
    pub fn move_robber(&mut self, tile: TileId) {
        self.robber = tile;
    }

    // ==================== Resource Distribution ====================

    /// Resources produced by a dice roll, in tile-then-vertex order.
    ///
    /// The robber's tile and deserts produce nothing.
    pub fn production(&self, roll: u8) -> Vec<(PlayerId, Resource, u32)> {
        let mut payouts = Vec::new();

        for tile in &self.tiles {
            if tile.number != roll || tile.id == self.robber {
                continue;
            }
            let Some(resource) = tile.resource() else {
                continue;
            };

            for &vertex in &tile.vertices {
                let building = self.vertices[vertex].building;
                if let Some(owner) = building.owner() {
                    payouts.push((owner, resource, building.resource_multiplier()));
                }
            }
        }

        payouts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn board(radius: u32, seed: u64) -> Board {
        let layout = BoardLayout {
            radius,
            ..BoardLayout::default()
        };
        Board::generate(layout, &mut StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_tile_vertex_edge_counts() {
        for radius in 1..=5u32 {
            let b = board(radius, 7);
            let r = radius as usize;
            assert_eq!(b.tiles().len(), 3 * r * r + 3 * r + 1);
            assert_eq!(b.vertices().len(), 6 * (r + 1) * (r + 1));
            assert_eq!(b.edges().len(), 9 * r * r + 15 * r + 6);
        }
    }

    #[test]
    fn test_edges_border_one_or_two_tiles() {
        let b = board(3, 1);
        let coastal = b.edges().iter().filter(|e| e.tiles.len() == 1).count();
        let inland = b.edges().iter().filter(|e| e.tiles.len() == 2).count();
        assert_eq!(coastal + inland, b.edges().len());
        // Perimeter of a radius-3 board
        assert_eq!(coastal, 6 * 7);

        // Internal edges are exactly the sides shared by neighbouring tiles
        for edge in b.edges().iter().filter(|e| e.tiles.len() == 2) {
            let a = b.tiles()[edge.tiles[0]].coord;
            let c = b.tiles()[edge.tiles[1]].coord;
            assert_eq!(a.distance_to(&c), 1);
        }
    }

    #[test]
    fn test_vertices_touch_one_to_three_tiles() {
        let b = board(2, 3);
        for vertex in b.vertices() {
            assert!((1..=3).contains(&vertex.tiles.len()));
            assert!((2..=3).contains(&vertex.neighbors.len()));
            assert_eq!(vertex.neighbors.len(), vertex.edges.len());
        }
        // Center tile corners are all interior
        let center = b.tile_at(HexCoord::new(0, 0)).unwrap();
        for &v in &center.vertices {
            assert_eq!(b.vertices()[v].tiles.len(), 3);
        }
    }

    #[test]
    fn test_shared_corners_resolve_to_same_vertex() {
        let b = board(2, 11);
        let center = b.tile_at(HexCoord::new(0, 0)).unwrap();
        let east = b.tile_at(HexCoord::new(1, 0)).unwrap();

        let shared: Vec<VertexId> = center
            .vertices
            .iter()
            .copied()
            .filter(|v| east.vertices.contains(v))
            .collect();
        assert_eq!(shared.len(), 2);

        let shared_edges: Vec<EdgeId> = center
            .edges
            .iter()
            .copied()
            .filter(|e| east.edges.contains(e))
            .collect();
        assert_eq!(shared_edges.len(), 1);
        let edge = &b.edges()[shared_edges[0]];
        assert!(shared.iter().all(|&v| edge.has_endpoint(v)));
    }

    #[test]
    fn test_no_coincident_vertices() {
        let b = board(4, 2);
        let keys: HashSet<_> = b.vertices().iter().map(|v| v.key).collect();
        assert_eq!(keys.len(), b.vertices().len());

        for (i, a) in b.vertices().iter().enumerate() {
            for c in &b.vertices()[i + 1..] {
                assert!(a.position.distance_to(&c.position) > 1.0);
            }
        }
    }

    #[test]
    fn test_standard_terrain_distribution() {
        let b = board(2, 5);
        let count = |r: Resource| {
            b.tiles()
                .iter()
                .filter(|t| t.resource() == Some(r))
                .count()
        };
        assert_eq!(count(Resource::Wood), 4);
        assert_eq!(count(Resource::Grain), 4);
        assert_eq!(count(Resource::Wool), 4);
        assert_eq!(count(Resource::Ore), 3);
        assert_eq!(count(Resource::Brick), 3);

        let deserts: Vec<&Tile> = b.tiles().iter().filter(|t| t.is_desert()).collect();
        assert_eq!(deserts.len(), 1);
        assert_eq!(deserts[0].number, DESERT_NUMBER);
        assert_eq!(b.robber(), deserts[0].id);
    }

    #[test]
    fn test_standard_numbers_keep_fixed_order() {
        let b = board(2, 99);
        let numbers: Vec<u8> = b
            .tiles()
            .iter()
            .filter(|t| !t.is_desert())
            .map(|t| t.number)
            .collect();
        assert_eq!(numbers, BASE_NUMBERS.to_vec());
    }

    #[test]
    fn test_scaled_terrain_distribution() {
        // Side length 5 is 2 mod 3: seven deserts, three full sets
        let b = board(4, 8);
        assert_eq!(b.tiles().iter().filter(|t| t.is_desert()).count(), 7);
        assert_eq!(
            b.tiles()
                .iter()
                .filter(|t| t.resource() == Some(Resource::Ore))
                .count(),
            9
        );

        let mut numbers: Vec<u8> = b
            .tiles()
            .iter()
            .filter(|t| !t.is_desert())
            .map(|t| t.number)
            .collect();
        numbers.sort_unstable();
        let mut expected: Vec<u8> = BASE_NUMBERS.iter().copied().cycle().take(54).collect();
        expected.sort_unstable();
        assert_eq!(numbers, expected);
        assert!(b
            .tiles()
            .iter()
            .filter(|t| t.is_desert())
            .all(|t| t.number == DESERT_NUMBER));
    }

    #[test]
    fn test_standard_harbors() {
        let b = board(2, 4);
        assert_eq!(b.harbors().len(), 9);
        let generic = b
            .harbors()
            .iter()
            .filter(|h| h.kind == HarborKind::Generic)
            .count();
        assert_eq!(generic, 4);
        for resource in Resource::ALL {
            assert!(b
                .harbors()
                .iter()
                .any(|h| h.kind == HarborKind::Specific(resource)));
        }
        let edges: HashSet<_> = b.harbors().iter().map(|h| h.edge).collect();
        assert_eq!(edges.len(), 9);
        assert!(b.harbors().iter().all(|h| b.edges()[h.edge].is_coastal()));
    }

    #[test]
    fn test_harbor_access() {
        let mut b = board(2, 4);
        let harbor = b.harbors()[0];
        let [v, _] = b.edges()[harbor.edge].vertices;
        assert!(b.harbors_for(1).is_empty());
        b.place_settlement(v, 1);
        assert_eq!(b.harbors_for(1), vec![harbor.kind]);
    }

    #[test]
    fn test_distance_rule() {
        let mut b = board(2, 6);
        let v = 10;
        let neighbor = b.vertices()[v].neighbors[0];
        assert!(b.satisfies_distance_rule(neighbor));
        b.place_settlement(v, 0);
        assert!(!b.satisfies_distance_rule(v));
        assert!(!b.satisfies_distance_rule(neighbor));
    }

    #[test]
    fn test_road_connects_blocked_by_opponent() {
        let mut b = board(2, 6);
        // Road a-b owned by player 0, opponent settles on b
        let a = 12;
        let v = b.vertices()[a].neighbors[0];
        let first = b.edge_between(a, v).unwrap();
        b.place_road(first, 0);

        let onward = b.vertices()[v]
            .edges
            .iter()
            .copied()
            .find(|&e| e != first)
            .unwrap();
        assert!(b.road_connects(onward, 0));

        b.place_settlement(v, 1);
        assert!(!b.road_connects(onward, 0));
        assert!(b.road_connects(onward, 1));
    }

    #[test]
    fn test_production_settlement_and_city() {
        let mut b = board(2, 21);
        let tile = b
            .tiles()
            .iter()
            .find(|t| !t.is_desert() && t.id != b.robber())
            .cloned()
            .unwrap();
        let resource = tile.resource().unwrap();

        b.place_settlement(tile.vertices[0], 0);
        b.upgrade_to_city(tile.vertices[3], 1);

        let payouts = b.production(tile.number);
        assert!(payouts.contains(&(0, resource, 1)));
        assert!(payouts.contains(&(1, resource, 2)));

        b.move_robber(tile.id);
        let blocked = b.production(tile.number);
        assert_eq!(blocked.len(), payouts.len() - 2);
    }
}
