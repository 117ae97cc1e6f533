//! Longest Road and Largest Army.
//!
//! Lengths and knight counts are recomputed from the current board and
//! players every time; the tracker only remembers who holds each title.
//! A title moves only to a challenger that strictly beats the holder, and
//! the holder's flag and 2 points move with it in one step.

use crate::board::{Board, EdgeId, PlayerId, VertexId};
use crate::player::Player;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Minimum road length for Longest Road
pub const MIN_LONGEST_ROAD: u32 = 5;

/// Minimum knights for Largest Army
pub const MIN_LARGEST_ARMY: u32 = 3;

/// Score bonus carried by each title
pub const TITLE_POINTS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Title {
    LongestRoad,
    LargestArmy,
}

/// A title that changed hands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleChange {
    pub title: Title,
    pub previous: Option<PlayerId>,
    pub current: PlayerId,
    /// Road length or knight count that won the title
    pub value: u32,
}

/// Longest simple path (no repeated edge) through a player's roads.
///
/// The path may end on a vertex owned by another player but never passes
/// through one.
pub fn longest_road(board: &Board, player: PlayerId) -> u32 {
    let mut best = 0;
    let mut visited = HashSet::new();

    for edge in board.edges().iter().filter(|e| e.owner() == Some(player)) {
        for &start in &edge.vertices {
            let Some(far) = edge.other_end(start) else {
                continue;
            };
            visited.clear();
            visited.insert(edge.id);
            best = best.max(1 + extend_road(board, player, far, &mut visited));
        }
    }

    best
}

fn extend_road(
    board: &Board,
    player: PlayerId,
    vertex: VertexId,
    visited: &mut HashSet<EdgeId>,
) -> u32 {
    if matches!(board.vertex_owner(vertex), Some(owner) if owner != player) {
        return 0;
    }

    let mut best = 0;
    for &edge_id in &board.vertices()[vertex].edges {
        let edge = &board.edges()[edge_id];
        if edge.owner() != Some(player) || visited.contains(&edge_id) {
            continue;
        }
        let Some(next) = edge.other_end(vertex) else {
            continue;
        };
        visited.insert(edge_id);
        best = best.max(1 + extend_road(board, player, next, visited));
        visited.remove(&edge_id);
    }
    best
}

/// The single player (other than `holder`) whose value beats both the
/// holder's and the title threshold.
fn challenger(
    values: &[(PlayerId, u32)],
    holder: Option<PlayerId>,
    minimum: u32,
) -> Option<(PlayerId, u32)> {
    let holder_value = holder
        .and_then(|h| values.iter().find(|(p, _)| *p == h))
        .map_or(0, |(_, v)| *v);

    let best = values
        .iter()
        .filter(|(p, _)| Some(*p) != holder)
        .map(|(_, v)| *v)
        .max()?;
    if best < minimum || best <= holder_value {
        return None;
    }

    let mut leaders = values
        .iter()
        .filter(|(p, v)| Some(*p) != holder && *v == best);
    match (leaders.next(), leaders.next()) {
        (Some(&leader), None) => Some(leader),
        // Tied challengers: nobody takes it
        _ => None,
    }
}

/// Title holders
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievements {
    longest_road: Option<PlayerId>,
    largest_army: Option<PlayerId>,
}

impl Achievements {
    pub fn longest_road_holder(&self) -> Option<PlayerId> {
        self.longest_road
    }

    pub fn largest_army_holder(&self) -> Option<PlayerId> {
        self.largest_army
    }

    /// Recompute road lengths and move the title if someone now beats the holder
    pub fn update_longest_road(
        &mut self,
        board: &Board,
        players: &mut [Player],
    ) -> Option<TitleChange> {
        let lengths: Vec<(PlayerId, u32)> = players
            .iter()
            .map(|p| (p.id, longest_road(board, p.id)))
            .collect();

        let (winner, length) = challenger(&lengths, self.longest_road, MIN_LONGEST_ROAD)?;
        let previous = self.longest_road.replace(winner);
        transfer(players, Title::LongestRoad, previous, winner);
        Some(TitleChange {
            title: Title::LongestRoad,
            previous,
            current: winner,
            value: length,
        })
    }

    /// Compare knight counts and move the title if someone now beats the holder
    pub fn update_largest_army(&mut self, players: &mut [Player]) -> Option<TitleChange> {
        let knights: Vec<(PlayerId, u32)> =
            players.iter().map(|p| (p.id, p.played_knights)).collect();

        let (winner, count) = challenger(&knights, self.largest_army, MIN_LARGEST_ARMY)?;
        let previous = self.largest_army.replace(winner);
        transfer(players, Title::LargestArmy, previous, winner);
        Some(TitleChange {
            title: Title::LargestArmy,
            previous,
            current: winner,
            value: count,
        })
    }
}

/// Move a title's flag and points from `previous` to `current`
fn transfer(players: &mut [Player], title: Title, previous: Option<PlayerId>, current: PlayerId) {
    if let Some(old) = previous.and_then(|id| players.get_mut(id as usize)) {
        *title_flag(old, title) = false;
        old.score = old.score.saturating_sub(TITLE_POINTS);
    }
    if let Some(new) = players.get_mut(current as usize) {
        *title_flag(new, title) = true;
        new.score += TITLE_POINTS;
    }
}

fn title_flag(player: &mut Player, title: Title) -> &mut bool {
    match title {
        Title::LongestRoad => &mut player.has_longest_road,
        Title::LargestArmy => &mut player.has_largest_army,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardLayout;
    use crate::player::ControllerKind;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn test_board() -> Board {
        Board::generate(BoardLayout::default(), &mut StdRng::seed_from_u64(3))
    }

    /// Find a path of `len` edges from `start` that never revisits a vertex
    fn simple_path(board: &Board, start: VertexId, len: usize) -> (Vec<VertexId>, Vec<EdgeId>) {
        fn grow(board: &Board, path: &mut Vec<VertexId>, len: usize) -> bool {
            if path.len() == len + 1 {
                return true;
            }
            let here = *path.last().unwrap();
            for &next in &board.vertices()[here].neighbors {
                if path.contains(&next) {
                    continue;
                }
                path.push(next);
                if grow(board, path, len) {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut vertices = vec![start];
        assert!(grow(board, &mut vertices, len));
        let edges = vertices
            .windows(2)
            .map(|pair| board.edge_between(pair[0], pair[1]).unwrap())
            .collect();
        (vertices, edges)
    }

    fn players(n: u8) -> Vec<Player> {
        (0..n)
            .map(|id| Player::new(id, format!("P{id}"), ControllerKind::Human))
            .collect()
    }

    #[test]
    fn test_simple_path_length() {
        let mut board = test_board();
        let center = board.tile_at(crate::hex::HexCoord::new(0, 0)).unwrap().clone();
        // Six edges around the center tile, minus one: a simple path of 5
        for &edge in &center.edges[..5] {
            board.place_road(edge, 0);
        }
        assert_eq!(longest_road(&board, 0), 5);

        // Closing the ring gives a cycle of 6
        board.place_road(center.edges[5], 0);
        assert_eq!(longest_road(&board, 0), 6);
        assert_eq!(longest_road(&board, 1), 0);
    }

    #[test]
    fn test_opponent_settlement_blocks_path() {
        let mut board = test_board();
        let (vertices, edges) = simple_path(&board, 0, 6);
        for &edge in &edges {
            board.place_road(edge, 0);
        }
        assert_eq!(longest_road(&board, 0), 6);

        board.place_settlement(vertices[3], 1);
        assert_eq!(longest_road(&board, 0), 3);

        // Own settlements never block
        board.place_settlement(vertices[3], 0);
        assert_eq!(longest_road(&board, 0), 6);
    }

    #[test]
    fn test_branch_counts_longest_arm() {
        let mut board = test_board();
        let (vertices, edges) = simple_path(&board, 0, 4);
        for &edge in &edges {
            board.place_road(edge, 0);
        }
        let branch_vertex = vertices[2];
        let spur = board.vertices()[branch_vertex]
            .edges
            .iter()
            .copied()
            .find(|e| !edges.contains(e));
        if let Some(spur) = spur {
            board.place_road(spur, 0);
        }
        assert_eq!(longest_road(&board, 0), 4);
    }

    #[test]
    fn test_largest_army_requires_three() {
        let mut players = players(2);
        let mut achievements = Achievements::default();

        players[0].played_knights = 2;
        assert_eq!(achievements.update_largest_army(&mut players), None);

        players[0].played_knights = 3;
        let change = achievements.update_largest_army(&mut players).unwrap();
        assert_eq!(change.previous, None);
        assert_eq!(change.current, 0);
        assert_eq!(players[0].score, 2);
        assert!(players[0].has_largest_army);
    }

    #[test]
    fn test_largest_army_tie_keeps_holder() {
        let mut players = players(3);
        let mut achievements = Achievements::default();
        players[0].played_knights = 3;
        achievements.update_largest_army(&mut players);

        players[1].played_knights = 3;
        assert_eq!(achievements.update_largest_army(&mut players), None);
        assert_eq!(achievements.largest_army_holder(), Some(0));

        players[1].played_knights = 4;
        let change = achievements.update_largest_army(&mut players).unwrap();
        assert_eq!(change.previous, Some(0));
        assert_eq!(change.value, 4);
        assert_eq!(players[0].score, 0);
        assert_eq!(players[1].score, 2);
        assert!(!players[0].has_largest_army);
        assert!(players[1].has_largest_army);
    }

    #[test]
    fn test_tied_challengers_without_holder() {
        let values = [(0, 5), (1, 5), (2, 1)];
        assert_eq!(challenger(&values, None, MIN_LONGEST_ROAD), None);
        assert_eq!(challenger(&values, Some(0), MIN_LONGEST_ROAD), None);
        assert_eq!(challenger(&[(0, 5), (1, 6)], Some(0), MIN_LONGEST_ROAD), Some((1, 6)));
    }

    #[test]
    fn test_longest_road_title() {
        let mut board = test_board();
        let mut players = players(2);
        let mut achievements = Achievements::default();

        let (_, edges) = simple_path(&board, 0, 5);
        for &edge in &edges[..4] {
            board.place_road(edge, 1);
        }
        assert_eq!(achievements.update_longest_road(&board, &mut players), None);

        board.place_road(edges[4], 1);
        let change = achievements.update_longest_road(&board, &mut players).unwrap();
        assert_eq!(change.current, 1);
        assert_eq!(change.value, 5);
        assert_eq!(players[1].score, 2);
        assert_eq!(achievements.longest_road_holder(), Some(1));
    }
}
