//! Hex coordinate system using axial coordinates (q, r).
//!
//! This module provides the foundational coordinate types for the board:
//! - `HexCoord`: identifies individual hex tiles
//! - `CornerKey`: exact integer identity of a hex corner, used to unify the
//!   corners that neighbouring tiles generate independently
//! - `Point`: pixel-space position for rendering collaborators
//!
//! Tiles are pointy-top. Corner `k` of a tile sits at angle `60°·k − 30°`
//! around the tile center.

use serde::{Deserialize, Serialize};

/// A position in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: &Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }

    /// Midpoint between two points
    pub fn midpoint(&self, other: &Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// Axial coordinate for hex grid.
///
/// In axial coordinates:
/// - `q` increases going east (right)
/// - `r` increases going southeast
/// - The third coordinate `s` (not stored) satisfies: q + r + s = 0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct HexCoord {
    /// Column (increases going east)
    pub q: i32,
    /// Row (increases going southeast)
    pub r: i32,
}

/// Corner offsets on the half-unit lattice, in corner order k = 0..5.
///
/// x is measured in units of `size·√3/2`, y in units of `size/2`.
const CORNER_OFFSETS: [(i32, i32); 6] = [(1, -1), (1, 1), (0, 2), (-1, 1), (-1, -1), (0, -2)];

impl HexCoord {
    /// Create a new hex coordinate
    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// The implicit third coordinate (s = -q - r)
    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Every coordinate with |q|, |r|, |q+r| <= radius, ordered by q then r.
    pub fn within_radius(radius: u32) -> Vec<HexCoord> {
        let radius = radius as i32;
        let mut coords = Vec::new();
        for q in -radius..=radius {
            let r_min = (-radius).max(-q - radius);
            let r_max = radius.min(-q + radius);
            for r in r_min..=r_max {
                coords.push(HexCoord::new(q, r));
            }
        }
        coords
    }

    /// The six neighboring hexes in clockwise order starting from East
    pub fn neighbors(&self) -> [HexCoord; 6] {
        [
            HexCoord::new(self.q + 1, self.r),     // East
            HexCoord::new(self.q + 1, self.r - 1), // NorthEast
            HexCoord::new(self.q, self.r - 1),     // NorthWest
            HexCoord::new(self.q - 1, self.r),     // West
            HexCoord::new(self.q - 1, self.r + 1), // SouthWest
            HexCoord::new(self.q, self.r + 1),     // SouthEast
        ]
    }

    /// Distance to another hex (in hex steps)
    pub fn distance_to(&self, other: &HexCoord) -> u32 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = (self.s() - other.s()).abs();
        ((dq + dr + ds) / 2) as u32
    }

    /// The center of this hex on the corner lattice.
    fn lattice_center(&self) -> CornerKey {
        CornerKey {
            x: 2 * self.q + self.r,
            y: 3 * self.r,
        }
    }

    /// Lattice identities of the six corners, in corner order k = 0..5.
    ///
    /// Two hexes that share a geometric corner produce equal keys for it.
    pub fn corner_keys(&self) -> [CornerKey; 6] {
        let center = self.lattice_center();
        CORNER_OFFSETS.map(|(dx, dy)| CornerKey {
            x: center.x + dx,
            y: center.y + dy,
        })
    }

    /// Convert to pixel coordinates (center of hex)
    /// Uses pointy-top orientation with the given hex size (radius)
    pub fn to_pixel(&self, hex_size: f64, origin: Point) -> Point {
        self.lattice_center().to_pixel(hex_size, origin)
    }

    /// Convert from pixel coordinates to hex (may need rounding)
    pub fn from_pixel(point: Point, hex_size: f64, origin: Point) -> Self {
        let x = point.x - origin.x;
        let y = point.y - origin.y;
        let q = (3.0_f64.sqrt() / 3.0 * x - 1.0 / 3.0 * y) / hex_size;
        let r = (2.0 / 3.0 * y) / hex_size;
        Self::axial_round(q, r)
    }

    /// Round fractional axial coordinates to nearest hex
    fn axial_round(q: f64, r: f64) -> Self {
        let s = -q - r;

        let mut rq = q.round();
        let mut rr = r.round();
        let rs = s.round();

        let q_diff = (rq - q).abs();
        let r_diff = (rr - r).abs();
        let s_diff = (rs - s).abs();

        if q_diff > r_diff && q_diff > s_diff {
            rq = -rr - rs;
        } else if r_diff > s_diff {
            rr = -rq - rs;
        }

        Self::new(rq as i32, rr as i32)
    }
}

/// Exact integer identity of a hex corner.
///
/// Corners live on a lattice where x is counted in half hex widths and y in
/// half hex sizes, so every corner of every tile lands on integer values and
/// equality needs no floating-point tolerance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CornerKey {
    pub x: i32,
    pub y: i32,
}

impl CornerKey {
    /// Pixel position of this corner for a given hex size and origin offset
    pub fn to_pixel(&self, hex_size: f64, origin: Point) -> Point {
        Point::new(
            origin.x + self.x as f64 * hex_size * 3.0_f64.sqrt() / 2.0,
            origin.y + self.y as f64 * hex_size / 2.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_hex_neighbors() {
        let center = HexCoord::new(0, 0);
        let neighbors = center.neighbors();

        let unique: HashSet<_> = neighbors.iter().collect();
        assert_eq!(unique.len(), 6);

        for neighbor in &neighbors {
            assert_eq!(center.distance_to(neighbor), 1);
        }
    }

    #[test]
    fn test_hex_distance() {
        let a = HexCoord::new(0, 0);
        let b = HexCoord::new(2, -1);
        assert_eq!(a.distance_to(&b), 2);

        let c = HexCoord::new(-3, 3);
        assert_eq!(a.distance_to(&c), 3);
    }

    #[test]
    fn test_within_radius_counts() {
        for radius in 0..6u32 {
            let expected = 3 * radius * radius + 3 * radius + 1;
            let coords = HexCoord::within_radius(radius);
            assert_eq!(coords.len() as u32, expected);
            assert!(coords
                .iter()
                .all(|c| c.distance_to(&HexCoord::default()) <= radius));
        }
    }

    #[test]
    fn test_neighbors_share_two_corners() {
        let hex = HexCoord::new(0, 0);
        let own: HashSet<_> = hex.corner_keys().into_iter().collect();
        for neighbor in hex.neighbors() {
            let shared = neighbor
                .corner_keys()
                .iter()
                .filter(|k| own.contains(k))
                .count();
            assert_eq!(shared, 2, "neighbor {:?} should share an edge", neighbor);
        }
    }

    #[test]
    fn test_corner_pixels_lie_on_hex_circle() {
        let origin = Point::new(40.0, -12.5);
        let hex = HexCoord::new(2, -1);
        let center = hex.to_pixel(60.0, origin);
        for key in hex.corner_keys() {
            let corner = key.to_pixel(60.0, origin);
            assert!((center.distance_to(&corner) - 60.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_pixel_round_trip() {
        let origin = Point::new(300.0, 200.0);
        let original = HexCoord::new(3, -2);
        let pixel = original.to_pixel(60.0, origin);
        let recovered = HexCoord::from_pixel(pixel, 60.0, origin);
        assert_eq!(original, recovered);
    }
}
