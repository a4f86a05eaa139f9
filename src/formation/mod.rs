//! Turning rosters into non-overlapping battlefield positions.
//!
//! Every generator here takes a minimum separation and an area and returns
//! points that honour both, falling back to Poisson-disc sampling and then to
//! relaxed scatter when a shape does not fit.

mod allocator;
mod area;
mod layout;
mod ordering;
mod packer;
mod poisson;
mod shapes;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::composition::UnitStartingData;

pub use allocator::{
    find_seize_boss, footprint_radius, sector_areas, split_seize, split_survive, split_teams,
    split_two_teams, MapBounds, SeizeSplit, SurroundLayout, SurviveSplit, TeamArea,
};
pub use area::FormationArea;
pub use layout::{choose_team_layout, circular_positions, team_positions, TeamLayout};
pub use packer::{pack_mini_formations, MAX_GROUP_SIZE};
pub use poisson::{poisson_disc, scatter_avoiding, scatter_in_annulus, Growth};
pub use shapes::FormationShape;

/// Tolerance used when checking separation and bounds of generated points.
pub const SEPARATION_EPSILON: f32 = 1e-3;

/// The side of a formation that looks toward the enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Facing {
    pub const ALL: [Facing; 8] = [
        Facing::North,
        Facing::NorthEast,
        Facing::East,
        Facing::SouthEast,
        Facing::South,
        Facing::SouthWest,
        Facing::West,
        Facing::NorthWest,
    ];

    pub fn vector(self) -> Vec2 {
        let d = std::f32::consts::FRAC_1_SQRT_2;
        match self {
            Facing::North => Vec2::new(0.0, 1.0),
            Facing::NorthEast => Vec2::new(d, d),
            Facing::East => Vec2::new(1.0, 0.0),
            Facing::SouthEast => Vec2::new(d, -d),
            Facing::South => Vec2::new(0.0, -1.0),
            Facing::SouthWest => Vec2::new(-d, -d),
            Facing::West => Vec2::new(-1.0, 0.0),
            Facing::NorthWest => Vec2::new(-d, d),
        }
    }

    /// Unit vector a quarter turn counter-clockwise from `vector`.
    pub fn perpendicular(self) -> Vec2 {
        self.vector().perp()
    }

    pub fn angle(self) -> f32 {
        let v = self.vector();
        v.y.atan2(v.x)
    }

    pub fn is_diagonal(self) -> bool {
        matches!(
            self,
            Facing::NorthEast | Facing::SouthEast | Facing::SouthWest | Facing::NorthWest
        )
    }

    pub fn opposite(self) -> Facing {
        self.rotated(4)
    }

    pub fn quarter_turn(self) -> Facing {
        self.rotated(2)
    }

    fn rotated(self, eighths: usize) -> Facing {
        let index = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(index + eighths) % Self::ALL.len()]
    }

    /// Nearest of the eight directions; zero vectors face east.
    pub fn from_vector(v: Vec2) -> Facing {
        if v.length_squared() <= f32::EPSILON {
            return Facing::East;
        }
        let n = v.normalize();
        Self::ALL
            .iter()
            .copied()
            .max_by(|a, b| a.vector().dot(n).total_cmp(&b.vector().dot(n)))
            .unwrap_or(Facing::East)
    }

    /// Nearest diagonal direction, for formations tucked into interior cells.
    pub fn diagonal_from_vector(v: Vec2) -> Facing {
        let x = if v.x < 0.0 { -1.0 } else { 1.0 };
        let y = if v.y < 0.0 { -1.0 } else { 1.0 };
        Facing::from_vector(Vec2::new(x, y))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Melee,
    Ranged,
}

/// A unit waiting for a position, tagged with its combat role.
#[derive(Debug, Clone, PartialEq)]
pub struct FormationUnit {
    pub data: UnitStartingData,
    pub role: Role,
}

impl FormationUnit {
    pub fn new(data: UnitStartingData, role: Role) -> Self {
        Self { data, role }
    }
}

/// Melee/ranged head count of a group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitMix {
    pub melee: usize,
    pub ranged: usize,
}

impl UnitMix {
    pub fn new(melee: usize, ranged: usize) -> Self {
        Self { melee, ranged }
    }

    pub fn of(units: &[FormationUnit]) -> Self {
        let ranged = units.iter().filter(|u| u.role == Role::Ranged).count();
        Self {
            melee: units.len() - ranged,
            ranged,
        }
    }

    pub fn total(&self) -> usize {
        self.melee + self.ranged
    }

    pub fn is_homogeneous(&self) -> bool {
        self.melee == 0 || self.ranged == 0
    }

    pub fn is_balanced(&self) -> bool {
        self.melee.abs_diff(self.ranged) <= 1
    }
}

/// True when every pair of points is at least `min_distance` apart.
pub fn is_well_separated(points: &[Vec2], min_distance: f32) -> bool {
    let limit = (min_distance - SEPARATION_EPSILON).max(0.0);
    let limit_sq = limit * limit;
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            if a.distance_squared(*b) < limit_sq {
                return false;
            }
        }
    }
    true
}

/// Smallest pairwise distance, or `None` for fewer than two points.
pub fn min_pairwise_distance(points: &[Vec2]) -> Option<f32> {
    let mut best: Option<f32> = None;
    for (i, a) in points.iter().enumerate() {
        for b in &points[i + 1..] {
            let d = a.distance(*b);
            best = Some(best.map_or(d, |current| current.min(d)));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facing_vectors_are_unit_length() {
        for facing in Facing::ALL {
            assert!((facing.vector().length() - 1.0).abs() < 1e-5);
            assert!(facing.vector().dot(facing.perpendicular()).abs() < 1e-5);
        }
    }

    #[test]
    fn facing_rotations() {
        assert_eq!(Facing::East.opposite(), Facing::West);
        assert_eq!(Facing::NorthWest.opposite(), Facing::SouthEast);
        assert_eq!(Facing::East.quarter_turn(), Facing::South);
    }

    #[test]
    fn facing_from_vector_snaps() {
        assert_eq!(Facing::from_vector(Vec2::new(5.0, 0.3)), Facing::East);
        assert_eq!(Facing::from_vector(Vec2::new(-1.0, -1.1)), Facing::SouthWest);
        assert_eq!(Facing::from_vector(Vec2::ZERO), Facing::East);
        assert_eq!(
            Facing::diagonal_from_vector(Vec2::new(-3.0, 0.1)),
            Facing::NorthWest
        );
    }

    #[test]
    fn separation_check() {
        let points = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
        assert!(is_well_separated(&points, 1.0));
        assert!(!is_well_separated(&points, 1.2));
        assert!((min_pairwise_distance(&points).unwrap() - 1.0).abs() < 1e-6);
        assert!(min_pairwise_distance(&points[..1]).is_none());
    }

    #[test]
    fn unit_mix_properties() {
        let mix = UnitMix::new(3, 0);
        assert!(mix.is_homogeneous());
        assert!(!mix.is_balanced());
        assert!(UnitMix::new(2, 3).is_balanced());
        assert_eq!(UnitMix::new(2, 3).total(), 5);
    }
}
