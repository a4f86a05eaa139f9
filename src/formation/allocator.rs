//! Splitting the battlefield into per-team placement areas.
//!
//! The map is centred on the origin and spans `[-x_bound, x_bound]` by
//! `[-y_bound, y_bound]`. Every split leaves at least one separation between
//! areas that belong to different teams.

use std::f32::consts::{PI, SQRT_2};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    layout::{ring_capacity, RING_STEP},
    Facing, FormationArea,
};
use crate::{
    composition::{UnitStartingData, BOSS_SCALE},
    error::{GenerationError, Result},
    rng::RngExt,
};

const MAX_SEPARATION_SHARE: f32 = 0.6;
const SURVIVE_FOOTPRINT_FACTOR: f32 = 1.5;
const SURVIVE_MIN_SHARE: f32 = 0.15;
const SURVIVE_MAX_SHARE: f32 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapBounds {
    pub x_bound: f32,
    pub y_bound: f32,
}

impl MapBounds {
    pub fn new(x_bound: f32, y_bound: f32) -> Result<Self> {
        let bounds = Self { x_bound, y_bound };
        bounds.validate()?;
        Ok(bounds)
    }

    pub fn validate(&self) -> Result<()> {
        let valid = [self.x_bound, self.y_bound]
            .iter()
            .all(|b| b.is_finite() && *b > 0.0);
        if valid {
            Ok(())
        } else {
            Err(GenerationError::InvalidSetup(format!(
                "map bounds must be positive, got {} x {}",
                self.x_bound, self.y_bound
            )))
        }
    }

    pub fn area(&self) -> FormationArea {
        FormationArea {
            min_x: -self.x_bound,
            max_x: self.x_bound,
            min_y: -self.y_bound,
            max_y: self.y_bound,
        }
    }
}

/// A team's placement rectangle and the direction its formations face.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TeamArea {
    pub area: FormationArea,
    pub facing: Facing,
}

/// Radius of a disc holding `count` units at density `1 / (d² · 2/π)`.
pub fn footprint_radius(count: usize, min_distance: f32) -> f32 {
    (count as f32 * min_distance * min_distance * 2.0 / PI).sqrt()
}

/// Halves the map along X. With `use_separation` both halves pull back from
/// the centre line by the larger footprint radius, capped at 60% of the half
/// width.
pub fn split_two_teams(
    bounds: &MapBounds,
    counts: (usize, usize),
    min_distance: f32,
    use_separation: bool,
) -> [TeamArea; 2] {
    let cap = MAX_SEPARATION_SHARE * bounds.x_bound;
    let floor = (min_distance * 0.5).min(cap);
    let separation = if use_separation {
        footprint_radius(counts.0, min_distance)
            .max(footprint_radius(counts.1, min_distance))
            .min(cap)
            .max(floor)
    } else {
        floor
    };
    debug!(separation, "two-team split");

    let map = bounds.area();
    [
        TeamArea {
            area: FormationArea {
                max_x: -separation,
                ..map
            },
            facing: Facing::East,
        },
        TeamArea {
            area: FormationArea {
                min_x: separation,
                ..map
            },
            facing: Facing::West,
        },
    ]
}

/// Lays `team_count` cells out on a near-square grid matched to the map's
/// aspect ratio.
///
/// Edge cells face outward along the map edge they touch; interior cells
/// face diagonally toward the centre. With `rotate_chance` a cell's area is
/// turned a quarter about its centre and clipped back into the cell.
pub fn split_teams<R: Rng>(
    bounds: &MapBounds,
    team_count: usize,
    min_distance: f32,
    rotate_chance: f32,
    rng: &mut R,
) -> Result<Vec<TeamArea>> {
    bounds.validate()?;
    if team_count == 0 {
        return Ok(Vec::new());
    }
    let aspect = bounds.x_bound / bounds.y_bound;
    let cols = ((team_count as f32 * aspect).sqrt().ceil() as usize).clamp(1, team_count);
    let rows = team_count.div_ceil(cols);
    let cell_w = 2.0 * bounds.x_bound / cols as f32;
    let cell_h = 2.0 * bounds.y_bound / rows as f32;

    let mut areas = Vec::with_capacity(team_count);
    for index in 0..team_count {
        let (row, col) = (index / cols, index % cols);
        let cell = FormationArea {
            min_x: -bounds.x_bound + col as f32 * cell_w,
            max_x: -bounds.x_bound + (col + 1) as f32 * cell_w,
            min_y: -bounds.y_bound + row as f32 * cell_h,
            max_y: -bounds.y_bound + (row + 1) as f32 * cell_h,
        };
        let inner = cell.inset_or_center(min_distance * 0.5);
        let mut team = TeamArea {
            area: inner,
            facing: cell_facing(&cell, row, col, rows, cols),
        };

        if rng.random_bool(rotate_chance) {
            if let Some(turned) = inner.quarter_turn().intersection(&inner) {
                team = TeamArea {
                    area: turned,
                    facing: team.facing.quarter_turn(),
                };
            }
        }
        areas.push(team);
    }
    debug!(team_count, rows, cols, "multi-team split");
    Ok(areas)
}

fn cell_facing(cell: &FormationArea, row: usize, col: usize, rows: usize, cols: usize) -> Facing {
    let center = cell.center();
    let mut normal = Vec2::ZERO;
    if cols > 1 && col == 0 {
        normal.x -= 1.0;
    }
    if cols > 1 && col == cols - 1 {
        normal.x += 1.0;
    }
    if rows > 1 && row == 0 {
        normal.y -= 1.0;
    }
    if rows > 1 && row == rows - 1 {
        normal.y += 1.0;
    }

    let on_edge = rows == 1 || cols == 1 || row == 0 || col == 0 || row == rows - 1 || col == cols - 1;
    if !on_edge {
        Facing::diagonal_from_vector(-center)
    } else if normal != Vec2::ZERO {
        Facing::from_vector(normal)
    } else {
        Facing::from_vector(center)
    }
}

/// Areas for the team holding a capture point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeizeSplit {
    /// Square around the capture point holding the defensive rings.
    pub ring: FormationArea,
    /// Largest strip of the holder's half clear of the ring area.
    pub secondary: Option<FormationArea>,
    pub capture_point: Vec2,
    /// Outermost radius the defensive rings need.
    pub ring_radius: f32,
    pub facing: Facing,
}

/// Carves `holder` into a ring area around `capture_point` sized for
/// `ring_count` units plus a secondary area for the rest.
pub fn split_seize(
    holder: &TeamArea,
    capture_point: Vec2,
    ring_count: usize,
    min_distance: f32,
) -> SeizeSplit {
    let d = min_distance;
    let capture_point = holder.area.clamp_point(capture_point);

    // The boss stands on the point; rings start one separation out.
    let mut ring_radius = d;
    let mut capacity = ring_capacity(ring_radius, d);
    while capacity < ring_count {
        ring_radius += RING_STEP * d;
        capacity += ring_capacity(ring_radius, d);
    }

    let half = ring_radius + d * 0.5;
    let ring = FormationArea::from_center(capture_point, half, half)
        .and_then(|square| square.intersection(&holder.area))
        .unwrap_or(holder.area);

    let outer = &holder.area;
    let strips = [
        FormationArea::new(outer.min_x, ring.min_x - d, outer.min_y, outer.max_y),
        FormationArea::new(ring.max_x + d, outer.max_x, outer.min_y, outer.max_y),
        FormationArea::new(outer.min_x, outer.max_x, outer.min_y, ring.min_y - d),
        FormationArea::new(outer.min_x, outer.max_x, ring.max_y + d, outer.max_y),
    ];
    let secondary = strips
        .into_iter()
        .flatten()
        .max_by(|a, b| a.area().total_cmp(&b.area()));

    debug!(ring_radius, has_secondary = secondary.is_some(), "seize split");
    SeizeSplit {
        ring,
        secondary,
        capture_point,
        ring_radius,
        facing: holder.facing,
    }
}

/// Index of the unit that stands on the capture point.
pub fn find_seize_boss(units: &[UnitStartingData]) -> Option<usize> {
    units.iter().position(|u| u.scale >= BOSS_SCALE)
}

/// How attackers surround the survivors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurroundLayout {
    ConcentricRings,
    Sectors,
    RingAndScatter,
}

impl SurroundLayout {
    pub const ALL: [SurroundLayout; 3] = [
        SurroundLayout::ConcentricRings,
        SurroundLayout::Sectors,
        SurroundLayout::RingAndScatter,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurviveSplit {
    /// Square in the middle of the map for the surviving team.
    pub central: FormationArea,
    /// Whole map, inset by half a separation.
    pub outer: FormationArea,
    /// Attackers stay at least this far from the map centre.
    pub inner_radius: f32,
    pub outer_radius: f32,
    pub layout: SurroundLayout,
}

pub fn split_survive(
    bounds: &MapBounds,
    defender_count: usize,
    min_distance: f32,
    layout: SurroundLayout,
) -> SurviveSplit {
    let d = min_distance;
    let m = bounds.x_bound.min(bounds.y_bound);
    let half = (SURVIVE_FOOTPRINT_FACTOR * footprint_radius(defender_count, d))
        .clamp(SURVIVE_MIN_SHARE * m, SURVIVE_MAX_SHARE * m);
    let central = FormationArea::from_center(Vec2::ZERO, half, half)
        .unwrap_or_else(|| bounds.area().inset_or_center(m * 0.5));

    let inner_radius = half * SQRT_2 + 2.0 * d;
    let outer_radius = (m - d * 0.5).max(inner_radius + RING_STEP * d);
    debug!(half, inner_radius, outer_radius, ?layout, "survive split");

    SurviveSplit {
        central,
        outer: bounds.area().inset_or_center(d * 0.5),
        inner_radius,
        outer_radius,
        layout,
    }
}

/// Up to `sector_count` square areas spaced evenly around the survive
/// annulus, each facing the centre. Fewer come back when the band is too
/// narrow to keep neighbouring squares a separation apart.
pub fn sector_areas(split: &SurviveSplit, sector_count: usize, min_distance: f32) -> Vec<TeamArea> {
    let band = split.outer_radius - split.inner_radius;
    // A square of half-size h centred at rho stays inside the band when its
    // circumscribed circle does.
    let half = band / (2.0 * SQRT_2);
    let rho = split.inner_radius + half * SQRT_2;

    let mut count = sector_count;
    while count > 1 {
        let spacing = 2.0 * rho * (PI / count as f32).sin();
        if spacing >= 2.0 * half * SQRT_2 + min_distance {
            break;
        }
        count -= 1;
    }
    if count == 0 || half <= 0.0 {
        return Vec::new();
    }

    (0..count)
        .filter_map(|k| {
            let angle = std::f32::consts::TAU * k as f32 / count as f32;
            let center = Vec2::from_angle(angle) * rho;
            let area = FormationArea::from_center(center, half, half)?.intersection(&split.outer)?;
            Some(TeamArea {
                area,
                facing: Facing::from_vector(-center),
            })
        })
        .collect()
}
