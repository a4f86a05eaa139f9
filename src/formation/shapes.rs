//! Mini-formation shapes.
//!
//! Each shape turns a unit count into points inside an area. The point order
//! is part of each shape's contract; `ordering` relies on it to put melee and
//! ranged units in the right slots.

use std::f32::consts::{PI, SQRT_2, TAU};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    is_well_separated, ordering, poisson_disc, Facing, FormationArea, FormationUnit, Growth,
    UnitMix,
};
use crate::error::{GenerationError, Result};

const LINE_MAX_UNITS: usize = 8;
const LINE_MAX_SPACING: f32 = 1.6;
const LINE_OBLONG_ASPECT: f32 = 1.25;
const GRID_MAX_SPACING: f32 = 1.5;
const GRID_MAX_JITTER: f32 = 0.2;
const CIRCLE_RADIUS_SHARE: f32 = 0.35;
const ARC_SPAN: f32 = TAU / 3.0;
const ARC_RADIUS_SHARE: f32 = 0.45;
const ARC_PIVOT_OFFSET: f32 = 0.75;
const CROSS_MAX_SPACING: f32 = 1.4;
const DIAMOND_MAX_SPACING: f32 = 1.3;
const WEDGE_SPACINGS: [f32; 2] = [1.3, 1.05];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormationShape {
    Line,
    Grid,
    Circle,
    Arc,
    Cross,
    Diamond,
    Wedge,
    Cluster,
    PoissonDisc,
}

impl FormationShape {
    pub const LIBRARY: [FormationShape; 9] = [
        FormationShape::Line,
        FormationShape::Grid,
        FormationShape::Circle,
        FormationShape::Arc,
        FormationShape::Cross,
        FormationShape::Diamond,
        FormationShape::Wedge,
        FormationShape::Cluster,
        FormationShape::PoissonDisc,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FormationShape::Line => "line",
            FormationShape::Grid => "grid",
            FormationShape::Circle => "circle",
            FormationShape::Arc => "arc",
            FormationShape::Cross => "cross",
            FormationShape::Diamond => "diamond",
            FormationShape::Wedge => "wedge",
            FormationShape::Cluster => "cluster",
            FormationShape::PoissonDisc => "poisson_disc",
        }
    }

    pub fn can_handle(self, count: usize) -> bool {
        match self {
            FormationShape::Line => (1..=LINE_MAX_UNITS).contains(&count),
            FormationShape::Grid => count >= 4,
            FormationShape::Circle => count >= 5,
            FormationShape::Arc => count >= 3,
            FormationShape::Cross => count >= 5,
            FormationShape::Diamond => count >= 4,
            FormationShape::Wedge => count >= 3,
            FormationShape::Cluster => count >= 2,
            FormationShape::PoissonDisc => count >= 1,
        }
    }

    /// Relative weight of this shape for a group with the given role mix.
    pub fn preference(self, mix: UnitMix) -> f32 {
        let total = mix.total().max(1) as f32;
        match self {
            FormationShape::Line => 1.0 + mix.ranged as f32 / total,
            FormationShape::Grid => {
                if mix.is_homogeneous() {
                    1.5
                } else {
                    2.0
                }
            }
            FormationShape::Circle => {
                if mix.is_balanced() && !mix.is_homogeneous() {
                    1.5
                } else {
                    1.0
                }
            }
            FormationShape::Arc => {
                if mix.is_homogeneous() || mix.is_balanced() {
                    2.0
                } else {
                    0.8
                }
            }
            FormationShape::Cross => {
                if mix.melee == 1 || mix.ranged == 1 {
                    3.0
                } else {
                    0.5
                }
            }
            FormationShape::Diamond => {
                if mix.ranged > 0 && mix.melee >= mix.ranged {
                    1.5
                } else {
                    0.8
                }
            }
            FormationShape::Wedge => {
                if mix.melee >= mix.ranged {
                    1.5
                } else {
                    0.7
                }
            }
            FormationShape::Cluster => {
                if mix.is_homogeneous() {
                    2.0
                } else {
                    0.6
                }
            }
            FormationShape::PoissonDisc => 0.25,
        }
    }

    /// Produces exactly `count` points inside `area`, pairwise at least
    /// `min_distance` apart whenever the area has room for them.
    ///
    /// A shape whose geometry does not fit falls back to Poisson-disc
    /// sampling, which in turn relaxes spacing rather than drop units.
    pub fn generate<R: Rng>(
        self,
        count: usize,
        area: &FormationArea,
        min_distance: f32,
        facing: Facing,
        rng: &mut R,
    ) -> Result<Vec<Vec2>> {
        if count == 0 {
            return Err(GenerationError::EmptyFormation(count));
        }
        let inner = area.inset_or_center(min_distance * 0.5);
        if count == 1 {
            return Ok(vec![inner.center()]);
        }

        let d = min_distance;
        let points = match self {
            FormationShape::Line => line(count, &inner, d, facing, rng),
            FormationShape::Grid => grid(count, &inner, d, rng),
            FormationShape::Circle => circle(count, &inner, d, facing),
            FormationShape::Arc => arc(count, &inner, d, facing),
            FormationShape::Cross => cross(count, &inner, d, facing),
            FormationShape::Diamond => diamond(count, &inner, d, facing),
            FormationShape::Wedge => wedge(count, &inner, d, facing),
            FormationShape::Cluster => Some(cluster(count, &inner, d, rng)),
            FormationShape::PoissonDisc => {
                return Ok(poisson_disc(count, &inner, d, Growth::Random, rng))
            }
        };

        match points {
            Some(points)
                if points.len() == count
                    && points.iter().all(|p| area.contains(*p))
                    && is_well_separated(&points, d) =>
            {
                Ok(points)
            }
            _ => {
                debug!(
                    shape = self.name(),
                    count,
                    width = area.width(),
                    height = area.height(),
                    "shape does not fit, falling back to poisson disc"
                );
                Ok(poisson_disc(count, &inner, d, Growth::Random, rng))
            }
        }
    }

    /// Reorders `units` so that the i-th unit belongs at the i-th point of
    /// this shape's `generate` output.
    pub fn order_units(self, units: Vec<FormationUnit>) -> Vec<FormationUnit> {
        ordering::order_units(self, units)
    }
}

/// How far one can travel from the area centre along `direction` before
/// leaving the area.
fn reach(area: &FormationArea, direction: Vec2) -> f32 {
    let mut best = f32::INFINITY;
    if direction.x.abs() > f32::EPSILON {
        best = best.min(area.width() * 0.5 / direction.x.abs());
    }
    if direction.y.abs() > f32::EPSILON {
        best = best.min(area.height() * 0.5 / direction.y.abs());
    }
    best
}

/// Signed slot offsets `(k - (n-1)/2) * spacing`, nearest the middle first.
fn centre_out_offsets(count: usize, spacing: f32) -> Vec<f32> {
    let middle = (count as f32 - 1.0) * 0.5;
    let mut offsets: Vec<f32> = (0..count)
        .map(|k| (k as f32 - middle) * spacing)
        .collect();
    offsets.sort_by(|a, b| a.abs().total_cmp(&b.abs()).then(b.total_cmp(a)));
    offsets
}

/// A single row or column. Clearly oblong areas set the axis; near-square
/// ones keep the line across `facing`.
fn line<R: Rng>(
    count: usize,
    area: &FormationArea,
    d: f32,
    facing: Facing,
    rng: &mut R,
) -> Option<Vec<Vec2>> {
    let aspect = area.aspect_ratio();
    let along = if aspect >= LINE_OBLONG_ASPECT {
        Vec2::X
    } else if aspect <= 1.0 / LINE_OBLONG_ASPECT {
        Vec2::Y
    } else {
        facing.perpendicular()
    };
    let across = along.perp();
    let spacing = (LINE_MAX_SPACING * d).min(2.0 * reach(area, along) / (count - 1) as f32);
    if spacing < d {
        return None;
    }
    // Ragged front: jitter only across the line so lateral spacing holds.
    let jitter = (0.25 * d).min(reach(area, across));
    let center = area.center();
    Some(
        centre_out_offsets(count, spacing)
            .into_iter()
            .map(|offset| center + along * offset + across * rng.gen_range(-jitter..=jitter))
            .collect(),
    )
}

fn grid<R: Rng>(count: usize, area: &FormationArea, d: f32, rng: &mut R) -> Option<Vec<Vec2>> {
    let cols = ((count as f32 * area.aspect_ratio()).sqrt().ceil() as usize).clamp(1, count);
    let rows = count.div_ceil(cols);
    let mut spacing = GRID_MAX_SPACING * d;
    if cols > 1 {
        spacing = spacing.min(area.width() / (cols - 1) as f32);
    }
    if rows > 1 {
        spacing = spacing.min(area.height() / (rows - 1) as f32);
    }
    if spacing < d {
        return None;
    }

    let jitter = ((spacing - d) * 0.5).min(GRID_MAX_JITTER * d).max(0.0);
    let origin = area.center()
        - Vec2::new((cols - 1) as f32, (rows - 1) as f32) * spacing * 0.5;

    // Outer ring of cells first, then inward.
    let mut cells: Vec<(usize, usize)> = (0..rows)
        .flat_map(|r| (0..cols).map(move |c| (r, c)))
        .collect();
    cells.sort_by_key(|&(r, c)| r.min(rows - 1 - r).min(c).min(cols - 1 - c));

    Some(
        cells
            .into_iter()
            .take(count)
            .map(|(r, c)| {
                let offset = Vec2::new(
                    rng.gen_range(-jitter..=jitter),
                    rng.gen_range(-jitter..=jitter),
                );
                origin + Vec2::new(c as f32, r as f32) * spacing + offset
            })
            .collect(),
    )
}

fn circle(count: usize, area: &FormationArea, d: f32, facing: Facing) -> Option<Vec<Vec2>> {
    let step = TAU / count as f32;
    let radius = (CIRCLE_RADIUS_SHARE * area.min_side()).max(d / (2.0 * (PI / count as f32).sin()));
    if radius > area.min_side() * 0.5 {
        return None;
    }
    let center = area.center();
    let start = facing.angle();
    Some(
        (0..count)
            .map(|k| center + Vec2::from_angle(start + step * k as f32) * radius)
            .collect(),
    )
}

/// Crescent whose horns point along `facing`.
fn arc(count: usize, area: &FormationArea, d: f32, facing: Facing) -> Option<Vec<Vec2>> {
    let step = ARC_SPAN / (count - 1) as f32;
    let radius =
        (ARC_RADIUS_SHARE * area.min_side()).max(d / (2.0 * (step * 0.5).sin()));
    let front = facing.vector();
    let pivot = area.center() + front * ARC_PIVOT_OFFSET * radius;

    let mut angles: Vec<f32> = (0..count)
        .map(|k| -ARC_SPAN * 0.5 + step * k as f32)
        .collect();
    angles.sort_by(|a, b| a.abs().total_cmp(&b.abs()).then(b.total_cmp(a)));

    let points: Vec<Vec2> = angles
        .into_iter()
        .map(|theta| pivot - Vec2::from_angle(theta).rotate(front) * radius)
        .collect();
    points.iter().all(|p| area.contains(*p)).then_some(points)
}

fn cross(count: usize, area: &FormationArea, d: f32, facing: Facing) -> Option<Vec<Vec2>> {
    let front = facing.vector();
    let side = facing.perpendicular();
    let arms = [front, side, -front, -side];
    let longest_arm = (count - 1).div_ceil(arms.len());
    let shortest_reach = arms
        .iter()
        .map(|dir| reach(area, *dir))
        .fold(f32::INFINITY, f32::min);
    let spacing = (CROSS_MAX_SPACING * d).min(shortest_reach / longest_arm as f32);
    if spacing < d {
        return None;
    }

    let center = area.center();
    let mut points = Vec::with_capacity(count);
    points.push(center);
    'fill: for step in 1..=longest_arm {
        for arm in &arms {
            if points.len() == count {
                break 'fill;
            }
            points.push(center + *arm * spacing * step as f32);
        }
    }
    Some(points)
}

/// Optional centre unit, everyone else evenly spaced around one diamond
/// perimeter starting at the front corner.
fn diamond(count: usize, area: &FormationArea, d: f32, facing: Facing) -> Option<Vec<Vec2>> {
    let front = facing.vector();
    let side = facing.perpendicular();
    let centred = count % 2 == 1;
    let around = count - usize::from(centred);

    // Neighbours on the perimeter are at least 4R/n apart even across a
    // corner; with a centre unit the edge midpoints (R/sqrt 2) must clear it.
    let mut needed = (around as f32 * d / 4.0).max(d * 0.5);
    if centred {
        needed = needed.max(SQRT_2 * d);
    }
    let room = reach(area, front).min(reach(area, side));
    let radius = (DIAMOND_MAX_SPACING * needed).min(room);
    if radius < needed {
        return None;
    }

    let center = area.center();
    let corners = [front, side, -front, -side].map(|v| center + v * radius);
    let mut points = Vec::with_capacity(count);
    if centred {
        points.push(center);
    }
    let edges = corners.len() as f32;
    for k in 0..around {
        let t = k as f32 * edges / around as f32;
        let edge = (t.floor() as usize).min(corners.len() - 1);
        let from = corners[edge];
        let to = corners[(edge + 1) % corners.len()];
        points.push(from.lerp(to, t - edge as f32));
    }
    Some(points)
}

fn wedge(count: usize, area: &FormationArea, d: f32, facing: Facing) -> Option<Vec<Vec2>> {
    let front = facing.vector();
    let side = facing.perpendicular();

    // Row k holds k + 1 units.
    let mut rows = 0usize;
    let mut capacity = 0usize;
    while capacity < count {
        rows += 1;
        capacity += rows;
    }
    let depth_room = 2.0 * reach(area, front);
    let width_room = 2.0 * reach(area, side);
    let span = (rows - 1) as f32;

    let spacing = WEDGE_SPACINGS
        .iter()
        .map(|factor| factor * d)
        .find(|s| span * s <= depth_room && span * s <= width_room)?;

    let tip = area.center() + front * span * spacing * 0.5;
    let mut points = Vec::with_capacity(count);
    'rows: for row in 0..rows {
        let row_center = tip - front * spacing * row as f32;
        for offset in centre_out_offsets(row + 1, spacing) {
            if points.len() == count {
                break 'rows;
            }
            points.push(row_center + side * offset);
        }
    }
    Some(points)
}

fn cluster<R: Rng>(count: usize, area: &FormationArea, d: f32, rng: &mut R) -> Vec<Vec2> {
    let center = area.center();
    let mut points = poisson_disc(count, area, d, Growth::Compact, rng);
    points.sort_by(|a, b| a.distance_squared(center).total_cmp(&b.distance_squared(center)));
    points
}
