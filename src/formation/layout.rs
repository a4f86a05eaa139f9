use std::f32::consts::{PI, TAU};

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{poisson_disc, FormationArea, Growth};
use crate::error::{GenerationError, Result};

/// Aspect ratio beyond which a team is strung out in a line or column.
const ELONGATED_ASPECT: f32 = 3.0;
/// Upper bound on spacing for evenly spread team positions, in units of d.
const TEAM_MAX_SPACING: f32 = 2.0;
/// Radial distance between rings, in units of d.
pub(super) const RING_STEP: f32 = 1.2;
const RING_CHORD: f32 = 1.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeamLayout {
    Line,
    Column,
    Grid,
}

pub fn choose_team_layout(count: usize, area: &FormationArea) -> TeamLayout {
    let aspect = area.aspect_ratio();
    if count > 1 && aspect >= ELONGATED_ASPECT {
        TeamLayout::Line
    } else if count > 1 && aspect <= 1.0 / ELONGATED_ASPECT {
        TeamLayout::Column
    } else {
        TeamLayout::Grid
    }
}

/// Generic team placement used when no mini-formation applies: ranks across
/// wide areas, files down tall ones and a spread grid otherwise.
pub fn team_positions<R: Rng>(
    count: usize,
    area: &FormationArea,
    min_distance: f32,
    rng: &mut R,
) -> Result<Vec<Vec2>> {
    if count == 0 {
        return Err(GenerationError::EmptyFormation(count));
    }
    let inner = area.inset_or_center(min_distance * 0.5);
    let d = min_distance;
    let per_rank = |extent: f32| ((extent / d).floor() as usize + 1).clamp(1, count);

    let layout = choose_team_layout(count, &inner);
    let (cols, rows) = match layout {
        TeamLayout::Line => {
            let cols = per_rank(inner.width());
            (cols, count.div_ceil(cols))
        }
        TeamLayout::Column => {
            let rows = per_rank(inner.height());
            (count.div_ceil(rows), rows)
        }
        TeamLayout::Grid => {
            let cols = ((count as f32 * inner.aspect_ratio()).sqrt().ceil() as usize).clamp(1, count);
            (cols, count.div_ceil(cols))
        }
    };

    let spacing_x = axis_spacing(inner.width(), cols, d);
    let spacing_y = axis_spacing(inner.height(), rows, d);
    if spacing_x < d || spacing_y < d {
        debug!(count, ?layout, "team layout does not fit, sampling positions");
        return Ok(poisson_disc(count, &inner, d, Growth::Random, rng));
    }

    let origin = inner.center()
        - Vec2::new(
            (cols - 1) as f32 * spacing_x,
            (rows - 1) as f32 * spacing_y,
        ) * 0.5;
    Ok((0..count)
        .map(|i| {
            let (row, col) = (i / cols, i % cols);
            origin + Vec2::new(col as f32 * spacing_x, row as f32 * spacing_y)
        })
        .collect())
}

fn axis_spacing(extent: f32, slots: usize, d: f32) -> f32 {
    if slots <= 1 {
        return f32::INFINITY;
    }
    (extent / (slots - 1) as f32).min(TEAM_MAX_SPACING * d)
}

/// How many points fit on a ring of `radius` with chords of at least
/// `RING_CHORD * d`.
pub(super) fn ring_capacity(radius: f32, d: f32) -> usize {
    let chord = RING_CHORD * d;
    if chord > 2.0 * radius {
        return 1;
    }
    let half_angle = (chord / (2.0 * radius)).min(1.0).asin();
    ((PI / half_angle).floor() as usize).max(1)
}

/// Concentric rings around `center` from `inner_radius` outward in steps of
/// `1.2 * d`, each with a random rotation.
///
/// Points outside `bounds` are dropped, so fewer than `count` points come back
/// when the rings run past `outer_radius` or the map edge.
#[allow(clippy::too_many_arguments)]
pub fn circular_positions<R: Rng>(
    count: usize,
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    bounds: &FormationArea,
    min_distance: f32,
    rng: &mut R,
) -> Vec<Vec2> {
    let d = min_distance;
    let mut points = Vec::with_capacity(count);
    let mut radius = inner_radius.max(0.0);

    while points.len() < count && radius <= outer_radius {
        let capacity = ring_capacity(radius, d);
        if capacity == 1 {
            let point = center + Vec2::X * radius;
            if bounds.contains(point) {
                points.push(point);
            }
        } else {
            let on_ring = capacity.min(count - points.len());
            let step = TAU / on_ring as f32;
            let rotation = rng.gen_range(0.0..TAU);
            points.extend(
                (0..on_ring)
                    .map(|k| center + Vec2::from_angle(rotation + step * k as f32) * radius)
                    .filter(|p| bounds.contains(*p)),
            );
        }
        radius += RING_STEP * d;
    }

    if points.len() < count {
        debug!(
            placed = points.len(),
            requested = count,
            "rings exhausted before every unit was placed"
        );
    }
    points
}
