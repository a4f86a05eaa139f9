//! Poisson-disc sampling and relaxed scatter.
//!
//! Both always return exactly the requested number of points. When space
//! runs out the separation requirement is halved, quartered and finally
//! dropped, and a warning is logged.

use std::collections::HashMap;
use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use tracing::{debug, warn};

use super::{FormationArea, SEPARATION_EPSILON};

/// Candidate darts thrown around each active point.
const ATTEMPTS_PER_POINT: usize = 30;
/// Darts thrown per point when scattering without an active list.
const SCATTER_ATTEMPTS: usize = 100;
/// Fractions of the minimum separation tried before giving up on spacing.
const RELAXATION: [f32; 3] = [1.0, 0.5, 0.25];

/// How the active list is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Growth {
    /// Classic Bridson: random start, random active point.
    Random,
    /// Starts at the area centre and always grows the point closest to it,
    /// keeping the sample a tight blob.
    Compact,
}

/// Bucketed points for neighbour checks. Cells are one separation wide so a
/// 3x3 neighbourhood covers every conflict.
pub(crate) struct SpatialGrid {
    cell: f32,
    cells: HashMap<(i32, i32), Vec<Vec2>>,
}

impl SpatialGrid {
    pub(crate) fn new(min_distance: f32) -> Self {
        Self {
            cell: min_distance.max(SEPARATION_EPSILON),
            cells: HashMap::new(),
        }
    }

    pub(crate) fn with_points(min_distance: f32, points: &[Vec2]) -> Self {
        let mut grid = Self::new(min_distance);
        for point in points {
            grid.insert(*point);
        }
        grid
    }

    fn key(&self, point: Vec2) -> (i32, i32) {
        (
            (point.x / self.cell).floor() as i32,
            (point.y / self.cell).floor() as i32,
        )
    }

    pub(crate) fn insert(&mut self, point: Vec2) {
        let key = self.key(point);
        self.cells.entry(key).or_default().push(point);
    }

    /// True when no stored point is closer than `required`, which must not
    /// exceed the grid's cell size.
    pub(crate) fn is_clear(&self, point: Vec2, required: f32) -> bool {
        if required <= 0.0 {
            return true;
        }
        let required_sq = required * required;
        let (cx, cy) = self.key(point);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(bucket) = self.cells.get(&(cx + dx, cy + dy)) {
                    if bucket
                        .iter()
                        .any(|other| other.distance_squared(point) < required_sq)
                    {
                        return false;
                    }
                }
            }
        }
        true
    }
}

/// Bridson sampling inside `area`.
pub fn poisson_disc<R: Rng>(
    count: usize,
    area: &FormationArea,
    min_distance: f32,
    growth: Growth,
    rng: &mut R,
) -> Vec<Vec2> {
    if count == 0 {
        return Vec::new();
    }
    let d = min_distance.max(SEPARATION_EPSILON);
    let start = match growth {
        Growth::Compact => area.center(),
        Growth::Random => area.random_point(rng),
    };

    let mut grid = SpatialGrid::new(d);
    let mut points = Vec::with_capacity(count);
    let mut active: Vec<usize> = vec![0];
    grid.insert(start);
    points.push(start);

    while points.len() < count && !active.is_empty() {
        let slot = match growth {
            Growth::Random => rng.gen_range(0..active.len()),
            Growth::Compact => nearest_active(&active, &points, start),
        };
        let origin = points[active[slot]];

        let mut accepted: Option<Vec2> = None;
        for _ in 0..ATTEMPTS_PER_POINT {
            let radius = rng.gen_range(d..d * 2.0);
            let angle = rng.gen_range(0.0..TAU);
            let candidate = origin + Vec2::from_angle(angle) * radius;
            if !area.contains(candidate) || !grid.is_clear(candidate, d) {
                continue;
            }
            match growth {
                Growth::Random => {
                    accepted = Some(candidate);
                    break;
                }
                Growth::Compact => {
                    let closer = accepted.map_or(true, |best| {
                        candidate.distance_squared(start) < best.distance_squared(start)
                    });
                    if closer {
                        accepted = Some(candidate);
                    }
                }
            }
        }

        match accepted {
            Some(point) => {
                grid.insert(point);
                points.push(point);
                active.push(points.len() - 1);
            }
            None => {
                active.swap_remove(slot);
            }
        }
    }

    if points.len() < count {
        debug!(
            placed = points.len(),
            requested = count,
            "poisson sampling saturated, scattering remainder"
        );
        fill_remaining(&mut points, &mut grid, count, d, |rng| area.random_point(rng), rng);
    }
    points
}

/// Dart-throws `count` new points inside `area` that keep clear of
/// `existing` and of each other.
pub fn scatter_avoiding<R: Rng>(
    count: usize,
    area: &FormationArea,
    min_distance: f32,
    existing: &[Vec2],
    rng: &mut R,
) -> Vec<Vec2> {
    let d = min_distance.max(SEPARATION_EPSILON);
    let mut grid = SpatialGrid::with_points(d, existing);
    let mut points = Vec::with_capacity(count);
    fill_remaining(&mut points, &mut grid, count, d, |rng| area.random_point(rng), rng);
    points
}

/// Like `scatter_avoiding`, but samples the ring between `inner_radius` and
/// `outer_radius` around `center`, clipped to `bounds`.
#[allow(clippy::too_many_arguments)]
pub fn scatter_in_annulus<R: Rng>(
    count: usize,
    center: Vec2,
    inner_radius: f32,
    outer_radius: f32,
    bounds: &FormationArea,
    min_distance: f32,
    existing: &[Vec2],
    rng: &mut R,
) -> Vec<Vec2> {
    let d = min_distance.max(SEPARATION_EPSILON);
    let inner = inner_radius.max(0.0);
    let outer = outer_radius.max(inner + SEPARATION_EPSILON);
    let mut grid = SpatialGrid::with_points(d, existing);
    let mut points = Vec::with_capacity(count);
    let sample = |rng: &mut R| {
        // Uniform over the ring's area, clipped to the map.
        let radius = rng.gen_range(inner * inner..=outer * outer).sqrt();
        let angle = rng.gen_range(0.0..TAU);
        bounds.clamp_point(center + Vec2::from_angle(angle) * radius)
    };
    fill_remaining(&mut points, &mut grid, count, d, sample, rng);
    points
}

fn nearest_active(active: &[usize], points: &[Vec2], start: Vec2) -> usize {
    active
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            points[**a]
                .distance_squared(start)
                .total_cmp(&points[**b].distance_squared(start))
        })
        .map(|(slot, _)| slot)
        .unwrap_or(0)
}

fn fill_remaining<R, F>(
    points: &mut Vec<Vec2>,
    grid: &mut SpatialGrid,
    count: usize,
    min_distance: f32,
    mut sample: F,
    rng: &mut R,
) where
    R: Rng,
    F: FnMut(&mut R) -> Vec2,
{
    for (step, factor) in RELAXATION.iter().enumerate() {
        let required = min_distance * factor;
        while points.len() < count {
            let mut placed = false;
            for _ in 0..SCATTER_ATTEMPTS {
                let candidate = sample(rng);
                if grid.is_clear(candidate, required) {
                    grid.insert(candidate);
                    points.push(candidate);
                    placed = true;
                    break;
                }
            }
            if !placed {
                break;
            }
        }
        if points.len() >= count {
            if step > 0 {
                warn!(
                    spacing = required,
                    min_distance, "relaxed separation to place every unit"
                );
            }
            return;
        }
    }

    warn!(
        missing = count - points.len(),
        "no room left, placing remaining units without spacing"
    );
    while points.len() < count {
        let candidate = sample(rng);
        grid.insert(candidate);
        points.push(candidate);
    }
}
