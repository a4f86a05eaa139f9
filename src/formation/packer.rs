use rand::{
    distributions::{Distribution, WeightedIndex},
    Rng,
};
use tracing::{debug, warn};

use super::{
    footprint_radius, scatter_avoiding, team_positions, Facing, FormationArea, FormationShape,
    FormationUnit, Role, UnitMix, SEPARATION_EPSILON,
};
use crate::{
    composition::UnitStartingData,
    error::{GenerationError, Result},
};

/// Largest group a single mini-formation holds.
pub const MAX_GROUP_SIZE: usize = 8;
const SUB_AREA_ATTEMPTS: usize = 50;
const SUB_AREA_SPREAD: f32 = 1.8;
const MIN_ASPECT: f32 = 0.75;
const MAX_ASPECT: f32 = 1.33;

/// Breaks `units` into small shaped groups scattered over `area`.
///
/// Sub-areas keep a gap of at least `min_distance` from each other. Once no
/// further sub-area fits, the rest are laid out by `team_positions` if that
/// stays clear of everyone already placed, or scattered around them
/// otherwise. Every unit comes back positioned.
pub fn pack_mini_formations<R: Rng>(
    units: Vec<FormationUnit>,
    area: &FormationArea,
    min_distance: f32,
    facing: Facing,
    rng: &mut R,
) -> Result<Vec<UnitStartingData>> {
    if units.is_empty() {
        return Err(GenerationError::EmptyFormation(0));
    }
    let d = min_distance;
    let total = units.len();
    let mut remaining = units;
    let mut placed: Vec<UnitStartingData> = Vec::with_capacity(total);
    let mut carved: Vec<FormationArea> = Vec::new();

    while !remaining.is_empty() {
        let size = rng.gen_range(1..=MAX_GROUP_SIZE.min(remaining.len()));
        let Some(sub_area) = carve_sub_area(area, &carved, size, d, rng) else {
            debug!(
                groups = carved.len(),
                left = remaining.len(),
                "no room for another mini-formation"
            );
            break;
        };
        let group = take_group(&mut remaining, size);
        let mix = UnitMix::of(&group);
        let shape = choose_shape(mix, group.len(), rng);
        let ordered = shape.order_units(group);
        let points = shape.generate(ordered.len(), &sub_area, d, facing, rng)?;
        debug!(
            shape = shape.name(),
            melee = mix.melee,
            ranged = mix.ranged,
            "packed mini-formation"
        );
        placed.extend(
            ordered
                .into_iter()
                .zip(points)
                .map(|(unit, point)| unit.data.placed_at(point)),
        );
        carved.push(sub_area);
    }

    if !remaining.is_empty() {
        let existing: Vec<_> = placed.iter().map(|u| u.position).collect();
        let mut points = team_positions(remaining.len(), area, d, rng)?;
        let clear = points.iter().all(|p| {
            existing
                .iter()
                .all(|q| p.distance(*q) >= d - SEPARATION_EPSILON)
        });
        if !clear {
            warn!(
                left = remaining.len(),
                "mini-formations filled the area, scattering the rest"
            );
            let inner = area.inset_or_center(d * 0.5);
            points = scatter_avoiding(remaining.len(), &inner, d, &existing, rng);
        }
        placed.extend(
            remaining
                .into_iter()
                .zip(points)
                .map(|(unit, point)| unit.data.placed_at(point)),
        );
    }

    debug!(units = placed.len(), groups = carved.len(), "mini-formations packed");
    Ok(placed)
}

/// Removes `size` units from `remaining`, keeping a whole role together when
/// it fits and topping the group up from the other role. Otherwise the group
/// is a slice of the larger role.
fn take_group(remaining: &mut Vec<FormationUnit>, size: usize) -> Vec<FormationUnit> {
    let mix = UnitMix::of(remaining);
    let (lead, lead_quota) = if mix.melee > 0 && mix.melee <= size {
        (Role::Melee, mix.melee)
    } else if mix.ranged > 0 && mix.ranged <= size {
        (Role::Ranged, mix.ranged)
    } else if mix.melee >= mix.ranged {
        (Role::Melee, size)
    } else {
        (Role::Ranged, size)
    };

    let mut lead_left = lead_quota;
    let mut fill_left = size - lead_quota;
    let mut group = Vec::with_capacity(size);
    let mut rest = Vec::with_capacity(remaining.len().saturating_sub(size));
    for unit in std::mem::take(remaining) {
        if unit.role == lead && lead_left > 0 {
            lead_left -= 1;
            group.push(unit);
        } else if unit.role != lead && fill_left > 0 {
            fill_left -= 1;
            group.push(unit);
        } else {
            rest.push(unit);
        }
    }
    *remaining = rest;
    group
}

fn choose_shape<R: Rng>(mix: UnitMix, count: usize, rng: &mut R) -> FormationShape {
    let candidates: Vec<FormationShape> = FormationShape::LIBRARY
        .iter()
        .copied()
        .filter(|shape| shape.can_handle(count))
        .collect();
    let weights: Vec<f32> = candidates.iter().map(|s| s.preference(mix)).collect();
    match WeightedIndex::new(&weights) {
        Ok(dist) => candidates[dist.sample(rng)],
        Err(_) => FormationShape::PoissonDisc,
    }
}

fn carve_sub_area<R: Rng>(
    area: &FormationArea,
    carved: &[FormationArea],
    count: usize,
    d: f32,
    rng: &mut R,
) -> Option<FormationArea> {
    let side = (2.0 * footprint_radius(count, d) * SUB_AREA_SPREAD).max(2.0 * d) + d;
    for _ in 0..SUB_AREA_ATTEMPTS {
        let stretch = rng.gen_range(MIN_ASPECT..=MAX_ASPECT).sqrt();
        let width = (side * stretch).min(area.width());
        let height = (side / stretch).min(area.height());
        let x = span(area.min_x + width * 0.5, area.max_x - width * 0.5, rng);
        let y = span(area.min_y + height * 0.5, area.max_y - height * 0.5, rng);
        let candidate = FormationArea::new(
            x - width * 0.5,
            x + width * 0.5,
            y - height * 0.5,
            y + height * 0.5,
        )?;
        if carved.iter().all(|other| other.gap_to(&candidate) >= d) {
            return Some(candidate);
        }
    }
    None
}

fn span<R: Rng>(low: f32, high: f32, rng: &mut R) -> f32 {
    if high > low {
        rng.gen_range(low..=high)
    } else {
        (low + high) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formation::is_well_separated;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn units(melee: usize, ranged: usize) -> Vec<FormationUnit> {
        let make = |i: usize, role: Role| {
            let class = if role == Role::Melee { "Knight" } else { "Archer" };
            FormationUnit::new(UnitStartingData::new(1, class, format!("u{i}"), 1.0), role)
        };
        (0..melee)
            .map(|i| make(i, Role::Melee))
            .chain((0..ranged).map(|i| make(melee + i, Role::Ranged)))
            .collect()
    }

    #[test]
    fn every_unit_is_placed_apart_and_in_bounds() {
        let area = FormationArea::new(-20.0, 20.0, -20.0, 20.0).unwrap();
        for seed in 0..8 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let placed = pack_mini_formations(units(18, 12), &area, 1.26, Facing::North, &mut rng)
                .unwrap();
            assert_eq!(placed.len(), 30);
            let points: Vec<_> = placed.iter().map(|u| u.position).collect();
            assert!(points.iter().all(|p| area.contains(*p)));
            assert!(is_well_separated(&points, 1.26), "seed {seed}");
        }
    }

    #[test]
    fn crowded_area_still_places_everyone() {
        let area = FormationArea::new(0.0, 8.0, 0.0, 8.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let placed = pack_mini_formations(units(20, 5), &area, 1.0, Facing::East, &mut rng).unwrap();
        assert_eq!(placed.len(), 25);
        assert!(placed.iter().all(|u| area.contains(u.position)));
    }

    #[test]
    fn empty_input_is_an_error() {
        let area = FormationArea::new(0.0, 8.0, 0.0, 8.0).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        assert_eq!(
            pack_mini_formations(Vec::new(), &area, 1.0, Facing::East, &mut rng),
            Err(GenerationError::EmptyFormation(0))
        );
    }

    #[test]
    fn whole_role_group_is_kept_together() {
        let mut remaining = units(6, 2);
        let group = take_group(&mut remaining, 5);
        let mix = UnitMix::of(&group);
        assert_eq!((mix.melee, mix.ranged), (3, 2));
        assert_eq!(remaining.len(), 3);
        assert!(remaining.iter().all(|u| u.role == Role::Melee));
    }

    #[test]
    fn oversized_roles_give_a_homogeneous_slice() {
        let mut remaining = units(10, 9);
        let group = take_group(&mut remaining, 4);
        assert_eq!(group.len(), 4);
        assert!(UnitMix::of(&group).is_homogeneous());
        assert_eq!(remaining.len(), 15);
    }

    #[test]
    fn shape_choice_respects_capacity() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        for _ in 0..50 {
            let shape = choose_shape(UnitMix::new(1, 0), 1, &mut rng);
            assert!(shape.can_handle(1));
            let shape = choose_shape(UnitMix::new(5, 4), 9, &mut rng);
            assert_ne!(shape, FormationShape::Line);
        }
    }
}
