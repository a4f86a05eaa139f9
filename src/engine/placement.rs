//! Turning composed teams into positioned units for each battle mode.

use glam::Vec2;
use rand::{seq::SliceRandom, Rng};
use tracing::{debug, warn};

use crate::{
    catalog::Catalog,
    composition::{TeamComposition, TeamId, UnitStartingData},
    config::GenerationConfig,
    error::Result,
    formation::{
        circular_positions, find_seize_boss, pack_mini_formations, scatter_avoiding,
        scatter_in_annulus, sector_areas, split_seize, split_survive, split_teams,
        split_two_teams, Facing, FormationUnit, MapBounds, Role, SurroundLayout, SurviveSplit,
        TeamArea,
    },
    setup::BattleMode,
};

/// Share of a capture-point holder's army that forms the defensive rings.
const SEIZE_RING_SHARE: f32 = 0.4;
/// Attacker sectors per attacking team in survive battles.
const SECTORS_PER_TEAM: usize = 3;
const MAX_SECTORS: usize = 8;

#[allow(clippy::too_many_arguments)]
pub(super) fn place_units<R: Rng>(
    mode: &BattleMode,
    teams: &[TeamComposition],
    bounds: &MapBounds,
    min_distance: f32,
    catalog: &dyn Catalog,
    config: &GenerationConfig,
    rng: &mut R,
) -> Result<Vec<UnitStartingData>> {
    let d = min_distance;
    match mode {
        BattleMode::TwoTeam { separation } => {
            let counts = (team_size(teams, 0), team_size(teams, 1));
            let areas = split_two_teams(bounds, counts, d, *separation);
            place_in_areas(teams, &areas, d, catalog, rng)
        }
        BattleMode::MultiTeam | BattleMode::TeamBattle { .. } => {
            let areas = split_teams(bounds, teams.len(), d, config.rotate_cell_chance, rng)?;
            place_in_areas(teams, &areas, d, catalog, rng)
        }
        BattleMode::Seize {
            capture_point,
            holder,
        } => {
            let holder = team_index(teams, *holder);
            let capture_point = capture_point.map(Vec2::from);
            place_seize(teams, holder, capture_point, bounds, d, catalog, rng)
        }
        BattleMode::Survive { layout, survivor } => {
            let layout = match layout {
                Some(layout) => *layout,
                None => SurroundLayout::ALL
                    .choose(rng)
                    .copied()
                    .unwrap_or(SurroundLayout::ConcentricRings),
            };
            let survivor = team_index(teams, *survivor);
            place_survive(teams, survivor, layout, bounds, d, catalog, rng)
        }
    }
}

fn team_size(teams: &[TeamComposition], index: usize) -> usize {
    teams.get(index).map_or(0, TeamComposition::total_units)
}

fn team_index(teams: &[TeamComposition], id: Option<TeamId>) -> usize {
    id.and_then(|id| teams.iter().position(|t| t.team_id == id))
        .unwrap_or(0)
}

fn formation_units(team: &TeamComposition, catalog: &dyn Catalog) -> Vec<FormationUnit> {
    team.units()
        .map(|unit| {
            let role = if catalog.is_ranged(&unit.class_name) {
                Role::Ranged
            } else {
                Role::Melee
            };
            FormationUnit::new(unit.clone(), role)
        })
        .collect()
}

fn place_team<R: Rng>(
    units: Vec<FormationUnit>,
    area: &TeamArea,
    d: f32,
    rng: &mut R,
) -> Result<Vec<UnitStartingData>> {
    if units.is_empty() {
        return Ok(Vec::new());
    }
    pack_mini_formations(units, &area.area, d, area.facing, rng)
}

fn place_in_areas<R: Rng>(
    teams: &[TeamComposition],
    areas: &[TeamArea],
    d: f32,
    catalog: &dyn Catalog,
    rng: &mut R,
) -> Result<Vec<UnitStartingData>> {
    let mut placed = Vec::new();
    for (team, area) in teams.iter().zip(areas) {
        placed.extend(place_team(formation_units(team, catalog), area, d, rng)?);
        debug!(team_id = team.team_id, facing = ?area.facing, "team placed");
    }
    Ok(placed)
}

#[allow(clippy::too_many_arguments)]
fn place_seize<R: Rng>(
    teams: &[TeamComposition],
    holder: usize,
    capture_point: Option<Vec2>,
    bounds: &MapBounds,
    d: f32,
    catalog: &dyn Catalog,
    rng: &mut R,
) -> Result<Vec<UnitStartingData>> {
    let counts = (team_size(teams, 0), team_size(teams, 1));
    let areas = split_two_teams(bounds, counts, d, true);
    let mut placed = Vec::new();

    for (index, (team, area)) in teams.iter().zip(&areas).enumerate() {
        if index != holder {
            placed.extend(place_team(formation_units(team, catalog), area, d, rng)?);
            continue;
        }

        let mut units = formation_units(team, catalog);
        let point = capture_point.unwrap_or_else(|| area.area.center());
        let boss_index = {
            let data: Vec<UnitStartingData> = units.iter().map(|u| u.data.clone()).collect();
            find_seize_boss(&data)
        };
        let boss = boss_index.map(|i| units.remove(i));

        // Melee form the rings.
        units.sort_by_key(|u| u.role == Role::Ranged);
        let ring_count = (units.len() as f32 * SEIZE_RING_SHARE).round() as usize;
        let split = split_seize(area, point, ring_count, d);

        let mut holder_placed = Vec::with_capacity(team.total_units());
        if let Some(boss) = boss {
            holder_placed.push(boss.data.placed_at(split.capture_point));
        }

        let ring_points = circular_positions(
            ring_count,
            split.capture_point,
            d,
            split.ring_radius,
            &split.ring,
            d,
            rng,
        );
        let rest = units.split_off(ring_points.len().min(units.len()));
        holder_placed.extend(
            units
                .into_iter()
                .zip(ring_points)
                .map(|(unit, point)| unit.data.placed_at(point)),
        );

        if !rest.is_empty() {
            match split.secondary {
                Some(secondary) => {
                    let secondary = TeamArea {
                        area: secondary,
                        facing: split.facing,
                    };
                    holder_placed.extend(place_team(rest, &secondary, d, rng)?);
                }
                None => {
                    warn!(left = rest.len(), "no secondary seize area, scattering");
                    let existing: Vec<Vec2> = holder_placed.iter().map(|u| u.position).collect();
                    let inner = area.area.inset_or_center(d * 0.5);
                    let points = scatter_avoiding(rest.len(), &inner, d, &existing, rng);
                    holder_placed.extend(
                        rest.into_iter()
                            .zip(points)
                            .map(|(unit, point)| unit.data.placed_at(point)),
                    );
                }
            }
        }
        debug!(
            team_id = team.team_id,
            ring = ring_count,
            units = holder_placed.len(),
            "capture point held"
        );
        placed.extend(holder_placed);
    }
    Ok(placed)
}

#[allow(clippy::too_many_arguments)]
fn place_survive<R: Rng>(
    teams: &[TeamComposition],
    survivor: usize,
    layout: SurroundLayout,
    bounds: &MapBounds,
    d: f32,
    catalog: &dyn Catalog,
    rng: &mut R,
) -> Result<Vec<UnitStartingData>> {
    let survivors = teams
        .get(survivor)
        .map(|team| formation_units(team, catalog))
        .unwrap_or_default();
    let split = split_survive(bounds, survivors.len(), d, layout);
    let central = TeamArea {
        area: split.central,
        facing: Facing::North,
    };
    let mut placed = place_team(survivors, &central, d, rng)?;

    let attackers: Vec<(usize, Vec<FormationUnit>)> = teams
        .iter()
        .enumerate()
        .filter(|(index, _)| *index != survivor)
        .map(|(index, team)| (index, formation_units(team, catalog)))
        .collect();

    match layout {
        SurroundLayout::ConcentricRings => {
            let units: Vec<FormationUnit> = attackers.into_iter().flat_map(|(_, u)| u).collect();
            placed.extend(surround_rings(units, &split, d, &placed, rng));
        }
        SurroundLayout::RingAndScatter => {
            let mut units: Vec<FormationUnit> =
                attackers.into_iter().flat_map(|(_, u)| u).collect();
            let scattered = units.split_off(units.len().div_ceil(2));
            let ringed = surround_rings(units, &split, d, &placed, rng);
            placed.extend(ringed);
            let existing: Vec<Vec2> = placed.iter().map(|u| u.position).collect();
            let points = scatter_in_annulus(
                scattered.len(),
                Vec2::ZERO,
                split.inner_radius,
                split.outer_radius,
                &split.outer,
                d,
                &existing,
                rng,
            );
            placed.extend(
                scattered
                    .into_iter()
                    .zip(points)
                    .map(|(unit, point)| unit.data.placed_at(point)),
            );
        }
        SurroundLayout::Sectors => {
            let wanted = (attackers.len() * SECTORS_PER_TEAM).clamp(1, MAX_SECTORS);
            let sectors = sector_areas(&split, wanted, d);
            let units: Vec<FormationUnit> = attackers.into_iter().flat_map(|(_, u)| u).collect();
            if sectors.is_empty() {
                warn!("survive band too narrow for sectors, using rings");
                placed.extend(surround_rings(units, &split, d, &placed, rng));
            } else {
                let chunk = units.len().div_ceil(sectors.len()).max(1);
                let mut units = units;
                for sector in &sectors {
                    if units.is_empty() {
                        break;
                    }
                    let rest = units.split_off(chunk.min(units.len()));
                    placed.extend(place_team(units, sector, d, rng)?);
                    units = rest;
                }
            }
        }
    }
    Ok(placed)
}

/// Attackers on rings around the map centre; anyone the rings cannot hold is
/// scattered over the rest of the annulus.
fn surround_rings<R: Rng>(
    mut units: Vec<FormationUnit>,
    split: &SurviveSplit,
    d: f32,
    existing: &[UnitStartingData],
    rng: &mut R,
) -> Vec<UnitStartingData> {
    if units.is_empty() {
        return Vec::new();
    }
    let ring_points = circular_positions(
        units.len(),
        Vec2::ZERO,
        split.inner_radius,
        split.outer_radius,
        &split.outer,
        d,
        rng,
    );
    let rest = units.split_off(ring_points.len().min(units.len()));
    let mut placed: Vec<UnitStartingData> = units
        .into_iter()
        .zip(ring_points)
        .map(|(unit, point)| unit.data.placed_at(point))
        .collect();

    if !rest.is_empty() {
        warn!(left = rest.len(), "rings full, scattering remaining attackers");
        let taken: Vec<Vec2> = existing
            .iter()
            .chain(&placed)
            .map(|u| u.position)
            .collect();
        let points = scatter_in_annulus(
            rest.len(),
            Vec2::ZERO,
            split.inner_radius,
            split.outer_radius,
            &split.outer,
            d,
            &taken,
            rng,
        );
        placed.extend(
            rest.into_iter()
                .zip(points)
                .map(|(unit, point)| unit.data.placed_at(point)),
        );
    }
    placed
}
