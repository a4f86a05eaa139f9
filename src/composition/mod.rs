//! Army rosters: which classes and characters fight for a team and how strong
//! each of them is.

mod enemy;
mod roster;
mod theme;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{catalog::Catalog, config::GenerationConfig, naming::ArmyNamer, power::power};

pub use enemy::{
    generate_enemy, BOSS_SCALE, ELITE_SCALE, ESCALATED_BOSS_SCALE, MINIBOSS_SCALE,
    RARE_BOSS_SCALE, STRONG_TROOP_SCALE, TROOP_SCALE,
};
pub use roster::{generate_default, generate_roster};
pub use theme::{select_theme, Theme, ThemeKind, ThemeResolution};

pub type TeamId = u32;

/// Everything the engine needs to know to spawn one unit.
///
/// The composition stage creates records at the origin; placement then
/// produces the final record with `placed_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitStartingData {
    pub position: Vec2,
    pub team_id: TeamId,
    pub class_name: String,
    pub display_name: String,
    pub scale: f32,
}

impl UnitStartingData {
    pub fn new(
        team_id: TeamId,
        class_name: impl Into<String>,
        display_name: impl Into<String>,
        scale: f32,
    ) -> Self {
        Self {
            position: Vec2::ZERO,
            team_id,
            class_name: class_name.into(),
            display_name: display_name.into(),
            scale: scale.max(0.0),
        }
    }

    pub fn placed_at(self, position: Vec2) -> Self {
        Self { position, ..self }
    }

    pub fn power(&self) -> f32 {
        power(self.scale)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassCount {
    pub class_name: String,
    pub count: usize,
    pub unit_data: Vec<UnitStartingData>,
}

impl ClassCount {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            count: 0,
            unit_data: Vec::new(),
        }
    }

    pub fn push(&mut self, unit: UnitStartingData) {
        self.unit_data.push(unit);
        self.count = self.unit_data.len();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamComposition {
    pub team_id: TeamId,
    pub army_name: String,
    pub class_counts: Vec<ClassCount>,
}

impl TeamComposition {
    pub fn new(team_id: TeamId, army_name: impl Into<String>) -> Self {
        Self {
            team_id,
            army_name: army_name.into(),
            class_counts: Vec::new(),
        }
    }

    /// Files a unit under its class, re-tagging it with this team's id.
    pub fn add_unit(&mut self, unit: UnitStartingData) {
        let unit = UnitStartingData {
            team_id: self.team_id,
            ..unit
        };
        match self
            .class_counts
            .iter_mut()
            .find(|entry| entry.class_name == unit.class_name)
        {
            Some(entry) => entry.push(unit),
            None => {
                let mut entry = ClassCount::new(unit.class_name.clone());
                entry.push(unit);
                self.class_counts.push(entry);
            }
        }
    }

    pub fn total_units(&self) -> usize {
        self.class_counts.iter().map(|entry| entry.count).sum()
    }

    pub fn total_power(&self) -> f32 {
        self.units().map(UnitStartingData::power).sum()
    }

    pub fn units(&self) -> impl Iterator<Item = &UnitStartingData> {
        self.class_counts.iter().flat_map(|entry| entry.unit_data.iter())
    }

    pub fn into_units(self) -> Vec<UnitStartingData> {
        self.class_counts
            .into_iter()
            .flat_map(|entry| entry.unit_data)
            .collect()
    }

    pub fn class_count(&self, class_name: &str) -> Option<&ClassCount> {
        self.class_counts
            .iter()
            .find(|entry| entry.class_name == class_name)
    }

    pub fn is_empty(&self) -> bool {
        self.total_units() == 0
    }
}

/// Shared read-only inputs for roster generation.
pub struct GenerationContext<'a> {
    pub catalog: &'a dyn Catalog,
    pub namer: &'a dyn ArmyNamer,
    pub config: &'a GenerationConfig,
}

impl<'a> GenerationContext<'a> {
    pub fn new(
        catalog: &'a dyn Catalog,
        namer: &'a dyn ArmyNamer,
        config: &'a GenerationConfig,
    ) -> Self {
        Self {
            catalog,
            namer,
            config,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn class_counts_track_units() {
        let mut team = TeamComposition::new(2, "Test");
        team.add_unit(UnitStartingData::new(9, "Knight", "Militia", 1.0));
        team.add_unit(UnitStartingData::new(2, "Archer", "Hunter", 0.7));
        team.add_unit(UnitStartingData::new(2, "Knight", "Corvin", 1.0));

        assert_eq!(team.total_units(), 3);
        let knights = team.class_count("Knight").unwrap();
        assert_eq!(knights.count, 2);
        assert_eq!(knights.unit_data.len(), 2);
        assert!(team.units().all(|u| u.team_id == 2));
        assert!((team.total_power() - (1.0 + 0.49 + 1.0)).abs() < 1e-5);
    }

    #[test]
    fn placed_at_keeps_identity() {
        let unit = UnitStartingData::new(1, "Archer", "Brenna", 1.5);
        let placed = unit.clone().placed_at(Vec2::new(3.0, -1.0));
        assert_eq!(placed.position, Vec2::new(3.0, -1.0));
        assert_eq!(placed.display_name, unit.display_name);
        assert_eq!(placed.scale, 1.5);
    }
}
