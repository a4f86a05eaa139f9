use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::{
    catalog::InMemoryCatalog,
    composition::{TeamId, Theme},
    config::GenerationConfig,
    engine::GeneratorSettings,
    error::{GenerationError, Result},
    formation::{MapBounds, SurroundLayout},
};

fn default_seed() -> u64 {
    42
}

fn default_min_distance() -> f32 {
    1.26
}

fn default_separation() -> bool {
    true
}

fn default_units_per_player() -> usize {
    4
}

/// A battle described in a setup file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleSetup {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_seed")]
    pub seed: u64,
    pub map: MapBounds,
    #[serde(default = "default_min_distance")]
    pub min_distance: f32,
    #[serde(default)]
    pub mode: BattleMode,
    #[serde(default)]
    pub teams: Vec<TeamSetup>,
    #[serde(default)]
    pub catalog: InMemoryCatalog,
    #[serde(default)]
    pub tuning: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BattleMode {
    /// Two armies on opposite halves of the map.
    TwoTeam {
        #[serde(default = "default_separation")]
        separation: bool,
    },
    /// Every team in its own cell of a grid.
    MultiTeam,
    /// One team holds a capture point with its boss standing on it.
    Seize {
        #[serde(default)]
        capture_point: Option<[f32; 2]>,
        /// Defaults to the first team.
        #[serde(default)]
        holder: Option<TeamId>,
    },
    /// One team in the middle, everyone else surrounding it.
    Survive {
        /// Picked at random when absent.
        #[serde(default)]
        layout: Option<SurroundLayout>,
        /// Defaults to the first team.
        #[serde(default)]
        survivor: Option<TeamId>,
    },
    /// Teams are derived from a player count rather than listed.
    TeamBattle {
        total_players: u32,
        winners: u32,
        #[serde(default = "default_units_per_player")]
        units_per_player: usize,
    },
}

impl Default for BattleMode {
    fn default() -> Self {
        BattleMode::TwoTeam {
            separation: default_separation(),
        }
    }
}

impl BattleMode {
    pub fn name(&self) -> &'static str {
        match self {
            BattleMode::TwoTeam { .. } => "two_team",
            BattleMode::MultiTeam => "multi_team",
            BattleMode::Seize { .. } => "seize",
            BattleMode::Survive { .. } => "survive",
            BattleMode::TeamBattle { .. } => "team_battle",
        }
    }
}

/// One team entry. Player teams give a `unit_count`, enemy teams a
/// `relative_strength` against the combined player unit count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSetup {
    pub id: TeamId,
    #[serde(default)]
    pub unit_count: Option<usize>,
    #[serde(default)]
    pub relative_strength: Option<f32>,
    /// Drawn from the theme weights when absent.
    #[serde(default)]
    pub theme: Option<Theme>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TeamRole {
    Player { unit_count: usize },
    Enemy { relative_strength: f32 },
}

impl TeamSetup {
    pub fn player(id: TeamId, unit_count: usize) -> Self {
        Self {
            id,
            unit_count: Some(unit_count),
            relative_strength: None,
            theme: None,
        }
    }

    pub fn enemy(id: TeamId, relative_strength: f32) -> Self {
        Self {
            id,
            unit_count: None,
            relative_strength: Some(relative_strength),
            theme: None,
        }
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn role(&self) -> Result<TeamRole> {
        match (self.unit_count, self.relative_strength) {
            (Some(unit_count), None) => Ok(TeamRole::Player { unit_count }),
            (None, Some(strength)) if strength.is_finite() && strength >= 0.0 => {
                Ok(TeamRole::Enemy {
                    relative_strength: strength,
                })
            }
            (None, Some(strength)) => Err(GenerationError::InvalidSetup(format!(
                "team {} has invalid relative_strength {strength}",
                self.id
            ))),
            _ => Err(GenerationError::InvalidSetup(format!(
                "team {} needs exactly one of unit_count or relative_strength",
                self.id
            ))),
        }
    }
}

impl BattleSetup {
    pub fn validate(&self) -> Result<()> {
        GeneratorSettings::from_setup(self).validate()
    }
}

pub struct SetupLoader {
    base_dir: PathBuf,
}

impl SetupLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> anyhow::Result<BattleSetup> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read battle setup {}", path.display()))?;
        let setup: BattleSetup = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        setup
            .validate()
            .with_context(|| format!("Invalid battle setup {}", path.display()))?;
        Ok(setup)
    }
}
