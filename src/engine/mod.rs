//! The generation pipeline: themes, rosters, then positions.

mod placement;

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, info};

use crate::{
    catalog::{Catalog, InMemoryCatalog},
    composition::{
        generate_enemy, generate_roster, select_theme, GenerationContext, TeamComposition, TeamId,
        Theme, UnitStartingData, BOSS_SCALE,
    },
    config::GenerationConfig,
    error::{GenerationError, Result},
    formation::MapBounds,
    naming::{AlliterativeNamer, ArmyNamer},
    rng::RngManager,
    setup::{BattleMode, BattleSetup, TeamRole, TeamSetup},
    teams::{plan_team_battle, TeamBattlePlan},
};

pub struct GeneratorSettings {
    pub name: String,
    pub seed: u64,
    pub map: MapBounds,
    pub min_distance: f32,
    pub mode: BattleMode,
    pub teams: Vec<TeamSetup>,
}

impl GeneratorSettings {
    pub fn from_setup(setup: &BattleSetup) -> Self {
        Self {
            name: setup.name.clone(),
            seed: setup.seed,
            map: setup.map,
            min_distance: setup.min_distance,
            mode: setup.mode.clone(),
            teams: setup.teams.clone(),
        }
    }

    /// Rejects settings that would leave a team without room or units
    /// without a team: bad bounds or spacing, malformed or repeated team
    /// entries, a team count the mode cannot place, or a holder or survivor
    /// id that is not listed.
    pub fn validate(&self) -> Result<()> {
        self.map.validate()?;
        if !(self.min_distance.is_finite() && self.min_distance > 0.0) {
            return Err(GenerationError::InvalidSetup(format!(
                "min_distance must be positive, got {}",
                self.min_distance
            )));
        }

        let mut ids = BTreeSet::new();
        for team in &self.teams {
            team.role()?;
            if !ids.insert(team.id) {
                return Err(GenerationError::InvalidSetup(format!(
                    "team id {} is listed twice",
                    team.id
                )));
            }
        }

        let teams = self.teams.len();
        let fits = match &self.mode {
            BattleMode::TwoTeam { .. } | BattleMode::Seize { .. } => teams == 2,
            BattleMode::MultiTeam | BattleMode::Survive { .. } => teams >= 2,
            BattleMode::TeamBattle { .. } => true,
        };
        if !fits {
            return Err(GenerationError::InvalidSetup(format!(
                "{} mode cannot run with {teams} teams",
                self.mode.name()
            )));
        }

        let referenced = match &self.mode {
            BattleMode::Seize { holder, .. } => *holder,
            BattleMode::Survive { survivor, .. } => *survivor,
            _ => None,
        };
        if let Some(id) = referenced {
            if !ids.contains(&id) {
                return Err(GenerationError::InvalidSetup(format!(
                    "{} mode refers to unknown team {id}",
                    self.mode.name()
                )));
            }
        }
        Ok(())
    }
}

pub struct GeneratorBuilder {
    settings: GeneratorSettings,
    catalog: Box<dyn Catalog>,
    namer: Option<Box<dyn ArmyNamer>>,
    config: GenerationConfig,
}

impl GeneratorBuilder {
    pub fn new(settings: GeneratorSettings) -> Self {
        Self {
            settings,
            catalog: Box::new(InMemoryCatalog::default()),
            namer: None,
            config: GenerationConfig::default(),
        }
    }

    /// Settings, catalog and tuning all taken from a loaded setup.
    pub fn from_setup(setup: BattleSetup) -> Self {
        let settings = GeneratorSettings::from_setup(&setup);
        Self::new(settings)
            .with_catalog(setup.catalog)
            .with_config(setup.tuning)
    }

    pub fn with_catalog(mut self, catalog: impl Catalog + 'static) -> Self {
        self.catalog = Box::new(catalog);
        self
    }

    pub fn with_namer(mut self, namer: impl ArmyNamer + 'static) -> Self {
        self.namer = Some(Box::new(namer));
        self
    }

    pub fn with_config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.settings.seed = seed;
        self
    }

    pub fn build(self) -> BattleGenerator {
        let namer = self
            .namer
            .unwrap_or_else(|| Box::new(AlliterativeNamer::new(self.config.alliteration_chance)));
        BattleGenerator {
            rng: RngManager::new(self.settings.seed),
            catalog: self.catalog,
            namer,
            config: self.config,
            settings: self.settings,
        }
    }
}

pub struct BattleGenerator {
    rng: RngManager,
    catalog: Box<dyn Catalog>,
    namer: Box<dyn ArmyNamer>,
    config: GenerationConfig,
    settings: GeneratorSettings,
}

/// A team to compose, in setup order.
struct TeamPlan {
    id: TeamId,
    role: TeamRole,
    theme: Option<Theme>,
}

impl BattleGenerator {
    /// Runs the whole pipeline once. Player rosters are built first so enemy
    /// power targets can be derived from the player unit count.
    pub fn generate(&mut self) -> Result<BattleRoster> {
        self.settings.validate()?;
        let (plans, team_battle) = self.team_plans()?;

        let ctx = GenerationContext::new(self.catalog.as_ref(), self.namer.as_ref(), &self.config);
        let mut composed: Vec<Option<TeamComposition>> = vec![None; plans.len()];

        let mut player_count = 0usize;
        for (slot, plan) in plans.iter().enumerate() {
            let TeamRole::Player { unit_count } = plan.role else {
                continue;
            };
            let mut rng = self.rng.stream(&format!("team-{}", plan.id));
            let theme = match &plan.theme {
                Some(theme) => theme.clone(),
                None => select_theme(ctx.catalog, &ctx.config.theme_weights, &mut rng),
            };
            let team = generate_roster(plan.id, unit_count, &theme, &ctx, &mut rng);
            player_count += team.total_units();
            composed[slot] = Some(team);
        }

        for (slot, plan) in plans.iter().enumerate() {
            let TeamRole::Enemy { relative_strength } = plan.role else {
                continue;
            };
            let mut rng = self.rng.stream(&format!("team-{}", plan.id));
            let theme = match &plan.theme {
                Some(theme) => theme.clone(),
                None => select_theme(ctx.catalog, &ctx.config.theme_weights, &mut rng),
            };
            let team = generate_enemy(plan.id, player_count, relative_strength, &theme, &ctx, &mut rng);
            composed[slot] = Some(team);
        }

        let teams: Vec<TeamComposition> = composed.into_iter().flatten().collect();
        debug!(teams = teams.len(), player_count, "rosters composed");

        let mut rng = self.rng.stream("placement");
        let units = placement::place_units(
            &self.settings.mode,
            &teams,
            &self.settings.map,
            self.settings.min_distance,
            ctx.catalog,
            ctx.config,
            &mut rng,
        )?;

        let roster = BattleRoster::assemble(&self.settings, teams, units, team_battle);
        info!(
            name = %roster.name,
            mode = self.settings.mode.name(),
            teams = roster.teams.len(),
            units = roster.units.len(),
            "battle generated"
        );
        Ok(roster)
    }

    fn team_plans(&self) -> Result<(Vec<TeamPlan>, Option<TeamBattlePlan>)> {
        if let BattleMode::TeamBattle {
            total_players,
            winners,
            units_per_player,
        } = self.settings.mode
        {
            let plan = plan_team_battle(total_players, winners)?;
            let unit_count = plan.team_size as usize * units_per_player;
            let teams = (0..plan.team_count)
                .map(|id| TeamPlan {
                    id,
                    role: TeamRole::Player { unit_count },
                    theme: None,
                })
                .collect();
            return Ok((teams, Some(plan)));
        }

        let teams = self
            .settings
            .teams
            .iter()
            .map(|team| {
                Ok(TeamPlan {
                    id: team.id,
                    role: team.role()?,
                    theme: team.theme.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok((teams, None))
    }
}

/// Final output: positioned units plus per-team rosters.
#[derive(Debug, Clone, Serialize)]
pub struct BattleRoster {
    pub name: String,
    pub seed: u64,
    pub mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_battle: Option<TeamBattlePlan>,
    pub teams: Vec<TeamComposition>,
    pub units: Vec<UnitStartingData>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RosterSummary {
    pub team_id: TeamId,
    pub army_name: String,
    pub units: usize,
    pub power: f32,
    pub bosses: usize,
}

impl BattleRoster {
    /// Rebuilds each team's class counts from the placed units so rosters and
    /// the flat unit list agree on positions.
    fn assemble(
        settings: &GeneratorSettings,
        composed: Vec<TeamComposition>,
        units: Vec<UnitStartingData>,
        team_battle: Option<TeamBattlePlan>,
    ) -> Self {
        let teams = composed
            .into_iter()
            .map(|team| {
                let mut placed = TeamComposition::new(team.team_id, team.army_name);
                for unit in units.iter().filter(|u| u.team_id == team.team_id) {
                    placed.add_unit(unit.clone());
                }
                placed
            })
            .collect();
        Self {
            name: settings.name.clone(),
            seed: settings.seed,
            mode: settings.mode.name(),
            team_battle,
            teams,
            units,
        }
    }

    pub fn team(&self, team_id: TeamId) -> Option<&TeamComposition> {
        self.teams.iter().find(|t| t.team_id == team_id)
    }

    pub fn summary(&self) -> Vec<RosterSummary> {
        self.teams
            .iter()
            .map(|team| RosterSummary {
                team_id: team.team_id,
                army_name: team.army_name.clone(),
                units: team.total_units(),
                power: team.total_power(),
                bosses: team.units().filter(|u| u.scale >= BOSS_SCALE).count(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{catalog::tests::sample_catalog, formation::is_well_separated};

    fn settings(mode: BattleMode, teams: Vec<TeamSetup>) -> GeneratorSettings {
        GeneratorSettings {
            name: "test".into(),
            seed: 7,
            map: MapBounds::new(40.0, 25.0).unwrap(),
            min_distance: 1.26,
            mode,
            teams,
        }
    }

    #[test]
    fn player_and_enemy_rosters_are_generated_and_placed() {
        let mut generator = GeneratorBuilder::new(settings(
            BattleMode::default(),
            vec![TeamSetup::player(0, 12), TeamSetup::enemy(1, 1.0)],
        ))
        .with_catalog(sample_catalog())
        .build();

        let roster = generator.generate().unwrap();
        let players = roster.team(0).unwrap();
        let enemies = roster.team(1).unwrap();
        assert_eq!(players.total_units(), 12);
        assert!(enemies.total_power() >= 12.0);
        assert_eq!(
            roster.units.len(),
            players.total_units() + enemies.total_units()
        );
        let points: Vec<_> = roster.units.iter().map(|u| u.position).collect();
        assert!(is_well_separated(&points, 1.26));

        let summary = roster.summary();
        assert!(summary[1].bosses >= 1);
    }

    #[test]
    fn same_seed_same_battle() {
        let build = |seed: u64| {
            GeneratorBuilder::new(settings(
                BattleMode::MultiTeam,
                vec![
                    TeamSetup::player(0, 6),
                    TeamSetup::player(1, 6),
                    TeamSetup::enemy(2, 0.8),
                ],
            ))
            .with_catalog(sample_catalog())
            .with_seed(seed)
            .build()
        };
        let a = build(7).generate().unwrap();
        let b = build(7).generate().unwrap();
        assert_eq!(a.units, b.units);
        let c = build(8).generate().unwrap();
        assert_ne!(a.units, c.units);
    }

    #[test]
    fn team_battle_builds_planned_teams() {
        let mut generator = GeneratorBuilder::new(settings(
            BattleMode::TeamBattle {
                total_players: 8,
                winners: 2,
                units_per_player: 3,
            },
            Vec::new(),
        ))
        .with_catalog(sample_catalog())
        .build();
        let roster = generator.generate().unwrap();
        assert_eq!(roster.teams.len(), 4);
        assert!(roster.teams.iter().all(|t| t.total_units() == 6));
        assert_eq!(roster.team_battle.unwrap().winning_teams, 1);
    }

    #[test]
    fn extra_team_in_two_team_mode_is_rejected() {
        let mut generator = GeneratorBuilder::new(settings(
            BattleMode::default(),
            vec![
                TeamSetup::player(0, 5),
                TeamSetup::player(1, 5),
                TeamSetup::player(2, 7),
            ],
        ))
        .with_catalog(sample_catalog())
        .build();
        assert!(matches!(
            generator.generate(),
            Err(GenerationError::InvalidSetup(_))
        ));
    }

    #[test]
    fn builder_settings_are_validated() {
        let mut bad_spacing = settings(
            BattleMode::MultiTeam,
            vec![TeamSetup::player(0, 4), TeamSetup::player(1, 4)],
        );
        bad_spacing.min_distance = 0.0;
        assert!(GeneratorBuilder::new(bad_spacing).build().generate().is_err());

        let unknown_holder = settings(
            BattleMode::Seize {
                capture_point: None,
                holder: Some(5),
            },
            vec![TeamSetup::player(0, 4), TeamSetup::enemy(1, 1.0)],
        );
        assert!(unknown_holder.validate().is_err());
    }

    #[test]
    fn impossible_team_battle_is_reported() {
        let mut generator = GeneratorBuilder::new(settings(
            BattleMode::TeamBattle {
                total_players: 7,
                winners: 2,
                units_per_player: 3,
            },
            Vec::new(),
        ))
        .build();
        assert!(generator.generate().is_err());
    }
}
