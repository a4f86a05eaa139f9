use rand::{seq::SliceRandom, Rng};
use tracing::{debug, warn};

use super::{
    roster::pick_class,
    theme::{Theme, ThemeResolution},
    GenerationContext, TeamComposition, TeamId, UnitStartingData,
};
use crate::{
    catalog::{CharacterFilter, CharacterRecord},
    power::power,
    rng::RngExt,
};

pub const BOSS_SCALE: f32 = 1.5;
pub const ESCALATED_BOSS_SCALE: f32 = 2.0;
pub const RARE_BOSS_SCALE: f32 = 2.5;
pub const MINIBOSS_SCALE: f32 = 1.2;
pub const ELITE_SCALE: f32 = 1.5;
pub const TROOP_SCALE: f32 = 0.7;
pub const STRONG_TROOP_SCALE: f32 = 1.0;

const MINIBOSS_COHORT_MAX: usize = 4;
const LARGE_COHORT_MAX: usize = 10;
const MINIBOSS_BLOCK_MIN: usize = 2;
const MINIBOSS_BLOCK_MAX: usize = 3;
const TROOP_CLASSES_MIN: usize = 2;
const TROOP_CLASSES_MAX: usize = 10;

/// Builds an enemy roster whose total power reaches
/// `player_count * relative_strength`.
///
/// There is always exactly one boss. Minibosses and troops are only added
/// while the running power is below the target.
pub fn generate_enemy<R: Rng>(
    team_id: TeamId,
    player_count: usize,
    relative_strength: f32,
    theme: &Theme,
    ctx: &GenerationContext<'_>,
    rng: &mut R,
) -> TeamComposition {
    // Accumulated in f64: f32 stops growing by a troop's power near 2^24.
    let target = player_count as f64 * f64::from(relative_strength);
    let target = if target.is_finite() { target.max(0.0) } else { 0.0 };

    let resolution = match ThemeResolution::resolve(theme, ctx.catalog, rng) {
        Some(resolution) => Some(resolution),
        None => {
            warn!(team_id, ?theme, "theme unsupported by catalog, using random enemies");
            ThemeResolution::resolve(&Theme::Random, ctx.catalog, rng)
        }
    };
    let key = resolution
        .as_ref()
        .map(|r| r.key.clone())
        .unwrap_or_else(|| ctx.config.fallback_class.clone());
    let mut builder = EnemyBuilder {
        team: TeamComposition::new(team_id, ctx.namer.army_name(&key, rng)),
        cumulative: 0.0,
        resolution: resolution.as_ref(),
        ctx,
    };

    let matching: Vec<&CharacterRecord> = match &resolution {
        Some(r) => r.characters.clone(),
        None => ctx.catalog.characters(),
    };
    let mut boss_pool: Vec<&CharacterRecord> =
        matching.iter().copied().filter(|c| c.unique).collect();
    boss_pool.shuffle(rng);

    // Boss
    let mut boss = boss_pool.pop();
    if boss.is_none() {
        boss = matching.choose(rng).copied();
    }
    if boss.is_none() {
        boss = ctx.catalog.random_character(rng, CharacterFilter::default());
    }
    let mut boss_scale = BOSS_SCALE;
    if rng.random_bool(ctx.config.boss_escalation_chance) {
        boss_scale = ESCALATED_BOSS_SCALE;
        if rng.random_bool(ctx.config.rare_boss_chance) {
            boss_scale = RARE_BOSS_SCALE;
        }
    }
    builder.add_character(boss, boss_scale, rng);
    debug!(team_id, scale = boss_scale, target, "generated boss");

    if builder.cumulative >= target {
        return builder.team;
    }

    // Minibosses
    if !rng.random_bool(ctx.config.single_boss_chance) {
        let cohort_max = if rng.random_bool(ctx.config.large_group_chance) {
            LARGE_COHORT_MAX
        } else {
            MINIBOSS_COHORT_MAX
        };
        let cohort = rng.gen_range(1..=cohort_max);
        for _ in 0..cohort {
            if builder.cumulative >= target {
                break;
            }
            let scale = if rng.random_bool(ctx.config.elite_miniboss_chance) {
                ELITE_SCALE
            } else {
                MINIBOSS_SCALE
            };
            if let Some(unique) = boss_pool.pop() {
                builder.add_character(Some(unique), scale, rng);
                continue;
            }
            let generics: Vec<&CharacterRecord> =
                matching.iter().copied().filter(|c| !c.unique).collect();
            let mut generic = generics.choose(rng).copied();
            if generic.is_none() {
                generic = ctx.catalog.random_character(rng, CharacterFilter::generic());
            }
            let Some(generic) = generic else {
                debug!(team_id, "miniboss candidates exhausted");
                break;
            };
            if rng.random_bool(ctx.config.miniboss_block_chance) {
                let block = rng.gen_range(MINIBOSS_BLOCK_MIN..=MINIBOSS_BLOCK_MAX);
                let class_name = builder.class_for(Some(generic), rng);
                for _ in 0..block {
                    builder.add(class_name.clone(), generic.name.clone(), scale);
                }
            } else {
                builder.add_character(Some(generic), scale, rng);
            }
        }
    }

    // Troops
    let mut candidates: Vec<String> = match &resolution {
        Some(r) => r.classes.iter().map(|c| c.name.clone()).collect(),
        None => ctx.catalog.classes().iter().map(|c| c.name.clone()).collect(),
    };
    candidates.shuffle(rng);
    if candidates.len() > TROOP_CLASSES_MIN {
        let cap = rng.gen_range(TROOP_CLASSES_MIN..=TROOP_CLASSES_MAX);
        candidates.truncate(cap);
    }
    if candidates.is_empty() {
        candidates.push(ctx.config.fallback_class.clone());
    }

    let mut troops = 0usize;
    while builder.cumulative < target {
        let class_name = candidates
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| ctx.config.fallback_class.clone());
        let scale = if rng.random_bool(ctx.config.strong_enemy_chance) {
            STRONG_TROOP_SCALE
        } else {
            TROOP_SCALE
        };
        let display_name = matching
            .iter()
            .find(|c| !c.unique && c.default_class == class_name)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| class_name.clone());
        builder.add(class_name, display_name, scale);
        troops += 1;
    }

    debug!(
        team_id,
        troops,
        units = builder.team.total_units(),
        power = builder.cumulative,
        target,
        "generated enemy roster"
    );
    builder.team
}

struct EnemyBuilder<'r, 'a> {
    team: TeamComposition,
    cumulative: f64,
    resolution: Option<&'r ThemeResolution<'a>>,
    ctx: &'r GenerationContext<'a>,
}

impl<'r, 'a> EnemyBuilder<'r, 'a> {
    fn add(&mut self, class_name: String, display_name: String, scale: f32) {
        self.cumulative += f64::from(power(scale));
        self.team.add_unit(UnitStartingData::new(
            self.team.team_id,
            class_name,
            display_name,
            scale,
        ));
    }

    fn add_character<R: Rng>(
        &mut self,
        character: Option<&CharacterRecord>,
        scale: f32,
        rng: &mut R,
    ) {
        let class_name = self.class_for(character, rng);
        let display_name = character
            .map(|c| c.name.clone())
            .unwrap_or_else(|| class_name.clone());
        self.add(class_name, display_name, scale);
    }

    fn class_for<R: Rng>(&self, character: Option<&CharacterRecord>, rng: &mut R) -> String {
        match self.resolution {
            Some(resolution) => pick_class(resolution, character, self.ctx, rng).name.clone(),
            None => character
                .and_then(|c| self.ctx.catalog.class_by_name(&c.default_class))
                .map(|c| c.name.clone())
                .unwrap_or_else(|| self.ctx.config.fallback_class.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{tests::sample_catalog, InMemoryCatalog},
        config::GenerationConfig,
        naming::AlliterativeNamer,
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn reaches_power_target_with_boss() {
        let catalog = sample_catalog();
        let namer = AlliterativeNamer::default();
        let config = GenerationConfig::default();
        let ctx = GenerationContext::new(&catalog, &namer, &config);

        for seed in 0..30 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let team = generate_enemy(1, 10, 1.0, &Theme::Random, &ctx, &mut rng);
            assert!(team.total_power() >= 10.0, "seed {seed}: {}", team.total_power());
            assert!(team.units().any(|u| u.scale >= BOSS_SCALE));
        }
    }

    #[test]
    fn exactly_one_boss_scale_unit_first() {
        let catalog = sample_catalog();
        let namer = AlliterativeNamer::default();
        let config = GenerationConfig {
            single_boss_chance: 1.0,
            ..GenerationConfig::default()
        };
        let ctx = GenerationContext::new(&catalog, &namer, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(12);

        let team = generate_enemy(1, 20, 1.0, &Theme::Random, &ctx, &mut rng);
        let bosses = team.units().filter(|u| u.scale >= BOSS_SCALE).count();
        assert_eq!(bosses, 1);
        assert!(team
            .units()
            .filter(|u| u.scale < BOSS_SCALE)
            .all(|u| u.scale == TROOP_SCALE || u.scale == STRONG_TROOP_SCALE));
    }

    #[test]
    fn boss_alone_can_meet_target() {
        let catalog = sample_catalog();
        let namer = AlliterativeNamer::default();
        let config = GenerationConfig::default();
        let ctx = GenerationContext::new(&catalog, &namer, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let team = generate_enemy(1, 2, 1.0, &Theme::Random, &ctx, &mut rng);
        assert_eq!(team.total_units(), 1);
    }

    #[test]
    fn empty_catalog_still_converges() {
        let catalog = InMemoryCatalog::default();
        let namer = AlliterativeNamer::default();
        let config = GenerationConfig::default();
        let ctx = GenerationContext::new(&catalog, &namer, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let team = generate_enemy(2, 15, 1.5, &Theme::SameClass, &ctx, &mut rng);
        assert!(team.total_power() >= 22.5);
        assert!(team.units().all(|u| u.class_name == "Knight"));
        assert!(team.units().all(|u| u.team_id == 2));
    }

    #[test]
    fn troop_count_is_bounded_by_target() {
        let catalog = sample_catalog();
        let namer = AlliterativeNamer::default();
        let config = GenerationConfig::default();
        let ctx = GenerationContext::new(&catalog, &namer, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(77);

        let target = 100.0_f32;
        let team = generate_enemy(1, 100, 1.0, &Theme::Random, &ctx, &mut rng);
        let upper = (target / power(TROOP_SCALE)).ceil() as usize + LARGE_COHORT_MAX * 3 + 1;
        assert!(team.total_units() <= upper);
        assert!(team.total_power() >= target);
    }

    fn names_of(team: &TeamComposition, scale: f32) -> Vec<(String, String)> {
        team.units()
            .filter(|u| u.scale == scale)
            .map(|u| (u.display_name.clone(), u.class_name.clone()))
            .collect()
    }

    #[test]
    fn unique_minibosses_are_never_repeated() {
        let catalog = sample_catalog();
        let namer = AlliterativeNamer::default();
        let config = GenerationConfig {
            single_boss_chance: 0.0,
            large_group_chance: 1.0,
            ..GenerationConfig::default()
        };
        let ctx = GenerationContext::new(&catalog, &namer, &config);

        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let team = generate_enemy(1, 200, 1.0, &Theme::Random, &ctx, &mut rng);
            for unique in ["Aldric", "Brenna", "Corvin"] {
                let seen = team.units().filter(|u| u.display_name == unique).count();
                assert!(seen <= 1, "seed {seed}: {unique} x{seen}");
            }
        }
    }

    #[test]
    fn generic_minibosses_come_in_blocks() {
        let catalog = sample_catalog();
        let namer = AlliterativeNamer::default();
        let config = GenerationConfig {
            single_boss_chance: 0.0,
            large_group_chance: 1.0,
            elite_miniboss_chance: 0.0,
            miniboss_block_chance: 1.0,
            ..GenerationConfig::default()
        };
        let ctx = GenerationContext::new(&catalog, &namer, &config);

        let mut blocks_seen = 0;
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let team = generate_enemy(1, 200, 1.0, &Theme::Random, &ctx, &mut rng);
            let generics: Vec<_> = names_of(&team, MINIBOSS_SCALE)
                .into_iter()
                .filter(|(name, _)| name == "Militia" || name == "Hunter")
                .collect();
            for member in &generics {
                let same = generics.iter().filter(|other| **other == *member).count();
                assert!(same >= MINIBOSS_BLOCK_MIN, "seed {seed}: lone {member:?}");
            }
            blocks_seen += generics.len();
        }
        assert!(blocks_seen > 0);
    }

    #[test]
    fn large_groups_exceed_the_small_cohort() {
        let catalog = sample_catalog();
        let namer = AlliterativeNamer::default();
        let small = GenerationConfig {
            single_boss_chance: 0.0,
            large_group_chance: 0.0,
            elite_miniboss_chance: 0.0,
            miniboss_block_chance: 0.0,
            ..GenerationConfig::default()
        };
        let large = GenerationConfig {
            large_group_chance: 1.0,
            ..small.clone()
        };

        let cohort = |config: &GenerationConfig, seed: u64| {
            let ctx = GenerationContext::new(&catalog, &namer, config);
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let team = generate_enemy(1, 200, 1.0, &Theme::Random, &ctx, &mut rng);
            names_of(&team, MINIBOSS_SCALE).len()
        };
        assert!((0..20).all(|seed| cohort(&small, seed) <= MINIBOSS_COHORT_MAX));
        assert!((0..20).any(|seed| cohort(&large, seed) > MINIBOSS_COHORT_MAX));
    }

    #[test]
    fn power_keeps_growing_past_f32_precision() {
        let catalog = sample_catalog();
        let namer = AlliterativeNamer::default();
        let config = GenerationConfig::default();
        let ctx = GenerationContext::new(&catalog, &namer, &config);
        let mut builder = EnemyBuilder {
            team: TeamComposition::new(1, "Test"),
            cumulative: 16_777_216.0,
            resolution: None,
            ctx: &ctx,
        };
        builder.add("Knight".into(), "Militia".into(), TROOP_SCALE);
        assert!(builder.cumulative > 16_777_216.0);
    }

    #[test]
    fn nonsense_strength_yields_only_the_boss() {
        let catalog = sample_catalog();
        let namer = AlliterativeNamer::default();
        let config = GenerationConfig::default();
        let ctx = GenerationContext::new(&catalog, &namer, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let team = generate_enemy(1, 10, f32::NAN, &Theme::Random, &ctx, &mut rng);
        assert_eq!(team.total_units(), 1);
    }
}
