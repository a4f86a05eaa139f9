use rand::{seq::SliceRandom, Rng};
use tracing::{debug, warn};

use super::{
    theme::{ClassPolicy, Theme, ThemeResolution},
    GenerationContext, TeamComposition, TeamId, UnitStartingData,
};
use crate::{
    catalog::{CharacterRecord, ClassRecord},
    power::BASELINE_SCALE,
    rng::RngExt,
};

/// Builds a fixed-size roster for a player or allied team.
///
/// Falls back from the requested theme to a fully random roster and finally
/// to a single-class roster, so any `unit_count > 0` yields that many units.
pub fn generate_roster<R: Rng>(
    team_id: TeamId,
    unit_count: usize,
    theme: &Theme,
    ctx: &GenerationContext<'_>,
    rng: &mut R,
) -> TeamComposition {
    if unit_count == 0 {
        return TeamComposition::new(team_id, String::new());
    }

    if let Some(resolution) = ThemeResolution::resolve(theme, ctx.catalog, rng) {
        let team = build_roster(team_id, unit_count, &resolution, ctx, rng);
        debug!(team_id, units = team.total_units(), ?theme, "generated themed roster");
        return team;
    }

    if *theme != Theme::Random {
        warn!(team_id, ?theme, "theme unsupported by catalog, using random roster");
        if let Some(resolution) = ThemeResolution::resolve(&Theme::Random, ctx.catalog, rng) {
            return build_roster(team_id, unit_count, &resolution, ctx, rng);
        }
    }

    warn!(
        team_id,
        class = %ctx.config.fallback_class,
        "catalog has no classes, using default roster"
    );
    generate_default(team_id, unit_count, ctx, rng)
}

/// Single-class roster used when the catalog cannot supply anything.
pub fn generate_default<R: Rng>(
    team_id: TeamId,
    unit_count: usize,
    ctx: &GenerationContext<'_>,
    rng: &mut R,
) -> TeamComposition {
    let class_name = &ctx.config.fallback_class;
    let mut team = TeamComposition::new(team_id, ctx.namer.army_name(class_name, rng));
    for _ in 0..unit_count {
        team.add_unit(UnitStartingData::new(
            team_id,
            class_name.clone(),
            class_name.clone(),
            BASELINE_SCALE,
        ));
    }
    team
}

fn build_roster<R: Rng>(
    team_id: TeamId,
    unit_count: usize,
    resolution: &ThemeResolution<'_>,
    ctx: &GenerationContext<'_>,
    rng: &mut R,
) -> TeamComposition {
    let mut team = TeamComposition::new(team_id, ctx.namer.army_name(&resolution.key, rng));
    let allow_repeats = resolution.policy == ClassPolicy::CharacterDefault;
    let mut used_uniques: Vec<&str> = Vec::new();

    for _ in 0..unit_count {
        let pool: Vec<&CharacterRecord> = resolution
            .characters
            .iter()
            .copied()
            .filter(|c| allow_repeats || !c.unique || !used_uniques.contains(&c.name.as_str()))
            .collect();
        let character = pick_character(&pool, ctx.config.unique_character_probability, rng);
        if let Some(character) = character {
            if character.unique && !allow_repeats {
                used_uniques.push(character.name.as_str());
            }
        }

        let class = pick_class(resolution, character, ctx, rng);
        let display_name = character
            .map(|c| c.name.clone())
            .unwrap_or_else(|| class.name.clone());
        team.add_unit(UnitStartingData::new(
            team_id,
            class.name.clone(),
            display_name,
            BASELINE_SCALE,
        ));
    }
    team
}

/// Draws from the unique characters of `pool` with probability
/// `unique_probability`, otherwise (or when there are none) from all of it.
pub(super) fn pick_character<'a, R: Rng>(
    pool: &[&'a CharacterRecord],
    unique_probability: f32,
    rng: &mut R,
) -> Option<&'a CharacterRecord> {
    if rng.random_bool(unique_probability) {
        let uniques: Vec<&CharacterRecord> = pool.iter().copied().filter(|c| c.unique).collect();
        if let Some(character) = uniques.choose(rng) {
            return Some(*character);
        }
    }
    pool.choose(rng).copied()
}

/// Resolutions always hold at least one class, so this cannot come up empty.
pub(super) fn pick_class<'a, R: Rng>(
    resolution: &ThemeResolution<'a>,
    character: Option<&CharacterRecord>,
    ctx: &GenerationContext<'a>,
    rng: &mut R,
) -> &'a ClassRecord {
    let first = resolution.classes[0];
    match resolution.policy {
        ClassPolicy::Fixed => first,
        ClassPolicy::CharacterDefault => character
            .and_then(|c| ctx.catalog.class_by_name(&c.default_class))
            .unwrap_or(first),
        ClassPolicy::Themed => {
            if let Some(character) = character {
                if rng.random_bool(ctx.config.default_class_probability) {
                    if let Some(class) = ctx.catalog.class_by_name(&character.default_class) {
                        return class;
                    }
                }
            }
            resolution.classes.choose(rng).copied().unwrap_or(first)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{
            tests::{character, class, sample_catalog},
            InMemoryCatalog,
        },
        config::GenerationConfig,
        naming::AlliterativeNamer,
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn context<'a>(
        catalog: &'a InMemoryCatalog,
        namer: &'a AlliterativeNamer,
        config: &'a GenerationConfig,
    ) -> GenerationContext<'a> {
        GenerationContext::new(catalog, namer, config)
    }

    #[test]
    fn same_class_with_one_class_yields_single_entry() {
        let catalog = InMemoryCatalog::new(
            vec![character("Militia", false, "Archer"), character("Corvin", true, "Archer")],
            vec![class("Knight", false)],
        );
        let namer = AlliterativeNamer::default();
        let config = GenerationConfig::default();
        let ctx = context(&catalog, &namer, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let team = generate_roster(1, 10, &Theme::SameClass, &ctx, &mut rng);
        assert_eq!(team.class_counts.len(), 1);
        assert_eq!(team.class_counts[0].class_name, "Knight");
        assert_eq!(team.class_counts[0].count, 10);
    }

    #[test]
    fn unique_characters_are_not_repeated() {
        let catalog = sample_catalog();
        let namer = AlliterativeNamer::default();
        let config = GenerationConfig {
            unique_character_probability: 1.0,
            ..GenerationConfig::default()
        };
        let ctx = context(&catalog, &namer, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(8);

        let team = generate_roster(0, 8, &Theme::Random, &ctx, &mut rng);
        assert_eq!(team.total_units(), 8);
        for unique in ["Aldric", "Brenna", "Corvin"] {
            let seen = team.units().filter(|u| u.display_name == unique).count();
            assert!(seen <= 1, "{unique} appeared {seen} times");
        }
    }

    #[test]
    fn same_character_repeats_that_character() {
        let catalog = sample_catalog();
        let namer = AlliterativeNamer::default();
        let config = GenerationConfig::default();
        let ctx = context(&catalog, &namer, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let team = generate_roster(0, 5, &Theme::SameCharacter, &ctx, &mut rng);
        let names: Vec<_> = team.units().map(|u| u.display_name.as_str()).collect();
        assert_eq!(names.len(), 5);
        assert!(names.iter().all(|n| *n == names[0]));
        assert_eq!(team.class_counts.len(), 1);
    }

    #[test]
    fn themed_classes_respect_theme_without_default_class() {
        let catalog = sample_catalog();
        let namer = AlliterativeNamer::default();
        let config = GenerationConfig {
            default_class_probability: 0.0,
            ..GenerationConfig::default()
        };
        let ctx = context(&catalog, &namer, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let team = generate_roster(0, 12, &Theme::Weapon("Bow".into()), &ctx, &mut rng);
        assert_eq!(team.total_units(), 12);
        assert!(team
            .units()
            .all(|u| u.class_name == "Archer" || u.class_name == "Ranger"));
    }

    #[test]
    fn unsupported_theme_falls_back_to_random() {
        let catalog = sample_catalog();
        let namer = AlliterativeNamer::default();
        let config = GenerationConfig::default();
        let ctx = context(&catalog, &namer, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let team = generate_roster(0, 6, &Theme::Flag("Flying".into()), &ctx, &mut rng);
        assert_eq!(team.total_units(), 6);
    }

    #[test]
    fn empty_catalog_uses_default_class() {
        let catalog = InMemoryCatalog::default();
        let namer = AlliterativeNamer::default();
        let config = GenerationConfig::default();
        let ctx = context(&catalog, &namer, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        let team = generate_roster(3, 7, &Theme::SameClass, &ctx, &mut rng);
        assert_eq!(team.class_counts.len(), 1);
        assert_eq!(team.class_counts[0].class_name, "Knight");
        assert_eq!(team.total_units(), 7);
        assert!(team.units().all(|u| u.team_id == 3));
    }

    #[test]
    fn zero_units_is_an_empty_roster() {
        let catalog = sample_catalog();
        let namer = AlliterativeNamer::default();
        let config = GenerationConfig::default();
        let ctx = context(&catalog, &namer, &config);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        assert!(generate_roster(0, 0, &Theme::Random, &ctx, &mut rng).is_empty());
    }
}
