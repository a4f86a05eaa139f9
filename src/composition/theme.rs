use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    catalog::{Catalog, CharacterRecord, ClassRecord},
    config::ThemeWeights,
};

/// The shared attribute that drives a roster.
///
/// In setup files: `{ kind: same_class }` or `{ kind: weapon, value: Bow }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Theme {
    SameCharacter,
    SameClass,
    Flag(String),
    Weapon(String),
    Stat(String),
    Promoted,
    Random,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeKind {
    SameCharacter,
    SameClass,
    Flag,
    Weapon,
    Stat,
    Promoted,
    Random,
}

impl Theme {
    pub fn kind(&self) -> ThemeKind {
        match self {
            Theme::SameCharacter => ThemeKind::SameCharacter,
            Theme::SameClass => ThemeKind::SameClass,
            Theme::Flag(_) => ThemeKind::Flag,
            Theme::Weapon(_) => ThemeKind::Weapon,
            Theme::Stat(_) => ThemeKind::Stat,
            Theme::Promoted => ThemeKind::Promoted,
            Theme::Random => ThemeKind::Random,
        }
    }
}

/// Builds the weighted candidate list, leaving out data-dependent themes the
/// catalog cannot support, and draws one.
pub fn select_theme<R: Rng>(catalog: &dyn Catalog, weights: &ThemeWeights, rng: &mut R) -> Theme {
    let flags = catalog.class_flags();
    let weapons = catalog.weapons();
    let stats = catalog.high_stats();

    let mut candidates: Vec<(ThemeKind, u32)> = vec![
        (ThemeKind::SameCharacter, weights.same_character),
        (ThemeKind::SameClass, weights.same_class),
        (ThemeKind::Promoted, weights.promoted),
        (ThemeKind::Random, weights.random),
    ];
    if !flags.is_empty() {
        candidates.push((ThemeKind::Flag, weights.flag));
    }
    if !weapons.is_empty() {
        candidates.push((ThemeKind::Weapon, weights.weapon));
    }
    if !stats.is_empty() {
        candidates.push((ThemeKind::Stat, weights.stat));
    }

    let total: u32 = candidates.iter().map(|(_, weight)| weight).sum();
    let kind = if total == 0 {
        ThemeKind::Random
    } else {
        let mut roll = rng.gen_range(0..total);
        let mut chosen = ThemeKind::Random;
        for (kind, weight) in &candidates {
            if roll < *weight {
                chosen = *kind;
                break;
            }
            roll -= weight;
        }
        chosen
    };

    let theme = match kind {
        ThemeKind::SameCharacter => Theme::SameCharacter,
        ThemeKind::SameClass => Theme::SameClass,
        ThemeKind::Promoted => Theme::Promoted,
        ThemeKind::Random => Theme::Random,
        ThemeKind::Flag => flags
            .choose(rng)
            .cloned()
            .map(Theme::Flag)
            .unwrap_or(Theme::Random),
        ThemeKind::Weapon => weapons
            .choose(rng)
            .cloned()
            .map(Theme::Weapon)
            .unwrap_or(Theme::Random),
        ThemeKind::Stat => stats
            .choose(rng)
            .cloned()
            .map(Theme::Stat)
            .unwrap_or(Theme::Random),
    };
    debug!(?theme, "selected theme");
    theme
}

/// How a slot's class is decided once a character is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassPolicy {
    /// Character's default class with some probability, otherwise themed.
    Themed,
    /// Always the single resolved class.
    Fixed,
    /// Always the character's own default class.
    CharacterDefault,
}

/// A theme made concrete against a catalog.
#[derive(Debug, Clone)]
pub struct ThemeResolution<'a> {
    pub theme: Theme,
    pub key: String,
    pub classes: Vec<&'a ClassRecord>,
    pub characters: Vec<&'a CharacterRecord>,
    pub policy: ClassPolicy,
}

impl<'a> ThemeResolution<'a> {
    /// Returns `None` when the catalog has nothing the theme can use.
    pub fn resolve<R: Rng>(theme: &Theme, catalog: &'a dyn Catalog, rng: &mut R) -> Option<Self> {
        let all_characters = catalog.characters();
        let (key, classes, characters, policy) = match theme {
            Theme::SameCharacter => {
                let uniques: Vec<&CharacterRecord> =
                    all_characters.iter().copied().filter(|c| c.unique).collect();
                let pool = if uniques.is_empty() {
                    &all_characters
                } else {
                    &uniques
                };
                let character = *pool.choose(rng)?;
                let class = catalog.class_by_name(&character.default_class)?;
                (
                    character.name.clone(),
                    vec![class],
                    vec![character],
                    ClassPolicy::CharacterDefault,
                )
            }
            Theme::SameClass => {
                let class = *catalog.classes().choose(rng)?;
                (
                    class.name.clone(),
                    vec![class],
                    all_characters,
                    ClassPolicy::Fixed,
                )
            }
            Theme::Flag(flag) => {
                let flagged = catalog.characters_with_flag(flag);
                let characters = if flagged.is_empty() {
                    all_characters
                } else {
                    flagged
                };
                (
                    flag.clone(),
                    catalog.classes_with_flag(flag),
                    characters,
                    ClassPolicy::Themed,
                )
            }
            Theme::Weapon(weapon) => (
                weapon.clone(),
                catalog.classes_with_weapon(weapon),
                all_characters,
                ClassPolicy::Themed,
            ),
            Theme::Stat(stat) => (
                stat.clone(),
                catalog.classes_with_high_stat(stat),
                all_characters,
                ClassPolicy::Themed,
            ),
            Theme::Promoted => (
                "veteran".to_string(),
                catalog
                    .classes()
                    .into_iter()
                    .filter(|c| c.promoted)
                    .collect(),
                all_characters,
                ClassPolicy::Themed,
            ),
            Theme::Random => (
                "mercenary".to_string(),
                catalog.classes(),
                all_characters,
                ClassPolicy::Themed,
            ),
        };

        if classes.is_empty() {
            debug!(?theme, "theme has no eligible classes");
            return None;
        }
        Some(Self {
            theme: theme.clone(),
            key,
            classes,
            characters,
            policy,
        })
    }

    pub fn is_eligible(&self, class_name: &str) -> bool {
        self.classes.iter().any(|c| c.name == class_name)
    }
}
