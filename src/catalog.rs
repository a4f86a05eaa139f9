//! Read-only character and class catalog.
//!
//! The generator never owns game data. It queries a `Catalog` and treats an
//! empty answer as an ordinary outcome that selects a fallback.

use std::collections::BTreeMap;

use rand::{seq::SliceRandom, RngCore};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterRecord {
    pub name: String,
    #[serde(default)]
    pub unique: bool,
    #[serde(default = "default_playable")]
    pub playable: bool,
    pub default_class: String,
    #[serde(default)]
    pub flags: Vec<String>,
}

fn default_playable() -> bool {
    true
}

impl CharacterRecord {
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub name: String,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub preferred_weapon: Option<String>,
    #[serde(default)]
    pub base_stats: BTreeMap<String, i32>,
    #[serde(default)]
    pub promoted: bool,
    #[serde(default)]
    pub ranged: bool,
}

impl ClassRecord {
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.iter().any(|f| f == flag)
    }

    /// Stats sharing this class's highest base value.
    pub fn high_stats(&self) -> Vec<&str> {
        let Some(best) = self.base_stats.values().copied().max() else {
            return Vec::new();
        };
        self.base_stats
            .iter()
            .filter(|(_, value)| **value == best)
            .map(|(stat, _)| stat.as_str())
            .collect()
    }
}

/// Restricts `Catalog::random_character`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CharacterFilter {
    pub unique_only: bool,
    pub generic_only: bool,
    pub playable_only: bool,
}

impl CharacterFilter {
    pub fn unique() -> Self {
        Self {
            unique_only: true,
            ..Self::default()
        }
    }

    pub fn generic() -> Self {
        Self {
            generic_only: true,
            ..Self::default()
        }
    }

    pub fn matches(&self, character: &CharacterRecord) -> bool {
        if self.unique_only && !character.unique {
            return false;
        }
        if self.generic_only && character.unique {
            return false;
        }
        if self.playable_only && !character.playable {
            return false;
        }
        true
    }
}

pub trait Catalog {
    fn characters(&self) -> Vec<&CharacterRecord>;

    fn characters_with_flag(&self, flag: &str) -> Vec<&CharacterRecord> {
        self.characters()
            .into_iter()
            .filter(|c| c.has_flag(flag))
            .collect()
    }

    fn random_character(
        &self,
        rng: &mut dyn RngCore,
        filter: CharacterFilter,
    ) -> Option<&CharacterRecord> {
        let matching: Vec<&CharacterRecord> = self
            .characters()
            .into_iter()
            .filter(|c| filter.matches(c))
            .collect();
        matching.choose(rng).copied()
    }

    fn classes(&self) -> Vec<&ClassRecord>;

    fn class_by_name(&self, name: &str) -> Option<&ClassRecord> {
        self.classes().into_iter().find(|c| c.name == name)
    }

    fn class_by_index(&self, index: usize) -> Option<&ClassRecord> {
        self.classes().get(index).copied()
    }

    fn classes_with_flag(&self, flag: &str) -> Vec<&ClassRecord> {
        self.classes()
            .into_iter()
            .filter(|c| c.has_flag(flag))
            .collect()
    }

    fn classes_with_weapon(&self, weapon: &str) -> Vec<&ClassRecord> {
        self.classes()
            .into_iter()
            .filter(|c| c.preferred_weapon.as_deref() == Some(weapon))
            .collect()
    }

    fn classes_with_high_stat(&self, stat: &str) -> Vec<&ClassRecord> {
        self.classes()
            .into_iter()
            .filter(|c| c.high_stats().contains(&stat))
            .collect()
    }

    fn is_ranged(&self, class_name: &str) -> bool {
        self.class_by_name(class_name)
            .map(|c| c.ranged)
            .unwrap_or(false)
    }

    /// Distinct class flags, sorted.
    fn class_flags(&self) -> Vec<String> {
        let mut flags: Vec<String> = self
            .classes()
            .into_iter()
            .flat_map(|c| c.flags.iter().cloned())
            .collect();
        flags.sort();
        flags.dedup();
        flags
    }

    /// Distinct preferred weapons, sorted.
    fn weapons(&self) -> Vec<String> {
        let mut weapons: Vec<String> = self
            .classes()
            .into_iter()
            .filter_map(|c| c.preferred_weapon.clone())
            .collect();
        weapons.sort();
        weapons.dedup();
        weapons
    }

    /// Distinct stats that are some class's highest, sorted.
    fn high_stats(&self) -> Vec<String> {
        let mut stats: Vec<String> = self
            .classes()
            .into_iter()
            .flat_map(|c| {
                c.high_stats()
                    .into_iter()
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        stats.sort();
        stats.dedup();
        stats
    }
}

/// A catalog held in memory, typically deserialized from a setup file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryCatalog {
    #[serde(default)]
    pub characters: Vec<CharacterRecord>,
    #[serde(default)]
    pub classes: Vec<ClassRecord>,
}

impl InMemoryCatalog {
    pub fn new(characters: Vec<CharacterRecord>, classes: Vec<ClassRecord>) -> Self {
        Self {
            characters,
            classes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.characters.is_empty() && self.classes.is_empty()
    }
}

impl Catalog for InMemoryCatalog {
    fn characters(&self) -> Vec<&CharacterRecord> {
        self.characters.iter().collect()
    }

    fn classes(&self) -> Vec<&ClassRecord> {
        self.classes.iter().collect()
    }

    fn class_by_index(&self, index: usize) -> Option<&ClassRecord> {
        self.classes.get(index)
    }
}
