//! Army display names.

use rand::{seq::SliceRandom, RngCore};

use crate::rng::RngExt;

/// Maps a raw theme key to the name shown for an army.
pub trait ArmyNamer {
    fn army_name(&self, key: &str, rng: &mut dyn RngCore) -> String;
}

const SUFFIXES: &[&str] = &[
    "Avengers", "Brigade", "Battalion", "Cohort", "Company", "Defenders", "Guard", "Horde",
    "Host", "Knaves", "Legion", "Marauders", "Militia", "Raiders", "Regiment", "Riders",
    "Sentinels", "Squadron", "Troop", "Vanguard", "Wardens", "Warband",
];

/// Title-cases the key and sometimes appends a suffix sharing its first
/// letter ("Lance" -> "Lance Legion"). Falls back to "Army" when no suffix
/// alliterates.
#[derive(Debug, Clone)]
pub struct AlliterativeNamer {
    pub alliteration_chance: f32,
}

impl AlliterativeNamer {
    pub fn new(alliteration_chance: f32) -> Self {
        Self {
            alliteration_chance,
        }
    }
}

impl Default for AlliterativeNamer {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl ArmyNamer for AlliterativeNamer {
    fn army_name(&self, key: &str, rng: &mut dyn RngCore) -> String {
        let base = title_case(key);
        if base.is_empty() {
            return "Army".to_string();
        }
        if !rng.random_bool(self.alliteration_chance) {
            return base;
        }
        let initial = base.chars().next().map(|c| c.to_ascii_uppercase());
        let matching: Vec<&str> = SUFFIXES
            .iter()
            .copied()
            .filter(|s| s.chars().next() == initial)
            .collect();
        match matching.choose(rng) {
            Some(suffix) => format!("{base} {suffix}"),
            None => format!("{base} Army"),
        }
    }
}

fn title_case(key: &str) -> String {
    key.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
