//! Tunable probabilities and weights for roster generation
//!
//! Every field carries a serde default so a setup file only lists the values
//! it wants to change.

use serde::{Deserialize, Serialize};

fn default_class_probability() -> f32 {
    0.5
}

fn default_unique_character_probability() -> f32 {
    0.8
}

fn default_single_boss_chance() -> f32 {
    0.3
}

fn default_boss_escalation_chance() -> f32 {
    0.35
}

fn default_rare_boss_chance() -> f32 {
    0.1
}

fn default_large_group_chance() -> f32 {
    0.15
}

fn default_elite_miniboss_chance() -> f32 {
    0.25
}

fn default_miniboss_block_chance() -> f32 {
    0.5
}

fn default_strong_enemy_chance() -> f32 {
    0.2
}

fn default_alliteration_chance() -> f32 {
    0.5
}

fn default_rotate_cell_chance() -> f32 {
    0.25
}

fn default_fallback_class() -> String {
    "Knight".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Chance a unit keeps its character's own class instead of a themed one.
    #[serde(default = "default_class_probability")]
    pub default_class_probability: f32,
    /// Chance a slot only considers unique characters.
    #[serde(default = "default_unique_character_probability")]
    pub unique_character_probability: f32,
    #[serde(default = "default_single_boss_chance")]
    pub single_boss_chance: f32,
    /// Chance the boss grows from 1.5 to 2.0.
    #[serde(default = "default_boss_escalation_chance")]
    pub boss_escalation_chance: f32,
    /// Chance an escalated boss grows again to 2.5.
    #[serde(default = "default_rare_boss_chance")]
    pub rare_boss_chance: f32,
    #[serde(default = "default_large_group_chance")]
    pub large_group_chance: f32,
    #[serde(default = "default_elite_miniboss_chance")]
    pub elite_miniboss_chance: f32,
    #[serde(default = "default_miniboss_block_chance")]
    pub miniboss_block_chance: f32,
    #[serde(default = "default_strong_enemy_chance")]
    pub strong_enemy_chance: f32,
    #[serde(default = "default_alliteration_chance")]
    pub alliteration_chance: f32,
    /// Chance an N-team cell is turned a quarter about its centre.
    #[serde(default = "default_rotate_cell_chance")]
    pub rotate_cell_chance: f32,
    /// Class used when the catalog cannot supply any.
    #[serde(default = "default_fallback_class")]
    pub fallback_class: String,
    #[serde(default)]
    pub theme_weights: ThemeWeights,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            default_class_probability: default_class_probability(),
            unique_character_probability: default_unique_character_probability(),
            single_boss_chance: default_single_boss_chance(),
            boss_escalation_chance: default_boss_escalation_chance(),
            rare_boss_chance: default_rare_boss_chance(),
            large_group_chance: default_large_group_chance(),
            elite_miniboss_chance: default_elite_miniboss_chance(),
            miniboss_block_chance: default_miniboss_block_chance(),
            strong_enemy_chance: default_strong_enemy_chance(),
            alliteration_chance: default_alliteration_chance(),
            rotate_cell_chance: default_rotate_cell_chance(),
            fallback_class: default_fallback_class(),
            theme_weights: ThemeWeights::default(),
        }
    }
}

fn weight_same_character() -> u32 {
    10
}

fn weight_same_class() -> u32 {
    15
}

fn weight_flag() -> u32 {
    15
}

fn weight_weapon() -> u32 {
    15
}

fn weight_stat() -> u32 {
    10
}

fn weight_promoted() -> u32 {
    10
}

fn weight_random() -> u32 {
    25
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeWeights {
    #[serde(default = "weight_same_character")]
    pub same_character: u32,
    #[serde(default = "weight_same_class")]
    pub same_class: u32,
    #[serde(default = "weight_flag")]
    pub flag: u32,
    #[serde(default = "weight_weapon")]
    pub weapon: u32,
    #[serde(default = "weight_stat")]
    pub stat: u32,
    #[serde(default = "weight_promoted")]
    pub promoted: u32,
    #[serde(default = "weight_random")]
    pub random: u32,
}

impl Default for ThemeWeights {
    fn default() -> Self {
        Self {
            same_character: weight_same_character(),
            same_class: weight_same_class(),
            flag: weight_flag(),
            weapon: weight_weapon(),
            stat: weight_stat(),
            promoted: weight_promoted(),
            random: weight_random(),
        }
    }
}
