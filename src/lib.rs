pub mod catalog;
pub mod composition;
pub mod config;
pub mod engine;
pub mod error;
pub mod formation;
pub mod naming;
pub mod power;
pub mod rng;
pub mod setup;
pub mod teams;

pub use config::GenerationConfig;
pub use engine::{BattleGenerator, BattleRoster, GeneratorBuilder, GeneratorSettings, RosterSummary};
pub use error::{GenerationError, Result};
pub use setup::{BattleSetup, SetupLoader};
