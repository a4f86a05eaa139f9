use thiserror::Error;

/// Conditions the generation pipeline reports to its caller instead of
/// recovering from. Empty catalog queries are never errors; they take a
/// fallback branch.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenerationError {
    #[error("formation requested for {0} units; at least one unit is required")]
    EmptyFormation(usize),

    #[error(
        "no team configuration splits {total_players} players into teams with {winners} winners"
    )]
    NoValidTeamConfiguration { total_players: u32, winners: u32 },

    #[error("invalid battle setup: {0}")]
    InvalidSetup(String),
}

pub type Result<T> = std::result::Result<T, GenerationError>;
