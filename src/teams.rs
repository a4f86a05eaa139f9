//! Splitting a free-for-all lobby into equally sized teams.

use serde::Serialize;

use crate::error::{GenerationError, Result};

pub const MAX_TEAMS: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TeamBattlePlan {
    pub team_count: u32,
    pub team_size: u32,
    /// Teams whose players all count as winners.
    pub winning_teams: u32,
}

impl TeamBattlePlan {
    pub fn winners(&self) -> u32 {
        self.winning_teams * self.team_size
    }
}

/// Every way to split `total_players` into 2..=`MAX_TEAMS` equal teams such
/// that `winners` is a whole number of teams and at least one team loses.
/// Ordered by increasing team count.
pub fn valid_team_configurations(total_players: u32, winners: u32) -> Vec<TeamBattlePlan> {
    if winners == 0 || winners >= total_players {
        return Vec::new();
    }
    let upper = (total_players / winners).min(MAX_TEAMS);
    (2..=upper)
        .filter(|team_count| total_players % team_count == 0)
        .filter_map(|team_count| {
            let team_size = total_players / team_count;
            if winners % team_size != 0 {
                return None;
            }
            let winning_teams = winners / team_size;
            (winning_teams < team_count).then_some(TeamBattlePlan {
                team_count,
                team_size,
                winning_teams,
            })
        })
        .collect()
}

/// The valid configuration with the most teams.
pub fn plan_team_battle(total_players: u32, winners: u32) -> Result<TeamBattlePlan> {
    valid_team_configurations(total_players, winners)
        .pop()
        .ok_or(GenerationError::NoValidTeamConfiguration {
            total_players,
            winners,
        })
}
