//! What a player's first meld of each round has to look like.

use serde::{Deserialize, Serialize};

use super::constants::LAST_ROUND;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RoundRequirement {
    /// Exact number of groups the first meld must contain.
    pub group_count: usize,
    /// Minimum cards in every one of those groups.
    pub min_length: usize,
    /// Whether runs count toward the first meld.
    pub initial_run_allowed: bool,
}

impl RoundRequirement {
    const fn new(group_count: usize, min_length: usize) -> Self {
        Self {
            group_count,
            min_length,
            initial_run_allowed: false,
        }
    }
}

/// Requirement for `round`, or `None` outside rounds 1 through 6.
#[must_use]
pub const fn requirement_for(round: u8) -> Option<RoundRequirement> {
    let requirement = match round {
        1 => RoundRequirement::new(2, 3),
        2 => RoundRequirement::new(1, 4),
        3 => RoundRequirement::new(2, 4),
        4 => RoundRequirement::new(1, 5),
        5 => RoundRequirement::new(1, 6),
        6 => RoundRequirement::new(2, 5),
        _ => return None,
    };
    Some(requirement)
}

/// Whether `round` is one that gets played.
#[must_use]
pub const fn is_playable_round(round: u8) -> bool {
    round >= 1 && round <= LAST_ROUND
}
