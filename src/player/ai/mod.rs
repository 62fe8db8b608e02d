pub mod eval;
pub mod hard;
pub mod medium;
pub mod random;

use crate::core::{Board, Move, Stone};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub use eval::{is_winning_move, score_move};

/// Built-in opponent strength.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Tier {
    pub fn name(self) -> &'static str {
        match self {
            Tier::Easy => "easy",
            Tier::Medium => "medium",
            Tier::Hard => "hard",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Tier::Easy),
            "medium" => Ok(Tier::Medium),
            "hard" => Ok(Tier::Hard),
            other => Err(format!("unknown AI tier '{}'", other)),
        }
    }
}

/// Picks a move for `stone`. Returns `None` only when the board is full.
///
/// Only the Easy tier draws from `rng`; Medium and Hard are deterministic for
/// a given board.
pub fn choose_move<R: Rng + ?Sized>(board: &Board, stone: Stone, tier: Tier, rng: &mut R) -> Option<Move> {
    let pos = match tier {
        Tier::Easy => random::choose_random(board, rng),
        Tier::Medium => medium::choose_medium(board, stone),
        Tier::Hard => hard::choose_hard(board, stone),
    }?;
    Some(Move { pos, stone })
}

/// A built-in opponent: a tier plus the random source it owns.
pub struct AiPlayer {
    tier: Tier,
    rng: StdRng,
}

impl AiPlayer {
    pub fn new(tier: Tier) -> Self {
        Self {
            tier,
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(tier: Tier, seed: u64) -> Self {
        Self {
            tier,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn choose(&mut self, board: &Board, stone: Stone) -> Option<Move> {
        let mv = choose_move(board, stone, self.tier, &mut self.rng);
        debug!(tier = %self.tier, ?stone, chosen = ?mv.map(|m| m.pos), "AI move selected");
        mv
    }
}
