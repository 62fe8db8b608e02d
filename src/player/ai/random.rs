use crate::core::{Board, Position};
use rand::seq::IteratorRandom;
use rand::Rng;

/// Easy tier: any empty cell, uniformly.
pub fn choose_random<R: Rng + ?Sized>(board: &Board, rng: &mut R) -> Option<Position> {
    board.empty_cells().choose(rng)
}
