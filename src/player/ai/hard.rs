//! Hard tier: one-ply adversarial search.
//!
//! Every empty cell is tried on a scratch copy of the board and rated by how
//! good it is for us minus the best reply it leaves the opponent. Candidates
//! are evaluated in parallel; the argmax is taken in row-major order so the
//! result does not depend on thread scheduling.
//!
//! Each candidate rescans the whole board for replies, O(N^4) per turn. That
//! is fine at 15x15 but grows quickly with the board size.

use super::eval::{find_winning_cell, is_winning_move, score_move};
use crate::core::{Board, Position, Stone};
use rayon::prelude::*;

/// Opponent reply value when the reply would win outright.
const WINNING_REPLY_PENALTY: i32 = 90_000;
/// Bonus for a candidate that sits on an opponent winning cell.
const BLOCK_BONUS: i32 = 4_000;

pub fn choose_hard(board: &Board, stone: Stone) -> Option<Position> {
    if let Some(pos) = find_winning_cell(board, stone) {
        return Some(pos);
    }
    let opponent = stone.opponent();
    if let Some(pos) = find_winning_cell(board, opponent) {
        return Some(pos);
    }

    let candidates: Vec<Position> = board.empty_cells().collect();
    if candidates.is_empty() {
        return None;
    }

    let values: Vec<Option<i32>> = candidates
        .par_iter()
        .map(|&pos| evaluate_candidate(board, pos, stone))
        .collect();

    let best = candidates
        .iter()
        .zip(values)
        .filter_map(|(&pos, value)| value.map(|v| (v, pos)))
        .fold(None, |best: Option<(i32, Position)>, (value, pos)| match best {
            Some((best_value, _)) if value <= best_value => best,
            _ => Some((value, pos)),
        });

    Some(best.map_or_else(Position::center, |(_, pos)| pos))
}

fn evaluate_candidate(board: &Board, pos: Position, stone: Stone) -> Option<i32> {
    let opponent = stone.opponent();
    let own = score_move(board, pos, stone)?;

    let mut hypothetical = board.clone();
    hypothetical.place(pos.row, pos.col, stone);
    let reply = best_reply(&hypothetical, opponent);

    let mut value = own * 2 - reply;
    if is_winning_move(board, pos, opponent) {
        value += BLOCK_BONUS;
    }
    Some(value - pos.center_distance() as i32)
}

/// Opponent's best heuristic reply; short-circuits on an immediate win.
fn best_reply(board: &Board, opponent: Stone) -> i32 {
    let mut best = 0;
    for pos in board.empty_cells() {
        if is_winning_move(board, pos, opponent) {
            return WINNING_REPLY_PENALTY;
        }
        if let Some(score) = score_move(board, pos, opponent) {
            best = best.max(score);
        }
    }
    best
}
