//! # Pattern Heuristic
//!
//! Scores an empty cell for a given stone by looking at the four lines through
//! it as if the stone were placed there. Each line contributes a value from a
//! fixed table keyed on the run length and how many of its ends are open; the
//! four contributions are summed and a small centrality bonus is added.
//!
//! The same line scan decides immediate wins: a cell wins iff some run through
//! it reaches five.

use crate::core::{Board, Position, Stone, BOARD_SIZE};
use crate::logic::{line_run, DIRECTIONS};

/// Run length that ends the game.
pub const WIN_LENGTH: usize = 5;

// Pattern values
const SCORE_FIVE: i32 = 100_000;
const SCORE_OPEN_FOUR: i32 = 10_000;
const SCORE_FOUR: i32 = 5_000;
const SCORE_OPEN_THREE: i32 = 1_500;
const SCORE_THREE: i32 = 800;
const SCORE_OPEN_TWO: i32 = 400;
const SCORE_TWO: i32 = 150;
const SCORE_OPEN_ONE: i32 = 50;
const SCORE_MIN: i32 = 10;

/// Value of a single line: monotonic in both run length and openness.
pub fn score_pattern(stones: usize, open_ends: usize) -> i32 {
    match (stones, open_ends) {
        (s, _) if s >= WIN_LENGTH => SCORE_FIVE,
        (4, 2) => SCORE_OPEN_FOUR,
        (4, 1) => SCORE_FOUR,
        (3, 2) => SCORE_OPEN_THREE,
        (3, 1) => SCORE_THREE,
        (2, 2) => SCORE_OPEN_TWO,
        (2, 1) => SCORE_TWO,
        (1, 2) => SCORE_OPEN_ONE,
        _ => SCORE_MIN,
    }
}

/// Heuristic value of placing `stone` at `pos`; `None` for occupied or
/// off-board cells.
pub fn score_move(board: &Board, pos: Position, stone: Stone) -> Option<i32> {
    if !board.is_empty(pos.row, pos.col) {
        return None;
    }
    let lines: i32 = DIRECTIONS
        .iter()
        .map(|&dir| {
            let run = line_run(board, pos, stone, dir);
            score_pattern(run.length, run.open_ends)
        })
        .sum();

    // 中央寄りを少し優遇
    Some(lines + (BOARD_SIZE - pos.center_distance()) as i32)
}

/// Placing `stone` at the empty cell `pos` would complete five or more.
pub fn is_winning_move(board: &Board, pos: Position, stone: Stone) -> bool {
    board.is_empty(pos.row, pos.col)
        && DIRECTIONS
            .iter()
            .any(|&dir| line_run(board, pos, stone, dir).length >= WIN_LENGTH)
}

/// First winning cell for `stone` in row-major order.
pub fn find_winning_cell(board: &Board, stone: Stone) -> Option<Position> {
    board
        .empty_cells()
        .find(|&pos| is_winning_move(board, pos, stone))
}
