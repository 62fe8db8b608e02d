use super::eval::{find_winning_cell, score_move};
use crate::core::{Board, Position, Stone};

/// Win if possible, block if needed, otherwise the best heuristic cell with a
/// mild bias towards cells the opponent also wants.
pub fn choose_medium(board: &Board, stone: Stone) -> Option<Position> {
    if let Some(pos) = find_winning_cell(board, stone) {
        return Some(pos);
    }
    let opponent = stone.opponent();
    if let Some(pos) = find_winning_cell(board, opponent) {
        return Some(pos);
    }

    let mut best: Option<(i32, Position)> = None;
    for pos in board.empty_cells() {
        let own = score_move(board, pos, stone).unwrap_or(0);
        let block = score_move(board, pos, opponent).unwrap_or(0);
        let score = own + block / 2;

        best = match best {
            None => Some((score, pos)),
            Some((best_score, _)) if score > best_score => Some((score, pos)),
            // 同点なら中央に近い方
            Some((best_score, best_pos))
                if score == best_score && pos.center_distance() < best_pos.center_distance() =>
            {
                Some((score, pos))
            }
            keep => keep,
        };
    }
    best.map(|(_, pos)| pos)
}
