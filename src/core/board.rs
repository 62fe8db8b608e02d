use super::r#move::Move;
use super::types::{Position, Stone, BOARD_SIZE};
use crate::logic::{line_run, DIRECTIONS};

/// 履歴の上限 (全マス数)
pub const MAX_MOVES: usize = BOARD_SIZE * BOARD_SIZE;

/// 盤面
///
/// 履歴の長さは常に盤上の石の数と一致する (変更は着手と待ったのみ)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    cells: [[Option<Stone>; BOARD_SIZE]; BOARD_SIZE],
    history: Vec<Move>,
    last_move: Option<Move>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Board {
            cells: [[None; BOARD_SIZE]; BOARD_SIZE],
            history: Vec::with_capacity(MAX_MOVES),
            last_move: None,
        }
    }

    pub fn is_inside(row: usize, col: usize) -> bool {
        row < BOARD_SIZE && col < BOARD_SIZE
    }

    /// 盤外は空きマスとみなさない
    pub fn is_empty(&self, row: usize, col: usize) -> bool {
        Self::is_inside(row, col) && self.cells[row][col].is_none()
    }

    pub fn cell(&self, pos: Position) -> Option<Stone> {
        if Self::is_inside(pos.row, pos.col) {
            self.cells[pos.row][pos.col]
        } else {
            None
        }
    }

    pub fn cells(&self) -> &[[Option<Stone>; BOARD_SIZE]; BOARD_SIZE] {
        &self.cells
    }

    /// 石を置く。範囲外・既に石がある・履歴が満杯なら false (盤面は変化しない)
    pub fn place(&mut self, row: usize, col: usize, stone: Stone) -> bool {
        if !self.is_empty(row, col) || self.history.len() >= MAX_MOVES {
            return false;
        }
        let mv = Move::new(row, col, stone);
        self.cells[row][col] = Some(stone);
        self.history.push(mv);
        self.last_move = Some(mv);
        true
    }

    /// 直前の一手を取り消してマスを空ける
    pub fn undo_last(&mut self) -> Option<Move> {
        let mv = self.history.pop()?;
        self.cells[mv.pos.row][mv.pos.col] = None;
        self.last_move = self.history.last().copied();
        Some(mv)
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn move_count(&self) -> usize {
        self.history.len()
    }

    pub fn is_full(&self) -> bool {
        self.history.len() >= MAX_MOVES
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = Position> + '_ {
        (0..BOARD_SIZE)
            .flat_map(|row| (0..BOARD_SIZE).map(move |col| Position::new(row, col)))
            .filter(|pos| self.cells[pos.row][pos.col].is_none())
    }

    /// `mv` を通る4方向だけを調べる (盤全体は走査しない)
    pub fn check_win(&self, mv: &Move, target: usize) -> bool {
        if self.cell(mv.pos) != Some(mv.stone) {
            return false;
        }
        DIRECTIONS
            .iter()
            .any(|&dir| line_run(self, mv.pos, mv.stone, dir).length >= target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place_all(board: &mut Board, cells: &[(usize, usize)], stone: Stone) {
        for &(r, c) in cells {
            assert!(board.place(r, c, stone));
        }
    }

    #[test]
    fn test_place_occupies_cell() {
        let mut board = Board::new();
        assert!(board.place(3, 4, Stone::Black));
        assert!(!board.is_empty(3, 4));
        assert!(!board.place(3, 4, Stone::Black));
        assert!(!board.place(3, 4, Stone::White));
        assert_eq!(board.move_count(), 1);
    }

    #[test]
    fn test_place_out_of_bounds() {
        let mut board = Board::new();
        assert!(!board.place(BOARD_SIZE, 0, Stone::Black));
        assert!(!board.place(0, BOARD_SIZE, Stone::White));
        assert_eq!(board.move_count(), 0);
        assert!(!board.is_empty(BOARD_SIZE, 0));
    }

    #[test]
    fn test_undo_restores_previous_state() {
        let mut board = Board::new();
        board.place(7, 7, Stone::Black);
        board.place(7, 8, Stone::White);
        let before = board.clone();

        assert!(board.place(8, 8, Stone::Black));
        let undone = board.undo_last();
        assert_eq!(undone, Some(Move::new(8, 8, Stone::Black)));
        assert_eq!(board, before);
        assert_eq!(board.last_move(), Some(Move::new(7, 8, Stone::White)));
    }

    #[test]
    fn test_undo_peels_to_empty() {
        let mut board = Board::new();
        board.place(0, 0, Stone::Black);
        assert!(board.undo_last().is_some());
        assert_eq!(board.last_move(), None);
        assert!(board.undo_last().is_none());
    }

    #[test]
    fn test_history_matches_occupied_cells() {
        let mut board = Board::new();
        place_all(&mut board, &[(1, 1), (2, 2), (3, 3)], Stone::White);
        board.undo_last();
        let occupied = board
            .cells()
            .iter()
            .flatten()
            .filter(|cell| cell.is_some())
            .count();
        assert_eq!(occupied, board.move_count());
        assert_eq!(board.empty_cells().count(), MAX_MOVES - 2);
    }

    #[test]
    fn test_check_win_horizontal_and_vertical() {
        let mut board = Board::new();
        place_all(&mut board, &[(5, 3), (5, 4), (5, 6), (5, 7)], Stone::Black);
        board.place(5, 5, Stone::Black);
        assert!(board.check_win(&Move::new(5, 5, Stone::Black), 5));

        let mut board = Board::new();
        place_all(&mut board, &[(0, 9), (1, 9), (2, 9), (3, 9)], Stone::White);
        assert!(!board.check_win(&Move::new(3, 9, Stone::White), 5));
        board.place(4, 9, Stone::White);
        assert!(board.check_win(&Move::new(4, 9, Stone::White), 5));
    }

    #[test]
    fn test_check_win_diagonals() {
        let mut board = Board::new();
        place_all(&mut board, &[(10, 10), (11, 11), (12, 12), (13, 13), (14, 14)], Stone::Black);
        assert!(board.check_win(&Move::new(14, 14, Stone::Black), 5));

        let mut board = Board::new();
        place_all(&mut board, &[(0, 4), (1, 3), (2, 2), (3, 1), (4, 0)], Stone::White);
        assert!(board.check_win(&Move::new(2, 2, Stone::White), 5));
    }

    #[test]
    fn test_check_win_ignores_broken_line() {
        let mut board = Board::new();
        place_all(&mut board, &[(7, 2), (7, 3), (7, 4), (7, 5)], Stone::Black);
        board.place(7, 6, Stone::White);
        place_all(&mut board, &[(7, 7)], Stone::Black);
        assert!(!board.check_win(&Move::new(7, 5, Stone::Black), 5));
        assert!(!board.check_win(&Move::new(7, 7, Stone::Black), 5));
    }

    #[test]
    fn test_overline_counts_as_win() {
        let mut board = Board::new();
        place_all(&mut board, &[(2, 0), (2, 1), (2, 2), (2, 4), (2, 5)], Stone::Black);
        board.place(2, 3, Stone::Black);
        assert!(board.check_win(&Move::new(2, 3, Stone::Black), 5));
    }

    #[test]
    fn test_check_win_rejects_stale_move() {
        let mut board = Board::new();
        place_all(&mut board, &[(0, 0), (0, 1), (0, 2), (0, 3), (0, 4)], Stone::Black);
        // 盤上の石と一致しない手は勝ちにならない
        assert!(!board.check_win(&Move::new(0, 2, Stone::White), 5));
    }
}
