use crate::core::{Board, Position, Stone};

/// 4方向 (横・縦・斜め・逆斜め)。逆向きは符号を反転して辿る
pub const DIRECTIONS: [(isize, isize); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

/// あるマスを通る一直線上の同色の連
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    /// 連の石数 (起点を含む)
    pub length: usize,
    /// 連の両端の外側のうち空きマスの数 (0..=2)
    pub open_ends: usize,
}

/// 指定方向に同色の石が何個続くか (起点は数えない)
fn count_direction(board: &Board, from: Position, (dr, dc): (isize, isize), stone: Stone) -> usize {
    let mut count = 0;
    let mut curr = from;
    while let Some(next) = curr.step(dr, dc) {
        if board.cell(next) != Some(stone) {
            break;
        }
        count += 1;
        curr = next;
    }
    count
}

/// この方向の連の先が盤内の空きマスか
fn is_open_end(board: &Board, from: Position, (dr, dc): (isize, isize), stone: Stone) -> bool {
    let mut curr = from;
    loop {
        match curr.step(dr, dc) {
            Some(next) if board.cell(next) == Some(stone) => curr = next,
            Some(next) => return board.is_empty(next.row, next.col),
            None => return false,
        }
    }
}

/// `origin` に `stone` があるものとして `dir` 方向の連を測る
///
/// 置いた直後の石にも、空きマスへの仮の着手にも使える。
pub fn line_run(board: &Board, origin: Position, stone: Stone, dir: (isize, isize)) -> Run {
    let back = (-dir.0, -dir.1);
    let length = 1 + count_direction(board, origin, dir, stone) + count_direction(board, origin, back, stone);
    let open_ends = usize::from(is_open_end(board, origin, dir, stone))
        + usize::from(is_open_end(board, origin, back, stone));
    Run { length, open_ends }
}
