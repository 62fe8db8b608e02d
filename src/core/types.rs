use serde::{Deserialize, Serialize};
use std::fmt;

/// 盤の一辺のマス数
pub const BOARD_SIZE: usize = 15;

/// 石の色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stone {
    Black, // 先手
    White, // 後手
}

impl Stone {
    pub fn opponent(self) -> Stone {
        match self {
            Stone::Black => Stone::White,
            Stone::White => Stone::Black,
        }
    }

    pub fn symbol(self) -> char {
        match self {
            Stone::Black => 'X',
            Stone::White => 'O',
        }
    }
}

/// プレイヤーID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    Player1, // 先手 (黒)
    Player2, // 後手 (白)
}

impl Default for PlayerId {
    fn default() -> Self {
        PlayerId::Player1
    }
}

impl PlayerId {
    pub fn opponent(self) -> PlayerId {
        match self {
            PlayerId::Player1 => PlayerId::Player2,
            PlayerId::Player2 => PlayerId::Player1,
        }
    }

    /// 0 (黒) または 1 (白)
    pub fn index(self) -> usize {
        match self {
            PlayerId::Player1 => 0,
            PlayerId::Player2 => 1,
        }
    }

    pub fn stone(self) -> Stone {
        match self {
            PlayerId::Player1 => Stone::Black,
            PlayerId::Player2 => Stone::White,
        }
    }

    pub fn from_stone(stone: Stone) -> PlayerId {
        match stone {
            Stone::Black => PlayerId::Player1,
            Stone::White => PlayerId::Player2,
        }
    }
}

/// 盤面座標 (0-indexed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    pub fn center() -> Self {
        Position::new(BOARD_SIZE / 2, BOARD_SIZE / 2)
    }

    /// 中央からのマンハッタン距離
    pub fn center_distance(self) -> usize {
        let center = BOARD_SIZE / 2;
        self.row.abs_diff(center) + self.col.abs_diff(center)
    }

    /// `(drow, dcol)` 方向の隣のマス (盤外なら None)
    pub fn step(self, drow: isize, dcol: isize) -> Option<Position> {
        let row = self.row.checked_add_signed(drow)?;
        let col = self.col.checked_add_signed(dcol)?;
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Some(Position::new(row, col))
        } else {
            None
        }
    }
}

impl fmt::Display for Position {
    // 表示は 1-indexed
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.row + 1, self.col + 1)
    }
}

/// 文字の途中で切らずに `max_bytes` バイト以内に切り詰める
pub fn truncate_utf8(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}
