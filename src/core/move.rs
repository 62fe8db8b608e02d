use super::types::{Position, Stone};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 着手: 座標と石
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    pub pos: Position,
    pub stone: Stone,
}

impl Move {
    pub fn new(row: usize, col: usize, stone: Stone) -> Self {
        Move {
            pos: Position::new(row, col),
            stone,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} at {}", self.stone.symbol(), self.pos)
    }
}
