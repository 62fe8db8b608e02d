pub mod board;
pub mod r#move;
pub mod types;

pub use board::{Board, MAX_MOVES};
pub use r#move::Move;
pub use types::{truncate_utf8, PlayerId, Position, Stone, BOARD_SIZE};
