pub mod ai;

pub use ai::{AiPlayer, Tier};
