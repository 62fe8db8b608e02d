use crate::core::{Move, PlayerId};
use crate::game::{Game, GameMode, Participant};
use crate::player::ai::{AiPlayer, Tier};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;

pub const KIFU_DIR: &str = "selfplay_kifu";

#[derive(Debug, Clone)]
pub struct SelfPlayConfig {
    pub num_games: usize,
    pub black_tier: Tier,
    pub white_tier: Tier,
    /// Fixed seed makes every game reproducible; `None` draws from entropy.
    pub seed: Option<u64>,
    pub kifu_dir: Option<PathBuf>,
}

impl Default for SelfPlayConfig {
    fn default() -> Self {
        Self {
            num_games: 10,
            black_tier: Tier::Medium,
            white_tier: Tier::Medium,
            seed: None,
            kifu_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResult {
    pub winner: Option<PlayerId>,
    pub moves: usize,
    pub time_ms: u128,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelfPlayStats {
    pub total_games: usize,
    pub black_wins: usize,
    pub white_wins: usize,
    pub draws: usize,
    pub avg_moves: f64,
    pub avg_time_ms: f64,
    pub black_tier: String,
    pub white_tier: String,
    pub games: Vec<GameResult>,
}

/// Move record of one self-play game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KifuData {
    pub black: String,
    pub white: String,
    pub winner: Option<PlayerId>,
    pub moves: Vec<Move>,
}

impl SelfPlayStats {
    pub fn new(black_tier: Tier, white_tier: Tier) -> Self {
        Self {
            black_tier: black_tier.to_string(),
            white_tier: white_tier.to_string(),
            ..Self::default()
        }
    }

    pub fn add_result(&mut self, result: GameResult) {
        self.total_games += 1;
        match result.winner {
            Some(PlayerId::Player1) => self.black_wins += 1,
            Some(PlayerId::Player2) => self.white_wins += 1,
            None => self.draws += 1,
        }
        self.games.push(result);
        self.recalculate_averages();
    }

    fn recalculate_averages(&mut self) {
        if self.games.is_empty() {
            return;
        }
        let total_moves: usize = self.games.iter().map(|g| g.moves).sum();
        let total_time: u128 = self.games.iter().map(|g| g.time_ms).sum();
        self.avg_moves = total_moves as f64 / self.games.len() as f64;
        self.avg_time_ms = total_time as f64 / self.games.len() as f64;
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn make_ai(tier: Tier, seed: Option<u64>) -> AiPlayer {
    match seed {
        Some(seed) => AiPlayer::with_seed(tier, seed),
        None => AiPlayer::new(tier),
    }
}

/// Plays one AI-vs-AI game to completion. Timers are off.
pub fn play_game(black: &mut AiPlayer, white: &mut AiPlayer) -> Game {
    let names = [
        format!("AI-Black ({})", black.tier()),
        format!("AI-White ({})", white.tier()),
    ];
    let mut game = Game::new(
        GameMode::Single,
        [Participant::Ai, Participant::Ai],
        [names[0].as_str(), names[1].as_str()],
        0,
    );
    game.start();

    while game.is_running() {
        let ai = match game.current_player() {
            PlayerId::Player1 => &mut *black,
            PlayerId::Player2 => &mut *white,
        };
        if game.play_ai_turn(ai).is_none() {
            game.finish(None);
        }
    }
    game
}

pub fn run_selfplay(config: &SelfPlayConfig) -> anyhow::Result<SelfPlayStats> {
    if let Some(dir) = &config.kifu_dir {
        std::fs::create_dir_all(dir)?;
    }

    // 各対局は独立しているので並列に回す
    let outcomes: Vec<anyhow::Result<GameResult>> = (0..config.num_games)
        .into_par_iter()
        .map(|index| {
            let start_time = Instant::now();
            let seed = config.seed.map(|s| s.wrapping_add(2 * index as u64));
            let mut black = make_ai(config.black_tier, seed);
            let mut white = make_ai(config.white_tier, seed.map(|s| s.wrapping_add(1)));

            let game = play_game(&mut black, &mut white);
            let result = GameResult {
                winner: game.winner(),
                moves: game.board().move_count(),
                time_ms: start_time.elapsed().as_millis(),
            };
            info!(
                game = index + 1,
                winner = ?result.winner,
                moves = result.moves,
                "self-play game finished"
            );

            if let Some(dir) = &config.kifu_dir {
                save_kifu(dir, &game, index + 1)?;
            }
            Ok(result)
        })
        .collect();

    let mut stats = SelfPlayStats::new(config.black_tier, config.white_tier);
    for outcome in outcomes {
        stats.add_result(outcome?);
    }
    Ok(stats)
}

fn save_kifu(dir: &Path, game: &Game, game_num: usize) -> anyhow::Result<()> {
    let filename = dir.join(format!(
        "game_{:04}_{}.json",
        game_num,
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ));

    let kifu_data = KifuData {
        black: game.name(PlayerId::Player1).to_string(),
        white: game.name(PlayerId::Player2).to_string(),
        winner: game.winner(),
        moves: game.board().history().to_vec(),
    };

    let file = std::fs::File::create(filename)?;
    serde_json::to_writer(file, &kifu_data)?;
    Ok(())
}
