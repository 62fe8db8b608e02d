pub mod timer;

use crate::core::{truncate_utf8, Board, Move, PlayerId, Position, Stone};
use crate::player::ai::{AiPlayer, Tier};
use timer::TurnTimer;
use tracing::{debug, info};

/// Stones in a row needed to win.
pub const WIN_TARGET: usize = 5;
/// Longest display name kept, in bytes.
pub const MAX_NAME_LEN: usize = 31;

/// Who drives a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Participant {
    Local,
    Ai,
    Remote,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    Single,
    Host,
    Client,
}

impl GameMode {
    pub fn label(self) -> &'static str {
        match self {
            GameMode::Single => "Single (AI)",
            GameMode::Host => "LAN - Host",
            GameMode::Client => "LAN - Client",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Init,
    Running,
    Finished,
}

/// Game state machine.
///
/// Owns the board, seat roles, turn, undo negotiation state and both turn
/// timers. At most one timer runs: the one of the player to move.
pub struct Game {
    board: Board,
    mode: GameMode,
    participants: [Participant; 2],
    names: [String; 2],
    current: PlayerId,
    status: GameStatus,
    winner: Option<PlayerId>,
    undo_requester: Option<PlayerId>,
    timers: [TurnTimer; 2],
    turn_limit: i32,
    last_move: Option<Move>,
    previous_move: Option<Move>,
}

impl Game {
    pub fn new(mode: GameMode, participants: [Participant; 2], names: [&str; 2], turn_limit: i32) -> Self {
        let budget = turn_limit.max(0) as u64;
        Game {
            board: Board::new(),
            mode,
            participants,
            names: names.map(|n| truncate_utf8(n, MAX_NAME_LEN).to_string()),
            current: PlayerId::Player1,
            status: GameStatus::Init,
            winner: None,
            undo_requester: None,
            timers: [TurnTimer::new(budget), TurnTimer::new(budget)],
            turn_limit,
            last_move: None,
            previous_move: None,
        }
    }

    /// Local player (black) against the built-in opponent.
    pub fn single(nickname: &str, tier: Tier, turn_limit: i32) -> Self {
        let ai_name = format!("AI ({})", tier);
        Self::new(
            GameMode::Single,
            [Participant::Local, Participant::Ai],
            [nickname, &ai_name],
            turn_limit,
        )
    }

    /// Hosting side plays black.
    pub fn host(nickname: &str, turn_limit: i32) -> Self {
        Self::new(
            GameMode::Host,
            [Participant::Local, Participant::Remote],
            [nickname, "Remote"],
            turn_limit,
        )
    }

    pub fn client(nickname: &str, turn_limit: i32) -> Self {
        Self::new(
            GameMode::Client,
            [Participant::Remote, Participant::Local],
            ["Remote", nickname],
            turn_limit,
        )
    }

    pub fn start(&mut self) {
        self.status = GameStatus::Running;
        self.current = PlayerId::Player1;
        self.reset_timers();
        info!(mode = ?self.mode, black = %self.names[0], white = %self.names[1], "game started");
    }

    pub fn finish(&mut self, winner: Option<PlayerId>) {
        self.winner = winner;
        self.status = GameStatus::Finished;
        for timer in &mut self.timers {
            timer.stop();
        }
        info!(?winner, moves = self.board.move_count(), "game finished");
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn status(&self) -> GameStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.status == GameStatus::Running
    }

    pub fn is_finished(&self) -> bool {
        self.status == GameStatus::Finished
    }

    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    pub fn current_player(&self) -> PlayerId {
        self.current
    }

    pub fn current_stone(&self) -> Stone {
        self.current.stone()
    }

    pub fn participant(&self, player: PlayerId) -> Participant {
        self.participants[player.index()]
    }

    pub fn is_local_turn(&self) -> bool {
        self.participant(self.current) == Participant::Local
    }

    /// First seat driven by `who`.
    pub fn seat_of(&self, who: Participant) -> Option<PlayerId> {
        [PlayerId::Player1, PlayerId::Player2]
            .into_iter()
            .find(|&p| self.participant(p) == who)
    }

    pub fn name(&self, player: PlayerId) -> &str {
        &self.names[player.index()]
    }

    pub fn set_name(&mut self, player: PlayerId, name: &str) {
        self.names[player.index()] = truncate_utf8(name, MAX_NAME_LEN).to_string();
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    pub fn previous_move(&self) -> Option<Move> {
        self.previous_move
    }

    pub fn turn_limit(&self) -> i32 {
        self.turn_limit
    }

    pub fn timers_enabled(&self) -> bool {
        self.turn_limit > 0
    }

    pub fn can_place(&self, row: usize, col: usize) -> bool {
        self.is_running() && self.board.is_empty(row, col)
    }

    /// Places the current player's stone.
    pub fn place_stone(&mut self, row: usize, col: usize) -> bool {
        if !self.can_place(row, col) {
            return false;
        }
        let stone = self.current_stone();
        if !self.board.place(row, col, stone) {
            return false;
        }
        self.after_placement(Move::new(row, col, stone));
        true
    }

    /// Lets the built-in opponent move for the current player.
    ///
    /// Falls back to the first empty cell if the engine proposes an illegal
    /// one. Returns the move played.
    pub fn play_ai_turn(&mut self, ai: &mut AiPlayer) -> Option<Move> {
        if !self.is_running() || self.participant(self.current) != Participant::Ai {
            return None;
        }
        let stone = self.current_stone();
        let pos = ai
            .choose(&self.board, stone)
            .map(|mv| mv.pos)
            .filter(|pos| self.board.is_empty(pos.row, pos.col))
            .or_else(|| self.board.empty_cells().next())?;
        if !self.place_stone(pos.row, pos.col) {
            return None;
        }
        self.last_move
    }

    fn after_placement(&mut self, placed: Move) {
        self.previous_move = self.last_move;
        self.last_move = Some(placed);
        debug!(mv = %placed, "stone placed");

        if self.board.check_win(&placed, WIN_TARGET) {
            self.finish(Some(self.current));
        } else if self.board.is_full() {
            self.finish(None);
        } else {
            self.switch_turn();
        }
    }

    fn switch_turn(&mut self) {
        self.timers[self.current.index()].stop();
        self.current = self.current.opponent();
        self.reset_timers();
    }

    /// Restarts the active player's timer; stops everything when disabled.
    fn reset_timers(&mut self) {
        for timer in &mut self.timers {
            timer.stop();
        }
        if self.timers_enabled() {
            self.timers[self.current.index()].start(self.turn_limit as u64);
        }
    }

    pub fn request_undo(&mut self, requester: PlayerId) {
        self.undo_requester = Some(requester);
    }

    pub fn undo_pending(&self) -> Option<PlayerId> {
        self.undo_requester
    }

    /// Executes an already agreed undo of the last move.
    pub fn apply_undo(&mut self) -> bool {
        let Some(undone) = self.board.undo_last() else {
            return false;
        };
        self.current = PlayerId::from_stone(undone.stone);

        let history = self.board.history();
        self.last_move = history.last().copied();
        self.previous_move = history.len().checked_sub(2).map(|i| history[i]);

        // 終局後の待ったは対局を再開する
        self.status = GameStatus::Running;
        self.winner = None;
        self.reset_timers();
        self.cancel_undo();
        debug!(mv = %undone, "move undone");
        true
    }

    pub fn cancel_undo(&mut self) {
        self.undo_requester = None;
    }

    pub fn resign(&mut self, player: PlayerId) {
        if self.is_finished() {
            return;
        }
        info!(?player, "player resigned");
        self.finish(Some(player.opponent()));
    }

    /// Seconds left for `player`; always 0 when timers are disabled.
    pub fn timer_remaining(&self, player: PlayerId) -> u64 {
        if !self.timers_enabled() {
            return 0;
        }
        self.timers[player.index()].remaining()
    }

    pub fn timer_running(&self, player: PlayerId) -> bool {
        self.timers[player.index()].is_running()
    }

    /// The player to move has run out of time.
    pub fn active_timer_expired(&self) -> bool {
        self.is_running() && self.timers_enabled() && self.timer_remaining(self.current) == 0
    }

    /// Positions of the last two moves, for highlighting.
    pub fn highlights(&self) -> (Option<Position>, Option<Position>) {
        (self.last_move.map(|m| m.pos), self.previous_move.map(|m| m.pos))
    }
}
