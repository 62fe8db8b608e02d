use super::input::{decode_key, InputEvent};
use crate::chat::{ChatLog, CHAT_MESSAGE_LEN};
use crate::config::AppConfig;
use crate::display::{self, DisplayState};
use crate::game::{Game, GameMode, GameStatus, Participant};
use crate::network::{client, server, EventQueue, NetEvent, Session};
use crate::core::PlayerId;
use crate::error::NetworkError;
use crate::player::ai::{AiPlayer, Tier};
use crossterm::event::{self, Event};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const TICK: Duration = Duration::from_millis(30);
const INFO_TTL: Duration = Duration::from_secs(3);

/// The game loop.
///
/// The only owner of `Game`. Network events arrive through `EventQueue` and
/// are applied here, once per iteration.
pub struct App {
    game: Game,
    chat: ChatLog,
    display: DisplayState,
    ai: Option<AiPlayer>,
    session: Option<Session>,
    events: EventQueue,
    nickname: String,
    info_until: Option<Instant>,
    quit: bool,
}

impl App {
    pub fn new(game: Game, ai: Option<AiPlayer>, session: Option<Session>, events: EventQueue, nickname: &str) -> Self {
        let mut display = DisplayState::new();
        display.local_seat = game.seat_of(Participant::Local);
        App {
            game,
            chat: ChatLog::new(),
            display,
            ai,
            session,
            events,
            nickname: nickname.to_string(),
            info_until: None,
            quit: false,
        }
    }

    /// Player versus the built-in opponent; starts immediately. Names and
    /// timers come from the installed `AppConfig`.
    pub fn single(tier: Tier) -> Self {
        let config = AppConfig::get();
        let game = Game::single(&config.nickname, tier, config.turn_time_seconds);
        let mut app = Self::new(
            game,
            Some(AiPlayer::new(tier)),
            None,
            EventQueue::default(),
            &config.nickname,
        );
        app.game.start();
        app.chat.system(&format!("New game against the {} AI", tier));
        app
    }

    /// Listens for a peer; the game starts when it connects.
    pub fn host(port: u16) -> Result<Self, NetworkError> {
        let config = AppConfig::get();
        let events = EventQueue::default();
        let session = server::start_server(port, &config.nickname, events.callback())?;
        let game = Game::host(&config.nickname, config.turn_time_seconds);
        let mut app = Self::new(game, None, Some(session), events, &config.nickname);
        app.chat.system(&format!("Waiting for a peer on port {}", port));
        Ok(app)
    }

    pub fn join(host: &str, port: u16) -> Result<Self, NetworkError> {
        let config = AppConfig::get();
        let events = EventQueue::default();
        let session = client::connect(host, port, &config.nickname, events.callback())?;
        let game = Game::client(&config.nickname, config.turn_time_seconds);
        Ok(Self::new(game, None, Some(session), events, &config.nickname))
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    pub fn display(&self) -> &DisplayState {
        &self.display
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    fn networked(&self) -> bool {
        self.game.mode() != GameMode::Single
    }

    fn local_seat(&self) -> PlayerId {
        self.game.seat_of(Participant::Local).unwrap_or(PlayerId::Player1)
    }

    fn remote_seat(&self) -> Option<PlayerId> {
        self.game.seat_of(Participant::Remote)
    }

    fn set_info(&mut self, msg: impl Into<String>) {
        self.display.info = Some(msg.into());
        self.info_until = Some(Instant::now() + INFO_TTL);
    }

    fn send(&self, what: &str, f: impl FnOnce(&Session) -> Result<(), NetworkError>) {
        if let Some(session) = &self.session {
            if let Err(e) = f(session) {
                warn!("failed to send {}: {}", what, e);
            }
        }
    }

    fn announce_result(&mut self) {
        if !self.game.is_finished() {
            return;
        }
        let text = display::status_line(&self.game);
        self.chat.system(&text);
        self.set_info(text);
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        info!(mode = ?self.game.mode(), "entering game loop");
        while !self.quit {
            self.process_network();
            self.check_timeout();
            self.run_ai_turn();
            self.poll_keyboard()?;
            self.expire_info(Instant::now());
            display::render(&self.game, &self.chat, &self.display)?;
            thread::sleep(TICK);
        }
        if let Some(mut session) = self.session.take() {
            session.close();
        }
        Ok(())
    }

    fn poll_keyboard(&mut self) -> anyhow::Result<()> {
        while event::poll(Duration::ZERO)? {
            if let Event::Key(key) = event::read()? {
                if let Some(input) = decode_key(key, self.display.chat_mode) {
                    self.handle_input(input);
                }
            }
        }
        Ok(())
    }

    pub fn process_network(&mut self) {
        for event in self.events.drain() {
            self.handle_net_event(event);
        }
    }

    pub fn expire_info(&mut self, now: Instant) {
        if self.info_until.is_some_and(|until| now >= until) {
            self.display.info = None;
            self.info_until = None;
        }
    }

    /// Time-out loses the game for whoever is to move.
    pub fn check_timeout(&mut self) {
        if !self.game.active_timer_expired() {
            return;
        }
        let loser = self.game.current_player();
        info!(?loser, "turn timer expired");
        self.game.resign(loser);
        if self.networked() && self.game.participant(loser) == Participant::Local {
            self.send("resign", |s| s.send_resign());
        }
        self.chat
            .system(&format!("{} ran out of time", self.game.name(loser)));
        self.announce_result();
    }

    pub fn run_ai_turn(&mut self) {
        if !self.game.is_running() || self.game.participant(self.game.current_player()) != Participant::Ai {
            return;
        }
        let Some(ai) = self.ai.as_mut() else {
            return;
        };
        let player = self.game.current_player();
        if let Some(mv) = self.game.play_ai_turn(ai) {
            self.chat
                .system(&format!("{} played {}", self.game.name(player), mv.pos));
            self.announce_result();
        }
    }

    pub fn handle_input(&mut self, input: InputEvent) {
        match input {
            InputEvent::MoveCursor { drow, dcol } => {
                if let Some(pos) = self.display.cursor.step(drow, dcol) {
                    self.display.cursor = pos;
                }
            }
            InputEvent::Place => self.place_at_cursor(),
            InputEvent::RequestUndo => self.request_undo(),
            InputEvent::AcceptUndo => self.answer_undo(true),
            InputEvent::DeclineUndo => self.answer_undo(false),
            InputEvent::Resign => {
                if !self.game.is_running() {
                    return;
                }
                let me = self.local_seat();
                self.game.resign(me);
                self.send("resign", |s| s.send_resign());
                self.chat.system(&format!("{} resigned", self.game.name(me)));
                self.announce_result();
            }
            InputEvent::Quit => {
                if self.game.is_running() {
                    self.game.finish(None);
                }
                self.quit = true;
            }
            InputEvent::ToggleChat => {
                self.display.chat_mode = !self.display.chat_mode;
            }
            InputEvent::ChatChar(c) => {
                if self.display.chat_input.len() + c.len_utf8() <= CHAT_MESSAGE_LEN {
                    self.display.chat_input.push(c);
                }
            }
            InputEvent::ChatBackspace => {
                self.display.chat_input.pop();
            }
            InputEvent::ChatSend => {
                let text = std::mem::take(&mut self.display.chat_input);
                if text.trim().is_empty() {
                    return;
                }
                self.chat.add(&self.nickname, &text);
                self.send("chat", |s| s.send_chat(&text));
            }
        }
    }

    fn place_at_cursor(&mut self) {
        if !self.game.is_running() {
            self.set_info("The game is not running");
            return;
        }
        if !self.game.is_local_turn() {
            self.set_info("Not your turn");
            return;
        }
        let pos = self.display.cursor;
        let player = self.game.current_player();
        if !self.game.place_stone(pos.row, pos.col) {
            self.set_info("Cannot place there");
            return;
        }
        self.chat
            .system(&format!("{} played {}", self.game.name(player), pos));
        self.send("move", |s| s.send_move(pos.row, pos.col));
        self.announce_result();
    }

    fn request_undo(&mut self) {
        if self.game.board().move_count() == 0 {
            self.set_info("Nothing to undo");
            return;
        }

        if self.networked() {
            if self.game.status() == GameStatus::Init {
                return;
            }
            if self.game.undo_pending().is_some() {
                self.set_info("An undo request is already pending");
                return;
            }
            self.game.request_undo(self.local_seat());
            self.send("undo request", |s| s.send_undo_request());
            self.chat.system("Undo requested");
            return;
        }

        // AI の応手と自分の手をまとめて戻す
        for _ in 0..2 {
            if !self.game.apply_undo() {
                break;
            }
            if self.game.is_local_turn() {
                break;
            }
        }
        self.chat.system("Move undone");
    }

    fn answer_undo(&mut self, accepted: bool) {
        let Some(remote) = self.remote_seat() else {
            return;
        };
        if self.game.undo_pending() != Some(remote) {
            return;
        }
        self.send("undo response", |s| s.send_undo_response(accepted));
        if accepted {
            self.game.apply_undo();
            self.chat.system("Undo accepted");
        } else {
            self.game.cancel_undo();
            self.chat.system("Undo declined");
        }
    }

    pub fn handle_net_event(&mut self, event: NetEvent) {
        debug!(?event, "network event");
        match event {
            NetEvent::Connected { peer_name } => {
                if let Some(remote) = self.remote_seat() {
                    self.game.set_name(remote, &peer_name);
                }
                if self.game.status() == GameStatus::Init {
                    self.game.start();
                }
                self.chat.system(&format!("{} joined the game", peer_name));
            }
            NetEvent::Disconnected => {
                self.chat.system("Peer disconnected");
                if self.game.is_running() {
                    self.game.finish(None);
                    self.set_info("Peer disconnected, game aborted");
                }
            }
            NetEvent::Move { row, col } => {
                let current = self.game.current_player();
                if !self.game.is_running() || self.game.participant(current) != Participant::Remote {
                    warn!(row, col, "ignoring move received out of turn");
                    return;
                }
                if !self.game.place_stone(row, col) {
                    warn!(row, col, "ignoring illegal remote move");
                    self.set_info("Opponent sent an illegal move");
                    return;
                }
                self.chat.system(&format!(
                    "{} played ({}, {})",
                    self.game.name(current),
                    row + 1,
                    col + 1
                ));
                self.announce_result();
            }
            NetEvent::Chat { text } => {
                let sender = self
                    .remote_seat()
                    .map(|seat| self.game.name(seat).to_string())
                    .unwrap_or_else(|| "Remote".to_string());
                self.chat.add(&sender, &text);
            }
            NetEvent::UndoRequest => {
                if let Some(remote) = self.remote_seat() {
                    self.game.request_undo(remote);
                    self.chat.system("Opponent requests an undo (y/n)");
                }
            }
            NetEvent::UndoResponse { accepted } => {
                if self.game.undo_pending() != Some(self.local_seat()) {
                    return;
                }
                if accepted {
                    self.game.apply_undo();
                    self.chat.system("Opponent accepted the undo");
                } else {
                    self.game.cancel_undo();
                    self.chat.system("Opponent declined the undo");
                }
            }
            NetEvent::Resign => {
                if let Some(remote) = self.remote_seat() {
                    if self.game.is_running() {
                        self.game.resign(remote);
                        self.chat
                            .system(&format!("{} resigned", self.game.name(remote)));
                        self.announce_result();
                    }
                }
            }
            NetEvent::Error(fault) => {
                self.chat
                    .system(&format!("Network error {}: {}", fault.code(), fault));
                // 接続前の失敗: もう相手は来ないので待機をやめる
                if self.game.status() == GameStatus::Init {
                    self.game.finish(None);
                    self.set_info(format!("Connection failed: {}", fault));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Position, Stone};
    use crate::error::SessionFault;

    fn single_app() -> App {
        let game = Game::single("kuro", Tier::Medium, 30);
        let mut app = App::new(
            game,
            Some(AiPlayer::with_seed(Tier::Medium, 1)),
            None,
            EventQueue::default(),
            "kuro",
        );
        app.game.start();
        app
    }

    fn host_app() -> App {
        App::new(Game::host("alice", 30), None, None, EventQueue::default(), "alice")
    }

    fn connected_host() -> App {
        let mut app = host_app();
        app.handle_net_event(NetEvent::Connected {
            peer_name: "bob".to_string(),
        });
        app
    }

    #[test]
    fn test_single_uses_installed_config() {
        let app = App::single(Tier::Easy);
        let config = AppConfig::get();
        assert!(app.game().is_running());
        assert_eq!(app.game().name(PlayerId::Player1), config.nickname);
        assert_eq!(app.game().timers_enabled(), config.timers_enabled());
        assert!(app.chat().latest(0).unwrap().text.contains("easy"));
    }

    #[test]
    fn test_single_player_place_then_ai_replies() {
        let mut app = single_app();
        app.handle_input(InputEvent::Place);
        assert_eq!(app.game().board().cell(Position::center()), Some(Stone::Black));
        assert_eq!(app.game().current_player(), PlayerId::Player2);

        app.run_ai_turn();
        assert_eq!(app.game().board().move_count(), 2);
        assert_eq!(app.game().current_player(), PlayerId::Player1);
    }

    #[test]
    fn test_single_player_undo_returns_to_local_turn() {
        let mut app = single_app();
        app.handle_input(InputEvent::Place);
        app.run_ai_turn();

        app.handle_input(InputEvent::RequestUndo);
        assert_eq!(app.game().board().move_count(), 0);
        assert!(app.game().is_local_turn());
    }

    #[test]
    fn test_place_rejected_out_of_turn() {
        let mut app = connected_host();
        app.handle_input(InputEvent::Place);
        app.handle_input(InputEvent::Place);
        assert_eq!(app.game().board().move_count(), 1);
        assert_eq!(app.display().info.as_deref(), Some("Not your turn"));
    }

    #[test]
    fn test_connected_renames_and_starts() {
        let mut app = host_app();
        assert_eq!(app.game().status(), GameStatus::Init);
        app.handle_net_event(NetEvent::Connected {
            peer_name: "bob".to_string(),
        });
        assert!(app.game().is_running());
        assert_eq!(app.game().name(PlayerId::Player2), "bob");
    }

    #[test]
    fn test_remote_move_only_on_remote_turn() {
        let mut app = connected_host();
        app.handle_net_event(NetEvent::Move { row: 0, col: 0 });
        assert_eq!(app.game().board().move_count(), 0);

        app.handle_input(InputEvent::Place);
        app.handle_net_event(NetEvent::Move { row: 0, col: 0 });
        assert_eq!(app.game().board().cell(Position::new(0, 0)), Some(Stone::White));
        assert!(app.game().is_local_turn());
    }

    #[test]
    fn test_accepting_remote_undo_applies_it() {
        let mut app = connected_host();
        app.handle_input(InputEvent::Place);
        app.handle_net_event(NetEvent::Move { row: 3, col: 3 });

        app.handle_net_event(NetEvent::UndoRequest);
        assert_eq!(app.game().undo_pending(), Some(PlayerId::Player2));
        app.handle_input(InputEvent::AcceptUndo);
        assert_eq!(app.game().board().move_count(), 1);
        assert_eq!(app.game().undo_pending(), None);
        assert_eq!(app.game().current_player(), PlayerId::Player2);
    }

    #[test]
    fn test_undo_response_from_peer() {
        let mut app = connected_host();
        app.handle_input(InputEvent::Place);
        app.handle_input(InputEvent::RequestUndo);
        assert_eq!(app.game().undo_pending(), Some(PlayerId::Player1));

        app.handle_net_event(NetEvent::UndoResponse { accepted: false });
        assert_eq!(app.game().board().move_count(), 1);
        assert_eq!(app.game().undo_pending(), None);

        app.handle_input(InputEvent::RequestUndo);
        app.handle_net_event(NetEvent::UndoResponse { accepted: true });
        assert_eq!(app.game().board().move_count(), 0);
    }

    #[test]
    fn test_resign_and_disconnect() {
        let mut app = connected_host();
        app.handle_net_event(NetEvent::Resign);
        assert_eq!(app.game().winner(), Some(PlayerId::Player1));

        let mut app = connected_host();
        app.handle_net_event(NetEvent::Disconnected);
        assert!(app.game().is_finished());
        assert_eq!(app.game().winner(), None);
    }

    #[test]
    fn test_local_resign() {
        let mut app = connected_host();
        app.handle_input(InputEvent::Resign);
        assert_eq!(app.game().winner(), Some(PlayerId::Player2));
    }

    #[test]
    fn test_chat_input_and_remote_chat() {
        let mut app = connected_host();
        app.handle_input(InputEvent::ToggleChat);
        for c in "gg".chars() {
            app.handle_input(InputEvent::ChatChar(c));
        }
        app.handle_input(InputEvent::ChatSend);
        assert_eq!(app.chat().latest(0).map(|m| m.text.as_str()), Some("gg"));
        assert!(app.display().chat_input.is_empty());

        app.handle_net_event(NetEvent::Chat {
            text: "wp".to_string(),
        });
        let msg = app.chat().latest(0).unwrap();
        assert_eq!((msg.sender.as_str(), msg.text.as_str()), ("bob", "wp"));
    }

    #[test]
    fn test_error_event_is_logged_to_chat() {
        let mut app = connected_host();
        app.handle_net_event(NetEvent::Error(SessionFault::UnknownFrame(9)));
        assert!(app.chat().latest(0).unwrap().text.contains("-2"));
    }

    #[test]
    fn test_error_before_connect_ends_waiting() {
        let mut app = host_app();
        app.handle_net_event(NetEvent::Error(SessionFault::HandshakeReceive { server: true }));
        assert!(app.game().is_finished());
        assert_eq!(app.game().winner(), None);
        assert!(app
            .display()
            .info
            .as_deref()
            .is_some_and(|info| info.starts_with("Connection failed")));

        // A late Connected cannot revive the aborted game.
        app.handle_net_event(NetEvent::Connected {
            peer_name: "bob".to_string(),
        });
        assert!(app.game().is_finished());
    }

    #[test]
    fn test_error_mid_game_keeps_state() {
        let mut app = connected_host();
        app.handle_net_event(NetEvent::Error(SessionFault::UnknownFrame(9)));
        assert!(app.game().is_running());
    }

    #[test]
    fn test_queue_feeds_handlers() {
        let mut app = host_app();
        let push = app.events.callback();
        push(NetEvent::Connected {
            peer_name: "bob".to_string(),
        });
        app.process_network();
        assert!(app.game().is_running());
    }

    #[test]
    fn test_info_expires() {
        let mut app = single_app();
        app.set_info("hello");
        app.expire_info(Instant::now());
        assert!(app.display().info.is_some());
        app.expire_info(Instant::now() + INFO_TTL);
        assert!(app.display().info.is_none());
    }

    #[test]
    fn test_quit_aborts_game() {
        let mut app = single_app();
        app.handle_input(InputEvent::Quit);
        assert!(app.should_quit());
        assert!(app.game().is_finished());
    }
}
