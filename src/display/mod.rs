use crate::chat::ChatLog;
use crate::core::{PlayerId, Position, Stone, BOARD_SIZE};
use crate::game::{Game, GameStatus};
use crossterm::{cursor, queue, style::Stylize, terminal};
use std::io::{self, Write};

/// Transcript lines shown under the board.
pub const CHAT_LINES: usize = 6;

/// UI-side render state. The board itself lives in `Game`.
#[derive(Debug, Clone)]
pub struct DisplayState {
    pub cursor: Position,
    pub chat_mode: bool,
    pub chat_input: String,
    pub info: Option<String>,
    /// Seat shown as "(you)" in the header, if any.
    pub local_seat: Option<PlayerId>,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self {
            cursor: Position::center(),
            chat_mode: false,
            chat_input: String::new(),
            info: None,
            local_seat: None,
        }
    }
}

impl DisplayState {
    pub fn new() -> Self {
        Self::default()
    }
}

/// `MM:SS`, or `--:--` when timers are off.
pub fn format_timer(seconds: u64, enabled: bool) -> String {
    if !enabled {
        return "--:--".to_string();
    }
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

fn stone_char(stone: Option<Stone>) -> char {
    stone.map(Stone::symbol).unwrap_or('.')
}

pub fn status_line(game: &Game) -> String {
    match game.status() {
        GameStatus::Init => "Waiting for opponent...".to_string(),
        GameStatus::Running => {
            let player = game.current_player();
            format!(
                "Turn: {} ({})",
                game.name(player),
                game.current_stone().symbol()
            )
        }
        GameStatus::Finished => match game.winner() {
            Some(winner) => format!("Game over: {} wins!", game.name(winner)),
            None => "Game over: no winner".to_string(),
        },
    }
}

pub fn render(game: &Game, chat: &ChatLog, state: &DisplayState) -> io::Result<()> {
    let mut out = io::stdout().lock();

    // 画面クリア（スクロール防止）
    queue!(
        out,
        terminal::Clear(terminal::ClearType::All),
        cursor::MoveTo(0, 0)
    )?;

    write!(out, "=== Gomoku Duel ({}) ===\r\n", game.mode().label())?;
    for player in [PlayerId::Player1, PlayerId::Player2] {
        let you = if state.local_seat == Some(player) { " (you)" } else { "" };
        let timer = format_timer(game.timer_remaining(player), game.timers_enabled());
        let line = format!(
            "{} {}{} [{}]",
            player.stone().symbol(),
            game.name(player),
            you,
            timer
        );
        if game.timer_running(player) {
            write!(out, "{}\r\n", line.bold())?;
        } else {
            write!(out, "{}\r\n", line)?;
        }
    }

    let mut status = status_line(game);
    if state.chat_mode {
        status.push_str("  [CHAT]");
    }
    write!(out, "{}\r\n", status)?;
    match &state.info {
        Some(msg) => write!(out, "{}\r\n", msg.clone().bold().yellow())?,
        None => write!(out, "\r\n")?,
    }

    render_grid(&mut out, game, state)?;
    render_chat(&mut out, chat, state)?;

    write!(
        out,
        "\r\n[arrows/hjkl] move  [enter] place  [u] undo  [y/n] answer  [r] resign  [tab] chat  [q] quit\r\n"
    )?;
    out.flush()
}

fn render_grid(out: &mut impl Write, game: &Game, state: &DisplayState) -> io::Result<()> {
    let (last, previous) = game.highlights();

    // X軸ラベル
    write!(out, "   ")?;
    for col in 0..BOARD_SIZE {
        write!(out, "{:>3}", col + 1)?;
    }
    write!(out, "\r\n")?;

    for row in 0..BOARD_SIZE {
        write!(out, "{:>2} ", row + 1)?;
        for col in 0..BOARD_SIZE {
            let pos = Position::new(row, col);
            let stone = game.board().cell(pos);
            let ch = stone_char(stone);

            let is_cursor = state.cursor == pos && !state.chat_mode;
            let (prefix, suffix) = if is_cursor {
                ('[', ']')
            } else if last == Some(pos) {
                ('(', ')')
            } else if previous == Some(pos) {
                ('{', '}')
            } else {
                (' ', ' ')
            };
            let cell = format!("{}{}{}", prefix, ch, suffix);

            if is_cursor {
                write!(out, "{}", cell.yellow())?;
            } else if last == Some(pos) {
                write!(out, "{}", cell.red())?;
            } else {
                match stone {
                    Some(Stone::Black) => write!(out, "{}", cell.cyan())?,
                    Some(Stone::White) => write!(out, "{}", cell.magenta())?,
                    None => write!(out, "{}", cell)?,
                }
            }
        }
        write!(out, "\r\n")?;
    }
    Ok(())
}

fn render_chat(out: &mut impl Write, chat: &ChatLog, state: &DisplayState) -> io::Result<()> {
    write!(out, "\r\n--- Chat ---\r\n")?;
    let shown = chat.len().min(CHAT_LINES);
    for i in (0..shown).rev() {
        if let Some(msg) = chat.latest(i) {
            write!(
                out,
                "[{}] {}: {}\r\n",
                msg.at.format("%H:%M"),
                msg.sender,
                msg.text
            )?;
        }
    }
    if state.chat_mode {
        write!(out, "> {}_\r\n", state.chat_input)?;
    }
    Ok(())
}
