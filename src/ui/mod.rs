use crate::player::ai::Tier;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use std::io::{self, Write};
use std::time::Duration;

pub mod app;
pub mod input;

/// Mode picked from the start menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuChoice {
    Single(Tier),
    Host(u16),
    Join { host: String, port: u16 },
    Quit,
}

/// Blocks until a key is pressed; key releases are skipped.
fn next_key_press() -> anyhow::Result<KeyEvent> {
    loop {
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Release {
                return Ok(key);
            }
        }
    }
}

/// Effect of one key on a line being typed.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LineEdit {
    Typed(char),
    Erased,
    Submit(String),
    Cancel,
    Ignored,
}

fn edit_line(input: &mut String, code: KeyCode, default: &str) -> LineEdit {
    match code {
        KeyCode::Enter => {
            let line = input.trim();
            LineEdit::Submit(if line.is_empty() { default } else { line }.to_string())
        }
        KeyCode::Char(c) => {
            input.push(c);
            LineEdit::Typed(c)
        }
        KeyCode::Backspace if input.pop().is_some() => LineEdit::Erased,
        KeyCode::Esc => LineEdit::Cancel,
        _ => LineEdit::Ignored,
    }
}

/// One line of text typed at the start menu. Enter on an empty line gives
/// `default`; Esc cancels.
pub fn read_input_raw(default: &str, prompt: &str) -> anyhow::Result<String> {
    print!("{}: (Default: {}) \r\n> ", prompt, default);
    io::stdout().flush()?;

    let mut input = String::new();
    loop {
        match edit_line(&mut input, next_key_press()?.code, default) {
            LineEdit::Typed(c) => print!("{}", c),
            LineEdit::Erased => print!("\u{0008} \u{0008}"),
            LineEdit::Submit(line) => {
                print!("\r\n");
                return Ok(line);
            }
            LineEdit::Cancel => anyhow::bail!("Canceled"),
            LineEdit::Ignored => continue,
        }
        io::stdout().flush()?;
    }
}

/// `None` when the user backs out with `q` or Esc.
fn read_choice(keys: &[char]) -> anyhow::Result<Option<char>> {
    loop {
        match next_key_press()?.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(None),
            KeyCode::Char(c) if keys.contains(&c) => return Ok(Some(c)),
            _ => {}
        }
    }
}

fn read_port(default_port: u16) -> anyhow::Result<u16> {
    let text = read_input_raw(&default_port.to_string(), "Port")?;
    text.trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid port '{}'", text.trim()))
}

/// Start menu.
pub fn select_mode(default_tier: Tier, default_port: u16) -> anyhow::Result<MenuChoice> {
    print!("=== Gomoku Duel ===\r\n");
    print!("\r\nSelect mode:\r\n");
    print!("1. Single player vs AI\r\n");
    print!("2. Host a LAN game\r\n");
    print!("3. Join a LAN game\r\n");
    print!("q. Quit\r\n");
    io::stdout().flush()?;

    let Some(mode) = read_choice(&['1', '2', '3'])? else {
        return Ok(MenuChoice::Quit);
    };

    match mode {
        '1' => {
            print!("\r\nSelect AI strength (Default: {}):\r\n", default_tier);
            print!("1. Easy\r\n2. Medium\r\n3. Hard\r\n");
            io::stdout().flush()?;
            let tier = match read_choice(&['1', '2', '3'])? {
                Some('1') => Tier::Easy,
                Some('2') => Tier::Medium,
                Some(_) => Tier::Hard,
                None => return Ok(MenuChoice::Quit),
            };
            Ok(MenuChoice::Single(tier))
        }
        '2' => {
            print!("\r\n");
            Ok(MenuChoice::Host(read_port(default_port)?))
        }
        _ => {
            print!("\r\n");
            let host = read_input_raw("127.0.0.1", "Host")?;
            let port = read_port(default_port)?;
            Ok(MenuChoice::Join { host, port })
        }
    }
}
