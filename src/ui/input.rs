use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// A key press decoded into an orchestrator action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    MoveCursor { drow: isize, dcol: isize },
    Place,
    RequestUndo,
    AcceptUndo,
    DeclineUndo,
    Resign,
    Quit,
    ToggleChat,
    ChatChar(char),
    ChatBackspace,
    ChatSend,
}

/// In chat mode, character keys are text rather than commands.
pub fn decode_key(key: KeyEvent, chat_mode: bool) -> Option<InputEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(InputEvent::Quit);
    }

    if chat_mode {
        return match key.code {
            KeyCode::Tab | KeyCode::Esc => Some(InputEvent::ToggleChat),
            KeyCode::Enter => Some(InputEvent::ChatSend),
            KeyCode::Backspace => Some(InputEvent::ChatBackspace),
            KeyCode::Char(c) => Some(InputEvent::ChatChar(c)),
            _ => None,
        };
    }

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(InputEvent::MoveCursor { drow: -1, dcol: 0 }),
        KeyCode::Down | KeyCode::Char('j') => Some(InputEvent::MoveCursor { drow: 1, dcol: 0 }),
        KeyCode::Left | KeyCode::Char('h') => Some(InputEvent::MoveCursor { drow: 0, dcol: -1 }),
        KeyCode::Right | KeyCode::Char('l') => Some(InputEvent::MoveCursor { drow: 0, dcol: 1 }),
        KeyCode::Enter | KeyCode::Char(' ') => Some(InputEvent::Place),
        KeyCode::Char('u') => Some(InputEvent::RequestUndo),
        KeyCode::Char('y') => Some(InputEvent::AcceptUndo),
        KeyCode::Char('n') => Some(InputEvent::DeclineUndo),
        KeyCode::Char('r') => Some(InputEvent::Resign),
        KeyCode::Char('q') | KeyCode::Esc => Some(InputEvent::Quit),
        KeyCode::Tab => Some(InputEvent::ToggleChat),
        _ => None,
    }
}
