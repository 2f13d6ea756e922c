use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

pub(crate) fn is_back(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Esc)
}

pub(crate) fn is_confirm(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Enter)
}

pub(crate) fn is_next_focus(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::Tab | KeyCode::Down)
}

pub(crate) fn is_prev_focus(key: KeyEvent) -> bool {
    matches!(key.code, KeyCode::BackTab | KeyCode::Up)
}

pub(crate) fn is_toggle(key: KeyEvent) -> bool {
    matches!(
        key.code,
        KeyCode::Char(' ') | KeyCode::Left | KeyCode::Right
    )
}

pub(crate) fn is_ctrl_c(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}
