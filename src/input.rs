use crate::app::InputMode;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    Up,
    Down,
    Enter,
    Back,
    Help,
    /// A bare letter whose meaning depends on the current screen (delete,
    /// scale, logs, menu shortcuts, confirmation answers, ...).
    Key(char),
    InputChar(char),
    InputNewline,
    Backspace,
    SubmitInput,
    CancelInput,
}

pub fn map_key(mode: InputMode, key: KeyEvent) -> Option<Action> {
    match mode {
        InputMode::Normal => map_normal_mode_key(key),
        InputMode::TextInput => map_text_input_key(key),
        InputMode::Editor => map_editor_key(key),
    }
}

fn map_normal_mode_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Char('q') if key.modifiers.is_empty() => Some(Action::Quit),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char('j') if key.modifiers.is_empty() => Some(Action::Down),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') if key.modifiers.is_empty() => Some(Action::Up),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Enter => Some(Action::Enter),
        KeyCode::Esc | KeyCode::Backspace => Some(Action::Back),
        KeyCode::Char('?') => Some(Action::Help),
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            Some(Action::Key(c))
        }
        _ => None,
    }
}

fn map_text_input_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::CancelInput),
        KeyCode::Enter => Some(Action::SubmitInput),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            Some(Action::InputChar(c))
        }
        _ => None,
    }
}

fn map_editor_key(key: KeyEvent) -> Option<Action> {
    match key.code {
        KeyCode::Esc => Some(Action::CancelInput),
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(Action::SubmitInput)
        }
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Action::Quit),
        KeyCode::Enter => Some(Action::InputNewline),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Tab => Some(Action::InputChar(' ')),
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            Some(Action::InputChar(c))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, map_key};
    use crate::app::InputMode;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    #[test]
    fn normal_mode_maps_quit() {
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::Quit));
    }

    #[test]
    fn normal_mode_maps_ctrl_c_to_quit() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputMode::Normal, key), Some(Action::Quit));
    }

    #[test]
    fn normal_mode_maps_vim_motion_keys() {
        let j = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE);
        let k = KeyEvent::new(KeyCode::Char('k'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, j), Some(Action::Down));
        assert_eq!(map_key(InputMode::Normal, k), Some(Action::Up));
    }

    #[test]
    fn normal_mode_maps_escape_and_backspace_to_back() {
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        let backspace = KeyEvent::new(KeyCode::Backspace, KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Normal, esc), Some(Action::Back));
        assert_eq!(map_key(InputMode::Normal, backspace), Some(Action::Back));
    }

    #[test]
    fn normal_mode_passes_letters_through_for_screen_dispatch() {
        let d = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::NONE);
        let shift_d = KeyEvent::new(KeyCode::Char('D'), KeyModifiers::SHIFT);
        assert_eq!(map_key(InputMode::Normal, d), Some(Action::Key('d')));
        assert_eq!(map_key(InputMode::Normal, shift_d), Some(Action::Key('D')));
    }

    #[test]
    fn normal_mode_ignores_ctrl_letters() {
        let key = KeyEvent::new(KeyCode::Char('d'), KeyModifiers::CONTROL);
        assert_eq!(map_key(InputMode::Normal, key), None);
    }

    #[test]
    fn text_input_forwards_characters_and_digits() {
        let a = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE);
        let five = KeyEvent::new(KeyCode::Char('5'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::TextInput, a), Some(Action::InputChar('a')));
        assert_eq!(
            map_key(InputMode::TextInput, five),
            Some(Action::InputChar('5'))
        );
    }

    #[test]
    fn text_input_submits_on_enter_and_cancels_on_escape() {
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::TextInput, enter), Some(Action::SubmitInput));
        assert_eq!(map_key(InputMode::TextInput, esc), Some(Action::CancelInput));
    }

    #[test]
    fn editor_submits_on_ctrl_s_and_keeps_enter_as_newline() {
        let ctrl_s = KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL);
        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Editor, ctrl_s), Some(Action::SubmitInput));
        assert_eq!(map_key(InputMode::Editor, enter), Some(Action::InputNewline));
    }

    #[test]
    fn editor_q_is_text_not_quit() {
        let key = KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE);
        assert_eq!(map_key(InputMode::Editor, key), Some(Action::InputChar('q')));
    }
}
