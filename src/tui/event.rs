//! Keyboard event handling for the TUI.
//!
//! Maps crossterm keyboard events to application state changes.
//! Key behavior depends on which panel has focus.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{App, Focus};

/// What the event loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Nothing beyond the state change already applied
    None,
    /// Ask the question currently in the input
    Submit,
    Quit,
}

/// Handles a keyboard event and updates the app state accordingly.
///
/// # Event Handling
///
/// - `Ctrl+C`: Quit application (from any focus state)
/// - `q`: Quit when a panel other than the input is focused
/// - `Tab` / `Shift+Tab`: Cycle focus between panels
/// - `Esc`: Return to the question input
/// - When `Input` focused: characters edit the question, Enter asks
/// - When `Answer` or `History` focused: j/k scroll
///
/// # Examples
///
/// ```
/// use evsearch::tui::{App, event::{Action, handle_key_event}};
/// use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
///
/// let mut app = App::new();
/// let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
/// assert_eq!(handle_key_event(&mut app, key), Action::Quit);
/// ```
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Action {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return Action::Quit;
    }

    // Global focus cycling with Tab / Shift+Tab (BackTab)
    if key.code == KeyCode::Tab {
        app.next_focus();
        return Action::None;
    }
    if key.code == KeyCode::BackTab {
        app.prev_focus();
        return Action::None;
    }

    if key.code == KeyCode::Esc {
        app.reset_focus();
        return Action::None;
    }

    match app.focus() {
        Focus::Input => handle_input(app, key),
        Focus::Answer | Focus::History => handle_panel(app, key),
    }
}

/// Handles keyboard input when the question input is focused.
fn handle_input(app: &mut App, key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Enter => Action::Submit,
        KeyCode::Char(c) if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT => {
            app.push_char(c);
            Action::None
        }
        KeyCode::Backspace => {
            app.pop_char();
            Action::None
        }
        _ => Action::None,
    }
}

/// Handles keyboard input when the answer or history panel is focused.
///
/// Supports Vim-style scrolling (j/k) and arrow keys.
fn handle_panel(app: &mut App, key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('q') if key.modifiers.is_empty() => Action::Quit,
        KeyCode::Char('j') | KeyCode::Down => {
            app.scroll_down(1);
            Action::None
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.scroll_up(1);
            Action::None
        }
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(app: &mut App, code: KeyCode) -> Action {
        handle_key_event(app, KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn ctrl_c_quits_from_any_focus() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let mut app = App::new();
        for _ in 0..3 {
            assert_eq!(handle_key_event(&mut app, ctrl_c), Action::Quit);
            app.next_focus();
        }
    }

    #[test]
    fn q_is_typed_in_input_but_quits_elsewhere() {
        let mut app = App::new();
        assert_eq!(press(&mut app, KeyCode::Char('q')), Action::None);
        assert_eq!(app.input(), "q");

        app.next_focus();
        assert_eq!(press(&mut app, KeyCode::Char('q')), Action::Quit);

        app.next_focus();
        assert_eq!(press(&mut app, KeyCode::Char('q')), Action::Quit);
    }

    #[test]
    fn typing_and_backspace_edit_question() {
        let mut app = App::new();
        for c in "Range".chars() {
            let modifiers = if c.is_uppercase() {
                KeyModifiers::SHIFT
            } else {
                KeyModifiers::NONE
            };
            handle_key_event(&mut app, KeyEvent::new(KeyCode::Char(c), modifiers));
        }
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.input(), "Rang");
    }

    #[test]
    fn enter_submits_only_from_input() {
        let mut app = App::new();
        assert_eq!(press(&mut app, KeyCode::Enter), Action::Submit);

        app.next_focus();
        assert_eq!(press(&mut app, KeyCode::Enter), Action::None);
    }

    #[test]
    fn tab_key_cycles_focus() {
        let mut app = App::new();
        assert_eq!(press(&mut app, KeyCode::Tab), Action::None);
        assert_eq!(app.focus(), Focus::Answer);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus(), Focus::History);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus(), Focus::Input);
    }

    #[test]
    fn shift_tab_cycles_focus_backwards() {
        let mut app = App::new();
        let key = KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT);
        handle_key_event(&mut app, key);
        assert_eq!(app.focus(), Focus::History);
        handle_key_event(&mut app, key);
        assert_eq!(app.focus(), Focus::Answer);
    }

    #[test]
    fn esc_returns_to_input() {
        let mut app = App::new();
        app.next_focus();
        app.next_focus();
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.focus(), Focus::Input);
    }

    #[test]
    fn j_and_k_scroll_focused_panel() {
        let mut app = App::new();
        app.next_focus();
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Char('j'));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('k'));
        assert_eq!(app.answer_scroll(), 2);

        app.next_focus();
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.history_scroll(), 1);
    }

    #[test]
    fn j_in_input_is_just_a_character() {
        let mut app = App::new();
        press(&mut app, KeyCode::Char('j'));
        assert_eq!(app.input(), "j");
        assert_eq!(app.answer_scroll(), 0);
    }
}
