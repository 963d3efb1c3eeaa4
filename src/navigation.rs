//! View switching, reminder selection, and the key map.
//!
//! [`Navigation::action_for`] is the keyboard state machine: it turns a key
//! press into an [`Action`] given the active view, the selection, and how many
//! unresolved reminders exist. The application carries the action out.

use crate::message::View;

/// Held modifiers. `command` is Ctrl on Linux/Windows and Cmd on macOS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub command: bool,
    pub shift: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Escape,
    Enter,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyPress {
    pub fn new(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    /// An unmodified key.
    pub fn plain(key: Key) -> Self {
        Self::new(key, Modifiers::default())
    }

    /// A character with the command modifier held.
    pub fn command(c: char) -> Self {
        Self::new(
            Key::Char(c),
            Modifiers {
                command: true,
                shift: c.is_ascii_uppercase(),
            },
        )
    }

    /// Parse a chord such as `ctrl+shift+r`, `cmd+h`, `j`, `esc` or `enter`.
    pub fn parse(chord: &str) -> Option<Self> {
        let mut modifiers = Modifiers::default();
        let mut key = None;
        for part in chord.trim().split('+') {
            let part = part.trim();
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" | "cmd" | "command" | "super" => modifiers.command = true,
                "shift" => modifiers.shift = true,
                "esc" | "escape" => key = Some(Key::Escape),
                "enter" | "return" => key = Some(Key::Enter),
                _ => {
                    let mut chars = part.chars();
                    match (chars.next(), chars.next()) {
                        (Some(c), None) => {
                            if c.is_ascii_uppercase() {
                                modifiers.shift = true;
                            }
                            key = Some(Key::Char(c));
                        }
                        _ => return None,
                    }
                }
            }
        }
        key.map(|key| Self { key, modifiers })
    }

    /// Lowercased character, if this press is a character key.
    fn letter(&self) -> Option<char> {
        match self.key {
            Key::Char(c) => Some(c.to_ascii_lowercase()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Reload,
    SwitchView(View),
    SelectFirst,
    SelectNext,
    SelectPrevious,
    ResolveSelected,
    ClearSelection,
    SaveNow,
}

/// Where input focus belongs after the latest state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    /// The note editor, caret at `caret` (a char offset).
    NoteEditor { caret: usize },
    /// The highlighted unresolved reminder on the today view.
    Reminder(usize),
    /// The body of a non-editing view.
    View(View),
}

#[derive(Debug, Default)]
pub struct Navigation {
    view: View,
    selection: Option<usize>,
}

impl Navigation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn action_for(&self, press: &KeyPress, unresolved_len: usize) -> Option<Action> {
        let on_today = self.view == View::Today;

        if press.modifiers.command {
            return match press.letter()? {
                'r' if press.modifiers.shift => Some(Action::Reload),
                't' => Some(Action::SwitchView(View::Today)),
                'h' => Some(Action::SwitchView(View::History)),
                'l' => Some(Action::SwitchView(View::AiLogs)),
                'r' => {
                    if on_today && self.selection.is_none() && unresolved_len > 0 {
                        Some(Action::SelectFirst)
                    } else {
                        Some(Action::SwitchView(View::Reminders))
                    }
                }
                _ => None,
            };
        }

        if !on_today {
            return None;
        }

        if self.selection.is_some() {
            return match press.key {
                Key::Escape => Some(Action::ClearSelection),
                Key::Char(_) => match press.letter()? {
                    'j' => Some(Action::SelectNext),
                    'k' => Some(Action::SelectPrevious),
                    'r' => Some(Action::ResolveSelected),
                    _ => None,
                },
                _ => None,
            };
        }

        match press.key {
            Key::Enter if !press.modifiers.shift => Some(Action::SaveNow),
            _ => None,
        }
    }

    /// Change view. Selection never survives a switch.
    pub fn set_view(&mut self, view: View) {
        self.selection = None;
        self.view = view;
    }

    /// Select `index` on the today view, clamped into `0..len`.
    pub fn select(&mut self, index: Option<usize>, len: usize) {
        self.selection = match index {
            Some(i) if self.view == View::Today && len > 0 => Some(i.min(len - 1)),
            _ => None,
        };
    }

    pub fn select_next(&mut self, len: usize) {
        if let Some(i) = self.selection {
            self.select(Some(i + 1), len);
        }
    }

    pub fn select_previous(&mut self, len: usize) {
        if let Some(i) = self.selection {
            self.select(Some(i.saturating_sub(1)), len);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Keep the selection valid after the unresolved list changed length.
    pub fn reclamp(&mut self, len: usize) {
        self.select(self.selection, len);
    }

    pub fn focus(&self, note_text: &str) -> Focus {
        match (self.view, self.selection) {
            (View::Today, Some(i)) => Focus::Reminder(i),
            (View::Today, None) => Focus::NoteEditor {
                caret: note_text.chars().count(),
            },
            (view, _) => Focus::View(view),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selected(index: usize) -> Navigation {
        let mut nav = Navigation::new();
        nav.select(Some(index), 10);
        nav
    }

    fn key(c: char) -> KeyPress {
        KeyPress::plain(Key::Char(c))
    }

    #[test]
    fn parse_chords() {
        assert_eq!(KeyPress::parse("ctrl+h"), Some(KeyPress::command('h')));
        assert_eq!(
            KeyPress::parse("cmd+shift+r"),
            Some(KeyPress::new(
                Key::Char('r'),
                Modifiers {
                    command: true,
                    shift: true
                }
            ))
        );
        assert_eq!(KeyPress::parse("esc"), Some(KeyPress::plain(Key::Escape)));
        assert_eq!(KeyPress::parse("j"), Some(key('j')));
        assert_eq!(KeyPress::parse("ctrl+ab"), None);
        assert_eq!(KeyPress::parse("ctrl"), None);
    }

    #[test]
    fn global_shortcuts_need_command() {
        let nav = Navigation::new();
        assert_eq!(
            nav.action_for(&KeyPress::command('h'), 0),
            Some(Action::SwitchView(View::History))
        );
        assert_eq!(
            nav.action_for(&KeyPress::command('l'), 0),
            Some(Action::SwitchView(View::AiLogs))
        );
        assert_eq!(
            nav.action_for(&KeyPress::command('t'), 0),
            Some(Action::SwitchView(View::Today))
        );
        assert_eq!(nav.action_for(&KeyPress::command('R'), 0), Some(Action::Reload));
        assert_eq!(nav.action_for(&key('h'), 0), None);
    }

    #[test]
    fn command_r_depends_on_selection_and_list() {
        let nav = Navigation::new();
        assert_eq!(nav.action_for(&KeyPress::command('r'), 2), Some(Action::SelectFirst));
        assert_eq!(
            nav.action_for(&KeyPress::command('r'), 0),
            Some(Action::SwitchView(View::Reminders))
        );
        assert_eq!(
            selected(0).action_for(&KeyPress::command('r'), 2),
            Some(Action::SwitchView(View::Reminders))
        );

        let mut elsewhere = Navigation::new();
        elsewhere.set_view(View::History);
        assert_eq!(
            elsewhere.action_for(&KeyPress::command('r'), 2),
            Some(Action::SwitchView(View::Reminders))
        );
    }

    #[test]
    fn list_keys_only_with_selection() {
        let idle = Navigation::new();
        assert_eq!(idle.action_for(&key('j'), 3), None);
        assert_eq!(idle.action_for(&key('r'), 3), None);
        assert_eq!(idle.action_for(&KeyPress::plain(Key::Escape), 3), None);

        let nav = selected(1);
        assert_eq!(nav.action_for(&key('j'), 3), Some(Action::SelectNext));
        assert_eq!(nav.action_for(&key('k'), 3), Some(Action::SelectPrevious));
        assert_eq!(nav.action_for(&key('r'), 3), Some(Action::ResolveSelected));
        assert_eq!(
            nav.action_for(&KeyPress::plain(Key::Escape), 3),
            Some(Action::ClearSelection)
        );
        assert_eq!(nav.action_for(&key('x'), 3), None);
    }

    #[test]
    fn enter_saves_only_from_the_editor() {
        let idle = Navigation::new();
        assert_eq!(idle.action_for(&KeyPress::plain(Key::Enter), 0), Some(Action::SaveNow));
        assert_eq!(selected(0).action_for(&KeyPress::plain(Key::Enter), 1), None);

        let mut history = Navigation::new();
        history.set_view(View::History);
        assert_eq!(history.action_for(&KeyPress::plain(Key::Enter), 0), None);
    }

    #[test]
    fn selection_clamps_without_wraparound() {
        let mut nav = selected(0);
        nav.select_previous(3);
        assert_eq!(nav.selection(), Some(0));
        nav.select_next(3);
        nav.select_next(3);
        nav.select_next(3);
        assert_eq!(nav.selection(), Some(2));
    }

    #[test]
    fn reclamp_shrinks_or_clears() {
        let mut nav = selected(4);
        nav.reclamp(3);
        assert_eq!(nav.selection(), Some(2));
        nav.reclamp(0);
        assert_eq!(nav.selection(), None);
    }

    #[test]
    fn switching_view_clears_selection() {
        let mut nav = selected(2);
        nav.set_view(View::Reminders);
        assert_eq!(nav.selection(), None);
        nav.select(Some(0), 5);
        assert_eq!(nav.selection(), None);
    }

    #[test]
    fn focus_follows_view_and_selection() {
        let mut nav = Navigation::new();
        assert_eq!(nav.focus("héllo"), Focus::NoteEditor { caret: 5 });
        nav.select(Some(1), 3);
        assert_eq!(nav.focus("héllo"), Focus::Reminder(1));
        nav.set_view(View::AiLogs);
        assert_eq!(nav.focus("héllo"), Focus::View(View::AiLogs));
    }
}
