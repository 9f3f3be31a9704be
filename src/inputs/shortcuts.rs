//! Keyboard shortcuts and the go-to-page prompt

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// What a key press asks the player to do
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    NextPage,
    PrevPage,
    ToggleAutoplay,
    ToggleFullscreen,
    ToggleTvMode,
    ZoomIn,
    ZoomOut,
    CycleInterval,
    /// Focus the go-to-page prompt
    OpenGoTo,
    GoTo(usize),
    RefreshSource,
    Quit,
}

/// Map a key outside the prompt to its action
#[must_use]
pub fn action_for(key: &KeyEvent) -> Option<Action> {
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }
    let action = match key.code {
        KeyCode::Right | KeyCode::Char('d') => Action::NextPage,
        KeyCode::Left | KeyCode::Char('a') => Action::PrevPage,
        KeyCode::Char(' ' | 'p') => Action::ToggleAutoplay,
        KeyCode::Char('f') => Action::ToggleFullscreen,
        KeyCode::Char('t') => Action::ToggleTvMode,
        KeyCode::Char('+' | '=') => Action::ZoomIn,
        KeyCode::Char('-' | '_') => Action::ZoomOut,
        KeyCode::Char('i') => Action::CycleInterval,
        KeyCode::Char('g') => Action::OpenGoTo,
        KeyCode::Char('r') => Action::RefreshSource,
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        _ => return None,
    };
    Some(action)
}

/// Numeric text input for jumping to a page
#[derive(Debug, Default)]
pub struct GoToPrompt {
    buffer: String,
    focused: bool,
}

/// Result of feeding a key to the prompt
#[derive(Debug, PartialEq, Eq)]
pub enum PromptOutcome {
    Editing,
    Submit(usize),
    Dismissed,
}

const MAX_DIGITS: usize = 6;

impl GoToPrompt {
    pub fn focus(&mut self) {
        self.focused = true;
        self.buffer.clear();
    }

    #[must_use]
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn handle_key(&mut self, key: &KeyEvent) -> PromptOutcome {
        match key.code {
            KeyCode::Char(c) if c.is_ascii_digit() => {
                if self.buffer.len() < MAX_DIGITS {
                    self.buffer.push(c);
                }
                PromptOutcome::Editing
            }
            KeyCode::Backspace => {
                self.buffer.pop();
                PromptOutcome::Editing
            }
            KeyCode::Enter => {
                self.focused = false;
                match self.buffer.parse::<usize>() {
                    Ok(page) if page > 0 => PromptOutcome::Submit(page),
                    _ => PromptOutcome::Dismissed,
                }
            }
            KeyCode::Esc => {
                self.focused = false;
                PromptOutcome::Dismissed
            }
            _ => PromptOutcome::Editing,
        }
    }
}

/// Routes keys either to the focused prompt or to the shortcut map
#[derive(Debug, Default)]
pub struct ShortcutRouter {
    prompt: GoToPrompt,
}

impl ShortcutRouter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn prompt(&self) -> &GoToPrompt {
        &self.prompt
    }

    pub fn route(&mut self, key: &KeyEvent) -> Option<Action> {
        if key.kind != KeyEventKind::Press {
            return None;
        }

        if self.prompt.is_focused() {
            return match self.prompt.handle_key(key) {
                PromptOutcome::Submit(page) => Some(Action::GoTo(page)),
                PromptOutcome::Editing | PromptOutcome::Dismissed => None,
            };
        }

        let action = action_for(key)?;
        if action == Action::OpenGoTo {
            self.prompt.focus();
        }
        Some(action)
    }
}
