pub mod shortcuts;

pub use shortcuts::{Action, GoToPrompt, PromptOutcome, ShortcutRouter, action_for};
