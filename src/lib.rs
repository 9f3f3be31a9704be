pub mod deck;
pub mod event_source;
pub mod inputs;
pub mod main_app;
pub mod motd;
pub mod notification;
pub mod panic_handler;
pub mod playback;
pub mod settings;
pub mod sources;
pub mod widget;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use main_app::{App, TerminalViewport, run_app_with_event_source};
