use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::inputs::GoToPrompt;
use crate::notification::{Notification, NotificationLevel};
use crate::playback::{TvPhase, ViewerState};

const HINTS: &str = "←/→ page  space autoplay  t TV  i interval  g go to  q quit";

/// One-row chrome: prompt, notification or hints on the left, playback
/// status on the right
pub struct StatusBar<'a> {
    state: &'a ViewerState,
    phase: &'a TvPhase,
    prompt: &'a GoToPrompt,
    notification: Option<&'a Notification>,
}

impl<'a> StatusBar<'a> {
    pub fn new(state: &'a ViewerState, phase: &'a TvPhase, prompt: &'a GoToPrompt) -> Self {
        Self {
            state,
            phase,
            prompt,
            notification: None,
        }
    }

    pub fn notification(mut self, notification: Option<&'a Notification>) -> Self {
        self.notification = notification;
        self
    }

    fn left(&self) -> Line<'a> {
        if self.prompt.is_focused() {
            return Line::from(vec![
                Span::styled(
                    " Go to page: ",
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Span::raw(self.prompt.text().to_string()),
                Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            ]);
        }
        if let Some(n) = self.notification {
            let style = match n.level {
                NotificationLevel::Info => Style::default().fg(Color::Black).bg(Color::Cyan),
                NotificationLevel::Warning => Style::default().fg(Color::Black).bg(Color::Yellow),
                NotificationLevel::Error => Style::default().fg(Color::White).bg(Color::Red),
            };
            return Line::from(Span::styled(format!(" {} ", n.message), style));
        }
        Line::from(Span::styled(
            format!(" {HINTS}"),
            Style::default().fg(Color::DarkGray),
        ))
    }

    fn right(&self) -> Line<'static> {
        let state = self.state;
        let mut parts = Vec::new();

        if state.is_loading {
            parts.push("Loading...".to_string());
        } else if state.has_document() {
            parts.push(format!(
                "Page {} / {}",
                state.current_page, state.total_pages
            ));
        } else {
            parts.push("No document".to_string());
        }

        let secs = state.autoplay_interval_ms / 1000;
        if state.autoplay_enabled {
            parts.push(format!("▶ {secs}s"));
        } else {
            parts.push(format!("‖ {secs}s"));
        }

        if state.tv_mode_enabled {
            match self.phase {
                TvPhase::Document => parts.push("TV".to_string()),
                TvPhase::Board(cursor) => parts.push(format!(
                    "TV · Board {}/{}",
                    cursor.index + 1,
                    cursor.deck.len()
                )),
            }
        }

        Line::from(format!("{} ", parts.join(" │ ")))
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        buf.set_style(area, Style::default().bg(Color::Rgb(30, 30, 30)).fg(Color::Gray));
        let right = self.right();
        let right_width = u16::try_from(right.width()).unwrap_or(u16::MAX);
        let [left_area, right_area] =
            Layout::horizontal([Constraint::Min(0), Constraint::Length(right_width)]).areas(area);
        Paragraph::new(self.left()).render(left_area, buf);
        Paragraph::new(right).render(right_area, buf);
    }
}
