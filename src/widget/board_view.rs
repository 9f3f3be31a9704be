use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};

use crate::deck::{AnnouncementSlide, LogoPlacement, VerticalAlign};

const LOGO: &str = "[ LOGO ]";

/// Full-area rendering of one announcement slide
pub struct BoardView<'a> {
    slide: &'a AnnouncementSlide,
    position: Option<(usize, usize)>,
}

impl<'a> BoardView<'a> {
    pub fn new(slide: &'a AnnouncementSlide) -> Self {
        Self {
            slide,
            position: None,
        }
    }

    /// Show "index / total" in the corner opposite the logo
    pub fn position(mut self, index: usize, total: usize) -> Self {
        self.position = Some((index, total));
        self
    }

    fn lines(&self) -> Vec<Line<'static>> {
        let mut lines = vec![
            Line::from(Span::styled(
                self.slide.display_title(),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        lines.extend(self.slide.body_lines().into_iter().map(Line::from));
        lines
    }
}

impl Widget for BoardView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        buf.set_style(area, Style::default().bg(Color::Black).fg(Color::White));

        let lines = self.lines();
        let height = u16::try_from(lines.len()).unwrap_or(u16::MAX).min(area.height);
        let top = match self.slide.content.layout.align {
            VerticalAlign::Top => area.y + u16::from(area.height > height),
            VerticalAlign::Center => area.y + (area.height - height) / 2,
            VerticalAlign::Bottom => {
                area.y + area.height.saturating_sub(height.saturating_add(1))
            }
        };
        let body_area = Rect::new(area.x, top, area.width, height);
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(body_area, buf);

        let logo = self.slide.content.layout.logo;
        if let Some(corner) = corner_rect(area, logo, LOGO.len() as u16) {
            Paragraph::new(Span::styled(
                LOGO,
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ))
            .render(corner, buf);
        }

        if let Some((index, total)) = self.position {
            let label = format!("{} / {}", index + 1, total);
            let width = label.len() as u16;
            let opposite = match logo {
                LogoPlacement::BottomRight => LogoPlacement::BottomLeft,
                _ => LogoPlacement::BottomRight,
            };
            if let Some(corner) = corner_rect(area, opposite, width) {
                Paragraph::new(Span::styled(label, Style::default().fg(Color::DarkGray)))
                    .render(corner, buf);
            }
        }
    }
}

fn corner_rect(area: Rect, placement: LogoPlacement, width: u16) -> Option<Rect> {
    if area.width < width || area.height == 0 {
        return None;
    }
    let left = area.x;
    let right = area.x + area.width - width;
    let top = area.y;
    let bottom = area.y + area.height - 1;
    let (x, y) = match placement {
        LogoPlacement::None => return None,
        LogoPlacement::TopLeft => (left, top),
        LogoPlacement::TopRight => (right, top),
        LogoPlacement::BottomLeft => (left, bottom),
        LogoPlacement::BottomRight => (right, bottom),
    };
    Some(Rect::new(x, y, width, 1))
}
