use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Paragraph, Widget},
};

use crate::playback::{RasterSurface, SurfaceContent};

/// Nominal terminal cell size in device pixels
pub const CELL_PX_WIDTH: u32 = 8;
pub const CELL_PX_HEIGHT: u32 = 16;

/// Each cell shows two stacked square subpixels
const SUBPIXEL: u32 = CELL_PX_HEIGHT / 2;

const UPPER_HALF: &str = "▀";

pub const PLACEHOLDER_TEXT: &str = "Waiting for a document";
pub const LOADING_TEXT: &str = "Loading document...";

/// Draws the page surface with half-block cells, centered in the area.
///
/// Pixels outside the area are cropped; cells without pixels get the
/// background colour.
pub struct PageView<'a> {
    surface: &'a RasterSurface,
    background: Color,
    loading: bool,
}

impl<'a> PageView<'a> {
    pub fn new(surface: &'a RasterSurface, background: Color) -> Self {
        Self {
            surface,
            background,
            loading: false,
        }
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = loading;
        self
    }
}

impl Widget for PageView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }

        if self.surface.content() == SurfaceContent::Blank {
            let text = if self.loading {
                LOADING_TEXT
            } else {
                PLACEHOLDER_TEXT
            };
            render_message(text, area, buf);
            return;
        }

        let Some(cells) = downsample(self.surface.pixels()) else {
            buf.set_style(area, Style::default().bg(self.background));
            return;
        };

        let grid_height = u32::from(area.height) * 2;
        let offset_x = (i64::from(area.width) - i64::from(cells.width())) / 2;
        let offset_y = (i64::from(grid_height) - i64::from(cells.height())) / 2;

        let sample = |x: i64, y: i64| -> Color {
            if x < 0 || y < 0 {
                return self.background;
            }
            let (x, y) = (x as u32, y as u32);
            if x >= cells.width() || y >= cells.height() {
                return self.background;
            }
            to_color(*cells.get_pixel(x, y))
        };

        for row in 0..area.height {
            for col in 0..area.width {
                let x = i64::from(col) - offset_x;
                let top = i64::from(row) * 2 - offset_y;
                let fg = sample(x, top);
                let bg = sample(x, top + 1);
                buf[(area.x + col, area.y + row)]
                    .set_symbol(UPPER_HALF)
                    .set_fg(fg)
                    .set_bg(bg);
            }
        }
    }
}

/// One pixel per subpixel of the surface raster
fn downsample(pixels: &RgbaImage) -> Option<RgbaImage> {
    let (width, height) = pixels.dimensions();
    if width == 0 || height == 0 {
        return None;
    }
    let cols = width.div_ceil(CELL_PX_WIDTH).max(1);
    let rows = height.div_ceil(SUBPIXEL).max(1);
    Some(imageops::resize(pixels, cols, rows, FilterType::Triangle))
}

fn to_color(px: Rgba<u8>) -> Color {
    Color::Rgb(px[0], px[1], px[2])
}

fn render_message(text: &str, area: Rect, buf: &mut Buffer) {
    let top = area.y + area.height / 2;
    let line_area = Rect::new(area.x, top, area.width, 1);
    Paragraph::new(Line::from(text))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray))
        .render(line_area, buf);
}
