//! Drawable surface the render engine paints into

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use image::{Rgba, RgbaImage};

use super::types::SurfaceId;

/// Affine transform `[a, b, c, d, e, f]` applied when drawing rasters
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform(pub [f32; 6]);

impl Transform {
    pub const IDENTITY: Self = Self([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    #[must_use]
    pub fn translate(x: f32, y: f32) -> Self {
        Self([1.0, 0.0, 0.0, 1.0, x, y])
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    fn offset(&self) -> (i64, i64) {
        (self.0[4].round() as i64, self.0[5].round() as i64)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Operations the render engine needs from a 2D drawing target
pub trait Surface {
    fn id(&self) -> SurfaceId;

    /// Resize the backing buffer and the displayed size together
    fn set_size(&mut self, width: u32, height: u32);

    fn size(&self) -> (u32, u32);

    fn reset_transform(&mut self);

    fn fill(&mut self, color: Rgba<u8>);

    /// Draw a raster at the origin under the current transform
    fn draw_raster(&mut self, raster: &RgbaImage);
}

/// What the surface currently shows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfaceContent {
    Blank,
    /// Background painted, page content not (yet) drawn
    Background { page: usize },
    Page { page: usize },
}

/// In-memory RGBA surface
#[derive(Debug)]
pub struct RasterSurface {
    id: SurfaceId,
    pixels: RgbaImage,
    display_size: (u32, u32),
    transform: Transform,
    content: SurfaceContent,
    /// Bumped on every mutation so readers can skip redundant redraws
    revision: u64,
}

impl RasterSurface {
    #[must_use]
    pub fn new(id: SurfaceId) -> Self {
        Self {
            id,
            pixels: RgbaImage::new(0, 0),
            display_size: (0, 0),
            transform: Transform::IDENTITY,
            content: SurfaceContent::Blank,
            revision: 0,
        }
    }

    #[must_use]
    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    #[must_use]
    pub fn display_size(&self) -> (u32, u32) {
        self.display_size
    }

    #[must_use]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    #[must_use]
    pub fn content(&self) -> SurfaceContent {
        self.content
    }

    pub(crate) fn set_content(&mut self, content: SurfaceContent) {
        self.content = content;
        self.revision += 1;
    }

    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Drop all content, e.g. when the active document goes away
    pub fn clear(&mut self) {
        self.pixels = RgbaImage::new(0, 0);
        self.display_size = (0, 0);
        self.transform = Transform::IDENTITY;
        self.set_content(SurfaceContent::Blank);
    }
}

impl Surface for RasterSurface {
    fn id(&self) -> SurfaceId {
        self.id
    }

    fn set_size(&mut self, width: u32, height: u32) {
        if self.pixels.dimensions() != (width, height) {
            self.pixels = RgbaImage::new(width, height);
        }
        self.display_size = (width, height);
        self.revision += 1;
    }

    fn size(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    fn reset_transform(&mut self) {
        self.transform = Transform::IDENTITY;
    }

    fn fill(&mut self, color: Rgba<u8>) {
        for px in self.pixels.pixels_mut() {
            *px = color;
        }
        self.revision += 1;
    }

    fn draw_raster(&mut self, raster: &RgbaImage) {
        let (dx, dy) = self.transform.offset();
        image::imageops::replace(&mut self.pixels, raster, dx, dy);
        self.revision += 1;
    }
}

/// Surface shared between the engine thread (writer) and the UI (reader)
#[derive(Clone, Debug)]
pub struct SharedSurface(Arc<Mutex<RasterSurface>>);

impl SharedSurface {
    #[must_use]
    pub fn new(id: SurfaceId) -> Self {
        Self(Arc::new(Mutex::new(RasterSurface::new(id))))
    }

    /// Lock the surface, recovering from a poisoned lock
    pub fn lock(&self) -> MutexGuard<'_, RasterSurface> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn id(&self) -> SurfaceId {
        self.lock().id()
    }
}

/// Parse `#rrggbb` into an opaque colour
#[must_use]
pub fn parse_hex_color(hex: &str) -> Option<Rgba<u8>> {
    let digits = hex.trim().strip_prefix('#')?;
    if digits.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(digits, 16).ok()?;
    Some(Rgba([
        ((value >> 16) & 0xFF) as u8,
        ((value >> 8) & 0xFF) as u8,
        (value & 0xFF) as u8,
        0xFF,
    ]))
}
