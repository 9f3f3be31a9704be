//! Fit-to-viewport scale computation and manual zoom stepping
//!
//! The contain scale is the largest factor that shows the whole page inside
//! the viewport box, clamped to a mode-dependent range.

use super::types::{PageSize, ViewportBox};

/// Scale returned for degenerate inputs
pub const NEUTRAL_SCALE: f32 = 1.0;

/// Upper zoom bound shared by every mode
pub const MAX_SCALE: f32 = 3.0;

/// Allowed scale range
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaleBounds {
    pub min: f32,
    pub max: f32,
}

impl ScaleBounds {
    #[must_use]
    pub fn clamp(self, scale: f32) -> f32 {
        if scale.is_finite() {
            scale.clamp(self.min, self.max)
        } else {
            NEUTRAL_SCALE
        }
    }

    #[must_use]
    pub fn contains(self, scale: f32) -> bool {
        scale >= self.min && scale <= self.max
    }
}

/// Padding and bounds used when fitting a page for a given display mode
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScalePolicy {
    /// Subtracted from each viewport dimension
    pub padding: f32,
    pub bounds: ScaleBounds,
}

impl ScalePolicy {
    /// Edge-to-edge TV display
    #[must_use]
    pub const fn tv() -> Self {
        Self {
            padding: 0.0,
            bounds: ScaleBounds {
                min: 0.25,
                max: MAX_SCALE,
            },
        }
    }

    /// Interactive mode, two 16px insets per axis
    #[must_use]
    pub const fn windowed() -> Self {
        Self {
            padding: 32.0,
            bounds: ScaleBounds {
                min: 0.5,
                max: MAX_SCALE,
            },
        }
    }

    #[must_use]
    pub const fn for_mode(tv_mode: bool) -> Self {
        if tv_mode { Self::tv() } else { Self::windowed() }
    }

    #[must_use]
    pub fn contain_scale(self, page: PageSize, viewport: ViewportBox) -> f32 {
        compute_contain_scale(page, viewport, self.padding, self.bounds)
    }
}

/// Compute the clamped "contain" scale of `page` inside `viewport`
#[must_use]
pub fn compute_contain_scale(
    page: PageSize,
    viewport: ViewportBox,
    padding: f32,
    bounds: ScaleBounds,
) -> f32 {
    let available_width = viewport.width - padding;
    let available_height = viewport.height - padding;
    if !(available_width > 0.0 && available_height > 0.0) || !page.is_usable() {
        return NEUTRAL_SCALE;
    }

    let scale_x = available_width / page.width;
    let scale_y = available_height / page.height;
    bounds.clamp(scale_x.min(scale_y))
}

/// Manual zoom stepping used by the keyboard shortcuts
pub struct Zoom;

impl Zoom {
    /// Additive step per key press
    pub const STEP: f32 = 0.1;
    /// Manual zoom never goes below the windowed minimum
    pub const BOUNDS: ScaleBounds = ScalePolicy::windowed().bounds;

    #[must_use]
    pub fn step_in(scale: f32) -> f32 {
        Self::BOUNDS.clamp(Self::sanitize(scale) + Self::STEP)
    }

    #[must_use]
    pub fn step_out(scale: f32) -> f32 {
        Self::BOUNDS.clamp(Self::sanitize(scale) - Self::STEP)
    }

    fn sanitize(scale: f32) -> f32 {
        if scale.is_finite() { scale } else { NEUTRAL_SCALE }
    }
}
