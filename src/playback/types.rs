//! Core value types shared by the playback pipeline

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Intrinsic page size in document units at scale 1
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Size after applying a page rotation
    #[must_use]
    pub fn rotated(self, rotation: Rotation) -> Self {
        if rotation.is_quarter_turn() {
            Self::new(self.height, self.width)
        } else {
            self
        }
    }

    pub(crate) fn is_usable(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// Measurable box of the display container, in pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ViewportBox {
    pub width: f32,
    pub height: f32,
}

impl ViewportBox {
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Page rotation in clockwise quarter turns
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Rotation {
    #[default]
    None,
    Cw90,
    Cw180,
    Cw270,
}

impl Rotation {
    /// Normalize an arbitrary degree value to the nearest quarter turn
    #[must_use]
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            45..=134 => Self::Cw90,
            135..=224 => Self::Cw180,
            225..=314 => Self::Cw270,
            _ => Self::None,
        }
    }

    #[must_use]
    pub const fn degrees(self) -> u16 {
        match self {
            Self::None => 0,
            Self::Cw90 => 90,
            Self::Cw180 => 180,
            Self::Cw270 => 270,
        }
    }

    #[must_use]
    pub const fn is_quarter_turn(self) -> bool {
        matches!(self, Self::Cw90 | Self::Cw270)
    }
}

/// Output geometry of a page rendered at a given scale and rotation
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageViewport {
    pub scale: f32,
    pub rotation: Rotation,
    /// Output width in pixels
    pub width: u32,
    /// Output height in pixels
    pub height: u32,
}

impl PageViewport {
    #[must_use]
    pub fn compute(intrinsic: PageSize, scale: f32, rotation: Rotation) -> Self {
        let size = intrinsic.rotated(rotation);
        Self {
            scale,
            rotation,
            width: (size.width * scale).round().max(1.0) as u32,
            height: (size.height * scale).round().max(1.0) as u32,
        }
    }
}

/// Opaque reference to where a document's bytes live
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    /// Trimmed locator, or `None` when the input is blank
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_remote(&self) -> bool {
        self.0.starts_with("http://") || self.0.starts_with("https://")
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one drawable surface
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceId(pub u32);

/// Cooperative cancellation flag shared between the orchestrator and a worker
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; idempotent
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Tagged result of a cancellable operation
#[derive(Debug)]
pub enum RenderOutcome<T, E> {
    Done(T),
    Cancelled,
    Failed(E),
}

impl<T, E> RenderOutcome<T, E> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Allowed autoplay intervals, in milliseconds
pub const AUTOPLAY_INTERVALS_MS: [u64; 5] = [5_000, 8_000, 10_000, 15_000, 20_000];

/// Default autoplay interval
pub const DEFAULT_AUTOPLAY_INTERVAL_MS: u64 = 8_000;

/// Snap an arbitrary interval to the closest allowed value
#[must_use]
pub fn snap_interval_ms(ms: u64) -> u64 {
    AUTOPLAY_INTERVALS_MS
        .iter()
        .copied()
        .min_by_key(|allowed| allowed.abs_diff(ms))
        .unwrap_or(DEFAULT_AUTOPLAY_INTERVAL_MS)
}

/// The interval following `ms` in the allowed set, wrapping around
#[must_use]
pub fn next_interval_ms(ms: u64) -> u64 {
    let current = snap_interval_ms(ms);
    let idx = AUTOPLAY_INTERVALS_MS
        .iter()
        .position(|&v| v == current)
        .unwrap_or(0);
    AUTOPLAY_INTERVALS_MS[(idx + 1) % AUTOPLAY_INTERVALS_MS.len()]
}
