//! Playback pipeline: document loading, page rendering, fit scaling,
//! autoplay and the TV-mode cycle

pub mod autoplay;
pub mod board;
pub mod document;
pub mod error;
pub mod fit;
pub mod loader;
pub mod orchestrator;
mod render;
mod request;
pub mod state;
pub mod surface;
pub mod tv;
pub mod types;
mod worker;

pub use autoplay::{AutoplayTimer, Deadline};
pub use document::{DocumentDecoder, DocumentFetcher, DocumentHandle, LocatorFetcher, PageHandle};
#[cfg(feature = "pdf")]
pub use document::PdfDecoder;
pub use error::{
    DocumentFault, FetchError, FullscreenDenied, LoadFailure, LoadFailureKind, RenderFailure,
};
pub use fit::{ScaleBounds, ScalePolicy, Zoom, compute_contain_scale};
pub use orchestrator::{
    Collaborators, Orchestrator, PAGE_SURFACE, PlayerConfig, PlayerEvent, Viewport,
};
pub use render::{RenderScheduler, RenderTask, paint_page};
pub use request::{Generation, RenderParams, RequestId};
pub use state::{Command, Effect, ViewerState};
pub use surface::{RasterSurface, SharedSurface, Surface, SurfaceContent, parse_hex_color};
pub use tv::{BoardCursor, IdleTracker, TvPhase};
pub use types::*;
