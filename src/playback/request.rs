//! Messages exchanged with the engine and I/O worker threads

use image::Rgba;

use super::error::{LoadFailure, RenderFailure};
use super::types::{CancelToken, Locator, PageSize, Rotation, SurfaceId};
use crate::deck::AnnouncementSlide;
use crate::sources::SourceError;

/// Unique identifier for render requests
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

impl RequestId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

/// Monotonic counter stamped on loads and deck checks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(pub u64);

impl Generation {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Parameters for painting one page
#[derive(Clone, Debug)]
pub struct RenderParams {
    pub page: usize,
    pub scale: f32,
    pub rotation: Option<Rotation>,
    pub background: Rgba<u8>,
}

/// Request sent to the engine thread
#[derive(Debug)]
pub enum EngineRequest {
    /// Fetch and decode a document, replacing the active one on success
    Load {
        generation: Generation,
        locator: Locator,
        cancel: CancelToken,
    },

    /// Paint a page of the active document
    Render {
        id: RequestId,
        generation: Generation,
        surface: SurfaceId,
        params: RenderParams,
        cancel: CancelToken,
    },

    /// Release the active document
    Close,

    /// Stop the engine thread
    Shutdown,
}

/// Reply from the engine thread
#[derive(Debug)]
pub enum EngineResponse {
    Loaded {
        generation: Generation,
        locator: Locator,
        /// Rotated intrinsic size of every page, index 0 = page 1
        page_sizes: Vec<PageSize>,
    },

    LoadFailed {
        generation: Generation,
        failure: LoadFailure,
    },

    LoadCancelled {
        generation: Generation,
    },

    Painted {
        id: RequestId,
        page: usize,
    },

    RenderCancelled(RequestId),

    RenderFailed {
        id: RequestId,
        failure: RenderFailure,
    },
}

/// Request sent to the I/O thread
#[derive(Debug)]
pub enum IoRequest {
    /// Ask the document source which locator is active
    ActiveLocator,

    /// Fetch the announcement deck for a transition check
    FetchDeck { generation: Generation },

    Shutdown,
}

/// Reply from the I/O thread
#[derive(Debug)]
pub enum IoResponse {
    ActiveLocator(Result<Option<Locator>, SourceError>),

    Deck {
        generation: Generation,
        slides: Result<Vec<AnnouncementSlide>, SourceError>,
    },
}
