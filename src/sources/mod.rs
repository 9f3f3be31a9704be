//! Collaborators that know which document is active and store the
//! announcement deck. The player only talks to the traits; the binary picks
//! an implementation from the settings.

use std::path::Path;

use thiserror::Error;

use crate::deck::AnnouncementSlide;
use crate::playback::Locator;

pub mod http;
pub mod local;

pub use http::{HttpDeckSource, HttpDocumentSource};
pub use local::{FileDeckStore, LocalDocumentSource};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} answered {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Rejected(String),
}

/// Knows which document the display should show
pub trait DocumentSource: Send {
    /// Locator of the active document, `None` when nothing is published
    fn active_locator(&self) -> Result<Option<Locator>, SourceError>;

    /// Publish a local file and make it the active document
    fn upload(&self, path: &Path) -> Result<Locator, SourceError>;

    /// Remove a published document; returns whether something was removed
    fn clear(&self, locator: &Locator) -> Result<bool, SourceError>;
}

/// Ordered store of announcement slides
pub trait DeckSource: Send {
    /// Every slide, hidden ones included, in deck order
    fn fetch_slides(&self) -> Result<Vec<AnnouncementSlide>, SourceError>;

    /// Overwrite the whole deck
    fn replace(&self, slides: &[AnnouncementSlide]) -> Result<(), SourceError>;
}
