//! Failure taxonomy of the playback pipeline
//!
//! None of these are fatal: the orchestrator recovers from each locally and
//! keeps the show running.

use super::types::Locator;

/// Why a document could not be loaded
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadFailureKind {
    /// The bytes could not be fetched (transport error, timeout, bad status)
    Network,
    /// A local file is missing or unreadable
    Missing,
    /// The bytes were fetched but are not a usable document
    Decode,
    /// The document decoded to zero pages
    Empty,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("could not load {locator}: {detail}")]
pub struct LoadFailure {
    pub locator: Locator,
    pub kind: LoadFailureKind,
    pub detail: String,
}

impl LoadFailure {
    pub fn new(locator: Locator, kind: LoadFailureKind, detail: impl Into<String>) -> Self {
        Self {
            locator,
            kind,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn is_network(&self) -> bool {
        self.kind == LoadFailureKind::Network
    }
}

/// Page decode or paint error not caused by cancellation
#[derive(Debug, Clone, thiserror::Error)]
#[error("page {page}: {detail}")]
pub struct RenderFailure {
    pub page: usize,
    pub detail: String,
}

/// Errors raised by document backends while decoding or painting
#[derive(Debug, thiserror::Error)]
pub enum DocumentFault {
    #[cfg(feature = "pdf")]
    #[error("PDF engine: {0}")]
    Pdf(#[from] mupdf::error::Error),

    #[error("page {0} is out of range")]
    PageOutOfRange(usize),

    #[error("{detail}")]
    Generic { detail: String },
}

impl DocumentFault {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic { detail: msg.into() }
    }
}

/// Errors raised while fetching document bytes
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server answered {status} for {locator}")]
    Status { locator: Locator, status: u16 },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("no document at {0}")]
    NotFound(Locator),
}

impl FetchError {
    /// Only transport and server failures may clear up on their own
    #[must_use]
    pub fn failure_kind(&self) -> LoadFailureKind {
        match self {
            Self::Http(_) | Self::Status { .. } => LoadFailureKind::Network,
            Self::Io(_) | Self::NotFound(_) => LoadFailureKind::Missing,
        }
    }
}

/// The host environment refused to go fullscreen
#[derive(Debug, Clone, thiserror::Error)]
#[error("fullscreen denied: {reason}")]
pub struct FullscreenDenied {
    pub reason: String,
}

impl FullscreenDenied {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}
