//! TV-mode pieces: the content phase and idle chrome hiding

use std::time::{Duration, Instant};

use crate::deck::{AnnouncementDeck, AnnouncementSlide};

/// Position within a deck snapshot during the board phase
#[derive(Clone, Debug, PartialEq)]
pub struct BoardCursor {
    pub deck: AnnouncementDeck,
    pub index: usize,
}

impl BoardCursor {
    /// Cursor at the first slide, `None` for an empty deck
    #[must_use]
    pub fn start(deck: AnnouncementDeck) -> Option<Self> {
        if deck.is_empty() {
            None
        } else {
            Some(Self { deck, index: 0 })
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&AnnouncementSlide> {
        self.deck.get(self.index)
    }

    /// Step to the next slide. Returns false at the last one.
    pub fn advance(&mut self) -> bool {
        if self.index + 1 < self.deck.len() {
            self.index += 1;
            true
        } else {
            false
        }
    }
}

/// Which content TV mode is showing
#[derive(Clone, Debug, Default, PartialEq)]
pub enum TvPhase {
    #[default]
    Document,
    Board(BoardCursor),
}

impl TvPhase {
    #[must_use]
    pub fn is_board(&self) -> bool {
        matches!(self, Self::Board(_))
    }

    #[must_use]
    pub fn slide(&self) -> Option<&AnnouncementSlide> {
        match self {
            Self::Document => None,
            Self::Board(cursor) => cursor.current(),
        }
    }
}

/// Hides the chrome after a period without activity.
///
/// Activity while the pointer rests on a protected region (the status bar)
/// keeps the chrome up until the pointer leaves.
#[derive(Clone, Debug)]
pub struct IdleTracker {
    timeout: Duration,
    enabled: bool,
    protected: bool,
    deadline: Option<Instant>,
}

impl IdleTracker {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            enabled: false,
            protected: false,
            deadline: None,
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.enabled = true;
        self.protected = false;
        self.deadline = Some(now + self.timeout);
    }

    pub fn stop(&mut self) {
        self.enabled = false;
        self.protected = false;
        self.deadline = None;
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Any input: restart the countdown unless the pointer is protected
    pub fn activity(&mut self, now: Instant) {
        if !self.enabled {
            return;
        }
        self.deadline = if self.protected {
            None
        } else {
            Some(now + self.timeout)
        };
    }

    /// Pointer moved; `over_protected` tells whether it now rests on chrome
    pub fn pointer_at(&mut self, now: Instant, over_protected: bool) {
        self.protected = over_protected;
        self.activity(now);
    }

    /// Returns true once when the chrome should be hidden
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if self.enabled && now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}
