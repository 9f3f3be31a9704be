//! Deck checks made at phase boundaries and what to do with their result

use super::request::Generation;
use super::tv::BoardCursor;
use crate::deck::AnnouncementDeck;

/// Why a deck check was issued
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeckCheckReason {
    /// Autoplay ran past the last page, or there is no document
    DocumentEnd,
    /// The board ran past its last slide and there is no document to return to
    BoardWrap,
}

/// At most one deck fetch in flight, tagged with a generation so that
/// replies issued before a cancel are dropped
#[derive(Debug, Default)]
pub struct DeckCheck {
    generation: Generation,
    pending: Option<DeckCheckReason>,
}

impl DeckCheck {
    /// Start a check unless one is already in flight
    pub fn begin(&mut self, reason: DeckCheckReason) -> Option<Generation> {
        if self.pending.is_some() {
            return None;
        }
        self.generation = self.generation.next();
        self.pending = Some(reason);
        Some(self.generation)
    }

    /// Take the reason of the in-flight check if `generation` is current
    pub fn complete(&mut self, generation: Generation) -> Option<DeckCheckReason> {
        if generation != self.generation {
            return None;
        }
        self.pending.take()
    }

    /// Forget the in-flight check; its reply will be discarded
    pub fn cancel(&mut self) {
        self.generation = self.generation.next();
        self.pending = None;
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

/// Outcome of a deck check
#[derive(Clone, Debug, PartialEq)]
pub enum Transition {
    /// Start (or restart) the board at its first slide
    ShowBoard(BoardCursor),
    /// Show the document from page 1
    RestartDocument,
    /// Nothing to show; stay in the document phase and re-check later
    Hold,
}

/// Pick the next content once a check completes.
///
/// The board wins whenever the fresh deck has visible slides, otherwise the
/// document restarts if there is one.
#[must_use]
pub fn decide(deck: AnnouncementDeck, has_document: bool) -> Transition {
    match BoardCursor::start(deck) {
        Some(cursor) => Transition::ShowBoard(cursor),
        None if has_document => Transition::RestartDocument,
        None => Transition::Hold,
    }
}
