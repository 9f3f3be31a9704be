//! Document load bookkeeping on the orchestrator side

use log::debug;

use super::error::LoadFailure;
use super::request::Generation;
use super::types::{CancelToken, Locator};

/// Handle to the load currently in flight
#[derive(Clone, Debug)]
pub struct LoadTicket {
    pub generation: Generation,
    pub locator: Locator,
    pub cancel: CancelToken,
}

/// Tracks at most one in-flight load.
///
/// Every load gets a fresh generation; a reply is accepted only when it
/// carries the generation of the load still in flight.
#[derive(Debug, Default)]
pub struct DocumentLoader {
    generation: Generation,
    in_flight: Option<LoadTicket>,
    retrying: bool,
}

impl DocumentLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load chosen by the user or the document source
    pub fn begin(&mut self, locator: Locator) -> LoadTicket {
        self.retrying = false;
        self.issue(locator)
    }

    /// Start the silent retry after a network failure
    pub fn begin_retry(&mut self, locator: Locator) -> LoadTicket {
        self.retrying = true;
        self.issue(locator)
    }

    fn issue(&mut self, locator: Locator) -> LoadTicket {
        self.cancel();
        self.generation = self.generation.next();
        let ticket = LoadTicket {
            generation: self.generation,
            locator,
            cancel: CancelToken::new(),
        };
        self.in_flight = Some(ticket.clone());
        ticket
    }

    /// Cancel the in-flight load, if any
    pub fn cancel(&mut self) {
        if let Some(ticket) = self.in_flight.take() {
            debug!("Cancelling load of {} ({:?})", ticket.locator, ticket.generation);
            ticket.cancel.cancel();
        }
    }

    /// Accept a reply for `generation`, ending the in-flight load
    pub fn accept(&mut self, generation: Generation) -> bool {
        match &self.in_flight {
            Some(ticket) if ticket.generation == generation => {
                self.in_flight = None;
                true
            }
            _ => false,
        }
    }

    /// Locator to retry after `failure`, if the retry has not been spent.
    ///
    /// Only network failures are retried, once, from the last locator that
    /// loaded successfully.
    #[must_use]
    pub fn retry_target(
        &self,
        failure: &LoadFailure,
        last_good: Option<&Locator>,
    ) -> Option<Locator> {
        if self.retrying || !failure.is_network() {
            return None;
        }
        last_good.cloned()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::error::LoadFailureKind;

    fn loc(s: &str) -> Locator {
        Locator::parse(s).unwrap()
    }

    #[test]
    fn new_load_cancels_the_previous_one() {
        let mut loader = DocumentLoader::new();
        let first = loader.begin(loc("a.pdf"));
        let second = loader.begin(loc("b.pdf"));

        assert!(first.cancel.is_cancelled());
        assert!(!second.cancel.is_cancelled());
        assert!(!loader.accept(first.generation));
        assert!(loader.accept(second.generation));
        assert!(!loader.is_loading());
    }

    #[test]
    fn reply_after_cancel_is_rejected() {
        let mut loader = DocumentLoader::new();
        let ticket = loader.begin(loc("a.pdf"));
        loader.cancel();
        assert!(ticket.cancel.is_cancelled());
        assert!(!loader.accept(ticket.generation));
    }

    #[test]
    fn network_failures_retry_once_from_last_good() {
        let mut loader = DocumentLoader::new();
        let last_good = loc("good.pdf");
        let net = LoadFailure::new(loc("new.pdf"), LoadFailureKind::Network, "timeout");
        let decode = LoadFailure::new(loc("new.pdf"), LoadFailureKind::Decode, "garbage");

        let ticket = loader.begin(loc("new.pdf"));
        assert!(loader.accept(ticket.generation));
        assert_eq!(loader.retry_target(&decode, Some(&last_good)), None);
        assert_eq!(loader.retry_target(&net, None), None);
        assert_eq!(
            loader.retry_target(&net, Some(&last_good)),
            Some(last_good.clone())
        );

        let retry = loader.begin_retry(last_good.clone());
        assert!(loader.accept(retry.generation));
        assert_eq!(loader.retry_target(&net, Some(&last_good)), None);
    }
}
