//! Worker threads: the engine thread owns the active document and paints
//! pages, the I/O thread talks to the document and deck sources.

use flume::{Receiver, Sender};
use log::{debug, error, info, warn};

use super::document::{DocumentDecoder, DocumentFetcher, DocumentHandle};
use super::error::{LoadFailure, LoadFailureKind, RenderFailure};
use super::render::paint_page;
use super::request::{
    EngineRequest, EngineResponse, Generation, IoRequest, IoResponse, RenderParams, RequestId,
};
use super::surface::SharedSurface;
use super::types::{CancelToken, Locator, PageSize, RenderOutcome, SurfaceId};
use crate::sources::{DeckSource, DocumentSource};

/// Everything the engine thread needs, moved into it at spawn time
pub struct EngineParts {
    pub fetcher: Box<dyn DocumentFetcher>,
    pub decoder: Box<dyn DocumentDecoder>,
    pub surfaces: Vec<SharedSurface>,
}

struct ActiveDocument {
    generation: Generation,
    doc: Box<dyn DocumentHandle>,
}

struct Engine {
    parts: EngineParts,
    active: Option<ActiveDocument>,
}

/// Spawn the engine thread and return its channels
pub fn spawn_engine(parts: EngineParts) -> (Sender<EngineRequest>, Receiver<EngineResponse>) {
    let (request_tx, request_rx) = flume::unbounded();
    let (response_tx, response_rx) = flume::unbounded();

    let spawned = std::thread::Builder::new()
        .name("signboard-engine".into())
        .spawn(move || engine_worker(parts, request_rx, response_tx));
    if let Err(e) = spawned {
        error!("Failed to spawn engine thread: {e}");
    }

    (request_tx, response_rx)
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Values moved into thread, need ownership"
)]
fn engine_worker(
    parts: EngineParts,
    requests: Receiver<EngineRequest>,
    responses: Sender<EngineResponse>,
) {
    let mut engine = Engine {
        parts,
        active: None,
    };

    for request in requests {
        let response = match request {
            EngineRequest::Load {
                generation,
                locator,
                cancel,
            } => engine.load(generation, locator, &cancel),

            EngineRequest::Render {
                id,
                generation,
                surface,
                params,
                cancel,
            } => engine.render(id, generation, surface, &params, &cancel),

            EngineRequest::Close => {
                if let Some(active) = engine.active.take() {
                    debug!("Released document {:?}", active.generation);
                }
                continue;
            }

            EngineRequest::Shutdown => break,
        };

        if responses.send(response).is_err() {
            break;
        }
    }
    debug!("Engine thread stopped");
}

impl Engine {
    fn load(
        &mut self,
        generation: Generation,
        locator: Locator,
        cancel: &CancelToken,
    ) -> EngineResponse {
        // The previous document is released as soon as a new load starts.
        self.active = None;

        let bytes = match self.parts.fetcher.fetch(&locator, cancel) {
            Ok(bytes) => bytes,
            Err(e) => {
                return EngineResponse::LoadFailed {
                    generation,
                    failure: LoadFailure::new(locator, e.failure_kind(), e.to_string()),
                };
            }
        };
        if cancel.is_cancelled() {
            return EngineResponse::LoadCancelled { generation };
        }

        let doc = match self.parts.decoder.decode(bytes) {
            Ok(doc) => doc,
            Err(e) => {
                return EngineResponse::LoadFailed {
                    generation,
                    failure: LoadFailure::new(locator, LoadFailureKind::Decode, e.to_string()),
                };
            }
        };
        if cancel.is_cancelled() {
            return EngineResponse::LoadCancelled { generation };
        }

        let page_count = doc.page_count();
        if page_count == 0 {
            return EngineResponse::LoadFailed {
                generation,
                failure: LoadFailure::new(locator, LoadFailureKind::Empty, "document has no pages"),
            };
        }

        let mut page_sizes = Vec::with_capacity(page_count);
        for number in 1..=page_count {
            match doc.page(number) {
                Ok(page) => page_sizes.push(page.intrinsic_size().rotated(page.rotation())),
                Err(e) => {
                    return EngineResponse::LoadFailed {
                        generation,
                        failure: LoadFailure::new(
                            locator,
                            LoadFailureKind::Decode,
                            format!("page {number}: {e}"),
                        ),
                    };
                }
            }
        }

        info!("Decoded {locator} ({page_count} pages)");
        self.active = Some(ActiveDocument { generation, doc });
        EngineResponse::Loaded {
            generation,
            locator,
            page_sizes,
        }
    }

    fn render(
        &mut self,
        id: RequestId,
        generation: Generation,
        surface_id: SurfaceId,
        params: &RenderParams,
        cancel: &CancelToken,
    ) -> EngineResponse {
        let Some(active) = self.active.as_ref().filter(|a| a.generation == generation) else {
            // The document this render targeted has been superseded.
            return EngineResponse::RenderCancelled(id);
        };
        let Some(surface) = self.parts.surfaces.iter().find(|s| s.id() == surface_id) else {
            return EngineResponse::RenderFailed {
                id,
                failure: RenderFailure {
                    page: params.page,
                    detail: format!("unknown surface {surface_id:?}"),
                },
            };
        };

        match paint_page(active.doc.as_ref(), params, surface, cancel) {
            RenderOutcome::Done(()) => EngineResponse::Painted {
                id,
                page: params.page,
            },
            RenderOutcome::Cancelled => EngineResponse::RenderCancelled(id),
            RenderOutcome::Failed(e) => EngineResponse::RenderFailed {
                id,
                failure: RenderFailure {
                    page: params.page,
                    detail: e.to_string(),
                },
            },
        }
    }
}

/// Collaborators queried from the I/O thread
pub struct IoParts {
    pub documents: Box<dyn DocumentSource>,
    pub deck: Box<dyn DeckSource>,
}

/// Spawn the I/O thread and return its channels
pub fn spawn_io(parts: IoParts) -> (Sender<IoRequest>, Receiver<IoResponse>) {
    let (request_tx, request_rx) = flume::unbounded();
    let (response_tx, response_rx) = flume::unbounded();

    let spawned = std::thread::Builder::new()
        .name("signboard-io".into())
        .spawn(move || io_worker(parts, request_rx, response_tx));
    if let Err(e) = spawned {
        error!("Failed to spawn I/O thread: {e}");
    }

    (request_tx, response_rx)
}

#[expect(
    clippy::needless_pass_by_value,
    reason = "Values moved into thread, need ownership"
)]
fn io_worker(parts: IoParts, requests: Receiver<IoRequest>, responses: Sender<IoResponse>) {
    for request in requests {
        let response = match request {
            IoRequest::ActiveLocator => IoResponse::ActiveLocator(parts.documents.active_locator()),
            IoRequest::FetchDeck { generation } => {
                let slides = parts.deck.fetch_slides();
                if let Err(e) = &slides {
                    warn!("Deck fetch failed: {e}");
                }
                IoResponse::Deck { generation, slides }
            }
            IoRequest::Shutdown => break,
        };

        if responses.send(response).is_err() {
            break;
        }
    }
    debug!("I/O thread stopped");
}

/// Rotated sizes reported by a load, looked up by 1-based page number
#[derive(Clone, Debug, Default)]
pub struct PageSizes(Vec<PageSize>);

impl PageSizes {
    #[must_use]
    pub fn new(sizes: Vec<PageSize>) -> Self {
        Self(sizes)
    }

    #[must_use]
    pub fn get(&self, page: usize) -> Option<PageSize> {
        page.checked_sub(1).and_then(|idx| self.0.get(idx)).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
