//! Page rendering: task tracking on the orchestrator side and the paint
//! sequence executed on the engine thread.

use std::collections::HashMap;

use log::debug;

use super::document::DocumentHandle;
use super::error::DocumentFault;
use super::request::{RenderParams, RequestId};
use super::surface::{SharedSurface, Surface, SurfaceContent};
use super::types::{CancelToken, PageViewport, RenderOutcome, SurfaceId};

/// One in-flight paint of a page onto a surface
#[derive(Clone, Debug)]
pub struct RenderTask {
    pub id: RequestId,
    pub surface: SurfaceId,
    pub page: usize,
    cancel: CancelToken,
}

impl RenderTask {
    #[must_use]
    pub fn token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Request cancellation. Cancelling a finished task is harmless.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Tracks at most one live render task per surface
#[derive(Debug, Default)]
pub struct RenderScheduler {
    next_id: u64,
    tracked: HashMap<SurfaceId, RenderTask>,
}

impl RenderScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: 1,
            tracked: HashMap::new(),
        }
    }

    /// Cancel whatever targets `surface` and start tracking a new task
    pub fn start(&mut self, surface: SurfaceId, page: usize) -> RenderTask {
        if let Some(previous) = self.tracked.remove(&surface) {
            debug!(
                "Superseding render {:?} (page {}) on {:?}",
                previous.id, previous.page, surface
            );
            previous.cancel();
        }

        let task = RenderTask {
            id: RequestId::new(self.next_id),
            surface,
            page,
            cancel: CancelToken::new(),
        };
        self.next_id += 1;
        self.tracked.insert(surface, task.clone());
        task
    }

    /// Forget `id` if it is still the tracked task of its surface.
    ///
    /// Returns whether it was tracked; a newer task is left untouched.
    pub fn finish(&mut self, id: RequestId) -> bool {
        let surface = self
            .tracked
            .iter()
            .find(|(_, task)| task.id == id)
            .map(|(surface, _)| *surface);
        match surface {
            Some(surface) => {
                self.tracked.remove(&surface);
                true
            }
            None => false,
        }
    }

    /// Cancel and forget every tracked task
    pub fn cancel_all(&mut self) {
        for (_, task) in self.tracked.drain() {
            task.cancel();
        }
    }

    #[must_use]
    pub fn tracked(&self, surface: SurfaceId) -> Option<&RenderTask> {
        self.tracked.get(&surface)
    }

    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.tracked.len()
    }
}

/// Paint `params.page` of `doc` onto `surface`.
///
/// The surface is prepared (sized, transform reset, background filled) and
/// later committed under its lock, and both steps re-check `cancel`, so a
/// superseded task never writes page pixels once its successor was issued.
pub fn paint_page(
    doc: &dyn DocumentHandle,
    params: &RenderParams,
    surface: &SharedSurface,
    cancel: &CancelToken,
) -> RenderOutcome<(), DocumentFault> {
    if params.page == 0 || params.page > doc.page_count() {
        return RenderOutcome::Failed(DocumentFault::PageOutOfRange(params.page));
    }
    if !(params.scale.is_finite() && params.scale > 0.0) {
        return RenderOutcome::Failed(DocumentFault::generic(format!(
            "invalid scale {}",
            params.scale
        )));
    }

    let page = match doc.page(params.page) {
        Ok(page) => page,
        Err(e) => return RenderOutcome::Failed(e),
    };
    if cancel.is_cancelled() {
        return RenderOutcome::Cancelled;
    }

    let rotation = params.rotation.unwrap_or_else(|| page.rotation());
    let viewport = PageViewport::compute(page.intrinsic_size(), params.scale, rotation);

    {
        let mut target = surface.lock();
        if cancel.is_cancelled() {
            return RenderOutcome::Cancelled;
        }
        target.set_size(viewport.width, viewport.height);
        target.reset_transform();
        target.fill(params.background);
        target.set_content(SurfaceContent::Background { page: params.page });
    }

    let raster = match page.render(&viewport, cancel) {
        RenderOutcome::Done(raster) => raster,
        RenderOutcome::Cancelled => return RenderOutcome::Cancelled,
        RenderOutcome::Failed(e) => return RenderOutcome::Failed(e),
    };

    let mut target = surface.lock();
    if cancel.is_cancelled() {
        return RenderOutcome::Cancelled;
    }
    target.draw_raster(&raster);
    target.set_content(SurfaceContent::Page { page: params.page });
    RenderOutcome::Done(())
}
