//! Playback orchestrator: owns the viewer state and the timers, feeds the
//! worker threads and reconciles their replies.
//!
//! The orchestrator is single-threaded and never blocks. The event loop
//! calls [`Orchestrator::pump`] to drain worker replies and
//! [`Orchestrator::tick`] to fire due timers; both take the current instant
//! so tests can drive time explicitly.

use std::time::{Duration, Instant};

use flume::{Receiver, Sender};
use image::Rgba;
use log::{debug, error, info, warn};

use super::autoplay::{AutoplayTimer, Deadline};
use super::board::{self, DeckCheck, DeckCheckReason, Transition};
use super::document::{DocumentDecoder, DocumentFetcher};
use super::error::{FullscreenDenied, LoadFailure, RenderFailure};
use super::fit::{ScalePolicy, Zoom};
use super::loader::DocumentLoader;
use super::render::RenderScheduler;
use super::request::{
    EngineRequest, EngineResponse, Generation, IoRequest, IoResponse, RenderParams,
};
use super::state::{Command, Effect, ViewerState};
use super::surface::SharedSurface;
use super::tv::{BoardCursor, IdleTracker, TvPhase};
use super::types::{
    DEFAULT_AUTOPLAY_INTERVAL_MS, Locator, PageSize, SurfaceId, ViewportBox, next_interval_ms,
};
use super::worker::{EngineParts, IoParts, PageSizes, spawn_engine, spawn_io};
use crate::deck::{AnnouncementDeck, AnnouncementSlide};
use crate::notification::NotificationLevel;
use crate::sources::{DeckSource, DocumentSource, SourceError};

/// Surface the current page is painted onto
pub const PAGE_SURFACE: SurfaceId = SurfaceId(1);

/// The display the player draws into
pub trait Viewport {
    /// Measurable box available for the page
    fn client_box(&self) -> ViewportBox;

    fn is_fullscreen(&self) -> bool;

    fn request_fullscreen(&mut self) -> Result<(), FullscreenDenied>;

    fn exit_fullscreen(&mut self);
}

/// Tunables of a player instance
#[derive(Clone, Debug)]
pub struct PlayerConfig {
    pub autoplay_interval_ms: u64,
    pub board_interval: Duration,
    pub board_enabled: bool,
    pub idle_hide: Duration,
    pub fullscreen_grace: Duration,
    pub background: Rgba<u8>,
    /// Last locator that loaded successfully, used for the network retry
    pub last_good: Option<Locator>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            autoplay_interval_ms: DEFAULT_AUTOPLAY_INTERVAL_MS,
            board_interval: Duration::from_millis(DEFAULT_AUTOPLAY_INTERVAL_MS),
            board_enabled: true,
            idle_hide: Duration::from_secs(3),
            fullscreen_grace: Duration::from_secs(3),
            background: Rgba([0xFF, 0xFF, 0xFF, 0xFF]),
            last_good: None,
        }
    }
}

/// External collaborators, moved into the worker threads
pub struct Collaborators {
    pub fetcher: Box<dyn DocumentFetcher>,
    pub decoder: Box<dyn DocumentDecoder>,
    pub documents: Box<dyn DocumentSource>,
    pub deck: Box<dyn DeckSource>,
}

/// Things the host should react to (persist, notify, redraw)
#[derive(Clone, Debug, PartialEq)]
pub enum PlayerEvent {
    /// A page reached the surface
    Painted { page: usize },
    Loaded(Locator),
    TvModeChanged(bool),
    IntervalChanged(u64),
    Notice {
        level: NotificationLevel,
        message: String,
    },
}

struct ActiveDocument {
    generation: Generation,
    page_sizes: PageSizes,
}

pub struct Orchestrator<V: Viewport> {
    state: ViewerState,
    config: PlayerConfig,
    viewport: V,
    surface: SharedSurface,
    scheduler: RenderScheduler,
    loader: DocumentLoader,
    active: Option<ActiveDocument>,
    engine_tx: Sender<EngineRequest>,
    engine_rx: Receiver<EngineResponse>,
    io_tx: Sender<IoRequest>,
    io_rx: Receiver<IoResponse>,
    document_timer: AutoplayTimer,
    board_timer: AutoplayTimer,
    phase: TvPhase,
    idle: IdleTracker,
    fullscreen_grace: Deadline,
    deck_check: DeckCheck,
    locator_query_pending: bool,
    events: Vec<PlayerEvent>,
    shut_down: bool,
}

impl<V: Viewport> Orchestrator<V> {
    /// Spawn the worker threads and build an idle player
    pub fn new(config: PlayerConfig, viewport: V, collaborators: Collaborators) -> Self {
        let surface = SharedSurface::new(PAGE_SURFACE);
        let (engine_tx, engine_rx) = spawn_engine(EngineParts {
            fetcher: collaborators.fetcher,
            decoder: collaborators.decoder,
            surfaces: vec![surface.clone()],
        });
        let (io_tx, io_rx) = spawn_io(IoParts {
            documents: collaborators.documents,
            deck: collaborators.deck,
        });

        let interval = Duration::from_millis(config.autoplay_interval_ms);
        Self {
            state: ViewerState::new(config.autoplay_interval_ms),
            document_timer: AutoplayTimer::new(interval),
            board_timer: AutoplayTimer::new(config.board_interval),
            idle: IdleTracker::new(config.idle_hide),
            fullscreen_grace: Deadline::new(config.fullscreen_grace),
            config,
            viewport,
            surface,
            scheduler: RenderScheduler::new(),
            loader: DocumentLoader::new(),
            active: None,
            engine_tx,
            engine_rx,
            io_tx,
            io_rx,
            phase: TvPhase::Document,
            deck_check: DeckCheck::default(),
            locator_query_pending: false,
            events: Vec::new(),
            shut_down: false,
        }
    }

    #[must_use]
    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    #[must_use]
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    #[must_use]
    pub fn phase(&self) -> &TvPhase {
        &self.phase
    }

    /// Slide on screen during the board phase
    #[must_use]
    pub fn current_slide(&self) -> Option<&AnnouncementSlide> {
        self.phase.slide()
    }

    #[must_use]
    pub fn surface(&self) -> &SharedSurface {
        &self.surface
    }

    #[must_use]
    pub fn viewport(&self) -> &V {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        &mut self.viewport
    }

    #[must_use]
    pub fn has_document(&self) -> bool {
        self.active.is_some()
    }

    /// Size of the page on screen, rotation applied
    #[must_use]
    pub fn current_page_size(&self) -> Option<PageSize> {
        self.active
            .as_ref()
            .and_then(|a| a.page_sizes.get(self.state.current_page))
    }

    /// Number of armed autoplay timers (document and board); never above 1
    #[must_use]
    pub fn armed_timers(&self) -> usize {
        usize::from(self.document_timer.is_armed()) + usize::from(self.board_timer.is_armed())
    }

    #[must_use]
    pub fn is_fullscreen_pending(&self) -> bool {
        self.fullscreen_grace.is_armed()
    }

    #[must_use]
    pub fn is_deck_check_pending(&self) -> bool {
        self.deck_check.is_pending()
    }

    /// No load, render, deck check or locator query is outstanding
    #[must_use]
    pub fn is_idle(&self) -> bool {
        !self.loader.is_loading()
            && self.scheduler.in_flight() == 0
            && !self.deck_check.is_pending()
            && !self.locator_query_pending
    }

    /// Take the events produced since the last call
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    /// Show `locator`, or nothing
    pub fn set_locator(&mut self, locator: Option<Locator>, now: Instant) {
        self.run(Command::SetLocator(locator), now);
    }

    /// Ask the document source which document is active
    pub fn refresh_source(&mut self) {
        if self.locator_query_pending {
            debug!("Locator query already in flight");
            return;
        }
        self.locator_query_pending = true;
        self.send_io(IoRequest::ActiveLocator);
    }

    /// Navigate to `target`, clamped into the document.
    ///
    /// Every page change goes through here. The scale is recomputed when
    /// `force_rescale` is set or TV mode is on, and the page is always
    /// re-rendered.
    pub fn go_to(&mut self, target: usize, force_rescale: bool, now: Instant) {
        let Some(active) = &self.active else {
            return;
        };
        let page = target.clamp(1, active.page_sizes.len());
        let tv = self.state.tv_mode_enabled;

        if force_rescale || tv {
            if let Some(size) = active.page_sizes.get(page) {
                let scale = ScalePolicy::for_mode(tv).contain_scale(size, self.viewport.client_box());
                self.run(Command::SetScale(scale), now);
            }
        }
        self.run(Command::GoToPage(page), now);
    }

    pub fn next_page(&mut self, now: Instant) {
        if self.phase.is_board() {
            self.advance_board(now);
        } else {
            self.go_to(self.state.current_page + 1, false, now);
        }
        self.arm_timers(now);
    }

    pub fn prev_page(&mut self, now: Instant) {
        if let TvPhase::Board(cursor) = &mut self.phase {
            cursor.index = cursor.index.saturating_sub(1);
        } else {
            self.go_to(self.state.current_page.saturating_sub(1), false, now);
        }
        self.arm_timers(now);
    }

    pub fn toggle_autoplay(&mut self, now: Instant) {
        let enabled = !self.state.autoplay_enabled;
        self.run(Command::SetAutoplay(enabled), now);
    }

    pub fn set_tv_mode(&mut self, enabled: bool, now: Instant) {
        self.run(Command::SetTvMode(enabled), now);
    }

    pub fn toggle_tv_mode(&mut self, now: Instant) {
        self.set_tv_mode(!self.state.tv_mode_enabled, now);
    }

    /// Step to the next allowed autoplay interval
    pub fn cycle_interval(&mut self, now: Instant) {
        let next = next_interval_ms(self.state.autoplay_interval_ms);
        self.run(Command::SetAutoplayInterval(next), now);
    }

    pub fn zoom_in(&mut self, now: Instant) {
        let scale = Zoom::step_in(self.state.scale);
        self.zoom_to(scale, now);
    }

    pub fn zoom_out(&mut self, now: Instant) {
        let scale = Zoom::step_out(self.state.scale);
        self.zoom_to(scale, now);
    }

    fn zoom_to(&mut self, scale: f32, now: Instant) {
        self.run(Command::SetScale(scale), now);
        self.go_to(self.state.current_page, false, now);
    }

    pub fn toggle_fullscreen(&mut self) {
        if self.viewport.is_fullscreen() {
            self.viewport.exit_fullscreen();
            return;
        }
        if let Err(e) = self.viewport.request_fullscreen() {
            warn!("{e}");
            self.notify(NotificationLevel::Warning, e.to_string());
        }
    }

    /// The viewport changed size
    pub fn on_resize(&mut self, now: Instant) {
        if self.state.tv_mode_enabled {
            self.go_to(self.state.current_page, true, now);
        }
    }

    /// Key press or other non-pointer input
    pub fn note_activity(&mut self, now: Instant) {
        if self.state.tv_mode_enabled {
            self.idle.activity(now);
            self.show_chrome(now);
        }
    }

    /// Pointer moved; `over_protected` is true while it rests on chrome
    pub fn pointer_moved(&mut self, now: Instant, over_protected: bool) {
        if self.state.tv_mode_enabled {
            self.idle.pointer_at(now, over_protected);
            self.show_chrome(now);
        }
    }

    fn show_chrome(&mut self, now: Instant) {
        if !self.state.ui_visible {
            self.run(Command::SetUiVisible(true), now);
        }
    }

    // ------------------------------------------------------------------
    // Time and worker replies
    // ------------------------------------------------------------------

    /// Fire every timer that is due at `now`
    pub fn tick(&mut self, now: Instant) {
        if self.fullscreen_grace.poll(now)
            && self.state.tv_mode_enabled
            && !self.viewport.is_fullscreen()
        {
            match self.viewport.request_fullscreen() {
                Ok(()) => {
                    info!("Entered fullscreen");
                    // the client box grew
                    self.go_to(self.state.current_page, true, now);
                }
                Err(e) => warn!("{e}"),
            }
        }

        if self.idle.poll(now) && self.state.ui_visible {
            debug!("Hiding chrome after inactivity");
            self.run(Command::SetUiVisible(false), now);
        }

        if self.document_timer.poll(now) {
            self.on_document_tick(now);
        }
        if self.board_timer.poll(now) {
            self.on_board_tick(now);
        }
    }

    /// Drain and apply every reply the worker threads have sent
    pub fn pump(&mut self, now: Instant) {
        while let Ok(response) = self.engine_rx.try_recv() {
            self.on_engine_response(response, now);
        }
        while let Ok(response) = self.io_rx.try_recv() {
            self.on_io_response(response, now);
        }
    }

    fn on_document_tick(&mut self, now: Instant) {
        let total = self.active.as_ref().map_or(0, |a| a.page_sizes.len());
        if self.state.current_page < total {
            self.go_to(self.state.current_page + 1, false, now);
            return;
        }

        if self.state.tv_mode_enabled && self.config.board_enabled {
            self.request_deck_check(DeckCheckReason::DocumentEnd);
        } else if total > 0 {
            self.go_to(1, false, now);
        }
    }

    fn on_board_tick(&mut self, now: Instant) {
        self.advance_board(now);
    }

    fn advance_board(&mut self, now: Instant) {
        let TvPhase::Board(cursor) = &mut self.phase else {
            return;
        };
        if cursor.advance() {
            debug!("Board slide {}/{}", cursor.index + 1, cursor.deck.len());
            return;
        }

        if self.active.is_some() {
            self.show_document(now);
        } else {
            self.request_deck_check(DeckCheckReason::BoardWrap);
        }
    }

    fn request_deck_check(&mut self, reason: DeckCheckReason) {
        match self.deck_check.begin(reason) {
            Some(generation) => {
                debug!("Checking deck ({reason:?})");
                self.send_io(IoRequest::FetchDeck { generation });
            }
            None => debug!("Deck check already in flight"),
        }
    }

    fn show_board(&mut self, cursor: BoardCursor, now: Instant) {
        info!("Showing announcement board ({} slides)", cursor.deck.len());
        self.phase = TvPhase::Board(cursor);
        self.arm_timers(now);
    }

    fn show_document(&mut self, now: Instant) {
        if self.phase.is_board() {
            info!("Returning to document");
        }
        self.phase = TvPhase::Document;
        self.arm_timers(now);
        self.go_to(1, true, now);
    }

    fn on_deck(
        &mut self,
        generation: Generation,
        slides: Result<Vec<AnnouncementSlide>, SourceError>,
        now: Instant,
    ) {
        let Some(reason) = self.deck_check.complete(generation) else {
            debug!("Dropping stale deck reply {generation:?}");
            return;
        };
        if !self.state.tv_mode_enabled || !self.config.board_enabled {
            return;
        }

        // Fetch failures were logged on the I/O thread; they count as empty.
        let deck = AnnouncementDeck::visible(slides.unwrap_or_default());
        match board::decide(deck, self.active.is_some()) {
            Transition::ShowBoard(cursor) => self.show_board(cursor, now),
            Transition::RestartDocument => self.show_document(now),
            Transition::Hold => {
                if reason == DeckCheckReason::BoardWrap {
                    info!("Deck is empty, showing placeholder");
                    self.phase = TvPhase::Document;
                    self.arm_timers(now);
                } else {
                    debug!("Nothing to show yet");
                }
            }
        }
    }

    fn on_engine_response(&mut self, response: EngineResponse, now: Instant) {
        match response {
            EngineResponse::Loaded {
                generation,
                locator,
                page_sizes,
            } => {
                if !self.loader.accept(generation) {
                    debug!("Dropping superseded load {generation:?}");
                    return;
                }
                let total = page_sizes.len();
                info!("Showing {locator} ({total} pages)");
                self.active = Some(ActiveDocument {
                    generation,
                    page_sizes: PageSizes::new(page_sizes),
                });
                self.config.last_good = Some(locator.clone());
                self.events.push(PlayerEvent::Loaded(locator));
                self.run(Command::DocumentReady { total_pages: total }, now);
            }

            EngineResponse::LoadFailed {
                generation,
                failure,
            } => {
                if !self.loader.accept(generation) {
                    debug!("Dropping superseded load failure {generation:?}");
                    return;
                }
                self.on_load_failed(&failure, now);
            }

            EngineResponse::LoadCancelled { generation } => {
                debug!("Load {generation:?} cancelled");
            }

            EngineResponse::Painted { id, page } => {
                self.scheduler.finish(id);
                debug!("Painted page {page}");
                self.events.push(PlayerEvent::Painted { page });
            }

            EngineResponse::RenderCancelled(id) => {
                self.scheduler.finish(id);
                debug!("Render {id:?} cancelled");
            }

            EngineResponse::RenderFailed { id, failure } => {
                self.scheduler.finish(id);
                self.on_render_failed(&failure);
            }
        }
    }

    fn on_load_failed(&mut self, failure: &LoadFailure, now: Instant) {
        error!("{failure}");
        if let Some(retry) = self
            .loader
            .retry_target(failure, self.config.last_good.as_ref())
        {
            warn!("Retrying with last good document {retry}");
            self.run(Command::Retry(retry), now);
            return;
        }
        self.notify(
            NotificationLevel::Error,
            format!("Could not load document: {}", failure.detail),
        );
        self.run(Command::LoadFailed, now);
    }

    fn on_render_failed(&mut self, failure: &RenderFailure) {
        error!("Render failed: {failure}");
        self.notify(
            NotificationLevel::Error,
            format!("Could not render page {}", failure.page),
        );
    }

    fn on_io_response(&mut self, response: IoResponse, now: Instant) {
        match response {
            IoResponse::ActiveLocator(result) => {
                self.locator_query_pending = false;
                match result {
                    Ok(locator) => self.set_locator(locator, now),
                    Err(e) => {
                        warn!("Document source query failed: {e}");
                        self.notify(
                            NotificationLevel::Warning,
                            "Document source unavailable".to_string(),
                        );
                    }
                }
            }
            IoResponse::Deck { generation, slides } => self.on_deck(generation, slides, now),
        }
    }

    // ------------------------------------------------------------------
    // Effects
    // ------------------------------------------------------------------

    fn run(&mut self, cmd: Command, now: Instant) {
        let effects = self.state.apply(cmd);
        self.execute_effects(effects, now);
    }

    fn execute_effects(&mut self, effects: Vec<Effect>, now: Instant) {
        let mut check_board = false;
        for effect in effects {
            match effect {
                Effect::StartLoad { locator, retry } => self.start_load(locator, retry),
                Effect::CloseDocument => {
                    self.close_document();
                    check_board = true;
                }
                Effect::Navigate {
                    page,
                    force_rescale,
                } => self.go_to(page, force_rescale, now),
                Effect::RenderCurrentPage => self.render_current_page(),
                Effect::ArmAutoplay => self.arm_timers(now),
                Effect::DisarmAutoplay => self.disarm_timers(),
                Effect::EnterTv => {
                    self.enter_tv(now);
                    check_board = true;
                }
                Effect::ExitTv => self.exit_tv(now),
                Effect::PersistTvMode(enabled) => {
                    self.events.push(PlayerEvent::TvModeChanged(enabled));
                }
                Effect::PersistInterval(ms) => self.events.push(PlayerEvent::IntervalChanged(ms)),
            }
        }
        if check_board {
            self.board_without_document();
        }
    }

    /// In TV mode with nothing to page through, go to the board right away
    /// instead of waiting a full interval on the placeholder.
    fn board_without_document(&mut self) {
        if self.state.tv_mode_enabled
            && self.config.board_enabled
            && !self.phase.is_board()
            && self.active.is_none()
            && !self.loader.is_loading()
        {
            debug!("No document to show, checking the board");
            self.request_deck_check(DeckCheckReason::DocumentEnd);
        }
    }

    fn start_load(&mut self, locator: Locator, retry: bool) {
        self.scheduler.cancel_all();
        self.active = None;
        let ticket = if retry {
            self.loader.begin_retry(locator)
        } else {
            self.loader.begin(locator)
        };
        info!("Loading {} ({:?})", ticket.locator, ticket.generation);
        self.send_engine(EngineRequest::Load {
            generation: ticket.generation,
            locator: ticket.locator,
            cancel: ticket.cancel,
        });
    }

    fn close_document(&mut self) {
        self.loader.cancel();
        self.scheduler.cancel_all();
        if self.active.take().is_some() {
            debug!("Closing active document");
        }
        self.send_engine(EngineRequest::Close);
        self.surface.lock().clear();
    }

    fn render_current_page(&mut self) {
        let Some(active) = &self.active else {
            return;
        };
        let page = self.state.current_page;
        let task = self.scheduler.start(self.surface.id(), page);
        let request = EngineRequest::Render {
            id: task.id,
            generation: active.generation,
            surface: task.surface,
            params: RenderParams {
                page,
                scale: self.state.scale,
                rotation: None,
                background: self.config.background,
            },
            cancel: task.token().clone(),
        };
        self.send_engine(request);
    }

    /// Arm the timer of the current phase and disarm the other one
    fn arm_timers(&mut self, now: Instant) {
        self.disarm_timers();
        if !self.state.autoplay_enabled {
            return;
        }
        match self.phase {
            TvPhase::Document => {
                let interval = Duration::from_millis(self.state.autoplay_interval_ms);
                self.document_timer.start(now, interval);
            }
            TvPhase::Board(_) => self.board_timer.start(now, self.config.board_interval),
        }
    }

    fn disarm_timers(&mut self) {
        self.document_timer.stop();
        self.board_timer.stop();
    }

    fn enter_tv(&mut self, now: Instant) {
        info!("TV mode on");
        if !self.viewport.is_fullscreen() {
            self.fullscreen_grace.arm(now);
        }
        self.idle.start(now);
        self.run(Command::SetUiVisible(true), now);
        self.go_to(self.state.current_page, true, now);
    }

    fn exit_tv(&mut self, now: Instant) {
        info!("TV mode off");
        self.fullscreen_grace.cancel();
        self.idle.stop();
        if self.viewport.is_fullscreen() {
            self.viewport.exit_fullscreen();
        }
        self.deck_check.cancel();
        self.phase = TvPhase::Document;
        self.go_to(self.state.current_page, true, now);
    }

    fn notify(&mut self, level: NotificationLevel, message: String) {
        self.events.push(PlayerEvent::Notice { level, message });
    }

    fn send_engine(&self, request: EngineRequest) {
        if self.engine_tx.send(request).is_err() {
            error!("Engine thread is gone");
        }
    }

    fn send_io(&self, request: IoRequest) {
        if self.io_tx.send(request).is_err() {
            error!("I/O thread is gone");
        }
    }

    /// Cancel outstanding work and stop the worker threads
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.shut_down = true;
        self.loader.cancel();
        self.scheduler.cancel_all();
        self.disarm_timers();
        self.idle.stop();
        self.fullscreen_grace.cancel();
        self.deck_check.cancel();
        let _ = self.engine_tx.send(EngineRequest::Shutdown);
        let _ = self.io_tx.send(IoRequest::Shutdown);
    }
}

impl<V: Viewport> Drop for Orchestrator<V> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
