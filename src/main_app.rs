use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{Event, KeyEvent, KeyEventKind, MouseEvent, MouseEventKind};
use log::{debug, info};
use ratatui::{Frame, Terminal, layout::Rect, style::Color};

use crate::event_source::EventSource;
use crate::inputs::{Action, ShortcutRouter};
use crate::notification::NotificationManager;
use crate::playback::{
    Collaborators, FullscreenDenied, Locator, Orchestrator, PlayerConfig, PlayerEvent, TvPhase,
    Viewport, ViewportBox,
};
use crate::settings;
use crate::widget::{BoardView, CELL_PX_HEIGHT, CELL_PX_WIDTH, PageView, StatusBar};

/// Smallest terminal that may go chrome-less
pub const MIN_FULLSCREEN_COLS: u16 = 40;
pub const MIN_FULLSCREEN_ROWS: u16 = 12;

/// The terminal as a viewport. Fullscreen means the page takes every row
/// and the status bar, when shown, is drawn over the last one.
#[derive(Clone, Debug)]
pub struct TerminalViewport {
    cols: u16,
    rows: u16,
    fullscreen: bool,
}

impl TerminalViewport {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            fullscreen: false,
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.cols = cols;
        self.rows = rows;
        if self.fullscreen && !self.fits_fullscreen() {
            info!("Terminal shrank to {cols}x{rows}, leaving fullscreen");
            self.fullscreen = false;
        }
    }

    fn fits_fullscreen(&self) -> bool {
        self.cols >= MIN_FULLSCREEN_COLS && self.rows >= MIN_FULLSCREEN_ROWS
    }

    /// Rows reserved for the status bar
    fn chrome_rows(&self) -> u16 {
        u16::from(!self.fullscreen).min(self.rows)
    }

    /// Cells the page may use
    pub fn page_area(&self) -> Rect {
        Rect::new(0, 0, self.cols, self.rows - self.chrome_rows())
    }

    pub fn status_row(&self) -> u16 {
        self.rows.saturating_sub(1)
    }
}

impl Viewport for TerminalViewport {
    fn client_box(&self) -> ViewportBox {
        let area = self.page_area();
        ViewportBox::new(
            f32::from(area.width) * CELL_PX_WIDTH as f32,
            f32::from(area.height) * CELL_PX_HEIGHT as f32,
        )
    }

    fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    fn request_fullscreen(&mut self) -> Result<(), FullscreenDenied> {
        if !self.fits_fullscreen() {
            return Err(FullscreenDenied::new(format!(
                "terminal is {}x{}, needs at least {MIN_FULLSCREEN_COLS}x{MIN_FULLSCREEN_ROWS}",
                self.cols, self.rows
            )));
        }
        self.fullscreen = true;
        Ok(())
    }

    fn exit_fullscreen(&mut self) {
        self.fullscreen = false;
    }
}

pub struct App {
    pub player: Orchestrator<TerminalViewport>,
    pub notifications: NotificationManager,
    router: ShortcutRouter,
    background: Color,
    persist_settings: bool,
    last_revision: u64,
    should_quit: bool,
}

impl App {
    pub fn new(
        config: PlayerConfig,
        viewport: TerminalViewport,
        collaborators: Collaborators,
    ) -> Self {
        let bg = config.background;
        Self {
            player: Orchestrator::new(config, viewport, collaborators),
            notifications: NotificationManager::new(),
            router: ShortcutRouter::new(),
            background: Color::Rgb(bg[0], bg[1], bg[2]),
            persist_settings: false,
            last_revision: 0,
            should_quit: false,
        }
    }

    /// Write preference changes (TV mode, interval, last good document)
    /// to the settings file
    pub fn with_settings_persistence(mut self) -> Self {
        self.persist_settings = true;
        self
    }

    /// Show `document`, or ask the document source for the active one
    pub fn start(&mut self, document: Option<Locator>, tv_mode: bool, now: Instant) {
        match document {
            Some(locator) => self.player.set_locator(Some(locator), now),
            None => self.player.refresh_source(),
        }
        if tv_mode {
            self.player.set_tv_mode(true, now);
        }
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn handle_event(&mut self, event: &Event, now: Instant) {
        match event {
            Event::Key(key) => self.handle_key(key, now),
            Event::Mouse(mouse) => self.handle_mouse(mouse, now),
            Event::Resize(cols, rows) => {
                debug!("Resized to {cols}x{rows}");
                self.player.viewport_mut().resize(*cols, *rows);
                self.player.on_resize(now);
            }
            _ => {}
        }
    }

    fn handle_key(&mut self, key: &KeyEvent, now: Instant) {
        if key.kind == KeyEventKind::Press {
            self.player.note_activity(now);
        }
        if let Some(action) = self.router.route(key) {
            self.apply_action(action, now);
        }
    }

    fn handle_mouse(&mut self, mouse: &MouseEvent, now: Instant) {
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                let over_status = self.player.state().ui_visible
                    && mouse.row == self.player.viewport().status_row();
                self.player.pointer_moved(now, over_status);
            }
            MouseEventKind::ScrollLeft | MouseEventKind::ScrollRight => {}
            _ => self.player.note_activity(now),
        }
    }

    pub fn apply_action(&mut self, action: Action, now: Instant) {
        debug!("Action {action:?}");
        match action {
            Action::NextPage => self.player.next_page(now),
            Action::PrevPage => self.player.prev_page(now),
            Action::ToggleAutoplay => self.player.toggle_autoplay(now),
            Action::ToggleFullscreen => {
                self.player.toggle_fullscreen();
                self.player.on_resize(now);
            }
            Action::ToggleTvMode => self.player.toggle_tv_mode(now),
            Action::ZoomIn => self.player.zoom_in(now),
            Action::ZoomOut => self.player.zoom_out(now),
            Action::CycleInterval => self.player.cycle_interval(now),
            // the router focuses the prompt itself
            Action::OpenGoTo => {}
            Action::GoTo(page) => self.player.go_to(page, false, now),
            Action::RefreshSource => self.player.refresh_source(),
            Action::Quit => self.should_quit = true,
        }
    }

    /// Drain worker replies, fire timers and react to player events.
    /// Returns true when the screen needs a redraw.
    pub fn update(&mut self, now: Instant) -> bool {
        self.player.pump(now);
        self.player.tick(now);

        let events = self.player.drain_events();
        let mut changed = !events.is_empty();
        for event in events {
            self.on_player_event(event);
        }

        changed |= self.notifications.update(now);

        let revision = self.player.surface().lock().revision();
        if revision != self.last_revision {
            self.last_revision = revision;
            changed = true;
        }
        changed
    }

    fn on_player_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Painted { page } => debug!("Page {page} on screen"),
            PlayerEvent::Loaded(locator) => {
                if self.persist_settings {
                    settings::set_last_good_locator(locator.as_str());
                }
            }
            PlayerEvent::TvModeChanged(enabled) => {
                if self.persist_settings {
                    settings::set_tv_mode(enabled);
                }
                self.notifications
                    .info(if enabled { "TV mode on" } else { "TV mode off" });
            }
            PlayerEvent::IntervalChanged(ms) => {
                if self.persist_settings {
                    settings::set_autoplay_interval_ms(ms);
                }
                self.notifications
                    .info(format!("Autoplay interval {}s", ms / 1000));
            }
            PlayerEvent::Notice { level, message } => self.notifications.notify(message, level),
        }
    }

    pub fn draw(&self, f: &mut Frame) {
        let viewport = self.player.viewport();
        let page_area = viewport.page_area().intersection(f.area());

        match self.player.phase() {
            TvPhase::Board(cursor) => {
                if let Some(slide) = cursor.current() {
                    f.render_widget(
                        BoardView::new(slide).position(cursor.index, cursor.deck.len()),
                        page_area,
                    );
                }
            }
            TvPhase::Document => {
                let surface = self.player.surface().lock();
                f.render_widget(
                    PageView::new(&surface, self.background)
                        .loading(self.player.state().is_loading),
                    page_area,
                );
            }
        }

        let state = self.player.state();
        if state.ui_visible && f.area().height > 0 {
            let row = viewport.status_row().min(f.area().height - 1);
            let status_area = Rect::new(0, row, f.area().width, 1);
            f.render_widget(
                StatusBar::new(state, self.player.phase(), self.router.prompt())
                    .notification(self.notifications.current()),
                status_area,
            );
        }
    }
}

pub fn run_app_with_event_source<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    B::Error: Send + Sync + 'static,
{
    let tick_rate = Duration::from_millis(50);
    let mut last_tick = Instant::now();
    let mut first_render = true;
    loop {
        let mut events_processed = 0;
        while event_source.poll(Duration::from_millis(0))? && events_processed < 50 {
            let event = event_source.read()?;
            events_processed += 1;
            app.handle_event(&event, Instant::now());
            if app.should_quit() {
                break;
            }
        }

        if app.should_quit() {
            return Ok(());
        }

        let mut needs_redraw = events_processed > 0 || first_render;
        first_render = false;

        if last_tick.elapsed() >= tick_rate || events_processed > 0 {
            needs_redraw |= app.update(Instant::now());
            last_tick = Instant::now();
        }

        if needs_redraw {
            terminal.draw(|f| app.draw(f))?;
        }

        if events_processed == 0 {
            let timeout = tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));
            let _ = event_source.poll(timeout)?;
        }
    }
}
