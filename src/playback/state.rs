//! Viewer state management

use super::types::{DEFAULT_AUTOPLAY_INTERVAL_MS, Locator, snap_interval_ms};

/// What the viewer shows and how it advances
#[derive(Clone, Debug, PartialEq)]
pub struct ViewerState {
    /// Document the display is supposed to show
    pub locator: Option<Locator>,

    /// Current page (1-based), within `[1, total_pages]` while a document is active
    pub current_page: usize,

    /// Page count of the active document, 0 when none is active
    pub total_pages: usize,

    /// Render scale of the current page
    pub scale: f32,

    pub is_loading: bool,
    pub autoplay_enabled: bool,
    pub autoplay_interval_ms: u64,
    pub tv_mode_enabled: bool,

    /// Whether chrome (status bar) is shown
    pub ui_visible: bool,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self {
            locator: None,
            current_page: 1,
            total_pages: 0,
            scale: 1.0,
            is_loading: false,
            autoplay_enabled: false,
            autoplay_interval_ms: DEFAULT_AUTOPLAY_INTERVAL_MS,
            tv_mode_enabled: false,
            ui_visible: true,
        }
    }
}

impl ViewerState {
    #[must_use]
    pub fn new(autoplay_interval_ms: u64) -> Self {
        Self {
            autoplay_interval_ms: snap_interval_ms(autoplay_interval_ms),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn has_document(&self) -> bool {
        self.total_pages > 0
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply(&mut self, cmd: Command) -> Vec<Effect> {
        match cmd {
            Command::SetLocator(locator) => {
                if self.locator == locator {
                    return vec![];
                }
                self.locator = locator.clone();
                self.total_pages = 0;
                self.current_page = 1;
                match locator {
                    Some(locator) => {
                        self.is_loading = true;
                        vec![
                            Effect::CloseDocument,
                            Effect::StartLoad {
                                locator,
                                retry: false,
                            },
                        ]
                    }
                    None => {
                        self.is_loading = false;
                        vec![Effect::CloseDocument]
                    }
                }
            }

            Command::Retry(locator) => {
                self.locator = Some(locator.clone());
                self.is_loading = true;
                vec![Effect::StartLoad {
                    locator,
                    retry: true,
                }]
            }

            Command::DocumentReady { total_pages } => {
                self.is_loading = false;
                self.total_pages = total_pages;
                self.current_page = 1;
                if total_pages > 0 {
                    vec![Effect::Navigate {
                        page: 1,
                        force_rescale: true,
                    }]
                } else {
                    vec![]
                }
            }

            Command::LoadFailed => {
                self.is_loading = false;
                self.locator = None;
                self.total_pages = 0;
                self.current_page = 1;
                vec![Effect::CloseDocument]
            }

            Command::GoToPage(page) => {
                if self.total_pages == 0 {
                    return vec![];
                }
                self.current_page = page.clamp(1, self.total_pages);
                vec![Effect::RenderCurrentPage]
            }

            Command::SetScale(scale) => {
                if scale.is_finite() && scale > 0.0 {
                    self.scale = scale;
                }
                vec![]
            }

            Command::SetAutoplay(enabled) => {
                if self.autoplay_enabled == enabled {
                    return vec![];
                }
                self.autoplay_enabled = enabled;
                if enabled {
                    vec![Effect::ArmAutoplay]
                } else {
                    vec![Effect::DisarmAutoplay]
                }
            }

            Command::SetAutoplayInterval(ms) => {
                let snapped = snap_interval_ms(ms);
                if self.autoplay_interval_ms == snapped {
                    return vec![];
                }
                self.autoplay_interval_ms = snapped;
                let mut effects = vec![Effect::PersistInterval(snapped)];
                if self.autoplay_enabled {
                    effects.push(Effect::ArmAutoplay);
                }
                effects
            }

            Command::SetTvMode(enabled) => {
                if self.tv_mode_enabled == enabled {
                    return vec![];
                }
                self.tv_mode_enabled = enabled;
                self.autoplay_enabled = enabled;
                if enabled {
                    vec![
                        Effect::EnterTv,
                        Effect::ArmAutoplay,
                        Effect::PersistTvMode(true),
                    ]
                } else {
                    self.ui_visible = true;
                    vec![
                        Effect::ExitTv,
                        Effect::DisarmAutoplay,
                        Effect::PersistTvMode(false),
                    ]
                }
            }

            Command::SetUiVisible(visible) => {
                self.ui_visible = visible;
                vec![]
            }
        }
    }
}

/// Commands that modify viewer state
#[derive(Clone, Debug)]
pub enum Command {
    /// Point the viewer at a document, or at nothing
    SetLocator(Option<Locator>),
    /// Load `locator` again without treating it as a new choice
    Retry(Locator),
    /// The loader finished with a usable document
    DocumentReady { total_pages: usize },
    /// The loader gave up
    LoadFailed,
    GoToPage(usize),
    SetScale(f32),
    SetAutoplay(bool),
    SetAutoplayInterval(u64),
    SetTvMode(bool),
    SetUiVisible(bool),
}

/// Effects produced by state changes
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Fetch and decode `locator`; `retry` marks the silent retry
    StartLoad { locator: Locator, retry: bool },
    /// Drop the active document and blank the surface
    CloseDocument,
    Navigate { page: usize, force_rescale: bool },
    RenderCurrentPage,
    /// (Re)arm the timer of the current phase
    ArmAutoplay,
    DisarmAutoplay,
    EnterTv,
    ExitTv,
    PersistTvMode(bool),
    PersistInterval(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(total: usize) -> ViewerState {
        let mut state = ViewerState::default();
        let _ = state.apply(Command::SetLocator(Locator::parse("doc.pdf")));
        let _ = state.apply(Command::DocumentReady { total_pages: total });
        state
    }

    #[test]
    fn defaults_match_a_fresh_display() {
        let state = ViewerState::default();
        assert_eq!(state.current_page, 1);
        assert!((state.scale - 1.0).abs() < f32::EPSILON);
        assert!(!state.autoplay_enabled);
        assert!(!state.tv_mode_enabled);
        assert!(state.ui_visible);
    }

    #[test]
    fn new_locator_starts_a_load() {
        let mut state = ViewerState::default();
        let locator = Locator::parse("https://cdn/a.pdf").unwrap();
        let effects = state.apply(Command::SetLocator(Some(locator.clone())));
        assert!(state.is_loading);
        assert_eq!(
            effects,
            vec![
                Effect::CloseDocument,
                Effect::StartLoad {
                    locator: locator.clone(),
                    retry: false
                }
            ]
        );
        assert!(state.apply(Command::SetLocator(Some(locator))).is_empty());
    }

    #[test]
    fn ready_document_navigates_to_first_page_with_refit() {
        let mut state = ViewerState::default();
        let _ = state.apply(Command::SetLocator(Locator::parse("doc.pdf")));
        let effects = state.apply(Command::DocumentReady { total_pages: 3 });
        assert!(!state.is_loading);
        assert_eq!(
            effects,
            vec![Effect::Navigate {
                page: 1,
                force_rescale: true
            }]
        );
    }

    #[test]
    fn page_requests_are_clamped() {
        let mut state = loaded(4);
        let _ = state.apply(Command::GoToPage(99));
        assert_eq!(state.current_page, 4);
        let _ = state.apply(Command::GoToPage(0));
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn navigation_without_document_is_ignored() {
        let mut state = ViewerState::default();
        assert!(state.apply(Command::GoToPage(3)).is_empty());
        assert_eq!(state.current_page, 1);
    }

    #[test]
    fn same_page_still_renders() {
        let mut state = loaded(2);
        assert_eq!(
            state.apply(Command::GoToPage(1)),
            vec![Effect::RenderCurrentPage]
        );
    }

    #[test]
    fn load_failure_forgets_locator() {
        let mut state = ViewerState::default();
        let _ = state.apply(Command::SetLocator(Locator::parse("bad.pdf")));
        let effects = state.apply(Command::LoadFailed);
        assert_eq!(state.locator, None);
        assert!(!state.is_loading);
        assert_eq!(effects, vec![Effect::CloseDocument]);
    }

    #[test]
    fn tv_mode_drives_autoplay_and_ui() {
        let mut state = loaded(2);
        let on = state.apply(Command::SetTvMode(true));
        assert!(state.autoplay_enabled);
        assert!(on.contains(&Effect::EnterTv));
        assert!(on.contains(&Effect::ArmAutoplay));

        let _ = state.apply(Command::SetUiVisible(false));
        let off = state.apply(Command::SetTvMode(false));
        assert!(!state.autoplay_enabled);
        assert!(state.ui_visible);
        assert!(off.contains(&Effect::ExitTv));
        assert!(off.contains(&Effect::DisarmAutoplay));
    }

    #[test]
    fn interval_changes_rearm_only_when_playing() {
        let mut state = ViewerState::default();
        assert_eq!(
            state.apply(Command::SetAutoplayInterval(15_000)),
            vec![Effect::PersistInterval(15_000)]
        );
        let _ = state.apply(Command::SetAutoplay(true));
        assert_eq!(
            state.apply(Command::SetAutoplayInterval(5_000)),
            vec![Effect::PersistInterval(5_000), Effect::ArmAutoplay]
        );
        assert!(state.apply(Command::SetAutoplayInterval(5_100)).is_empty());
    }

    #[test]
    fn invalid_scale_is_ignored() {
        let mut state = ViewerState::default();
        let _ = state.apply(Command::SetScale(f32::NAN));
        let _ = state.apply(Command::SetScale(-1.0));
        assert!((state.scale - 1.0).abs() < f32::EPSILON);
    }
}
