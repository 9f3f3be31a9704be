//! Fake collaborators and helpers shared by unit and integration tests

pub mod fakes {
    use std::collections::HashMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Condvar, Mutex, PoisonError};
    use std::time::{Duration, Instant};

    use image::{Rgba, RgbaImage};

    use crate::deck::AnnouncementSlide;
    use crate::main_app::{App, TerminalViewport};
    use crate::playback::{
        CancelToken, Collaborators, DocumentDecoder, DocumentFault, DocumentFetcher,
        DocumentHandle, FetchError, FullscreenDenied, Locator, Orchestrator, PageHandle, PageSize,
        PageViewport, PlayerConfig, RenderOutcome, Viewport, ViewportBox,
    };
    use crate::sources::{DeckSource, DocumentSource, SourceError};

    /// Serialized description of a fake document: `pages=N size=WxH [fail=P]`
    #[must_use]
    pub fn fake_document(pages: usize, width: u32, height: u32) -> Vec<u8> {
        format!("pages={pages} size={width}x{height}").into_bytes()
    }

    /// Like [`fake_document`], but page `fail` errors when rendered
    #[must_use]
    pub fn fake_document_failing(pages: usize, fail: usize) -> Vec<u8> {
        format!("pages={pages} size=100x100 fail={fail}").into_bytes()
    }

    /// Colour every fake page is painted with
    #[must_use]
    pub fn page_color(page: usize) -> Rgba<u8> {
        let shade = (page * 20 % 250) as u8;
        Rgba([shade, 255 - shade, 128, 255])
    }

    fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
        m.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetcher serving bytes from memory.
    ///
    /// Unknown remote locators answer 503 as an unreachable server would;
    /// unknown local ones are missing files.
    #[derive(Clone, Default)]
    pub struct MemoryFetcher {
        documents: Arc<Mutex<HashMap<String, Vec<u8>>>>,
        fetches: Arc<AtomicUsize>,
    }

    impl MemoryFetcher {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        #[must_use]
        pub fn with(self, locator: &str, bytes: Vec<u8>) -> Self {
            self.insert(locator, bytes);
            self
        }

        pub fn insert(&self, locator: &str, bytes: Vec<u8>) {
            lock(&self.documents).insert(locator.to_string(), bytes);
        }

        pub fn remove(&self, locator: &str) {
            lock(&self.documents).remove(locator);
        }

        #[must_use]
        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl DocumentFetcher for MemoryFetcher {
        fn fetch(&self, locator: &Locator, _cancel: &CancelToken) -> Result<Vec<u8>, FetchError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if let Some(bytes) = lock(&self.documents).get(locator.as_str()) {
                return Ok(bytes.clone());
            }
            if locator.is_remote() {
                Err(FetchError::Status {
                    locator: locator.clone(),
                    status: 503,
                })
            } else {
                Err(FetchError::NotFound(locator.clone()))
            }
        }
    }

    /// Blocks a render until opened
    #[derive(Clone, Default)]
    pub struct Gate(Arc<(Mutex<bool>, Condvar)>);

    impl Gate {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        pub fn open(&self) {
            let (open, cvar) = &*self.0;
            *lock(open) = true;
            cvar.notify_all();
        }

        fn wait(&self) {
            let (open, cvar) = &*self.0;
            let mut guard = lock(open);
            while !*guard {
                guard = cvar.wait(guard).unwrap_or_else(PoisonError::into_inner);
            }
        }
    }

    /// Decodes [`fake_document`] bytes into solid-colour pages
    #[derive(Clone, Default)]
    pub struct SolidDecoder {
        gates: Arc<Mutex<HashMap<usize, Gate>>>,
    }

    impl SolidDecoder {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Hold renders of `page` until the returned gate opens
        #[must_use]
        pub fn gate_page(&self, page: usize) -> Gate {
            let gate = Gate::new();
            lock(&self.gates).insert(page, gate.clone());
            gate
        }
    }

    struct SolidDocument {
        pages: usize,
        size: PageSize,
        fail: Option<usize>,
        gates: HashMap<usize, Gate>,
    }

    struct SolidPage<'a> {
        number: usize,
        doc: &'a SolidDocument,
    }

    fn parse_fake_header(bytes: &[u8]) -> Option<(usize, PageSize, Option<usize>)> {
        let text = std::str::from_utf8(bytes).ok()?;
        let mut pages = None;
        let mut size = PageSize::new(100.0, 100.0);
        let mut fail = None;
        for field in text.split_whitespace() {
            let (key, value) = field.split_once('=')?;
            match key {
                "pages" => pages = value.parse().ok(),
                "size" => {
                    let (w, h) = value.split_once('x')?;
                    size = PageSize::new(w.parse().ok()?, h.parse().ok()?);
                }
                "fail" => fail = value.parse().ok(),
                _ => return None,
            }
        }
        Some((pages?, size, fail))
    }

    impl DocumentDecoder for SolidDecoder {
        fn decode(&self, bytes: Vec<u8>) -> Result<Box<dyn DocumentHandle>, DocumentFault> {
            let (pages, size, fail) =
                parse_fake_header(&bytes).ok_or_else(|| DocumentFault::generic("not a fake document"))?;
            Ok(Box::new(SolidDocument {
                pages,
                size,
                fail,
                gates: lock(&self.gates).clone(),
            }))
        }
    }

    impl DocumentHandle for SolidDocument {
        fn page_count(&self) -> usize {
            self.pages
        }

        fn page(&self, number: usize) -> Result<Box<dyn PageHandle + '_>, DocumentFault> {
            if number == 0 || number > self.pages {
                return Err(DocumentFault::PageOutOfRange(number));
            }
            Ok(Box::new(SolidPage { number, doc: self }))
        }
    }

    impl PageHandle for SolidPage<'_> {
        fn intrinsic_size(&self) -> PageSize {
            self.doc.size
        }

        fn render(
            &self,
            viewport: &PageViewport,
            cancel: &CancelToken,
        ) -> RenderOutcome<RgbaImage, DocumentFault> {
            if let Some(gate) = self.doc.gates.get(&self.number) {
                gate.wait();
            }
            if self.doc.fail == Some(self.number) {
                return RenderOutcome::Failed(DocumentFault::generic("broken page"));
            }
            if cancel.is_cancelled() {
                return RenderOutcome::Cancelled;
            }
            RenderOutcome::Done(RgbaImage::from_pixel(
                viewport.width,
                viewport.height,
                page_color(self.number),
            ))
        }
    }

    /// Document source whose answer tests can change at any time
    #[derive(Clone, Default)]
    pub struct ScriptedDocumentSource {
        active: Arc<Mutex<Option<Locator>>>,
    }

    impl ScriptedDocumentSource {
        #[must_use]
        pub fn new(active: Option<&str>) -> Self {
            let source = Self::default();
            source.set(active);
            source
        }

        pub fn set(&self, active: Option<&str>) {
            *lock(&self.active) = active.and_then(Locator::parse);
        }
    }

    impl DocumentSource for ScriptedDocumentSource {
        fn active_locator(&self) -> Result<Option<Locator>, SourceError> {
            Ok(lock(&self.active).clone())
        }

        fn upload(&self, path: &Path) -> Result<Locator, SourceError> {
            let locator = Locator::parse(&path.to_string_lossy())
                .ok_or_else(|| SourceError::Rejected("empty path".into()))?;
            *lock(&self.active) = Some(locator.clone());
            Ok(locator)
        }

        fn clear(&self, locator: &Locator) -> Result<bool, SourceError> {
            let mut active = lock(&self.active);
            if active.as_ref() == Some(locator) {
                *active = None;
                Ok(true)
            } else {
                Ok(false)
            }
        }
    }

    /// In-memory deck that counts fetches and can be made to fail
    #[derive(Clone, Default)]
    pub struct ScriptedDeck {
        slides: Arc<Mutex<Vec<AnnouncementSlide>>>,
        failing: Arc<Mutex<bool>>,
        fetches: Arc<AtomicUsize>,
    }

    impl ScriptedDeck {
        #[must_use]
        pub fn new(slides: Vec<AnnouncementSlide>) -> Self {
            let deck = Self::default();
            deck.set(slides);
            deck
        }

        /// Deck of `n` visible slides with ids `s0..sN`
        #[must_use]
        pub fn with_slides(n: usize) -> Self {
            Self::new(
                (0..n)
                    .map(|i| AnnouncementSlide::new(format!("s{i}"), format!("Slide {i}")))
                    .collect(),
            )
        }

        pub fn set(&self, slides: Vec<AnnouncementSlide>) {
            *lock(&self.slides) = slides;
        }

        pub fn set_failing(&self, failing: bool) {
            *lock(&self.failing) = failing;
        }

        #[must_use]
        pub fn fetch_count(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }
    }

    impl DeckSource for ScriptedDeck {
        fn fetch_slides(&self) -> Result<Vec<AnnouncementSlide>, SourceError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if *lock(&self.failing) {
                return Err(SourceError::Rejected("deck store offline".into()));
            }
            Ok(lock(&self.slides).clone())
        }

        fn replace(&self, slides: &[AnnouncementSlide]) -> Result<(), SourceError> {
            self.set(slides.to_vec());
            Ok(())
        }
    }

    /// Viewport with a fixed box and a scriptable fullscreen answer
    #[derive(Clone, Debug)]
    pub struct FakeViewport {
        pub size: ViewportBox,
        pub fullscreen: bool,
        pub deny_fullscreen: bool,
        pub fullscreen_requests: usize,
        /// Box reported while fullscreen; `size` when unset
        pub fullscreen_size: Option<ViewportBox>,
    }

    impl FakeViewport {
        #[must_use]
        pub fn new(width: f32, height: f32) -> Self {
            Self {
                size: ViewportBox::new(width, height),
                fullscreen: false,
                deny_fullscreen: false,
                fullscreen_requests: 0,
                fullscreen_size: None,
            }
        }
    }

    impl Viewport for FakeViewport {
        fn client_box(&self) -> ViewportBox {
            match self.fullscreen_size {
                Some(size) if self.fullscreen => size,
                _ => self.size,
            }
        }

        fn is_fullscreen(&self) -> bool {
            self.fullscreen
        }

        fn request_fullscreen(&mut self) -> Result<(), FullscreenDenied> {
            self.fullscreen_requests += 1;
            if self.deny_fullscreen {
                return Err(FullscreenDenied::new("not allowed by test"));
            }
            self.fullscreen = true;
            Ok(())
        }

        fn exit_fullscreen(&mut self) {
            self.fullscreen = false;
        }
    }

    /// Fakes wired into a player, with handles kept for the test
    pub struct TestRig {
        pub player: Orchestrator<FakeViewport>,
        pub fetcher: MemoryFetcher,
        pub decoder: SolidDecoder,
        pub documents: ScriptedDocumentSource,
        pub deck: ScriptedDeck,
    }

    /// Builder for a [`TestRig`]
    pub struct TestRigBuilder {
        config: PlayerConfig,
        viewport: FakeViewport,
        fetcher: MemoryFetcher,
        decoder: SolidDecoder,
        documents: ScriptedDocumentSource,
        deck: ScriptedDeck,
    }

    impl Default for TestRigBuilder {
        fn default() -> Self {
            Self {
                config: PlayerConfig::default(),
                viewport: FakeViewport::new(400.0, 300.0),
                fetcher: MemoryFetcher::new(),
                decoder: SolidDecoder::new(),
                documents: ScriptedDocumentSource::default(),
                deck: ScriptedDeck::default(),
            }
        }
    }

    impl TestRigBuilder {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        #[must_use]
        pub fn config(mut self, config: PlayerConfig) -> Self {
            self.config = config;
            self
        }

        #[must_use]
        pub fn viewport(mut self, viewport: FakeViewport) -> Self {
            self.viewport = viewport;
            self
        }

        #[must_use]
        pub fn document(self, locator: &str, bytes: Vec<u8>) -> Self {
            self.fetcher.insert(locator, bytes);
            self
        }

        #[must_use]
        pub fn active(self, locator: &str) -> Self {
            self.documents.set(Some(locator));
            self
        }

        #[must_use]
        pub fn deck(mut self, deck: ScriptedDeck) -> Self {
            self.deck = deck;
            self
        }

        /// Access the decoder before the player starts, e.g. to gate pages
        #[must_use]
        pub fn decoder(&self) -> &SolidDecoder {
            &self.decoder
        }

        fn collaborators(&self) -> Collaborators {
            Collaborators {
                fetcher: Box::new(self.fetcher.clone()),
                decoder: Box::new(self.decoder.clone()),
                documents: Box::new(self.documents.clone()),
                deck: Box::new(self.deck.clone()),
            }
        }

        #[must_use]
        pub fn build(self) -> TestRig {
            let collaborators = self.collaborators();
            let player = Orchestrator::new(self.config, self.viewport, collaborators);
            TestRig {
                player,
                fetcher: self.fetcher,
                decoder: self.decoder,
                documents: self.documents,
                deck: self.deck,
            }
        }

        /// Wire the fakes into a terminal [`App`] of `cols` x `rows` cells
        /// instead of a bare player. Settings are never persisted.
        #[must_use]
        pub fn build_app(self, cols: u16, rows: u16) -> AppRig {
            let collaborators = self.collaborators();
            let app = App::new(self.config, TerminalViewport::new(cols, rows), collaborators);
            AppRig {
                app,
                fetcher: self.fetcher,
                decoder: self.decoder,
                documents: self.documents,
                deck: self.deck,
            }
        }
    }

    /// Like [`TestRig`], around a terminal [`App`]
    pub struct AppRig {
        pub app: App,
        pub fetcher: MemoryFetcher,
        pub decoder: SolidDecoder,
        pub documents: ScriptedDocumentSource,
        pub deck: ScriptedDeck,
    }

    /// Pump `player` at `now` until no work is outstanding.
    ///
    /// Returns false if the workers did not settle within two seconds.
    pub fn settle<V: Viewport>(player: &mut Orchestrator<V>, now: Instant) -> bool {
        let deadline = Instant::now() + Duration::from_secs(2);
        loop {
            player.pump(now);
            if player.is_idle() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
    }
}

pub mod test_helpers {
    use crate::event_source::{Event, KeyCode, KeyEvent, KeyModifiers, SimulatedEventSource};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    /// Builder for creating test scenarios with simulated user input
    pub struct TestScenarioBuilder {
        events: Vec<Event>,
    }

    impl Default for TestScenarioBuilder {
        fn default() -> Self {
            Self::new()
        }
    }

    impl TestScenarioBuilder {
        pub fn new() -> Self {
            Self { events: Vec::new() }
        }

        /// Add a character key press
        pub fn press_char(mut self, c: char) -> Self {
            self.events.push(SimulatedEventSource::char_key(c));
            self
        }

        pub fn press(mut self, code: KeyCode) -> Self {
            self.events.push(Event::Key(KeyEvent {
                code,
                modifiers: KeyModifiers::empty(),
                kind: crossterm::event::KeyEventKind::Press,
                state: crossterm::event::KeyEventState::empty(),
            }));
            self
        }

        /// Type a page number into the go-to prompt and confirm
        pub fn go_to_page(self, page: usize) -> Self {
            let mut scenario = self.press_char('g');
            for c in page.to_string().chars() {
                scenario = scenario.press_char(c);
            }
            scenario.press(KeyCode::Enter)
        }

        pub fn next_page(self) -> Self {
            self.press(KeyCode::Right)
        }

        pub fn prev_page(self) -> Self {
            self.press(KeyCode::Left)
        }

        pub fn resize(mut self, width: u16, height: u16) -> Self {
            self.events.push(Event::Resize(width, height));
            self
        }

        /// Quit the application (press 'q')
        pub fn quit(mut self) -> Self {
            self.events.push(SimulatedEventSource::char_key('q'));
            self
        }

        /// Build the simulated event source
        pub fn build(self) -> SimulatedEventSource {
            SimulatedEventSource::new(self.events)
        }
    }

    /// Create a test terminal for snapshot testing
    pub fn create_test_terminal(width: u16, height: u16) -> Terminal<TestBackend> {
        let backend = TestBackend::new(width, height);
        Terminal::new(backend).unwrap()
    }

    /// Capture the current terminal buffer as a string
    pub fn capture_terminal_state(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut lines = Vec::new();

        for y in 0..buffer.area.height {
            let mut line = String::new();
            for x in 0..buffer.area.width {
                line.push_str(buffer[(x, y)].symbol());
            }
            lines.push(line.trim_end().to_string());
        }

        while lines.last().is_some_and(|l| l.is_empty()) {
            lines.pop();
        }

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::test_helpers::*;

    #[test]
    fn scenario_builder_expands_go_to() {
        let scenario = TestScenarioBuilder::new()
            .next_page()
            .go_to_page(12)
            .quit()
            .build();

        // Right, g, 1, 2, Enter, q
        assert_eq!(scenario.events.len(), 6);
    }
}
