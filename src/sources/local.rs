//! File-backed sources for a display that runs without the web backend

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{DeckSource, DocumentSource, SourceError};
use crate::deck::{
    AnnouncementSlide, DEFAULT_SLIDE_ID, DEFAULT_SLIDE_TITLE, SlideContent, welcome_deck,
};
use crate::playback::Locator;

const STATE_FILENAME: &str = "active-document.json";
const DOCUMENTS_DIR: &str = "documents";

/// Pointer to the active document
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveDocumentState {
    pub url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Keeps uploads and the active-document pointer under one data directory
pub struct LocalDocumentSource {
    data_dir: PathBuf,
}

impl LocalDocumentSource {
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    fn state_path(&self) -> PathBuf {
        self.data_dir.join(STATE_FILENAME)
    }

    fn read_state(&self) -> Result<Option<ActiveDocumentState>, SourceError> {
        match fs::read_to_string(self.state_path()) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_state(&self, url: Option<&str>) -> Result<(), SourceError> {
        fs::create_dir_all(&self.data_dir)?;
        let state = ActiveDocumentState {
            url: url.map(str::to_string),
            updated_at: Utc::now(),
        };
        fs::write(self.state_path(), serde_json::to_string_pretty(&state)?)?;
        Ok(())
    }

    fn is_managed(&self, path: &Path) -> bool {
        let documents = self.data_dir.join(DOCUMENTS_DIR);
        let documents = documents.canonicalize().unwrap_or(documents);
        path.starts_with(documents)
    }
}

impl DocumentSource for LocalDocumentSource {
    fn active_locator(&self) -> Result<Option<Locator>, SourceError> {
        Ok(self
            .read_state()?
            .and_then(|s| s.url)
            .as_deref()
            .and_then(Locator::parse))
    }

    fn upload(&self, path: &Path) -> Result<Locator, SourceError> {
        let name = path
            .file_name()
            .ok_or_else(|| SourceError::Rejected(format!("{} is not a file", path.display())))?;
        let documents = self.data_dir.join(DOCUMENTS_DIR);
        fs::create_dir_all(&documents)?;

        let target = documents.join(name);
        fs::copy(path, &target)?;
        let target = target.canonicalize().unwrap_or(target);

        let raw = target.to_string_lossy();
        let locator = Locator::parse(&raw)
            .ok_or_else(|| SourceError::Rejected("empty document path".into()))?;
        self.write_state(Some(locator.as_str()))?;
        info!("Published {} as {locator}", path.display());
        Ok(locator)
    }

    fn clear(&self, locator: &Locator) -> Result<bool, SourceError> {
        let mut removed = false;

        let active = self.read_state()?.and_then(|s| s.url);
        if active.as_deref() == Some(locator.as_str()) {
            self.write_state(None)?;
            removed = true;
        }

        let path = Path::new(locator.as_str());
        if self.is_managed(path) {
            match fs::remove_file(path) {
                Ok(()) => removed = true,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }

        debug!("Clear {locator}: removed={removed}");
        Ok(removed)
    }
}

/// Deck stored as one pretty-printed JSON array
pub struct FileDeckStore {
    path: PathBuf,
}

impl FileDeckStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Wrap a pre-deck single board into a one-slide deck
fn upgrade_legacy(value: Value) -> AnnouncementSlide {
    let mut slide = AnnouncementSlide::new(DEFAULT_SLIDE_ID, DEFAULT_SLIDE_TITLE);

    let wrapped = value.get("type").is_none()
        && value.get("content").is_some()
        && value.get("isVisible").is_some();
    if wrapped {
        slide.is_visible = value
            .get("isVisible")
            .and_then(Value::as_bool)
            .unwrap_or(true);
        slide.content = SlideContent::from(value.get("content").cloned().unwrap_or(Value::Null));
    } else {
        slide.content = SlideContent::from(value);
    }
    slide
}

impl DeckSource for FileDeckStore {
    fn fetch_slides(&self) -> Result<Vec<AnnouncementSlide>, SourceError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No deck at {:?}, serving the welcome deck", self.path);
                return Ok(welcome_deck());
            }
            Err(e) => return Err(e.into()),
        };

        let value: Value = serde_json::from_str(&raw)?;
        if value.is_array() {
            return Ok(serde_json::from_value(value)?);
        }
        warn!("Deck at {:?} predates multi-slide decks, wrapping it", self.path);
        Ok(vec![upgrade_legacy(value)])
    }

    fn replace(&self, slides: &[AnnouncementSlide]) -> Result<(), SourceError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(slides)?)?;
        debug!("Saved {} slides to {:?}", slides.len(), self.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn missing_deck_serves_welcome_slide() {
        let dir = TempDir::new().unwrap();
        let store = FileDeckStore::new(dir.path().join("whiteboard.json"));
        let slides = store.fetch_slides().unwrap();
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].title, DEFAULT_SLIDE_TITLE);
        assert!(slides[0].is_visible);
    }

    #[test]
    fn legacy_wrapped_board_keeps_visibility() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("whiteboard.json");
        fs::write(
            &path,
            json!({
                "content": { "type": "doc", "content": [] },
                "isVisible": false
            })
            .to_string(),
        )
        .unwrap();

        let slides = FileDeckStore::new(&path).fetch_slides().unwrap();
        assert_eq!(slides.len(), 1);
        assert_eq!(slides[0].id, DEFAULT_SLIDE_ID);
        assert!(!slides[0].is_visible);
    }

    #[test]
    fn legacy_bare_document_becomes_body() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("whiteboard.json");
        let doc = json!({
            "type": "doc",
            "content": [{ "type": "paragraph", "content": [{ "type": "text", "text": "Oi" }] }]
        });
        fs::write(&path, doc.to_string()).unwrap();

        let slides = FileDeckStore::new(&path).fetch_slides().unwrap();
        assert!(slides[0].is_visible);
        assert_eq!(slides[0].body_lines(), vec!["Oi"]);
    }

    #[test]
    fn replace_then_fetch_preserves_order() {
        let dir = TempDir::new().unwrap();
        let store = FileDeckStore::new(dir.path().join("nested").join("deck.json"));
        let mut hidden = AnnouncementSlide::new("b", "B");
        hidden.is_visible = false;
        let deck = vec![AnnouncementSlide::new("a", "A"), hidden];

        store.replace(&deck).unwrap();
        assert_eq!(store.fetch_slides().unwrap(), deck);
    }

    #[test]
    fn upload_publishes_and_clear_unpublishes() {
        let dir = TempDir::new().unwrap();
        let source_file = dir.path().join("menu.pdf");
        fs::write(&source_file, b"%PDF-1.4").unwrap();

        let source = LocalDocumentSource::new(dir.path().join("data"));
        assert_eq!(source.active_locator().unwrap(), None);

        let locator = source.upload(&source_file).unwrap();
        assert_eq!(source.active_locator().unwrap(), Some(locator.clone()));
        assert!(Path::new(locator.as_str()).exists());

        assert!(source.clear(&locator).unwrap());
        assert_eq!(source.active_locator().unwrap(), None);
        assert!(!Path::new(locator.as_str()).exists());
        assert!(!source.clear(&locator).unwrap());
    }

    #[test]
    fn state_file_uses_camel_case() {
        let dir = TempDir::new().unwrap();
        let source = LocalDocumentSource::new(dir.path());
        source.write_state(Some("https://cdn/x.pdf")).unwrap();
        let raw = fs::read_to_string(dir.path().join(STATE_FILENAME)).unwrap();
        assert!(raw.contains("\"updatedAt\""));
        assert_eq!(
            source.active_locator().unwrap().map(|l| l.to_string()),
            Some("https://cdn/x.pdf".to_string())
        );
    }
}
