//! HTTP clients for the signage web backend

use std::path::Path;
use std::time::Duration;

use log::{debug, info};
use reqwest::StatusCode;
use reqwest::blocking::{Client, Response, multipart};
use serde::Deserialize;
use serde_json::json;

use super::{DeckSource, DocumentSource, SourceError};
use crate::deck::AnnouncementSlide;
use crate::playback::Locator;

const GET_DOCUMENT: &str = "/api/get-pdf";
const UPLOAD_DOCUMENT: &str = "/api/upload-pdf";
const DELETE_DOCUMENT: &str = "/api/delete-pdf";
const DECK: &str = "/api/whiteboard";

#[derive(Deserialize)]
struct UrlBody {
    url: Option<String>,
}

#[derive(Deserialize)]
struct RemovedBody {
    #[serde(default)]
    removed: bool,
    warning: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

fn build_client(timeout: Duration) -> Result<Client, SourceError> {
    Ok(Client::builder().timeout(timeout).build()?)
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

/// Turn a non-2xx reply into [`SourceError::Status`], keeping the server's
/// `{error}` message when it sent one
fn check_status(url: &str, response: Response) -> Result<Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .json::<ErrorBody>()
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
    Err(SourceError::Status {
        endpoint: url.to_string(),
        status: status.as_u16(),
        message,
    })
}

/// Document source backed by `/api/get-pdf`, `/api/upload-pdf` and
/// `/api/delete-pdf`
pub struct HttpDocumentSource {
    client: Client,
    base_url: String,
}

impl HttpDocumentSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

impl DocumentSource for HttpDocumentSource {
    fn active_locator(&self) -> Result<Option<Locator>, SourceError> {
        let url = endpoint(&self.base_url, GET_DOCUMENT);
        let response = self.client.get(&url).send()?;
        if response.status() == StatusCode::NOT_FOUND {
            debug!("{url} reported no active document");
            return Ok(None);
        }
        let body: UrlBody = check_status(&url, response)?.json()?;
        Ok(body.url.as_deref().and_then(Locator::parse))
    }

    fn upload(&self, path: &Path) -> Result<Locator, SourceError> {
        let url = endpoint(&self.base_url, UPLOAD_DOCUMENT);
        let form = multipart::Form::new().file("file", path)?;
        let response = self.client.post(&url).multipart(form).send()?;
        let body: UrlBody = check_status(&url, response)?.json()?;
        let locator = body
            .url
            .as_deref()
            .and_then(Locator::parse)
            .ok_or_else(|| SourceError::Rejected("upload reply carried no url".into()))?;
        info!("Uploaded {} as {locator}", path.display());
        Ok(locator)
    }

    fn clear(&self, locator: &Locator) -> Result<bool, SourceError> {
        let url = endpoint(&self.base_url, DELETE_DOCUMENT);
        let response = self
            .client
            .delete(&url)
            .json(&json!({ "url": locator.as_str() }))
            .send()?;
        let body: RemovedBody = check_status(&url, response)?.json()?;
        if let Some(warning) = body.warning {
            info!("Delete of {locator}: {warning}");
        }
        Ok(body.removed)
    }
}

/// Deck source backed by `/api/whiteboard`
pub struct HttpDeckSource {
    client: Client,
    base_url: String,
}

impl HttpDeckSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into(),
        })
    }
}

impl DeckSource for HttpDeckSource {
    fn fetch_slides(&self) -> Result<Vec<AnnouncementSlide>, SourceError> {
        let url = endpoint(&self.base_url, DECK);
        let response = self.client.get(&url).send()?;
        Ok(check_status(&url, response)?.json()?)
    }

    fn replace(&self, slides: &[AnnouncementSlide]) -> Result<(), SourceError> {
        let url = endpoint(&self.base_url, DECK);
        let response = self.client.post(&url).json(slides).send()?;
        check_status(&url, response)?;
        Ok(())
    }
}
