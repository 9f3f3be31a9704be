//! Document backend seams
//!
//! Decoded documents live on the engine thread and never cross threads, so
//! [`DocumentHandle`] and [`PageHandle`] are not required to be `Send`. The
//! factories that produce them are moved into the engine thread and must be.

use std::time::Duration;

use image::RgbaImage;

use super::error::{DocumentFault, FetchError};
use super::types::{CancelToken, Locator, PageSize, PageViewport, RenderOutcome, Rotation};

/// A decoded, paginated document
pub trait DocumentHandle {
    /// Number of pages, at least 1 for a usable document
    fn page_count(&self) -> usize;

    /// Fetch a page by 1-based number
    fn page(&self, number: usize) -> Result<Box<dyn PageHandle + '_>, DocumentFault>;
}

/// A single page of a [`DocumentHandle`]
pub trait PageHandle {
    /// Unrotated size at scale 1
    fn intrinsic_size(&self) -> PageSize;

    /// Rotation the page asks to be displayed with
    fn rotation(&self) -> Rotation {
        Rotation::None
    }

    /// Paint the page at `viewport` into a fresh raster.
    ///
    /// Implementations should check `cancel` between expensive steps and
    /// return [`RenderOutcome::Cancelled`] as soon as it is set.
    fn render(
        &self,
        viewport: &PageViewport,
        cancel: &CancelToken,
    ) -> RenderOutcome<RgbaImage, DocumentFault>;
}

/// Turns fetched bytes into a document
pub trait DocumentDecoder: Send {
    fn decode(&self, bytes: Vec<u8>) -> Result<Box<dyn DocumentHandle>, DocumentFault>;
}

/// Resolves a locator to the document's bytes
pub trait DocumentFetcher: Send {
    fn fetch(&self, locator: &Locator, cancel: &CancelToken) -> Result<Vec<u8>, FetchError>;
}

/// Fetches `http(s)://` locators over HTTP and everything else from disk
pub struct LocatorFetcher {
    client: reqwest::blocking::Client,
}

impl LocatorFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

impl DocumentFetcher for LocatorFetcher {
    fn fetch(&self, locator: &Locator, _cancel: &CancelToken) -> Result<Vec<u8>, FetchError> {
        if locator.is_remote() {
            let response = self.client.get(locator.as_str()).send()?;
            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    locator: locator.clone(),
                    status: status.as_u16(),
                });
            }
            return Ok(response.bytes()?.to_vec());
        }

        let path = locator
            .as_str()
            .strip_prefix("file://")
            .unwrap_or(locator.as_str());
        match std::fs::read(path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FetchError::NotFound(locator.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(feature = "pdf")]
pub use self::mupdf_backend::PdfDecoder;

#[cfg(feature = "pdf")]
mod mupdf_backend {
    use image::{Rgba, RgbaImage};
    use mupdf::{Colorspace, Document, Matrix, Page, Pixmap};

    use super::{DocumentDecoder, DocumentHandle, PageHandle};
    use crate::playback::error::DocumentFault;
    use crate::playback::types::{CancelToken, PageSize, PageViewport, RenderOutcome};

    const PDF_MAGIC: &str = "application/pdf";

    /// MuPDF-backed decoder
    #[derive(Default)]
    pub struct PdfDecoder;

    impl DocumentDecoder for PdfDecoder {
        fn decode(&self, bytes: Vec<u8>) -> Result<Box<dyn DocumentHandle>, DocumentFault> {
            let doc = Document::from_bytes(&bytes, PDF_MAGIC)?;
            let page_count = doc.page_count()?.max(0) as usize;
            Ok(Box::new(PdfDocument { doc, page_count }))
        }
    }

    struct PdfDocument {
        doc: Document,
        page_count: usize,
    }

    impl DocumentHandle for PdfDocument {
        fn page_count(&self) -> usize {
            self.page_count
        }

        fn page(&self, number: usize) -> Result<Box<dyn PageHandle + '_>, DocumentFault> {
            if number == 0 || number > self.page_count {
                return Err(DocumentFault::PageOutOfRange(number));
            }
            let page = self.doc.load_page((number - 1) as i32)?;
            let bounds = page.bounds()?;
            Ok(Box::new(PdfPage {
                page,
                size: PageSize::new(bounds.x1 - bounds.x0, bounds.y1 - bounds.y0),
            }))
        }
    }

    /// MuPDF bounds already include the page's /Rotate entry, so the
    /// reported rotation stays at the default.
    struct PdfPage {
        page: Page,
        size: PageSize,
    }

    impl PageHandle for PdfPage {
        fn intrinsic_size(&self) -> PageSize {
            self.size
        }

        fn render(
            &self,
            viewport: &PageViewport,
            cancel: &CancelToken,
        ) -> RenderOutcome<RgbaImage, DocumentFault> {
            if cancel.is_cancelled() {
                return RenderOutcome::Cancelled;
            }
            let transform = Matrix::new_scale(viewport.scale, viewport.scale);
            let rgb = Colorspace::device_rgb();
            let pixmap = match self.page.to_pixmap(&transform, &rgb, false, false) {
                Ok(p) => p,
                Err(e) => return RenderOutcome::Failed(e.into()),
            };
            if cancel.is_cancelled() {
                return RenderOutcome::Cancelled;
            }
            match pixmap_to_rgba(&pixmap) {
                Ok(img) => RenderOutcome::Done(img),
                Err(e) => RenderOutcome::Failed(e),
            }
        }
    }

    fn pixmap_to_rgba(pixmap: &Pixmap) -> Result<RgbaImage, DocumentFault> {
        let n = pixmap.n() as usize;
        if n < 3 {
            return Err(DocumentFault::generic(format!(
                "Unsupported pixmap format: {n} channels"
            )));
        }

        let width = pixmap.width() as usize;
        let height = pixmap.height() as usize;
        let stride = pixmap.stride() as usize;
        let samples = pixmap.samples();
        let row_bytes = width * n;
        if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
            return Err(DocumentFault::generic("Pixmap buffer size mismatch"));
        }

        let mut out = RgbaImage::new(width as u32, height as u32);
        for (y, row) in samples.chunks(stride).take(height).enumerate() {
            for (x, px) in row[..row_bytes].chunks_exact(n).enumerate() {
                out.put_pixel(x as u32, y as u32, Rgba([px[0], px[1], px[2], 0xFF]));
            }
        }
        Ok(out)
    }
}
