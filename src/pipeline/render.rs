//! PDF rasterisation: render pages to PNG, lazily, one page at a time.
//!
//! pdfium keeps thread-local state and is not async-safe, so the document is
//! opened and rendered on a `spawn_blocking` thread. Pages cross back to the
//! async side over a channel of depth 1: the render thread is at most one
//! page ahead of the uploader, and only one or two bitmaps are ever held in
//! memory. Dropping [`RenderedPages`] stops the render thread at its next
//! send.
//!
//! Every page is scaled by a fixed factor relative to its native size
//! (72 pt → 72 px at 1.0), 2.0 by default. There is no per-page retry: the
//! first failure is yielded as an error and the stream ends.

use crate::config::ConversionConfig;
use crate::error::Pdf2SlidesError;
use crate::pipeline::encode::encode_png;
use crate::pipeline::input::SourceDocument;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;
use tracing::{debug, info, warn};

/// Environment variable naming a pdfium library file or directory.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// One rasterised page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageImage {
    /// 0-based page index.
    pub index: usize,
    pub width: u32,
    pub height: u32,
    /// PNG-encoded bitmap.
    pub png: Vec<u8>,
}

impl PageImage {
    /// 1-based page number.
    pub fn page_num(&self) -> usize {
        self.index + 1
    }

    /// File name used for the Drive upload and the archive entry.
    ///
    /// The ordinal is zero-padded to at least three digits, and wider for
    /// documents with 1000+ pages, so lexical order equals page order.
    pub fn file_name(&self, total_pages: usize) -> String {
        let width = total_pages.to_string().len().max(3);
        format!("slide_{:0width$}.png", self.page_num(), width = width)
    }
}

/// A boxed stream of rendered pages.
pub type PageStream = Pin<Box<dyn Stream<Item = Result<PageImage, Pdf2SlidesError>> + Send>>;

/// The pages of an opened document, yielded in order.
///
/// Finite (exactly [`RenderedPages::total`] items on success) and not
/// restartable: reopen the source to render again.
pub struct RenderedPages {
    total: usize,
    pages: PageStream,
}

impl RenderedPages {
    /// Wrap an arbitrary page stream. `total` must equal the number of
    /// items the stream yields on success.
    pub fn new(
        total: usize,
        pages: impl Stream<Item = Result<PageImage, Pdf2SlidesError>> + Send + 'static,
    ) -> Self {
        Self {
            total,
            pages: Box::pin(pages),
        }
    }

    /// Pages that were rendered elsewhere (or synthesised in tests).
    pub fn from_images(images: Vec<PageImage>) -> Self {
        let total = images.len();
        Self::new(total, futures::stream::iter(images.into_iter().map(Ok)))
    }

    /// Number of pages in the document.
    pub fn total(&self) -> usize {
        self.total
    }
}

impl Stream for RenderedPages {
    type Item = Result<PageImage, Pdf2SlidesError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.pages.as_mut().poll_next(cx)
    }
}

/// Opens staged PDFs and renders them with pdfium.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    scale: f32,
    pdfium_lib_path: Option<PathBuf>,
}

impl Rasterizer {
    pub fn new(config: &ConversionConfig) -> Self {
        Self {
            scale: config.render_scale,
            pdfium_lib_path: config.pdfium_lib_path.clone(),
        }
    }

    /// Open `source` and start rendering.
    ///
    /// Returns once the document is open and its page count is known, so an
    /// unreadable upload fails here, before any remote call is made.
    pub async fn open(&self, source: &SourceDocument) -> Result<RenderedPages, Pdf2SlidesError> {
        let path = source.path_buf();
        let name = source.name().to_string();
        let scale = self.scale;
        let lib = self.pdfium_lib_path.clone();

        let (opened_tx, opened_rx) = oneshot::channel();
        let (page_tx, page_rx) = mpsc::channel(1);

        tokio::task::spawn_blocking(move || {
            render_blocking(&path, &name, scale, lib.as_deref(), opened_tx, page_tx)
        });

        let total = opened_rx.await.map_err(|_| {
            Pdf2SlidesError::Internal("Render task ended before opening the document".into())
        })??;

        Ok(RenderedPages::new(total, ReceiverStream::new(page_rx)))
    }
}

/// Blocking half of [`Rasterizer::open`]: owns pdfium and the document.
fn render_blocking(
    pdf_path: &Path,
    name: &str,
    scale: f32,
    lib_path: Option<&Path>,
    opened: oneshot::Sender<Result<usize, Pdf2SlidesError>>,
    pages_tx: mpsc::Sender<Result<PageImage, Pdf2SlidesError>>,
) {
    let pdfium = match bind_pdfium(lib_path) {
        Ok(p) => p,
        Err(e) => {
            let _ = opened.send(Err(e));
            return;
        }
    };

    let document = match pdfium.load_pdf_from_file(pdf_path, None) {
        Ok(d) => d,
        Err(e) => {
            let _ = opened.send(Err(classify_open_error(name, &e)));
            return;
        }
    };

    let pages = document.pages();
    let total = pages.len() as usize;
    info!("PDF loaded: {} pages", total);
    if opened.send(Ok(total)).is_err() {
        return;
    }

    let render_config = PdfRenderConfig::new().scale_page_by_factor(scale);

    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        let result = page
            .render_with_config(&render_config)
            .map_err(|e| Pdf2SlidesError::RasterisationFailed {
                page: page_num,
                detail: format!("{:?}", e),
            })
            .and_then(|bitmap| {
                let image = bitmap.as_image();
                debug!(
                    "Rendered page {} → {}x{} px",
                    page_num,
                    image.width(),
                    image.height()
                );
                Ok(PageImage {
                    index: idx,
                    width: image.width(),
                    height: image.height(),
                    png: encode_png(page_num, &image)?,
                })
            });

        let failed = result.is_err();
        if pages_tx.blocking_send(result).is_err() {
            debug!("Page consumer went away; stopping render at page {}", page_num);
            return;
        }
        if failed {
            return;
        }
    }
}

fn classify_open_error(name: &str, e: &PdfiumError) -> Pdf2SlidesError {
    let detail = format!("{:?}", e);
    if detail.contains("Password") || detail.contains("password") {
        Pdf2SlidesError::PasswordRequired {
            name: name.to_string(),
        }
    } else {
        Pdf2SlidesError::CorruptPdf {
            name: name.to_string(),
            detail,
        }
    }
}

/// Bind to a pdfium shared library.
///
/// Resolution order: the explicit path, then `PDFIUM_LIB_PATH`, then the
/// working directory, then the system library path. An explicit path that
/// fails to bind is an error; it never falls through to the others.
/// Directories are expanded to the platform library name inside them.
pub fn bind_pdfium(explicit: Option<&Path>) -> Result<Pdfium, Pdf2SlidesError> {
    let explicit = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(PDFIUM_LIB_PATH_ENV).map(PathBuf::from));

    if let Some(path) = explicit {
        let lib = library_file(&path);
        return Pdfium::bind_to_library(&lib)
            .map(Pdfium::new)
            .map_err(|e| Pdf2SlidesError::PdfiumBindingFailed(format!("{}: {:?}", lib.display(), e)));
    }

    let local = Pdfium::pdfium_platform_library_name_at_path("./");
    match Pdfium::bind_to_library(&local) {
        Ok(bindings) => return Ok(Pdfium::new(bindings)),
        Err(e) => debug!("No pdfium at {}: {:?}", local.display(), e),
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| {
            warn!("pdfium not found on the system library path");
            Pdf2SlidesError::PdfiumBindingFailed(format!("{:?}", e))
        })
}

fn library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(path)
    } else {
        path.to_path_buf()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn page(index: usize) -> PageImage {
        PageImage {
            index,
            width: 2,
            height: 2,
            png: vec![index as u8],
        }
    }

    #[test]
    fn file_names_sort_in_page_order() {
        assert_eq!(page(0).file_name(3), "slide_001.png");
        assert_eq!(page(41).file_name(120), "slide_042.png");
        assert_eq!(page(6).file_name(1500), "slide_0007.png");

        let mut names: Vec<String> = (0..1200).map(|i| page(i).file_name(1200)).collect();
        let in_order = names.clone();
        names.sort();
        assert_eq!(names, in_order);
    }

    #[tokio::test]
    async fn rendered_pages_from_images_yields_in_order() {
        let mut pages = RenderedPages::from_images(vec![page(0), page(1), page(2)]);
        assert_eq!(pages.total(), 3);
        let mut seen = Vec::new();
        while let Some(p) = pages.next().await {
            seen.push(p.unwrap().page_num());
        }
        assert_eq!(seen, vec![1, 2, 3]);
    }

    #[test]
    fn explicit_missing_library_is_a_binding_error() {
        let err = bind_pdfium(Some(Path::new("/nonexistent/libpdfium.so"))).err().unwrap();
        assert!(matches!(err, Pdf2SlidesError::PdfiumBindingFailed(_)));
    }
}
