//! Conversion entry points: one uploaded PDF in, one Google Slides deck out.
//!
//! [`run_pipeline`] is the page loop shared by every front-end. It is
//! written against the [`AssetStore`] / [`PresentationService`] traits and a
//! [`RenderedPages`] stream, so it has no idea whether it talks to Google or
//! to an in-memory fake. [`GoogleConverter`] supplies the real pieces:
//! pdfium, the stored OAuth credential, and the Drive/Slides clients.

use crate::auth::{AuthorizationPrompt, CredentialStore};
use crate::config::{AssetRetention, ConversionConfig};
use crate::error::Pdf2SlidesError;
use crate::google::drive::{AssetStore, DriveClient, RemoteAsset};
use crate::google::slides::{PresentationService, SlidesClient};
use crate::output::{ConversionOutput, ConversionStats, SlideRecord};
use crate::pipeline::archive::ArchivePacker;
use crate::pipeline::builder::PresentationBuilder;
use crate::pipeline::input::SourceDocument;
use crate::pipeline::render::{Rasterizer, RenderedPages};
use crate::progress::{NoopProgressCallback, ProgressCallback};
use async_trait::async_trait;
use futures::StreamExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The two operator inputs: a PDF and the "also give me the images" flag.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub save_images: bool,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>, save_images: bool) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            save_images,
        }
    }

    /// Read a local PDF into an upload.
    pub async fn from_path(path: &Path, save_images: bool) -> Result<Self, Pdf2SlidesError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Pdf2SlidesError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => Pdf2SlidesError::CorruptPdf {
                name: path.display().to_string(),
                detail: e.to_string(),
            },
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        Ok(Self::new(file_name, bytes, save_images))
    }
}

/// Something that can turn an [`Upload`] into a presentation.
///
/// The web controller holds one of these; tests substitute their own.
#[async_trait]
pub trait Converter: Send + Sync {
    async fn convert(
        &self,
        upload: Upload,
        progress: ProgressCallback,
    ) -> Result<ConversionOutput, Pdf2SlidesError>;
}

/// The production converter: pdfium + OAuth + Drive + Slides.
pub struct GoogleConverter {
    config: ConversionConfig,
    credentials: CredentialStore,
    http: reqwest::Client,
}

impl GoogleConverter {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            credentials: CredentialStore::new(&config),
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Replace how the operator is sent to the consent page.
    pub fn with_prompt(mut self, prompt: Arc<dyn AuthorizationPrompt>) -> Self {
        self.credentials = self.credentials.with_prompt(prompt);
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }
}

#[async_trait]
impl Converter for GoogleConverter {
    async fn convert(
        &self,
        upload: Upload,
        progress: ProgressCallback,
    ) -> Result<ConversionOutput, Pdf2SlidesError> {
        info!("Starting conversion: {}", upload.file_name);

        // ── Step 1: Validate and open the PDF (no remote calls yet) ─────
        let source = SourceDocument::from_bytes(&upload.file_name, &upload.bytes)?;
        drop(upload.bytes);
        let pages = Rasterizer::new(&self.config).open(&source).await?;

        // ── Step 2: Credential ───────────────────────────────────────────
        let credential = self.credentials.acquire().await?;
        let token = credential.access_token().ok_or_else(|| {
            Pdf2SlidesError::Internal("credential has no access token".into())
        })?;

        // ── Step 3: Clients ──────────────────────────────────────────────
        let endpoints = &self.config.endpoints;
        let drive = DriveClient::new(
            self.http.clone(),
            token,
            &endpoints.drive_upload,
            &endpoints.drive,
        );
        let slides = SlidesClient::new(self.http.clone(), token, &endpoints.slides);

        // ── Step 4: Run ──────────────────────────────────────────────────
        let title = self.config.title.clone().unwrap_or_else(|| source.stem());
        let archive_name = upload.save_images.then(|| source.archive_name());
        let output = run_pipeline(
            pages,
            &title,
            archive_name.as_deref(),
            &drive,
            &slides,
            &self.config,
            progress,
        )
        .await;

        // `source` (and its temp file) goes away here on every path.
        drop(source);
        output
    }
}

/// Convert a local PDF with the production converter.
pub async fn convert_file(
    path: &Path,
    save_images: bool,
    config: &ConversionConfig,
    progress: Option<ProgressCallback>,
) -> Result<ConversionOutput, Pdf2SlidesError> {
    let upload = Upload::from_path(path, save_images).await?;
    let progress = progress.unwrap_or_else(|| Arc::new(NoopProgressCallback));
    GoogleConverter::new(config.clone())
        .convert(upload, progress)
        .await
}

/// The page loop: create the deck, then render → archive → upload → enqueue
/// per page, then commit the batch once.
///
/// `archive_name` set means "also build the image archive". Any error ends
/// the run immediately; uploaded assets and the created deck are left as is.
pub async fn run_pipeline(
    mut pages: RenderedPages,
    title: &str,
    archive_name: Option<&str>,
    assets: &dyn AssetStore,
    slides: &dyn PresentationService,
    config: &ConversionConfig,
    progress: ProgressCallback,
) -> Result<ConversionOutput, Pdf2SlidesError> {
    let total_start = Instant::now();
    let total = pages.total();
    progress.on_conversion_start(total);

    let builder = PresentationBuilder::new(slides, config.geometry);
    let presentation = builder.create_empty(title).await?;
    let mut batch = builder.begin();
    let mut packer = archive_name.map(|_| ArchivePacker::new(total));
    let mut records: Vec<SlideRecord> = Vec::with_capacity(total);
    let mut stats = ConversionStats {
        total_pages: total,
        ..Default::default()
    };

    loop {
        // ── Render ───────────────────────────────────────────────────────
        let render_start = Instant::now();
        let Some(page) = pages.next().await else { break };
        let page = page?;
        stats.render_duration_ms += render_start.elapsed().as_millis() as u64;
        let page_num = page.page_num();
        progress.on_page_rendered(page_num, total, page.png.len());

        // ── Archive ──────────────────────────────────────────────────────
        if let Some(packer) = packer.as_mut() {
            packer.add(&page)?;
        }

        // ── Upload ───────────────────────────────────────────────────────
        let image_name = page.file_name(total);
        let upload_start = Instant::now();
        let asset = assets.upload(&image_name, &page.png).await?;
        stats.upload_duration_ms += upload_start.elapsed().as_millis() as u64;
        stats.uploaded_bytes += page.png.len() as u64;
        debug!("Page {}/{} → {}", page_num, total, asset.url);

        // ── Enqueue ──────────────────────────────────────────────────────
        let slide_id = batch.push_image_slide(page.index, &asset.url);
        records.push(SlideRecord {
            page_num,
            slide_id,
            image_name,
            asset,
        });
        progress.on_page_complete(page_num, total);
    }

    if records.len() != total {
        return Err(Pdf2SlidesError::Internal(format!(
            "renderer stopped after {} of {} pages",
            records.len(),
            total
        )));
    }

    // ── Commit ───────────────────────────────────────────────────────────
    let batch = batch.finish(&presentation.default_slide_id);
    stats.batch_requests = batch.len();
    progress.on_commit(batch.len());
    builder.commit(&presentation, &batch).await?;

    let uploaded: Vec<&RemoteAsset> = records.iter().map(|r| &r.asset).collect();
    apply_retention(config.retention, assets, &uploaded).await;

    let archive = match (packer, archive_name) {
        (Some(packer), Some(name)) => Some(packer.finish(name)?),
        _ => None,
    };

    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;
    info!(
        "Conversion complete: {} slides, {}ms total",
        records.len(),
        stats.total_duration_ms
    );
    progress.on_conversion_complete(total);

    Ok(ConversionOutput {
        title: title.to_string(),
        presentation_url: presentation.url(),
        presentation_id: presentation.id,
        slides: records,
        archive,
        stats,
    })
}

/// Clean up uploaded images after a successful commit, per `retention`.
///
/// The deck is already built at this point, so failures are logged and
/// otherwise ignored.
async fn apply_retention(
    retention: AssetRetention,
    store: &dyn AssetStore,
    assets: &[&RemoteAsset],
) {
    for asset in assets {
        let result = match retention {
            AssetRetention::Keep => return,
            AssetRetention::RevokePublic => store.revoke_public(asset).await,
            AssetRetention::Delete => store.delete(asset).await,
        };
        if let Err(e) = result {
            warn!("Cleanup of Drive file {} failed: {}", asset.file_id, e);
        }
    }
    if retention != AssetRetention::Keep {
        info!("Applied {:?} to {} uploaded images", retention, assets.len());
    }
}
