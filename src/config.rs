//! Configuration types for PDF-to-Slides conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The render scale and the slide
//! geometry are fixed policy in practice (2x, 720×405 pt) but are kept as
//! configuration defaults rather than constants so a differently-sized deck
//! does not need a code change.

use crate::error::Pdf2SlidesError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// OAuth scope for reading and writing Google Slides presentations.
pub const SCOPE_PRESENTATIONS: &str = "https://www.googleapis.com/auth/presentations";

/// OAuth scope for reading and writing Google Drive files.
pub const SCOPE_DRIVE: &str = "https://www.googleapis.com/auth/drive";

/// Configuration for a PDF-to-Slides conversion.
///
/// # Example
/// ```rust
/// use pdf2slides::{AssetRetention, ConversionConfig};
///
/// let config = ConversionConfig::builder()
///     .token_path("secrets/token.json")
///     .retention(AssetRetention::RevokePublic)
///     .build()
///     .unwrap();
/// assert_eq!(config.render_scale, 2.0);
/// ```
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Scale factor relative to the page's native resolution (72 pt = 72 px
    /// at 1.0). Range: 0.25–8.0. Default: 2.0.
    pub render_scale: f32,

    /// Size of every inserted image, in points. Default: 720×405 (16:9).
    pub geometry: SlideGeometry,

    /// What happens to uploaded Drive files once the deck is built.
    /// Default: [`AssetRetention::Keep`].
    pub retention: AssetRetention,

    /// Where the authorised-user token is persisted. Default: `token.json`.
    pub token_path: PathBuf,

    /// OAuth client-registration file. Default: `credentials.json`.
    pub client_secrets_path: PathBuf,

    /// OAuth scopes requested and required of a stored token.
    pub scopes: Vec<String>,

    /// Try to open the system browser during interactive sign-in. Default: true.
    ///
    /// The consent URL is always printed as well, so a headless machine can
    /// still complete the flow from another device's browser.
    pub open_browser: bool,

    /// Explicit pdfium library (file or directory). Falls back to
    /// `PDFIUM_LIB_PATH`, the working directory, then the system library.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Presentation title. If None, the source file stem is used.
    pub title: Option<String>,

    /// Base URLs of the remote services.
    pub endpoints: ApiEndpoints,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            render_scale: 2.0,
            geometry: SlideGeometry::default(),
            retention: AssetRetention::default(),
            token_path: PathBuf::from("token.json"),
            client_secrets_path: PathBuf::from("credentials.json"),
            scopes: vec![SCOPE_PRESENTATIONS.to_string(), SCOPE_DRIVE.to_string()],
            open_browser: true,
            pdfium_lib_path: None,
            title: None,
            endpoints: ApiEndpoints::default(),
        }
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn render_scale(mut self, scale: f32) -> Self {
        self.config.render_scale = scale.clamp(0.25, 8.0);
        self
    }

    pub fn geometry(mut self, geometry: SlideGeometry) -> Self {
        self.config.geometry = geometry;
        self
    }

    pub fn retention(mut self, retention: AssetRetention) -> Self {
        self.config.retention = retention;
        self
    }

    pub fn token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.token_path = path.into();
        self
    }

    pub fn client_secrets_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.client_secrets_path = path.into();
        self
    }

    pub fn scopes(mut self, scopes: Vec<String>) -> Self {
        self.config.scopes = scopes;
        self
    }

    pub fn open_browser(mut self, v: bool) -> Self {
        self.config.open_browser = v;
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.config.title = Some(title.into());
        self
    }

    pub fn endpoints(mut self, endpoints: ApiEndpoints) -> Self {
        self.config.endpoints = endpoints;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, Pdf2SlidesError> {
        let c = &self.config;
        if !(0.25..=8.0).contains(&c.render_scale) {
            return Err(Pdf2SlidesError::InvalidConfig(format!(
                "Render scale must be 0.25–8.0, got {}",
                c.render_scale
            )));
        }
        if c.geometry.width_pt <= 0.0 || c.geometry.height_pt <= 0.0 {
            return Err(Pdf2SlidesError::InvalidConfig(format!(
                "Slide size must be positive, got {}×{} pt",
                c.geometry.width_pt, c.geometry.height_pt
            )));
        }
        if c.scopes.is_empty() {
            return Err(Pdf2SlidesError::InvalidConfig(
                "At least one OAuth scope is required".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Value types ──────────────────────────────────────────────────────────

/// Placement of each page image on its slide.
///
/// Images are placed at the slide origin with unit scale and stretched to
/// exactly this size; no aspect-ratio fitting is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SlideGeometry {
    pub width_pt: f64,
    pub height_pt: f64,
}

impl Default for SlideGeometry {
    /// The standard 16:9 Google Slides canvas.
    fn default() -> Self {
        Self {
            width_pt: 720.0,
            height_pt: 405.0,
        }
    }
}

/// What to do with the uploaded page images after the batch commits.
///
/// The Slides API copies image content when it inserts an image, so the
/// Drive files and their public links are no longer needed once the deck
/// exists. Keeping them is the historical behaviour and stays the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetRetention {
    /// Leave the Drive files and their public-read grants in place.
    #[default]
    Keep,
    /// Keep the Drive files but remove the "anyone with the link" grant.
    RevokePublic,
    /// Delete the uploaded Drive files.
    Delete,
}

/// Base URLs of the Google endpoints, overridable for tests and proxies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    /// Drive media-upload root. Default: `https://www.googleapis.com/upload/drive/v3`.
    pub drive_upload: String,
    /// Drive metadata root. Default: `https://www.googleapis.com/drive/v3`.
    pub drive: String,
    /// Slides root. Default: `https://slides.googleapis.com/v1`.
    pub slides: String,
}

impl Default for ApiEndpoints {
    fn default() -> Self {
        Self {
            drive_upload: "https://www.googleapis.com/upload/drive/v3".into(),
            drive: "https://www.googleapis.com/drive/v3".into(),
            slides: "https://slides.googleapis.com/v1".into(),
        }
    }
}

impl ApiEndpoints {
    /// Point every service at one base URL (e.g. a local mock server).
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            drive_upload: format!("{base}/upload/drive/v3"),
            drive: format!("{base}/drive/v3"),
            slides: format!("{base}/v1"),
        }
    }
}
