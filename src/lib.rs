//! # pdf2slides
//!
//! Turn a PDF into a Google Slides presentation with one full-bleed image
//! slide per page.
//!
//! ## Why this crate?
//!
//! Converting PDF content into native slide elements loses layout, fonts and
//! formulae. Instead this crate rasterises each page into a PNG, hosts it on
//! Google Drive with public-read access, and places it on its own 16:9
//! slide, so the deck looks exactly like the document.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Auth     load / refresh / obtain an OAuth token (token.json)
//!  ├─ 2. Input    validate %PDF magic, stage in a temp file
//!  ├─ 3. Render   rasterise pages via pdfium (spawn_blocking, one at a time)
//!  ├─ 4. Archive  optionally add each PNG to an in-memory ZIP
//!  ├─ 5. Upload   Drive files.create + "anyone can read" permission
//!  ├─ 6. Build    queue createSlide/createImage per page, delete default slide
//!  └─ 7. Commit   one atomic presentations.batchUpdate
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2slides::{convert_file, ConversionConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads credentials.json / token.json from the working directory.
//!     let config = ConversionConfig::default();
//!     let output = convert_file(Path::new("talk.pdf"), true, &config, None).await?;
//!     println!("{}", output.presentation_url);
//!     if let Some(archive) = output.archive {
//!         std::fs::write(&archive.file_name, &archive.bytes)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdf2slides` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdf2slides = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod auth;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod google;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod web;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ApiEndpoints, AssetRetention, ConversionConfig, ConversionConfigBuilder, SlideGeometry,
};
pub use controller::{ConversionController, ConversionOutcome, ConversionState, StatusSnapshot};
pub use convert::{convert_file, run_pipeline, Converter, GoogleConverter, Upload};
pub use error::{ErrorKind, Pdf2SlidesError};
pub use output::{ConversionOutput, ConversionStats, SlideRecord};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
