//! Pipeline stages for PDF-to-Slides conversion.
//!
//! Each submodule implements one step; [`crate::convert::run_pipeline`]
//! wires them together page by page.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ archive? ──▶ upload ──▶ builder
//! (bytes)   (pdfium)   (zip)        (Drive)    (Slides batch)
//! ```
//!
//! 1. [`input`]: validate the upload and stage it in a temp file
//! 2. [`render`]: rasterise pages lazily on a blocking thread
//! 3. [`encode`]: PNG-encode each bitmap
//! 4. [`archive`]: optionally collect the PNGs into a ZIP
//! 5. [`builder`]: create the deck, queue slide requests, commit once

pub mod archive;
pub mod builder;
pub mod encode;
pub mod input;
pub mod render;
