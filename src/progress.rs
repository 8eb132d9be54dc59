//! Progress-callback trait for per-page conversion events.
//!
//! Pass an [`Arc<dyn ConversionProgressCallback>`] to
//! [`crate::convert::run_pipeline`] (or any [`crate::convert::Converter`]) to
//! receive events as each page moves through render → upload → enqueue.
//! The CLI forwards them to an `indicatif` bar; the web controller turns them
//! into the completion fraction shown on the form.
//!
//! # Example
//!
//! ```rust
//! use pdf2slides::ConversionProgressCallback;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! struct Counting(AtomicUsize);
//!
//! impl ConversionProgressCallback for Counting {
//!     fn on_page_complete(&self, page_num: usize, total_pages: usize) {
//!         self.0.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("page {page_num}/{total_pages} on its slide");
//!     }
//! }
//! ```

use std::sync::Arc;

/// Called by the pipeline as it processes each page.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Pages are processed strictly in order, so events
/// arrive in page order too.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once the PDF is open and its page count is known.
    fn on_conversion_start(&self, total_pages: usize) {
        let _ = total_pages;
    }

    /// Called after a page has been rasterised, before it is uploaded.
    ///
    /// # Arguments
    /// * `page_num`   : 1-indexed page number
    /// * `total_pages`: total pages in the document
    /// * `png_len`    : byte size of the encoded PNG
    fn on_page_rendered(&self, page_num: usize, total_pages: usize, png_len: usize) {
        let _ = (page_num, total_pages, png_len);
    }

    /// Called after a page has been uploaded and its slide requests queued.
    fn on_page_complete(&self, page_num: usize, total_pages: usize) {
        let _ = (page_num, total_pages);
    }

    /// Called just before the accumulated batch is sent.
    fn on_commit(&self, request_count: usize) {
        let _ = request_count;
    }

    /// Called once after the batch commit succeeded.
    fn on_conversion_complete(&self, total_pages: usize) {
        let _ = total_pages;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias for a shareable callback.
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

/// Completion fraction for `done` of `total` pages, in `0.0..=1.0`.
///
/// An empty document counts as finished.
pub fn fraction(done: usize, total: usize) -> f32 {
    if total == 0 {
        1.0
    } else {
        (done.min(total) as f32) / (total as f32)
    }
}
