//! Result types returned by a successful conversion.

use crate::google::drive::RemoteAsset;
use crate::pipeline::archive::ImageArchive;
use serde::Serialize;

/// Everything a finished run produced.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    /// Title given to the presentation.
    pub title: String,
    pub presentation_id: String,
    /// `https://docs.google.com/presentation/d/<id>`
    pub presentation_url: String,
    /// One entry per page, in page order.
    pub slides: Vec<SlideRecord>,
    /// Present only when the operator asked for the images.
    pub archive: Option<ImageArchive>,
    pub stats: ConversionStats,
}

/// Where one page ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideRecord {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Object id of the slide created for this page.
    pub slide_id: String,
    /// Name the image was uploaded under.
    pub image_name: String,
    pub asset: RemoteAsset,
}

/// Timings and counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    /// Requests sent in the single batch update (including the delete).
    pub batch_requests: usize,
    /// PNG bytes uploaded, summed over all pages.
    pub uploaded_bytes: u64,
    /// Wall time spent waiting on the renderer.
    pub render_duration_ms: u64,
    /// Wall time spent in Drive uploads.
    pub upload_duration_ms: u64,
    pub total_duration_ms: u64,
}
