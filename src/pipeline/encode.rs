//! Image encoding: `DynamicImage` → PNG bytes.
//!
//! PNG is lossless, so rendered text stays crisp on the slide. The same
//! bytes are uploaded to Drive and, when requested, written to the archive.

use crate::error::Pdf2SlidesError;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page as PNG.
pub fn encode_png(page_num: usize, img: &DynamicImage) -> Result<Vec<u8>, Pdf2SlidesError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| Pdf2SlidesError::ImageEncodingFailed {
            page: page_num,
            detail: e.to_string(),
        })?;

    debug!("Encoded page {} → {} bytes PNG", page_num, buf.len());
    Ok(buf)
}
