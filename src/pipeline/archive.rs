//! Optional ZIP of the rendered page images.
//!
//! Entries are appended as pages are rendered, in page order, and the
//! archive is emitted once after the last page.

use crate::error::Pdf2SlidesError;
use crate::pipeline::render::PageImage;
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// A finished archive ready for download.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ImageArchive {
    /// Download name: `<source-stem>_images.zip`.
    pub file_name: String,
    /// Number of PNG entries.
    pub entries: usize,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

/// Incrementally builds an in-memory ZIP of page PNGs.
pub struct ArchivePacker {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
    total_pages: usize,
    entries: usize,
}

impl ArchivePacker {
    /// Start an empty archive for a document of `total_pages` pages.
    pub fn new(total_pages: usize) -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(CompressionMethod::Deflated),
            total_pages,
            entries: 0,
        }
    }

    /// Append one page under its ordinal file name.
    pub fn add(&mut self, page: &PageImage) -> Result<(), Pdf2SlidesError> {
        let name = page.file_name(self.total_pages);
        self.writer.start_file(name.as_str(), self.options)?;
        self.writer
            .write_all(&page.png)
            .map_err(|e| Pdf2SlidesError::ArchiveFailed(format!("{name}: {e}")))?;
        self.entries += 1;
        debug!("Archived {} ({} bytes)", name, page.png.len());
        Ok(())
    }

    /// Number of entries written so far.
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Write the central directory and hand back the archive.
    pub fn finish(self, file_name: impl Into<String>) -> Result<ImageArchive, Pdf2SlidesError> {
        let entries = self.entries;
        let cursor = self.writer.finish()?;
        Ok(ImageArchive {
            file_name: file_name.into(),
            entries,
            bytes: cursor.into_inner(),
        })
    }
}
