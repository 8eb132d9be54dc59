//! Input handling: validate an uploaded PDF and stage it on disk.
//!
//! pdfium opens documents most reliably from a path, so the uploaded bytes
//! are copied into a [`NamedTempFile`]. The file is removed when the
//! [`SourceDocument`] is dropped, which happens at the end of the run on
//! the success path and on every error path alike. The `%PDF` magic is
//! checked first so a wrong upload fails before any remote call is made.

use crate::error::Pdf2SlidesError;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

const PDF_MAGIC: &[u8] = b"%PDF";

/// An uploaded PDF, validated and staged in a temporary file.
#[derive(Debug)]
pub struct SourceDocument {
    name: String,
    size: usize,
    file: NamedTempFile,
}

impl SourceDocument {
    /// Validate `bytes` and copy them to a temporary file.
    ///
    /// `name` is the operator-facing file name (e.g. `lecture.pdf`); it is
    /// used for the presentation title and the archive name.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self, Pdf2SlidesError> {
        let name = name.into();
        check_magic(&name, bytes)?;

        let mut file = tempfile::Builder::new()
            .prefix("pdf2slides-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| Pdf2SlidesError::Internal(format!("tempfile: {e}")))?;
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|e| Pdf2SlidesError::Internal(format!("tempfile write: {e}")))?;

        debug!("Staged '{}' ({} bytes) at {}", name, bytes.len(), file.path().display());
        Ok(Self {
            name,
            size: bytes.len(),
            file,
        })
    }

    /// The operator-facing file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name without its extension, used as the default presentation title.
    pub fn stem(&self) -> String {
        file_stem(&self.name)
    }

    /// Name of the optional image archive: `<stem>_images.zip`.
    pub fn archive_name(&self) -> String {
        format!("{}_images.zip", self.stem())
    }

    /// Size of the uploaded bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Path of the staged copy. Valid as long as `self` is alive.
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Owned copy of [`Self::path`], for moving into blocking tasks.
    pub fn path_buf(&self) -> PathBuf {
        self.file.path().to_path_buf()
    }
}

/// Strip directories and the final extension from an upload name.
pub fn file_stem(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    if stem.is_empty() {
        "document".to_string()
    } else {
        stem
    }
}

fn check_magic(name: &str, bytes: &[u8]) -> Result<(), Pdf2SlidesError> {
    if bytes.is_empty() {
        return Err(Pdf2SlidesError::EmptyUpload);
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(Pdf2SlidesError::NotAPdf {
            name: name.to_string(),
            magic: bytes.iter().take(PDF_MAGIC.len()).copied().collect(),
        });
    }
    Ok(())
}
