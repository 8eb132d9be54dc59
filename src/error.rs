//! Error types for the pdf2slides library.
//!
//! Every failure ends the current run, so there is a single error type,
//! [`Pdf2SlidesError`]. Variants are grouped into the four
//! [`ErrorKind`]s the operator cares about:
//!
//! * **Authentication**: client registration missing or broken, consent
//!   denied, grant revoked. Needs the operator to re-authenticate.
//! * **Transport**: a render, upload or batch-commit step failed. Surfaced
//!   verbatim; already-created remote assets are left in place.
//! * **Input**: the upload is empty, not a PDF, or cannot be opened. Raised
//!   before any remote call is made.
//! * **Internal**: configuration, engine binding and controller misuse.

use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification of a [`Pdf2SlidesError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Authentication,
    Transport,
    Input,
    Internal,
}

/// All errors returned by the pdf2slides library.
#[derive(Debug, Error)]
pub enum Pdf2SlidesError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// The upload carried no bytes at all.
    #[error("No PDF was uploaded (received an empty file)")]
    EmptyUpload,

    /// The bytes were read, but they are not a PDF.
    #[error("'{name}' is not a valid PDF\nFirst bytes: {magic:?}")]
    NotAPdf { name: String, magic: Vec<u8> },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{name}' could not be opened: {detail}")]
    CorruptPdf { name: String, detail: String },

    /// PDF requires a password; encrypted uploads are not supported.
    #[error("PDF '{name}' is encrypted and requires a password.")]
    PasswordRequired { name: String },

    // ── Authentication errors ─────────────────────────────────────────────
    /// The OAuth client-registration file does not exist.
    #[error(
        "OAuth client file not found: '{path}'\n\
Download it from the Google Cloud console (APIs & Services → Credentials → \
OAuth client ID → Desktop app) and save it at that path."
    )]
    ClientSecretsMissing { path: PathBuf },

    /// The client-registration file exists but cannot be used.
    #[error("OAuth client file '{path}' is invalid: {detail}")]
    ClientSecretsInvalid { path: PathBuf, detail: String },

    /// The operator refused consent, or the redirect did not match our request.
    #[error("Authorisation was not granted: {reason}")]
    AuthorizationDenied { reason: String },

    /// The identity provider rejected the grant (expired, revoked or malformed).
    #[error("Authorisation grant rejected: {detail}\nDelete the token file and sign in again.")]
    InvalidGrant { detail: String },

    /// Could not write the token file.
    #[error("Failed to write token file '{path}': {source}")]
    TokenStoreFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Transport errors ──────────────────────────────────────────────────
    /// The HTTP request itself failed (DNS, TLS, connection reset, …).
    #[error("{operation} failed: {source}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// The remote API answered with a non-success status.
    #[error("{operation} failed with HTTP {status}: {message}")]
    Api {
        operation: &'static str,
        status: u16,
        message: String,
    },

    /// The remote API answered 2xx but the body lacked something we need.
    #[error("{operation} returned an unexpected response: {detail}")]
    UnexpectedResponse {
        operation: &'static str,
        detail: String,
    },

    /// pdfium returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The rendered bitmap could not be PNG-encoded.
    #[error("PNG encoding failed for page {page}: {detail}")]
    ImageEncodingFailed { page: usize, detail: String },

    /// Writing the image archive failed.
    #[error("Failed to build image archive: {0}")]
    ArchiveFailed(String),

    // ── Internal errors ───────────────────────────────────────────────────
    /// `start` was called while another conversion was still running.
    #[error("A conversion is already running; wait for it to finish")]
    ConversionInProgress,

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
Set PDFIUM_LIB_PATH (or --pdfium-lib) to the directory or file holding \
libpdfium, or install it on the system library path.\n"
    )]
    PdfiumBindingFailed(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Pdf2SlidesError {
    /// Which of the four failure families this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        use Pdf2SlidesError::*;
        match self {
            FileNotFound { .. }
            | EmptyUpload
            | NotAPdf { .. }
            | CorruptPdf { .. }
            | PasswordRequired { .. } => ErrorKind::Input,
            ClientSecretsMissing { .. }
            | ClientSecretsInvalid { .. }
            | AuthorizationDenied { .. }
            | InvalidGrant { .. }
            | TokenStoreFailed { .. } => ErrorKind::Authentication,
            Http { .. }
            | Api { .. }
            | UnexpectedResponse { .. }
            | RasterisationFailed { .. }
            | ImageEncodingFailed { .. }
            | ArchiveFailed(_) => ErrorKind::Transport,
            ConversionInProgress | InvalidConfig(_) | PdfiumBindingFailed(_) | Internal(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Shorthand for wrapping a `reqwest::Error` raised by `operation`.
    pub(crate) fn http(operation: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Pdf2SlidesError::Http { operation, source }
    }
}

impl From<zip::result::ZipError> for Pdf2SlidesError {
    fn from(e: zip::result::ZipError) -> Self {
        Pdf2SlidesError::ArchiveFailed(e.to_string())
    }
}
