//! Google Drive and Slides REST clients.
//!
//! The pipeline only sees the two traits, [`AssetStore`] and
//! [`PresentationService`]; the reqwest-backed [`DriveClient`] and
//! [`SlidesClient`] are the production implementations.

pub mod api;
pub mod drive;
pub mod requests;
pub mod slides;

pub use drive::{AssetStore, DriveClient, RemoteAsset};
pub use requests::{BatchUpdate, Request, SlideBatch};
pub use slides::{Presentation, PresentationService, SlidesClient};
