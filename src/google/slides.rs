//! Slides v1 client: create a presentation, apply one batch of edits.

use crate::error::Pdf2SlidesError;
use crate::google::api::send_json;
use crate::google::requests::BatchUpdate;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A freshly created presentation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Presentation {
    pub id: String,
    /// The single slide every new presentation starts with.
    pub default_slide_id: String,
}

impl Presentation {
    /// Browser URL of the presentation.
    pub fn url(&self) -> String {
        presentation_url(&self.id)
    }
}

pub fn presentation_url(id: &str) -> String {
    format!("https://docs.google.com/presentation/d/{id}")
}

/// Reply to `presentations.batchUpdate`: one entry per request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdateResponse {
    #[serde(default)]
    pub presentation_id: Option<String>,
    #[serde(default)]
    pub replies: Vec<serde_json::Value>,
}

/// Remote presentation service.
///
/// `batch_update` must apply all requests or none; the deck relies on that
/// to keep slide creation and default-slide deletion consistent.
#[async_trait]
pub trait PresentationService: Send + Sync {
    async fn create(&self, title: &str) -> Result<Presentation, Pdf2SlidesError>;

    async fn batch_update(
        &self,
        presentation_id: &str,
        batch: &BatchUpdate,
    ) -> Result<BatchUpdateResponse, Pdf2SlidesError>;
}

/// Slides v1 REST client authorised with one access token.
pub struct SlidesClient {
    http: reqwest::Client,
    access_token: String,
    base: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedPresentation {
    presentation_id: String,
    #[serde(default)]
    slides: Vec<PageRef>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageRef {
    object_id: String,
}

impl SlidesClient {
    pub fn new(http: reqwest::Client, access_token: impl Into<String>, base: impl Into<String>) -> Self {
        Self {
            http,
            access_token: access_token.into(),
            base: base.into(),
        }
    }
}

#[async_trait]
impl PresentationService for SlidesClient {
    async fn create(&self, title: &str) -> Result<Presentation, Pdf2SlidesError> {
        const OP: &str = "Create presentation";
        let request = self
            .http
            .post(format!("{}/presentations", self.base))
            .bearer_auth(&self.access_token)
            .json(&serde_json::json!({ "title": title }));

        let created: CreatedPresentation = send_json(OP, request).await?;
        let default_slide_id = created
            .slides
            .into_iter()
            .next()
            .map(|s| s.object_id)
            .ok_or_else(|| Pdf2SlidesError::UnexpectedResponse {
                operation: OP,
                detail: "new presentation has no default slide".into(),
            })?;

        debug!(
            "Created presentation {} (default slide {})",
            created.presentation_id, default_slide_id
        );
        Ok(Presentation {
            id: created.presentation_id,
            default_slide_id,
        })
    }

    async fn batch_update(
        &self,
        presentation_id: &str,
        batch: &BatchUpdate,
    ) -> Result<BatchUpdateResponse, Pdf2SlidesError> {
        let request = self
            .http
            .post(format!(
                "{}/presentations/{}:batchUpdate",
                self.base, presentation_id
            ))
            .bearer_auth(&self.access_token)
            .json(batch);

        send_json("Batch update", request).await
    }
}
